use std::io::Write;

use yadoom_core::wad::{LoadError, MapBuilder, Wad, WadBuilder, load_level};
use yadoom_core::world::{Fixed, TextureBank};

fn wad_file(builder: WadBuilder) -> (tempfile::NamedTempFile, Wad) {
    let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
    tmp.write_all(&builder.build()).expect("write wad");
    tmp.flush().expect("flush");
    let wad = Wad::from_file(tmp.path()).expect("read wad");
    (tmp, wad)
}

/// Two rooms side by side sharing the wall at x = 128.
fn two_rooms() -> MapBuilder {
    let mut m = MapBuilder::new("E1M1");
    let left = m.sector(0, 128, 160);
    let right = m.sector(16, 128, 192);
    let v = [
        m.vertex(0, 0),
        m.vertex(0, 128),
        m.vertex(128, 128),
        m.vertex(128, 0),
        m.vertex(256, 128),
        m.vertex(256, 0),
    ];
    let walls = [
        (v[0], v[1], left),
        (v[1], v[2], left),
        (v[3], v[0], left),
        (v[2], v[4], right),
        (v[4], v[5], right),
        (v[5], v[3], right),
    ];
    for (a, b, sec) in walls {
        let s = m.side(sec, "STARTAN3");
        m.line(a, b, 0x0001, s, -1);
    }
    let front = m.side(left, "-");
    let back = m.side(right, "-");
    m.line(v[2], v[3], 0x0004, front, back);
    m.thing(64, 64, 0, 1, 7);
    m
}

#[test]
fn closed_room_from_disk() {
    let (_tmp, wad) = wad_file(WadBuilder::new().map(&MapBuilder::room("E1M1", 0, 0, 256, 128)));
    let marker = wad.level_index("E1M1").expect("marker");
    let level = load_level(&wad, marker, &TextureBank::new()).expect("level");

    assert_eq!(level.sectors.len(), 1);
    let sec = &level.sectors[0];
    assert_eq!(sec.line_count, 4);
    assert_eq!(sec.bbox.left, Fixed::from_int(0));
    assert_eq!(sec.bbox.right, Fixed::from_int(256));
    assert_eq!(sec.bbox.bottom, Fixed::from_int(0));
    assert_eq!(sec.bbox.top, Fixed::from_int(128));
    assert_eq!(sec.sound_origin.0, Fixed::from_int(128));
    assert_eq!(sec.sound_origin.1, Fixed::from_int(64));
}

#[test]
fn incidences_match_sided_lines() {
    let (_tmp, wad) = wad_file(WadBuilder::new().map(&two_rooms()));
    let level = load_level(&wad, 0, &TextureBank::new()).expect("level");

    let expected: usize = level
        .linedefs
        .iter()
        .map(|l| if l.sides[1].is_some() { 2 } else { 1 })
        .sum();
    let counted: usize = level.sectors.iter().map(|s| s.line_count).sum();
    assert_eq!(counted, expected);
    assert_eq!(counted, 8);

    let bm = &level.blockmap;
    for s in &level.sectors {
        let b = s.block_box;
        assert!(0 <= b.left && b.left <= b.right && b.right < bm.width);
        assert!(0 <= b.bottom && b.bottom <= b.top && b.top < bm.height);
    }
}

#[test]
fn dangling_sector_reference_is_fatal() {
    let mut m = MapBuilder::room("E1M1", 0, 0, 128, 128);
    m.sidedefs[2].sector = 9;
    let (_tmp, wad) = wad_file(WadBuilder::new().map(&m));
    let err = load_level(&wad, 0, &TextureBank::new()).expect_err("bad sector index");
    assert!(matches!(err, LoadError::BadReference { .. }), "{err}");
}

#[test]
fn truncated_file_is_rejected() {
    let mut bytes = WadBuilder::new()
        .map(&MapBuilder::room("E1M1", 0, 0, 128, 128))
        .build();
    bytes.truncate(bytes.len() / 2);
    let mut tmp = tempfile::NamedTempFile::new().expect("tempfile");
    tmp.write_all(&bytes).expect("write");
    assert!(Wad::from_file(tmp.path()).is_err());
}
