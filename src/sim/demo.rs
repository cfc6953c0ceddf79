//! Demo files: a session header followed by one 4-byte command record per
//! player per tic, closed by [`DEMOMARKER`].

use byteorder::{ReadBytesExt, WriteBytesExt};
use thiserror::Error;

use super::components::{Buttons, TicCmd};
use super::options::Skill;
use super::player::MAXPLAYERS;

pub const DEMO_VERSION: u8 = 109;
/// Sits where the next forward-move byte would be.
pub const DEMOMARKER: u8 = 0x80;
pub const DEMO_HEADER_LEN: usize = 9 + MAXPLAYERS;
/// Recording stops once fewer than this many bytes remain.
const SAFETY_MARGIN: usize = 16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DemoError {
    #[error("demo is from a different game version ({found}, expected 109)")]
    BadVersion { found: u8 },

    #[error("demo header names skill {found}, past nightmare")]
    BadSkill { found: u8 },

    #[error("demo header truncated")]
    Truncated,
}

/// Session settings a demo replays under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoHeader {
    pub skill: Skill,
    pub episode: u8,
    pub map: u8,
    pub deathmatch: u8,
    pub respawn: bool,
    pub fast: bool,
    pub no_monsters: bool,
    pub console_player: u8,
    pub in_game: [bool; MAXPLAYERS],
}

impl DemoHeader {
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[
            DEMO_VERSION,
            self.skill.as_u8(),
            self.episode,
            self.map,
            self.deathmatch,
            self.respawn as u8,
            self.fast as u8,
            self.no_monsters as u8,
            self.console_player,
        ]);
        out.extend(self.in_game.iter().map(|&b| b as u8));
    }

    /// Parse the header.  The version byte is checked before anything else
    /// is read.
    pub fn decode(mut bytes: &[u8]) -> Result<Self, DemoError> {
        let version = bytes.read_u8().map_err(|_| DemoError::Truncated)?;
        if version != DEMO_VERSION {
            return Err(DemoError::BadVersion { found: version });
        }
        let mut next = || bytes.read_u8().map_err(|_| DemoError::Truncated);

        let found = next()?;
        let skill = Skill::from_u8(found).ok_or(DemoError::BadSkill { found })?;
        let mut h = DemoHeader {
            skill,
            episode: next()?,
            map: next()?,
            deathmatch: next()?,
            respawn: next()? != 0,
            fast: next()? != 0,
            no_monsters: next()? != 0,
            console_player: next()?,
            in_game: [false; MAXPLAYERS],
        };
        for slot in h.in_game.iter_mut() {
            *slot = next()? != 0;
        }
        Ok(h)
    }
}

/// Turn delta stored as its rounded high byte.
#[inline]
fn quantize_turn(turn: i16) -> u8 {
    ((turn as i32 + 128) >> 8) as u8
}

fn read_record(mut rec: &[u8]) -> Option<TicCmd> {
    let forward_move = rec.read_i8().ok()?;
    let side_move = rec.read_i8().ok()?;
    let turn = rec.read_u8().ok()?;
    let buttons = rec.read_u8().ok()?;
    Some(TicCmd {
        forward_move,
        side_move,
        angle_turn: ((turn as u16) << 8) as i16,
        buttons: Buttons::from_bits_retain(buttons),
    })
}

/* ───────────────────────────── playback ──────────────────────────────── */

#[derive(Debug, Clone)]
pub struct DemoPlayback {
    buf: Vec<u8>,
    pos: usize,
}

impl DemoPlayback {
    pub fn open(buf: Vec<u8>) -> Result<(DemoHeader, Self), DemoError> {
        let header = DemoHeader::decode(&buf)?;
        Ok((
            header,
            Self {
                buf,
                pos: DEMO_HEADER_LEN,
            },
        ))
    }

    /// Next command, or `None` once the end marker (or the end of the
    /// buffer) is reached.
    pub fn read_cmd(&mut self) -> Option<TicCmd> {
        let rest = self.buf.get(self.pos..)?;
        if rest.first().is_none_or(|&b| b == DEMOMARKER) {
            return None;
        }
        let cmd = read_record(rest)?;
        self.pos += 4;
        Some(cmd)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

/* ───────────────────────────── recording ─────────────────────────────── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Recording,
    /// No room for another record; the demo must be finished.
    Full,
}

#[derive(Debug, Clone)]
pub struct DemoRecorder {
    buf: Vec<u8>,
    capacity: usize,
}

impl DemoRecorder {
    pub fn begin(header: &DemoHeader, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(capacity.min(0x2_0000));
        header.encode(&mut buf);
        log::info!("demo recording started ({capacity} byte buffer)");
        Self { buf, capacity }
    }

    /// Append `cmd` and replace it with what a player will read back, so
    /// the live game runs on exactly the recorded values.
    pub fn write_cmd(&mut self, cmd: &mut TicCmd) -> RecordStatus {
        let start = self.buf.len();
        // -128 would read back as the end marker
        let forward = cmd.forward_move.max(-127);
        self.buf.write_i8(forward).ok();
        self.buf.write_i8(cmd.side_move).ok();
        self.buf.write_u8(quantize_turn(cmd.angle_turn)).ok();
        self.buf.write_u8(cmd.buttons.bits()).ok();

        if start > self.capacity.saturating_sub(SAFETY_MARGIN) {
            self.buf.truncate(start);
            return RecordStatus::Full;
        }
        if let Some(back) = read_record(&self.buf[start..]) {
            *cmd = back;
        }
        RecordStatus::Recording
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() <= DEMO_HEADER_LEN
    }

    /// Close the demo with the end marker and hand the bytes over.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.push(DEMOMARKER);
        log::info!("demo recorded, {} bytes", self.buf.len());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn header() -> DemoHeader {
        DemoHeader {
            skill: Skill::Hard,
            episode: 1,
            map: 3,
            in_game: [true, false, false, false],
            ..DemoHeader::default()
        }
    }

    #[test]
    fn header_layout() {
        let mut out = Vec::new();
        DemoHeader {
            respawn: true,
            console_player: 2,
            ..header()
        }
        .encode(&mut out);
        assert_eq!(out, vec![109, 3, 1, 3, 0, 1, 0, 0, 2, 1, 0, 0, 0]);
        assert_eq!(out.len(), DEMO_HEADER_LEN);
    }

    #[test]
    fn wrong_version_stops_at_first_byte() {
        let bytes = vec![110, 2, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0x80];
        assert_eq!(
            DemoPlayback::open(bytes).err(),
            Some(DemoError::BadVersion { found: 110 })
        );
        assert_eq!(DemoHeader::decode(&[109, 2, 1]), Err(DemoError::Truncated));
    }

    #[test]
    fn unknown_skill_is_rejected() {
        let bytes = vec![DEMO_VERSION, 7, 1, 1, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0x80];
        assert!(matches!(
            DemoPlayback::open(bytes),
            Err(DemoError::BadSkill { found: 7 })
        ));
    }

    #[test]
    fn turn_is_rounded_to_high_byte() {
        let mut rec = DemoRecorder::begin(&header(), 1024);
        let mut cmd = TicCmd {
            angle_turn: 0x0280,
            ..TicCmd::default()
        };
        rec.write_cmd(&mut cmd);
        assert_eq!(cmd.angle_turn, 0x0300);
        let mut cmd = TicCmd {
            angle_turn: -0x017F,
            ..TicCmd::default()
        };
        rec.write_cmd(&mut cmd);
        assert_eq!(cmd.angle_turn, -0x0100);
    }

    #[test]
    fn full_buffer_drops_last_record() {
        let cap = DEMO_HEADER_LEN + 16 + 8;
        let mut rec = DemoRecorder::begin(&header(), cap);
        let mut statuses = Vec::new();
        for _ in 0..4 {
            let mut cmd = TicCmd {
                forward_move: 25,
                ..TicCmd::default()
            };
            statuses.push(rec.write_cmd(&mut cmd));
        }
        assert_eq!(
            statuses,
            vec![
                RecordStatus::Recording,
                RecordStatus::Recording,
                RecordStatus::Recording,
                RecordStatus::Full
            ]
        );
        let bytes = rec.finish();
        assert_eq!(bytes.len(), DEMO_HEADER_LEN + 12 + 1);
        assert_eq!(bytes.last(), Some(&DEMOMARKER));
    }

    #[test]
    fn empty_demo_ends_immediately() {
        let bytes = DemoRecorder::begin(&header(), 1024).finish();
        let (h, mut play) = DemoPlayback::open(bytes).expect("open");
        assert_eq!(h, header());
        assert_eq!(play.read_cmd(), None);
        assert_eq!(play.position(), DEMO_HEADER_LEN);
    }

    fn arb_cmd() -> impl Strategy<Value = TicCmd> {
        (any::<i8>(), any::<i8>(), any::<i16>(), any::<u8>()).prop_map(|(f, s, t, b)| TicCmd {
            forward_move: f,
            side_move: s,
            angle_turn: t,
            buttons: Buttons::from_bits_retain(b),
        })
    }

    proptest! {
        #[test]
        fn recorded_commands_replay_identically(cmds in prop::collection::vec(arb_cmd(), 0..200)) {
            let mut rec = DemoRecorder::begin(&header(), 0x2_0000);
            let mut live = Vec::new();
            for mut cmd in cmds {
                prop_assert_eq!(rec.write_cmd(&mut cmd), RecordStatus::Recording);
                live.push(cmd);
            }
            let (_, mut play) = DemoPlayback::open(rec.finish()).expect("open");
            let replayed: Vec<TicCmd> = std::iter::from_fn(|| play.read_cmd()).collect();
            prop_assert_eq!(replayed, live);
        }
    }
}
