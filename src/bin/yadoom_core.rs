//! Headless driver: load an IWAD, start a map or play a demo, run tics and
//! print what the level looks like afterwards.
//!
//! ```bash
//! RUST_LOG=info cargo run -- doom1.wad --map 1 --tics 350
//! cargo run -- doom1.wad --demo DEMO1 --tics 2000
//! cargo run -- doom1.wad --record out.lmp --tics 700
//! ```

use anyhow::{Context, bail};
use clap::Parser;
use std::{fs, path::PathBuf, thread};

use yadoom_core::sim::{
    DemoSource, Game, GameMode, GameOptions, GameState, MAXPLAYERS, Skill, TicCmd, TicRunner,
};
use yadoom_core::wad::Wad;

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// IWAD to load
    #[arg(value_name = "WAD")]
    wad: PathBuf,

    /// Episode (ignored by commercial IWADs)
    #[arg(long, default_value_t = 1)]
    episode: u8,

    /// Map number
    #[arg(long, default_value_t = 1)]
    map: u8,

    /// Skill 1..=5
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    skill: u8,

    /// Play this demo lump, or a demo file when the path exists
    #[arg(long, value_name = "LUMP|FILE")]
    demo: Option<String>,

    /// Record idle input into this file
    #[arg(long, value_name = "FILE", conflicts_with = "demo")]
    record: Option<PathBuf>,

    /// Tics to run
    #[arg(long, default_value_t = 350)]
    tics: u32,

    /// 0 off, 1 deathmatch, 2 altdeath
    #[arg(long, default_value_t = 0)]
    deathmatch: u8,

    #[arg(long)]
    respawn: bool,

    #[arg(long)]
    fast: bool,

    #[arg(long)]
    nomonsters: bool,

    /// Pace the simulation at 35 Hz instead of running flat out
    #[arg(long)]
    realtime: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let opts = Opts::parse();

    let wad = Wad::from_file(&opts.wad)
        .with_context(|| format!("reading {}", opts.wad.display()))?;
    let mode = GameMode::detect(&wad);
    let skill = Skill::from_u8(opts.skill - 1).unwrap_or_default();
    let options = GameOptions {
        mode,
        skill,
        episode: opts.episode,
        map: opts.map,
        deathmatch: opts.deathmatch,
        respawn: opts.respawn,
        fast: opts.fast,
        no_monsters: opts.nomonsters,
        single_demo: opts.demo.is_some(),
        ..GameOptions::default()
    };
    println!("{:?} IWAD, {} lumps", mode, wad.lumps().len());

    let mut game = Game::new(wad, options)?;
    match &opts.demo {
        Some(demo) => {
            let path = PathBuf::from(demo);
            let source = match path.is_file() {
                true => DemoSource::Bytes(
                    fs::read(&path).with_context(|| format!("reading {}", path.display()))?,
                ),
                false => DemoSource::Lump(demo.to_ascii_uppercase()),
            };
            game.defer_play_demo(source);
        }
        None => {
            game.new_game(skill, opts.episode, opts.map)?;
            if opts.record.is_some() {
                game.begin_recording();
            }
        }
    }

    let idle = |_: &Game| [TicCmd::default(); MAXPLAYERS];
    let mut runner = TicRunner::new(game);
    let mut ran = 0;
    while ran < opts.tics && !runner.game().quit_requested() {
        if opts.realtime {
            ran += runner.pump(idle)?;
            thread::sleep(runner.until_next());
        } else {
            let cmds = idle(runner.game());
            runner.game_mut().tick(&cmds)?;
            ran += 1;
        }
    }
    let mut game = runner.into_game();

    if let Some(path) = &opts.record {
        game.stop_recording();
        let Some(bytes) = game.take_recording() else {
            bail!("nothing was recorded");
        };
        fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        println!("demo written to {} ({} bytes)", path.display(), bytes.len());
    }

    report(&game, ran);
    Ok(())
}

fn report(game: &Game, tics: u32) {
    println!("ran {tics} tics, state {:?}", game.state());
    if game.state() == GameState::DemoScreen {
        println!("page {}", game.page_name());
    }
    let Some(world) = game.world() else {
        return;
    };
    let level = &world.level;
    println!(
        "{}: {} vertices, {} lines, {} sectors, {} sub-sectors",
        level.name,
        level.vertices.len(),
        level.linedefs.len(),
        level.sectors.len(),
        level.subsectors.len()
    );
    println!(
        "level time {} tics, {} objects, {} live thinkers",
        world.level_time,
        world.ecs.len(),
        world.thinkers.live_count()
    );
    println!(
        "totals: {} kills, {} items, {} secrets",
        world.totals.kills, world.totals.items, world.totals.secrets
    );
    for (slot, p) in game.players.iter().enumerate() {
        if game.in_game[slot] {
            println!(
                "player {}: health {}, armor {}, {:?}",
                slot + 1,
                p.health,
                p.armor_points,
                p.state
            );
        }
    }
}
