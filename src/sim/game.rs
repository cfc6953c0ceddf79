//! # Game ticker
//!
//! Owns everything that outlives a single level: the archive, the player
//! slots, demo playback/recording and the pending-action slot.  The host
//! calls [`Game::tick`] once per tic with fresh input.
//!
//! Order within one tic:
//! 1. players marked `Reborn` are respawned,
//! 2. the pending action is drained until it reads `Nothing`,
//! 3. each active player's command is taken from input, or from the demo,
//!    and written to the recording,
//! 4. pause / save requests packed into the commands are applied,
//! 5. the current state's ticker runs.

use thiserror::Error;

use super::components::{Buttons, Health, TicCmd};
use super::demo::{DemoError, DemoHeader, DemoPlayback, DemoRecorder, RecordStatus};
use super::options::{GameMode, GameOptions, Skill};
use super::player::{MAXPLAYERS, Player, PlayerState};
use super::random::Random;
use super::save::{MemorySaves, SAVE_SLOTS, SaveError, SaveGame, SaveGameStore, SavedPlayer};
use super::setup::{self, SpawnError, SpawnRules};
use super::specials::{SpecialDefs, Specials, SpecialsError};
use super::world::{ActorScript, LevelExit, World};
use crate::wad::{LevelError, LoadError, Wad, WadError, load_level};
use crate::world::{Fixed, TextureBank, TextureError};

pub const TICRATE: i32 = 35;
/// Intermission tics after the stats are skipped before the next level.
const WI_NOSTATE_TICS: i32 = 10;
/// Finale tics before a key press may leave it.
const FINALE_MIN_TICS: i32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameState {
    Level,
    Intermission,
    Finale,
    #[default]
    DemoScreen,
    /// Only ever the last drawn state; forces a screen wipe.
    Wipe,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GameAction {
    #[default]
    Nothing,
    LoadLevel,
    NewGame,
    LoadGame,
    SaveGame,
    PlayDemo,
    Completed,
    Victory,
    WorldDone,
    Screenshot,
}

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Wad(#[from] WadError),

    #[error(transparent)]
    Level(#[from] LevelError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),

    #[error(transparent)]
    Specials(#[from] SpecialsError),

    #[error(transparent)]
    Demo(#[from] DemoError),

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Where a deferred demo comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemoSource {
    Lump(String),
    Bytes(Vec<u8>),
}

/// What the intermission screen shows for the level just finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Intermission {
    pub episode: u8,
    pub last: u8,
    pub next: u8,
    pub max_kills: i32,
    pub max_items: i32,
    pub max_secrets: i32,
    pub level_time: i32,
    pub kills: [i32; MAXPLAYERS],
    pub items: [i32; MAXPLAYERS],
    pub secrets: [i32; MAXPLAYERS],
    pub did_secret: bool,
}

type ScriptFactory = Box<dyn Fn() -> Box<dyn ActorScript>>;

pub struct Game {
    wad: Wad,
    bank: TextureBank,
    defs: SpecialDefs,
    pub options: GameOptions,

    state: GameState,
    wipe_state: GameState,
    action: GameAction,

    pub players: [Player; MAXPLAYERS],
    pub in_game: [bool; MAXPLAYERS],
    pub console_player: usize,

    skill: Skill,
    episode: u8,
    map: u8,
    respawn_monsters: bool,
    world: Option<World>,
    /// random state handed to the next world when none is running
    rng: Random,

    paused: bool,
    menu_active: bool,
    game_tic: u32,

    playback: Option<DemoPlayback>,
    recorder: Option<DemoRecorder>,
    recorded: Option<Vec<u8>>,
    demo_source: Option<DemoSource>,

    demo_sequence: i32,
    page_tic: i32,
    page_name: &'static str,
    advance_demo: bool,
    quit_requested: bool,

    secret_exit: bool,
    intermission: Intermission,
    wi_accelerate: bool,
    wi_count: i32,
    wi_buttons: [Buttons; MAXPLAYERS],
    finale_count: i32,

    saves: Box<dyn SaveGameStore>,
    save_slot: usize,
    save_description: String,
    send_save: bool,
    send_pause: bool,
    load_slot: usize,

    pending_new: (Skill, u8, u8),
    screenshots: u32,
    script_factory: Option<ScriptFactory>,
}

impl Game {
    /// Read the texture tables and animation definitions of `wad`.  Nothing
    /// is loaded yet; call [`start_title`](Self::start_title) or
    /// [`new_game`](Self::new_game).
    pub fn new(wad: Wad, options: GameOptions) -> Result<Self, GameError> {
        let bank = TextureBank::from_wad(&wad)?;
        let defs = SpecialDefs::new(&bank, options.mode)?;
        log::info!(
            "game: {:?}, {} wall textures, {} flats, {} animations",
            options.mode,
            bank.wall_count(),
            bank.flat_count(),
            defs.anims.len()
        );

        let mut in_game = [false; MAXPLAYERS];
        in_game[0] = true;
        Ok(Self {
            wad,
            bank,
            defs,
            skill: options.skill,
            episode: options.episode,
            map: options.map,
            pending_new: (options.skill, options.episode, options.map),
            options,
            state: GameState::DemoScreen,
            wipe_state: GameState::DemoScreen,
            action: GameAction::Nothing,
            players: Default::default(),
            in_game,
            console_player: 0,
            respawn_monsters: false,
            world: None,
            rng: Random::new(),
            paused: false,
            menu_active: false,
            game_tic: 0,
            playback: None,
            recorder: None,
            recorded: None,
            demo_source: None,
            demo_sequence: -1,
            page_tic: 0,
            page_name: "TITLEPIC",
            advance_demo: false,
            quit_requested: false,
            secret_exit: false,
            intermission: Intermission::default(),
            wi_accelerate: false,
            wi_count: 0,
            wi_buttons: [Buttons::empty(); MAXPLAYERS],
            finale_count: 0,
            saves: Box::new(MemorySaves::default()),
            save_slot: 0,
            save_description: String::new(),
            send_save: false,
            send_pause: false,
            load_slot: 0,
            screenshots: 0,
            script_factory: None,
        })
    }

    pub fn with_save_store(mut self, store: Box<dyn SaveGameStore>) -> Self {
        self.saves = store;
        self
    }

    /// Every world built from now on gets a fresh script from `factory`.
    pub fn set_script_factory(&mut self, factory: ScriptFactory) {
        self.script_factory = Some(factory);
    }

    /* ───────────────────────────── accessors ───────────────────────────── */

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn action(&self) -> GameAction {
        self.action
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn wad(&self) -> &Wad {
        &self.wad
    }

    pub fn skill(&self) -> Skill {
        self.skill
    }

    pub fn episode(&self) -> u8 {
        self.episode
    }

    pub fn map(&self) -> u8 {
        self.map
    }

    /// Nightmare, or `respawn` in the options.
    pub fn respawn_monsters(&self) -> bool {
        self.respawn_monsters
    }

    pub fn game_tic(&self) -> u32 {
        self.game_tic
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_playing_demo(&self) -> bool {
        self.playback.is_some()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_some()
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn page_name(&self) -> &'static str {
        self.page_name
    }

    pub fn intermission(&self) -> &Intermission {
        &self.intermission
    }

    pub fn screenshots(&self) -> u32 {
        self.screenshots
    }

    /* ───────────────────────────── host requests ───────────────────────── */

    /// Enter the title loop: pages alternating with the DEMOn lumps.
    pub fn start_title(&mut self) {
        self.action = GameAction::Nothing;
        self.demo_sequence = -1;
        self.advance_demo = true;
    }

    /// Start a single-player game now, like a command-line warp.
    pub fn new_game(&mut self, skill: Skill, episode: u8, map: u8) -> Result<(), GameError> {
        self.init_new(skill, episode, map)
    }

    /// Start a single-player game at the beginning of the next tic.
    pub fn defer_new_game(&mut self, skill: Skill, episode: u8, map: u8) {
        self.pending_new = (skill, episode, map);
        self.action = GameAction::NewGame;
    }

    pub fn defer_play_demo(&mut self, source: DemoSource) {
        self.demo_source = Some(source);
        self.action = GameAction::PlayDemo;
    }

    /// Record the running session from the next command on.
    pub fn begin_recording(&mut self) {
        let header = DemoHeader {
            skill: self.skill,
            episode: self.episode,
            map: self.map,
            deathmatch: self.options.deathmatch,
            respawn: self.options.respawn,
            fast: self.options.fast,
            no_monsters: self.options.no_monsters,
            console_player: self.console_player as u8,
            in_game: self.in_game,
        };
        self.recorder = Some(DemoRecorder::begin(&header, self.options.max_demo_size));
    }

    pub fn stop_recording(&mut self) {
        if let Some(rec) = self.recorder.take() {
            self.recorded = Some(rec.finish());
        }
    }

    /// Bytes of the last finished recording.
    pub fn take_recording(&mut self) -> Option<Vec<u8>> {
        self.recorded.take()
    }

    pub fn request_pause(&mut self) {
        self.send_pause = true;
    }

    /// Save into `slot` on a later tic; the request travels inside the
    /// console player's command so every node saves on the same tic.
    /// Queue a save into `slot`.  The slot travels packed in the console
    /// player's next command, so slots past the packed range are refused.
    pub fn request_save(&mut self, slot: usize, description: &str) {
        if slot >= SAVE_SLOTS {
            log::warn!("save slot {slot} out of range 0..{SAVE_SLOTS}");
            return;
        }
        self.save_slot = slot;
        self.save_description = description.to_owned();
        self.send_save = true;
    }

    pub fn request_load(&mut self, slot: usize) {
        self.load_slot = slot;
        self.action = GameAction::LoadGame;
    }

    pub fn request_screenshot(&mut self) {
        self.action = GameAction::Screenshot;
    }

    pub fn set_menu_active(&mut self, active: bool) {
        self.menu_active = active;
    }

    /// The host has drawn a frame.  Returns `true` when the frame should be
    /// wiped in because the state changed since the previous one.
    pub fn note_drawn(&mut self) -> bool {
        let wipe = self.wipe_state != self.state;
        self.wipe_state = self.state;
        wipe
    }

    /* ───────────────────────────── tic ─────────────────────────────────── */

    /// Run one tic.  `inputs` holds each slot's live command; slots that are
    /// not in the game are ignored.
    pub fn tick(&mut self, inputs: &[TicCmd; MAXPLAYERS]) -> Result<(), GameError> {
        if self.advance_demo {
            self.do_advance_demo();
        }

        for slot in 0..MAXPLAYERS {
            if self.in_game[slot] && self.players[slot].state == PlayerState::Reborn {
                self.do_reborn(slot)?;
            }
        }

        loop {
            let action = std::mem::take(&mut self.action);
            if action != GameAction::Nothing {
                log::debug!("game action {action:?}");
            }
            match action {
                GameAction::Nothing => break,
                GameAction::LoadLevel => self.do_load_level()?,
                GameAction::NewGame => self.do_new_game()?,
                GameAction::LoadGame => self.do_load_game()?,
                GameAction::SaveGame => self.do_save_game()?,
                GameAction::PlayDemo => self.do_play_demo()?,
                GameAction::Completed => self.do_completed(),
                GameAction::Victory => self.start_finale(),
                GameAction::WorldDone => self.do_world_done()?,
                GameAction::Screenshot => {
                    self.screenshots += 1;
                    log::info!("screen shot {}", self.screenshots);
                }
            }
        }

        self.gather_commands(inputs);
        self.special_buttons();

        match self.state {
            GameState::Level => self.level_tick(),
            GameState::Intermission => self.intermission_tick(),
            GameState::Finale => self.finale_tick(),
            GameState::DemoScreen => self.page_tick(),
            GameState::Wipe => {}
        }
        self.game_tic = self.game_tic.wrapping_add(1);
        Ok(())
    }

    fn gather_commands(&mut self, inputs: &[TicCmd; MAXPLAYERS]) {
        for slot in 0..MAXPLAYERS {
            if !self.in_game[slot] {
                continue;
            }
            let mut cmd = inputs[slot];
            if slot == self.console_player {
                if self.send_pause {
                    self.send_pause = false;
                    cmd.buttons = Buttons::pause_request();
                }
                if self.send_save {
                    self.send_save = false;
                    cmd.buttons = Buttons::save_request(self.save_slot);
                }
            }

            if let Some(play) = self.playback.as_mut() {
                match play.read_cmd() {
                    Some(recorded) => cmd = recorded,
                    None => {
                        self.check_demo_status();
                    }
                }
            }

            let full = self
                .recorder
                .as_mut()
                .is_some_and(|rec| rec.write_cmd(&mut cmd) == RecordStatus::Full);
            if full {
                log::info!("demo buffer full");
                self.stop_recording();
            }

            self.players[slot].cmd = cmd;
        }
    }

    fn special_buttons(&mut self) {
        for slot in 0..MAXPLAYERS {
            if !self.in_game[slot] {
                continue;
            }
            let buttons = self.players[slot].cmd.buttons;
            if !buttons.contains(Buttons::SPECIAL) {
                continue;
            }
            let special = buttons.bits() & Buttons::SPECIAL_MASK.bits();
            if special == Buttons::PAUSE.bits() {
                self.paused = !self.paused;
                log::debug!("paused: {}", self.paused);
            } else if special == Buttons::SAVEGAME.bits() {
                if self.options.netgame && self.save_description.trim().is_empty() {
                    self.save_description = "NET GAME".to_owned();
                }
                self.save_slot = buttons.save_slot();
                self.action = GameAction::SaveGame;
            }
        }
    }

    /* ───────────────────────────── level ───────────────────────────────── */

    fn level_tick(&mut self) {
        if self.paused {
            return;
        }
        // the menu freezes single player once the view has settled
        if !self.options.netgame
            && self.menu_active
            && self.playback.is_none()
            && self.players[self.console_player].view_z != Fixed(1)
        {
            return;
        }
        let Some(world) = self.world.as_mut() else {
            return;
        };

        for slot in 0..MAXPLAYERS {
            if self.in_game[slot] {
                self.players[slot].think(world, self.options.mode);
            }
        }
        world.run_tic();

        if let Some(exit) = world.exit_request.take() {
            self.exit_level(exit);
        }
    }

    fn exit_level(&mut self, exit: LevelExit) {
        self.secret_exit = match exit {
            LevelExit::Normal => false,
            // MAP31 must exist for the secret exit to mean anything
            LevelExit::Secret => {
                self.options.mode != GameMode::Commercial || self.wad.find_lump("MAP31").is_some()
            }
        };
        self.action = GameAction::Completed;
    }

    fn spawn_rules(&self) -> SpawnRules {
        SpawnRules {
            mode: self.options.mode,
            skill: self.skill,
            deathmatch: self.options.deathmatch,
            netgame: self.options.netgame,
            no_monsters: self.options.no_monsters,
            in_game: self.in_game,
        }
    }

    fn do_reborn(&mut self, slot: usize) -> Result<(), GameError> {
        if !self.options.netgame {
            // single player reloads the level
            self.action = GameAction::LoadLevel;
            return Ok(());
        }
        let rules = self.spawn_rules();
        if let Some(world) = self.world.as_mut() {
            setup::respawn(world, &mut self.players, &rules, slot)?;
        }
        Ok(())
    }

    fn init_new(&mut self, skill: Skill, episode: u8, map: u8) -> Result<(), GameError> {
        self.paused = false;

        let episode = episode.clamp(1, self.options.mode.episodes().max(1));
        let map = match self.options.mode {
            GameMode::Commercial => map.clamp(1, 32),
            _ => map.clamp(1, 9),
        };

        self.rng.clear();
        self.world = None;
        self.respawn_monsters = skill == Skill::Nightmare || self.options.respawn;
        for p in self.players.iter_mut() {
            p.state = PlayerState::Reborn;
        }

        self.skill = skill;
        self.episode = episode;
        self.map = map;
        log::info!(
            "new game: skill {:?}, {}",
            skill,
            self.options.mode.map_name(episode, map)
        );
        self.do_load_level()
    }

    fn do_new_game(&mut self) -> Result<(), GameError> {
        self.playback = None;
        self.options.netgame = false;
        self.options.deathmatch = 0;
        self.in_game = [true, false, false, false];
        self.options.respawn = false;
        self.options.fast = false;
        self.options.no_monsters = false;
        self.console_player = 0;
        let (skill, episode, map) = self.pending_new;
        self.init_new(skill, episode, map)
    }

    fn do_load_level(&mut self) -> Result<(), GameError> {
        if self.wipe_state == GameState::Level {
            self.wipe_state = GameState::Wipe;
        }
        self.state = GameState::Level;

        for (slot, p) in self.players.iter_mut().enumerate() {
            if self.in_game[slot] && p.state == PlayerState::Dead {
                p.state = PlayerState::Reborn;
            }
            p.frags = [0; MAXPLAYERS];
            p.mo = None;
            p.kill_count = 0;
            p.item_count = 0;
            p.secret_count = 0;
        }

        if let Some(old) = self.world.take() {
            self.rng = old.rng;
        }

        let name = self.options.mode.map_name(self.episode, self.map);
        let marker = self.wad.level_index(&name)?;
        let level = load_level(&self.wad, marker, &self.bank)?;

        let mut world = World::new(level, self.rng.clone(), Specials::new(self.defs.clone()));
        world.skill = self.skill;
        if let Some(factory) = &self.script_factory {
            world.set_actor_script(factory());
        }
        let rules = self.spawn_rules();
        setup::populate(&mut world, &mut self.players, &rules)?;
        world.spawn_specials();
        // spawning rebuilds the player, so the unsettled-view mark goes on after
        self.players[self.console_player].view_z = Fixed(1);
        log::info!(
            "{name}: {} kills, {} items, {} secrets",
            world.totals.kills,
            world.totals.items,
            world.totals.secrets
        );
        self.world = Some(world);

        self.action = GameAction::Nothing;
        self.send_pause = false;
        self.send_save = false;
        self.paused = false;
        Ok(())
    }

    /* ───────────────────────────── level flow ──────────────────────────── */

    fn do_completed(&mut self) {
        if let Some(world) = self.world.as_mut() {
            for slot in 0..MAXPLAYERS {
                if self.in_game[slot] {
                    self.players[slot].finish_level(world);
                }
            }
        }

        let commercial = self.options.mode == GameMode::Commercial;
        if !commercial {
            match self.map {
                8 => {
                    self.action = GameAction::Victory;
                    return;
                }
                9 => {
                    for p in self.players.iter_mut() {
                        p.did_secret = true;
                    }
                }
                _ => {}
            }
        }

        let next = if commercial {
            match (self.secret_exit, self.map) {
                (true, 15) => 31,
                (true, 31) => 32,
                (false, 31 | 32) => 16,
                (_, m) => m + 1,
            }
        } else if self.secret_exit {
            9
        } else if self.map == 9 {
            // back from the secret level
            match self.episode {
                1 => 4,
                2 => 6,
                3 => 7,
                _ => 3,
            }
        } else {
            self.map + 1
        };

        let (totals, level_time) = self
            .world
            .as_ref()
            .map(|w| (w.totals, w.level_time))
            .unwrap_or_default();
        let mut wi = Intermission {
            episode: self.episode,
            last: self.map,
            next,
            max_kills: totals.kills,
            max_items: totals.items,
            max_secrets: totals.secrets,
            level_time,
            did_secret: self.players[self.console_player].did_secret,
            ..Intermission::default()
        };
        for (slot, p) in self.players.iter().enumerate() {
            wi.kills[slot] = p.kill_count;
            wi.items[slot] = p.item_count;
            wi.secrets[slot] = p.secret_count;
        }
        self.intermission = wi;

        self.state = GameState::Intermission;
        self.wi_accelerate = false;
        self.wi_count = 0;
        // a button held through the exit does not skip the stats
        self.wi_buttons = std::array::from_fn(|i| self.players[i].cmd.buttons);
        log::info!(
            "level {} done in {} tics, next {}",
            self.map,
            level_time,
            next
        );
    }

    fn intermission_tick(&mut self) {
        let press = Buttons::ATTACK | Buttons::USE;
        for slot in 0..MAXPLAYERS {
            if !self.in_game[slot] {
                continue;
            }
            let now = self.players[slot].cmd.buttons & press;
            if !(now - self.wi_buttons[slot]).is_empty() {
                self.wi_accelerate = true;
            }
            self.wi_buttons[slot] = now;
        }
        if !self.wi_accelerate {
            return;
        }
        self.wi_count += 1;
        if self.wi_count == WI_NOSTATE_TICS {
            self.world_done();
        }
    }

    /// The intermission is over: go on, or show the story text first.
    fn world_done(&mut self) {
        self.action = GameAction::WorldDone;
        if self.secret_exit {
            self.players[self.console_player].did_secret = true;
        }
        if self.options.mode == GameMode::Commercial {
            let finale = match self.map {
                15 | 31 => self.secret_exit,
                6 | 11 | 20 | 30 => true,
                _ => false,
            };
            if finale {
                self.start_finale();
            }
        }
    }

    fn start_finale(&mut self) {
        self.action = GameAction::Nothing;
        self.state = GameState::Finale;
        self.finale_count = 0;
        log::info!("finale after {}", self.options.mode.map_name(self.episode, self.map));
    }

    fn finale_tick(&mut self) {
        self.finale_count += 1;
        if self.options.mode != GameMode::Commercial || self.finale_count <= FINALE_MIN_TICS {
            return;
        }
        let pressed = (0..MAXPLAYERS)
            .any(|i| self.in_game[i] && !self.players[i].cmd.buttons.is_empty());
        // after MAP30 the cast call runs until the host quits
        if pressed && self.map != 30 {
            self.action = GameAction::WorldDone;
        }
    }

    fn do_world_done(&mut self) -> Result<(), GameError> {
        self.state = GameState::Level;
        self.map = self.intermission.next;
        self.do_load_level()?;
        self.action = GameAction::Nothing;
        Ok(())
    }

    /* ───────────────────────────── saves ───────────────────────────────── */

    fn do_save_game(&mut self) -> Result<(), GameError> {
        let mut save = SaveGame::new(&self.save_description);
        save.skill = self.skill.as_u8();
        save.episode = self.episode;
        save.map = self.map;
        save.in_game = self.in_game;
        save.level_time = self.world.as_ref().map_or(0, |w| w.level_time);
        save.players = self.players.iter().map(SavedPlayer::capture).collect();

        self.saves.write(self.save_slot, &save.to_bytes()?)?;
        log::info!("game saved to slot {} ({})", self.save_slot, save.description);
        self.save_description.clear();
        Ok(())
    }

    fn do_load_game(&mut self) -> Result<(), GameError> {
        let bytes = self.saves.read(self.load_slot)?;
        let save = SaveGame::from_bytes(&bytes)?;
        let skill = Skill::from_u8(save.skill).unwrap_or(Skill::Nightmare);

        self.in_game = save.in_game;
        self.init_new(skill, save.episode, save.map)?;

        for (slot, saved) in save.players.iter().enumerate().take(MAXPLAYERS) {
            if !self.in_game[slot] {
                continue;
            }
            let p = &mut self.players[slot];
            saved.restore(p);
            if let (Some(mo), Some(world)) = (p.mo, self.world.as_mut()) {
                if let Ok(mut h) = world.ecs.get::<&mut Health>(mo) {
                    h.0 = saved.health;
                }
            }
        }
        if let Some(world) = self.world.as_mut() {
            world.level_time = save.level_time;
        }
        log::info!("loaded slot {} ({})", self.load_slot, save.description);
        Ok(())
    }

    /* ───────────────────────────── demos ───────────────────────────────── */

    fn do_play_demo(&mut self) -> Result<(), GameError> {
        let Some(source) = self.demo_source.take() else {
            return Ok(());
        };
        let bytes = match source {
            DemoSource::Bytes(bytes) => bytes,
            DemoSource::Lump(name) => match self.wad.find_lump(&name) {
                Some(idx) => self.wad.lump_bytes(idx)?.to_vec(),
                None => {
                    log::warn!("demo lump {name} not found");
                    self.advance_demo = true;
                    return Ok(());
                }
            },
        };

        let (header, playback) = DemoPlayback::open(bytes)?;
        self.options.deathmatch = header.deathmatch;
        self.options.respawn = header.respawn;
        self.options.fast = header.fast;
        self.options.no_monsters = header.no_monsters;
        self.console_player = (header.console_player as usize).min(MAXPLAYERS - 1);
        self.in_game = header.in_game;
        self.options.netgame = header.in_game[1..].iter().any(|&b| b);

        self.init_new(header.skill, header.episode, header.map)?;
        self.playback = Some(playback);
        log::info!(
            "playing demo: {:?} {}",
            header.skill,
            self.options.mode.map_name(self.episode, self.map)
        );
        Ok(())
    }

    /// Called at the end of a demo stream.  Returns whether anything ended.
    fn check_demo_status(&mut self) -> bool {
        if self.playback.take().is_some() {
            log::info!("demo finished at tic {}", self.game_tic);
            if self.options.single_demo {
                self.quit_requested = true;
            } else {
                self.options.netgame = false;
                self.options.deathmatch = 0;
                self.options.respawn = false;
                self.options.fast = false;
                self.options.no_monsters = false;
                self.in_game = [true, false, false, false];
                self.console_player = 0;
                self.advance_demo = true;
            }
            return true;
        }
        if self.recorder.is_some() {
            self.stop_recording();
            return true;
        }
        false
    }

    /* ───────────────────────────── title loop ──────────────────────────── */

    fn page_tick(&mut self) {
        self.page_tic -= 1;
        if self.page_tic < 0 {
            self.advance_demo = true;
        }
    }

    fn do_advance_demo(&mut self) {
        self.players[self.console_player].state = PlayerState::Live;
        self.advance_demo = false;
        self.paused = false;
        self.action = GameAction::Nothing;

        let mode = self.options.mode;
        let commercial = mode == GameMode::Commercial;
        let len = if mode == GameMode::Retail { 7 } else { 6 };
        self.demo_sequence = (self.demo_sequence + 1) % len;

        let page = |g: &mut Self, tics: i32, name: &'static str| {
            g.state = GameState::DemoScreen;
            g.page_tic = tics;
            g.page_name = name;
        };
        match self.demo_sequence {
            0 => page(self, if commercial { TICRATE * 11 } else { 170 }, "TITLEPIC"),
            1 => self.defer_play_demo(DemoSource::Lump("DEMO1".into())),
            2 => page(self, 200, "CREDIT"),
            3 => self.defer_play_demo(DemoSource::Lump("DEMO2".into())),
            4 => match mode {
                GameMode::Commercial => page(self, TICRATE * 11, "TITLEPIC"),
                GameMode::Retail => page(self, 200, "CREDIT"),
                _ => page(self, 200, "HELP2"),
            },
            5 => self.defer_play_demo(DemoSource::Lump("DEMO3".into())),
            _ => self.defer_play_demo(DemoSource::Lump("DEMO4".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wad::{MapBuilder, WadBuilder};

    fn idle() -> [TicCmd; MAXPLAYERS] {
        [TicCmd::default(); MAXPLAYERS]
    }

    fn game_with(maps: &[&str], lumps: Vec<(&str, Vec<u8>)>) -> Game {
        let mut wb = WadBuilder::new();
        for name in maps {
            wb = wb.map(&MapBuilder::room(name, 0, 0, 256, 256));
        }
        for (name, data) in lumps {
            wb = wb.lump(name, data);
        }
        Game::new(wb.into_wad().expect("wad"), GameOptions::default()).expect("game")
    }

    fn demo_bytes(map: u8, tics: usize, forward: i8) -> Vec<u8> {
        let header = DemoHeader {
            episode: 1,
            map,
            in_game: [true, false, false, false],
            ..DemoHeader::default()
        };
        let mut rec = DemoRecorder::begin(&header, 0x2_0000);
        for _ in 0..tics {
            let mut cmd = TicCmd {
                forward_move: forward,
                ..TicCmd::default()
            };
            rec.write_cmd(&mut cmd);
        }
        rec.finish()
    }

    #[test]
    fn deferred_new_game_loads_on_next_tic() {
        let mut g = game_with(&["E1M1", "E1M2"], vec![]);
        g.defer_new_game(Skill::Hard, 1, 2);
        assert_eq!(g.state(), GameState::DemoScreen);
        g.tick(&idle()).expect("tic");
        assert_eq!(g.state(), GameState::Level);
        assert_eq!(g.map(), 2);
        assert_eq!(g.skill(), Skill::Hard);
        assert!(g.players[0].mo.is_some());
        assert_eq!(g.world().map(|w| w.level_time), Some(1));
    }

    #[test]
    fn unknown_map_is_fatal() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.defer_new_game(Skill::Medium, 1, 5);
        assert!(matches!(g.tick(&idle()), Err(GameError::Level(_))));
    }

    #[test]
    fn title_loop_shows_page_then_skips_missing_demo() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.start_title();
        g.tick(&idle()).expect("tic");
        assert_eq!(g.state(), GameState::DemoScreen);
        assert_eq!(g.page_name(), "TITLEPIC");

        for _ in 0..171 {
            g.tick(&idle()).expect("tic");
        }
        // DEMO1 is absent so the sequence moves on to the credits
        g.tick(&idle()).expect("tic");
        assert_eq!(g.page_name(), "CREDIT");
        assert!(!g.is_playing_demo());
    }

    #[test]
    fn demo_plays_then_returns_to_title_loop() {
        let mut g = game_with(&["E1M1"], vec![("DEMO1", demo_bytes(1, 5, 25))]);
        g.demo_sequence = 0;
        g.advance_demo = true;
        g.tick(&idle()).expect("tic");
        assert!(g.is_playing_demo());
        assert_eq!(g.state(), GameState::Level);
        assert_eq!(g.players[0].cmd.forward_move, 25);

        for _ in 0..5 {
            g.tick(&idle()).expect("tic");
        }
        assert!(!g.is_playing_demo());
        g.tick(&idle()).expect("tic");
        assert_eq!(g.state(), GameState::DemoScreen);
        assert_eq!(g.page_name(), "CREDIT");
    }

    #[test]
    fn single_demo_requests_quit() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.options.single_demo = true;
        g.defer_play_demo(DemoSource::Bytes(demo_bytes(1, 2, 10)));
        for _ in 0..4 {
            g.tick(&idle()).expect("tic");
        }
        assert!(g.quit_requested());
    }

    #[test]
    fn bad_demo_version_leaves_game_untouched() {
        let mut g = game_with(&["E1M1"], vec![]);
        let mut bytes = demo_bytes(1, 2, 10);
        bytes[0] = 108;
        g.defer_play_demo(DemoSource::Bytes(bytes));
        let err = g.tick(&idle()).expect_err("version mismatch");
        assert!(matches!(
            err,
            GameError::Demo(DemoError::BadVersion { found: 108 })
        ));
        assert!(g.world().is_none());
        assert_eq!(g.players[0].state, PlayerState::Live);
    }

    #[test]
    fn pause_travels_in_the_command() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        g.tick(&idle()).expect("tic");
        let t = g.world().map(|w| w.level_time);

        g.request_pause();
        g.tick(&idle()).expect("tic");
        assert!(g.is_paused());
        assert_eq!(g.world().map(|w| w.level_time), t);

        g.request_pause();
        g.tick(&idle()).expect("tic");
        assert!(!g.is_paused());
    }

    #[test]
    fn menu_freezes_single_player_after_first_tic() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        g.set_menu_active(true);
        g.tick(&idle()).expect("tic");
        assert_eq!(g.world().map(|w| w.level_time), Some(1));
        g.tick(&idle()).expect("tic");
        assert_eq!(g.world().map(|w| w.level_time), Some(1));
    }

    #[test]
    fn save_then_load_restores_session() {
        let mut g = game_with(&["E1M1", "E1M3"], vec![]);
        g.new_game(Skill::Easy, 1, 3).expect("new game");
        for _ in 0..10 {
            g.tick(&idle()).expect("tic");
        }
        g.players[0].ammo[0] = 17;
        g.request_save(1, "before the lift");
        g.tick(&idle()).expect("tic"); // request goes out in the command
        g.tick(&idle()).expect("tic"); // and is written here

        g.new_game(Skill::Hard, 1, 1).expect("other game");
        assert_eq!(g.map(), 1);

        g.request_load(1);
        g.tick(&idle()).expect("tic");
        assert_eq!(g.map(), 3);
        assert_eq!(g.skill(), Skill::Easy);
        assert_eq!(g.players[0].ammo[0], 17);
        assert_eq!(g.world().map(|w| w.level_time), Some(12));
    }

    #[test]
    fn out_of_range_save_slot_is_refused() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        g.request_save(9, "slot nine");
        g.tick(&idle()).expect("tic");
        g.tick(&idle()).expect("tic");
        assert!(!g.send_save);
        assert_eq!(g.action(), GameAction::Nothing);
        assert!(matches!(g.saves.read(1), Err(SaveError::EmptySlot(_) | SaveError::BadSlot(_))));
    }

    #[test]
    fn fresh_level_keeps_unsettled_view_mark() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        assert_eq!(g.players[0].view_z, Fixed(1));
        assert!(g.players[0].mo.is_some());
    }

    #[test]
    fn net_save_gets_default_description() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        g.options.netgame = true;
        g.request_save(0, "  ");
        g.tick(&idle()).expect("tic");
        assert_eq!(g.save_description, "NET GAME");
        assert_eq!(g.action(), GameAction::SaveGame);
    }

    #[test]
    fn exit_goes_through_intermission_to_next_map() {
        let mut g = game_with(&["E1M1", "E1M2"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        if let Some(w) = g.world_mut() {
            w.exit_request = Some(LevelExit::Normal);
        }
        g.tick(&idle()).expect("tic");
        g.tick(&idle()).expect("tic");
        assert_eq!(g.state(), GameState::Intermission);
        assert_eq!(g.intermission().next, 2);

        let mut press = idle();
        press[0].buttons = Buttons::USE;
        g.tick(&press).expect("tic");
        for _ in 0..WI_NOSTATE_TICS + 1 {
            g.tick(&idle()).expect("tic");
        }
        assert_eq!(g.state(), GameState::Level);
        assert_eq!(g.map(), 2);
    }

    #[test]
    fn secret_level_return_table() {
        let mut g = game_with(&["E2M9"], vec![]);
        g.options.mode = GameMode::Registered;
        g.new_game(Skill::Medium, 2, 9).expect("new game");
        g.secret_exit = false;
        g.do_completed();
        assert_eq!(g.intermission().next, 6);
        assert!(g.players[0].did_secret);

        g.map = 8;
        g.do_completed();
        assert_eq!(g.action(), GameAction::Victory);
    }

    #[test]
    fn recording_fills_and_stops() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.options.max_demo_size = 13 + 16 + 8;
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        g.begin_recording();
        for _ in 0..5 {
            g.tick(&idle()).expect("tic");
        }
        assert!(!g.is_recording());
        let bytes = g.take_recording().expect("finished demo");
        assert_eq!(bytes.len(), 13 + 12 + 1);
    }

    #[test]
    fn wipe_is_forced_on_level_reload() {
        let mut g = game_with(&["E1M1"], vec![]);
        g.new_game(Skill::Medium, 1, 1).expect("new game");
        assert!(g.note_drawn());
        assert!(!g.note_drawn());
        g.new_game(Skill::Medium, 1, 1).expect("reload");
        assert!(g.note_drawn());
    }
}
