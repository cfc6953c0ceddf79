use super::components::TicCmd;
use super::game::{Game, GameError, TICRATE};
use super::player::MAXPLAYERS;
use std::time::{Duration, Instant};

const TIC: Duration = Duration::from_micros(1_000_000 / TICRATE as u64);

/// Drives a [`Game`] at `TICRATE` against the wall clock.
pub struct TicRunner {
    game: Game,
    last: Instant,
}

impl TicRunner {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            last: Instant::now(),
        }
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    /// Run as many tics as real time asks for.  `input` is polled once per
    /// tic.  Returns the number of tics run.
    pub fn pump<F>(&mut self, mut input: F) -> Result<u32, GameError>
    where
        F: FnMut(&Game) -> [TicCmd; MAXPLAYERS],
    {
        let mut ran = 0;
        while self.last.elapsed() >= TIC {
            let cmds = input(&self.game);
            self.game.tick(&cmds)?;
            self.last += TIC;
            ran += 1;
        }
        Ok(ran)
    }

    /// Time left until the next tic is due.
    pub fn until_next(&self) -> Duration {
        TIC.saturating_sub(self.last.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::options::GameOptions;
    use crate::wad::{MapBuilder, WadBuilder};

    #[test]
    fn pump_catches_up_with_the_clock() {
        let wad = WadBuilder::new()
            .map(&MapBuilder::room("E1M1", 0, 0, 128, 128))
            .into_wad()
            .expect("wad");
        let game = Game::new(wad, GameOptions::default()).expect("game");
        let mut runner = TicRunner::new(game);
        runner.last -= TIC * 3;
        let ran = runner
            .pump(|_| [TicCmd::default(); MAXPLAYERS])
            .expect("pump");
        assert!(ran >= 3);
        assert_eq!(runner.game().game_tic(), ran);
        assert!(runner.until_next() <= TIC);
    }
}
