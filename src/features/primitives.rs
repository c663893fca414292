//! Causal statistic primitives
//!
//! Each primitive walks a team's games in play order and yields one value per
//! game. Value `i` is built from games `0..i` only: the accumulator is shown
//! game `i - 1` on the step that produces value `i`, so the current game and
//! everything after it are never read. Value 0 is the accumulator's prior.

use std::slice;

use crate::{GameRecord, HoopsError, Result, TeamId};

/// Lazy per-game feature values for one team-season
pub type CausalValues<'a> = Box<dyn Iterator<Item = Result<f64>> + 'a>;

/// Incremental state folded over a team's completed games
pub trait Accumulator {
    /// Fold in a game that has already been played
    fn observe(&mut self, game: &GameRecord, team: TeamId) -> Result<()>;

    /// Current value, before the next game is played
    fn value(&self) -> f64;
}

/// Drives an accumulator one game behind the output
///
/// After an accumulator error the iterator yields that error once and then
/// stops, so a failed series never produces a full set of values.
pub struct Causal<'a, A> {
    games: slice::Iter<'a, &'a GameRecord>,
    team: TeamId,
    acc: A,
    previous: Option<&'a GameRecord>,
    failed: bool,
}

impl<'a, A: Accumulator> Causal<'a, A> {
    pub fn new(games: &'a [&'a GameRecord], team: TeamId, acc: A) -> Self {
        Causal {
            games: games.iter(),
            team,
            acc,
            previous: None,
            failed: false,
        }
    }
}

impl<'a, A: Accumulator> Iterator for Causal<'a, A> {
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let current = *self.games.next()?;
        if let Some(played) = self.previous.replace(current) {
            if let Err(e) = self.acc.observe(played, self.team) {
                self.failed = true;
                return Some(Err(e));
            }
        }
        Some(Ok(self.acc.value()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            self.games.size_hint()
        }
    }
}

/// Average of a per-game scalar over the games played so far
pub struct RunningMean<F> {
    extract: F,
    count: usize,
    mean: f64,
}

impl<F> RunningMean<F>
where
    F: Fn(&GameRecord, TeamId) -> Result<f64>,
{
    pub fn new(extract: F) -> Self {
        RunningMean {
            extract,
            count: 0,
            mean: 0.0,
        }
    }
}

impl<F> Accumulator for RunningMean<F>
where
    F: Fn(&GameRecord, TeamId) -> Result<f64>,
{
    fn observe(&mut self, game: &GameRecord, team: TeamId) -> Result<()> {
        let value = (self.extract)(game, team)?;
        let n = self.count as f64;
        self.mean = (n * self.mean + value) / (n + 1.0);
        self.count += 1;
        Ok(())
    }

    fn value(&self) -> f64 {
        self.mean
    }
}

/// Positive for consecutive wins, negative for consecutive losses
#[derive(Debug, Clone, Copy, Default)]
pub struct Streak {
    state: i64,
}

impl Accumulator for Streak {
    fn observe(&mut self, game: &GameRecord, team: TeamId) -> Result<()> {
        let won = game
            .did_win(team)
            .ok_or(HoopsError::NotAParticipant { team })?;
        self.state = match (won, self.state) {
            (true, s) if s > 0 => s + 1,
            (true, _) => 1,
            (false, s) if s < 0 => s - 1,
            (false, _) => -1,
        };
        Ok(())
    }

    fn value(&self) -> f64 {
        self.state as f64
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    wins: u32,
    games: u32,
}

impl Tally {
    fn record(&mut self, won: bool) {
        self.games += 1;
        if won {
            self.wins += 1;
        }
    }

    fn ratio(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

/// Wins over games played
#[derive(Debug, Clone, Copy, Default)]
pub struct WinPct {
    tally: Tally,
}

impl Accumulator for WinPct {
    fn observe(&mut self, game: &GameRecord, team: TeamId) -> Result<()> {
        let won = game
            .did_win(team)
            .ok_or(HoopsError::NotAParticipant { team })?;
        self.tally.record(won);
        Ok(())
    }

    fn value(&self) -> f64 {
        self.tally.ratio()
    }
}

/// Win percentage counting only games against ranked opponents
///
/// Neutral-site games count like any other; only the opponent's rank matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankedWinPct {
    tally: Tally,
}

impl Accumulator for RankedWinPct {
    fn observe(&mut self, game: &GameRecord, team: TeamId) -> Result<()> {
        let rank = game
            .opponent_rank(team)
            .ok_or(HoopsError::NotAParticipant { team })?;
        if rank > 0 {
            let won = game
                .did_win(team)
                .ok_or(HoopsError::NotAParticipant { team })?;
            self.tally.record(won);
        }
        Ok(())
    }

    fn value(&self) -> f64 {
        self.tally.ratio()
    }
}

/// Reads each game's own pre-known fields (venue, schedule role)
///
/// Never aggregate outcome-derived stats through this; use an accumulator.
pub struct PerGame<'a, F> {
    games: slice::Iter<'a, &'a GameRecord>,
    team: TeamId,
    read: F,
}

impl<'a, F> PerGame<'a, F>
where
    F: Fn(&GameRecord, TeamId) -> Result<f64>,
{
    pub fn new(games: &'a [&'a GameRecord], team: TeamId, read: F) -> Self {
        PerGame {
            games: games.iter(),
            team,
            read,
        }
    }
}

impl<'a, F> Iterator for PerGame<'a, F>
where
    F: Fn(&GameRecord, TeamId) -> Result<f64>,
{
    type Item = Result<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        let game = *self.games.next()?;
        Some((self.read)(game, self.team))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.games.size_hint()
    }
}

pub fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
