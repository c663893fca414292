//! Team-season series
//!
//! One team's regular-season games for one year, in the order they were played.

use crate::data::store::RecordStore;
use crate::{GameId, GameRecord, Result, TeamId};

/// A team's chronologically ordered regular season
///
/// Built fresh on every pass that needs it rather than cached.
#[derive(Debug, Clone)]
pub struct TeamSeasonSeries<'a> {
    pub team: TeamId,
    pub year: u16,
    ids: Vec<GameId>,
    games: Vec<&'a GameRecord>,
    /// Schedule references that the store could not resolve
    pruned: Vec<GameId>,
}

impl<'a> TeamSeasonSeries<'a> {
    /// Resolve a team's schedule against the store and sort it by game time
    ///
    /// Unresolvable ids are dropped; the sort is stable so games with equal
    /// timestamps keep their schedule order.
    pub fn build<S: RecordStore + ?Sized>(store: &'a S, team: TeamId, year: u16) -> Result<Self> {
        let schedule = store.schedule(team, year)?;

        let mut pruned = Vec::new();
        let mut resolved: Vec<(GameId, &'a GameRecord)> = Vec::with_capacity(schedule.len());
        for id in schedule {
            match store.game(id) {
                Some(game) => resolved.push((id, game)),
                None => pruned.push(id),
            }
        }

        resolved.sort_by_key(|(_, game)| game.date);
        let (ids, games) = resolved.into_iter().unzip();

        Ok(TeamSeasonSeries {
            team,
            year,
            ids,
            games,
            pruned,
        })
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    pub fn ids(&self) -> &[GameId] {
        &self.ids
    }

    pub fn games(&self) -> &[&'a GameRecord] {
        &self.games
    }

    pub fn pruned(&self) -> &[GameId] {
        &self.pruned
    }

    /// Game ids paired with their records, in play order
    pub fn iter(&self) -> impl Iterator<Item = (GameId, &'a GameRecord)> + '_ {
        self.ids.iter().copied().zip(self.games.iter().copied())
    }
}
