//! Record store access
//!
//! The core only reads games; how they were fetched and persisted is the
//! caller's business. `SeasonArchive` is the in-memory store used by tests
//! and by callers that already hold a downloaded season dump.

use crate::{GameId, GameRecord, HoopsError, Result, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::path::Path;

/// Read-only view of downloaded games and schedules
///
/// `years`, `teams` and `schedule` failures are structural and abort a run.
/// A missing game is not: `game` returns `None` and the reference is pruned.
pub trait RecordStore {
    /// Seasons available, in processing order
    fn years(&self) -> Result<Vec<u16>>;

    /// Teams with a schedule for `year`, in processing order
    fn teams(&self, year: u16) -> Result<Vec<TeamId>>;

    /// Regular-season game ids for a team, in discovery order
    fn schedule(&self, team: TeamId, year: u16) -> Result<Vec<GameId>>;

    fn game(&self, id: GameId) -> Option<&GameRecord>;
}

/// Game ids a team played in one season
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSchedule {
    #[serde(default)]
    pub reg: Vec<GameId>,
    /// Kept for completeness; postseason games never enter the table
    #[serde(default)]
    pub post: Vec<GameId>,
}

/// Every season's schedules and games held in memory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeasonArchive {
    pub years: Vec<u16>,
    pub schedules: BTreeMap<TeamId, BTreeMap<u16, TeamSchedule>>,
    pub games: HashMap<GameId, GameRecord>,
}

impl SeasonArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an archive previously written with `save`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer(std::io::BufWriter::new(file), self)?;
        Ok(())
    }

    /// Register a game without attaching it to any schedule
    pub fn insert_game(&mut self, id: GameId, game: GameRecord) {
        self.games.insert(id, game);
    }

    /// Append a regular-season game to a team's schedule
    pub fn schedule_game(&mut self, team: TeamId, year: u16, id: GameId) {
        if !self.years.contains(&year) {
            self.years.push(year);
        }
        self.schedules
            .entry(team)
            .or_default()
            .entry(year)
            .or_default()
            .reg
            .push(id);
    }

    /// Register a game and append it to both participants' schedules
    pub fn add_game(&mut self, year: u16, id: GameId, game: GameRecord) {
        self.schedule_game(game.home_team, year, id);
        self.schedule_game(game.away_team, year, id);
        self.insert_game(id, game);
    }

    /// Total regular-season references whose game is present
    pub fn resolvable_references(&self) -> usize {
        self.schedules
            .values()
            .flat_map(|seasons| seasons.values())
            .flat_map(|s| s.reg.iter())
            .filter(|id| self.games.contains_key(id))
            .count()
    }
}

impl RecordStore for SeasonArchive {
    fn years(&self) -> Result<Vec<u16>> {
        Ok(self.years.clone())
    }

    fn teams(&self, year: u16) -> Result<Vec<TeamId>> {
        if !self.years.contains(&year) {
            return Err(HoopsError::Store(format!("season {} is not in the archive", year)));
        }
        Ok(self
            .schedules
            .iter()
            .filter(|(_, seasons)| seasons.contains_key(&year))
            .map(|(team, _)| *team)
            .collect())
    }

    fn schedule(&self, team: TeamId, year: u16) -> Result<Vec<GameId>> {
        self.schedules
            .get(&team)
            .and_then(|seasons| seasons.get(&year))
            .map(|s| s.reg.clone())
            .ok_or_else(|| HoopsError::Store(format!("no {} schedule for {}", year, team)))
    }

    fn game(&self, id: GameId) -> Option<&GameRecord> {
        self.games.get(&id)
    }
}
