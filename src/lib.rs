//! College basketball feature generation
//!
//! Turns a static history of regular-season games into a symmetric training
//! table where every feature of a game is computed from strictly earlier games.

pub mod data;
pub mod features;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Unique identifier for a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Unique identifier for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GameId(pub i64);

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Game({})", self.0)
    }
}

/// A box-score entry as the source reports it
///
/// Counting stats usually arrive as numbers, but the source also sends them
/// as text, and shooting lines are text pairs such as `"25-60"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    /// Numeric value, parsing text if needed
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StatValue::Number(v) => Some(*v),
            StatValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Made and attempted counts of a `"made-attempted"` shooting line
    pub fn as_made_attempted(&self) -> Option<(f64, f64)> {
        let StatValue::Text(s) = self else {
            return None;
        };
        let (made, attempted) = s.trim().split_once('-')?;
        let made: f64 = made.trim().parse().ok()?;
        let attempted: f64 = attempted.trim().parse().ok()?;
        if made < 0.0 || attempted < made {
            return None;
        }
        Some((made, attempted))
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(v) => write!(f, "{}", v),
            StatValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

/// A single completed game as held by the record store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_score: u16,
    pub away_score: u16,
    /// Poll rank entering the game, <= 0 when unranked
    #[serde(default)]
    pub home_rank: i32,
    #[serde(default)]
    pub away_rank: i32,
    #[serde(default)]
    pub neutral_site: bool,
    /// Entries reported as null are left out, as if never recorded
    #[serde(default, deserialize_with = "box_score_half::deserialize")]
    pub home_stats: BTreeMap<String, StatValue>,
    #[serde(default, deserialize_with = "box_score_half::deserialize")]
    pub away_stats: BTreeMap<String, StatValue>,
}

impl GameRecord {
    /// Returns the winning team, or None for a tie
    pub fn winner(&self) -> Option<TeamId> {
        match self.home_score.cmp(&self.away_score) {
            std::cmp::Ordering::Greater => Some(self.home_team),
            std::cmp::Ordering::Less => Some(self.away_team),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Check if the given team won this game
    pub fn did_win(&self, team: TeamId) -> Option<bool> {
        if team == self.home_team {
            Some(self.home_score > self.away_score)
        } else if team == self.away_team {
            Some(self.away_score > self.home_score)
        } else {
            None
        }
    }

    /// Get the opponent for a given team
    pub fn opponent(&self, team: TeamId) -> Option<TeamId> {
        if team == self.home_team {
            Some(self.away_team)
        } else if team == self.away_team {
            Some(self.home_team)
        } else {
            None
        }
    }


    /// True only for the listed home team of a game not played at a neutral site
    pub fn hosted_by(&self, team: TeamId) -> bool {
        team == self.home_team && !self.neutral_site
    }

    /// Poll rank of `team` itself entering the game
    pub fn own_rank(&self, team: TeamId) -> Option<i32> {
        if team == self.home_team {
            Some(self.home_rank)
        } else if team == self.away_team {
            Some(self.away_rank)
        } else {
            None
        }
    }

    /// Rank of the opposing team entering the game
    pub fn opponent_rank(&self, team: TeamId) -> Option<i32> {
        if team == self.home_team {
            Some(self.away_rank)
        } else if team == self.away_team {
            Some(self.home_rank)
        } else {
            None
        }
    }

    /// Get score for a specific team
    pub fn score_for(&self, team: TeamId) -> Option<u16> {
        if team == self.home_team {
            Some(self.home_score)
        } else if team == self.away_team {
            Some(self.away_score)
        } else {
            None
        }
    }

    /// Get score against a specific team
    pub fn score_against(&self, team: TeamId) -> Option<u16> {
        if team == self.home_team {
            Some(self.away_score)
        } else if team == self.away_team {
            Some(self.home_score)
        } else {
            None
        }
    }

    /// The box-score half belonging to `team`
    pub fn stats_for(&self, team: TeamId) -> Option<&BTreeMap<String, StatValue>> {
        if team == self.home_team {
            Some(&self.home_stats)
        } else if team == self.away_team {
            Some(&self.away_stats)
        } else {
            None
        }
    }
}

/// Serde adapter for the source's `2018-11-06T23:00Z` timestamps
mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%MZ";
    const FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(&raw, FORMAT_SECONDS))
            .map_err(serde::de::Error::custom)
    }
}

mod box_score_half {
    use super::StatValue;
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, StatValue>, D::Error> {
        let raw = BTreeMap::<String, Option<StatValue>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .filter_map(|(label, value)| value.map(|v| (label, v)))
            .collect())
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error("Statistic {label} missing from box score")]
    MissingStatistic { label: String },

    #[error("Statistic {label} has unusable value {value}")]
    MalformedStatistic { label: String, value: String },

    #[error("{team} did not play in this game")]
    NotAParticipant { team: TeamId },

    #[error("Generator produced {produced} values for {expected} games")]
    ShortSeries { produced: usize, expected: usize },

    #[error("No features left to generate after exclusions")]
    EmptyRegistry,

    #[error("Record store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// How much diagnostic output a run emits. Never affects results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    #[default]
    Quiet,
    /// Isolated failures and per-year summaries
    Normal,
    /// Per-series detail
    Debug,
}

impl Verbosity {
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Verbosity::Quiet,
            1 => Verbosity::Normal,
            _ => Verbosity::Debug,
        }
    }

    pub fn reports_failures(self) -> bool {
        self >= Verbosity::Normal
    }

    pub fn reports_detail(self) -> bool {
        self >= Verbosity::Debug
    }
}

/// Run configuration loaded from config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub features: FeatureConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Feature names to leave out of the table
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub verbose: u8,
    /// Generate team-season features on the rayon pool
    pub parallel: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            verbose: 0,
            parallel: true,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_level(self.run.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_game(home_score: u16, away_score: u16, neutral_site: bool) -> GameRecord {
        GameRecord {
            date: NaiveDate::from_ymd_opt(2018, 11, 6)
                .unwrap()
                .and_hms_opt(23, 0, 0)
                .unwrap(),
            home_team: TeamId(1),
            away_team: TeamId(2),
            home_score,
            away_score,
            home_rank: 5,
            away_rank: -1,
            neutral_site,
            home_stats: BTreeMap::new(),
            away_stats: BTreeMap::new(),
        }
    }

    #[test]
    fn test_perspective_helpers() {
        let game = make_game(70, 64, false);
        assert_eq!(game.did_win(TeamId(1)), Some(true));
        assert_eq!(game.did_win(TeamId(2)), Some(false));
        assert_eq!(game.did_win(TeamId(3)), None);
        assert_eq!(game.opponent(TeamId(2)), Some(TeamId(1)));
        assert_eq!(game.opponent_rank(TeamId(2)), Some(5));
        assert_eq!(game.score_against(TeamId(1)), Some(64));
        assert_eq!(game.own_rank(TeamId(1)), Some(5));
        assert_eq!(game.own_rank(TeamId(2)), Some(-1));
        assert_eq!(game.own_rank(TeamId(3)), None);
        assert_eq!(game.winner(), Some(TeamId(1)));
    }

    #[test]
    fn test_neutral_site_has_no_host() {
        let game = make_game(70, 64, true);
        assert!(!game.hosted_by(TeamId(1)));
        assert!(!game.hosted_by(TeamId(2)));
        assert!(make_game(70, 64, false).hosted_by(TeamId(1)));
    }

    #[test]
    fn test_stat_value_parsing() {
        assert_eq!(StatValue::Number(4.0).as_number(), Some(4.0));
        assert_eq!(StatValue::Text(" 12 ".into()).as_number(), Some(12.0));
        assert_eq!(StatValue::Text("25-60".into()).as_number(), None);
        assert_eq!(
            StatValue::Text("25-60".into()).as_made_attempted(),
            Some((25.0, 60.0))
        );
        assert_eq!(StatValue::Text("9-4".into()).as_made_attempted(), None);
        assert_eq!(StatValue::Number(25.0).as_made_attempted(), None);
    }

    #[test]
    fn test_game_record_json() {
        let json = r#"{
            "date": "2018-11-06T23:00Z",
            "home_team": 150,
            "away_team": 2305,
            "home_score": 84,
            "away_score": 79,
            "home_rank": 3,
            "home_stats": {"BLK": 4, "FG": "30-61"},
            "away_stats": {"BLK": "2", "FG": "28-66"}
        }"#;
        let game: GameRecord = serde_json::from_str(json).unwrap();
        assert_eq!(game.home_team, TeamId(150));
        assert_eq!(game.away_rank, 0);
        assert!(!game.neutral_site);
        assert_eq!(game.home_stats["BLK"], StatValue::Number(4.0));
        assert_eq!(game.away_stats["BLK"].as_number(), Some(2.0));
        assert_eq!(game.date.format("%Y-%m-%d %H:%M").to_string(), "2018-11-06 23:00");
    }

    #[test]
    fn test_null_stat_is_left_out() {
        let json = r#"{
            "date": "2018-11-06T23:00Z",
            "home_team": 150,
            "away_team": 2305,
            "home_score": 84,
            "away_score": 79,
            "home_stats": {"BLK": null, "STL": 6},
            "away_stats": {"BLK": 3}
        }"#;
        let game: GameRecord = serde_json::from_str(json).unwrap();
        assert!(!game.home_stats.contains_key("BLK"));
        assert_eq!(game.home_stats["STL"], StatValue::Number(6.0));
        assert!(matches!(
            features::box_score::counting_stat(&game, TeamId(150), "BLK"),
            Err(HoopsError::MissingStatistic { .. })
        ));
        assert_eq!(
            features::box_score::counting_stat(&game, TeamId(2305), "BLK").unwrap(),
            3.0
        );
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(
            r#"
            [features]
            exclude = ["seasonPF"]

            [run]
            verbose = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.features.exclude, vec!["seasonPF".to_string()]);
        assert!(config.run.parallel);
        assert_eq!(config.verbosity(), Verbosity::Debug);

        let empty = Config::from_toml("").unwrap();
        assert!(empty.features.exclude.is_empty());
        assert_eq!(empty.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_config_bad_toml() {
        assert!(matches!(
            Config::from_toml("[run]\nverbose = \"loud\""),
            Err(HoopsError::Config(_))
        ));
    }
}
