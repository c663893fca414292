//! Feature catalogue
//!
//! A fixed set of named generators built from the causal primitives. Column
//! order is always the byte order of the feature names, regardless of how the
//! catalogue is written down.

use crate::features::box_score;
use crate::features::primitives::{
    flag, Causal, CausalValues, PerGame, RankedWinPct, RunningMean, Streak, WinPct,
};
use crate::{GameRecord, HoopsError, Result, TeamId};

/// A per-game scalar averaged by `Generator::SeasonAverage`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    PointsFor,
    PointsAgainst,
    /// Numeric box-score entry
    Counting(&'static str),
    /// Made shots of a made-attempted line
    Made(&'static str),
    /// Made over attempted of a made-attempted line
    Pct(&'static str),
}

impl Extractor {
    pub fn extract(self, game: &GameRecord, team: TeamId) -> Result<f64> {
        match self {
            Extractor::PointsFor => box_score::points_for(game, team),
            Extractor::PointsAgainst => box_score::points_against(game, team),
            Extractor::Counting(label) => box_score::counting_stat(game, team, label),
            Extractor::Made(label) => box_score::shots_made(game, team, label),
            Extractor::Pct(label) => box_score::shooting_pct(game, team, label),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Home team at a non-neutral venue
    AtHome,
    /// Own poll rank entering the game, 0 when unranked
    Rank,
    Streak,
    /// Running win percentage
    Record,
    /// Running win percentage against ranked opponents
    RankedRecord,
    SeasonAverage(Extractor),
}

impl Generator {
    /// One value per game of `games`, each from strictly earlier games
    pub fn generate<'a>(self, games: &'a [&'a GameRecord], team: TeamId) -> CausalValues<'a> {
        match self {
            Generator::AtHome => Box::new(PerGame::new(games, team, |game: &GameRecord, team| {
                Ok(flag(game.hosted_by(team)))
            })),
            Generator::Rank => Box::new(PerGame::new(games, team, |game: &GameRecord, team| -> Result<f64> {
                let rank = game
                    .own_rank(team)
                    .ok_or(HoopsError::NotAParticipant { team })?;
                Ok(f64::from(rank.max(0)))
            })),
            Generator::Streak => Box::new(Causal::new(games, team, Streak::default())),
            Generator::Record => Box::new(Causal::new(games, team, WinPct::default())),
            Generator::RankedRecord => Box::new(Causal::new(games, team, RankedWinPct::default())),
            Generator::SeasonAverage(extractor) => Box::new(Causal::new(
                games,
                team,
                RunningMean::new(move |game: &GameRecord, team| extractor.extract(game, team)),
            )),
        }
    }

    /// True when value 0 is a fixed prior rather than read from game 0
    pub fn is_causal_aggregate(self) -> bool {
        !matches!(self, Generator::AtHome | Generator::Rank)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDef {
    pub name: &'static str,
    pub generator: Generator,
}

const fn def(name: &'static str, generator: Generator) -> FeatureDef {
    FeatureDef { name, generator }
}

const fn average(name: &'static str, extractor: Extractor) -> FeatureDef {
    def(name, Generator::SeasonAverage(extractor))
}

/// Every feature the crate knows how to generate
pub const CATALOGUE: &[FeatureDef] = &[
    def("atHome", Generator::AtHome),
    def("rank", Generator::Rank),
    def("streak", Generator::Streak),
    def("record", Generator::Record),
    def("rankedRecord", Generator::RankedRecord),
    average("seasonPTS", Extractor::PointsFor),
    average("seasonPA", Extractor::PointsAgainst),
    average("seasonBLK", Extractor::Counting("BLK")),
    average("seasonSTL", Extractor::Counting("STL")),
    average("seasonDREB", Extractor::Counting("DREB")),
    average("seasonOREB", Extractor::Counting("OREB")),
    average("seasonAST", Extractor::Counting("AST")),
    average("seasonTO", Extractor::Counting("TO")),
    average("seasonPF", Extractor::Counting("PF")),
    average("seasonFG", Extractor::Made("FG")),
    average("season3PT", Extractor::Made("3PT")),
    average("seasonFT", Extractor::Made("FT")),
    average("seasonFGPCT", Extractor::Pct("FG")),
    average("season3PTPCT", Extractor::Pct("3PT")),
    average("seasonFTPCT", Extractor::Pct("FT")),
];

/// The catalogue minus exclusions, in column order
#[derive(Debug, Clone)]
pub struct FeatureRegistry {
    features: Vec<FeatureDef>,
}

impl FeatureRegistry {
    /// Registry over the full catalogue
    pub fn all() -> Self {
        FeatureRegistry {
            features: Self::sorted(CATALOGUE.to_vec()),
        }
    }

    /// Registry with the named features removed
    ///
    /// Names that are not in the catalogue are ignored; see `is_known`.
    pub fn excluding<S: AsRef<str>>(exclude: &[S]) -> Result<Self> {
        let kept: Vec<FeatureDef> = CATALOGUE
            .iter()
            .filter(|f| !exclude.iter().any(|name| name.as_ref() == f.name))
            .copied()
            .collect();
        if kept.is_empty() {
            return Err(HoopsError::EmptyRegistry);
        }
        Ok(FeatureRegistry {
            features: Self::sorted(kept),
        })
    }

    fn sorted(mut features: Vec<FeatureDef>) -> Vec<FeatureDef> {
        features.sort_by(|a, b| a.name.cmp(b.name));
        features
    }

    pub fn is_known(name: &str) -> bool {
        CATALOGUE.iter().any(|f| f.name == name)
    }

    /// Number of features, F
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureDef> {
        self.features.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.name).collect()
    }

    /// Column of a feature within a team's vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.features.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_sorted() {
        let registry = FeatureRegistry::all();
        let names = registry.names();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "atHome");
        assert_eq!(registry.len(), CATALOGUE.len());
    }

    #[test]
    fn test_catalogue_names_unique() {
        let mut names: Vec<_> = CATALOGUE.iter().map(|f| f.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CATALOGUE.len());
    }

    #[test]
    fn test_exclusions_shift_columns() {
        let all = FeatureRegistry::all();
        let trimmed = FeatureRegistry::excluding(&["atHome", "notAFeature"]).unwrap();
        assert_eq!(trimmed.len(), all.len() - 1);
        assert_eq!(trimmed.index_of("atHome"), None);
        assert_eq!(
            trimmed.index_of("rankedRecord"),
            all.index_of("rankedRecord").map(|i| i - 1)
        );
        assert!(!FeatureRegistry::is_known("notAFeature"));
    }

    #[test]
    fn test_excluding_everything_fails() {
        let names: Vec<&str> = CATALOGUE.iter().map(|f| f.name).collect();
        assert!(matches!(
            FeatureRegistry::excluding(&names),
            Err(HoopsError::EmptyRegistry)
        ));
    }

    #[test]
    fn test_rank_reads_current_game() {
        use crate::StatValue;
        use chrono::NaiveDate;
        use std::collections::BTreeMap;

        let game = |day: u32, home_rank: i32, away_rank: i32| GameRecord {
            date: NaiveDate::from_ymd_opt(2019, 1, day)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            home_team: TeamId(1),
            away_team: TeamId(2),
            home_score: 70,
            away_score: 60,
            home_rank,
            away_rank,
            neutral_site: false,
            home_stats: BTreeMap::from([("BLK".to_string(), StatValue::Number(1.0))]),
            away_stats: BTreeMap::new(),
        };
        let games = vec![game(1, 7, 3), game(2, -1, 12), game(3, 0, 25)];
        let refs: Vec<&GameRecord> = games.iter().collect();

        let home: Vec<f64> = Generator::Rank
            .generate(&refs, TeamId(1))
            .map(|v| v.unwrap())
            .collect();
        let away: Vec<f64> = Generator::Rank
            .generate(&refs, TeamId(2))
            .map(|v| v.unwrap())
            .collect();
        assert_eq!(home, vec![7.0, 0.0, 0.0]);
        assert_eq!(away, vec![3.0, 12.0, 25.0]);
        assert!(!Generator::Rank.is_causal_aggregate());

        let outsider: Vec<_> = Generator::Rank.generate(&refs, TeamId(9)).collect();
        assert!(matches!(outsider[0], Err(HoopsError::NotAParticipant { .. })));
    }

    #[test]
    fn test_column_order_independent_of_catalogue_order() {
        let mut reversed = CATALOGUE.to_vec();
        reversed.reverse();
        let from_reversed: Vec<_> = FeatureRegistry::sorted(reversed)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(from_reversed, FeatureRegistry::all().names());
    }
}
