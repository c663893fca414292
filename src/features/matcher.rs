//! Cross-team feature matching
//!
//! Runs every registered generator over every team-season of a year and
//! files the values by (game, team), so each game ends up holding one
//! feature vector per participant.

use rayon::prelude::*;
use std::collections::HashMap;

use crate::data::series::TeamSeasonSeries;
use crate::data::store::RecordStore;
use crate::features::registry::FeatureRegistry;
use crate::{GameId, GameRecord, HoopsError, Result, TeamId, Verbosity};

/// One team's features for one game, in registry column order
///
/// `None` marks a value whose generator failed for that team-season.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<Option<f64>>);

impl FeatureVector {
    pub fn unknown(width: usize) -> Self {
        FeatureVector(vec![None; width])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<f64> {
        self.0.get(column).copied().flatten()
    }

    pub fn set(&mut self, column: usize, value: f64) {
        if let Some(cell) = self.0.get_mut(column) {
            *cell = Some(value);
        }
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }
}

/// Per-game, per-participant feature vectors for one season
#[derive(Debug, Clone)]
pub struct UnmatchedFeatureTable {
    width: usize,
    entries: HashMap<GameId, HashMap<TeamId, FeatureVector>>,
}

impl UnmatchedFeatureTable {
    pub fn new(width: usize) -> Self {
        UnmatchedFeatureTable {
            width,
            entries: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of games with at least one participant's features filed
    pub fn games(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, game: GameId, team: TeamId) -> Option<&FeatureVector> {
        self.entries.get(&game).and_then(|teams| teams.get(&team))
    }

    /// Vector slot for `team`, creating unknown vectors for both participants
    /// the first time a game is seen
    fn slot(&mut self, id: GameId, game: &GameRecord, team: TeamId) -> &mut FeatureVector {
        let width = self.width;
        let teams = self.entries.entry(id).or_insert_with(|| {
            HashMap::from([
                (game.home_team, FeatureVector::unknown(width)),
                (game.away_team, FeatureVector::unknown(width)),
            ])
        });
        teams
            .entry(team)
            .or_insert_with(|| FeatureVector::unknown(width))
    }

    fn insert_season(&mut self, season: &SeasonFeatures<'_>) {
        let team = season.series.team;
        for (i, (id, game)) in season.series.iter().enumerate() {
            let vector = self.slot(id, game, team);
            for (column, values) in season.columns.iter().enumerate() {
                if let Some(values) = values {
                    vector.set(column, values[i]);
                }
            }
        }
    }
}

/// A generator abandoned for one team-season
#[derive(Debug)]
pub struct FeatureFailure {
    pub feature: &'static str,
    pub error: HoopsError,
}

/// Every feature column for one team-season
#[derive(Debug)]
pub struct SeasonFeatures<'a> {
    pub series: TeamSeasonSeries<'a>,
    /// One entry per registry column; `None` when that generator failed
    pub columns: Vec<Option<Vec<f64>>>,
    pub failures: Vec<FeatureFailure>,
}

/// What a run dropped or isolated along the way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub years: usize,
    pub team_seasons: usize,
    /// Team-seasons left with no resolvable games
    pub empty_team_seasons: usize,
    /// Schedule references missing from the store
    pub pruned_games: usize,
    /// (team-season, feature) pairs left unknown
    pub isolated_failures: usize,
}

pub struct FeatureMatcher<'r> {
    registry: &'r FeatureRegistry,
    verbosity: Verbosity,
    parallel: bool,
}

impl<'r> FeatureMatcher<'r> {
    pub fn new(registry: &'r FeatureRegistry, verbosity: Verbosity) -> Self {
        FeatureMatcher {
            registry,
            verbosity,
            parallel: true,
        }
    }

    /// Spread team-seasons over the rayon pool (the default)
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every generator over one series
    ///
    /// A generator that fails anywhere in the season loses its whole column
    /// for that season; the other generators are unaffected.
    pub fn season_features<'a>(&self, series: TeamSeasonSeries<'a>) -> SeasonFeatures<'a> {
        let mut columns = Vec::with_capacity(self.registry.len());
        let mut failures = Vec::new();

        for feature in self.registry.iter() {
            let values: Result<Vec<f64>> = feature
                .generator
                .generate(series.games(), series.team)
                .collect();
            match values {
                Ok(values) if values.len() == series.len() => columns.push(Some(values)),
                Ok(values) => {
                    failures.push(FeatureFailure {
                        feature: feature.name,
                        error: HoopsError::ShortSeries {
                            produced: values.len(),
                            expected: series.len(),
                        },
                    });
                    columns.push(None);
                }
                Err(error) => {
                    failures.push(FeatureFailure {
                        feature: feature.name,
                        error,
                    });
                    columns.push(None);
                }
            }
        }

        SeasonFeatures {
            series,
            columns,
            failures,
        }
    }

    fn team_season<'a, S>(&self, store: &'a S, team: TeamId, year: u16) -> Result<SeasonFeatures<'a>>
    where
        S: RecordStore + ?Sized,
    {
        let series = TeamSeasonSeries::build(store, team, year)?;
        Ok(self.season_features(series))
    }

    /// Generate and file features for every team-season of `year`
    pub fn match_year<S>(
        &self,
        store: &S,
        year: u16,
        report: &mut GenerationReport,
    ) -> Result<UnmatchedFeatureTable>
    where
        S: RecordStore + Sync + ?Sized,
    {
        let teams = store.teams(year)?;

        let seasons: Vec<SeasonFeatures<'_>> = if self.parallel {
            teams
                .par_iter()
                .map(|team| self.team_season(store, *team, year))
                .collect::<Result<Vec<_>>>()?
        } else {
            teams
                .iter()
                .map(|team| self.team_season(store, *team, year))
                .collect::<Result<Vec<_>>>()?
        };

        let mut table = UnmatchedFeatureTable::new(self.registry.len());
        for season in &seasons {
            self.note(season, year, report);
            if !season.series.is_empty() {
                table.insert_season(season);
            }
        }

        if self.verbosity.reports_failures() {
            log::info!(
                "{}: {} team-seasons, {} games matched",
                year,
                seasons.len(),
                table.games()
            );
        }
        Ok(table)
    }

    fn note(&self, season: &SeasonFeatures<'_>, year: u16, report: &mut GenerationReport) {
        let series = &season.series;
        report.team_seasons += 1;
        report.pruned_games += series.pruned().len();
        report.isolated_failures += season.failures.len();

        if series.is_empty() {
            report.empty_team_seasons += 1;
            if self.verbosity.reports_failures() {
                log::warn!("{} {}: no resolvable games, skipping", series.team, year);
            }
            return;
        }

        if self.verbosity.reports_failures() {
            for failure in &season.failures {
                log::warn!(
                    "{} {}: {} left unknown: {}",
                    series.team,
                    year,
                    failure.feature,
                    failure.error
                );
            }
        }

        if self.verbosity.reports_detail() {
            for id in series.pruned() {
                log::debug!("{} {}: pruned {}", series.team, year, id);
            }
            for (id, game) in series.iter() {
                log::debug!("{} {}: {} at {}", series.team, year, id, game.date);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::store::SeasonArchive;
    use crate::StatValue;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn make_game(home: i64, away: i64, day: u32, home_score: u16, away_score: u16) -> GameRecord {
        let stats = |blk: f64| {
            let mut s = BTreeMap::new();
            s.insert("BLK".to_string(), StatValue::Number(blk));
            s
        };
        GameRecord {
            date: NaiveDate::from_ymd_opt(2019, 1, day)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            home_team: TeamId(home),
            away_team: TeamId(away),
            home_score,
            away_score,
            home_rank: 0,
            away_rank: 0,
            neutral_site: false,
            home_stats: stats(home as f64),
            away_stats: stats(away as f64),
        }
    }

    fn league() -> SeasonArchive {
        let mut archive = SeasonArchive::new();
        archive.add_game(2019, GameId(1), make_game(1, 2, 1, 70, 60));
        archive.add_game(2019, GameId(2), make_game(2, 3, 3, 70, 60));
        archive.add_game(2019, GameId(3), make_game(3, 1, 5, 70, 60));
        archive.add_game(2019, GameId(4), make_game(1, 2, 7, 50, 60));
        archive
    }

    /// Features computable from scores and BLK alone
    fn registry() -> FeatureRegistry {
        FeatureRegistry::excluding(&[
            "seasonSTL",
            "seasonDREB",
            "seasonOREB",
            "seasonAST",
            "seasonTO",
            "seasonPF",
            "seasonFG",
            "season3PT",
            "seasonFT",
            "seasonFGPCT",
            "season3PTPCT",
            "seasonFTPCT",
        ])
        .unwrap()
    }

    #[test]
    fn test_both_participants_filed() {
        let archive = league();
        let registry = registry();
        let matcher = FeatureMatcher::new(&registry, Verbosity::Quiet);
        let mut report = GenerationReport::default();
        let table = matcher.match_year(&archive, 2019, &mut report).unwrap();

        assert_eq!(table.games(), 4);
        for (id, game) in &archive.games {
            assert!(table.get(*id, game.home_team).is_some());
            assert!(table.get(*id, game.away_team).is_some());
        }
        assert_eq!(report.team_seasons, 3);
        assert_eq!(report.empty_team_seasons, 0);
    }

    #[test]
    fn test_values_come_from_each_teams_own_series() {
        let archive = league();
        let registry = registry();
        let matcher = FeatureMatcher::new(&registry, Verbosity::Quiet);
        let mut report = GenerationReport::default();
        let table = matcher.match_year(&archive, 2019, &mut report).unwrap();

        let streak = registry.index_of("streak").unwrap();
        let record = registry.index_of("record").unwrap();
        // Team 1: W (g1), L (g3), then g4
        let team1 = table.get(GameId(4), TeamId(1)).unwrap();
        assert_eq!(team1.get(streak), Some(-1.0));
        assert_eq!(team1.get(record), Some(0.5));
        // Team 2: L (g1), W (g2), then g4
        let team2 = table.get(GameId(4), TeamId(2)).unwrap();
        assert_eq!(team2.get(streak), Some(1.0));
        assert_eq!(team2.get(record), Some(0.5));
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let archive = league();
        let registry = registry();
        let mut report = GenerationReport::default();
        let parallel = FeatureMatcher::new(&registry, Verbosity::Quiet)
            .match_year(&archive, 2019, &mut report)
            .unwrap();
        let sequential = FeatureMatcher::new(&registry, Verbosity::Quiet)
            .parallel(false)
            .match_year(&archive, 2019, &mut report)
            .unwrap();

        for (id, game) in &archive.games {
            for team in [game.home_team, game.away_team] {
                assert_eq!(parallel.get(*id, team), sequential.get(*id, team));
            }
        }
    }

    #[test]
    fn test_failure_isolated_to_series_and_feature() {
        let mut archive = league();
        archive
            .games
            .get_mut(&GameId(2))
            .unwrap()
            .home_stats
            .insert("BLK".to_string(), StatValue::Text("??".into()));

        let registry = registry();
        let matcher = FeatureMatcher::new(&registry, Verbosity::Quiet);
        let mut report = GenerationReport::default();
        let table = matcher.match_year(&archive, 2019, &mut report).unwrap();

        let blk = registry.index_of("seasonBLK").unwrap();
        // Team 2's season reads its own BLK from game 2
        for id in [GameId(1), GameId(2), GameId(4)] {
            let vector = table.get(id, TeamId(2)).unwrap();
            assert_eq!(vector.get(blk), None);
            assert_eq!(vector.values().iter().filter(|v| v.is_none()).count(), 1);
        }
        // Team 3 played game 2 too, but reads the away half
        assert!(table.get(GameId(2), TeamId(3)).unwrap().is_complete());
        assert!(table.get(GameId(4), TeamId(1)).unwrap().is_complete());
        assert_eq!(report.isolated_failures, 1);
    }

    #[test]
    fn test_empty_series_reported() {
        let mut archive = league();
        archive.schedule_game(TeamId(9), 2019, GameId(404));

        let registry = registry();
        let matcher = FeatureMatcher::new(&registry, Verbosity::Normal);
        let mut report = GenerationReport::default();
        let table = matcher.match_year(&archive, 2019, &mut report).unwrap();

        assert_eq!(table.games(), 4);
        assert_eq!(report.empty_team_seasons, 1);
        assert_eq!(report.pruned_games, 1);
    }
}
