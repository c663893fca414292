//! Training table assembly
//!
//! Every game appears twice: once with each participant as the target team.
//! A row is the series id, the target's feature vector and the opponent's
//! feature vector; the label says whether the target won.

use crate::data::series::TeamSeasonSeries;
use crate::data::store::RecordStore;
use crate::features::matcher::{FeatureMatcher, FeatureVector, GenerationReport, UnmatchedFeatureTable};
use crate::features::registry::FeatureRegistry;
use crate::{Config, GameId, Result, TeamId, Verbosity};

/// One game seen from one participant
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Shared by every row of one team-season
    pub series_id: u32,
    pub game: GameId,
    pub team: TeamId,
    pub opponent_team: TeamId,
    pub target: FeatureVector,
    pub opponent: FeatureVector,
}

impl Row {
    /// `[series_id, target.., opponent..]`
    pub fn cells(&self) -> Vec<Option<f64>> {
        let mut cells = Vec::with_capacity(1 + self.target.len() + self.opponent.len());
        cells.push(Some(self.series_id as f64));
        cells.extend_from_slice(self.target.values());
        cells.extend_from_slice(self.opponent.values());
        cells
    }

    pub fn is_complete(&self) -> bool {
        self.target.is_complete() && self.opponent.is_complete()
    }
}

/// The assembled matrix and label vector
#[derive(Debug, Clone)]
pub struct TrainingTable {
    feature_names: Vec<String>,
    rows: Vec<Row>,
    labels: Vec<bool>,
}

impl TrainingTable {
    pub fn new(feature_names: Vec<String>) -> Self {
        TrainingTable {
            feature_names,
            rows: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn push(&mut self, row: Row, won: bool) {
        self.rows.push(row);
        self.labels.push(won);
    }

    /// Feature names in column order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// F, the number of features per team
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Cells per row, `1 + 2F`
    pub fn width(&self) -> usize {
        1 + 2 * self.feature_count()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn labels(&self) -> &[bool] {
        &self.labels
    }

    /// Self-describing header for every cell of a row
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once("series".to_string())
            .chain(self.feature_names.iter().map(|n| format!("target.{}", n)))
            .chain(self.feature_names.iter().map(|n| format!("opponent.{}", n)))
            .collect()
    }

    /// Every row as cells, `None` where a value is unknown
    pub fn matrix(&self) -> Vec<Vec<Option<f64>>> {
        self.rows.iter().map(Row::cells).collect()
    }

    /// Every row as cells with unknown values replaced by `unknown`
    pub fn to_dense(&self, unknown: f64) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| row.cells().into_iter().map(|c| c.unwrap_or(unknown)).collect())
            .collect()
    }
}

/// Builds the training table from a record store
pub struct TableBuilder {
    registry: FeatureRegistry,
    verbosity: Verbosity,
    parallel: bool,
}

impl TableBuilder {
    pub fn new(config: &Config) -> Result<Self> {
        let verbosity = config.verbosity();
        let exclude = config.features.exclude.as_slice();
        if verbosity.reports_failures() {
            for name in exclude.iter().filter(|n| !FeatureRegistry::is_known(n.as_str())) {
                log::warn!("Excluded feature {} does not exist", name);
            }
        }
        let registry = FeatureRegistry::excluding(exclude)?;
        if verbosity.reports_detail() {
            log::debug!("Generating features: {:?}", registry.names());
        }
        Ok(TableBuilder {
            registry,
            verbosity,
            parallel: config.run.parallel,
        })
    }

    pub fn with_registry(registry: FeatureRegistry, verbosity: Verbosity) -> Self {
        TableBuilder {
            registry,
            verbosity,
            parallel: true,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    /// Run the whole pipeline over every season in the store
    ///
    /// Seasons are processed one at a time and their matched features are
    /// dropped before the next season starts. Series ids count up once per
    /// (team, year) in year-then-team order, including team-seasons that end
    /// up with no rows.
    pub fn build<S>(&self, store: &S) -> Result<(TrainingTable, GenerationReport)>
    where
        S: RecordStore + Sync + ?Sized,
    {
        let names = self.registry.names().into_iter().map(String::from).collect();
        let mut table = TrainingTable::new(names);
        let mut report = GenerationReport::default();
        let matcher = FeatureMatcher::new(&self.registry, self.verbosity).parallel(self.parallel);

        let years = store.years()?;
        if self.verbosity.reports_detail() {
            log::debug!("Generating {} features over seasons {:?}", self.registry.len(), years);
        }

        let mut series_id = 0u32;
        for year in years {
            report.years += 1;
            let features = matcher.match_year(store, year, &mut report)?;

            let before = table.len();
            for team in store.teams(year)? {
                series_id += 1;
                let series = TeamSeasonSeries::build(store, team, year)?;
                self.emit_rows(&mut table, series_id, &series, &features);
            }

            if self.verbosity.reports_failures() {
                log::info!("{}: emitted {} rows", year, table.len() - before);
            }
        }

        if self.verbosity.reports_failures() {
            log::info!(
                "Built table with {} rows x {} columns ({} isolated failures, {} pruned games)",
                table.len(),
                table.width(),
                report.isolated_failures,
                report.pruned_games
            );
        }
        Ok((table, report))
    }

    fn emit_rows(
        &self,
        table: &mut TrainingTable,
        series_id: u32,
        series: &TeamSeasonSeries<'_>,
        features: &UnmatchedFeatureTable,
    ) {
        let team = series.team;
        let width = features.width();
        let lookup = |game: GameId, team: TeamId| {
            features
                .get(game, team)
                .cloned()
                .unwrap_or_else(|| FeatureVector::unknown(width))
        };

        for (id, game) in series.iter() {
            let Some(opponent_team) = game.opponent(team) else {
                if self.verbosity.reports_failures() {
                    log::warn!("{} listed in the schedule of {} but did not play", id, team);
                }
                continue;
            };
            // A tie is a loss from both sides
            let won = game.winner() == Some(team);
            let row = Row {
                series_id,
                game: id,
                team,
                opponent_team,
                target: lookup(id, team),
                opponent: lookup(id, opponent_team),
            };
            table.push(row, won);
        }
    }
}
