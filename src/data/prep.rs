//! Classifier-ready views of a training table
//!
//! None of these fit anything; they only drop the series column and deal
//! with unknown cells the way a non-temporal classifier needs.

use crate::data::dataset::TrainingTable;

/// A dense feature matrix with its header and labels
#[derive(Debug, Clone, Default)]
pub struct Prepared {
    pub columns: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<bool>,
}

impl Prepared {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl TrainingTable {
    /// Both feature blocks of every row with no unknown cell
    pub fn complete_rows(&self) -> Prepared {
        let all: Vec<usize> = (0..self.feature_count()).collect();
        self.select(&all)
    }

    /// Only features the target block knows for every row, then complete rows
    ///
    /// A feature kept for the target is kept for the opponent too, so the
    /// two blocks stay aligned.
    pub fn complete_features(&self) -> Prepared {
        let kept: Vec<usize> = (0..self.feature_count())
            .filter(|&j| self.rows().iter().all(|row| row.target.get(j).is_some()))
            .collect();
        self.select(&kept)
    }

    /// Venue indicator plus target-minus-opponent for every other feature
    ///
    /// The indicator is 1 when the target hosts, -1 when the opponent hosts
    /// and 0 at a neutral site. It is omitted when `atHome` was excluded.
    pub fn differential(&self) -> Prepared {
        let at_home = self.feature_names().iter().position(|n| n == "atHome");

        let mut columns = Vec::with_capacity(self.feature_count());
        if at_home.is_some() {
            columns.push("venue".to_string());
        }
        columns.extend(
            self.feature_names()
                .iter()
                .enumerate()
                .filter(|(j, _)| Some(*j) != at_home)
                .map(|(_, n)| format!("diff.{}", n)),
        );

        let mut prepared = Prepared {
            columns,
            ..Prepared::default()
        };
        let complete = self
            .rows()
            .iter()
            .zip(self.labels())
            .filter(|(row, _)| row.is_complete());
        for (row, &label) in complete {
            let mut values = Vec::with_capacity(prepared.columns.len());
            if let Some(j) = at_home {
                let venue = if row.target.get(j) == Some(1.0) {
                    1.0
                } else if row.opponent.get(j) == Some(1.0) {
                    -1.0
                } else {
                    0.0
                };
                values.push(venue);
            }
            for j in (0..self.feature_count()).filter(|j| Some(*j) != at_home) {
                if let (Some(t), Some(o)) = (row.target.get(j), row.opponent.get(j)) {
                    values.push(t - o);
                }
            }
            prepared.features.push(values);
            prepared.labels.push(label);
        }
        prepared
    }

    /// Target and opponent columns `kept`, over rows where those are known
    fn select(&self, kept: &[usize]) -> Prepared {
        let names = self.feature_names();
        let columns = kept
            .iter()
            .map(|&j| format!("target.{}", names[j]))
            .chain(kept.iter().map(|&j| format!("opponent.{}", names[j])))
            .collect();

        let mut prepared = Prepared {
            columns,
            ..Prepared::default()
        };
        for (row, &label) in self.rows().iter().zip(self.labels()) {
            let values: Option<Vec<f64>> = kept
                .iter()
                .map(|&j| row.target.get(j))
                .chain(kept.iter().map(|&j| row.opponent.get(j)))
                .collect();
            if let Some(values) = values {
                prepared.features.push(values);
                prepared.labels.push(label);
            }
        }
        prepared
    }
}
