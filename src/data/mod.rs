//! Season data access and table assembly
//!
//! Record-store access, team-season series building and the final
//! training table.

pub mod dataset;
pub mod prep;
pub mod series;
pub mod store;

pub use dataset::{Row, TableBuilder, TrainingTable};
pub use prep::Prepared;
pub use series::TeamSeasonSeries;
pub use store::{RecordStore, SeasonArchive};
