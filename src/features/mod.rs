//! Feature generation
//!
//! Causal per-game statistics and the matcher that pairs both teams'
//! features for every game.

pub mod box_score;
pub mod matcher;
pub mod primitives;
pub mod registry;

pub use matcher::{FeatureMatcher, FeatureVector, GenerationReport, UnmatchedFeatureTable};
pub use registry::{FeatureRegistry, Generator, CATALOGUE};
