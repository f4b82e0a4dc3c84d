//! # glance-train
//!
//! Data loading, the training loop, and evaluation for Glance.
//!
//! ## Key Components
//!
//! - [`dataset::VqaDataset`]: JSONL questions/features loading plus a
//!   deterministic synthetic corpus generator
//! - [`trainer::train_classifier`]: per-example SGD with epoch bookkeeping
//! - [`evaluator::evaluate_split`]: exact-match accuracy in percent
//!
//! ## Architecture Rules
//!
//! - A single synchronous training process; no async, no network surface.
//! - Binaries report through `eprintln!`; library logging is opt-in via
//!   [`trainer::TrainerConfig::log_interval`].
//! - Everything is reproducible from the seeds in the configs.

pub mod dataset;
pub mod evaluator;
pub mod trainer;

pub use dataset::{
    generate_synthetic, FeatureRecord, FeatureTable, QuestionRecord, SyntheticConfig, VqaDataset,
};
pub use evaluator::evaluate_split;
pub use trainer::{train_classifier, train_step, TrainReport, TrainerConfig};
