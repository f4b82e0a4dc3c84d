//! # glance
//!
//! Glance trains a small recurrent network to answer questions about
//! images. A question's tokens are one-hot encoded over a corpus-built
//! vocabulary, the image's precomputed feature vector rides along at every
//! step, and the final step's log-probabilities pick an answer label.
//!
//! This facade re-exports the workspace crates:
//!
//! - [`glance_core`]: data model, vocabularies, encoding
//! - [`glance_model`]: the candle-backed recurrent classifier
//! - [`glance_train`]: data loading, training loop, evaluation
//!
//! The `train-vqa` binary in `glance-train` wires the full pipeline
//! together.

pub use glance_core;
pub use glance_model;
pub use glance_train;
