//! # glance-core
//!
//! Data model and encoding for Glance, a recurrent visual question
//! answering trainer.
//!
//! ## Key Components
//!
//! - [`example::Example`] / [`example::SplitData`]: tokenized QA pairs with
//!   index-aligned visual features
//! - [`vocab::Vocabularies`]: first-seen dense token and label indexing
//! - [`encoding::encode_question`]: one-hot plus visual-feature sequences
//! - [`error::GlanceError`]: the workspace-wide error enum
//! - [`rng::SimpleRng`]: the splitmix64 PRNG behind every random choice
//!
//! ## Architecture Rules
//!
//! - No tensor code here. Everything is plain CPU data; candle enters in
//!   `glance-model`.
//! - No file I/O here. Data formats live in `glance-train`.
//! - Deterministic: all randomness flows through a seeded [`rng::SimpleRng`].

pub mod encoding;
pub mod error;
pub mod example;
pub mod rng;
pub mod vocab;

pub use encoding::{encode_answer, encode_question, EncodedQuestion};
pub use error::GlanceError;
pub use example::{sentence_length_histogram, Example, SplitData};
pub use rng::SimpleRng;
pub use vocab::{SourceVocabulary, TargetVocabulary, Vocabularies, PAD_TOKEN};
