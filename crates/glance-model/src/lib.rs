//! # glance-model
//!
//! The candle-backed recurrent classifier for Glance.
//!
//! One Elman-style cell expressed as two affine maps over the concatenated
//! (input, hidden) vector, with a log-softmax output head. Parameters live
//! in candle [`candle_core::Var`]s so the optimizer in `glance-train` can
//! update them in place through `trainable_vars()`.
//!
//! ## Architecture Rules
//!
//! - Tensor code lives here and in `glance-train`; `glance-core` stays
//!   plain CPU data.
//! - Device-agnostic: constructors take a `&Device`.
//! - Deterministic: weights come from a seeded splitmix64 RNG, never from
//!   the device RNG.

pub mod classifier;

pub use classifier::{ClassifierConfig, RecurrentClassifier};
