//! The training loop: per-example SGD over the recurrent classifier.
//!
//! One gradient update per example (no batching), negative log likelihood
//! on the final step's log-probabilities, backpropagation through the whole
//! unrolled sequence. Each epoch jointly reshuffles the training split with
//! its visual features through a seeded RNG, so runs are reproducible
//! end to end.

use candle_core::Tensor;
use candle_nn::{loss, Optimizer, SGD};
use glance_core::{
    encode_answer, encode_question, EncodedQuestion, GlanceError, SimpleRng, SplitData,
    Vocabularies,
};
use glance_model::RecurrentClassifier;

use crate::evaluator::evaluate_split;

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    /// Passes over the training split (default: 3).
    pub num_epochs: usize,
    /// Fixed SGD learning rate, no schedule (default: 0.01).
    pub learning_rate: f64,
    /// Seed for the per-epoch shuffle (default: 42).
    pub seed: u64,
    /// Steps between running-loss log lines; 0 disables all logging
    /// (default: 100).
    pub log_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_epochs: 3,
            learning_rate: 0.01,
            seed: 42,
            log_interval: 100,
        }
    }
}

/// What a training run produced.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Summed per-example loss for each epoch, in epoch order.
    pub epoch_losses: Vec<f32>,
    /// Validation accuracy (percent) measured at each epoch end.
    pub validation_accuracy: Vec<f32>,
    /// Total optimizer steps taken across all epochs.
    pub steps_completed: usize,
}

impl TrainReport {
    /// Mean per-example loss for an epoch, if it exists.
    pub fn mean_loss(&self, epoch: usize, train_len: usize) -> Option<f32> {
        if train_len == 0 {
            return None;
        }
        self.epoch_losses.get(epoch).map(|sum| sum / train_len as f32)
    }
}

/// One optimization step on a single encoded example.
///
/// Runs the forward pass from a zero hidden state, computes NLL against the
/// target index, backpropagates through the whole sequence, and applies one
/// SGD update. Gradients are fresh per call; nothing accumulates across
/// examples. Returns the final log-probabilities and the scalar loss.
///
/// # Errors
///
/// Returns [`GlanceError::ShapeMismatch`] if the encoding width disagrees
/// with the model and [`GlanceError::Internal`] for tensor failures.
pub fn train_step(
    model: &RecurrentClassifier,
    optimizer: &mut SGD,
    encoded: &EncodedQuestion,
    target_index: usize,
) -> Result<(Tensor, f32), GlanceError> {
    let map_err = |e: candle_core::Error| GlanceError::Internal {
        message: format!("train_step: {e}"),
    };
    let output = model.forward_sequence(encoded)?;
    let target =
        Tensor::from_vec(vec![target_index as u32], 1, model.device()).map_err(map_err)?;
    let nll = loss::nll(&output, &target).map_err(map_err)?;
    optimizer.backward_step(&nll).map_err(map_err)?;
    let loss_value = nll.to_vec0::<f32>().map_err(map_err)?;
    Ok((output, loss_value))
}

/// Trains the classifier in place for the configured number of epochs.
///
/// Each epoch jointly shuffles the training split, takes one SGD step per
/// example, logs the running average loss every `log_interval` steps, and
/// finishes by measuring exact-match accuracy on the validation split. The
/// model's parameters are updated through its trainable vars.
///
/// # Errors
///
/// Returns [`GlanceError::EmptySplit`] for an empty training or validation
/// split, [`GlanceError::VocabularyMiss`] / [`GlanceError::ShapeMismatch`]
/// for data inconsistent with the vocabularies or the model, and
/// [`GlanceError::Internal`] for tensor failures.
pub fn train_classifier(
    model: &RecurrentClassifier,
    train: &SplitData,
    valid: &SplitData,
    vocabs: &Vocabularies,
    config: &TrainerConfig,
) -> Result<TrainReport, GlanceError> {
    if train.is_empty() {
        return Err(GlanceError::EmptySplit {
            split: "train".to_string(),
        });
    }
    let feat_size = model.config().feature_width(vocabs.source.len())?;
    let mut optimizer =
        SGD::new(model.trainable_vars(), config.learning_rate).map_err(|e| {
            GlanceError::Internal {
                message: format!("train_classifier: {e}"),
            }
        })?;
    let mut rng = SimpleRng::new(config.seed);

    let mut epoch_losses = Vec::with_capacity(config.num_epochs);
    let mut validation_accuracy = Vec::with_capacity(config.num_epochs);
    let mut steps_completed = 0usize;

    for epoch in 1..=config.num_epochs {
        if config.log_interval > 0 {
            eprintln!("epoch {epoch} / {}", config.num_epochs);
        }
        let shuffled = train.shuffled(&mut rng);
        let mut running_loss = 0.0f32;
        let mut counter = 0usize;
        for (example, visual) in shuffled.iter() {
            let encoded = encode_question(&example.tokens, &vocabs.source, visual, feat_size)?;
            let target_index = encode_answer(&example.label, &vocabs.target)?;
            let (_, loss_value) = train_step(model, &mut optimizer, &encoded, target_index)?;
            running_loss += loss_value;
            counter += 1;
            steps_completed += 1;
            if config.log_interval > 0 && counter % config.log_interval == 0 {
                eprintln!(
                    "  {counter} / {} | {:.4}",
                    shuffled.len(),
                    running_loss / counter as f32
                );
            }
        }
        let accuracy = evaluate_split(model, valid, "valid", vocabs)?;
        if config.log_interval > 0 {
            eprintln!(
                "  epoch loss {running_loss:.4} | validation accuracy {accuracy:.2}%"
            );
        }
        epoch_losses.push(running_loss);
        validation_accuracy.push(accuracy);
    }

    Ok(TrainReport {
        epoch_losses,
        validation_accuracy,
        steps_completed,
    })
}
