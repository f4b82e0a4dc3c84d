//! Exact-match accuracy over a frozen classifier.

use candle_core::D;
use glance_core::{encode_question, GlanceError, SplitData, Vocabularies};
use glance_model::RecurrentClassifier;

/// Runs the model over a split and returns exact-match accuracy in percent.
///
/// Each example gets a fresh zero hidden state. The prediction is the
/// argmax of the final step's log-probabilities (ties resolve to the lowest
/// index), decoded through the target lookup and compared to the gold label
/// by string equality. No parameters are updated.
///
/// # Errors
///
/// Returns [`GlanceError::EmptySplit`] if the split has no examples, plus
/// any encoding or tensor error from the forward pass.
pub fn evaluate_split(
    model: &RecurrentClassifier,
    split: &SplitData,
    split_name: &str,
    vocabs: &Vocabularies,
) -> Result<f32, GlanceError> {
    if split.is_empty() {
        return Err(GlanceError::EmptySplit {
            split: split_name.to_string(),
        });
    }
    let map_err = |e: candle_core::Error| GlanceError::Internal {
        message: format!("evaluate_split: {e}"),
    };
    let feat_size = model.config().feature_width(vocabs.source.len())?;

    let mut matches = 0usize;
    for (example, visual) in split.iter() {
        let encoded = encode_question(&example.tokens, &vocabs.source, visual, feat_size)?;
        let output = model.forward_sequence(&encoded)?;
        let indices = output
            .argmax(D::Minus1)
            .map_err(map_err)?
            .to_vec1::<u32>()
            .map_err(map_err)?;
        let predicted_index =
            indices.first().copied().ok_or_else(|| GlanceError::Internal {
                message: "evaluate_split: argmax produced no index".to_string(),
            })? as usize;
        let predicted = vocabs.target.label_at(predicted_index)?;
        if predicted == example.label {
            matches += 1;
        }
    }
    Ok(100.0 * matches as f32 / split.len() as f32)
}
