//! Question and answer encoding.
//!
//! A question becomes a `steps x width` row-major f32 buffer. Each row is
//! the one-hot encoding of that position's token over the source
//! vocabulary, followed by the question's full visual feature vector, so
//! the image signal is present at every step of the recurrence. The buffer
//! stays plain CPU data; the model crate turns it into a tensor.

use crate::error::GlanceError;
use crate::vocab::{SourceVocabulary, TargetVocabulary};

/// A question encoded as a dense `steps x width` sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedQuestion {
    data: Vec<f32>,
    steps: usize,
    width: usize,
}

impl EncodedQuestion {
    /// Wraps a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::ShapeMismatch`] if `data.len()` is not
    /// `steps * width`.
    pub fn new(data: Vec<f32>, steps: usize, width: usize) -> Result<Self, GlanceError> {
        if data.len() != steps * width {
            return Err(GlanceError::ShapeMismatch {
                expected: steps * width,
                actual: data.len(),
            });
        }
        Ok(Self { data, steps, width })
    }

    /// Sequence length in positions.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Per-position vector width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The full row-major buffer.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// The vector for one sequence position.
    pub fn row(&self, step: usize) -> Option<&[f32]> {
        if step >= self.steps {
            return None;
        }
        Some(&self.data[step * self.width..(step + 1) * self.width])
    }
}

/// Encodes a tokenized question together with its visual features.
///
/// Each position's vector is `source.len() + feat_size` wide: the one-hot
/// token segment first, then the visual features copied verbatim.
///
/// # Errors
///
/// Returns [`GlanceError::VocabularyMiss`] for a token absent from the
/// source vocabulary and [`GlanceError::ShapeMismatch`] if `visual.len()`
/// differs from `feat_size`. Both are fatal; no positions are skipped or
/// padded over.
pub fn encode_question(
    tokens: &[String],
    source: &SourceVocabulary,
    visual: &[f32],
    feat_size: usize,
) -> Result<EncodedQuestion, GlanceError> {
    if visual.len() != feat_size {
        return Err(GlanceError::ShapeMismatch {
            expected: feat_size,
            actual: visual.len(),
        });
    }
    let width = source.len() + feat_size;
    let mut data = vec![0.0f32; tokens.len() * width];
    for (i, token) in tokens.iter().enumerate() {
        let index = source.index_of(token)?;
        let row = &mut data[i * width..(i + 1) * width];
        row[index] = 1.0;
        row[source.len()..].copy_from_slice(visual);
    }
    EncodedQuestion::new(data, tokens.len(), width)
}

/// Looks up the target index for a gold answer label.
///
/// # Errors
///
/// Returns [`GlanceError::VocabularyMiss`] if the label was not seen at
/// vocabulary build time.
pub fn encode_answer(label: &str, target: &TargetVocabulary) -> Result<usize, GlanceError> {
    target.index_of(label)
}
