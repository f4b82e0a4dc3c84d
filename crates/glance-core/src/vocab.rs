//! Vocabulary construction over question tokens and answer labels.
//!
//! Index assignment is first-seen order across the train, validation, and
//! test splits, scanned in that order. The source vocabulary gets a
//! trailing `<pad>` entry; the target vocabulary keeps an inverse lookup
//! list so predicted indices can be decoded back to label strings.

use std::collections::HashMap;

use crate::error::GlanceError;
use crate::example::Example;

/// Padding token appended to every source vocabulary, always at the last
/// index.
pub const PAD_TOKEN: &str = "<pad>";

/// Token-to-dense-index map over question words.
#[derive(Debug, Clone, Default)]
pub struct SourceVocabulary {
    indices: HashMap<String, usize>,
}

impl SourceVocabulary {
    /// Returns the dense index for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::VocabularyMiss`] if the token was not seen
    /// when the vocabulary was built. There is no out-of-vocabulary
    /// fallback.
    pub fn index_of(&self, token: &str) -> Result<usize, GlanceError> {
        self.indices
            .get(token)
            .copied()
            .ok_or_else(|| GlanceError::VocabularyMiss {
                entry: token.to_string(),
            })
    }

    pub fn contains(&self, token: &str) -> bool {
        self.indices.contains_key(token)
    }

    /// Number of entries, `<pad>` included.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index of the padding token.
    pub fn pad_index(&self) -> Result<usize, GlanceError> {
        self.index_of(PAD_TOKEN)
    }
}

/// Label-to-dense-index map with the inverse lookup list.
#[derive(Debug, Clone, Default)]
pub struct TargetVocabulary {
    indices: HashMap<String, usize>,
    labels: Vec<String>,
}

impl TargetVocabulary {
    /// Returns the dense index for `label`.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::VocabularyMiss`] if the label was not seen
    /// when the vocabulary was built.
    pub fn index_of(&self, label: &str) -> Result<usize, GlanceError> {
        self.indices
            .get(label)
            .copied()
            .ok_or_else(|| GlanceError::VocabularyMiss {
                entry: label.to_string(),
            })
    }

    /// Returns the label string for a predicted index.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::LabelOutOfRange`] if `index` is not a valid
    /// label index.
    pub fn label_at(&self, index: usize) -> Result<&str, GlanceError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(GlanceError::LabelOutOfRange {
                index,
                max: self.labels.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All labels in index order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

/// Source and target vocabularies, built together so both see the splits in
/// the same order.
#[derive(Debug, Clone)]
pub struct Vocabularies {
    pub source: SourceVocabulary,
    pub target: TargetVocabulary,
}

impl Vocabularies {
    /// Scans train, validation, and test examples in order and assigns
    /// first-seen dense indices, then appends [`PAD_TOKEN`] to the source
    /// vocabulary.
    ///
    /// Every token and label seen becomes an entry; there is no frequency
    /// threshold. Rebuilding over the same splits yields identical
    /// indices.
    pub fn build(train: &[Example], valid: &[Example], test: &[Example]) -> Self {
        let mut source = SourceVocabulary::default();
        let mut target = TargetVocabulary::default();
        for example in train.iter().chain(valid).chain(test) {
            for token in &example.tokens {
                if !source.indices.contains_key(token) {
                    let next = source.indices.len();
                    source.indices.insert(token.clone(), next);
                }
            }
            if !target.indices.contains_key(&example.label) {
                let next = target.indices.len();
                target.indices.insert(example.label.clone(), next);
                target.labels.push(example.label.clone());
            }
        }
        let next = source.indices.len();
        source.indices.insert(PAD_TOKEN.to_string(), next);
        Self { source, target }
    }
}
