//! Error types for the glance workspace.
//!
//! One enum covers every failure the pipeline can surface. All failures are
//! data-consistency or programming defects over in-memory data; nothing here
//! is transient, so there is no retry machinery anywhere.

/// Errors surfaced by vocabulary construction, encoding, data loading,
/// training, and evaluation.
///
/// # Example
///
/// ```
/// use glance_core::GlanceError;
///
/// let err = GlanceError::VocabularyMiss {
///     entry: "unseen".to_string(),
/// };
/// assert!(err.to_string().contains("unseen"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum GlanceError {
    /// A token or label was absent from its vocabulary at encode time.
    VocabularyMiss { entry: String },

    /// An input's size disagrees with the size the receiver was configured
    /// for.
    ShapeMismatch { expected: usize, actual: usize },

    /// A split holds zero examples, leaving accuracy undefined.
    EmptySplit { split: String },

    /// A predicted index fell outside the target lookup list.
    LabelOutOfRange { index: usize, max: usize },

    /// Malformed or inconsistent data-source input.
    DataError { message: String },

    /// Tensor-backend failure or a broken internal invariant.
    Internal { message: String },
}

impl std::fmt::Display for GlanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VocabularyMiss { entry } => {
                write!(f, "vocabulary miss: '{entry}' was not seen at build time")
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected}, got {actual}")
            }
            Self::EmptySplit { split } => {
                write!(f, "empty split: '{split}' has no examples")
            }
            Self::LabelOutOfRange { index, max } => {
                write!(f, "label index {index} out of range (max {max})")
            }
            Self::DataError { message } => write!(f, "data error: {message}"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

impl std::error::Error for GlanceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_fields() {
        let err = GlanceError::ShapeMismatch {
            expected: 7,
            actual: 5,
        };
        let text = err.to_string();
        assert!(text.contains('7'));
        assert!(text.contains('5'));

        let err = GlanceError::EmptySplit {
            split: "valid".to_string(),
        };
        assert!(err.to_string().contains("valid"));
    }

    #[test]
    fn implements_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        let err = GlanceError::Internal {
            message: "broken".to_string(),
        };
        takes_error(&err);
    }

    #[test]
    fn variants_compare_by_fields() {
        let a = GlanceError::VocabularyMiss {
            entry: "red".to_string(),
        };
        let b = GlanceError::VocabularyMiss {
            entry: "red".to_string(),
        };
        let c = GlanceError::VocabularyMiss {
            entry: "blue".to_string(),
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
