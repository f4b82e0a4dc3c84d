//! Smoke test: verify all crates compile and basic types are accessible.

use glance::glance_core::{Example, GlanceError, SimpleRng, Vocabularies, PAD_TOKEN};
use glance::glance_model::ClassifierConfig;
use glance::glance_train::TrainerConfig;

#[test]
fn core_types_accessible() {
    let _rng = SimpleRng::new(42);
    let _err = GlanceError::Internal {
        message: "test".to_string(),
    };
    let example = Example::new("is this red", "yes");
    assert_eq!(example.tokens.len(), 3);
    assert_eq!(example.label, "yes");
}

#[test]
fn vocabulary_indices_are_first_seen_with_trailing_pad() {
    let train = vec![
        Example::new("is this red", "yes"),
        Example::new("is this blue", "no"),
    ];
    let vocabs = Vocabularies::build(&train, &[], &[]);

    for (token, index) in [("is", 0), ("this", 1), ("red", 2), ("blue", 3), (PAD_TOKEN, 4)] {
        assert_eq!(vocabs.source.index_of(token).unwrap(), index);
    }
    assert_eq!(vocabs.target.index_of("yes").unwrap(), 0);
    assert_eq!(vocabs.target.index_of("no").unwrap(), 1);
    assert_eq!(vocabs.target.label_at(1).unwrap(), "no");
}

#[test]
fn model_config_describes_architecture() {
    // 5 vocabulary entries + 2 visual features per step.
    let config = ClassifierConfig {
        input_size: 7,
        hidden_size: 8,
        output_size: 2,
    };
    assert_eq!(config.feature_width(5).unwrap(), 2);
    assert_eq!(config.param_count(), (7 + 8) * 8 + 8 + (7 + 8) * 2 + 2);
}

#[test]
fn trainer_defaults_match_documented_hyperparameters() {
    let config = TrainerConfig::default();
    assert_eq!(config.num_epochs, 3);
    assert!((config.learning_rate - 0.01).abs() < 1e-12);
    assert_eq!(config.seed, 42);
}
