//! End-to-end pipeline test: synthetic corpus, vocabularies, training,
//! evaluation, checkpoint roundtrip.

use candle_core::Device;
use glance::glance_core::{encode_question, Vocabularies};
use glance::glance_model::{ClassifierConfig, RecurrentClassifier};
use glance::glance_train::{
    evaluate_split, generate_synthetic, train_classifier, SyntheticConfig, TrainerConfig,
};

fn pipeline_setup() -> (
    glance::glance_train::VqaDataset,
    Vocabularies,
    RecurrentClassifier,
) {
    let dataset = generate_synthetic(&SyntheticConfig {
        train_len: 60,
        valid_len: 12,
        test_len: 12,
        feat_size: 4,
        seed: 42,
    })
    .unwrap();
    let vocabs = Vocabularies::build(
        dataset.train.examples(),
        dataset.valid.examples(),
        dataset.test.examples(),
    );
    let config = ClassifierConfig {
        input_size: vocabs.source.len() + dataset.feat_size(),
        hidden_size: 24,
        output_size: vocabs.target.len(),
    };
    let model = RecurrentClassifier::new_random(42, &config, &Device::Cpu).unwrap();
    (dataset, vocabs, model)
}

fn quiet(num_epochs: usize, learning_rate: f64) -> TrainerConfig {
    TrainerConfig {
        num_epochs,
        learning_rate,
        log_interval: 0,
        ..TrainerConfig::default()
    }
}

#[test]
fn synthetic_end_to_end() {
    let (dataset, vocabs, model) = pipeline_setup();

    let report = train_classifier(
        &model,
        &dataset.train,
        &dataset.valid,
        &vocabs,
        &quiet(3, 0.05),
    )
    .unwrap();

    assert_eq!(report.epoch_losses.len(), 3);
    assert_eq!(report.steps_completed, 3 * dataset.train.len());
    assert!(
        report.epoch_losses[2] < report.epoch_losses[0],
        "loss did not decrease: {:?}",
        report.epoch_losses
    );

    let test_accuracy = evaluate_split(&model, &dataset.test, "test", &vocabs).unwrap();
    assert!((0.0..=100.0).contains(&test_accuracy));
}

#[test]
fn checkpoint_roundtrip_preserves_predictions() {
    let (dataset, vocabs, model) = pipeline_setup();
    train_classifier(
        &model,
        &dataset.train,
        &dataset.valid,
        &vocabs,
        &quiet(2, 0.05),
    )
    .unwrap();

    let path = std::env::temp_dir().join(format!(
        "glance_pipeline_{:?}.safetensors",
        std::thread::current().id()
    ));
    model.save(&path).unwrap();
    let restored = RecurrentClassifier::load(&path, &Device::Cpu).unwrap();
    std::fs::remove_file(&path).unwrap();

    // Same per-example log-probabilities, not just the same accuracy.
    let feat_size = model.config().feature_width(vocabs.source.len()).unwrap();
    for (example, visual) in dataset.test.iter() {
        let encoded =
            encode_question(&example.tokens, &vocabs.source, visual, feat_size).unwrap();
        let before = model
            .forward_sequence(&encoded)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        let after = restored
            .forward_sequence(&encoded)
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        assert_eq!(before, after);
    }
}

#[test]
fn full_run_is_reproducible() {
    let (dataset, vocabs, model_a) = pipeline_setup();
    let (_, _, model_b) = pipeline_setup();
    let config = quiet(2, 0.05);

    let report_a =
        train_classifier(&model_a, &dataset.train, &dataset.valid, &vocabs, &config).unwrap();
    let report_b =
        train_classifier(&model_b, &dataset.train, &dataset.valid, &vocabs, &config).unwrap();

    assert_eq!(report_a.epoch_losses, report_b.epoch_losses);
    assert_eq!(report_a.validation_accuracy, report_b.validation_accuracy);
    assert_eq!(
        evaluate_split(&model_a, &dataset.test, "test", &vocabs).unwrap(),
        evaluate_split(&model_b, &dataset.test, "test", &vocabs).unwrap()
    );
}
