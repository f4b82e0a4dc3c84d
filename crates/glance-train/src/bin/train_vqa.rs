//! Training CLI for the Glance VQA classifier.
//!
//! Reads a questions JSONL file and an image-features JSONL file (or
//! generates a synthetic corpus), builds the vocabularies, trains the
//! recurrent classifier, reports test accuracy, and saves a safetensors
//! checkpoint.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release -p glance-train --bin train-vqa -- \
//!   --questions data/questions.jsonl \
//!   --features data/features.jsonl \
//!   --output checkpoints/glance \
//!   --hidden 1000 --epochs 3 --lr 0.01
//! ```
//!
//! For a quick self-contained run:
//!
//! ```bash
//! cargo run --release -p glance-train --bin train-vqa -- --synthetic 200
//! ```

use std::path::PathBuf;
use std::time::Instant;

use candle_core::Device;
use glance_core::{sentence_length_histogram, Vocabularies};
use glance_model::{ClassifierConfig, RecurrentClassifier};
use glance_train::{
    evaluate_split, generate_synthetic, train_classifier, SyntheticConfig, TrainerConfig,
    VqaDataset,
};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args);

    eprintln!("=== Glance VQA Training ===");
    eprintln!("Hidden size: {}", config.hidden);
    eprintln!("Epochs:      {}", config.epochs);
    eprintln!("LR:          {}", config.lr);
    eprintln!("Seed:        {}", config.seed);
    eprintln!();

    eprintln!("Loading dataset...");
    let start = Instant::now();
    let dataset = load_dataset(&config);
    let dataset = dataset.take_fraction(config.fraction);
    eprintln!(
        "Loaded {} examples ({} train / {} valid / {} test) in {:.1}s",
        dataset.total_len(),
        dataset.train.len(),
        dataset.valid.len(),
        dataset.test.len(),
        start.elapsed().as_secs_f32()
    );

    let vocabs = Vocabularies::build(
        dataset.train.examples(),
        dataset.valid.examples(),
        dataset.test.examples(),
    );
    eprintln!(
        "Vocabulary: {} question tokens, {} answer labels",
        vocabs.source.len(),
        vocabs.target.len()
    );
    eprintln!("Feature size: {}", dataset.feat_size());

    let lengths = sentence_length_histogram(
        &[&dataset.train, &dataset.valid, &dataset.test],
        22,
    );
    let buckets: Vec<String> = lengths
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(length, count)| format!("{length}:{count}"))
        .collect();
    eprintln!("Question lengths (tokens:count): {}", buckets.join(" "));

    let model_config = ClassifierConfig {
        input_size: vocabs.source.len() + dataset.feat_size(),
        hidden_size: config.hidden,
        output_size: vocabs.target.len(),
    };
    let device = Device::cuda_if_available(0).unwrap_or(Device::Cpu);
    eprintln!("Using device: {:?}", device);

    let model = RecurrentClassifier::new_random(config.seed, &model_config, &device)
        .unwrap_or_else(|e| {
            eprintln!("ERROR: failed to build model: {e}");
            std::process::exit(1);
        });
    eprintln!("Model: {model:?}");

    let trainer_config = TrainerConfig {
        num_epochs: config.epochs,
        learning_rate: config.lr,
        seed: config.seed,
        log_interval: config.log_interval,
    };

    eprintln!("\nStarting training...");
    let start = Instant::now();
    let report = train_classifier(
        &model,
        &dataset.train,
        &dataset.valid,
        &vocabs,
        &trainer_config,
    )
    .unwrap_or_else(|e| {
        eprintln!("ERROR: training failed: {e}");
        std::process::exit(1);
    });

    let elapsed = start.elapsed().as_secs_f32();
    eprintln!("\n=== Training Complete ===");
    eprintln!("Steps: {}", report.steps_completed);
    eprintln!(
        "Time:  {:.1}s ({:.1} steps/s)",
        elapsed,
        report.steps_completed as f32 / elapsed
    );
    for (epoch, (loss, accuracy)) in report
        .epoch_losses
        .iter()
        .zip(&report.validation_accuracy)
        .enumerate()
    {
        eprintln!(
            "  Epoch {}: total loss {loss:.4} (mean {:.4})  validation {accuracy:.2}%",
            epoch + 1,
            loss / dataset.train.len() as f32
        );
    }

    let test_accuracy = evaluate_split(&model, &dataset.test, "test", &vocabs)
        .unwrap_or_else(|e| {
            eprintln!("ERROR: evaluation failed: {e}");
            std::process::exit(1);
        });
    eprintln!("Test accuracy: {test_accuracy:.2}%");

    let save_path = config.output.with_extension("safetensors");
    eprintln!("\nSaving checkpoint to {}...", save_path.display());
    model.save(&save_path).unwrap_or_else(|e| {
        eprintln!("ERROR: failed to save checkpoint: {e}");
        std::process::exit(1);
    });
    eprintln!("Done.");
}

fn load_dataset(config: &CliConfig) -> VqaDataset {
    match (&config.questions, &config.features, config.synthetic) {
        (Some(questions), Some(features), None) => {
            VqaDataset::from_files(questions, features).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to load dataset: {e}");
                std::process::exit(1);
            })
        }
        (None, None, Some(train_len)) => {
            let synthetic = SyntheticConfig {
                train_len,
                valid_len: (train_len / 5).max(1),
                test_len: (train_len / 5).max(1),
                seed: config.seed,
                ..SyntheticConfig::default()
            };
            generate_synthetic(&synthetic).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to generate synthetic dataset: {e}");
                std::process::exit(1);
            })
        }
        _ => {
            eprintln!(
                "ERROR: pass either --questions PATH and --features PATH, or --synthetic N"
            );
            eprintln!("Use --help for usage information.");
            std::process::exit(1);
        }
    }
}

struct CliConfig {
    questions: Option<PathBuf>,
    features: Option<PathBuf>,
    synthetic: Option<usize>,
    output: PathBuf,
    hidden: usize,
    epochs: usize,
    lr: f64,
    seed: u64,
    fraction: f32,
    log_interval: usize,
}

fn parse_args(args: &[String]) -> CliConfig {
    let mut config = CliConfig {
        questions: None,
        features: None,
        synthetic: None,
        output: PathBuf::from("checkpoints/glance"),
        hidden: 1000,
        epochs: 3,
        lr: 0.01,
        seed: 42,
        fraction: 1.0,
        log_interval: 100,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--questions" => {
                i += 1;
                config.questions = Some(PathBuf::from(&args[i]));
            }
            "--features" => {
                i += 1;
                config.features = Some(PathBuf::from(&args[i]));
            }
            "--synthetic" => {
                i += 1;
                config.synthetic = Some(args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --synthetic value");
                    std::process::exit(1);
                }));
            }
            "--output" => {
                i += 1;
                config.output = PathBuf::from(&args[i]);
            }
            "--hidden" => {
                i += 1;
                config.hidden = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --hidden value");
                    std::process::exit(1);
                });
            }
            "--epochs" => {
                i += 1;
                config.epochs = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --epochs value");
                    std::process::exit(1);
                });
            }
            "--lr" => {
                i += 1;
                config.lr = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --lr value");
                    std::process::exit(1);
                });
            }
            "--seed" => {
                i += 1;
                config.seed = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --seed value");
                    std::process::exit(1);
                });
            }
            "--fraction" => {
                i += 1;
                config.fraction = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --fraction value");
                    std::process::exit(1);
                });
            }
            "--log-interval" => {
                i += 1;
                config.log_interval = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("ERROR: invalid --log-interval value");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                eprintln!("Usage: train-vqa [options]");
                eprintln!();
                eprintln!("Data source (one of):");
                eprintln!("  --questions PATH   Questions JSONL file (with --features)");
                eprintln!("  --features PATH    Image features JSONL file");
                eprintln!("  --synthetic N      Generate N synthetic training examples");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  --output PATH      Checkpoint output path (default: checkpoints/glance)");
                eprintln!("  --hidden N         Hidden state size (default: 1000)");
                eprintln!("  --epochs N         Training epochs (default: 3)");
                eprintln!("  --lr FLOAT         Learning rate (default: 0.01)");
                eprintln!("  --seed N           RNG seed for init and shuffling (default: 42)");
                eprintln!("  --fraction FLOAT   Leading fraction of each split to use (default: 1.0)");
                eprintln!("  --log-interval N   Steps between loss lines, 0 silences (default: 100)");
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Use --help for usage information.");
                std::process::exit(1);
            }
        }
        i += 1;
    }

    config
}
