//! JSONL data source and synthetic corpus generation.
//!
//! Two files feed a run: a questions file with one
//! `{question, image_id, answer, split}` record per line, and a features
//! file with one `{image_id, features}` record per line. Feature vectors
//! are resolved through a string-keyed table at load time, so every example
//! carries its own copy and the splits stay self-contained.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use glance_core::{Example, GlanceError, SimpleRng, SplitData};
use serde::{Deserialize, Serialize};

/// One questions-file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question: String,
    pub image_id: u64,
    pub answer: String,
    /// One of "train", "valid", or "test".
    pub split: String,
}

/// One features-file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub image_id: u64,
    pub features: Vec<f32>,
}

/// Image-id-keyed store of visual feature vectors.
///
/// Keys are the string form of the image id, matching the on-disk mapping
/// convention.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    rows: Vec<Vec<f32>>,
    index: HashMap<String, usize>,
    feat_size: usize,
}

impl FeatureTable {
    /// Builds the table, checking that every vector has the same nonzero
    /// length.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::DataError`] for an empty record list, a
    /// zero-length or ragged vector, or a duplicate image id.
    pub fn from_records(records: Vec<FeatureRecord>) -> Result<Self, GlanceError> {
        let feat_size = records
            .first()
            .map(|r| r.features.len())
            .ok_or_else(|| GlanceError::DataError {
                message: "feature table: no records".to_string(),
            })?;
        if feat_size == 0 {
            return Err(GlanceError::DataError {
                message: "feature table: zero-length feature vectors".to_string(),
            });
        }
        let mut rows = Vec::with_capacity(records.len());
        let mut index = HashMap::new();
        for record in records {
            if record.features.len() != feat_size {
                return Err(GlanceError::DataError {
                    message: format!(
                        "feature table: image {} has {} features, expected {feat_size}",
                        record.image_id,
                        record.features.len()
                    ),
                });
            }
            if index.insert(record.image_id.to_string(), rows.len()).is_some() {
                return Err(GlanceError::DataError {
                    message: format!("feature table: duplicate image id {}", record.image_id),
                });
            }
            rows.push(record.features);
        }
        Ok(Self {
            rows,
            index,
            feat_size,
        })
    }

    /// The feature vector for an image id.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::DataError`] if the id is unknown.
    pub fn features_for(&self, image_id: u64) -> Result<&[f32], GlanceError> {
        let row = self
            .index
            .get(&image_id.to_string())
            .copied()
            .ok_or_else(|| GlanceError::DataError {
                message: format!("feature table: unknown image id {image_id}"),
            })?;
        Ok(&self.rows[row])
    }

    pub fn feat_size(&self) -> usize {
        self.feat_size
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three splits plus the shared visual feature size.
#[derive(Debug, Clone)]
pub struct VqaDataset {
    pub train: SplitData,
    pub valid: SplitData,
    pub test: SplitData,
    feat_size: usize,
}

impl VqaDataset {
    /// Loads the questions and features JSONL files.
    ///
    /// Every example's feature vector is resolved through the table here,
    /// so a question referencing an unknown image id fails the whole load.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::DataError`] for unreadable files, malformed
    /// lines, unknown split names, or unknown image ids.
    pub fn from_files(questions: &Path, features: &Path) -> Result<Self, GlanceError> {
        let table = FeatureTable::from_records(read_jsonl(features)?)?;
        let records: Vec<QuestionRecord> = read_jsonl(questions)?;

        let mut train = SplitData::new();
        let mut valid = SplitData::new();
        let mut test = SplitData::new();
        for record in &records {
            let features = table.features_for(record.image_id)?.to_vec();
            let example = Example::new(&record.question, &record.answer);
            match record.split.as_str() {
                "train" => train.push(example, features),
                "valid" => valid.push(example, features),
                "test" => test.push(example, features),
                other => {
                    return Err(GlanceError::DataError {
                        message: format!(
                            "unknown split '{other}' (expected train, valid, or test)"
                        ),
                    })
                }
            }
        }
        Ok(Self {
            train,
            valid,
            test,
            feat_size: table.feat_size(),
        })
    }

    pub fn feat_size(&self) -> usize {
        self.feat_size
    }

    /// Total examples across all three splits.
    pub fn total_len(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }

    /// Keeps the leading fraction of every split.
    pub fn take_fraction(&self, fraction: f32) -> VqaDataset {
        VqaDataset {
            train: self.train.take_fraction(fraction),
            valid: self.valid.take_fraction(fraction),
            test: self.test.take_fraction(fraction),
            feat_size: self.feat_size,
        }
    }
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, GlanceError> {
    let file = File::open(path).map_err(|e| GlanceError::DataError {
        message: format!("{}: {e}", path.display()),
    })?;
    let mut records = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| GlanceError::DataError {
            message: format!("{} line {}: {e}", path.display(), line_no + 1),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| GlanceError::DataError {
            message: format!("{} line {}: {e}", path.display(), line_no + 1),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Configuration for [`generate_synthetic`].
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Training examples to generate (default: 200).
    pub train_len: usize,
    /// Validation examples (default: 40).
    pub valid_len: usize,
    /// Test examples (default: 40).
    pub test_len: usize,
    /// Visual feature vector length (default: 8).
    pub feat_size: usize,
    /// RNG seed (default: 42).
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            train_len: 200,
            valid_len: 40,
            test_len: 40,
            feat_size: 8,
            seed: 42,
        }
    }
}

const OBJECTS: &[&str] = &["ball", "box", "car", "cat", "sign"];
const COLORS: &[&str] = &["red", "blue", "green"];
const ANSWERS: &[&str] = &["yes", "no", "red", "blue", "green"];

/// Generates a deterministic toy VQA corpus.
///
/// Questions are templated over small object and color pools; answers are
/// yes/no or a color name. Each example's visual features carry a strong
/// activation at the answer's pool index plus low noise, so the corpus is
/// learnable by the recurrent classifier.
///
/// # Errors
///
/// Returns [`GlanceError::DataError`] if `feat_size` is zero.
pub fn generate_synthetic(config: &SyntheticConfig) -> Result<VqaDataset, GlanceError> {
    if config.feat_size == 0 {
        return Err(GlanceError::DataError {
            message: "generate_synthetic: feat_size must be nonzero".to_string(),
        });
    }
    let mut rng = SimpleRng::new(config.seed);
    Ok(VqaDataset {
        train: synth_split(config.train_len, config.feat_size, &mut rng),
        valid: synth_split(config.valid_len, config.feat_size, &mut rng),
        test: synth_split(config.test_len, config.feat_size, &mut rng),
        feat_size: config.feat_size,
    })
}

fn synth_split(len: usize, feat_size: usize, rng: &mut SimpleRng) -> SplitData {
    let mut split = SplitData::new();
    for _ in 0..len {
        let object = OBJECTS[rng.next_below(OBJECTS.len())];
        let color = COLORS[rng.next_below(COLORS.len())];
        let (question, answer) = if rng.next_f32() < 0.5 {
            let answer = if rng.next_f32() < 0.5 { "yes" } else { "no" };
            (format!("is the {object} {color}"), answer)
        } else {
            (format!("what color is the {object}"), color)
        };
        let answer_index = ANSWERS.iter().position(|a| *a == answer).unwrap_or(0);

        let mut features = vec![0.0f32; feat_size];
        for value in features.iter_mut() {
            *value = rng.next_f32_range(-0.05, 0.05);
        }
        features[answer_index % feat_size] += 1.0;

        split.push(Example::new(&question, answer), features);
    }
    split
}
