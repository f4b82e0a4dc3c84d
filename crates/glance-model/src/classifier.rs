//! The recurrent question classifier.
//!
//! A single-layer Elman-style recurrence expressed as two affine maps over
//! the concatenated (input, hidden) vector:
//!
//! ```text
//! combined = concat(x_t, h_prev)   // (1, input_size + hidden_size)
//! h_t      = i2h(combined)         // (1, hidden_size)
//! out_t    = log_softmax(i2o(combined))
//! ```
//!
//! Only the final step's output feeds the loss and the prediction. Weights
//! are Xavier-initialized from a seeded [`SimpleRng`] and wrapped in candle
//! [`Var`]s so an optimizer can update them in place.

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{ops, Linear, Module};
use glance_core::{EncodedQuestion, GlanceError, SimpleRng};

/// Architecture sizes for [`RecurrentClassifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Per-step input width: source vocabulary size + visual feature size.
    pub input_size: usize,
    /// Hidden state width.
    pub hidden_size: usize,
    /// Number of answer labels.
    pub output_size: usize,
}

impl ClassifierConfig {
    /// Total number of learned parameters across both affine maps.
    pub fn param_count(&self) -> usize {
        let combined = self.input_size + self.hidden_size;
        combined * self.hidden_size
            + self.hidden_size
            + combined * self.output_size
            + self.output_size
    }

    /// Visual feature width implied by this input size and a source
    /// vocabulary size.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::ShapeMismatch`] if the vocabulary is wider
    /// than the input, which means the model and vocabulary drifted apart.
    pub fn feature_width(&self, vocab_size: usize) -> Result<usize, GlanceError> {
        self.input_size
            .checked_sub(vocab_size)
            .ok_or(GlanceError::ShapeMismatch {
                expected: self.input_size,
                actual: vocab_size,
            })
    }
}

/// Single-layer recurrent classifier over encoded question sequences.
pub struct RecurrentClassifier {
    i2h: Linear,
    i2o: Linear,
    // [i2h.weight, i2h.bias, i2o.weight, i2o.bias]; the Linear layers hold
    // tensors sharing these vars' storage.
    vars: Vec<Var>,
    config: ClassifierConfig,
    device: Device,
}

impl std::fmt::Debug for RecurrentClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RecurrentClassifier(in={}, hidden={}, labels={}, {} params, device={:?})",
            self.config.input_size,
            self.config.hidden_size,
            self.config.output_size,
            self.config.param_count(),
            self.device
        )
    }
}

impl RecurrentClassifier {
    /// Creates a classifier with Xavier-uniform weights and zero biases.
    ///
    /// The seed fully determines the weights: the same seed and config
    /// always produce an identical model.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::Internal`] if tensor construction fails.
    pub fn new_random(
        seed: u64,
        config: &ClassifierConfig,
        device: &Device,
    ) -> Result<Self, GlanceError> {
        let mut rng = SimpleRng::new(seed);
        let combined = config.input_size + config.hidden_size;
        let w_ih = xavier_weights(&mut rng, combined, config.hidden_size);
        let w_io = xavier_weights(&mut rng, combined, config.output_size);
        Self::from_weights(
            w_ih,
            vec![0.0; config.hidden_size],
            w_io,
            vec![0.0; config.output_size],
            config,
            device,
        )
    }

    /// Builds a classifier from explicit row-major weights and biases.
    ///
    /// Weight layout matches candle's `Linear`: `out_dim` rows of
    /// `input_size + hidden_size` values each.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::ShapeMismatch`] if a buffer length disagrees
    /// with the config and [`GlanceError::Internal`] on tensor failures.
    pub fn from_weights(
        w_ih: Vec<f32>,
        b_ih: Vec<f32>,
        w_io: Vec<f32>,
        b_io: Vec<f32>,
        config: &ClassifierConfig,
        device: &Device,
    ) -> Result<Self, GlanceError> {
        let combined = config.input_size + config.hidden_size;
        check_len(&w_ih, combined * config.hidden_size)?;
        check_len(&b_ih, config.hidden_size)?;
        check_len(&w_io, combined * config.output_size)?;
        check_len(&b_io, config.output_size)?;

        let map_err = |e: candle_core::Error| GlanceError::Internal {
            message: format!("from_weights: {e}"),
        };
        let to_var = |data: Vec<f32>, rows: usize, cols: usize| -> Result<Var, GlanceError> {
            let tensor = Tensor::from_vec(data, (rows, cols), device).map_err(map_err)?;
            Var::from_tensor(&tensor).map_err(map_err)
        };
        let to_bias_var = |data: Vec<f32>, len: usize| -> Result<Var, GlanceError> {
            let tensor = Tensor::from_vec(data, len, device).map_err(map_err)?;
            Var::from_tensor(&tensor).map_err(map_err)
        };

        let w_ih = to_var(w_ih, config.hidden_size, combined)?;
        let b_ih = to_bias_var(b_ih, config.hidden_size)?;
        let w_io = to_var(w_io, config.output_size, combined)?;
        let b_io = to_bias_var(b_io, config.output_size)?;

        let i2h = Linear::new(w_ih.as_tensor().clone(), Some(b_ih.as_tensor().clone()));
        let i2o = Linear::new(w_io.as_tensor().clone(), Some(b_io.as_tensor().clone()));

        Ok(Self {
            i2h,
            i2o,
            vars: vec![w_ih, b_ih, w_io, b_io],
            config: config.clone(),
            device: device.clone(),
        })
    }

    /// The vars an optimizer should update, in a stable order.
    ///
    /// Updates through these vars are visible to the classifier's forward
    /// pass; the layers share their storage.
    pub fn trainable_vars(&self) -> Vec<Var> {
        self.vars.clone()
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// A fresh all-zero hidden state, shape (1, hidden_size).
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::Internal`] if allocation fails.
    pub fn init_hidden(&self) -> Result<Tensor, GlanceError> {
        Tensor::zeros((1, self.config.hidden_size), DType::F32, &self.device).map_err(|e| {
            GlanceError::Internal {
                message: format!("init_hidden: {e}"),
            }
        })
    }

    /// One recurrence step.
    ///
    /// `input` is (1, input_size) and `hidden` is (1, hidden_size); returns
    /// the (1, output_size) log-probabilities and the next hidden state.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::Internal`] if a tensor operation fails, which
    /// includes mis-shaped inputs.
    pub fn step(&self, input: &Tensor, hidden: &Tensor) -> Result<(Tensor, Tensor), GlanceError> {
        let map_err = |e: candle_core::Error| GlanceError::Internal {
            message: format!("step: {e}"),
        };
        let combined = Tensor::cat(&[input, hidden], 1).map_err(map_err)?;
        let new_hidden = self.i2h.forward(&combined).map_err(map_err)?;
        let logits = self.i2o.forward(&combined).map_err(map_err)?;
        let output = ops::log_softmax(&logits, D::Minus1).map_err(map_err)?;
        Ok((output, new_hidden))
    }

    /// Runs the full sequence from a zero hidden state and returns the
    /// final step's log-probabilities, shape (1, output_size).
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::ShapeMismatch`] if the encoding width differs
    /// from the configured input size, and [`GlanceError::Internal`] for an
    /// empty sequence or a tensor failure.
    pub fn forward_sequence(&self, encoded: &EncodedQuestion) -> Result<Tensor, GlanceError> {
        if encoded.width() != self.config.input_size {
            return Err(GlanceError::ShapeMismatch {
                expected: self.config.input_size,
                actual: encoded.width(),
            });
        }
        if encoded.steps() == 0 {
            return Err(GlanceError::Internal {
                message: "forward_sequence: empty input sequence".to_string(),
            });
        }
        let map_err = |e: candle_core::Error| GlanceError::Internal {
            message: format!("forward_sequence: {e}"),
        };
        let inputs = Tensor::from_slice(
            encoded.data(),
            (encoded.steps(), encoded.width()),
            &self.device,
        )
        .map_err(map_err)?;

        let mut hidden = self.init_hidden()?;
        let mut output = None;
        for t in 0..encoded.steps() {
            let x_t = inputs.narrow(0, t, 1).map_err(map_err)?;
            let (out, next_hidden) = self.step(&x_t, &hidden)?;
            hidden = next_hidden;
            output = Some(out);
        }
        output.ok_or_else(|| GlanceError::Internal {
            message: "forward_sequence: no output produced".to_string(),
        })
    }

    /// Saves the four parameter tensors as a safetensors checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::Internal`] if serialization fails.
    pub fn save(&self, path: &Path) -> Result<(), GlanceError> {
        let map_err = |e: candle_core::Error| GlanceError::Internal {
            message: format!("save: {e}"),
        };
        let bias = |layer: &Linear, name: &str| -> Result<Tensor, GlanceError> {
            layer
                .bias()
                .cloned()
                .ok_or_else(|| GlanceError::Internal {
                    message: format!("save: {name} bias missing"),
                })
        };
        let mut tensors = HashMap::new();
        tensors.insert("i2h.weight".to_string(), self.i2h.weight().clone());
        tensors.insert("i2h.bias".to_string(), bias(&self.i2h, "i2h")?);
        tensors.insert("i2o.weight".to_string(), self.i2o.weight().clone());
        tensors.insert("i2o.bias".to_string(), bias(&self.i2o, "i2o")?);
        candle_core::safetensors::save(&tensors, path).map_err(map_err)
    }

    /// Loads a checkpoint written by [`RecurrentClassifier::save`].
    ///
    /// Architecture sizes are recovered from the stored tensor shapes, so
    /// no config is needed. The loaded model is trainable.
    ///
    /// # Errors
    ///
    /// Returns [`GlanceError::Internal`] for read failures, missing
    /// tensors, or inconsistent shapes.
    pub fn load(path: &Path, device: &Device) -> Result<Self, GlanceError> {
        let map_err = |e: candle_core::Error| GlanceError::Internal {
            message: format!("load: {e}"),
        };
        let tensors = candle_core::safetensors::load(path, device).map_err(map_err)?;
        let take = |name: &str| -> Result<Tensor, GlanceError> {
            tensors
                .get(name)
                .cloned()
                .ok_or_else(|| GlanceError::Internal {
                    message: format!("load: checkpoint missing tensor '{name}'"),
                })
        };
        let w_ih = take("i2h.weight")?;
        let b_ih = take("i2h.bias")?;
        let w_io = take("i2o.weight")?;
        let b_io = take("i2o.bias")?;

        let (hidden_size, combined) = w_ih.dims2().map_err(map_err)?;
        let (output_size, io_combined) = w_io.dims2().map_err(map_err)?;
        if io_combined != combined {
            return Err(GlanceError::Internal {
                message: format!(
                    "load: i2h and i2o disagree on combined width ({combined} vs {io_combined})"
                ),
            });
        }
        let input_size = combined.checked_sub(hidden_size).ok_or_else(|| {
            GlanceError::Internal {
                message: format!(
                    "load: i2h weight width {combined} is narrower than hidden size {hidden_size}"
                ),
            }
        })?;
        let config = ClassifierConfig {
            input_size,
            hidden_size,
            output_size,
        };

        let flat = |t: &Tensor| -> Result<Vec<f32>, GlanceError> {
            t.flatten_all().map_err(map_err)?.to_vec1().map_err(map_err)
        };
        Self::from_weights(flat(&w_ih)?, flat(&b_ih)?, flat(&w_io)?, flat(&b_io)?, &config, device)
    }
}

/// Xavier-uniform weights for an `in_dim -> out_dim` affine map, row-major
/// `(out_dim, in_dim)` to match candle's `Linear` layout.
fn xavier_weights(rng: &mut SimpleRng, in_dim: usize, out_dim: usize) -> Vec<f32> {
    let bound = (6.0 / (in_dim + out_dim) as f32).sqrt();
    (0..in_dim * out_dim)
        .map(|_| rng.next_f32_range(-bound, bound))
        .collect()
}

fn check_len(buf: &[f32], expected: usize) -> Result<(), GlanceError> {
    if buf.len() != expected {
        return Err(GlanceError::ShapeMismatch {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ClassifierConfig {
        ClassifierConfig {
            input_size: 7,
            hidden_size: 8,
            output_size: 2,
        }
    }

    /// A steps x 7 encoding with a rotating one-hot and fixed features.
    fn encoded(steps: usize) -> EncodedQuestion {
        let width = 7;
        let mut data = vec![0.0f32; steps * width];
        for t in 0..steps {
            data[t * width + t % 5] = 1.0;
            data[t * width + 5] = 0.5;
            data[t * width + 6] = 0.25;
        }
        EncodedQuestion::new(data, steps, width).unwrap()
    }

    #[test]
    fn same_seed_same_outputs() {
        let config = small_config();
        let device = Device::Cpu;
        let a = RecurrentClassifier::new_random(42, &config, &device).unwrap();
        let b = RecurrentClassifier::new_random(42, &config, &device).unwrap();
        let input = encoded(3);
        let out_a = a.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        let out_b = b.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn different_seeds_different_outputs() {
        let config = small_config();
        let device = Device::Cpu;
        let a = RecurrentClassifier::new_random(1, &config, &device).unwrap();
        let b = RecurrentClassifier::new_random(2, &config, &device).unwrap();
        let input = encoded(3);
        let out_a = a.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        let out_b = b.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        assert_ne!(out_a, out_b);
    }

    #[test]
    fn forward_produces_final_output_shape() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let output = model.forward_sequence(&encoded(4)).unwrap();
        assert_eq!(output.dims(), &[1, 2]);
    }

    #[test]
    fn outputs_are_log_probabilities() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let output = model.forward_sequence(&encoded(4)).unwrap();
        let row = &output.to_vec2::<f32>().unwrap()[0];
        let total: f32 = row.iter().map(|v| v.exp()).sum();
        assert!((total - 1.0).abs() < 1e-5, "probabilities sum to {total}");
        assert!(row.iter().all(|v| *v <= 0.0));
    }

    #[test]
    fn step_shapes() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let input = Tensor::zeros((1, 7), DType::F32, &Device::Cpu).unwrap();
        let hidden = model.init_hidden().unwrap();
        assert_eq!(hidden.dims(), &[1, 8]);
        let (output, next_hidden) = model.step(&input, &hidden).unwrap();
        assert_eq!(output.dims(), &[1, 2]);
        assert_eq!(next_hidden.dims(), &[1, 8]);
    }

    #[test]
    fn token_order_changes_output() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let width = 7;
        let mut forward = vec![0.0f32; 2 * width];
        forward[0] = 1.0; // token 0 first
        forward[width + 1] = 1.0; // token 1 second
        let mut reversed = vec![0.0f32; 2 * width];
        reversed[1] = 1.0;
        reversed[width] = 1.0;
        let out_fwd = model
            .forward_sequence(&EncodedQuestion::new(forward, 2, width).unwrap())
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        let out_rev = model
            .forward_sequence(&EncodedQuestion::new(reversed, 2, width).unwrap())
            .unwrap()
            .to_vec2::<f32>()
            .unwrap();
        assert_ne!(out_fwd, out_rev);
    }

    #[test]
    fn width_mismatch_errors() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let narrow = EncodedQuestion::new(vec![0.0; 6], 1, 6).unwrap();
        assert_eq!(
            model.forward_sequence(&narrow).err(),
            Some(GlanceError::ShapeMismatch {
                expected: 7,
                actual: 6
            })
        );
    }

    #[test]
    fn empty_sequence_errors() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let empty = EncodedQuestion::new(vec![], 0, 7).unwrap();
        assert!(matches!(
            model.forward_sequence(&empty),
            Err(GlanceError::Internal { .. })
        ));
    }

    #[test]
    fn param_count_matches_layout() {
        let config = small_config();
        // (7+8)*8 + 8 for i2h, (7+8)*2 + 2 for i2o.
        assert_eq!(config.param_count(), 120 + 8 + 30 + 2);
    }

    #[test]
    fn feature_width_subtracts_vocabulary() {
        let config = small_config();
        assert_eq!(config.feature_width(5).unwrap(), 2);
        assert!(matches!(
            config.feature_width(8),
            Err(GlanceError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn from_weights_rejects_bad_lengths() {
        let config = small_config();
        let combined = config.input_size + config.hidden_size;
        let result = RecurrentClassifier::from_weights(
            vec![0.0; combined * config.hidden_size - 1],
            vec![0.0; config.hidden_size],
            vec![0.0; combined * config.output_size],
            vec![0.0; config.output_size],
            &config,
            &Device::Cpu,
        );
        assert!(matches!(result, Err(GlanceError::ShapeMismatch { .. })));
    }

    #[test]
    fn save_load_roundtrip() {
        let config = small_config();
        let device = Device::Cpu;
        let model = RecurrentClassifier::new_random(42, &config, &device).unwrap();
        let path = std::env::temp_dir().join(format!(
            "glance_classifier_{:?}.safetensors",
            std::thread::current().id()
        ));

        model.save(&path).unwrap();
        let loaded = RecurrentClassifier::load(&path, &device).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config(), model.config());
        let input = encoded(3);
        let original = model.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        let restored = loaded.forward_sequence(&input).unwrap().to_vec2::<f32>().unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn load_missing_file_errors() {
        let result = RecurrentClassifier::load(
            Path::new("/nonexistent/glance_checkpoint.safetensors"),
            &Device::Cpu,
        );
        assert!(matches!(result, Err(GlanceError::Internal { .. })));
    }

    #[test]
    fn debug_format_readable() {
        let model = RecurrentClassifier::new_random(42, &small_config(), &Device::Cpu).unwrap();
        let text = format!("{model:?}");
        assert!(text.contains("RecurrentClassifier"));
        assert!(text.contains("hidden=8"));
        assert!(text.contains("160 params"));
    }
}
