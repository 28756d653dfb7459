//! Single-hidden-layer scoring network.
//!
//! Input → Hidden (sigmoid) → one sigmoid output. The output is read as the
//! probability that a text is inappropriate. Training is strictly online:
//! one example per update, no batching.

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::checkpoint::CheckpointError;
use crate::encoder::FeatureVector;
use crate::neural::loss::{output_delta, squared_error};

const ACTIVATION_CLAMP: f32 = 500.0;

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x.clamp(-ACTIVATION_CLAMP, ACTIVATION_CLAMP)).exp())
}

/// Flat parameter buffers, the persisted form of a [`ScoringNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkParameters {
    pub input_size: usize,
    pub hidden_size: usize,
    /// Row-major `[hidden_size, input_size]`
    pub w1: Vec<f32>,
    pub b1: Vec<f32>,
    pub w2: Vec<f32>,
    pub b2: f32,
}

/// Compact feedforward classifier, trained one example at a time.
#[derive(Debug, Clone)]
pub struct ScoringNetwork {
    learning_rate: f32,
    // Layer 1: input → hidden
    w1: Array2<f32>, // [hidden_size, input_size]
    b1: Array1<f32>, // [hidden_size]
    // Layer 2: hidden → score
    w2: Array1<f32>, // [hidden_size]
    b2: f32,
}

impl ScoringNetwork {
    /// Creates a network with Xavier-uniform weights drawn from `seed`.
    pub fn new(input_size: usize, hidden_size: usize, learning_rate: f32, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

        let w1_scale = (2.0 / input_size as f32).sqrt();
        let w1 = Array2::from_shape_fn((hidden_size, input_size), |_| {
            (rng.gen::<f32>() - 0.5) * 2.0 * w1_scale
        });

        let w2_scale = (2.0 / hidden_size as f32).sqrt();
        let w2 = Array1::from_shape_fn(hidden_size, |_| {
            (rng.gen::<f32>() - 0.5) * 2.0 * w2_scale
        });

        Self {
            learning_rate,
            w1,
            b1: Array1::zeros(hidden_size),
            w2,
            b2: 0.0,
        }
    }

    /// Restores a network from persisted parameters.
    ///
    /// Fails with [`CheckpointError::InvalidFormat`] when the buffers do not
    /// match `input_size`/`hidden_size`; weights are never reshaped.
    pub fn from_parameters(
        params: NetworkParameters,
        input_size: usize,
        hidden_size: usize,
        learning_rate: f32,
    ) -> Result<Self, CheckpointError> {
        if params.input_size != input_size || params.hidden_size != hidden_size {
            return Err(CheckpointError::InvalidFormat(format!(
                "network dimensions mismatch: expected {}x{}, found {}x{}",
                input_size, hidden_size, params.input_size, params.hidden_size
            )));
        }
        if params.b1.len() != hidden_size || params.w2.len() != hidden_size {
            return Err(CheckpointError::InvalidFormat(format!(
                "hidden layer buffers must hold {} values, found b1={} w2={}",
                hidden_size,
                params.b1.len(),
                params.w2.len()
            )));
        }
        if params
            .w1
            .iter()
            .chain(&params.b1)
            .chain(&params.w2)
            .any(|v| !v.is_finite())
            || !params.b2.is_finite()
        {
            return Err(CheckpointError::InvalidFormat(
                "network parameters contain non-finite values".into(),
            ));
        }

        let w1 = Array2::from_shape_vec((hidden_size, input_size), params.w1)
            .map_err(|err| CheckpointError::InvalidFormat(format!("w1 shape: {err}")))?;

        Ok(Self {
            learning_rate,
            w1,
            b1: Array1::from_vec(params.b1),
            w2: Array1::from_vec(params.w2),
            b2: params.b2,
        })
    }

    pub fn input_size(&self) -> usize {
        self.w1.ncols()
    }

    pub fn hidden_size(&self) -> usize {
        self.w1.nrows()
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn forward_with_cache(&self, input: &FeatureVector) -> (f32, Array1<f32>) {
        let hidden = (self.w1.dot(input) + &self.b1).mapv(sigmoid);
        let output = sigmoid(self.w2.dot(&hidden) + self.b2);
        (output, hidden)
    }

    /// Scores `input`. Always in `[0, 1]`.
    pub fn forward(&self, input: &FeatureVector) -> f32 {
        self.forward_with_cache(input).0
    }

    /// One online gradient step toward `target` (0.0 safe, 1.0 inappropriate).
    ///
    /// Returns the squared error of the prediction made before the update.
    pub fn train_step(&mut self, input: &FeatureVector, target: f32) -> f32 {
        let (output, hidden) = self.forward_with_cache(input);
        let delta = output_delta(output, target);

        // Hidden error uses the pre-update output weights
        let hidden_delta = &hidden.mapv(|h| h * (1.0 - h)) * &(&self.w2 * delta);

        let lr = self.learning_rate;
        self.w2.scaled_add(lr * delta, &hidden);
        self.b2 += lr * delta;

        for (mut row, &d) in self.w1.rows_mut().into_iter().zip(hidden_delta.iter()) {
            row.scaled_add(lr * d, input);
        }
        self.b1.scaled_add(lr, &hidden_delta);

        squared_error(output, target)
    }

    pub fn parameters(&self) -> NetworkParameters {
        NetworkParameters {
            input_size: self.input_size(),
            hidden_size: self.hidden_size(),
            w1: self.w1.iter().cloned().collect(),
            b1: self.b1.to_vec(),
            w2: self.w2.to_vec(),
            b2: self.b2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FeatureEncoder;

    fn network() -> ScoringNetwork {
        ScoringNetwork::new(64, 32, 0.15, 42)
    }

    #[test]
    fn test_network_creation() {
        let net = network();
        assert_eq!(net.w1.dim(), (32, 64));
        assert_eq!(net.b1.dim(), 32);
        assert_eq!(net.w2.dim(), 32);
        assert_eq!(net.input_size(), 64);
        assert_eq!(net.hidden_size(), 32);
    }

    #[test]
    fn test_same_seed_same_weights() {
        assert_eq!(network().parameters(), network().parameters());
        assert_ne!(
            network().parameters(),
            ScoringNetwork::new(64, 32, 0.15, 7).parameters()
        );
    }

    #[test]
    fn test_forward_in_unit_interval() {
        let net = network();
        let encoder = FeatureEncoder::new(64);
        for text in ["", "puppy", "space pirates with lasers", "ZZZZZZZZ"] {
            let score = net.forward(&encoder.encode(text));
            assert!((0.0..=1.0).contains(&score), "{text}: {score}");
        }
    }

    #[test]
    fn test_forward_saturates_without_nan() {
        let mut net = network();
        net.b2 = 1.0e6;
        let input = FeatureEncoder::new(64).encode("anything");
        let score = net.forward(&input);
        assert!(score.is_finite());
        assert!(score <= 1.0);
    }

    #[test]
    fn test_train_step_moves_toward_target() {
        let mut net = network();
        let input = FeatureEncoder::new(64).encode("rainbow");

        let before = net.forward(&input);
        let loss = net.train_step(&input, 1.0);
        let after = net.forward(&input);

        assert!(loss.is_finite());
        assert!((loss - (1.0 - before).powi(2)).abs() < 1e-6);
        assert!(after > before);
    }

    #[test]
    fn test_train_step_updates_every_tensor() {
        let mut net = network();
        let initial = net.parameters();
        let input = FeatureEncoder::new(64).encode("castle");
        net.train_step(&input, 0.0);
        let updated = net.parameters();

        assert_ne!(initial.w1, updated.w1);
        assert_ne!(initial.b1, updated.b1);
        assert_ne!(initial.w2, updated.w2);
        assert_ne!(initial.b2, updated.b2);
    }

    #[test]
    fn test_parameters_roundtrip() {
        let mut net = network();
        let input = FeatureEncoder::new(64).encode("moon base");
        net.train_step(&input, 1.0);

        let restored = ScoringNetwork::from_parameters(net.parameters(), 64, 32, 0.15).unwrap();
        assert_eq!(restored.parameters(), net.parameters());
        assert_eq!(restored.forward(&input), net.forward(&input));
    }

    #[test]
    fn test_from_parameters_rejects_dimension_mismatch() {
        let params = network().parameters();
        let err = ScoringNetwork::from_parameters(params, 64, 16, 0.15).unwrap_err();
        match err {
            CheckpointError::InvalidFormat(msg) => assert!(msg.contains("mismatch")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_from_parameters_rejects_truncated_buffer() {
        let mut params = network().parameters();
        params.w1.truncate(10);
        let err = ScoringNetwork::from_parameters(params, 64, 32, 0.15).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidFormat(_)));
    }
}
