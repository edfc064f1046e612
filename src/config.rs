//! Startup configuration and model artifacts.
//!
//! Everything here is loaded exactly once before the listener binds and is
//! never re-read. Any failure is a [`ConfigError`] and aborts startup: the
//! server must not classify a single reading against partially loaded
//! artifacts.
//!
//! The artifact directory contains three JSON files produced by the offline
//! training pipeline (which is out of scope here and treated as opaque):
//!
//! - `runtime.json`: AP vocabulary, grid layout, top-K, smoothing constants
//! - `scaler.json`: learned per-AP mean and scale
//! - `model.json`: label vocabulary, fingerprint centroids, bandwidth

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::grid::GridSpec;
use crate::pipeline::classifier::CentroidClassifier;
use crate::pipeline::normalizer::SignalNormalizer;
use crate::pipeline::smoothing::{SmoothingConfig, TemporalEstimator};

/// Startup-only configuration failure; fatal to the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An artifact file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An artifact file is not valid JSON for its schema.
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The artifacts are individually well-formed but mutually inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_sentinel_dbm() -> i32 {
    -100
}

fn default_top_k() -> usize {
    3
}

fn default_tie_epsilon() -> f64 {
    1e-9
}

fn default_history_capacity() -> usize {
    20
}

/// Runtime parameters (`runtime.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    /// Access-point identifiers, in the feature order the scaler and
    /// classifier were trained on.
    pub ap_names: Vec<String>,
    /// Strength recorded for an AP that was not heard.
    #[serde(default = "default_sentinel_dbm")]
    pub sentinel_dbm: i32,
    /// Grid dimensions and labeling scheme.
    #[serde(default)]
    pub grid: GridSpec,
    /// How many ranked estimates each reading produces.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Probability delta below which two labels count as tied.
    #[serde(default = "default_tie_epsilon")]
    pub tie_epsilon: f64,
    /// Capacity of the recent-fix ring.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Noise constants for the temporal estimator.
    #[serde(default)]
    pub smoothing: SmoothingConfig,
}

/// Learned standardization parameters (`scaler.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Trained classifier artifact (`model.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    /// Label vocabulary, aligned with `centroids`.
    pub labels: Vec<String>,
    /// One fingerprint centroid per label, in normalized feature space.
    pub centroids: Vec<Vec<f64>>,
    /// Gaussian kernel bandwidth.
    pub bandwidth: f64,
}

/// Fully loaded and cross-validated configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub runtime: RuntimeConfig,
    pub scaler: ScalerArtifact,
    pub model: ModelArtifact,
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl AppConfig {
    /// Load and cross-validate all artifacts from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let config = Self {
            runtime: load_json(&dir.join("runtime.json"))?,
            scaler: load_json(&dir.join("scaler.json"))?,
            model: load_json(&dir.join("model.json"))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Cross-artifact consistency checks.
    ///
    /// Anything that would make a later request fail in a confusing way is
    /// rejected here instead, with enough detail to fix the artifact.
    fn validate(&self) -> Result<(), ConfigError> {
        let dims = self.runtime.ap_names.len();
        if dims == 0 {
            return Err(ConfigError::Invalid("ap_names is empty".into()));
        }

        if self.scaler.mean.len() != dims || self.scaler.scale.len() != dims {
            return Err(ConfigError::Invalid(format!(
                "scaler dimensionality (mean {}, scale {}) does not match the {dims} configured APs",
                self.scaler.mean.len(),
                self.scaler.scale.len(),
            )));
        }
        if let Some(i) = self
            .scaler
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "scaler.scale[{i}] = {} is not a usable divisor",
                self.scaler.scale[i]
            )));
        }

        if self.model.labels.is_empty() {
            return Err(ConfigError::Invalid("model has no labels".into()));
        }
        if self.model.labels.len() != self.model.centroids.len() {
            return Err(ConfigError::Invalid(format!(
                "model has {} labels but {} centroids",
                self.model.labels.len(),
                self.model.centroids.len()
            )));
        }
        for (label, centroid) in self.model.labels.iter().zip(&self.model.centroids) {
            if centroid.len() != dims {
                return Err(ConfigError::Invalid(format!(
                    "centroid for {label:?} has {} components, expected {dims}",
                    centroid.len()
                )));
            }
            let cell = self
                .runtime
                .grid
                .decode(label)
                .map_err(|err| ConfigError::Invalid(format!("model label {label:?}: {err}")))?;
            if !self.runtime.grid.contains(cell) {
                return Err(ConfigError::Invalid(format!(
                    "model label {label:?} lies outside the {}x{} grid",
                    self.runtime.grid.rows, self.runtime.grid.cols
                )));
            }
        }
        if !(self.model.bandwidth.is_finite() && self.model.bandwidth > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "model bandwidth {} must be a positive number",
                self.model.bandwidth
            )));
        }

        if self.runtime.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".into()));
        }
        if self.runtime.history_capacity == 0 {
            return Err(ConfigError::Invalid(
                "history_capacity must be at least 1".into(),
            ));
        }
        if !(self.runtime.tie_epsilon >= 0.0 && self.runtime.tie_epsilon.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "tie_epsilon {} must be a non-negative number",
                self.runtime.tie_epsilon
            )));
        }

        let s = &self.runtime.smoothing;
        if s.process_noise <= 0.0 || s.obs_noise_base <= 0.0 {
            return Err(ConfigError::Invalid(
                "smoothing noise constants must be positive".into(),
            ));
        }
        if !(s.prob_floor > 0.0 && s.prob_floor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "smoothing prob_floor {} must lie in (0, 1]",
                s.prob_floor
            )));
        }

        Ok(())
    }

    /// Build the normalizer from the scaler artifact.
    pub fn normalizer(&self) -> SignalNormalizer {
        SignalNormalizer::new(self.scaler.mean.clone(), self.scaler.scale.clone())
    }

    /// Build the shipped classifier from the model artifact.
    pub fn classifier(&self) -> Arc<CentroidClassifier> {
        Arc::new(CentroidClassifier::new(
            self.model.centroids.clone(),
            self.model.bandwidth,
        ))
    }

    /// Build a fresh temporal estimator.
    pub fn estimator(&self) -> TemporalEstimator {
        TemporalEstimator::new(self.runtime.smoothing, self.runtime.grid)
    }
}
