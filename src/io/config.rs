use crate::error::{GradError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which loss the trainer builds each step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    #[default]
    Mse,
    CrossEntropy,
}

/// Training loop settings, usually read from YAML
///
/// ```yaml
/// epochs: 100
/// batch_size: 4
/// learning_rate: 0.1
/// shuffle: true
/// seed: 7
/// ```
///
/// Omitted fields take the values of [`TrainConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub loss: LossKind,
    pub shuffle: bool,
    pub seed: u64,
    /// Emit an `info` event every this many epochs; 0 disables them.
    pub log_every: usize,
    pub progress: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            epochs: 10,
            batch_size: 1,
            learning_rate: 0.01,
            momentum: 0.0,
            weight_decay: 0.0,
            loss: LossKind::Mse,
            shuffle: false,
            seed: 0,
            log_every: 1,
            progress: false,
        }
    }
}

impl TrainConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: TrainConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded training config");
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// # Errors
    /// `Config` for zero epochs or batch size, a learning rate that is not a
    /// positive finite number, momentum outside `[0, 1)`, or negative weight decay.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(GradError::Config("epochs must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(GradError::Config("batch_size must be positive".to_string()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(GradError::Config(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(GradError::Config(format!(
                "momentum must be in [0, 1), got {}",
                self.momentum
            )));
        }
        if !(self.weight_decay.is_finite() && self.weight_decay >= 0.0) {
            return Err(GradError::Config(format!(
                "weight_decay must be non-negative, got {}",
                self.weight_decay
            )));
        }
        Ok(())
    }
}
