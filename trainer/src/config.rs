use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use machine_learning::training::TrainConfig;
use serde::{Deserialize, Serialize};

/// The contents of the JSON file the trainer is started with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    #[serde(default)]
    pub training: TrainConfig,
    /// The training split, in MNIST CSV format.
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    /// Whether the CSV files start with a header line.
    #[serde(default = "default_has_header")]
    pub has_header: bool,
    /// Every pixel value is divided by this.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_has_header() -> bool {
    true
}

fn default_scale() -> f32 {
    255.
}

impl TrainerConfig {
    /// Reads and validates a config file.
    ///
    /// # Errors
    /// If the file can't be read, isn't valid JSON or holds invalid values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        ensure!(
            self.scale.is_finite() && self.scale > 0.,
            "scale must be positive, got {}",
            self.scale
        );
        Ok(())
    }
}
