use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.detection.temporal_window == 0 {
            anyhow::bail!("detection.temporal_window must be at least 1");
        }
        if self.detection.frame_stride == 0 {
            anyhow::bail!("detection.frame_stride must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.detection.accident_threshold) {
            anyhow::bail!("detection.accident_threshold must lie in [0,1]");
        }
        if self.model.input_width == 0 || self.model.input_height == 0 {
            anyhow::bail!("model input dimensions must be non-zero");
        }
        Ok(())
    }
}
