// src/config.rs

use crate::types::Config;
use anyhow::{ensure, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.detection.confidence_threshold),
            "detection.confidence_threshold must be within [0, 1], got {}",
            self.detection.confidence_threshold
        );
        ensure!(
            self.allocation.nominal_width_px > 0.0,
            "allocation.nominal_width_px must be positive, got {}",
            self.allocation.nominal_width_px
        );
        for (vehicle_type, ratio) in &self.ratios {
            ensure!(
                *ratio > 0.0,
                "size ratio for {vehicle_type} must be positive, got {ratio}"
            );
        }
        Ok(())
    }
}
