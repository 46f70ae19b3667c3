use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::error::AppResult;

/// Tuning knobs for the recognition pipeline.
///
/// The defaults were tuned against one card skin at one resolution. A
/// different skin or scale is accommodated by editing the config file,
/// never by touching pipeline code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the 13 rank templates plus next_stack.png
    pub assets_dir: String,

    /// External solver executable, fed the 52-line grid on stdin
    pub solver_path: String,

    /// Hard deadline for one solver invocation, in seconds
    pub solver_timeout_secs: u64,

    /// Whole-capture scan threshold used to seed the pile grid
    pub rough_confidence: f64,

    /// Per-cell search starts at this confidence...
    pub fine_confidence_start: f64,

    /// ...loosens down to this floor...
    pub fine_confidence_floor: f64,

    /// ...in steps of this size
    pub fine_confidence_step: f64,

    /// Threshold for locating the draw control during replay
    pub draw_confidence: f64,

    /// Cell search box: leftward offset, as a fraction of column spacing
    pub cell_pad_x_frac: f64,

    /// Cell search box: width, as a fraction of column spacing
    pub cell_width_frac: f64,

    /// Cell search box: upward offset, as a fraction of row spacing
    pub cell_pad_y_frac: f64,

    /// Cell search box: height, as a fraction of row spacing
    pub cell_height_frac: f64,

    /// Pause between simulated clicks while replaying moves
    pub click_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_dir: "assets".to_string(),
            solver_path: "./solver".to_string(),
            solver_timeout_secs: 60,
            rough_confidence: 0.90,
            fine_confidence_start: 0.85,
            fine_confidence_floor: 0.01,
            fine_confidence_step: 0.02,
            draw_confidence: 0.90,
            cell_pad_x_frac: 0.06, // rank glyph sits left of the inferred anchor
            cell_width_frac: 0.24,
            cell_pad_y_frac: 0.24, // and slightly above it
            cell_height_frac: 1.02,
            click_delay_ms: 500, // lets the game animate between clicks
        }
    }
}

impl Config {
    /// Load configuration from `path`. Creates a default config file if it
    /// doesn't exist, so first runs leave something to edit.
    pub fn load(path: &Path) -> AppResult<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config from {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            println!("✓ Created default config at: {}", path.display());
            println!("  Edit this file to customize settings.");
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Reject values the pipeline cannot run with. Confidences must sit in
    /// (0, 1], the fine search must actually descend, and the cell search
    /// box must have area.
    pub fn validate(&self) -> AppResult<()> {
        let confidences = [
            ("rough_confidence", self.rough_confidence),
            ("fine_confidence_start", self.fine_confidence_start),
            ("fine_confidence_floor", self.fine_confidence_floor),
            ("draw_confidence", self.draw_confidence),
        ];
        for (name, value) in confidences {
            anyhow::ensure!(
                value > 0.0 && value <= 1.0,
                "{name} must be in (0, 1], got {value}"
            );
        }
        anyhow::ensure!(
            self.fine_confidence_floor <= self.fine_confidence_start,
            "fine_confidence_floor must not exceed fine_confidence_start"
        );
        anyhow::ensure!(
            self.fine_confidence_step > 0.0,
            "fine_confidence_step must be positive, got {}",
            self.fine_confidence_step
        );
        anyhow::ensure!(
            self.cell_width_frac > 0.0 && self.cell_height_frac > 0.0,
            "cell search box fractions must be positive"
        );
        anyhow::ensure!(
            self.cell_pad_x_frac >= 0.0 && self.cell_pad_y_frac >= 0.0,
            "cell search box offsets must not be negative"
        );
        Ok(())
    }
}
