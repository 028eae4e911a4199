//! Editor configuration - loaded from YAML
//!
//! ```yaml
//! grid:
//!   lane_count: 20
//!   day_count: 31
//!   lane_height: 36.0
//!   unit_width: 41.29
//!   day_unit: DAY
//!   origin_date: 2024-03-01
//! control_offset: { min: 25.0, max: 75.0 }
//! default_duration_days: 1
//! link_policy: allow-self-loops
//! ```

use crate::core::{ControlOffset, DayUnit, Grid, LinkPolicy};
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const LOCAL_CONFIG: &str = "ganttline.yml";

/// Grid layout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub lane_count: usize,
    pub day_count: usize,
    pub lane_height: f64,
    /// Pixel width of one timeline unit
    pub unit_width: f64,
    pub day_unit: DayUnit,
    /// Date of the first day column; today when unset
    pub origin_date: Option<NaiveDate>,
}

impl Default for GridConfig {
    fn default() -> Self {
        // 1280x720 canvas split into 31 days by 20 lanes
        Self {
            lane_count: 20,
            day_count: 31,
            lane_height: 720.0 / 20.0,
            unit_width: 1280.0 / 31.0,
            day_unit: DayUnit::Day,
            origin_date: None,
        }
    }
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub grid: GridConfig,
    pub control_offset: ControlOffset,
    pub default_duration_days: u32,
    pub link_policy: LinkPolicy,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            control_offset: ControlOffset::default(),
            default_duration_days: 1,
            link_policy: LinkPolicy::default(),
        }
    }
}

impl EditorConfig {
    /// Load config from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EditorConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// User-level config location (`<config dir>/ganttline/config.yml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ganttline").join("config.yml"))
    }

    /// Auto-detect and load config
    /// Priority:
    /// 1. ./ganttline.yml
    /// 2. <config dir>/ganttline/config.yml
    /// 3. built-in defaults
    pub fn auto_load() -> Result<Self> {
        let local = Path::new(LOCAL_CONFIG);
        if local.exists() {
            return Self::from_file(local);
        }

        if let Some(path) = Self::default_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        log::debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// Reject settings that would make the grid or the curves degenerate
    pub fn validate(&self) -> Result<()> {
        let grid = &self.grid;
        if grid.lane_count == 0 || grid.day_count == 0 {
            anyhow::bail!("grid must have at least one lane and one day");
        }
        if !(grid.lane_height > 0.0 && grid.unit_width > 0.0) {
            anyhow::bail!(
                "lane_height ({}) and unit_width ({}) must be positive",
                grid.lane_height,
                grid.unit_width
            );
        }
        if self.control_offset.min > self.control_offset.max {
            anyhow::bail!(
                "control_offset.min ({}) exceeds control_offset.max ({})",
                self.control_offset.min,
                self.control_offset.max
            );
        }
        if self.default_duration_days == 0 {
            anyhow::bail!("default_duration_days must be at least 1");
        }
        Ok(())
    }

    /// Build the initial grid
    pub fn grid(&self) -> Grid {
        let origin = self
            .grid
            .origin_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        Grid {
            lane_count: self.grid.lane_count,
            day_count: self.grid.day_count,
            day_unit: self.grid.day_unit,
            origin,
            lane_height: self.grid.lane_height,
            unit_width: self.grid.unit_width,
        }
    }
}
