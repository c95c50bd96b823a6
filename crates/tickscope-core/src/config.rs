//! Viewer configuration loading and validation.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::interpolate::DEFAULT_SMOOTHING;
use crate::mapper::DEFAULT_WORLD_EXTENT;
use crate::math::{Rgba, Viewport};
use crate::reconcile::{RetirePolicy, DEFAULT_GRACE_TICKS};

/// Main viewer configuration, loaded from .tickscope/config.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Simulation length spanning the viewport on both axes
    pub world_extent: f64,

    /// Per-tick position smoothing factor, in (0, 1]
    pub smoothing: f32,

    pub stream: StreamConfig,

    pub retire: RetireConfig,

    pub layers: LayersConfig,

    /// Initial window size in pixels
    pub viewport: Viewport,

    pub palette: Palette,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            world_extent: DEFAULT_WORLD_EXTENT,
            smoothing: DEFAULT_SMOOTHING,
            stream: StreamConfig::default(),
            retire: RetireConfig::default(),
            layers: LayersConfig::default(),
            viewport: Viewport::default(),
            palette: Palette::default(),
        }
    }
}

/// State-stream endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
        }
    }
}

fn default_stream_url() -> String {
    "ws://127.0.0.1:8080/ws".to_string()
}

/// Retirement of entities that stop appearing in the stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetireConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Completed ticks an entity may go unseen before it is removed
    #[serde(default = "default_grace_ticks")]
    pub grace_ticks: u64,
}

impl Default for RetireConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            grace_ticks: DEFAULT_GRACE_TICKS,
        }
    }
}

fn default_grace_ticks() -> u64 {
    DEFAULT_GRACE_TICKS
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayersConfig {
    /// Draw waypoint markers over agents instead of under them
    #[serde(default)]
    pub markers_over_agents: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Rgba,
    pub agent: Rgba,
    /// Agents the producer could not route
    pub agent_stalled: Rgba,
    pub obstacle: Rgba,
    pub path_line: Rgba,
    pub marker_start: Rgba,
    pub marker_intermediate: Rgba,
    pub marker_final: Rgba,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba::rgb(0x1e1e1e),
            agent: Rgba::rgb(0xffcc00),
            agent_stalled: Rgba::rgb(0xff6644),
            obstacle: Rgba::rgb(0x5a5a6e),
            path_line: Rgba::rgb(0x44aaff),
            marker_start: Rgba::rgb(0x33dd66),
            marker_intermediate: Rgba::rgb(0xaaaaaa),
            marker_final: Rgba::rgb(0xff3366),
        }
    }
}

impl ScopeConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Load from project root (looks for .tickscope/config.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".tickscope/config.yaml");
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_extent.is_finite() && self.world_extent > 0.0) {
            return Err(ConfigError::WorldExtent(self.world_extent));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ConfigError::Smoothing(self.smoothing));
        }
        let Viewport { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::Viewport { width, height });
        }
        Ok(())
    }

    pub fn retire_policy(&self) -> RetirePolicy {
        if self.retire.enabled {
            RetirePolicy::Sweep {
                grace_ticks: self.retire.grace_ticks,
            }
        } else {
            RetirePolicy::Keep
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: ScopeConfig = serde_yaml::from_str(
            "world_extent: 50\nretire:\n  grace_ticks: 3\npalette:\n  agent: \"#00ff00\"\n",
        )
        .unwrap();
        assert_eq!(config.world_extent, 50.0);
        assert_eq!(config.smoothing, DEFAULT_SMOOTHING);
        assert!(config.retire.enabled);
        assert_eq!(config.retire_policy(), RetirePolicy::Sweep { grace_ticks: 3 });
        assert_eq!(config.palette.agent, Rgba::rgb(0x00ff00));
        assert_eq!(config.palette.obstacle, Palette::default().obstacle);
        assert_eq!(config.stream.url, "ws://127.0.0.1:8080/ws");
    }

    #[test]
    fn retirement_defaults_to_a_one_second_grace() {
        let config: ScopeConfig = serde_yaml::from_str("retire:\n  enabled: true\n").unwrap();
        assert_eq!(config.retire.grace_ticks, DEFAULT_GRACE_TICKS);
        assert_eq!(
            ScopeConfig::default().retire_policy(),
            RetirePolicy::Sweep { grace_ticks: 20 }
        );
    }

    #[test]
    fn disabled_retirement_keeps_everything() {
        let config: ScopeConfig = serde_yaml::from_str("retire:\n  enabled: false\n").unwrap();
        assert_eq!(config.retire_policy(), RetirePolicy::Keep);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut config = ScopeConfig::default();
        assert_eq!(config.validate(), Ok(()));

        config.world_extent = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::WorldExtent(0.0)));

        config = ScopeConfig {
            smoothing: 1.5,
            ..ScopeConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Smoothing(1.5)));

        config = ScopeConfig {
            viewport: Viewport::new(0.0, 10.0),
            ..ScopeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Viewport { .. })));
    }
}
