use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::theme::Palette;

/// Font and padding model used to size cards from their names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardMetrics {
    /// Advance of a single-width character; wide-script characters take two.
    pub char_width: f32,
    pub line_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub min_width: f32,
    pub max_width: f32,
    pub min_height: f32,
}

impl Default for CardMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 20.0,
            padding_x: 16.0,
            padding_y: 12.0,
            min_width: 120.0,
            max_width: 240.0,
            min_height: 80.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Center-to-center distance that links two cards into one aggregate.
    pub radius: f32,
    /// Farthest a card center may sit from an aggregate's centroid when it
    /// is added to that aggregate by hand.
    pub max_member_distance: f32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius: 300.0,
            max_member_distance: 400.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Offset of the Z detours beyond the bounding box of both endpoints.
    pub route_margin: f32,
    /// Inflation applied to every obstacle card.
    pub obstacle_margin: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            route_margin: 24.0,
            obstacle_margin: 8.0,
        }
    }
}

/// Upper bound accepted for `placement.maxRings` in a config file.
pub const MAX_PLACEMENT_RINGS: u32 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementConfig {
    pub step: f32,
    pub max_rings: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            step: 40.0,
            max_rings: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    pub metrics: CardMetrics,
    pub cluster: ClusterConfig,
    pub routing: RoutingConfig,
    pub placement: PlacementConfig,
    pub palette: Palette,
}

/// Loads a JSON config file; every omitted key keeps its default.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<BoardConfig> {
    let Some(path) = path else {
        return Ok(BoardConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let config: BoardConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &BoardConfig) -> anyhow::Result<()> {
    let metrics = &config.metrics;
    if metrics.char_width <= 0.0 || metrics.line_height <= 0.0 {
        anyhow::bail!("metrics.charWidth and metrics.lineHeight must be positive");
    }
    if metrics.min_width > metrics.max_width {
        anyhow::bail!("metrics.minWidth must not exceed metrics.maxWidth");
    }
    if metrics.max_width <= metrics.padding_x * 2.0 {
        anyhow::bail!("metrics.maxWidth must leave room inside the horizontal padding");
    }
    if config.cluster.radius < 0.0 || config.cluster.max_member_distance < 0.0 {
        anyhow::bail!("cluster distances must not be negative");
    }
    if config.placement.step <= 0.0 {
        anyhow::bail!("placement.step must be positive");
    }
    if config.placement.max_rings > MAX_PLACEMENT_RINGS {
        anyhow::bail!("placement.maxRings must be at most {MAX_PLACEMENT_RINGS}");
    }
    Ok(())
}
