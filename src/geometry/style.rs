//! Path styling for boundary and zoning layers.

use serde::{Deserialize, Serialize};

use crate::config::StyleConfig;

pub const DEFAULT_ZONE_FILL: &str = "#3388ff";

/// Stroke and fill options understood by the drawing library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    /// Stroke colour
    pub color: String,
    pub fill_color: String,
    pub fill_opacity: f64,
    /// Stroke width in pixels
    pub weight: f64,
    /// Stroke opacity
    pub opacity: f64,
    /// SVG dash pattern, e.g. `"6, 4"`; solid when `None`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash_array: Option<String>,
    /// Whether the layer receives pointer events
    pub interactive: bool,
}

impl LayerStyle {
    pub fn municipal(color: &str) -> Self {
        Self {
            color: color.to_string(),
            fill_color: color.to_string(),
            fill_opacity: 0.03,
            weight: 3.0,
            opacity: 0.9,
            dash_array: Some("10, 6".to_string()),
            interactive: false,
        }
    }

    pub fn barangay(color: &str) -> Self {
        Self {
            color: color.to_string(),
            fill_color: color.to_string(),
            fill_opacity: 0.05,
            weight: 2.0,
            opacity: 0.7,
            dash_array: Some("6, 4".to_string()),
            interactive: false,
        }
    }

    /// The barangay currently scoping new zones
    pub fn selected_barangay(color: &str) -> Self {
        Self {
            fill_opacity: 0.12,
            weight: 3.0,
            opacity: 1.0,
            ..Self::barangay(color)
        }
    }

    pub fn zoning(fill: &str) -> Self {
        Self {
            color: fill.to_string(),
            fill_color: fill.to_string(),
            fill_opacity: 0.5,
            weight: 2.0,
            opacity: 1.0,
            dash_array: None,
            interactive: true,
        }
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }
}

/// Resolved styles for every layer kind
#[derive(Debug, Clone, PartialEq)]
pub struct StylePalette {
    pub municipal: LayerStyle,
    pub barangay: LayerStyle,
    pub selected_barangay: LayerStyle,
    /// Fill used for zones whose classification carries no colour
    pub zoning_fill: String,
}

impl StylePalette {
    pub fn from_config(config: &StyleConfig) -> Self {
        Self {
            municipal: LayerStyle::municipal(&config.municipal_color),
            barangay: LayerStyle::barangay(&config.barangay_color),
            selected_barangay: LayerStyle::selected_barangay(&config.barangay_color),
            zoning_fill: config.zoning_fill.clone(),
        }
    }

    pub fn zoning(&self, color: Option<&str>) -> LayerStyle {
        LayerStyle::zoning(color.filter(|c| !c.is_empty()).unwrap_or(&self.zoning_fill))
    }
}

impl Default for StylePalette {
    fn default() -> Self {
        Self::from_config(&StyleConfig::default())
    }
}
