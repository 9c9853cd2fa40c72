// This is the models module containing the shared input structures of the conversion API
use serde::{Deserialize, Serialize};

use crate::error::{Result, TilePickError};
use crate::tile_grid::MAX_ZOOM_DELTA;

fn default_zoom_delta() -> u32 {
    1
}

/// Run-wide conversion settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Property copied from source polygons onto grid cells, e.g. "population"
    pub value_property: String,
    #[serde(default = "default_zoom_delta")]
    pub zoom_delta: u32,
}

impl ConversionOptions {
    pub fn new(value_property: impl Into<String>, zoom_delta: u32) -> Self {
        Self {
            value_property: value_property.into(),
            zoom_delta,
        }
    }

    /// Errors here are fatal for a whole run.
    pub fn validate(&self) -> Result<()> {
        if self.value_property.trim().is_empty() {
            return Err(TilePickError::MissingValueProperty);
        }
        if self.zoom_delta > MAX_ZOOM_DELTA {
            return Err(TilePickError::InvalidZoomDelta(self.zoom_delta));
        }
        Ok(())
    }
}

// One tile of a batch: "z-x-y" key plus its source collection, if it could be read
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TileInput {
    pub tile: String,
    #[serde(default)]
    pub source: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct BatchInput {
    pub options: ConversionOptions,
    #[serde(default)]
    pub tiles: Vec<TileInput>,
}
