use wasm_bindgen::JsValue;

use crate::tile_grid::MAX_ZOOM_DELTA;
use crate::tile_math::MAX_ZOOM;

/// Errors raised by the conversion core.
///
/// Configuration errors (`InvalidZoomDelta`, `MissingValueProperty`) are fatal for a whole
/// batch; everything else is local to the tile that produced it.
#[derive(Debug, thiserror::Error)]
pub enum TilePickError {
    #[error("zoom delta {0} is out of range (must be between 0 and {max})", max = MAX_ZOOM_DELTA)]
    InvalidZoomDelta(u32),
    #[error("zoom delta {dz} exceeds source zoom {zoom}")]
    ZoomDeltaExceedsZoom { dz: u32, zoom: u32 },
    #[error(
        "invalid tile {zoom}-{x}-{y} (zoom must be <= {max}, x and y below 2^zoom)",
        max = MAX_ZOOM
    )]
    InvalidTile { zoom: u32, x: u32, y: u32 },
    #[error("invalid tile key {0:?}, expected \"zoom-x-y\"")]
    InvalidTileKey(String),
    #[error("source is not a FeatureCollection (type {0:?})")]
    NotAFeatureCollection(String),
    #[error("value property name must not be empty")]
    MissingValueProperty,
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TilePickError>;

impl From<TilePickError> for JsValue {
    fn from(err: TilePickError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
