use wasm_bindgen::prelude::*;
use serde_wasm_bindgen::to_value;

// Logger setup for the browser console
pub mod console;
// Error type shared by all modules
pub mod error;
// Tile key formatting and parsing
pub mod cache_keys;
// Slippy map tile math
pub mod tile_math;
// GeoJSON-shaped feature model
pub mod geojson_features;
// Bounding box prefilter
pub mod bbox_filter;
// Subdivision of a source tile into grid cells
pub mod tile_grid;
// Point-in-polygon value join
pub mod value_join;
// Conservation check
pub mod conservation;
// Conversion options and batch input
pub mod models;
// Per-tile and batch conversion pipeline
pub mod conversion;

pub use conservation::ConservationReport;
pub use conversion::{convert_tile, convert_tiles, TileConversion};
pub use error::{Result, TilePickError};
pub use geojson_features::{Feature, FeatureCollection, FeatureGeometry};
pub use models::ConversionOptions;
pub use tile_grid::{generate_subdivision_grid, SubTileAddress, SubdivisionGrid};
pub use tile_math::TileAddress;
pub use value_join::{join_values, Containment};

// Enable better panic messages in console during development
#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

use std::sync::Once;
static INIT: Once = Once::new();

// This sets up the wasm_bindgen start functionality
#[wasm_bindgen(start)]
pub fn start() {
    INIT.call_once(|| {
        // Set the panic hook for better error messages
        #[cfg(feature = "console_error_panic_hook")]
        console_error_panic_hook::set_once();

        console::init_logging(log::Level::Info);
        log::info!("tilepick WASM module initialized");
    });
}

#[wasm_bindgen]
pub fn lon_to_tile_x_frac(lon: f64, zoom: u32) -> f64 {
    tile_math::lon_to_tile_x_frac(lon, zoom)
}

#[wasm_bindgen]
pub fn lat_to_tile_y_frac(lat: f64, zoom: u32) -> f64 {
    tile_math::lat_to_tile_y_frac(lat, zoom)
}

#[wasm_bindgen]
pub fn tile_x_to_lon(x: f64, zoom: u32) -> f64 {
    tile_math::tile_x_to_lon(x, zoom)
}

#[wasm_bindgen]
pub fn tile_y_to_lat(y: f64, zoom: u32) -> f64 {
    tile_math::tile_y_to_lat(y, zoom)
}

/// Grid cells covering tile `tz-tx-ty` refined by `dz`, as a GeoJSON string.
#[wasm_bindgen]
pub fn create_subdivision_grid(tz: u32, tx: u32, ty: u32, dz: u32) -> std::result::Result<JsValue, JsValue> {
    let tile = TileAddress::new(tz, tx, ty)?;
    let grid = generate_subdivision_grid(tile, dz)?;
    let json = serde_json::to_string(&grid).map_err(TilePickError::from)?;
    Ok(JsValue::from_str(&json))
}

/// Converts one source tile. `options_json` is `{ "valueProperty": ..., "zoomDelta": ... }`.
/// Returns the result FeatureCollection as a GeoJSON string.
#[wasm_bindgen]
pub fn convert_tile_grid(
    tile_key: &str,
    source_json: &str,
    options_json: &str,
) -> std::result::Result<JsValue, JsValue> {
    let json = conversion::convert_tile_json(tile_key, source_json, options_json)?;
    Ok(JsValue::from_str(&json))
}

/// Converts a batch `{ "options": {...}, "tiles": [{ "tile": "z-x-y", "source": {...} }] }`.
/// Tiles without readable source data are skipped; returns a JSON array of results.
#[wasm_bindgen]
pub fn convert_tile_batch(batch_json: &str) -> std::result::Result<JsValue, JsValue> {
    let json = conversion::convert_batch_json(batch_json)?;
    Ok(JsValue::from_str(&json))
}

/// Conservation totals of `value_property` for a source and a result collection.
#[wasm_bindgen]
pub fn conservation_report(
    source_json: &str,
    result_json: &str,
    value_property: &str,
) -> std::result::Result<JsValue, JsValue> {
    let source = FeatureCollection::from_json(source_json)?;
    let result = FeatureCollection::from_json(result_json)?;
    let report = conservation::validate_conservation(&source, &result, value_property);
    Ok(to_value(&report)?)
}

/// Copies `value_property` from the source polygons onto every target feature whose
/// centroid they contain. Returns the target collection as a GeoJSON string.
#[wasm_bindgen]
pub fn join_feature_values(
    source_json: &str,
    target_json: &str,
    value_property: &str,
) -> std::result::Result<JsValue, JsValue> {
    let source = FeatureCollection::from_json(source_json)?;
    let mut target = FeatureCollection::from_json(target_json)?;
    join_values(&source, &mut target, value_property);
    let json = serde_json::to_string(&target).map_err(TilePickError::from)?;
    Ok(JsValue::from_str(&json))
}
