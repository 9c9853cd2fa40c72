// Per-tile conversion pipeline and its batch form.
//
// grid -> join -> keep cells that received a value -> conservation report

use rayon::prelude::*;

use crate::conservation::{validate_conservation, ConservationReport};
use crate::error::Result;
use crate::geojson_features::FeatureCollection;
use crate::models::{BatchInput, ConversionOptions};
use crate::tile_grid::SubdivisionGrid;
use crate::tile_math::TileAddress;
use crate::value_join::{join_grid, JoinStats, SourceIndex};

/// Result of converting one source tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileConversion {
    pub tile: TileAddress,
    pub result: FeatureCollection,
    pub report: ConservationReport,
    pub stats: JoinStats,
}

pub fn convert_tile(
    tile: TileAddress,
    source: &FeatureCollection,
    options: &ConversionOptions,
) -> Result<TileConversion> {
    options.validate()?;
    let grid = SubdivisionGrid::new(tile, options.zoom_delta)?;

    let mut index = SourceIndex::new(source);
    index.retain_intersecting(&tile.bounds());
    let (features, stats) = join_grid(&index, &grid, &options.value_property);

    let mut result = FeatureCollection::new(features);
    result.area = Some(grid.parent.to_string());
    result.source = Some(tile.to_string());

    let report = validate_conservation(source, &result, &options.value_property);
    Ok(TileConversion {
        tile,
        result,
        report,
        stats,
    })
}

/// Converts every tile independently. Invalid options fail the whole batch; a tile that
/// cannot be converted is logged and left out. Output order follows input order.
pub fn convert_tiles(
    inputs: &[(TileAddress, FeatureCollection)],
    options: &ConversionOptions,
) -> Result<Vec<TileConversion>> {
    options.validate()?;

    let conversions: Vec<TileConversion> = inputs
        .par_iter()
        .filter_map(|(tile, source)| match convert_tile(*tile, source, options) {
            Ok(conversion) => Some(conversion),
            Err(err) => {
                log::warn!("skipping tile {}: {}", tile, err);
                None
            }
        })
        .collect();

    log::info!("converted {} of {} tiles", conversions.len(), inputs.len());
    Ok(conversions)
}

// Resolves batch entries into tile inputs, skipping entries whose key or source is unusable
fn resolve_batch_inputs(batch: BatchInput) -> Vec<(TileAddress, FeatureCollection)> {
    batch
        .tiles
        .into_iter()
        .filter_map(|input| {
            let tile = match input.tile.parse::<TileAddress>() {
                Ok(tile) => tile,
                Err(err) => {
                    log::warn!("skipping tile {:?}: {}", input.tile, err);
                    return None;
                }
            };
            let Some(source) = input.source.filter(|s| !s.is_null()) else {
                log::warn!("skipping tile {}: no source data", tile);
                return None;
            };
            match FeatureCollection::from_value(source) {
                Ok(source) => Some((tile, source)),
                Err(err) => {
                    log::warn!("skipping tile {}: unreadable source: {}", tile, err);
                    None
                }
            }
        })
        .collect()
}

/// JSON in, JSON out form of [`convert_tile`].
pub fn convert_tile_json(tile_key: &str, source_json: &str, options_json: &str) -> Result<String> {
    let options: ConversionOptions = serde_json::from_str(options_json)?;
    let tile: TileAddress = tile_key.parse()?;
    let source = FeatureCollection::from_json(source_json)?;

    let conversion = convert_tile(tile, &source, &options)?;
    Ok(serde_json::to_string(&conversion.result)?)
}

/// JSON in, JSON out form of [`convert_tiles`]; returns an array of result collections.
pub fn convert_batch_json(batch_json: &str) -> Result<String> {
    let batch: BatchInput = serde_json::from_str(batch_json)?;
    let options = batch.options.clone();
    options.validate()?;

    let inputs = resolve_batch_inputs(batch);
    let results: Vec<FeatureCollection> = convert_tiles(&inputs, &options)?
        .into_iter()
        .map(|conversion| conversion.result)
        .collect();
    Ok(serde_json::to_string(&results)?)
}
