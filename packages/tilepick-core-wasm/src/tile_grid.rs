// Subdivision of a source tile into a regular grid of sub-tile polygons.
//
// Every grid is addressed on the 256-unit raster of the source tile's ancestor at
// `zoom - dz`. The source tile covers a `u × u` window of that raster, `u = 2^(8 - dz)`,
// and each raster unit becomes one output cell.

use geo::{coord, LineString, Polygon};
use serde_json::{Map, Value};

use crate::cache_keys::make_cell_key;
use crate::error::{Result, TilePickError};
use crate::geojson_features::{Feature, FeatureCollection};
use crate::tile_math::{tile_x_to_lon, tile_y_to_lat, TileAddress};

/// Cells per edge of the parent raster
pub const GRID_UNITS: u32 = 256;
pub const MAX_ZOOM_DELTA: u32 = 8;

/// Property holding the "i-j" cell key on generated features
pub const CELL_PROPERTY: &str = "tile";

/// One cell of a subdivision grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubTileAddress {
    pub parent: TileAddress,
    /// Column on the parent's 256-unit raster
    pub i: u32,
    /// Row on the parent's 256-unit raster
    pub j: u32,
    pub subdivisions_per_edge: u32,
}

impl SubTileAddress {
    pub fn key(&self) -> String {
        make_cell_key(self.i, self.j)
    }

    /// Properties of a freshly generated cell: just its key.
    pub fn properties(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        properties.insert(CELL_PROPERTY.to_string(), Value::String(self.key()));
        properties
    }

    /// Cell rectangle, ring ordered NW -> NE -> SE -> SW -> NW.
    pub fn polygon(&self) -> Polygon<f64> {
        let west = raster_lon(self.parent, self.i);
        let east = raster_lon(self.parent, self.i + 1);
        let north = raster_lat(self.parent, self.j);
        let south = raster_lat(self.parent, self.j + 1);

        Polygon::new(
            LineString::new(vec![
                coord! { x: west, y: north },
                coord! { x: east, y: north },
                coord! { x: east, y: south },
                coord! { x: west, y: south },
                coord! { x: west, y: north },
            ]),
            vec![],
        )
    }
}

// Grid lines are always evaluated from their integer index so neighbouring cells share
// bit-identical edge coordinates.
fn raster_lon(parent: TileAddress, i: u32) -> f64 {
    tile_x_to_lon(
        f64::from(parent.x) + f64::from(i) / f64::from(GRID_UNITS),
        parent.zoom,
    )
}

fn raster_lat(parent: TileAddress, j: u32) -> f64 {
    tile_y_to_lat(
        f64::from(parent.y) + f64::from(j) / f64::from(GRID_UNITS),
        parent.zoom,
    )
}

/// The grid of cells covering one source tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubdivisionGrid {
    pub source: TileAddress,
    pub parent: TileAddress,
    pub zoom_delta: u32,
    pub subdivisions_per_edge: u32,
    /// Raster index of the first cell column
    pub start_i: u32,
    /// Raster index of the first cell row
    pub start_j: u32,
}

impl SubdivisionGrid {
    pub fn new(source: TileAddress, zoom_delta: u32) -> Result<Self> {
        if zoom_delta > MAX_ZOOM_DELTA {
            return Err(TilePickError::InvalidZoomDelta(zoom_delta));
        }
        if zoom_delta > source.zoom {
            return Err(TilePickError::ZoomDeltaExceedsZoom {
                dz: zoom_delta,
                zoom: source.zoom,
            });
        }

        let parent = TileAddress::new(
            source.zoom - zoom_delta,
            source.x >> zoom_delta,
            source.y >> zoom_delta,
        )?;
        let units = GRID_UNITS >> zoom_delta;

        Ok(Self {
            source,
            parent,
            zoom_delta,
            subdivisions_per_edge: units,
            start_i: (source.x - (parent.x << zoom_delta)) * units,
            start_j: (source.y - (parent.y << zoom_delta)) * units,
        })
    }

    pub fn len(&self) -> usize {
        (self.subdivisions_per_edge as usize).pow(2)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cells in emission order: column-major, `i` outer and `j` inner.
    pub fn cells(&self) -> impl Iterator<Item = SubTileAddress> + '_ {
        let units = self.subdivisions_per_edge;
        (self.start_i..self.start_i + units).flat_map(move |i| {
            (self.start_j..self.start_j + units).map(move |j| SubTileAddress {
                parent: self.parent,
                i,
                j,
                subdivisions_per_edge: units,
            })
        })
    }

    /// Materializes the grid as polygon features carrying only their cell key.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .cells()
            .map(|cell| Feature::from_polygon(&cell.polygon(), cell.properties()))
            .collect();

        FeatureCollection::new(features).with_name(self.source.to_string())
    }
}

/// Empty-valued target grid for `source` refined by `zoom_delta`.
pub fn generate_subdivision_grid(source: TileAddress, zoom_delta: u32) -> Result<FeatureCollection> {
    let grid = SubdivisionGrid::new(source, zoom_delta)?;
    log::debug!(
        "subdividing {} on parent {}: {}x{} cells from ({}, {})",
        source,
        grid.parent,
        grid.subdivisions_per_edge,
        grid.subdivisions_per_edge,
        grid.start_i,
        grid.start_j
    );
    Ok(grid.to_feature_collection())
}
