// Point-in-polygon value join.
//
// Every target feature is reduced to its centroid, and the first source feature (in source
// order) whose polygon contains that point hands over its value for the joined property.
// Overlapping sources are not reconciled beyond that first-match rule.

use geo::{Centroid, Contains, MultiPolygon, Point, Rect};
use serde_json::Value;

use crate::bbox_filter::{bboxes_intersect, point_in_bbox, shape_bbox};
use crate::geojson_features::{Feature, FeatureCollection, GeometryError};
use crate::tile_grid::SubdivisionGrid;

/// Outcome of testing one point against one source geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    Inside,
    Outside,
    /// The predicate could not be evaluated (degenerate or unsupported geometry).
    /// Callers treat this exactly like `Outside`.
    Indeterminate,
}

impl Containment {
    pub fn is_inside(self) -> bool {
        self == Containment::Inside
    }
}

struct IndexedShape {
    polygons: MultiPolygon<f64>,
    bbox: Rect<f64>,
}

struct SourceEntry<'a> {
    feature: &'a Feature,
    shape: Result<IndexedShape, GeometryError>,
}

/// Source features with their geometry parsed once, kept in source order.
pub struct SourceIndex<'a> {
    entries: Vec<SourceEntry<'a>>,
}

impl<'a> SourceIndex<'a> {
    pub fn new(source: &'a FeatureCollection) -> Self {
        let entries = source
            .features
            .iter()
            .enumerate()
            .map(|(index, feature)| {
                let shape = feature.to_multi_polygon().and_then(|polygons| {
                    let bbox = shape_bbox(&polygons).ok_or(GeometryError::Empty)?;
                    Ok(IndexedShape { polygons, bbox })
                });
                if let Err(err) = &shape {
                    log::debug!("source feature {} is not usable for containment: {}", index, err);
                }
                SourceEntry { feature, shape }
            })
            .collect();

        Self { entries }
    }

    /// Drops sources whose bounding box cannot reach `area`. Order of the rest is kept.
    pub fn retain_intersecting(&mut self, area: &Rect<f64>) {
        self.entries.retain(|entry| match &entry.shape {
            Ok(shape) => bboxes_intersect(&shape.bbox, area),
            Err(_) => false,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    fn containment(&self, index: usize, point: Point<f64>) -> Containment {
        match self.entries.get(index) {
            Some(entry) => shape_containment(&entry.shape, point),
            None => Containment::Indeterminate,
        }
    }

    /// First source feature, in source order, that contains `point`.
    pub fn first_containing(&self, point: Point<f64>) -> Option<&'a Feature> {
        self.entries
            .iter()
            .find(|entry| shape_containment(&entry.shape, point).is_inside())
            .map(|entry| entry.feature)
    }

    /// Value of `value_property` on the first source containing `point`, with the outcome
    /// counted in `stats`.
    pub fn value_at(
        &self,
        point: Point<f64>,
        value_property: &str,
        stats: &mut JoinStats,
    ) -> Option<&'a Value> {
        let Some(feature) = self.first_containing(point) else {
            stats.unmatched += 1;
            return None;
        };
        let value = feature.value(value_property);
        if value.is_some() {
            stats.assigned += 1;
        } else {
            stats.matched_without_value += 1;
        }
        value
    }
}

fn shape_containment(shape: &Result<IndexedShape, GeometryError>, point: Point<f64>) -> Containment {
    let Ok(shape) = shape else {
        return Containment::Indeterminate;
    };
    if !point.x().is_finite() || !point.y().is_finite() {
        return Containment::Indeterminate;
    }
    if !point_in_bbox(point.0, &shape.bbox) {
        return Containment::Outside;
    }
    if shape.polygons.contains(&point) {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

/// Counters describing one join run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    /// Targets that received a value
    pub assigned: usize,
    /// Targets whose first containing source had no value for the property
    pub matched_without_value: usize,
    /// Targets whose centroid fell in no source polygon
    pub unmatched: usize,
    /// Targets without a usable centroid
    pub skipped: usize,
}

/// Copies `value_property` from `source` onto every feature of `target` whose centroid
/// lies in a source polygon. Targets without a match are left untouched.
pub fn join_values(
    source: &FeatureCollection,
    target: &mut FeatureCollection,
    value_property: &str,
) -> JoinStats {
    join_with_index(&SourceIndex::new(source), target, value_property)
}

pub fn join_with_index(
    index: &SourceIndex<'_>,
    target: &mut FeatureCollection,
    value_property: &str,
) -> JoinStats {
    let mut stats = JoinStats::default();

    for feature in target.features.iter_mut() {
        let Some(centroid) = target_centroid(feature) else {
            stats.skipped += 1;
            continue;
        };
        if let Some(value) = index.value_at(centroid, value_property, &mut stats) {
            feature
                .properties
                .insert(value_property.to_string(), value.clone());
        }
    }

    log_stats(value_property, &stats);
    stats
}

/// Joins straight onto the cells of `grid` and returns only the cells that received a
/// value, in grid order. Same outcome as generating the grid, running [`join_with_index`]
/// and dropping cells without a value.
pub fn join_grid(
    index: &SourceIndex<'_>,
    grid: &SubdivisionGrid,
    value_property: &str,
) -> (Vec<Feature>, JoinStats) {
    let mut stats = JoinStats::default();
    let mut features = Vec::new();

    for cell in grid.cells() {
        let polygon = cell.polygon();
        let Some(centroid) = polygon.centroid() else {
            stats.skipped += 1;
            continue;
        };
        if let Some(value) = index.value_at(centroid, value_property, &mut stats) {
            let mut properties = cell.properties();
            properties.insert(value_property.to_string(), value.clone());
            features.push(Feature::from_polygon(&polygon, properties));
        }
    }

    log_stats(value_property, &stats);
    (features, stats)
}

fn log_stats(value_property: &str, stats: &JoinStats) {
    log::debug!(
        "joined {:?}: {} assigned, {} matched without value, {} unmatched, {} skipped",
        value_property,
        stats.assigned,
        stats.matched_without_value,
        stats.unmatched,
        stats.skipped
    );
}

fn target_centroid(feature: &Feature) -> Option<Point<f64>> {
    match feature.to_multi_polygon() {
        Ok(shape) => shape.centroid(),
        Err(err) => {
            log::debug!("target feature has no usable geometry: {}", err);
            None
        }
    }
}
