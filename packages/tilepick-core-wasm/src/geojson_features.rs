use geo_types::{Coord, LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{self, TilePickError};

// GeoJSON-shaped FeatureCollection as read from a source tile file and written for results.
// Only the members this crate understands are kept; unknown members are dropped on input.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    #[serde(default = "feature_collection_type")]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    // "z-x-y" of the reduced-zoom parent tile the grid is addressed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    // "z-x-y" of the source tile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub features: Vec<Feature>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Feature {
    #[serde(default = "feature_type")]
    pub r#type: String,
    pub geometry: Option<FeatureGeometry>,
    #[serde(default, deserialize_with = "null_as_empty_properties")]
    pub properties: Map<String, Value>,
}

// Geometry part of a feature
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureGeometry {
    pub r#type: String,
    pub coordinates: Value, // Shape depends on the geometry type
}

/// Why a geometry could not be turned into an areal `geo` shape.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("feature has no geometry")]
    Missing,
    #[error("geometry type {0:?} is not areal")]
    UnsupportedType(String),
    #[error("coordinates do not match the geometry type")]
    MalformedCoordinates,
    #[error("coordinate is not a finite number")]
    NonFiniteCoordinate,
    #[error("ring has {0} positions, at least 4 are required")]
    RingTooShort(usize),
    #[error("geometry contains no polygons")]
    Empty,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn null_as_empty_properties<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            r#type: feature_collection_type(),
            name: None,
            area: None,
            source: None,
            features,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reads a collection, rejecting any other GeoJSON object.
    pub fn from_value(value: Value) -> error::Result<Self> {
        serde_json::from_value::<Self>(value)?.checked()
    }

    pub fn from_json(json: &str) -> error::Result<Self> {
        serde_json::from_str::<Self>(json)?.checked()
    }

    fn checked(self) -> error::Result<Self> {
        if self.r#type != "FeatureCollection" {
            return Err(TilePickError::NotAFeatureCollection(self.r#type));
        }
        Ok(self)
    }
}

impl Feature {
    pub fn new(geometry: Option<FeatureGeometry>, properties: Map<String, Value>) -> Self {
        Self {
            r#type: feature_type(),
            geometry,
            properties,
        }
    }

    pub fn from_polygon(polygon: &Polygon<f64>, properties: Map<String, Value>) -> Self {
        Self::new(Some(FeatureGeometry::from_polygon(polygon)), properties)
    }

    /// The named property, treating JSON `null` as absent.
    pub fn value(&self, property: &str) -> Option<&Value> {
        self.properties.get(property).filter(|v| !v.is_null())
    }

    pub fn has_value(&self, property: &str) -> bool {
        self.value(property).is_some()
    }

    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        self.geometry
            .as_ref()
            .ok_or(GeometryError::Missing)?
            .to_multi_polygon()
    }
}

impl FeatureGeometry {
    pub fn from_polygon(polygon: &Polygon<f64>) -> Self {
        let ring_coordinates = |ring: &LineString<f64>| -> Value {
            Value::Array(
                ring.coords()
                    .map(|c| Value::Array(vec![Value::from(c.x), Value::from(c.y)]))
                    .collect(),
            )
        };
        let rings = std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .map(ring_coordinates)
            .collect();

        Self {
            r#type: "Polygon".to_string(),
            coordinates: Value::Array(rings),
        }
    }

    /// Polygon and MultiPolygon geometries as a `MultiPolygon`; anything else is an error.
    pub fn to_multi_polygon(&self) -> Result<MultiPolygon<f64>, GeometryError> {
        let polygons = match self.r#type.as_str() {
            "Polygon" => vec![parse_polygon(&self.coordinates)?],
            "MultiPolygon" => as_array(&self.coordinates)?
                .iter()
                .map(parse_polygon)
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(GeometryError::UnsupportedType(other.to_string())),
        };

        if polygons.is_empty() {
            return Err(GeometryError::Empty);
        }
        Ok(MultiPolygon::new(polygons))
    }
}

fn as_array(value: &Value) -> Result<&Vec<Value>, GeometryError> {
    value.as_array().ok_or(GeometryError::MalformedCoordinates)
}

fn parse_position(value: &Value) -> Result<Coord<f64>, GeometryError> {
    let position = as_array(value)?;
    if position.len() < 2 {
        return Err(GeometryError::MalformedCoordinates);
    }
    let (Some(x), Some(y)) = (position[0].as_f64(), position[1].as_f64()) else {
        return Err(GeometryError::MalformedCoordinates);
    };
    if !x.is_finite() || !y.is_finite() {
        return Err(GeometryError::NonFiniteCoordinate);
    }
    Ok(Coord { x, y })
}

fn parse_ring(value: &Value) -> Result<LineString<f64>, GeometryError> {
    let positions = as_array(value)?;
    if positions.len() < 4 {
        return Err(GeometryError::RingTooShort(positions.len()));
    }
    positions
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = as_array(value)?.iter().map(parse_ring);
    let exterior = rings.next().ok_or(GeometryError::Empty)??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square(min: f64, max: f64) -> Value {
        json!([[[min, min], [max, min], [max, max], [min, max], [min, min]]])
    }

    #[test]
    fn test_parse_source_collection() {
        let source: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "crs": { "type": "name" },
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Polygon", "coordinates": square(0.0, 1.0) },
                    "properties": { "population": 1000 }
                },
                { "type": "Feature", "geometry": null, "properties": null }
            ]
        }))
        .unwrap();

        assert_eq!(source.features.len(), 2);
        assert_eq!(source.features[0].value("population"), Some(&json!(1000)));
        assert!(source.features[1].properties.is_empty());
        assert_eq!(
            source.features[1].to_multi_polygon(),
            Err(GeometryError::Missing)
        );
    }

    #[test]
    fn test_other_geojson_objects_are_not_collections() {
        let feature = json!({
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": square(0.0, 1.0) },
            "properties": { "population": 1 }
        });
        assert!(matches!(
            FeatureCollection::from_value(feature),
            Err(TilePickError::Json(_))
        ));
        assert!(matches!(
            FeatureCollection::from_value(json!({ "hello": "world" })),
            Err(TilePickError::Json(_))
        ));
        assert!(matches!(
            FeatureCollection::from_json("{}"),
            Err(TilePickError::Json(_))
        ));
        assert!(matches!(
            FeatureCollection::from_value(json!({ "type": "Feature", "features": [] })),
            Err(TilePickError::NotAFeatureCollection(t)) if t == "Feature"
        ));

        let empty = FeatureCollection::from_json(r#"{ "type": "FeatureCollection", "features": [] }"#)
            .unwrap();
        assert!(empty.features.is_empty());
    }

    #[test]
    fn test_null_value_is_absent() {
        let feature = Feature::new(None, json!({ "population": null }).as_object().unwrap().clone());
        assert!(!feature.has_value("population"));
        assert!(!feature.has_value("households"));
    }

    #[test]
    fn test_polygon_with_hole_and_multipolygon() {
        let with_hole = FeatureGeometry {
            r#type: "Polygon".to_string(),
            coordinates: json!([
                [[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0], [0.0, 0.0]],
                [[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0], [1.0, 1.0]]
            ]),
        };
        let shape = with_hole.to_multi_polygon().unwrap();
        assert_eq!(shape.0.len(), 1);
        assert_eq!(shape.0[0].interiors().len(), 1);

        let multi = FeatureGeometry {
            r#type: "MultiPolygon".to_string(),
            coordinates: json!([square(0.0, 1.0), square(2.0, 3.0)]),
        };
        assert_eq!(multi.to_multi_polygon().unwrap().0.len(), 2);
    }

    #[test]
    fn test_degenerate_geometries_are_errors() {
        let cases = [
            (json!("Point"), json!([0.0, 0.0]), "point"),
            (json!("Polygon"), json!([[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]), "short ring"),
            (json!("Polygon"), json!([]), "no rings"),
            (json!("Polygon"), json!([[[0.0], [1.0], [2.0], [0.0]]]), "1d positions"),
            (json!("Polygon"), json!("nope"), "not an array"),
            (json!("MultiPolygon"), json!([]), "empty multipolygon"),
        ];
        for (kind, coordinates, label) in cases {
            let geometry = FeatureGeometry {
                r#type: kind.as_str().unwrap().to_string(),
                coordinates,
            };
            assert!(geometry.to_multi_polygon().is_err(), "{} should not parse", label);
        }
    }

    #[test]
    fn test_polygon_serializes_as_geojson() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]),
            vec![],
        );
        let mut properties = Map::new();
        properties.insert("tile".to_string(), json!("0-0"));
        let feature = Feature::from_polygon(&polygon, properties);

        assert_eq!(
            serde_json::to_value(&feature).unwrap(),
            json!({
                "type": "Feature",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]]]
                },
                "properties": { "tile": "0-0" }
            })
        );
    }
}
