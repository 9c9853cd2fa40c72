// Bounding-box quick rejection ahead of exact polygon predicates.

use geo::{BoundingRect, Coord, MultiPolygon, Rect};

// Check if a point is inside a bounding box (edges included)
pub fn point_in_bbox(point: Coord<f64>, bbox: &Rect<f64>) -> bool {
    let min = bbox.min();
    let max = bbox.max();

    point.x >= min.x && point.x <= max.x && point.y >= min.y && point.y <= max.y
}

// Check if two bounding boxes overlap (touching edges count as overlap)
pub fn bboxes_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    !(a.max().x < b.min().x
        || a.min().x > b.max().x
        || a.max().y < b.min().y
        || a.min().y > b.max().y)
}

pub fn shape_bbox(shape: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    shape.bounding_rect()
}
