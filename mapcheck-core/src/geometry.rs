//! Thin capability layer over the geometry kernel.
//!
//! The checks only need four operations: expanded bounding boxes for
//! index insertion, a touching test within a distance tolerance, an exact
//! intersects test (straight from `geo`), and resolution of an
//! intersection into its crossing points. Everything else stays inside
//! the kernel.
//!
//! Unsupported geometry pairs yield `None`; callers skip the affected
//! feature or pair with a warning and keep the batch moving.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{BoundingRect, Coord, Distance, Euclidean, Geometry, Intersects, Line, Rect};

/// Bounding box of a geometry, grown by `margin` on every side.
///
/// Returns `None` for empty geometries, which have no bounding box.
pub fn expanded_bounds(geometry: &Geometry<f64>, margin: f64) -> Option<Rect<f64>> {
    let rect = geometry.bounding_rect()?;
    Some(Rect::new(
        Coord {
            x: rect.min().x - margin,
            y: rect.min().y - margin,
        },
        Coord {
            x: rect.max().x + margin,
            y: rect.max().y + margin,
        },
    ))
}

/// Touching test: true when the geometries intersect or lie within
/// `tolerance` of each other (equivalent to buffered-not-disjoint).
///
/// Returns `None` for geometry types the distance kernel does not cover.
pub fn within_distance(a: &Geometry<f64>, b: &Geometry<f64>, tolerance: f64) -> Option<bool> {
    if a.intersects(b) {
        return Some(true);
    }
    distance(a, b).map(|gap| gap <= tolerance)
}

/// Minimum euclidean distance between two geometries.
///
/// Dispatches over the concrete single-geometry types the checks operate
/// on (points, lines, polygons); multi-geometries are expected to have
/// been exploded beforehand.
fn distance(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<f64> {
    use Geometry::{LineString, Point, Polygon};
    let gap = match (a, b) {
        (Point(x), Point(y)) => Euclidean.distance(x, y),
        (Point(x), LineString(y)) => Euclidean.distance(x, y),
        (Point(x), Polygon(y)) => Euclidean.distance(x, y),
        (LineString(x), Point(y)) => Euclidean.distance(y, x),
        (LineString(x), LineString(y)) => Euclidean.distance(x, y),
        (LineString(x), Polygon(y)) => Euclidean.distance(x, y),
        (Polygon(x), Point(y)) => Euclidean.distance(y, x),
        (Polygon(x), LineString(y)) => Euclidean.distance(y, x),
        (Polygon(x), Polygon(y)) => Euclidean.distance(x, y),
        _ => return None,
    };
    Some(gap)
}

/// Resolve the intersection of two geometries into crossing points.
///
/// Line work is intersected segment-pairwise. A proper crossing yields a
/// single point; a collinear overlap degenerates to the overlap segment's
/// endpoint vertices (multi-point approximation). Point geometries
/// intersect as themselves. Returns `None` for unsupported types.
pub fn crossing_points(a: &Geometry<f64>, b: &Geometry<f64>) -> Option<Vec<Coord<f64>>> {
    if let Geometry::Point(point) = a {
        return Some(if point.intersects(b) {
            vec![point.0]
        } else {
            Vec::new()
        });
    }
    if let Geometry::Point(point) = b {
        return Some(if point.intersects(a) {
            vec![point.0]
        } else {
            Vec::new()
        });
    }

    let segments_a = segments(a)?;
    let segments_b = segments(b)?;
    let mut points: Vec<Coord<f64>> = Vec::new();
    let push_unique = |coord: Coord<f64>, points: &mut Vec<Coord<f64>>| {
        if !points.contains(&coord) {
            points.push(coord);
        }
    };
    for line_a in &segments_a {
        for line_b in &segments_b {
            match line_intersection(*line_a, *line_b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    push_unique(intersection, &mut points);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    push_unique(intersection.start, &mut points);
                    push_unique(intersection.end, &mut points);
                }
                None => {}
            }
        }
    }
    Some(points)
}

/// Line segments of a linear geometry; polygons contribute their exterior
/// and interior rings.
fn segments(geometry: &Geometry<f64>) -> Option<Vec<Line<f64>>> {
    match geometry {
        Geometry::LineString(line) => Some(line.lines().collect()),
        Geometry::Polygon(polygon) => {
            let mut lines: Vec<Line<f64>> = polygon.exterior().lines().collect();
            for ring in polygon.interiors() {
                lines.extend(ring.lines());
            }
            Some(lines)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point};
    use rstest::rstest;

    fn line(coords: &[(f64, f64)]) -> Geometry<f64> {
        Geometry::LineString(LineString::from(coords.to_vec()))
    }

    #[rstest]
    #[case(0.05, true)]
    #[case(0.2, false)]
    fn gap_against_tolerance(#[case] gap: f64, #[case] touching: bool) {
        let a = line(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = line(&[(1.0 + gap, 0.0), (2.0, 0.0)]);
        assert_eq!(within_distance(&a, &b, 0.1), Some(touching));
    }

    #[test]
    fn intersecting_geometries_are_touching() {
        let a = line(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = line(&[(1.0, -1.0), (1.0, 1.0)]);
        assert_eq!(within_distance(&a, &b, 0.001), Some(true));
    }

    #[test]
    fn multi_geometries_are_unsupported() {
        let a = Geometry::MultiPoint(vec![Point::new(0.0, 0.0)].into());
        let b = line(&[(5.0, 0.0), (6.0, 0.0)]);
        assert_eq!(within_distance(&a, &b, 0.1), None);
        assert!(crossing_points(&a, &b).is_none());
    }

    #[test]
    fn proper_crossing_yields_single_point() {
        let a = line(&[(0.0, 0.0), (2.0, 0.0)]);
        let b = line(&[(1.0, -1.0), (1.0, 1.0)]);
        assert_eq!(crossing_points(&a, &b), Some(vec![Coord { x: 1.0, y: 0.0 }]));
    }

    #[test]
    fn collinear_overlap_degenerates_to_endpoints() {
        let a = line(&[(0.0, 0.0), (3.0, 0.0)]);
        let b = line(&[(1.0, 0.0), (2.0, 0.0)]);
        let points = crossing_points(&a, &b).unwrap();
        assert_eq!(
            points,
            vec![Coord { x: 1.0, y: 0.0 }, Coord { x: 2.0, y: 0.0 }]
        );
    }

    #[test]
    fn point_on_line_intersects_as_itself() {
        let a = Geometry::Point(Point::new(1.0, 0.0));
        let b = line(&[(0.0, 0.0), (2.0, 0.0)]);
        assert_eq!(crossing_points(&a, &b), Some(vec![Coord { x: 1.0, y: 0.0 }]));
        let far = Geometry::Point(Point::new(9.0, 9.0));
        assert_eq!(crossing_points(&far, &b), Some(Vec::new()));
    }

    #[test]
    fn shared_vertex_is_reported_once() {
        // Two segments of `a` meet `b` exactly at the shared vertex.
        let a = line(&[(0.0, -1.0), (1.0, 0.0), (2.0, -1.0)]);
        let b = line(&[(-1.0, 0.0), (3.0, 0.0)]);
        assert_eq!(crossing_points(&a, &b), Some(vec![Coord { x: 1.0, y: 0.0 }]));
    }

    #[test]
    fn expanded_bounds_grow_by_margin() {
        let geometry = line(&[(0.0, 0.0), (1.0, 2.0)]);
        let rect = expanded_bounds(&geometry, 0.5).unwrap();
        assert_eq!(rect.min(), Coord { x: -0.5, y: -0.5 });
        assert_eq!(rect.max(), Coord { x: 1.5, y: 2.5 });
    }

    #[test]
    fn empty_geometry_has_no_bounds() {
        let empty = Geometry::LineString(LineString::new(Vec::new()));
        assert!(expanded_bounds(&empty, 0.1).is_none());
    }
}
