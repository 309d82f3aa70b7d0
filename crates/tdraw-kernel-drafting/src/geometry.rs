//! Drawing geometry built from projected wires.
//!
//! Projected faces are polygons; for drafting output each wire is turned
//! back into curves. A closed wire whose vertices sit on a circle becomes a
//! single [`BaseGeom::Circle`], anything else becomes one
//! [`BaseGeom::Line`] per edge.

use serde::{Deserialize, Serialize};

use crate::types::{Point2D, ProjectedFace, ProjectedWire};

/// Fewest vertices a wire needs to be recognized as a circle.
pub const MIN_CIRCLE_VERTICES: usize = 12;

/// Largest turning angle (radians) between consecutive edges of a circle.
const MAX_CIRCLE_TURN: f64 = std::f64::consts::PI / 6.0;

/// A 2D drawing curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BaseGeom {
    /// Straight segment.
    Line {
        /// Start point.
        start: Point2D,
        /// End point.
        end: Point2D,
    },
    /// Full circle.
    Circle {
        /// Centre.
        center: Point2D,
        /// Radius.
        radius: f64,
    },
}

impl BaseGeom {
    /// Curve length.
    pub fn length(&self) -> f64 {
        match self {
            BaseGeom::Line { start, end } => start.distance(end),
            BaseGeom::Circle { radius, .. } => 2.0 * std::f64::consts::PI * radius,
        }
    }
}

/// Curves of one wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomWire {
    /// Curves in traversal order.
    pub geoms: Vec<BaseGeom>,
}

/// Curves of one projected face: the outer wire first, then the holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeomFace {
    /// Wires of the face.
    pub wires: Vec<GeomWire>,
}

/// Vertices with collinear (zero-turn) points removed.
fn corners(points: &[Point2D]) -> Vec<Point2D> {
    let n = points.len();
    (0..n)
        .filter(|&i| {
            let (p, c, q) = (points[(i + n - 1) % n], points[i], points[(i + 1) % n]);
            let (ax, ay) = (c.x - p.x, c.y - p.y);
            let (bx, by) = (q.x - c.x, q.y - c.y);
            let scale = (ax * ax + ay * ay).sqrt() * (bx * bx + by * by).sqrt();
            scale <= 0.0 || (ax * by - ay * bx).abs() > 1e-12 * scale
        })
        .map(|i| points[i])
        .collect()
}

/// Circle through the vertices of a closed wire, if they fit one.
pub fn fit_circle(wire: &ProjectedWire, tolerance: f64) -> Option<(Point2D, f64)> {
    let pts = corners(&wire.points);
    let n = pts.len();
    if n < MIN_CIRCLE_VERTICES {
        return None;
    }

    let mut sign = 0.0;
    for i in 0..n {
        let (p, c, q) = (pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n]);
        let (ax, ay) = (c.x - p.x, c.y - p.y);
        let (bx, by) = (q.x - c.x, q.y - c.y);
        let turn = (ax * by - ay * bx).atan2(ax * bx + ay * by);
        if turn.abs() > MAX_CIRCLE_TURN {
            return None;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return None;
        }
    }

    let center = Point2D::new(
        pts.iter().map(|p| p.x).sum::<f64>() / n as f64,
        pts.iter().map(|p| p.y).sum::<f64>() / n as f64,
    );
    let radius = pts.iter().map(|p| p.distance(&center)).sum::<f64>() / n as f64;
    let allowed = tolerance.max(1e-3 * radius);
    pts.iter()
        .all(|p| (p.distance(&center) - radius).abs() <= allowed)
        .then_some((center, radius))
}

/// Curves for a single wire.
pub fn wire_geometry(wire: &ProjectedWire, tolerance: f64) -> GeomWire {
    if let Some((center, radius)) = fit_circle(wire, tolerance) {
        return GeomWire {
            geoms: vec![BaseGeom::Circle { center, radius }],
        };
    }
    let n = wire.points.len();
    let geoms = (0..n)
        .map(|i| BaseGeom::Line {
            start: wire.points[i],
            end: wire.points[(i + 1) % n],
        })
        .collect();
    GeomWire { geoms }
}

/// Curves for every wire of a face.
pub fn face_geometry(face: &ProjectedFace, tolerance: f64) -> GeomFace {
    GeomFace {
        wires: face.wires().map(|w| wire_geometry(w, tolerance)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn polygon(n: usize, r: f64, cx: f64, cy: f64) -> ProjectedWire {
        ProjectedWire::new(
            (0..n)
                .map(|i| {
                    let a = std::f64::consts::TAU * i as f64 / n as f64;
                    Point2D::new(cx + r * a.cos(), cy + r * a.sin())
                })
                .collect(),
        )
    }

    #[test]
    fn test_square_becomes_lines() {
        let w = ProjectedWire::new(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
        ]);
        let g = wire_geometry(&w, 1e-6);
        assert_eq!(g.geoms.len(), 4);
        assert!(g.geoms.iter().all(|c| matches!(c, BaseGeom::Line { .. })));
        let total: f64 = g.geoms.iter().map(BaseGeom::length).sum();
        assert_relative_eq!(total, 4.0);
    }

    #[test]
    fn test_regular_polygon_becomes_circle() {
        let g = wire_geometry(&polygon(48, 2.0, 1.0, -1.0), 1e-6);
        match g.geoms.as_slice() {
            [BaseGeom::Circle { center, radius }] => {
                assert_relative_eq!(center.x, 1.0, epsilon = 1e-9);
                assert_relative_eq!(center.y, -1.0, epsilon = 1e-9);
                assert_relative_eq!(*radius, 2.0, epsilon = 1e-9);
            }
            other => panic!("expected a circle, got {other:?}"),
        }
    }

    #[test]
    fn test_circle_with_split_edges() {
        let mut w = polygon(24, 1.0, 0.0, 0.0);
        let (a, b) = (w.points[0], w.points[1]);
        w.points
            .insert(1, Point2D::new(0.5 * (a.x + b.x), 0.5 * (a.y + b.y)));
        assert!(fit_circle(&w, 1e-6).is_some());
    }

    #[test]
    fn test_coarse_polygon_is_not_a_circle() {
        assert!(fit_circle(&polygon(8, 1.0, 0.0, 0.0), 1e-6).is_none());
    }

    #[test]
    fn test_stadium_is_not_a_circle() {
        let mut pts = polygon(32, 1.0, 0.0, 0.0).points;
        for p in pts.iter_mut().filter(|p| p.x > 0.0) {
            p.x += 3.0;
        }
        assert!(fit_circle(&ProjectedWire::new(pts), 1e-6).is_none());
    }

    #[test]
    fn test_face_geometry_orders_outer_first() {
        let face = ProjectedFace {
            outer: polygon(48, 2.0, 0.0, 0.0),
            holes: vec![polygon(48, 1.0, 0.0, 0.0).oriented(false)],
        };
        let g = face_geometry(&face, 1e-6);
        assert_eq!(g.wires.len(), 2);
        let radii: Vec<f64> = g
            .wires
            .iter()
            .map(|w| match w.geoms[0] {
                BaseGeom::Circle { radius, .. } => radius,
                _ => 0.0,
            })
            .collect();
        assert_relative_eq!(radii[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(radii[1], 1.0, epsilon = 1e-9);
    }
}
