//! Hidden line removal for polyhedral shapes.
//!
//! [`HlrAlgo`] projects the edges of the faces it was given through a
//! [`ViewFrame`] and splits them into visible and hidden pieces:
//!
//! 1. **Edge extraction**: hard edges are face boundary edges, except
//!    edges between two facets of the same underlying surface. Such smooth
//!    edges become outline edges when their facets face opposite ways
//!    relative to the view direction, and are dropped otherwise.
//! 2. **Breakpoints**: each edge is split where it crosses the projected
//!    boundary of a face, or passes through the face's plane.
//! 3. **Occlusion**: a piece is hidden when its midpoint lies inside (or on
//!    the boundary of) the projection of a face that is closer to the viewer.
//!
//! Edges are processed in parallel with rayon.

use std::collections::HashSet;

use rayon::prelude::*;
use tdraw_kernel_math::{Point2, Vec3};
use tdraw_kernel_topo::{edge_face_map, edge_key, point_in_polygon, Face, Shape, Surface};
use tracing::{debug, instrument};

use crate::projection::ViewFrame;
use crate::types::{BoundingBox2D, EdgeType, Point2D, ProjectedEdge, ProjectedView, Visibility};

/// Default linear tolerance for HLR (in model units).
pub const DEFAULT_HLR_TOLERANCE: f64 = 1e-6;

/// Smallest parameter gap between two breakpoints.
const PARAM_EPS: f64 = 1e-12;

/// An edge in frame coordinates `(u, v, depth)`.
#[derive(Debug, Clone, Copy)]
struct HlrEdge {
    a: Vec3,
    b: Vec3,
    edge_type: EdgeType,
}

/// A face that can hide edges, in frame coordinates.
#[derive(Debug, Clone)]
struct Occluder {
    loops: Vec<Vec<Point2>>,
    bounds: BoundingBox2D,
    normal: Vec3,
    anchor: Vec3,
}

impl Occluder {
    /// Build from a face; edge-on faces cannot hide anything.
    fn from_face(face: &Face, frame: &ViewFrame) -> Option<Self> {
        let n = face.normal()?;
        let normal = Vec3::new(
            n.dot(&frame.x_axis),
            n.dot(&frame.y_axis),
            n.dot(&frame.direction),
        );
        if normal.z.abs() < 1e-9 {
            return None;
        }
        let anchor = frame.coordinates(face.outer.points.first()?);
        let mut bounds = BoundingBox2D::empty();
        let loops = face
            .loops()
            .map(|l| {
                l.points
                    .iter()
                    .map(|p| {
                        let c = frame.coordinates(p);
                        bounds.include_point(Point2D::new(c.x, c.y));
                        Point2::new(c.x, c.y)
                    })
                    .collect()
            })
            .collect();
        Some(Self {
            loops,
            bounds,
            normal,
            anchor,
        })
    }

    /// Depth of the face plane under view point `p`.
    fn depth_at(&self, p: &Point2) -> f64 {
        let n = &self.normal;
        self.anchor.z - (n.x * (p.x - self.anchor.x) + n.y * (p.y - self.anchor.y)) / n.z
    }

    /// Inside the outer loop and outside every hole, or within `tol` of
    /// the boundary. An edge lying exactly behind a face's boundary is
    /// covered by it.
    fn covers(&self, p: &Point2, tol: f64) -> bool {
        let inside = self
            .loops
            .iter()
            .filter(|l| point_in_polygon(p, l))
            .count()
            % 2
            == 1;
        inside
            || self
                .loop_segments()
                .any(|(q0, q1)| segment_distance(p, &q0, &q1) <= tol)
    }

    fn loop_segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.loops.iter().flat_map(|l| {
            let n = l.len();
            (0..n).map(move |i| (l[i], l[(i + 1) % n]))
        })
    }
}

/// Parameter `t` along `p0 → p1` where it crosses segment `q0 → q1`.
fn segment_crossing(p0: &Point2, p1: &Point2, q0: &Point2, q1: &Point2) -> Option<f64> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = r.x * s.y - r.y * s.x;
    if denom.abs() < 1e-15 {
        return None;
    }
    let qp = q0 - p0;
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    (t > 0.0 && t < 1.0 && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Distance from `p` to segment `q0 → q1`.
fn segment_distance(p: &Point2, q0: &Point2, q1: &Point2) -> f64 {
    let s = q1 - q0;
    let len2 = s.norm_squared();
    let t = if len2 > 0.0 {
        ((p - q0).dot(&s) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (p - (q0 + s * t)).norm()
}

/// True if two facets are pieces of the same smooth surface.
fn same_surface(f1: &Face, f2: &Face) -> bool {
    match (&f1.surface, &f2.surface) {
        (Surface::Plane(_), Surface::Plane(_)) => match (f1.normal(), f2.normal()) {
            (Some(n1), Some(n2)) => n1.dot(&n2) > 1.0 - 1e-12,
            _ => false,
        },
        (s1, s2) => s1 == s2,
    }
}

/// Result of hidden line removal.
#[derive(Debug, Clone, Default)]
pub struct HlrResult {
    /// Projected edge pieces.
    pub edges: Vec<ProjectedEdge>,
}

impl HlrResult {
    fn select(
        &self,
        visibility: Visibility,
        edge_type: EdgeType,
    ) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges
            .iter()
            .filter(move |e| e.visibility == visibility && e.edge_type == edge_type)
    }

    /// Visible hard edges.
    pub fn visible_hard_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.select(Visibility::Visible, EdgeType::Hard)
    }

    /// Hidden hard edges.
    pub fn hidden_hard_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.select(Visibility::Hidden, EdgeType::Hard)
    }

    /// Visible outline (silhouette) edges.
    pub fn visible_outline_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.select(Visibility::Visible, EdgeType::Outline)
    }

    /// Hidden outline (silhouette) edges.
    pub fn hidden_outline_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.select(Visibility::Hidden, EdgeType::Outline)
    }

    /// Collect everything into a projected view.
    pub fn into_view(self) -> ProjectedView {
        let mut view = ProjectedView::new();
        for edge in self.edges {
            view.add_edge(edge);
        }
        view
    }
}

/// Hidden line removal engine.
#[derive(Debug, Clone)]
pub struct HlrAlgo {
    frame: ViewFrame,
    faces: Vec<Face>,
    tolerance: f64,
}

impl HlrAlgo {
    /// Create an engine for the given projector.
    pub fn new(frame: ViewFrame) -> Self {
        Self {
            frame,
            faces: Vec::new(),
            tolerance: DEFAULT_HLR_TOLERANCE,
        }
    }

    /// Override the linear tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Add every face of a shape.
    pub fn add(&mut self, shape: &Shape) {
        self.faces.extend(shape.faces().cloned());
    }

    /// Add a single face.
    pub fn add_face(&mut self, face: &Face) {
        self.faces.push(face.clone());
    }

    /// Hard and outline edges in frame coordinates, each undirected edge once.
    fn collect_edges(&self) -> Vec<HlrEdge> {
        let users = edge_face_map(&self.faces, self.tolerance);
        let mut seen = HashSet::new();
        let mut edges = Vec::new();

        for face in &self.faces {
            for (a, b) in face.edges() {
                let key = edge_key(&a, &b, self.tolerance);
                if !seen.insert(key) {
                    continue;
                }
                let edge_type = match users.get(&key).map(Vec::as_slice) {
                    Some(&[i, j]) if same_surface(&self.faces[i], &self.faces[j]) => {
                        let facing = |f: &Face| {
                            f.normal()
                                .map_or(false, |n| n.dot(&self.frame.direction) > 0.0)
                        };
                        if facing(&self.faces[i]) == facing(&self.faces[j]) {
                            continue;
                        }
                        EdgeType::Outline
                    }
                    _ => EdgeType::Hard,
                };
                edges.push(HlrEdge {
                    a: self.frame.coordinates(&a),
                    b: self.frame.coordinates(&b),
                    edge_type,
                });
            }
        }
        edges
    }

    /// Run hidden line removal.
    #[instrument(skip_all, fields(faces = self.faces.len()))]
    pub fn hide(&self) -> HlrResult {
        let occluders: Vec<Occluder> = self
            .faces
            .iter()
            .filter_map(|f| Occluder::from_face(f, &self.frame))
            .collect();
        let edges = self.collect_edges();
        debug!(edges = edges.len(), occluders = occluders.len(), "hlr");

        let pieces: Vec<Vec<ProjectedEdge>> = edges
            .par_iter()
            .map(|edge| self.split_visibility(edge, &occluders))
            .collect();

        HlrResult {
            edges: pieces.into_iter().flatten().collect(),
        }
    }

    fn split_visibility(&self, edge: &HlrEdge, occluders: &[Occluder]) -> Vec<ProjectedEdge> {
        let p0 = Point2::new(edge.a.x, edge.a.y);
        let p1 = Point2::new(edge.b.x, edge.b.y);
        if (p1 - p0).norm() < self.tolerance {
            debug!("skipping null projected edge at ({:.6}, {:.6})", p0.x, p0.y);
            return Vec::new();
        }

        let mut ebb = BoundingBox2D::empty();
        ebb.include_point(p0.into());
        ebb.include_point(p1.into());
        let candidates: Vec<&Occluder> = occluders
            .iter()
            .filter(|o| o.bounds.overlaps(&ebb, self.tolerance))
            .collect();

        let at = |t: f64| (p0 + (p1 - p0) * t, edge.a.z + (edge.b.z - edge.a.z) * t);

        let mut ts = vec![0.0, 1.0];
        for o in &candidates {
            for (q0, q1) in o.loop_segments() {
                if let Some(t) = segment_crossing(&p0, &p1, &q0, &q1) {
                    ts.push(t);
                }
            }
            let f0 = edge.a.z - o.depth_at(&p0);
            let f1 = edge.b.z - o.depth_at(&p1);
            if f0 * f1 < 0.0 {
                ts.push(f0 / (f0 - f1));
            }
        }
        ts.sort_by(f64::total_cmp);
        ts.dedup_by(|x, y| (*x - *y).abs() < PARAM_EPS);

        let mut runs: Vec<(f64, f64, Visibility)> = Vec::new();
        for w in ts.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            if t1 - t0 < PARAM_EPS {
                continue;
            }
            let (m, depth) = at(0.5 * (t0 + t1));
            let hidden = candidates.iter().any(|o| {
                o.depth_at(&m) > depth + self.tolerance && o.covers(&m, self.tolerance)
            });
            let vis = if hidden {
                Visibility::Hidden
            } else {
                Visibility::Visible
            };
            match runs.last_mut() {
                Some(last) if last.2 == vis => last.1 = t1,
                _ => runs.push((t0, t1, vis)),
            }
        }

        runs.into_iter()
            .map(|(t0, t1, vis)| {
                let (s, _) = at(t0);
                let (e, _) = at(t1);
                let (_, depth) = at(0.5 * (t0 + t1));
                ProjectedEdge::new(s.into(), e.into(), vis, edge.edge_type, depth)
            })
            .collect()
    }
}

/// Project a whole shape with hidden line removal.
pub fn project_shape(shape: &Shape, frame: &ViewFrame) -> ProjectedView {
    let mut hlr = HlrAlgo::new(frame.clone());
    hlr.add(shape);
    hlr.hide().into_view()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdraw_kernel_math::Point3;
    use tdraw_kernel_primitives::{make_box, make_cylinder};

    fn front_frame() -> ViewFrame {
        // Looking along -Y: the viewer sits at -Y.
        ViewFrame::new(Point3::origin(), -Vec3::y(), Vec3::x()).unwrap()
    }

    #[test]
    fn test_cube_front_view() {
        let cube: Shape = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).into();
        let view = project_shape(&cube, &front_frame());

        // 12 edges; the 4 running along Y project to points.
        assert_eq!(view.edges.len(), 8);
        assert!(view.edges.iter().all(|e| e.edge_type == EdgeType::Hard));
        // Back face edges coincide with the front ones and are hidden.
        assert_eq!(view.num_visible(), 4);
        assert_eq!(view.num_hidden(), 4);
        assert!((view.bounds.width() - 1.0).abs() < 1e-12);
        assert!((view.bounds.height() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_isometric_cube_hides_three_edges() {
        let cube: Shape = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).into();
        let frame =
            ViewFrame::new(Point3::origin(), Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.0, -1.0, 0.0))
                .unwrap();
        let view = project_shape(&cube, &frame);
        assert_eq!(view.num_visible(), 9);
        assert_eq!(view.num_hidden(), 3);
    }

    #[test]
    fn test_cylinder_outline_edges() {
        let cyl: Shape = make_cylinder(1.0, 2.0, 32).unwrap().into();
        let mut hlr = HlrAlgo::new(front_frame());
        hlr.add(&cyl);
        let result = hlr.hide();

        // Side view: two silhouette lines, facet seams are not drawn.
        let outline: Vec<_> = result.visible_outline_edges().collect();
        assert_eq!(outline.len(), 2);
        for e in &outline {
            assert!((e.start.x.abs() - 1.0).abs() < 1e-9);
        }
        assert!(result.hidden_outline_edges().next().is_none());
    }

    #[test]
    fn test_cylinder_top_view_has_no_seams() {
        let cyl: Shape = make_cylinder(1.0, 2.0, 32).unwrap().into();
        let top = ViewFrame::new(Point3::origin(), Vec3::z(), Vec3::x()).unwrap();
        let mut hlr = HlrAlgo::new(top);
        hlr.add(&cyl);
        let result = hlr.hide();
        assert_eq!(result.visible_hard_edges().count(), 32);
        assert_eq!(result.hidden_hard_edges().count(), 32);
        assert_eq!(result.visible_outline_edges().count(), 0);
    }

    #[test]
    fn test_single_face_is_fully_visible() {
        let cube = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let top = ViewFrame::new(Point3::origin(), Vec3::z(), Vec3::x()).unwrap();
        let mut hlr = HlrAlgo::new(top);
        hlr.add_face(&cube.faces[1]);
        let result = hlr.hide();
        assert_eq!(result.visible_hard_edges().count(), 4);
        assert_eq!(result.hidden_hard_edges().count(), 0);
    }

    #[test]
    fn test_segment_crossing() {
        let t = segment_crossing(
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
            &Point2::new(1.5, -1.0),
            &Point2::new(1.5, 1.0),
        );
        assert!((t.unwrap() - 0.75).abs() < 1e-12);
    }
}
