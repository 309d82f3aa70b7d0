#![warn(missing_docs)]

//! Polyhedral boundary representation for the tdraw kernel.
//!
//! A [`Solid`] is a closed set of planar polygonal [`Face`]s. Each face has
//! one outer [`Loop`] (counter-clockwise about the outward normal) and zero
//! or more hole loops (clockwise). Faces remember the analytic [`Surface`]
//! they lie on, so facets approximating a cylinder or sphere are still known
//! to be non-planar surfaces, and two facets of the same surface meet along a
//! smooth edge rather than a hard one.
//!
//! [`Shape`] is the generic container handed between pipeline stages
//! (solid, single face, or compound).

use std::collections::HashMap;

use tdraw_kernel_math::{perpendicular_to, BoundBox3, Dir3, Plane, Point2, Point3, Transform, Vec3};

// =============================================================================
// Surfaces
// =============================================================================

/// The kind of a surface (for match-based dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Infinite plane.
    Plane,
    /// Cylindrical surface.
    Cylinder,
    /// Spherical surface.
    Sphere,
}

/// A cylindrical surface defined by an axis line and radius.
#[derive(Debug, Clone, PartialEq)]
pub struct CylinderSurface {
    /// Point on the axis.
    pub origin: Point3,
    /// Axis direction.
    pub axis: Dir3,
    /// Radius.
    pub radius: f64,
}

/// A spherical surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SphereSurface {
    /// Center of the sphere.
    pub center: Point3,
    /// Radius of the sphere.
    pub radius: f64,
}

/// The analytic surface a face lies on (or approximates, for facets).
#[derive(Debug, Clone, PartialEq)]
pub enum Surface {
    /// The face is exactly planar.
    Plane(Plane),
    /// The face is a facet of a cylinder.
    Cylinder(CylinderSurface),
    /// The face is a facet of a sphere.
    Sphere(SphereSurface),
}

impl Surface {
    /// The kind of this surface.
    pub fn kind(&self) -> SurfaceKind {
        match self {
            Surface::Plane(_) => SurfaceKind::Plane,
            Surface::Cylinder(_) => SurfaceKind::Cylinder,
            Surface::Sphere(_) => SurfaceKind::Sphere,
        }
    }

    /// The plane, if this is a planar surface.
    pub fn as_plane(&self) -> Option<&Plane> {
        match self {
            Surface::Plane(p) => Some(p),
            _ => None,
        }
    }

    /// Apply an affine transform, returning a new surface.
    pub fn transformed(&self, t: &Transform) -> Surface {
        match self {
            Surface::Plane(p) => Surface::Plane(p.transformed(t)),
            Surface::Cylinder(c) => {
                let axis = t.apply_vec(c.axis.as_ref());
                let radial = t.apply_vec(&perpendicular_to(c.axis.as_ref()).normalize());
                Surface::Cylinder(CylinderSurface {
                    origin: t.apply_point(&c.origin),
                    axis: Dir3::new_normalize(axis),
                    radius: c.radius * radial.norm(),
                })
            }
            Surface::Sphere(s) => {
                // Scale factor affects radius; use the length of a transformed unit vector
                let scale = t.apply_vec(&Vec3::x()).norm();
                Surface::Sphere(SphereSurface {
                    center: t.apply_point(&s.center),
                    radius: s.radius * scale,
                })
            }
        }
    }
}

// =============================================================================
// Loops
// =============================================================================

/// A closed polygon. The closing edge from the last point back to the first
/// is implicit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Loop {
    /// Vertices in traversal order.
    pub points: Vec<Point3>,
}

impl Loop {
    /// Create a loop from its vertices.
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Number of vertices (and edges).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the loop has no vertices.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Directed edges `(start, end)`, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Newell area vector: direction is the loop normal (right-hand rule),
    /// magnitude is the enclosed area.
    ///
    /// Computed relative to the first vertex so the result does not depend
    /// on how far the loop sits from the origin.
    pub fn area_vector(&self) -> Vec3 {
        let Some(anchor) = self.points.first() else {
            return Vec3::zeros();
        };
        let mut acc = Vec3::zeros();
        for (a, b) in self.edges() {
            acc += (a - anchor).cross(&(b - anchor));
        }
        acc * 0.5
    }

    /// Average of the vertices.
    pub fn centroid(&self) -> Point3 {
        if self.points.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .points
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.points.len() as f64)
    }

    /// The loop traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self { points }
    }

    /// Apply a transform to every vertex.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| t.apply_point(p)).collect(),
        }
    }

    /// Vertices expressed in a plane's (u, v) coordinates.
    pub fn to_plane_coords(&self, plane: &Plane) -> Vec<Point2> {
        self.points.iter().map(|p| plane.project(p)).collect()
    }
}

// =============================================================================
// Faces
// =============================================================================

/// A planar polygonal face with optional holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    /// The surface this face lies on.
    pub surface: Surface,
    /// Outer boundary, counter-clockwise about the outward normal.
    pub outer: Loop,
    /// Holes, clockwise about the outward normal.
    pub inners: Vec<Loop>,
}

impl Face {
    /// Create a face from a surface and its loops.
    pub fn new(surface: Surface, outer: Loop, inners: Vec<Loop>) -> Self {
        Self {
            surface,
            outer,
            inners,
        }
    }

    /// A face with no vertices, used as the "null face" sentinel.
    pub fn null() -> Self {
        Self {
            surface: Surface::Plane(Plane::xy()),
            outer: Loop::default(),
            inners: Vec::new(),
        }
    }

    /// True if the face cannot bound anything (fewer than 3 outer vertices).
    pub fn is_null(&self) -> bool {
        self.outer.len() < 3
    }

    /// True if the face lies on a planar surface (not a facet of a curved one).
    pub fn is_planar(&self) -> bool {
        self.surface.kind() == SurfaceKind::Plane
    }

    /// Outer loop followed by the holes.
    pub fn loops(&self) -> impl Iterator<Item = &Loop> {
        std::iter::once(&self.outer).chain(self.inners.iter())
    }

    /// Every directed boundary edge of every loop.
    pub fn edges(&self) -> impl Iterator<Item = (Point3, Point3)> + '_ {
        self.loops().flat_map(|l| l.edges())
    }

    /// Every vertex of every loop.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3> {
        self.loops().flat_map(|l| l.points.iter())
    }

    /// Net area vector (outer minus holes).
    pub fn area_vector(&self) -> Vec3 {
        self.loops().map(Loop::area_vector).sum()
    }

    /// Net enclosed area.
    pub fn area(&self) -> f64 {
        self.area_vector().norm()
    }

    /// Outward unit normal derived from the outer loop winding.
    pub fn normal(&self) -> Option<Vec3> {
        let v = self.outer.area_vector();
        let n = v.norm();
        (n > f64::EPSILON).then(|| v / n)
    }

    /// The supporting plane, oriented along the outward normal.
    ///
    /// Planar faces return their surface plane; facets derive one from the
    /// outer loop.
    pub fn plane(&self) -> Option<Plane> {
        match &self.surface {
            Surface::Plane(p) => Some(p.clone()),
            _ => self
                .normal()
                .map(|n| Plane::from_normal(self.outer.centroid(), n)),
        }
    }

    /// Bounding box of the face's vertices.
    pub fn bounding_box(&self) -> BoundBox3 {
        BoundBox3::from_points(self.vertices())
    }

    /// The face with flipped orientation (loops reversed, plane reversed).
    pub fn reversed(&self) -> Self {
        let surface = match &self.surface {
            Surface::Plane(p) => Surface::Plane(p.reversed()),
            other => other.clone(),
        };
        Self {
            surface,
            outer: self.outer.reversed(),
            inners: self.inners.iter().map(Loop::reversed).collect(),
        }
    }

    /// Apply a transform. Mirroring transforms reverse the loops so that
    /// winding stays consistent with the transformed normal.
    pub fn transformed(&self, t: &Transform) -> Self {
        let flip = t.reverses_orientation();
        let map_loop = |l: &Loop| {
            let moved = l.transformed(t);
            if flip {
                moved.reversed()
            } else {
                moved
            }
        };
        Self {
            surface: self.surface.transformed(t),
            outer: map_loop(&self.outer),
            inners: self.inners.iter().map(map_loop).collect(),
        }
    }
}

// =============================================================================
// Solids and shapes
// =============================================================================

/// A closed polyhedral solid (possibly several disconnected lumps).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Solid {
    /// Boundary faces with outward orientation.
    pub faces: Vec<Face>,
}

impl Solid {
    /// Create a solid from its boundary faces.
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    /// True if the solid has no faces.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundBox3 {
        BoundBox3::from_points(self.faces.iter().flat_map(|f| f.vertices()))
    }

    /// Enclosed volume via the divergence theorem.
    pub fn volume(&self) -> f64 {
        let mut vol = 0.0;
        for face in &self.faces {
            if let Some(p0) = face.outer.points.first() {
                vol += face.area_vector().dot(&p0.coords);
            }
        }
        vol / 3.0
    }

    /// Every vertex of every face.
    pub fn vertices(&self) -> impl Iterator<Item = &Point3> {
        self.faces.iter().flat_map(|f| f.vertices())
    }

    /// Apply a transform to every face.
    pub fn transformed(&self, t: &Transform) -> Self {
        Self {
            faces: self.faces.iter().map(|f| f.transformed(t)).collect(),
        }
    }
}

/// A generic shape passed between pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// A closed solid.
    Solid(Solid),
    /// A single face.
    Face(Face),
    /// A container of sub-shapes.
    Compound(Vec<Shape>),
}

impl Shape {
    /// The null shape (an empty compound).
    pub fn null() -> Self {
        Shape::Compound(Vec::new())
    }

    /// A compound holding one face entry per face.
    pub fn compound_of_faces(faces: Vec<Face>) -> Self {
        Shape::Compound(faces.into_iter().map(Shape::Face).collect())
    }

    /// True if the shape holds no faces at all.
    pub fn is_null(&self) -> bool {
        self.faces().next().is_none()
    }

    /// Explore every face, depth-first.
    pub fn faces(&self) -> Box<dyn Iterator<Item = &Face> + '_> {
        match self {
            Shape::Solid(s) => Box::new(s.faces.iter()),
            Shape::Face(f) => Box::new(std::iter::once(f)),
            Shape::Compound(items) => Box::new(items.iter().flat_map(|s| s.faces())),
        }
    }

    /// Number of faces reachable from this shape.
    pub fn face_count(&self) -> usize {
        self.faces().count()
    }

    /// Explore every solid, depth-first.
    pub fn solids(&self) -> Box<dyn Iterator<Item = &Solid> + '_> {
        match self {
            Shape::Solid(s) => Box::new(std::iter::once(s)),
            Shape::Face(_) => Box::new(std::iter::empty()),
            Shape::Compound(items) => Box::new(items.iter().flat_map(|s| s.solids())),
        }
    }

    /// True if at least one non-empty solid is reachable.
    pub fn has_solids(&self) -> bool {
        self.solids().any(|s| !s.is_empty())
    }

    /// Bounding box of every vertex.
    pub fn bounding_box(&self) -> BoundBox3 {
        BoundBox3::from_points(self.faces().flat_map(|f| f.vertices()))
    }

    /// Apply a transform to the whole shape.
    pub fn transformed(&self, t: &Transform) -> Shape {
        match self {
            Shape::Solid(s) => Shape::Solid(s.transformed(t)),
            Shape::Face(f) => Shape::Face(f.transformed(t)),
            Shape::Compound(items) => {
                Shape::Compound(items.iter().map(|s| s.transformed(t)).collect())
            }
        }
    }
}

impl From<Solid> for Shape {
    fn from(s: Solid) -> Self {
        Shape::Solid(s)
    }
}

// =============================================================================
// Vertex keys and polygon helpers
// =============================================================================

/// Key for endpoint lookup with tolerance-based hashing.
pub fn point_key(p: &Point3, tolerance: f64) -> (i64, i64, i64) {
    let scale = 1.0 / tolerance;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

/// Canonical undirected edge key.
pub fn edge_key(a: &Point3, b: &Point3, tolerance: f64) -> EdgeKey {
    let (ka, kb) = (point_key(a, tolerance), point_key(b, tolerance));
    if ka <= kb {
        (ka, kb)
    } else {
        (kb, ka)
    }
}

/// Undirected edge key built from two vertex keys.
pub type EdgeKey = ((i64, i64, i64), (i64, i64, i64));

/// Map every undirected boundary edge to the indices of the faces using it.
pub fn edge_face_map(faces: &[Face], tolerance: f64) -> HashMap<EdgeKey, Vec<usize>> {
    let mut map: HashMap<EdgeKey, Vec<usize>> = HashMap::new();
    for (i, face) in faces.iter().enumerate() {
        for (a, b) in face.edges() {
            map.entry(edge_key(&a, &b, tolerance)).or_default().push(i);
        }
    }
    map
}

/// Point-in-polygon test using ray casting.
pub fn point_in_polygon(p: &Point2, polygon: &[Point2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let vi = &polygon[i];
        let vj = &polygon[j];
        if ((vi.y > p.y) != (vj.y > p.y))
            && (p.x < (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square(z: f64) -> Loop {
        Loop::new(vec![
            Point3::new(0.0, 0.0, z),
            Point3::new(1.0, 0.0, z),
            Point3::new(1.0, 1.0, z),
            Point3::new(0.0, 1.0, z),
        ])
    }

    fn square_face_with_hole() -> Face {
        let hole = Loop::new(vec![
            Point3::new(0.25, 0.25, 0.0),
            Point3::new(0.25, 0.75, 0.0),
            Point3::new(0.75, 0.75, 0.0),
            Point3::new(0.75, 0.25, 0.0),
        ]);
        Face::new(Surface::Plane(Plane::xy()), unit_square(0.0), vec![hole])
    }

    #[test]
    fn test_loop_area_vector() {
        let l = unit_square(3.0);
        let a = l.area_vector();
        assert_relative_eq!(a.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(l.reversed().area_vector().z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_area_vector_far_from_origin() {
        let offset = Vec3::new(31_415.926_5, 62_831.853, 94_247.779);
        let l = Loop::new(unit_square(0.0).points.iter().map(|p| p + offset).collect());
        let n = l.area_vector();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-9);
        assert!(n.x.abs() < 1e-12 && n.y.abs() < 1e-12);
    }

    #[test]
    fn test_face_net_area_subtracts_holes() {
        let face = square_face_with_hole();
        assert_relative_eq!(face.area(), 0.75, epsilon = 1e-12);
        let n = face.normal().unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_null_face() {
        assert!(Face::null().is_null());
        assert!(!square_face_with_hole().is_null());
    }

    #[test]
    fn test_mirror_keeps_winding_consistent() {
        let face = square_face_with_hole();
        let m = Transform::mirror(&Point3::origin(), &Dir3::new_normalize(Vec3::y()));
        let mirrored = face.transformed(&m);
        // Mirroring about XZ keeps +Z normal; loops must still wind about it.
        let n = mirrored.normal().unwrap();
        assert_relative_eq!(n.z, 1.0, epsilon = 1e-12);
        let plane = mirrored.plane().unwrap();
        assert_relative_eq!(plane.normal().z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(mirrored.area(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_face_explorer() {
        let shape = Shape::Compound(vec![
            Shape::Face(square_face_with_hole()),
            Shape::Compound(vec![Shape::Face(square_face_with_hole())]),
        ]);
        assert_eq!(shape.face_count(), 2);
        assert!(!shape.has_solids());
        assert!(Shape::null().is_null());
    }

    #[test]
    fn test_point_in_polygon() {
        let square = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];

        assert!(point_in_polygon(&Point2::new(5.0, 5.0), &square));
        assert!(!point_in_polygon(&Point2::new(15.0, 5.0), &square));
        assert!(!point_in_polygon(&Point2::new(-5.0, 5.0), &square));
    }

    #[test]
    fn test_edge_key_is_undirected() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(edge_key(&a, &b, 1e-6), edge_key(&b, &a, 1e-6));
    }
}
