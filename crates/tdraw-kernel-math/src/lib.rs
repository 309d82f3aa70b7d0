#![warn(missing_docs)]

//! Math types for the tdraw kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for section-view geometry: points, vectors, directions, transforms,
//! planes, bounding boxes, and tolerance constants.

use nalgebra::{Matrix4, Unit, Vector2, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

// =============================================================================
// Transform
// =============================================================================

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Uniform scale by `factor` about `center`.
    pub fn uniform_scale_about(center: &Point3, factor: f64) -> Self {
        Self::translation(center.x, center.y, center.z)
            .then(&Self::scale(factor, factor, factor))
            .then(&Self::translation(-center.x, -center.y, -center.z))
    }

    /// Reflection through the plane passing through `point` with normal `normal`.
    ///
    /// `p' = p - 2 ((p - point) · n) n`
    pub fn mirror(point: &Point3, normal: &Dir3) -> Self {
        let n = normal.as_ref();
        let offset = 2.0 * point.coords.dot(n);
        let mut m = Matrix4::identity();
        for r in 0..3 {
            for c in 0..3 {
                m[(r, c)] -= 2.0 * n[r] * n[c];
            }
            m[(r, 3)] = offset * n[r];
        }
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// `a.then(&b).apply_point(p) == a.apply_point(&b.apply_point(p))`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation, applies rotation/scale).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Transform a normal vector (uses inverse transpose of upper-left 3x3).
    pub fn apply_normal(&self, n: &Vec3) -> Vec3 {
        let m3 = self.matrix.fixed_view::<3, 3>(0, 0);
        if let Some(inv) = m3.try_inverse() {
            inv.transpose() * n
        } else {
            // Degenerate transform, return input unchanged
            *n
        }
    }

    /// Determinant of the linear (upper-left 3x3) part.
    pub fn determinant(&self) -> f64 {
        self.matrix.fixed_view::<3, 3>(0, 0).determinant()
    }

    /// True if the transform flips handedness (mirror), so face loops must be reversed.
    pub fn reverses_orientation(&self) -> bool {
        self.determinant() < 0.0
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

// =============================================================================
// Tolerance
// =============================================================================

/// Tolerance constants for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default kernel precision (1e-6 mm linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if two directions are parallel or anti-parallel within the angular tolerance.
    pub fn directions_parallel(&self, a: &Vec3, b: &Vec3) -> bool {
        let (na, nb) = (a.norm(), b.norm());
        if na == 0.0 || nb == 0.0 {
            return false;
        }
        let sin = a.cross(b).norm() / (na * nb);
        sin <= self.angular.sin()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Plane
// =============================================================================

/// An infinite plane defined by an origin point and a right-handed frame.
///
/// Parameterization: `P(u, v) = origin + u * x_dir + v * y_dir`,
/// with `x_dir × y_dir = normal_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Origin point on the plane.
    pub origin: Point3,
    /// Unit vector along the u direction.
    pub x_dir: Dir3,
    /// Unit vector along the v direction.
    pub y_dir: Dir3,
    /// Unit normal (x_dir × y_dir).
    pub normal_dir: Dir3,
}

impl Plane {
    /// Create a plane from origin and two orthogonal direction vectors.
    /// The vectors do not need to be normalized.
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3) -> Self {
        let x = Dir3::new_normalize(x_dir);
        let y = Dir3::new_normalize(y_dir);
        let n = Dir3::new_normalize(x_dir.cross(&y_dir));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// Create a plane from origin and normal. X/Y directions are chosen arbitrarily.
    pub fn from_normal(origin: Point3, normal: Vec3) -> Self {
        let n = Dir3::new_normalize(normal);
        let x = Dir3::new_normalize(perpendicular_to(n.as_ref()));
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// XY plane at the origin.
    pub fn xy() -> Self {
        Self::new(Point3::origin(), Vec3::x(), Vec3::y())
    }

    /// Unit normal as a plain vector.
    pub fn normal(&self) -> Vec3 {
        *self.normal_dir.as_ref()
    }

    /// Express a 3D point in this plane's (u, v) parameter space.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_dir.as_ref()), d.dot(self.y_dir.as_ref()))
    }

    /// Point on the plane at parameter `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Point3 {
        self.origin + u * self.x_dir.as_ref() + v * self.y_dir.as_ref()
    }

    /// Orthogonal projection of a 3D point onto the plane.
    pub fn project_point(&self, p: &Point3) -> Point3 {
        p - self.signed_distance(p) * self.normal_dir.as_ref()
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal_dir.as_ref())
    }

    /// True if `p` lies on the plane within `linear_tol`.
    pub fn contains(&self, p: &Point3, linear_tol: f64) -> bool {
        self.signed_distance(p).abs() <= linear_tol
    }

    /// True if the two plane axes are parallel (orientation ignored).
    pub fn is_parallel(&self, other: &Plane, tol: &Tolerance) -> bool {
        tol.directions_parallel(self.normal_dir.as_ref(), other.normal_dir.as_ref())
    }

    /// The same plane with its normal (and y axis) reversed.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.origin,
            x_dir: self.x_dir,
            y_dir: -self.y_dir,
            normal_dir: -self.normal_dir,
        }
    }

    /// Apply an affine transform, keeping the normal consistent with
    /// `apply_normal` even when the transform mirrors.
    pub fn transformed(&self, t: &Transform) -> Self {
        let origin = t.apply_point(&self.origin);
        let n = Dir3::new_normalize(t.apply_normal(self.normal_dir.as_ref()));
        let x_raw = t.apply_vec(self.x_dir.as_ref());
        let x_in_plane = x_raw - x_raw.dot(n.as_ref()) * n.as_ref();
        let x = if x_in_plane.norm() > 1e-12 {
            Dir3::new_normalize(x_in_plane)
        } else {
            Dir3::new_normalize(perpendicular_to(n.as_ref()))
        };
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }
}

/// Any vector perpendicular to `n` (not normalized).
pub fn perpendicular_to(n: &Vec3) -> Vec3 {
    let arbitrary = if n.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
    arbitrary.cross(n)
}

// =============================================================================
// Bounding box
// =============================================================================

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundBox3 {
    /// Create a bounding box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.include_point(p);
        }
        bb
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// True if the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the diagonal.
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    /// The 8 corners, x varying fastest, then y, then z.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(a.x, b.y, b.z),
            Point3::new(b.x, b.y, b.z),
        ]
    }

    /// Strict containment: `min < v < max` on every axis. Points on the
    /// boundary are outside.
    pub fn contains_strict(&self, p: &Point3) -> bool {
        (0..3).all(|i| p[i] > self.min[i] && p[i] < self.max[i])
    }

    /// Test if two boxes overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &BoundBox3) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

impl Default for BoundBox3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        let translate = Transform::translation(1.0, 0.0, 0.0);
        let scale = Transform::scale(2.0, 2.0, 2.0);
        // (0,0,0) -> translate -> (1,0,0) -> scale -> (2,0,0)
        let result = scale.then(&translate).apply_point(&Point3::origin());
        assert!((result.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_inverse() {
        let t = Transform::translation(1.0, 2.0, 3.0);
        let inv = t.inverse().unwrap();
        let composed = t.then(&inv);
        let p = Point3::new(5.0, 6.0, 7.0);
        let result = composed.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_mirror_about_offset_plane() {
        let m = Transform::mirror(&Point3::new(0.0, 2.0, 0.0), &Dir3::new_normalize(Vec3::y()));
        let p = m.apply_point(&Point3::new(1.0, 5.0, -1.0));
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(p.z, -1.0, epsilon = 1e-12);
        assert!(m.reverses_orientation());
        // Normals in the mirror plane are untouched, normals across it flip.
        let n = m.apply_normal(&Vec3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(n.y, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_uniform_scale_about_center() {
        let c = Point3::new(1.0, 1.0, 1.0);
        let t = Transform::uniform_scale_about(&c, 3.0);
        assert!((t.apply_point(&c) - c).norm() < 1e-12);
        let p = t.apply_point(&Point3::new(2.0, 1.0, 1.0));
        assert_relative_eq!(p.x, 4.0, epsilon = 1e-12);
        assert!(!t.reverses_orientation());
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_directions_parallel_ignores_orientation() {
        let tol = Tolerance::DEFAULT;
        assert!(tol.directions_parallel(&Vec3::z(), &Vec3::new(0.0, 0.0, -3.0)));
        assert!(!tol.directions_parallel(&Vec3::z(), &Vec3::new(0.0, 1e-3, 1.0)));
        assert!(!tol.directions_parallel(&Vec3::z(), &Vec3::zeros()));
    }

    #[test]
    fn test_plane_frame_is_right_handed() {
        let n = Vec3::new(1.0, 1.0, 0.0);
        let plane = Plane::from_normal(Point3::origin(), n);
        let x = plane.x_dir.as_ref();
        let y = plane.y_dir.as_ref();
        assert!(x.dot(&plane.normal()).abs() < 1e-12);
        assert!(y.dot(&plane.normal()).abs() < 1e-12);
        assert!((x.cross(y) - plane.normal()).norm() < 1e-12);
    }

    #[test]
    fn test_plane_projection_and_distance() {
        let plane = Plane::from_normal(Point3::new(0.0, 0.0, 2.0), Vec3::z());
        let p = Point3::new(3.0, -1.0, 7.0);
        assert_relative_eq!(plane.signed_distance(&p), 5.0, epsilon = 1e-12);
        let q = plane.project_point(&p);
        assert_relative_eq!(q.z, 2.0, epsilon = 1e-12);
        assert!(plane.contains(&q, 1e-9));
        assert!(!plane.contains(&p, 1e-9));
    }

    #[test]
    fn test_plane_transformed_by_mirror_keeps_normal_consistent() {
        let plane = Plane::from_normal(Point3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 1.0));
        let m = Transform::mirror(&Point3::origin(), &Dir3::new_normalize(Vec3::y()));
        let mp = plane.transformed(&m);
        let expected = m.apply_normal(&plane.normal()).normalize();
        assert!((mp.normal() - expected).norm() < 1e-12);
        let x = mp.x_dir.as_ref();
        assert!((x.cross(mp.y_dir.as_ref()) - mp.normal()).norm() < 1e-12);
    }

    #[test]
    fn test_bound_box_strict_containment() {
        let bb = BoundBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert!(bb.contains_strict(&Point3::new(0.5, 0.5, 0.5)));
        // Boundary is not inside.
        assert!(!bb.contains_strict(&Point3::new(0.0, 0.0, 1.0)));
        assert!(!bb.contains_strict(&Point3::new(0.5, 0.5, 1.0)));
        assert!(!bb.contains_strict(&Point3::new(10.0, 0.5, 0.5)));
    }

    #[test]
    fn test_bound_box_corners_and_center() {
        let bb = BoundBox3::from_points(&[Point3::new(-1.0, 2.0, 0.0), Point3::new(1.0, 4.0, 6.0)]);
        let corners = bb.corners();
        assert_eq!(corners[0], bb.min);
        assert_eq!(corners[7], bb.max);
        assert_eq!(bb.center(), Point3::new(0.0, 3.0, 3.0));
        assert!(!BoundBox3::empty().is_valid());
    }
}
