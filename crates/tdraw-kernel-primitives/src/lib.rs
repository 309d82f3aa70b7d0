#![warn(missing_docs)]

//! Polyhedral primitive construction for the tdraw kernel.
//!
//! Builds closed [`Solid`]s for the standard CAD primitives (box, cylinder,
//! tube, sphere) and the generic wire → face → prism pipeline used by the
//! section view's cutting prism. Curved surfaces are approximated by planar
//! facets tagged with the surface they approximate.

use std::f64::consts::PI;

use tdraw_kernel_math::{Plane, Point3, Tolerance, Vec3};
use tdraw_kernel_topo::{CylinderSurface, Face, Loop, Solid, SphereSurface, Surface};
use thiserror::Error;

/// Errors raised while building primitive shapes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrimitiveError {
    /// The wire has fewer than three distinct points or encloses no area.
    #[error("degenerate wire: {0}")]
    DegenerateWire(String),
    /// The wire's points do not lie in a common plane.
    #[error("wire is not planar (deviation {0:.3e})")]
    NonPlanarWire(f64),
    /// The extrusion vector is zero or parallel to the face.
    #[error("extrusion vector has no component along the face normal")]
    ZeroExtrusion,
    /// A dimension is out of range.
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),
}

/// Build a closed polygonal wire through `points`.
///
/// Consecutive duplicates (including a repeated first point) are removed.
pub fn make_polygon(points: &[Point3]) -> Result<Loop, PrimitiveError> {
    let tol = Tolerance::DEFAULT;
    let mut pts: Vec<Point3> = Vec::with_capacity(points.len());
    for p in points {
        if pts.last().map_or(true, |q| !tol.points_equal(p, q)) {
            pts.push(*p);
        }
    }
    while pts.len() > 1 && tol.points_equal(&pts[0], &pts[pts.len() - 1]) {
        pts.pop();
    }
    if pts.len() < 3 {
        return Err(PrimitiveError::DegenerateWire(format!(
            "{} distinct points",
            pts.len()
        )));
    }

    let wire = Loop::new(pts);
    if wire.area_vector().norm() <= tol.linear * tol.linear {
        return Err(PrimitiveError::DegenerateWire("zero enclosed area".into()));
    }
    Ok(wire)
}

/// Build a planar face bounded by `wire`. The face normal follows the wire
/// winding (right-hand rule).
pub fn make_face(wire: Loop) -> Result<Face, PrimitiveError> {
    let area = wire.area_vector();
    let norm = area.norm();
    if wire.len() < 3 || norm <= f64::EPSILON {
        return Err(PrimitiveError::DegenerateWire("zero enclosed area".into()));
    }
    let normal = area / norm;
    let origin = wire.points[0];
    let x = wire.points[1] - origin;
    let plane = Plane::new(origin, x, normal.cross(&x));

    let deviation = wire
        .points
        .iter()
        .map(|p| plane.signed_distance(p).abs())
        .fold(0.0, f64::max);
    if deviation > Tolerance::DEFAULT.linear {
        return Err(PrimitiveError::NonPlanarWire(deviation));
    }

    Ok(Face::new(Surface::Plane(plane), wire, Vec::new()))
}

/// Extrude a planar face along `extrusion` into a closed prism.
///
/// Works for either sign of `extrusion · normal`; the result is always
/// outward oriented.
pub fn make_prism(face: &Face, extrusion: Vec3) -> Result<Solid, PrimitiveError> {
    sweep(face, extrusion, |_| None)
}

/// Sweep `face` along `extrusion`. `side_surface(loop_index)` may override the
/// surface tag of the side facets generated from that loop.
fn sweep(
    face: &Face,
    extrusion: Vec3,
    side_surface: impl Fn(usize) -> Option<Surface>,
) -> Result<Solid, PrimitiveError> {
    let normal = face
        .normal()
        .ok_or_else(|| PrimitiveError::DegenerateWire("face has no normal".into()))?;
    let along = extrusion.dot(&normal);
    if along.abs() <= Tolerance::DEFAULT.linear {
        return Err(PrimitiveError::ZeroExtrusion);
    }

    // Base is oriented so its normal points along the extrusion.
    let base = if along > 0.0 { face.clone() } else { face.reversed() };

    let mut faces = Vec::new();
    faces.push(base.reversed());

    let top_loop = |l: &Loop| Loop::new(l.points.iter().map(|p| p + extrusion).collect());
    let top_surface = match &base.surface {
        Surface::Plane(p) => Surface::Plane(Plane::new(
            p.origin + extrusion,
            *p.x_dir.as_ref(),
            *p.y_dir.as_ref(),
        )),
        other => other.clone(),
    };
    faces.push(Face::new(
        top_surface,
        top_loop(&base.outer),
        base.inners.iter().map(top_loop).collect(),
    ));

    for (li, l) in base.loops().enumerate() {
        let tag = side_surface(li);
        for (a, b) in l.edges() {
            let (a_top, b_top) = (a + extrusion, b + extrusion);
            let surface = tag.clone().unwrap_or_else(|| {
                let x = b - a;
                Surface::Plane(Plane::new(a, x, x.cross(&extrusion).cross(&x)))
            });
            faces.push(Face::new(
                surface,
                Loop::new(vec![a, b, b_top, a_top]),
                Vec::new(),
            ));
        }
    }

    Ok(Solid::new(faces))
}

/// Build an axis-aligned box spanning `min..max`.
pub fn make_box(min: Point3, max: Point3) -> Solid {
    let (lo, hi) = (min.inf(&max), min.sup(&max));
    let bottom = Loop::new(vec![
        Point3::new(lo.x, lo.y, lo.z),
        Point3::new(hi.x, lo.y, lo.z),
        Point3::new(hi.x, hi.y, lo.z),
        Point3::new(lo.x, hi.y, lo.z),
    ]);
    let plane = Plane::new(bottom.points[0], Vec3::x(), Vec3::y());
    let face = Face::new(Surface::Plane(plane), bottom, Vec::new());
    // A flat box has no volume; keep the bottom and top faces only.
    sweep(&face, Vec3::new(0.0, 0.0, hi.z - lo.z), |_| None)
        .unwrap_or_else(|_| Solid::new(vec![face.reversed(), face]))
}

/// Build a box with corner at origin and dimensions `(sx, sy, sz)`.
///
/// The box has 6 planar faces, 12 edges, and 8 vertices.
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
pub fn make_cube(sx: f64, sy: f64, sz: f64) -> Solid {
    make_box(Point3::origin(), Point3::new(sx, sy, sz))
}

fn circle_points(radius: f64, segments: u32) -> Vec<Point3> {
    let n = segments.max(3);
    (0..n)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / n as f64;
            Point3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
        })
        .collect()
}

fn cylinder_surface(radius: f64) -> Surface {
    Surface::Cylinder(CylinderSurface {
        origin: Point3::origin(),
        axis: tdraw_kernel_math::Dir3::new_normalize(Vec3::z()),
        radius,
    })
}

/// Build a faceted cylinder with axis along Z, base at z = 0.
///
/// The lateral facets are tagged with the cylindrical surface, the caps are
/// planar. `segments` is clamped to at least 3.
pub fn make_cylinder(radius: f64, height: f64, segments: u32) -> Result<Solid, PrimitiveError> {
    if radius <= 0.0 || height <= 0.0 {
        return Err(PrimitiveError::InvalidDimension(format!(
            "cylinder radius {radius}, height {height}"
        )));
    }
    let face = make_face(Loop::new(circle_points(radius, segments)))?;
    sweep(&face, Vec3::new(0.0, 0.0, height), |_| {
        Some(cylinder_surface(radius))
    })
}

/// Build a hollow cylinder (tube) with axis along Z, base at z = 0.
pub fn make_tube(
    outer_radius: f64,
    inner_radius: f64,
    height: f64,
    segments: u32,
) -> Result<Solid, PrimitiveError> {
    if inner_radius <= 0.0 || inner_radius >= outer_radius || height <= 0.0 {
        return Err(PrimitiveError::InvalidDimension(format!(
            "tube outer {outer_radius}, inner {inner_radius}, height {height}"
        )));
    }
    let outer = make_face(Loop::new(circle_points(outer_radius, segments)))?;
    let hole = Loop::new(circle_points(inner_radius, segments)).reversed();
    let annulus = Face::new(outer.surface.clone(), outer.outer, vec![hole]);
    sweep(&annulus, Vec3::new(0.0, 0.0, height), |li| match li {
        0 => Some(cylinder_surface(outer_radius)),
        _ => Some(cylinder_surface(inner_radius)),
    })
}

/// Build a faceted UV sphere centred at the origin.
///
/// `segments` is the number of longitudinal divisions (clamped to ≥ 3),
/// `rings` the number of latitudinal bands (clamped to ≥ 2). Pole bands are
/// triangles, the rest planar quads; every facet is tagged with the sphere.
pub fn make_sphere(radius: f64, segments: u32, rings: u32) -> Result<Solid, PrimitiveError> {
    if radius <= 0.0 {
        return Err(PrimitiveError::InvalidDimension(format!(
            "sphere radius {radius}"
        )));
    }
    let n = segments.max(3) as usize;
    let m = rings.max(2) as usize;
    let surface = Surface::Sphere(SphereSurface {
        center: Point3::origin(),
        radius,
    });

    let south = Point3::new(0.0, 0.0, -radius);
    let north = Point3::new(0.0, 0.0, radius);
    // grid[j][i] for interior rings j = 1..m-1
    let grid: Vec<Vec<Point3>> = (1..m)
        .map(|j| {
            let phi = -PI / 2.0 + PI * j as f64 / m as f64;
            (0..n)
                .map(|i| {
                    let theta = 2.0 * PI * i as f64 / n as f64;
                    Point3::new(
                        radius * phi.cos() * theta.cos(),
                        radius * phi.cos() * theta.sin(),
                        radius * phi.sin(),
                    )
                })
                .collect()
        })
        .collect();

    let mut faces = Vec::with_capacity(n * m);
    let facet = |pts: Vec<Point3>| Face::new(surface.clone(), Loop::new(pts), Vec::new());
    for i in 0..n {
        let k = (i + 1) % n;
        faces.push(facet(vec![south, grid[0][k], grid[0][i]]));
        for j in 0..m - 2 {
            faces.push(facet(vec![
                grid[j][i],
                grid[j][k],
                grid[j + 1][k],
                grid[j + 1][i],
            ]));
        }
        faces.push(facet(vec![grid[m - 2][i], grid[m - 2][k], north]));
    }

    Ok(Solid::new(faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tdraw_kernel_topo::SurfaceKind;

    #[test]
    fn test_cube_topology() {
        let cube = make_cube(10.0, 20.0, 30.0);
        assert_eq!(cube.faces.len(), 6);
        let edges: usize = cube.faces.iter().map(|f| f.outer.len()).sum();
        // 6 faces × 4 half-edges = 24 half-edges
        assert_eq!(edges, 24);
        for f in &cube.faces {
            assert_eq!(f.surface.kind(), SurfaceKind::Plane);
        }
    }

    #[test]
    fn test_cube_volume_and_bounds() {
        let cube = make_cube(10.0, 20.0, 30.0);
        assert!((cube.volume() - 6000.0).abs() < 1e-9);
        let bb = cube.bounding_box();
        assert!((bb.min.x - 0.0).abs() < 1e-12);
        assert!((bb.max.x - 10.0).abs() < 1e-12);
        assert!((bb.max.z - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_face_normals_point_outward() {
        let cube = make_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        for f in &cube.faces {
            let n = f.normal().unwrap();
            let c = f.outer.centroid();
            assert!(n.dot(&c.coords) > 0.0, "face at {c:?} points inward");
            let plane = f.plane().unwrap();
            assert!((plane.normal() - n).norm() < 1e-12);
        }
    }

    #[test]
    fn test_prism_either_direction() {
        let wire = make_polygon(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ])
        .unwrap();
        let face = make_face(wire).unwrap();
        let up = make_prism(&face, Vec3::new(0.0, 0.0, 3.0)).unwrap();
        let down = make_prism(&face, Vec3::new(0.0, 0.0, -3.0)).unwrap();
        assert!((up.volume() - 12.0).abs() < 1e-9);
        assert!((down.volume() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_prism_rejects_parallel_extrusion() {
        let face = make_face(
            make_polygon(&[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ])
            .unwrap(),
        )
        .unwrap();
        assert_eq!(
            make_prism(&face, Vec3::new(1.0, 0.0, 0.0)),
            Err(PrimitiveError::ZeroExtrusion)
        );
    }

    #[test]
    fn test_polygon_rejects_degenerate() {
        assert!(matches!(
            make_polygon(&[Point3::origin(), Point3::origin(), Point3::new(1.0, 0.0, 0.0)]),
            Err(PrimitiveError::DegenerateWire(_))
        ));
        assert!(matches!(
            make_polygon(&[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
            ]),
            Err(PrimitiveError::DegenerateWire(_))
        ));
    }

    #[test]
    fn test_face_rejects_non_planar_wire() {
        let wire = Loop::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.5),
            Point3::new(0.0, 1.0, 0.0),
        ]);
        assert!(matches!(make_face(wire), Err(PrimitiveError::NonPlanarWire(_))));
    }

    #[test]
    fn test_cylinder_facets() {
        let cyl = make_cylinder(5.0, 10.0, 32).unwrap();
        assert_eq!(cyl.faces.len(), 34); // 32 sides + 2 caps
        let curved = cyl
            .faces
            .iter()
            .filter(|f| f.surface.kind() == SurfaceKind::Cylinder)
            .count();
        assert_eq!(curved, 32);
        let exact = PI * 25.0 * 10.0;
        assert!((cyl.volume() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_tube_has_annular_caps() {
        let tube = make_tube(10.0, 6.0, 20.0, 48).unwrap();
        let caps: Vec<_> = tube.faces.iter().filter(|f| f.is_planar()).collect();
        assert_eq!(caps.len(), 2);
        assert!(caps.iter().all(|f| f.inners.len() == 1));
        let exact = PI * (100.0 - 36.0) * 20.0;
        assert!((tube.volume() - exact).abs() / exact < 0.01);
    }

    #[test]
    fn test_tube_rejects_inverted_radii() {
        assert!(make_tube(5.0, 6.0, 1.0, 16).is_err());
    }

    #[test]
    fn test_sphere_volume() {
        let sphere = make_sphere(1.0, 48, 24).unwrap();
        assert_eq!(sphere.faces.len(), 48 * 24);
        let exact = 4.0 / 3.0 * PI;
        assert!((sphere.volume() - exact).abs() / exact < 0.02);
        for f in &sphere.faces {
            let n = f.normal().unwrap();
            assert!(n.dot(&f.outer.centroid().coords) > 0.0);
        }
    }
}
