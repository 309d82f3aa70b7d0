//! Section view building blocks: cutting prism, section-plane face
//! intersection, and projection of cut faces into planar 2D faces.
//!
//! The cut itself is done by a [`BooleanCutter`](tdraw_kernel_booleans::BooleanCutter);
//! this module prepares its tool and post-processes its residual.

use tdraw_kernel_math::{BoundBox3, Plane, Point2, Tolerance};
use tdraw_kernel_primitives::{make_face, make_polygon, make_prism, PrimitiveError};
use tdraw_kernel_topo::{point_in_polygon, Face, Shape, Solid, Surface};
use tracing::debug;

use crate::edge_walker::EdgeWalker;
use crate::error::{DraftError, Result};
use crate::hidden_line::HlrAlgo;
use crate::projection::ViewFrame;
use crate::types::{Point2D, ProjectedFace, ProjectedWire};

// ============================================================================
// Cutting prism
// ============================================================================

/// Build the solid removed by a section cut: a square in `plane` large
/// enough to cover the projection of `bb`, extruded along the plane normal
/// up to the farthest box corner.
///
/// Fails with [`DraftError::ProjectedFaceNull`] if the base face or the
/// extrusion cannot be built, including when no part of `bb` lies on the
/// normal side of the plane.
pub fn build_cutting_prism(plane: &Plane, bb: &BoundBox3) -> Result<Solid> {
    let (x, y, n) = (plane.x_dir.as_ref(), plane.y_dir.as_ref(), plane.normal());

    let mut half_side: f64 = 0.0;
    let mut length = f64::NEG_INFINITY;
    for corner in bb.corners() {
        let offset = plane.project_point(&corner) - plane.origin;
        half_side = half_side
            .max(offset.dot(x).abs())
            .max(offset.dot(y).abs())
            .max(offset.dot(&n).abs())
            .max(offset.norm());
        length = length.max(plane.signed_distance(&corner));
    }
    debug!(half_side, length, "cutting prism");

    if length <= Tolerance::DEFAULT.linear {
        return Err(DraftError::ProjectedFaceNull(PrimitiveError::ZeroExtrusion));
    }

    let s = half_side;
    let square = [
        plane.point_at(-s, -s),
        plane.point_at(s, -s),
        plane.point_at(s, s),
        plane.point_at(-s, s),
    ];
    let mut face = make_polygon(&square)
        .and_then(make_face)
        .map_err(DraftError::ProjectedFaceNull)?;
    // The base carries the cutting plane itself so the cut caps land on it exactly.
    face.surface = Surface::Plane(plane.clone());
    make_prism(&face, n * length).map_err(DraftError::ProjectedFaceNull)
}

// ============================================================================
// Section-plane intersection
// ============================================================================

/// Planar faces of `shape` lying in `plane`, as a compound.
///
/// A face qualifies when its plane origin is within `tol.linear` of
/// `plane` and its axis is parallel to the plane normal; orientation is
/// ignored. Faces on curved surfaces never qualify.
pub fn find_section_plane_intersections(shape: &Shape, plane: &Plane, tol: &Tolerance) -> Shape {
    let faces: Vec<Face> = shape
        .faces()
        .filter(|face| match face.surface.as_plane() {
            Some(fp) => plane.contains(&fp.origin, tol.linear) && plane.is_parallel(fp, tol),
            None => false,
        })
        .cloned()
        .collect();
    debug!(faces = faces.len(), "section plane intersections");
    Shape::compound_of_faces(faces)
}

// ============================================================================
// Face projection
// ============================================================================

/// Project one (already mirrored and scaled) face through `frame` and
/// rebuild it as a planar 2D face.
///
/// Only visible hard edges are used. The largest wire becomes the
/// counter-clockwise outer boundary, every other wire a clockwise hole.
/// Returns `Ok(None)` when no closed wire survives.
pub fn project_face(
    face: &Face,
    frame: &ViewFrame,
    tolerance: f64,
) -> Result<Option<ProjectedFace>> {
    if face.is_null() {
        return Err(DraftError::NullFace);
    }
    if tolerance <= 0.0 || !tolerance.is_finite() {
        return Err(DraftError::InvalidTolerance(tolerance));
    }

    let mut hlr = HlrAlgo::new(frame.clone()).with_tolerance(tolerance);
    hlr.add_face(face);
    let result = hlr.hide();

    let edges: Vec<(Point2, Point2)> = result
        .visible_hard_edges()
        .map(|e| (Point2::from(e.start), Point2::from(e.end)))
        .collect();

    let mut walker = EdgeWalker::new(tolerance);
    walker.load_edges(&edges);
    if !walker.perform() {
        debug!(edges = edges.len(), "no closed wires in projected face");
        return Ok(None);
    }

    let mut wires = EdgeWalker::sort_strip(walker.result_no_dups(), true)
        .into_iter()
        .map(|w| ProjectedWire::new(w.points.into_iter().map(Point2D::from).collect()));
    let Some(outer) = wires.next() else {
        return Ok(None);
    };
    let outer = outer.oriented(true);

    let boundary: Vec<Point2> = outer.points.iter().map(|p| Point2::from(*p)).collect();
    let holes: Vec<ProjectedWire> = wires
        .map(|w| {
            let inside = w
                .points
                .first()
                .is_some_and(|p| point_in_polygon(&Point2::from(*p), &boundary));
            if !inside {
                debug!("extra outer contour carried as a hole");
            }
            w.oriented(false)
        })
        .collect();

    Ok(Some(ProjectedFace { outer, holes }))
}
