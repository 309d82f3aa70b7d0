//! Half-space clipping of polyhedral shapes.
//!
//! Clipping keeps the part of a shape where `plane.signed_distance(p) <= 0`
//! and discards the rest. Solids are closed again with planar cap faces built
//! from the cut edges; the caps lie on `plane` and face along its normal.

use std::collections::HashMap;

use rayon::prelude::*;
use tdraw_kernel_math::{Plane, Point2, Point3, Tolerance, Vec3};
use tdraw_kernel_topo::{point_in_polygon, point_key, Face, Loop, Shape, Solid, Surface};
use tracing::debug;

/// Directed edge `(start, end)`.
pub type Segment = (Point3, Point3);

/// Result of clipping one face.
#[derive(Debug, Clone, Default)]
pub struct FaceClip {
    /// Surviving pieces of the face, surface tag preserved.
    pub faces: Vec<Face>,
    /// Boundary pieces of the surviving faces lying on the clip plane,
    /// directed as the face boundary runs.
    pub cut_edges: Vec<Segment>,
}

/// Clip every face of a solid and close the result with cap faces.
///
/// Returns an empty solid when nothing survives.
pub fn clip_solid(solid: &Solid, plane: &Plane, tol: &Tolerance) -> Solid {
    let clips: Vec<FaceClip> = solid
        .faces
        .par_iter()
        .map(|face| clip_face(face, plane, tol))
        .collect();

    let mut faces = Vec::new();
    let mut cut_edges = Vec::new();
    for clip in clips {
        faces.extend(clip.faces);
        cut_edges.extend(clip.cut_edges);
    }
    faces.extend(build_caps(&cut_edges, plane, tol));
    Solid::new(faces)
}

/// Clip any shape. Solids get caps, loose faces are clipped individually.
pub fn clip_shape(shape: &Shape, plane: &Plane, tol: &Tolerance) -> Shape {
    match shape {
        Shape::Solid(s) => Shape::Solid(clip_solid(s, plane, tol)),
        Shape::Face(f) => Shape::compound_of_faces(clip_face(f, plane, tol).faces),
        Shape::Compound(items) => Shape::Compound(
            items
                .iter()
                .map(|s| clip_shape(s, plane, tol))
                .filter(|s| !s.is_null())
                .collect(),
        ),
    }
}

/// Signed distance with near-zero values snapped to exactly zero.
fn snapped_distance(plane: &Plane, p: &Point3, tol: &Tolerance) -> f64 {
    let d = plane.signed_distance(p);
    if tol.is_zero(d) {
        0.0
    } else {
        d
    }
}

/// Point where edge `a-b` crosses the plane. The endpoints are ordered
/// first so both faces sharing an edge compute identical points.
fn crossing(a: &Point3, da: f64, b: &Point3, db: f64) -> Point3 {
    let (p, dp, q, dq) = if (a.x, a.y, a.z) <= (b.x, b.y, b.z) {
        (a, da, b, db)
    } else {
        (b, db, a, da)
    };
    let t = dp / (dp - dq);
    p + (q - p) * t
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrossingKind {
    Exit,
    Entry,
}

/// Clip one face against the plane.
pub fn clip_face(face: &Face, plane: &Plane, tol: &Tolerance) -> FaceClip {
    let dist: Vec<Vec<f64>> = face
        .loops()
        .map(|l| {
            l.points
                .iter()
                .map(|p| snapped_distance(plane, p, tol))
                .collect()
        })
        .collect();
    let all = || dist.iter().flatten();

    if all().all(|&d| d == 0.0) {
        // Lies in the clip plane; the caps replace it.
        return FaceClip::default();
    }
    if all().all(|&d| d >= 0.0) {
        return FaceClip::default();
    }
    if all().all(|&d| d <= 0.0) {
        let cut_edges = face
            .loops()
            .zip(&dist)
            .flat_map(|(l, d)| {
                let n = l.len();
                (0..n)
                    .filter(move |&i| d[i] == 0.0 && d[(i + 1) % n] == 0.0)
                    .map(move |i| (l.points[i], l.points[(i + 1) % n]))
            })
            .collect();
        return FaceClip {
            faces: vec![face.clone()],
            cut_edges,
        };
    }

    let Some(normal) = face.normal() else {
        return FaceClip::default();
    };

    let mut kept: Vec<Segment> = Vec::new();
    let mut on_plane: Vec<Segment> = Vec::new();
    let mut crossings: Vec<(Point3, CrossingKind)> = Vec::new();

    for (l, d) in face.loops().zip(&dist) {
        let n = l.len();
        for i in 0..n {
            let j = (i + 1) % n;
            let (a, b) = (l.points[i], l.points[j]);
            let (da, db) = (d[i], d[j]);
            if da <= 0.0 && db <= 0.0 {
                kept.push((a, b));
                if da == 0.0 && db == 0.0 {
                    on_plane.push((a, b));
                }
            } else if da < 0.0 && db > 0.0 {
                let x = crossing(&a, da, &b, db);
                kept.push((a, x));
                crossings.push((x, CrossingKind::Exit));
            } else if da > 0.0 && db < 0.0 {
                let x = crossing(&a, da, &b, db);
                kept.push((x, b));
                crossings.push((x, CrossingKind::Entry));
            } else if da == 0.0 && db > 0.0 {
                crossings.push((a, CrossingKind::Exit));
            } else if da > 0.0 && db == 0.0 {
                crossings.push((b, CrossingKind::Entry));
            }
        }
    }

    cancel_touching(&mut crossings, tol);

    // Cut segments run along t with the kept region on their left.
    let t = normal.cross(&plane.normal());
    crossings.sort_by(|(p, _), (q, _)| {
        let (sp, sq) = ((p - plane.origin).dot(&t), (q - plane.origin).dot(&t));
        sp.total_cmp(&sq)
    });

    let mut cut_edges = on_plane;
    let mut k = 0;
    while k + 1 < crossings.len() {
        let (x, kx) = crossings[k];
        let (y, ky) = crossings[k + 1];
        if kx == CrossingKind::Exit && ky == CrossingKind::Entry {
            if !tol.points_equal(&x, &y) {
                kept.push((x, y));
                cut_edges.push((x, y));
            }
            k += 2;
        } else {
            debug!("unpaired section crossing at {:?}", x);
            k += 1;
        }
    }

    let loops = chain_segments(&kept, tol);
    let faces = assemble_faces(loops, &normal, tol)
        .into_iter()
        .map(|(outer, inners)| Face::new(face.surface.clone(), outer, inners))
        .collect();

    FaceClip { faces, cut_edges }
}

/// Drop entry/exit pairs at the same point (a vertex touching the plane from
/// the removed side).
fn cancel_touching(crossings: &mut Vec<(Point3, CrossingKind)>, tol: &Tolerance) {
    let mut i = 0;
    while i < crossings.len() {
        let partner = (0..crossings.len()).find(|&j| {
            j != i
                && crossings[j].1 != crossings[i].1
                && tol.points_equal(&crossings[j].0, &crossings[i].0)
        });
        match partner {
            Some(j) => {
                let (hi, lo) = if i > j { (i, j) } else { (j, i) };
                crossings.remove(hi);
                crossings.remove(lo);
                i = lo;
            }
            None => i += 1,
        }
    }
}

/// Chain directed segments into closed loops by matching endpoints.
///
/// Chains that do not close are dropped.
pub fn chain_segments(segments: &[Segment], tol: &Tolerance) -> Vec<Loop> {
    let key = |p: &Point3| point_key(p, tol.linear);
    let mut by_start: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        if key(a) == key(b) {
            continue;
        }
        by_start.entry(key(a)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut loops = Vec::new();

    for start in 0..segments.len() {
        if used[start] || key(&segments[start].0) == key(&segments[start].1) {
            continue;
        }
        let start_key = key(&segments[start].0);
        let mut points = vec![segments[start].0];
        used[start] = true;
        let mut current = segments[start].1;
        let mut closed = false;

        loop {
            let ck = key(&current);
            if ck == start_key {
                closed = true;
                break;
            }
            points.push(current);
            let next = by_start
                .get(&ck)
                .and_then(|cands| cands.iter().copied().find(|&i| !used[i]));
            match next {
                Some(i) => {
                    used[i] = true;
                    current = segments[i].1;
                }
                None => break,
            }
        }

        if closed && points.len() >= 3 {
            loops.push(Loop::new(points));
        } else {
            debug!("dropping open chain of {} points", points.len());
        }
    }

    loops
}

/// Remove pairs of opposite segments (`a→b` with `b→a`).
fn cancel_opposite(segments: &[Segment], tol: &Tolerance) -> Vec<Segment> {
    let key = |p: &Point3| point_key(p, tol.linear);
    let mut alive = vec![true; segments.len()];
    let mut index: HashMap<_, Vec<usize>> = HashMap::new();
    for (i, (a, b)) in segments.iter().enumerate() {
        index.entry((key(a), key(b))).or_default().push(i);
    }
    for (i, (a, b)) in segments.iter().enumerate() {
        if !alive[i] {
            continue;
        }
        if let Some(cands) = index.get(&(key(b), key(a))) {
            if let Some(&j) = cands.iter().find(|&&j| alive[j] && j != i) {
                alive[i] = false;
                alive[j] = false;
            }
        }
    }
    segments
        .iter()
        .zip(alive)
        .filter_map(|(s, keep)| keep.then_some(*s))
        .collect()
}

/// Split loops into outer boundaries (counter-clockwise about `normal`) and
/// holes, assigning each hole to the smallest outer loop containing it.
pub fn assemble_faces(loops: Vec<Loop>, normal: &Vec3, tol: &Tolerance) -> Vec<(Loop, Vec<Loop>)> {
    let min_area = tol.linear * tol.linear;
    let frame = Plane::from_normal(Point3::origin(), *normal);

    let mut outers: Vec<(Loop, f64, Vec<Point2>, Vec<Loop>)> = Vec::new();
    let mut holes = Vec::new();
    for l in loops {
        let signed = l.area_vector().dot(normal);
        if signed > min_area {
            let poly = l.to_plane_coords(&frame);
            outers.push((l, signed, poly, Vec::new()));
        } else if signed < -min_area {
            holes.push(l);
        } else {
            debug!("dropping zero-area loop of {} points", l.len());
        }
    }

    for hole in holes {
        let probe = frame.project(&hole.points[0]);
        let host = outers
            .iter_mut()
            .filter(|(_, _, poly, _)| point_in_polygon(&probe, poly))
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match host {
            Some((_, _, _, inners)) => inners.push(hole),
            None => debug!("dropping hole with no enclosing boundary"),
        }
    }

    outers
        .into_iter()
        .map(|(outer, _, _, inners)| (outer, inners))
        .collect()
}

/// Build planar cap faces on `plane` from the cut edges of the kept faces.
pub fn build_caps(cut_edges: &[Segment], plane: &Plane, tol: &Tolerance) -> Vec<Face> {
    let reversed: Vec<Segment> = cut_edges.iter().map(|(a, b)| (*b, *a)).collect();
    let segments = cancel_opposite(&reversed, tol);
    let loops = chain_segments(&segments, tol);
    let normal = plane.normal();
    assemble_faces(loops, &normal, tol)
        .into_iter()
        .map(|(outer, inners)| Face::new(Surface::Plane(plane.clone()), outer, inners))
        .collect()
}
