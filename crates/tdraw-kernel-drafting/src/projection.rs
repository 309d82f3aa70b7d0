//! View frames and the transforms applied to shapes before projection.
//!
//! A [`ViewFrame`] is the projector of a drawing view: a centre, a view
//! direction pointing from the model toward the viewer, and an x-axis.
//! Points map to `(u, v)` along the x and y axes and to a depth along the
//! direction; larger depth is closer to the viewer.

use tdraw_kernel_math::{BoundBox3, Dir3, Point3, Transform, Vec3};
use tdraw_kernel_topo::Shape;

use crate::error::{DraftError, Result};
use crate::types::Point2D;

/// Projection frame of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewFrame {
    /// Origin of the 2D view coordinates.
    pub center: Point3,
    /// Unit view direction (toward the viewer).
    pub direction: Vec3,
    /// Unit x-axis of the view, perpendicular to `direction`.
    pub x_axis: Vec3,
    /// Unit y-axis, `direction × x_axis`.
    pub y_axis: Vec3,
}

impl ViewFrame {
    /// Build a frame. `x_axis` is made orthogonal to `direction`; a zero
    /// direction or an x-axis parallel to it is rejected.
    pub fn new(center: Point3, direction: Vec3, x_axis: Vec3) -> Result<Self> {
        let dn = direction.norm();
        if dn < f64::EPSILON {
            return Err(DraftError::DegenerateFrame("view direction is zero".into()));
        }
        let d = direction / dn;
        let x = x_axis - x_axis.dot(&d) * d;
        let xn = x.norm();
        if xn < 1e-9 * x_axis.norm().max(1.0) {
            return Err(DraftError::DegenerateFrame(
                "x direction is parallel to view direction".into(),
            ));
        }
        let x = x / xn;
        Ok(Self {
            center,
            direction: d,
            x_axis: x,
            y_axis: d.cross(&x),
        })
    }

    /// `(u, v, depth)` of a point in this frame.
    pub fn coordinates(&self, p: &Point3) -> Vec3 {
        let d = p - self.center;
        Vec3::new(
            d.dot(&self.x_axis),
            d.dot(&self.y_axis),
            d.dot(&self.direction),
        )
    }

    /// Project a point to 2D view coordinates.
    pub fn project_point(&self, p: &Point3) -> Point2D {
        let c = self.coordinates(p);
        Point2D::new(c.x, c.y)
    }

    /// Project a point and also return its depth.
    pub fn project_point_with_depth(&self, p: &Point3) -> (Point2D, f64) {
        let c = self.coordinates(p);
        (Point2D::new(c.x, c.y), c.z)
    }

    /// World point from frame coordinates.
    pub fn point_at(&self, u: f64, v: f64, depth: f64) -> Point3 {
        self.center + u * self.x_axis + v * self.y_axis + depth * self.direction
    }
}

/// Centre of a shape's bounding box measured in the view frame
/// `(direction, x_axis)`, mapped back to world coordinates.
pub fn find_centroid(shape: &Shape, direction: Vec3, x_axis: Vec3) -> Result<Point3> {
    let frame = ViewFrame::new(Point3::origin(), direction, x_axis)?;
    let local: Vec<Point3> = shape
        .faces()
        .flat_map(|f| f.vertices())
        .map(|p| Point3::from(frame.coordinates(p)))
        .collect();
    let bb = BoundBox3::from_points(local.iter());
    if !bb.is_valid() {
        return Err(DraftError::EmptyShape);
    }
    let c = bb.center();
    Ok(frame.point_at(c.x, c.y, c.z))
}

/// Mirror about the frame's XZ plane through its centre, then scale about
/// the centre. Applied identically to outline and section geometry.
pub fn mirror_transform(frame: &ViewFrame, scale: f64) -> Result<Transform> {
    if scale <= 0.0 || !scale.is_finite() {
        return Err(DraftError::InvalidScale(scale));
    }
    let mirror = Transform::mirror(&frame.center, &Dir3::new_normalize(frame.y_axis));
    Ok(Transform::uniform_scale_about(&frame.center, scale).then(&mirror))
}

/// Mirror and scale a shape for projection in `frame`.
pub fn mirror_shape(shape: &Shape, frame: &ViewFrame, scale: f64) -> Result<Shape> {
    Ok(shape.transformed(&mirror_transform(frame, scale)?))
}
