//! Public API types and entry point for boolean cuts.

use tdraw_kernel_math::{Plane, Tolerance};
use tdraw_kernel_topo::{Shape, Solid};
use thiserror::Error;
use tracing::debug;

use crate::clip::clip_shape;

/// Errors raised by boolean operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BooleanError {
    /// The operation could not be completed for this input.
    #[error("boolean operation not done: {0}")]
    NotDone(String),
    /// The tool solid is not supported by this cutter.
    #[error("unsupported tool: {0}")]
    UnsupportedTool(String),
}

/// Subtract a tool solid from a target shape.
///
/// Implementations must not mutate `target`; the result is a new shape
/// (possibly the null shape when nothing remains).
pub trait BooleanCutter: Send + Sync {
    /// Compute `target − tool`.
    fn cut(&self, target: &Shape, tool: &Solid) -> Result<Shape, BooleanError>;
}

/// Default cutter: subtracts a closed convex tool (such as an extruded
/// cutting prism) by half-space clipping.
#[derive(Debug, Clone, Copy)]
pub struct PrismCutter {
    /// Tolerances used for vertex classification and loop matching.
    pub tolerance: Tolerance,
}

impl PrismCutter {
    /// Create a cutter with the given tolerances.
    pub fn new(tolerance: Tolerance) -> Self {
        Self { tolerance }
    }
}

impl Default for PrismCutter {
    fn default() -> Self {
        Self::new(Tolerance::DEFAULT)
    }
}

/// Outward face planes of a closed convex solid.
fn convex_planes(tool: &Solid, tol: &Tolerance) -> Result<Vec<Plane>, BooleanError> {
    if tool.faces.len() < 4 {
        return Err(BooleanError::UnsupportedTool(format!(
            "tool has {} faces, a closed solid needs at least 4",
            tool.faces.len()
        )));
    }

    let mut planes = Vec::with_capacity(tool.faces.len());
    for face in &tool.faces {
        let (Some(normal), Some(plane)) = (face.normal(), face.plane()) else {
            return Err(BooleanError::UnsupportedTool("degenerate tool face".into()));
        };
        // Planar faces keep their surface plane, flipped to face outward.
        planes.push(if plane.normal().dot(&normal) < 0.0 {
            plane.reversed()
        } else {
            plane
        });
    }

    let scale = tool.bounding_box().diagonal().max(1.0);
    for plane in &planes {
        if tool
            .vertices()
            .any(|v| plane.signed_distance(v) > tol.linear * scale)
        {
            return Err(BooleanError::UnsupportedTool("tool is not convex".into()));
        }
    }
    Ok(planes)
}

impl BooleanCutter for PrismCutter {
    fn cut(&self, target: &Shape, tool: &Solid) -> Result<Shape, BooleanError> {
        let tol = &self.tolerance;
        let copy = target.clone();
        let planes = convex_planes(tool, tol)?;

        if !copy.bounding_box().overlaps(&tool.bounding_box()) {
            return Ok(copy);
        }

        // A tool plane binds when part of the target lies outside it.
        let binding: Vec<&Plane> = planes
            .iter()
            .filter(|plane| {
                copy.faces()
                    .flat_map(|f| f.vertices())
                    .any(|v| plane.signed_distance(v) > tol.linear)
            })
            .collect();

        match binding.as_slice() {
            [] => {
                debug!("target lies inside the tool, nothing remains");
                Ok(Shape::null())
            }
            [plane] => Ok(clip_shape(&copy, &plane.reversed(), tol)),
            many => Err(BooleanError::NotDone(format!(
                "target crosses {} tool faces",
                many.len()
            ))),
        }
    }
}
