//! Error types for drafting and section views.

use tdraw_kernel_booleans::BooleanError;
use tdraw_kernel_primitives::PrimitiveError;
use thiserror::Error;

/// Errors raised by the drafting building blocks (projection, prism, HLR).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftError {
    /// A face passed for projection has no boundary.
    #[error("input Face is NULL")]
    NullFace,

    /// The shape has no geometry to measure.
    #[error("shape is empty")]
    EmptyShape,

    /// The view direction and x-axis do not span a frame.
    #[error("degenerate view frame: {0}")]
    DegenerateFrame(String),

    /// View scale must be strictly positive.
    #[error("invalid scale {0}")]
    InvalidScale(f64),

    /// Projection tolerance must be strictly positive.
    #[error("invalid tolerance {0}")]
    InvalidTolerance(f64),

    /// The cutting prism's base face or extrusion could not be built.
    #[error("projected face is NULL: {0}")]
    ProjectedFaceNull(#[source] PrimitiveError),

    /// A boolean operation failed.
    #[error(transparent)]
    Boolean(#[from] BooleanError),
}

/// Typed failure of a view recompute. Previous outputs are left untouched
/// whenever one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SectionError {
    /// No source object is linked.
    #[error("No Source object linked")]
    MissingSource,

    /// No base view is linked.
    #[error("No BaseView object linked")]
    MissingBaseView,

    /// The source is not a part feature.
    #[error("Source object is not a Part object")]
    SourceNotPart,

    /// The base view is not a projection view.
    #[error("BaseView object is not a DrawViewPart object")]
    BaseViewNotViewPart,

    /// The source part has no geometry.
    #[error("Linked shape object is empty")]
    EmptyShape,

    /// The source shape has faces but no solid to cut.
    #[error("Linked shape object has no solid")]
    NoSolid,

    /// The cutting prism could not be built.
    #[error("DrawViewSection - Projected face is NULL")]
    ProjectedFaceNull,

    /// The boolean cut did not complete.
    #[error("Section cut has failed")]
    CutFailed(#[source] BooleanError),

    /// Any later stage (centroid, mirror, HLR, face projection) failed.
    #[error("DVS building Section shape failed: {0}")]
    BuildFailed(#[from] DraftError),
}

/// Result type for drafting operations.
pub type Result<T> = std::result::Result<T, DraftError>;
