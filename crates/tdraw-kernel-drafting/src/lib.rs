#![warn(missing_docs)]

//! 2D drafting views for the tdraw kernel.
//!
//! This crate turns solids into drawing geometry:
//!
//! - **Projection**: view frames, the mirror/scale transform applied before
//!   projection, and bounding-box centroids in view space
//! - **Hidden line removal**: hard and outline edges split into visible and
//!   hidden pieces
//! - **Section views**: cutting prism, boolean cut, faces in the section
//!   plane, and their reconstruction as planar 2D faces
//! - **Views**: [`DrawViewPart`] and [`DrawViewSection`] with touched
//!   property tracking and all-or-nothing recompute
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tdraw_kernel_drafting::{DrawViewPart, DrawViewSection, MemoryPreferences, PartFeature};
//! use tdraw_kernel_math::Point3;
//! use tdraw_kernel_primitives::make_box;
//!
//! let part = Arc::new(PartFeature::new(
//!     "Block",
//!     make_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0)),
//! ));
//! let mut base = DrawViewPart::new("Front");
//! base.set_source(Some(part.clone()));
//!
//! let mut section = DrawViewSection::new("Section", &MemoryPreferences::new());
//! section.view_part_mut().set_source(Some(part));
//! section.set_base_view(Some(Arc::new(base)));
//! section.execute()?;
//!
//! for face in section.section_faces() {
//!     println!("cut face area {:.3}", face.area());
//! }
//! ```

pub mod edge_walker;
pub mod error;
pub mod geometry;
pub mod hidden_line;
pub mod prefs;
pub mod projection;
pub mod section;
pub mod types;
pub mod view;

// Re-export main types and functions for convenience
pub use edge_walker::{EdgeWalker, WalkerWire};
pub use error::{DraftError, SectionError};
pub use geometry::{face_geometry, fit_circle, wire_geometry, BaseGeom, GeomFace, GeomWire};
pub use hidden_line::{project_shape, HlrAlgo, HlrResult, DEFAULT_HLR_TOLERANCE};
pub use prefs::{
    cut_surface_color, MemoryPreferences, Preferences, PrefsError, DEFAULT_CUT_SURFACE_COLOR,
};
pub use projection::{find_centroid, mirror_shape, mirror_transform, ViewFrame};
pub use section::{build_cutting_prism, find_section_plane_intersections, project_face};
pub use types::{
    BoundingBox2D, Color, EdgeType, Point2D, ProjectedEdge, ProjectedFace, ProjectedView,
    ProjectedWire, Visibility,
};
pub use view::{DocumentObject, DrawViewPart, DrawViewSection, Link, PartFeature, Property};

#[cfg(test)]
mod tests {
    use super::*;
    use tdraw_kernel_math::{Point3, Vec3};
    use tdraw_kernel_primitives::make_cylinder;
    use tdraw_kernel_topo::Shape;

    #[test]
    fn test_full_workflow() {
        let shape: Shape = make_cylinder(1.0, 2.0, 32).unwrap().into();
        let frame = ViewFrame::new(Point3::new(0.0, 0.0, 1.0), Vec3::y(), Vec3::x()).unwrap();
        let view = project_shape(&mirror_shape(&shape, &frame, 1.0).unwrap(), &frame);

        assert!(view.bounds.is_valid(), "Bounds should be valid");
        assert!((view.bounds.width() - 2.0).abs() < 1e-2, "Width should be ~2.0");
        assert!((view.bounds.height() - 2.0).abs() < 1e-9, "Height should be 2.0");
        assert_eq!(view.count(Visibility::Visible, EdgeType::Outline), 2);
    }

    #[test]
    fn test_projected_face_serializes() {
        let face = ProjectedFace {
            outer: ProjectedWire::new(vec![
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(0.0, 1.0),
            ]),
            holes: Vec::new(),
        };
        let geom = face_geometry(&face, DEFAULT_HLR_TOLERANCE);
        let json = serde_json::to_string(&geom).unwrap();
        assert!(json.contains("\"type\":\"Line\""));
        let back: GeomFace = serde_json::from_str(&json).unwrap();
        assert_eq!(back, geom);
    }
}
