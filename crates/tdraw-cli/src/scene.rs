//! Scene files: a part, the view it is drawn in, and the section to take.
//!
//! ```toml
//! [part]
//! name = "Sleeve"
//! translation = [0.0, 0.0, -1.0]
//!
//! [part.shape]
//! type = "tube"
//! outer_radius = 2.0
//! inner_radius = 1.0
//! height = 2.0
//!
//! [view]
//! direction = [0.0, 0.0, 1.0]
//! symbol = "A"
//!
//! [section]
//! origin = [0.0, 0.0, 0.0]
//! normal = [0.0, 0.0, 1.0]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tdraw_kernel_drafting::{DrawViewPart, DrawViewSection, PartFeature, Preferences};
use tdraw_kernel_math::{Point3, Transform, Vec3};
use tdraw_kernel_primitives::{
    make_box, make_cube, make_cylinder, make_sphere, make_tube, PrimitiveError,
};
use tdraw_kernel_topo::Solid;

fn default_segments() -> u32 {
    32
}

fn default_rings() -> u32 {
    16
}

/// Primitive solid of a scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ShapeSpec {
    /// Axis-aligned box between two corners.
    Box {
        /// Minimum corner.
        min: [f64; 3],
        /// Maximum corner.
        max: [f64; 3],
    },
    /// Box with one corner at the origin.
    Cube {
        /// Size along each axis.
        size: [f64; 3],
    },
    /// Cylinder along Z, base at z = 0.
    Cylinder {
        /// Radius.
        radius: f64,
        /// Height.
        height: f64,
        /// Facets around the axis.
        #[serde(default = "default_segments")]
        segments: u32,
    },
    /// Hollow cylinder along Z, base at z = 0.
    Tube {
        /// Outer radius.
        outer_radius: f64,
        /// Inner radius.
        inner_radius: f64,
        /// Height.
        height: f64,
        /// Facets around the axis.
        #[serde(default = "default_segments")]
        segments: u32,
    },
    /// Sphere centred at the origin.
    Sphere {
        /// Radius.
        radius: f64,
        /// Longitudinal divisions.
        #[serde(default = "default_segments")]
        segments: u32,
        /// Latitudinal bands.
        #[serde(default = "default_rings")]
        rings: u32,
    },
}

impl ShapeSpec {
    /// Build the solid.
    pub fn build(&self) -> Result<Solid, PrimitiveError> {
        match *self {
            ShapeSpec::Box { min, max } => Ok(make_box(point(min), point(max))),
            ShapeSpec::Cube { size } => Ok(make_cube(size[0], size[1], size[2])),
            ShapeSpec::Cylinder {
                radius,
                height,
                segments,
            } => make_cylinder(radius, height, segments),
            ShapeSpec::Tube {
                outer_radius,
                inner_radius,
                height,
                segments,
            } => make_tube(outer_radius, inner_radius, height, segments),
            ShapeSpec::Sphere {
                radius,
                segments,
                rings,
            } => make_sphere(radius, segments, rings),
        }
    }
}

/// The part to draw.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PartSpec {
    /// Object name.
    #[serde(default = "PartSpec::default_name")]
    pub name: String,
    /// Offset applied after building the shape.
    #[serde(default)]
    pub translation: Option<[f64; 3]>,
    /// Shape definition.
    pub shape: ShapeSpec,
}

impl PartSpec {
    fn default_name() -> String {
        "Part".to_string()
    }

    /// Build the translated solid.
    pub fn solid(&self) -> Result<Solid> {
        let solid = self
            .shape
            .build()
            .with_context(|| format!("failed to build part '{}'", self.name))?;
        Ok(match self.translation {
            Some([dx, dy, dz]) => solid.transformed(&Transform::translation(dx, dy, dz)),
            None => solid,
        })
    }
}

/// Parent projection view settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewSpec {
    /// View direction (toward the viewer).
    pub direction: [f64; 3],
    /// View x-axis.
    pub x_direction: [f64; 3],
    /// Drawing scale.
    pub scale: f64,
    /// Section symbol.
    pub symbol: String,
}

impl Default for ViewSpec {
    fn default() -> Self {
        Self {
            direction: [0.0, 0.0, 1.0],
            x_direction: [1.0, 0.0, 0.0],
            scale: 1.0,
            symbol: "A".to_string(),
        }
    }
}

/// Section plane settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SectionSpec {
    /// Point on the plane.
    pub origin: [f64; 3],
    /// Plane normal; the part on this side is removed.
    pub normal: [f64; 3],
    /// Whether cut faces are shown.
    pub show_cut_surface: bool,
}

impl Default for SectionSpec {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            normal: [0.0, 0.0, 1.0],
            show_cut_surface: true,
        }
    }
}

/// A complete scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scene {
    /// Part to cut.
    pub part: PartSpec,
    /// Parent view.
    #[serde(default)]
    pub view: ViewSpec,
    /// Section plane.
    #[serde(default)]
    pub section: SectionSpec,
}

fn point(v: [f64; 3]) -> Point3 {
    Point3::new(v[0], v[1], v[2])
}

fn vector(v: [f64; 3]) -> Vec3 {
    Vec3::new(v[0], v[1], v[2])
}

impl Scene {
    /// Parse a scene from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid scene")
    }

    /// Load a scene file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scene {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Set up the part, its base view and a section view. The section view
    /// still has to be executed.
    pub fn build_section(&self, prefs: &dyn Preferences) -> Result<DrawViewSection> {
        let part = Arc::new(PartFeature::new(self.part.name.clone(), self.part.solid()?));

        let mut base = DrawViewPart::new("View");
        base.set_source(Some(part.clone()));
        base.set_direction(vector(self.view.direction));
        base.set_x_direction(vector(self.view.x_direction));
        base.set_scale(self.view.scale);
        base.set_symbol_section(self.view.symbol.clone());

        let mut section = DrawViewSection::new("Section", prefs);
        let view = section.view_part_mut();
        view.set_source(Some(part));
        view.set_direction(vector(self.view.direction));
        view.set_x_direction(vector(self.view.x_direction));
        view.set_scale(self.view.scale);
        section.set_base_view(Some(Arc::new(base)));
        section.set_section_origin(point(self.section.origin));
        section.set_section_normal(vector(self.section.normal));
        section.set_show_cut_surface(self.section.show_cut_surface);
        Ok(section)
    }
}
