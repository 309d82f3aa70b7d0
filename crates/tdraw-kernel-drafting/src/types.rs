//! Core types for 2D drafting output.

use serde::{Deserialize, Serialize};
use tdraw_kernel_math::Point2;

/// A 2D point for serializable drafting output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point2D {
    /// Create a new 2D point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0).
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    /// Distance to another point.
    pub fn distance(&self, other: &Self) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Default for Point2D {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl From<Point2> for Point2D {
    fn from(p: Point2) -> Self {
        Self { x: p.x, y: p.y }
    }
}

impl From<Point2D> for Point2 {
    fn from(p: Point2D) -> Self {
        Point2::new(p.x, p.y)
    }
}

/// Visibility of an edge in the projected view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    /// Edge is visible (not occluded by any face).
    Visible,
    /// Edge is hidden (occluded by at least one face).
    Hidden,
}

/// Classification of a projected edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeType {
    /// Boundary edge between faces of different surfaces.
    Hard,
    /// Silhouette of a curved surface: boundary between front-facing and
    /// back-facing facets.
    Outline,
}

/// A 2D projected edge with visibility information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedEdge {
    /// Start point in 2D view coordinates.
    pub start: Point2D,
    /// End point in 2D view coordinates.
    pub end: Point2D,
    /// Visibility classification.
    pub visibility: Visibility,
    /// Type of edge.
    pub edge_type: EdgeType,
    /// Depth of the edge midpoint along the view direction (larger is
    /// closer to the viewer).
    pub depth: f64,
}

impl ProjectedEdge {
    /// Create a new projected edge.
    pub fn new(
        start: Point2D,
        end: Point2D,
        visibility: Visibility,
        edge_type: EdgeType,
        depth: f64,
    ) -> Self {
        Self {
            start,
            end,
            visibility,
            edge_type,
            depth,
        }
    }

    /// Length of the edge in 2D.
    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }

    /// Check if the edge is degenerate (zero length).
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.length() < tolerance
    }
}

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2D {
    /// Minimum X coordinate.
    pub min_x: f64,
    /// Minimum Y coordinate.
    pub min_y: f64,
    /// Maximum X coordinate.
    pub max_x: f64,
    /// Maximum Y coordinate.
    pub max_y: f64,
}

impl BoundingBox2D {
    /// Create an empty bounding box.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }

    /// Expand the bounding box to include a point.
    pub fn include_point(&mut self, p: Point2D) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Width of the bounding box.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Check if the bounding box is valid (non-empty).
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// Test if two boxes overlap, allowing a tolerance gap.
    pub fn overlaps(&self, other: &BoundingBox2D, tol: f64) -> bool {
        self.min_x <= other.max_x + tol
            && self.max_x >= other.min_x - tol
            && self.min_y <= other.max_y + tol
            && self.max_y >= other.min_y - tol
    }
}

impl Default for BoundingBox2D {
    fn default() -> Self {
        Self::empty()
    }
}

/// A complete projected view containing all edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectedView {
    /// All projected edges.
    pub edges: Vec<ProjectedEdge>,
    /// 2D bounding box of the projected view.
    pub bounds: BoundingBox2D,
}

impl ProjectedView {
    /// Create a new empty projected view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge and update the bounding box.
    pub fn add_edge(&mut self, edge: ProjectedEdge) {
        self.bounds.include_point(edge.start);
        self.bounds.include_point(edge.end);
        self.edges.push(edge);
    }

    /// Get only visible edges.
    pub fn visible_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges
            .iter()
            .filter(|e| e.visibility == Visibility::Visible)
    }

    /// Get only hidden edges.
    pub fn hidden_edges(&self) -> impl Iterator<Item = &ProjectedEdge> {
        self.edges
            .iter()
            .filter(|e| e.visibility == Visibility::Hidden)
    }

    /// Number of visible edges.
    pub fn num_visible(&self) -> usize {
        self.visible_edges().count()
    }

    /// Number of hidden edges.
    pub fn num_hidden(&self) -> usize {
        self.hidden_edges().count()
    }

    /// Count of edges with the given visibility and type.
    pub fn count(&self, visibility: Visibility, edge_type: EdgeType) -> usize {
        self.edges
            .iter()
            .filter(|e| e.visibility == visibility && e.edge_type == edge_type)
            .count()
    }
}

// ============================================================================
// Projected faces
// ============================================================================

/// A closed 2D polygon. The closing edge is implicit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedWire {
    /// Vertices in traversal order.
    pub points: Vec<Point2D>,
}

impl ProjectedWire {
    /// Create a wire from its vertices.
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Signed enclosed area (positive when counter-clockwise).
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        let mut acc = 0.0;
        for i in 0..n {
            let (a, b) = (self.points[i], self.points[(i + 1) % n]);
            acc += a.x * b.y - b.x * a.y;
        }
        acc * 0.5
    }

    /// Absolute enclosed area.
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    /// True if the wire winds counter-clockwise.
    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// The wire with the requested winding.
    pub fn oriented(mut self, ccw: bool) -> Self {
        if self.is_ccw() != ccw {
            self.points.reverse();
        }
        self
    }

    /// Wires are closed by construction once they have three vertices.
    pub fn is_closed(&self) -> bool {
        self.points.len() >= 3
    }

    /// Bounding box of the vertices.
    pub fn bounds(&self) -> BoundingBox2D {
        let mut bb = BoundingBox2D::empty();
        for p in &self.points {
            bb.include_point(*p);
        }
        bb
    }
}

/// A planar 2D face: one outer wire (counter-clockwise) and zero or more
/// holes (clockwise).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedFace {
    /// Outer boundary.
    pub outer: ProjectedWire,
    /// Holes.
    pub holes: Vec<ProjectedWire>,
}

impl ProjectedFace {
    /// Net area (outer minus holes).
    pub fn area(&self) -> f64 {
        self.outer.area() - self.holes.iter().map(ProjectedWire::area).sum::<f64>()
    }

    /// Outer wire followed by the holes.
    pub fn wires(&self) -> impl Iterator<Item = &ProjectedWire> {
        std::iter::once(&self.outer).chain(self.holes.iter())
    }

    /// Bounding box of the outer wire.
    pub fn bounds(&self) -> BoundingBox2D {
        self.outer.bounds()
    }
}

/// RGBA colour with components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Color {
    /// Create a colour from components.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Unpack a `0xRRGGBBAA` value.
    pub fn from_packed(packed: u32) -> Self {
        let channel = |shift: u32| ((packed >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(24),
            g: channel(16),
            b: channel(8),
            a: channel(0),
        }
    }

    /// Pack into `0xRRGGBBAA`.
    pub fn to_packed(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 24) | (channel(self.g) << 16) | (channel(self.b) << 8) | channel(self.a)
    }
}
