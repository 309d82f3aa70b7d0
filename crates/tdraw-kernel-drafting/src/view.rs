//! Drawing view objects: a plain projection view and a section view.
//!
//! Views hold typed properties. Setting a property to a different value
//! marks it touched; [`DrawViewPart::must_execute`] and
//! [`DrawViewSection::must_execute`] report whether a touched property is a
//! recompute trigger. A successful `execute` replaces the outputs and
//! clears the touched set; a failed one leaves the previous outputs alone.

use std::collections::BTreeSet;
use std::sync::Arc;

use tdraw_kernel_booleans::{BooleanCutter, PrismCutter};
use tdraw_kernel_math::{perpendicular_to, Plane, Point3, Tolerance, Vec3};
use tdraw_kernel_topo::Shape;
use tracing::{debug, info, instrument, warn};

use crate::error::{DraftError, SectionError};
use crate::geometry::{face_geometry, GeomFace};
use crate::hidden_line::{HlrAlgo, DEFAULT_HLR_TOLERANCE};
use crate::prefs::{cut_surface_color, Preferences};
use crate::projection::{find_centroid, mirror_transform, ViewFrame};
use crate::section::{build_cutting_prism, find_section_plane_intersections, project_face};
use crate::types::{Color, ProjectedFace, ProjectedView};

/// An object that can be linked from a view.
pub trait DocumentObject: Send + Sync {
    /// Object name, unique within its document.
    fn name(&self) -> &str;

    /// The object as a part feature, if it is one.
    fn as_part(&self) -> Option<&PartFeature> {
        None
    }

    /// The object as a projection view, if it is one.
    fn as_view_part(&self) -> Option<&DrawViewPart> {
        None
    }
}

/// A linked document object.
pub type Link = Option<Arc<dyn DocumentObject>>;

fn same_link(a: &Link, b: &Link) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A solid part in the document.
#[derive(Debug, Clone)]
pub struct PartFeature {
    /// Object name.
    pub name: String,
    /// The part geometry.
    pub shape: Shape,
}

impl PartFeature {
    /// Create a part feature.
    pub fn new(name: impl Into<String>, shape: impl Into<Shape>) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
        }
    }
}

impl DocumentObject for PartFeature {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_part(&self) -> Option<&PartFeature> {
        Some(self)
    }
}

/// View properties that can be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    /// Linked part.
    Source,
    /// View direction.
    Direction,
    /// View x-axis.
    XDirection,
    /// Drawing scale.
    Scale,
    /// Linear tolerance for projection.
    Tolerance,
    /// Symbol used to name sections of this view.
    SymbolSection,
    /// Display label.
    Label,
    /// Point on the section plane.
    SectionOrigin,
    /// Section plane normal.
    SectionNormal,
    /// Whether cut faces are shown.
    ShowCutSurface,
    /// Fill colour of cut faces.
    CutSurfaceColor,
    /// Linked parent view.
    BaseView,
}

impl Property {
    /// True if touching this property requires a recompute.
    pub fn triggers_recompute(self) -> bool {
        !matches!(self, Property::Label | Property::SymbolSection)
    }
}

// ============================================================================
// Projection view
// ============================================================================

/// A projection view of a part.
pub struct DrawViewPart {
    name: String,
    source: Link,
    direction: Vec3,
    x_direction: Vec3,
    scale: f64,
    tolerance: f64,
    symbol_section: String,
    label: String,
    geometry: Option<ProjectedView>,
    touched: BTreeSet<Property>,
}

impl DrawViewPart {
    /// Create a view looking down `-Z` (direction `(0, 0, 1)`) at scale 1.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            source: None,
            direction: Vec3::z(),
            x_direction: Vec3::x(),
            scale: 1.0,
            tolerance: DEFAULT_HLR_TOLERANCE,
            symbol_section: "A".to_string(),
            geometry: None,
            touched: BTreeSet::new(),
        }
    }

    fn touch(&mut self, property: Property, changed: bool) {
        if changed {
            self.touched.insert(property);
        }
    }

    /// Link the part to project.
    pub fn set_source(&mut self, source: Link) {
        let changed = !same_link(&self.source, &source);
        self.source = source;
        self.touch(Property::Source, changed);
    }

    /// Set the view direction (toward the viewer).
    pub fn set_direction(&mut self, direction: Vec3) {
        let changed = self.direction != direction;
        self.direction = direction;
        self.touch(Property::Direction, changed);
    }

    /// Set the view x-axis.
    pub fn set_x_direction(&mut self, x_direction: Vec3) {
        let changed = self.x_direction != x_direction;
        self.x_direction = x_direction;
        self.touch(Property::XDirection, changed);
    }

    /// Set the drawing scale.
    pub fn set_scale(&mut self, scale: f64) {
        let changed = self.scale != scale;
        self.scale = scale;
        self.touch(Property::Scale, changed);
    }

    /// Set the projection tolerance.
    pub fn set_tolerance(&mut self, tolerance: f64) {
        let changed = self.tolerance != tolerance;
        self.tolerance = tolerance;
        self.touch(Property::Tolerance, changed);
    }

    /// Set the section symbol.
    pub fn set_symbol_section(&mut self, symbol: impl Into<String>) {
        let symbol = symbol.into();
        let changed = self.symbol_section != symbol;
        self.symbol_section = symbol;
        self.touch(Property::SymbolSection, changed);
    }

    /// Set the display label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        let changed = self.label != label;
        self.label = label;
        self.touch(Property::Label, changed);
    }

    /// Linked source.
    pub fn source(&self) -> &Link {
        &self.source
    }

    /// View direction.
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// View x-axis as set (see [`valid_x_direction`](Self::valid_x_direction)).
    pub fn x_direction(&self) -> Vec3 {
        self.x_direction
    }

    /// Drawing scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Projection tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Section symbol.
    pub fn symbol_section(&self) -> &str {
        &self.symbol_section
    }

    /// Display label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Outline projection from the last successful recompute.
    pub fn geometry(&self) -> Option<&ProjectedView> {
        self.geometry.as_ref()
    }

    /// Touched properties.
    pub fn touched(&self) -> &BTreeSet<Property> {
        &self.touched
    }

    /// True if a recompute trigger is touched or nothing was computed yet.
    pub fn must_execute(&self) -> bool {
        self.geometry.is_none() || self.touched.iter().any(|p| p.triggers_recompute())
    }

    /// The x-direction, replaced by a perpendicular one when it is zero or
    /// parallel to the view direction.
    pub fn valid_x_direction(&self) -> Vec3 {
        let parallel = self.x_direction.cross(&self.direction).norm()
            <= 1e-9 * self.x_direction.norm() * self.direction.norm();
        if self.x_direction.norm() < f64::EPSILON || parallel {
            let replacement = perpendicular_to(&self.direction);
            warn!(
                view = %self.name,
                "XDirection {:?} is invalid for direction {:?}, using {:?}",
                self.x_direction.as_slice(),
                self.direction.as_slice(),
                replacement.as_slice()
            );
            return replacement;
        }
        self.x_direction
    }

    /// Project an already mirrored and scaled shape with hidden line
    /// removal, in the frame of this view centred at `center`.
    pub fn build_geometry(
        &self,
        shape: &Shape,
        center: Point3,
    ) -> Result<ProjectedView, DraftError> {
        let frame = ViewFrame::new(center, self.direction, self.valid_x_direction())?;
        self.project_outline(shape, frame)
    }

    fn project_outline(
        &self,
        shape: &Shape,
        frame: ViewFrame,
    ) -> Result<ProjectedView, DraftError> {
        let mut hlr = HlrAlgo::new(frame).with_tolerance(self.checked_tolerance()?);
        hlr.add(shape);
        Ok(hlr.hide().into_view())
    }

    /// The projection tolerance, if it is strictly positive.
    fn checked_tolerance(&self) -> Result<f64, DraftError> {
        if self.tolerance <= 0.0 || !self.tolerance.is_finite() {
            return Err(DraftError::InvalidTolerance(self.tolerance));
        }
        Ok(self.tolerance)
    }

    fn source_shape(&self) -> Result<Shape, SectionError> {
        let source = self.source.as_ref().ok_or(SectionError::MissingSource)?;
        let part = source.as_part().ok_or(SectionError::SourceNotPart)?;
        if part.shape.is_null() {
            return Err(SectionError::EmptyShape);
        }
        if !part.shape.has_solids() {
            return Err(SectionError::NoSolid);
        }
        Ok(part.shape.clone())
    }

    /// Recompute the outline projection of the source part.
    #[instrument(skip_all, fields(view = %self.name))]
    pub fn execute(&mut self) -> Result<(), SectionError> {
        let shape = self.source_shape()?;
        self.checked_tolerance()?;
        let x_direction = self.valid_x_direction();
        let center = find_centroid(&shape, self.direction, x_direction)?;
        let frame = ViewFrame::new(center, self.direction, x_direction)?;
        let mirrored = shape.transformed(&mirror_transform(&frame, self.scale)?);
        let geometry = self.project_outline(&mirrored, frame)?;
        debug!(
            visible = geometry.num_visible(),
            hidden = geometry.num_hidden(),
            "projected"
        );

        self.geometry = Some(geometry);
        self.touched.clear();
        Ok(())
    }
}

impl DocumentObject for DrawViewPart {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_view_part(&self) -> Option<&DrawViewPart> {
        Some(self)
    }
}

// ============================================================================
// Section view
// ============================================================================

/// A section view: the part behind a cutting plane, projected along the
/// view direction, plus the faces cut by the plane.
pub struct DrawViewSection {
    view: DrawViewPart,
    base_view: Link,
    section_origin: Point3,
    section_normal: Vec3,
    show_cut_surface: bool,
    cut_surface_color: Color,
    cutter: Box<dyn BooleanCutter>,
    section_shape: Option<Shape>,
    section_faces: Vec<ProjectedFace>,
    touched: BTreeSet<Property>,
}

impl DrawViewSection {
    /// Create a section view. The cut surface colour is read from `prefs`.
    pub fn new(name: impl Into<String>, prefs: &dyn Preferences) -> Self {
        Self {
            view: DrawViewPart::new(name),
            base_view: None,
            section_origin: Point3::origin(),
            section_normal: Vec3::z(),
            show_cut_surface: true,
            cut_surface_color: cut_surface_color(prefs),
            cutter: Box::new(PrismCutter::default()),
            section_shape: None,
            section_faces: Vec::new(),
            touched: BTreeSet::new(),
        }
    }

    /// Inherited projection properties.
    pub fn view_part(&self) -> &DrawViewPart {
        &self.view
    }

    /// Mutable access to the inherited projection properties.
    pub fn view_part_mut(&mut self) -> &mut DrawViewPart {
        &mut self.view
    }

    /// Replace the boolean cutter.
    pub fn set_cutter(&mut self, cutter: Box<dyn BooleanCutter>) {
        self.cutter = cutter;
    }

    fn touch(&mut self, property: Property, changed: bool) {
        if changed {
            self.touched.insert(property);
        }
    }

    /// Link the parent view the section is taken from.
    pub fn set_base_view(&mut self, base_view: Link) {
        let changed = !same_link(&self.base_view, &base_view);
        self.base_view = base_view;
        self.touch(Property::BaseView, changed);
    }

    /// Set a point on the section plane.
    pub fn set_section_origin(&mut self, origin: Point3) {
        let changed = self.section_origin != origin;
        self.section_origin = origin;
        self.touch(Property::SectionOrigin, changed);
    }

    /// Set the section plane normal. The part on the normal side is removed.
    pub fn set_section_normal(&mut self, normal: Vec3) {
        let changed = self.section_normal != normal;
        self.section_normal = normal;
        self.touch(Property::SectionNormal, changed);
    }

    /// Show or hide the cut surface.
    pub fn set_show_cut_surface(&mut self, show: bool) {
        let changed = self.show_cut_surface != show;
        self.show_cut_surface = show;
        self.touch(Property::ShowCutSurface, changed);
    }

    /// Set the cut surface fill colour.
    pub fn set_cut_surface_color(&mut self, color: Color) {
        let changed = self.cut_surface_color != color;
        self.cut_surface_color = color;
        self.touch(Property::CutSurfaceColor, changed);
    }

    /// Linked base view.
    pub fn base_view(&self) -> &Link {
        &self.base_view
    }

    /// Point on the section plane (after any substitution by `execute`).
    pub fn section_origin(&self) -> Point3 {
        self.section_origin
    }

    /// Section plane normal.
    pub fn section_normal(&self) -> Vec3 {
        self.section_normal
    }

    /// Whether cut faces are shown.
    pub fn show_cut_surface(&self) -> bool {
        self.show_cut_surface
    }

    /// Cut surface fill colour.
    pub fn cut_surface_color(&self) -> Color {
        self.cut_surface_color
    }

    /// Touched section properties (inherited ones live on
    /// [`view_part`](Self::view_part)).
    pub fn touched(&self) -> &BTreeSet<Property> {
        &self.touched
    }

    /// True if any section or inherited recompute trigger is touched, or
    /// nothing was computed yet.
    pub fn must_execute(&self) -> bool {
        self.touched.iter().any(|p| p.triggers_recompute()) || self.view.must_execute()
    }

    /// Outline projection of the part behind the plane.
    pub fn geometry(&self) -> Option<&ProjectedView> {
        self.view.geometry()
    }

    /// Faces of the cut part lying in the section plane, in model space.
    pub fn section_shape(&self) -> Option<&Shape> {
        self.section_shape.as_ref()
    }

    /// Projected cut faces.
    pub fn section_faces(&self) -> &[ProjectedFace] {
        &self.section_faces
    }

    /// Drawing curves of the projected cut faces.
    pub fn face_geometry(&self) -> Vec<GeomFace> {
        self.section_faces
            .iter()
            .map(|f| face_geometry(f, self.view.tolerance))
            .collect()
    }

    /// Projected cut faces with their fill colour, when the cut surface is
    /// shown.
    pub fn cut_surface(&self) -> Option<(&[ProjectedFace], Color)> {
        self.show_cut_surface
            .then_some((self.section_faces.as_slice(), self.cut_surface_color))
    }

    /// Validate links and return the part shape and the base view symbol.
    fn linked_inputs(&self) -> Result<(Shape, String), SectionError> {
        let source = self.view.source.as_ref().ok_or(SectionError::MissingSource)?;
        let base = self.base_view.as_ref().ok_or(SectionError::MissingBaseView)?;
        let part = source.as_part().ok_or(SectionError::SourceNotPart)?;
        let base = base
            .as_view_part()
            .ok_or(SectionError::BaseViewNotViewPart)?;
        if part.shape.is_null() {
            return Err(SectionError::EmptyShape);
        }
        if !part.shape.has_solids() {
            return Err(SectionError::NoSolid);
        }
        Ok((part.shape.clone(), base.symbol_section().to_string()))
    }

    /// Recompute the section view.
    #[instrument(skip_all, fields(view = %self.view.name))]
    pub fn execute(&mut self) -> Result<(), SectionError> {
        let (shape, symbol) = self.linked_inputs()?;
        let tolerance = self.view.checked_tolerance()?;
        let bb = shape.bounding_box();
        if !bb.is_valid() {
            return Err(SectionError::EmptyShape);
        }

        if !bb.contains_strict(&self.section_origin) {
            let center = bb.center();
            warn!(
                "section origin {:?} is outside the part, using {:?}",
                self.section_origin.coords.as_slice(),
                center.coords.as_slice()
            );
            self.set_section_origin(center);
        }

        if self.section_normal.norm() < f64::EPSILON {
            return Err(SectionError::BuildFailed(DraftError::DegenerateFrame(
                "section normal is zero".into(),
            )));
        }
        let plane = Plane::from_normal(self.section_origin, self.section_normal);

        let prism =
            build_cutting_prism(&plane, &bb).map_err(|_| SectionError::ProjectedFaceNull)?;
        let residual = self
            .cutter
            .cut(&shape, &prism)
            .map_err(SectionError::CutFailed)?;
        let section = find_section_plane_intersections(&residual, &plane, &Tolerance::DEFAULT);

        let direction = self.view.direction;
        let x_direction = self.view.valid_x_direction();
        let center = find_centroid(&residual, direction, x_direction)?;
        let frame = ViewFrame::new(center, direction, x_direction)?;
        let transform = mirror_transform(&frame, self.view.scale)?;

        let outline = self
            .view
            .project_outline(&residual.transformed(&transform), frame.clone())?;

        let mut faces = Vec::new();
        for face in section.transformed(&transform).faces() {
            if let Some(projected) = project_face(face, &frame, tolerance)? {
                faces.push(projected);
            }
        }
        info!(
            outline_edges = outline.edges.len(),
            section_faces = faces.len(),
            "section built"
        );

        self.view.geometry = Some(outline);
        self.section_shape = Some(section);
        self.section_faces = faces;

        let label = format!("Section {symbol}-{symbol}");
        if self.view.label != label {
            self.view.set_label(label);
        }

        self.touched.clear();
        self.view.touched.clear();
        Ok(())
    }
}

impl DocumentObject for DrawViewSection {
    fn name(&self) -> &str {
        &self.view.name
    }

    fn as_view_part(&self) -> Option<&DrawViewPart> {
        Some(&self.view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferences;
    use tdraw_kernel_primitives::make_box;

    fn centered_cube() -> Arc<dyn DocumentObject> {
        Arc::new(PartFeature::new(
            "Cube",
            make_box(Point3::new(-0.5, -0.5, -0.5), Point3::new(0.5, 0.5, 0.5)),
        ))
    }

    fn section_of(part: Arc<dyn DocumentObject>) -> DrawViewSection {
        let mut base = DrawViewPart::new("View");
        base.set_source(Some(part.clone()));
        base.set_symbol_section("B");
        let mut section = DrawViewSection::new("Section", &MemoryPreferences::new());
        section.view_part_mut().set_source(Some(part));
        section.set_base_view(Some(Arc::new(base)));
        section
    }

    #[test]
    fn test_setters_touch_only_on_change() {
        let mut view = DrawViewPart::new("View");
        view.set_scale(1.0);
        assert!(view.touched().is_empty());
        view.set_scale(2.0);
        assert!(view.touched().contains(&Property::Scale));
    }

    #[test]
    fn test_valid_x_direction_replaces_parallel_axis() {
        let mut view = DrawViewPart::new("View");
        view.set_x_direction(Vec3::new(0.0, 0.0, -3.0));
        let x = view.valid_x_direction();
        assert!(x.dot(&view.direction()).abs() < 1e-12);
        assert!(x.norm() > 0.5);

        view.set_x_direction(Vec3::zeros());
        assert!(view.valid_x_direction().norm() > 0.5);

        view.set_x_direction(Vec3::y());
        assert_eq!(view.valid_x_direction(), Vec3::y());
    }

    #[test]
    fn test_execute_with_parallel_x_direction() {
        let mut view = DrawViewPart::new("View");
        view.set_source(Some(centered_cube()));
        view.set_x_direction(Vec3::z());
        view.execute().unwrap();
        let geometry = view.geometry().unwrap();
        assert_eq!(geometry.num_visible(), 4);
        assert_eq!(geometry.num_hidden(), 4);
        assert!((geometry.bounds.width() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_part_view_execute() {
        let mut view = DrawViewPart::new("View");
        assert_eq!(view.execute(), Err(SectionError::MissingSource));

        view.set_source(Some(centered_cube()));
        assert!(view.must_execute());
        view.execute().unwrap();
        assert!(!view.must_execute());
        let geometry = view.geometry().unwrap();
        assert_eq!(geometry.num_visible(), 4);
        assert_eq!(geometry.num_hidden(), 4);
    }

    #[test]
    fn test_section_requires_links() {
        let mut section = DrawViewSection::new("Section", &MemoryPreferences::new());
        assert_eq!(section.execute(), Err(SectionError::MissingSource));

        section.view_part_mut().set_source(Some(centered_cube()));
        assert_eq!(section.execute(), Err(SectionError::MissingBaseView));

        section.set_base_view(Some(centered_cube()));
        assert_eq!(section.execute(), Err(SectionError::BaseViewNotViewPart));

        let mut wrong = section_of(centered_cube());
        wrong
            .view_part_mut()
            .set_source(Some(Arc::new(DrawViewPart::new("NotAPart"))));
        assert_eq!(wrong.execute(), Err(SectionError::SourceNotPart));
    }

    #[test]
    fn test_section_label_from_base_view_symbol() {
        let mut section = section_of(centered_cube());
        section.execute().unwrap();
        assert_eq!(section.view_part().label(), "Section B-B");
        assert!(!section.must_execute());
    }

    #[test]
    fn test_cut_surface_follows_flag() {
        let mut section = section_of(centered_cube());
        section.execute().unwrap();
        assert!(section.cut_surface().is_some());

        section.set_show_cut_surface(false);
        assert!(section.must_execute());
        section.execute().unwrap();
        assert!(section.cut_surface().is_none());
        assert_eq!(section.section_faces().len(), 1);
    }

    #[test]
    fn test_source_without_solid_is_rejected() {
        let loose = make_box(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)).faces;
        let part: Arc<dyn DocumentObject> =
            Arc::new(PartFeature::new("Sheet", Shape::compound_of_faces(loose)));

        let mut section = section_of(part.clone());
        assert_eq!(section.execute(), Err(SectionError::NoSolid));
        assert!(section.section_faces().is_empty());

        let mut view = DrawViewPart::new("View");
        view.set_source(Some(part));
        assert_eq!(view.execute(), Err(SectionError::NoSolid));
    }

    #[test]
    fn test_non_positive_tolerance_is_rejected() {
        for tolerance in [0.0, -1e-6] {
            let mut section = section_of(centered_cube());
            section.set_section_origin(Point3::new(5.0, 0.0, 0.0));
            section.view_part_mut().set_tolerance(tolerance);
            assert_eq!(
                section.execute(),
                Err(SectionError::BuildFailed(DraftError::InvalidTolerance(tolerance)))
            );
            // Rejected before the origin is substituted.
            assert_eq!(section.section_origin(), Point3::new(5.0, 0.0, 0.0));
            assert!(section.view_part().geometry().is_none());
        }

        let mut view = DrawViewPart::new("View");
        view.set_source(Some(centered_cube()));
        view.set_tolerance(0.0);
        assert!(matches!(view.execute(), Err(SectionError::BuildFailed(_))));
    }

    #[test]
    fn test_zero_normal_fails_to_build() {
        let mut section = section_of(centered_cube());
        section.set_section_normal(Vec3::zeros());
        assert!(matches!(
            section.execute(),
            Err(SectionError::BuildFailed(_))
        ));
    }
}
