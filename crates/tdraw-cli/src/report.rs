//! Summary of a computed section view, printable as text or JSON.

use std::fmt::Write as _;

use serde::Serialize;
use tdraw_kernel_drafting::{BaseGeom, DrawViewSection, EdgeType, GeomFace, Visibility};

/// Edge counts of the outline projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EdgeCounts {
    /// Visible hard edges.
    pub visible_hard: usize,
    /// Hidden hard edges.
    pub hidden_hard: usize,
    /// Visible outline edges.
    pub visible_outline: usize,
    /// Hidden outline edges.
    pub hidden_outline: usize,
}

/// Result of a section run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// View label.
    pub label: String,
    /// Section origin after any substitution.
    pub section_origin: [f64; 3],
    /// Outline edge counts.
    pub outline: EdgeCounts,
    /// Packed `0xRRGGBBAA` fill colour when the cut surface is shown.
    pub cut_surface_color: Option<u32>,
    /// Drawing curves of each cut face.
    pub faces: Vec<GeomFace>,
}

impl Report {
    /// Summarize an executed section view.
    pub fn from_section(section: &DrawViewSection) -> Self {
        let outline = section
            .geometry()
            .map(|view| EdgeCounts {
                visible_hard: view.count(Visibility::Visible, EdgeType::Hard),
                hidden_hard: view.count(Visibility::Hidden, EdgeType::Hard),
                visible_outline: view.count(Visibility::Visible, EdgeType::Outline),
                hidden_outline: view.count(Visibility::Hidden, EdgeType::Outline),
            })
            .unwrap_or_default();
        let origin = section.section_origin();
        Self {
            label: section.view_part().label().to_string(),
            section_origin: [origin.x, origin.y, origin.z],
            outline,
            cut_surface_color: section.cut_surface().map(|(_, color)| color.to_packed()),
            faces: section.face_geometry(),
        }
    }

    /// Human-readable summary.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let [x, y, z] = self.section_origin;
        let _ = writeln!(out, "{}", self.label);
        let _ = writeln!(out, "  Section origin: ({x:.4}, {y:.4}, {z:.4})");
        let _ = writeln!(
            out,
            "  Outline: {} visible, {} hidden hard; {} visible, {} hidden outline",
            self.outline.visible_hard,
            self.outline.hidden_hard,
            self.outline.visible_outline,
            self.outline.hidden_outline
        );
        match self.cut_surface_color {
            Some(color) => {
                let _ = writeln!(out, "  Cut surface: #{color:08X}");
            }
            None => {
                let _ = writeln!(out, "  Cut surface: hidden");
            }
        }
        let _ = writeln!(out, "  Faces: {}", self.faces.len());
        for (i, face) in self.faces.iter().enumerate() {
            let _ = writeln!(out, "  Face {}:", i + 1);
            for (j, wire) in face.wires.iter().enumerate() {
                let kind = if j == 0 { "outer" } else { "hole" };
                match wire.geoms.as_slice() {
                    [BaseGeom::Circle { center, radius }] => {
                        let _ = writeln!(
                            out,
                            "    {kind}: circle r={radius:.4} at ({:.4}, {:.4})",
                            center.x, center.y
                        );
                    }
                    geoms => {
                        let length: f64 = geoms.iter().map(BaseGeom::length).sum();
                        let _ = writeln!(
                            out,
                            "    {kind}: {} lines, length {length:.4}",
                            geoms.len()
                        );
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use tdraw_kernel_drafting::MemoryPreferences;

    fn cube_report() -> Report {
        let scene = Scene::from_toml_str(
            r#"
            [part.shape]
            type = "box"
            min = [-1.0, -1.0, -1.0]
            max = [1.0, 1.0, 1.0]

            [section]
            origin = [0.0, 0.0, 0.0]
            normal = [0.0, 0.0, 1.0]
            "#,
        )
        .unwrap();
        let mut section = scene.build_section(&MemoryPreferences::new()).unwrap();
        section.execute().unwrap();
        Report::from_section(&section)
    }

    #[test]
    fn test_report_counts() {
        let report = cube_report();
        assert_eq!(report.label, "Section A-A");
        assert_eq!(report.outline.visible_hard, 4);
        assert_eq!(report.outline.hidden_hard, 4);
        assert_eq!(report.cut_surface_color, Some(0xC8C8_C800));
        assert_eq!(report.faces.len(), 1);
    }

    #[test]
    fn test_report_text() {
        let text = cube_report().to_text();
        assert!(text.starts_with("Section A-A\n"));
        assert!(text.contains("Cut surface: #C8C8C800"));
        assert!(text.contains("outer: 4 lines, length 8.0000"));
    }

    #[test]
    fn test_report_json() {
        let json = serde_json::to_value(cube_report()).unwrap();
        assert_eq!(json["label"], "Section A-A");
        assert_eq!(json["faces"][0]["wires"][0]["geoms"][0]["type"], "Line");
    }
}
