//! tdraw CLI - section views from the command line
//!
//! Builds a part from a scene file, cuts it with the section plane and
//! prints the resulting view.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tdraw_kernel_drafting::MemoryPreferences;
use tracing::info;

mod report;
mod scene;

use report::Report;
use scene::Scene;

#[derive(Parser)]
#[command(name = "tdraw")]
#[command(about = "Technical drawing section views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a section view of the part described by a scene file
    Section {
        /// Scene file (.toml)
        scene: PathBuf,
        /// Preference file (.toml)
        #[arg(short, long)]
        prefs: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tdraw=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Section {
            scene,
            prefs,
            format,
        } => {
            let output = run_section(&scene, prefs.as_deref(), format)?;
            print!("{output}");
        }
    }

    Ok(())
}

fn run_section(scene_path: &Path, prefs_path: Option<&Path>, format: Format) -> Result<String> {
    let prefs = match prefs_path {
        Some(path) => MemoryPreferences::load(path)
            .with_context(|| format!("failed to load preferences {}", path.display()))?,
        None => MemoryPreferences::new(),
    };
    let scene = Scene::load(scene_path)?;

    let mut section = scene.build_section(&prefs)?;
    section.execute()?;
    info!(faces = section.section_faces().len(), "section computed");

    let report = Report::from_section(&section);
    Ok(match format {
        Format::Text => report.to_text(),
        Format::Json => serde_json::to_string_pretty(&report)? + "\n",
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_section_args() {
        let cli =
            Cli::try_parse_from(["tdraw", "section", "part.toml", "--format", "json"]).unwrap();
        let Commands::Section {
            scene,
            prefs,
            format,
        } = cli.command;
        assert_eq!(scene, PathBuf::from("part.toml"));
        assert!(prefs.is_none());
        assert_eq!(format, Format::Json);
    }

    #[test]
    fn test_run_section_from_files() {
        let dir = std::env::temp_dir().join(format!("tdraw-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let scene = dir.join("scene.toml");
        let prefs = dir.join("prefs.toml");
        std::fs::write(
            &scene,
            "[part.shape]\ntype = \"cube\"\nsize = [2.0, 2.0, 2.0]\n\n[view]\nsymbol = \"B\"\n\n\
             [section]\norigin = [1.0, 1.0, 1.0]\n",
        )
        .unwrap();
        std::fs::write(
            &prefs,
            "[\"Mod/TechDraw/Colors\"]\nCutSurfaceColor = 0x112233FF\n",
        )
        .unwrap();

        let text = run_section(&scene, Some(prefs.as_path()), Format::Text).unwrap();
        assert!(text.starts_with("Section B-B\n"));
        assert!(text.contains("#112233FF"));

        let json = run_section(&scene, None, Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["cut_surface_color"], 0xC8C8_C800u32);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_scene_is_an_error() {
        let err = run_section(Path::new("/nonexistent/scene.toml"), None, Format::Text)
            .unwrap_err();
        assert!(err.to_string().contains("failed to read scene"));
    }
}
