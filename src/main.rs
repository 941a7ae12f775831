//! # Storyforme CLI
//!
//! Usage:
//!   storyforme scenes story.txt --json
//!   storyforme generate story.txt -o output --pdf --title "The Lighthouse"
//!   cat story.txt | storyforme generate -o output
//!   storyforme layout panels.json -o output/storyboards
//!   storyforme assemble output/storyboards/*.png -o storyboard.pdf

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use storyforme::layout::{self, Panel, PageLayoutEngine, PanelSource};
use storyforme::pdf::{self, Metadata};
use storyforme::pipeline::{self, PdfOutput};
use storyforme::{split_story, FontMetrics, PlaceholderSynthesizer, StoryboardConfig};

#[derive(Parser, Debug)]
#[command(
    name = "storyforme",
    about = "Turn a story into captioned storyboard pages",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a story into scenes and print them
    Scenes {
        /// Story text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Print scenes as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Split, synthesize placeholder panels, render pages, and optionally build a PDF
    Generate {
        /// Story text file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "output", env = "STORYFORME_OUT_DIR")]
        out_dir: PathBuf,

        /// Also assemble storyboard.pdf
        #[arg(long)]
        pdf: bool,

        /// PDF document title
        #[arg(long, requires = "pdf")]
        title: Option<String>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Render pages from a JSON panel manifest of { "caption", "src" } entries
    Layout {
        /// Panel manifest file
        manifest: PathBuf,

        /// Directory for the rendered pages
        #[arg(short, long, default_value = "storyboards")]
        out_dir: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Combine page images into one PDF, in the order given
    Assemble {
        /// Page image files
        pages: Vec<PathBuf>,

        /// Output PDF path
        #[arg(short, long, default_value = "storyboard.pdf")]
        output: PathBuf,

        /// PDF document title
        #[arg(long)]
        title: Option<String>,
    },
}

/// Settings shared by every subcommand that splits or lays out.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON config file; flags below override its values
    #[arg(long, env = "STORYFORME_CONFIG")]
    config: Option<PathBuf>,

    /// TrueType font for captions
    #[arg(long, env = "STORYFORME_FONT")]
    font: Option<PathBuf>,

    #[arg(long, env = "STORYFORME_MAX_SCENES")]
    max_scenes: Option<usize>,

    #[arg(long, env = "STORYFORME_MIN_WORDS")]
    min_words: Option<usize>,

    #[arg(long, env = "STORYFORME_COLS")]
    cols: Option<u32>,

    #[arg(long, env = "STORYFORME_ROWS")]
    rows: Option<u32>,

    #[arg(long, env = "STORYFORME_PANEL_WIDTH")]
    panel_width: Option<u32>,

    #[arg(long, env = "STORYFORME_PANEL_HEIGHT")]
    panel_height: Option<u32>,

    #[arg(long, env = "STORYFORME_CAPTION_HEIGHT")]
    caption_height: Option<u32>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<StoryboardConfig> {
        let mut config = match &self.config {
            Some(path) => StoryboardConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => StoryboardConfig::default(),
        };

        if let Some(v) = self.max_scenes {
            config.split.max_scenes = v;
        }
        if let Some(v) = self.min_words {
            config.split.min_words_per_panel = v;
        }
        if let Some(v) = self.cols {
            config.grid.cols = v;
        }
        if let Some(v) = self.rows {
            config.grid.rows_per_page = v;
        }
        if let Some(v) = self.panel_width {
            config.grid.panel_width = v;
        }
        if let Some(v) = self.panel_height {
            config.grid.panel_height = v;
        }
        if let Some(v) = self.caption_height {
            config.grid.caption_height = v;
        }
        if let Some(font) = &self.font {
            config.font_path = Some(font.clone());
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storyforme=info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match Cli::parse().command {
        Command::Scenes {
            input,
            json,
            config,
        } => {
            let config = config.resolve()?;
            let story = read_story(input.as_deref())?;
            let scenes = split_story(
                &story,
                config.split.max_scenes,
                config.split.min_words_per_panel,
            );
            if json {
                println!("{}", serde_json::to_string_pretty(&scenes)?);
            } else {
                for scene in &scenes {
                    println!("{:>3}. {}", scene.index, scene.text);
                }
            }
        }

        Command::Generate {
            input,
            out_dir,
            pdf,
            title,
            config,
        } => {
            let config = config.resolve()?;
            let story = read_story(input.as_deref())?;
            let font = FontMetrics::discover(config.font_path.as_deref());
            let mut synth =
                PlaceholderSynthesizer::new(config.grid.panel_width, config.grid.panel_height);
            let pdf_output = if pdf {
                PdfOutput::Write(Metadata {
                    title,
                    author: None,
                })
            } else {
                PdfOutput::Skip
            };

            let doc = pipeline::generate(&story, &config, font, &mut synth, &out_dir, &pdf_output)
                .context("Storyboard generation failed")?;
            info!(
                scenes = doc.scenes.len(),
                pages = doc.pages.len(),
                out_dir = %out_dir.display(),
                "Done"
            );
            if let Some(path) = &doc.pdf {
                println!("{}", path.display());
            } else {
                for page in &doc.pages {
                    println!("{}", page.path.display());
                }
            }
        }

        Command::Layout {
            manifest,
            out_dir,
            config,
        } => {
            let config = config.resolve()?;
            let json = fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read manifest {}", manifest.display()))?;
            let base = manifest.parent().unwrap_or_else(|| Path::new("."));
            let sources = layout::parse_manifest(&json)?;

            let images = sources
                .iter()
                .map(|source| {
                    resolve_relative(source, base)
                        .load_image()
                        .with_context(|| format!("Failed to load panel image for {:?}", source.caption))
                })
                .collect::<Result<Vec<_>>>()?;
            let panels: Vec<Panel<'_>> = sources
                .iter()
                .zip(&images)
                .map(|(source, image)| Panel::new(&source.caption, image))
                .collect();

            let font = FontMetrics::discover(config.font_path.as_deref());
            let engine = PageLayoutEngine::new(config.grid, font)?;
            for page in engine.render(&panels, &out_dir)? {
                println!("{}", page.path.display());
            }
        }

        Command::Assemble {
            pages,
            output,
            title,
        } => {
            let metadata = Metadata {
                title,
                author: None,
            };
            let path = pdf::assemble_with_metadata(&pages, &output, &metadata)
                .context("PDF assembly failed")?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn read_story(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read story {}", path.display())),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read story from stdin")?;
            Ok(buf)
        }
    }
}

/// Manifest paths are relative to the manifest file, not the working
/// directory. Data URIs and absolute paths pass through.
fn resolve_relative(source: &PanelSource, base: &Path) -> PanelSource {
    let candidate = base.join(&source.src);
    if !source.src.starts_with("data:") && Path::new(&source.src).is_relative() && candidate.is_file() {
        PanelSource {
            caption: source.caption.clone(),
            src: candidate.to_string_lossy().into_owned(),
        }
    } else {
        source.clone()
    }
}
