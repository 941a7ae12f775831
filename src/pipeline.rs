//! # Generation Pipeline
//!
//! One full run from story text to storyboard:
//!
//! ```text
//! story ─→ split_story ─→ synthesize_panels ─→ layout::render ─→ pdf::assemble
//!            (scenes)      out/images/panel_NN.png
//!                                               out/storyboards/storyboard_page_NN.png
//!                                                                 out/storyboard.pdf
//! ```
//!
//! Every output location is derived from the `out_dir` argument. Nothing is
//! read from or written to an ambient working directory.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::StoryboardConfig;
use crate::error::{Result, StoryformeError};
use crate::font::FontMetrics;
use crate::layout::{Panel, PageLayoutEngine, RenderedPage};
use crate::pdf::{self, Metadata};
use crate::scene::{split_story, Scene};
use crate::synth::{synthesize_panels, Synthesizer};

pub const IMAGES_DIR: &str = "images";
pub const PAGES_DIR: &str = "storyboards";
pub const PDF_FILE_NAME: &str = "storyboard.pdf";

/// Whether and how to assemble a PDF at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PdfOutput {
    #[default]
    Skip,
    Write(Metadata),
}

/// Everything one run produced, in story order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryboardDocument {
    pub scenes: Vec<Scene>,
    pub panel_paths: Vec<PathBuf>,
    pub pages: Vec<RenderedPage>,
    pub pdf: Option<PathBuf>,
}

impl StoryboardDocument {
    pub fn page_paths(&self) -> Vec<&Path> {
        self.pages.iter().map(|p| p.path.as_path()).collect()
    }
}

/// Run the whole pipeline for `story`, writing under `out_dir`.
///
/// A blank story fails with [`StoryformeError::EmptyStory`] before anything
/// is created on disk. Later failures leave whatever was already written.
pub fn generate<S: Synthesizer + ?Sized>(
    story: &str,
    config: &StoryboardConfig,
    font: FontMetrics,
    synth: &mut S,
    out_dir: &Path,
    pdf_output: &PdfOutput,
) -> Result<StoryboardDocument> {
    if story.trim().is_empty() {
        return Err(StoryformeError::EmptyStory);
    }
    config.validate()?;
    let engine = PageLayoutEngine::new(config.grid, font)?;

    let scenes = split_story(
        story,
        config.split.max_scenes,
        config.split.min_words_per_panel,
    );
    if scenes.is_empty() {
        // Only markup, e.g. "<br>".
        return Err(StoryformeError::EmptyStory);
    }
    info!(scenes = scenes.len(), "Split story");

    let synthesized = synthesize_panels(&scenes, synth, &out_dir.join(IMAGES_DIR))?;
    let panels: Vec<Panel<'_>> = synthesized
        .iter()
        .map(|p| Panel::new(&p.caption, &p.image))
        .collect();
    let pages = engine.render(&panels, &out_dir.join(PAGES_DIR))?;

    let pdf = match pdf_output {
        PdfOutput::Skip => None,
        PdfOutput::Write(metadata) => {
            let page_paths: Vec<&Path> = pages.iter().map(|p| p.path.as_path()).collect();
            Some(pdf::assemble_with_metadata(
                &page_paths,
                &out_dir.join(PDF_FILE_NAME),
                metadata,
            )?)
        }
    };

    Ok(StoryboardDocument {
        panel_paths: synthesized.into_iter().map(|p| p.path).collect(),
        scenes,
        pages,
        pdf,
    })
}
