//! # Storyboard Page Layout
//!
//! Lays captioned panels out on fixed-width grid pages and renders each page
//! to a PNG.
//!
//! A page holds up to `cols * rows_per_page` panels, filled row by row. Its
//! canvas is only as tall as the rows it actually uses:
//!
//! ```text
//! 10 panels, 3×3 grid
//!
//! page 1 (9 panels)           page 2 (1 panel)
//! ┌─────┬─────┬─────┐         ┌─────┬─────┬─────┐
//! │ img │ img │ img │         │ img │     │     │
//! │ cap │ cap │ cap │         │ cap │     │     │
//! ├─────┼─────┼─────┤         └─────┴─────┴─────┘
//! │ img │ img │ img │
//! │ cap │ cap │ cap │
//! ├─────┼─────┼─────┤
//! │ img │ img │ img │
//! │ cap │ cap │ cap │
//! └─────┴─────┴─────┘
//! ```
//!
//! Every image is resized to exactly the panel size, ignoring aspect ratio,
//! so cells always line up. Captions are wrapped to the font's character
//! budget and cut to four lines.
//!
//! Pages are independent: each reads only its own slice of the panel list
//! and writes only its own file.

pub mod grid;

use std::ops::Range;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GridConfig;
use crate::error::{Result, StoryformeError};
use crate::font::FontMetrics;
use crate::image_loader;
use crate::text::caption_lines;
use grid::CellPlacement;

/// Offset of caption text from the cell's left edge and from the image bottom.
pub const CAPTION_PADDING: u32 = 10;

const PAGE_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const CAPTION_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// A caption paired with its image. Borrowed: the caller keeps the pixels.
#[derive(Debug, Clone, Copy)]
pub struct Panel<'a> {
    pub caption: &'a str,
    pub image: &'a DynamicImage,
}

impl<'a> Panel<'a> {
    pub fn new(caption: &'a str, image: &'a DynamicImage) -> Self {
        Self { caption, image }
    }
}

/// One entry of a panel manifest: a caption and where to find its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSource {
    pub caption: String,
    /// File path, `data:image/...;base64,` URI, or raw base64.
    pub src: String,
}

impl PanelSource {
    pub fn load_image(&self) -> Result<DynamicImage> {
        image_loader::load_image(&self.src)
    }
}

/// Parse a JSON array of `{ "caption": ..., "src": ... }` objects.
pub fn parse_manifest(json: &str) -> Result<Vec<PanelSource>> {
    serde_json::from_str(json).map_err(|e| StoryformeError::parse("panel manifest", e))
}

/// Geometry of one page, computed before any pixels are touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    /// 0-based page index.
    pub page_index: usize,
    /// Index of this page's first panel in the full panel list.
    pub first_panel: usize,
    /// Panels on this page.
    pub panel_count: usize,
    pub cols: u32,
    /// Rows this page's panels occupy, not the grid's capacity.
    pub rows: u32,
    pub width: u32,
    pub height: u32,
    pub cells: Vec<CellPlacement>,
}

impl PagePlan {
    /// 1-based page number, as used in file names.
    pub fn number(&self) -> usize {
        self.page_index + 1
    }

    /// This page's slice of the full panel list.
    pub fn panel_range(&self) -> Range<usize> {
        self.first_panel..self.first_panel + self.panel_count
    }

    pub fn file_name(&self) -> String {
        page_file_name(self.number())
    }
}

/// A page written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub plan: PagePlan,
    pub path: PathBuf,
}

/// `storyboard_page_01.png`, `storyboard_page_02.png`, ...
pub fn page_file_name(number: usize) -> String {
    format!("storyboard_page_{:02}.png", number)
}

/// Turns panels into page images.
///
/// Holds the grid geometry and the caption font chosen for the run.
#[derive(Debug, Clone)]
pub struct PageLayoutEngine {
    grid: GridConfig,
    font: FontMetrics,
}

impl PageLayoutEngine {
    pub fn new(grid: GridConfig, font: FontMetrics) -> Result<Self> {
        grid.validate()?;
        Ok(Self { grid, font })
    }

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn font(&self) -> &FontMetrics {
        &self.font
    }

    /// Split `panel_count` panels into pages and compute each page's geometry.
    pub fn plan(&self, panel_count: usize) -> Vec<PagePlan> {
        let per_page = self.grid.panels_per_page();
        let total_pages = grid::page_count(panel_count, per_page);
        let cols = self.grid.cols;
        let row_height = self.grid.row_height();

        (0..total_pages)
            .map(|page_index| {
                let first_panel = page_index * per_page;
                let batch = per_page.min(panel_count - first_panel);
                let rows = grid::rows_needed(batch, cols);
                PagePlan {
                    page_index,
                    first_panel,
                    panel_count: batch,
                    cols,
                    rows,
                    width: cols * self.grid.panel_width,
                    height: rows * row_height,
                    cells: grid::place_cells(batch, cols, self.grid.panel_width, row_height),
                }
            })
            .collect()
    }

    /// Draw one page in memory.
    ///
    /// `batch` must be the panels of `plan.panel_range()`.
    pub fn compose_page(&self, plan: &PagePlan, batch: &[Panel<'_>]) -> RgbImage {
        let mut board = RgbImage::from_pixel(plan.width, plan.height, PAGE_BACKGROUND);
        let (w, h) = (self.grid.panel_width, self.grid.panel_height);
        let chars_per_line = self.font.chars_per_line();
        let line_height = self.font.line_height() as i64;
        let painter = self.font.painter();

        for (panel, cell) in batch.iter().zip(&plan.cells) {
            let image = fit_to_panel(panel.image, w, h);
            imageops::replace(&mut board, &image, cell.x as i64, cell.y as i64);

            let text_x = (cell.x + CAPTION_PADDING) as i64;
            let mut text_y = (cell.y + h + CAPTION_PADDING) as i64;
            for line in caption_lines(panel.caption, chars_per_line) {
                painter.draw_text(&mut board, text_x, text_y, &line, CAPTION_COLOR);
                text_y += line_height;
            }
        }
        board
    }

    /// Render every page into `out_dir`, creating it if needed.
    ///
    /// Pages are written in order. If a write fails, pages already written
    /// stay on disk and the error is returned.
    pub fn render(&self, panels: &[Panel<'_>], out_dir: &Path) -> Result<Vec<RenderedPage>> {
        std::fs::create_dir_all(out_dir)?;

        let plans = self.plan(panels.len());
        let mut rendered = Vec::with_capacity(plans.len());
        for plan in plans {
            debug!(
                page = plan.number(),
                panels = plan.panel_count,
                rows = plan.rows,
                width = plan.width,
                height = plan.height,
                "Composing page"
            );
            let board = self.compose_page(&plan, &panels[plan.panel_range()]);
            let path = out_dir.join(plan.file_name());
            board.save(&path)?;
            info!(path = %path.display(), "Saved storyboard page");
            rendered.push(RenderedPage { plan, path });
        }
        Ok(rendered)
    }
}

/// Lay `panels` out on `grid` pages with `font` captions and write them to
/// `out_dir`.
pub fn render(
    panels: &[Panel<'_>],
    grid: &GridConfig,
    font: &FontMetrics,
    out_dir: &Path,
) -> Result<Vec<RenderedPage>> {
    PageLayoutEngine::new(*grid, font.clone())?.render(panels, out_dir)
}

/// Resize to exactly `w`×`h`, discarding aspect ratio.
fn fit_to_panel(image: &DynamicImage, w: u32, h: u32) -> RgbImage {
    if image.width() == w && image.height() == h {
        image.to_rgb8()
    } else {
        image.resize_exact(w, h, FilterType::CatmullRom).to_rgb8()
    }
}
