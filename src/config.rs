//! Run configuration: scene splitting limits and page grid geometry.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```json
//! { "split": { "maxScenes": 12 }, "grid": { "cols": 2 } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryformeError};
use crate::layout::CAPTION_PADDING;

/// Scene splitting limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitConfig {
    /// Scenes beyond this count are discarded.
    pub max_scenes: usize,
    /// A chunk is emitted once it holds at least this many words.
    pub min_words_per_panel: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_scenes: 50,
            min_words_per_panel: 5,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_scenes == 0 {
            return Err(StoryformeError::InvalidConfig(
                "maxScenes must be at least 1".to_string(),
            ));
        }
        if self.min_words_per_panel == 0 {
            return Err(StoryformeError::InvalidConfig(
                "minWordsPerPanel must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Page grid geometry, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridConfig {
    pub cols: u32,
    pub rows_per_page: u32,
    pub panel_width: u32,
    pub panel_height: u32,
    /// Vertical band below each image reserved for the caption.
    pub caption_height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: 3,
            rows_per_page: 3,
            panel_width: 512,
            panel_height: 512,
            caption_height: 120,
        }
    }
}

impl GridConfig {
    /// Maximum number of panels a single page holds.
    pub fn panels_per_page(&self) -> usize {
        self.cols as usize * self.rows_per_page as usize
    }

    /// Height of one grid row: the image plus its caption band.
    pub fn row_height(&self) -> u32 {
        self.panel_height + self.caption_height
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("cols", self.cols),
            ("rowsPerPage", self.rows_per_page),
            ("panelWidth", self.panel_width),
            ("panelHeight", self.panel_height),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(StoryformeError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        // Largest pixel coordinates layout computes: the page edges plus the
        // caption origin inside the last cell.
        let row_height = self
            .panel_height
            .checked_add(self.caption_height)
            .ok_or_else(|| too_large("panelHeight + captionHeight"))?;
        self.cols
            .checked_mul(self.panel_width)
            .and_then(|w| w.checked_add(CAPTION_PADDING))
            .ok_or_else(|| too_large("cols × panelWidth"))?;
        self.rows_per_page
            .checked_mul(row_height)
            .and_then(|h| h.checked_add(CAPTION_PADDING))
            .ok_or_else(|| too_large("rowsPerPage × (panelHeight + captionHeight)"))?;
        Ok(())
    }
}

fn too_large(what: &str) -> StoryformeError {
    StoryformeError::InvalidConfig(format!("{} exceeds {} pixels", what, u32::MAX))
}

/// Everything one generation run needs besides the story and the output path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryboardConfig {
    pub split: SplitConfig,
    pub grid: GridConfig,
    /// TrueType font for captions. When unset, common system locations are
    /// searched before falling back to the built-in bitmap font.
    pub font_path: Option<PathBuf>,
}

impl StoryboardConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| StoryformeError::parse("config", e))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.grid.validate()
    }
}
