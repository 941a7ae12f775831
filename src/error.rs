//! Structured error types for the storyboard pipeline.
//!
//! Input and assembly errors are raised by this crate. Filesystem and codec
//! failures pass through unchanged so callers see the original cause.

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StoryformeError>;

/// The unified error type returned by all public storyforme functions.
#[derive(Debug, Error)]
pub enum StoryformeError {
    /// The story was empty or only whitespace.
    #[error("Story text is empty")]
    EmptyStory,

    /// The document assembler was handed zero pages.
    #[error("No pages to assemble")]
    EmptyInput,

    /// A grid or split setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A config file or panel manifest failed to parse.
    #[error("Failed to parse {what}: {source}{}", hint_suffix(.hint))]
    Parse {
        what: &'static str,
        source: serde_json::Error,
        hint: String,
    },

    /// A panel image source could not be resolved to image bytes.
    #[error("Image source error: {0}")]
    ImageSource(String),

    /// The synthesis collaborator failed for a caption.
    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl StoryformeError {
    /// Wrap a serde_json error with a hint derived from its category.
    pub fn parse(what: &'static str, e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        StoryformeError::Parse {
            what,
            source: e,
            hint,
        }
    }
}
