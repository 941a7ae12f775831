//! # Storyforme
//!
//! Turns a prose story into captioned storyboard pages.
//!
//! The story is cut into caption-sized scenes, each scene is handed to an
//! image synthesizer, and the resulting (caption, image) panels are laid out
//! on fixed-width grid pages. Pages only grow as tall as the rows they use.
//! The pages can then be combined into a single PDF.
//!
//! ## Architecture
//!
//! ```text
//! Story text
//!       ↓
//!   [scene]    — Strip tags, split sentences, chunk by word count
//!       ↓
//!   [synth]    — Caption → image (external collaborator, seeded per scene)
//!       ↓
//!   [layout]   — Grid pagination, caption wrapping, page rendering
//!       ↓
//!   [pdf]      — Combine page images into one document
//! ```
//!
//! [`pipeline::generate`] runs all four stages. Each stage is also usable on
//! its own.

pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod scene;
pub mod synth;
pub mod text;

pub use config::{GridConfig, SplitConfig, StoryboardConfig};
pub use error::{Result, StoryformeError};
pub use font::FontMetrics;
pub use layout::{Panel, PanelSource, PageLayoutEngine, PagePlan, RenderedPage};
pub use pdf::{assemble, Metadata};
pub use pipeline::{generate, PdfOutput, StoryboardDocument};
pub use scene::{split_story, Scene};
pub use synth::{PlaceholderSynthesizer, Synthesizer};
