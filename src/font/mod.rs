//! # Caption Fonts
//!
//! Captions are drawn either with a scalable TrueType face (parsed with
//! ttf-parser and rasterized here) or, when no usable font file exists, with
//! a built-in fixed-width bitmap font. The choice is made once, when a
//! [`FontMetrics`] value is built, and that value is handed to the layout
//! engine. Layout never probes for fonts on its own.
//!
//! The two variants wrap captions differently because their glyphs differ
//! in width:
//!
//! | variant      | glyph size  | chars/line | line height |
//! |--------------|-------------|------------|-------------|
//! | `Scalable`   | 20 px       | 50         | 24 px       |
//! | `FixedWidth` | 5×7 in 6 px | 70         | 15 px       |

pub mod bitmap;
pub mod raster;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use tracing::{debug, warn};

/// Pixel size the scalable face is rasterized at.
pub const SCALABLE_FONT_PX: f32 = 20.0;
const SCALABLE_CHARS_PER_LINE: usize = 50;
const SCALABLE_LINE_HEIGHT: u32 = 24;

const FIXED_CHARS_PER_LINE: usize = 70;
const FIXED_LINE_HEIGHT: u32 = 15;

/// Places searched by [`FontMetrics::discover`] when no font is configured.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// A TrueType/OpenType face that parsed successfully.
#[derive(Clone)]
pub struct ScalableFont {
    data: Arc<Vec<u8>>,
    source: PathBuf,
    units_per_em: u16,
    ascender: i16,
}

impl ScalableFont {
    /// Parse font bytes. Returns `None` if ttf-parser rejects them.
    pub fn from_bytes(data: Vec<u8>, source: PathBuf) -> Option<Self> {
        let (units_per_em, ascender) = {
            let face = ttf_parser::Face::parse(&data, 0).ok()?;
            (face.units_per_em(), face.ascender())
        };
        if units_per_em == 0 {
            return None;
        }
        Some(Self {
            data: Arc::new(data),
            source,
            units_per_em,
            ascender,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    fn scale(&self) -> f32 {
        SCALABLE_FONT_PX / self.units_per_em as f32
    }
}

impl fmt::Debug for ScalableFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalableFont")
            .field("source", &self.source)
            .field("units_per_em", &self.units_per_em)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// The caption font chosen for a run, plus the wrap metrics that go with it.
#[derive(Debug, Clone)]
pub enum FontMetrics {
    Scalable(ScalableFont),
    FixedWidth,
}

impl FontMetrics {
    /// Load a font file, falling back to the bitmap font if it is missing or
    /// unparseable. The fallback is logged, never returned as an error.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(data) => match ScalableFont::from_bytes(data, path.to_path_buf()) {
                Some(font) => {
                    debug!(font = %path.display(), "Loaded caption font");
                    FontMetrics::Scalable(font)
                }
                None => {
                    warn!(font = %path.display(), "Font file could not be parsed; using built-in fixed-width font");
                    FontMetrics::FixedWidth
                }
            },
            Err(e) => {
                warn!(font = %path.display(), error = %e, "Font file unavailable; using built-in fixed-width font");
                FontMetrics::FixedWidth
            }
        }
    }

    /// Use `configured` if given, otherwise the first parseable entry of
    /// [`FONT_SEARCH_PATHS`]. Falls back to the bitmap font.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(path) = configured {
            return Self::load(path);
        }
        for candidate in FONT_SEARCH_PATHS {
            let path = Path::new(candidate);
            let Ok(data) = std::fs::read(path) else {
                continue;
            };
            if let Some(font) = ScalableFont::from_bytes(data, path.to_path_buf()) {
                debug!(font = %path.display(), "Discovered caption font");
                return FontMetrics::Scalable(font);
            }
        }
        warn!("No scalable font found; using built-in fixed-width font");
        FontMetrics::FixedWidth
    }

    /// Characters per wrapped caption line.
    pub fn chars_per_line(&self) -> usize {
        match self {
            FontMetrics::Scalable(_) => SCALABLE_CHARS_PER_LINE,
            FontMetrics::FixedWidth => FIXED_CHARS_PER_LINE,
        }
    }

    /// Vertical distance between caption baselines, in pixels.
    pub fn line_height(&self) -> u32 {
        match self {
            FontMetrics::Scalable(_) => SCALABLE_LINE_HEIGHT,
            FontMetrics::FixedWidth => FIXED_LINE_HEIGHT,
        }
    }

    pub fn is_scalable(&self) -> bool {
        matches!(self, FontMetrics::Scalable(_))
    }

    /// Prepare for drawing. The scalable face is parsed here and reused for
    /// every line drawn through the returned painter.
    pub fn painter(&self) -> TextPainter<'_> {
        match self {
            FontMetrics::Scalable(font) => match ttf_parser::Face::parse(&font.data, 0) {
                Ok(face) => TextPainter::Scalable {
                    face,
                    scale: font.scale(),
                    ascender: font.ascender as f32,
                },
                Err(e) => {
                    warn!(font = %font.source.display(), error = %e, "Font face could not be reopened; drawing with built-in font");
                    TextPainter::FixedWidth
                }
            },
            FontMetrics::FixedWidth => TextPainter::FixedWidth,
        }
    }

    /// Draw one line of text with its top-left corner at `(x, y)`.
    /// Pixels falling outside the canvas are clipped.
    pub fn draw_text(&self, canvas: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
        self.painter().draw_text(canvas, x, y, text, color);
    }
}

/// A [`FontMetrics`] with its face parsed, ready to draw many lines.
pub enum TextPainter<'a> {
    Scalable {
        face: ttf_parser::Face<'a>,
        scale: f32,
        /// Ascender in font units.
        ascender: f32,
    },
    FixedWidth,
}

impl TextPainter<'_> {
    /// Draw one line of text with its top-left corner at `(x, y)`.
    pub fn draw_text(&self, canvas: &mut RgbImage, x: i64, y: i64, text: &str, color: Rgb<u8>) {
        match self {
            TextPainter::Scalable {
                face,
                scale,
                ascender,
            } => {
                let baseline = y as f32 + ascender * scale;
                let mut pen_x = x as f32;
                for ch in text.chars() {
                    let glyph = face.glyph_index(ch).unwrap_or(ttf_parser::GlyphId(0));
                    if let Some(coverage) =
                        raster::rasterize_glyph(face, glyph, *scale, pen_x, baseline)
                    {
                        coverage.blit(canvas, color);
                    }
                    pen_x += face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
                }
            }
            TextPainter::FixedWidth => bitmap::draw_text(canvas, x, y, text, color),
        }
    }
}

/// Blend `color` over the canvas pixel at `(x, y)` with coverage `alpha`.
pub(crate) fn blend_pixel(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        let under = pixel[c] as f32;
        let over = color[c] as f32;
        pixel[c] = (under + (over - under) * alpha).round() as u8;
    }
}
