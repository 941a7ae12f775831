//! # Panel Synthesis
//!
//! The boundary to whatever turns a caption into a picture. Storyforme never
//! looks inside a [`Synthesizer`]: it calls it once per scene, in scene
//! order, with a seed derived from the scene's position, and saves what
//! comes back.
//!
//! [`PlaceholderSynthesizer`] is a deterministic stand-in that needs no
//! model. It draws a seeded two-tone gradient so layouts can be previewed
//! and tested offline.

use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use tracing::info;

use crate::error::Result;
use crate::scene::Scene;

/// Seed passed for the first scene. Scene `i` (0-based) gets `BASE_SEED + i`.
pub const BASE_SEED: u64 = 42;

/// Turns a caption into an image.
///
/// Implementations report their own failures as
/// [`StoryformeError::Synthesis`](crate::error::StoryformeError::Synthesis)
/// or any other variant; the error is propagated unchanged.
pub trait Synthesizer {
    fn synthesize(&mut self, caption: &str, seed: u64) -> Result<DynamicImage>;
}

impl<F> Synthesizer for F
where
    F: FnMut(&str, u64) -> Result<DynamicImage>,
{
    fn synthesize(&mut self, caption: &str, seed: u64) -> Result<DynamicImage> {
        self(caption, seed)
    }
}

/// Seed for the scene at 0-based position `index`.
pub fn seed_for(index: usize) -> u64 {
    BASE_SEED + index as u64
}

/// `panel_01.png`, `panel_02.png`, ...
pub fn panel_file_name(number: usize) -> String {
    format!("panel_{:02}.png", number)
}

/// A synthesized image, its caption, and where it was saved.
#[derive(Debug, Clone)]
pub struct SynthesizedPanel {
    pub caption: String,
    pub image: DynamicImage,
    pub path: PathBuf,
}

/// Synthesize one image per scene and save each under `images_dir`.
///
/// Runs strictly in scene order. The first failure stops the run and is
/// returned; images saved before it stay on disk.
pub fn synthesize_panels<S: Synthesizer + ?Sized>(
    scenes: &[Scene],
    synth: &mut S,
    images_dir: &Path,
) -> Result<Vec<SynthesizedPanel>> {
    std::fs::create_dir_all(images_dir)?;

    let mut panels = Vec::with_capacity(scenes.len());
    for (i, scene) in scenes.iter().enumerate() {
        let image = synth.synthesize(&scene.text, seed_for(i))?;
        let path = images_dir.join(panel_file_name(i + 1));
        image.save(&path)?;
        info!(path = %path.display(), scene = scene.index, "Saved panel");
        panels.push(SynthesizedPanel {
            caption: scene.text.clone(),
            image,
            path,
        });
    }
    Ok(panels)
}

/// Offline synthesizer: a framed diagonal gradient whose colors depend only
/// on the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSynthesizer {
    pub width: u32,
    pub height: u32,
}

impl Default for PlaceholderSynthesizer {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

const FRAME_WIDTH: u32 = 4;
const FRAME_COLOR: Rgb<u8> = Rgb([32, 32, 32]);

impl PlaceholderSynthesizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn draw(&self, seed: u64) -> RgbImage {
        let mut state = seed;
        let from = seeded_color(&mut state);
        let to = seeded_color(&mut state);
        let (w, h) = (self.width.max(1), self.height.max(1));
        let span = (w + h).saturating_sub(2).max(1) as f32;

        RgbImage::from_fn(w, h, |x, y| {
            let on_frame = x < FRAME_WIDTH
                || y < FRAME_WIDTH
                || x + FRAME_WIDTH >= w
                || y + FRAME_WIDTH >= h;
            if on_frame {
                return FRAME_COLOR;
            }
            let t = (x + y) as f32 / span;
            Rgb([
                lerp(from[0], to[0], t),
                lerp(from[1], to[1], t),
                lerp(from[2], to[2], t),
            ])
        })
    }
}

impl Synthesizer for PlaceholderSynthesizer {
    fn synthesize(&mut self, _caption: &str, seed: u64) -> Result<DynamicImage> {
        Ok(DynamicImage::ImageRgb8(self.draw(seed)))
    }
}

/// splitmix64 step.
fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn seeded_color(state: &mut u64) -> [u8; 3] {
    let bits = next_u64(state).to_le_bytes();
    [bits[0], bits[1], bits[2]]
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}
