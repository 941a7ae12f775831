//! Integration tests for the storyforme pipeline.
//!
//! These tests exercise the full path from story text to page images and PDF.
//! They verify:
//! - Scene splitting feeds the right number of panels
//! - Pagination and dynamic page height
//! - Output file naming is stable across runs
//! - PDF output is structurally valid and ordered
//! - Failures leave earlier output in place

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use storyforme::config::{GridConfig, StoryboardConfig};
use storyforme::layout::{self, Panel, PageLayoutEngine};
use storyforme::pipeline::{self, PdfOutput, IMAGES_DIR, PAGES_DIR, PDF_FILE_NAME};
use storyforme::synth::{seed_for, PlaceholderSynthesizer};
use storyforme::{pdf, FontMetrics, Metadata, Result, StoryformeError};

// ─── Helpers ────────────────────────────────────────────────────

/// `n` sentences of exactly five words each, so each becomes one scene.
fn story_with_scenes(n: usize) -> String {
    (1..=n)
        .map(|i| format!("Scene {} shows the keeper.", i))
        .collect::<Vec<_>>()
        .join(" ")
}

fn small_grid() -> GridConfig {
    GridConfig {
        cols: 3,
        rows_per_page: 3,
        panel_width: 48,
        panel_height: 36,
        caption_height: 30,
    }
}

fn small_config() -> StoryboardConfig {
    StoryboardConfig {
        grid: small_grid(),
        ..Default::default()
    }
}

fn placeholder() -> PlaceholderSynthesizer {
    PlaceholderSynthesizer::new(20, 20)
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn count(haystack: &[u8], needle: &[u8]) -> usize {
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 50, "PDF is too small to be valid");
    assert!(bytes.starts_with(b"%PDF-1.7"), "PDF must start with %PDF-1.7 header");
    assert!(
        bytes.windows(5).any(|w| w == b"%%EOF"),
        "PDF must contain %%EOF marker"
    );
    assert!(bytes.windows(4).any(|w| w == b"xref"), "PDF must contain xref table");
}

// ─── Full Pipeline Tests ────────────────────────────────────────

#[test]
fn test_ten_scenes_make_two_pages() {
    let dir = tempfile::tempdir().unwrap();
    let doc = pipeline::generate(
        &story_with_scenes(10),
        &small_config(),
        FontMetrics::FixedWidth,
        &mut placeholder(),
        dir.path(),
        &PdfOutput::Skip,
    )
    .unwrap();

    assert_eq!(doc.scenes.len(), 10);
    assert_eq!(doc.pages.len(), 2);

    let full = &doc.pages[0];
    assert_eq!(full.plan.panel_count, 9);
    assert_eq!(full.plan.rows, 3);
    let short = &doc.pages[1];
    assert_eq!(short.plan.panel_count, 1);
    assert_eq!(short.plan.rows, 1);

    let first = image::open(&full.path).unwrap();
    let last = image::open(&short.path).unwrap();
    assert_eq!(first.dimensions(), (3 * 48, 3 * (36 + 30)));
    assert_eq!(last.dimensions(), (3 * 48, 36 + 30));
}

#[test]
fn test_seven_scenes_fit_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let doc = pipeline::generate(
        &story_with_scenes(7),
        &small_config(),
        FontMetrics::FixedWidth,
        &mut placeholder(),
        dir.path(),
        &PdfOutput::Skip,
    )
    .unwrap();

    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.pages[0].plan.rows, 3);
    assert_eq!(doc.pages[0].plan.height, 3 * 66);
}

#[test]
fn test_output_layout_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    pipeline::generate(
        &story_with_scenes(4),
        &small_config(),
        FontMetrics::FixedWidth,
        &mut placeholder(),
        dir.path(),
        &PdfOutput::Skip,
    )
    .unwrap();

    assert_eq!(
        file_names(&dir.path().join(IMAGES_DIR)),
        vec!["panel_01.png", "panel_02.png", "panel_03.png", "panel_04.png"]
    );
    assert_eq!(
        file_names(&dir.path().join(PAGES_DIR)),
        vec!["storyboard_page_01.png"]
    );
}

#[test]
fn test_reruns_produce_same_file_names() {
    let story = story_with_scenes(12);
    let mut runs: Vec<Vec<String>> = Vec::new();
    for _ in 0..2 {
        let dir = tempfile::tempdir().unwrap();
        let doc = pipeline::generate(
            &story,
            &small_config(),
            FontMetrics::FixedWidth,
            &mut placeholder(),
            dir.path(),
            &PdfOutput::Skip,
        )
        .unwrap();
        assert_eq!(doc.pages.len(), 2);
        runs.push(file_names(&dir.path().join(PAGES_DIR)));
    }
    assert_eq!(runs[0], runs[1]);
}

#[test]
fn test_generate_with_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let doc = pipeline::generate(
        &story_with_scenes(10),
        &small_config(),
        FontMetrics::FixedWidth,
        &mut placeholder(),
        dir.path(),
        &PdfOutput::Write(Metadata {
            title: Some("The Keeper".to_string()),
            author: None,
        }),
    )
    .unwrap();

    let pdf_path = doc.pdf.clone().unwrap();
    assert_eq!(pdf_path, dir.path().join(PDF_FILE_NAME));
    let bytes = std::fs::read(&pdf_path).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, b"/Type /Page "), 2);
    assert!(count(&bytes, b"/Count 2") == 1);
    assert!(count(&bytes, b"/Title (The Keeper)") == 1);
}

#[test]
fn test_max_scenes_caps_panels() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = small_config();
    config.split.max_scenes = 3;
    let doc = pipeline::generate(
        &story_with_scenes(10),
        &config,
        FontMetrics::FixedWidth,
        &mut placeholder(),
        dir.path(),
        &PdfOutput::Skip,
    )
    .unwrap();

    assert_eq!(doc.scenes.len(), 3);
    assert_eq!(doc.panel_paths.len(), 3);
    assert_eq!(doc.pages[0].plan.rows, 1);
}

// ─── Failure Tests ──────────────────────────────────────────────

#[test]
fn test_empty_story_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("run");
    let err = pipeline::generate(
        "",
        &small_config(),
        FontMetrics::FixedWidth,
        &mut placeholder(),
        &out,
        &PdfOutput::Write(Metadata::default()),
    )
    .unwrap_err();
    assert!(matches!(err, StoryformeError::EmptyStory));
    assert!(!out.exists());
}

#[test]
fn test_synthesis_failure_keeps_earlier_panels() {
    let dir = tempfile::tempdir().unwrap();
    let mut synth = |_: &str, seed: u64| -> Result<DynamicImage> {
        if seed == seed_for(3) {
            return Err(StoryformeError::Synthesis("out of memory".to_string()));
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::new(10, 10)))
    };

    let err = pipeline::generate(
        &story_with_scenes(6),
        &small_config(),
        FontMetrics::FixedWidth,
        &mut synth,
        dir.path(),
        &PdfOutput::Skip,
    )
    .unwrap_err();

    assert!(matches!(err, StoryformeError::Synthesis(_)));
    assert_eq!(
        file_names(&dir.path().join(IMAGES_DIR)),
        vec!["panel_01.png", "panel_02.png", "panel_03.png"]
    );
    assert!(!dir.path().join(PAGES_DIR).exists());
}

#[test]
fn test_assemble_empty_page_list() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(PDF_FILE_NAME);
    let pages: Vec<PathBuf> = Vec::new();
    assert!(matches!(
        pdf::assemble(&pages, &out),
        Err(StoryformeError::EmptyInput)
    ));
    assert!(!out.exists());
}

// ─── Layout + Assembly Tests ────────────────────────────────────

#[test]
fn test_layout_then_assemble_keeps_page_order() {
    let dir = tempfile::tempdir().unwrap();
    let images: Vec<DynamicImage> = (0..9u8)
        .map(|i| DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb([i * 20, 0, 0]))))
        .collect();
    let captions: Vec<String> = (1..=9).map(|i| format!("Panel {}", i)).collect();
    let panels: Vec<Panel<'_>> = captions
        .iter()
        .zip(&images)
        .map(|(c, img)| Panel::new(c, img))
        .collect();

    let grid = GridConfig {
        cols: 2,
        rows_per_page: 2,
        ..small_grid()
    };
    let pages = layout::render(&panels, &grid, &FontMetrics::FixedWidth, &dir.path().join("pages"))
        .unwrap();
    assert_eq!(pages.len(), 3);
    assert_eq!(
        pages.iter().map(|p| p.plan.panel_count).collect::<Vec<_>>(),
        vec![4, 4, 1]
    );
    assert_eq!(pages[2].plan.height, 66);

    let page_paths: Vec<&Path> = pages.iter().map(|p| p.path.as_path()).collect();
    let out = dir.path().join("board.pdf");
    pdf::assemble(&page_paths, &out).unwrap();
    let bytes = std::fs::read(&out).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(count(&bytes, b"/Type /Page "), 3);
    assert_eq!(count(&bytes, b"/Count 3"), 1);

    // The short page was rendered last, so it must be the last PDF page.
    let text = String::from_utf8_lossy(&bytes);
    let tall = "/MediaBox [0 0 96.00 132.00]";
    let short = "/MediaBox [0 0 96.00 66.00]";
    assert_eq!(text.matches(tall).count(), 2);
    assert!(text.rfind(tall).unwrap() < text.find(short).unwrap());
}

#[test]
fn test_engine_plan_matches_render() {
    let engine = PageLayoutEngine::new(small_grid(), FontMetrics::FixedWidth).unwrap();
    let plans = engine.plan(19);
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[2].panel_count, 1);
    assert_eq!(plans[2].height, 66);
    assert!(plans.iter().all(|p| p.width == 144));
}
