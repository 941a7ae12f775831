//! # PDF Assembly
//!
//! Combines rendered page images into one multi-page PDF, one image per page
//! in input order.
//!
//! This is a small from-scratch PDF 1.7 writer. Each page is a single image
//! XObject drawn full-bleed on a media box the size of the image (one pixel
//! per point, i.e. 72 dpi).
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages tree
//! 3 0 obj ... endobj  <- per page: image XObject, content stream, Page
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use miniz_oxide::deflate::compress_to_vec_zlib;
use tracing::info;

use crate::error::{Result, StoryformeError};
use crate::image_loader::{load_page, ImagePixelData, LoadedImage};

/// Document-level metadata written to the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Load every page in `page_paths` and write them to `out_path` as one PDF.
///
/// Fails with [`StoryformeError::EmptyInput`] before touching the filesystem
/// when `page_paths` is empty. Unreadable or undecodable pages fail with the
/// underlying error and nothing is written.
pub fn assemble<P: AsRef<Path>>(page_paths: &[P], out_path: &Path) -> Result<PathBuf> {
    assemble_with_metadata(page_paths, out_path, &Metadata::default())
}

/// [`assemble`] with a title/author for the Info dictionary.
pub fn assemble_with_metadata<P: AsRef<Path>>(
    page_paths: &[P],
    out_path: &Path,
    metadata: &Metadata,
) -> Result<PathBuf> {
    if page_paths.is_empty() {
        return Err(StoryformeError::EmptyInput);
    }

    let pages = page_paths
        .iter()
        .map(|p| load_page(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    let bytes = PdfWriter::new().write(&pages, metadata);
    std::fs::write(out_path, &bytes)?;
    info!(
        path = %out_path.display(),
        pages = pages.len(),
        bytes = bytes.len(),
        "Assembled storyboard PDF"
    );
    Ok(out_path.to_path_buf())
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    /// Append an object and return its id.
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write one page per image to a PDF byte vector.
    pub fn write(&self, pages: &[LoadedImage], metadata: &Metadata) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = per page: image XObject, content stream, page
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });

        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(pages.len());

        for page in pages {
            let image_obj_id = Self::write_image_xobject(&mut builder, page);

            let width = page.width_px as f64;
            let height = page.height_px as f64;
            let content = format!("q\n{:.2} 0 0 {:.2} 0 0 cm\n/Im0 Do\nQ\n", width, height);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /XObject << /Im0 {} 0 R >> >> >>",
                width, height, content_obj_id, image_obj_id
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        // Write Catalog (object 1)
        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        // Write Pages tree (object 2)
        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        // Info dictionary (metadata)
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            info.push_str(&format!("/Title {} ", Self::pdf_text_string(title)));
        }
        if let Some(ref author) = metadata.author {
            info.push_str(&format!("/Author {} ", Self::pdf_text_string(author)));
        }
        info.push_str("/Producer (storyforme) /Creator (storyforme) >>");
        let info_obj_id = builder.push(info.into_bytes());

        self.serialize(&builder, info_obj_id)
    }

    /// Write a single page image as an XObject. Returns its object ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        let (filter, payload) = match &image.pixel_data {
            ImagePixelData::Jpeg(data) => ("/DCTDecode", data.clone()),
            ImagePixelData::Rgb(rgb) => ("/FlateDecode", compress_to_vec_zlib(rgb, 6)),
        };

        let mut obj_data: Vec<u8> = Vec::new();
        let _ = write!(
            obj_data,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter {} \
             /Length {} >>\nstream\n",
            image.width_px,
            image.height_px,
            filter,
            payload.len()
        );
        obj_data.extend_from_slice(&payload);
        obj_data.extend_from_slice(b"\nendstream");
        builder.push(obj_data)
    }

    /// Encode a string for the Info dictionary: a literal string when it is
    /// printable ASCII, otherwise UTF-16BE hex with a byte-order mark.
    fn pdf_text_string(s: &str) -> String {
        if s.chars().all(|c| (' '..='~').contains(&c)) {
            return format!("({})", Self::escape_pdf_string(s));
        }
        let mut hex = String::from("<FEFF");
        for unit in s.encode_utf16() {
            hex.push_str(&format!("{:04X}", unit));
        }
        hex.push('>');
        hex
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
