//! # PDF Writer
//!
//! A small page-oriented PDF 1.7 document builder: create a document with a
//! page format, add pages, clip, draw images, serialize. The assembler in
//! [`assemble`] drives it; nothing else in the crate writes PDF.
//!
//! We write the raw bytes ourselves. The subset needed to place raster
//! images on pages is small, and it keeps the crate self-contained.
//!
//! ## Coordinates
//!
//! The builder API works in millimeters with the origin at the **top-left**
//! of the page, y growing downward, like the layout it serves. Content
//! streams are written in PDF points with the origin at the bottom-left; the
//! flip happens in one place, [`PdfDocument::to_pdf_rect`].
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- Catalog
//! 2 0 obj ... endobj  <- Pages tree
//! 3 0 obj ... endobj  <- image XObjects, then content + page pairs
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```

pub mod assemble;

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use base64::Engine;
use image::RgbImage;
use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{ExportError, Result};
use crate::geometry::{PageGeometry, PT_PER_MM};
use crate::model::{ImageEncoding, Metadata};

/// Handle to an image embedded in a [`PdfDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHandle(usize);

/// Filter an embedded image stream is encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageFilter {
    Flate,
    Dct,
}

#[derive(Debug, Clone)]
struct EmbeddedImage {
    width_px: u32,
    height_px: u32,
    filter: ImageFilter,
    data: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct PageContent {
    ops: String,
    /// Images drawn on this page, in first-use order.
    images: Vec<usize>,
    /// Open `q` operators not yet matched by `Q`.
    depth: usize,
}

/// An in-memory PDF document.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    width_mm: f64,
    height_mm: f64,
    metadata: Metadata,
    pages: Vec<PageContent>,
    images: Vec<EmbeddedImage>,
}

/// Tracks allocated PDF objects during serialization.
struct PdfBuilder {
    objects: Vec<Vec<u8>>,
}

impl PdfBuilder {
    /// Reserve the next object number.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(data);
        self.objects.len() - 1
    }
}

impl PdfDocument {
    /// Create a document with one empty page of the given size.
    pub fn new(width_mm: f64, height_mm: f64, metadata: Metadata) -> Self {
        Self {
            width_mm,
            height_mm,
            metadata,
            pages: vec![PageContent::default()],
            images: Vec::new(),
        }
    }

    pub fn for_geometry(geometry: &PageGeometry, metadata: Metadata) -> Self {
        Self::new(geometry.width_mm, geometry.height_mm, metadata)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Start a new page. Drawing calls go to the newest page.
    pub fn add_page(&mut self) {
        self.pages.push(PageContent::default());
    }

    /// The uncompressed operators of one page.
    pub fn page_content(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(|p| p.ops.as_str())
    }

    fn current(&mut self) -> &mut PageContent {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn save_graphics_state(&mut self) {
        let page = self.current();
        page.ops.push_str("q\n");
        page.depth += 1;
    }

    /// Pop the last saved state. Unbalanced calls are ignored.
    pub fn restore_graphics_state(&mut self) {
        let page = self.current();
        if page.depth > 0 {
            page.ops.push_str("Q\n");
            page.depth -= 1;
        }
    }

    /// Intersect the clipping path with a rectangle. Lasts until the
    /// enclosing graphics state is restored.
    pub fn clip_rect(&mut self, x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) {
        let (x, y, w, h) = self.to_pdf_rect(x_mm, y_mm, width_mm, height_mm);
        let _ = write!(self.current().ops, "{:.4} {:.4} {:.4} {:.4} re W n\n", x, y, w, h);
    }

    /// Embed an image once; it can then be drawn on any number of pages.
    pub fn add_image(&mut self, image: &RgbImage, encoding: ImageEncoding) -> Result<ImageHandle> {
        let (width_px, height_px) = image.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(ExportError::Assembly(format!(
                "cannot embed a {}x{} image",
                width_px, height_px
            )));
        }

        let (filter, data) = match encoding {
            ImageEncoding::Flate => (ImageFilter::Flate, compress_to_vec_zlib(image.as_raw(), 6)),
            ImageEncoding::Jpeg { quality } => {
                let mut buf = Vec::new();
                {
                    let mut encoder =
                        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
                    encoder
                        .encode(image.as_raw(), width_px, height_px, image::ColorType::Rgb8)
                        .map_err(|e| ExportError::Assembly(format!("JPEG encoding failed: {}", e)))?;
                }
                (ImageFilter::Dct, buf)
            }
        };

        self.images.push(EmbeddedImage {
            width_px,
            height_px,
            filter,
            data,
        });
        Ok(ImageHandle(self.images.len() - 1))
    }

    /// Draw an embedded image scaled into the given rectangle. The rectangle
    /// may extend past the page; only the clipped part is visible.
    pub fn draw_image(&mut self, handle: ImageHandle, x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) {
        let (x, y, w, h) = self.to_pdf_rect(x_mm, y_mm, width_mm, height_mm);
        let page = self.current();
        if !page.images.contains(&handle.0) {
            page.images.push(handle.0);
        }
        let _ = write!(
            page.ops,
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/Im{} Do\nQ\n",
            w, h, x, y, handle.0
        );
    }

    /// Top-left millimeters to bottom-left points.
    fn to_pdf_rect(&self, x_mm: f64, y_mm: f64, width_mm: f64, height_mm: f64) -> (f64, f64, f64, f64) {
        (
            x_mm * PT_PER_MM,
            (self.height_mm - y_mm - height_mm) * PT_PER_MM,
            width_mm * PT_PER_MM,
            height_mm * PT_PER_MM,
        )
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.to_bytes())
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:application/pdf;base64,{}", self.to_base64())
    }

    /// Serialize the document to PDF bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Object 0 is the free-list head; 1 = Catalog, 2 = Pages.
        let mut builder = PdfBuilder {
            objects: vec![Vec::new()],
        };
        let catalog_id = builder.reserve();
        let pages_id = builder.reserve();

        let image_ids: Vec<usize> = self
            .images
            .iter()
            .map(|img| builder.push(Self::image_xobject(img)))
            .collect();

        let width_pt = self.width_mm * PT_PER_MM;
        let height_pt = self.height_mm * PT_PER_MM;
        let mut page_obj_ids = Vec::with_capacity(self.pages.len());

        for page in &self.pages {
            let mut ops = page.ops.clone();
            for _ in 0..page.depth {
                ops.push_str("Q\n");
            }
            let compressed = compress_to_vec_zlib(ops.as_bytes(), 6);
            let mut content: Vec<u8> = Vec::new();
            let _ = write!(
                content,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content.extend_from_slice(&compressed);
            content.extend_from_slice(b"\nendstream");
            let content_id = builder.push(content);

            let xobjects = page
                .images
                .iter()
                .map(|&idx| format!("/Im{} {} 0 R", idx, image_ids[idx]))
                .collect::<Vec<_>>()
                .join(" ");
            let resources = if xobjects.is_empty() {
                String::from("<< >>")
            } else {
                format!("<< /XObject << {} >> >>", xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources {} >>",
                pages_id, width_pt, height_pt, content_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[catalog_id] = format!("<< /Type /Catalog /Pages {} 0 R >>", pages_id).into_bytes();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[pages_id] = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info_id = self.info_dictionary().map(|info| builder.push(info.into_bytes()));

        Self::serialize(&builder, catalog_id, info_id)
    }

    fn image_xobject(image: &EmbeddedImage) -> Vec<u8> {
        let filter = match image.filter {
            ImageFilter::Flate => "/FlateDecode",
            ImageFilter::Dct => "/DCTDecode",
        };
        let mut obj: Vec<u8> = Vec::new();
        let _ = write!(
            obj,
            "<< /Type /XObject /Subtype /Image \
             /Width {} /Height {} \
             /ColorSpace /DeviceRGB \
             /BitsPerComponent 8 \
             /Filter {} \
             /Length {} >>\nstream\n",
            image.width_px,
            image.height_px,
            filter,
            image.data.len()
        );
        obj.extend_from_slice(&image.data);
        obj.extend_from_slice(b"\nendstream");
        obj
    }

    fn info_dictionary(&self) -> Option<String> {
        let m = &self.metadata;
        if m.title.is_none() && m.author.is_none() && m.subject.is_none() && m.creator.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &m.title),
            ("Author", &m.author),
            ("Subject", &m.subject),
            ("Creator", &m.creator),
        ];
        for (key, value) in entries {
            if let Some(v) = value {
                let _ = write!(info, "/{} ({}) ", key, escape_pdf_string(v));
            }
        }
        info.push_str("/Producer (resume-export) >>");
        Some(info)
    }

    fn serialize(builder: &PdfBuilder, root_id: usize, info_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(obj);
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
            "trailer\n<< /Size {} /Root {} 0 R",
            builder.objects.len(),
            root_id
        );
        if let Some(info) = info_id {
            let _ = write!(output, " /Info {} 0 R", info);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

/// Escape special characters in a PDF literal string.
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}
