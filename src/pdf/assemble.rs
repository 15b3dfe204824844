//! # Multi-Page Assembly
//!
//! Cuts one tall raster into page-height bands. The image is never cropped:
//! every page draws the whole image, shifted up by one printable height per
//! page, and clips to the printable rectangle so only that page's band shows.
//!
//! The image is scaled to fill the printable width exactly; its height in
//! millimeters follows from the aspect ratio. Bands are contiguous and do not
//! overlap, so every pixel row appears on exactly one page.

use image::RgbImage;
use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::geometry::PageGeometry;
use crate::model::{ImageEncoding, Metadata};

use super::PdfDocument;

/// Tolerance for the page count, so an image exactly N pages tall does not
/// round up to N + 1 through floating-point noise.
const PAGE_EPSILON: f64 = 1e-9;

/// How a raster of a given size divides into pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlicePlan {
    pub image_width_mm: f64,
    pub image_height_mm: f64,
    /// Height of one band: the printable page height.
    pub page_height_mm: f64,
    pub total_pages: usize,
}

impl SlicePlan {
    pub fn compute(width_px: u32, height_px: u32, geometry: &PageGeometry) -> Result<Self> {
        if width_px == 0 || height_px == 0 {
            return Err(ExportError::Assembly(format!(
                "raster has no area ({}x{} px)",
                width_px, height_px
            )));
        }
        let aspect_ratio = width_px as f64 / height_px as f64;
        let image_width_mm = geometry.printable_width_mm();
        let image_height_mm = image_width_mm / aspect_ratio;
        let page_height_mm = geometry.printable_height_mm();

        let total_pages = ((image_height_mm / page_height_mm - PAGE_EPSILON).ceil()).max(1.0) as usize;
        Ok(Self {
            image_width_mm,
            image_height_mm,
            page_height_mm,
            total_pages,
        })
    }

    /// Vertical offset of the image on page `page`, relative to the top of
    /// the printable area.
    pub fn offset_mm(&self, page: usize) -> f64 {
        -(page as f64) * self.page_height_mm
    }

    /// The slice of the image, in image millimeters, visible on `page`.
    pub fn visible_range(&self, page: usize) -> (f64, f64) {
        let start = page as f64 * self.page_height_mm;
        let end = (start + self.page_height_mm).min(self.image_height_mm);
        (start, end)
    }
}

/// Build a multi-page document from one tall raster.
pub fn assemble(
    image: &RgbImage,
    geometry: &PageGeometry,
    encoding: ImageEncoding,
    metadata: Metadata,
) -> Result<(PdfDocument, SlicePlan)> {
    let plan = SlicePlan::compute(image.width(), image.height(), geometry)?;

    let mut doc = PdfDocument::for_geometry(geometry, metadata);
    let handle = doc.add_image(image, encoding)?;

    let left = geometry.margin.left;
    let top = geometry.margin.top;
    for page in 0..plan.total_pages {
        if page > 0 {
            doc.add_page();
        }
        doc.save_graphics_state();
        doc.clip_rect(left, top, plan.image_width_mm, plan.page_height_mm);
        doc.draw_image(
            handle,
            left,
            top + plan.offset_mm(page),
            plan.image_width_mm,
            plan.image_height_mm,
        );
        doc.restore_graphics_state();
    }

    log::debug!(
        "assembled {} page(s) from a {}x{} px raster ({:.2} mm tall)",
        plan.total_pages,
        image.width(),
        image.height(),
        plan.image_height_mm
    );
    Ok((doc, plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageSize;
    use crate::style::Edges;
    use image::Rgb;

    fn a4() -> PageGeometry {
        PageGeometry::from_key("a4").unwrap()
    }

    #[test]
    fn aspect_210_by_594_is_two_pages() {
        let plan = SlicePlan::compute(2100, 5940, &a4()).unwrap();
        assert!((plan.image_height_mm - 594.0).abs() < 1e-9);
        assert_eq!(plan.total_pages, 2);
    }

    #[test]
    fn partial_last_page_rounds_up() {
        let plan = SlicePlan::compute(2100, 3000, &a4()).unwrap();
        assert!((plan.image_height_mm - 300.0).abs() < 1e-9);
        assert_eq!(plan.total_pages, 2);
    }

    #[test]
    fn short_image_is_one_page() {
        let plan = SlicePlan::compute(800, 1, &a4()).unwrap();
        assert_eq!(plan.total_pages, 1);
    }

    #[test]
    fn bands_cover_the_image_without_gaps_or_overlap() {
        for &(w, h) in &[(2100u32, 5940u32), (3175, 12001), (816, 1057), (1000, 1)] {
            let plan = SlicePlan::compute(w, h, &a4()).unwrap();
            let expected = (plan.image_height_mm / plan.page_height_mm - 1e-9).ceil().max(1.0) as usize;
            assert_eq!(plan.total_pages, expected);

            let mut covered = 0.0;
            for p in 0..plan.total_pages {
                let (start, end) = plan.visible_range(p);
                assert!((start - covered).abs() < 1e-9, "gap or overlap before page {}", p);
                assert!(end > start);
                assert!((plan.offset_mm(p) + start).abs() < 1e-9);
                covered = end;
            }
            assert!((covered - plan.image_height_mm).abs() < 1e-6);
        }
    }

    #[test]
    fn zero_sized_raster_is_an_assembly_error() {
        assert!(matches!(
            SlicePlan::compute(0, 100, &a4()),
            Err(ExportError::Assembly(_))
        ));
        assert!(SlicePlan::compute(100, 0, &a4()).is_err());
    }

    #[test]
    fn every_page_clips_and_draws_at_its_offset() {
        let image = RgbImage::from_pixel(210, 594, Rgb([255, 255, 255]));
        let (doc, plan) = assemble(&image, &a4(), ImageEncoding::Flate, Metadata::default()).unwrap();
        assert_eq!(plan.total_pages, 2);
        assert_eq!(doc.page_count(), 2);

        for p in 0..2 {
            let ops = doc.page_content(p).unwrap();
            assert!(ops.starts_with("q\n"));
            assert!(ops.contains("re W n"));
            assert!(ops.contains("/Im0 Do"));
            assert!(ops.ends_with("Q\n"));
        }
        // Page two draws the image shifted up by one page.
        let k = crate::geometry::PT_PER_MM;
        let first = doc.page_content(0).unwrap();
        let second = doc.page_content(1).unwrap();
        assert!(first.contains(&format!("0.0000 {:.4} cm", -297.0 * k)));
        assert!(second.contains("0.0000 0.0000 cm"));
    }

    #[test]
    fn margins_move_the_printable_band() {
        let geometry = PageGeometry::new(PageSize::Letter, Edges::uniform(10.0)).unwrap();
        let image = RgbImage::from_pixel(100, 100, Rgb([0, 0, 0]));
        let (doc, plan) = assemble(&image, &geometry, ImageEncoding::Flate, Metadata::default()).unwrap();
        assert!((plan.image_width_mm - 195.9).abs() < 1e-9);
        assert!((plan.page_height_mm - 259.4).abs() < 1e-9);
        assert_eq!(doc.page_count(), 1);
        let k = crate::geometry::PT_PER_MM;
        let clip = format!(
            "{:.4} {:.4} {:.4} {:.4} re W n",
            10.0 * k,
            (279.4 - 10.0 - 259.4) * k,
            195.9 * k,
            259.4 * k
        );
        assert!(doc.page_content(0).unwrap().contains(&clip));
    }
}
