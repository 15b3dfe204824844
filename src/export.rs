//! # Export Pipeline
//!
//! Wires the stages together for one export call:
//!
//! ```text
//! measure → plan → [apply spacers → rasterize → revert] → assemble
//! ```
//!
//! The bracketed part runs inside a [`SpacerGuard`], so the tree is restored
//! whether rasterization succeeds, fails, or panics. Nothing is cached between
//! calls: every export measures the tree from scratch.

use image::RgbImage;
use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::geometry::PageGeometry;
use crate::layout::measure::{MeasuredLayout, MeasurementProvider};
use crate::layout::mutator::{LiveTree, SpacerGuard};
use crate::layout::page_break::{plan_page_breaks, BreakPlan};
use crate::layout::{ElementId, LayoutTree};
use crate::model::{Document, ExportOptions, Metadata};
use crate::pdf::assemble::{assemble, SlicePlan};
use crate::pdf::PdfDocument;
use crate::raster::{BoxRasterizer, Rasterizer};

/// Everything one export produces. Owned by the caller.
#[derive(Debug, Clone)]
pub struct ExportResult {
    /// The re-flowed document as one tall image.
    pub raster: RgbImage,
    pub total_pages: usize,
    pub document: PdfDocument,
    pub plan: BreakPlan,
    pub slices: SlicePlan,
}

impl ExportResult {
    pub fn to_bytes(&self) -> Vec<u8> {
        self.document.to_bytes()
    }

    pub fn to_base64(&self) -> String {
        self.document.to_base64()
    }

    /// A serializable summary for logs and tooling.
    pub fn report(&self) -> ExportReport {
        ExportReport {
            total_pages: self.total_pages,
            raster_width_px: self.raster.width(),
            raster_height_px: self.raster.height(),
            spacers: self.plan.spacers.len(),
            total_spacing_px: self.plan.total_spacing(),
            oversized: self.plan.oversized.clone(),
            break_lines_px: self.plan.break_lines(),
            image_height_mm: self.slices.image_height_mm,
        }
    }
}

/// Summary of an export.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub total_pages: usize,
    pub raster_width_px: u32,
    pub raster_height_px: u32,
    pub spacers: usize,
    pub total_spacing_px: f64,
    pub oversized: Vec<ElementId>,
    pub break_lines_px: Vec<f64>,
    pub image_height_mm: f64,
}

/// Export a live tree to a paginated PDF.
///
/// The tree is mutated while the raster is captured and restored before this
/// returns, on every path. Callers must not export the same tree twice at
/// once; the `&mut` borrow enforces that.
pub fn export<T, R>(
    tree: &mut T,
    rasterizer: &R,
    options: &ExportOptions,
    metadata: Metadata,
) -> Result<ExportResult>
where
    T: LiveTree + MeasurementProvider + ?Sized,
    R: Rasterizer<T> + ?Sized,
{
    let geometry = PageGeometry::new(options.page_size, options.margin)?;

    let layout = match tree.measure() {
        Ok(layout) => layout,
        Err(e) => {
            log::warn!("{}; exporting as an empty document", e);
            MeasuredLayout::default()
        }
    };

    let plan = plan_page_breaks(&layout, geometry.printable_height_px(), options.breathing_room);

    let raster = {
        let guard = SpacerGuard::apply(tree, &plan.spacers);
        rasterizer.rasterize(guard.tree(), options.pixel_density)?
    };

    let (document, slices) = assemble(&raster, &geometry, options.image_encoding, metadata)?;
    if slices.total_pages != plan.estimated_pages() {
        log::debug!(
            "raster sliced into {} page(s), planner estimated {}",
            slices.total_pages,
            plan.estimated_pages()
        );
    }

    log::info!(
        "exported {} page(s) on {} with {} spacer(s)",
        slices.total_pages,
        geometry.page_size,
        plan.spacers.len()
    );

    Ok(ExportResult {
        raster,
        total_pages: slices.total_pages,
        document,
        plan,
        slices,
    })
}

/// Lay out a document at the printable width of its page and export it with
/// the wireframe rasterizer.
pub fn export_document(document: &Document) -> Result<ExportResult> {
    let options = &document.options;
    let geometry = PageGeometry::new(options.page_size, options.margin)?;
    let mut tree = LayoutTree::from_document(document, geometry.printable_width_px());
    export(&mut tree, &BoxRasterizer::default(), options, document.metadata.clone())
}

/// Parse a JSON document and export it.
pub fn export_json_document(json: &str) -> Result<ExportResult> {
    let document: Document = serde_json::from_str(json).map_err(ExportError::from)?;
    export_document(&document)
}
