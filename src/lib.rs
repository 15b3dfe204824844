//! # Resume Export
//!
//! Paginated PDF export for a document that was laid out as one continuous
//! vertical flow.
//!
//! An editor lays a resume out like a web page: one long column with no idea
//! where A4 ends. Slicing that column into pages after the fact cuts entries
//! in half. This crate keeps entries whole by moving them, not the page
//! boundary: it measures the flow, inserts top-margin spacers in front of any
//! entry (or its whole section) that would straddle a page boundary, captures
//! the re-flowed document as one tall raster, and then slices that raster
//! into pages of a PDF. The spacers are removed again before the export
//! returns.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]     — Document tree and export options
//!       ↓
//!   [layout]    — Block flow, measurement, page-break plan, spacer mutation
//!       ↓
//!   [raster]    — Re-flowed tree → one tall image
//!       ↓
//!   [pdf]       — Slice the image into pages and serialize to PDF bytes
//! ```
//!
//! The pipeline only talks to the tree through two traits,
//! [`MeasurementProvider`] and [`LiveTree`], and to the renderer through
//! [`Rasterizer`]. [`LayoutTree`] and [`BoxRasterizer`] are the bundled
//! implementations.

pub mod error;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod raster;
pub mod style;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{ExportError, Result};
pub use export::{export, export_document, ExportReport, ExportResult};
pub use geometry::PageGeometry;
pub use layout::measure::{MeasuredLayout, MeasurementProvider};
pub use layout::mutator::{LayoutMutator, LiveTree, SpacerGuard};
pub use layout::page_break::{plan_page_breaks, BreakPlan, BreakTarget, Spacer};
pub use layout::LayoutTree;
pub use model::{Document, ExportOptions, ImageEncoding, Metadata, PageSize};
pub use pdf::PdfDocument;
pub use raster::{BoxRasterizer, Rasterizer};

/// Export a document described as JSON to PDF bytes.
///
/// This is the primary entry point.
pub fn export_json(json: &str) -> Result<Vec<u8>> {
    Ok(export::export_json_document(json)?.to_bytes())
}

/// Export a document described as JSON to base64-encoded PDF bytes.
pub fn export_json_base64(json: &str) -> Result<String> {
    Ok(export::export_json_document(json)?.to_base64())
}
