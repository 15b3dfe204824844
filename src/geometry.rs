//! Page geometry derived from a page-size selection.
//!
//! Everything the planner and the assembler need to agree on lives here: the
//! physical page in millimeters, the printable band after margins, and the
//! same band in CSS pixels. The planner breaks at multiples of
//! [`PageGeometry::printable_height_px`]; the assembler slices at multiples of
//! [`PageGeometry::printable_height_mm`]. Both describe the same length.

use crate::error::{ExportError, Result};
use crate::model::PageSize;
use crate::style::{Edges, CSS_PX_PER_INCH};

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// CSS pixels per millimeter at 96 DPI.
pub const PX_PER_MM: f64 = CSS_PX_PER_INCH / MM_PER_INCH;

/// PDF points per millimeter.
pub const PT_PER_MM: f64 = 72.0 / MM_PER_INCH;

/// Immutable page geometry for one export call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_size: PageSize,
    pub width_mm: f64,
    pub height_mm: f64,
    /// Page margins in millimeters.
    pub margin: Edges,
}

impl PageGeometry {
    pub fn new(page_size: PageSize, margin: Edges) -> Result<Self> {
        let (width_mm, height_mm) = page_size.dimensions_mm();
        let finite = [margin.top, margin.right, margin.bottom, margin.left]
            .iter()
            .all(|m| m.is_finite() && *m >= 0.0);
        if !finite || margin.horizontal() >= width_mm || margin.vertical() >= height_mm {
            return Err(ExportError::Assembly(format!(
                "margins {:?} leave no printable area on a {} page",
                margin, page_size
            )));
        }
        Ok(Self {
            page_size,
            width_mm,
            height_mm,
            margin,
        })
    }

    /// Look up a page by its key (`"a4"`, `"letter"`) with no margins.
    pub fn from_key(key: &str) -> Result<Self> {
        Self::new(key.parse()?, Edges::default())
    }

    pub fn printable_width_mm(&self) -> f64 {
        self.width_mm - self.margin.horizontal()
    }

    pub fn printable_height_mm(&self) -> f64 {
        self.height_mm - self.margin.vertical()
    }

    pub fn width_px(&self) -> f64 {
        self.width_mm * PX_PER_MM
    }

    pub fn height_px(&self) -> f64 {
        self.height_mm * PX_PER_MM
    }

    /// Width the document root is laid out at.
    pub fn printable_width_px(&self) -> f64 {
        self.printable_width_mm() * PX_PER_MM
    }

    /// Vertical distance between page boundaries in layout coordinates.
    pub fn printable_height_px(&self) -> f64 {
        self.printable_height_mm() * PX_PER_MM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a4_pixels() {
        let g = PageGeometry::from_key("a4").unwrap();
        assert!((g.width_px() - 793.7).abs() < 0.1);
        assert!((g.height_px() - 1122.5).abs() < 0.1);
        assert_eq!(g.printable_height_mm(), 297.0);
    }

    #[test]
    fn test_letter_dimensions() {
        let g = PageGeometry::from_key("letter").unwrap();
        assert_eq!(g.width_mm, 215.9);
        assert_eq!(g.height_mm, 279.4);
        assert!((g.width_px() - 816.0).abs() < 1e-6);
    }

    #[test]
    fn test_margins_shrink_printable_area() {
        let g = PageGeometry::new(PageSize::A4, Edges::symmetric(10.0, 15.0)).unwrap();
        assert_eq!(g.printable_width_mm(), 180.0);
        assert_eq!(g.printable_height_mm(), 277.0);
    }

    #[test]
    fn test_margins_consuming_page_rejected() {
        let result = PageGeometry::new(PageSize::A5, Edges::symmetric(120.0, 0.0));
        assert!(matches!(result, Err(ExportError::Assembly(_))));
        let result = PageGeometry::new(PageSize::A4, Edges::uniform(-1.0));
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_key_is_assembly_error() {
        assert!(matches!(
            PageGeometry::from_key("b5"),
            Err(ExportError::Assembly(_))
        ));
    }
}
