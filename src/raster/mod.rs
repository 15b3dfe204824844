//! # Rasterizer Adapter
//!
//! Turns a laid-out tree into one tall RGB image. The pipeline only depends on
//! the [`Rasterizer`] trait; an embedding application plugs in whatever
//! renderer produced its layout.
//!
//! [`BoxRasterizer`] is the bundled adapter for [`LayoutTree`]. It draws a
//! wireframe of the document: element backgrounds, dividers, and each line of
//! text as a solid bar of the line's approximate width. That is enough to see
//! pagination at work and to produce a deterministic raster in tests; it is
//! not a text renderer.

use image::{Rgb, RgbImage};

use crate::error::{ExportError, Result};
use crate::layout::{heading_font_size, wrap_text, LayoutBox, LayoutTree};
use crate::model::NodeKind;
use crate::style::Color;

/// Largest canvas side browsers will allocate, and the largest we produce.
pub const MAX_CANVAS_DIMENSION: u32 = 32_767;

/// Captures a tree into a raster image.
pub trait Rasterizer<T: ?Sized> {
    /// Render `tree` at `pixel_density` device pixels per CSS pixel.
    ///
    /// The image must be at least 1×1. Failures surface as
    /// [`ExportError::Rasterization`] and are not retried.
    fn rasterize(&self, tree: &T, pixel_density: f64) -> Result<RgbImage>;
}

/// Wireframe rasterizer for [`LayoutTree`].
#[derive(Debug, Clone)]
pub struct BoxRasterizer {
    pub background: Color,
    /// Color for text bars when the node sets none.
    pub text_color: Color,
    pub divider_color: Color,
    pub max_dimension: u32,
}

impl Default for BoxRasterizer {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            text_color: Color::hex("#333333"),
            divider_color: Color::hex("#cccccc"),
            max_dimension: MAX_CANVAS_DIMENSION,
        }
    }
}

impl Rasterizer<LayoutTree> for BoxRasterizer {
    fn rasterize(&self, tree: &LayoutTree, pixel_density: f64) -> Result<RgbImage> {
        if !(pixel_density.is_finite() && pixel_density > 0.0) {
            return Err(ExportError::Rasterization(format!(
                "pixel density must be a positive number, got {}",
                pixel_density
            )));
        }

        let width = (tree.width() * pixel_density).round();
        let limit = self.max_dimension as f64;
        if !(width >= 1.0 && width <= limit) {
            return Err(ExportError::Rasterization(format!(
                "canvas width of {} px is outside 1..={}",
                width, self.max_dimension
            )));
        }
        // Scale both axes by the rounded width so the image keeps the tree's
        // aspect ratio and page bands line up with layout pixels.
        let scale = width / tree.width();
        let height = (tree.content_height() * scale).round().max(1.0);
        if height > limit {
            return Err(ExportError::Rasterization(format!(
                "canvas of {}x{} px exceeds the {} px limit",
                width, height, self.max_dimension
            )));
        }

        let mut canvas = Canvas {
            image: RgbImage::from_pixel(
                width as u32,
                height as u32,
                Rgb(self.background.blend_over([255, 255, 255])),
            ),
            scale,
        };

        for id in tree.document_order() {
            let element = tree.element(id);
            let bx = tree.layout_box(id);
            if let Some(bg) = element.style.background_color {
                canvas.fill(bx, bg);
            }

            match &element.kind {
                NodeKind::Text { content } => {
                    let color = element.style.color.unwrap_or(self.text_color);
                    let size = element.style.font_size();
                    canvas.text_bars(bx, &element.style.padding(), content, size, element.style.line_box(), color);
                }
                NodeKind::Heading { text } => {
                    let color = element.style.color.unwrap_or(self.text_color);
                    let size = heading_font_size(&element.style);
                    let line = size * element.style.line_height.unwrap_or(1.2);
                    canvas.text_bars(bx, &element.style.padding(), text, size, line, color);
                }
                NodeKind::Section { title: Some(title) } => {
                    let color = element.style.color.unwrap_or(self.text_color);
                    let size = heading_font_size(&element.style);
                    let line = size * element.style.line_height.unwrap_or(1.2);
                    canvas.text_bars(bx, &element.style.padding(), title, size, line, color);
                }
                NodeKind::Divider => {
                    canvas.fill(bx, element.style.color.unwrap_or(self.divider_color));
                }
                _ => {}
            }
        }

        log::debug!("rasterized {}x{} px", canvas.image.width(), canvas.image.height());
        Ok(canvas.image)
    }
}

struct Canvas {
    image: RgbImage,
    scale: f64,
}

impl Canvas {
    /// Fill a CSS-pixel rectangle, clipped to the image.
    fn fill(&mut self, rect: LayoutBox, color: Color) {
        if color.a <= 0.0 || rect.width <= 0.0 || rect.height <= 0.0 {
            return;
        }
        let (w, h) = (self.image.width() as f64, self.image.height() as f64);
        let x0 = (rect.x * self.scale).round().clamp(0.0, w) as u32;
        let y0 = (rect.y * self.scale).round().clamp(0.0, h) as u32;
        let x1 = ((rect.x + rect.width) * self.scale).round().clamp(0.0, w) as u32;
        let y1 = ((rect.y + rect.height) * self.scale).round().clamp(0.0, h) as u32;

        for y in y0..y1 {
            for x in x0..x1 {
                let px = self.image.get_pixel_mut(x, y);
                *px = Rgb(color.blend_over(px.0));
            }
        }
    }

    fn text_bars(
        &mut self,
        bx: LayoutBox,
        padding: &crate::style::Edges,
        content: &str,
        font_size: f64,
        line_box: f64,
        color: Color,
    ) {
        let content_width = (bx.width - padding.horizontal()).max(0.0);
        let bar_height = font_size * 0.6;
        let advance = font_size * 0.5;
        for (i, chars) in wrap_text(content, font_size, content_width).into_iter().enumerate() {
            let line_top = bx.y + padding.top + i as f64 * line_box;
            self.fill(
                LayoutBox {
                    x: bx.x + padding.left,
                    y: line_top + (line_box - bar_height) / 2.0,
                    width: (chars as f64 * advance).min(content_width),
                    height: bar_height,
                },
                color,
            );
        }
    }
}
