//! # Measurement Model
//!
//! Reads the geometry the page-break planner needs out of a laid-out tree:
//! every atomic block and every section, top to bottom, with positions
//! relative to the root. Measurement never mutates anything.

use serde::Serialize;

use crate::error::{ExportError, Result};
use crate::model::NodeKind;

use super::{ElementId, LayoutTree};

/// A content unit that must not be split across a page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtomicBlock {
    pub element: ElementId,
    /// Offset from the root's top edge, in CSS pixels.
    pub top: f64,
    pub height: f64,
    /// Index into [`MeasuredLayout::sections`] of the nearest enclosing section.
    pub owner_section: Option<usize>,
}

impl AtomicBlock {
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// A titled group of blocks. Its top includes the heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub element: ElementId,
    pub top: f64,
    /// Index into [`MeasuredLayout::blocks`] of the first block in this section.
    pub first_block: Option<usize>,
}

/// Geometry snapshot of a document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasuredLayout {
    pub sections: Vec<Section>,
    pub blocks: Vec<AtomicBlock>,
    /// Height of the whole root as measured.
    pub content_height: f64,
}

impl MeasuredLayout {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Whether `block` opens its owning section.
    pub fn is_first_in_section(&self, block: usize) -> bool {
        self.blocks[block]
            .owner_section
            .map(|s| self.sections[s].first_block == Some(block))
            .unwrap_or(false)
    }
}

/// Port through which the pipeline reads geometry from a rendered tree.
pub trait MeasurementProvider {
    /// Produce blocks and sections for the tree as currently laid out.
    ///
    /// A tree with no measurable children yields an empty layout. A tree that
    /// is not laid out yields [`ExportError::Measurement`].
    fn measure(&self) -> Result<MeasuredLayout>;
}

impl MeasurementProvider for LayoutTree {
    fn measure(&self) -> Result<MeasuredLayout> {
        if !self.is_laid_out() {
            return Err(ExportError::Measurement(format!(
                "root element is not laid out (width {})",
                self.width()
            )));
        }

        let mut layout = MeasuredLayout {
            content_height: self.content_height(),
            ..Default::default()
        };
        // Indices into layout.sections of the enclosing section chain.
        let mut open: Vec<usize> = Vec::new();
        collect(self, self.root(), &mut open, &mut layout);
        Ok(layout)
    }
}

fn collect(
    tree: &LayoutTree,
    id: ElementId,
    open: &mut Vec<usize>,
    layout: &mut MeasuredLayout,
) {
    for &child in &tree.element(id).children {
        let bx = tree.layout_box(child);
        match tree.element(child).kind {
            NodeKind::Entry => {
                let owner = open.last().copied();
                let index = layout.blocks.len();
                layout.blocks.push(AtomicBlock {
                    element: child,
                    top: bx.y,
                    height: bx.height,
                    owner_section: owner,
                });
                if let Some(s) = owner {
                    let section = &mut layout.sections[s];
                    if section.first_block.is_none() {
                        section.first_block = Some(index);
                    }
                }
                // Atomic: nothing inside an entry is measured separately.
            }
            NodeKind::Section { .. } => {
                let index = layout.sections.len();
                layout.sections.push(Section {
                    element: child,
                    top: bx.y,
                    first_block: None,
                });
                open.push(index);
                collect(tree, child, open, layout);
                open.pop();
            }
            _ => collect(tree, child, open, layout),
        }
    }
}
