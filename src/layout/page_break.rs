//! # Page Break Planning
//!
//! Decides where to insert vertical space so that, once the document is cut
//! into page-height bands, no atomic block is cut in half.
//!
//! The planner makes a single pass over the blocks in document order. It
//! tracks how much space has been inserted so far and where the next page
//! boundary falls in the re-flowed coordinates. When a block straddles that
//! boundary, a spacer pushes it (or its whole section, when it is the first
//! block under a heading) onto the next page, with a little breathing room
//! above it. The breathing room gives way when a block only just fits on a
//! page: such a block lands on the boundary instead.
//!
//! Blocks that cannot fit on one page even when moved are never moved. They
//! are reported in [`BreakPlan::oversized`] and will be cut by the page
//! boundary; there is no sub-block splitting.

use serde::Serialize;

use super::measure::MeasuredLayout;
use super::ElementId;

/// Tolerance for page-count estimates.
const PAGE_EPSILON: f64 = 1e-9;

/// A block ending this close past a boundary still fits above it.
const FIT_EPSILON: f64 = 1e-6;

/// What a spacer pushes down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakTarget {
    /// The straddling block itself.
    Block,
    /// The block's section, so the heading travels with its first block.
    Section,
}

/// A synthetic vertical-space insertion above `target`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spacer {
    pub target: ElementId,
    pub kind: BreakTarget,
    pub height_px: f64,
    /// Top of the target before any spacer was applied.
    pub original_top_px: f64,
}

/// The output of the planner for one export.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakPlan {
    /// Spacers in document order.
    pub spacers: Vec<Spacer>,
    /// Blocks taller than one page, left where they are.
    pub oversized: Vec<ElementId>,
    pub page_height_px: f64,
    /// Measured document height before spacing.
    pub content_height_px: f64,
}

impl BreakPlan {
    pub fn total_spacing(&self) -> f64 {
        self.spacers.iter().map(|s| s.height_px).sum()
    }

    /// Document height once every spacer is applied.
    pub fn reflowed_height(&self) -> f64 {
        self.content_height_px + self.total_spacing()
    }

    /// Page count the re-flowed document will slice into. At least one.
    pub fn estimated_pages(&self) -> usize {
        if self.page_height_px <= 0.0 || !self.page_height_px.is_finite() {
            return 1;
        }
        let pages = (self.reflowed_height() / self.page_height_px - PAGE_EPSILON).ceil();
        (pages.max(1.0)) as usize
    }

    /// Y positions of the page boundaries inside the re-flowed document,
    /// for drawing page guides in a preview.
    pub fn break_lines(&self) -> Vec<f64> {
        (1..self.estimated_pages())
            .map(|k| k as f64 * self.page_height_px)
            .collect()
    }

    /// Where `top` ends up after every spacer at or above it is applied.
    pub fn adjusted(&self, top: f64) -> f64 {
        top + self
            .spacers
            .iter()
            .filter(|s| s.original_top_px <= top)
            .map(|s| s.height_px)
            .sum::<f64>()
    }
}

/// Compute the spacers that keep every block of `layout` inside one page.
///
/// `page_height_px` is the printable height of a page in layout pixels;
/// `breathing_room` is added above anything pushed to a new page.
pub fn plan_page_breaks(
    layout: &MeasuredLayout,
    page_height_px: f64,
    breathing_room: f64,
) -> BreakPlan {
    let mut plan = BreakPlan {
        page_height_px,
        content_height_px: layout.content_height,
        ..Default::default()
    };
    if !(page_height_px.is_finite() && page_height_px > 0.0) {
        log::warn!("page height {} is not usable, planning no breaks", page_height_px);
        return plan;
    }
    let page = page_height_px;
    let breathing = if breathing_room.is_finite() {
        breathing_room.max(0.0)
    } else {
        0.0
    };

    let mut accumulated = 0.0;
    let mut page_bottom = page;

    for (index, block) in layout.blocks.iter().enumerate() {
        let mut top = block.top + accumulated;
        let mut bottom = top + block.height;

        // A block that starts on a later page is judged against that page.
        while top >= page_bottom {
            page_bottom += page;
        }

        let (target, kind, target_top) = choose_target(layout, index, page);
        // Span from the target's top to the block's bottom; the whole span
        // moves together.
        let span = block.bottom() - target_top;

        while top < page_bottom && bottom > page_bottom + FIT_EPSILON {
            if span > page + FIT_EPSILON {
                log::warn!(
                    "block {:?} is {:.1}px tall, more than a {:.1}px page; it will be cut",
                    block.element,
                    block.height,
                    page
                );
                plan.oversized.push(block.element);
                break;
            }

            // Breathing room shrinks when the span would not fit with it.
            let room = breathing.min(page - span).max(0.0);
            let height = page_bottom - (target_top + accumulated) + room;
            log::debug!(
                "spacer {:.1}px before {:?} {:?} (boundary at {:.1})",
                height,
                kind,
                target,
                page_bottom
            );
            plan.spacers.push(Spacer {
                target,
                kind,
                height_px: height,
                original_top_px: target_top,
            });
            accumulated += height;
            page_bottom += page;
            top = block.top + accumulated;
            bottom = top + block.height;
        }

        // Bookkeeping only: move the boundary below this block.
        while bottom > page_bottom + FIT_EPSILON {
            page_bottom += page;
        }
    }

    log::debug!(
        "planned {} spacer(s), {} oversized block(s), ~{} page(s)",
        plan.spacers.len(),
        plan.oversized.len(),
        plan.estimated_pages()
    );
    plan
}

/// Section-level targets win whenever the block opens its section. If the
/// heading plus the block cannot share one page, fall back to the block.
fn choose_target(layout: &MeasuredLayout, index: usize, page: f64) -> (ElementId, BreakTarget, f64) {
    let block = &layout.blocks[index];
    if layout.is_first_in_section(index) {
        if let Some(section) = block.owner_section.map(|s| &layout.sections[s]) {
            if block.bottom() - section.top <= page + FIT_EPSILON {
                return (section.element, BreakTarget::Section, section.top);
            }
        }
    }
    (block.element, BreakTarget::Block, block.top)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::measure::{AtomicBlock, Section};

    fn block(id: usize, top: f64, height: f64, owner: Option<usize>) -> AtomicBlock {
        AtomicBlock {
            element: ElementId(id),
            top,
            height,
            owner_section: owner,
        }
    }

    fn layout(blocks: Vec<AtomicBlock>, sections: Vec<Section>) -> MeasuredLayout {
        let content_height = blocks.iter().map(|b| b.bottom()).fold(0.0, f64::max);
        MeasuredLayout {
            sections,
            blocks,
            content_height,
        }
    }

    /// No non-oversized block may cross a multiple of the page height.
    fn assert_no_split(layout: &MeasuredLayout, plan: &BreakPlan) {
        for b in &layout.blocks {
            if plan.oversized.contains(&b.element) {
                continue;
            }
            let top = plan.adjusted(b.top);
            let bottom = top + b.height;
            let page_index = (top / plan.page_height_px).floor();
            let boundary = (page_index + 1.0) * plan.page_height_px;
            assert!(
                bottom <= boundary + 1e-9,
                "block {:?} spans {}..{} across {}",
                b.element,
                top,
                bottom,
                boundary
            );
        }
    }

    #[test]
    fn everything_fits() {
        let l = layout(vec![block(1, 0.0, 300.0, None), block(2, 300.0, 300.0, None)], vec![]);
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert!(plan.spacers.is_empty());
        assert_eq!(plan.estimated_pages(), 1);
        assert!(plan.break_lines().is_empty());
    }

    #[test]
    fn straddling_block_moves_to_next_page() {
        // Heights 100, 900, 100; the second block starts at 150.
        let l = layout(
            vec![
                block(1, 0.0, 100.0, None),
                block(2, 150.0, 900.0, None),
                block(3, 1050.0, 100.0, None),
            ],
            vec![],
        );
        let plan = plan_page_breaks(&l, 1000.0, 20.0);

        let first = plan.spacers[0];
        assert_eq!(first.target, ElementId(2));
        assert_eq!(first.kind, BreakTarget::Block);
        assert_eq!(first.height_px, 870.0);
        assert!(plan.adjusted(150.0) >= 1000.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn zero_breathing_room_lands_exactly_on_boundary() {
        let l = layout(vec![block(1, 0.0, 600.0, None), block(2, 600.0, 600.0, None)], vec![]);
        let plan = plan_page_breaks(&l, 1000.0, 0.0);
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].height_px, 400.0);
        assert_eq!(plan.adjusted(600.0), 1000.0);
        assert_eq!(plan.estimated_pages(), 2);
        assert_eq!(plan.break_lines(), vec![1000.0]);
    }

    #[test]
    fn first_block_carries_section_heading() {
        let sections = vec![Section {
            element: ElementId(10),
            top: 900.0,
            first_block: Some(1),
        }];
        let l = layout(
            vec![block(1, 0.0, 850.0, None), block(2, 940.0, 100.0, Some(0))],
            sections,
        );
        let plan = plan_page_breaks(&l, 1000.0, 20.0);

        assert_eq!(plan.spacers.len(), 1);
        let s = plan.spacers[0];
        assert_eq!(s.target, ElementId(10));
        assert_eq!(s.kind, BreakTarget::Section);
        assert_eq!(s.height_px, 120.0);
        assert_eq!(plan.adjusted(900.0), 1020.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn later_block_in_section_moves_alone() {
        let sections = vec![Section {
            element: ElementId(10),
            top: 0.0,
            first_block: Some(0),
        }];
        let l = layout(
            vec![block(1, 40.0, 800.0, Some(0)), block(2, 840.0, 300.0, Some(0))],
            sections,
        );
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].target, ElementId(2));
        assert_eq!(plan.spacers[0].kind, BreakTarget::Block);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn oversized_block_is_left_in_place() {
        let l = layout(
            vec![
                block(1, 100.0, 1500.0, None),
                block(2, 1600.0, 100.0, None),
                block(3, 1700.0, 400.0, None),
            ],
            vec![],
        );
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert_eq!(plan.oversized, vec![ElementId(1)]);
        // Block 2 fits on page two; block 3 straddles 2000 and moves.
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].target, ElementId(3));
        assert_eq!(plan.spacers[0].height_px, 320.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn block_beyond_first_boundary_is_checked_against_its_own_page() {
        let l = layout(vec![block(1, 1500.0, 600.0, None)], vec![]);
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].height_px, 520.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn tall_heading_falls_back_to_block_target() {
        let sections = vec![Section {
            element: ElementId(10),
            top: 10.0,
            first_block: Some(0),
        }];
        let l = layout(vec![block(1, 960.0, 100.0, Some(0))], sections);
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].target, ElementId(1));
        assert_eq!(plan.spacers[0].height_px, 60.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn nearly_page_tall_block_gives_up_breathing_room() {
        let l = layout(vec![block(1, 0.0, 500.0, None), block(2, 500.0, 990.0, None)], vec![]);
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert!(plan.oversized.is_empty());
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.spacers[0].target, ElementId(2));
        assert_eq!(plan.spacers[0].height_px, 510.0);
        assert_eq!(plan.adjusted(500.0), 1010.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn exactly_page_tall_block_lands_on_boundary() {
        let l = layout(vec![block(1, 0.0, 300.0, None), block(2, 300.0, 1000.0, None)], vec![]);
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert!(plan.oversized.is_empty());
        assert_eq!(plan.spacers.len(), 1);
        assert_eq!(plan.adjusted(300.0), 1000.0);
        assert_no_split(&l, &plan);
    }

    #[test]
    fn heading_and_page_tall_block_move_together() {
        // A 40px heading above a 960px block fills one page exactly.
        let sections = vec![Section {
            element: ElementId(10),
            top: 900.0,
            first_block: Some(1),
        }];
        let l = layout(
            vec![block(1, 0.0, 900.0, None), block(2, 940.0, 960.0, Some(0))],
            sections,
        );
        let plan = plan_page_breaks(&l, 1000.0, 20.0);
        assert_eq!(plan.spacers.len(), 1);
        let s = plan.spacers[0];
        assert_eq!(s.target, ElementId(10));
        assert_eq!(s.kind, BreakTarget::Section);
        assert_eq!(s.height_px, 100.0);
        assert_eq!(plan.adjusted(900.0), 1000.0);
        assert!(plan.oversized.is_empty());
        assert_no_split(&l, &plan);
    }

    #[test]
    fn many_blocks_never_split() {
        let mut blocks = Vec::new();
        let mut top = 0.0;
        for i in 0..40 {
            let h = 60.0 + (i * 37 % 180) as f64;
            blocks.push(block(i, top, h, None));
            top += h + 8.0;
        }
        let l = layout(blocks, vec![]);
        let plan = plan_page_breaks(&l, 1122.5, 24.0);
        assert!(!plan.spacers.is_empty());
        assert!(plan.oversized.is_empty());
        assert!(plan.spacers.iter().all(|s| s.height_px > 0.0));
        assert_no_split(&l, &plan);
    }

    #[test]
    fn empty_layout_plans_nothing() {
        let plan = plan_page_breaks(&MeasuredLayout::default(), 1000.0, 20.0);
        assert!(plan.spacers.is_empty());
        assert_eq!(plan.estimated_pages(), 1);
    }

    #[test]
    fn unusable_page_height_plans_nothing() {
        let l = layout(vec![block(1, 0.0, 5000.0, None)], vec![]);
        assert!(plan_page_breaks(&l, 0.0, 20.0).spacers.is_empty());
        assert!(plan_page_breaks(&l, f64::NAN, 20.0).spacers.is_empty());
    }
}
