//! # Layout Mutator
//!
//! Applies planned spacers to a live tree as extra top margin, and takes them
//! back out afterwards. Apply is additive: a spacer is added on top of the
//! margin the element already has. Revert subtracts the same amount and puts
//! the inline declaration back exactly as it was, or clears it when the
//! element had none.
//!
//! [`SpacerGuard`] is the scoped form. The spacers are applied when it is
//! created and reverted when it is dropped, which covers normal return, `?`
//! early return, panics, and a caller that abandons the export halfway.

use std::collections::HashMap;

use crate::style::{format_px, parse_length};

use super::page_break::Spacer;
use super::{ElementId, LayoutTree};

/// Margins closer than this are the same margin.
const MARGIN_EPSILON: f64 = 1e-6;

/// Port through which the pipeline mutates a rendered tree.
pub trait LiveTree {
    /// The raw inline top-margin declaration, if any.
    fn inline_margin_top(&self, element: ElementId) -> Option<String>;

    /// Replace (or with `None`, remove) the inline top-margin declaration.
    fn set_inline_margin_top(&mut self, element: ElementId, value: Option<String>);

    /// The top margin layout currently uses, in CSS pixels.
    fn computed_margin_top(&self, element: ElementId) -> f64;

    /// The top margin the element would have with no inline declaration.
    fn base_margin_top(&self, element: ElementId) -> f64;
}

impl LiveTree for LayoutTree {
    fn inline_margin_top(&self, element: ElementId) -> Option<String> {
        self.element(element).inline_margin_top.clone()
    }

    fn set_inline_margin_top(&mut self, element: ElementId, value: Option<String>) {
        self.set_inline_margin(element, value);
    }

    fn computed_margin_top(&self, element: ElementId) -> f64 {
        self.resolved_margin_top(element)
    }

    fn base_margin_top(&self, element: ElementId) -> f64 {
        self.stylesheet_margin_top(element)
    }
}

/// Tracks applied spacers and the inline values they replaced.
#[derive(Debug, Default)]
pub struct LayoutMutator {
    applied: Vec<Spacer>,
    snapshots: HashMap<ElementId, Option<String>>,
}

impl LayoutMutator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any spacer is currently applied.
    pub fn is_applied(&self) -> bool {
        !self.applied.is_empty()
    }

    /// Add each spacer's height to its target's current top margin.
    pub fn apply<T: LiveTree + ?Sized>(&mut self, tree: &mut T, spacers: &[Spacer]) {
        for spacer in spacers {
            self.snapshots
                .entry(spacer.target)
                .or_insert_with(|| tree.inline_margin_top(spacer.target));
            let current = tree.computed_margin_top(spacer.target);
            tree.set_inline_margin_top(spacer.target, Some(format_px(current + spacer.height_px)));
            self.applied.push(*spacer);
        }
    }

    /// Remove every applied spacer, last applied first.
    pub fn revert<T: LiveTree + ?Sized>(&mut self, tree: &mut T) {
        while let Some(spacer) = self.applied.pop() {
            let target = spacer.target;
            let restored = tree.computed_margin_top(target) - spacer.height_px;

            let value = if self.applied.iter().any(|s| s.target == target) {
                Some(format_px(restored))
            } else {
                let original = self.snapshots.remove(&target).unwrap_or(None);
                let base = tree.base_margin_top(target);
                let original_px = original
                    .as_deref()
                    .and_then(parse_length)
                    .unwrap_or(base);
                if same_margin(restored, original_px) {
                    original
                } else if same_margin(restored, base) {
                    None
                } else {
                    Some(format_px(restored))
                }
            };
            tree.set_inline_margin_top(target, value);
        }
        self.snapshots.clear();
    }
}

fn same_margin(a: f64, b: f64) -> bool {
    (a - b).abs() < MARGIN_EPSILON
}

/// Spacers applied for the lifetime of the guard.
pub struct SpacerGuard<'a, T: LiveTree + ?Sized> {
    tree: &'a mut T,
    mutator: LayoutMutator,
}

impl<'a, T: LiveTree + ?Sized> SpacerGuard<'a, T> {
    pub fn apply(tree: &'a mut T, spacers: &[Spacer]) -> Self {
        let mut mutator = LayoutMutator::new();
        mutator.apply(&mut *tree, spacers);
        Self { tree, mutator }
    }

    /// The tree with spacers applied.
    pub fn tree(&self) -> &T {
        self.tree
    }
}

impl<T: LiveTree + ?Sized> Drop for SpacerGuard<'_, T> {
    fn drop(&mut self) {
        if self.mutator.is_applied() {
            self.mutator.revert(&mut *self.tree);
            log::debug!("spacers reverted");
        }
    }
}
