//! # Live Layout Tree
//!
//! The export pipeline works against a tree that is already laid out, the way
//! a browser DOM is: every element has a box, and changing an element's top
//! margin moves it and everything after it. [`LayoutTree`] is that tree for
//! documents built from the [`crate::model`] types.
//!
//! Layout is plain vertical block flow:
//!
//! 1. An element's border box starts at the cursor of its parent.
//! 2. Children stack top to bottom. Each child is offset by its computed top
//!    margin (inline override if present and valid, else the stylesheet
//!    margin) and followed by its bottom margin. Margins do not collapse.
//! 3. Text and headings wrap at an average glyph advance of half the font
//!    size; their height is `lines × line box`.
//! 4. An explicit `height` replaces the computed border-box height.
//!
//! Every inline-margin write triggers a full reflow. Resume trees hold a few
//! hundred elements at most, so there is no dirty-region tracking.
//!
//! The pipeline itself only sees this tree through the
//! [`measure::MeasurementProvider`] and [`mutator::LiveTree`] ports.

pub mod measure;
pub mod mutator;
pub mod page_break;

use serde::Serialize;

use crate::model::{Document, Node, NodeKind};
use crate::style::{parse_length, Style};

/// Handle to an element of a live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub usize);

/// A laid-out border box, relative to the root's origin, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LayoutBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

/// One element of the live tree.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: NodeKind,
    pub style: Style,
    pub inline_margin_top: Option<String>,
    pub parent: Option<ElementId>,
    pub children: Vec<ElementId>,
    pub id: Option<String>,
}

/// Default font size for headings when the style sets none.
const HEADING_FONT_SIZE: f64 = 20.0;

/// An arena of elements plus their current layout boxes.
#[derive(Debug, Clone)]
pub struct LayoutTree {
    elements: Vec<Element>,
    boxes: Vec<LayoutBox>,
    width: f64,
}

impl LayoutTree {
    /// Build and lay out a tree from document nodes at the given root width.
    pub fn from_nodes(children: &[Node], width: f64) -> Self {
        let mut tree = Self {
            elements: vec![Element {
                kind: NodeKind::View,
                style: Style::default(),
                inline_margin_top: None,
                parent: None,
                children: vec![],
                id: Some("root".to_string()),
            }],
            boxes: vec![],
            width,
        };
        let root = tree.root();
        for node in children {
            let child = tree.push_node(node, root);
            tree.elements[root.0].children.push(child);
        }
        tree.reflow();
        tree
    }

    pub fn from_document(document: &Document, width: f64) -> Self {
        Self::from_nodes(&document.children, width)
    }

    fn push_node(&mut self, node: &Node, parent: ElementId) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element {
            kind: node.kind.clone(),
            style: node.style.clone(),
            inline_margin_top: node.inline_margin_top.clone(),
            parent: Some(parent),
            children: vec![],
            id: node.id.clone(),
        });
        for child in &node.children {
            let child_id = self.push_node(child, id);
            self.elements[id.0].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> ElementId {
        ElementId(0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    pub fn layout_box(&self, id: ElementId) -> LayoutBox {
        self.boxes[id.0]
    }

    /// Height of the whole document as currently laid out.
    pub fn content_height(&self) -> f64 {
        self.boxes[0].height
    }

    /// Find an element by its node `id`.
    pub fn find(&self, node_id: &str) -> Option<ElementId> {
        self.elements
            .iter()
            .position(|e| e.id.as_deref() == Some(node_id))
            .map(ElementId)
    }

    /// Element ids in document order (pre-order), root first.
    pub fn document_order(&self) -> Vec<ElementId> {
        let mut out = Vec::with_capacity(self.elements.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.elements[id.0].children.iter().rev().copied());
        }
        out
    }

    /// The margin an element gets from its stylesheet alone.
    pub fn stylesheet_margin_top(&self, id: ElementId) -> f64 {
        self.elements[id.0].style.margin().top
    }

    /// The margin layout uses: a valid inline override wins.
    pub fn resolved_margin_top(&self, id: ElementId) -> f64 {
        let el = &self.elements[id.0];
        el.inline_margin_top
            .as_deref()
            .and_then(parse_length)
            .unwrap_or_else(|| el.style.margin().top)
    }

    /// Replace an element's inline top margin and re-run layout.
    pub fn set_inline_margin(&mut self, id: ElementId, value: Option<String>) {
        self.elements[id.0].inline_margin_top = value;
        self.reflow();
    }

    pub(crate) fn is_laid_out(&self) -> bool {
        self.width.is_finite()
            && self.width > 0.0
            && self.boxes.len() == self.elements.len()
            && self.boxes.iter().all(LayoutBox::is_finite)
    }

    /// Recompute every box from the root down.
    pub fn reflow(&mut self) {
        let mut boxes = vec![LayoutBox::default(); self.elements.len()];
        self.layout_element(self.root(), 0.0, 0.0, self.width, &mut boxes);
        self.boxes = boxes;
    }

    fn layout_element(
        &self,
        id: ElementId,
        x: f64,
        y: f64,
        width: f64,
        boxes: &mut [LayoutBox],
    ) -> f64 {
        let el = &self.elements[id.0];
        let padding = el.style.padding();
        let content_width = (width - padding.horizontal()).max(0.0);

        let content_height = match &el.kind {
            NodeKind::Text { content } => {
                let size = el.style.font_size();
                wrap_text(content, size, content_width).len() as f64 * el.style.line_box()
            }
            NodeKind::Heading { text } => {
                let size = heading_font_size(&el.style);
                let line = size * el.style.line_height.unwrap_or(1.2);
                wrap_text(text, size, content_width).len() as f64 * line
            }
            NodeKind::Divider => 1.0,
            NodeKind::View | NodeKind::Section { .. } | NodeKind::Entry => {
                let top = y + padding.top;
                let mut cursor = top;
                if let NodeKind::Section { title: Some(title) } = &el.kind {
                    cursor += title_height(&el.style, title, content_width);
                }
                for &child in &el.children {
                    let margin = self.elements[child.0].style.margin();
                    cursor += self.resolved_margin_top(child);
                    let child_width = (content_width - margin.horizontal()).max(0.0);
                    let h = self.layout_element(
                        child,
                        x + padding.left + margin.left,
                        cursor,
                        child_width,
                        boxes,
                    );
                    cursor += h + margin.bottom;
                }
                cursor - top
            }
        };

        let height = el
            .style
            .height
            .unwrap_or(content_height + padding.vertical());
        boxes[id.0] = LayoutBox {
            x,
            y,
            width,
            height,
        };
        height
    }
}

/// Height of a section's title line block, drawn above its children.
pub fn title_height(style: &Style, title: &str, width: f64) -> f64 {
    let size = heading_font_size(style);
    wrap_text(title, size, width).len() as f64 * size * style.line_height.unwrap_or(1.2)
}

/// Font size a heading renders at.
pub fn heading_font_size(style: &Style) -> f64 {
    style.font_size.unwrap_or(HEADING_FONT_SIZE)
}

/// Greedy word wrap at an average advance of half the font size.
///
/// Returns the character count of each line. Empty content has no lines.
pub fn wrap_text(content: &str, font_size: f64, width: f64) -> Vec<usize> {
    if content.is_empty() {
        return vec![];
    }
    let advance = (font_size * 0.5).max(f64::EPSILON);
    let per_line = ((width / advance).floor() as usize).max(1);

    let mut lines = Vec::new();
    for paragraph in content.split('\n') {
        let mut current = 0usize;
        for word in paragraph.split_whitespace() {
            let len = word.chars().count();
            let needed = if current == 0 { len } else { current + 1 + len };
            if needed <= per_line {
                current = needed;
                continue;
            }
            if current > 0 {
                lines.push(current);
            }
            // Words longer than a line break mid-word.
            let mut rest = len;
            while rest > per_line {
                lines.push(per_line);
                rest -= per_line;
            }
            current = rest;
        }
        lines.push(current);
    }
    lines
}
