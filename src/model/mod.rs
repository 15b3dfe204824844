//! # Document Model
//!
//! The input representation for an export. A document is a tree of nodes the
//! resume editor renders: plain containers, titled sections, headings, text,
//! dividers, and **entries**. An entry (one job, one degree, one skill group)
//! is the atomic unit of pagination: it is never split across two pages.
//!
//! The tree carries no absolute positions. Geometry comes from the block-flow
//! pass in [`crate::layout`], which plays the part of the browser's layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::style::{Edges, Style};

/// A complete document ready for export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Top-level nodes, stacked vertically inside the page-wide root.
    pub children: Vec<Node>,

    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Export settings. Every field has a default.
    #[serde(default)]
    pub options: ExportOptions,
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

/// A node in the document tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// What kind of node this is.
    pub kind: NodeKind,

    /// Stylesheet-level style properties for this node.
    #[serde(default)]
    pub style: Style,

    /// Inline top-margin override as a raw CSS length (`"12px"`, `"1em"`).
    /// Export writes its spacers here and restores it afterwards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_margin_top: Option<String>,

    /// Child nodes.
    #[serde(default)]
    pub children: Vec<Node>,

    /// A unique identifier for this node (optional, useful for debugging).
    #[serde(default)]
    pub id: Option<String>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            style: Style::default(),
            inline_margin_top: None,
            children: vec![],
            id: None,
        }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

/// The different kinds of nodes in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    /// A generic container, analogous to a <div>.
    View,

    /// A group of entries ("Experience", "Education"). The title, if any, is
    /// laid out as a heading above the children.
    Section {
        #[serde(default)]
        title: Option<String>,
    },

    /// A heading line, usually the first child of a section.
    Heading { text: String },

    /// An atomic block: laid out as a unit and never split across pages.
    Entry,

    /// A text node with string content.
    Text { content: String },

    /// A thin horizontal rule.
    Divider,
}

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// Page size key. Defaults to `a4`.
    #[serde(default)]
    pub page_size: PageSize,

    /// Output resolution multiplier over CSS pixels.
    #[serde(default = "default_pixel_density")]
    pub pixel_density: f64,

    /// Padding in CSS pixels added above content pushed to a new page.
    #[serde(default = "default_breathing_room")]
    pub breathing_room: f64,

    /// Page margins in millimeters.
    #[serde(default)]
    pub margin: Edges,

    /// How the raster is embedded in the PDF.
    #[serde(default)]
    pub image_encoding: ImageEncoding,
}

/// Density that gives roughly 300 DPI output from 96 DPI CSS pixels.
pub const DEFAULT_PIXEL_DENSITY: f64 = 300.0 / 96.0;

/// Default breathing room in CSS pixels.
pub const DEFAULT_BREATHING_ROOM: f64 = 20.0;

fn default_pixel_density() -> f64 {
    DEFAULT_PIXEL_DENSITY
}

fn default_breathing_room() -> f64 {
    DEFAULT_BREATHING_ROOM
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            pixel_density: DEFAULT_PIXEL_DENSITY,
            breathing_room: DEFAULT_BREATHING_ROOM,
            margin: Edges::default(),
            image_encoding: ImageEncoding::default(),
        }
    }
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
}

impl PageSize {
    /// Returns (width, height) in millimeters.
    pub fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::A3 => "a3",
            PageSize::A5 => "a5",
            PageSize::Letter => "letter",
            PageSize::Legal => "legal",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PageSize {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "a3" => Ok(PageSize::A3),
            "a5" => Ok(PageSize::A5),
            "letter" => Ok(PageSize::Letter),
            "legal" => Ok(PageSize::Legal),
            other => Err(ExportError::Assembly(format!(
                "unknown page size '{}' (expected a4, a3, a5, letter or legal)",
                other
            ))),
        }
    }
}

/// Raster embedding in the PDF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ImageEncoding {
    /// Lossless RGB samples compressed with FlateDecode.
    #[default]
    Flate,
    /// JPEG passed through as DCTDecode.
    Jpeg {
        #[serde(default = "default_jpeg_quality")]
        quality: u8,
    },
}

fn default_jpeg_quality() -> u8 {
    92
}
