//! Elements: the positionable items placed on a page.
//!
//! An element is a common [`Frame`] (geometry) plus type-specific
//! [`ElementContent`]. Serialized, the two are flattened into one object
//! whose `type` field selects the content variant, e.g.
//! `{"id": "a", "type": "square", "x": 10, "backgroundColor": "#ff0000"}`.

mod patch;
mod registry;

use serde::{Deserialize, Serialize};

use crate::color::HexColor;
use crate::ids::ElementId;

pub use patch::{ContentPatch, ElementPatch, ImagePatch, SquarePatch, TextPatch, VideoPatch};
pub use registry::{
    create_new_element, create_page, definition_for, ElementDefinition, PanelType, ELEMENT_TYPES,
};

/// Discriminant of the element type registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Page,
    Text,
    Image,
    Square,
    Video,
}

impl ElementType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Text => "text",
            Self::Image => "image",
            Self::Square => "square",
            Self::Video => "video",
        }
    }
}

/// Position, size and rotation shared by every element type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Frame {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Degrees, clockwise.
    pub rotation_angle: f32,
    /// Covers the whole page; geometry edits are ignored by the UI while set.
    pub is_fullbleed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Initial,
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextAttributes {
    pub content: String,
    pub font_family: String,
    pub font_fallback: Vec<String>,
    pub font_weight: u16,
    pub font_size: f32,
    pub font_style: FontStyle,
    pub color: HexColor,
    pub background_color: HexColor,
    /// CSS value, e.g. `normal` or `2px`.
    pub letter_spacing: String,
    pub line_height: f32,
    pub text_align: TextAlign,
}

impl Default for TextAttributes {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_family: "Arial".to_string(),
            font_fallback: vec![
                "Helvetica Neue".to_string(),
                "Helvetica".to_string(),
                "sans-serif".to_string(),
            ],
            font_weight: 400,
            font_size: 14.0,
            font_style: FontStyle::Normal,
            color: HexColor::BLACK,
            background_color: HexColor::WHITE,
            letter_spacing: "normal".to_string(),
            line_height: 1.3,
            text_align: TextAlign::Initial,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageAttributes {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoAttributes {
    pub src: String,
    pub poster: Option<String>,
    #[serde(rename = "loop")]
    pub loop_playback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SquareAttributes {
    pub background_color: HexColor,
}

impl Default for SquareAttributes {
    fn default() -> Self {
        Self {
            background_color: HexColor::rgb(0xc4, 0xc4, 0xc4),
        }
    }
}

/// Type-specific attributes. The variant is the element's `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementContent {
    Text(TextAttributes),
    Image(ImageAttributes),
    Square(SquareAttributes),
    Video(VideoAttributes),
}

impl ElementContent {
    pub fn element_type(&self) -> ElementType {
        match self {
            Self::Text(_) => ElementType::Text,
            Self::Image(_) => ElementType::Image,
            Self::Square(_) => ElementType::Square,
            Self::Video(_) => ElementType::Video,
        }
    }

    /// Default content for a canvas element type; `None` for `page`.
    pub fn defaults_for(element_type: ElementType) -> Option<Self> {
        match element_type {
            ElementType::Page => None,
            ElementType::Text => Some(Self::Text(TextAttributes::default())),
            ElementType::Image => Some(Self::Image(ImageAttributes::default())),
            ElementType::Square => Some(Self::Square(SquareAttributes::default())),
            ElementType::Video => Some(Self::Video(VideoAttributes::default())),
        }
    }
}

/// A positionable item on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    #[serde(flatten)]
    pub frame: Frame,
    #[serde(flatten)]
    pub content: ElementContent,
}

impl Element {
    pub fn new(id: impl Into<ElementId>, content: ElementContent) -> Self {
        Self {
            id: id.into(),
            frame: Frame::default(),
            content,
        }
    }

    /// Shorthand for a square with default attributes.
    pub fn square(id: impl Into<ElementId>) -> Self {
        Self::new(id, ElementContent::Square(SquareAttributes::default()))
    }

    /// Shorthand for a text element with the given content.
    pub fn text(id: impl Into<ElementId>, content: &str) -> Self {
        Self::new(
            id,
            ElementContent::Text(TextAttributes {
                content: content.to_string(),
                ..TextAttributes::default()
            }),
        )
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    pub fn element_type(&self) -> ElementType {
        self.content.element_type()
    }
}
