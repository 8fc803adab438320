//! Element type registry: names, defaults, and inspector panels per type.

use super::{Element, ElementContent, ElementPatch, ElementType};
use crate::document::Page;
use crate::ids::IdGenerator;

/// Inspector panels an element type exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    Background,
    BackgroundColor,
    Color,
    Font,
    Fullbleed,
    Position,
    RotationAngle,
    Size,
    Style,
    Text,
    Video,
}

/// Static description of one element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementDefinition {
    pub element_type: ElementType,
    pub name: &'static str,
    /// Whether double-clicking enters an inline edit mode.
    pub has_edit_mode: bool,
    pub panels: &'static [PanelType],
}

impl ElementDefinition {
    pub fn default_content(&self) -> Option<ElementContent> {
        ElementContent::defaults_for(self.element_type)
    }

    pub fn has_panel(&self, panel: PanelType) -> bool {
        self.panels.contains(&panel)
    }
}

pub static ELEMENT_TYPES: [ElementDefinition; 5] = [
    ElementDefinition {
        element_type: ElementType::Page,
        name: "Page",
        has_edit_mode: false,
        panels: &[],
    },
    ElementDefinition {
        element_type: ElementType::Text,
        name: "Text",
        has_edit_mode: true,
        panels: &[
            PanelType::Text,
            PanelType::Size,
            PanelType::Position,
            PanelType::Font,
            PanelType::Style,
            PanelType::Color,
            PanelType::BackgroundColor,
            PanelType::RotationAngle,
        ],
    },
    ElementDefinition {
        element_type: ElementType::Image,
        name: "Image",
        has_edit_mode: false,
        panels: &[
            PanelType::Background,
            PanelType::Size,
            PanelType::Position,
            PanelType::RotationAngle,
            PanelType::Fullbleed,
        ],
    },
    ElementDefinition {
        element_type: ElementType::Square,
        name: "Square",
        has_edit_mode: false,
        panels: &[
            PanelType::Background,
            PanelType::Size,
            PanelType::Position,
            PanelType::BackgroundColor,
            PanelType::RotationAngle,
        ],
    },
    ElementDefinition {
        element_type: ElementType::Video,
        name: "Video",
        has_edit_mode: false,
        panels: &[
            PanelType::Background,
            PanelType::Size,
            PanelType::Position,
            PanelType::RotationAngle,
            PanelType::Fullbleed,
            PanelType::Video,
        ],
    },
];

pub fn definition_for(element_type: ElementType) -> &'static ElementDefinition {
    // The table has exactly one entry per variant.
    match element_type {
        ElementType::Page => &ELEMENT_TYPES[0],
        ElementType::Text => &ELEMENT_TYPES[1],
        ElementType::Image => &ELEMENT_TYPES[2],
        ElementType::Square => &ELEMENT_TYPES[3],
        ElementType::Video => &ELEMENT_TYPES[4],
    }
}

/// Builds a canvas element of `element_type` with a fresh id.
///
/// Starts from the type's defaults and merges `attributes` over them.
/// Returns `None` for [`ElementType::Page`]; use [`create_page`] instead.
pub fn create_new_element(
    element_type: ElementType,
    attributes: &ElementPatch,
    ids: &mut dyn IdGenerator,
) -> Option<Element> {
    let content = definition_for(element_type).default_content()?;
    let mut element = Element::new(ids.next_element_id(), content);
    attributes.apply(&mut element);
    Some(element)
}

/// Builds an empty page with a fresh id.
pub fn create_page(ids: &mut dyn IdGenerator) -> Page {
    Page::new(ids.next_page_id())
}
