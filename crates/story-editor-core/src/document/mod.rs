//! Story document model: pages, their elements, and editor selection.
//!
//! A `StoryDocument` is a plain value. It is only ever changed by the
//! reducer, which produces a new document per transition; read-only
//! queries used by panels and the CLI live here. Invariant checking is in
//! the `invariants` submodule.

mod invariants;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::Element;
use crate::ids::{ElementId, PageId};

pub use invariants::{check_invariants, InvariantViolation};

/// Free-form key/value data. Never validated by the core.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A single story frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// Bottom-most first.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// When set, names the first element of `elements`.
    #[serde(default, deserialize_with = "crate::ids::empty_as_none")]
    pub background_element_id: Option<ElementId>,
}

impl Page {
    pub fn new(id: impl Into<PageId>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            background_element_id: None,
        }
    }

    pub fn with_elements(mut self, elements: Vec<Element>) -> Self {
        self.elements = elements;
        self
    }

    pub fn element(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    pub fn element_index(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }

    pub fn contains_element(&self, id: &ElementId) -> bool {
        self.element_index(id).is_some()
    }

    pub fn background_element(&self) -> Option<&Element> {
        self.background_element_id
            .as_ref()
            .and_then(|id| self.element(id))
    }

    pub fn is_background(&self, id: &ElementId) -> bool {
        self.background_element_id.as_ref() == Some(id)
    }
}

/// The whole story being edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    /// Playback order.
    #[serde(default)]
    pub pages: Vec<Page>,
    /// The active page; `None` only when `pages` is empty.
    #[serde(default, deserialize_with = "crate::ids::empty_as_none")]
    pub current: Option<PageId>,
    /// Selected element ids on the current page, without duplicates.
    #[serde(default)]
    pub selection: Vec<ElementId>,
    #[serde(default)]
    pub story: Metadata,
    #[serde(default)]
    pub capabilities: Metadata,
}

impl StoryDocument {
    /// The empty document every editing session starts from.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, id: &PageId) -> Option<&Page> {
        self.pages.iter().find(|p| &p.id == id)
    }

    pub fn page_index(&self, id: &PageId) -> Option<usize> {
        self.pages.iter().position(|p| &p.id == id)
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.current.as_ref().and_then(|id| self.page(id))
    }

    pub fn current_page_index(&self) -> Option<usize> {
        self.current.as_ref().and_then(|id| self.page_index(id))
    }

    pub(crate) fn current_page_mut(&mut self) -> Option<&mut Page> {
        let id = self.current.as_ref()?;
        self.pages.iter_mut().find(|p| &p.id == id)
    }

    pub fn is_selected(&self, id: &ElementId) -> bool {
        self.selection.contains(id)
    }

    /// Selected elements that exist on the current page, in z-order.
    pub fn selected_elements(&self) -> Vec<&Element> {
        match self.current_page() {
            Some(page) => page
                .elements
                .iter()
                .filter(|e| self.selection.contains(&e.id))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Returns the value shared by every selected element, or `None` when
    /// nothing is selected or the values differ.
    ///
    /// Inspector panels use this to show a field as "mixed".
    pub fn common_value<T, F>(&self, read: F) -> Option<T>
    where
        T: PartialEq,
        F: Fn(&Element) -> T,
    {
        let mut values = self.selected_elements().into_iter().map(read);
        let first = values.next()?;
        values.all(|v| v == first).then_some(first)
    }

    /// Total number of elements across all pages.
    pub fn element_count(&self) -> usize {
        self.pages.iter().map(|p| p.elements.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Frame;

    fn doc_with_page(elements: Vec<Element>) -> StoryDocument {
        StoryDocument {
            pages: vec![Page::new("p1").with_elements(elements)],
            current: Some(PageId::from("p1")),
            ..StoryDocument::default()
        }
    }

    fn rotated(id: &str, angle: f32) -> Element {
        Element::square(id).with_frame(Frame {
            rotation_angle: angle,
            ..Frame::default()
        })
    }

    #[test]
    fn test_initial_state_json() {
        let json = serde_json::to_value(StoryDocument::new()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "pages": [],
                "current": null,
                "selection": [],
                "story": {},
                "capabilities": {}
            })
        );
    }

    #[test]
    fn test_page_defaults_when_parsed() {
        let page: Page = serde_json::from_str(r#"{"id": "p1"}"#).unwrap();
        assert_eq!(page, Page::new("p1"));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["backgroundElementId"], serde_json::Value::Null);
        assert_eq!(json["elements"], serde_json::json!([]));

        let page: Page =
            serde_json::from_str(r#"{"id": "p1", "elements": [], "backgroundElementId": ""}"#)
                .unwrap();
        assert_eq!(page.background_element_id, None);
    }

    #[test]
    fn test_current_page_lookup() {
        let doc = doc_with_page(vec![Element::square("a")]);
        assert_eq!(doc.current_page().map(|p| p.id.as_str()), Some("p1"));
        assert_eq!(doc.current_page_index(), Some(0));
        assert!(StoryDocument::new().current_page().is_none());
    }

    #[test]
    fn test_selected_elements_skip_foreign_ids() {
        let mut doc = doc_with_page(vec![Element::square("a"), Element::square("b")]);
        doc.selection = vec![ElementId::from("b"), ElementId::from("elsewhere")];
        let ids: Vec<&str> = doc.selected_elements().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn test_common_value() {
        let mut doc = doc_with_page(vec![rotated("a", 90.0), rotated("b", 90.0), rotated("c", 45.0)]);
        doc.selection = vec![ElementId::from("a"), ElementId::from("b")];
        assert_eq!(doc.common_value(|e| e.frame.rotation_angle), Some(90.0));

        doc.selection.push(ElementId::from("c"));
        assert_eq!(doc.common_value(|e| e.frame.rotation_angle), None);

        doc.selection.clear();
        assert_eq!(doc.common_value(|e| e.frame.rotation_angle), None);
    }

    #[test]
    fn test_background_lookup() {
        let mut doc = doc_with_page(vec![Element::square("bg"), Element::square("a")]);
        doc.pages[0].background_element_id = Some(ElementId::from("bg"));
        let page = doc.current_page().unwrap();
        assert!(page.is_background(&ElementId::from("bg")));
        assert_eq!(page.background_element().map(|e| e.id.as_str()), Some("bg"));
        assert_eq!(doc.element_count(), 2);
    }
}
