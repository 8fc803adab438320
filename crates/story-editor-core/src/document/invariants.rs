//! Structural consistency checks for a story document.

use std::collections::HashSet;
use std::fmt;

use super::StoryDocument;
use crate::ids::{ElementId, PageId};

/// A broken structural rule found by [`check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Pages exist but `current` is unset or names no page.
    CurrentPageMissing(Option<PageId>),
    /// `current` is set although there are no pages.
    CurrentWithoutPages(PageId),
    /// The same id appears twice in `selection`.
    DuplicateSelection(ElementId),
    /// Two elements on one page share an id.
    DuplicateElementId { page: PageId, element: ElementId },
    /// The background id names no element on its page.
    BackgroundNotFound { page: PageId, element: ElementId },
    /// The background element is not the page's first element.
    BackgroundNotFirst { page: PageId, element: ElementId },
    /// A multi-element selection includes the current background.
    BackgroundInMultiSelection(ElementId),
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentPageMissing(Some(id)) => write!(f, "current page {id} does not exist"),
            Self::CurrentPageMissing(None) => write!(f, "pages exist but no current page is set"),
            Self::CurrentWithoutPages(id) => write!(f, "current page {id} set on an empty story"),
            Self::DuplicateSelection(id) => write!(f, "element {id} selected twice"),
            Self::DuplicateElementId { page, element } => {
                write!(f, "element id {element} used twice on page {page}")
            }
            Self::BackgroundNotFound { page, element } => {
                write!(f, "background {element} of page {page} is not on the page")
            }
            Self::BackgroundNotFirst { page, element } => {
                write!(f, "background {element} of page {page} is not the first element")
            }
            Self::BackgroundInMultiSelection(id) => {
                write!(f, "background {id} is part of a multi-element selection")
            }
        }
    }
}

/// Returns every structural rule `doc` breaks; empty means consistent.
pub fn check_invariants(doc: &StoryDocument) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    match (&doc.current, doc.pages.is_empty()) {
        (Some(id), true) => violations.push(InvariantViolation::CurrentWithoutPages(id.clone())),
        (current, false) if doc.current_page().is_none() => {
            violations.push(InvariantViolation::CurrentPageMissing(current.clone()));
        }
        _ => {}
    }

    let mut seen = HashSet::new();
    for id in &doc.selection {
        if !seen.insert(id) {
            violations.push(InvariantViolation::DuplicateSelection(id.clone()));
        }
    }

    for page in &doc.pages {
        let mut ids = HashSet::new();
        for element in &page.elements {
            if !ids.insert(&element.id) {
                violations.push(InvariantViolation::DuplicateElementId {
                    page: page.id.clone(),
                    element: element.id.clone(),
                });
            }
        }

        if let Some(bg) = &page.background_element_id {
            match page.element_index(bg) {
                None => violations.push(InvariantViolation::BackgroundNotFound {
                    page: page.id.clone(),
                    element: bg.clone(),
                }),
                Some(0) => {}
                Some(_) => violations.push(InvariantViolation::BackgroundNotFirst {
                    page: page.id.clone(),
                    element: bg.clone(),
                }),
            }
        }
    }

    if doc.selection.len() > 1 {
        if let Some(bg) = doc
            .current_page()
            .and_then(|p| p.background_element_id.as_ref())
        {
            if doc.selection.contains(bg) {
                violations.push(InvariantViolation::BackgroundInMultiSelection(bg.clone()));
            }
        }
    }

    violations
}

impl StoryDocument {
    /// True when [`check_invariants`] finds nothing.
    pub fn is_consistent(&self) -> bool {
        check_invariants(self).is_empty()
    }
}
