/// The story reducer: `(document, action) -> document`.
///
/// Transitions are pure. Each one works on a copy of the input and either
/// yields a new consistent document or is dropped whole. Malformed actions
/// never error; they leave the document as it was.
use std::collections::HashSet;

use tracing::debug;

use crate::action::{Action, SelectionMode};
use crate::document::{Metadata, Page, StoryDocument};
use crate::element::{Element, ElementPatch};
use crate::ids::{ElementId, PageId};

/// Applies `action` to `state` and returns the resulting document.
///
/// Rejected and no-op actions return a value equal to `state`.
pub fn reduce(state: &StoryDocument, action: Action) -> StoryDocument {
    transition(state, action).unwrap_or_else(|| state.clone())
}

/// Like [`reduce`], but returns `None` when the document would not change.
pub(crate) fn transition(state: &StoryDocument, action: Action) -> Option<StoryDocument> {
    let name = action.name();
    let next = match action {
        Action::AddPage { page, at } => add_page(state, page, at),
        Action::DeletePage { page_id } => delete_page(state, &page_id),
        Action::SetCurrentPage { page_id } => set_current_page(state, page_id),
        Action::ArrangePage { page_id, position } => arrange_page(state, &page_id, position),
        Action::AddElement {
            element,
            at,
            as_background,
        } => add_element(state, element, at, as_background),
        Action::DeleteElements { element_ids } => delete_elements(state, &element_ids),
        Action::SetElementProperties { element_ids, patch } => {
            set_element_properties(state, &element_ids, &patch)
        }
        Action::UpdateSelectedElements { patch } => {
            set_element_properties(state, &state.selection, &patch)
        }
        Action::SetBackgroundElement { element_id } => set_background_element(state, element_id),
        Action::ArrangeElement {
            element_id,
            position,
        } => arrange_element(state, &element_id, position),
        Action::SelectElements { element_ids, mode } => select_elements(state, element_ids, mode),
        Action::ClearSelection => {
            let mut next = state.clone();
            next.selection.clear();
            Some(next)
        }
        Action::SetStoryMeta { patch } => {
            let mut next = state.clone();
            merge_metadata(&mut next.story, patch);
            Some(next)
        }
        Action::SetCapabilities { patch } => {
            let mut next = state.clone();
            merge_metadata(&mut next.capabilities, patch);
            Some(next)
        }
        Action::Restore { document } => Some(*document),
    };

    match next {
        Some(doc) if doc != *state => Some(doc),
        Some(_) => None,
        None => {
            debug!(action = name, "Action rejected, document unchanged");
            None
        }
    }
}

fn merge_metadata(target: &mut Metadata, patch: Metadata) {
    target.extend(patch);
}

/// Checks a page coming from outside and moves its background to the front.
fn normalize_page(mut page: Page) -> Option<Page> {
    let mut seen = HashSet::new();
    if !page.elements.iter().all(|e| seen.insert(e.id.clone())) {
        return None;
    }
    if let Some(bg) = &page.background_element_id {
        let index = page.element_index(bg)?;
        move_to_front(&mut page.elements, index);
    }
    Some(page)
}

fn move_to_front(elements: &mut Vec<Element>, index: usize) {
    if index > 0 {
        let element = elements.remove(index);
        elements.insert(0, element);
    }
}

/// Drops the current page's background from a multi-element selection.
fn exclude_background_from_selection(doc: &mut StoryDocument) {
    if doc.selection.len() < 2 {
        return;
    }
    let Some(bg) = doc
        .current_page()
        .and_then(|p| p.background_element_id.clone())
    else {
        return;
    };
    doc.selection.retain(|id| *id != bg);
}

/// Lowest index a non-background element may take on `page`.
fn first_free_index(page: &Page) -> usize {
    usize::from(page.background_element_id.is_some())
}

fn add_page(state: &StoryDocument, page: Page, at: Option<usize>) -> Option<StoryDocument> {
    if state.page(&page.id).is_some() {
        return None;
    }
    let page = normalize_page(page)?;
    let mut next = state.clone();
    let index = at.unwrap_or(next.pages.len()).min(next.pages.len());
    next.current = Some(page.id.clone());
    next.pages.insert(index, page);
    next.selection.clear();
    Some(next)
}

fn delete_page(state: &StoryDocument, page_id: &PageId) -> Option<StoryDocument> {
    let index = state.page_index(page_id)?;
    let mut next = state.clone();
    next.pages.remove(index);
    if next.current.as_ref() == Some(page_id) {
        next.current = next
            .pages
            .get(index)
            .or_else(|| index.checked_sub(1).and_then(|i| next.pages.get(i)))
            .map(|p| p.id.clone());
    }
    next.selection.clear();
    Some(next)
}

fn set_current_page(state: &StoryDocument, page_id: PageId) -> Option<StoryDocument> {
    state.page(&page_id)?;
    let mut next = state.clone();
    next.current = Some(page_id);
    next.selection.clear();
    Some(next)
}

fn arrange_page(state: &StoryDocument, page_id: &PageId, position: usize) -> Option<StoryDocument> {
    let index = state.page_index(page_id)?;
    let mut next = state.clone();
    let page = next.pages.remove(index);
    let position = position.min(next.pages.len());
    next.pages.insert(position, page);
    Some(next)
}

fn add_element(
    state: &StoryDocument,
    element: Element,
    at: Option<usize>,
    as_background: bool,
) -> Option<StoryDocument> {
    let mut next = state.clone();
    let page = next.current_page_mut()?;
    if page.contains_element(&element.id) {
        return None;
    }
    if as_background {
        page.background_element_id = Some(element.id.clone());
        page.elements.insert(0, element);
    } else {
        let len = page.elements.len();
        let index = at.unwrap_or(len).clamp(first_free_index(page), len);
        page.elements.insert(index, element);
    }
    exclude_background_from_selection(&mut next);
    Some(next)
}

fn delete_elements(state: &StoryDocument, element_ids: &[ElementId]) -> Option<StoryDocument> {
    let mut next = state.clone();
    let page = next.current_page_mut()?;
    let removed: Vec<ElementId> = page
        .elements
        .iter()
        .filter(|e| element_ids.contains(&e.id))
        .map(|e| e.id.clone())
        .collect();
    if removed.is_empty() {
        return None;
    }
    page.elements.retain(|e| !removed.contains(&e.id));
    if page
        .background_element_id
        .as_ref()
        .is_some_and(|bg| removed.contains(bg))
    {
        page.background_element_id = None;
    }
    next.selection.retain(|id| !removed.contains(id));
    Some(next)
}

fn set_element_properties(
    state: &StoryDocument,
    element_ids: &[ElementId],
    patch: &ElementPatch,
) -> Option<StoryDocument> {
    let mut next = state.clone();
    let page = next.current_page_mut()?;
    let mut matched = false;
    for element in page
        .elements
        .iter_mut()
        .filter(|e| element_ids.contains(&e.id))
    {
        patch.apply(element);
        matched = true;
    }
    matched.then_some(next)
}

fn set_background_element(
    state: &StoryDocument,
    element_id: Option<ElementId>,
) -> Option<StoryDocument> {
    let mut next = state.clone();
    let page = next.current_page_mut()?;
    match element_id {
        None => page.background_element_id = None,
        Some(id) => {
            let index = page.element_index(&id)?;
            move_to_front(&mut page.elements, index);
            page.background_element_id = Some(id);
        }
    }
    exclude_background_from_selection(&mut next);
    Some(next)
}

fn arrange_element(
    state: &StoryDocument,
    element_id: &ElementId,
    position: usize,
) -> Option<StoryDocument> {
    let mut next = state.clone();
    let page = next.current_page_mut()?;
    if page.is_background(element_id) {
        return None;
    }
    let index = page.element_index(element_id)?;
    let element = page.elements.remove(index);
    let position = position.clamp(first_free_index(page), page.elements.len());
    page.elements.insert(position, element);
    Some(next)
}

fn select_elements(
    state: &StoryDocument,
    element_ids: Vec<ElementId>,
    mode: SelectionMode,
) -> Option<StoryDocument> {
    let mut seen = HashSet::new();
    let ids: Vec<ElementId> = element_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let mut next = state.clone();
    match mode {
        SelectionMode::Replace => next.selection = ids,
        SelectionMode::Add => {
            for id in ids {
                if !next.selection.contains(&id) {
                    next.selection.push(id);
                }
            }
        }
        SelectionMode::Toggle => {
            for id in ids {
                match next.selection.iter().position(|s| *s == id) {
                    Some(index) => {
                        next.selection.remove(index);
                    }
                    None => next.selection.push(id),
                }
            }
        }
    }
    exclude_background_from_selection(&mut next);
    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ContentPatch, SquarePatch};
    use crate::color::HexColor;

    fn ids(list: &[&str]) -> Vec<ElementId> {
        list.iter().map(|s| ElementId::from(*s)).collect()
    }

    fn element_order(doc: &StoryDocument) -> Vec<&str> {
        doc.current_page()
            .map(|p| p.elements.iter().map(|e| e.id.as_str()).collect())
            .unwrap_or_default()
    }

    fn page_order(doc: &StoryDocument) -> Vec<&str> {
        doc.pages.iter().map(|p| p.id.as_str()).collect()
    }

    fn add_page(doc: &StoryDocument, id: &str) -> StoryDocument {
        reduce(
            doc,
            Action::AddPage {
                page: Page::new(id),
                at: None,
            },
        )
    }

    /// One page "p1" holding squares with the given ids.
    fn doc_with_elements(elements: &[&str]) -> StoryDocument {
        let page = Page::new("p1").with_elements(elements.iter().map(|e| Element::square(*e)).collect());
        reduce(&StoryDocument::new(), Action::AddPage { page, at: None })
    }

    fn set_background(doc: &StoryDocument, id: &str) -> StoryDocument {
        reduce(
            doc,
            Action::SetBackgroundElement {
                element_id: Some(ElementId::from(id)),
            },
        )
    }

    fn select(doc: &StoryDocument, list: &[&str], mode: SelectionMode) -> StoryDocument {
        reduce(
            doc,
            Action::SelectElements {
                element_ids: ids(list),
                mode,
            },
        )
    }

    // ── Pages ───────────────────────────────────────────────────────

    #[test]
    fn test_add_page_becomes_current() {
        let doc = add_page(&StoryDocument::new(), "p1");
        let doc = add_page(&doc, "p2");
        assert_eq!(page_order(&doc), vec!["p1", "p2"]);
        assert_eq!(doc.current, Some(PageId::from("p2")));
    }

    #[test]
    fn test_add_page_at_index_clamps() {
        let doc = add_page(&add_page(&StoryDocument::new(), "p1"), "p2");
        let doc = reduce(
            &doc,
            Action::AddPage {
                page: Page::new("p0"),
                at: Some(0),
            },
        );
        let doc = reduce(
            &doc,
            Action::AddPage {
                page: Page::new("p9"),
                at: Some(99),
            },
        );
        assert_eq!(page_order(&doc), vec!["p0", "p1", "p2", "p9"]);
    }

    #[test]
    fn test_add_page_clears_selection() {
        let doc = select(&doc_with_elements(&["a"]), &["a"], SelectionMode::Replace);
        assert_eq!(doc.selection, ids(&["a"]));
        let doc = add_page(&doc, "p2");
        assert!(doc.selection.is_empty());
    }

    #[test]
    fn test_add_page_rejects_duplicate_id() {
        let doc = add_page(&StoryDocument::new(), "p1");
        assert_eq!(add_page(&doc, "p1"), doc);
    }

    #[test]
    fn test_add_page_rejects_duplicate_elements() {
        let page = Page::new("p1").with_elements(vec![Element::square("a"), Element::square("a")]);
        let doc = reduce(&StoryDocument::new(), Action::AddPage { page, at: None });
        assert_eq!(doc, StoryDocument::new());
    }

    #[test]
    fn test_add_page_normalizes_background() {
        let mut page = Page::new("p1").with_elements(vec![Element::square("a"), Element::square("bg")]);
        page.background_element_id = Some(ElementId::from("bg"));
        let doc = reduce(&StoryDocument::new(), Action::AddPage { page, at: None });
        assert_eq!(element_order(&doc), vec!["bg", "a"]);
        assert!(doc.is_consistent());

        let mut page = Page::new("p2");
        page.background_element_id = Some(ElementId::from("missing"));
        let rejected = reduce(&doc, Action::AddPage { page, at: None });
        assert_eq!(rejected, doc);
    }

    #[test]
    fn test_delete_current_page_moves_to_following() {
        let doc = ["p1", "p2", "p3"]
            .iter()
            .fold(StoryDocument::new(), |d, id| add_page(&d, id));
        let doc = reduce(
            &doc,
            Action::SetCurrentPage {
                page_id: PageId::from("p2"),
            },
        );
        let doc = reduce(
            &doc,
            Action::DeletePage {
                page_id: PageId::from("p2"),
            },
        );
        assert_eq!(doc.current, Some(PageId::from("p3")));

        let doc = reduce(
            &doc,
            Action::DeletePage {
                page_id: PageId::from("p3"),
            },
        );
        assert_eq!(doc.current, Some(PageId::from("p1")));

        let doc = reduce(
            &doc,
            Action::DeletePage {
                page_id: PageId::from("p1"),
            },
        );
        assert_eq!(doc.current, None);
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_delete_other_page_keeps_current() {
        let doc = add_page(&add_page(&StoryDocument::new(), "p1"), "p2");
        let doc = reduce(
            &doc,
            Action::DeletePage {
                page_id: PageId::from("p1"),
            },
        );
        assert_eq!(doc.current, Some(PageId::from("p2")));
    }

    #[test]
    fn test_set_current_page_unknown_is_noop() {
        let doc = add_page(&StoryDocument::new(), "p1");
        let next = reduce(
            &doc,
            Action::SetCurrentPage {
                page_id: PageId::from("nope"),
            },
        );
        assert_eq!(next, doc);
    }

    /// "p2" (empty) followed by the current page "p1" with `a` and `b`
    /// selected.
    fn two_pages_with_selection() -> StoryDocument {
        let doc = add_page(&StoryDocument::new(), "p2");
        let page = Page::new("p1").with_elements(vec![Element::square("a"), Element::square("b")]);
        let doc = reduce(&doc, Action::AddPage { page, at: None });
        let doc = select(&doc, &["a", "b"], SelectionMode::Replace);
        assert_eq!(doc.current, Some(PageId::from("p1")));
        assert_eq!(doc.selection, ids(&["a", "b"]));
        doc
    }

    #[test]
    fn test_set_current_page_clears_selection() {
        let doc = two_pages_with_selection();
        let next = reduce(
            &doc,
            Action::SetCurrentPage {
                page_id: PageId::from("p2"),
            },
        );
        assert_eq!(next.current, Some(PageId::from("p2")));
        assert!(next.selection.is_empty());
    }

    #[test]
    fn test_set_current_page_to_current_clears_selection() {
        let doc = two_pages_with_selection();
        let next = reduce(
            &doc,
            Action::SetCurrentPage {
                page_id: PageId::from("p1"),
            },
        );
        assert_eq!(next.current, Some(PageId::from("p1")));
        assert!(next.selection.is_empty());
        assert_eq!(next.pages, doc.pages);
    }

    #[test]
    fn test_delete_other_page_clears_selection() {
        let doc = two_pages_with_selection();
        let next = reduce(
            &doc,
            Action::DeletePage {
                page_id: PageId::from("p2"),
            },
        );
        assert_eq!(page_order(&next), vec!["p1"]);
        assert_eq!(next.current, Some(PageId::from("p1")));
        assert!(next.selection.is_empty());
    }

    #[test]
    fn test_arrange_page() {
        let doc = ["p1", "p2", "p3"]
            .iter()
            .fold(StoryDocument::new(), |d, id| add_page(&d, id));
        let doc = reduce(
            &doc,
            Action::ArrangePage {
                page_id: PageId::from("p3"),
                position: 0,
            },
        );
        assert_eq!(page_order(&doc), vec!["p3", "p1", "p2"]);
        let doc = reduce(
            &doc,
            Action::ArrangePage {
                page_id: PageId::from("p3"),
                position: 50,
            },
        );
        assert_eq!(page_order(&doc), vec!["p1", "p2", "p3"]);
        assert_eq!(doc.current, Some(PageId::from("p3")));
    }

    // ── Elements ────────────────────────────────────────────────────

    #[test]
    fn test_add_element_without_page_is_rejected() {
        let doc = reduce(
            &StoryDocument::new(),
            Action::AddElement {
                element: Element::square("a"),
                at: None,
                as_background: false,
            },
        );
        assert_eq!(doc, StoryDocument::new());
    }

    #[test]
    fn test_add_element_stays_above_background() {
        let doc = set_background(&doc_with_elements(&["bg", "a"]), "bg");
        let doc = reduce(
            &doc,
            Action::AddElement {
                element: Element::square("b"),
                at: Some(0),
                as_background: false,
            },
        );
        assert_eq!(element_order(&doc), vec!["bg", "b", "a"]);
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_add_element_as_background() {
        let doc = doc_with_elements(&["a"]);
        let doc = reduce(
            &doc,
            Action::AddElement {
                element: Element::square("bg"),
                at: Some(5),
                as_background: true,
            },
        );
        assert_eq!(element_order(&doc), vec!["bg", "a"]);
        assert_eq!(
            doc.current_page().unwrap().background_element_id,
            Some(ElementId::from("bg"))
        );
    }

    #[test]
    fn test_add_element_duplicate_id_is_rejected() {
        let doc = doc_with_elements(&["a"]);
        let next = reduce(
            &doc,
            Action::AddElement {
                element: Element::text("a", "again"),
                at: None,
                as_background: false,
            },
        );
        assert_eq!(next, doc);
    }

    #[test]
    fn test_delete_elements_updates_selection_and_background() {
        let doc = set_background(&doc_with_elements(&["a", "b", "c"]), "a");
        let doc = select(&doc, &["b", "c"], SelectionMode::Replace);
        let doc = reduce(
            &doc,
            Action::DeleteElements {
                element_ids: ids(&["a", "b", "zzz"]),
            },
        );
        assert_eq!(element_order(&doc), vec!["c"]);
        assert_eq!(doc.selection, ids(&["c"]));
        assert_eq!(doc.current_page().unwrap().background_element_id, None);
    }

    #[test]
    fn test_delete_unknown_element_is_noop() {
        let doc = doc_with_elements(&["a"]);
        let next = reduce(
            &doc,
            Action::DeleteElements {
                element_ids: ids(&["nonexistent"]),
            },
        );
        assert_eq!(next, doc);
    }

    #[test]
    fn test_set_element_properties() {
        let doc = doc_with_elements(&["a", "b"]);
        let patch = ElementPatch {
            x: Some(40.0),
            content: Some(ContentPatch::Square(SquarePatch {
                background_color: Some(HexColor::rgb(255, 0, 0)),
            })),
            ..ElementPatch::default()
        };
        let doc = reduce(
            &doc,
            Action::SetElementProperties {
                element_ids: ids(&["b"]),
                patch,
            },
        );
        let page = doc.current_page().unwrap();
        assert!((page.elements[1].frame.x - 40.0).abs() < f32::EPSILON);
        assert!((page.elements[0].frame.x).abs() < f32::EPSILON);
        assert_eq!(page.elements[1].id.as_str(), "b");
    }

    #[test]
    fn test_update_selected_elements() {
        let doc = select(&doc_with_elements(&["a", "b", "c"]), &["a", "c"], SelectionMode::Replace);
        let doc = reduce(
            &doc,
            Action::UpdateSelectedElements {
                patch: ElementPatch::rotation(90.0),
            },
        );
        assert_eq!(doc.common_value(|e| e.frame.rotation_angle), Some(90.0));
        let page = doc.current_page().unwrap();
        assert!((page.elements[1].frame.rotation_angle).abs() < f32::EPSILON);
    }

    #[test]
    fn test_background_reorder() {
        let doc = set_background(&doc_with_elements(&["a", "b", "c"]), "c");
        assert_eq!(element_order(&doc), vec!["c", "a", "b"]);
        assert!(doc.is_consistent());
    }

    #[test]
    fn test_set_background_twice_equals_once() {
        let once = set_background(&doc_with_elements(&["a", "b", "c"]), "b");
        let twice = set_background(&once, "b");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clear_background_keeps_order() {
        let doc = set_background(&doc_with_elements(&["a", "b"]), "b");
        let doc = reduce(&doc, Action::SetBackgroundElement { element_id: None });
        assert_eq!(element_order(&doc), vec!["b", "a"]);
        assert_eq!(doc.current_page().unwrap().background_element_id, None);
    }

    #[test]
    fn test_set_unknown_background_is_noop() {
        let doc = doc_with_elements(&["a"]);
        assert_eq!(set_background(&doc, "zzz"), doc);
    }

    #[test]
    fn test_set_background_drops_it_from_multi_selection() {
        let doc = select(&doc_with_elements(&["a", "b"]), &["a", "b"], SelectionMode::Replace);
        let doc = set_background(&doc, "b");
        assert_eq!(doc.selection, ids(&["a"]));
    }

    #[test]
    fn test_arrange_element() {
        let doc = doc_with_elements(&["a", "b", "c"]);
        let doc = reduce(
            &doc,
            Action::ArrangeElement {
                element_id: ElementId::from("a"),
                position: 2,
            },
        );
        assert_eq!(element_order(&doc), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_arrange_element_respects_background() {
        let doc = set_background(&doc_with_elements(&["bg", "a", "b"]), "bg");
        let doc = reduce(
            &doc,
            Action::ArrangeElement {
                element_id: ElementId::from("b"),
                position: 0,
            },
        );
        assert_eq!(element_order(&doc), vec!["bg", "b", "a"]);

        let unchanged = reduce(
            &doc,
            Action::ArrangeElement {
                element_id: ElementId::from("bg"),
                position: 2,
            },
        );
        assert_eq!(unchanged, doc);
    }

    // ── Selection and metadata ──────────────────────────────────────

    #[test]
    fn test_selection_modes() {
        let doc = doc_with_elements(&["a", "b", "c"]);
        let doc = select(&doc, &["a", "a", "b"], SelectionMode::Replace);
        assert_eq!(doc.selection, ids(&["a", "b"]));

        let doc = select(&doc, &["b", "c"], SelectionMode::Add);
        assert_eq!(doc.selection, ids(&["a", "b", "c"]));

        let doc = select(&doc, &["a", "d"], SelectionMode::Toggle);
        assert_eq!(doc.selection, ids(&["b", "c", "d"]));

        let doc = reduce(&doc, Action::ClearSelection);
        assert!(doc.selection.is_empty());
    }

    #[test]
    fn test_selection_excludes_background() {
        let doc = set_background(&doc_with_elements(&["bg", "x"]), "bg");
        let doc = select(&doc, &["bg", "x"], SelectionMode::Replace);
        assert_eq!(doc.selection, ids(&["x"]));

        let single = select(&doc, &["bg"], SelectionMode::Replace);
        assert_eq!(single.selection, ids(&["bg"]));
    }

    #[test]
    fn test_metadata_merge() {
        let mut patch = Metadata::new();
        patch.insert("title".into(), serde_json::json!("Draft"));
        patch.insert("status".into(), serde_json::json!("draft"));
        let doc = reduce(&StoryDocument::new(), Action::SetStoryMeta { patch });

        let mut patch = Metadata::new();
        patch.insert("status".into(), serde_json::json!("publish"));
        let doc = reduce(&doc, Action::SetStoryMeta { patch });
        assert_eq!(doc.story["title"], "Draft");
        assert_eq!(doc.story["status"], "publish");

        let mut patch = Metadata::new();
        patch.insert("canPublish".into(), serde_json::json!(true));
        let doc = reduce(&doc, Action::SetCapabilities { patch });
        assert_eq!(doc.capabilities["canPublish"], true);
    }

    #[test]
    fn test_restore_replaces_verbatim() {
        let target = doc_with_elements(&["a"]);
        let doc = reduce(
            &StoryDocument::new(),
            Action::Restore {
                document: Box::new(target.clone()),
            },
        );
        assert_eq!(doc, target);
    }

    #[test]
    fn test_transition_reports_noop() {
        let doc = doc_with_elements(&["a"]);
        assert!(transition(&doc, Action::ClearSelection).is_none());
        assert!(transition(&doc, Action::SetBackgroundElement { element_id: None }).is_none());
        let select_a = Action::SelectElements {
            element_ids: ids(&["a"]),
            mode: SelectionMode::Replace,
        };
        assert!(transition(&doc, select_a).is_some());
    }
}
