/// Typed wrappers that build [`Action`]s and hand them to a dispatcher.
///
/// `ExposedActions` is the surface UI code uses. `InternalActions` holds the
/// low-level entry points reserved for history restore, paste and gestures.
/// Neither validates anything; the reducer decides what an action means.
use crate::action::{Action, SelectionMode};
use crate::document::{Metadata, Page, StoryDocument};
use crate::element::{create_new_element, create_page, Element, ElementPatch, ElementType};
use crate::ids::{ElementId, IdGenerator, PageId};

/// Something that accepts actions.
pub trait Dispatch {
    fn dispatch(&mut self, action: Action);
}

impl<T: Dispatch + ?Sized> Dispatch for &mut T {
    fn dispatch(&mut self, action: Action) {
        (**self).dispatch(action);
    }
}

/// Collects actions instead of applying them. Handy for scripting and tests.
impl Dispatch for Vec<Action> {
    fn dispatch(&mut self, action: Action) {
        self.push(action);
    }
}

/// Public editing API.
pub struct ExposedActions<'a, D: Dispatch> {
    dispatcher: D,
    ids: &'a mut dyn IdGenerator,
    /// Page width and height; background elements are sized to cover it.
    page_size: Option<(f32, f32)>,
}

impl<'a, D: Dispatch> ExposedActions<'a, D> {
    pub fn new(dispatcher: D, ids: &'a mut dyn IdGenerator) -> Self {
        Self {
            dispatcher,
            ids,
            page_size: None,
        }
    }

    pub fn with_page_size(mut self, width: f32, height: f32) -> Self {
        self.page_size = Some((width, height));
        self
    }

    // ── Pages ───────────────────────────────────────────────────────

    /// Appends a new empty page and returns its id.
    pub fn add_page(&mut self) -> PageId {
        self.add_page_at(None)
    }

    pub fn add_page_at(&mut self, at: Option<usize>) -> PageId {
        let page = create_page(&mut *self.ids);
        let id = page.id.clone();
        self.dispatcher.dispatch(Action::AddPage { page, at });
        id
    }

    pub fn delete_page(&mut self, page_id: PageId) {
        self.dispatcher.dispatch(Action::DeletePage { page_id });
    }

    /// Deletes whatever page is current, given the document it reads from.
    pub fn delete_current_page(&mut self, doc: &StoryDocument) {
        if let Some(page_id) = doc.current.clone() {
            self.delete_page(page_id);
        }
    }

    pub fn set_current_page(&mut self, page_id: PageId) {
        self.dispatcher.dispatch(Action::SetCurrentPage { page_id });
    }

    pub fn arrange_page(&mut self, page_id: PageId, position: usize) {
        self.dispatcher
            .dispatch(Action::ArrangePage { page_id, position });
    }

    // ── Elements ────────────────────────────────────────────────────

    /// Builds an element of `element_type` and dispatches it for the
    /// current page.
    ///
    /// The generated id is returned whether or not the reducer accepts the
    /// action, e.g. with no current page nothing is added but the id still
    /// comes back. `None` only for [`ElementType::Page`], which is never
    /// dispatched.
    pub fn add_element(
        &mut self,
        element_type: ElementType,
        attributes: &ElementPatch,
    ) -> Option<ElementId> {
        self.add_element_at(element_type, attributes, None)
    }

    pub fn add_element_at(
        &mut self,
        element_type: ElementType,
        attributes: &ElementPatch,
        at: Option<usize>,
    ) -> Option<ElementId> {
        self.create_and_add(element_type, attributes, at, false)
    }

    /// Creates an element and makes it the current page's background.
    ///
    /// With a page size set, the element starts full-bleed at the page's
    /// dimensions; `attributes` still win over those defaults.
    pub fn add_background_element(
        &mut self,
        element_type: ElementType,
        attributes: &ElementPatch,
    ) -> Option<ElementId> {
        self.create_and_add(element_type, attributes, None, true)
    }

    fn create_and_add(
        &mut self,
        element_type: ElementType,
        attributes: &ElementPatch,
        at: Option<usize>,
        as_background: bool,
    ) -> Option<ElementId> {
        let mut element = match (as_background, self.page_size) {
            (true, Some((width, height))) => {
                let cover = ElementPatch {
                    x: Some(0.0),
                    y: Some(0.0),
                    width: Some(width),
                    height: Some(height),
                    is_fullbleed: Some(true),
                    ..ElementPatch::default()
                };
                create_new_element(element_type, &cover, &mut *self.ids)?
            }
            _ => create_new_element(element_type, &ElementPatch::default(), &mut *self.ids)?,
        };
        attributes.apply(&mut element);
        let id = element.id.clone();
        self.dispatcher.dispatch(Action::AddElement {
            element,
            at,
            as_background,
        });
        Some(id)
    }

    pub fn delete_element(&mut self, element_id: ElementId) {
        self.delete_elements(vec![element_id]);
    }

    pub fn delete_elements(&mut self, element_ids: Vec<ElementId>) {
        self.dispatcher
            .dispatch(Action::DeleteElements { element_ids });
    }

    pub fn delete_selected_elements(&mut self, doc: &StoryDocument) {
        if !doc.selection.is_empty() {
            self.delete_elements(doc.selection.clone());
        }
    }

    pub fn set_element_properties(&mut self, element_id: ElementId, patch: ElementPatch) {
        self.dispatcher.dispatch(Action::SetElementProperties {
            element_ids: vec![element_id],
            patch,
        });
    }

    pub fn update_selected_elements(&mut self, patch: ElementPatch) {
        self.dispatcher
            .dispatch(Action::UpdateSelectedElements { patch });
    }

    pub fn set_background_element(&mut self, element_id: ElementId) {
        self.dispatcher.dispatch(Action::SetBackgroundElement {
            element_id: Some(element_id),
        });
    }

    pub fn clear_background_element(&mut self) {
        self.dispatcher
            .dispatch(Action::SetBackgroundElement { element_id: None });
    }

    pub fn arrange_element(&mut self, element_id: ElementId, position: usize) {
        self.dispatcher.dispatch(Action::ArrangeElement {
            element_id,
            position,
        });
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn select_elements(&mut self, element_ids: Vec<ElementId>) {
        self.dispatcher.dispatch(Action::SelectElements {
            element_ids,
            mode: SelectionMode::Replace,
        });
    }

    /// Replaces the selection with a single element.
    pub fn select_element(&mut self, element_id: ElementId) {
        self.select_elements(vec![element_id]);
    }

    /// Removes one element from the selection if it is selected.
    pub fn unselect_element(&mut self, doc: &StoryDocument, element_id: ElementId) {
        if doc.is_selected(&element_id) {
            self.toggle_element_in_selection(element_id);
        }
    }

    pub fn toggle_element_in_selection(&mut self, element_id: ElementId) {
        self.dispatcher.dispatch(Action::SelectElements {
            element_ids: vec![element_id],
            mode: SelectionMode::Toggle,
        });
    }

    pub fn clear_selection(&mut self) {
        self.dispatcher.dispatch(Action::ClearSelection);
    }

    // ── Story ───────────────────────────────────────────────────────

    pub fn set_story_meta(&mut self, patch: Metadata) {
        self.dispatcher.dispatch(Action::SetStoryMeta { patch });
    }

    pub fn set_capabilities(&mut self, patch: Metadata) {
        self.dispatcher.dispatch(Action::SetCapabilities { patch });
    }
}

/// Low-level API for history, clipboard and pointer gestures.
pub struct InternalActions<D: Dispatch> {
    dispatcher: D,
}

impl<D: Dispatch> InternalActions<D> {
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }

    /// Replaces the whole document without validation.
    pub fn restore(&mut self, document: StoryDocument) {
        self.dispatcher.dispatch(Action::Restore {
            document: Box::new(document),
        });
    }

    /// Inserts a pre-built element, keeping its id.
    pub fn insert_element(&mut self, element: Element, at: Option<usize>) {
        self.dispatcher.dispatch(Action::AddElement {
            element,
            at,
            as_background: false,
        });
    }

    /// Inserts a pre-built page, keeping its id.
    pub fn insert_page(&mut self, page: Page, at: Option<usize>) {
        self.dispatcher.dispatch(Action::AddPage { page, at });
    }

    pub fn set_properties_for(&mut self, element_ids: Vec<ElementId>, patch: ElementPatch) {
        self.dispatcher
            .dispatch(Action::SetElementProperties { element_ids, patch });
    }

    pub fn set_selection(&mut self, element_ids: Vec<ElementId>, mode: SelectionMode) {
        self.dispatcher
            .dispatch(Action::SelectElements { element_ids, mode });
    }
}
