/// Actions: every transition the reducer understands.
///
/// Actions are plain data so they can be logged, replayed from JSON scripts
/// and recorded by tests. Serialized, the `type` field names the variant in
/// snake_case, e.g. `{"type": "delete_page", "pageId": "p1"}`.
use serde::{Deserialize, Serialize};

use crate::document::{Metadata, Page, StoryDocument};
use crate::element::{Element, ElementPatch};
use crate::ids::{ElementId, PageId};

/// How [`Action::SelectElements`] combines its ids with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// The ids become the selection.
    #[default]
    Replace,
    /// The ids are appended; ids already selected stay where they are.
    Add,
    /// Selected ids are removed, the others appended.
    Toggle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum Action {
    /// Insert a page (at the end by default) and make it current.
    AddPage {
        page: Page,
        #[serde(default)]
        at: Option<usize>,
    },
    DeletePage {
        page_id: PageId,
    },
    SetCurrentPage {
        page_id: PageId,
    },
    /// Move a page to a new index in playback order.
    ArrangePage {
        page_id: PageId,
        position: usize,
    },
    /// Insert an element into the current page.
    AddElement {
        element: Element,
        #[serde(default)]
        at: Option<usize>,
        /// Insert at index 0 and make the element the page background.
        #[serde(default)]
        as_background: bool,
    },
    DeleteElements {
        element_ids: Vec<ElementId>,
    },
    SetElementProperties {
        element_ids: Vec<ElementId>,
        patch: ElementPatch,
    },
    /// `SetElementProperties` for the current selection.
    UpdateSelectedElements {
        patch: ElementPatch,
    },
    /// `None` clears the background without reordering.
    SetBackgroundElement {
        #[serde(default, deserialize_with = "crate::ids::empty_as_none")]
        element_id: Option<ElementId>,
    },
    /// Move an element within the current page's z-order.
    ArrangeElement {
        element_id: ElementId,
        position: usize,
    },
    SelectElements {
        element_ids: Vec<ElementId>,
        #[serde(default)]
        mode: SelectionMode,
    },
    ClearSelection,
    SetStoryMeta {
        patch: Metadata,
    },
    SetCapabilities {
        patch: Metadata,
    },
    /// Replace the whole document. Used by history restore only.
    Restore {
        document: Box<StoryDocument>,
    },
}

impl Action {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddPage { .. } => "add_page",
            Self::DeletePage { .. } => "delete_page",
            Self::SetCurrentPage { .. } => "set_current_page",
            Self::ArrangePage { .. } => "arrange_page",
            Self::AddElement { .. } => "add_element",
            Self::DeleteElements { .. } => "delete_elements",
            Self::SetElementProperties { .. } => "set_element_properties",
            Self::UpdateSelectedElements { .. } => "update_selected_elements",
            Self::SetBackgroundElement { .. } => "set_background_element",
            Self::ArrangeElement { .. } => "arrange_element",
            Self::SelectElements { .. } => "select_elements",
            Self::ClearSelection => "clear_selection",
            Self::SetStoryMeta { .. } => "set_story_meta",
            Self::SetCapabilities { .. } => "set_capabilities",
            Self::Restore { .. } => "restore",
        }
    }
}
