/// Document-state core of the story editor.
///
/// A story is a list of pages holding positioned elements. All edits are
/// `Action`s run through a pure reducer; `StoryStore` holds the current
/// document and `StorySession` adds snapshot undo/redo on top.
pub mod action;
pub mod api;
pub mod color;
pub mod document;
pub mod element;
pub mod history;
pub mod ids;
pub mod reducer;
pub mod session;
pub mod store;

pub use action::{Action, SelectionMode};
pub use api::{Dispatch, ExposedActions, InternalActions};
pub use color::HexColor;
pub use document::{check_invariants, InvariantViolation, Metadata, Page, StoryDocument};
pub use element::{
    create_new_element, create_page, Element, ElementContent, ElementPatch, ElementType, Frame,
};
pub use ids::{ElementId, IdGenerator, PageId, SequentialIdGenerator, UuidIdGenerator};
pub use reducer::reduce;
pub use session::StorySession;
pub use store::{StoryStore, SubscriptionId};
