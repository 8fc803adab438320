/// Holds the current story document and applies actions to it.
///
/// The document sits behind an `Arc`. A changing action swaps in a new
/// `Arc`; a no-op keeps the old one, so `Arc::ptr_eq` tells observers
/// whether anything happened.
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::action::Action;
use crate::api::Dispatch;
use crate::document::StoryDocument;
use crate::reducer::transition;

/// Handle returned by [`StoryStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoryDocument)>;

pub struct StoryStore {
    state: Arc<StoryDocument>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_listener: u64,
    /// Number of state changes applied so far.
    version: u64,
}

impl fmt::Debug for StoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoryStore")
            .field("pages", &self.state.pages.len())
            .field("current", &self.state.current)
            .field("listeners", &self.listeners.len())
            .field("version", &self.version)
            .finish()
    }
}

impl Default for StoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryStore {
    /// A store holding the empty initial document.
    pub fn new() -> Self {
        Self::with_document(StoryDocument::new())
    }

    pub fn with_document(document: StoryDocument) -> Self {
        Self {
            state: Arc::new(document),
            listeners: Vec::new(),
            next_listener: 0,
            version: 0,
        }
    }

    /// Shared handle to the current document.
    pub fn state(&self) -> Arc<StoryDocument> {
        Arc::clone(&self.state)
    }

    pub fn document(&self) -> &StoryDocument {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Runs `action` through the reducer. Returns true if the document changed.
    pub fn apply(&mut self, action: Action) -> bool {
        let name = action.name();
        match transition(&self.state, action) {
            Some(next) => {
                self.state = Arc::new(next);
                self.version += 1;
                trace!(action = name, version = self.version, "Document updated");
                self.notify();
                true
            }
            None => false,
        }
    }

    /// Replaces the document wholesale, bypassing validation.
    pub fn restore(&mut self, document: StoryDocument) -> bool {
        self.apply(Action::Restore {
            document: Box::new(document),
        })
    }

    /// Registers a callback run after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoryDocument) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self) {
        let state = Arc::clone(&self.state);
        for (_, listener) in &mut self.listeners {
            listener(state.as_ref());
        }
    }
}

impl Dispatch for StoryStore {
    fn dispatch(&mut self, action: Action) {
        self.apply(action);
    }
}
