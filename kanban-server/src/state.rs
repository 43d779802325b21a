//! Application state shared across handlers

use std::sync::Arc;

use crate::store::KanbanStore;

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn KanbanStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn KanbanStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn KanbanStore {
        self.store.as_ref()
    }
}
