use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task as stored and returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub owner_id: String,
    pub item_id: String,
    pub name: String,
    pub due_date: String,
    pub created_at: DateTime<Utc>,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Create input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub name: String,
    pub due_date: String,
}

/// Update input; replaces all three mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub name: String,
    pub due_date: String,
    pub done: bool,
}

impl TodoItem {
    /// Overwrite the mutable fields; identity and timestamps are left alone.
    pub fn apply(&mut self, update: &UpdateTodoRequest) {
        self.name = update.name.clone();
        self.due_date = update.due_date.clone();
        self.done = update.done;
    }
}

/// Newest first; ties broken by item id, descending.
pub fn sort_newest_first(items: &mut [TodoItem]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.item_id.cmp(&a.item_id))
    });
}
