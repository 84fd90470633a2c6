use async_trait::async_trait;

use super::domain::{TodoItem, UpdateTodoRequest};
use crate::errors::ServiceError;

/// Key-value access to tasks keyed by (owner, item).
///
/// Each call is one request to the backing store; errors are passed through
/// unchanged, without retries.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All tasks of `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError>;
    async fn insert(&self, item: TodoItem) -> Result<TodoItem, ServiceError>;
    /// Conditional update of name/dueDate/done; `NotFound` when the task does not exist.
    async fn update(&self, owner_id: &str, item_id: &str, update: &UpdateTodoRequest) -> Result<(), ServiceError>;
    /// Conditional update of the attachment URL only.
    async fn set_attachment_url(&self, owner_id: &str, item_id: &str, url: &str) -> Result<(), ServiceError>;
    /// Removing a missing task is not an error.
    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::todo::domain::sort_newest_first;

    #[derive(Default)]
    pub struct MemoryTodoRepository {
        items: Mutex<HashMap<(String, String), TodoItem>>, // key: (owner_id, item_id)
    }

    impl MemoryTodoRepository {
        fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<(String, String), TodoItem>>, ServiceError> {
            self.items.lock().map_err(|_| ServiceError::Db("memory store poisoned".into()))
        }
    }

    #[async_trait]
    impl TodoRepository for MemoryTodoRepository {
        async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
            let items = self.lock()?;
            let mut out: Vec<TodoItem> = items.values().filter(|t| t.owner_id == owner_id).cloned().collect();
            sort_newest_first(&mut out);
            Ok(out)
        }

        async fn insert(&self, item: TodoItem) -> Result<TodoItem, ServiceError> {
            let mut items = self.lock()?;
            items.insert((item.owner_id.clone(), item.item_id.clone()), item.clone());
            Ok(item)
        }

        async fn update(&self, owner_id: &str, item_id: &str, update: &UpdateTodoRequest) -> Result<(), ServiceError> {
            let mut items = self.lock()?;
            let found = items
                .get_mut(&(owner_id.to_string(), item_id.to_string()))
                .ok_or_else(|| ServiceError::not_found(&format!("todo {item_id}")))?;
            found.apply(update);
            Ok(())
        }

        async fn set_attachment_url(&self, owner_id: &str, item_id: &str, url: &str) -> Result<(), ServiceError> {
            let mut items = self.lock()?;
            let found = items
                .get_mut(&(owner_id.to_string(), item_id.to_string()))
                .ok_or_else(|| ServiceError::not_found(&format!("todo {item_id}")))?;
            found.attachment_url = Some(url.to_string());
            Ok(())
        }

        async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError> {
            let mut items = self.lock()?;
            items.remove(&(owner_id.to_string(), item_id.to_string()));
            Ok(())
        }
    }
}
