use std::{collections::HashMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;
use crate::todo::domain::{sort_newest_first, TodoItem, UpdateTodoRequest};
use crate::todo::repository::TodoRepository;

type OwnerItems = HashMap<String, TodoItem>;

/// File-backed task table for local and offline runs.
/// Keeps `owner_id -> (item_id -> task)` persisted as JSON.
#[derive(Clone)]
pub struct FileTodoRepository {
    store: Arc<JsonMapStore<String, OwnerItems>>,
}

impl FileTodoRepository {
    /// Initialize from the given file path. Creates the file if missing.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let store = JsonMapStore::<String, OwnerItems>::new(path).await?;
        Ok(Self { store })
    }
}

fn missing(item_id: &str) -> ServiceError {
    ServiceError::not_found(&format!("todo {item_id}"))
}

#[async_trait]
impl TodoRepository for FileTodoRepository {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
        let mut items: Vec<TodoItem> = self
            .store
            .get(&owner_id.to_string())
            .await
            .map(|m| m.into_values().collect())
            .unwrap_or_default();
        sort_newest_first(&mut items);
        Ok(items)
    }

    async fn insert(&self, item: TodoItem) -> Result<TodoItem, ServiceError> {
        let stored = item.clone();
        self.store
            .update_map(move |map| {
                map.entry(item.owner_id.clone())
                    .or_default()
                    .insert(item.item_id.clone(), item);
                Ok(())
            })
            .await?;
        Ok(stored)
    }

    async fn update(&self, owner_id: &str, item_id: &str, update: &UpdateTodoRequest) -> Result<(), ServiceError> {
        self.store
            .update_map(|map| {
                let found = map
                    .get_mut(owner_id)
                    .and_then(|items| items.get_mut(item_id))
                    .ok_or_else(|| missing(item_id))?;
                found.apply(update);
                Ok(())
            })
            .await
    }

    async fn set_attachment_url(&self, owner_id: &str, item_id: &str, url: &str) -> Result<(), ServiceError> {
        self.store
            .update_map(|map| {
                let found = map
                    .get_mut(owner_id)
                    .and_then(|items| items.get_mut(item_id))
                    .ok_or_else(|| missing(item_id))?;
                found.attachment_url = Some(url.to_string());
                Ok(())
            })
            .await
    }

    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError> {
        self.store
            .update_map(|map| {
                if let Some(items) = map.get_mut(owner_id) {
                    items.remove(item_id);
                    if items.is_empty() {
                        map.remove(owner_id);
                    }
                }
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn task(owner: &str, name: &str, age_secs: i64) -> TodoItem {
        TodoItem {
            owner_id: owner.into(),
            item_id: Uuid::new_v4().to_string(),
            name: name.into(),
            due_date: "2024-01-01".into(),
            created_at: Utc::now() - Duration::seconds(age_secs),
            done: false,
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn file_repository_crud_persists() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("todos_{}.json", Uuid::new_v4()));
        let repo = FileTodoRepository::new(&tmp).await?;

        let old = repo.insert(task("u1", "old", 30)).await?;
        let new = repo.insert(task("u1", "new", 0)).await?;
        repo.insert(task("u2", "foreign", 0)).await?;

        let update = UpdateTodoRequest { name: "renamed".into(), due_date: "2025-05-05".into(), done: true };
        repo.update("u1", &old.item_id, &update).await?;
        repo.set_attachment_url("u1", &new.item_id, "https://b.s3.amazonaws.com/k").await?;

        // reload from disk to ensure persistence
        let reloaded = FileTodoRepository::new(&tmp).await?;
        let listed = reloaded.list_by_owner("u1").await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].item_id, new.item_id);
        assert_eq!(listed[0].attachment_url.as_deref(), Some("https://b.s3.amazonaws.com/k"));
        assert_eq!(listed[1].name, "renamed");
        assert!(listed[1].done);
        assert_eq!(listed[1].created_at, old.created_at);

        reloaded.delete("u1", &old.item_id).await?;
        reloaded.delete("u1", &old.item_id).await?;
        assert_eq!(reloaded.list_by_owner("u1").await?.len(), 1);
        assert_eq!(reloaded.list_by_owner("u2").await?.len(), 1);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn update_of_foreign_or_missing_task_is_not_found() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("todos_{}.json", Uuid::new_v4()));
        let repo = FileTodoRepository::new(&tmp).await?;
        let theirs = repo.insert(task("u2", "theirs", 0)).await?;

        let update = UpdateTodoRequest { name: "x".into(), due_date: "y".into(), done: true };
        let err = repo.update("u1", &theirs.item_id, &update).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        let err = repo.set_attachment_url("u1", "nope", "u").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(repo.list_by_owner("u2").await?[0].name, "theirs");

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }

    #[tokio::test]
    async fn insert_that_fails_to_persist_is_not_listed() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("todos_{}.json", Uuid::new_v4()));
        let repo = FileTodoRepository::new(&tmp).await?;
        let kept = repo.insert(task("u1", "kept", 10)).await?;

        // A directory in place of the store file makes every write fail.
        tokio::fs::remove_file(&tmp).await?;
        tokio::fs::create_dir(&tmp).await?;
        assert!(repo.insert(task("u1", "lost", 0)).await.is_err());
        let update = UpdateTodoRequest { name: "changed".into(), due_date: "2030-01-01".into(), done: true };
        assert!(repo.update("u1", &kept.item_id, &update).await.is_err());

        let listed = repo.list_by_owner("u1").await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "kept");
        assert!(!listed[0].done);

        let _ = tokio::fs::remove_dir(&tmp).await;
        Ok(())
    }
}
