use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{CreateTodoRequest, TodoItem, UpdateTodoRequest};
use super::repository::TodoRepository;
use crate::attachments::AttachmentStore;
use crate::errors::ServiceError;

/// Todo business service independent of web framework
pub struct TodoService<R: TodoRepository + ?Sized = dyn TodoRepository> {
    repo: Arc<R>,
    attachments: Arc<dyn AttachmentStore>,
}

impl<R: TodoRepository + ?Sized> Clone for TodoService<R> {
    fn clone(&self) -> Self {
        Self { repo: self.repo.clone(), attachments: self.attachments.clone() }
    }
}

impl<R: TodoRepository + ?Sized> TodoService<R> {
    pub fn new(repo: Arc<R>, attachments: Arc<dyn AttachmentStore>) -> Self { Self { repo, attachments } }

    /// All tasks of the caller, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
        let items = self.repo.list_by_owner(owner_id).await?;
        info!(owner_id, count = items.len(), "todos_listed");
        Ok(items)
    }

    /// Create a task for `owner_id`. New tasks always start as not done.
    ///
    /// # Examples
    /// ```
    /// use service::todo::{TodoService, repository::mock::MemoryTodoRepository, domain::CreateTodoRequest};
    /// use service::attachments::mock::StaticAttachmentStore;
    /// use std::sync::Arc;
    /// let svc = TodoService::new(Arc::new(MemoryTodoRepository::default()), Arc::new(StaticAttachmentStore::default()));
    /// let req = CreateTodoRequest { name: "Buy milk".into(), due_date: "2024-06-01".into() };
    /// let item = tokio_test::block_on(svc.create("user-1", req)).unwrap();
    /// assert_eq!(item.owner_id, "user-1");
    /// assert!(!item.done);
    /// ```
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, owner_id: &str, input: CreateTodoRequest) -> Result<TodoItem, ServiceError> {
        let item = TodoItem {
            owner_id: owner_id.to_string(),
            item_id: Uuid::new_v4().to_string(),
            name: input.name,
            due_date: input.due_date,
            created_at: Utc::now(),
            done: false,
            attachment_url: None,
        };
        let item = self.repo.insert(item).await?;
        info!(owner_id, item_id = %item.item_id, "todo_created");
        Ok(item)
    }

    #[instrument(skip(self, input), fields(done = input.done))]
    pub async fn update(&self, owner_id: &str, item_id: &str, input: UpdateTodoRequest) -> Result<(), ServiceError> {
        self.repo.update(owner_id, item_id, &input).await?;
        info!(owner_id, item_id, "todo_updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError> {
        self.repo.delete(owner_id, item_id).await?;
        info!(owner_id, item_id, "todo_deleted");
        Ok(())
    }

    /// Sign an upload URL keyed by the item id, then record the public URL on the task.
    ///
    /// The record is updated only after signing succeeded and only if the task
    /// exists; whether the client ever uploads is not checked.
    ///
    /// # Examples
    /// ```
    /// use service::todo::{TodoService, repository::mock::MemoryTodoRepository, domain::CreateTodoRequest};
    /// use service::attachments::mock::StaticAttachmentStore;
    /// use std::sync::Arc;
    /// let svc = TodoService::new(Arc::new(MemoryTodoRepository::default()), Arc::new(StaticAttachmentStore::default()));
    /// let item = tokio_test::block_on(svc.create("u", CreateTodoRequest { name: "n".into(), due_date: "d".into() })).unwrap();
    /// let url = tokio_test::block_on(svc.generate_upload_url("u", &item.item_id)).unwrap();
    /// assert!(url.contains(&item.item_id));
    /// ```
    #[instrument(skip(self))]
    pub async fn generate_upload_url(&self, owner_id: &str, item_id: &str) -> Result<String, ServiceError> {
        let upload_url = self.attachments.upload_url(item_id).await?;
        let public_url = self.attachments.public_url(item_id);
        self.repo.set_attachment_url(owner_id, item_id, &public_url).await?;
        info!(owner_id, item_id, attachment_url = %public_url, "upload_url_issued");
        Ok(upload_url)
    }
}
