use async_trait::async_trait;
use sea_orm::DatabaseConnection;

use crate::errors::ServiceError;
use crate::todo::domain::{TodoItem, UpdateTodoRequest};
use crate::todo::repository::TodoRepository;

/// SeaORM-backed repository over the `todos` table.
pub struct SeaOrmTodoRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmTodoRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

fn to_domain(m: models::todo::Model) -> TodoItem {
    TodoItem {
        owner_id: m.user_id,
        item_id: m.todo_id,
        name: m.name,
        due_date: m.due_date,
        created_at: m.created_at.into(),
        done: m.done,
        attachment_url: m.attachment_url,
    }
}

fn to_row(t: TodoItem) -> models::todo::Model {
    models::todo::Model {
        user_id: t.owner_id,
        todo_id: t.item_id,
        name: t.name,
        due_date: t.due_date,
        created_at: t.created_at.into(),
        done: t.done,
        attachment_url: t.attachment_url,
    }
}

#[async_trait]
impl TodoRepository for SeaOrmTodoRepository {
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<TodoItem>, ServiceError> {
        let rows = models::todo::list_by_user(&self.db, owner_id).await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    async fn insert(&self, item: TodoItem) -> Result<TodoItem, ServiceError> {
        let row = models::todo::insert(&self.db, to_row(item)).await?;
        Ok(to_domain(row))
    }

    async fn update(&self, owner_id: &str, item_id: &str, update: &UpdateTodoRequest) -> Result<(), ServiceError> {
        models::todo::update_fields(&self.db, owner_id, item_id, &update.name, &update.due_date, update.done).await?;
        Ok(())
    }

    async fn set_attachment_url(&self, owner_id: &str, item_id: &str, url: &str) -> Result<(), ServiceError> {
        models::todo::set_attachment_url(&self.db, owner_id, item_id, url).await?;
        Ok(())
    }

    async fn delete(&self, owner_id: &str, item_id: &str) -> Result<(), ServiceError> {
        models::todo::delete(&self.db, owner_id, item_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::live_db;
    use chrono::{Duration, SubsecRound, Utc};
    use uuid::Uuid;

    fn task(owner: &str, name: &str, age_secs: i64) -> TodoItem {
        TodoItem {
            owner_id: owner.into(),
            item_id: Uuid::new_v4().to_string(),
            name: name.into(),
            due_date: "2024-01-01".into(),
            // Postgres keeps microseconds
            created_at: (Utc::now() - Duration::seconds(age_secs)).trunc_subsecs(6),
            done: false,
            attachment_url: None,
        }
    }

    #[tokio::test]
    async fn seaorm_repository_crud() -> Result<(), anyhow::Error> {
        let Some(db) = live_db().await else { return Ok(()) };
        let repo = SeaOrmTodoRepository::new(db);
        let owner = format!("user-{}", Uuid::new_v4());

        let old = repo.insert(task(&owner, "old", 60)).await?;
        let new = repo.insert(task(&owner, "new", 0)).await?;
        assert_eq!(old.created_at, old.created_at.trunc_subsecs(6));

        repo.update(&owner, &old.item_id, &UpdateTodoRequest { name: "done".into(), due_date: "2024-02-02".into(), done: true }).await?;
        repo.set_attachment_url(&owner, &new.item_id, "https://bucket.s3.amazonaws.com/x").await?;

        let listed = repo.list_by_owner(&owner).await?;
        assert_eq!(listed.iter().map(|t| t.item_id.clone()).collect::<Vec<_>>(), vec![new.item_id.clone(), old.item_id.clone()]);
        assert!(listed[1].done);
        assert_eq!(listed[0].attachment_url.as_deref(), Some("https://bucket.s3.amazonaws.com/x"));

        let err = repo.update("someone-else", &old.item_id, &UpdateTodoRequest { name: "x".into(), due_date: "y".into(), done: false }).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        repo.delete(&owner, &old.item_id).await?;
        repo.delete(&owner, &old.item_id).await?;
        repo.delete(&owner, &new.item_id).await?;
        assert!(repo.list_by_owner(&owner).await?.is_empty());
        Ok(())
    }
}
