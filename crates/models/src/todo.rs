use sea_orm::{entity::prelude::*, sea_query::Expr, DatabaseConnection, QueryOrder, Set};

use crate::errors::ModelError;

/// One row per task, keyed by (`user_id`, `todo_id`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "todos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub todo_id: String,
    pub name: String,
    pub due_date: String,
    pub created_at: DateTimeWithTimeZone,
    pub done: bool,
    pub attachment_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// All rows of one user, newest first.
pub async fn list_by_user(db: &DatabaseConnection, user_id: &str) -> Result<Vec<Model>, ModelError> {
    let rows = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::TodoId)
        .all(db)
        .await?;
    Ok(rows)
}

/// Both key parts must be non-blank.
pub fn validate_key(user_id: &str, todo_id: &str) -> Result<(), ModelError> {
    if user_id.trim().is_empty() {
        return Err(ModelError::Validation("user_id must not be empty".into()));
    }
    if todo_id.trim().is_empty() {
        return Err(ModelError::Validation("todo_id must not be empty".into()));
    }
    Ok(())
}

pub async fn insert(db: &DatabaseConnection, row: Model) -> Result<Model, ModelError> {
    validate_key(&row.user_id, &row.todo_id)?;
    let am = ActiveModel {
        user_id: Set(row.user_id),
        todo_id: Set(row.todo_id),
        name: Set(row.name),
        due_date: Set(row.due_date),
        created_at: Set(row.created_at),
        done: Set(row.done),
        attachment_url: Set(row.attachment_url),
    };
    Ok(am.insert(db).await?)
}

/// Single-statement update of the mutable fields; `NotFound` when no row matched.
pub async fn update_fields(
    db: &DatabaseConnection,
    user_id: &str,
    todo_id: &str,
    name: &str,
    due_date: &str,
    done: bool,
) -> Result<(), ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::Name, Expr::value(name.to_string()))
        .col_expr(Column::DueDate, Expr::value(due_date.to_string()))
        .col_expr(Column::Done, Expr::value(done))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TodoId.eq(todo_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ModelError::NotFound(format!("todo {todo_id}")));
    }
    Ok(())
}

pub async fn set_attachment_url(
    db: &DatabaseConnection,
    user_id: &str,
    todo_id: &str,
    url: &str,
) -> Result<(), ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::AttachmentUrl, Expr::value(url.to_string()))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TodoId.eq(todo_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ModelError::NotFound(format!("todo {todo_id}")));
    }
    Ok(())
}

/// Returns whether a row was removed.
pub async fn delete(db: &DatabaseConnection, user_id: &str, todo_id: &str) -> Result<bool, ModelError> {
    let res = Entity::delete_by_id((user_id.to_string(), todo_id.to_string()))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}
