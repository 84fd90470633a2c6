//! Create `todos` table.
//! One row per task; the (user_id, todo_id) pair is the primary key.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todos::Table)
                    .if_not_exists()
                    .col(string_len(Todos::UserId, 256).not_null())
                    .col(string_len(Todos::TodoId, 64).not_null())
                    .col(text(Todos::Name).not_null())
                    .col(string_len(Todos::DueDate, 64).not_null())
                    .col(timestamp_with_time_zone(Todos::CreatedAt).not_null())
                    .col(boolean(Todos::Done).not_null().default(false))
                    .col(text_null(Todos::AttachmentUrl))
                    .primary_key(
                        Index::create()
                            .name("pk_todos")
                            .col(Todos::UserId)
                            .col(Todos::TodoId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Todos::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
pub enum Todos {
    Table,
    UserId,
    TodoId,
    Name,
    DueDate,
    CreatedAt,
    Done,
    AttachmentUrl,
}
