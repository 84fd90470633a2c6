//! Secondary index serving list-by-owner, newest first.
use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_todos::Todos;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_todos_user_created")
                    .table(Todos::Table)
                    .col(Todos::UserId)
                    .col((Todos::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_todos_user_created").table(Todos::Table).to_owned())
            .await
    }
}
