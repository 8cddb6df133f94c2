use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(SupportMessages::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(SupportMessages::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(ColumnDef::new(SupportMessages::UserId).big_integer().not_null())
          .col(ColumnDef::new(SupportMessages::Text).text().not_null())
          .col(ColumnDef::new(SupportMessages::CreatedAt).date_time().not_null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_support_messages_user")
              .from(SupportMessages::Table, SupportMessages::UserId)
              .to(Users::Table, Users::TgUserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_support_messages_user")
          .table(SupportMessages::Table)
          .col(SupportMessages::UserId)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(SupportMessages::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum SupportMessages {
  Table,
  Id,
  UserId,
  Text,
  CreatedAt,
}
