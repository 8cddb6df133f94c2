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
          .table(PurchaseRequests::Table)
          .if_not_exists()
          .col(
            ColumnDef::new(PurchaseRequests::Id)
              .integer()
              .not_null()
              .auto_increment()
              .primary_key(),
          )
          .col(
            ColumnDef::new(PurchaseRequests::UserId).big_integer().not_null(),
          )
          .col(ColumnDef::new(PurchaseRequests::Amount).big_integer().not_null())
          .col(ColumnDef::new(PurchaseRequests::Description).text().not_null())
          .col(
            ColumnDef::new(PurchaseRequests::Status)
              .string()
              .not_null()
              .default("pending"),
          )
          .col(
            ColumnDef::new(PurchaseRequests::CreatedAt).date_time().not_null(),
          )
          .col(ColumnDef::new(PurchaseRequests::ProcessedAt).date_time().null())
          .foreign_key(
            ForeignKey::create()
              .name("fk_purchase_requests_user")
              .from(PurchaseRequests::Table, PurchaseRequests::UserId)
              .to(Users::Table, Users::TgUserId)
              .on_delete(ForeignKeyAction::Cascade),
          )
          .to_owned(),
      )
      .await?;

    manager
      .create_index(
        Index::create()
          .name("idx_purchase_requests_status")
          .table(PurchaseRequests::Table)
          .col(PurchaseRequests::Status)
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .drop_table(Table::drop().table(PurchaseRequests::Table).to_owned())
      .await
  }
}

#[derive(DeriveIden)]
pub enum PurchaseRequests {
  Table,
  Id,
  UserId,
  Amount,
  Description,
  Status,
  CreatedAt,
  ProcessedAt,
}
