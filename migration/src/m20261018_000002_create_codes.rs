use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Codes::Table)
          .if_not_exists()
          .col(ColumnDef::new(Codes::Code).string().not_null().primary_key())
          .col(ColumnDef::new(Codes::Value).big_integer().not_null())
          .col(ColumnDef::new(Codes::CreatedAt).date_time().not_null())
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Codes::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Codes {
  Table,
  Code,
  Value,
  CreatedAt,
}
