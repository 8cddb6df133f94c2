use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
  async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager
      .create_table(
        Table::create()
          .table(Services::Table)
          .if_not_exists()
          .col(ColumnDef::new(Services::Type).string().not_null().primary_key())
          .col(ColumnDef::new(Services::Content).text().not_null().default(""))
          .col(
            ColumnDef::new(Services::IsFile)
              .boolean()
              .not_null()
              .default(false),
          )
          .col(
            ColumnDef::new(Services::Price).big_integer().not_null().default(0),
          )
          .to_owned(),
      )
      .await
  }

  async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
    manager.drop_table(Table::drop().table(Services::Table).to_owned()).await
  }
}

#[derive(DeriveIden)]
pub enum Services {
  Table,
  Type,
  Content,
  IsFile,
  Price,
}
