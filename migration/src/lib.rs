pub use sea_orm_migration::prelude::*;

mod m20261018_000001_create_users;
mod m20261018_000002_create_codes;
mod m20261018_000003_create_services;
mod m20261018_000004_create_support_messages;
mod m20261018_000005_create_purchase_requests;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
  fn migrations() -> Vec<Box<dyn MigrationTrait>> {
    vec![
      Box::new(m20261018_000001_create_users::Migration),
      Box::new(m20261018_000002_create_codes::Migration),
      Box::new(m20261018_000003_create_services::Migration),
      Box::new(m20261018_000004_create_support_messages::Migration),
      Box::new(m20261018_000005_create_purchase_requests::Migration),
    ]
  }
}
