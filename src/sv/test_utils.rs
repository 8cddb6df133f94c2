//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    Schema, Set,
  };

  use crate::entity::*;

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let schema = Schema::new(DbBackend::Sqlite);

    let stmt = schema.create_table_from_entity(user::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(code::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(service::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(support_message::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    let stmt = schema.create_table_from_entity(purchase_request::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await.unwrap();

    db
  }

  /// Inserts a fully registered user
  pub async fn user(
    db: &DatabaseConnection,
    tg_user_id: i64,
    credit: i64,
    is_approved: bool,
  ) -> user::Model {
    user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      username: Set(Some(format!("user{tg_user_id}"))),
      full_name: Set(Some("Test User".into())),
      phone_number: Set(Some("09120000000".into())),
      device_type: Set(Some(DeviceType::Android)),
      credit: Set(credit),
      discount_used: Set(false),
      is_approved: Set(is_approved),
      reg_date: Set(chrono::Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }
}
