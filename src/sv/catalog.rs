use sea_orm::sea_query::OnConflict;

use crate::{entity::service, prelude::*};

/// Service names travel inside button payloads, which Telegram caps at
/// 64 bytes.
pub const MAX_TYPE_LEN: usize = 32;

pub struct Catalog<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Catalog<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub fn validate_type(service_type: &str) -> Result<&str> {
    let service_type = service_type.trim();
    if service_type.is_empty() {
      return Err(Error::InvalidArgs("Service name cannot be empty.".into()));
    }
    if service_type.len() > MAX_TYPE_LEN {
      return Err(Error::InvalidArgs(format!(
        "Service name is too long (max {MAX_TYPE_LEN} bytes)."
      )));
    }
    Ok(service_type)
  }

  /// Stores deliverable content for a type; the price is kept.
  pub async fn upsert_content(
    &self,
    service_type: &str,
    content: &str,
    is_file: bool,
  ) -> Result<service::Model> {
    let service_type = Self::validate_type(service_type)?;

    let model = service::ActiveModel {
      service_type: Set(service_type.to_string()),
      content: Set(content.to_string()),
      is_file: Set(is_file),
      price: Set(0),
    };

    service::Entity::insert(model)
      .on_conflict(
        OnConflict::column(service::Column::ServiceType)
          .update_columns([service::Column::Content, service::Column::IsFile])
          .to_owned(),
      )
      .exec(self.db)
      .await?;

    self.by_type(service_type).await?.ok_or(Error::ServiceNotFound)
  }

  /// Sets the price of a type, creating an empty offering if needed.
  pub async fn set_price(
    &self,
    service_type: &str,
    price: i64,
  ) -> Result<service::Model> {
    let service_type = Self::validate_type(service_type)?;
    if price < 0 {
      return Err(Error::InvalidArgs("Price cannot be negative.".into()));
    }

    let model = service::ActiveModel {
      service_type: Set(service_type.to_string()),
      content: Set(String::new()),
      is_file: Set(false),
      price: Set(price),
    };

    service::Entity::insert(model)
      .on_conflict(
        OnConflict::column(service::Column::ServiceType)
          .update_column(service::Column::Price)
          .to_owned(),
      )
      .exec(self.db)
      .await?;

    self.by_type(service_type).await?.ok_or(Error::ServiceNotFound)
  }

  pub async fn by_type(
    &self,
    service_type: &str,
  ) -> Result<Option<service::Model>> {
    Ok(service::Entity::find_by_id(service_type).one(self.db).await?)
  }

  pub async fn all(&self) -> Result<Vec<service::Model>> {
    Ok(
      service::Entity::find()
        .order_by_asc(service::Column::ServiceType)
        .all(self.db)
        .await?,
    )
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(service::Entity::find().count(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_price_round_trip() {
    let db = test_db::setup().await;
    let sv = Catalog::new(&db);

    sv.set_price("V2Ray", 50_000).await.unwrap();
    assert_eq!(sv.by_type("V2Ray").await.unwrap().unwrap().price, 50_000);

    sv.set_price("V2Ray", 65_000).await.unwrap();
    let all = sv.all().await.unwrap();

    assert_eq!(all.len(), 1);
    assert_eq!(all[0].price, 65_000);
  }

  #[tokio::test]
  async fn test_content_keeps_price() {
    let db = test_db::setup().await;
    let sv = Catalog::new(&db);

    sv.set_price("OpenVPN", 30_000).await.unwrap();
    let service =
      sv.upsert_content("OpenVPN", "BQACAgQAAxkBAAI", true).await.unwrap();

    assert_eq!(service.price, 30_000);
    assert!(service.is_file);

    let service =
      sv.upsert_content("OpenVPN", "vpn://example", false).await.unwrap();
    assert_eq!(service.content, "vpn://example");
    assert!(!service.is_file);
    assert_eq!(sv.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_price_only_offering_has_no_content() {
    let db = test_db::setup().await;
    let service = Catalog::new(&db).set_price("Proxy", 0).await.unwrap();
    assert!(!service.has_content());
  }

  #[tokio::test]
  async fn test_invalid_names_and_prices() {
    let db = test_db::setup().await;
    let sv = Catalog::new(&db);

    assert!(matches!(sv.set_price(" ", 10).await, Err(Error::InvalidArgs(_))));
    assert!(matches!(
      sv.set_price(&"x".repeat(MAX_TYPE_LEN + 1), 10).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.set_price("V2Ray", -1).await,
      Err(Error::InvalidArgs(_))
    ));
    assert_eq!(sv.count().await.unwrap(), 0);
  }
}
