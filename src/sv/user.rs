use crate::{
  entity::{DeviceType, user},
  prelude::*,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Creates the user on first contact, refreshing the username otherwise.
  pub async fn get_or_create(
    &self,
    tg_user_id: i64,
    username: Option<String>,
  ) -> Result<user::Model> {
    if let Some(user) =
      user::Entity::find_by_id(tg_user_id).one(self.db).await?
    {
      if username.is_some() && user.username != username {
        let user = user::ActiveModel { username: Set(username), ..user.into() }
          .update(self.db)
          .await?;
        return Ok(user);
      }
      return Ok(user);
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      tg_user_id: Set(tg_user_id),
      username: Set(username),
      full_name: Set(None),
      phone_number: Set(None),
      device_type: Set(None),
      credit: Set(0),
      discount_used: Set(false),
      is_approved: Set(false),
      reg_date: Set(now),
    };

    Ok(user.insert(self.db).await?)
  }

  pub async fn by_id(&self, tg_user_id: i64) -> Result<Option<user::Model>> {
    let user = user::Entity::find_by_id(tg_user_id).one(self.db).await?;
    Ok(user)
  }

  pub async fn require(&self, tg_user_id: i64) -> Result<user::Model> {
    self.by_id(tg_user_id).await?.ok_or(Error::UserNotFound)
  }

  pub async fn set_phone(&self, tg_user_id: i64, phone: &str) -> Result<()> {
    let user = self.require(tg_user_id).await?;

    user::ActiveModel {
      phone_number: Set(Some(phone.trim().to_string())),
      ..user.into()
    }
    .update(self.db)
    .await?;

    Ok(())
  }

  pub async fn set_name(&self, tg_user_id: i64, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::InvalidArgs("Name cannot be empty.".into()));
    }

    let user = self.require(tg_user_id).await?;

    user::ActiveModel { full_name: Set(Some(name.to_string())), ..user.into() }
      .update(self.db)
      .await?;

    Ok(())
  }

  /// Final registration step. The user waits for admin approval unless
  /// `approve` is set.
  pub async fn complete_registration(
    &self,
    tg_user_id: i64,
    device: DeviceType,
    approve: bool,
  ) -> Result<user::Model> {
    let user = self.require(tg_user_id).await?;

    let user = user::ActiveModel {
      device_type: Set(Some(device)),
      is_approved: Set(approve),
      ..user.into()
    }
    .update(self.db)
    .await?;

    Ok(user)
  }

  pub async fn set_approved(
    &self,
    tg_user_id: i64,
    approved: bool,
  ) -> Result<user::Model> {
    let user = self.require(tg_user_id).await?;

    let user = user::ActiveModel { is_approved: Set(approved), ..user.into() }
      .update(self.db)
      .await?;

    Ok(user)
  }

  /// Registered users still waiting for approval.
  pub async fn pending(&self) -> Result<Vec<user::Model>> {
    let users = user::Entity::find()
      .filter(user::Column::IsApproved.eq(false))
      .filter(user::Column::DeviceType.is_not_null())
      .order_by_asc(user::Column::RegDate)
      .all(self.db)
      .await?;
    Ok(users)
  }

  pub async fn all_ids(&self) -> Result<Vec<i64>> {
    let ids = user::Entity::find()
      .select_only()
      .column(user::Column::TgUserId)
      .order_by_asc(user::Column::RegDate)
      .into_tuple()
      .all(self.db)
      .await?;
    Ok(ids)
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(user::Entity::find().count(self.db).await?)
  }

  pub async fn count_approved(&self) -> Result<u64> {
    Ok(
      user::Entity::find()
        .filter(user::Column::IsApproved.eq(true))
        .count(self.db)
        .await?,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_registration_ends_pending() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    let user = sv.get_or_create(100, Some("jane".into())).await.unwrap();
    assert!(!user.is_registered());

    sv.set_phone(100, "+15551234567").await.unwrap();
    sv.set_name(100, "  Jane Doe ").await.unwrap();
    let user =
      sv.complete_registration(100, DeviceType::Android, false).await.unwrap();

    assert!(user.is_registered());
    assert!(!user.is_approved);
    assert_eq!(user.full_name.as_deref(), Some("Jane Doe"));
    assert_eq!(user.phone_number.as_deref(), Some("+15551234567"));
    assert_eq!(user.device_type, Some(DeviceType::Android));

    let pending = sv.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].tg_user_id, 100);
  }

  #[tokio::test]
  async fn test_get_or_create_is_idempotent() {
    let db = test_db::setup().await;
    let sv = User::new(&db);

    sv.get_or_create(100, None).await.unwrap();
    let user = sv.get_or_create(100, Some("renamed".into())).await.unwrap();

    assert_eq!(user.username.as_deref(), Some("renamed"));
    assert_eq!(sv.count().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_empty_name_rejected() {
    let db = test_db::setup().await;
    let sv = User::new(&db);
    sv.get_or_create(100, None).await.unwrap();

    assert!(matches!(
      sv.set_name(100, "   ").await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn test_set_approved() {
    let db = test_db::setup().await;
    let sv = User::new(&db);
    test_db::user(&db, 100, 0, false).await;

    assert!(!sv.require(100).await.unwrap().is_approved);
    assert!(matches!(sv.require(7).await, Err(Error::UserNotFound)));

    sv.set_approved(100, true).await.unwrap();
    assert!(sv.require(100).await.unwrap().is_approved);
    assert_eq!(sv.count_approved().await.unwrap(), 1);
    assert!(sv.pending().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_all_ids() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, 0, true).await;
    test_db::user(&db, 2, 0, false).await;

    let mut ids = User::new(&db).all_ids().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec![1, 2]);
  }
}
