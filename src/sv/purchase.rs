use crate::{
  entity::{PurchaseStatus, purchase_request, user},
  prelude::*,
};

pub struct Purchase<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug)]
pub struct Approved {
  pub request: purchase_request::Model,
  pub balance: i64,
}

impl<'a> Purchase<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(
    &self,
    user_id: i64,
    amount: i64,
    description: &str,
  ) -> Result<purchase_request::Model> {
    if amount <= 0 {
      return Err(Error::InvalidArgs("Amount must be positive.".into()));
    }

    let request = purchase_request::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      amount: Set(amount),
      description: Set(description.trim().to_string()),
      status: Set(PurchaseStatus::Pending),
      created_at: Set(Utc::now().naive_utc()),
      processed_at: Set(None),
    };

    Ok(request.insert(self.db).await?)
  }

  pub async fn pending(&self) -> Result<Vec<purchase_request::Model>> {
    Ok(
      purchase_request::Entity::find()
        .filter(purchase_request::Column::Status.eq(PurchaseStatus::Pending))
        .order_by_asc(purchase_request::Column::Id)
        .all(self.db)
        .await?,
    )
  }

  pub async fn count_pending(&self) -> Result<u64> {
    Ok(
      purchase_request::Entity::find()
        .filter(purchase_request::Column::Status.eq(PurchaseStatus::Pending))
        .count(self.db)
        .await?,
    )
  }

  /// Credits the requested amount exactly once.
  pub async fn approve(&self, id: i32) -> Result<Approved> {
    let txn = self.db.begin().await?;

    let request = purchase_request::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::RequestNotFound)?;

    if request.status != PurchaseStatus::Pending {
      return Err(Error::AlreadyProcessed);
    }

    let user = user::Entity::find_by_id(request.user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let balance = utils::add_credit(user.credit, request.amount)?;

    user::ActiveModel { credit: Set(balance), ..user.into() }
      .update(&txn)
      .await?;

    let request = purchase_request::ActiveModel {
      status: Set(PurchaseStatus::Approved),
      processed_at: Set(Some(Utc::now().naive_utc())),
      ..request.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(Approved { request, balance })
  }

  pub async fn reject(&self, id: i32) -> Result<purchase_request::Model> {
    let txn = self.db.begin().await?;

    let request = purchase_request::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::RequestNotFound)?;

    if request.status != PurchaseStatus::Pending {
      return Err(Error::AlreadyProcessed);
    }

    let request = purchase_request::ActiveModel {
      status: Set(PurchaseStatus::Rejected),
      processed_at: Set(Some(Utc::now().naive_utc())),
      ..request.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(request)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::{Balance, test_utils::test_db};

  #[tokio::test]
  async fn test_approve_credits_once() {
    let db = test_db::setup().await;
    test_db::user(&db, 7, 1000, true).await;
    let sv = Purchase::new(&db);

    let request = sv.create(7, 20_000, "card to card").await.unwrap();
    assert_eq!(request.status, PurchaseStatus::Pending);

    let approved = sv.approve(request.id).await.unwrap();
    assert_eq!(approved.balance, 21_000);
    assert_eq!(approved.request.status, PurchaseStatus::Approved);
    assert!(approved.request.processed_at.is_some());

    for _ in 0..3 {
      assert!(matches!(
        sv.approve(request.id).await,
        Err(Error::AlreadyProcessed)
      ));
    }
    assert_eq!(Balance::new(&db).get(7).await.unwrap(), 21_000);
    assert!(sv.pending().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_approve_refuses_overflow() {
    let db = test_db::setup().await;
    test_db::user(&db, 7, 1000, true).await;
    let sv = Purchase::new(&db);

    let amount = utils::parse_amount("9223372036854775807").unwrap();
    let request = sv.create(7, amount, "").await.unwrap();

    assert!(matches!(
      sv.approve(request.id).await,
      Err(Error::InvalidArgs(_))
    ));
    assert_eq!(Balance::new(&db).get(7).await.unwrap(), 1000);
    assert_eq!(sv.count_pending().await.unwrap(), 1);
  }

  #[tokio::test]
  async fn test_rejected_request_is_terminal() {
    let db = test_db::setup().await;
    test_db::user(&db, 7, 0, true).await;
    let sv = Purchase::new(&db);

    let request = sv.create(7, 5000, "").await.unwrap();
    let rejected = sv.reject(request.id).await.unwrap();
    assert_eq!(rejected.status, PurchaseStatus::Rejected);

    assert!(matches!(
      sv.approve(request.id).await,
      Err(Error::AlreadyProcessed)
    ));
    assert!(matches!(
      sv.reject(request.id).await,
      Err(Error::AlreadyProcessed)
    ));
    assert_eq!(Balance::new(&db).get(7).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_unknown_request() {
    let db = test_db::setup().await;
    let sv = Purchase::new(&db);

    assert!(matches!(sv.approve(42).await, Err(Error::RequestNotFound)));
    assert!(matches!(sv.reject(42).await, Err(Error::RequestNotFound)));
  }

  #[tokio::test]
  async fn test_pending_listing() {
    let db = test_db::setup().await;
    test_db::user(&db, 7, 0, true).await;
    let sv = Purchase::new(&db);

    let first = sv.create(7, 100, "a").await.unwrap();
    sv.create(7, 200, "b").await.unwrap();
    sv.approve(first.id).await.unwrap();

    let pending = sv.pending().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].amount, 200);
    assert_eq!(sv.count_pending().await.unwrap(), 1);
    assert!(matches!(sv.create(7, 0, "x").await, Err(Error::InvalidArgs(_))));
  }
}
