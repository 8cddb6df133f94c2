use crate::{entity::user, prelude::*};

pub struct Balance<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
  pub sender_balance: i64,
  pub recipient_balance: i64,
}

impl<'a> Balance<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn get(&self, user_id: i64) -> Result<i64> {
    let user = user::Entity::find_by_id(user_id)
      .one(self.db)
      .await?
      .ok_or(Error::UserNotFound)?;
    Ok(user.credit)
  }

  /// Admin top-up of an existing user.
  pub async fn charge(&self, user_id: i64, amount: i64) -> Result<i64> {
    if amount <= 0 {
      return Err(Error::InvalidArgs("Amount must be positive.".into()));
    }

    let txn = self.db.begin().await?;

    let user = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let new_balance = utils::add_credit(user.credit, amount)?;

    user::ActiveModel { credit: Set(new_balance), ..user.into() }
      .update(&txn)
      .await?;

    txn.commit().await?;
    Ok(new_balance)
  }

  /// Admin deduction. No floor: the balance may go negative.
  pub async fn deduct(&self, user_id: i64, amount: i64) -> Result<i64> {
    if amount <= 0 {
      return Err(Error::InvalidArgs("Amount must be positive.".into()));
    }

    let txn = self.db.begin().await?;

    let user = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let new_balance = utils::sub_credit(user.credit, amount)?;

    user::ActiveModel { credit: Set(new_balance), ..user.into() }
      .update(&txn)
      .await?;

    txn.commit().await?;
    Ok(new_balance)
  }

  /// Checks a transfer recipient before asking for the amount.
  pub async fn validate_recipient(
    &self,
    sender_id: i64,
    recipient_id: i64,
  ) -> Result<()> {
    if sender_id == recipient_id {
      return Err(Error::SelfTransfer);
    }

    user::Entity::find_by_id(recipient_id)
      .one(self.db)
      .await?
      .ok_or(Error::InvalidRecipient)?;

    Ok(())
  }

  /// Moves credit between two users. Both rows change or neither does.
  pub async fn transfer(
    &self,
    sender_id: i64,
    recipient_id: i64,
    amount: i64,
  ) -> Result<Transfer> {
    if amount <= 0 {
      return Err(Error::InvalidArgs("Amount must be positive.".into()));
    }
    if sender_id == recipient_id {
      return Err(Error::SelfTransfer);
    }

    let txn = self.db.begin().await?;

    let sender = user::Entity::find_by_id(sender_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    let recipient = user::Entity::find_by_id(recipient_id)
      .one(&txn)
      .await?
      .ok_or(Error::InvalidRecipient)?;

    if sender.credit < amount {
      return Err(Error::InsufficientBalance);
    }

    let sender_balance = utils::sub_credit(sender.credit, amount)?;
    let recipient_balance = utils::add_credit(recipient.credit, amount)?;

    user::ActiveModel { credit: Set(sender_balance), ..sender.into() }
      .update(&txn)
      .await?;

    user::ActiveModel { credit: Set(recipient_balance), ..recipient.into() }
      .update(&txn)
      .await?;

    txn.commit().await?;
    Ok(Transfer { sender_balance, recipient_balance })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  const ALICE: i64 = 111;
  const BOB: i64 = 222;

  async fn total(db: &DatabaseConnection) -> i64 {
    user::Entity::find().all(db).await.unwrap().iter().map(|u| u.credit).sum()
  }

  #[tokio::test]
  async fn test_transfer() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 10_000, true).await;
    test_db::user(&db, BOB, 500, true).await;

    let result = Balance::new(&db).transfer(ALICE, BOB, 3000).await.unwrap();

    assert_eq!(
      result,
      Transfer { sender_balance: 7000, recipient_balance: 3500 }
    );
  }

  #[tokio::test]
  async fn test_transfer_to_unknown_recipient() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 7000, true).await;
    test_db::user(&db, BOB, 3500, true).await;
    let sv = Balance::new(&db);

    let result = sv.transfer(ALICE, 999_999_999, 3000).await;

    assert!(matches!(result, Err(Error::InvalidRecipient)));
    assert_eq!(sv.get(ALICE).await.unwrap(), 7000);
    assert_eq!(sv.get(BOB).await.unwrap(), 3500);
  }

  #[tokio::test]
  async fn test_transfer_rejections_leave_balances() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 1000, true).await;
    test_db::user(&db, BOB, 0, true).await;
    let sv = Balance::new(&db);

    assert!(matches!(
      sv.transfer(ALICE, BOB, 0).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.transfer(ALICE, BOB, -50).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.transfer(ALICE, BOB, 1001).await,
      Err(Error::InsufficientBalance)
    ));
    assert!(matches!(
      sv.transfer(ALICE, ALICE, 10).await,
      Err(Error::SelfTransfer)
    ));

    assert_eq!(sv.get(ALICE).await.unwrap(), 1000);
    assert_eq!(sv.get(BOB).await.unwrap(), 0);
  }

  #[tokio::test]
  async fn test_transfers_are_zero_sum() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, 5000, true).await;
    test_db::user(&db, 2, 1200, true).await;
    test_db::user(&db, 3, 0, true).await;
    let sv = Balance::new(&db);

    let before = total(&db).await;

    let moves = [(1, 2, 700), (2, 3, 1900), (3, 1, 50), (1, 3, 99_999)];
    for (from, to, amount) in moves {
      let _ = sv.transfer(from, to, amount).await;
    }

    assert_eq!(total(&db).await, before);
  }

  #[tokio::test]
  async fn test_validate_recipient() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 0, true).await;
    test_db::user(&db, BOB, 0, true).await;
    let sv = Balance::new(&db);

    assert!(sv.validate_recipient(ALICE, BOB).await.is_ok());
    assert!(matches!(
      sv.validate_recipient(ALICE, 404).await,
      Err(Error::InvalidRecipient)
    ));
    assert!(matches!(
      sv.validate_recipient(ALICE, ALICE).await,
      Err(Error::SelfTransfer)
    ));
  }

  #[tokio::test]
  async fn test_charge_and_deduct() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 100, true).await;
    let sv = Balance::new(&db);

    assert_eq!(sv.charge(ALICE, 900).await.unwrap(), 1000);
    // deduct has no floor
    assert_eq!(sv.deduct(ALICE, 1500).await.unwrap(), -500);

    assert!(matches!(sv.charge(404, 10).await, Err(Error::UserNotFound)));
    assert!(matches!(sv.deduct(ALICE, 0).await, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_huge_amounts_leave_balances() {
    let db = test_db::setup().await;
    test_db::user(&db, ALICE, 1, true).await;
    test_db::user(&db, BOB, i64::MAX, true).await;
    let sv = Balance::new(&db);

    assert!(matches!(
      sv.charge(ALICE, i64::MAX).await,
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      sv.deduct(ALICE, i64::MAX).await,
      Ok(balance) if balance == 1 - i64::MAX
    ));
    assert!(matches!(
      sv.deduct(ALICE, i64::MAX).await,
      Err(Error::InvalidArgs(_))
    ));

    sv.charge(ALICE, i64::MAX).await.unwrap();
    assert!(matches!(
      sv.transfer(ALICE, BOB, 1).await,
      Err(Error::InvalidArgs(_))
    ));

    assert_eq!(sv.get(ALICE).await.unwrap(), 1);
    assert_eq!(sv.get(BOB).await.unwrap(), i64::MAX);
  }
}
