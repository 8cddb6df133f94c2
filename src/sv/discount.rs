use sea_orm::sea_query::OnConflict;

use crate::{
  entity::{code, user},
  prelude::*,
};

pub struct Discount<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redeemed {
  pub value: i64,
  pub balance: i64,
}

impl<'a> Discount<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Adds a code or overwrites the value of an existing one.
  pub async fn upsert(&self, code: &str, value: i64) -> Result<code::Model> {
    let code = code.trim();
    if code.is_empty() {
      return Err(Error::InvalidArgs("Code cannot be empty.".into()));
    }
    if value <= 0 {
      return Err(Error::InvalidArgs("Code value must be positive.".into()));
    }

    let model = code::ActiveModel {
      code: Set(code.to_string()),
      value: Set(value),
      created_at: Set(Utc::now().naive_utc()),
    };

    code::Entity::insert(model)
      .on_conflict(
        OnConflict::column(code::Column::Code)
          .update_column(code::Column::Value)
          .to_owned(),
      )
      .exec(self.db)
      .await?;

    code::Entity::find_by_id(code)
      .one(self.db)
      .await?
      .ok_or(Error::CodeNotFound)
  }

  pub async fn remove(&self, code: &str) -> Result<()> {
    let result = code::Entity::delete_by_id(code.trim()).exec(self.db).await?;
    if result.rows_affected == 0 {
      return Err(Error::CodeNotFound);
    }
    Ok(())
  }

  pub async fn all(&self) -> Result<Vec<code::Model>> {
    Ok(
      code::Entity::find()
        .order_by_desc(code::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// One redemption per user, and every code works only once overall:
  /// the balance update, the user flag and the code deletion commit
  /// together.
  pub async fn redeem(&self, user_id: i64, code: &str) -> Result<Redeemed> {
    let txn = self.db.begin().await?;

    let user = user::Entity::find_by_id(user_id)
      .one(&txn)
      .await?
      .ok_or(Error::UserNotFound)?;

    if user.discount_used {
      return Err(Error::DiscountAlreadyUsed);
    }

    let code = code::Entity::find_by_id(code.trim())
      .one(&txn)
      .await?
      .ok_or(Error::CodeNotFound)?;

    let balance = utils::add_credit(user.credit, code.value)?;

    user::ActiveModel {
      credit: Set(balance),
      discount_used: Set(true),
      ..user.into()
    }
    .update(&txn)
    .await?;

    let value = code.value;
    code::Entity::delete_by_id(code.code).exec(&txn).await?;

    txn.commit().await?;
    Ok(Redeemed { value, balance })
  }
}
