use crate::{entity::support_message, prelude::*};

pub struct Support<'a> {
  db: &'a DatabaseConnection,
}

impl<'a> Support<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn record(
    &self,
    user_id: i64,
    text: &str,
  ) -> Result<support_message::Model> {
    let text = text.trim();
    if text.is_empty() {
      return Err(Error::InvalidArgs("Message cannot be empty.".into()));
    }

    let message = support_message::ActiveModel {
      id: NotSet,
      user_id: Set(user_id),
      text: Set(text.to_string()),
      created_at: Set(Utc::now().naive_utc()),
    };

    Ok(message.insert(self.db).await?)
  }

  pub async fn by_user(
    &self,
    user_id: i64,
    limit: u64,
  ) -> Result<Vec<support_message::Model>> {
    Ok(
      support_message::Entity::find()
        .filter(support_message::Column::UserId.eq(user_id))
        .order_by_desc(support_message::Column::Id)
        .limit(limit)
        .all(self.db)
        .await?,
    )
  }

  pub async fn count(&self) -> Result<u64> {
    Ok(support_message::Entity::find().count(self.db).await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_log_is_append_only() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, 0, true).await;
    let sv = Support::new(&db);

    sv.record(1, "my link stopped working").await.unwrap();
    sv.record(1, " still broken ").await.unwrap();

    let messages = sv.by_user(1, 10).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "still broken");
    assert_eq!(sv.count().await.unwrap(), 2);
  }

  #[tokio::test]
  async fn test_empty_message() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, 0, true).await;

    assert!(matches!(
      Support::new(&db).record(1, "  ").await,
      Err(Error::InvalidArgs(_))
    ));
  }
}
