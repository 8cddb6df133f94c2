use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false, column_name = "type")]
  pub service_type: String,
  /// Text or link, or a telegram file id when `is_file` is set.
  pub content: String,
  pub is_file: bool,
  pub price: i64,
}

impl Model {
  pub fn has_content(&self) -> bool {
    !self.content.is_empty()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
