use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{purchase_request, support_message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum DeviceType {
  #[sea_orm(string_value = "android")]
  Android,
  #[sea_orm(string_value = "iphone")]
  Iphone,
  #[sea_orm(string_value = "windows")]
  Windows,
}

impl DeviceType {
  pub fn from_token(token: &str) -> Option<Self> {
    match token {
      "android" => Some(Self::Android),
      "iphone" => Some(Self::Iphone),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  pub fn token(self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::Iphone => "iphone",
      Self::Windows => "windows",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Android => "📱 Android",
      Self::Iphone => "🍏 iPhone",
      Self::Windows => "🖥 Windows",
    }
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub tg_user_id: i64,
  pub username: Option<String>,
  pub full_name: Option<String>,
  pub phone_number: Option<String>,
  pub device_type: Option<DeviceType>,
  pub credit: i64,
  pub discount_used: bool,
  pub is_approved: bool,
  pub reg_date: DateTime,
}

impl Model {
  /// Registration is complete once a device has been chosen.
  pub fn is_registered(&self) -> bool {
    self.device_type.is_some()
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "support_message::Entity")]
  SupportMessages,
  #[sea_orm(has_many = "purchase_request::Entity")]
  PurchaseRequests,
}

impl Related<support_message::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::SupportMessages.def()
  }
}

impl Related<purchase_request::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::PurchaseRequests.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
