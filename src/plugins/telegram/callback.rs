use std::sync::Arc;

use teloxide::prelude::*;

use super::{ReplyBot, admin, user};
use crate::{entity::DeviceType, prelude::*, state::AppState};

/// Admin panel entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
  Home,
  Pending,
  TopUps,
  Charge,
  Deduct,
  AddDiscount,
  RemoveDiscount,
  ListDiscounts,
  AddService,
  SetPrice,
  Broadcast,
  Chat,
}

impl Panel {
  const ALL: [Panel; 12] = [
    Panel::Home,
    Panel::Pending,
    Panel::TopUps,
    Panel::Charge,
    Panel::Deduct,
    Panel::AddDiscount,
    Panel::RemoveDiscount,
    Panel::ListDiscounts,
    Panel::AddService,
    Panel::SetPrice,
    Panel::Broadcast,
    Panel::Chat,
  ];

  fn token(self) -> &'static str {
    match self {
      Panel::Home => "admin_panel",
      Panel::Pending => "admin_pending",
      Panel::TopUps => "admin_topups",
      Panel::Charge => "admin_charge",
      Panel::Deduct => "admin_deduct",
      Panel::AddDiscount => "admin_add_discount",
      Panel::RemoveDiscount => "admin_remove_discount",
      Panel::ListDiscounts => "admin_list_discounts",
      Panel::AddService => "admin_add_service",
      Panel::SetPrice => "admin_set_price",
      Panel::Broadcast => "admin_broadcast",
      Panel::Chat => "admin_chat",
    }
  }
}

/// Callback data enum - every button payload the bot emits or accepts
#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
  MainMenu,
  Cancel,

  GetApp,
  App(DeviceType),
  AppGuide,

  ActivateDiscount,
  MyCredit,
  Transfer,
  MyStatus,
  GetService,
  TopUp,
  Support,
  RequestService(String),
  RegisterDevice(String),

  Admin(Panel),
  ServiceContentFor(String),
  ServicePriceFor(String),

  ApproveUser(i64),
  RejectUser(i64),
  ChatUser(i64),
  ChargeUser(i64),
  DeductUser(i64),

  SendService(i64),
  DeliverService(i64),
  RejectService(i64),

  ApproveTopUp(i32),
  RejectTopUp(i32),
}

impl Callback {
  pub fn to_data(&self) -> String {
    match self {
      Callback::MainMenu => "main_menu".to_string(),
      Callback::Cancel => "cancel".to_string(),
      Callback::GetApp => "get_app".to_string(),
      Callback::App(device) => format!("app_{}", device.token()),
      Callback::AppGuide => "app_guide".to_string(),
      Callback::ActivateDiscount => "activate_discount".to_string(),
      Callback::MyCredit => "my_credit".to_string(),
      Callback::Transfer => "transfer_credit".to_string(),
      Callback::MyStatus => "my_status".to_string(),
      Callback::GetService => "get_service".to_string(),
      Callback::TopUp => "topup".to_string(),
      Callback::Support => "support_message".to_string(),
      Callback::RequestService(ty) => format!("request_service_{ty}"),
      Callback::RegisterDevice(token) => format!("register_device_{token}"),
      Callback::Admin(panel) => panel.token().to_string(),
      Callback::ServiceContentFor(ty) => format!("admin_svc_{ty}"),
      Callback::ServicePriceFor(ty) => format!("admin_price_{ty}"),
      Callback::ApproveUser(id) => format!("approve_user_{id}"),
      Callback::RejectUser(id) => format!("reject_user_{id}"),
      Callback::ChatUser(id) => format!("chat_user_{id}"),
      Callback::ChargeUser(id) => format!("charge_user_{id}"),
      Callback::DeductUser(id) => format!("deduct_user_{id}"),
      Callback::SendService(id) => format!("send_service_{id}"),
      Callback::DeliverService(id) => format!("deliver_service_{id}"),
      Callback::RejectService(id) => format!("reject_service_{id}"),
      Callback::ApproveTopUp(id) => format!("approve_topup_{id}"),
      Callback::RejectTopUp(id) => format!("reject_topup_{id}"),
    }
  }

  pub fn from_data(data: &str) -> Option<Self> {
    let exact = match data {
      "main_menu" => Some(Callback::MainMenu),
      "cancel" => Some(Callback::Cancel),
      "get_app" => Some(Callback::GetApp),
      "app_guide" => Some(Callback::AppGuide),
      "activate_discount" => Some(Callback::ActivateDiscount),
      "my_credit" => Some(Callback::MyCredit),
      "transfer_credit" => Some(Callback::Transfer),
      "my_status" => Some(Callback::MyStatus),
      "get_service" => Some(Callback::GetService),
      "topup" => Some(Callback::TopUp),
      "support_message" => Some(Callback::Support),
      _ => Panel::ALL
        .into_iter()
        .find(|panel| panel.token() == data)
        .map(Callback::Admin),
    };
    if exact.is_some() {
      return exact;
    }

    let text = |prefix: &str| {
      data.strip_prefix(prefix).filter(|rest| !rest.is_empty())
    };
    let id = |prefix: &str| data.strip_prefix(prefix)?.parse::<i64>().ok();
    let request = |prefix: &str| data.strip_prefix(prefix)?.parse::<i32>().ok();

    if let Some(device) = data.strip_prefix("app_") {
      return DeviceType::from_token(device).map(Callback::App);
    }
    if let Some(ty) = text("request_service_") {
      return Some(Callback::RequestService(ty.to_string()));
    }
    if let Some(token) = data.strip_prefix("register_device_") {
      return Some(Callback::RegisterDevice(token.to_string()));
    }
    if let Some(ty) = text("admin_svc_") {
      return Some(Callback::ServiceContentFor(ty.to_string()));
    }
    if let Some(ty) = text("admin_price_") {
      return Some(Callback::ServicePriceFor(ty.to_string()));
    }

    id("approve_user_")
      .map(Callback::ApproveUser)
      .or_else(|| id("reject_user_").map(Callback::RejectUser))
      .or_else(|| id("chat_user_").map(Callback::ChatUser))
      .or_else(|| id("charge_user_").map(Callback::ChargeUser))
      .or_else(|| id("deduct_user_").map(Callback::DeductUser))
      .or_else(|| id("send_service_").map(Callback::SendService))
      .or_else(|| id("deliver_service_").map(Callback::DeliverService))
      .or_else(|| id("reject_service_").map(Callback::RejectService))
      .or_else(|| request("approve_topup_").map(Callback::ApproveTopUp))
      .or_else(|| request("reject_topup_").map(Callback::RejectTopUp))
  }

  /// Buttons only the admin may press.
  pub fn is_admin_only(&self) -> bool {
    matches!(
      self,
      Callback::Admin(_)
        | Callback::ServiceContentFor(_)
        | Callback::ServicePriceFor(_)
        | Callback::ApproveUser(_)
        | Callback::RejectUser(_)
        | Callback::ChatUser(_)
        | Callback::ChargeUser(_)
        | Callback::DeductUser(_)
        | Callback::SendService(_)
        | Callback::DeliverService(_)
        | Callback::RejectService(_)
        | Callback::ApproveTopUp(_)
        | Callback::RejectTopUp(_)
    )
  }
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  data: &str,
) -> ResponseResult<()> {
  let Some(callback) = Callback::from_data(data) else {
    debug!("Unknown callback `{}` from {}", data, bot.user_id);
    return Ok(());
  };

  if callback.is_admin_only() {
    if !app.is_admin(bot.user_id) {
      warn!("User {} pressed admin button `{}`", bot.user_id, data);
      return Ok(());
    }
    return admin::on_callback(&app, &bot, callback).await;
  }

  user::on_callback(&app, &bot, callback).await
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tokens_parse_back() {
    let callbacks = [
      Callback::MainMenu,
      Callback::App(DeviceType::Iphone),
      Callback::RequestService("V2Ray".into()),
      Callback::RegisterDevice("android".into()),
      Callback::Admin(Panel::ListDiscounts),
      Callback::ServicePriceFor("OpenVPN".into()),
      Callback::DeliverService(42),
      Callback::ApproveTopUp(7),
    ];

    for callback in callbacks {
      assert_eq!(Callback::from_data(&callback.to_data()), Some(callback));
    }
  }

  #[test]
  fn test_known_wire_tokens() {
    assert_eq!(
      Callback::from_data("transfer_credit"),
      Some(Callback::Transfer)
    );
    assert_eq!(Callback::from_data("support_message"), Some(Callback::Support));
    assert_eq!(
      Callback::from_data("admin_panel"),
      Some(Callback::Admin(Panel::Home))
    );
    assert_eq!(
      Callback::from_data("approve_user_123456789"),
      Some(Callback::ApproveUser(123456789))
    );
    assert_eq!(
      Callback::from_data("request_service_V2Ray"),
      Some(Callback::RequestService("V2Ray".into()))
    );
  }

  #[test]
  fn test_garbage_is_ignored() {
    assert_eq!(Callback::from_data("approve_user_abc"), None);
    assert_eq!(Callback::from_data("app_linux"), None);
    assert_eq!(Callback::from_data("request_service_"), None);
    assert_eq!(Callback::from_data("something"), None);
  }

  #[test]
  fn test_unknown_device_still_parses() {
    // rejected later with a re-prompt, not silently dropped
    assert_eq!(
      Callback::from_data("register_device_linux"),
      Some(Callback::RegisterDevice("linux".into()))
    );
  }

  #[test]
  fn test_admin_buttons() {
    assert!(Callback::Admin(Panel::Broadcast).is_admin_only());
    assert!(Callback::RejectTopUp(1).is_admin_only());
    assert!(!Callback::RequestService("x".into()).is_admin_only());
    assert!(!Callback::Cancel.is_admin_only());
  }
}
