use reqwest::Url;
use teloxide::types::{
  ButtonRequest, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
  KeyboardMarkup,
};

use super::{
  callback::{Callback, Panel},
  view,
};
use crate::{
  entity::{DeviceType, service},
  utils,
};

fn button(text: impl Into<String>, callback: Callback) -> InlineKeyboardButton {
  InlineKeyboardButton::callback(text, callback.to_data())
}

pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
  let mut rows = vec![
    vec![button("📲 Get the app", Callback::GetApp)],
    vec![
      button("🎁 Activate discount", Callback::ActivateDiscount),
      button("💰 My credit", Callback::MyCredit),
    ],
    vec![
      button("🔁 Transfer credit", Callback::Transfer),
      button("👤 My status", Callback::MyStatus),
    ],
    vec![
      button("🛒 Get a service", Callback::GetService),
      button("💳 Top up", Callback::TopUp),
    ],
    vec![button("✉️ Message support", Callback::Support)],
  ];

  if is_admin {
    rows.push(vec![button("🛠 Admin panel", Callback::Admin(Panel::Home))]);
  }

  InlineKeyboardMarkup::new(rows)
}

pub fn admin_menu() -> InlineKeyboardMarkup {
  let admin = |text: &str, panel| button(text, Callback::Admin(panel));

  InlineKeyboardMarkup::new(vec![
    vec![
      admin("⏳ Pending users", Panel::Pending),
      admin("💳 Top-up requests", Panel::TopUps),
    ],
    vec![
      admin("➕ Charge user", Panel::Charge),
      admin("➖ Deduct credit", Panel::Deduct),
    ],
    vec![
      admin("🎟 Add discount", Panel::AddDiscount),
      admin("🗑 Remove discount", Panel::RemoveDiscount),
    ],
    vec![admin("📋 List discounts", Panel::ListDiscounts)],
    vec![
      admin("📦 Add service", Panel::AddService),
      admin("🏷 Set price", Panel::SetPrice),
    ],
    vec![
      admin("📢 Broadcast", Panel::Broadcast),
      admin("💬 Chat with user", Panel::Chat),
    ],
    vec![button("« Main menu", Callback::MainMenu)],
  ])
}

pub fn back_to_menu() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![button(
    "« Main menu",
    Callback::MainMenu,
  )]])
}

pub fn back_to_panel() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![button(
    "« Admin panel",
    Callback::Admin(Panel::Home),
  )]])
}

pub fn cancel() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![button("❌ Cancel", Callback::Cancel)]])
}

pub fn share_contact() -> KeyboardMarkup {
  KeyboardMarkup::new(vec![vec![
    KeyboardButton::new("📞 Share phone number").request(ButtonRequest::Contact),
  ]])
  .resize_keyboard()
  .one_time_keyboard()
}

pub fn devices() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    [DeviceType::Android, DeviceType::Iphone, DeviceType::Windows]
      .into_iter()
      .map(|device| {
        button(
          device.label(),
          Callback::RegisterDevice(device.token().to_string()),
        )
      })
      .collect::<Vec<_>>(),
  ])
}

pub fn apps() -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![
      button(DeviceType::Android.label(), Callback::App(DeviceType::Android)),
      button(DeviceType::Iphone.label(), Callback::App(DeviceType::Iphone)),
      button(DeviceType::Windows.label(), Callback::App(DeviceType::Windows)),
    ],
    vec![button("📖 Setup guide", Callback::AppGuide)],
    vec![button("« Main menu", Callback::MainMenu)],
  ])
}

/// Download button for one platform, falling back to the app list if the
/// link ever fails to parse.
pub fn app_download(device: DeviceType) -> InlineKeyboardMarkup {
  let mut rows = Vec::new();
  if let Ok(url) = Url::parse(view::app_link(device)) {
    rows.push(vec![InlineKeyboardButton::url("⬇️ Download", url)]);
  }
  rows.push(vec![button("« Back", Callback::GetApp)]);
  InlineKeyboardMarkup::new(rows)
}

pub fn services(services: &[service::Model]) -> InlineKeyboardMarkup {
  let mut rows: Vec<_> = services
    .iter()
    .map(|service| {
      vec![button(
        format!(
          "{} ({})",
          service.service_type,
          utils::format_credit(service.price)
        ),
        Callback::RequestService(service.service_type.clone()),
      )]
    })
    .collect();

  rows.push(vec![button("« Main menu", Callback::MainMenu)]);
  InlineKeyboardMarkup::new(rows)
}

/// Existing services for the admin to pick; `price` selects which field
/// gets edited.
pub fn admin_services(
  services: &[service::Model],
  price: bool,
) -> InlineKeyboardMarkup {
  let mut rows: Vec<_> = services
    .iter()
    .map(|service| {
      let ty = service.service_type.clone();
      let callback = if price {
        Callback::ServicePriceFor(ty)
      } else {
        Callback::ServiceContentFor(ty)
      };
      vec![button(&service.service_type, callback)]
    })
    .collect();

  rows.push(vec![button("« Admin panel", Callback::Admin(Panel::Home))]);
  InlineKeyboardMarkup::new(rows)
}

pub fn review_user(user_id: i64) -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![
      button("✅ Approve", Callback::ApproveUser(user_id)),
      button("❌ Reject", Callback::RejectUser(user_id)),
    ],
    vec![
      button("💬 Chat", Callback::ChatUser(user_id)),
      button("➕ Charge", Callback::ChargeUser(user_id)),
    ],
  ])
}

pub fn service_request(user_id: i64) -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![
    vec![button("📦 Send stored service", Callback::DeliverService(user_id))],
    vec![button("✍️ Send custom", Callback::SendService(user_id))],
    vec![
      button("💬 Chat", Callback::ChatUser(user_id)),
      button("➖ Deduct credit", Callback::DeductUser(user_id)),
    ],
    vec![button("❌ Reject", Callback::RejectService(user_id))],
  ])
}

pub fn review_topup(request_id: i32) -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![
    button("✅ Approve", Callback::ApproveTopUp(request_id)),
    button("❌ Reject", Callback::RejectTopUp(request_id)),
  ]])
}

pub fn reply_to(user_id: i64) -> InlineKeyboardMarkup {
  InlineKeyboardMarkup::new(vec![vec![button(
    "💬 Reply",
    Callback::ChatUser(user_id),
  )]])
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokens(keyboard: &InlineKeyboardMarkup) -> Vec<String> {
    use teloxide::types::InlineKeyboardButtonKind;

    keyboard
      .inline_keyboard
      .iter()
      .flatten()
      .filter_map(|button| match &button.kind {
        InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
        _ => None,
      })
      .collect()
  }

  #[test]
  fn test_admin_entry_only_for_admin() {
    assert!(tokens(&main_menu(true)).contains(&"admin_panel".to_string()));
    assert!(!tokens(&main_menu(false)).contains(&"admin_panel".to_string()));
  }

  #[test]
  fn test_every_button_parses() {
    let keyboards = [
      main_menu(true),
      admin_menu(),
      devices(),
      apps(),
      review_user(5),
      service_request(5),
      review_topup(3),
      reply_to(5),
    ];

    for keyboard in &keyboards {
      for token in tokens(keyboard) {
        assert!(Callback::from_data(&token).is_some(), "{token}");
        assert!(token.len() <= 64, "{token}");
      }
    }
  }

  #[test]
  fn test_service_buttons_show_price() {
    let offering = service::Model {
      service_type: "V2Ray".into(),
      content: String::new(),
      is_file: false,
      price: 50_000,
    };

    let keyboard = services(&[offering]);
    assert_eq!(tokens(&keyboard)[0], "request_service_V2Ray");
    assert!(keyboard.inline_keyboard[0][0].text.contains("50000"));
  }
}
