//! Message bodies. Everything that originates from a user is escaped here,
//! so handlers can send the result with HTML parse mode as is.

use teloxide::utils::html;

use crate::{
  entity::{DeviceType, code, purchase_request, service, support_message, user},
  utils,
};

pub const WELCOME: &str = "👋 <b>Welcome!</b>\n\nUse the buttons below.";

pub const ABOUT: &str = "\
<b>About</b>

This bot sells connection services for credit.
Register once, get approved by the admin, top up your credit and \
request a service from the menu. Use /cancel to abort any step.";

pub const GUIDE: &str = "\
📖 <b>Setup guide</b>

1. Install OpenVPN Connect for your device from the app menu.
2. Request a service from the main menu and wait for the admin.
3. Import the file or link you receive into OpenVPN Connect.
4. Tap the imported profile and connect.";

pub fn app_link(device: DeviceType) -> &'static str {
  match device {
    DeviceType::Android => {
      "https://play.google.com/store/apps/details?id=net.openvpn.openvpn"
    }
    DeviceType::Iphone => "https://apps.apple.com/app/openvpn-connect/id590379981",
    DeviceType::Windows => "https://openvpn.net/client-connect-vpn-for-windows/",
  }
}

/// `@username`, falling back to the full name and then the id.
pub fn display_name(user: &user::Model) -> String {
  match (&user.username, &user.full_name) {
    (Some(username), _) => format!("@{}", html::escape(username)),
    (None, Some(name)) => html::escape(name),
    (None, None) => user.tg_user_id.to_string(),
  }
}

fn or_dash(value: Option<&str>) -> String {
  value.map(html::escape).unwrap_or_else(|| "-".into())
}

pub fn status(user: &user::Model) -> String {
  format!(
    "👤 <b>Your account</b>\n\n\
    <b>ID:</b> <code>{}</code>\n\
    <b>Name:</b> {}\n\
    <b>Phone:</b> {}\n\
    <b>Device:</b> {}\n\
    <b>Credit:</b> {}\n\
    <b>Discount used:</b> {}\n\
    <b>Approved:</b> {}\n\
    <b>Registered:</b> {}",
    user.tg_user_id,
    or_dash(user.full_name.as_deref()),
    or_dash(user.phone_number.as_deref()),
    user.device_type.map(DeviceType::label).unwrap_or("-"),
    utils::format_credit(user.credit),
    if user.discount_used { "yes" } else { "no" },
    if user.is_approved { "✅ yes" } else { "⏳ waiting" },
    utils::format_date(user.reg_date),
  )
}

pub fn credit(balance: i64) -> String {
  format!("💰 Your credit: <b>{}</b>", utils::format_credit(balance))
}

/// Sent to the admin once a user finishes registration.
pub fn registration(user: &user::Model) -> String {
  format!("🆕 <b>New registration</b>\n\n{}", user_card(user))
}

/// One pending user in the admin list.
pub fn user_card(user: &user::Model) -> String {
  format!(
    "<b>User:</b> {} (<code>{}</code>)\n\
    <b>Name:</b> {}\n\
    <b>Phone:</b> {}\n\
    <b>Device:</b> {}\n\
    <b>Credit:</b> {}",
    display_name(user),
    user.tg_user_id,
    or_dash(user.full_name.as_deref()),
    or_dash(user.phone_number.as_deref()),
    user.device_type.map(DeviceType::label).unwrap_or("-"),
    utils::format_credit(user.credit),
  )
}

pub fn service_request(user: &user::Model, service: &service::Model) -> String {
  format!(
    "🛒 <b>Service request</b>\n\n\
    <b>User:</b> {} (<code>{}</code>)\n\
    <b>Service:</b> {}\n\
    <b>Price:</b> {}\n\
    <b>User credit:</b> {}",
    display_name(user),
    user.tg_user_id,
    html::escape(&service.service_type),
    utils::format_credit(service.price),
    utils::format_credit(user.credit),
  )
}

pub fn topup_request(
  user: &user::Model,
  request: &purchase_request::Model,
) -> String {
  let description = if request.description.is_empty() {
    "-".to_string()
  } else {
    html::escape(&request.description)
  };

  format!(
    "💳 <b>Top-up request #{}</b>\n\n\
    <b>User:</b> {} (<code>{}</code>)\n\
    <b>Amount:</b> {}\n\
    <b>Description:</b> {}",
    request.id,
    display_name(user),
    user.tg_user_id,
    utils::format_credit(request.amount),
    description,
  )
}

/// One pending top-up line in the admin list.
pub fn pending_topup(request: &purchase_request::Model) -> String {
  format!(
    "💳 <b>#{}</b> from <code>{}</code>: {}\n{}\n<i>{}</i>",
    request.id,
    request.user_id,
    utils::format_credit(request.amount),
    html::escape(&request.description),
    utils::format_date(request.created_at),
  )
}

pub fn support(user: &user::Model, message: &support_message::Model) -> String {
  format!(
    "✉️ <b>Support message</b>\n\n\
    <b>From:</b> {} (<code>{}</code>)\n\n{}",
    display_name(user),
    user.tg_user_id,
    html::escape(&message.text),
  )
}

/// Latest support messages of a user, newest first. Empty when none.
pub fn recent_support(messages: &[support_message::Model]) -> String {
  messages
    .iter()
    .map(|message| {
      format!(
        "\n\n<i>{}</i>\n{}",
        utils::format_date(message.created_at),
        html::escape(&message.text)
      )
    })
    .collect()
}

pub fn discounts(codes: &[code::Model]) -> String {
  if codes.is_empty() {
    return "No discount codes.".into();
  }

  let lines: Vec<_> = codes
    .iter()
    .map(|code| {
      format!(
        "<code>{}</code>: {}",
        html::escape(&code.code),
        utils::format_credit(code.value)
      )
    })
    .collect();

  format!("🎟 <b>Discount codes</b>\n\n{}", lines.join("\n"))
}

pub fn catalog(services: &[service::Model]) -> String {
  if services.is_empty() {
    return "No services available yet.".into();
  }
  "🛒 <b>Services</b>\n\nPick one to send a request to the admin:".into()
}

/// Text forwarded from the admin to a user.
pub fn from_admin(text: &str) -> String {
  format!("💬 <b>Message from admin:</b>\n\n{}", html::escape(text))
}

pub fn delivered_service(service_type: Option<&str>, text: &str) -> String {
  let title = match service_type {
    Some(ty) => format!("Your service ({})", html::escape(ty)),
    None => "Your service".to_string(),
  };
  format!("✅ <b>{title}</b>\n\n{}", html::escape(text))
}
