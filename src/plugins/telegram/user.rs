//! Regular user flows: registration, the main menu and its dialogs.

use teloxide::{prelude::*, types::KeyboardRemove};

use super::{Input, ReplyBot, callback::Callback, keyboard, view};
use crate::{
  dialog::{Dialog, Dialogs},
  entity::{DeviceType, user},
  prelude::*,
  state::AppState,
};

pub async fn start(
  app: &AppState,
  bot: &ReplyBot,
  username: Option<String>,
) -> ResponseResult<()> {
  let user = match app.sv().user.get_or_create(bot.user_id, username).await {
    Ok(user) => user,
    Err(err) => return bot.reply_error(&err).await,
  };

  if !user.is_registered() {
    app.dialogs.set(bot.user_id, Dialog::RegisterPhone);
    bot
      .reply_with_keyboard(
        "👋 <b>Welcome!</b>\n\nTo register, share your phone number with the \
        button below or type it (e.g. <code>09121234567</code>).",
        keyboard::share_contact(),
      )
      .await?;
    return Ok(());
  }

  app.dialogs.clear(bot.user_id);
  bot
    .reply_with_keyboard(
      view::WELCOME,
      keyboard::main_menu(app.is_admin(bot.user_id)),
    )
    .await?;
  Ok(())
}

/// Service, transfer and top-up actions need an approved user. The admin
/// passes even before registering.
fn may_use(is_admin: bool, user: Result<user::Model>) -> Result<()> {
  if is_admin {
    return Ok(());
  }
  if !user?.is_approved {
    return Err(Error::NotApproved);
  }
  Ok(())
}

async fn gate(app: &AppState, bot: &ReplyBot) -> ResponseResult<bool> {
  let user = app.sv().user.require(bot.user_id).await;

  match may_use(app.is_admin(bot.user_id), user) {
    Ok(()) => Ok(true),
    Err(err) => {
      bot
        .edit_with_keyboard(
          format!("⛔ {}", err.user_message()),
          keyboard::back_to_menu(),
        )
        .await?;
      Ok(false)
    }
  }
}

async fn prompt(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  text: &str,
) -> ResponseResult<()> {
  app.dialogs.set(bot.user_id, dialog);
  bot.edit_with_keyboard(text, keyboard::cancel()).await
}

pub async fn on_callback(
  app: &AppState,
  bot: &ReplyBot,
  callback: Callback,
) -> ResponseResult<()> {
  let is_admin = app.is_admin(bot.user_id);

  match callback {
    Callback::MainMenu => {
      app.dialogs.clear(bot.user_id);
      bot.edit_with_keyboard(view::WELCOME, keyboard::main_menu(is_admin)).await
    }
    Callback::Cancel => {
      app.dialogs.clear(bot.user_id);
      bot
        .edit_with_keyboard(
          "Operation cancelled.",
          keyboard::main_menu(is_admin),
        )
        .await
    }
    Callback::GetApp => {
      bot
        .edit_with_keyboard("📲 Pick your platform:", keyboard::apps())
        .await
    }
    Callback::App(device) => {
      let text = format!(
        "{}\n\n<a href=\"{}\">Download the client</a>",
        device.label(),
        view::app_link(device)
      );
      bot.edit_with_keyboard(text, keyboard::app_download(device)).await
    }
    Callback::AppGuide => {
      bot.edit_with_keyboard(view::GUIDE, keyboard::apps()).await
    }
    Callback::ActivateDiscount => {
      prompt(app, bot, Dialog::Discount, "🎁 Send your discount code:").await
    }
    Callback::MyCredit => match app.sv().balance.get(bot.user_id).await {
      Ok(balance) => {
        bot
          .edit_with_keyboard(view::credit(balance), keyboard::back_to_menu())
          .await
      }
      Err(err) => bot.reply_error(&err).await,
    },
    Callback::MyStatus => match app.sv().user.by_id(bot.user_id).await {
      Ok(Some(user)) => {
        bot
          .edit_with_keyboard(view::status(&user), keyboard::back_to_menu())
          .await
      }
      Ok(None) => bot.reply_error(&Error::UserNotFound).await,
      Err(err) => bot.reply_error(&err).await,
    },
    Callback::Transfer => {
      if gate(app, bot).await? {
        prompt(
          app,
          bot,
          Dialog::TransferTarget,
          "🔁 Send the numeric ID of the recipient:",
        )
        .await?;
      }
      Ok(())
    }
    Callback::TopUp => {
      if gate(app, bot).await? {
        prompt(
          app,
          bot,
          Dialog::TopUp,
          "💳 Send the amount and a description, separated by a dash.\n\
          Example: <code>20000 - card ending 1234</code>",
        )
        .await?;
      }
      Ok(())
    }
    Callback::Support => {
      prompt(app, bot, Dialog::Support, "✉️ Send your message for support:")
        .await
    }
    Callback::GetService => {
      if !gate(app, bot).await? {
        return Ok(());
      }
      match app.sv().catalog.all().await {
        Ok(services) => {
          bot
            .edit_with_keyboard(
              view::catalog(&services),
              keyboard::services(&services),
            )
            .await
        }
        Err(err) => bot.reply_error(&err).await,
      }
    }
    Callback::RequestService(service_type) => {
      if gate(app, bot).await? {
        request_service(app, bot, &service_type).await?;
      }
      Ok(())
    }
    Callback::RegisterDevice(token) => register_device(app, bot, &token).await,
    other => {
      debug!("Callback {:?} is not a user action", other);
      Ok(())
    }
  }
}

pub async fn on_input(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  input: Input,
) -> ResponseResult<()> {
  match dialog {
    Dialog::RegisterPhone => return register_phone(app, bot, input).await,
    Dialog::RegisterDevice => {
      bot
        .reply_with_keyboard("Please choose your device:", keyboard::devices())
        .await?;
      return Ok(());
    }
    _ => {}
  }

  let Input::Text(text) = input else {
    bot.reply_html("Please send a text message, or /cancel.").await?;
    return Ok(());
  };

  match dialog {
    Dialog::RegisterName => register_name(app, bot, &text).await,
    Dialog::Discount => redeem(app, bot, &text).await,
    Dialog::TransferTarget => transfer_target(app, bot, &text).await,
    Dialog::TransferAmount { target } => {
      transfer(app, bot, target, &text).await
    }
    Dialog::TopUp => top_up(app, bot, &text).await,
    Dialog::Support => support(app, bot, &text).await,
    other => {
      debug!("Dialog {:?} is not a user step", other);
      Ok(())
    }
  }
}

async fn register_phone(
  app: &AppState,
  bot: &ReplyBot,
  input: Input,
) -> ResponseResult<()> {
  let phone = match input {
    Input::Contact { user_id, phone }
      if user_id.is_none_or(|id| id == bot.user_id) =>
    {
      Some(phone)
    }
    Input::Text(text) if utils::is_valid_phone(&text) => {
      Some(text.trim().to_string())
    }
    _ => None,
  };

  let Some(phone) = phone else {
    bot
      .reply_with_keyboard(
        "❌ Invalid phone number. Use the button below or type a number \
        starting with +98, 0098 or 09.",
        keyboard::share_contact(),
      )
      .await?;
    return Ok(());
  };

  if let Err(err) = app.sv().user.set_phone(bot.user_id, &phone).await {
    return bot.reply_error(&err).await;
  }

  app.dialogs.set(bot.user_id, Dialog::RegisterName);
  bot
    .reply_with_keyboard(
      "✅ Phone saved. Now send your full name:",
      KeyboardRemove::new(),
    )
    .await?;
  Ok(())
}

async fn register_name(
  app: &AppState,
  bot: &ReplyBot,
  name: &str,
) -> ResponseResult<()> {
  // an empty name re-prompts in place
  if let Err(err) = app.sv().user.set_name(bot.user_id, name).await {
    return bot.reply_error(&err).await;
  }

  app.dialogs.set(bot.user_id, Dialog::RegisterDevice);
  bot
    .reply_with_keyboard("📱 Which device do you use?", keyboard::devices())
    .await?;
  Ok(())
}

#[derive(Debug, PartialEq)]
enum DevicePick {
  Picked(DeviceType),
  /// Unknown token; the user stays in the device step.
  Invalid,
  /// The user is no longer choosing a device.
  Stale,
}

fn pick_device(dialogs: &Dialogs, user_id: i64, token: &str) -> DevicePick {
  if dialogs.get(user_id) != Some(Dialog::RegisterDevice) {
    return DevicePick::Stale;
  }
  DeviceType::from_token(token)
    .map_or(DevicePick::Invalid, DevicePick::Picked)
}

async fn register_device(
  app: &AppState,
  bot: &ReplyBot,
  token: &str,
) -> ResponseResult<()> {
  let device = match pick_device(&app.dialogs, bot.user_id, token) {
    DevicePick::Picked(device) => device,
    DevicePick::Invalid => {
      return bot
        .edit_with_keyboard(
          "Please choose a valid device:",
          keyboard::devices(),
        )
        .await;
    }
    DevicePick::Stale => {
      debug!("Stale device button from {}", bot.user_id);
      return Ok(());
    }
  };

  let is_admin = app.is_admin(bot.user_id);
  let user = match app
    .sv()
    .user
    .complete_registration(bot.user_id, device, is_admin)
    .await
  {
    Ok(user) => user,
    Err(err) => return bot.reply_error(&err).await,
  };
  app.dialogs.clear(bot.user_id);
  info!("User {} registered with {}", user.tg_user_id, device.token());

  if is_admin {
    return bot
      .edit_with_keyboard(
        "✅ Registration complete.",
        keyboard::main_menu(true),
      )
      .await;
  }

  bot
    .notifier()
    .text(
      app.config.admin_id,
      view::registration(&user),
      Some(keyboard::review_user(user.tg_user_id)),
    )
    .await;

  bot
    .edit_with_keyboard(
      format!(
        "✅ Registration complete ({}).\n\n\
        Your account is waiting for admin approval.",
        device.label()
      ),
      keyboard::main_menu(false),
    )
    .await
}

async fn redeem(
  app: &AppState,
  bot: &ReplyBot,
  code: &str,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);

  match app.sv().discount.redeem(bot.user_id, code).await {
    Ok(redeemed) => {
      bot
        .reply_with_keyboard(
          format!(
            "✅ {} added to your credit.\n{}",
            utils::format_credit(redeemed.value),
            view::credit(redeemed.balance)
          ),
          keyboard::main_menu(app.is_admin(bot.user_id)),
        )
        .await?;
      Ok(())
    }
    Err(err) => bot.reply_error(&err).await,
  }
}

async fn transfer_target(
  app: &AppState,
  bot: &ReplyBot,
  text: &str,
) -> ResponseResult<()> {
  let checked = match utils::parse_id(text) {
    Ok(target) => app
      .sv()
      .balance
      .validate_recipient(bot.user_id, target)
      .await
      .map(|_| target),
    Err(err) => Err(err),
  };

  match checked {
    Ok(target) => {
      app.dialogs.set(bot.user_id, Dialog::TransferAmount { target });
      bot
        .reply_with_keyboard(
          "How much credit do you want to send?",
          keyboard::cancel(),
        )
        .await?;
      Ok(())
    }
    Err(err) => {
      app.dialogs.clear(bot.user_id);
      bot.reply_error(&err).await
    }
  }
}

async fn transfer(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  text: &str,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);

  let amount = match utils::parse_amount(text) {
    Ok(amount) => amount,
    Err(err) => return bot.reply_error(&err).await,
  };

  let done = match app.sv().balance.transfer(bot.user_id, target, amount).await
  {
    Ok(done) => done,
    Err(err) => return bot.reply_error(&err).await,
  };
  info!("User {} sent {} to {}", bot.user_id, amount, target);

  bot
    .notifier()
    .text(
      target,
      format!(
        "💸 You received {} from <code>{}</code>.\n{}",
        utils::format_credit(amount),
        bot.user_id,
        view::credit(done.recipient_balance)
      ),
      None,
    )
    .await;

  bot
    .reply_with_keyboard(
      format!("✅ Transfer done.\n{}", view::credit(done.sender_balance)),
      keyboard::main_menu(app.is_admin(bot.user_id)),
    )
    .await?;
  Ok(())
}

async fn top_up(
  app: &AppState,
  bot: &ReplyBot,
  text: &str,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);
  let sv = app.sv();

  let (amount, description) = match utils::parse_topup(text) {
    Ok(parsed) => parsed,
    Err(err) => return bot.reply_error(&err).await,
  };

  let user = match sv.user.by_id(bot.user_id).await {
    Ok(Some(user)) => user,
    Ok(None) => return bot.reply_error(&Error::UserNotFound).await,
    Err(err) => return bot.reply_error(&err).await,
  };

  let created = sv.purchase.create(bot.user_id, amount, &description).await;
  let request = match created {
    Ok(request) => request,
    Err(err) => return bot.reply_error(&err).await,
  };
  info!("Top-up #{} by {} for {}", request.id, bot.user_id, amount);

  bot
    .notifier()
    .text(
      app.config.admin_id,
      view::topup_request(&user, &request),
      Some(keyboard::review_topup(request.id)),
    )
    .await;

  bot
    .reply_with_keyboard(
      format!(
        "✅ Request #{} for {} was sent to the admin.",
        request.id,
        utils::format_credit(amount)
      ),
      keyboard::main_menu(app.is_admin(bot.user_id)),
    )
    .await?;
  Ok(())
}

async fn support(
  app: &AppState,
  bot: &ReplyBot,
  text: &str,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);
  let sv = app.sv();

  let user = match sv.user.by_id(bot.user_id).await {
    Ok(Some(user)) => user,
    Ok(None) => return bot.reply_error(&Error::UserNotFound).await,
    Err(err) => return bot.reply_error(&err).await,
  };

  let message = match sv.support.record(bot.user_id, text).await {
    Ok(message) => message,
    Err(err) => return bot.reply_error(&err).await,
  };

  bot
    .notifier()
    .text(
      app.config.admin_id,
      view::support(&user, &message),
      Some(keyboard::reply_to(bot.user_id)),
    )
    .await;

  bot
    .reply_with_keyboard(
      "✅ Your message was sent to support.",
      keyboard::main_menu(app.is_admin(bot.user_id)),
    )
    .await?;
  Ok(())
}

async fn request_service(
  app: &AppState,
  bot: &ReplyBot,
  service_type: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  let service = match sv.catalog.by_type(service_type).await {
    Ok(Some(service)) => service,
    Ok(None) => return bot.reply_error(&Error::ServiceNotFound).await,
    Err(err) => return bot.reply_error(&err).await,
  };
  let user = match sv.user.by_id(bot.user_id).await {
    Ok(Some(user)) => user,
    Ok(None) => return bot.reply_error(&Error::UserNotFound).await,
    Err(err) => return bot.reply_error(&err).await,
  };

  app.service_requests.open(bot.user_id, service.service_type.clone());
  info!("User {} requested {}", bot.user_id, service.service_type);

  bot
    .notifier()
    .text(
      app.config.admin_id,
      view::service_request(&user, &service),
      Some(keyboard::service_request(bot.user_id)),
    )
    .await;

  bot
    .edit_with_keyboard(
      format!(
        "✅ Your request for <b>{}</b> was sent to the admin. \
        You will receive it here shortly.",
        teloxide::utils::html::escape(&service.service_type)
      ),
      keyboard::back_to_menu(),
    )
    .await
}

#[cfg(test)]
mod tests {
  use super::*;

  fn member(is_approved: bool) -> user::Model {
    user::Model {
      tg_user_id: 100,
      username: None,
      full_name: Some("Test User".into()),
      phone_number: Some("09120000000".into()),
      device_type: Some(DeviceType::Android),
      credit: 0,
      discount_used: false,
      is_approved,
      reg_date: Utc::now().naive_utc(),
    }
  }

  #[test]
  fn test_admin_bypasses_gate() {
    assert!(may_use(true, Err(Error::UserNotFound)).is_ok());
    assert!(may_use(true, Ok(member(false))).is_ok());
  }

  #[test]
  fn test_gate_blocks_unapproved() {
    assert!(matches!(
      may_use(false, Ok(member(false))),
      Err(Error::NotApproved)
    ));
    assert!(matches!(
      may_use(false, Err(Error::UserNotFound)),
      Err(Error::UserNotFound)
    ));
    assert!(may_use(false, Ok(member(true))).is_ok());
  }

  #[test]
  fn test_unknown_device_keeps_step() {
    let dialogs = Dialogs::new(Duration::from_secs(60));
    dialogs.set(1, Dialog::RegisterDevice);

    assert_eq!(pick_device(&dialogs, 1, "blackberry"), DevicePick::Invalid);
    assert_eq!(dialogs.get(1), Some(Dialog::RegisterDevice));

    assert_eq!(
      pick_device(&dialogs, 1, DeviceType::Iphone.token()),
      DevicePick::Picked(DeviceType::Iphone)
    );
  }

  #[test]
  fn test_device_button_outside_step() {
    let dialogs = Dialogs::new(Duration::from_secs(60));
    dialogs.set(1, Dialog::RegisterName);

    assert_eq!(pick_device(&dialogs, 1, "android"), DevicePick::Stale);
    assert_eq!(pick_device(&dialogs, 2, "android"), DevicePick::Stale);
    assert_eq!(dialogs.get(1), Some(Dialog::RegisterName));
  }
}
