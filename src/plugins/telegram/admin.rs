//! Admin console. Callers have already checked `AppState::is_admin`.

use teloxide::{prelude::*, utils::html};

use super::{
  Input, ReplyBot,
  callback::{Callback, Panel},
  keyboard,
  notify::Delivery,
  view,
};
use crate::{dialog::Dialog, prelude::*, state::AppState, sv};

/// Pause between broadcast sends, keeps us under Telegram's flood limits.
const BROADCAST_DELAY: Duration = Duration::from_millis(50);

async fn prompt(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  text: impl Into<String>,
) -> ResponseResult<()> {
  app.dialogs.set(bot.user_id, dialog);
  bot.reply_with_keyboard(text, keyboard::cancel()).await?;
  Ok(())
}

async fn done(bot: &ReplyBot, text: impl Into<String>) -> ResponseResult<()> {
  bot.reply_with_keyboard(text, keyboard::admin_menu()).await?;
  Ok(())
}

pub async fn on_callback(
  app: &AppState,
  bot: &ReplyBot,
  callback: Callback,
) -> ResponseResult<()> {
  match callback {
    Callback::Admin(panel) => on_panel(app, bot, panel).await,
    Callback::ServiceContentFor(service_type) => {
      let text = format!(
        "Send the link or text for <b>{}</b>, or upload a file:",
        html::escape(&service_type)
      );
      prompt(app, bot, Dialog::ServiceContent { service_type }, text).await
    }
    Callback::ServicePriceFor(service_type) => {
      let text = format!(
        "Send the new price for <b>{}</b>:",
        html::escape(&service_type)
      );
      prompt(app, bot, Dialog::ServicePrice { service_type }, text).await
    }
    Callback::ApproveUser(target) => review_user(app, bot, target, true).await,
    Callback::RejectUser(target) => review_user(app, bot, target, false).await,
    Callback::ChatUser(target) => {
      let recent = match app.sv().support.by_user(target, 3).await {
        Ok(messages) => view::recent_support(&messages),
        Err(err) => return bot.reply_error(&err).await,
      };
      let text = format!(
        "💬 Chatting with <code>{target}</code>.{recent}\n\nSend your message:"
      );
      prompt(app, bot, Dialog::Chat { target }, text).await
    }
    Callback::ChargeUser(target) => {
      let text = format!("➕ How much to add for <code>{target}</code>?");
      prompt(app, bot, Dialog::ChargeAmount { target }, text).await
    }
    Callback::DeductUser(target) => {
      let text = format!("➖ How much to deduct from <code>{target}</code>?");
      prompt(app, bot, Dialog::DeductAmount { target }, text).await
    }
    Callback::SendService(target) => {
      let service_type = app.service_requests.get(target);
      let text = match &service_type {
        Some(ty) => format!(
          "Send the link, text or file of <b>{}</b> for <code>{target}</code>:",
          html::escape(ty)
        ),
        None => format!("Send the service for <code>{target}</code>:"),
      };
      prompt(app, bot, Dialog::DeliverService { target, service_type }, text)
        .await
    }
    Callback::DeliverService(target) => deliver_stored(app, bot, target).await,
    Callback::RejectService(target) => {
      let Some(service_type) = app.service_requests.take(target) else {
        bot.reply_html("No open service request for this user.").await?;
        return Ok(());
      };

      bot
        .notifier()
        .text(
          target,
          format!(
            "❌ Your request for <b>{}</b> was rejected.",
            html::escape(&service_type)
          ),
          None,
        )
        .await;
      done(bot, format!("Request of <code>{target}</code> rejected.")).await
    }
    Callback::ApproveTopUp(id) => review_topup(app, bot, id, true).await,
    Callback::RejectTopUp(id) => review_topup(app, bot, id, false).await,
    other => {
      debug!("Callback {:?} is not an admin action", other);
      Ok(())
    }
  }
}

async fn on_panel(
  app: &AppState,
  bot: &ReplyBot,
  panel: Panel,
) -> ResponseResult<()> {
  let sv = app.sv();

  match panel {
    Panel::Home => {
      app.dialogs.clear(bot.user_id);
      bot
        .edit_with_keyboard("🛠 <b>Admin panel</b>", keyboard::admin_menu())
        .await
    }
    Panel::Pending => {
      let users = match sv.user.pending().await {
        Ok(users) => users,
        Err(err) => return bot.reply_error(&err).await,
      };
      if users.is_empty() {
        return bot
          .edit_with_keyboard(
            "No users waiting for approval.",
            keyboard::back_to_panel(),
          )
          .await;
      }

      for user in &users {
        bot
          .reply_with_keyboard(
            view::user_card(user),
            keyboard::review_user(user.tg_user_id),
          )
          .await?;
      }
      Ok(())
    }
    Panel::TopUps => {
      let requests = match sv.purchase.pending().await {
        Ok(requests) => requests,
        Err(err) => return bot.reply_error(&err).await,
      };
      if requests.is_empty() {
        return bot
          .edit_with_keyboard(
            "No pending top-up requests.",
            keyboard::back_to_panel(),
          )
          .await;
      }

      for request in &requests {
        bot
          .reply_with_keyboard(
            view::pending_topup(request),
            keyboard::review_topup(request.id),
          )
          .await?;
      }
      Ok(())
    }
    Panel::Charge => {
      prompt(
        app,
        bot,
        Dialog::ChargeUser,
        "Send user ID and amount, e.g. <code>123456789 10000</code>:",
      )
      .await
    }
    Panel::Deduct => {
      prompt(
        app,
        bot,
        Dialog::DeductUser,
        "Send user ID and amount to deduct, e.g. <code>123456789 10000</code>:",
      )
      .await
    }
    Panel::AddDiscount => {
      prompt(
        app,
        bot,
        Dialog::AddDiscount,
        "Send code and value, e.g. <code>vip50 5000</code>:",
      )
      .await
    }
    Panel::RemoveDiscount => {
      prompt(app, bot, Dialog::RemoveDiscount, "Send the code to remove:")
        .await
    }
    Panel::ListDiscounts => match sv.discount.all().await {
      Ok(codes) => {
        let text = view::discounts(&codes);
        bot.edit_with_keyboard(text, keyboard::back_to_panel()).await
      }
      Err(err) => bot.reply_error(&err).await,
    },
    Panel::AddService => {
      let services = match sv.catalog.all().await {
        Ok(services) => services,
        Err(err) => return bot.reply_error(&err).await,
      };
      app.dialogs.set(bot.user_id, Dialog::ServiceType);
      bot
        .edit_with_keyboard(
          "📦 Pick a service to update, or send a new service name:",
          keyboard::admin_services(&services, false),
        )
        .await
    }
    Panel::SetPrice => {
      let services = match sv.catalog.all().await {
        Ok(services) => services,
        Err(err) => return bot.reply_error(&err).await,
      };
      let text = if services.is_empty() {
        "No services yet. Add one first."
      } else {
        "🏷 Pick a service:"
      };
      bot
        .edit_with_keyboard(text, keyboard::admin_services(&services, true))
        .await
    }
    Panel::Broadcast => {
      prompt(app, bot, Dialog::Broadcast, "📢 Send the message for all users:")
        .await
    }
    Panel::Chat => {
      prompt(app, bot, Dialog::ChatTarget, "Send the user ID to chat with:")
        .await
    }
  }
}

async fn review_user(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  approve: bool,
) -> ResponseResult<()> {
  if let Err(err) = app.sv().user.set_approved(target, approve).await {
    return bot.reply_error(&err).await;
  }
  info!("User {} approved: {}", target, approve);

  let (note, reply) = if approve {
    ("✅ Your account was approved. Welcome!", "approved")
  } else {
    ("❌ Your registration was rejected by the admin.", "rejected")
  };

  let delivery = bot
    .notifier()
    .text(target, note, approve.then(|| keyboard::main_menu(false)))
    .await;

  let mut text = format!("User <code>{target}</code> {reply}.");
  if !delivery.is_delivered() {
    text.push_str(&format!("\n⚠️ Not notified: {}.", delivery.describe()));
  }
  bot.edit_with_keyboard(text, keyboard::back_to_panel()).await
}

async fn review_topup(
  app: &AppState,
  bot: &ReplyBot,
  id: i32,
  approve: bool,
) -> ResponseResult<()> {
  let purchase = app.sv().purchase;

  let (request, note) = if approve {
    match purchase.approve(id).await {
      Ok(approved) => {
        let note = format!(
          "✅ Your top-up of {} was approved.\n{}",
          utils::format_credit(approved.request.amount),
          view::credit(approved.balance)
        );
        (approved.request, note)
      }
      Err(err) => return bot.reply_error(&err).await,
    }
  } else {
    match purchase.reject(id).await {
      Ok(request) => {
        let note = format!(
          "❌ Your top-up request #{} of {} was rejected.",
          request.id,
          utils::format_credit(request.amount)
        );
        (request, note)
      }
      Err(err) => return bot.reply_error(&err).await,
    }
  };
  info!("Top-up #{} is now {:?}", request.id, request.status);

  bot.notifier().text(request.user_id, note, None).await;

  bot
    .edit_with_keyboard(
      format!(
        "Request #{} for <code>{}</code> ({}): {}.",
        request.id,
        request.user_id,
        utils::format_credit(request.amount),
        if approve { "approved" } else { "rejected" }
      ),
      keyboard::back_to_panel(),
    )
    .await
}

async fn deliver_stored(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
) -> ResponseResult<()> {
  let Some(service_type) = app.service_requests.get(target) else {
    bot.reply_html("No open service request for this user.").await?;
    return Ok(());
  };

  let service = match app.sv().catalog.by_type(&service_type).await {
    Ok(Some(service)) if service.has_content() => service,
    Ok(_) => {
      bot
        .reply_html(format!(
          "Nothing stored for <b>{}</b>. Use \"Send custom\" instead.",
          html::escape(&service_type)
        ))
        .await?;
      return Ok(());
    }
    Err(err) => return bot.reply_error(&err).await,
  };

  let notifier = bot.notifier();
  let delivery = if service.is_file {
    let caption = view::delivered_service(Some(&service_type), "");
    notifier.document(target, &service.content, caption).await
  } else {
    let text = view::delivered_service(Some(&service_type), &service.content);
    notifier.text(target, text, None).await
  };

  finish_delivery(app, bot, target, delivery).await
}

async fn finish_delivery(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  delivery: Delivery,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);

  if delivery.is_delivered() {
    app.service_requests.take(target);
    info!("Service delivered to {}", target);
    done(bot, format!("✅ Service sent to <code>{target}</code>.")).await
  } else {
    done(bot, format!("❌ Not delivered: {}.", delivery.describe())).await
  }
}

pub async fn on_input(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  input: Input,
) -> ResponseResult<()> {
  match (dialog, input) {
    (Dialog::ServiceContent { service_type }, input) => {
      store_content(app, bot, &service_type, input).await
    }
    (Dialog::DeliverService { target, service_type }, input) => {
      deliver_custom(app, bot, target, service_type.as_deref(), input).await
    }
    (Dialog::Chat { target }, input) => chat(app, bot, target, input).await,
    (dialog, Input::Text(text)) => on_text(app, bot, dialog, &text).await,
    (_, _) => {
      bot.reply_html("Please send a text message, or /cancel.").await?;
      Ok(())
    }
  }
}

async fn on_text(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  text: &str,
) -> ResponseResult<()> {
  let sv = app.sv();

  match dialog {
    Dialog::ChargeUser => match utils::parse_id_amount(text) {
      Ok((target, amount)) => charge(app, bot, target, amount, true).await,
      Err(err) => bot.reply_error(&err).await,
    },
    Dialog::ChargeAmount { target } => match utils::parse_amount(text) {
      Ok(amount) => charge(app, bot, target, amount, true).await,
      Err(err) => bot.reply_error(&err).await,
    },
    Dialog::DeductUser => match utils::parse_id_amount(text) {
      Ok((target, amount)) => charge(app, bot, target, amount, false).await,
      Err(err) => bot.reply_error(&err).await,
    },
    Dialog::DeductAmount { target } => match utils::parse_amount(text) {
      Ok(amount) => charge(app, bot, target, amount, false).await,
      Err(err) => bot.reply_error(&err).await,
    },
    Dialog::AddDiscount => {
      app.dialogs.clear(bot.user_id);
      let saved = match utils::parse_code_value(text) {
        Ok((code, value)) => sv.discount.upsert(&code, value).await,
        Err(err) => Err(err),
      };
      match saved {
        Ok(code) => {
          done(
            bot,
            format!(
              "✅ Code <code>{}</code> saved ({}).",
              html::escape(&code.code),
              utils::format_credit(code.value)
            ),
          )
          .await
        }
        Err(err) => bot.reply_error(&err).await,
      }
    }
    Dialog::RemoveDiscount => {
      app.dialogs.clear(bot.user_id);
      match sv.discount.remove(text.trim()).await {
        Ok(()) => done(bot, "✅ Code removed.").await,
        Err(err) => bot.reply_error(&err).await,
      }
    }
    Dialog::ServiceType => {
      match sv::Catalog::validate_type(text) {
        Ok(service_type) => {
          let service_type = service_type.to_string();
          let text = format!(
            "Send the link or text for <b>{}</b>, or upload a file:",
            html::escape(&service_type)
          );
          prompt(app, bot, Dialog::ServiceContent { service_type }, text)
            .await
        }
        // stays in the step so the admin can retry
        Err(err) => bot.reply_error(&err).await,
      }
    }
    Dialog::ServicePrice { service_type } => {
      app.dialogs.clear(bot.user_id);
      let saved = match utils::parse_price(text) {
        Ok(price) => sv.catalog.set_price(&service_type, price).await,
        Err(err) => Err(err),
      };
      match saved {
        Ok(service) => {
          done(
            bot,
            format!(
              "✅ <b>{}</b> now costs {}.",
              html::escape(&service.service_type),
              utils::format_credit(service.price)
            ),
          )
          .await
        }
        Err(err) => bot.reply_error(&err).await,
      }
    }
    Dialog::Broadcast => {
      app.dialogs.clear(bot.user_id);
      broadcast(app, bot, text).await
    }
    Dialog::ChatTarget => {
      let found = match utils::parse_id(text) {
        Ok(target) => {
          sv.user.by_id(target).await.map(|user| user.map(|_| target))
        }
        Err(err) => Err(err),
      };
      match found {
        Ok(Some(target)) => {
          let text = format!(
            "💬 Chatting with <code>{target}</code>. Send your message:"
          );
          prompt(app, bot, Dialog::Chat { target }, text).await
        }
        Ok(None) => {
          app.dialogs.clear(bot.user_id);
          bot.reply_error(&Error::UserNotFound).await
        }
        Err(err) => {
          app.dialogs.clear(bot.user_id);
          bot.reply_error(&err).await
        }
      }
    }
    other => {
      debug!("Dialog {:?} is not an admin text step", other);
      Ok(())
    }
  }
}

async fn charge(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  amount: i64,
  add: bool,
) -> ResponseResult<()> {
  app.dialogs.clear(bot.user_id);
  let balance = app.sv().balance;

  let result = if add {
    balance.charge(target, amount).await
  } else {
    balance.deduct(target, amount).await
  };
  let new_balance = match result {
    Ok(new_balance) => new_balance,
    Err(err) => return bot.reply_error(&err).await,
  };
  let sign = if add { '+' } else { '-' };
  info!("Admin changed credit of {} by {}{}", target, sign, amount);

  let note = if add {
    format!("➕ {} was added to your credit.", utils::format_credit(amount))
  } else {
    let amount = utils::format_credit(amount);
    format!("➖ {amount} was deducted from your credit.")
  };
  bot
    .notifier()
    .text(target, format!("{note}\n{}", view::credit(new_balance)), None)
    .await;

  done(
    bot,
    format!(
      "✅ Credit of <code>{target}</code> is now {}.",
      utils::format_credit(new_balance)
    ),
  )
  .await
}

async fn store_content(
  app: &AppState,
  bot: &ReplyBot,
  service_type: &str,
  input: Input,
) -> ResponseResult<()> {
  let (content, is_file) = match input {
    Input::Text(text) => (text, false),
    Input::Document { file_id } => (file_id, true),
    _ => {
      bot.reply_html("Send a text, a link or a file, or /cancel.").await?;
      return Ok(());
    }
  };

  app.dialogs.clear(bot.user_id);
  match app.sv().catalog.upsert_content(service_type, &content, is_file).await
  {
    Ok(service) => {
      info!("Service {} updated", service.service_type);
      done(
        bot,
        format!(
          "✅ <b>{}</b> saved ({}).",
          html::escape(&service.service_type),
          if is_file { "file" } else { "text" }
        ),
      )
      .await
    }
    Err(err) => bot.reply_error(&err).await,
  }
}

async fn deliver_custom(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  service_type: Option<&str>,
  input: Input,
) -> ResponseResult<()> {
  let notifier = bot.notifier();

  let delivery = match input {
    Input::Text(text) => {
      notifier
        .text(target, view::delivered_service(service_type, &text), None)
        .await
    }
    Input::Document { file_id } => {
      notifier
        .document(target, &file_id, view::delivered_service(service_type, ""))
        .await
    }
    _ => {
      bot.reply_html("Send a text, a link or a file, or /cancel.").await?;
      return Ok(());
    }
  };

  finish_delivery(app, bot, target, delivery).await
}

async fn chat(
  app: &AppState,
  bot: &ReplyBot,
  target: i64,
  input: Input,
) -> ResponseResult<()> {
  let notifier = bot.notifier();

  let delivery = match input {
    Input::Text(text) => {
      notifier.text(target, view::from_admin(&text), None).await
    }
    Input::Document { file_id } => {
      notifier.document(target, &file_id, "💬 <b>File from admin</b>").await
    }
    _ => {
      bot.reply_html("Send a text or a file, or /cancel.").await?;
      return Ok(());
    }
  };
  app.dialogs.clear(bot.user_id);

  if delivery.is_delivered() {
    done(bot, "✅ Message sent.").await
  } else {
    done(bot, format!("❌ Not delivered: {}.", delivery.describe())).await
  }
}

async fn broadcast(
  app: &AppState,
  bot: &ReplyBot,
  text: &str,
) -> ResponseResult<()> {
  let ids = match app.sv().user.all_ids().await {
    Ok(ids) => ids,
    Err(err) => return bot.reply_error(&err).await,
  };

  let body = format!("📢 {}", html::escape(text));
  let notifier = bot.notifier();
  let (mut sent, mut blocked, mut failed) = (0, 0, 0);

  for id in ids {
    match notifier.text(id, body.clone(), None).await {
      Delivery::Delivered => sent += 1,
      Delivery::Blocked => blocked += 1,
      Delivery::Failed => failed += 1,
    }
    tokio::time::sleep(BROADCAST_DELAY).await;
  }
  info!(
    "Broadcast done: {} sent, {} blocked, {} failed",
    sent, blocked, failed
  );

  done(
    bot,
    format!(
      "📢 Broadcast finished.\nSent: {sent}\nBlocked: {blocked}\nFailed: {failed}"
    ),
  )
  .await
}
