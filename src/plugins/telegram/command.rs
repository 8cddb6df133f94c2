use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use super::{ReplyBot, keyboard, user, view};
use crate::{prelude::*, state::AppState};

/// Hints shown to everyone.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum UserCommand {
  #[command(description = "open the main menu")]
  Start,
  #[command(description = "about this bot")]
  About,
  #[command(description = "show your credit")]
  Score,
  #[command(description = "show your account")]
  Myinfo,
  #[command(description = "abort the current step")]
  Cancel,
}

/// Extra hints for the admin chat.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum AdminCommand {
  #[command(description = "open the admin panel")]
  Admin,
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
  Start,
  About,
  Score,
  Myinfo,
  Admin,
  Cancel,
}

pub async fn handle(
  app: Arc<AppState>,
  bot: ReplyBot,
  cmd: Command,
  username: Option<String>,
) -> ResponseResult<()> {
  let is_admin = app.is_admin(bot.user_id);
  let sv = app.sv();

  match cmd {
    Command::Start => user::start(&app, &bot, username).await?,
    Command::About => {
      bot.reply_with_keyboard(view::ABOUT, keyboard::back_to_menu()).await?;
    }
    Command::Score => match sv.balance.get(bot.user_id).await {
      Ok(balance) => {
        bot
          .reply_with_keyboard(view::credit(balance), keyboard::back_to_menu())
          .await?;
      }
      Err(err) => bot.reply_error(&err).await?,
    },
    Command::Myinfo => match sv.user.by_id(bot.user_id).await {
      Ok(Some(user)) => {
        bot
          .reply_with_keyboard(view::status(&user), keyboard::back_to_menu())
          .await?;
      }
      Ok(None) => {
        bot.reply_html("You are not registered yet. Send /start.").await?;
      }
      Err(err) => bot.reply_error(&err).await?,
    },
    Command::Admin => {
      if !is_admin {
        warn!("User {} tried /admin", bot.user_id);
        bot.reply_html("⛔ This command is for the admin only.").await?;
        return Ok(());
      }
      app.dialogs.clear(bot.user_id);
      bot
        .reply_with_keyboard("🛠 <b>Admin panel</b>", keyboard::admin_menu())
        .await?;
    }
    Command::Cancel => {
      let text = match app.dialogs.clear(bot.user_id) {
        Some(dialog) if dialog.is_registration() => {
          "Registration paused. Send /start to continue."
        }
        Some(_) => "Operation cancelled.",
        None => "Nothing to cancel.",
      };
      bot.reply_with_keyboard(text, keyboard::main_menu(is_admin)).await?;
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_commands() {
    assert_eq!(Command::parse("/start", "bot").ok(), Some(Command::Start));
    assert_eq!(Command::parse("/myinfo", "bot").ok(), Some(Command::Myinfo));
    assert_eq!(
      Command::parse("/cancel@bot", "bot").ok(),
      Some(Command::Cancel)
    );
    assert!(Command::parse("/unknown", "bot").is_err());
  }

  #[test]
  fn test_admin_hints_are_separate() {
    let user = UserCommand::bot_commands();
    assert!(user.iter().all(|cmd| !cmd.command.ends_with("admin")));
    assert_eq!(AdminCommand::bot_commands().len(), 1);
  }
}
