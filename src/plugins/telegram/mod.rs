mod admin;
mod callback;
mod command;
mod keyboard;
mod notify;
mod user;
mod view;

use std::sync::Arc;

use command::{AdminCommand, Command, UserCommand};
use notify::Notifier;
use teloxide::{
  Bot,
  dispatching::{Dispatcher, HandlerExt, UpdateFilterExt},
  prelude::*,
  types::{
    BotCommandScope, CallbackQuery, ChatId, InlineKeyboardMarkup, Message,
    MessageId, ParseMode, ReplyMarkup, Update,
  },
  utils::command::BotCommands,
};

use crate::{dialog::Dialog, prelude::*, state::AppState};

pub struct Plugin;

#[async_trait::async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    run_bot(app).await;
    Ok(())
  }
}

/// Users see only user commands, the admin sees both.
async fn setup_commands(bot: &Bot, admin_id: i64) {
  if let Err(e) = bot
    .set_my_commands(UserCommand::bot_commands())
    .scope(BotCommandScope::Default)
    .await
  {
    warn!("Failed to set default commands: {}", e);
  }

  let mut admin_commands = UserCommand::bot_commands();
  admin_commands.extend(AdminCommand::bot_commands());

  if let Err(e) = bot
    .set_my_commands(admin_commands)
    .scope(BotCommandScope::Chat { chat_id: ChatId(admin_id).into() })
    .await
  {
    warn!("Failed to set admin commands for {}: {}", admin_id, e);
  }
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();
  setup_commands(&bot, app.config.admin_id).await;

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        let app = app.clone();
        command_handle(app, bot, msg, cmd)
      }
    }))
    .branch(Update::filter_message().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message| {
        let app = app.clone();
        message_handle(app, bot, msg)
      }
    }))
    .branch(Update::filter_callback_query().endpoint({
      let app = app.clone();
      move |bot: Bot, query: CallbackQuery| {
        let app = app.clone();
        callback_handle(app, bot, query)
      }
    }));

  Dispatcher::builder(bot, handler)
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

async fn command_handle(
  app: Arc<AppState>,
  bot: Bot,
  msg: Message,
  cmd: Command,
) -> ResponseResult<()> {
  let Some(from) = msg.from.as_ref().filter(|_| msg.chat.is_private()) else {
    return Ok(());
  };

  debug!("Command {:?} from {}", cmd, from.id);
  let username = from.username.clone();
  let bot = ReplyBot::new(bot, from.id.0 as i64, msg.chat.id, msg.id);
  command::handle(app, bot, cmd, username).await
}

/// What a user sent while inside a dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
  Text(String),
  Contact { user_id: Option<i64>, phone: String },
  Document { file_id: String },
  Other,
}

impl Input {
  fn from_message(msg: &Message) -> Self {
    if let Some(contact) = msg.contact() {
      Input::Contact {
        user_id: contact.user_id.map(|id| id.0 as i64),
        phone: contact.phone_number.clone(),
      }
    } else if let Some(document) = msg.document() {
      Input::Document { file_id: document.file.id.0.clone() }
    } else if let Some(text) = msg.text() {
      Input::Text(text.to_string())
    } else {
      Input::Other
    }
  }
}

async fn message_handle(
  app: Arc<AppState>,
  bot: Bot,
  msg: Message,
) -> ResponseResult<()> {
  let Some(from) = msg.from.as_ref().filter(|_| msg.chat.is_private()) else {
    return Ok(());
  };

  let bot = ReplyBot::new(bot, from.id.0 as i64, msg.chat.id, msg.id);
  let input = Input::from_message(&msg);

  if let Input::Text(text) = &input
    && text.starts_with('/')
  {
    bot.reply_html("Unknown command. Use /start or /cancel.").await?;
    return Ok(());
  }

  let Some(dialog) = app.dialogs.get(bot.user_id) else {
    bot.reply_html("Use /start to open the menu.").await?;
    return Ok(());
  };

  route(&app, &bot, dialog, input).await
}

async fn route(
  app: &AppState,
  bot: &ReplyBot,
  dialog: Dialog,
  input: Input,
) -> ResponseResult<()> {
  if !dialog.is_admin_only() {
    return user::on_input(app, bot, dialog, input).await;
  }

  if !app.is_admin(bot.user_id) {
    warn!("User {} was parked in admin step {:?}", bot.user_id, dialog);
    app.dialogs.clear(bot.user_id);
    return Ok(());
  }
  admin::on_input(app, bot, dialog, input).await
}

async fn callback_handle(
  app: Arc<AppState>,
  bot: Bot,
  query: CallbackQuery,
) -> ResponseResult<()> {
  if let Some(data) = query.data
    && let Some(msg) = query.message.as_ref()
  {
    let bot =
      ReplyBot::new(bot, query.from.id.0 as i64, msg.chat().id, msg.id());

    // answer callback to remove loading state
    bot.inner.answer_callback_query(query.id.clone()).await?;

    callback::handle(app, bot, &data).await
  } else {
    Ok(())
  }
}

#[derive(Debug, Clone)]
struct ReplyBot {
  inner: Bot,
  pub user_id: i64,
  pub chat_id: ChatId,
  pub message_id: MessageId,
}

impl ReplyBot {
  pub fn new(
    inner: Bot,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
  ) -> Self {
    Self { inner, user_id, chat_id, message_id }
  }

  async fn reply_html(
    &self,
    text: impl Into<String>,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .await
  }

  async fn reply_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: impl Into<ReplyMarkup>,
  ) -> ResponseResult<Message> {
    self
      .inner
      .send_message(self.chat_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await
  }

  pub async fn edit_with_keyboard(
    &self,
    text: impl Into<String>,
    keyboard: InlineKeyboardMarkup,
  ) -> ResponseResult<()> {
    self
      .inner
      .edit_message_text(self.chat_id, self.message_id, text.into())
      .parse_mode(ParseMode::Html)
      .reply_markup(keyboard)
      .await?;
    Ok(())
  }

  /// Shows a failed operation to the user, logging storage failures.
  async fn reply_error(&self, err: &Error) -> ResponseResult<()> {
    if err.is_internal() {
      error!("Request from {} failed: {}", self.user_id, err);
    } else {
      debug!("Rejected request from {}: {}", self.user_id, err);
    }

    self.reply_html(format!("❌ {}", err.user_message())).await?;
    Ok(())
  }

  fn notifier(&self) -> Notifier<'_> {
    Notifier::new(&self.inner)
  }
}
