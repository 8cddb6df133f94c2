use teloxide::{
  ApiError, RequestError,
  prelude::*,
  types::{FileId, InlineKeyboardMarkup, InputFile, ParseMode},
};

use crate::prelude::*;

/// Outcome of a message to a user that did not trigger the current update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
  Delivered,
  /// The user blocked the bot or never started it.
  Blocked,
  Failed,
}

impl Delivery {
  pub fn is_delivered(self) -> bool {
    self == Delivery::Delivered
  }

  /// Short explanation for the admin.
  pub fn describe(self) -> &'static str {
    match self {
      Delivery::Delivered => "delivered",
      Delivery::Blocked => "the user blocked the bot or never started it",
      Delivery::Failed => "Telegram rejected the message",
    }
  }
}

pub fn classify(err: &RequestError) -> Delivery {
  match err {
    RequestError::Api(
      ApiError::BotBlocked
      | ApiError::UserDeactivated
      | ApiError::ChatNotFound
      | ApiError::CantInitiateConversation
      | ApiError::BotKicked,
    ) => Delivery::Blocked,
    _ => Delivery::Failed,
  }
}

fn report(chat_id: i64, result: Result<Message, RequestError>) -> Delivery {
  match result {
    Ok(_) => Delivery::Delivered,
    Err(err) => {
      let delivery = classify(&err);
      warn!("Failed to notify {}: {} ({:?})", chat_id, err, delivery);
      delivery
    }
  }
}

/// Sends to arbitrary chats and never fails the calling handler.
pub struct Notifier<'a> {
  bot: &'a Bot,
}

impl<'a> Notifier<'a> {
  pub fn new(bot: &'a Bot) -> Self {
    Self { bot }
  }

  pub async fn text(
    &self,
    chat_id: i64,
    text: impl Into<String>,
    keyboard: Option<InlineKeyboardMarkup>,
  ) -> Delivery {
    let mut request = self
      .bot
      .send_message(ChatId(chat_id), text.into())
      .parse_mode(ParseMode::Html);
    if let Some(keyboard) = keyboard {
      request = request.reply_markup(keyboard);
    }

    report(chat_id, request.await)
  }

  /// Re-sends a document Telegram already stores under `file_id`.
  pub async fn document(
    &self,
    chat_id: i64,
    file_id: &str,
    caption: impl Into<String>,
  ) -> Delivery {
    let result = self
      .bot
      .send_document(
        ChatId(chat_id),
        InputFile::file_id(FileId(file_id.to_string())),
      )
      .caption(caption.into())
      .parse_mode(ParseMode::Html)
      .await;

    report(chat_id, result)
  }
}
