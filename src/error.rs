use sea_orm::DbErr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] DbErr),

  #[error("user not found")]
  UserNotFound,
  #[error("user is not approved")]
  NotApproved,

  #[error("invalid recipient")]
  InvalidRecipient,
  #[error("cannot transfer to yourself")]
  SelfTransfer,
  #[error("insufficient balance")]
  InsufficientBalance,

  #[error("discount code not found")]
  CodeNotFound,
  #[error("discount already used")]
  DiscountAlreadyUsed,

  #[error("service not found")]
  ServiceNotFound,

  #[error("purchase request not found")]
  RequestNotFound,
  #[error("purchase request already processed")]
  AlreadyProcessed,

  #[error("{0}")]
  InvalidArgs(String),
}

impl Error {
  /// Text safe to show in chat. Storage failures never leak details.
  pub fn user_message(&self) -> String {
    match self {
      Error::Db(_) => "System error, please try again later.".into(),
      Error::UserNotFound => "User not found.".into(),
      Error::NotApproved => {
        "Your registration is not complete or not approved by the admin yet."
          .into()
      }
      Error::InvalidRecipient => "Invalid recipient ID.".into(),
      Error::SelfTransfer => "You cannot transfer credit to yourself.".into(),
      Error::InsufficientBalance => "Your balance is not enough.".into(),
      Error::CodeNotFound => "Invalid discount code.".into(),
      Error::DiscountAlreadyUsed => {
        "You have already used a discount code.".into()
      }
      Error::ServiceNotFound => "Service not found.".into(),
      Error::RequestNotFound => "Request not found.".into(),
      Error::AlreadyProcessed => {
        "This request has already been processed.".into()
      }
      Error::InvalidArgs(msg) => msg.clone(),
    }
  }

  pub fn is_internal(&self) -> bool {
    matches!(self, Error::Db(_))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn db_errors_are_hidden_from_users() {
    let err = Error::Db(DbErr::Custom("UNIQUE constraint failed".into()));
    assert!(err.is_internal());
    assert!(!err.user_message().contains("UNIQUE"));
  }

  #[test]
  fn invalid_args_are_shown_verbatim() {
    let err = Error::InvalidArgs("Amount must be positive".into());
    assert_eq!(err.user_message(), "Amount must be positive");
    assert!(!err.is_internal());
  }
}
