use std::env;

use anyhow::{Context, bail};

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct Config {
  pub token: String,
  pub admin_id: i64,
  pub db_url: String,
  pub port: u16,
  /// Unfinished conversation steps are dropped after this long.
  pub dialog_ttl: Duration,
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
  ) -> anyhow::Result<Self> {
    let token = lookup("TELEGRAM_BOT_TOKEN")
      .filter(|t| !t.trim().is_empty())
      .context("TELEGRAM_BOT_TOKEN not set")?;

    let admin_id = lookup("ADMIN_TELEGRAM_ID")
      .context("ADMIN_TELEGRAM_ID not set")?
      .trim()
      .parse::<i64>()
      .context("Invalid ADMIN_TELEGRAM_ID format")?;

    let db_url = lookup("DATABASE_URL")
      .unwrap_or_else(|| "sqlite:users.db?mode=rwc".into());

    let port = match lookup("PORT") {
      Some(port) => port.trim().parse().context("Invalid PORT")?,
      None => 3000,
    };

    let dialog_ttl = match lookup("DIALOG_TTL") {
      Some(ttl) => humantime::parse_duration(ttl.trim())
        .with_context(|| format!("Invalid DIALOG_TTL '{ttl}'"))?,
      None => Duration::from_secs(30 * 60),
    };

    if dialog_ttl.is_zero() {
      bail!("DIALOG_TTL must be greater than zero");
    }

    Ok(Self { token, admin_id, db_url, port, dialog_ttl })
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  fn lookup(
    vars: &[(&str, &str)],
  ) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> =
      vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| vars.get(key).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_lookup(lookup(&[
      ("TELEGRAM_BOT_TOKEN", "123:abc"),
      ("ADMIN_TELEGRAM_ID", "42"),
    ]))
    .unwrap();

    assert_eq!(config.admin_id, 42);
    assert_eq!(config.db_url, "sqlite:users.db?mode=rwc");
    assert_eq!(config.port, 3000);
    assert_eq!(config.dialog_ttl, Duration::from_secs(1800));
  }

  #[test]
  fn test_missing_token_is_fatal() {
    let result = Config::from_lookup(lookup(&[("ADMIN_TELEGRAM_ID", "42")]));
    assert!(result.is_err());

    let result = Config::from_lookup(lookup(&[
      ("TELEGRAM_BOT_TOKEN", "  "),
      ("ADMIN_TELEGRAM_ID", "42"),
    ]));
    assert!(result.is_err());
  }

  #[test]
  fn test_bad_admin_id() {
    let result = Config::from_lookup(lookup(&[
      ("TELEGRAM_BOT_TOKEN", "123:abc"),
      ("ADMIN_TELEGRAM_ID", "admin"),
    ]));
    assert!(result.is_err());
  }

  #[test]
  fn test_dialog_ttl() {
    let config = Config::from_lookup(lookup(&[
      ("TELEGRAM_BOT_TOKEN", "123:abc"),
      ("ADMIN_TELEGRAM_ID", "42"),
      ("DIALOG_TTL", "1h 30m"),
    ]))
    .unwrap();
    assert_eq!(config.dialog_ttl, Duration::from_secs(90 * 60));
  }
}
