use std::time::Instant;

use migration::{Migrator, MigratorTrait};
use teloxide::Bot;

use crate::{config::Config, dialog::Dialogs, prelude::*, sv};

pub struct AppState {
  pub db: DatabaseConnection,
  pub bot: Bot,
  pub config: Config,
  pub dialogs: Dialogs,
  pub service_requests: ServiceRequests,
}

/// Open requests are dropped after a day without an admin answer.
const SERVICE_REQUEST_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Service type each user last requested, until the admin acts on it.
pub struct ServiceRequests {
  inner: DashMap<i64, (String, Instant)>,
  ttl: Duration,
}

impl ServiceRequests {
  pub fn new(ttl: Duration) -> Self {
    Self { inner: DashMap::new(), ttl }
  }

  pub fn open(&self, user_id: i64, service_type: String) {
    self.inner.insert(user_id, (service_type, Instant::now()));
  }

  pub fn get(&self, user_id: i64) -> Option<String> {
    self
      .inner
      .get(&user_id)
      .filter(|entry| entry.1.elapsed() < self.ttl)
      .map(|entry| entry.0.clone())
  }

  pub fn take(&self, user_id: i64) -> Option<String> {
    self
      .inner
      .remove(&user_id)
      .filter(|(_, (_, opened))| opened.elapsed() < self.ttl)
      .map(|(_, (service_type, _))| service_type)
  }

  pub fn gc(&self) -> usize {
    let before = self.inner.len();
    self.inner.retain(|_, (_, opened)| opened.elapsed() < self.ttl);
    before - self.inner.len()
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }
}

pub struct Services<'a> {
  pub user: sv::User<'a>,
  pub balance: sv::Balance<'a>,
  pub discount: sv::Discount<'a>,
  pub catalog: sv::Catalog<'a>,
  pub support: sv::Support<'a>,
  pub purchase: sv::Purchase<'a>,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = connect(&config.db_url).await?;
    Ok(Self::with_db(config, db))
  }

  pub fn with_db(config: Config, db: DatabaseConnection) -> Self {
    let bot = Bot::new(&config.token);
    let dialogs = Dialogs::new(config.dialog_ttl);

    let service_requests = ServiceRequests::new(SERVICE_REQUEST_TTL);

    Self { db, bot, config, dialogs, service_requests }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      user: sv::User::new(&self.db),
      balance: sv::Balance::new(&self.db),
      discount: sv::Discount::new(&self.db),
      catalog: sv::Catalog::new(&self.db),
      support: sv::Support::new(&self.db),
      purchase: sv::Purchase::new(&self.db),
    }
  }

  pub fn is_admin(&self, user_id: i64) -> bool {
    user_id == self.config.admin_id
  }
}

/// Opens the database and brings the schema up to date.
pub async fn connect(db_url: &str) -> anyhow::Result<DatabaseConnection> {
  use anyhow::Context;

  let db = Database::connect(db_url)
    .await
    .with_context(|| format!("Failed to connect to {db_url}"))?;

  Migrator::up(&db, None).await.context("Failed to run migrations")?;
  info!("Database ready at {}", db_url);

  Ok(db)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_service_requests() {
    let requests = ServiceRequests::new(Duration::from_secs(60));
    requests.open(1, "V2Ray".into());
    requests.open(1, "OpenVPN".into());

    assert_eq!(requests.get(1), Some("OpenVPN".into()));
    assert_eq!(requests.take(1), Some("OpenVPN".into()));
    assert_eq!(requests.take(1), None);
  }

  #[test]
  fn test_ignored_requests_expire() {
    let requests = ServiceRequests::new(Duration::ZERO);
    requests.open(1, "V2Ray".into());
    requests.open(2, "V2Ray".into());

    assert_eq!(requests.get(1), None);
    assert_eq!(requests.gc(), 2);
    assert_eq!(requests.len(), 0);
  }

  #[tokio::test]
  async fn test_migrations_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bot.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());

    let db = connect(&url).await.unwrap();
    sv::User::new(&db).get_or_create(1, None).await.unwrap();
    sv::Catalog::new(&db).set_price("V2Ray", 50_000).await.unwrap();
    sv::Discount::new(&db).upsert("vip50", 5000).await.unwrap();
    sv::Purchase::new(&db).create(1, 100, "test").await.unwrap();
    sv::Support::new(&db).record(1, "hello").await.unwrap();
    drop(db);

    // reopening must not reapply anything
    let db = connect(&url).await.unwrap();
    assert_eq!(sv::User::new(&db).count().await.unwrap(), 1);
    assert_eq!(sv::Purchase::new(&db).count_pending().await.unwrap(), 1);
  }
}
