use std::sync::Arc;

use async_trait::async_trait;

use crate::{plugins::Plugin, prelude::*, state::AppState};

/// Sweeps conversation steps and service requests nobody came back to.
pub struct Gc;

#[async_trait]
impl Plugin for Gc {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
      interval.tick().await;

      let removed = app.dialogs.gc();
      if removed > 0 {
        let left = app.dialogs.len();
        debug!("Dropped {} expired dialogs, {} left", removed, left);
      }

      let removed = app.service_requests.gc();
      if removed > 0 {
        info!("Dropped {} unanswered service requests", removed);
      }
    }
  }
}
