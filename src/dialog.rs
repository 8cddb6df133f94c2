//! Per-user conversation steps.
//!
//! Every multi-message flow parks the user in exactly one [`Dialog`] step.
//! Steps carry only the scratch data they need and expire after the
//! configured TTL, so an abandoned flow never swallows later input.

use std::time::Instant;

use crate::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
  RegisterPhone,
  RegisterName,
  RegisterDevice,

  Discount,
  TransferTarget,
  TransferAmount { target: i64 },
  TopUp,
  Support,

  ChargeUser,
  ChargeAmount { target: i64 },
  DeductUser,
  DeductAmount { target: i64 },
  AddDiscount,
  RemoveDiscount,
  ServiceType,
  ServiceContent { service_type: String },
  ServicePrice { service_type: String },
  Broadcast,
  ChatTarget,
  Chat { target: i64 },
  DeliverService { target: i64, service_type: Option<String> },
}

impl Dialog {
  pub fn is_admin_only(&self) -> bool {
    !matches!(
      self,
      Dialog::RegisterPhone
        | Dialog::RegisterName
        | Dialog::RegisterDevice
        | Dialog::Discount
        | Dialog::TransferTarget
        | Dialog::TransferAmount { .. }
        | Dialog::TopUp
        | Dialog::Support
    )
  }

  pub fn is_registration(&self) -> bool {
    matches!(
      self,
      Dialog::RegisterPhone | Dialog::RegisterName | Dialog::RegisterDevice
    )
  }
}

#[derive(Debug)]
struct Entry {
  dialog: Dialog,
  touched: Instant,
}

pub struct Dialogs {
  inner: DashMap<i64, Entry>,
  ttl: Duration,
}

impl Dialogs {
  pub fn new(ttl: Duration) -> Self {
    Self { inner: DashMap::new(), ttl }
  }

  pub fn get(&self, user_id: i64) -> Option<Dialog> {
    {
      // the read guard must be gone before `remove_if`
      let entry = self.inner.get(&user_id)?;
      if entry.touched.elapsed() < self.ttl {
        return Some(entry.dialog.clone());
      }
    }

    // a fresh `set` may have landed since the read
    let expired =
      self.inner.remove_if(&user_id, |_, e| e.touched.elapsed() >= self.ttl);
    if expired.is_some() {
      debug!("Dialog of {} expired", user_id);
    }
    None
  }

  /// Replaces whatever step the user was in.
  pub fn set(&self, user_id: i64, dialog: Dialog) {
    self.inner.insert(user_id, Entry { dialog, touched: Instant::now() });
  }

  pub fn clear(&self, user_id: i64) -> Option<Dialog> {
    self.inner.remove(&user_id).map(|(_, entry)| entry.dialog)
  }

  /// Drops expired steps, returns how many were removed.
  pub fn gc(&self) -> usize {
    let before = self.inner.len();
    self.inner.retain(|_, entry| entry.touched.elapsed() < self.ttl);
    before - self.inner.len()
  }

  pub fn len(&self) -> usize {
    self.inner.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_one_step_per_user() {
    let dialogs = Dialogs::new(Duration::from_secs(60));

    dialogs.set(1, Dialog::TransferTarget);
    dialogs.set(1, Dialog::TransferAmount { target: 2 });
    dialogs.set(3, Dialog::Support);

    assert_eq!(dialogs.get(1), Some(Dialog::TransferAmount { target: 2 }));
    assert_eq!(dialogs.get(3), Some(Dialog::Support));
    assert_eq!(dialogs.len(), 2);
  }

  #[test]
  fn test_clear() {
    let dialogs = Dialogs::new(Duration::from_secs(60));
    dialogs.set(1, Dialog::Discount);

    assert_eq!(dialogs.clear(1), Some(Dialog::Discount));
    assert_eq!(dialogs.get(1), None);
    assert_eq!(dialogs.clear(1), None);
  }

  #[test]
  fn test_expired_steps_are_dropped() {
    let dialogs = Dialogs::new(Duration::ZERO);
    dialogs.set(1, Dialog::TopUp);
    dialogs.set(2, Dialog::Broadcast);

    assert_eq!(dialogs.get(1), None);
    assert_eq!(dialogs.gc(), 1);
    assert_eq!(dialogs.len(), 0);
  }

  #[test]
  fn test_fresh_step_survives_expiry_check() {
    let dialogs = Dialogs::new(Duration::from_millis(50));
    dialogs.set(1, Dialog::TopUp);
    std::thread::sleep(Duration::from_millis(60));

    dialogs.set(1, Dialog::Support);
    assert_eq!(dialogs.get(1), Some(Dialog::Support));
    assert_eq!(dialogs.gc(), 0);
  }

  #[test]
  fn test_admin_only_steps() {
    assert!(Dialog::Broadcast.is_admin_only());
    assert!(Dialog::Chat { target: 1 }.is_admin_only());
    assert!(!Dialog::TransferAmount { target: 1 }.is_admin_only());
    assert!(!Dialog::RegisterName.is_admin_only());
    assert!(Dialog::RegisterDevice.is_registration());
  }
}
