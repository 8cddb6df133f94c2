pub mod balance;
pub mod catalog;
pub mod discount;
pub mod purchase;
pub mod support;
#[cfg(test)]
pub mod test_utils;
pub mod user;

pub use balance::Balance;
pub use catalog::Catalog;
pub use discount::Discount;
pub use purchase::Purchase;
pub use support::Support;
pub use user::User;
