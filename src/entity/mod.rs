pub mod code;
pub mod purchase_request;
pub mod service;
pub mod support_message;
pub mod user;

pub use purchase_request::PurchaseStatus;
pub use user::DeviceType;
