pub mod error;
pub mod gateway;
pub mod messages;
pub mod models;
pub mod service;

pub use error::NotificationError;
pub use gateway::{MockSmsGateway, SmsGateway};
pub use models::{AppointmentNotice, NotificationKind, SmsReceipt};
pub use service::NotificationService;
