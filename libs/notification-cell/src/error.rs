use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotificationError {
    #[error("Patient has no phone number on file")]
    MissingPhone,

    #[error("SMS gateway rejected message: {0}")]
    Gateway(String),
}
