//! Unified error handling for the mailer

use crate::email::{EmailProviderError, RenderError};
use thiserror::Error;

/// Boxed error used by custom collaborators
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Send-time result type
pub type Result<T, E = MailerError> = std::result::Result<T, E>;

/// Construction-time configuration errors.
///
/// These are programmer errors: no mailer is produced when one is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Options must be an object")]
    NotAnObject,

    #[error("`{field}` is required")]
    MissingRequired { field: &'static str },

    #[error("params must be an object")]
    InvalidSendParams,

    #[error("params#from must be an Object")]
    InvalidFrom,

    #[error("params#from must have `name` and `address` (missing `{field}`)")]
    MissingFromField { field: &'static str },

    #[error("params#cc and params#bcc must be an Array when provided")]
    InvalidRecipients,

    #[error("params#{field} entries must have `name` and `address`")]
    InvalidRecipient { field: &'static str },

    #[error("params#options must be an Object when provided")]
    InvalidOptions,
}

/// Send-time errors. Collaborator errors are surfaced verbatim.
#[derive(Error, Debug)]
pub enum MailerError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Provider(#[from] EmailProviderError),
}
