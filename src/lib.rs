//! GitEvents Mailer
//!
//! Binds a pluggable email renderer to a pluggable delivery provider behind
//! a single `send(to, data)` operation. Send parameters (`from`, `cc`,
//! `bcc`, `options`) are validated once, when the mailer is built.

pub mod config;
pub mod domain;
pub mod email;
pub mod error;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use domain::{
    Delivery, EmailAddress, EmailBodies, EmailSendResult, RenderedContent, SendParameters,
};
pub use email::{EmailProvider, EmailRenderer, Mailer, MailerFactory};
pub use error::{ConfigError, MailerError, Result};
