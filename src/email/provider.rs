//! Email provider trait and error types

use crate::domain::Delivery;
use crate::error::BoxError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Email provider error types
#[derive(Error, Debug)]
pub enum EmailProviderError {
    #[error("Email provider not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Rate limited")]
    RateLimited,

    /// Failure raised by a custom provider
    #[error(transparent)]
    Other(#[from] BoxError),
}

/// Delivery capability.
///
/// `Receipt` is whatever the provider reports on success; the mailer hands it
/// back to the caller untouched.
#[cfg_attr(test, mockall::automock(type Receipt = crate::domain::EmailSendResult;))]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    type Receipt: Send + 'static;

    /// Deliver one rendered email
    async fn send(&self, delivery: Delivery) -> Result<Self::Receipt, EmailProviderError>;

    /// Test connection to the email provider
    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        Ok(())
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T> EmailProvider for Box<T>
where
    T: EmailProvider + ?Sized,
{
    type Receipt = T::Receipt;

    async fn send(&self, delivery: Delivery) -> Result<Self::Receipt, EmailProviderError> {
        (**self).send(delivery).await
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        (**self).test_connection().await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

#[async_trait]
impl<T> EmailProvider for Arc<T>
where
    T: EmailProvider + ?Sized,
{
    type Receipt = T::Receipt;

    async fn send(&self, delivery: Delivery) -> Result<Self::Receipt, EmailProviderError> {
        (**self).send(delivery).await
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        (**self).test_connection().await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}
