//! Builds a provider from configuration

use super::console::LogEmailProvider;
use super::provider::{EmailProvider, EmailProviderError};
use super::ses::SesEmailProvider;
use super::smtp::SmtpEmailProvider;
use crate::domain::{EmailProviderConfig, EmailSendResult};
use validator::Validate;

/// Any of the bundled providers
pub type DynEmailProvider = Box<dyn EmailProvider<Receipt = EmailSendResult>>;

/// Instantiate the provider selected by `config`
pub async fn create_provider(
    config: &EmailProviderConfig,
) -> Result<DynEmailProvider, EmailProviderError> {
    match config {
        EmailProviderConfig::None => Err(EmailProviderError::NotConfigured),
        EmailProviderConfig::Smtp(smtp_config) => {
            smtp_config
                .validate()
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;
            Ok(Box::new(SmtpEmailProvider::from_config(smtp_config)?))
        }
        EmailProviderConfig::Ses(ses_config) => {
            ses_config
                .validate()
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?;
            Ok(Box::new(SesEmailProvider::from_config(ses_config).await?))
        }
        EmailProviderConfig::Log => Ok(Box::new(LogEmailProvider)),
    }
}
