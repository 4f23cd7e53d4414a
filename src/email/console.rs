//! Provider that logs deliveries instead of sending them

use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{Delivery, EmailSendResult};
use async_trait::async_trait;
use tracing::info;

/// Dry-run provider: every delivery becomes one `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailProvider;

#[async_trait]
impl EmailProvider for LogEmailProvider {
    type Receipt = EmailSendResult;

    async fn send(&self, delivery: Delivery) -> Result<EmailSendResult, EmailProviderError> {
        let to = delivery
            .to
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            from = %delivery.from,
            to = %to,
            cc = delivery.cc.as_ref().map_or(0, Vec::len),
            bcc = delivery.bcc.as_ref().map_or(0, Vec::len),
            subject = %delivery.subject,
            text = %delivery.bodies.text,
            "Email not sent (log provider)"
        );

        Ok(EmailSendResult::default())
    }

    fn provider_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailAddress, EmailBodies};

    #[tokio::test]
    async fn test_log_provider_returns_empty_receipt() {
        let delivery = Delivery {
            from: EmailAddress::new("Ivan", "ivan@te.st"),
            to: vec![EmailAddress::new("Bill", "bill@te.st")],
            cc: None,
            bcc: None,
            subject: "S".to_string(),
            bodies: EmailBodies {
                html: "H".to_string(),
                text: "T".to_string(),
            },
            options: None,
        };

        let provider = LogEmailProvider;
        assert_eq!(provider.provider_name(), "log");
        assert!(provider.test_connection().await.is_ok());
        assert_eq!(provider.send(delivery).await.unwrap(), EmailSendResult::default());
    }
}
