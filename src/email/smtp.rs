//! SMTP email provider implementation using lettre

use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{Delivery, EmailAddress, EmailSendResult, SmtpConfig};
use async_trait::async_trait;
use lettre::{
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// SMTP-based email provider
///
/// Honors the `reply_to` send option (`"Name <address>"` or a bare address).
pub struct SmtpEmailProvider {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailProvider {
    /// Create a new SMTP provider from configuration
    pub fn from_config(config: &SmtpConfig) -> Result<Self, EmailProviderError> {
        let mut builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
        };

        builder = builder.port(config.port);

        // Add credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.clone());
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
        })
    }
}

fn mailbox(addr: &EmailAddress, role: &str) -> Result<Mailbox, EmailProviderError> {
    let address = addr.address.parse().map_err(|e| {
        EmailProviderError::InvalidConfiguration(format!("Invalid {} address: {}", role, e))
    })?;
    Ok(Mailbox::new(Some(addr.name.clone()), address))
}

/// Build the MIME message for a delivery
pub(crate) fn build_message(delivery: &Delivery) -> Result<Message, EmailProviderError> {
    if delivery.to.is_empty() {
        return Err(EmailProviderError::InvalidConfiguration(
            "No recipients specified".to_string(),
        ));
    }

    let mut builder = Message::builder()
        .from(mailbox(&delivery.from, "from")?)
        .subject(delivery.subject.as_str());

    for to in &delivery.to {
        builder = builder.to(mailbox(to, "to")?);
    }
    for cc in delivery.cc.iter().flatten() {
        builder = builder.cc(mailbox(cc, "cc")?);
    }
    for bcc in delivery.bcc.iter().flatten() {
        builder = builder.bcc(mailbox(bcc, "bcc")?);
    }

    if let Some(reply_to) = delivery.option_str("reply_to") {
        let reply_to: Mailbox = reply_to.parse().map_err(|e| {
            EmailProviderError::InvalidConfiguration(format!("Invalid reply_to address: {}", e))
        })?;
        builder = builder.reply_to(reply_to);
    }

    builder
        .multipart(MultiPart::alternative_plain_html(
            delivery.bodies.text.clone(),
            delivery.bodies.html.clone(),
        ))
        .map_err(|e| EmailProviderError::SendFailed(e.to_string()))
}

#[async_trait]
impl EmailProvider for SmtpEmailProvider {
    type Receipt = EmailSendResult;

    async fn send(&self, delivery: Delivery) -> Result<EmailSendResult, EmailProviderError> {
        let email = build_message(&delivery)?;

        match self.transport.send(email).await {
            Ok(response) => {
                let message_id = response.message().next().map(|s| s.to_string());
                Ok(EmailSendResult::new(message_id))
            }
            Err(e) => {
                let error_msg = e.to_string();
                if error_msg.contains("authentication") || error_msg.contains("AUTH") {
                    Err(EmailProviderError::AuthenticationFailed(error_msg))
                } else if error_msg.contains("connection") || error_msg.contains("timeout") {
                    Err(EmailProviderError::ConnectionError(error_msg))
                } else {
                    Err(EmailProviderError::SendFailed(error_msg))
                }
            }
        }
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        self.transport
            .test_connection()
            .await
            .map(|_| ())
            .map_err(|e| {
                let error_msg = e.to_string();
                if error_msg.contains("authentication") || error_msg.contains("AUTH") {
                    EmailProviderError::AuthenticationFailed(error_msg)
                } else {
                    EmailProviderError::ConnectionError(error_msg)
                }
            })
    }

    fn provider_name(&self) -> &'static str {
        "smtp"
    }
}
