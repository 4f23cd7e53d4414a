//! AWS SES email provider implementation
//!
//! Provides email sending via AWS Simple Email Service (SES) v2 API.

use super::provider::{EmailProvider, EmailProviderError};
use crate::domain::{Delivery, EmailAddress, EmailSendResult, SesConfig};
use async_trait::async_trait;
use aws_sdk_sesv2::{
    config::Region,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{Body, Content, Destination, EmailContent, Message},
    Client,
};
use std::fmt::Debug;

/// AWS SES email provider
///
/// Supports:
/// - IAM role credentials (when running in AWS)
/// - Explicit access key credentials
/// - Configuration sets for tracking, overridable per mailer with the
///   `configuration_set` send option
pub struct SesEmailProvider {
    client: Client,
    configuration_set: Option<String>,
}

impl SesEmailProvider {
    /// Create a new SES provider from configuration
    ///
    /// This is an async operation because AWS SDK needs to load credentials.
    pub async fn from_config(config: &SesConfig) -> Result<Self, EmailProviderError> {
        let region = Region::new(config.region.clone());
        let loader = aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

        let sdk_config = if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials = aws_sdk_sesv2::config::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None, // session token
                None, // expiration
                "gitevents-mailer-ses",
            );
            loader.credentials_provider(credentials).load().await
        } else {
            // Default credential chain (IAM role, env vars, etc.)
            loader.load().await
        };

        Ok(Self {
            client: Client::new(&sdk_config),
            configuration_set: config.configuration_set.clone(),
        })
    }
}

/// RFC 5322 specials that force the display name into a quoted string
const NAME_SPECIALS: &[char] = &['(', ')', '<', '>', '[', ']', ':', ';', '@', '\\', ',', '.', '"'];

fn format_mailbox(addr: &EmailAddress) -> String {
    if addr.name.contains(NAME_SPECIALS) {
        let quoted = addr.name.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\" <{}>", quoted, addr.address)
    } else {
        format!("{} <{}>", addr.name, addr.address)
    }
}

fn format_list(addrs: Option<&Vec<EmailAddress>>) -> Option<Vec<String>> {
    addrs.map(|addrs| addrs.iter().map(format_mailbox).collect())
}

fn destination(delivery: &Delivery) -> Result<Destination, EmailProviderError> {
    if delivery.to.is_empty() {
        return Err(EmailProviderError::InvalidConfiguration(
            "No recipients specified".to_string(),
        ));
    }

    Ok(Destination::builder()
        .set_to_addresses(format_list(Some(&delivery.to)))
        .set_cc_addresses(format_list(delivery.cc.as_ref()))
        .set_bcc_addresses(format_list(delivery.bcc.as_ref()))
        .build())
}

fn utf8(data: &str) -> Result<Content, EmailProviderError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| EmailProviderError::InvalidConfiguration(e.to_string()))
}

fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> EmailProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) => {
            EmailProviderError::ConnectionError(message)
        }
        _ => classify_error(err.code(), message),
    }
}

fn classify_error(code: Option<&str>, message: String) -> EmailProviderError {
    match code {
        Some(
            "AccessDeniedException"
            | "UnrecognizedClientException"
            | "InvalidClientTokenId"
            | "SignatureDoesNotMatch",
        ) => EmailProviderError::AuthenticationFailed(message),
        Some("TooManyRequestsException" | "ThrottlingException" | "LimitExceededException") => {
            EmailProviderError::RateLimited
        }
        _ => EmailProviderError::SendFailed(message),
    }
}

#[async_trait]
impl EmailProvider for SesEmailProvider {
    type Receipt = EmailSendResult;

    async fn send(&self, delivery: Delivery) -> Result<EmailSendResult, EmailProviderError> {
        let destination = destination(&delivery)?;

        let body = Body::builder()
            .html(utf8(&delivery.bodies.html)?)
            .text(utf8(&delivery.bodies.text)?)
            .build();
        let ses_message = Message::builder()
            .subject(utf8(&delivery.subject)?)
            .body(body)
            .build();
        let email_content = EmailContent::builder().simple(ses_message).build();

        let configuration_set = delivery
            .option_str("configuration_set")
            .map(str::to_owned)
            .or_else(|| self.configuration_set.clone());

        let response = self
            .client
            .send_email()
            .from_email_address(format_mailbox(&delivery.from))
            .destination(destination)
            .content(email_content)
            .set_configuration_set_name(configuration_set)
            .send()
            .await
            .map_err(classify_sdk_error)?;

        Ok(EmailSendResult::new(response.message_id))
    }

    async fn test_connection(&self) -> Result<(), EmailProviderError> {
        // Fetching account details validates credentials and connectivity
        self.client
            .get_account()
            .send()
            .await
            .map(|_| ())
            .map_err(|e| match classify_sdk_error(e) {
                EmailProviderError::SendFailed(msg) => EmailProviderError::ConnectionError(
                    format!("Failed to connect to SES: {}", msg),
                ),
                other => other,
            })
    }

    fn provider_name(&self) -> &'static str {
        "ses"
    }
}
