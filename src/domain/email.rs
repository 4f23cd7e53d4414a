//! Email domain types shared by the mailer, renderers and providers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// Email provider configuration - supports multiple provider types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmailProviderConfig {
    /// No email provider configured
    #[default]
    None,

    /// SMTP email provider
    Smtp(SmtpConfig),

    /// AWS Simple Email Service
    Ses(SesConfig),

    /// Write deliveries to the log instead of sending them
    Log,
}

impl EmailProviderConfig {
    /// Check if email is configured (not None)
    pub fn is_configured(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Get the provider type as a string
    pub fn provider_type(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Smtp(_) => "smtp",
            Self::Ses(_) => "ses",
            Self::Log => "log",
        }
    }
}

/// SMTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SmtpConfig {
    /// SMTP server host
    #[validate(length(min = 1, max = 255))]
    pub host: String,

    /// SMTP server port (typically 587 for TLS, 465 for SSL, 25 for unencrypted)
    #[serde(default = "default_smtp_port")]
    pub port: u16,

    /// Username for authentication (optional)
    pub username: Option<String>,

    /// Password for authentication (optional)
    pub password: Option<String>,

    /// Use STARTTLS
    #[serde(default = "default_true")]
    pub use_tls: bool,
}

/// AWS SES configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct SesConfig {
    /// AWS region (e.g., "us-east-1")
    #[validate(length(min = 1, max = 50))]
    pub region: String,

    /// AWS access key ID (optional - uses the default credential chain if not provided)
    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    /// Configuration set name (optional, for tracking)
    pub configuration_set: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_smtp_port() -> u16 {
    587
}

/// Named mailbox. Both fields are required when used as a sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct EmailAddress {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub address: String,
}

impl EmailAddress {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.address)
    }
}

/// Parses `Name <address>` or `Name=address`
impl FromStr for EmailAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, address) = if let Some((name, rest)) = s.split_once('<') {
            let address = rest
                .strip_suffix('>')
                .ok_or_else(|| format!("unterminated address in `{}`", s))?;
            (name, address)
        } else if let Some(parts) = s.split_once('=') {
            parts
        } else {
            return Err(format!("expected `Name <address>` or `Name=address`, got `{}`", s));
        };

        let (name, address) = (name.trim(), address.trim());
        if name.is_empty() || address.is_empty() {
            return Err(format!("both name and address are required in `{}`", s));
        }

        Ok(Self::new(name, address))
    }
}

/// Parameters fixed at mailer construction and reused for every send.
///
/// `None` is the explicit absent marker for `cc`, `bcc` and `options`;
/// providers receive it as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendParameters {
    pub from: EmailAddress,
    #[serde(default)]
    pub cc: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub bcc: Option<Vec<EmailAddress>>,
    #[serde(default)]
    pub options: Option<Map<String, Value>>,
}

impl SendParameters {
    pub fn new(from: EmailAddress) -> Self {
        Self {
            from,
            cc: None,
            bcc: None,
            options: None,
        }
    }

    pub fn with_cc(mut self, cc: Vec<EmailAddress>) -> Self {
        self.cc = Some(cc);
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<EmailAddress>) -> Self {
        self.bcc = Some(bcc);
        self
    }

    pub fn with_options(mut self, options: Map<String, Value>) -> Self {
        self.options = Some(options);
        self
    }
}

/// Output of a renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

impl RenderedContent {
    pub fn new(
        subject: impl Into<String>,
        html: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            text: text.into(),
        }
    }

    /// Splits the content into its subject and bodies
    pub fn into_parts(self) -> (String, EmailBodies) {
        (
            self.subject,
            EmailBodies {
                html: self.html,
                text: self.text,
            },
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailBodies {
    pub html: String,
    pub text: String,
}

/// Everything a provider needs for one delivery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub from: EmailAddress,
    pub to: Vec<EmailAddress>,
    pub cc: Option<Vec<EmailAddress>>,
    pub bcc: Option<Vec<EmailAddress>>,
    pub subject: String,
    pub bodies: EmailBodies,
    pub options: Option<Map<String, Value>>,
}

impl Delivery {
    /// Number of recipients across to, cc and bcc
    pub fn recipient_count(&self) -> usize {
        self.to.len()
            + self.cc.as_ref().map_or(0, Vec::len)
            + self.bcc.as_ref().map_or(0, Vec::len)
    }

    /// String option lookup
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options
            .as_ref()
            .and_then(|options| options.get(key))
            .and_then(Value::as_str)
    }
}

/// Receipt returned by the bundled providers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailSendResult {
    pub message_id: Option<String>,
}

impl EmailSendResult {
    pub fn new(message_id: Option<String>) -> Self {
        Self { message_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_email_provider_config_default() {
        let config = EmailProviderConfig::default();
        assert!(matches!(config, EmailProviderConfig::None));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_email_provider_config_smtp() {
        let config = EmailProviderConfig::Smtp(SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            use_tls: true,
        });

        assert!(config.is_configured());
        assert_eq!(config.provider_type(), "smtp");
    }

    #[test]
    fn test_email_provider_config_deserialization() {
        let config: EmailProviderConfig =
            serde_json::from_value(json!({ "type": "smtp", "host": "localhost" })).unwrap();

        match config {
            EmailProviderConfig::Smtp(smtp) => {
                assert_eq!(smtp.host, "localhost");
                assert_eq!(smtp.port, 587);
                assert!(smtp.use_tls);
            }
            other => panic!("Expected smtp config, got {:?}", other),
        }

        let config: EmailProviderConfig = serde_json::from_str(r#"{"type": "log"}"#).unwrap();
        assert_eq!(config.provider_type(), "log");
    }

    #[test]
    fn test_smtp_config_validation() {
        let config = SmtpConfig {
            host: String::new(),
            port: 25,
            username: None,
            password: None,
            use_tls: false,
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_email_address_display_and_parse() {
        let addr = EmailAddress::new("Bill", "bill@te.st");
        assert_eq!(addr.to_string(), "Bill <bill@te.st>");
        assert_eq!("Bill <bill@te.st>".parse::<EmailAddress>().unwrap(), addr);
        assert_eq!("Bill=bill@te.st".parse::<EmailAddress>().unwrap(), addr);
    }

    #[test]
    fn test_email_address_parse_rejects_incomplete() {
        assert!("bill@te.st".parse::<EmailAddress>().is_err());
        assert!("<bill@te.st>".parse::<EmailAddress>().is_err());
        assert!("Bill <bill@te.st".parse::<EmailAddress>().is_err());
        assert!("Bill=".parse::<EmailAddress>().is_err());
    }

    #[test]
    fn test_send_parameters_absent_fields_serialize_as_null() {
        let params = SendParameters::new(EmailAddress::new("Ivan", "ivan@te.st"));
        let value = serde_json::to_value(&params).unwrap();

        assert_eq!(value["cc"], Value::Null);
        assert_eq!(value["bcc"], Value::Null);
        assert_eq!(value["options"], Value::Null);
    }

    #[test]
    fn test_send_parameters_deserialize_defaults() {
        let params: SendParameters =
            serde_json::from_value(json!({ "from": { "name": "Ivan", "address": "ivan@te.st" } }))
                .unwrap();

        assert_eq!(params, SendParameters::new(EmailAddress::new("Ivan", "ivan@te.st")));
    }

    #[test]
    fn test_delivery_helpers() {
        let mut options = Map::new();
        options.insert("reply_to".to_string(), json!("Ops <ops@te.st>"));

        let delivery = Delivery {
            from: EmailAddress::new("Ivan", "ivan@te.st"),
            to: vec![EmailAddress::new("Bill", "bill@te.st")],
            cc: Some(vec![EmailAddress::new("Ann", "ann@te.st")]),
            bcc: None,
            subject: "S".to_string(),
            bodies: EmailBodies {
                html: "H".to_string(),
                text: "T".to_string(),
            },
            options: Some(options),
        };

        assert_eq!(delivery.recipient_count(), 2);
        assert_eq!(delivery.option_str("reply_to"), Some("Ops <ops@te.st>"));
        assert_eq!(delivery.option_str("missing"), None);
    }

    #[test]
    fn test_rendered_content_into_parts() {
        let (subject, bodies) = RenderedContent::new("S", "H", "T").into_parts();
        assert_eq!(subject, "S");
        assert_eq!(
            bodies,
            EmailBodies {
                html: "H".to_string(),
                text: "T".to_string()
            }
        );
    }
}
