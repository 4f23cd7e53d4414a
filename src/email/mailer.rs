//! Mailer construction and the bound render-then-deliver `send`

use super::guard::{type_check, ValueKind};
use super::provider::EmailProvider;
use super::renderer::EmailRenderer;
use crate::domain::{Delivery, EmailAddress, SendParameters};
use crate::error::{ConfigError, Result};
use crate::telemetry::metrics::{record_send, SendOutcome};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Entry point for building a [`Mailer`]
pub struct MailerFactory;

impl MailerFactory {
    pub fn builder<P, R>() -> MailerBuilder<P, R> {
        MailerBuilder::default()
    }

    /// Validate loosely typed send parameters.
    ///
    /// Missing `cc`/`bcc`/`options` come back as `None`.
    pub fn send_params_from_value(params: &Value) -> std::result::Result<SendParameters, ConfigError> {
        if !type_check(false, ValueKind::Object, Some(params)) {
            return Err(ConfigError::InvalidSendParams);
        }

        let from = params.get("from");
        if !type_check(false, ValueKind::Object, from) {
            return Err(ConfigError::InvalidFrom);
        }
        let name = from_field(from, "name")?;
        let address = from_field(from, "address")?;

        let cc = params.get("cc");
        let bcc = params.get("bcc");
        if !type_check(true, ValueKind::Array, cc) || !type_check(true, ValueKind::Array, bcc) {
            return Err(ConfigError::InvalidRecipients);
        }

        let options = params.get("options");
        if !type_check(true, ValueKind::Object, options) {
            return Err(ConfigError::InvalidOptions);
        }

        Ok(SendParameters {
            from: EmailAddress::new(name, address),
            cc: recipients(cc, "cc")?,
            bcc: recipients(bcc, "bcc")?,
            options: match options {
                Some(Value::Object(map)) => Some(map.clone()),
                _ => None,
            },
        })
    }

    /// Validate typed send parameters
    pub fn check_send_params(params: &SendParameters) -> std::result::Result<(), ConfigError> {
        if let Err(errors) = params.from.validate() {
            let field_errors = errors.field_errors();
            let field = if field_errors.contains_key("name") {
                "name"
            } else {
                "address"
            };
            return Err(ConfigError::MissingFromField { field });
        }
        check_recipients(params.cc.as_deref(), "cc")?;
        check_recipients(params.bcc.as_deref(), "bcc")
    }
}

/// Every cc/bcc entry needs a non-empty `name` and `address`
fn check_recipients(
    list: Option<&[EmailAddress]>,
    field: &'static str,
) -> std::result::Result<(), ConfigError> {
    match list {
        Some(list) if list.iter().any(|entry| entry.validate().is_err()) => {
            Err(ConfigError::InvalidRecipient { field })
        }
        _ => Ok(()),
    }
}

fn from_field(from: Option<&Value>, field: &'static str) -> std::result::Result<String, ConfigError> {
    let value = from.and_then(|from| from.get(field));
    if !type_check(false, ValueKind::String, value) {
        return Err(ConfigError::MissingFromField { field });
    }

    value
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(ConfigError::MissingFromField { field })
}

fn recipients(
    value: Option<&Value>,
    field: &'static str,
) -> std::result::Result<Option<Vec<EmailAddress>>, ConfigError> {
    let Some(Value::Array(items)) = value else {
        return Ok(None);
    };

    let list = items
        .iter()
        .map(|item| {
            serde_json::from_value::<EmailAddress>(item.clone())
                .map_err(|_| ConfigError::InvalidRecipient { field })
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    check_recipients(Some(&list), field)?;
    Ok(Some(list))
}

enum ParamsSource {
    Typed(SendParameters),
    Loose(Value),
}

/// Collects the mailer's collaborators. Nothing is checked until [`build`](Self::build).
pub struct MailerBuilder<P, R> {
    options: Option<Value>,
    provider: Option<P>,
    renderer: Option<R>,
    params: Option<ParamsSource>,
}

impl<P, R> Default for MailerBuilder<P, R> {
    fn default() -> Self {
        Self {
            options: None,
            provider: None,
            renderer: None,
            params: None,
        }
    }
}

impl<P, R> MailerBuilder<P, R> {
    /// Loose configuration object; its `sendParams` (or `send_params`) key
    /// is used unless parameters are set explicitly
    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn renderer(mut self, renderer: R) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn send_params(mut self, params: SendParameters) -> Self {
        self.params = Some(ParamsSource::Typed(params));
        self
    }

    /// Send parameters in their loose form, e.g. straight from a config file
    pub fn send_params_value(mut self, params: Value) -> Self {
        self.params = Some(ParamsSource::Loose(params));
        self
    }
}

impl<P, R> MailerBuilder<P, R>
where
    P: EmailProvider,
    R: EmailRenderer,
{
    /// Validate everything and bind the collaborators
    pub fn build(self) -> std::result::Result<Mailer<P, R>, ConfigError> {
        let mut params = self.params;

        if let Some(options) = &self.options {
            if !type_check(false, ValueKind::Object, Some(options)) {
                return Err(ConfigError::NotAnObject);
            }
            if params.is_none() {
                params = options
                    .get("sendParams")
                    .or_else(|| options.get("send_params"))
                    .cloned()
                    .map(ParamsSource::Loose);
            }
        }

        let provider = self
            .provider
            .ok_or(ConfigError::MissingRequired { field: "provider" })?;
        let renderer = self
            .renderer
            .ok_or(ConfigError::MissingRequired { field: "renderer" })?;

        let params = match params.ok_or(ConfigError::MissingRequired { field: "sendParams" })? {
            ParamsSource::Typed(params) => {
                MailerFactory::check_send_params(&params)?;
                params
            }
            ParamsSource::Loose(value) => MailerFactory::send_params_from_value(&value)?,
        };

        debug!(
            provider = provider.provider_name(),
            from = %params.from,
            cc = params.cc.as_ref().map_or(0, Vec::len),
            bcc = params.bcc.as_ref().map_or(0, Vec::len),
            "Mailer configured"
        );

        Ok(Mailer {
            inner: Arc::new(MailerInner {
                provider,
                renderer,
                params,
            }),
        })
    }
}

struct MailerInner<P, R> {
    provider: P,
    renderer: R,
    params: SendParameters,
}

/// A renderer bound to a provider and fixed send parameters.
///
/// Cloning is cheap; clones share the same read-only state.
pub struct Mailer<P, R> {
    inner: Arc<MailerInner<P, R>>,
}

impl<P, R> Clone for Mailer<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> Mailer<P, R>
where
    P: EmailProvider,
    R: EmailRenderer,
{
    /// Render `data`, then deliver the result to `to`.
    ///
    /// A render failure is returned without calling the provider. The
    /// provider's receipt or error is returned as-is.
    pub async fn send(&self, to: Vec<EmailAddress>, data: Value) -> Result<P::Receipt> {
        let inner = &*self.inner;

        let content = match inner.renderer.render(data).await {
            Ok(content) => content,
            Err(err) => {
                debug!(error = %err, "Rendering failed, provider not called");
                record_send(SendOutcome::RenderError);
                return Err(err.into());
            }
        };

        let (subject, bodies) = content.into_parts();
        let delivery = Delivery {
            from: inner.params.from.clone(),
            to,
            cc: inner.params.cc.clone(),
            bcc: inner.params.bcc.clone(),
            subject,
            bodies,
            options: inner.params.options.clone(),
        };

        debug!(
            provider = inner.provider.provider_name(),
            recipients = delivery.recipient_count(),
            "Delivering email"
        );

        match inner.provider.send(delivery).await {
            Ok(receipt) => {
                record_send(SendOutcome::Sent);
                Ok(receipt)
            }
            Err(err) => {
                debug!(error = %err, "Provider failed");
                record_send(SendOutcome::ProviderError);
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailSendResult, RenderedContent};
    use crate::email::provider::{EmailProviderError, MockEmailProvider};
    use crate::email::renderer::{MockEmailRenderer, RenderError};
    use crate::error::MailerError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn ivan() -> EmailAddress {
        EmailAddress::new("Ivan", "ivan@te.st")
    }

    fn bill() -> Vec<EmailAddress> {
        vec![EmailAddress::new("Bill", "bill@te.st")]
    }

    fn ok_renderer() -> MockEmailRenderer {
        let mut renderer = MockEmailRenderer::new();
        renderer
            .expect_render()
            .returning(|_| Ok(RenderedContent::new("S", "H", "T")));
        renderer
    }

    fn named_provider() -> MockEmailProvider {
        let mut provider = MockEmailProvider::new();
        provider.expect_provider_name().returning(|| "mock");
        provider
    }

    #[test]
    fn test_options_must_be_an_object() {
        let result = MailerFactory::builder::<MockEmailProvider, MockEmailRenderer>()
            .options(json!("options"))
            .build();

        assert_eq!(result.err(), Some(ConfigError::NotAnObject));
    }

    #[test]
    fn test_missing_collaborators_are_reported_in_order() {
        let result = MailerFactory::builder::<MockEmailProvider, MockEmailRenderer>()
            .options(json!({ "some": "options" }))
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingRequired { field: "provider" }));

        let result = MailerFactory::builder::<MockEmailProvider, _>()
            .renderer(ok_renderer())
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingRequired { field: "provider" }));

        let result = MailerFactory::builder::<_, MockEmailRenderer>()
            .provider(named_provider())
            .send_params(SendParameters::new(ivan()))
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingRequired { field: "renderer" }));

        let result = MailerFactory::builder()
            .provider(named_provider())
            .renderer(ok_renderer())
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingRequired { field: "sendParams" }));
    }

    #[test]
    fn test_send_params_taken_from_options() {
        let result = MailerFactory::builder()
            .provider(named_provider())
            .renderer(ok_renderer())
            .options(json!({ "sendParams": { "to": "some" } }))
            .build();

        assert_eq!(result.err(), Some(ConfigError::InvalidFrom));
    }

    #[test]
    fn test_typed_from_requires_name_and_address() {
        let result = MailerFactory::builder()
            .provider(named_provider())
            .renderer(ok_renderer())
            .send_params(SendParameters::new(EmailAddress::new("", "ivan@te.st")))
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingFromField { field: "name" }));

        let result = MailerFactory::builder()
            .provider(named_provider())
            .renderer(ok_renderer())
            .send_params(SendParameters::new(EmailAddress::new("Ivan", "")))
            .build();
        assert_eq!(result.err(), Some(ConfigError::MissingFromField { field: "address" }));
    }

    #[test]
    fn test_recipient_entries_are_checked_on_both_paths() {
        let typed = SendParameters::new(ivan())
            .with_cc(vec![EmailAddress::new("Ann", "ann@te.st")])
            .with_bcc(vec![EmailAddress::new("", "ann@te.st")]);
        assert_eq!(
            MailerFactory::check_send_params(&typed),
            Err(ConfigError::InvalidRecipient { field: "bcc" })
        );

        let typed = SendParameters::new(ivan()).with_cc(vec![EmailAddress::new("Ann", "")]);
        assert_eq!(
            MailerFactory::check_send_params(&typed),
            Err(ConfigError::InvalidRecipient { field: "cc" })
        );

        let loose = json!({
            "from": { "name": "Ivan", "address": "ivan@te.st" },
            "cc": [{ "name": "", "address": "ann@te.st" }]
        });
        assert_eq!(
            MailerFactory::send_params_from_value(&loose),
            Err(ConfigError::InvalidRecipient { field: "cc" })
        );

        let result = MailerFactory::builder()
            .provider(named_provider())
            .renderer(ok_renderer())
            .send_params(SendParameters::new(ivan()).with_cc(vec![]))
            .build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_send_params_from_value_ladder() {
        let cases = [
            (json!("params"), ConfigError::InvalidSendParams),
            (json!({ "to": "some" }), ConfigError::InvalidFrom),
            (
                json!({ "from": { "address": "ivan@te.st" } }),
                ConfigError::MissingFromField { field: "name" },
            ),
            (
                json!({ "from": { "name": "ivan" } }),
                ConfigError::MissingFromField { field: "address" },
            ),
            (
                json!({ "from": { "name": "Ivan", "address": "ivan@te.st" }, "cc": "bill@te.st" }),
                ConfigError::InvalidRecipients,
            ),
            (
                json!({ "from": { "name": "Ivan", "address": "ivan@te.st" }, "bcc": { "a": 1 } }),
                ConfigError::InvalidRecipients,
            ),
            (
                json!({ "from": { "name": "Ivan", "address": "ivan@te.st" }, "cc": ["bill@te.st"] }),
                ConfigError::InvalidRecipient { field: "cc" },
            ),
            (
                json!({ "from": { "name": "Ivan", "address": "ivan@te.st" }, "options": [1] }),
                ConfigError::InvalidOptions,
            ),
        ];

        for (value, expected) in cases {
            assert_eq!(MailerFactory::send_params_from_value(&value), Err(expected));
        }
    }

    #[test]
    fn test_send_params_from_value_normalizes_absent_fields() {
        let params = MailerFactory::send_params_from_value(&json!({
            "from": { "name": "Ivan", "address": "ivan@te.st" },
            "cc": null,
            "bcc": ""
        }))
        .unwrap();

        assert_eq!(params, SendParameters::new(ivan()));
    }

    #[test]
    fn test_send_params_from_value_keeps_supplied_fields() {
        let params = MailerFactory::send_params_from_value(&json!({
            "from": { "name": "Ivan", "address": "ivan@te.st" },
            "cc": [],
            "bcc": [{ "name": "Ann", "address": "ann@te.st" }],
            "options": { "reply_to": "ops@te.st" }
        }))
        .unwrap();

        assert_eq!(params.cc, Some(vec![]));
        assert_eq!(params.bcc, Some(vec![EmailAddress::new("Ann", "ann@te.st")]));
        assert_eq!(params.options.unwrap()["reply_to"], json!("ops@te.st"));
    }

    #[tokio::test]
    async fn test_send_renders_then_delivers() {
        let mut renderer = MockEmailRenderer::new();
        renderer
            .expect_render()
            .withf(|data| data == &json!({ "issue": 7 }))
            .times(1)
            .returning(|_| Ok(RenderedContent::new("S", "H", "T")));

        let mut provider = named_provider();
        provider
            .expect_send()
            .withf(|delivery| {
                delivery.from == EmailAddress::new("Ivan", "ivan@te.st")
                    && delivery.to == vec![EmailAddress::new("Bill", "bill@te.st")]
                    && delivery.cc.is_none()
                    && delivery.bcc.is_none()
                    && delivery.subject == "S"
                    && delivery.bodies.html == "H"
                    && delivery.bodies.text == "T"
                    && delivery.options.is_none()
            })
            .times(1)
            .returning(|_| Ok(EmailSendResult::new(Some("msg-1".to_string()))));

        let mailer = MailerFactory::builder()
            .provider(provider)
            .renderer(renderer)
            .send_params(SendParameters::new(ivan()))
            .build()
            .unwrap();

        let receipt = mailer.send(bill(), json!({ "issue": 7 })).await.unwrap();
        assert_eq!(receipt, EmailSendResult::new(Some("msg-1".to_string())));
    }

    #[tokio::test]
    async fn test_render_failure_skips_provider() {
        let mut renderer = MockEmailRenderer::new();
        renderer
            .expect_render()
            .times(1)
            .returning(|_| Err(RenderError::MissingVariable("issue_title".to_string())));

        let mut provider = named_provider();
        provider.expect_send().times(0);

        let mailer = MailerFactory::builder()
            .provider(provider)
            .renderer(renderer)
            .send_params(SendParameters::new(ivan()))
            .build()
            .unwrap();

        let err = mailer.send(bill(), Value::Null).await.unwrap_err();
        assert!(matches!(
            err,
            MailerError::Render(RenderError::MissingVariable(ref name)) if name == "issue_title"
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_is_returned_verbatim() {
        let mut provider = named_provider();
        provider
            .expect_send()
            .times(1)
            .returning(|_| Err(EmailProviderError::SendFailed("mailbox full".to_string())));

        let mailer = MailerFactory::builder()
            .provider(provider)
            .renderer(ok_renderer())
            .send_params(SendParameters::new(ivan()))
            .build()
            .unwrap();

        let err = mailer.send(bill(), Value::Null).await.unwrap_err();
        assert_eq!(err.to_string(), "Send failed: mailbox full");
        assert!(matches!(
            err,
            MailerError::Provider(EmailProviderError::SendFailed(_))
        ));
    }
}
