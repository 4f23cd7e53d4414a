//! Email rendering and delivery
//!
//! A [`Mailer`] binds an [`EmailRenderer`] to an [`EmailProvider`].
//! Bundled collaborators:
//! - [`TemplateRenderer`] over the built-in repository event templates
//! - SMTP (using lettre)
//! - AWS SES
//! - a log-only provider for dry runs

pub mod console;
pub mod factory;
pub mod guard;
pub mod mailer;
pub mod provider;
pub mod renderer;
pub mod ses;
pub mod smtp;
pub mod templates;

pub use console::LogEmailProvider;
pub use factory::{create_provider, DynEmailProvider};
pub use mailer::{Mailer, MailerBuilder, MailerFactory};
pub use provider::{EmailProvider, EmailProviderError};
pub use renderer::{render_fn, EmailRenderer, RenderError, RenderFn};
pub use ses::SesEmailProvider;
pub use smtp::SmtpEmailProvider;
pub use templates::{EmailTemplate, TemplateEngine, TemplateRenderer};
