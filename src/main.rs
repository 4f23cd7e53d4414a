use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gitevents_mailer::{
    config::Config,
    domain::{EmailAddress, EmailProviderConfig},
    email::{create_provider, EmailProvider, EmailTemplate, MailerFactory, TemplateRenderer},
    telemetry,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "gitevents-mailer", version, about = "Render and send repository event emails")]
struct Cli {
    /// Config file (defaults to ./mailer.{toml,yaml,json} when present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a template and deliver it
    Send {
        /// Recipient as `Name <address>` or `Name=address`; repeatable
        #[arg(long = "to", required = true)]
        to: Vec<EmailAddress>,

        /// Template data as a JSON object
        #[arg(long)]
        data: Option<String>,

        /// issue_opened, push or generic
        #[arg(long)]
        template: Option<EmailTemplate>,

        /// Fail when the template references data that was not supplied
        #[arg(long)]
        strict: bool,

        /// Log the email instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Check connectivity to the configured provider
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    telemetry::init(&config.telemetry);

    match cli.command {
        Command::Send {
            to,
            data,
            template,
            strict,
            dry_run,
        } => {
            let provider_config = if dry_run {
                EmailProviderConfig::Log
            } else {
                config.provider.clone()
            };
            let provider = create_provider(&provider_config)
                .await
                .with_context(|| format!("Failed to create {} provider", provider_config.provider_type()))?;

            let mut renderer = TemplateRenderer::new(template.unwrap_or(config.template))
                .with_app_name(config.app_name.as_str());
            if strict {
                renderer = renderer.strict();
            }

            let mut builder = MailerFactory::builder().provider(provider).renderer(renderer);
            if let Some(params) = config.send_params.clone() {
                builder = builder.send_params_value(params);
            }
            let mailer = builder.build().context("Invalid mailer configuration")?;

            let data = match data {
                Some(raw) => serde_json::from_str(&raw).context("--data must be valid JSON")?,
                None => Value::Null,
            };

            let receipt = mailer.send(to, data).await.context("Failed to send email")?;
            info!(message_id = ?receipt.message_id, "Email sent");
        }
        Command::Check => {
            let provider = create_provider(&config.provider)
                .await
                .context("Failed to create provider")?;
            provider
                .test_connection()
                .await
                .with_context(|| format!("{} provider check failed", provider.provider_name()))?;
            info!(provider = provider.provider_name(), "Provider reachable");
        }
    }

    Ok(())
}
