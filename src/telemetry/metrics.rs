//! Metric definitions
//!
//! No recorder is installed here; the host process decides where these go.

use metrics::{counter, describe_counter};

/// Outcome label for `mailer_send_total`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    RenderError,
    ProviderError,
}

impl SendOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::RenderError => "render_error",
            Self::ProviderError => "provider_error",
        }
    }
}

/// Register metric descriptions so HELP/TYPE lines exist before first use.
pub fn describe_metrics() {
    describe_counter!(
        "mailer_send_total",
        "Mailer send calls by outcome (sent/render_error/provider_error)"
    );
}

pub fn record_send(outcome: SendOutcome) {
    counter!("mailer_send_total", "outcome" => outcome.as_str()).increment(1);
}
