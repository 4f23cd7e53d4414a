//! Email template system
//!
//! Provides simple variable substitution for email templates.
//! Variables are specified using {{variable_name}} syntax.

use super::renderer::{EmailRenderer, RenderError};
use crate::domain::RenderedContent;
use askama_escape::{escape, Html};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;
use std::str::FromStr;

/// Built-in templates for repository events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    /// An issue was opened
    IssueOpened,
    /// Commits were pushed to a branch
    Push,
    /// Free-form `subject` + `message`
    #[default]
    Generic,
}

impl EmailTemplate {
    /// Get the subject line for this template
    pub fn subject(&self) -> &'static str {
        match self {
            Self::IssueOpened => "[{{repository}}] Issue #{{issue_number}}: {{issue_title}}",
            Self::Push => "[{{repository}}] {{pusher}} pushed {{commit_count}} commit(s) to {{branch}}",
            Self::Generic => "{{subject}}",
        }
    }

    /// Get the HTML body template
    pub fn html_body(&self) -> &'static str {
        match self {
            Self::IssueOpened => ISSUE_OPENED_TEMPLATE,
            Self::Push => PUSH_TEMPLATE,
            Self::Generic => GENERIC_TEMPLATE,
        }
    }

    /// Get the plain text body template
    pub fn text_body(&self) -> &'static str {
        match self {
            Self::IssueOpened => ISSUE_OPENED_TEMPLATE_TEXT,
            Self::Push => PUSH_TEMPLATE_TEXT,
            Self::Generic => GENERIC_TEMPLATE_TEXT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::IssueOpened => "issue_opened",
            Self::Push => "push",
            Self::Generic => "generic",
        }
    }
}

impl FromStr for EmailTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issue_opened" => Ok(Self::IssueOpened),
            "push" => Ok(Self::Push),
            "generic" => Ok(Self::Generic),
            other => Err(format!(
                "unknown template `{}` (expected issue_opened, push or generic)",
                other
            )),
        }
    }
}

/// Template rendering engine with variable substitution
#[derive(Debug, Default)]
pub struct TemplateEngine {
    variables: HashMap<String, String>,
}

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set multiple variables from an iterator
    pub fn set_all<I, K, V>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in iter {
            self.variables.insert(k.into(), v.into());
        }
        self
    }

    /// Load the scalar members of a JSON object as variables.
    ///
    /// Nested arrays and objects are stored as compact JSON.
    pub fn set_json(&mut self, data: &Value) -> Result<&mut Self, RenderError> {
        match data {
            Value::Null => {}
            Value::Object(map) => {
                for (key, value) in map {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    self.variables.insert(key.clone(), text);
                }
            }
            other => {
                return Err(RenderError::InvalidData(format!(
                    "expected an object, got {}",
                    other
                )))
            }
        }
        Ok(self)
    }

    /// Render a template string, replacing {{variable}} with values
    pub fn render(&self, template: &str) -> String {
        self.substitute(template, |out, value| out.push_str(value))
    }

    /// Like [`render`](Self::render), with values HTML-escaped
    pub fn render_html(&self, template: &str) -> String {
        self.substitute(template, |out, value| {
            let _ = write!(out, "{}", escape(value, Html));
        })
    }

    /// Single left-to-right pass; inserted values are never rescanned.
    /// Unknown or unterminated placeholders are kept verbatim.
    fn substitute(&self, template: &str, push: impl Fn(&mut String, &str)) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else { break };
            let name = &after[..end];

            out.push_str(&rest[..start]);
            match self.variables.get(name) {
                Some(value) => push(&mut out, value),
                None => out.push_str(&rest[start..start + end + 4]),
            }
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        out
    }

    /// Names of placeholders in `template` with no value set
    pub fn missing_variables(&self, template: &str) -> BTreeSet<String> {
        let mut missing = BTreeSet::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else { break };
            let name = &after[..end];
            if !name.is_empty() && !self.variables.contains_key(name) {
                missing.insert(name.to_string());
            }
            rest = &after[end + 2..];
        }

        missing
    }

    /// Render a complete email template; only the HTML body is escaped
    pub fn render_template(&self, template: EmailTemplate) -> RenderedContent {
        RenderedContent {
            subject: self.render(template.subject()),
            html: self.render_html(template.html_body()),
            text: self.render(template.text_body()),
        }
    }
}

/// [`EmailRenderer`] over one of the built-in templates.
///
/// `year` and `app_name` are filled in unless the data sets them.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    template: EmailTemplate,
    app_name: String,
    strict: bool,
}

impl TemplateRenderer {
    pub fn new(template: EmailTemplate) -> Self {
        Self {
            template,
            app_name: "GitEvents".to_string(),
            strict: false,
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = app_name.into();
        self
    }

    /// Fail with [`RenderError::MissingVariable`] instead of leaving placeholders in place
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    pub fn template(&self) -> EmailTemplate {
        self.template
    }

    fn engine(&self, data: &Value) -> Result<TemplateEngine, RenderError> {
        let mut engine = TemplateEngine::new();
        engine
            .set("year", Utc::now().year().to_string())
            .set("app_name", self.app_name.as_str())
            .set_json(data)?;
        Ok(engine)
    }
}

#[async_trait]
impl EmailRenderer for TemplateRenderer {
    async fn render(&self, data: Value) -> Result<RenderedContent, RenderError> {
        let engine = self.engine(&data)?;

        if self.strict {
            let template = self.template;
            let missing = [template.subject(), template.html_body(), template.text_body()]
                .into_iter()
                .flat_map(|source| engine.missing_variables(source))
                .collect::<BTreeSet<_>>();
            if let Some(name) = missing.into_iter().next() {
                return Err(RenderError::MissingVariable(name));
            }
        }

        Ok(engine.render_template(self.template))
    }
}

// ============================================================================
// Email Templates
// ============================================================================

const ISSUE_OPENED_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Issue opened</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; }
        .header h1 { color: #2563eb; margin: 0; font-size: 20px; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #2563eb; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{repository}} #{{issue_number}}</h1>
        </div>
        <div class="content">
            <p><strong>{{author}}</strong> opened <strong>{{issue_title}}</strong>.</p>
            <p><a href="{{issue_url}}" class="link">{{issue_url}}</a></p>
        </div>
        <div class="footer">
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const ISSUE_OPENED_TEMPLATE_TEXT: &str = r#"{{repository}} #{{issue_number}}

{{author}} opened "{{issue_title}}".

{{issue_url}}

(c) {{year}} {{app_name}}"#;

const PUSH_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Push</title>
    <style>
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; line-height: 1.6; color: #333; margin: 0; padding: 0; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 40px auto; padding: 40px; background: #ffffff; border-radius: 8px; }
        .header h1 { color: #2563eb; margin: 0; font-size: 20px; }
        .footer { text-align: center; font-size: 12px; color: #666; margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; }
        .link { color: #2563eb; word-break: break-all; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{{repository}}: {{branch}}</h1>
        </div>
        <div class="content">
            <p><strong>{{pusher}}</strong> pushed {{commit_count}} commit(s) to <strong>{{branch}}</strong>.</p>
            <p><a href="{{compare_url}}" class="link">Compare changes</a></p>
        </div>
        <div class="footer">
            <p>&copy; {{year}} {{app_name}}</p>
        </div>
    </div>
</body>
</html>"#;

const PUSH_TEMPLATE_TEXT: &str = r#"{{repository}}: {{branch}}

{{pusher}} pushed {{commit_count}} commit(s) to {{branch}}.

Compare changes: {{compare_url}}

(c) {{year}} {{app_name}}"#;

const GENERIC_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{subject}}</title>
</head>
<body style="font-family: sans-serif; padding: 20px; max-width: 600px; margin: 0 auto;">
    <p>{{message}}</p>
    <hr style="margin: 20px 0; border: none; border-top: 1px solid #eee;">
    <p style="color: #666; font-size: 12px;">&copy; {{year}} {{app_name}}</p>
</body>
</html>"#;

const GENERIC_TEMPLATE_TEXT: &str = r#"{{message}}

(c) {{year}} {{app_name}}"#;
