//! Renderer trait: turns template data into subject, html and text

use crate::domain::RenderedContent;
use crate::error::BoxError;
use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Missing template variable: {0}")]
    MissingVariable(String),

    #[error("Invalid template data: {0}")]
    InvalidData(String),

    /// Failure raised by a custom renderer
    #[error(transparent)]
    Other(#[from] BoxError),
}

/// Rendering capability
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailRenderer: Send + Sync {
    /// Render arbitrary template data; its meaning is up to the renderer
    async fn render(&self, data: Value) -> Result<RenderedContent, RenderError>;
}

/// Renderer backed by an async function. Build one with [`render_fn`].
#[derive(Clone, Copy)]
pub struct RenderFn<F> {
    f: F,
}

/// Wrap an async function as an [`EmailRenderer`]
pub fn render_fn<F, Fut>(f: F) -> RenderFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RenderedContent, RenderError>> + Send + 'static,
{
    RenderFn { f }
}

#[async_trait]
impl<F, Fut> EmailRenderer for RenderFn<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<RenderedContent, RenderError>> + Send + 'static,
{
    async fn render(&self, data: Value) -> Result<RenderedContent, RenderError> {
        (self.f)(data).await
    }
}
