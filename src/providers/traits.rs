//! Answer-generation provider trait and request types.

use crate::sessions::Turn;
use anyhow::Result;
use async_trait::async_trait;

/// One open-ended generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest<'a> {
    /// System prompt selecting the assistant's persona for this category.
    pub system_prompt: &'a str,
    /// The user's question, verbatim.
    pub question: &'a str,
    /// Recent conversation turns for context, oldest first.
    pub history: &'a [Turn],
}

/// External answer-generation collaborator.
///
/// Treated as an opaque blocking call that may fail; callers are expected
/// to catch failures at the dispatch boundary and degrade rather than
/// propagate. No timeout contract beyond the implementation's own HTTP
/// client settings.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Produce a reply for the request.
    async fn generate(&self, request: &GenerateRequest<'_>) -> Result<String>;

    /// The name of this generator implementation.
    fn name(&self) -> &str;
}
