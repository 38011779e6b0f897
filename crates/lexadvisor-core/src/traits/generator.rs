//! Text generation trait.

use async_trait::async_trait;

use crate::error::Result;

/// Turns a fully assembled prompt into free text.
#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// One completion call: no retry, no streaming.
    /// Fails with `LexError::GenerationUnavailable`.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String>;
}
