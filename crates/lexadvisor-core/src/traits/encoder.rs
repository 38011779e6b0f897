//! Vector encoder trait.

use async_trait::async_trait;

use crate::error::Result;

/// Converts text into a fixed-dimension vector.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Encoder name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Model identifier used for encoding.
    fn model(&self) -> &str;

    /// Encode a single text. Fails with `LexError::EncodingUnavailable`.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
