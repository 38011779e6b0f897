//! OpenAI-compatible embedding encoder.

use async_trait::async_trait;
use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::Encoder;
use serde_json::{Value, json};

use crate::openai_compatible::Endpoint;

/// Extract `data[0].embedding` from an embeddings response.
pub(crate) fn parse_embedding(json: &Value) -> std::result::Result<Vec<f32>, String> {
    let values = json["data"]
        .get(0)
        .and_then(|d| d["embedding"].as_array())
        .ok_or_else(|| "No embedding in response".to_string())?;

    let vector = values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| "Embedding contains non-numeric values".to_string())?;

    if vector.is_empty() {
        return Err("Embedding is empty".to_string());
    }
    Ok(vector)
}

/// Encoder backed by `POST {base}/embeddings`.
pub struct OpenAiCompatibleEncoder {
    endpoint: Endpoint,
    model: String,
    embeddings_path: String,
}

impl OpenAiCompatibleEncoder {
    /// Fails with a config error when the provider has no embeddings API.
    pub fn new(endpoint: Endpoint, model: &str) -> Result<Self> {
        let (embeddings_path, default_model) = match endpoint.registry() {
            Some(registry) => {
                let path = registry.embeddings_path.ok_or_else(|| {
                    LexError::Config(format!(
                        "Provider '{}' has no embeddings API; pick another [embedding] provider",
                        registry.name
                    ))
                })?;
                (path, registry.default_embedding_model.unwrap_or_default())
            }
            None => ("/embeddings", ""),
        };

        let model = if model.is_empty() { default_model } else { model };
        if model.is_empty() {
            return Err(LexError::Config(
                "embedding.model is required for custom endpoints".into(),
            ));
        }

        Ok(Self {
            endpoint,
            model: model.to_string(),
            embeddings_path: embeddings_path.to_string(),
        })
    }
}

#[async_trait]
impl Encoder for OpenAiCompatibleEncoder {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = json!({
            "model": self.model,
            "input": [text],
        });

        let json = self
            .endpoint
            .post_json(&self.embeddings_path, &body)
            .await
            .map_err(LexError::EncodingUnavailable)?;

        parse_embedding(&json).map_err(|e| {
            LexError::EncodingUnavailable(format!("{}: {}", self.endpoint.name(), e))
        })
    }
}
