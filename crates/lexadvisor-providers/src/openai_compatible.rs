//! Unified OpenAI-compatible endpoint and chat-completion generator.
//!
//! Providers are distinguished only by base URL, auth style and API key.
//! The same `Endpoint` backs both the generator here and the encoder in
//! `embedding.rs`.

use async_trait::async_trait;
use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::Generator;
use serde_json::{Value, json};

use crate::provider_registry::{self, AuthStyle, ProviderConfig};

/// Read a non-empty environment variable.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// A resolved HTTP endpoint with credentials.
pub struct Endpoint {
    /// Provider name (e.g., "gemini", "custom").
    name: String,
    /// Base URL without trailing slash.
    base_url: String,
    api_key: String,
    auth_style: AuthStyle,
    /// Registry entry, `None` for custom endpoints.
    registry: Option<&'static ProviderConfig>,
    client: reqwest::Client,
}

impl Endpoint {
    /// Resolve a provider name into an endpoint.
    ///
    /// Resolution order:
    /// - Base URL: `endpoint_override` > registry env override > registry default
    /// - API key: `configured_key` > registry env vars (via `lookup`)
    ///
    /// A provider that requires auth but has no key is `ConfigurationMissing`.
    pub fn resolve(
        provider: &str,
        endpoint_override: &str,
        configured_key: &str,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(url) = provider.strip_prefix("custom:") {
            let base_url = if endpoint_override.is_empty() { url } else { endpoint_override };
            let auth_style = if configured_key.is_empty() {
                AuthStyle::None
            } else {
                AuthStyle::Bearer
            };
            return Ok(Self {
                name: "custom".to_string(),
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key: configured_key.to_string(),
                auth_style,
                registry: None,
                client: reqwest::Client::new(),
            });
        }

        let registry = provider_registry::get_provider_config(provider).ok_or_else(|| {
            LexError::Config(format!(
                "Unknown provider '{provider}' (known: {})",
                provider_registry::all_provider_names().join(", ")
            ))
        })?;

        let base_url = if !endpoint_override.is_empty() {
            endpoint_override.to_string()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = lookup(env_key)?;
                    // OLLAMA_HOST is usually given without the /v1 suffix
                    if val.ends_with("/v1") {
                        Some(val)
                    } else {
                        Some(format!("{}/v1", val.trim_end_matches('/')))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        let api_key = if !configured_key.is_empty() {
            configured_key.to_string()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| lookup(key))
                .unwrap_or_default()
        };

        if registry.auth_style != AuthStyle::None && api_key.is_empty() {
            return Err(LexError::ConfigurationMissing(format!(
                "{} API key (set api_key in config or one of: {})",
                registry.name,
                registry.env_keys.join(", ")
            )));
        }

        Ok(Self {
            name: registry.name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            auth_style: registry.auth_style,
            registry: Some(registry),
            client: reqwest::Client::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn registry(&self) -> Option<&'static ProviderConfig> {
        self.registry
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    /// POST a JSON body and return the parsed JSON response.
    ///
    /// Errors are plain strings; callers wrap them in the variant that fits
    /// their role (encoding or generation).
    pub async fn post_json(&self, path: &str, body: &Value) -> std::result::Result<Value, String> {
        let url = format!("{}{}", self.base_url, path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(body);
        let req = self.apply_auth(req);

        let resp = req
            .send()
            .await
            .map_err(|e| format!("{} connection failed ({}): {}", self.name, url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("{} API error {}: {}", self.name, status, text));
        }

        resp.json::<Value>()
            .await
            .map_err(|e| format!("{} returned malformed JSON: {}", self.name, e))
    }
}

/// Extract `choices[0].message.content` from a chat-completion response.
pub(crate) fn parse_chat_content(json: &Value) -> std::result::Result<String, String> {
    let choice = json["choices"]
        .get(0)
        .ok_or_else(|| "No choices in response".to_string())?;
    choice["message"]["content"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| {
            let reason = choice["finish_reason"].as_str().unwrap_or("unknown");
            format!("Response has no text content (finish_reason={reason})")
        })
}

/// Chat-completion generator for any OpenAI-compatible API.
pub struct OpenAiCompatibleGenerator {
    endpoint: Endpoint,
    model: String,
    chat_path: String,
}

impl OpenAiCompatibleGenerator {
    pub fn new(endpoint: Endpoint, model: &str) -> Self {
        let chat_path = endpoint
            .registry()
            .map(|r| r.chat_path)
            .unwrap_or("/chat/completions")
            .to_string();
        let model = if model.is_empty() {
            endpoint
                .registry()
                .map(|r| r.default_chat_model)
                .unwrap_or_default()
                .to_string()
        } else {
            model.to_string()
        };
        Self {
            endpoint,
            model,
            chat_path,
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    fn name(&self) -> &str {
        self.endpoint.name()
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let body = json!({
            "model": self.model,
            "temperature": temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ],
        });

        let json = self
            .endpoint
            .post_json(&self.chat_path, &body)
            .await
            .map_err(LexError::GenerationUnavailable)?;

        let content = parse_chat_content(&json).map_err(|e| {
            LexError::GenerationUnavailable(format!("{}: {}", self.endpoint.name(), e))
        })?;

        if let Some(usage) = json["usage"].as_object() {
            tracing::debug!(
                "🧾 {} usage: prompt={} completion={}",
                self.model,
                usage.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
                usage.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0),
            );
        }

        Ok(content)
    }
}
