//! # LexAdvisor Providers
//!
//! Encoder and generator clients for LexAdvisor.
//!
//! All supported services (Gemini, OpenAI, Ollama, OpenRouter, DeepSeek and
//! `custom:<url>` endpoints) speak the OpenAI-compatible wire format, so one
//! `Endpoint` type handles URL, auth and key resolution for both roles.

pub mod embedding;
pub mod openai_compatible;
pub mod provider_registry;

use std::sync::Arc;

use lexadvisor_core::config::LexConfig;
use lexadvisor_core::error::Result;
use lexadvisor_core::traits::{Encoder, Generator};

use embedding::OpenAiCompatibleEncoder;
use openai_compatible::{Endpoint, OpenAiCompatibleGenerator, env_lookup};

/// Section key if set, otherwise the shared top-level key.
fn configured_key<'a>(section_key: &'a str, shared_key: &'a str) -> &'a str {
    if section_key.is_empty() { shared_key } else { section_key }
}

/// Create the vector encoder from `[embedding]`.
pub fn create_encoder(config: &LexConfig) -> Result<Arc<dyn Encoder>> {
    let section = &config.embedding;
    let endpoint = Endpoint::resolve(
        &section.provider,
        &section.endpoint,
        configured_key(&section.api_key, &config.api_key),
        &env_lookup,
    )?;
    let encoder = OpenAiCompatibleEncoder::new(endpoint, &section.model)?;
    tracing::info!(
        "🧭 Encoder ready: provider={}, model={}",
        encoder.name(),
        encoder.model()
    );
    Ok(Arc::new(encoder))
}

/// Create the text generator from `[llm]`.
pub fn create_generator(config: &LexConfig) -> Result<Arc<dyn Generator>> {
    let section = &config.llm;
    let endpoint = Endpoint::resolve(
        &section.provider,
        &section.endpoint,
        configured_key(&section.api_key, &config.api_key),
        &env_lookup,
    )?;
    let generator = OpenAiCompatibleGenerator::new(endpoint, &section.model);
    tracing::info!(
        "✍️ Generator ready: provider={}, model={}",
        generator.name(),
        generator.model()
    );
    Ok(Arc::new(generator))
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}
