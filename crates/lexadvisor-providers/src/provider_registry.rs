//! Provider registry: maps provider names to endpoint configurations.
//!
//! Every provider here speaks the OpenAI-compatible wire format, so the
//! encoder and generator clients differ only by base URL, auth and model.

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub name: &'static str,
    /// Base URL for the API.
    pub base_url: &'static str,
    /// Path for chat completions (appended to base_url).
    pub chat_path: &'static str,
    /// Path for embeddings, `None` when the provider cannot embed.
    pub embeddings_path: Option<&'static str>,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    pub auth_style: AuthStyle,
    /// Environment variable to override the base URL (e.g., OLLAMA_HOST).
    pub base_url_env: Option<&'static str>,
    pub default_chat_model: &'static str,
    pub default_embedding_model: Option<&'static str>,
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "gemini",
        base_url: "https://generativelanguage.googleapis.com/v1beta/openai",
        chat_path: "/chat/completions",
        embeddings_path: Some("/embeddings"),
        env_keys: &["GOOGLE_API_KEY", "GEMINI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_chat_model: "gemini-flash-latest",
        default_embedding_model: Some("gemini-embedding-001"),
    },
    ProviderConfig {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        chat_path: "/chat/completions",
        embeddings_path: Some("/embeddings"),
        env_keys: &["OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_chat_model: "gpt-4o-mini",
        default_embedding_model: Some("text-embedding-3-small"),
    },
    ProviderConfig {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        chat_path: "/chat/completions",
        embeddings_path: Some("/embeddings"),
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("OLLAMA_HOST"),
        default_chat_model: "llama3.2",
        default_embedding_model: Some("nomic-embed-text"),
    },
    ProviderConfig {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        chat_path: "/chat/completions",
        embeddings_path: None,
        env_keys: &["OPENROUTER_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_chat_model: "google/gemini-2.5-flash",
        default_embedding_model: None,
    },
    ProviderConfig {
        name: "deepseek",
        base_url: "https://api.deepseek.com",
        chat_path: "/chat/completions",
        embeddings_path: None,
        env_keys: &["DEEPSEEK_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_chat_model: "deepseek-chat",
        default_embedding_model: None,
    },
];

/// Look up a provider config by name.
pub fn get_provider_config(name: &str) -> Option<&'static ProviderConfig> {
    let lookup = match name {
        "google" => "gemini",
        other => other,
    };
    PROVIDERS.iter().find(|p| p.name == lookup)
}

/// List all known provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_is_registered_with_google_alias() {
        let p = get_provider_config("google").unwrap();
        assert_eq!(p.name, "gemini");
        assert_eq!(p.embeddings_path, Some("/embeddings"));
        assert!(p.env_keys.contains(&"GOOGLE_API_KEY"));
        assert_eq!(p.default_embedding_model, Some("gemini-embedding-001"));
    }

    #[test]
    fn test_local_provider_needs_no_auth() {
        let p = get_provider_config("ollama").unwrap();
        assert_eq!(p.auth_style, AuthStyle::None);
        assert_eq!(p.base_url_env, Some("OLLAMA_HOST"));
    }

    #[test]
    fn test_unknown_provider() {
        assert!(get_provider_config("nope").is_none());
        assert!(all_provider_names().contains(&"openai"));
    }
}
