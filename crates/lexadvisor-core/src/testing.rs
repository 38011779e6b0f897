//! Deterministic encoder, generator and store doubles.
//!
//! Compiled for this crate's tests and, through the `test-util` feature, for
//! the tests of downstream crates.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{LexError, Result};
use crate::traits::{AnnexStore, ArticleStore, Encoder, Generator, StoredArticle};
use crate::types::{Article, KnowledgeAnnex};

/// Encoder that returns a fixed vector per known text and a fallback otherwise.
pub struct StaticEncoder {
    vectors: HashMap<String, Vec<f32>>,
    fallback: Vec<f32>,
    calls: Mutex<Vec<String>>,
}

impl StaticEncoder {
    /// Every text encodes to `fallback`.
    pub fn uniform(fallback: Vec<f32>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Map `text` to `vector`.
    pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Texts seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Encoder for StaticEncoder {
    fn name(&self) -> &str {
        "static"
    }

    fn model(&self) -> &str {
        "static-test"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Encoder whose service is always down.
pub struct FailingEncoder;

#[async_trait]
impl Encoder for FailingEncoder {
    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "none"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(LexError::EncodingUnavailable("connection refused".into()))
    }
}

/// Generator that answers with a fixed reply and records every prompt.
pub struct ScriptedGenerator {
    reply: String,
    prompts: Mutex<Vec<(String, f32)>>,
}

impl ScriptedGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far with the temperature of each call.
    pub fn prompts(&self) -> Vec<(String, f32)> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-test"
    }

    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push((prompt.to_string(), temperature));
        }
        Ok(self.reply.clone())
    }
}

/// Generator whose quota is always exhausted.
pub struct FailingGenerator;

#[async_trait]
impl Generator for FailingGenerator {
    fn name(&self) -> &str {
        "failing"
    }

    fn model(&self) -> &str {
        "none"
    }

    async fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
        Err(LexError::GenerationUnavailable("429 quota exceeded".into()))
    }
}

fn store_down() -> LexError {
    LexError::Storage("disk I/O error".into())
}

/// Article store whose database is unreachable.
pub struct UnavailableArticleStore;

#[async_trait]
impl ArticleStore for UnavailableArticleStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn scan_all(&self) -> Result<Vec<Result<Article>>> {
        Err(store_down())
    }

    async fn upsert(&self, _article: Article) -> Result<()> {
        Err(store_down())
    }

    async fn delete(&self, _article_num: &str) -> Result<bool> {
        Err(store_down())
    }

    async fn list(&self) -> Result<Vec<StoredArticle>> {
        Err(store_down())
    }

    async fn clear(&self) -> Result<()> {
        Err(store_down())
    }
}

/// Annex store whose database is unreachable.
pub struct UnavailableAnnexStore;

#[async_trait]
impl AnnexStore for UnavailableAnnexStore {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn get(&self, _target_article: &str) -> Result<Option<KnowledgeAnnex>> {
        Err(store_down())
    }

    async fn upsert(&self, _annex: KnowledgeAnnex) -> Result<()> {
        Err(store_down())
    }

    async fn delete(&self, _target_article: &str) -> Result<bool> {
        Err(store_down())
    }

    async fn clear(&self) -> Result<()> {
        Err(store_down())
    }
}
