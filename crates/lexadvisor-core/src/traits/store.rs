//! Storage traits for articles and their knowledge annexes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Article, KnowledgeAnnex};

/// An article as listed by the store, with bookkeeping columns.
#[derive(Debug, Clone)]
pub struct StoredArticle {
    pub article: Article,
    pub updated_at: String,
}

/// Source of truth for retrieval candidates.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    fn name(&self) -> &str;

    /// Every stored article in scan order.
    ///
    /// The outer error means the store itself is unreachable. Each inner item
    /// is one record: a record that cannot be decoded yields `Err` without
    /// aborting the rest of the scan.
    async fn scan_all(&self) -> Result<Vec<Result<Article>>>;

    /// Insert or replace by `article_num`. Last write wins.
    async fn upsert(&self, article: Article) -> Result<()>;

    /// Remove by key. Returns whether a record existed.
    async fn delete(&self, article_num: &str) -> Result<bool>;

    /// All decodable articles in scan order, for listings.
    async fn list(&self) -> Result<Vec<StoredArticle>>;

    /// Remove everything.
    async fn clear(&self) -> Result<()>;
}

/// Auxiliary annotations keyed by article number.
#[async_trait]
pub trait AnnexStore: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, target_article: &str) -> Result<Option<KnowledgeAnnex>>;

    /// Insert or replace by `target_article`.
    async fn upsert(&self, annex: KnowledgeAnnex) -> Result<()>;

    /// Remove by key. Returns whether a record existed.
    async fn delete(&self, target_article: &str) -> Result<bool>;

    async fn clear(&self) -> Result<()>;
}
