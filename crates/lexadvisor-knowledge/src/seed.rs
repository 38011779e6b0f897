//! Bulk loading of articles from a JSON seed file.
//!
//! The file is a JSON array; each element carries an article and its
//! annotations under `knowledge_base`:
//!
//! ```json
//! [{"law_id": "BLLD-2019", "article_num": "113", "content": "...",
//!   "knowledge_base": {"conflicts": [], "practical_risks": [], "related_decrees": []}}]
//! ```

use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::types::ArticleInput;
use serde::Deserialize;
use std::path::Path;

use crate::pipeline::LegalAdvisor;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedKnowledge {
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub practical_risks: Vec<String>,
    #[serde(default)]
    pub related_decrees: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedRecord {
    pub law_id: String,
    pub article_num: String,
    pub content: String,
    #[serde(default)]
    pub knowledge_base: SeedKnowledge,
}

impl From<SeedRecord> for ArticleInput {
    fn from(record: SeedRecord) -> Self {
        ArticleInput {
            law_id: record.law_id,
            article_num: record.article_num,
            content: record.content,
            conflicts: record.knowledge_base.conflicts,
            practical_risks: record.knowledge_base.practical_risks,
            related_decrees: record.knowledge_base.related_decrees,
        }
    }
}

pub fn parse_seed(json: &str) -> Result<Vec<SeedRecord>> {
    Ok(serde_json::from_str(json)?)
}

pub fn load_seed_file(path: &Path) -> Result<Vec<SeedRecord>> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        LexError::Config(format!("cannot read seed file {}: {e}", path.display()))
    })?;
    parse_seed(&raw)
}

/// Write every record through the advisor's write path.
///
/// With `reset` both stores are cleared first. Stops at the first failure;
/// records written before it stay written. Returns the number of articles
/// stored.
pub async fn seed(advisor: &LegalAdvisor, records: Vec<SeedRecord>, reset: bool) -> Result<usize> {
    if reset {
        advisor.reset().await?;
    }

    let total = records.len();
    tracing::info!("🌱 Seeding {total} articles (embedding via {})", advisor.encoder_name());
    for (i, record) in records.into_iter().enumerate() {
        let article_num = record.article_num.clone();
        advisor.upsert_article(record.into()).await.map_err(|e| {
            tracing::error!("❌ Seeding stopped at article {article_num} ({}/{total}): {e}", i + 1);
            e
        })?;
        tracing::debug!("  [{}/{total}] article {article_num}", i + 1);
    }
    tracing::info!("✅ Seeded {total} articles");
    Ok(total)
}
