//! SQLite-backed article and knowledge-annex stores.
//!
//! Each store owns its connection and its table. An annex may outlive its
//! article and vice versa. Both may point at the same database file.

use async_trait::async_trait;
use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::{AnnexStore, ArticleStore, StoredArticle};
use lexadvisor_core::types::{Article, KnowledgeAnnex};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::Mutex;

fn storage_err(e: impl std::fmt::Display) -> LexError {
    LexError::Storage(e.to_string())
}

fn open_connection(path: &Path) -> Result<Connection> {
    if path != Path::new(":memory:") {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)
        .map_err(|e| LexError::Storage(format!("open {}: {e}", path.display())))?;
    // WAL lets the article and annex connections share one file
    if let Err(e) = conn.execute_batch("PRAGMA journal_mode=WAL;") {
        tracing::warn!("⚠️ WAL unavailable for {}, using default journal: {e}", path.display());
    }
    Ok(conn)
}

fn count_rows(conn: &Mutex<Connection>, table: &str) -> Result<usize> {
    let conn = conn.lock().map_err(storage_err)?;
    let n: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .map_err(storage_err)?;
    usize::try_from(n).map_err(storage_err)
}

/// Encode an embedding as little-endian f32 bytes.
pub fn encode_embedding(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian f32 blob, checking it against the stored dimension.
pub fn decode_embedding(blob: &[u8], dimensions: usize) -> std::result::Result<Vec<f32>, String> {
    if blob.len() % 4 != 0 {
        return Err(format!("embedding blob has {} bytes, not a multiple of 4", blob.len()));
    }
    let vector: Vec<f32> = blob
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    if vector.len() != dimensions {
        return Err(format!(
            "embedding has {} values but {} were recorded",
            vector.len(),
            dimensions
        ));
    }
    Ok(vector)
}

// ─── Articles ───────────────────────────────────────────────────────────────

/// Article store: one row per article number, embedding as a BLOB.
pub struct SqliteArticleStore {
    conn: Mutex<Connection>,
}

impl SqliteArticleStore {
    /// Open or create the store at `path` (`:memory:` allowed).
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(open_connection(path)?),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS articles (
                article_num TEXT PRIMARY KEY,
                law_id TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL,
                embedding BLOB NOT NULL,
                dimensions INTEGER NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| LexError::Storage(format!("articles migration: {e}")))?;
        Ok(())
    }

    /// Number of stored articles.
    pub fn count(&self) -> Result<usize> {
        count_rows(&self.conn, "articles")
    }

    /// Raw row access for tests that need to corrupt a record.
    #[cfg(test)]
    pub(crate) fn execute_raw(&self, sql: &str) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute_batch(sql).map_err(storage_err)
    }
}

/// One undecoded `articles` row.
struct ArticleRow {
    article_num: String,
    law_id: String,
    content: String,
    embedding: Vec<u8>,
    dimensions: i64,
    updated_at: String,
}

impl ArticleRow {
    fn decode(self) -> Result<(Article, String)> {
        let dimensions = usize::try_from(self.dimensions).map_err(|_| LexError::InvalidRecord {
            key: self.article_num.clone(),
            reason: format!("negative dimension {}", self.dimensions),
        })?;
        let embedding =
            decode_embedding(&self.embedding, dimensions).map_err(|reason| LexError::InvalidRecord {
                key: self.article_num.clone(),
                reason,
            })?;
        Ok((
            Article {
                law_id: self.law_id,
                article_num: self.article_num,
                content: self.content,
                embedding,
            },
            self.updated_at,
        ))
    }
}

impl SqliteArticleStore {
    /// Read every row in insertion order. Per-row failures stay per-row.
    fn read_rows(&self) -> Result<Vec<Result<ArticleRow>>> {
        let conn = self.conn.lock().map_err(storage_err)?;
        let mut stmt = conn
            .prepare(
                "SELECT article_num, law_id, content, embedding, dimensions, updated_at
                 FROM articles ORDER BY rowid",
            )
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ArticleRow {
                    article_num: row.get(0)?,
                    law_id: row.get(1)?,
                    content: row.get(2)?,
                    embedding: row.get(3)?,
                    dimensions: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            })
            .map_err(storage_err)?;
        Ok(rows
            .map(|r| {
                r.map_err(|e| LexError::InvalidRecord {
                    key: "?".into(),
                    reason: e.to_string(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn scan_all(&self) -> Result<Vec<Result<Article>>> {
        let rows = self.read_rows()?;
        Ok(rows
            .into_iter()
            .map(|row| row.and_then(ArticleRow::decode).map(|(article, _)| article))
            .collect())
    }

    async fn upsert(&self, article: Article) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        // ON CONFLICT keeps the rowid, so an update keeps its scan position
        conn.execute(
            "INSERT INTO articles (article_num, law_id, content, embedding, dimensions, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(article_num) DO UPDATE SET
                law_id = excluded.law_id,
                content = excluded.content,
                embedding = excluded.embedding,
                dimensions = excluded.dimensions,
                updated_at = excluded.updated_at",
            params![
                article.article_num,
                article.law_id,
                article.content,
                encode_embedding(&article.embedding),
                article.embedding.len() as i64,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn delete(&self, article_num: &str) -> Result<bool> {
        let conn = self.conn.lock().map_err(storage_err)?;
        let n = conn
            .execute("DELETE FROM articles WHERE article_num = ?1", params![article_num])
            .map_err(storage_err)?;
        Ok(n > 0)
    }

    async fn list(&self) -> Result<Vec<StoredArticle>> {
        let rows = self.read_rows()?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            match row.and_then(ArticleRow::decode) {
                Ok((article, updated_at)) => out.push(StoredArticle { article, updated_at }),
                Err(e) => tracing::warn!("⚠️ Skipping unreadable article row: {e}"),
            }
        }
        Ok(out)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute("DELETE FROM articles", []).map_err(storage_err)?;
        Ok(())
    }
}

// ─── Knowledge annex ────────────────────────────────────────────────────────

/// Annex store: one row per target article, lists as JSON text.
pub struct SqliteAnnexStore {
    conn: Mutex<Connection>,
}

impl SqliteAnnexStore {
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(open_connection(path)?),
        };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(Path::new(":memory:"))
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS knowledge_base (
                target_article TEXT PRIMARY KEY,
                conflicts_json TEXT NOT NULL DEFAULT '[]',
                practical_risks_json TEXT NOT NULL DEFAULT '[]',
                related_decrees_json TEXT NOT NULL DEFAULT '[]',
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| LexError::Storage(format!("knowledge_base migration: {e}")))?;
        Ok(())
    }

    /// Number of stored annexes.
    pub fn count(&self) -> Result<usize> {
        count_rows(&self.conn, "knowledge_base")
    }
}

fn parse_list(key: &str, column: &str, json: &str) -> Result<Vec<String>> {
    serde_json::from_str(json).map_err(|e| LexError::InvalidRecord {
        key: key.to_string(),
        reason: format!("{column}: {e}"),
    })
}

#[async_trait]
impl AnnexStore for SqliteAnnexStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn get(&self, target_article: &str) -> Result<Option<KnowledgeAnnex>> {
        let conn = self.conn.lock().map_err(storage_err)?;
        let row = conn
            .query_row(
                "SELECT conflicts_json, practical_risks_json, related_decrees_json
                 FROM knowledge_base WHERE target_article = ?1",
                params![target_article],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(storage_err)?;

        let Some((conflicts, risks, decrees)) = row else {
            return Ok(None);
        };
        Ok(Some(KnowledgeAnnex {
            target_article: target_article.to_string(),
            conflicts: parse_list(target_article, "conflicts", &conflicts)?,
            practical_risks: parse_list(target_article, "practical_risks", &risks)?,
            related_decrees: parse_list(target_article, "related_decrees", &decrees)?,
        }))
    }

    async fn upsert(&self, annex: KnowledgeAnnex) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute(
            "INSERT OR REPLACE INTO knowledge_base
                (target_article, conflicts_json, practical_risks_json, related_decrees_json, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                annex.target_article,
                serde_json::to_string(&annex.conflicts)?,
                serde_json::to_string(&annex.practical_risks)?,
                serde_json::to_string(&annex.related_decrees)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    async fn delete(&self, target_article: &str) -> Result<bool> {
        let conn = self.conn.lock().map_err(storage_err)?;
        let n = conn
            .execute(
                "DELETE FROM knowledge_base WHERE target_article = ?1",
                params![target_article],
            )
            .map_err(storage_err)?;
        Ok(n > 0)
    }

    async fn clear(&self) -> Result<()> {
        let conn = self.conn.lock().map_err(storage_err)?;
        conn.execute("DELETE FROM knowledge_base", []).map_err(storage_err)?;
        Ok(())
    }
}
