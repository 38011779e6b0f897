//! The retrieval-augmented answer pipeline and its write path.

use lexadvisor_core::config::LexConfig;
use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::{AnnexStore, ArticleStore, Encoder, Generator};
use lexadvisor_core::types::{
    Article, ArticleInput, ArticleSummary, DeleteReport, GroundedAnswer, SearchResponse,
};
use std::sync::Arc;

use crate::grounding::GroundingAssembler;
use crate::matcher::{ArticleRetriever, BruteForceRetriever};

/// Query → retrieve → ground → generate, plus article maintenance.
///
/// Stateless across requests: every field is shared, read-only wiring.
pub struct LegalAdvisor {
    encoder: Arc<dyn Encoder>,
    generator: Arc<dyn Generator>,
    articles: Arc<dyn ArticleStore>,
    annexes: Arc<dyn AnnexStore>,
    retriever: Arc<dyn ArticleRetriever>,
    assembler: GroundingAssembler,
    temperature: f32,
}

impl LegalAdvisor {
    /// Wire the pipeline with a brute-force retriever.
    pub fn new(
        encoder: Arc<dyn Encoder>,
        generator: Arc<dyn Generator>,
        articles: Arc<dyn ArticleStore>,
        annexes: Arc<dyn AnnexStore>,
        config: &LexConfig,
    ) -> Self {
        let retriever = Arc::new(BruteForceRetriever::new(
            encoder.clone(),
            articles.clone(),
            config.retrieval.threshold,
        ));
        let assembler = GroundingAssembler::new(annexes.clone(), config.prompt.template.clone());
        Self {
            encoder,
            generator,
            articles,
            annexes,
            retriever,
            assembler,
            temperature: config.llm.temperature,
        }
    }

    /// Replace the retriever (e.g. with an indexed implementation).
    pub fn with_retriever(mut self, retriever: Arc<dyn ArticleRetriever>) -> Self {
        self.retriever = retriever;
        self
    }

    pub fn encoder_name(&self) -> &str {
        self.encoder.name()
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    /// Answer a question from the single best-matching article.
    ///
    /// Either a fully grounded answer or `found = false`; never a partial answer.
    pub async fn search(&self, query: &str) -> Result<SearchResponse> {
        let Some(matched) = self.retriever.find_best_match(query).await? else {
            tracing::info!("🔍 No article above threshold for query ({} chars)", query.len());
            return Ok(SearchResponse::not_found());
        };

        tracing::info!(
            "🔍 Matched article {} ({}) score={:.4}",
            matched.article.article_num,
            matched.article.law_id,
            matched.score
        );

        let grounded = self.assembler.assemble(&matched.article, query).await?;

        let ai_response = self
            .generator
            .complete(&grounded.prompt, self.temperature)
            .await
            .map_err(|e| {
                tracing::error!("❌ Generation failed ({}): {e}", self.generator.name());
                match e {
                    LexError::GenerationUnavailable(_) => e,
                    other => LexError::GenerationUnavailable(other.to_string()),
                }
            })?;

        let Article {
            law_id,
            article_num,
            content,
            ..
        } = matched.article;
        Ok(SearchResponse::found(GroundedAnswer {
            law_id,
            article_num,
            content,
            score: matched.score,
            conflicts: grounded.annex.conflicts,
            practical_risks: grounded.annex.practical_risks,
            related_decrees: grounded.annex.related_decrees,
            ai_response,
        }))
    }

    /// Create or replace an article and its annex.
    ///
    /// The embedding is recomputed on every call. The two writes are
    /// independent: if the annex write fails the article is already updated.
    pub async fn upsert_article(&self, input: ArticleInput) -> Result<()> {
        if input.article_num.trim().is_empty() {
            return Err(LexError::InvalidInput("article_num must not be empty".into()));
        }

        let embedding = self.encoder.embed(&input.content).await?;
        let annex = input.annex();
        let article_num = input.article_num.clone();

        self.articles
            .upsert(Article {
                law_id: input.law_id,
                article_num: input.article_num,
                content: input.content,
                embedding,
            })
            .await?;

        if let Err(e) = self.annexes.upsert(annex).await {
            tracing::warn!(
                "⚠️ Article {article_num} saved but its knowledge annex was not: {e}"
            );
            return Err(e);
        }

        tracing::info!("💾 Saved article {article_num}");
        Ok(())
    }

    /// Remove an article and its annex. Missing records are not an error.
    pub async fn delete_article(&self, article_num: &str) -> Result<DeleteReport> {
        let article_removed = self.articles.delete(article_num).await?;
        let annex_removed = self.annexes.delete(article_num).await?;
        tracing::info!(
            "🗑️ Delete article {article_num}: article={article_removed}, annex={annex_removed}"
        );
        Ok(DeleteReport {
            article_removed,
            annex_removed,
        })
    }

    /// All articles (without embeddings) joined with their annex.
    pub async fn list_articles(&self) -> Result<Vec<ArticleSummary>> {
        let stored = self.articles.list().await?;
        let mut out = Vec::with_capacity(stored.len());
        for item in stored {
            let kb_info = self.annexes.get(&item.article.article_num).await?;
            out.push(ArticleSummary {
                dimensions: item.article.embedding.len(),
                law_id: item.article.law_id,
                article_num: item.article.article_num,
                content: item.article.content,
                updated_at: item.updated_at,
                kb_info,
            });
        }
        Ok(out)
    }

    /// Drop every article and annex.
    pub async fn reset(&self) -> Result<()> {
        self.articles.clear().await?;
        self.annexes.clear().await?;
        tracing::info!("🧹 Cleared articles and knowledge annexes");
        Ok(())
    }
}
