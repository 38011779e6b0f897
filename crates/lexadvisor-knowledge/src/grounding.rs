//! Grounding assembler: joins the matched article with its annex and renders
//! the generation prompt.
//!
//! Only the practical risks reach the model. Conflicts and related decrees
//! travel back to the caller as display metadata.

use lexadvisor_core::error::{LexError, Result};
use lexadvisor_core::traits::AnnexStore;
use lexadvisor_core::types::{Article, KnowledgeAnnex};
use std::sync::Arc;

pub const DEFAULT_TEMPLATE: &str = "\
You are a legal consultant. Using only the information below, answer the user's question briefly and in plain language.

LAW CONTENT:
{law_content}

PRACTICAL RISKS TO NOTE:
{risks}

USER QUESTION:
{question}

Summarize the relevant rules and give your advice:
";

/// Prompt plus the annex it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct GroundedPrompt {
    pub prompt: String,
    /// Untouched annex (empty lists when the article has none).
    pub annex: KnowledgeAnnex,
}

/// Fill `{law_content}`, `{risks}` and `{question}` in one pass.
///
/// Substituted values are never rescanned, so an article that happens to
/// contain `{question}` is rendered literally.
pub fn render_template(template: &str, law_content: &str, risks: &str, question: &str) -> String {
    let slots = [
        ("{law_content}", law_content),
        ("{risks}", risks),
        ("{question}", question),
    ];
    let mut out = String::with_capacity(
        template.len() + law_content.len() + risks.len() + question.len(),
    );
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match slots.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// One risk per line, original order. Empty list → empty block.
pub fn risk_block(risks: &[String]) -> String {
    risks.join("\n")
}

pub struct GroundingAssembler {
    annexes: Arc<dyn AnnexStore>,
    template: String,
}

impl GroundingAssembler {
    pub fn new(annexes: Arc<dyn AnnexStore>, template: Option<String>) -> Self {
        Self {
            annexes,
            template: template.unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
        }
    }

    /// Look up the article's annex (absent → empty) and render the prompt.
    pub async fn assemble(&self, article: &Article, query_text: &str) -> Result<GroundedPrompt> {
        let annex = self
            .annexes
            .get(&article.article_num)
            .await
            .map_err(|e| {
                tracing::error!("❌ Annex lookup failed for article {}: {e}", article.article_num);
                LexError::RetrievalUnavailable(format!(
                    "knowledge annex for article {}: {e}",
                    article.article_num
                ))
            })?
            .unwrap_or_else(|| KnowledgeAnnex::empty(&article.article_num));

        let prompt = render_template(
            &self.template,
            &article.content,
            &risk_block(&annex.practical_risks),
            query_text,
        );
        Ok(GroundedPrompt { prompt, annex })
    }
}
