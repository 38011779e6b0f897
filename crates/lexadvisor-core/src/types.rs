//! Domain types shared by the stores, the retrieval pipeline and the gateway.

use serde::{Deserialize, Serialize};

/// A stored legal article with the embedding of its current content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub law_id: String,
    /// Unique key.
    pub article_num: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
}

/// Curated annotations attached to an article by number.
///
/// Not referentially enforced: an annex may exist without its article and
/// most lookups tolerate a missing annex.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeAnnex {
    pub target_article: String,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub practical_risks: Vec<String>,
    #[serde(default)]
    pub related_decrees: Vec<String>,
}

impl KnowledgeAnnex {
    /// Stand-in for an article that has no annex record.
    pub fn empty(target_article: &str) -> Self {
        Self {
            target_article: target_article.to_string(),
            ..Default::default()
        }
    }
}

/// Best candidate of a similarity scan. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub article: Article,
    pub score: f64,
}

/// Write-path request: article text plus its annex lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleInput {
    pub law_id: String,
    pub article_num: String,
    pub content: String,
    #[serde(default)]
    pub conflicts: Vec<String>,
    #[serde(default)]
    pub practical_risks: Vec<String>,
    #[serde(default)]
    pub related_decrees: Vec<String>,
}

impl ArticleInput {
    /// Annex half of the request.
    pub fn annex(&self) -> KnowledgeAnnex {
        KnowledgeAnnex {
            target_article: self.article_num.clone(),
            conflicts: self.conflicts.clone(),
            practical_risks: self.practical_risks.clone(),
            related_decrees: self.related_decrees.clone(),
        }
    }
}

/// Admin listing row: an article without its embedding, joined with its annex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub law_id: String,
    pub article_num: String,
    pub content: String,
    pub dimensions: usize,
    pub updated_at: String,
    /// `None` when the article has no annex record.
    pub kb_info: Option<KnowledgeAnnex>,
}

/// A grounded answer for a matched article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundedAnswer {
    pub law_id: String,
    pub article_num: String,
    pub content: String,
    pub score: f64,
    pub conflicts: Vec<String>,
    pub practical_risks: Vec<String>,
    pub related_decrees: Vec<String>,
    pub ai_response: String,
}

/// Result of `search`: either a grounded answer or an explicit "not found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub answer: Option<GroundedAnswer>,
}

pub const NOT_FOUND_MESSAGE: &str = "No matching legal article was found in the database.";

impl SearchResponse {
    pub fn found(answer: GroundedAnswer) -> Self {
        Self {
            found: true,
            message: None,
            answer: Some(answer),
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            message: Some(NOT_FOUND_MESSAGE.to_string()),
            answer: None,
        }
    }
}

/// Outcome of `delete_article`. Removing an absent record is not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteReport {
    pub article_removed: bool,
    pub annex_removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_serializes_message_only() {
        let json = serde_json::to_value(SearchResponse::not_found()).unwrap();
        assert_eq!(json["found"], false);
        assert!(json["message"].is_string());
        assert!(json.get("article_num").is_none());
        assert!(json.get("conflicts").is_none());
    }

    #[test]
    fn test_found_flattens_answer_with_list_fields() {
        let resp = SearchResponse::found(GroundedAnswer {
            law_id: "LD-2019".into(),
            article_num: "113".into(),
            content: "Annual leave".into(),
            score: 0.91,
            conflicts: vec![],
            practical_risks: vec![],
            related_decrees: vec![],
            ai_response: "You get 12 days.".into(),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["found"], true);
        assert!(json.get("message").is_none());
        assert_eq!(json["article_num"], "113");
        // Empty lists are present, never null
        assert_eq!(json["conflicts"], serde_json::json!([]));
        assert_eq!(json["practical_risks"], serde_json::json!([]));
        assert_eq!(json["related_decrees"], serde_json::json!([]));
    }

    #[test]
    fn test_article_input_defaults_lists() {
        let input: ArticleInput = serde_json::from_str(
            r#"{"law_id":"LD","article_num":"7","content":"text"}"#,
        )
        .unwrap();
        let annex = input.annex();
        assert_eq!(annex.target_article, "7");
        assert!(annex.conflicts.is_empty());
        assert!(annex.practical_risks.is_empty());
    }

    #[test]
    fn test_empty_annex() {
        let annex = KnowledgeAnnex::empty("9");
        assert_eq!(annex.target_article, "9");
        assert!(annex.related_decrees.is_empty());
    }
}
