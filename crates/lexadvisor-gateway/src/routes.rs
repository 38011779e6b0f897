//! API route handlers for the gateway.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use lexadvisor_core::error::LexError;
use lexadvisor_core::types::ArticleInput;
use serde::Deserialize;
use std::sync::Arc;

use super::server::AppState;

type ApiResponse = (StatusCode, Json<serde_json::Value>);

/// Map a pipeline failure to a JSON error body.
///
/// `detail` carries the same message as `error` for clients written against
/// the `{detail}` error shape.
fn error_response(e: &LexError) -> ApiResponse {
    let status = match e {
        LexError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(serde_json::json!({
            "ok": false,
            "error": e.to_string(),
            "detail": e.to_string(),
            "kind": e.kind(),
        })),
    )
}

fn ok(body: serde_json::Value) -> ApiResponse {
    (StatusCode::OK, Json(body))
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lexadvisor-gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Accepted for client compatibility; the server always uses its own credentials.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Answer a legal question from the best-matching article.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SearchRequest>,
) -> ApiResponse {
    if body.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        tracing::debug!("Ignoring client-supplied api_key on /api/search");
    }
    match state.advisor.search(&body.query).await {
        Ok(resp) => match serde_json::to_value(resp) {
            Ok(json) => ok(json),
            Err(e) => error_response(&e.into()),
        },
        Err(e) => {
            tracing::error!("❌ Search failed: {e}");
            error_response(&e)
        }
    }
}

/// List all articles with their knowledge annex.
pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResponse {
    match state.advisor.list_articles().await {
        Ok(articles) => match serde_json::to_value(articles) {
            Ok(json) => ok(json),
            Err(e) => error_response(&e.into()),
        },
        Err(e) => error_response(&e),
    }
}

/// Create or update an article and its annex; the embedding is recomputed.
pub async fn upsert_article(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ArticleInput>,
) -> ApiResponse {
    let article_num = body.article_num.clone();
    match state.advisor.upsert_article(body).await {
        Ok(()) => ok(serde_json::json!({
            "status": "success",
            "message": format!("Article {article_num} saved."),
        })),
        Err(e) => {
            tracing::error!("❌ Saving article {article_num} failed: {e}");
            error_response(&e)
        }
    }
}

/// Delete an article and its annex. Deleting a missing article succeeds.
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(article_num): Path<String>,
) -> ApiResponse {
    match state.advisor.delete_article(&article_num).await {
        Ok(report) => ok(serde_json::json!({
            "status": "success",
            "message": format!("Article {article_num} deleted."),
            "article_removed": report.article_removed,
            "annex_removed": report.annex_removed,
        })),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexadvisor_core::config::{GatewayConfig, LexConfig};
    use lexadvisor_core::testing::{FailingEncoder, FailingGenerator, ScriptedGenerator, StaticEncoder};
    use lexadvisor_core::traits::{Encoder, Generator};
    use lexadvisor_knowledge::{LegalAdvisor, SqliteAnnexStore, SqliteArticleStore};

    fn test_state_with(encoder: Arc<dyn Encoder>, generator: Arc<dyn Generator>) -> State<Arc<AppState>> {
        let advisor = LegalAdvisor::new(
            encoder,
            generator,
            Arc::new(SqliteArticleStore::open_in_memory().unwrap()),
            Arc::new(SqliteAnnexStore::open_in_memory().unwrap()),
            &LexConfig::default(),
        );
        State(Arc::new(AppState {
            gateway_config: GatewayConfig::default(),
            start_time: std::time::Instant::now(),
            advisor: Arc::new(advisor),
        }))
    }

    fn test_state() -> State<Arc<AppState>> {
        test_state_with(
            Arc::new(StaticEncoder::uniform(vec![0.3, 0.9, 0.1])),
            Arc::new(ScriptedGenerator::new("You are entitled to 12 days.")),
        )
    }

    fn article(num: &str) -> ArticleInput {
        ArticleInput {
            law_id: "BLLD-2019".into(),
            article_num: num.into(),
            content: "Annual leave is 12 working days.".into(),
            conflicts: vec!["Decree 145 counts differently".into()],
            practical_risks: vec!["Unused leave is often not paid out".into()],
            related_decrees: vec![],
        }
    }

    fn search_req(query: &str) -> Json<SearchRequest> {
        Json(SearchRequest {
            query: query.into(),
            api_key: Some("client-key".into()),
        })
    }

    // ---- Health ----

    #[tokio::test]
    async fn test_health_check() {
        let json = health_check(test_state()).await.0;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "lexadvisor-gateway");
        assert!(json["version"].is_string());
        assert!(json["uptime_secs"].is_u64());
    }

    // ---- Search ----

    #[tokio::test]
    async fn test_search_empty_corpus_not_found() {
        let (status, Json(json)) = search(test_state(), search_req("leave")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["found"], false);
        assert!(json["message"].is_string());
        assert!(json.get("ai_response").is_none());
    }

    #[tokio::test]
    async fn test_search_found() {
        let state = test_state();
        upsert_article(state.clone(), Json(article("5"))).await;

        let (status, Json(json)) = search(state, search_req("How many leave days?")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["found"], true);
        assert_eq!(json["law_id"], "BLLD-2019");
        assert_eq!(json["article_num"], "5");
        assert_eq!(json["conflicts"][0], "Decree 145 counts differently");
        assert_eq!(json["related_decrees"], serde_json::json!([]));
        assert_eq!(json["ai_response"], "You are entitled to 12 days.");
    }

    #[tokio::test]
    async fn test_search_generation_failure_is_500() {
        let state = test_state_with(
            Arc::new(StaticEncoder::uniform(vec![1.0])),
            Arc::new(FailingGenerator),
        );
        upsert_article(state.clone(), Json(article("5"))).await;

        let (status, Json(json)) = search(state, search_req("leave")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["ok"], false);
        assert_eq!(json["kind"], "generation_unavailable");
        assert!(json["error"].as_str().unwrap().contains("quota"));
        assert_eq!(json["detail"], json["error"]);
    }

    #[tokio::test]
    async fn test_search_encoder_failure_is_500() {
        let state = test_state_with(Arc::new(FailingEncoder), Arc::new(ScriptedGenerator::new("x")));
        let (status, Json(json)) = search(state, search_req("leave")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "encoding_unavailable");
    }

    // ---- Admin ----

    #[tokio::test]
    async fn test_upsert_and_list_articles() {
        let state = test_state();
        let (status, Json(json)) = upsert_article(state.clone(), Json(article("113"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");

        let (status, Json(json)) = list_articles(state).await;
        assert_eq!(status, StatusCode::OK);
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["article_num"], "113");
        assert_eq!(items[0]["dimensions"], 3);
        assert!(items[0].get("embedding").is_none());
        assert_eq!(
            items[0]["kb_info"]["practical_risks"][0],
            "Unused leave is often not paid out"
        );
    }

    #[tokio::test]
    async fn test_upsert_rejects_empty_article_num() {
        let (status, Json(json)) = upsert_article(test_state(), Json(article(""))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "invalid_input");
    }

    #[tokio::test]
    async fn test_upsert_encoder_down_is_500() {
        let state = test_state_with(Arc::new(FailingEncoder), Arc::new(ScriptedGenerator::new("x")));
        let (status, Json(json)) = upsert_article(state.clone(), Json(article("1"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["kind"], "encoding_unavailable");

        let (_, Json(listed)) = list_articles(state).await;
        assert_eq!(listed, serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_delete_article() {
        let state = test_state();
        upsert_article(state.clone(), Json(article("113"))).await;

        let (status, Json(json)) = delete_article(state.clone(), Path("113".into())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["article_removed"], true);
        assert_eq!(json["annex_removed"], true);

        // Second delete still succeeds
        let (status, Json(json)) = delete_article(state.clone(), Path("113".into())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["article_removed"], false);

        let (_, Json(json)) = search(state, search_req("leave")).await;
        assert_eq!(json["found"], false);
    }
}
