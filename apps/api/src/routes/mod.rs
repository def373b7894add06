pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::matching::handlers as matching;
use crate::parsing::handlers as parsing;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Profile document
        .route(
            "/api/profile",
            get(profile::handle_get_profile).put(profile::handle_put_profile),
        )
        .route("/api/cv/enrich", post(profile::handle_enrich))
        // CV upload
        .route("/api/cv/parse", post(parsing::handle_parse))
        .route(
            "/api/cv/parse-and-enrich",
            post(parsing::handle_parse_and_enrich),
        )
        // Matching
        .route("/api/jd/summary", post(matching::handle_jd_summary))
        .route("/api/cv/match", post(matching::handle_match))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::llm_client::testing::ScriptedOracle;
    use crate::llm_client::Oracle;

    fn app(dir: &tempfile::TempDir, oracle: Option<Arc<dyn Oracle>>) -> Router {
        let config = Config::for_tests(dir.path().join("profile.json"));
        build_router(AppState::new(config, oracle).unwrap())
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, None)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_profile_round_trip_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(&dir, None);

        let missing = router
            .clone()
            .oneshot(Request::get("/api/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let profile = json!({"personal": {"firstName": "Ana"}, "experience": []});
        let saved = router
            .clone()
            .oneshot(json_request("PUT", "/api/profile", profile.clone()))
            .await
            .unwrap();
        assert_eq!(saved.status(), StatusCode::OK);

        let loaded = router
            .oneshot(Request::get("/api/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(loaded).await, profile);
    }

    #[tokio::test]
    async fn test_put_profile_without_personal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, None)
            .oneshot(json_request("PUT", "/api/profile", json!({"experience": []})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_enrich_without_credential_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, None)
            .oneshot(json_request(
                "POST",
                "/api/cv/enrich",
                json!({"profile": {"personal": {}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_enrich_returns_profile_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let oracle: Arc<dyn Oracle> = Arc::new(ScriptedOracle::fixed("{}"));
        let response = app(&dir, Some(oracle))
            .oneshot(json_request(
                "POST",
                "/api/cv/enrich",
                json!({"profile": {"personal": {}, "experience": [{"raw": "x"}]}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body["profile"]["constraints"]["cannotModify"][0],
            "dates"
        );
        assert_eq!(body["report"]["entries"][0]["status"], "enriched");
    }

    #[tokio::test]
    async fn test_match_without_any_jd_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, None)
            .oneshot(json_request(
                "POST",
                "/api/cv/match",
                json!({"profile": {"personal": {}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_match_uses_cached_jd_from_summary() {
        let dir = tempfile::tempdir().unwrap();
        let router = app(&dir, None);

        let summary = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/jd/summary",
                json!({"jd_text": "Senior Data Engineer con Spark"}),
            ))
            .await
            .unwrap();
        assert_eq!(summary.status(), StatusCode::OK);
        assert_eq!(
            body_json(summary).await["jd_summary"],
            "Senior Data Engineer con Spark"
        );

        let report = router
            .oneshot(json_request(
                "POST",
                "/api/cv/match",
                json!({"profile": {"personal": {}}}),
            ))
            .await
            .unwrap();
        assert_eq!(report.status(), StatusCode::OK);
        let body = body_json(report).await;
        assert_eq!(body["score"], 0);
        assert_eq!(body["recommendation"], "no_postularse");
    }

    #[tokio::test]
    async fn test_match_oracle_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let oracle: Arc<dyn Oracle> = Arc::new(ScriptedOracle::fixed("not json"));
        let response = app(&dir, Some(oracle))
            .oneshot(json_request(
                "POST",
                "/api/cv/match",
                json!({"profile": {"personal": {}}, "jd": "Data Engineer"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "MALFORMED_ORACLE_RESPONSE"
        );
    }

    #[tokio::test]
    async fn test_jd_summary_needs_some_input() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir, None)
            .oneshot(json_request("POST", "/api/jd/summary", json!({"jd_text": "  "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
