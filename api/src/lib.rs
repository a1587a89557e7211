use std::{env, sync::Arc};

pub mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    middleware_layer::{
        cors::{DEFAULT_CORS_ORIGINS, cors_layer},
        request_id::request_id,
    },
    routes::{
        health_route::health,
        history::history_route::{clear_history, list_history},
        query::{query_route::query, stream_route::stream_query},
        root_route::root,
    },
};

pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

/// All routes behind CORS for `cors_origins`, wrapped in request-id tagging.
///
/// The request-id layer sits outside CORS so preflight answers carry the id too.
pub fn router(state: Arc<AppState>, cors_origins: &str) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/query", post(query))
        .route("/api/query/stream", post(stream_query))
        .route("/api/history", get(list_history).delete(clear_history))
        .layer(cors_layer(cors_origins))
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

pub async fn start() -> Result<(), AppError> {
    let host_url = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_API_ADDRESS.into());
    let origins = env::var("CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into());

    let state = Arc::new(AppState::from_env()?);

    let app = router(state, &origins).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&host_url)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %host_url, cors_origins = %origins, "travel assistant API listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use ai_llm_service::{
        AiLlmError, FragmentStream, ModelGateway, ProviderError, ProviderErrorKind,
        config::llm_provider::LlmProvider,
    };
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use futures::{StreamExt, stream};
    use http_body_util::BodyExt;
    use query_engine::EngineSettings;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    /// Answers with a fixed text, streamed word by word, or fails on demand.
    struct FakeGateway {
        answer: &'static str,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelGateway for FakeGateway {
        async fn complete(&self, _prompt: &str) -> Result<String, AiLlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ProviderError::new(
                    LlmProvider::Gemini,
                    ProviderErrorKind::Upstream("quota exceeded".into()),
                )
                .into());
            }
            Ok(self.answer.to_string())
        }

        async fn complete_streaming(&self, _prompt: &str) -> Result<FragmentStream, AiLlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut items: Vec<Result<String, AiLlmError>> = self
                .answer
                .split_inclusive(' ')
                .map(|w| Ok(w.to_string()))
                .collect();
            if self.fail {
                items.push(Err(ProviderError::new(
                    LlmProvider::Gemini,
                    ProviderErrorKind::Upstream("stream broke".into()),
                )
                .into()));
            }
            Ok(stream::iter(items).boxed())
        }

        fn provider(&self) -> LlmProvider {
            LlmProvider::Gemini
        }

        fn model(&self) -> &str {
            "fake"
        }
    }

    fn state_with(answer: &'static str, fail: bool) -> Arc<AppState> {
        let gateway = Arc::new(FakeGateway {
            answer,
            fail,
            calls: AtomicUsize::new(0),
        });
        let settings = EngineSettings::default()
            .with_stream_pacing(Duration::ZERO)
            .with_model_timeout(Duration::from_secs(5));
        Arc::new(AppState::new(gateway, settings))
    }

    fn app(state: &Arc<AppState>) -> Router {
        router(state.clone(), DEFAULT_CORS_ORIGINS)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn body_text(res: axum::response::Response) -> String {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn sse_payloads(raw: &str) -> Vec<Value> {
        raw.split("\n\n")
            .filter(|frame| !frame.trim().is_empty())
            .map(|frame| {
                let data = frame.strip_prefix("data: ").expect("data frame");
                serde_json::from_str(data).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn root_lists_endpoints() {
        let state = state_with("x", false);
        let res = app(&state).oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        let body = body_json(res).await;
        assert_eq!(body["message"], "Travel Assistant API");
        assert_eq!(body["endpoints"]["query"], "/api/query");
    }

    #[tokio::test]
    async fn request_id_is_echoed() {
        let state = state_with("x", false);
        let req = Request::get("/health")
            .header("x-request-id", "trace-42")
            .body(Body::empty())
            .unwrap();
        let res = app(&state).oneshot(req).await.unwrap();
        assert_eq!(res.headers()["x-request-id"], "trace-42");
    }

    #[tokio::test]
    async fn cors_preflight_carries_request_id() {
        let state = state_with("x", false);
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/query")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let res = app(&state).oneshot(req).await.unwrap();
        assert!(res.status().is_success());
        let headers = res.headers();
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
    }

    #[tokio::test]
    async fn foreign_origin_gets_no_cors_grant() {
        let state = state_with("x", false);
        let req = Request::get("/health")
            .header(header::ORIGIN, "http://evil.test")
            .body(Body::empty())
            .unwrap();
        let res = app(&state).oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));
        assert!(!res.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn query_answers_and_records() {
        let state = state_with("Spring is best.", false);

        let res = app(&state)
            .oneshot(post_json("/api/query", json!({ "question": "Best time to visit Japan?" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body["question"], "Best time to visit Japan?");
        assert_eq!(body["answer"], "Spring is best.");
        assert!(body["id"].is_string());
        assert!(body["processing_time"].as_f64().unwrap() >= 0.0);

        let res = app(&state).oneshot(get("/api/history")).await.unwrap();
        let page = body_json(res).await;
        assert_eq!(page["total_count"], 1);
        assert_eq!(page["queries"][0]["id"], body["id"]);
    }

    #[tokio::test]
    async fn invalid_question_is_rejected_without_model_call() {
        let state = state_with("x", false);

        for question in [String::new(), "a".repeat(1001)] {
            let res = app(&state)
                .oneshot(post_json("/api/query", json!({ "question": question })))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
            let body = body_json(res).await;
            assert_eq!(body["error"], "VALIDATION_ERROR");
            assert!(body["detail"].is_string());
        }

        let res = app(&state)
            .oneshot(post_json("/api/query/stream", json!({ "question": "" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let state = state_with("x", false);
        let res = app(&state)
            .oneshot(post_json("/api/query", json!({ "q": "wrong field" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn model_failure_is_bad_gateway() {
        let state = state_with("x", true);
        let res = app(&state)
            .oneshot(post_json("/api/query", json!({ "question": "Where to eat in Rome?" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(res).await;
        assert_eq!(body["error"], "MODEL_ERROR");
        assert!(body["message"].as_str().unwrap().contains("quota exceeded"));
        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn stream_emits_framed_events() {
        let state = state_with("Go in spring.", false);
        let res = app(&state)
            .oneshot(post_json("/api/query/stream", json!({ "question": "Best time to visit Japan?" })))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let headers = res.headers();
        assert!(
            headers[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );
        assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        assert_eq!(headers["x-accel-buffering"], "no");

        let events = sse_payloads(&body_text(res).await);
        let types: Vec<&str> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["metadata", "content", "content", "content", "done"]);
        assert_eq!(events[0]["question"], "Best time to visit Japan?");

        let streamed: String = events
            .iter()
            .filter_map(|e| e["content"].as_str())
            .collect();
        assert_eq!(streamed, "Go in spring.");

        let page = state.history.list(10, 0).await;
        assert_eq!(page.total_count, 1);
        assert_eq!(page.queries[0].answer, streamed);
        assert_eq!(page.queries[0].id, events[0]["id"].as_str().unwrap());
    }

    #[tokio::test]
    async fn stream_failure_is_reported_in_band() {
        let state = state_with("Partial ", true);
        let res = app(&state)
            .oneshot(post_json("/api/query/stream", json!({ "question": "Is Lisbon walkable?" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let events = sse_payloads(&body_text(res).await);
        let last = events.last().unwrap();
        assert_eq!(last["type"], "error");
        assert!(last["error"].as_str().unwrap().contains("stream broke"));
        assert_eq!(events.iter().filter(|e| e["type"] == "done").count(), 0);
        assert_eq!(state.history.len().await, 0);
    }

    #[tokio::test]
    async fn history_paginates_and_clears() {
        let state = state_with("ok", false);
        for i in 0..15 {
            state.query_service.handle(&format!("question {i}")).await.unwrap();
        }

        let res = app(&state)
            .oneshot(get("/api/history?limit=5&offset=10"))
            .await
            .unwrap();
        let page = body_json(res).await;
        assert_eq!(page["total_count"], 15);
        assert_eq!(page["queries"].as_array().unwrap().len(), 5);

        let res = app(&state).oneshot(get("/api/history")).await.unwrap();
        assert_eq!(body_json(res).await["queries"].as_array().unwrap().len(), 10);

        let res = app(&state)
            .oneshot(Request::delete("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            body_json(res).await["message"],
            "Query history cleared successfully"
        );

        let res = app(&state).oneshot(get("/api/history")).await.unwrap();
        let page = body_json(res).await;
        assert_eq!(page["total_count"], 0);
        assert!(page["queries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn negative_pagination_is_bad_request() {
        let state = state_with("ok", false);
        for uri in ["/api/history?limit=-1", "/api/history?offset=-5", "/api/history?limit=ten"] {
            let res = app(&state).oneshot(get(uri)).await.unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }
}
