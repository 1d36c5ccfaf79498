use std::{net::SocketAddr, sync::Arc};

pub mod core;
pub mod error_handler;
mod routes;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use trigger_config::TriggerConfig;
use trigger_engine::TriggerEngine;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::{health::health_route::health, trigger_gitlab_mr::trigger_gitlab_mr_route::trigger_gitlab_mr},
};

/// Builds the engine from a validated config and serves until Ctrl+C.
pub async fn start(config: TriggerConfig) -> AppResult<()> {
    let engine = TriggerEngine::from_config(&config).map_err(AppError::Engine)?;
    let state = Arc::new(AppState::new(engine));
    let app = router(state, &config.server.path);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::Bind)?;
    info!(%addr, path = %config.server.path, "mr-jira-trigger is listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Webhook on `webhook_path`, liveness on `/health`.
pub fn router(state: Arc<AppState>, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(trigger_gitlab_mr))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOOK_PATH: &str = "/gitlab/webhook";

    struct Upstreams {
        jira: MockServer,
        gitlab: MockServer,
    }

    async fn app() -> (Router, Upstreams) {
        let jira = MockServer::start().await;
        let gitlab = MockServer::start().await;

        let yaml = format!(
            r#"
GitLab: {{ host: "{gitlab}", token: glpat }}
Jira: {{ host: "{jira}", username: bot, password: secret }}
Server: {{ port: 8080, path: {HOOK_PATH} }}
Trigger:
  regex: ['[A-Z]+-\d+']
  merged: {{ title: Done, message: Merged }}
"#,
            gitlab = gitlab.uri(),
            jira = jira.uri(),
        );
        let mut cfg = trigger_config::from_yaml_str(&yaml).unwrap();
        cfg.normalize();
        cfg.validate().unwrap();

        let engine = TriggerEngine::from_config(&cfg).unwrap();
        let app = router(Arc::new(AppState::new(engine)), HOOK_PATH);
        (app, Upstreams { jira, gitlab })
    }

    fn post_hook(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(HOOK_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    fn merge_hook(state: &str, kind: &str) -> String {
        json!({
            "object_kind": kind,
            "user": { "name": "Jane" },
            "object_attributes": {
                "iid": 3,
                "title": "proj-1 fix",
                "state": state,
                "action": "merge",
                "work_in_progress": false,
                "target_project_id": 9,
                "updated_at": "2024-03-01T10:00:00Z",
                "target": { "web_url": "https://gl/g/app" }
            }
        })
        .to_string()
    }

    async fn body_string(resp: axum::response::Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn malformed_json_is_plain_text_400() {
        let (app, up) = app().await;
        let resp = app.oneshot(post_hook("{ nope")).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let ct = resp.headers()[header::CONTENT_TYPE].to_str().unwrap().to_owned();
        assert!(ct.starts_with("text/plain"), "content-type: {ct}");

        let expected = serde_json::from_slice::<trigger_engine::event::MergeRequestHook>(b"{ nope")
            .unwrap_err()
            .to_string();
        assert_eq!(body_string(resp).await, expected);
        assert!(up.jira.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn non_merge_request_is_200_without_calls() {
        let (app, up) = app().await;
        let resp = app
            .oneshot(post_hook(merge_hook("merged", "note")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.is_empty());
        assert!(up.jira.received_requests().await.unwrap_or_default().is_empty());
        assert!(up.gitlab.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn merged_delivery_drives_jira_and_answers_200() {
        let (app, up) = app().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/PROJ-1/transitions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [{ "id": "5", "name": "Done" }]
            })))
            .expect(1)
            .mount(&up.jira)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1/transitions"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&up.jira)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1/comment"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&up.jira)
            .await;

        let resp = app
            .oneshot(post_hook(merge_hook("merged", "merge_request")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        up.jira.verify().await;
    }

    #[tokio::test]
    async fn jira_failure_still_answers_200() {
        let (app, up) = app().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&up.jira)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1/comment"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&up.jira)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v4/projects/9/merge_requests/3/notes"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&up.gitlab)
            .await;

        let resp = app
            .oneshot(post_hook(merge_hook("merged", "merge_request")))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        up.gitlab.verify().await;
    }

    #[tokio::test]
    async fn unsupported_state_is_422() {
        let (app, up) = app().await;
        let resp = app
            .oneshot(post_hook(merge_hook("archived", "merge_request")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNSUPPORTED_STATE");
        assert!(up.jira.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _up) = app().await;
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "ok");
    }
}
