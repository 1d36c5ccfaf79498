use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode};
use tracing::{debug, error, info, instrument, warn};
use trigger_engine::DeliveryOutcome;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
};

/// POST {Server.path}
///
/// GitLab merge request webhook. The body is decoded here rather than through
/// the `Json` extractor so that any decode failure is a plain-text 400.
/// Jira/GitLab failures never change the status: they are reported as notes
/// on the merge request and the delivery still answers 200.
#[instrument(name = "trigger_gitlab_mr", skip_all, fields(bytes = body.len()))]
pub async fn trigger_gitlab_mr(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<StatusCode> {
    info!("new webhook delivery");

    let outcome = state
        .engine
        .handle_payload(&body)
        .await
        .map_err(AppError::from)
        .inspect_err(|err| match err {
            AppError::UnsupportedState(s) => error!(state = %s, "unsupported merge request state"),
            other => warn!(error = %other, "rejecting webhook delivery"),
        })?;

    match &outcome {
        DeliveryOutcome::Dropped(reason) => debug!(?reason, "delivery dropped"),
        DeliveryOutcome::Processed(issues) => {
            let failed = issues.iter().filter(|o| o.has_failures()).count();
            debug!(issues = issues.len(), failed, "delivery processed");
        }
    }

    Ok(StatusCode::OK)
}
