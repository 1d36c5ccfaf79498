//! GitLab provider (REST v4), used only to post compensating notes.
//!
//! Endpoint used:
//!   * POST /api/v4/projects/:id/merge_requests/:iid/notes

use reqwest::{Client, StatusCode};
use tracing::{debug, info};

use crate::errors::GitLabError;
use crate::providers::body_text;

/// GitLab HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    host: String,  // e.g. "https://gitlab.example.com"
    token: String, // "PRIVATE-TOKEN"
}

impl GitLabClient {
    /// Constructs a GitLab client with a shared HTTP instance and auth token.
    pub fn new(http: Client, host: String, token: String) -> Self {
        debug!("Creating GitLabClient with host={}", host);
        Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Posts a general (non-inline) note on a merge request.
    pub async fn add_merge_request_note(
        &self,
        project_id: u64,
        iid: u64,
        body: &str,
    ) -> Result<(), GitLabError> {
        let url = format!(
            "{}/api/v4/projects/{}/merge_requests/{}/notes",
            self.host, project_id, iid
        );
        debug!("GitLab add_merge_request_note: {}", url);

        let resp = self
            .http
            .post(url)
            .header("PRIVATE-TOKEN", &self.token)
            .form(&[("body", body)])
            .send()
            .await?;

        match resp.status() {
            StatusCode::CREATED => {
                info!(project_id, iid, "GitLab note added");
                Ok(())
            }
            status => Err(GitLabError::Unexpected {
                status: status.as_u16(),
                body: body_text(resp).await,
            }),
        }
    }
}
