//! REST clients for the two external systems.
//!
//! Both clients wrap one shared `reqwest::Client` built at startup, so
//! concurrent deliveries reuse the same connection pool. Each call is a
//! single attempt; there is no retry layer.

pub mod gitlab;
pub mod jira;

pub use gitlab::GitLabClient;
pub use jira::JiraClient;

use tracing::debug;

/// Builds the HTTP client shared by [`JiraClient`] and [`GitLabClient`].
///
/// No request timeout is set; the transport defaults apply.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    debug!("building shared http client");
    reqwest::Client::builder()
        .user_agent(concat!("mr-jira-trigger/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Reads a response body for error reporting; a failed read yields "".
async fn body_text(resp: reqwest::Response) -> String {
    resp.text().await.unwrap_or_default()
}
