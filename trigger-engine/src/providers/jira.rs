//! Jira REST v2 client.
//!
//! Endpoints used:
//!   * GET  /rest/api/2/issue/:key/transitions
//!   * POST /rest/api/2/issue/:key/transitions
//!   * POST /rest/api/2/issue/:key/comment
//!
//! Every request carries HTTP basic auth.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::JiraError;
use crate::providers::body_text;

/// Jira HTTP client wrapper.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    host: String, // e.g. "https://jira.example.com"
    username: String,
    password: String,
}

impl JiraClient {
    pub fn new(http: Client, host: String, username: String, password: String) -> Self {
        debug!("Creating JiraClient with host={}", host);
        Self {
            http,
            host: host.trim_end_matches('/').to_string(),
            username,
            password,
        }
    }

    /// `{host}/rest/api/2/issue/{issue}/{resource}` with the key as one path segment.
    fn issue_url(&self, issue: &str, resource: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}/{}",
            self.host,
            urlencoding::encode(issue),
            resource
        )
    }

    /// Finds the id of the transition named exactly `title` among the
    /// transitions currently available on `issue`.
    pub async fn find_transition_id(&self, issue: &str, title: &str) -> Result<u64, JiraError> {
        let url = self.issue_url(issue, "transitions");
        debug!("Jira find_transition_id: {}", url);

        let resp = self
            .http
            .get(url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let page: JiraTransitions = resp.json().await?;
                let found = page
                    .transitions
                    .into_iter()
                    .find(|t| t.name == title)
                    .ok_or_else(|| JiraError::TransitionNotFound {
                        issue: issue.to_string(),
                        title: title.to_string(),
                    })?;

                let id = found.id.parse::<u64>().map_err(|_| {
                    JiraError::InvalidResponse(format!("non-numeric transition id `{}`", found.id))
                })?;
                info!(issue, title, id, "found Jira transition");
                Ok(id)
            }
            StatusCode::NOT_FOUND => Err(JiraError::IssueNotFound(issue.to_string())),
            status => Err(JiraError::Unexpected {
                status: status.as_u16(),
                body: body_text(resp).await,
            }),
        }
    }

    /// Moves `issue` along the transition `transition_id`.
    pub async fn update_transition(&self, issue: &str, transition_id: u64) -> Result<(), JiraError> {
        let url = self.issue_url(issue, "transitions");
        debug!("Jira update_transition: {}", url);

        let payload = JiraTransitionUpdate {
            transition: JiraTransitionRef { id: transition_id },
        };

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&payload)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NO_CONTENT => {
                info!(issue, transition_id, "Jira transition updated");
                Ok(())
            }
            StatusCode::BAD_REQUEST => Err(JiraError::NoTransitionSpecified),
            StatusCode::NOT_FOUND => Err(JiraError::IssueNotFound(issue.to_string())),
            status => Err(JiraError::Unexpected {
                status: status.as_u16(),
                body: body_text(resp).await,
            }),
        }
    }

    /// Adds a plain-text comment to `issue`.
    pub async fn add_comment(&self, issue: &str, body: &str) -> Result<(), JiraError> {
        let url = self.issue_url(issue, "comment");
        debug!("Jira add_comment: {}", url);

        let resp = self
            .http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&JiraCommentCreate { body })
            .send()
            .await?;

        match resp.status() {
            StatusCode::CREATED => {
                info!(issue, "Jira comment added");
                Ok(())
            }
            status => Err(JiraError::Unexpected {
                status: status.as_u16(),
                body: body_text(resp).await,
            }),
        }
    }
}

/// GET transitions response (subset).
#[derive(Debug, Deserialize)]
struct JiraTransitions {
    #[serde(default)]
    transitions: Vec<JiraTransition>,
}

#[derive(Debug, Deserialize)]
struct JiraTransition {
    id: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct JiraTransitionUpdate {
    transition: JiraTransitionRef,
}

#[derive(Debug, Serialize)]
struct JiraTransitionRef {
    id: u64,
}

#[derive(Debug, Serialize)]
struct JiraCommentCreate<'a> {
    body: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("bot:secret")
    const AUTH: &str = "Basic Ym90OnNlY3JldA==";

    fn client(server: &MockServer) -> JiraClient {
        JiraClient::new(Client::new(), server.uri(), "bot".into(), "secret".into())
    }

    #[tokio::test]
    async fn finds_transition_by_exact_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/PROJ-1/transitions"))
            .and(header("authorization", AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [
                    { "id": "11", "name": "In Progress" },
                    { "id": "31", "name": "Done" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let id = client(&server).find_transition_id("PROJ-1", "Done").await.unwrap();
        assert_eq!(id, 31);
    }

    #[tokio::test]
    async fn missing_transition_name_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "transitions": [{ "id": "11", "name": "done" }]
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .find_transition_id("PROJ-1", "Done")
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The transition name \"Done\" in issue PROJ-1 not found"
        );
    }

    #[tokio::test]
    async fn lookup_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/GONE-1/transitions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/BOOM-1/transitions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("kaput"))
            .mount(&server)
            .await;

        let c = client(&server);
        assert!(matches!(
            c.find_transition_id("GONE-1", "Done").await,
            Err(JiraError::IssueNotFound(k)) if k == "GONE-1"
        ));
        match c.find_transition_id("BOOM-1", "Done").await {
            Err(JiraError::Unexpected { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "kaput");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_sends_numeric_transition_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1/transitions"))
            .and(header("authorization", AUTH))
            .and(body_json(json!({ "transition": { "id": 31 } })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        client(&server).update_transition("PROJ-1", 31).await.unwrap();
    }

    #[tokio::test]
    async fn update_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/A-1/transitions"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/B-1/transitions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/C-1/transitions"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let c = client(&server);
        assert!(matches!(
            c.update_transition("A-1", 1).await,
            Err(JiraError::NoTransitionSpecified)
        ));
        assert!(matches!(
            c.update_transition("B-1", 1).await,
            Err(JiraError::IssueNotFound(_))
        ));
        assert_eq!(
            c.update_transition("C-1", 1).await.unwrap_err().to_string(),
            "Unknown: conflict"
        );
    }

    #[tokio::test]
    async fn comment_requires_created() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1/comment"))
            .and(header("authorization", AUTH))
            .and(body_json(json!({ "body": "Merged\nBy: Jane" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-2/comment"))
            .respond_with(ResponseTemplate::new(200).set_body_string("odd"))
            .mount(&server)
            .await;

        let c = client(&server);
        c.add_comment("PROJ-1", "Merged\nBy: Jane").await.unwrap();
        assert!(matches!(
            c.add_comment("PROJ-2", "x").await,
            Err(JiraError::Unexpected { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn issue_key_is_a_single_path_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/PROJ-1%2F..%3Fx%23y/transitions"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-1%2F..%3Fx%23y/comment"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let c = client(&server);
        assert!(matches!(
            c.find_transition_id("PROJ-1/..?x#y", "Done").await,
            Err(JiraError::IssueNotFound(_))
        ));
        c.add_comment("PROJ-1/..?x#y", "hi").await.unwrap();
        server.verify().await;
    }

    #[tokio::test]
    async fn transport_failure_is_a_network_error() {
        // Nothing listens on port 9 of localhost in the test environment.
        let c = JiraClient::new(
            Client::new(),
            "http://127.0.0.1:9".into(),
            "bot".into(),
            "secret".into(),
        );
        assert!(matches!(
            c.find_transition_id("PROJ-1", "Done").await,
            Err(JiraError::Network(_))
        ));
    }
}
