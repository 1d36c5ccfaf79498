//! GitLab merge request webhook model and the classifier that filters it.
//!
//! Decoding is lenient: every attribute has a default, so hooks of other
//! kinds (push, note, ...) decode fine and are then dropped by kind.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use crate::errors::EventError;

/// `object_kind` of a GitLab hook. Only merge requests are processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    MergeRequest,
    #[default]
    #[serde(other)]
    Other,
}

/// Merge request lifecycle state a trigger rule is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MergeRequestState {
    Opened,
    Merged,
    Closed,
    Locked,
}

impl MergeRequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Merged => "merged",
            Self::Closed => "closed",
            Self::Locked => "locked",
        }
    }
}

impl FromStr for MergeRequestState {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(Self::Opened),
            "merged" => Ok(Self::Merged),
            "closed" => Ok(Self::Closed),
            "locked" => Ok(Self::Locked),
            other => Err(EventError::UnsupportedState(other.to_string())),
        }
    }
}

impl fmt::Display for MergeRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw hook body (subset).
#[derive(Debug, Default, Deserialize)]
pub struct MergeRequestHook {
    #[serde(default)]
    pub object_kind: ObjectKind,
    #[serde(default)]
    pub user: HookUser,
    #[serde(default)]
    pub object_attributes: HookAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookUser {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookAttributes {
    #[serde(default)]
    pub iid: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub work_in_progress: bool,
    #[serde(default)]
    pub target_project_id: u64,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub target: HookTarget,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookTarget {
    #[serde(default)]
    pub web_url: String,
}

/// A merge request delivery that passed every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEvent {
    pub state: MergeRequestState,
    /// Sub-action, e.g. `merge`, `reopen`. May be empty.
    pub action: String,
    pub title: String,
    pub work_in_progress: bool,
    pub author: String,
    /// `updated_at` exactly as GitLab sent it.
    pub timestamp: String,
    /// Target project web URL.
    pub web_url: String,
    pub merge_request_iid: u64,
    pub target_project_id: u64,
}

/// Result of running a delivery through the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Relevant(WebhookEvent),
    WorkInProgress,
    NotMergeRequest,
}

/// Decode a raw body and classify it.
///
/// Order: decode, WIP, kind, state. Only the first and the last can fail.
pub fn classify(body: &[u8]) -> Result<Classification, EventError> {
    let hook: MergeRequestHook = serde_json::from_slice(body)?;
    classify_hook(hook)
}

pub fn classify_hook(hook: MergeRequestHook) -> Result<Classification, EventError> {
    let attrs = hook.object_attributes;

    if attrs.work_in_progress {
        return Ok(Classification::WorkInProgress);
    }
    if hook.object_kind != ObjectKind::MergeRequest {
        return Ok(Classification::NotMergeRequest);
    }

    let state = attrs.state.parse::<MergeRequestState>()?;

    Ok(Classification::Relevant(WebhookEvent {
        state,
        action: attrs.action,
        title: attrs.title,
        work_in_progress: attrs.work_in_progress,
        author: hook.user.name,
        timestamp: attrs.updated_at,
        web_url: attrs.target.web_url,
        merge_request_iid: attrs.iid,
        target_project_id: attrs.target_project_id,
    }))
}
