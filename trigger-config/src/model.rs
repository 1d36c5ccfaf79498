//! Configuration data structures for the trigger service.
//!
//! Groups:
//! - [`TriggerConfig`] : top-level container, mirrors the YAML document
//! - [`GitLabConfig`]  : where compensating notes are posted
//! - [`JiraConfig`]    : Jira REST host and basic-auth credentials
//! - [`ServerConfig`]  : listener port and webhook path
//! - [`TriggerSection`]: issue patterns plus one [`TriggerRuleConfig`] per MR state
//!
//! Top-level YAML keys are capitalised (`GitLab`, `Jira`, ...) to stay
//! compatible with existing deployment files.

use serde::de::{self, Deserializer, Error as _};
use serde::{Deserialize, Serialize};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(rename = "GitLab", default)]
    pub gitlab: GitLabConfig,
    #[serde(rename = "Jira", default)]
    pub jira: JiraConfig,
    #[serde(rename = "Server", default)]
    pub server: ServerConfig,
    #[serde(rename = "Trigger", default)]
    pub trigger: TriggerSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitLabConfig {
    /// e.g. `https://gitlab.example.com` (the `/api/v4` suffix is added by the client).
    #[serde(default)]
    pub host: String,
    /// Sent as `Private-Token`.
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `0` means "not configured". Accepts `8080` or `"8080"`.
    #[serde(default, deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    /// Route the webhook is served on, e.g. `/gitlab/webhook`.
    #[serde(default)]
    pub path: String,
}

/// Issue patterns and per-state trigger rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerSection {
    /// Applied in order against the upper-cased MR title.
    #[serde(default)]
    pub regex: Vec<String>,
    #[serde(default)]
    pub merged: TriggerRuleConfig,
    #[serde(default)]
    pub opened: TriggerRuleConfig,
    #[serde(default)]
    pub closed: TriggerRuleConfig,
    #[serde(default)]
    pub locked: TriggerRuleConfig,
}

/// One trigger block. An all-default block does nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRuleConfig {
    /// Jira transition display name to look up, e.g. `Done`.
    #[serde(default)]
    pub title: String,
    /// Base text of the Jira comment.
    #[serde(default)]
    pub message: String,
    /// Append the MR URL line to the comment.
    #[serde(default)]
    pub url: bool,
    /// Append the `updated_at` line to the comment.
    #[serde(default)]
    pub date: bool,
    /// Append the author line to the comment.
    #[serde(default)]
    pub username: bool,
    /// Explicit transition id; skips the lookup by title when set.
    /// Accepts `31` or `"31"`; an empty string means unset.
    #[serde(
        default,
        deserialize_with = "id_from_number_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<u64>,
}

/// Numeric scalar written either bare or quoted.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

impl NumberOrString {
    fn into_u64<E: de::Error>(self) -> Result<Option<u64>, E> {
        match self {
            NumberOrString::Number(n) => Ok(Some(n)),
            NumberOrString::String(s) if s.trim().is_empty() => Ok(None),
            NumberOrString::String(s) => s.trim().parse().map(Some).map_err(|_| {
                E::invalid_value(de::Unexpected::Str(&s), &"a non-negative integer")
            }),
        }
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = NumberOrString::deserialize(deserializer)?.into_u64::<D::Error>()? else {
        return Ok(0);
    };
    u16::try_from(n)
        .map_err(|_| D::Error::invalid_value(de::Unexpected::Unsigned(n), &"a TCP port number"))
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(value) => value.into_u64(),
        None => Ok(None),
    }
}
