//! Configuration loader and validator.
//!
//! Responsibilities:
//! - Read the YAML config file into [`TriggerConfig`]
//! - Let secrets be overridden from the environment
//! - Normalise hosts and validate every mandatory field
//!
//! Any error returned from here is fatal: the binary reports it and exits
//! before binding the listener.

pub mod error;
pub mod model;

use std::path::Path;

use regex::Regex;
use tracing::debug;

pub use error::{ConfigError, Result};
pub use model::{
    GitLabConfig, JiraConfig, ServerConfig, TriggerConfig, TriggerRuleConfig, TriggerSection,
};

/// Environment variables that override secrets from the file.
pub const ENV_GITLAB_TOKEN: &str = "GITLAB_TOKEN";
pub const ENV_JIRA_USERNAME: &str = "JIRA_USERNAME";
pub const ENV_JIRA_PASSWORD: &str = "JIRA_PASSWORD";

/// Served by the api crate; the webhook cannot live there.
pub const RESERVED_HEALTH_PATH: &str = "/health";

/// Read, override from process env, normalise and validate.
///
/// This is the main entry for the binary.
pub fn load_from_path(path: &Path) -> Result<TriggerConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = raw.len(), "config file read");

    let mut cfg = from_yaml_str(&raw)?;
    cfg.apply_overrides(|name| std::env::var(name).ok());
    cfg.normalize();
    cfg.validate()?;
    Ok(cfg)
}

/// Parse a YAML document without overriding or validating it.
pub fn from_yaml_str(raw: &str) -> Result<TriggerConfig> {
    Ok(serde_yml::from_str(raw)?)
}

impl TriggerConfig {
    /// Replace secrets with non-empty values returned by `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = pick(ENV_GITLAB_TOKEN) {
            debug!(var = ENV_GITLAB_TOKEN, "override from env");
            self.gitlab.token = v;
        }
        if let Some(v) = pick(ENV_JIRA_USERNAME) {
            debug!(var = ENV_JIRA_USERNAME, "override from env");
            self.jira.username = v;
        }
        if let Some(v) = pick(ENV_JIRA_PASSWORD) {
            debug!(var = ENV_JIRA_PASSWORD, "override from env");
            self.jira.password = v;
        }
    }

    /// Trim whitespace and trailing slashes from hosts.
    pub fn normalize(&mut self) {
        for host in [&mut self.gitlab.host, &mut self.jira.host] {
            *host = host.trim().trim_end_matches('/').to_string();
        }
        self.server.path = self.server.path.trim().to_string();
    }

    /// Validate mandatory fields first (in file order), then formats.
    pub fn validate(&self) -> Result<()> {
        let required: [(&str, &'static str); 5] = [
            (self.gitlab.host.as_str(), "GitLab host"),
            (self.gitlab.token.as_str(), "GitLab token"),
            (self.jira.host.as_str(), "Jira host"),
            (self.jira.username.as_str(), "Jira username"),
            (self.jira.password.as_str(), "Jira password"),
        ];
        for (value, field) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(field));
            }
        }
        if self.server.port == 0 {
            return Err(ConfigError::MissingField("Server port"));
        }
        if self.server.path.is_empty() {
            return Err(ConfigError::MissingField("Server path"));
        }

        validate_http_host("GitLab host", &self.gitlab.host)?;
        validate_http_host("Jira host", &self.jira.host)?;
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::InvalidFormat {
                field: "Server path",
                reason: "must start with /",
            });
        }
        if self.server.path == RESERVED_HEALTH_PATH {
            return Err(ConfigError::InvalidFormat {
                field: "Server path",
                reason: "/health is reserved for the liveness probe",
            });
        }

        self.compile_patterns()?;
        Ok(())
    }

    /// Compile `Trigger.regex` in order.
    pub fn compile_patterns(&self) -> Result<Vec<Regex>> {
        self.trigger
            .regex
            .iter()
            .enumerate()
            .map(|(index, pattern)| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    index,
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect()
    }
}

fn validate_http_host(field: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            field,
            reason: "must start with http:// or https://",
        })
    }
}
