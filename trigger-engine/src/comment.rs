//! Jira comment text and GitLab error notices.

use std::fmt::Display;

use crate::{event::WebhookEvent, rule::TriggerRule};

/// Prefix of every compensating GitLab note.
pub const NOTICE_MARKER: &str = "❌ **mr-jira-trigger** ❌";

/// Build the Jira comment for one delivery.
///
/// Template first, then URL, date and author lines, each newline-prefixed
/// and present only when its flag is set.
pub fn compose(rule: &TriggerRule, event: &WebhookEvent) -> String {
    let mut comment = rule.comment_template.clone();

    if rule.include_url {
        comment.push_str("\nGitLab URL: ");
        comment.push_str(&event.web_url);
        comment.push_str("/merge_requests/");
        comment.push_str(&event.merge_request_iid.to_string());
    }
    if rule.include_date {
        comment.push_str("\nAt: ");
        comment.push_str(&event.timestamp);
    }
    if rule.include_username {
        comment.push_str("\nBy: ");
        comment.push_str(&event.author);
    }

    comment
}

/// Body of the GitLab note reporting a Jira-side failure.
pub fn describe(err: &impl Display) -> String {
    format!("{NOTICE_MARKER}<br>{err}")
}
