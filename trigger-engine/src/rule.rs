//! Trigger rules resolved per merge request state.

use trigger_config::{TriggerRuleConfig, TriggerSection};

use crate::event::MergeRequestState;

/// What to do in Jira for one merge request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerRule {
    /// Jira transition display name; empty disables the transition steps
    /// unless `transition_id` is set.
    pub transition_title: String,
    /// Known transition id, used instead of the lookup.
    pub transition_id: Option<u64>,
    pub comment_template: String,
    pub include_url: bool,
    pub include_date: bool,
    pub include_username: bool,
}

impl TriggerRule {
    /// A rule with nothing configured short-circuits the whole delivery.
    pub fn is_noop(&self) -> bool {
        self.transition_title.is_empty()
            && self.transition_id.is_none()
            && self.comment_template.is_empty()
            && !self.include_url
            && !self.include_date
            && !self.include_username
    }

    /// Whether the lookup/update steps run at all.
    pub fn has_transition(&self) -> bool {
        self.transition_id.is_some() || !self.transition_title.is_empty()
    }
}

impl From<&TriggerRuleConfig> for TriggerRule {
    fn from(c: &TriggerRuleConfig) -> Self {
        Self {
            transition_title: c.title.clone(),
            transition_id: c.id,
            comment_template: c.message.clone(),
            include_url: c.url,
            include_date: c.date,
            include_username: c.username,
        }
    }
}

/// The four configured rules. Read-only after startup.
#[derive(Debug, Clone, Default)]
pub struct TriggerRules {
    pub opened: TriggerRule,
    pub merged: TriggerRule,
    pub closed: TriggerRule,
    pub locked: TriggerRule,
}

impl From<&TriggerSection> for TriggerRules {
    fn from(s: &TriggerSection) -> Self {
        Self {
            opened: (&s.opened).into(),
            merged: (&s.merged).into(),
            closed: (&s.closed).into(),
            locked: (&s.locked).into(),
        }
    }
}

/// Rule for a delivery plus whether this delivery is the authoritative one.
#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a> {
    pub rule: &'a TriggerRule,
    /// Gates only the Jira comment step.
    pub authoritative: bool,
}

impl TriggerRules {
    pub fn rule_for(&self, state: MergeRequestState) -> &TriggerRule {
        match state {
            MergeRequestState::Opened => &self.opened,
            MergeRequestState::Merged => &self.merged,
            MergeRequestState::Closed => &self.closed,
            MergeRequestState::Locked => &self.locked,
        }
    }

    pub fn resolve(&self, state: MergeRequestState, action: &str) -> Resolution<'_> {
        Resolution {
            rule: self.rule_for(state),
            authoritative: is_authoritative(state, action),
        }
    }
}

/// GitLab sends several deliveries for one logical event; only the one whose
/// action completes the state change counts.
pub fn is_authoritative(state: MergeRequestState, action: &str) -> bool {
    match state {
        MergeRequestState::Merged => action == "merge",
        MergeRequestState::Opened => action == "open" || action == "reopen",
        MergeRequestState::Closed => action == "close",
        MergeRequestState::Locked => action == "lock",
    }
}
