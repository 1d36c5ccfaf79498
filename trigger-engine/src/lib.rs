//! GitLab merge request → Jira relay engine.
//!
//! Flow for one webhook delivery:
//!   * [`event::classify`] decodes the body and drops WIP / non-MR hooks
//!   * [`rule::TriggerRules::resolve`] picks the rule for the MR state
//!   * [`extract::IssueExtractor`] finds issue keys in the title
//!   * [`TriggerEngine`] drives lookup → transition → comment per issue and
//!     reports Jira failures back onto the MR as notes

pub mod comment;
pub mod errors;
pub mod event;
pub mod extract;
pub mod orchestrator;
pub mod providers;
pub mod rule;

pub use errors::{EventError, GitLabError, JiraError, TriggerEngineError, TriggerEngineResult};
pub use event::{MergeRequestState, WebhookEvent};
pub use extract::{IssueExtractor, IssueReference};
pub use orchestrator::{DeliveryOutcome, DropReason, IssueOutcome, StepStatus, TriggerEngine};
pub use rule::{TriggerRule, TriggerRules};
