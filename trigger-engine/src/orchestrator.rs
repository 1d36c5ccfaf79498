//! Drives the per-issue Jira call sequence for one webhook delivery.
//!
//! For every extracted issue reference, in order:
//!   1. look up the transition id by title (skipped when the rule pins an id)
//!   2. update the transition when the id is known
//!   3. add the composed comment when the delivery is authoritative
//!
//! A failed step posts one compensating note on the merge request and the
//! sequence moves on. Nothing is shared between deliveries, so replaying a
//! delivery replays every call.

use tracing::{debug, error, info, instrument, warn};

use crate::{
    comment::{compose, describe},
    errors::{JiraError, TriggerEngineError, TriggerEngineResult},
    event::{self, Classification, MergeRequestState, WebhookEvent},
    extract::{IssueExtractor, IssueReference},
    providers::{GitLabClient, JiraClient, build_http_client},
    rule::{Resolution, TriggerRules},
};
use trigger_config::TriggerConfig;

/// Status of one step for one issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Succeeded,
    Failed(String),
    Skipped,
}

/// What happened to one issue reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueOutcome {
    pub issue: IssueReference,
    pub lookup: StepStatus,
    pub transition: StepStatus,
    pub comment: StepStatus,
    /// Compensating notes successfully posted for this issue.
    pub notices_posted: usize,
}

impl IssueOutcome {
    fn new(issue: IssueReference) -> Self {
        Self {
            issue,
            lookup: StepStatus::Skipped,
            transition: StepStatus::Skipped,
            comment: StepStatus::Skipped,
            notices_posted: 0,
        }
    }

    pub fn has_failures(&self) -> bool {
        [&self.lookup, &self.transition, &self.comment]
            .iter()
            .any(|s| matches!(s, StepStatus::Failed(_)))
    }
}

/// Why a delivery caused no external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    WorkInProgress,
    NotMergeRequest,
    NoopRule(MergeRequestState),
    NoIssueReferences,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Dropped(DropReason),
    Processed(Vec<IssueOutcome>),
}

/// Immutable engine built once at startup and shared by all handlers.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    rules: TriggerRules,
    extractor: IssueExtractor,
    jira: JiraClient,
    gitlab: GitLabClient,
}

impl TriggerEngine {
    pub fn new(
        rules: TriggerRules,
        extractor: IssueExtractor,
        jira: JiraClient,
        gitlab: GitLabClient,
    ) -> Self {
        Self {
            rules,
            extractor,
            jira,
            gitlab,
        }
    }

    /// Builds the shared HTTP client, both REST clients and the patterns.
    pub fn from_config(cfg: &TriggerConfig) -> TriggerEngineResult<Self> {
        let http = build_http_client().map_err(TriggerEngineError::HttpClient)?;
        let extractor = IssueExtractor::new(cfg.compile_patterns()?);
        if extractor.is_empty() {
            warn!("no issue patterns configured; every delivery will be dropped");
        }

        let jira = JiraClient::new(
            http.clone(),
            cfg.jira.host.clone(),
            cfg.jira.username.clone(),
            cfg.jira.password.clone(),
        );
        let gitlab = GitLabClient::new(http, cfg.gitlab.host.clone(), cfg.gitlab.token.clone());

        Ok(Self::new(
            TriggerRules::from(&cfg.trigger),
            extractor,
            jira,
            gitlab,
        ))
    }

    /// Classifies a raw webhook body and processes it.
    ///
    /// Errors are decode failures and unsupported states; Jira/GitLab
    /// failures never surface here.
    pub async fn handle_payload(&self, body: &[u8]) -> TriggerEngineResult<DeliveryOutcome> {
        match event::classify(body)? {
            Classification::WorkInProgress => {
                debug!("skip work in progress merge request");
                Ok(DeliveryOutcome::Dropped(DropReason::WorkInProgress))
            }
            Classification::NotMergeRequest => {
                debug!("skip non merge request event");
                Ok(DeliveryOutcome::Dropped(DropReason::NotMergeRequest))
            }
            Classification::Relevant(ev) => Ok(self.handle_event(&ev).await),
        }
    }

    #[instrument(
        name = "handle_event",
        skip_all,
        fields(project = ev.target_project_id, iid = ev.merge_request_iid, state = %ev.state, action = %ev.action)
    )]
    pub async fn handle_event(&self, ev: &WebhookEvent) -> DeliveryOutcome {
        let resolution = self.rules.resolve(ev.state, &ev.action);
        if resolution.rule.is_noop() {
            debug!("skip state without trigger rule");
            return DeliveryOutcome::Dropped(DropReason::NoopRule(ev.state));
        }

        let issues = self.extractor.extract(&ev.title);
        if issues.is_empty() {
            debug!(title = %ev.title, "no issue references in title");
            return DeliveryOutcome::Dropped(DropReason::NoIssueReferences);
        }

        let comment = compose(resolution.rule, ev);
        info!(
            issues = issues.len(),
            authoritative = resolution.authoritative,
            "processing merge request delivery"
        );

        let mut outcomes = Vec::with_capacity(issues.len());
        for issue in issues {
            outcomes.push(self.process_issue(issue, resolution, &comment, ev).await);
        }

        let failed = outcomes.iter().filter(|o| o.has_failures()).count();
        info!(total = outcomes.len(), failed, "delivery handled");
        DeliveryOutcome::Processed(outcomes)
    }

    async fn process_issue(
        &self,
        issue: IssueReference,
        resolution: Resolution<'_>,
        comment: &str,
        ev: &WebhookEvent,
    ) -> IssueOutcome {
        let rule = resolution.rule;
        let key = issue.as_str().to_owned();
        let mut out = IssueOutcome::new(issue);

        if rule.has_transition() {
            let transition_id = match rule.transition_id {
                Some(id) => Some(id),
                None => match self.jira.find_transition_id(&key, &rule.transition_title).await {
                    Ok(id) => {
                        out.lookup = StepStatus::Succeeded;
                        Some(id)
                    }
                    Err(err) => {
                        warn!(issue = %key, %err, "transition lookup failed");
                        out.lookup = StepStatus::Failed(err.to_string());
                        self.report(ev, &err, &mut out).await;
                        None
                    }
                },
            };

            if let Some(id) = transition_id {
                match self.jira.update_transition(&key, id).await {
                    Ok(()) => out.transition = StepStatus::Succeeded,
                    Err(err) => {
                        warn!(issue = %key, %err, "transition update failed");
                        out.transition = StepStatus::Failed(err.to_string());
                        self.report(ev, &err, &mut out).await;
                    }
                }
            }
        }

        if resolution.authoritative {
            match self.jira.add_comment(&key, comment).await {
                Ok(()) => out.comment = StepStatus::Succeeded,
                Err(err) => {
                    warn!(issue = %key, %err, "adding comment failed");
                    out.comment = StepStatus::Failed(err.to_string());
                    self.report(ev, &err, &mut out).await;
                }
            }
        }

        out
    }

    /// Posts a compensating note; its own failure is only logged.
    async fn report(&self, ev: &WebhookEvent, err: &JiraError, out: &mut IssueOutcome) {
        let note = describe(err);
        match self
            .gitlab
            .add_merge_request_note(ev.target_project_id, ev.merge_request_iid, &note)
            .await
        {
            Ok(()) => out.notices_posted += 1,
            Err(e) => error!(issue = %out.issue, error = %e, "failed to post GitLab note"),
        }
    }
}
