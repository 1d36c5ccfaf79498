use trigger_engine::TriggerEngine;

/// Shared state for all HTTP handlers.
///
/// Built once at startup; handlers only read it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Engine holding the trigger rules and the Jira/GitLab clients.
    pub engine: TriggerEngine,
}

impl AppState {
    pub fn new(engine: TriggerEngine) -> Self {
        Self { engine }
    }
}
