use tracing::info;

use crate::anticheat::protocol::SinkAck;
use crate::service::{ResultSink, ServiceError};
use crate::session::result::TestSummary;
use crate::store::json_store::JsonStore;

/// Appends results to the local history file.
pub struct LocalResultSink {
    store: JsonStore,
}

impl LocalResultSink {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }
}

impl ResultSink for LocalResultSink {
    fn submit(&mut self, summary: &TestSummary) -> Result<SinkAck, ServiceError> {
        let mut history = self.store.load_history();
        let previous_best = history.best_wpm(summary.mode);

        history.results.push(summary.clone());
        self.store
            .save_history(&history)
            .map_err(|err| ServiceError::Storage(err.to_string()))?;

        let mut new_achievements = Vec::new();
        if previous_best.is_some_and(|best| summary.wpm > best) {
            info!(mode = %summary.mode, wpm = summary.wpm, "new personal best");
            new_achievements.push(format!("personal-best-{}", summary.mode));
        }
        Ok(SinkAck { new_achievements })
    }
}
