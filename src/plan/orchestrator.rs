use std::collections::HashMap;

use tracing::{debug, info};

use crate::plan::{Plan, PlanItem};
use crate::session::result::TestSummary;
use crate::session::settings::Settings;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepResult {
    pub wpm: f64,
    pub accuracy: f64,
    pub elapsed_secs: f64,
}

impl StepResult {
    pub fn from_summary(summary: &TestSummary) -> Self {
        Self {
            wpm: summary.wpm,
            accuracy: summary.accuracy,
            elapsed_secs: summary.elapsed_secs,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlanSummary {
    pub mean_wpm: f64,
    pub mean_accuracy: f64,
    pub total_elapsed_secs: f64,
    pub completed: usize,
    pub total_steps: usize,
}

/// Where the orchestrator is, for the host to decide what to show and how keys act.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanView {
    Inactive,
    /// Intro card for step `i`, before its test starts.
    Splash(usize),
    Step(usize),
    Summary,
}

/// Runs a plan one step at a time and keeps one result per step id.
#[derive(Debug, Default)]
pub struct PlanOrchestrator {
    plan: Option<Plan>,
    index: usize,
    splash: bool,
    active: bool,
    show_summary: bool,
    results: HashMap<String, StepResult>,
}

impl PlanOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn plan(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    pub fn view(&self) -> PlanView {
        if !self.active {
            PlanView::Inactive
        } else if self.show_summary {
            PlanView::Summary
        } else if self.splash {
            PlanView::Splash(self.index)
        } else {
            PlanView::Step(self.index)
        }
    }

    pub fn current_item(&self) -> Option<&PlanItem> {
        self.plan.as_ref()?.steps.get(self.index)
    }

    pub fn result(&self, id: &str) -> Option<&StepResult> {
        self.results.get(id)
    }

    pub fn start(&mut self, plan: Plan) {
        info!(plan = %plan.name, steps = plan.steps.len(), "plan started");
        self.plan = Some(plan);
        self.index = 0;
        self.splash = true;
        self.active = true;
        self.show_summary = false;
        self.results.clear();
    }

    /// Leave the splash and return the settings the current step runs with. Any earlier
    /// result for this step is dropped so the rerun can be recorded.
    pub fn start_step(&mut self, base: &Settings) -> Option<Settings> {
        if !self.active || self.show_summary {
            return None;
        }
        let item = self.current_item()?;
        let id = item.id.clone();
        let settings = item.settings.apply_to(base);

        self.results.remove(&id);
        self.splash = false;
        debug!(step = %id, index = self.index, "plan step started");
        Some(settings)
    }

    /// Record a finished test against the current step. Only the first finish of a step
    /// counts; returns whether it was recorded.
    pub fn record_finish(&mut self, summary: &TestSummary) -> bool {
        if !self.active || self.splash || self.show_summary {
            return false;
        }
        let Some(id) = self.current_item().map(|item| item.id.clone()) else {
            return false;
        };

        let candidate = StepResult::from_summary(summary);
        if self.results.contains_key(&id) {
            debug!(step = %id, "step already recorded");
            return false;
        }
        info!(step = %id, wpm = candidate.wpm, accuracy = candidate.accuracy, "plan step recorded");
        self.results.insert(id, candidate);
        true
    }

    pub fn advance(&mut self) {
        if !self.active || self.show_summary {
            return;
        }
        let len = self.plan.as_ref().map_or(0, |p| p.steps.len());
        if self.index + 1 >= len {
            self.show_summary = true;
            self.splash = false;
        } else {
            self.index += 1;
            self.splash = true;
        }
    }

    pub fn retreat(&mut self) {
        if !self.active {
            return;
        }
        if self.show_summary {
            self.show_summary = false;
        } else {
            self.index = self.index.saturating_sub(1);
        }
        self.splash = true;
    }

    pub fn exit(&mut self) {
        if self.active {
            info!("plan exited");
        }
        *self = Self::default();
    }

    pub fn summary(&self) -> PlanSummary {
        let total_steps = self.plan.as_ref().map_or(0, |p| p.steps.len());
        let completed = self.results.len();
        if completed == 0 {
            return PlanSummary {
                total_steps,
                ..PlanSummary::default()
            };
        }
        let n = completed as f64;
        PlanSummary {
            mean_wpm: self.results.values().map(|r| r.wpm).sum::<f64>() / n,
            mean_accuracy: self.results.values().map(|r| r.accuracy).sum::<f64>() / n,
            total_elapsed_secs: self.results.values().map(|r| r.elapsed_secs).sum(),
            completed,
            total_steps,
        }
    }
}
