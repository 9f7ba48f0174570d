use std::collections::HashMap;
use std::mem;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::anticheat::protocol::{AttemptId, ServiceReply, ServiceRequest};
use crate::anticheat::reporter::{FinishPath, ProgressReporter};
use crate::engine::ghost::GhostWriter;
use crate::engine::scoring::{self, Stats};
use crate::generator::stream::WordStream;
use crate::session::result::{SaveOutcome, TestSummary};
use crate::session::settings::{Settings, TestMode};
use crate::text::PreparedText;

/// Remaining time at which a timed test plays its warning.
const WARNING_AT: Duration = Duration::from_secs(5);
/// Shortest timed test that gets a warning at all.
const WARNING_MIN_DURATION: Duration = Duration::from_secs(10);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Finished,
}

/// Side-effects for the host to perform after a handler returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    KeySound,
    TimeWarning,
    /// Dim surrounding chrome while a test runs.
    Dim(bool),
    Finished(AttemptId),
}

pub struct TestSession {
    settings: Settings,
    state: SessionState,
    attempt: AttemptId,

    target: String,
    target_chars: usize,
    initial_target: String,
    stream: Option<WordStream>,
    initial_stream: Option<WordStream>,
    attribution: Option<String>,

    typed: String,
    stats: Stats,
    started_at: Option<Instant>,
    frozen_elapsed: Duration,
    warning_played: bool,
    ghost: Option<GhostWriter>,

    reporter: Option<ProgressReporter>,
    outbox: Vec<ServiceRequest>,
    effects: Vec<Effect>,
    last_finished: Option<(AttemptId, TestSummary)>,
    /// Summaries kept until their finalize reply arrives, for the unverified fallback.
    awaiting_verdict: HashMap<AttemptId, TestSummary>,
    outcome: Option<(AttemptId, SaveOutcome)>,
}

impl TestSession {
    /// `reporter` is `None` for anonymous users or when no validation service is configured.
    pub fn new(settings: Settings, reporter: Option<ProgressReporter>) -> Self {
        let ghost = ghost_for(&settings);
        Self {
            settings,
            state: SessionState::Idle,
            attempt: AttemptId(0),
            target: String::new(),
            target_chars: 0,
            initial_target: String::new(),
            stream: None,
            initial_stream: None,
            attribution: None,
            typed: String::new(),
            stats: Stats::default(),
            started_at: None,
            frozen_elapsed: Duration::ZERO,
            warning_played: false,
            ghost,
            reporter,
            outbox: Vec::new(),
            effects: Vec::new(),
            last_finished: None,
            awaiting_verdict: HashMap::new(),
            outcome: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn attempt(&self) -> AttemptId {
        self.attempt
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn attribution(&self) -> Option<&str> {
        self.attribution.as_deref()
    }

    /// False while the target text is still loading.
    pub fn is_ready(&self) -> bool {
        !self.target.is_empty()
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        match (self.state, self.started_at) {
            (SessionState::Running, Some(start)) => now.saturating_duration_since(start),
            (SessionState::Finished, _) => self.frozen_elapsed,
            _ => Duration::ZERO,
        }
    }

    /// Time left in a timed test.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        (self.settings.mode == TestMode::Time)
            .then(|| self.settings.duration().saturating_sub(self.elapsed(now)))
    }

    pub fn live_wpm(&self, now: Instant) -> f64 {
        scoring::wpm(self.typed.chars().count(), self.elapsed(now))
    }

    pub fn live_accuracy(&self) -> f64 {
        scoring::accuracy(self.stats.correct, self.typed.chars().count())
    }

    pub fn ghost_index(&self) -> Option<usize> {
        self.ghost.as_ref().map(GhostWriter::index)
    }

    /// Summary of the current attempt once it has finished.
    pub fn summary(&self) -> Option<&TestSummary> {
        match &self.last_finished {
            Some((attempt, summary)) if *attempt == self.attempt => Some(summary),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<&SaveOutcome> {
        match &self.outcome {
            Some((attempt, outcome)) if *attempt == self.attempt => Some(outcome),
            _ => None,
        }
    }

    pub fn drain_requests(&mut self) -> Vec<ServiceRequest> {
        mem::take(&mut self.outbox)
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        mem::take(&mut self.effects)
    }

    /// Switch settings. Returns whether the target text must be regenerated; if so the
    /// session is left without text until [`TestSession::load`] is called.
    pub fn set_settings(&mut self, settings: Settings) -> bool {
        let regenerate = self.settings.needs_regeneration(&settings);
        self.settings = settings;
        if regenerate {
            self.unload();
        } else {
            self.repeat();
        }
        regenerate
    }

    /// Start a new attempt on freshly prepared text.
    pub fn load(&mut self, prepared: PreparedText) {
        self.reset();
        self.initial_target = prepared.target;
        self.initial_stream = prepared.stream;
        self.attribution = prepared.attribution;
        self.restore_initial_text();
        debug!(
            attempt = self.attempt.0,
            mode = %self.settings.mode,
            chars = self.target_chars,
            "test loaded"
        );
    }

    /// Drop the current text, e.g. while new text is loading.
    pub fn unload(&mut self) {
        self.reset();
        self.initial_target.clear();
        self.initial_stream = None;
        self.attribution = None;
        self.restore_initial_text();
    }

    /// Same text again from the start.
    pub fn repeat(&mut self) {
        self.reset();
        self.restore_initial_text();
    }

    pub fn type_char(&mut self, ch: char, now: Instant) {
        match self.state {
            SessionState::Finished => return,
            SessionState::Idle => {
                if self.target.is_empty() {
                    return;
                }
                self.start(now);
            }
            SessionState::Running => {
                if self.time_expired(now) {
                    self.finish(now);
                    return;
                }
            }
        }

        self.typed.push(ch);
        self.after_edit();
        if let Some(stream) = self.stream.as_mut()
            && stream.extend_if_needed(&mut self.target, &self.typed)
        {
            self.target_chars = self.target.chars().count();
        }
        self.effects.push(Effect::KeySound);

        let typed_len = self.typed.chars().count();
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.on_input(typed_len, now, &mut self.outbox);
        }

        if self.is_complete(typed_len) {
            self.finish(now);
        }
    }

    pub fn backspace(&mut self, _now: Instant) {
        if self.state != SessionState::Running || self.typed.pop().is_none() {
            return;
        }
        self.after_edit();
        self.effects.push(Effect::KeySound);
    }

    /// Delete back to the start of the current word, or of the previous one when the
    /// cursor sits right after a space.
    pub fn backspace_word(&mut self, _now: Instant) {
        if self.state != SessionState::Running || self.typed.is_empty() {
            return;
        }
        let word_end = self.typed.trim_end_matches(' ').len();
        let cut = self.typed[..word_end].rfind(' ').map_or(0, |i| i + 1);
        self.typed.truncate(cut);
        self.after_edit();
        self.effects.push(Effect::KeySound);
    }

    pub fn escape(&mut self, now: Instant) {
        if self.state == SessionState::Running {
            self.finish(now);
        }
    }

    pub fn tick(&mut self, now: Instant) {
        if self.state != SessionState::Running {
            return;
        }
        let elapsed = self.elapsed(now);
        if let Some(ghost) = self.ghost.as_mut() {
            ghost.advance(elapsed, self.target_chars);
        }

        if self.settings.mode != TestMode::Time {
            return;
        }
        let duration = self.settings.duration();
        if !self.warning_played
            && duration >= WARNING_MIN_DURATION
            && duration.saturating_sub(elapsed) <= WARNING_AT
        {
            self.warning_played = true;
            self.effects.push(Effect::TimeWarning);
        }
        if elapsed >= duration {
            self.finish(now);
        }
    }

    /// Apply a service reply. Replies for earlier attempts still drive session cleanup and the
    /// fallback save, but never change what the current attempt shows.
    pub fn apply_reply(&mut self, reply: ServiceReply, now: Instant) {
        match reply {
            ServiceReply::Started { attempt, result } => match self.reporter.as_mut() {
                Some(reporter) => reporter.on_started(attempt, result, now, &mut self.outbox),
                None => {
                    if let Ok(session) = result {
                        self.outbox.push(ServiceRequest::Cancel { session });
                    }
                }
            },
            ServiceReply::ProgressRecorded {
                attempt,
                typed_len,
                result,
            } => {
                if let Some(reporter) = self.reporter.as_mut() {
                    reporter.on_progress(attempt, typed_len, result, now);
                }
            }
            ServiceReply::Finalized { attempt, result } => match result {
                Ok(verdict) => {
                    self.awaiting_verdict.remove(&attempt);
                    info!(
                        attempt = attempt.0,
                        valid = verdict.is_valid,
                        "attempt verified"
                    );
                    self.set_outcome(
                        attempt,
                        SaveOutcome::Verified {
                            is_valid: verdict.is_valid,
                            reason: verdict.invalid_reason,
                            new_achievements: verdict.new_achievements,
                        },
                    );
                }
                Err(err) => {
                    warn!(error = %err, attempt = attempt.0, "finalize failed, saving unverified");
                    match self.awaiting_verdict.remove(&attempt) {
                        Some(summary) => {
                            self.outbox
                                .push(ServiceRequest::Submit { attempt, summary });
                        }
                        None => self.set_outcome(
                            attempt,
                            SaveOutcome::SaveFailed {
                                reason: err.to_string(),
                            },
                        ),
                    }
                }
            },
            ServiceReply::Submitted { attempt, result } => {
                let outcome = match result {
                    Ok(ack) => SaveOutcome::Unverified {
                        new_achievements: ack.new_achievements,
                    },
                    Err(err) => {
                        warn!(error = %err, attempt = attempt.0, "result not saved");
                        SaveOutcome::SaveFailed {
                            reason: err.to_string(),
                        }
                    }
                };
                self.set_outcome(attempt, outcome);
            }
        }
    }

    fn set_outcome(&mut self, attempt: AttemptId, outcome: SaveOutcome) {
        if attempt == self.attempt {
            self.outcome = Some((attempt, outcome));
        }
    }

    fn start(&mut self, now: Instant) {
        self.state = SessionState::Running;
        self.started_at = Some(now);
        self.effects.push(Effect::Dim(true));
        debug!(attempt = self.attempt.0, "test started");
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.begin(self.attempt, &self.settings, &self.target, &mut self.outbox);
        }
    }

    fn finish(&mut self, now: Instant) {
        let mut elapsed = self.elapsed(now);
        if self.settings.mode == TestMode::Time {
            elapsed = elapsed.min(self.settings.duration());
        }
        self.frozen_elapsed = elapsed;
        self.state = SessionState::Finished;
        self.effects.push(Effect::Dim(false));

        let summary = TestSummary::from_attempt(&self.typed, &self.target, &self.settings, elapsed);
        info!(
            attempt = self.attempt.0,
            mode = %self.settings.mode,
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            "test finished"
        );

        let path = match self.reporter.as_mut() {
            Some(reporter) => reporter.finish(&self.typed, elapsed, &mut self.outbox),
            None => FinishPath::Unverified,
        };
        match path {
            FinishPath::Finalizing => {
                self.awaiting_verdict.insert(self.attempt, summary.clone());
            }
            FinishPath::Unverified => self.outbox.push(ServiceRequest::Submit {
                attempt: self.attempt,
                summary: summary.clone(),
            }),
        }

        self.last_finished = Some((self.attempt, summary));
        self.effects.push(Effect::Finished(self.attempt));
    }

    /// Back to idle under a new attempt id, cancelling any open validation session.
    fn reset(&mut self) {
        if let Some(reporter) = self.reporter.as_mut() {
            reporter.cancel(&mut self.outbox);
        }
        if self.state == SessionState::Running {
            self.effects.push(Effect::Dim(false));
        }
        self.attempt = AttemptId(self.attempt.0 + 1);
        self.state = SessionState::Idle;
        self.typed.clear();
        self.stats = Stats::default();
        self.started_at = None;
        self.frozen_elapsed = Duration::ZERO;
        self.warning_played = false;
        self.ghost = ghost_for(&self.settings);
        self.outcome = None;
    }

    fn restore_initial_text(&mut self) {
        self.target = self.initial_target.clone();
        self.target_chars = self.target.chars().count();
        self.stream = self.initial_stream.clone();
    }

    fn after_edit(&mut self) {
        self.stats = scoring::score(&self.typed, &self.target);
    }

    fn time_expired(&self, now: Instant) -> bool {
        self.settings.mode == TestMode::Time && self.elapsed(now) >= self.settings.duration()
    }

    fn is_complete(&self, typed_len: usize) -> bool {
        match self.settings.mode {
            TestMode::Time | TestMode::Zen => false,
            TestMode::Words => {
                self.typed.ends_with(' ')
                    && self.typed.split_whitespace().count() >= self.settings.word_target
            }
            TestMode::Quote | TestMode::Preset => typed_len == self.target_chars,
        }
    }
}

fn ghost_for(settings: &Settings) -> Option<GhostWriter> {
    settings
        .ghost
        .enabled
        .then(|| GhostWriter::new(settings.ghost.wpm))
}
