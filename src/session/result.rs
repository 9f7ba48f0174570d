use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::engine::scoring::{self, Stats};
use crate::session::settings::{Settings, TestMode};

/// Final numbers for one finished attempt, handed to the result sink.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub wpm: f64,
    pub accuracy: f64,
    pub mode: TestMode,
    #[serde(default)]
    pub duration_secs: Option<u32>,
    #[serde(default)]
    pub word_target: Option<usize>,
    pub elapsed_secs: f64,
    pub typed_chars: usize,
    pub chars: Stats,
    pub correct_words: usize,
    pub incorrect_words: usize,
    pub timestamp: DateTime<Utc>,
}

impl TestSummary {
    pub fn from_attempt(typed: &str, target: &str, settings: &Settings, elapsed: Duration) -> Self {
        let chars = scoring::score(typed, target);
        let words = scoring::word_results(typed, target);
        let typed_chars = typed.chars().count();

        Self {
            wpm: scoring::wpm(typed_chars, elapsed),
            accuracy: scoring::accuracy(chars.correct, typed_chars),
            mode: settings.mode,
            duration_secs: (settings.mode == TestMode::Time).then_some(settings.duration_secs),
            word_target: (settings.mode == TestMode::Words).then_some(settings.word_target),
            elapsed_secs: elapsed.as_secs_f64(),
            typed_chars,
            chars,
            correct_words: words.correct_words.len(),
            incorrect_words: words.incorrect_words.len(),
            timestamp: Utc::now(),
        }
    }
}

/// How a finished attempt ended up being recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveOutcome {
    /// The validation service finalized the attempt and returned a verdict.
    Verified {
        is_valid: bool,
        reason: Option<String>,
        new_achievements: Vec<String>,
    },
    /// Stored through the plain result sink without server-side validation.
    Unverified { new_achievements: Vec<String> },
    SaveFailed { reason: String },
}

impl SaveOutcome {
    pub fn new_achievements(&self) -> &[String] {
        match self {
            SaveOutcome::Verified {
                new_achievements, ..
            }
            | SaveOutcome::Unverified { new_achievements } => new_achievements,
            SaveOutcome::SaveFailed { .. } => &[],
        }
    }

    pub fn label(&self) -> String {
        match self {
            SaveOutcome::Verified { is_valid: true, .. } => "verified".to_string(),
            SaveOutcome::Verified {
                is_valid: false,
                reason,
                ..
            } => match reason {
                Some(reason) => format!("invalid: {reason}"),
                None => "invalid".to_string(),
            },
            SaveOutcome::Unverified { .. } => "saved (unverified)".to_string(),
            SaveOutcome::SaveFailed { reason } => format!("not saved: {reason}"),
        }
    }
}
