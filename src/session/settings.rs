use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::generator::WordOptions;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    Zen,
    #[default]
    Time,
    Words,
    Quote,
    Preset,
}

impl TestMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TestMode::Zen => "zen",
            TestMode::Time => "time",
            TestMode::Words => "words",
            TestMode::Quote => "quote",
            TestMode::Preset => "preset",
        }
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteLength {
    Short,
    #[default]
    Medium,
    Long,
    Epic,
}

impl QuoteLength {
    pub const ALL: [QuoteLength; 4] = [
        QuoteLength::Short,
        QuoteLength::Medium,
        QuoteLength::Long,
        QuoteLength::Epic,
    ];

    pub fn as_key(self) -> &'static str {
        match self {
            QuoteLength::Short => "short",
            QuoteLength::Medium => "medium",
            QuoteLength::Long => "long",
            QuoteLength::Epic => "epic",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_key() == key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostSettings {
    pub enabled: bool,
    pub wpm: u32,
}

impl Default for GhostSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            wpm: 60,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: TestMode,
    pub duration_secs: u32,
    pub word_target: usize,
    pub difficulty: String,
    pub punctuation: bool,
    pub numbers: bool,
    pub capitalization: bool,
    pub quote_length: QuoteLength,
    pub preset_text: Option<String>,
    pub ghost: GhostSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: TestMode::Time,
            duration_secs: 30,
            word_target: 25,
            difficulty: "normal".to_string(),
            punctuation: false,
            numbers: false,
            capitalization: false,
            quote_length: QuoteLength::Medium,
            preset_text: None,
            ghost: GhostSettings::default(),
        }
    }
}

impl Settings {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs as u64)
    }

    pub fn word_options(&self) -> WordOptions {
        WordOptions {
            punctuation: self.punctuation,
            numbers: self.numbers,
            capitalization: self.capitalization,
        }
    }

    /// Whether switching from `self` to `next` invalidates the current target text.
    /// Ghost pacing and durations only change how a test is run, not what is typed.
    pub fn needs_regeneration(&self, next: &Settings) -> bool {
        if self.mode != next.mode || self.word_options() != next.word_options() {
            return true;
        }
        match next.mode {
            TestMode::Time | TestMode::Zen => self.difficulty != next.difficulty,
            TestMode::Words => {
                self.difficulty != next.difficulty || self.word_target != next.word_target
            }
            TestMode::Quote => self.quote_length != next.quote_length,
            TestMode::Preset => self.preset_text != next.preset_text,
        }
    }
}
