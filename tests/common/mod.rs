#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::SmallRng;

use keypace::anticheat::protocol::{LocalTimeContext, SessionId, SinkAck, Verdict};
use keypace::app::{App, Services};
use keypace::config::Config;
use keypace::service::{ResultSink, ServiceError, ValidationService};
use keypace::session::input::Command;
use keypace::session::result::TestSummary;
use keypace::session::settings::{QuoteLength, Settings, TestMode};
use keypace::text::{Manifest, Quote, TextError, TextSource};

pub const WAIT: Duration = Duration::from_secs(5);

/// Every pool is a single repeated word, so generated targets are predictable.
pub struct FixedText {
    pub word: &'static str,
}

impl TextSource for FixedText {
    fn word_pool(&self, difficulty: &str) -> Result<Vec<String>, TextError> {
        if difficulty == "missing" {
            return Err(TextError::NotFound(difficulty.to_string()));
        }
        Ok(vec![self.word.to_string()])
    }

    fn quotes(&self, _length: QuoteLength) -> Result<Vec<Quote>, TextError> {
        Ok(vec![Quote {
            quote: "to  be\nor not".to_string(),
            author: Some("Someone".to_string()),
            source: None,
            date: None,
        }])
    }

    fn manifest(&self) -> Result<Manifest, TextError> {
        Ok(Manifest::default())
    }
}

/// Serves only the pools its manifest lists.
pub struct ListedText {
    pub difficulties: Vec<&'static str>,
}

impl TextSource for ListedText {
    fn word_pool(&self, difficulty: &str) -> Result<Vec<String>, TextError> {
        if !self.difficulties.iter().any(|d| *d == difficulty) {
            return Err(TextError::NotFound(difficulty.to_string()));
        }
        Ok(vec![format!("{difficulty}x")])
    }

    fn quotes(&self, _length: QuoteLength) -> Result<Vec<Quote>, TextError> {
        Ok(Vec::new())
    }

    fn manifest(&self) -> Result<Manifest, TextError> {
        Ok(Manifest {
            difficulties: self.difficulties.iter().map(|d| d.to_string()).collect(),
            quote_lengths: Vec::new(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Start { target: String },
    Progress(usize),
    Finalize { typed: String },
    Cancel(String),
    Submit { wpm: f64, typed_chars: usize },
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub fn calls(log: &CallLog) -> Vec<Call> {
    log.lock().unwrap().clone()
}

pub struct MockValidation {
    pub log: CallLog,
    pub fail_start: bool,
    pub fail_finalize: bool,
    pub next_id: u32,
}

impl MockValidation {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_start: false,
            fail_finalize: false,
            next_id: 0,
        }
    }
}

impl ValidationService for MockValidation {
    fn start_session(
        &mut self,
        _user_id: &str,
        _settings: &Settings,
        target: &str,
    ) -> Result<SessionId, ServiceError> {
        self.log.lock().unwrap().push(Call::Start {
            target: target.to_string(),
        });
        if self.fail_start {
            return Err(ServiceError::Network("connection refused".to_string()));
        }
        self.next_id += 1;
        Ok(SessionId(format!("s{}", self.next_id)))
    }

    fn record_progress(
        &mut self,
        _session: &SessionId,
        typed_len: usize,
    ) -> Result<(), ServiceError> {
        self.log.lock().unwrap().push(Call::Progress(typed_len));
        Ok(())
    }

    fn finalize_session(
        &mut self,
        _session: &SessionId,
        typed: &str,
        _elapsed_ms: u64,
        _local_time: &LocalTimeContext,
    ) -> Result<Verdict, ServiceError> {
        self.log.lock().unwrap().push(Call::Finalize {
            typed: typed.to_string(),
        });
        if self.fail_finalize {
            return Err(ServiceError::SessionExpired);
        }
        Ok(Verdict {
            is_valid: true,
            invalid_reason: None,
            new_achievements: vec!["first-verified".to_string()],
        })
    }

    fn cancel_session(&mut self, session: &SessionId) -> Result<(), ServiceError> {
        self.log.lock().unwrap().push(Call::Cancel(session.0.clone()));
        Ok(())
    }
}

pub struct RecordingSink {
    pub log: CallLog,
}

impl ResultSink for RecordingSink {
    fn submit(&mut self, summary: &TestSummary) -> Result<SinkAck, ServiceError> {
        self.log.lock().unwrap().push(Call::Submit {
            wpm: summary.wpm,
            typed_chars: summary.typed_chars,
        });
        Ok(SinkAck::default())
    }
}

pub fn words_settings(count: usize) -> Settings {
    Settings {
        mode: TestMode::Words,
        word_target: count,
        ..Settings::default()
    }
}

pub fn preset_settings(text: &str) -> Settings {
    Settings {
        mode: TestMode::Preset,
        preset_text: Some(text.to_string()),
        ..Settings::default()
    }
}

pub fn verified_config(char_threshold: usize) -> Config {
    let mut config = Config::default();
    config.user_id = Some("user-1".to_string());
    config.service.base_url = Some("http://127.0.0.1:9".to_string());
    config.reporting.char_threshold = char_threshold;
    config.reporting.interval_ms = 60_000;
    config
}

pub fn anonymous_app(settings: Settings, log: &CallLog) -> App {
    app_with_text(settings, Box::new(FixedText { word: "aa" }), log)
}

pub fn app_with_text(settings: Settings, text: Box<dyn TextSource>, log: &CallLog) -> App {
    let services = Services {
        text,
        validation: None,
        sink: Box::new(RecordingSink { log: log.clone() }),
    };
    App::with_rng(Config::default(), settings, services, SmallRng::seed_from_u64(3))
}

pub fn verified_app(settings: Settings, validation: MockValidation, log: &CallLog) -> App {
    let services = Services {
        text: Box::new(FixedText { word: "aa" }),
        validation: Some(Box::new(validation)),
        sink: Box::new(RecordingSink { log: log.clone() }),
    };
    App::with_rng(verified_config(5), settings, services, SmallRng::seed_from_u64(3))
}

/// Feed `text` one char at a time, pumping replies between keys.
pub fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        let now = Instant::now();
        app.handle_command(Command::Char(ch), now);
        app.pump(now);
    }
}

/// Apply replies until the current attempt has an outcome or the wait runs out.
pub fn wait_for_outcome(app: &mut App) -> bool {
    let deadline = Instant::now() + WAIT;
    while app.session.outcome().is_none() && Instant::now() < deadline {
        app.wait_for_reply(Duration::from_millis(50));
    }
    app.session.outcome().is_some()
}
