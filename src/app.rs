use std::time::{Duration, Instant};

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, warn};

use crate::anticheat::protocol::ServiceReply;
use crate::anticheat::reporter::ProgressReporter;
use crate::config::Config;
use crate::plan::{Plan, PlanOrchestrator, PlanView};
use crate::service::local::LocalResultSink;
use crate::service::worker::ServiceWorker;
use crate::service::{ResultSink, ValidationService};
use crate::session::input::Command;
use crate::session::settings::Settings;
use crate::session::test_session::{Effect, SessionState, TestSession};
use crate::store::json_store::JsonStore;
use crate::text::{EmbeddedText, Manifest, TextLoader, TextSource, TextSupply};
use crate::ui::theme::Theme;

/// Backends the app talks to. Tests substitute in-memory ones.
pub struct Services {
    pub text: Box<dyn TextSource>,
    pub validation: Option<Box<dyn ValidationService>>,
    pub sink: Box<dyn ResultSink>,
}

impl Services {
    /// Bundled text, the HTTP service for verified users, local history otherwise.
    pub fn from_config(config: &Config, offline: bool) -> Result<Self> {
        let local: Box<dyn ResultSink> = Box::new(LocalResultSink::new(JsonStore::new()?));
        let text: Box<dyn TextSource> = Box::new(EmbeddedText::new());

        if offline || config.verified_user().is_none() {
            return Ok(Self {
                text,
                validation: None,
                sink: local,
            });
        }
        Ok(Self::remote(config, text, local))
    }

    #[cfg(feature = "network")]
    fn remote(config: &Config, text: Box<dyn TextSource>, local: Box<dyn ResultSink>) -> Self {
        use crate::service::http::HttpService;

        let base_url = config.service.base_url.as_deref().unwrap_or_default();
        let timeout = Duration::from_secs(config.service.timeout_secs);
        match HttpService::new(base_url, timeout) {
            Ok(http) => Self {
                text,
                validation: Some(Box::new(http.clone())),
                sink: Box::new(http),
            },
            Err(err) => {
                warn!(error = %err, "validation service unavailable, results stay local");
                Self {
                    text,
                    validation: None,
                    sink: local,
                }
            }
        }
    }

    #[cfg(not(feature = "network"))]
    fn remote(_config: &Config, text: Box<dyn TextSource>, local: Box<dyn ResultSink>) -> Self {
        warn!("built without network support, results stay local");
        Self {
            text,
            validation: None,
            sink: local,
        }
    }
}

pub struct App {
    pub config: Config,
    pub theme: Theme,
    pub session: TestSession,
    pub plan: PlanOrchestrator,
    /// User settings; plan steps are applied on top of these and they return on plan exit.
    base_settings: Settings,
    manifest: Manifest,
    supply: TextSupply,
    loader: TextLoader,
    worker: ServiceWorker,
    awaiting_text: bool,
    pub dimmed: bool,
    pub time_warning: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: Config, settings: Settings, services: Services) -> Self {
        Self::with_rng(config, settings, services, SmallRng::from_entropy())
    }

    pub fn with_rng(config: Config, settings: Settings, services: Services, rng: SmallRng) -> Self {
        let manifest = services.text.manifest().unwrap_or_else(|err| {
            warn!(error = %err, "text manifest unavailable, difficulties are not checked");
            Manifest::default()
        });
        let settings = known_difficulty(&manifest, settings);
        let reporter = match (config.verified_user(), services.validation.is_some()) {
            (Some(user), true) => Some(ProgressReporter::new(user, config.reporting.policy())),
            _ => None,
        };
        let theme = Theme::load(&config.theme).unwrap_or_default();

        let mut app = Self {
            theme,
            session: TestSession::new(settings.clone(), reporter),
            plan: PlanOrchestrator::new(),
            base_settings: settings,
            manifest,
            supply: TextSupply::new(rng),
            loader: TextLoader::spawn(services.text),
            worker: ServiceWorker::spawn(services.validation, services.sink),
            awaiting_text: false,
            dimmed: false,
            time_warning: false,
            should_quit: false,
            config,
        };
        app.regenerate();
        app
    }

    /// True while the current test has no text because its data is still loading.
    pub fn is_loading(&self) -> bool {
        self.awaiting_text
    }

    pub fn start_plan(&mut self, plan: Plan) {
        self.plan.start(plan);
        self.session.unload();
        self.awaiting_text = false;
        self.flush();
    }

    pub fn handle_command(&mut self, command: Command, now: Instant) {
        if command == Command::Quit {
            self.should_quit = true;
            return;
        }

        match self.plan.view() {
            PlanView::Inactive | PlanView::Step(_) => {
                self.handle_typing(command, now);
                // Keys can arrive faster than ticks; timers still move with them.
                self.session.tick(now);
            }
            PlanView::Splash(_) => match command {
                Command::Next => self.start_plan_step(),
                Command::Backspace => self.plan.retreat(),
                Command::Escape => self.exit_plan(),
                _ => {}
            },
            PlanView::Summary => match command {
                Command::Next | Command::Escape => self.exit_plan(),
                Command::Backspace => self.plan.retreat(),
                _ => {}
            },
        }
        self.flush();
    }

    fn handle_typing(&mut self, command: Command, now: Instant) {
        match command {
            Command::Char(ch) => self.session.type_char(ch, now),
            Command::Backspace => self.session.backspace(now),
            Command::BackspaceWord => self.session.backspace_word(now),
            Command::Escape => {
                if self.session.state() == SessionState::Running {
                    self.session.escape(now);
                } else if self.plan.is_active() {
                    self.exit_plan();
                }
            }
            Command::Repeat => self.session.repeat(),
            Command::Next => {
                let finished = self.session.state() == SessionState::Finished;
                if self.plan.is_active() && finished {
                    self.plan.advance();
                    self.session.unload();
                } else {
                    self.regenerate();
                }
            }
            Command::Quit => self.should_quit = true,
        }
    }

    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
        self.pump(now);
    }

    /// Apply loader results and service replies, then forward queued work.
    pub fn pump(&mut self, now: Instant) {
        let loaded = self.loader.drain();
        if !loaded.is_empty() {
            for item in loaded {
                self.supply.apply(item);
            }
            if self.awaiting_text {
                self.regenerate();
            }
        }

        for reply in self.worker.drain() {
            self.apply_reply(reply, now);
        }
        self.flush();
    }

    /// Block until text for the current test is loaded or `timeout` passes.
    pub fn wait_for_text(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.awaiting_text && Instant::now() < deadline {
            if let Some(item) = self.loader.recv_timeout(Duration::from_millis(20)) {
                self.supply.apply(item);
                self.regenerate();
            }
        }
        !self.awaiting_text
    }

    /// Block until the next service reply arrives and apply it.
    pub fn wait_for_reply(&mut self, timeout: Duration) -> bool {
        match self.worker.recv_timeout(timeout) {
            Some(reply) => {
                self.apply_reply(reply, Instant::now());
                self.flush();
                true
            }
            None => false,
        }
    }

    fn apply_reply(&mut self, reply: ServiceReply, now: Instant) {
        if reply.attempt() != self.session.attempt() {
            debug!(attempt = reply.attempt().0, "reply for an earlier attempt");
        }
        self.session.apply_reply(reply, now);
    }

    fn start_plan_step(&mut self) {
        let Some(settings) = self.plan.start_step(&self.base_settings) else {
            return;
        };
        self.session.set_settings(known_difficulty(&self.manifest, settings));
        self.regenerate();
    }

    fn exit_plan(&mut self) {
        self.plan.exit();
        self.session.set_settings(self.base_settings.clone());
        self.regenerate();
    }

    fn regenerate(&mut self) {
        match self.supply.prepare(self.session.settings()) {
            Some(prepared) => {
                self.session.load(prepared);
                self.awaiting_text = false;
            }
            None => {
                self.session.unload();
                self.awaiting_text = true;
            }
        }
        for request in self.supply.take_requests() {
            self.loader.request(request);
        }
        self.time_warning = false;
    }

    fn flush(&mut self) {
        self.worker.send_all(self.session.drain_requests());

        for effect in self.session.drain_effects() {
            match effect {
                Effect::KeySound => {}
                Effect::TimeWarning => self.time_warning = true,
                Effect::Dim(on) => self.dimmed = on,
                Effect::Finished(attempt) => {
                    debug!(attempt = attempt.0, "attempt finished");
                    self.time_warning = false;
                    if let (PlanView::Step(_), Some(summary)) =
                        (self.plan.view(), self.session.summary())
                    {
                        self.plan.record_finish(summary);
                    }
                }
            }
        }
    }
}

fn known_difficulty(manifest: &Manifest, mut settings: Settings) -> Settings {
    let difficulty = manifest
        .difficulty_or_default(&settings.difficulty)
        .to_string();
    if difficulty != settings.difficulty {
        warn!(requested = %settings.difficulty, using = %difficulty, "unknown difficulty");
        settings.difficulty = difficulty;
    }
    settings
}
