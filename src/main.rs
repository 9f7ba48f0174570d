use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::event::{
    KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::{error, info};

use keypace::app::{App, Services};
use keypace::config::Config;
use keypace::event::{AppEvent, EventHandler};
use keypace::logging;
use keypace::plan::Plan;
use keypace::session::settings::{QuoteLength, Settings, TestMode};
use keypace::ui;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Zen,
    Time,
    Words,
    Quote,
    Preset,
}

impl From<ModeArg> for TestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Zen => TestMode::Zen,
            ModeArg::Time => TestMode::Time,
            ModeArg::Words => TestMode::Words,
            ModeArg::Quote => TestMode::Quote,
            ModeArg::Preset => TestMode::Preset,
        }
    }
}

#[derive(Parser)]
#[command(name = "keypace", version, about = "Terminal typing test with live scoring")]
struct Cli {
    #[arg(short, long, value_enum, help = "Test mode")]
    mode: Option<ModeArg>,

    #[arg(short, long, help = "Duration in seconds for time mode")]
    time: Option<u32>,

    #[arg(short, long, help = "Number of words for words mode")]
    words: Option<usize>,

    #[arg(short, long, help = "Word list difficulty (easy, normal, hard)")]
    difficulty: Option<String>,

    #[arg(long, help = "Add punctuation to generated words")]
    punctuation: bool,

    #[arg(long, help = "Mix numbers into generated words")]
    numbers: bool,

    #[arg(long, help = "Capitalize generated words")]
    caps: bool,

    #[arg(long, help = "Quote length (short, medium, long, epic)")]
    quote_length: Option<String>,

    #[arg(long, value_name = "FILE", help = "Type the contents of a text file")]
    preset: Option<PathBuf>,

    #[arg(long, value_name = "WPM", help = "Race a ghost cursor at this pace")]
    ghost: Option<u32>,

    #[arg(long, value_name = "PATH|NAME", help = "Run a practice plan")]
    plan: Option<String>,

    #[arg(long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Never contact the validation service")]
    offline: bool,

    #[arg(long, value_name = "FILE", help = "Write logs here instead of the data directory")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(mode) = self.mode {
            settings.mode = mode.into();
        }
        if let Some(secs) = self.time {
            settings.duration_secs = secs.max(1);
        }
        if let Some(words) = self.words {
            settings.word_target = words.max(1);
        }
        if let Some(difficulty) = &self.difficulty {
            settings.difficulty = difficulty.clone();
        }
        settings.punctuation |= self.punctuation;
        settings.numbers |= self.numbers;
        settings.capitalization |= self.caps;
        if let Some(length) = &self.quote_length {
            settings.quote_length = QuoteLength::from_key(length)
                .with_context(|| format!("unknown quote length {length:?}"))?;
        }
        if let Some(path) = &self.preset {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading preset {}", path.display()))?;
            settings.preset_text = Some(text);
            settings.mode = TestMode::Preset;
        }
        if let Some(wpm) = self.ghost {
            settings.ghost.enabled = true;
            settings.ghost.wpm = wpm.max(1);
        }
        Ok(())
    }
}

/// A plan argument is a file path, or the name of a plan in the config plans directory.
fn resolve_plan(arg: &str) -> Result<Plan> {
    let direct = Path::new(arg);
    let path = if direct.is_file() {
        direct.to_path_buf()
    } else {
        Config::plans_dir().join(format!("{arg}.toml"))
    };
    Plan::load(&path).with_context(|| format!("loading plan {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(Config::log_path);
    logging::init(Some(&log_path));

    let mut config = Config::load()?;
    if let Some(theme) = &cli.theme {
        config.theme = theme.clone();
    }
    let mut settings = config.defaults.clone();
    cli.apply(&mut settings)?;
    let plan = cli.plan.as_deref().map(resolve_plan).transpose()?;

    let services = Services::from_config(&config, cli.offline)?;
    let tick_rate = config.tick_rate();
    let mut app = App::new(config, settings, services);
    if let Some(plan) = plan {
        app.start_plan(plan);
    }
    info!(mode = %app.session.settings().mode, "starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Release and repeat events are reported separately where supported.
    let keyboard_enhanced = execute!(
        io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let events = EventHandler::new(tick_rate);

    let result = run_app(&mut terminal, &mut app, &events);

    if keyboard_enhanced {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = ?err, "exited with error");
        eprintln!("Error: {err:?}");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, app, Instant::now()))?;

        match events.next()? {
            AppEvent::Command(command) => {
                let now = Instant::now();
                app.handle_command(command, now);
                app.pump(now);
            }
            AppEvent::Tick => app.tick(Instant::now()),
            AppEvent::Resize => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
