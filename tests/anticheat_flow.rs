mod common;

use std::sync::{Arc, Mutex};
use std::time::Instant;

use common::{
    Call, CallLog, MockValidation, WAIT, calls, preset_settings, type_text, verified_app,
    wait_for_outcome,
};
use keypace::session::input::Command;
use keypace::session::result::SaveOutcome;
use keypace::session::test_session::SessionState;

const TEXT: &str = "aaaa bbbb cccc dddd";

fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Type the first char and wait for the session to open before continuing.
fn start_attempt(app: &mut keypace::app::App, first: char) {
    app.handle_command(Command::Char(first), Instant::now());
    assert!(app.wait_for_reply(WAIT), "no start reply");
}

fn progress_lengths(log: &CallLog) -> Vec<usize> {
    calls(log)
        .into_iter()
        .filter_map(|c| match c {
            Call::Progress(len) => Some(len),
            _ => None,
        })
        .collect()
}

#[test]
fn test_verified_attempt_reports_progress_then_finalizes() {
    let log = new_log();
    let mut app = verified_app(preset_settings(TEXT), MockValidation::new(log.clone()), &log);

    start_attempt(&mut app, 'a');
    type_text(&mut app, &TEXT[1..]);
    assert_eq!(app.session.state(), SessionState::Finished);
    assert!(wait_for_outcome(&mut app));

    assert_eq!(
        app.session.outcome(),
        Some(&SaveOutcome::Verified {
            is_valid: true,
            reason: None,
            new_achievements: vec!["first-verified".to_string()],
        })
    );

    let log_calls = calls(&log);
    assert_eq!(
        log_calls.first(),
        Some(&Call::Start {
            target: TEXT.to_string()
        })
    );
    assert_eq!(
        log_calls.last(),
        Some(&Call::Finalize {
            typed: TEXT.to_string()
        })
    );
    assert!(!log_calls.iter().any(|c| matches!(c, Call::Submit { .. })));

    let lengths = progress_lengths(&log);
    assert!(!lengths.is_empty());
    assert!(lengths.windows(2).all(|w| w[0] < w[1]), "{lengths:?}");
    assert_eq!(lengths.last(), Some(&TEXT.len()));
    assert!(lengths.iter().all(|&len| len >= 5));
}

#[test]
fn test_failed_start_saves_unverified() {
    let log = new_log();
    let mut validation = MockValidation::new(log.clone());
    validation.fail_start = true;
    let mut app = verified_app(preset_settings(TEXT), validation, &log);

    start_attempt(&mut app, 'a');
    type_text(&mut app, &TEXT[1..]);
    assert!(wait_for_outcome(&mut app));

    assert!(matches!(
        app.session.outcome(),
        Some(SaveOutcome::Unverified { .. })
    ));
    let log_calls = calls(&log);
    assert!(progress_lengths(&log).is_empty());
    assert!(!log_calls.iter().any(|c| matches!(c, Call::Finalize { .. })));
    assert!(log_calls.iter().any(|c| matches!(c, Call::Submit { .. })));
}

#[test]
fn test_failed_finalize_falls_back_to_sink() {
    let log = new_log();
    let mut validation = MockValidation::new(log.clone());
    validation.fail_finalize = true;
    let mut app = verified_app(preset_settings(TEXT), validation, &log);

    start_attempt(&mut app, 'a');
    type_text(&mut app, &TEXT[1..]);
    assert!(wait_for_outcome(&mut app));

    assert!(matches!(
        app.session.outcome(),
        Some(SaveOutcome::Unverified { .. })
    ));
    let log_calls = calls(&log);
    let finalize = log_calls
        .iter()
        .position(|c| matches!(c, Call::Finalize { .. }))
        .unwrap();
    let submit = log_calls
        .iter()
        .position(|c| matches!(c, Call::Submit { .. }))
        .unwrap();
    assert!(finalize < submit);
}

#[test]
fn test_restart_cancels_open_session() {
    let log = new_log();
    let mut app = verified_app(preset_settings(TEXT), MockValidation::new(log.clone()), &log);

    start_attempt(&mut app, 'a');
    app.handle_command(Command::Repeat, Instant::now());
    start_attempt(&mut app, 'a');

    let log_calls = calls(&log);
    assert_eq!(
        log_calls,
        vec![
            Call::Start {
                target: TEXT.to_string()
            },
            Call::Cancel("s1".to_string()),
            Call::Start {
                target: TEXT.to_string()
            },
        ]
    );
}

#[test]
fn test_late_start_for_abandoned_attempt_is_cancelled() {
    let log = new_log();
    let mut app = verified_app(preset_settings(TEXT), MockValidation::new(log.clone()), &log);

    // Restart before the first start reply has been applied.
    app.handle_command(Command::Char('a'), Instant::now());
    app.handle_command(Command::Repeat, Instant::now());
    assert!(app.wait_for_reply(WAIT));

    start_attempt(&mut app, 'a');
    let log_calls = calls(&log);
    assert!(log_calls.contains(&Call::Cancel("s1".to_string())), "{log_calls:?}");
    assert_eq!(
        log_calls
            .iter()
            .filter(|c| matches!(c, Call::Start { .. }))
            .count(),
        2
    );
}
