pub mod components;
pub mod layout;
pub mod theme;

use std::time::Instant;

use ratatui::Frame;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::app::App;
use crate::plan::PlanView;
use crate::session::result::SaveOutcome;
use crate::session::settings::TestMode;
use crate::session::test_session::SessionState;
use crate::ui::components::plan_card::PlanCard;
use crate::ui::components::progress_bar::ProgressBar;
use crate::ui::components::typing_area::TypingArea;
use crate::ui::layout::{AppLayout, centered_rect, pack_hint_lines};

pub fn render(frame: &mut Frame, app: &App, now: Instant) {
    let area = frame.area();
    let colors = &app.theme.colors;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg()).fg(colors.fg())),
        area,
    );

    match app.plan.view() {
        PlanView::Splash(_) | PlanView::Summary => {
            let card = centered_rect(60, 60, area);
            frame.render_widget(PlanCard::new(&app.plan, &app.theme), card);
        }
        PlanView::Inactive | PlanView::Step(_) => render_test(frame, app, now),
    }
}

fn render_test(frame: &mut Frame, app: &App, now: Instant) {
    let layout = AppLayout::new(frame.area());
    let session = &app.session;
    let colors = &app.theme.colors;

    frame.render_widget(Paragraph::new(header_line(app, now)), layout.header);

    if let Some((label, ratio)) = progress(app, now) {
        frame.render_widget(ProgressBar::new(&label, ratio, &app.theme), layout.progress);
    }

    if app.is_loading() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                " loading text...",
                Style::default().fg(colors.text_pending()),
            ))
            .block(Block::bordered().border_style(Style::default().fg(colors.border()))),
            layout.main,
        );
    } else {
        let ghost = session.settings().ghost.enabled.then(|| session.ghost_index()).flatten();
        frame.render_widget(
            TypingArea::new(session.typed(), session.target(), &app.theme)
                .ghost(ghost)
                .dimmed(app.dimmed),
            layout.main,
        );
    }

    frame.render_widget(Paragraph::new(status_lines(app)), layout.status);

    let hints: &[&str] = match session.state() {
        SessionState::Running => &["[Esc] stop", "[Shift+Tab] restart", "[Ctrl+C] quit"],
        _ if app.plan.is_active() => &["[Enter] next step", "[Shift+Tab] retry", "[Esc] exit plan"],
        _ => &["[Enter] new text", "[Shift+Tab] repeat", "[Ctrl+C] quit"],
    };
    let footer = pack_hint_lines(hints, layout.footer.width as usize)
        .into_iter()
        .next()
        .unwrap_or_default();
    frame.render_widget(
        Paragraph::new(Span::styled(footer, Style::default().fg(colors.text_pending()))),
        layout.footer,
    );
}

fn header_line(app: &App, now: Instant) -> Line<'static> {
    let session = &app.session;
    let settings = session.settings();
    let colors = &app.theme.colors;

    let mode = match settings.mode {
        TestMode::Time => format!("time {}", settings.duration_secs),
        TestMode::Words => format!("words {}", settings.word_target),
        TestMode::Quote => format!("quote {}", settings.quote_length.as_key()),
        TestMode::Zen => "zen".to_string(),
        TestMode::Preset => "preset".to_string(),
    };

    let header_style = Style::default().fg(colors.header_fg()).bg(colors.header_bg());
    let mut spans = vec![
        Span::styled(
            " keypace ",
            header_style.fg(colors.accent()).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {mode} "), header_style),
        Span::styled(
            format!(
                " {:.0} wpm  {:.0}% ",
                session.live_wpm(now),
                session.live_accuracy()
            ),
            header_style,
        ),
    ];

    if let Some(remaining) = session.remaining(now) {
        let secs = remaining.as_secs_f64().ceil() as u64;
        let style = if app.time_warning {
            header_style.fg(colors.warning()).add_modifier(Modifier::BOLD)
        } else {
            header_style
        };
        spans.push(Span::styled(format!(" {}:{:02} ", secs / 60, secs % 60), style));
    }
    if let Some(item) = app.plan.current_item()
        && app.plan.is_active()
    {
        spans.push(Span::styled(format!(" plan: {} ", item.display_name()), header_style));
    }
    Line::from(spans)
}

/// Label and fill ratio for the progress row, if the mode has a natural end.
fn progress(app: &App, now: Instant) -> Option<(String, f64)> {
    let session = &app.session;
    let settings = session.settings();
    match settings.mode {
        TestMode::Time => {
            let total = settings.duration().as_secs_f64();
            let elapsed = session.elapsed(now).as_secs_f64().min(total);
            (total > 0.0).then(|| (format!("{elapsed:.0}/{total:.0}s"), elapsed / total))
        }
        TestMode::Words => {
            let done = session.typed().split_whitespace().count().min(settings.word_target);
            let total = settings.word_target.max(1);
            Some((format!("{done}/{total}"), done as f64 / total as f64))
        }
        TestMode::Quote | TestMode::Preset => {
            let total = session.target().chars().count();
            if total == 0 {
                return None;
            }
            let done = session.typed().chars().count().min(total);
            Some((format!("{done}/{total}"), done as f64 / total as f64))
        }
        TestMode::Zen => None,
    }
}

fn status_lines(app: &App) -> Vec<Line<'static>> {
    let session = &app.session;
    let colors = &app.theme.colors;
    let mut lines = Vec::new();

    if let Some(summary) = session.summary() {
        let mut spans = vec![Span::styled(
            format!(
                " {:.0} wpm  {:.1}% acc  {:.1}s  ",
                summary.wpm, summary.accuracy, summary.elapsed_secs
            ),
            Style::default().fg(colors.accent()).add_modifier(Modifier::BOLD),
        )];
        match session.outcome() {
            Some(outcome) => {
                let color = match outcome {
                    SaveOutcome::Verified { is_valid: true, .. } => colors.success(),
                    SaveOutcome::Unverified { .. } => colors.fg(),
                    _ => colors.error(),
                };
                spans.push(Span::styled(outcome.label(), Style::default().fg(color)));
                for achievement in outcome.new_achievements() {
                    spans.push(Span::styled(
                        format!("  \u{2605} {achievement}"),
                        Style::default().fg(colors.warning()),
                    ));
                }
            }
            None => spans.push(Span::styled(
                "saving...",
                Style::default().fg(colors.text_pending()),
            )),
        }
        lines.push(Line::from(spans));
    }

    if let Some(attribution) = session.attribution() {
        lines.push(Line::from(Span::styled(
            format!(" {attribution}"),
            Style::default()
                .fg(colors.text_pending())
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines
}
