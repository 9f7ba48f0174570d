use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::plan::{PlanOrchestrator, PlanView};
use crate::ui::theme::Theme;

/// Splash card before a plan step, or the closing summary of the whole plan.
pub struct PlanCard<'a> {
    plan: &'a PlanOrchestrator,
    theme: &'a Theme,
}

impl<'a> PlanCard<'a> {
    pub fn new(plan: &'a PlanOrchestrator, theme: &'a Theme) -> Self {
        Self { plan, theme }
    }

    fn splash_lines(&self, index: usize) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let Some(plan) = self.plan.plan() else {
            return Vec::new();
        };
        let Some(item) = plan.steps.get(index) else {
            return Vec::new();
        };

        let mut lines = vec![
            Line::from(Span::styled(
                format!("Step {} of {}", index + 1, plan.steps.len()),
                Style::default().fg(colors.text_pending()),
            )),
            Line::from(Span::styled(
                item.display_name().to_string(),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        if let Some(description) = &item.description {
            lines.push(Line::from(Span::styled(
                description.clone(),
                Style::default().fg(colors.fg()),
            )));
            lines.push(Line::from(""));
        }
        if let Some(result) = self.plan.result(&item.id) {
            lines.push(Line::from(Span::styled(
                format!("previous: {:.0} wpm, {:.0}% acc", result.wpm, result.accuracy),
                Style::default().fg(colors.success()),
            )));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "[Enter] start  [Backspace] back  [Esc] exit plan",
            Style::default().fg(colors.text_pending()),
        )));
        lines
    }

    fn summary_lines(&self) -> Vec<Line<'a>> {
        let colors = &self.theme.colors;
        let summary = self.plan.summary();
        let name = self.plan.plan().map_or("Plan", |p| p.name.as_str());

        let mut lines = vec![
            Line::from(Span::styled(
                format!("{name} complete"),
                Style::default()
                    .fg(colors.accent())
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(
                "{}/{} steps finished",
                summary.completed, summary.total_steps
            )),
        ];
        if summary.completed > 0 {
            lines.push(Line::from(format!(
                "{:.0} wpm  {:.1}% acc  {:.0}s total",
                summary.mean_wpm, summary.mean_accuracy, summary.total_elapsed_secs
            )));
        }
        lines.push(Line::from(""));

        if let Some(plan) = self.plan.plan() {
            for item in &plan.steps {
                let (text, color) = match self.plan.result(&item.id) {
                    Some(r) => (
                        format!(
                            "{:<24} {:>5.0} wpm {:>5.1}%",
                            item.display_name(),
                            r.wpm,
                            r.accuracy
                        ),
                        colors.fg(),
                    ),
                    None => (
                        format!("{:<24} {:>16}", item.display_name(), "skipped"),
                        colors.text_pending(),
                    ),
                };
                lines.push(Line::from(Span::styled(text, Style::default().fg(color))));
            }
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            "[Enter] done  [Backspace] back",
            Style::default().fg(colors.text_pending()),
        )));
        lines
    }
}

impl Widget for PlanCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let lines = match self.plan.view() {
            PlanView::Splash(index) => self.splash_lines(index),
            PlanView::Summary => self.summary_lines(),
            PlanView::Inactive | PlanView::Step(_) => return,
        };

        let block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()).fg(colors.fg()));

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
