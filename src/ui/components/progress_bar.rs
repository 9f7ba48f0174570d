use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::widgets::Widget;

use crate::ui::theme::Theme;

/// A single-row bar with a right-aligned label, used for test and plan progress.
pub struct ProgressBar<'a> {
    pub label: String,
    pub ratio: f64,
    pub theme: &'a Theme,
}

impl<'a> ProgressBar<'a> {
    pub fn new(label: &str, ratio: f64, theme: &'a Theme) -> Self {
        Self {
            label: label.to_string(),
            ratio: ratio.clamp(0.0, 1.0),
            theme,
        }
    }
}

impl Widget for ProgressBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let colors = &self.theme.colors;

        let label_width = (self.label.chars().count() as u16 + 1).min(area.width);
        let bar_width = area.width - label_width;
        let filled_width = (self.ratio * bar_width as f64).round() as u16;

        for x in area.x..area.x + bar_width {
            let (symbol, color) = if x < area.x + filled_width {
                ("\u{2501}", colors.accent())
            } else {
                ("\u{2500}", colors.border())
            };
            buf[(x, area.y)]
                .set_symbol(symbol)
                .set_style(Style::default().fg(color).bg(colors.bg()));
        }

        buf.set_string(
            area.x + bar_width + 1,
            area.y,
            &self.label,
            Style::default().fg(colors.fg()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_clamped() {
        let theme = Theme::default();
        assert_eq!(ProgressBar::new("x", 1.7, &theme).ratio, 1.0);
        assert_eq!(ProgressBar::new("x", -0.2, &theme).ratio, 0.0);
    }

    #[test]
    fn test_half_filled() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 12, 1);
        let mut buf = Buffer::empty(area);
        ProgressBar::new("1/2", 0.5, &theme).render(area, &mut buf);

        // 12 wide minus "1/2" and a gap leaves 8 cells of bar.
        let filled = (0..8).filter(|&x| buf[(x, 0)].symbol() == "\u{2501}").count();
        assert_eq!(filled, 4);
        assert_eq!(buf[(9, 0)].symbol(), "1");
    }
}
