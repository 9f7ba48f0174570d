use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::engine::scoring::{self, CharClass};
use crate::ui::theme::Theme;

/// Pending target chars shown after the cursor. Streams can be very long.
const MAX_PENDING_CHARS: usize = 1500;

pub struct TypingArea<'a> {
    typed: &'a str,
    target: &'a str,
    ghost: Option<usize>,
    theme: &'a Theme,
    dimmed: bool,
}

impl<'a> TypingArea<'a> {
    pub fn new(typed: &'a str, target: &'a str, theme: &'a Theme) -> Self {
        Self {
            typed,
            target,
            ghost: None,
            theme,
            dimmed: false,
        }
    }

    pub fn ghost(mut self, index: Option<usize>) -> Self {
        self.ghost = index;
        self
    }

    pub fn dimmed(mut self, dimmed: bool) -> Self {
        self.dimmed = dimmed;
        self
    }
}

/// The untyped rest of the target, and its char offset into the target.
///
/// Alignment is by word: the tail starts inside the word currently being typed, after as
/// many chars as have been typed for it.
fn pending_tail(typed: &str, target: &str) -> (usize, String) {
    let typed_words: Vec<&str> = typed.split(' ').collect();
    let target_words: Vec<&str> = target.split(' ').collect();
    let current = typed_words.len() - 1;

    let Some(word) = target_words.get(current) else {
        return (target.chars().count(), String::new());
    };
    let typed_len = typed_words[current].chars().count();
    let word_len = word.chars().count();

    let offset = target_words[..current]
        .iter()
        .map(|w| w.chars().count() + 1)
        .sum::<usize>()
        + typed_len.min(word_len);

    let mut tail: String = word.chars().skip(typed_len).collect();
    for w in &target_words[current + 1..] {
        tail.push(' ');
        tail.push_str(w);
    }
    (offset, tail)
}

impl Widget for TypingArea<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let mut spans: Vec<Span> = Vec::new();

        for mark in scoring::char_marks(self.typed, self.target) {
            let style = match mark.class {
                CharClass::Correct => Style::default().fg(colors.text_correct()),
                CharClass::Incorrect => Style::default()
                    .fg(colors.text_incorrect())
                    .bg(colors.text_incorrect_bg())
                    .add_modifier(Modifier::UNDERLINED),
                CharClass::Missed => Style::default()
                    .fg(colors.text_incorrect())
                    .add_modifier(Modifier::CROSSED_OUT),
                CharClass::Extra => Style::default()
                    .fg(colors.text_extra())
                    .add_modifier(Modifier::ITALIC),
            };
            // Wrong spaces are invisible otherwise.
            let display = if mark.ch == ' ' && mark.class != CharClass::Correct {
                '\u{00b7}'
            } else {
                mark.ch
            };
            spans.push(Span::styled(display.to_string(), style));
        }

        let (offset, tail) = pending_tail(self.typed, self.target);
        let mut chars = tail.chars().take(MAX_PENDING_CHARS).enumerate().peekable();
        if chars.peek().is_none() {
            spans.push(Span::styled(
                " ",
                Style::default().bg(colors.text_cursor_bg()),
            ));
        }
        for (i, ch) in chars {
            let style = if i == 0 {
                Style::default()
                    .fg(colors.text_cursor_fg())
                    .bg(colors.text_cursor_bg())
            } else if self.ghost == Some(offset + i) {
                Style::default()
                    .fg(colors.ghost())
                    .add_modifier(Modifier::UNDERLINED)
            } else {
                Style::default().fg(colors.text_pending())
            };
            spans.push(Span::styled(ch.to_string(), style));
        }

        let mut block = Block::bordered()
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        if self.dimmed {
            block = block.style(Style::default().bg(colors.bg()).add_modifier(Modifier::DIM));
        }

        Paragraph::new(Line::from(spans))
            .block(block)
            .wrap(Wrap { trim: false })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_tail_at_start() {
        assert_eq!(pending_tail("", "the cat"), (0, "the cat".to_string()));
    }

    #[test]
    fn test_pending_tail_mid_word() {
        assert_eq!(pending_tail("th", "the cat"), (2, "e cat".to_string()));
    }

    #[test]
    fn test_pending_tail_after_space() {
        assert_eq!(pending_tail("the ", "the cat"), (4, "cat".to_string()));
    }

    #[test]
    fn test_pending_tail_short_word_skips_rest() {
        // Space after "t" moves on to "cat"; the missed "he" is not pending.
        assert_eq!(pending_tail("t ", "the cat"), (4, "cat".to_string()));
    }

    #[test]
    fn test_pending_tail_overtyped_word() {
        assert_eq!(pending_tail("thee", "the cat"), (3, " cat".to_string()));
    }

    #[test]
    fn test_pending_tail_past_target() {
        assert_eq!(pending_tail("the cat dog", "the cat"), (7, String::new()));
    }

    #[test]
    fn test_render_shows_every_char() {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 30, 3);
        let mut buf = Buffer::empty(area);
        TypingArea::new("th", "the cat", &theme).render(area, &mut buf);

        let row: String = (1..8).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert_eq!(row, "the cat");
    }
}
