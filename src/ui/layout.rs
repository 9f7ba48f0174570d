use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Screen regions of the typing view.
pub struct AppLayout {
    pub header: Rect,
    pub progress: Rect,
    pub main: Rect,
    pub status: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(2),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            header: vertical[0],
            progress: vertical[1],
            main: vertical[2],
            status: vertical[3],
            footer: vertical[4],
        }
    }
}

/// Greedily pack hints into as few lines as fit in `width`.
pub fn pack_hint_lines(hints: &[&str], width: usize) -> Vec<String> {
    if width == 0 || hints.is_empty() {
        return Vec::new();
    }

    let prefix = " ";
    let separator = "  ";
    let mut out: Vec<String> = Vec::new();
    let mut current = prefix.to_string();
    let mut has_hint = false;

    for hint in hints {
        if hint.is_empty() {
            continue;
        }
        let candidate = if has_hint {
            format!("{current}{separator}{hint}")
        } else {
            format!("{current}{hint}")
        };
        if candidate.chars().count() <= width {
            current = candidate;
            has_hint = true;
        } else {
            if has_hint {
                out.push(current);
            }
            current = format!("{prefix}{hint}");
            has_hint = true;
        }
    }

    if has_hint {
        out.push(current);
    }
    out
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_CARD_WIDTH: u16 = 48;
    const MIN_CARD_HEIGHT: u16 = 12;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_CARD_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_CARD_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_hint_lines_wraps() {
        let lines = pack_hint_lines(&["[Enter] next", "[Shift+Tab] repeat", "[Esc] stop"], 32);
        assert_eq!(lines, vec![" [Enter] next", " [Shift+Tab] repeat  [Esc] stop"]);
    }

    #[test]
    fn test_pack_hint_lines_empty_width() {
        assert!(pack_hint_lines(&["[Enter] next"], 0).is_empty());
    }

    #[test]
    fn test_centered_rect_stays_inside_small_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect, area);
    }

    #[test]
    fn test_centered_rect_centers() {
        let area = Rect::new(0, 0, 200, 60);
        let rect = centered_rect(50, 50, area);
        assert_eq!(rect, Rect::new(50, 15, 100, 30));
    }
}
