use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press means to the typing screen. Context (plan splash, summary) is applied by
/// the app, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Char(char),
    Backspace,
    BackspaceWord,
    Escape,
    /// Same text again (Shift+Tab).
    Repeat,
    /// New text (Enter).
    Next,
    Quit,
}

pub fn map_key(key: KeyEvent) -> Option<Command> {
    // Repeat events would inflate input.
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => Some(Command::Quit),
        // Many terminals send Ctrl+Backspace as Ctrl+H or Ctrl+W.
        KeyCode::Char('h') | KeyCode::Char('w') if ctrl => Some(Command::BackspaceWord),
        KeyCode::Backspace if ctrl || alt => Some(Command::BackspaceWord),
        KeyCode::Backspace => Some(Command::Backspace),
        KeyCode::Esc => Some(Command::Escape),
        KeyCode::BackTab => Some(Command::Repeat),
        KeyCode::Tab if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Command::Repeat),
        KeyCode::Enter => Some(Command::Next),
        KeyCode::Char(_) if ctrl || alt => None,
        KeyCode::Char(ch) => Some(Command::Char(ch)),
        _ => None,
    }
}
