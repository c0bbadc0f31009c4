use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// The three kinds of key input a typing session understands
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionInput {
    Char(char),
    Newline,
    Backspace,
}

/// AltGr arrives as Ctrl+Alt on Windows; the character it produced is printable.
fn is_chord(modifiers: KeyModifiers) -> bool {
    let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
    if modifiers.contains(KeyModifiers::SUPER) {
        return true;
    }
    modifiers.intersects(altgr) && !modifiers.contains(altgr)
}

/// Map a terminal key event onto session input. Modifier chords, control characters
/// and navigation keys (tab, arrows, function keys, ...) yield `None`.
pub fn classify_key(key: &KeyEvent) -> Option<SessionInput> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Enter => Some(SessionInput::Newline),
        KeyCode::Backspace => Some(SessionInput::Backspace),
        KeyCode::Char(c) => {
            if is_chord(key.modifiers) || c.is_control() {
                None
            } else {
                Some(SessionInput::Char(c))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_printable_characters() {
        assert_eq!(
            classify_key(&key(KeyCode::Char('a'))),
            Some(SessionInput::Char('a'))
        );
        assert_eq!(
            classify_key(&key(KeyCode::Char(' '))),
            Some(SessionInput::Char(' '))
        );
        assert_eq!(
            classify_key(&KeyEvent::new(KeyCode::Char('{'), KeyModifiers::SHIFT)),
            Some(SessionInput::Char('{'))
        );
    }

    #[test]
    fn test_enter_and_backspace() {
        assert_eq!(
            classify_key(&key(KeyCode::Enter)),
            Some(SessionInput::Newline)
        );
        assert_eq!(
            classify_key(&key(KeyCode::Backspace)),
            Some(SessionInput::Backspace)
        );
    }

    #[test]
    fn test_navigation_and_control_keys_are_ignored() {
        for code in [
            KeyCode::Tab,
            KeyCode::Left,
            KeyCode::Right,
            KeyCode::Up,
            KeyCode::Down,
            KeyCode::Esc,
            KeyCode::Delete,
            KeyCode::F(5),
        ] {
            assert_eq!(classify_key(&key(code)), None, "{code:?}");
        }
    }

    #[test]
    fn test_modifier_chords_are_ignored() {
        assert_eq!(
            classify_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(
            classify_key(&KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT)),
            None
        );
    }

    #[test]
    fn test_altgr_characters_are_accepted() {
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        for c in ['{', '}', '[', ']', '@', '\\'] {
            assert_eq!(
                classify_key(&KeyEvent::new(KeyCode::Char(c), altgr)),
                Some(SessionInput::Char(c))
            );
        }
        assert_eq!(
            classify_key(&KeyEvent::new(
                KeyCode::Char('{'),
                altgr | KeyModifiers::SHIFT
            )),
            Some(SessionInput::Char('{'))
        );
        assert_eq!(
            classify_key(&KeyEvent::new(
                KeyCode::Char('q'),
                altgr | KeyModifiers::SUPER
            )),
            None
        );
    }

    #[test]
    fn test_release_events_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(classify_key(&release), None);
    }
}
