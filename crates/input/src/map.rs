//! Key mapping from terminal events to game actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::types::GameAction;

/// Key to action table. Character keys match case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    entries: Vec<(KeyCode, GameAction)>,
}

impl KeyBindings {
    /// A table with no keys bound.
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Bind `key` to `action`, replacing whatever the key was bound to.
    pub fn bind(&mut self, key: KeyCode, action: GameAction) {
        let key = normalize(key);
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, action));
    }

    /// Remove every key bound to `action`.
    pub fn unbind(&mut self, action: GameAction) {
        self.entries.retain(|(_, a)| *a != action);
    }

    pub fn action_for(&self, key: KeyCode) -> Option<GameAction> {
        let key = normalize(key);
        self.entries
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, a)| *a)
    }

    pub fn keys_for(&self, action: GameAction) -> impl Iterator<Item = KeyCode> + '_ {
        self.entries
            .iter()
            .filter(move |(_, a)| *a == action)
            .map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut b = Self::empty();
        let table: [(&[KeyCode], GameAction); 9] = [
            (&[KeyCode::Left, KeyCode::Char('h'), KeyCode::Char('a')], GameAction::MoveLeft),
            (&[KeyCode::Right, KeyCode::Char('l'), KeyCode::Char('d')], GameAction::MoveRight),
            (&[KeyCode::Down, KeyCode::Char('j'), KeyCode::Char('s')], GameAction::SoftDrop),
            (&[KeyCode::Up, KeyCode::Char('k'), KeyCode::Char('w'), KeyCode::Char(' ')], GameAction::SonicDrop),
            (&[KeyCode::Char('z'), KeyCode::Char('y'), KeyCode::Char('v')], GameAction::RotateCcw),
            (&[KeyCode::Char('x'), KeyCode::Char('b')], GameAction::RotateCw),
            (&[KeyCode::Char('c'), KeyCode::Char('n')], GameAction::Hold),
            (&[KeyCode::Char('p'), KeyCode::Esc], GameAction::Pause),
            (&[KeyCode::Char('r')], GameAction::Restart),
        ];
        for (keys, action) in table {
            for &key in keys {
                b.bind(key, action);
            }
        }
        b
    }
}

fn normalize(key: KeyCode) -> KeyCode {
    match key {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Parse a key name as written in settings files.
///
/// Accepts `left`, `right`, `up`, `down`, `space`, `enter`, `esc`, `tab`,
/// `backspace`, `f1`..`f12`, or a single character.
pub fn parse_key(name: &str) -> Option<KeyCode> {
    let lower = name.trim().to_ascii_lowercase();
    let code = match lower.as_str() {
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        _ => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                if (1..=12).contains(&n) {
                    return Some(KeyCode::F(n));
                }
                return None;
            }
            let mut chars = lower.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(code)
}

/// Inverse of [`parse_key`] for the keys it accepts.
pub fn key_name(key: KeyCode) -> Option<String> {
    let name = match normalize(key) {
        KeyCode::Left => "left".to_string(),
        KeyCode::Right => "right".to_string(),
        KeyCode::Up => "up".to_string(),
        KeyCode::Down => "down".to_string(),
        KeyCode::Char(' ') => "space".to_string(),
        KeyCode::Enter => "enter".to_string(),
        KeyCode::Esc => "esc".to_string(),
        KeyCode::Tab => "tab".to_string(),
        KeyCode::Backspace => "backspace".to_string(),
        KeyCode::F(n) => format!("f{n}"),
        KeyCode::Char(c) => c.to_string(),
        _ => return None,
    };
    Some(name)
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_movement_keys() {
        let b = KeyBindings::default();
        assert_eq!(b.action_for(KeyCode::Left), Some(GameAction::MoveLeft));
        assert_eq!(b.action_for(KeyCode::Right), Some(GameAction::MoveRight));
        assert_eq!(b.action_for(KeyCode::Down), Some(GameAction::SoftDrop));
        assert_eq!(b.action_for(KeyCode::Char('H')), Some(GameAction::MoveLeft));
        assert_eq!(b.action_for(KeyCode::Char('L')), Some(GameAction::MoveRight));
        assert_eq!(b.action_for(KeyCode::Char('J')), Some(GameAction::SoftDrop));
    }

    #[test]
    fn test_default_rotation_and_action_keys() {
        let b = KeyBindings::default();
        assert_eq!(b.action_for(KeyCode::Char('z')), Some(GameAction::RotateCcw));
        assert_eq!(b.action_for(KeyCode::Char('X')), Some(GameAction::RotateCw));
        assert_eq!(b.action_for(KeyCode::Char(' ')), Some(GameAction::SonicDrop));
        assert_eq!(b.action_for(KeyCode::Char('c')), Some(GameAction::Hold));
        assert_eq!(b.action_for(KeyCode::Char('p')), Some(GameAction::Pause));
        assert_eq!(b.action_for(KeyCode::Char('r')), Some(GameAction::Restart));
        assert_eq!(b.action_for(KeyCode::Char('q')), None);
    }

    #[test]
    fn test_every_action_has_a_default_key() {
        let b = KeyBindings::default();
        for action in GameAction::ALL {
            assert!(b.keys_for(action).next().is_some(), "{action:?} unbound");
        }
    }

    #[test]
    fn test_bind_replaces_previous_owner() {
        let mut b = KeyBindings::default();
        b.bind(KeyCode::Char('Z'), GameAction::Hold);
        assert_eq!(b.action_for(KeyCode::Char('z')), Some(GameAction::Hold));

        b.unbind(GameAction::Hold);
        assert_eq!(b.action_for(KeyCode::Char('z')), None);
        assert_eq!(b.keys_for(GameAction::Hold).count(), 0);
    }

    #[test]
    fn test_parse_key_names() {
        assert_eq!(parse_key("Left"), Some(KeyCode::Left));
        assert_eq!(parse_key("space"), Some(KeyCode::Char(' ')));
        assert_eq!(parse_key("F5"), Some(KeyCode::F(5)));
        assert_eq!(parse_key("x"), Some(KeyCode::Char('x')));
        assert_eq!(parse_key("f13"), None);
        assert_eq!(parse_key("shift"), None);
        assert_eq!(parse_key(""), None);

        for name in ["left", "space", "f5", "x", "esc"] {
            let key = parse_key(name).unwrap();
            assert_eq!(key_name(key).as_deref(), Some(name));
        }
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
    }
}
