//! Keyboard state
//!
//! The host feeds key-down/key-up events in; the game loop reads a snapshot
//! once per frame.

use crate::sim::FrameInput;

/// Keys the game listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKey {
    Left,
    Right,
    Up,
    Manipulate,
}

impl GameKey {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => Some(GameKey::Left),
            "ArrowRight" | "Right" => Some(GameKey::Right),
            "ArrowUp" | "Up" => Some(GameKey::Up),
            " " | "Spacebar" => Some(GameKey::Manipulate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub manipulate: bool,
}

impl KeyState {
    pub fn set(&mut self, key: GameKey, down: bool) {
        match key {
            GameKey::Left => self.left = down,
            GameKey::Right => self.right = down,
            GameKey::Up => self.up = down,
            GameKey::Manipulate => self.manipulate = down,
        }
    }

    /// Record a key event. Returns false for keys the game ignores.
    pub fn key_changed(&mut self, key: &str, down: bool) -> bool {
        match GameKey::from_key(key) {
            Some(k) => {
                self.set(k, down);
                true
            }
            None => false,
        }
    }

    /// Forget every held key (focus lost)
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> FrameInput {
        FrameInput {
            left: self.left,
            right: self.right,
            up: self.up,
            manipulate: self.manipulate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let mut keys = KeyState::default();
        assert!(keys.key_changed("ArrowRight", true));
        assert!(keys.key_changed(" ", true));
        assert!(!keys.key_changed("a", true));
        let input = keys.snapshot();
        assert!(input.right && input.manipulate);
        assert!(!input.left && !input.up);

        keys.key_changed("ArrowRight", false);
        assert!(!keys.snapshot().right);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut keys = KeyState::default();
        keys.key_changed("ArrowUp", true);
        keys.key_changed("ArrowLeft", true);
        keys.clear();
        assert_eq!(keys.snapshot(), FrameInput::default());
    }
}
