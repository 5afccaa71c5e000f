use std::collections::HashSet;

/// Keys the launcher and the games react to. Everything else is dropped by
/// the display backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    A,
    D,
    F,
    P,
    R,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The window was closed.
    Quit,
    /// A key went down. OS key repeat is filtered out by the backend.
    KeyDown(Key),
    KeyUp(Key),
    /// Pointer position in canvas pixels.
    PointerMoved(i32, i32),
    /// Left button pressed at a canvas position.
    Click(i32, i32),
    /// The drawable area changed size.
    Resized(u32, u32),
}

/// Keys currently held down, rebuilt from the event stream each frame.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
}

impl InputState {
    pub fn apply(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.held.insert(*key);
            }
            InputEvent::KeyUp(key) => {
                self.held.remove(key);
            }
            _ => {}
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn any_held(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.held.contains(k))
    }
}
