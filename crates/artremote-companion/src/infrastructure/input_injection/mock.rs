//! Recording injector for tests.
//!
//! The real injectors press keys on the machine running the tests, so every
//! test that exercises the router or the server uses [`MockInjector`]
//! instead.  Clones share one event log, so a test keeps a clone and hands
//! the first one to the injection thread:
//!
//! ```ignore
//! let mock = MockInjector::new();
//! let (handle, _worker) = InjectionQueue::spawn(Box::new(mock.clone()), 8)?;
//! // ... drive the router ...
//! assert_eq!(mock.key_taps(), vec![KeyCombo::parse("ctrl+z", Platform::Windows)?]);
//! ```

use std::sync::{Arc, Mutex};

use artremote_core::{Direction, KeyCode, KeyCombo, Modifier, Modifiers};

use crate::application::injection::{InjectedKey, InjectionError, InputInjector};

/// One recorded primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedEvent {
    Key(InjectedKey, bool),
    Scroll(Direction, u32),
    PointerDelta(i32, i32),
}

#[derive(Default)]
struct MockState {
    events: Vec<InjectedEvent>,
    fail_on: Option<KeyCode>,
    fail_all: bool,
}

/// An injector that records calls instead of touching the OS.
#[derive(Clone, Default)]
pub struct MockInjector {
    state: Arc<Mutex<MockState>>,
}

impl MockInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes pressing `key` fail with [`InjectionError::Platform`].
    pub fn fail_on_key(&self, key: KeyCode) {
        self.lock().fail_on = Some(key);
    }

    /// Makes every call fail.
    pub fn fail_everything(&self) {
        self.lock().fail_all = true;
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.lock().events.clone()
    }

    /// Reconstructs the combos that were tapped.
    ///
    /// A combo is the set of modifiers held at the moment a non-modifier key
    /// went down.
    pub fn key_taps(&self) -> Vec<KeyCombo> {
        let mut held = Modifiers::NONE;
        let mut taps = Vec::new();
        for event in self.events() {
            match event {
                InjectedEvent::Key(InjectedKey::Modifier(m), true) => held = held.with(m),
                InjectedEvent::Key(InjectedKey::Modifier(m), false) => held = without(held, m),
                InjectedEvent::Key(InjectedKey::Key(key), true) => {
                    taps.push(KeyCombo::new(held, key))
                }
                _ => {}
            }
        }
        taps
    }

    pub fn clear(&self) {
        self.lock().events.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A test that panicked while holding the lock has already failed.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectionError> {
        let mut state = self.lock();
        let fails = state.fail_all
            || matches!(
                (&event, state.fail_on),
                (InjectedEvent::Key(InjectedKey::Key(k), true), Some(f)) if *k == f
            );
        if fails {
            return Err(InjectionError::Platform("mock failure".to_string()));
        }
        state.events.push(event);
        Ok(())
    }
}

fn without(mut modifiers: Modifiers, modifier: Modifier) -> Modifiers {
    match modifier {
        Modifier::Ctrl => modifiers.ctrl = false,
        Modifier::Shift => modifiers.shift = false,
        Modifier::Alt => modifiers.alt = false,
        Modifier::Meta => modifiers.meta = false,
    }
    modifiers
}

impl InputInjector for MockInjector {
    fn emit_key(&self, key: InjectedKey, pressed: bool) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Key(key, pressed))
    }

    fn emit_scroll(&self, direction: Direction, amount: u32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Scroll(direction, amount))
    }

    fn emit_pointer_delta(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::PointerDelta(dx, dy))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artremote_core::Platform;

    #[test]
    fn test_key_taps_reconstructs_combos() {
        // Arrange
        let mock = MockInjector::new();
        mock.emit_key(InjectedKey::Modifier(Modifier::Ctrl), true).unwrap();
        mock.emit_key(InjectedKey::Key(KeyCode::Z), true).unwrap();
        mock.emit_key(InjectedKey::Key(KeyCode::Z), false).unwrap();
        mock.emit_key(InjectedKey::Modifier(Modifier::Ctrl), false).unwrap();
        mock.emit_key(InjectedKey::Key(KeyCode::B), true).unwrap();

        // Act
        let taps = mock.key_taps();

        // Assert
        assert_eq!(
            taps,
            vec![
                KeyCombo::parse("ctrl+z", Platform::Windows).unwrap(),
                KeyCombo::key(KeyCode::B)
            ]
        );
    }

    #[test]
    fn test_fail_everything_records_nothing() {
        let mock = MockInjector::new();
        mock.fail_everything();
        assert!(mock.emit_scroll(Direction::Up, 1).is_err());
        assert!(mock.events().is_empty());
    }
}
