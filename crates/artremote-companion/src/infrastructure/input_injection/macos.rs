//! macOS input injection via CoreGraphics events posted at the HID tap.
//!
//! Posting requires the Accessibility permission (System Settings → Privacy &
//! Security → Accessibility).  Without it event creation or posting fails and
//! every call reports `PermissionDenied`.
//!
//! Modifier key events alone do not reliably reach the frontmost application,
//! so the injector tracks held modifiers and stamps them as flags on every
//! event it posts.

#![cfg(target_os = "macos")]

use std::cell::Cell;

use artremote_core::{Direction, KeyMapper, Modifier};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTapLocation, CGEventType, CGMouseButton, EventField,
    ScrollEventUnit,
};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::CGPoint;

use crate::application::injection::{InjectedKey, InjectionError, InputInjector};

const PERMISSION_HINT: &str =
    "grant Accessibility access to the companion in System Settings → Privacy & Security";

/// [`InputInjector`] using CoreGraphics event synthesis.
pub struct MacosInjector {
    held: Cell<CGEventFlags>,
}

impl MacosInjector {
    /// Checks once that an event source can be created.
    pub fn new() -> Result<Self, InjectionError> {
        source()?;
        Ok(Self {
            held: Cell::new(CGEventFlags::CGEventFlagNull),
        })
    }

    fn post(&self, event: CGEvent) {
        event.set_flags(self.held.get());
        event.post(CGEventTapLocation::HID);
    }
}

// CGEventSource is not Send, so one is created per event.
fn source() -> Result<CGEventSource, InjectionError> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|_| InjectionError::PermissionDenied(PERMISSION_HINT.to_string()))
}

fn modifier_flag(modifier: Modifier) -> CGEventFlags {
    match modifier {
        Modifier::Ctrl => CGEventFlags::CGEventFlagControl,
        Modifier::Shift => CGEventFlags::CGEventFlagShift,
        Modifier::Alt => CGEventFlags::CGEventFlagAlternate,
        Modifier::Meta => CGEventFlags::CGEventFlagCommand,
    }
}

impl InputInjector for MacosInjector {
    fn emit_key(&self, key: InjectedKey, pressed: bool) -> Result<(), InjectionError> {
        let keycode = match key {
            InjectedKey::Modifier(m) => {
                let mut held = self.held.get();
                held.set(modifier_flag(m), pressed);
                self.held.set(held);
                KeyMapper::modifier_to_macos_cgkeycode(m)
            }
            InjectedKey::Key(k) => KeyMapper::key_to_macos_cgkeycode(k),
        };

        let event = CGEvent::new_keyboard_event(source()?, keycode, pressed)
            .map_err(|_| InjectionError::PermissionDenied(PERMISSION_HINT.to_string()))?;
        self.post(event);
        Ok(())
    }

    fn emit_scroll(&self, direction: Direction, amount: u32) -> Result<(), InjectionError> {
        // Axis 1 is vertical (positive = up); axis 2 is horizontal (positive = left).
        let (vertical, horizontal) = match direction {
            Direction::Up => (1, 0),
            Direction::Down => (-1, 0),
            Direction::Left => (0, 1),
            Direction::Right => (0, -1),
        };
        for _ in 0..amount {
            let event = CGEvent::new_scroll_event(
                source()?,
                ScrollEventUnit::LINE,
                2,
                vertical,
                horizontal,
                0,
            )
            .map_err(|_| InjectionError::Platform("cannot create scroll event".to_string()))?;
            self.post(event);
        }
        Ok(())
    }

    fn emit_pointer_delta(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        let current = CGEvent::new(source()?)
            .map_err(|_| InjectionError::Platform("cannot read pointer location".to_string()))?
            .location();
        let target = CGPoint::new(current.x + f64::from(dx), current.y + f64::from(dy));

        let event = CGEvent::new_mouse_event(
            source()?,
            CGEventType::MouseMoved,
            target,
            CGMouseButton::Left,
        )
        .map_err(|_| InjectionError::Platform("cannot create mouse event".to_string()))?;
        event.set_integer_value_field(EventField::MOUSE_EVENT_DELTA_X, i64::from(dx));
        event.set_integer_value_field(EventField::MOUSE_EVENT_DELTA_Y, i64::from(dy));
        self.post(event);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "macos-coregraphics"
    }
}
