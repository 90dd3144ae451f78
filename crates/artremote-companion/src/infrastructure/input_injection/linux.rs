//! Linux X11 input injection via the XTest extension.
//!
//! `XTestFakeKeyEvent` takes a server keycode, not a KeySym, so every key
//! goes through `XKeysymToKeycode` first:
//!
//! ```text
//! KeyCode → X11 KeySym → XKeysymToKeycode(display, keysym) → keycode
//! ```
//!
//! X11 has no scroll API; wheel notches are button press+release pairs:
//!
//! | Button | Direction |
//! |--------|-----------|
//! | 4      | Up        |
//! | 5      | Down      |
//! | 6      | Left      |
//! | 7      | Right     |
//!
//! The display is opened from `DISPLAY`.  Wayland sessions without XWayland
//! have no usable display and the constructor fails with `Unavailable`.

#![cfg(target_os = "linux")]

use std::os::raw::{c_int, c_uint, c_ulong};
use std::ptr;

use artremote_core::{Direction, KeyMapper};
use x11::xlib::{Display, XCloseDisplay, XFlush, XKeysymToKeycode, XOpenDisplay};
use x11::xtest::{XTestFakeButtonEvent, XTestFakeKeyEvent, XTestFakeRelativeMotionEvent};

use crate::application::injection::{InjectedKey, InjectionError, InputInjector};

/// `CurrentTime`: deliver immediately.
const CURRENT_TIME: c_ulong = 0;

const TRUE: c_int = 1;
const FALSE: c_int = 0;

/// [`InputInjector`] holding one X display connection.
pub struct LinuxXTestInjector {
    display: *mut Display,
}

// SAFETY: the display pointer is only ever used from the injection thread
// that owns this value; Xlib is never called on it concurrently.
unsafe impl Send for LinuxXTestInjector {}

impl LinuxXTestInjector {
    /// Opens the display named by `DISPLAY`.
    pub fn new() -> Result<Self, InjectionError> {
        // SAFETY: a null name makes Xlib read DISPLAY; null is returned on failure.
        let display = unsafe { XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(InjectionError::Unavailable(
                "cannot open X display (is DISPLAY set?)".to_string(),
            ));
        }
        Ok(Self { display })
    }

    fn flush(&self) {
        // SAFETY: display is a live connection owned by self.
        unsafe {
            XFlush(self.display);
        }
    }

    fn tap_button(&self, button: c_uint) -> Result<(), InjectionError> {
        // SAFETY: display is a live connection owned by self.
        let ok = unsafe {
            XTestFakeButtonEvent(self.display, button, TRUE, CURRENT_TIME) != 0
                && XTestFakeButtonEvent(self.display, button, FALSE, CURRENT_TIME) != 0
        };
        if ok {
            Ok(())
        } else {
            Err(InjectionError::Platform(format!("XTest rejected button {button}")))
        }
    }
}

impl Drop for LinuxXTestInjector {
    fn drop(&mut self) {
        // SAFETY: display was opened in `new` and is closed exactly once.
        unsafe {
            XCloseDisplay(self.display);
        }
    }
}

impl InputInjector for LinuxXTestInjector {
    fn emit_key(&self, key: InjectedKey, pressed: bool) -> Result<(), InjectionError> {
        let keysym = match key {
            InjectedKey::Modifier(m) => KeyMapper::modifier_to_x11_keysym(m),
            InjectedKey::Key(k) => KeyMapper::key_to_x11_keysym(k),
        };

        // SAFETY: display is a live connection owned by self.
        let keycode = unsafe { XKeysymToKeycode(self.display, keysym as c_ulong) };
        if keycode == 0 {
            return Err(InjectionError::Platform(format!(
                "keysym {keysym:#x} is not on the current keyboard map"
            )));
        }

        let is_press = if pressed { TRUE } else { FALSE };
        // SAFETY: display is live; keycode came from the server's own map.
        let ok = unsafe {
            XTestFakeKeyEvent(self.display, keycode as c_uint, is_press, CURRENT_TIME) != 0
        };
        self.flush();
        if ok {
            Ok(())
        } else {
            Err(InjectionError::Platform(format!("XTest rejected keycode {keycode}")))
        }
    }

    fn emit_scroll(&self, direction: Direction, amount: u32) -> Result<(), InjectionError> {
        let button = match direction {
            Direction::Up => 4,
            Direction::Down => 5,
            Direction::Left => 6,
            Direction::Right => 7,
        };
        for _ in 0..amount {
            self.tap_button(button)?;
        }
        self.flush();
        Ok(())
    }

    fn emit_pointer_delta(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        // SAFETY: display is a live connection owned by self.
        // screen_number -1 selects the current screen.
        let ok = unsafe { XTestFakeRelativeMotionEvent(self.display, -1, dx, dy, CURRENT_TIME) != 0 };
        self.flush();
        if ok {
            Ok(())
        } else {
            Err(InjectionError::Platform("XTest rejected relative motion".to_string()))
        }
    }

    fn name(&self) -> &'static str {
        "x11-xtest"
    }
}
