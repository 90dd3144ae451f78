//! Windows input injection via `SendInput`.
//!
//! Keys are sent as virtual-key codes; navigation keys, Insert/Delete and the
//! Windows keys carry `KEYEVENTF_EXTENDEDKEY`.  Scrolling uses the standard
//! 120-unit `WHEEL_DELTA` per notch.

#![cfg(target_os = "windows")]

use artremote_core::keymap::windows_vk::is_extended_vk;
use artremote_core::{Direction, KeyMapper};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MOUSEEVENTF_HWHEEL, MOUSEEVENTF_MOVE,
    MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};

use crate::application::injection::{InjectedKey, InjectionError, InputInjector};

const WHEEL_DELTA: i32 = 120;

/// [`InputInjector`] using the Win32 `SendInput` API.
#[derive(Default)]
pub struct WindowsInjector;

impl WindowsInjector {
    pub fn new() -> Self {
        Self
    }
}

impl InputInjector for WindowsInjector {
    fn emit_key(&self, key: InjectedKey, pressed: bool) -> Result<(), InjectionError> {
        let vk = match key {
            InjectedKey::Modifier(m) => KeyMapper::modifier_to_windows_vk(m),
            InjectedKey::Key(k) => KeyMapper::key_to_windows_vk(k),
        };

        let mut flags = KEYBD_EVENT_FLAGS::default();
        if !pressed {
            flags |= KEYEVENTF_KEYUP;
        }
        if is_extended_vk(vk) {
            flags |= KEYEVENTF_EXTENDEDKEY;
        }

        send(INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(vk),
                    wScan: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        })
    }

    fn emit_scroll(&self, direction: Direction, amount: u32) -> Result<(), InjectionError> {
        let (flags, sign) = match direction {
            Direction::Up => (MOUSEEVENTF_WHEEL, 1),
            Direction::Down => (MOUSEEVENTF_WHEEL, -1),
            Direction::Right => (MOUSEEVENTF_HWHEEL, 1),
            Direction::Left => (MOUSEEVENTF_HWHEEL, -1),
        };
        for _ in 0..amount {
            send(mouse_input(0, 0, (sign * WHEEL_DELTA) as u32, flags))?;
        }
        Ok(())
    }

    fn emit_pointer_delta(&self, dx: i32, dy: i32) -> Result<(), InjectionError> {
        // Without MOUSEEVENTF_ABSOLUTE, dx/dy are relative mickeys.
        send(mouse_input(dx, dy, 0, MOUSEEVENTF_MOVE))
    }

    fn name(&self) -> &'static str {
        "windows-sendinput"
    }
}

fn mouse_input(dx: i32, dy: i32, mouse_data: u32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx,
                dy,
                mouseData: mouse_data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(input: INPUT) -> Result<(), InjectionError> {
    // SAFETY: `input` is a fully initialised INPUT structure on the stack.
    let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if sent == 1 {
        Ok(())
    } else {
        // SendInput reports UIPI blocking (elevated foreground window) as 0 events sent.
        Err(InjectionError::Platform(format!(
            "SendInput inserted no event: {}",
            windows::core::Error::from_win32()
        )))
    }
}
