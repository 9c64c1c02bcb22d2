// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed events
//!
//! Converts the flat native [`RawEvent`] record into an [`Event`] enum and
//! back. Event kinds the crate does not model are kept as
//! [`Event::Unknown`] so nothing is silently dropped.

use super::joystick::JoystickId;
use super::native::{event_kind, RawEvent};
use bitflags::bitflags;
use std::fmt;

/// Virtual key code
///
/// Printable keys use their lowercase character value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Keycode(pub u32);

impl Keycode {
    pub const UNKNOWN: Keycode = Keycode(0);
    pub const BACKSPACE: Keycode = Keycode(0x08);
    pub const TAB: Keycode = Keycode(0x09);
    pub const RETURN: Keycode = Keycode(0x0D);
    pub const ESCAPE: Keycode = Keycode(0x1B);
    pub const SPACE: Keycode = Keycode(0x20);
    pub const NUM_0: Keycode = Keycode(0x30);
    pub const NUM_1: Keycode = Keycode(0x31);
    pub const NUM_9: Keycode = Keycode(0x39);
    pub const A: Keycode = Keycode(0x61);
    pub const D: Keycode = Keycode(0x64);
    pub const R: Keycode = Keycode(0x72);
    pub const Z: Keycode = Keycode(0x7A);

    /// Key for a digit `0..=9`
    pub fn digit(n: u8) -> Option<Keycode> {
        (n <= 9).then(|| Keycode(Self::NUM_0.0 + n as u32))
    }

    /// Digit value of a number key
    pub fn as_digit(self) -> Option<u8> {
        (Self::NUM_0.0..=Self::NUM_9.0)
            .contains(&self.0)
            .then(|| (self.0 - Self::NUM_0.0) as u8)
    }

    /// Key for a letter, case-insensitive
    pub fn letter(c: char) -> Option<Keycode> {
        c.is_ascii_alphabetic()
            .then(|| Keycode(c.to_ascii_lowercase() as u32))
    }

    /// Human readable key name ("Escape", "A", "7", ...)
    pub fn name(self) -> String {
        match self {
            Self::BACKSPACE => "Backspace".to_string(),
            Self::TAB => "Tab".to_string(),
            Self::RETURN => "Return".to_string(),
            Self::ESCAPE => "Escape".to_string(),
            Self::SPACE => "Space".to_string(),
            Keycode(code) => match char::from_u32(code) {
                Some(c) if c.is_ascii_alphanumeric() => c.to_ascii_uppercase().to_string(),
                _ => format!("0x{:X}", code),
            },
        }
    }

    /// Parse a key name, case-insensitive
    pub fn from_name(name: &str) -> Option<Keycode> {
        match name.to_ascii_lowercase().as_str() {
            "backspace" => Some(Self::BACKSPACE),
            "tab" => Some(Self::TAB),
            "return" | "enter" => Some(Self::RETURN),
            "escape" | "esc" => Some(Self::ESCAPE),
            "space" => Some(Self::SPACE),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_ascii_digit() => Self::digit(c as u8 - b'0'),
                    (Some(c), None) => Self::letter(c),
                    _ => None,
                }
            }
        }
    }
}

impl fmt::Display for Keycode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

bitflags! {
    /// Keyboard modifier state
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Keymod: u16 {
        const LSHIFT = 0x0001;
        const RSHIFT = 0x0002;
        const LCTRL = 0x0040;
        const RCTRL = 0x0080;
        const LALT = 0x0100;
        const RALT = 0x0200;
        const SHIFT = Self::LSHIFT.bits() | Self::RSHIFT.bits();
        const CTRL = Self::LCTRL.bits() | Self::RCTRL.bits();
        const ALT = Self::LALT.bits() | Self::RALT.bits();
    }
}

/// Typed native event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Quit,
    KeyDown {
        keycode: Keycode,
        keymod: Keymod,
        repeat: bool,
    },
    KeyUp {
        keycode: Keycode,
        keymod: Keymod,
    },
    MouseMotion {
        x: f32,
        y: f32,
    },
    MouseButtonDown {
        button: u8,
        x: f32,
        y: f32,
    },
    MouseButtonUp {
        button: u8,
        x: f32,
        y: f32,
    },
    WindowOccluded {
        window_id: u32,
    },
    WindowExposed {
        window_id: u32,
    },
    JoystickAdded {
        which: JoystickId,
    },
    JoystickRemoved {
        which: JoystickId,
    },
    JoystickAxisMotion {
        which: JoystickId,
        axis: u8,
        value: i16,
    },
    JoystickHatMotion {
        which: JoystickId,
        hat: u8,
        value: u8,
    },
    JoystickButtonDown {
        which: JoystickId,
        button: u8,
    },
    JoystickButtonUp {
        which: JoystickId,
        button: u8,
    },
    GamepadAdded {
        which: JoystickId,
    },
    GamepadRemoved {
        which: JoystickId,
    },
    GamepadRemapped {
        which: JoystickId,
    },
    GamepadButtonDown {
        which: JoystickId,
        button: u8,
    },
    GamepadButtonUp {
        which: JoystickId,
        button: u8,
    },
    CameraApproved {
        which: u32,
    },
    CameraDenied {
        which: u32,
    },
    Unknown {
        kind: u32,
    },
}

impl Event {
    /// Convert a native event record
    pub fn from_raw(raw: &RawEvent) -> Event {
        let which = JoystickId(raw.which);
        match raw.kind {
            event_kind::QUIT => Event::Quit,
            event_kind::KEY_DOWN => Event::KeyDown {
                keycode: Keycode(raw.key),
                keymod: Keymod::from_bits_truncate(raw.modifiers),
                repeat: raw.repeat,
            },
            event_kind::KEY_UP => Event::KeyUp {
                keycode: Keycode(raw.key),
                keymod: Keymod::from_bits_truncate(raw.modifiers),
            },
            event_kind::MOUSE_MOTION => Event::MouseMotion { x: raw.x, y: raw.y },
            event_kind::MOUSE_BUTTON_DOWN => Event::MouseButtonDown {
                button: raw.button,
                x: raw.x,
                y: raw.y,
            },
            event_kind::MOUSE_BUTTON_UP => Event::MouseButtonUp {
                button: raw.button,
                x: raw.x,
                y: raw.y,
            },
            event_kind::WINDOW_OCCLUDED => Event::WindowOccluded {
                window_id: raw.which,
            },
            event_kind::WINDOW_EXPOSED => Event::WindowExposed {
                window_id: raw.which,
            },
            event_kind::JOYSTICK_ADDED => Event::JoystickAdded { which },
            event_kind::JOYSTICK_REMOVED => Event::JoystickRemoved { which },
            event_kind::JOYSTICK_AXIS_MOTION => Event::JoystickAxisMotion {
                which,
                axis: raw.axis,
                value: raw.value,
            },
            event_kind::JOYSTICK_HAT_MOTION => Event::JoystickHatMotion {
                which,
                hat: raw.axis,
                value: raw.value as u8,
            },
            event_kind::JOYSTICK_BUTTON_DOWN => Event::JoystickButtonDown {
                which,
                button: raw.button,
            },
            event_kind::JOYSTICK_BUTTON_UP => Event::JoystickButtonUp {
                which,
                button: raw.button,
            },
            event_kind::GAMEPAD_ADDED => Event::GamepadAdded { which },
            event_kind::GAMEPAD_REMOVED => Event::GamepadRemoved { which },
            event_kind::GAMEPAD_REMAPPED => Event::GamepadRemapped { which },
            event_kind::GAMEPAD_BUTTON_DOWN => Event::GamepadButtonDown {
                which,
                button: raw.button,
            },
            event_kind::GAMEPAD_BUTTON_UP => Event::GamepadButtonUp {
                which,
                button: raw.button,
            },
            event_kind::CAMERA_DEVICE_APPROVED => Event::CameraApproved { which: raw.which },
            event_kind::CAMERA_DEVICE_DENIED => Event::CameraDenied { which: raw.which },
            kind => Event::Unknown { kind },
        }
    }

    /// Build the native event record
    pub fn to_raw(&self) -> RawEvent {
        let mut raw = RawEvent::default();
        match *self {
            Event::Quit => raw.kind = event_kind::QUIT,
            Event::KeyDown {
                keycode,
                keymod,
                repeat,
            } => {
                raw.kind = event_kind::KEY_DOWN;
                raw.key = keycode.0;
                raw.modifiers = keymod.bits();
                raw.down = true;
                raw.repeat = repeat;
            }
            Event::KeyUp { keycode, keymod } => {
                raw.kind = event_kind::KEY_UP;
                raw.key = keycode.0;
                raw.modifiers = keymod.bits();
            }
            Event::MouseMotion { x, y } => {
                raw.kind = event_kind::MOUSE_MOTION;
                (raw.x, raw.y) = (x, y);
            }
            Event::MouseButtonDown { button, x, y } => {
                raw.kind = event_kind::MOUSE_BUTTON_DOWN;
                raw.button = button;
                raw.down = true;
                (raw.x, raw.y) = (x, y);
            }
            Event::MouseButtonUp { button, x, y } => {
                raw.kind = event_kind::MOUSE_BUTTON_UP;
                raw.button = button;
                (raw.x, raw.y) = (x, y);
            }
            Event::WindowOccluded { window_id } => {
                raw.kind = event_kind::WINDOW_OCCLUDED;
                raw.which = window_id;
            }
            Event::WindowExposed { window_id } => {
                raw.kind = event_kind::WINDOW_EXPOSED;
                raw.which = window_id;
            }
            Event::JoystickAdded { which } => {
                raw.kind = event_kind::JOYSTICK_ADDED;
                raw.which = which.0;
            }
            Event::JoystickRemoved { which } => {
                raw.kind = event_kind::JOYSTICK_REMOVED;
                raw.which = which.0;
            }
            Event::JoystickAxisMotion { which, axis, value } => {
                raw.kind = event_kind::JOYSTICK_AXIS_MOTION;
                raw.which = which.0;
                raw.axis = axis;
                raw.value = value;
            }
            Event::JoystickHatMotion { which, hat, value } => {
                raw.kind = event_kind::JOYSTICK_HAT_MOTION;
                raw.which = which.0;
                raw.axis = hat;
                raw.value = value as i16;
            }
            Event::JoystickButtonDown { which, button } => {
                raw.kind = event_kind::JOYSTICK_BUTTON_DOWN;
                raw.which = which.0;
                raw.button = button;
                raw.down = true;
            }
            Event::JoystickButtonUp { which, button } => {
                raw.kind = event_kind::JOYSTICK_BUTTON_UP;
                raw.which = which.0;
                raw.button = button;
            }
            Event::GamepadAdded { which } => {
                raw.kind = event_kind::GAMEPAD_ADDED;
                raw.which = which.0;
            }
            Event::GamepadRemoved { which } => {
                raw.kind = event_kind::GAMEPAD_REMOVED;
                raw.which = which.0;
            }
            Event::GamepadRemapped { which } => {
                raw.kind = event_kind::GAMEPAD_REMAPPED;
                raw.which = which.0;
            }
            Event::GamepadButtonDown { which, button } => {
                raw.kind = event_kind::GAMEPAD_BUTTON_DOWN;
                raw.which = which.0;
                raw.button = button;
                raw.down = true;
            }
            Event::GamepadButtonUp { which, button } => {
                raw.kind = event_kind::GAMEPAD_BUTTON_UP;
                raw.which = which.0;
                raw.button = button;
            }
            Event::CameraApproved { which } => {
                raw.kind = event_kind::CAMERA_DEVICE_APPROVED;
                raw.which = which;
            }
            Event::CameraDenied { which } => {
                raw.kind = event_kind::CAMERA_DEVICE_DENIED;
                raw.which = which;
            }
            Event::Unknown { kind } => raw.kind = kind,
        }
        raw
    }

    /// Key press convenience constructor
    pub fn key_down(keycode: Keycode) -> Event {
        Event::KeyDown {
            keycode,
            keymod: Keymod::empty(),
            repeat: false,
        }
    }
}
