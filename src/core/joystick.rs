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

//! Joysticks and gamepads
//!
//! Devices are enumerated by [`JoystickId`]; an id stays valid until the
//! device is removed. [`Joystick`] is an opened device.

use super::context::{InitFlags, Sdl};
use super::error::{Result, SdlError};
use super::handle::{Handle, NativeType};
use super::native::{NativeLibrary, RawHandle, VirtualJoystickDesc};
use serde::Serialize;
use std::fmt;

/// Instance id of a connected joystick (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct JoystickId(pub u32);

impl fmt::Display for JoystickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Device enumeration and virtual device management
pub struct Joysticks;

impl Joysticks {
    /// Ids of the connected joysticks
    pub fn connected(sdl: &Sdl) -> Result<Vec<JoystickId>> {
        let lib = sdl.lib();
        let ids = lib.get_joysticks();
        if ids.is_empty() && !sdl.was_init().contains(InitFlags::JOYSTICK) {
            return Err(SdlError::operation("list joysticks", lib.get_error()));
        }
        Ok(ids.into_iter().map(JoystickId).collect())
    }

    /// Attach a simulated device
    pub fn attach_virtual(sdl: &Sdl, desc: &VirtualJoystickDesc) -> Result<JoystickId> {
        match sdl.lib().attach_virtual_joystick(desc) {
            0 => Err(SdlError::acquisition("virtual joystick", sdl.error())),
            id => {
                log::info!("Joystick: attached virtual device {} ({})", id, desc.name);
                Ok(JoystickId(id))
            }
        }
    }

    /// Detach a simulated device
    pub fn detach_virtual(sdl: &Sdl, id: JoystickId) -> Result<()> {
        if sdl.lib().detach_virtual_joystick(id.0) < 0 {
            return Err(SdlError::operation("detach virtual joystick", sdl.error()));
        }
        log::info!("Joystick: detached virtual device {}", id);
        Ok(())
    }

    pub fn is_virtual(sdl: &Sdl, id: JoystickId) -> bool {
        sdl.lib().is_joystick_virtual(id.0)
    }

    /// Whether the device has a known gamepad mapping
    pub fn is_gamepad(sdl: &Sdl, id: JoystickId) -> bool {
        sdl.lib().is_gamepad(id.0)
    }
}

/// Marker for opened joystick handles
pub struct JoystickKind;

impl NativeType for JoystickKind {
    const KIND: &'static str = "joystick";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.close_joystick(raw);
    }
}

/// Opened joystick
pub type Joystick = Handle<JoystickKind>;

impl Joystick {
    pub fn open(sdl: &Sdl, id: JoystickId) -> Result<Joystick> {
        let joystick = Self::acquire(sdl, |lib| lib.open_joystick(id.0))?;
        log::debug!("Joystick: opened {}", id);
        Ok(joystick)
    }

    pub fn id(&self) -> Result<JoystickId> {
        self.query("joystick id", |lib, raw| match lib.get_joystick_id(raw) {
            0 => None,
            id => Some(JoystickId(id)),
        })
    }

    pub fn name(&self) -> Result<String> {
        self.query("joystick name", |lib, raw| lib.get_joystick_name(raw))
    }

    /// USB vendor id, 0 if unknown
    pub fn vendor_id(&self) -> Result<u16> {
        self.with(|lib, raw| lib.get_joystick_vendor(raw))
    }

    /// USB product id, 0 if unknown
    pub fn product_id(&self) -> Result<u16> {
        self.with(|lib, raw| lib.get_joystick_product(raw))
    }

    /// Serial number, if the device reports one
    pub fn serial(&self) -> Result<Option<String>> {
        self.with(|lib, raw| lib.get_joystick_serial(raw))
    }

    pub fn guid(&self) -> Result<[u8; 16]> {
        self.with(|lib, raw| lib.get_joystick_guid(raw))
    }

    /// Player index, `None` when unassigned
    pub fn player_index(&self) -> Result<Option<u32>> {
        self.with(|lib, raw| u32::try_from(lib.get_joystick_player_index(raw)).ok())
    }

    /// Assign a player index, `None` to clear it
    pub fn set_player_index(&self, index: Option<u32>) -> Result<()> {
        let index = index.map_or(-1, |i| i as i32);
        self.call("set player index", |lib, raw| lib.set_joystick_player_index(raw, index))?;
        Ok(())
    }

    pub fn is_virtual(&self) -> Result<bool> {
        let id = self.id()?;
        self.with(|lib, _| lib.is_joystick_virtual(id.0))
    }

    /// Close the device
    pub fn close(&self) {
        self.release();
    }
}

/// Format a GUID as lowercase hex
pub fn guid_string(guid: &[u8; 16]) -> String {
    guid.iter().map(|b| format!("{:02x}", b)).collect()
}
