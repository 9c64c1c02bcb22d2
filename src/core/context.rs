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

//! Library context
//!
//! [`Sdl`] is the explicit handle to an initialized native library. Every
//! resource wrapper keeps a clone, so the native `quit()` runs only when the
//! last clone (and therefore the last resource) is gone.
//!
//! # Example
//!
//! ```
//! use sdlkit::core::context::{InitFlags, Sdl};
//! use sdlkit::core::native::HeadlessLibrary;
//! use std::rc::Rc;
//!
//! let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::VIDEO).unwrap();
//! assert!(sdl.was_init().contains(InitFlags::VIDEO));
//! ```

use super::error::{Result, SdlError};
use super::event::Event;
use super::native::{NativeLibrary, RawEvent, RendererInfo};
use bitflags::bitflags;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Native subsystems
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u32 {
        const AUDIO = 0x0000_0010;
        const VIDEO = 0x0000_0020;
        const JOYSTICK = 0x0000_0200;
        const GAMEPAD = 0x0000_2000;
        const EVENTS = 0x0000_4000;
        const CAMERA = 0x0001_0000;
    }
}

/// Native display identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u32);

struct SdlInner {
    lib: Rc<dyn NativeLibrary>,
}

impl Drop for SdlInner {
    fn drop(&mut self) {
        self.lib.quit();
        log::info!("Sdl: native library shut down");
    }
}

/// Handle to an initialized native library
#[derive(Clone)]
pub struct Sdl {
    inner: Rc<SdlInner>,
}

impl Sdl {
    /// Initialize the native library
    ///
    /// # Arguments
    ///
    /// * `lib` - Native library implementation
    /// * `flags` - Subsystems to initialize (may be empty)
    ///
    /// # Returns
    ///
    /// The context, or `SdlError::Acquisition` if native init failed
    pub fn init(lib: Rc<dyn NativeLibrary>, flags: InitFlags) -> Result<Sdl> {
        if lib.init(flags.bits()) < 0 {
            return Err(SdlError::acquisition("library", lib.get_error()));
        }
        log::info!("Sdl: initialized ({:?})", flags);
        Ok(Sdl {
            inner: Rc::new(SdlInner { lib }),
        })
    }

    /// Initialize additional subsystems
    pub fn init_subsystem(&self, flags: InitFlags) -> Result<()> {
        if self.lib().init(flags.bits()) < 0 {
            return Err(SdlError::acquisition("subsystem", self.lib().get_error()));
        }
        log::debug!("Sdl: subsystems initialized ({:?})", flags);
        Ok(())
    }

    /// Currently initialized subsystems
    pub fn was_init(&self) -> InitFlags {
        InitFlags::from_bits_truncate(self.lib().was_init(0))
    }

    pub(crate) fn lib(&self) -> &dyn NativeLibrary {
        self.inner.lib.as_ref()
    }

    /// Last native error message
    pub fn error(&self) -> String {
        self.lib().get_error()
    }

    /// Milliseconds since initialization
    pub fn ticks(&self) -> u64 {
        self.lib().get_ticks()
    }

    /// Seconds since initialization
    pub fn seconds(&self) -> f64 {
        self.ticks() as f64 / 1000.0
    }

    /// Wait for `ms` milliseconds
    pub fn delay(&self, ms: u32) {
        self.lib().delay(ms);
    }

    /// Set a configuration hint
    pub fn set_hint(&self, name: &str, value: &str) -> bool {
        let accepted = self.lib().set_hint(name, value);
        if !accepted {
            log::warn!("Sdl: hint {} rejected", name);
        }
        accepted
    }

    /// Current value of a configuration hint
    pub fn hint(&self, name: &str) -> Option<String> {
        self.lib().get_hint(name)
    }

    /// Pop the next pending event
    pub fn poll_event(&self) -> Option<Event> {
        let mut raw = RawEvent::default();
        self.lib()
            .poll_event(&mut raw)
            .then(|| Event::from_raw(&raw))
    }

    /// Queue an event
    pub fn push_event(&self, event: Event) -> Result<()> {
        if self.lib().push_event(&event.to_raw()) < 0 {
            return Err(SdlError::operation("push event", self.lib().get_error()));
        }
        Ok(())
    }

    /// Primary display
    pub fn primary_display(&self) -> Result<DisplayId> {
        match self.lib().get_primary_display() {
            0 => Err(SdlError::operation("primary display", self.lib().get_error())),
            id => Ok(DisplayId(id)),
        }
    }

    /// Content scale (DPI scale) of a display
    pub fn display_content_scale(&self, display: DisplayId) -> Result<f32> {
        let scale = self.lib().get_display_content_scale(display.0);
        if scale <= 0.0 {
            return Err(SdlError::operation("content scale", self.lib().get_error()));
        }
        Ok(scale)
    }

    /// Render drivers compiled into the native library
    pub fn available_renderers(&self) -> Result<Vec<RendererInfo>> {
        let count = self.lib().get_num_render_drivers();
        (0..count)
            .map(|index| {
                let mut info = RendererInfo::default();
                if self.lib().get_render_driver_info(index, &mut info) < 0 {
                    return Err(SdlError::operation("render driver info", self.lib().get_error()));
                }
                Ok(info)
            })
            .collect()
    }

    /// Number of live clones, including those held by resources
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl fmt::Debug for Sdl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sdl")
            .field("subsystems", &self.was_init())
            .field("clones", &self.strong_count())
            .finish()
    }
}
