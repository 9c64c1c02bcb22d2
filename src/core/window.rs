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

//! Native windows

use super::context::Sdl;
use super::error::Result;
use super::geometry::Size;
use super::handle::{Handle, NativeType};
use super::native::{NativeLibrary, RawHandle};
use super::renderer::{RenderFlags, Renderer};
use super::surface::Surface;
use bitflags::bitflags;

bitflags! {
    /// Window creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        const FULLSCREEN = 0x0000_0001;
        const OPENGL = 0x0000_0002;
        const OCCLUDED = 0x0000_0004;
        const HIDDEN = 0x0000_0008;
        const BORDERLESS = 0x0000_0010;
        const RESIZABLE = 0x0000_0020;
        const HIGH_PIXEL_DENSITY = 0x0000_2000;
    }
}

/// Marker for window handles
pub struct WindowKind;

impl NativeType for WindowKind {
    const KIND: &'static str = "window";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.destroy_window(raw);
    }
}

/// Native window
pub type Window = Handle<WindowKind>;

impl Window {
    /// Create a window
    pub fn new(sdl: &Sdl, title: &str, width: i32, height: i32, flags: WindowFlags) -> Result<Window> {
        let window = Self::acquire(sdl, |lib| lib.create_window(title, width, height, flags.bits()))?;
        log::info!("Window: created \"{}\" {}x{}", title, width, height);
        Ok(window)
    }

    /// Window id, as found in window events
    pub fn id(&self) -> Result<u32> {
        self.query("window id", |lib, raw| match lib.get_window_id(raw) {
            0 => None,
            id => Some(id),
        })
    }

    /// Size in window coordinates
    pub fn size(&self) -> Result<Size> {
        let mut size = Size::default();
        self.call("window size", |lib, raw| {
            lib.get_window_size(raw, &mut size.w, &mut size.h)
        })?;
        Ok(size)
    }

    pub fn title(&self) -> Result<String> {
        self.query("window title", |lib, raw| lib.get_window_title(raw))
    }

    pub fn set_title(&self, title: &str) -> Result<()> {
        self.call("set window title", |lib, raw| lib.set_window_title(raw, title))?;
        Ok(())
    }

    /// The window's own surface, for software blitting
    ///
    /// The surface belongs to the window and is never freed by the wrapper.
    pub fn surface(&self) -> Result<Surface> {
        let raw = self.query("window surface", |lib, raw| lib.get_window_surface(raw))?;
        Ok(Surface::borrowed(self.sdl(), raw))
    }

    /// Copy the window surface to the screen
    pub fn update_surface(&self) -> Result<()> {
        self.call("update window surface", |lib, raw| lib.update_window_surface(raw))?;
        Ok(())
    }

    /// Create a renderer for this window
    ///
    /// `driver` is a render driver index, `None` picks the first driver
    /// supporting `flags`.
    pub fn create_renderer(&self, driver: Option<i32>, flags: RenderFlags) -> Result<Renderer> {
        Renderer::new(self, driver, flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::InitFlags;
    use crate::core::geometry::Color;
    use crate::core::native::headless::{HeadlessLibrary, ResourceKind};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::VIDEO).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_window_properties() {
        let (_lib, sdl) = setup();
        let window = Window::new(&sdl, "testbench", 640, 480, WindowFlags::RESIZABLE).unwrap();

        assert_eq!(window.size().unwrap(), Size::new(640, 480));
        assert_eq!(window.title().unwrap(), "testbench");
        window.set_title("renamed").unwrap();
        assert_eq!(window.title().unwrap(), "renamed");
        assert_ne!(window.id().unwrap(), 0);
    }

    #[test]
    fn test_window_requires_video() {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib, InitFlags::empty()).unwrap();
        let err = Window::new(&sdl, "no video", 10, 10, WindowFlags::empty()).unwrap_err();
        assert!(err.is_acquisition());
    }

    #[test]
    fn test_oversized_window_fails() {
        let (_lib, sdl) = setup();
        let err = Window::new(&sdl, "huge", 70_000, 70_000, WindowFlags::empty()).unwrap_err();
        assert!(err.is_acquisition());
    }

    #[test]
    fn test_window_surface_is_borrowed() {
        let (lib, sdl) = setup();
        let window = Window::new(&sdl, "surface", 8, 8, WindowFlags::empty()).unwrap();
        {
            let surface = window.surface().unwrap();
            surface.clear(Color::GRAY).unwrap();
            window.update_surface().unwrap();
        }
        assert_eq!(lib.destroy_calls(ResourceKind::Surface), 0);
        assert_eq!(lib.surface_update_count(window.raw().unwrap()), 1);
    }

    #[test]
    fn test_released_window() {
        let (lib, sdl) = setup();
        let window = Window::new(&sdl, "release", 8, 8, WindowFlags::empty()).unwrap();
        window.release();
        assert!(window.size().is_err());
        assert_eq!(lib.live_count(ResourceKind::Window), 0);
    }
}
