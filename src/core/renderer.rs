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

//! 2D renderer
//!
//! Drawing calls return `Result<&Renderer>` so a frame can be written as a
//! chain:
//!
//! ```
//! # use sdlkit::core::{context::{InitFlags, Sdl}, native::HeadlessLibrary};
//! # use sdlkit::core::window::{Window, WindowFlags};
//! # use sdlkit::core::renderer::RenderFlags;
//! # use sdlkit::core::geometry::{Color, FRect};
//! # use std::rc::Rc;
//! # fn main() -> sdlkit::Result<()> {
//! # let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::VIDEO)?;
//! # let window = Window::new(&sdl, "doc", 64, 64, WindowFlags::empty())?;
//! let renderer = window.create_renderer(None, RenderFlags::empty())?;
//! renderer
//!     .clear_with(Color::WHITE)?
//!     .fill_rects(&[FRect::new(0.0, 0.0, 8.0, 8.0)], Color::RED)?
//!     .present()?;
//! # Ok(())
//! # }
//! ```

use super::error::Result;
use super::event::Event;
use super::geometry::{Color, FPoint, FRect, Rect, Size, Vertex};
use super::handle::{Handle, NativeType};
use super::native::{NativeLibrary, RawHandle, RendererInfo};
use super::surface::Surface;
use super::texture::Texture;
use super::window::Window;
use bitflags::bitflags;

bitflags! {
    /// Renderer capabilities and creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderFlags: u32 {
        const SOFTWARE = 0x0000_0001;
        const ACCELERATED = 0x0000_0002;
        const PRESENT_VSYNC = 0x0000_0004;
        const TARGET_TEXTURE = 0x0000_0008;
    }
}

/// Texture flip mode for [`Renderer::copy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl Flip {
    pub fn bits(self) -> u32 {
        match self {
            Flip::None => 0,
            Flip::Horizontal => 1,
            Flip::Vertical => 2,
        }
    }
}

impl RendererInfo {
    /// Capability flags of the driver
    pub fn render_flags(&self) -> RenderFlags {
        RenderFlags::from_bits_truncate(self.flags)
    }

    /// Whether the driver supports all of `flags`
    pub fn has(&self, flags: RenderFlags) -> bool {
        self.render_flags().contains(flags)
    }
}

/// Marker for renderer handles
pub struct RendererKind;

impl NativeType for RendererKind {
    const KIND: &'static str = "renderer";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.destroy_renderer(raw);
    }
}

/// 2D renderer attached to a window or a surface
pub type Renderer = Handle<RendererKind>;

impl Renderer {
    /// Create a renderer for a window
    ///
    /// # Arguments
    ///
    /// * `window` - Target window; at most one renderer per window
    /// * `driver` - Render driver index, `None` for the first driver supporting `flags`
    /// * `flags` - Required capabilities
    pub fn new(window: &Window, driver: Option<i32>, flags: RenderFlags) -> Result<Renderer> {
        let window_raw = window.raw()?;
        let renderer = Self::acquire(window.sdl(), |lib| {
            lib.create_renderer(window_raw, driver.unwrap_or(-1), flags.bits())
        })?;
        log::debug!("Renderer: created for window {:#x}", window_raw.get());
        Ok(renderer)
    }

    /// Create a software renderer drawing into a surface
    pub fn from_surface(surface: &Surface) -> Result<Renderer> {
        let surface_raw = surface.raw()?;
        Self::acquire(surface.sdl(), |lib| lib.create_software_renderer(surface_raw))
    }

    /// Driver description of this renderer
    pub fn info(&self) -> Result<RendererInfo> {
        let mut info = RendererInfo::default();
        self.call("renderer info", |lib, raw| lib.get_renderer_info(raw, &mut info))?;
        Ok(info)
    }

    pub fn draw_color(&self) -> Result<Color> {
        let mut color = Color::default();
        self.call("get draw color", |lib, raw| lib.get_render_draw_color(raw, &mut color))?;
        Ok(color)
    }

    pub fn set_draw_color(&self, color: Color) -> Result<&Self> {
        self.call("set draw color", |lib, raw| lib.set_render_draw_color(raw, color))?;
        Ok(self)
    }

    /// Clear the target with the current draw color
    pub fn clear(&self) -> Result<&Self> {
        self.call("render clear", |lib, raw| lib.render_clear(raw))?;
        Ok(self)
    }

    /// Set the draw color and clear
    pub fn clear_with(&self, color: Color) -> Result<&Self> {
        self.set_draw_color(color)?.clear()
    }

    /// Copy (part of) a texture with rotation and flipping
    pub fn copy(
        &self,
        texture: &Texture,
        src: Option<Rect>,
        dst: Option<FRect>,
        angle: f64,
        center: Option<FPoint>,
        flip: Flip,
    ) -> Result<&Self> {
        let texture_raw = texture.raw()?;
        self.call("render copy", |lib, raw| {
            lib.render_copy_ex(
                raw,
                texture_raw,
                src.as_ref(),
                dst.as_ref(),
                angle,
                center.as_ref(),
                flip.bits(),
            )
        })?;
        Ok(self)
    }

    /// Draw a whole texture into `at`
    pub fn draw_texture(&self, texture: &Texture, at: FRect) -> Result<&Self> {
        self.copy(texture, None, Some(at), 0.0, None, Flip::None)
    }

    pub fn points(&self, points: &[FPoint], color: Color) -> Result<&Self> {
        self.set_draw_color(color)?;
        self.call("render points", |lib, raw| lib.render_points(raw, points))?;
        Ok(self)
    }

    /// Draw a connected polyline
    pub fn lines(&self, points: &[FPoint], color: Color) -> Result<&Self> {
        self.set_draw_color(color)?;
        self.call("render lines", |lib, raw| lib.render_lines(raw, points))?;
        Ok(self)
    }

    pub fn fill_rects(&self, rects: &[FRect], color: Color) -> Result<&Self> {
        self.set_draw_color(color)?;
        self.call("render fill rects", |lib, raw| lib.render_fill_rects(raw, rects))?;
        Ok(self)
    }

    /// Draw triangles, optionally textured and indexed
    pub fn geometry(
        &self,
        texture: Option<&Texture>,
        vertices: &[Vertex],
        indices: Option<&[i32]>,
    ) -> Result<&Self> {
        let texture_raw = texture.map(Texture::raw).transpose()?;
        self.call("render geometry", |lib, raw| {
            lib.render_geometry(raw, texture_raw, vertices, indices)
        })?;
        Ok(self)
    }

    /// Draw text with the built-in 8x8 debug font
    pub fn debug_text(&self, text: &str, at: FPoint, color: Color) -> Result<&Self> {
        self.set_draw_color(color)?;
        self.call("render debug text", |lib, raw| {
            lib.render_debug_text(raw, at.x, at.y, text)
        })?;
        Ok(self)
    }

    pub fn viewport(&self) -> Result<Rect> {
        let mut rect = Rect::default();
        self.call("get viewport", |lib, raw| lib.get_render_viewport(raw, &mut rect))?;
        Ok(rect)
    }

    /// Restrict drawing to `rect`, `None` for the whole output
    pub fn set_viewport(&self, rect: Option<Rect>) -> Result<&Self> {
        self.call("set viewport", |lib, raw| lib.set_render_viewport(raw, rect.as_ref()))?;
        Ok(self)
    }

    /// Area of the output not covered by notches or rounded corners
    pub fn safe_area(&self) -> Result<Rect> {
        let mut rect = Rect::default();
        self.call("get safe area", |lib, raw| lib.get_render_safe_area(raw, &mut rect))?;
        Ok(rect)
    }

    /// Output size in pixels
    pub fn output_size(&self) -> Result<Size> {
        let mut size = Size::default();
        self.call("get output size", |lib, raw| {
            lib.get_render_output_size(raw, &mut size.w, &mut size.h)
        })?;
        Ok(size)
    }

    /// Map window coordinates of a pointer event to render coordinates
    pub fn convert_event(&self, event: &Event) -> Result<Event> {
        let mut raw_event = event.to_raw();
        self.call("convert event", |lib, raw| {
            lib.convert_event_to_render_coordinates(raw, &mut raw_event)
        })?;
        Ok(Event::from_raw(&raw_event))
    }

    /// Show the frame
    pub fn present(&self) -> Result<()> {
        self.call("render present", |lib, raw| lib.render_present(raw))?;
        log::trace!("Renderer: present");
        Ok(())
    }

    /// Create an empty texture
    pub fn create_texture(&self, width: i32, height: i32) -> Result<Texture> {
        Texture::new(self, width, height)
    }

    /// Upload a surface into a new texture
    pub fn texture_from_surface(&self, surface: &Surface) -> Result<Texture> {
        Texture::from_surface(self, surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{InitFlags, Sdl};
    use crate::core::native::headless::{DrawCommand, HeadlessLibrary};
    use crate::core::window::WindowFlags;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl, Window) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::VIDEO).unwrap();
        let window = Window::new(&sdl, "renderer", 320, 240, WindowFlags::empty()).unwrap();
        (lib, sdl, window)
    }

    #[test]
    fn test_driver_selection() {
        let (_lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::SOFTWARE).unwrap();
        let info = renderer.info().unwrap();
        assert_eq!(info.name, "software");
        assert!(info.has(RenderFlags::SOFTWARE));
    }

    #[test]
    fn test_chained_frame_is_recorded() {
        let (lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let points = [FPoint::new(0.0, 0.0), FPoint::new(319.0, 0.0)];

        renderer
            .clear_with(Color::WHITE)
            .unwrap()
            .points(&points, Color::RED)
            .unwrap()
            .debug_text("hello", FPoint::new(8.0, 8.0), Color::BLACK)
            .unwrap()
            .present()
            .unwrap();

        let raw = renderer.raw().unwrap();
        assert_eq!(
            lib.presented_commands(raw),
            vec![
                DrawCommand::Clear(Color::WHITE),
                DrawCommand::Points {
                    color: Color::RED,
                    points: points.to_vec(),
                },
                DrawCommand::DebugText {
                    color: Color::BLACK,
                    x: 8.0,
                    y: 8.0,
                    text: "hello".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_output_and_viewport() {
        let (_lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();

        assert_eq!(renderer.output_size().unwrap(), Size::new(320, 240));
        assert_eq!(renderer.safe_area().unwrap(), Rect::new(0, 0, 320, 240));

        renderer.set_viewport(Some(Rect::new(10, 20, 100, 100))).unwrap();
        assert_eq!(renderer.viewport().unwrap(), Rect::new(10, 20, 100, 100));

        let converted = renderer
            .convert_event(&Event::MouseMotion { x: 15.0, y: 25.0 })
            .unwrap();
        assert_eq!(converted, Event::MouseMotion { x: 5.0, y: 5.0 });

        renderer.set_viewport(None).unwrap();
        assert_eq!(renderer.viewport().unwrap(), Rect::new(0, 0, 320, 240));
    }

    #[test]
    fn test_failed_draw_is_operation_error() {
        let (lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        lib.fail_next("render_clear");

        let err = renderer.clear().unwrap_err();
        assert!(err.is_operation());
        assert_eq!(err.to_string(), "render clear failed: Injected failure in render_clear");
    }

    #[test]
    fn test_geometry_rejects_partial_triangles() {
        let (_lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let vertices = [Vertex::default(); 4];

        assert!(renderer.geometry(None, &vertices[..3], None).is_ok());
        assert!(renderer.geometry(None, &vertices, None).is_err());
        assert!(renderer
            .geometry(None, &vertices, Some(&[0, 1, 2, 1, 2, 3]))
            .is_ok());
    }

    #[test]
    fn test_software_renderer_on_surface() {
        let (_lib, sdl, _window) = setup();
        let surface = Surface::new(&sdl, 50, 40).unwrap();
        let renderer = Renderer::from_surface(&surface).unwrap();
        assert_eq!(renderer.output_size().unwrap(), Size::new(50, 40));
    }
}
