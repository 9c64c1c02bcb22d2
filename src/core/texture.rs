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

//! Renderer textures
//!
//! A texture belongs to the renderer that created it. Destroying the
//! renderer destroys its textures natively, so textures should be dropped
//! first; a texture outliving its renderer reports `Operation` errors.

use super::error::{Result, SdlError};
use super::geometry::Size;
use super::handle::{Handle, NativeType};
use super::native::{NativeLibrary, RawHandle};
use super::renderer::Renderer;
use super::surface::Surface;
use std::fmt;
use std::str::FromStr;

/// How texture pixels combine with the render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    None,
    Blend,
    BlendPremultiplied,
    Add,
    AddPremultiplied,
    Mod,
    Mul,
}

impl BlendMode {
    pub const ALL: [BlendMode; 7] = [
        BlendMode::None,
        BlendMode::Blend,
        BlendMode::BlendPremultiplied,
        BlendMode::Add,
        BlendMode::AddPremultiplied,
        BlendMode::Mod,
        BlendMode::Mul,
    ];

    /// Native blend mode value
    pub fn bits(self) -> u32 {
        match self {
            BlendMode::None => 0x00,
            BlendMode::Blend => 0x01,
            BlendMode::Add => 0x02,
            BlendMode::Mod => 0x04,
            BlendMode::Mul => 0x08,
            BlendMode::BlendPremultiplied => 0x10,
            BlendMode::AddPremultiplied => 0x20,
        }
    }

    pub fn from_bits(bits: u32) -> Option<BlendMode> {
        Self::ALL.into_iter().find(|mode| mode.bits() == bits)
    }

    /// Command line name
    pub fn name(self) -> &'static str {
        match self {
            BlendMode::None => "none",
            BlendMode::Blend => "blend",
            BlendMode::BlendPremultiplied => "blend_premultiplied",
            BlendMode::Add => "add",
            BlendMode::AddPremultiplied => "add_premultiplied",
            BlendMode::Mod => "mod",
            BlendMode::Mul => "mul",
        }
    }

    /// Parse a command line name; unknown names select [`BlendMode::None`]
    pub fn parse(name: &str) -> BlendMode {
        Self::ALL
            .into_iter()
            .find(|mode| mode.name() == name)
            .unwrap_or_default()
    }
}

impl FromStr for BlendMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(BlendMode::parse(s))
    }
}

impl fmt::Display for BlendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker for texture handles
pub struct TextureKind;

impl NativeType for TextureKind {
    const KIND: &'static str = "texture";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.destroy_texture(raw);
    }
}

/// GPU-side image owned by a renderer
pub type Texture = Handle<TextureKind>;

impl Texture {
    /// Create an empty texture
    pub fn new(renderer: &Renderer, width: i32, height: i32) -> Result<Texture> {
        let renderer_raw = renderer.raw()?;
        Self::acquire(renderer.sdl(), |lib| lib.create_texture(renderer_raw, width, height))
    }

    /// Create a texture holding a copy of a surface
    ///
    /// A color-keyed surface yields a blended texture where the key is
    /// transparent.
    pub fn from_surface(renderer: &Renderer, surface: &Surface) -> Result<Texture> {
        let renderer_raw = renderer.raw()?;
        let surface_raw = surface.raw()?;
        Self::acquire(renderer.sdl(), |lib| {
            lib.create_texture_from_surface(renderer_raw, surface_raw)
        })
    }

    pub fn size(&self) -> Result<Size> {
        let mut size = Size::default();
        self.call("query texture", |lib, raw| {
            lib.query_texture(raw, &mut size.w, &mut size.h)
        })?;
        Ok(size)
    }

    pub fn blend_mode(&self) -> Result<BlendMode> {
        let mut bits = 0;
        self.call("get blend mode", |lib, raw| lib.get_texture_blend_mode(raw, &mut bits))?;
        BlendMode::from_bits(bits)
            .ok_or_else(|| SdlError::custom(format!("Unknown blend mode {:#x}", bits)))
    }

    pub fn set_blend_mode(&self, mode: BlendMode) -> Result<()> {
        self.call("set blend mode", |lib, raw| lib.set_texture_blend_mode(raw, mode.bits()))?;
        Ok(())
    }

    /// Multiply the texture color by `(r, g, b) / 255` when drawing
    pub fn set_color_mod(&self, r: u8, g: u8, b: u8) -> Result<()> {
        self.call("set color mod", |lib, raw| lib.set_texture_color_mod(raw, r, g, b))?;
        Ok(())
    }

    pub fn set_alpha_mod(&self, alpha: u8) -> Result<()> {
        self.call("set alpha mod", |lib, raw| lib.set_texture_alpha_mod(raw, alpha))?;
        Ok(())
    }

    /// Replace the texture contents with a surface of the same size
    pub fn update_from_surface(&self, surface: &Surface) -> Result<()> {
        let surface_raw = surface.raw()?;
        self.call("update texture", |lib, raw| lib.update_texture(raw, surface_raw))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::{InitFlags, Sdl};
    use crate::core::geometry::Color;
    use crate::core::native::headless::{HeadlessLibrary, ResourceKind};
    use crate::core::renderer::RenderFlags;
    use crate::core::window::{Window, WindowFlags};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl, Window) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::VIDEO).unwrap();
        let window = Window::new(&sdl, "texture", 64, 64, WindowFlags::empty()).unwrap();
        (lib, sdl, window)
    }

    #[test]
    fn test_blend_mode_names() {
        for mode in BlendMode::ALL {
            assert_eq!(BlendMode::parse(mode.name()), mode);
            assert_eq!(BlendMode::from_bits(mode.bits()), Some(mode));
        }
        assert_eq!(BlendMode::parse("screen"), BlendMode::None);
    }

    #[test]
    fn test_color_keyed_surface_becomes_blended() {
        let (_lib, sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let surface = Surface::new(&sdl, 16, 8).unwrap();
        surface.set_color_key(Some(Color::BLACK)).unwrap();

        let texture = renderer.texture_from_surface(&surface).unwrap();
        assert_eq!(texture.size().unwrap(), Size::new(16, 8));
        assert_eq!(texture.blend_mode().unwrap(), BlendMode::Blend);

        texture.set_blend_mode(BlendMode::Add).unwrap();
        assert_eq!(texture.blend_mode().unwrap(), BlendMode::Add);
    }

    #[test]
    fn test_modulation() {
        let (lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let texture = renderer.create_texture(4, 4).unwrap();

        texture.set_color_mod(10, 20, 30).unwrap();
        texture.set_alpha_mod(40).unwrap();
        assert_eq!(lib.texture_modulation(texture.raw().unwrap()), Some((10, 20, 30, 40)));
    }

    #[test]
    fn test_update_requires_matching_size() {
        let (_lib, sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let texture = renderer.create_texture(4, 4).unwrap();

        assert!(texture.update_from_surface(&Surface::new(&sdl, 4, 4).unwrap()).is_ok());
        assert!(texture.update_from_surface(&Surface::new(&sdl, 5, 4).unwrap()).is_err());
    }

    #[test]
    fn test_texture_outliving_renderer() {
        let (lib, _sdl, window) = setup();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let texture = renderer.create_texture(4, 4).unwrap();

        drop(renderer);
        assert!(texture.size().unwrap_err().is_operation());
        drop(texture);
        assert_eq!(lib.live_count(ResourceKind::Texture), 0);
    }
}
