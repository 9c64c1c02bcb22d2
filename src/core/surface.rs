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

//! CPU-side pixel buffers

use super::context::Sdl;
use super::error::Result;
use super::geometry::{Color, Point, Rect, Size};
use super::handle::{Handle, NativeType};
use super::native::{NativeLibrary, RawHandle};
use std::path::Path;

/// Marker for surface handles
pub struct SurfaceKind;

impl NativeType for SurfaceKind {
    const KIND: &'static str = "surface";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.destroy_surface(raw);
    }
}

/// RGBA pixel buffer
pub type Surface = Handle<SurfaceKind>;

impl Surface {
    /// Create a surface of the given size
    pub fn new(sdl: &Sdl, width: i32, height: i32) -> Result<Surface> {
        Self::acquire(sdl, |lib| lib.create_surface(width, height))
    }

    /// Load a Windows BMP image
    pub fn load_bmp(sdl: &Sdl, path: impl AsRef<Path>) -> Result<Surface> {
        let path = path.as_ref();
        let surface = Self::acquire(sdl, |lib| lib.load_bmp(path))?;
        log::debug!("Surface: loaded {}", path.display());
        Ok(surface)
    }

    pub fn size(&self) -> Result<Size> {
        let mut size = Size::default();
        self.call("surface size", |lib, raw| {
            lib.get_surface_size(raw, &mut size.w, &mut size.h)
        })?;
        Ok(size)
    }

    /// Fill `rect` (clipped to the surface), or everything for `None`
    pub fn fill(&self, rect: Option<Rect>, color: Color) -> Result<()> {
        self.call("fill surface", |lib, raw| {
            lib.fill_surface_rect(raw, rect.as_ref(), color)
        })?;
        Ok(())
    }

    pub fn clear(&self, color: Color) -> Result<()> {
        self.fill(None, color)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Result<Color> {
        let mut color = Color::default();
        self.call("read pixel", |lib, raw| lib.read_surface_pixel(raw, x, y, &mut color))?;
        Ok(color)
    }

    /// Set the transparent color used when blitting, `None` to disable
    pub fn set_color_key(&self, key: Option<Color>) -> Result<()> {
        self.call("set color key", |lib, raw| {
            lib.set_surface_color_key(raw, key.is_some(), key.unwrap_or_default())
        })?;
        Ok(())
    }

    /// Copy this surface onto `dst` with its top-left corner at `at`
    pub fn blit_to(&self, dst: &Surface, at: Point) -> Result<()> {
        let dst_raw = dst.raw()?;
        let dst_rect = Rect::new(at.x, at.y, 0, 0);
        self.call("blit surface", |lib, raw| {
            lib.blit_surface(raw, dst_raw, Some(&dst_rect))
        })?;
        Ok(())
    }
}
