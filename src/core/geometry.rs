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

//! Plain value types shared by the native boundary and the wrappers
//!
//! These mirror the C structs of the native library field for field, so
//! they are `#[repr(C)]` and can be cast to bytes with `bytemuck`.

use bytemuck::{Pod, Zeroable};
use serde::Serialize;

/// RGBA color, 8 bits per channel
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(0xFF, 0xFF, 0xFF, 0xFF);
    pub const BLACK: Color = Color::rgba(0x00, 0x00, 0x00, 0xFF);
    pub const GRAY: Color = Color::rgba(0x80, 0x80, 0x80, 0xFF);
    pub const RED: Color = Color::rgba(0xFF, 0x00, 0x00, 0xFF);
    pub const GREEN: Color = Color::rgba(0x00, 0xFF, 0x00, 0xFF);
    pub const BLUE: Color = Color::rgba(0x00, 0x00, 0xFF, 0xFF);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 0xFF)
    }
}

/// Integer point
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Floating point point
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct FPoint {
    pub x: f32,
    pub y: f32,
}

impl FPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Integer rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Size of the rectangle
    pub const fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    /// Convert to floating point coordinates
    pub fn to_frect(self) -> FRect {
        FRect::new(self.x as f32, self.y as f32, self.w as f32, self.h as f32)
    }

    /// Whether the point lies inside the rectangle (right/bottom edges excluded)
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.w && y < self.y + self.h
    }

    /// Intersection of two rectangles, `None` when they do not overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = (self.x + self.w).min(other.x + other.w);
        let y1 = (self.y + self.h).min(other.y + other.h);
        (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
    }
}

/// Floating point rectangle
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct FRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl FRect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }
}

/// Integer size
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable, Serialize)]
pub struct Size {
    pub w: i32,
    pub h: i32,
}

impl Size {
    pub const fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }

    pub fn to_f32(self) -> (f32, f32) {
        (self.w as f32, self.h as f32)
    }
}

/// Vertex for textured geometry
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: FPoint,
    pub color: [f32; 4],
    pub tex_coord: FPoint,
}

impl Vertex {
    /// Opaque white vertex
    pub const fn new(position: FPoint, tex_coord: FPoint) -> Self {
        Self {
            position,
            color: [1.0, 1.0, 1.0, 1.0],
            tex_coord,
        }
    }
}
