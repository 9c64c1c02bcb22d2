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

//! Native library boundary
//!
//! This module describes the C-style surface of the multimedia library the
//! rest of the crate wraps. It deliberately keeps the native conventions:
//!
//! - Create/open calls return `Option<RawHandle>`; `None` is a null pointer.
//! - Operations return an `i32` status; a negative value is a failure.
//! - Device lookups return a `u32` id; `0` is an invalid id.
//! - The message for the most recent failure is read with
//!   [`NativeLibrary::get_error`].
//!
//! Nothing outside [`crate::core`] calls these functions directly; the typed
//! wrappers translate every sentinel into an [`SdlError`](crate::core::error::SdlError).
//!
//! # Threading
//!
//! Native libraries of this kind are single-threaded by contract. Methods
//! take `&self` and implementations use interior mutability; callers share
//! one instance through an `Rc`.

pub mod bmp;
pub mod headless;

pub use headless::HeadlessLibrary;

use crate::core::geometry::{Color, FPoint, FRect, Rect, Vertex};
use serde::Serialize;
use std::num::NonZeroU64;
use std::path::Path;

/// Status code returned by failing native operations
pub const NATIVE_FAILURE: i32 = -1;

/// Width/height in pixels of one debug-text glyph
pub const DEBUG_TEXT_FONT_CHARACTER_SIZE: i32 = 8;

/// Opaque, non-null native handle
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawHandle(NonZeroU64);

impl RawHandle {
    /// Wrap a raw pointer value, `None` for null
    #[inline]
    pub fn new(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(RawHandle)
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

/// Raw subsystem bits accepted by [`NativeLibrary::init`]
pub mod init_bits {
    pub const AUDIO: u32 = 0x0000_0010;
    pub const VIDEO: u32 = 0x0000_0020;
    pub const JOYSTICK: u32 = 0x0000_0200;
    pub const GAMEPAD: u32 = 0x0000_2000;
    pub const EVENTS: u32 = 0x0000_4000;
    pub const CAMERA: u32 = 0x0001_0000;
}

/// Raw event type codes
pub mod event_kind {
    pub const QUIT: u32 = 0x100;
    pub const WINDOW_EXPOSED: u32 = 0x204;
    pub const WINDOW_OCCLUDED: u32 = 0x216;
    pub const KEY_DOWN: u32 = 0x300;
    pub const KEY_UP: u32 = 0x301;
    pub const MOUSE_MOTION: u32 = 0x400;
    pub const MOUSE_BUTTON_DOWN: u32 = 0x401;
    pub const MOUSE_BUTTON_UP: u32 = 0x402;
    pub const JOYSTICK_AXIS_MOTION: u32 = 0x600;
    pub const JOYSTICK_HAT_MOTION: u32 = 0x602;
    pub const JOYSTICK_BUTTON_DOWN: u32 = 0x603;
    pub const JOYSTICK_BUTTON_UP: u32 = 0x604;
    pub const JOYSTICK_ADDED: u32 = 0x605;
    pub const JOYSTICK_REMOVED: u32 = 0x606;
    pub const GAMEPAD_BUTTON_DOWN: u32 = 0x651;
    pub const GAMEPAD_BUTTON_UP: u32 = 0x652;
    pub const GAMEPAD_ADDED: u32 = 0x653;
    pub const GAMEPAD_REMOVED: u32 = 0x654;
    pub const GAMEPAD_REMAPPED: u32 = 0x655;
    pub const CAMERA_DEVICE_APPROVED: u32 = 0x1402;
    pub const CAMERA_DEVICE_DENIED: u32 = 0x1403;
}

/// Flat native event record
///
/// Only the fields relevant to `kind` are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawEvent {
    pub kind: u32,
    pub timestamp: u64,
    /// Device or window the event refers to
    pub which: u32,
    pub key: u32,
    pub modifiers: u16,
    pub down: bool,
    pub repeat: bool,
    pub button: u8,
    pub axis: u8,
    pub value: i16,
    pub x: f32,
    pub y: f32,
}

/// Description of a render driver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RendererInfo {
    pub name: String,
    /// Raw render flag bits
    pub flags: u32,
    pub max_texture_width: i32,
    pub max_texture_height: i32,
}

/// Native pixel format code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    pub const UNKNOWN: PixelFormat = PixelFormat(0);
    pub const RGBA32: PixelFormat = PixelFormat(0x1676_2004);
    pub const YUY2: PixelFormat = PixelFormat(0x3259_5559);
    pub const NV12: PixelFormat = PixelFormat(0x3231_564E);

    /// Human readable format name
    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::RGBA32 => "SDL_PIXELFORMAT_RGBA32",
            PixelFormat::YUY2 => "SDL_PIXELFORMAT_YUY2",
            PixelFormat::NV12 => "SDL_PIXELFORMAT_NV12",
            _ => "SDL_PIXELFORMAT_UNKNOWN",
        }
    }
}

/// One capture format supported by a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CameraSpec {
    pub format: PixelFormat,
    pub width: i32,
    pub height: i32,
    pub framerate_numerator: i32,
    pub framerate_denominator: i32,
}

impl CameraSpec {
    /// Frames per second, `0.0` when the denominator is unset
    pub fn frames_per_second(&self) -> f64 {
        if self.framerate_denominator == 0 {
            0.0
        } else {
            self.framerate_numerator as f64 / self.framerate_denominator as f64
        }
    }
}

/// Raw camera position codes
pub mod camera_position {
    pub const UNKNOWN: u32 = 0;
    pub const FRONT_FACING: u32 = 1;
    pub const BACK_FACING: u32 = 2;
}

/// Sample format of an audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum AudioFormat {
    S16,
    #[default]
    F32,
}

impl AudioFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            AudioFormat::S16 => 2,
            AudioFormat::F32 => 4,
        }
    }
}

/// Requested audio device configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioSpec {
    pub format: AudioFormat,
    pub channels: u8,
    pub freq: i32,
}

impl Default for AudioSpec {
    fn default() -> Self {
        Self {
            format: AudioFormat::F32,
            channels: 2,
            freq: 48_000,
        }
    }
}

impl AudioSpec {
    /// Bytes consumed per second of playback
    pub fn bytes_per_second(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize * self.freq.max(0) as usize
    }
}

/// Joystick kinds for virtual devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoystickType {
    Unknown,
    #[default]
    Gamepad,
    Wheel,
    ArcadeStick,
}

/// Virtual touchpad description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VirtualTouchpad {
    pub fingers: u16,
}

/// Virtual sensor kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
}

/// Virtual sensor description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualSensor {
    pub kind: SensorType,
    pub rate: f32,
}

/// Description of a virtual joystick to attach
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualJoystickDesc {
    pub kind: JoystickType,
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub naxes: u16,
    pub nbuttons: u16,
    pub nhats: u16,
    pub touchpads: Vec<VirtualTouchpad>,
    pub sensors: Vec<VirtualSensor>,
}

impl Default for VirtualJoystickDesc {
    fn default() -> Self {
        Self {
            kind: JoystickType::Gamepad,
            name: "Virtual Gamepad".to_string(),
            vendor_id: 0,
            product_id: 0,
            naxes: 6,
            nbuttons: 26,
            nhats: 0,
            touchpads: Vec::new(),
            sensors: Vec::new(),
        }
    }
}

/// The C-style surface of the native multimedia library
///
/// See the module documentation for the sentinel conventions.
pub trait NativeLibrary {
    // ---- lifecycle -------------------------------------------------------

    fn init(&self, flags: u32) -> i32;
    fn quit(&self);
    fn was_init(&self, flags: u32) -> u32;
    fn get_error(&self) -> String;
    fn set_hint(&self, name: &str, value: &str) -> bool;
    fn get_hint(&self, name: &str) -> Option<String>;
    /// Milliseconds since initialization
    fn get_ticks(&self) -> u64;
    fn delay(&self, ms: u32);
    fn poll_event(&self, out: &mut RawEvent) -> bool;
    fn push_event(&self, event: &RawEvent) -> i32;

    // ---- video -----------------------------------------------------------

    fn get_primary_display(&self) -> u32;
    /// Content scale of a display, `0.0` on failure
    fn get_display_content_scale(&self, display: u32) -> f32;
    fn create_window(&self, title: &str, w: i32, h: i32, flags: u32) -> Option<RawHandle>;
    fn destroy_window(&self, window: RawHandle);
    fn get_window_id(&self, window: RawHandle) -> u32;
    fn get_window_size(&self, window: RawHandle, w: &mut i32, h: &mut i32) -> i32;
    fn set_window_title(&self, window: RawHandle, title: &str) -> i32;
    fn get_window_title(&self, window: RawHandle) -> Option<String>;
    /// Surface owned by the window; never passed to `destroy_surface`
    fn get_window_surface(&self, window: RawHandle) -> Option<RawHandle>;
    fn update_window_surface(&self, window: RawHandle) -> i32;

    // ---- rendering -------------------------------------------------------

    fn get_num_render_drivers(&self) -> i32;
    fn get_render_driver_info(&self, index: i32, out: &mut RendererInfo) -> i32;
    fn create_renderer(&self, window: RawHandle, index: i32, flags: u32) -> Option<RawHandle>;
    fn create_software_renderer(&self, surface: RawHandle) -> Option<RawHandle>;
    fn destroy_renderer(&self, renderer: RawHandle);
    fn get_renderer_info(&self, renderer: RawHandle, out: &mut RendererInfo) -> i32;
    fn set_render_draw_color(&self, renderer: RawHandle, color: Color) -> i32;
    fn get_render_draw_color(&self, renderer: RawHandle, out: &mut Color) -> i32;
    fn render_clear(&self, renderer: RawHandle) -> i32;
    fn render_present(&self, renderer: RawHandle) -> i32;
    fn render_points(&self, renderer: RawHandle, points: &[FPoint]) -> i32;
    fn render_lines(&self, renderer: RawHandle, points: &[FPoint]) -> i32;
    fn render_fill_rects(&self, renderer: RawHandle, rects: &[FRect]) -> i32;
    #[allow(clippy::too_many_arguments)]
    fn render_copy_ex(
        &self,
        renderer: RawHandle,
        texture: RawHandle,
        src: Option<&Rect>,
        dst: Option<&FRect>,
        angle: f64,
        center: Option<&FPoint>,
        flip: u32,
    ) -> i32;
    fn render_geometry(
        &self,
        renderer: RawHandle,
        texture: Option<RawHandle>,
        vertices: &[Vertex],
        indices: Option<&[i32]>,
    ) -> i32;
    fn render_debug_text(&self, renderer: RawHandle, x: f32, y: f32, text: &str) -> i32;
    fn set_render_viewport(&self, renderer: RawHandle, rect: Option<&Rect>) -> i32;
    fn get_render_viewport(&self, renderer: RawHandle, out: &mut Rect) -> i32;
    fn get_render_safe_area(&self, renderer: RawHandle, out: &mut Rect) -> i32;
    fn get_render_output_size(&self, renderer: RawHandle, w: &mut i32, h: &mut i32) -> i32;
    fn convert_event_to_render_coordinates(&self, renderer: RawHandle, event: &mut RawEvent) -> i32;

    // ---- surfaces --------------------------------------------------------

    fn create_surface(&self, w: i32, h: i32) -> Option<RawHandle>;
    fn load_bmp(&self, path: &Path) -> Option<RawHandle>;
    fn destroy_surface(&self, surface: RawHandle);
    fn get_surface_size(&self, surface: RawHandle, w: &mut i32, h: &mut i32) -> i32;
    fn fill_surface_rect(&self, surface: RawHandle, rect: Option<&Rect>, color: Color) -> i32;
    fn read_surface_pixel(&self, surface: RawHandle, x: i32, y: i32, out: &mut Color) -> i32;
    fn set_surface_color_key(&self, surface: RawHandle, enabled: bool, key: Color) -> i32;
    fn blit_surface(&self, src: RawHandle, dst: RawHandle, dst_rect: Option<&Rect>) -> i32;

    // ---- textures --------------------------------------------------------

    fn create_texture(&self, renderer: RawHandle, w: i32, h: i32) -> Option<RawHandle>;
    fn create_texture_from_surface(&self, renderer: RawHandle, surface: RawHandle) -> Option<RawHandle>;
    fn destroy_texture(&self, texture: RawHandle);
    fn query_texture(&self, texture: RawHandle, w: &mut i32, h: &mut i32) -> i32;
    fn set_texture_blend_mode(&self, texture: RawHandle, mode: u32) -> i32;
    fn get_texture_blend_mode(&self, texture: RawHandle, out: &mut u32) -> i32;
    fn set_texture_color_mod(&self, texture: RawHandle, r: u8, g: u8, b: u8) -> i32;
    fn set_texture_alpha_mod(&self, texture: RawHandle, alpha: u8) -> i32;
    fn update_texture(&self, texture: RawHandle, surface: RawHandle) -> i32;

    // ---- joysticks -------------------------------------------------------

    fn get_joysticks(&self) -> Vec<u32>;
    fn open_joystick(&self, id: u32) -> Option<RawHandle>;
    fn close_joystick(&self, joystick: RawHandle);
    fn get_joystick_id(&self, joystick: RawHandle) -> u32;
    fn get_joystick_name(&self, joystick: RawHandle) -> Option<String>;
    fn get_joystick_vendor(&self, joystick: RawHandle) -> u16;
    fn get_joystick_product(&self, joystick: RawHandle) -> u16;
    fn get_joystick_serial(&self, joystick: RawHandle) -> Option<String>;
    fn get_joystick_guid(&self, joystick: RawHandle) -> [u8; 16];
    fn get_joystick_player_index(&self, joystick: RawHandle) -> i32;
    fn set_joystick_player_index(&self, joystick: RawHandle, index: i32) -> i32;
    fn attach_virtual_joystick(&self, desc: &VirtualJoystickDesc) -> u32;
    fn detach_virtual_joystick(&self, id: u32) -> i32;
    fn is_joystick_virtual(&self, id: u32) -> bool;
    fn is_gamepad(&self, id: u32) -> bool;

    // ---- cameras ---------------------------------------------------------

    fn get_cameras(&self) -> Vec<u32>;
    fn get_camera_name(&self, id: u32) -> Option<String>;
    fn get_camera_position(&self, id: u32) -> u32;
    fn get_camera_supported_formats(&self, id: u32) -> Vec<CameraSpec>;
    fn open_camera(&self, id: u32, spec: Option<&CameraSpec>) -> Option<RawHandle>;
    fn close_camera(&self, camera: RawHandle);
    /// `1` approved, `0` pending, `-1` denied
    fn get_camera_permission_state(&self, camera: RawHandle) -> i32;
    /// Surface owned by the camera until `release_camera_frame`
    fn acquire_camera_frame(&self, camera: RawHandle, timestamp_ns: &mut u64) -> Option<RawHandle>;
    fn release_camera_frame(&self, camera: RawHandle, frame: RawHandle);

    // ---- audio -----------------------------------------------------------

    fn open_audio_device(&self, spec: &AudioSpec) -> Option<RawHandle>;
    fn close_audio_device(&self, device: RawHandle);
    fn pause_audio_device(&self, device: RawHandle, pause: bool) -> i32;
    fn is_audio_device_paused(&self, device: RawHandle) -> bool;
    fn queue_audio(&self, device: RawHandle, data: &[u8]) -> i32;
    fn get_queued_audio_size(&self, device: RawHandle) -> u32;
    fn clear_queued_audio(&self, device: RawHandle) -> i32;
}
