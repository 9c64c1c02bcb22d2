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

//! Headless native library
//!
//! An in-process implementation of [`NativeLibrary`] in the spirit of the
//! dummy/offscreen drivers of real multimedia libraries. It:
//!
//! - hands out opaque handles and validates every handle it receives
//! - records draw commands per renderer instead of rasterizing them
//! - keeps surfaces as plain pixel buffers (fill, blit, color key)
//! - simulates joysticks (physical and virtual), cameras and audio queues
//! - runs on a virtual clock (advanced by `delay`) or on wall-clock time
//!
//! It also serves as the test double for the wrappers: failures can be
//! injected per native call ([`HeadlessLibrary::fail_next`]) and destroy
//! calls are counted per resource kind ([`HeadlessLibrary::destroy_calls`]).

use super::{
    bmp, camera_position, event_kind, init_bits, AudioSpec, CameraSpec, JoystickType,
    NativeLibrary, PixelFormat, RawEvent, RawHandle, RendererInfo, VirtualJoystickDesc,
    NATIVE_FAILURE,
};
use crate::core::geometry::{Color, FPoint, FRect, Rect, Vertex};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::time::{Duration, Instant};

/// Raw render flag bits understood by the headless drivers
const RENDER_SOFTWARE: u32 = 0x1;
const RENDER_ACCELERATED: u32 = 0x2;
const RENDER_PRESENTVSYNC: u32 = 0x4;
const RENDER_TARGETTEXTURE: u32 = 0x8;

/// Maximum texture dimension reported by the drivers
const MAX_TEXTURE_SIZE: i32 = 16384;
const MAX_SURFACE_SIZE: i32 = 16384;

/// Render drivers exposed by the headless library
const DRIVERS: [(&str, u32); 2] = [
    (
        "headless",
        RENDER_ACCELERATED | RENDER_PRESENTVSYNC | RENDER_TARGETTEXTURE,
    ),
    ("software", RENDER_SOFTWARE | RENDER_TARGETTEXTURE),
];

/// Kinds of native resources, for inspection counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Window,
    Renderer,
    Texture,
    Surface,
    Joystick,
    Camera,
    AudioDevice,
}

/// A recorded renderer command
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    Points {
        color: Color,
        points: Vec<FPoint>,
    },
    Lines {
        color: Color,
        points: Vec<FPoint>,
    },
    FillRects {
        color: Color,
        rects: Vec<FRect>,
    },
    Copy {
        texture: RawHandle,
        src: Option<Rect>,
        dst: Option<FRect>,
        angle: f64,
        flip: u32,
    },
    Geometry {
        texture: Option<RawHandle>,
        vertices: usize,
        indices: usize,
    },
    DebugText {
        color: Color,
        x: f32,
        y: f32,
        text: String,
    },
    Viewport(Option<Rect>),
}

/// Configuration of a simulated camera
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualCamera {
    pub name: String,
    /// Raw position code, see [`camera_position`]
    pub position: u32,
    pub specs: Vec<CameraSpec>,
    /// Deny access when the camera is opened
    pub deny_permission: bool,
}

impl Default for VirtualCamera {
    fn default() -> Self {
        Self {
            name: "Headless Test Pattern Camera".to_string(),
            position: camera_position::FRONT_FACING,
            specs: vec![
                CameraSpec {
                    format: PixelFormat::YUY2,
                    width: 640,
                    height: 480,
                    framerate_numerator: 30,
                    framerate_denominator: 1,
                },
                CameraSpec {
                    format: PixelFormat::NV12,
                    width: 1280,
                    height: 720,
                    framerate_numerator: 30,
                    framerate_denominator: 1,
                },
            ],
            deny_permission: false,
        }
    }
}

enum Clock {
    Virtual(Cell<u64>),
    Realtime(Instant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SurfaceOwner {
    Caller,
    Window(u64),
    Camera(u64),
}

struct WindowState {
    id: u32,
    title: String,
    w: i32,
    h: i32,
    surface: Option<u64>,
    renderer: Option<u64>,
    surface_updates: u64,
}

struct RendererState {
    window: Option<u64>,
    target_surface: Option<u64>,
    driver: usize,
    flags: u32,
    draw_color: Color,
    viewport: Option<Rect>,
    pending: Vec<DrawCommand>,
    presented: Vec<DrawCommand>,
    present_count: u64,
}

struct SurfaceState {
    w: i32,
    h: i32,
    pixels: Vec<Color>,
    color_key: Option<Color>,
    owner: SurfaceOwner,
}

struct TextureState {
    renderer: u64,
    w: i32,
    h: i32,
    blend_mode: u32,
    color_mod: (u8, u8, u8),
    alpha_mod: u8,
    pixels: Vec<Color>,
    updates: u64,
}

struct JoystickDevice {
    name: String,
    vendor: u16,
    product: u16,
    serial: Option<String>,
    guid: [u8; 16],
    is_virtual: bool,
    kind: JoystickType,
    player_index: i32,
}

struct OpenCamera {
    device: u32,
    spec: CameraSpec,
    permission: i32,
    frame: Option<u64>,
    frames_delivered: u64,
}

struct AudioDeviceState {
    spec: AudioSpec,
    paused: bool,
    queued: usize,
}

#[derive(Default)]
struct State {
    init_flags: u32,
    quit_count: u32,
    error: String,
    hints: HashMap<String, String>,
    content_scale: f32,
    next_handle: u64,
    next_id: u32,
    windows: HashMap<u64, WindowState>,
    renderers: HashMap<u64, RendererState>,
    surfaces: HashMap<u64, SurfaceState>,
    textures: HashMap<u64, TextureState>,
    joystick_devices: BTreeMap<u32, JoystickDevice>,
    open_joysticks: HashMap<u64, u32>,
    camera_devices: BTreeMap<u32, VirtualCamera>,
    open_cameras: HashMap<u64, OpenCamera>,
    audio_devices: HashMap<u64, AudioDeviceState>,
    events: VecDeque<RawEvent>,
    injected: HashMap<&'static str, u32>,
    destroy_calls: HashMap<ResourceKind, u32>,
}

impl State {
    fn handle(&mut self) -> RawHandle {
        self.next_handle += 1;
        // next_handle starts at 0 and is incremented first, so never zero
        RawHandle::new(self.next_handle).unwrap_or_else(|| unreachable!())
    }

    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    fn fail(&mut self, message: impl Into<String>) -> i32 {
        self.error = message.into();
        NATIVE_FAILURE
    }

    fn fail_null<T>(&mut self, message: impl Into<String>) -> Option<T> {
        self.error = message.into();
        None
    }

    /// Consume one injected failure for `call`
    fn injected(&mut self, call: &'static str) -> bool {
        match self.injected.get_mut(call) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                self.error = format!("Injected failure in {}", call);
                true
            }
            _ => false,
        }
    }

    fn count_destroy(&mut self, kind: ResourceKind) {
        *self.destroy_calls.entry(kind).or_default() += 1;
    }

    fn is_init(&self, bits: u32) -> bool {
        self.init_flags & bits == bits
    }

    fn push(&mut self, mut event: RawEvent, now: u64) {
        event.timestamp = now * 1_000_000;
        self.events.push_back(event);
    }

    fn new_surface(&mut self, w: i32, h: i32, owner: SurfaceOwner) -> RawHandle {
        let handle = self.handle();
        self.surfaces.insert(
            handle.get(),
            SurfaceState {
                w,
                h,
                pixels: vec![Color::default(); w.max(0) as usize * h.max(0) as usize],
                color_key: None,
                owner,
            },
        );
        handle
    }

    fn renderer_output(&self, renderer: &RendererState) -> Option<(i32, i32)> {
        if let Some(window) = renderer.window {
            return self.windows.get(&window).map(|w| (w.w, w.h));
        }
        renderer
            .target_surface
            .and_then(|s| self.surfaces.get(&s))
            .map(|s| (s.w, s.h))
    }

    /// Destroy a renderer and every texture it owns
    fn drop_renderer(&mut self, renderer: u64) {
        if let Some(state) = self.renderers.remove(&renderer) {
            if let Some(window) = state.window.and_then(|w| self.windows.get_mut(&w)) {
                window.renderer = None;
            }
            self.textures.retain(|_, t| t.renderer != renderer);
        }
    }
}

/// Subsystems pulled in by other subsystems
fn with_dependencies(mut flags: u32) -> u32 {
    if flags & init_bits::GAMEPAD != 0 {
        flags |= init_bits::JOYSTICK;
    }
    if flags & (init_bits::VIDEO | init_bits::JOYSTICK | init_bits::AUDIO | init_bits::CAMERA) != 0
    {
        flags |= init_bits::EVENTS;
    }
    flags
}

/// In-process headless native library
pub struct HeadlessLibrary {
    state: RefCell<State>,
    clock: Clock,
}

impl Default for HeadlessLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessLibrary {
    /// Create a headless library on a virtual clock with one simulated camera
    pub fn new() -> Self {
        Self::with_clock(Clock::Virtual(Cell::new(0)))
    }

    /// Create a headless library that follows wall-clock time
    ///
    /// `delay` sleeps the calling thread in this mode.
    pub fn realtime() -> Self {
        Self::with_clock(Clock::Realtime(Instant::now()))
    }

    fn with_clock(clock: Clock) -> Self {
        let mut state = State {
            content_scale: 1.0,
            ..State::default()
        };
        let id = state.id();
        state.camera_devices.insert(id, VirtualCamera::default());

        Self {
            state: RefCell::new(state),
            clock,
        }
    }

    /// Whether time only moves through `delay`/`advance`
    pub fn is_virtual_clock(&self) -> bool {
        matches!(self.clock, Clock::Virtual(_))
    }

    /// Advance the clock without sleeping and drain playing audio queues
    pub fn advance(&self, ms: u64) {
        if let Clock::Virtual(now) = &self.clock {
            now.set(now.get() + ms);
        }
        let mut st = self.state.borrow_mut();
        for device in st.audio_devices.values_mut() {
            if !device.paused {
                let consumed = device.spec.bytes_per_second() * ms as usize / 1000;
                device.queued = device.queued.saturating_sub(consumed);
            }
        }
    }

    /// Make the next `call` (a [`NativeLibrary`] method name) fail once
    pub fn fail_next(&self, call: &'static str) {
        *self.state.borrow_mut().injected.entry(call).or_default() += 1;
    }

    /// Number of destroy/close calls received for a resource kind
    pub fn destroy_calls(&self, kind: ResourceKind) -> u32 {
        self.state
            .borrow()
            .destroy_calls
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }

    /// Number of live resources of a kind
    pub fn live_count(&self, kind: ResourceKind) -> usize {
        let st = self.state.borrow();
        match kind {
            ResourceKind::Window => st.windows.len(),
            ResourceKind::Renderer => st.renderers.len(),
            ResourceKind::Texture => st.textures.len(),
            ResourceKind::Surface => st
                .surfaces
                .values()
                .filter(|s| s.owner == SurfaceOwner::Caller)
                .count(),
            ResourceKind::Joystick => st.open_joysticks.len(),
            ResourceKind::Camera => st.open_cameras.len(),
            ResourceKind::AudioDevice => st.audio_devices.len(),
        }
    }

    /// How many times `quit` ran
    pub fn quit_count(&self) -> u32 {
        self.state.borrow().quit_count
    }

    /// Set the content scale reported for the primary display
    pub fn set_content_scale(&self, scale: f32) {
        self.state.borrow_mut().content_scale = scale;
    }

    /// Commands issued since the renderer's last present
    pub fn pending_commands(&self, renderer: RawHandle) -> Vec<DrawCommand> {
        self.state
            .borrow()
            .renderers
            .get(&renderer.get())
            .map(|r| r.pending.clone())
            .unwrap_or_default()
    }

    /// Commands of the renderer's most recently presented frame
    pub fn presented_commands(&self, renderer: RawHandle) -> Vec<DrawCommand> {
        self.state
            .borrow()
            .renderers
            .get(&renderer.get())
            .map(|r| r.presented.clone())
            .unwrap_or_default()
    }

    /// Number of presents on a renderer
    pub fn present_count(&self, renderer: RawHandle) -> u64 {
        self.state
            .borrow()
            .renderers
            .get(&renderer.get())
            .map_or(0, |r| r.present_count)
    }

    /// Number of `update_window_surface` calls on a window
    pub fn surface_update_count(&self, window: RawHandle) -> u64 {
        self.state
            .borrow()
            .windows
            .get(&window.get())
            .map_or(0, |w| w.surface_updates)
    }

    /// Number of `update_texture` calls on a texture
    pub fn texture_update_count(&self, texture: RawHandle) -> u64 {
        self.state
            .borrow()
            .textures
            .get(&texture.get())
            .map_or(0, |t| t.updates)
    }

    /// Color and alpha modulation of a texture
    pub fn texture_modulation(&self, texture: RawHandle) -> Option<(u8, u8, u8, u8)> {
        self.state
            .borrow()
            .textures
            .get(&texture.get())
            .map(|t| (t.color_mod.0, t.color_mod.1, t.color_mod.2, t.alpha_mod))
    }

    /// Bytes queued on an audio device
    pub fn queued_audio(&self, device: RawHandle) -> usize {
        self.state
            .borrow()
            .audio_devices
            .get(&device.get())
            .map_or(0, |d| d.queued)
    }

    /// Plug in a simulated physical joystick, returning its id
    pub fn connect_joystick(
        &self,
        name: &str,
        vendor: u16,
        product: u16,
        serial: Option<&str>,
    ) -> u32 {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        let id = st.id();
        let mut guid = [0u8; 16];
        guid[4..6].copy_from_slice(&vendor.to_le_bytes());
        guid[8..10].copy_from_slice(&product.to_le_bytes());
        st.joystick_devices.insert(
            id,
            JoystickDevice {
                name: name.to_string(),
                vendor,
                product,
                serial: serial.map(str::to_string),
                guid,
                is_virtual: false,
                kind: JoystickType::Gamepad,
                player_index: -1,
            },
        );
        if st.is_init(init_bits::JOYSTICK) {
            st.push(
                RawEvent {
                    kind: event_kind::JOYSTICK_ADDED,
                    which: id,
                    ..RawEvent::default()
                },
                now,
            );
        }
        id
    }

    /// Add a simulated camera, returning its id
    pub fn add_camera(&self, camera: VirtualCamera) -> u32 {
        let mut st = self.state.borrow_mut();
        let id = st.id();
        st.camera_devices.insert(id, camera);
        id
    }

    /// Remove every simulated camera
    pub fn remove_cameras(&self) {
        self.state.borrow_mut().camera_devices.clear();
    }
}

impl NativeLibrary for HeadlessLibrary {
    fn init(&self, flags: u32) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("init") {
            return NATIVE_FAILURE;
        }
        st.init_flags |= with_dependencies(flags);
        log::debug!("Headless: init flags {:#x}", st.init_flags);
        0
    }

    fn quit(&self) {
        let mut st = self.state.borrow_mut();
        st.init_flags = 0;
        st.quit_count += 1;
        st.events.clear();
        log::debug!("Headless: quit");
    }

    fn was_init(&self, flags: u32) -> u32 {
        let st = self.state.borrow();
        if flags == 0 {
            st.init_flags
        } else {
            st.init_flags & flags
        }
    }

    fn get_error(&self) -> String {
        self.state.borrow().error.clone()
    }

    fn set_hint(&self, name: &str, value: &str) -> bool {
        self.state
            .borrow_mut()
            .hints
            .insert(name.to_string(), value.to_string());
        true
    }

    fn get_hint(&self, name: &str) -> Option<String> {
        self.state.borrow().hints.get(name).cloned()
    }

    fn get_ticks(&self) -> u64 {
        match &self.clock {
            Clock::Virtual(now) => now.get(),
            Clock::Realtime(start) => start.elapsed().as_millis() as u64,
        }
    }

    fn delay(&self, ms: u32) {
        if let Clock::Realtime(_) = self.clock {
            std::thread::sleep(Duration::from_millis(ms as u64));
        }
        self.advance(ms as u64);
    }

    fn poll_event(&self, out: &mut RawEvent) -> bool {
        match self.state.borrow_mut().events.pop_front() {
            Some(event) => {
                *out = event;
                true
            }
            None => false,
        }
    }

    fn push_event(&self, event: &RawEvent) -> i32 {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        if st.injected("push_event") {
            return NATIVE_FAILURE;
        }
        if !st.is_init(init_bits::EVENTS) {
            return st.fail("Events subsystem has not been initialized");
        }
        st.push(*event, now);
        0
    }

    fn get_primary_display(&self) -> u32 {
        let mut st = self.state.borrow_mut();
        if !st.is_init(init_bits::VIDEO) {
            st.fail("Video subsystem has not been initialized");
            return 0;
        }
        1
    }

    fn get_display_content_scale(&self, display: u32) -> f32 {
        let mut st = self.state.borrow_mut();
        if display != 1 {
            st.fail(format!("Invalid display {}", display));
            return 0.0;
        }
        st.content_scale
    }

    fn create_window(&self, title: &str, w: i32, h: i32, _flags: u32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_window") {
            return None;
        }
        if !st.is_init(init_bits::VIDEO) {
            return st.fail_null("Video subsystem has not been initialized");
        }
        if w <= 0 || h <= 0 || w > MAX_SURFACE_SIZE || h > MAX_SURFACE_SIZE {
            return st.fail_null(format!("Invalid window size {}x{}", w, h));
        }
        let handle = st.handle();
        let id = st.id();
        st.windows.insert(
            handle.get(),
            WindowState {
                id,
                title: title.to_string(),
                w,
                h,
                surface: None,
                renderer: None,
                surface_updates: 0,
            },
        );
        Some(handle)
    }

    fn destroy_window(&self, window: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Window);
        match st.windows.remove(&window.get()) {
            Some(state) => {
                if let Some(surface) = state.surface {
                    st.surfaces.remove(&surface);
                }
                if let Some(renderer) = state.renderer.and_then(|r| st.renderers.get_mut(&r)) {
                    renderer.window = None;
                }
            }
            None => {
                st.fail("Invalid window");
            }
        }
    }

    fn get_window_id(&self, window: RawHandle) -> u32 {
        let mut st = self.state.borrow_mut();
        match st.windows.get(&window.get()) {
            Some(w) => w.id,
            None => {
                st.fail("Invalid window");
                0
            }
        }
    }

    fn get_window_size(&self, window: RawHandle, w: &mut i32, h: &mut i32) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.windows.get(&window.get()) {
            Some(state) => {
                *w = state.w;
                *h = state.h;
                0
            }
            None => st.fail("Invalid window"),
        }
    }

    fn set_window_title(&self, window: RawHandle, title: &str) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.windows.get_mut(&window.get()) {
            Some(state) => {
                state.title = title.to_string();
                0
            }
            None => st.fail("Invalid window"),
        }
    }

    fn get_window_title(&self, window: RawHandle) -> Option<String> {
        let mut st = self.state.borrow_mut();
        match st.windows.get(&window.get()) {
            Some(state) => Some(state.title.clone()),
            None => st.fail_null("Invalid window"),
        }
    }

    fn get_window_surface(&self, window: RawHandle) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("get_window_surface") {
            return None;
        }
        let (existing, w, h) = match st.windows.get(&window.get()) {
            Some(state) => (state.surface, state.w, state.h),
            None => return st.fail_null("Invalid window"),
        };
        if let Some(surface) = existing {
            return RawHandle::new(surface);
        }
        let surface = st.new_surface(w, h, SurfaceOwner::Window(window.get()));
        if let Some(state) = st.windows.get_mut(&window.get()) {
            state.surface = Some(surface.get());
        }
        Some(surface)
    }

    fn update_window_surface(&self, window: RawHandle) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("update_window_surface") {
            return NATIVE_FAILURE;
        }
        match st.windows.get_mut(&window.get()) {
            Some(state) if state.surface.is_some() => {
                state.surface_updates += 1;
                0
            }
            Some(_) => st.fail("Window surface is not available"),
            None => st.fail("Invalid window"),
        }
    }

    fn get_num_render_drivers(&self) -> i32 {
        DRIVERS.len() as i32
    }

    fn get_render_driver_info(&self, index: i32, out: &mut RendererInfo) -> i32 {
        let mut st = self.state.borrow_mut();
        match usize::try_from(index).ok().and_then(|i| DRIVERS.get(i)) {
            Some((name, flags)) => {
                *out = RendererInfo {
                    name: name.to_string(),
                    flags: *flags,
                    max_texture_width: MAX_TEXTURE_SIZE,
                    max_texture_height: MAX_TEXTURE_SIZE,
                };
                0
            }
            None => st.fail(format!("Invalid render driver index {}", index)),
        }
    }

    fn create_renderer(&self, window: RawHandle, index: i32, flags: u32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_renderer") {
            return None;
        }
        let driver = match index {
            -1 => DRIVERS
                .iter()
                .position(|(_, supported)| supported & flags == flags),
            i => usize::try_from(i).ok().filter(|&i| i < DRIVERS.len()),
        };
        let Some(driver) = driver else {
            return st.fail_null(format!("Couldn't find matching render driver (index {})", index));
        };
        match st.windows.get(&window.get()) {
            Some(state) if state.renderer.is_some() => {
                return st.fail_null("Renderer already associated with window");
            }
            Some(_) => {}
            None => return st.fail_null("Invalid window"),
        }
        let handle = st.handle();
        st.renderers.insert(
            handle.get(),
            RendererState {
                window: Some(window.get()),
                target_surface: None,
                driver,
                flags: flags | (DRIVERS[driver].1 & RENDER_TARGETTEXTURE),
                draw_color: Color::rgba(0, 0, 0, 0xFF),
                viewport: None,
                pending: Vec::new(),
                presented: Vec::new(),
                present_count: 0,
            },
        );
        if let Some(state) = st.windows.get_mut(&window.get()) {
            state.renderer = Some(handle.get());
        }
        Some(handle)
    }

    fn create_software_renderer(&self, surface: RawHandle) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_software_renderer") {
            return None;
        }
        if !st.surfaces.contains_key(&surface.get()) {
            return st.fail_null("Invalid surface");
        }
        let handle = st.handle();
        st.renderers.insert(
            handle.get(),
            RendererState {
                window: None,
                target_surface: Some(surface.get()),
                driver: 1,
                flags: DRIVERS[1].1,
                draw_color: Color::rgba(0, 0, 0, 0xFF),
                viewport: None,
                pending: Vec::new(),
                presented: Vec::new(),
                present_count: 0,
            },
        );
        Some(handle)
    }

    fn destroy_renderer(&self, renderer: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Renderer);
        if st.renderers.contains_key(&renderer.get()) {
            st.drop_renderer(renderer.get());
        } else {
            st.fail("Invalid renderer");
        }
    }

    fn get_renderer_info(&self, renderer: RawHandle, out: &mut RendererInfo) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.renderers.get(&renderer.get()) {
            Some(state) => {
                *out = RendererInfo {
                    name: DRIVERS[state.driver].0.to_string(),
                    flags: state.flags,
                    max_texture_width: MAX_TEXTURE_SIZE,
                    max_texture_height: MAX_TEXTURE_SIZE,
                };
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn set_render_draw_color(&self, renderer: RawHandle, color: Color) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("set_render_draw_color") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                state.draw_color = color;
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn get_render_draw_color(&self, renderer: RawHandle, out: &mut Color) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("get_render_draw_color") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get(&renderer.get()) {
            Some(state) => {
                *out = state.draw_color;
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_clear(&self, renderer: RawHandle) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_clear") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                let color = state.draw_color;
                state.pending.push(DrawCommand::Clear(color));
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_present(&self, renderer: RawHandle) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_present") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                state.presented = std::mem::take(&mut state.pending);
                state.present_count += 1;
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_points(&self, renderer: RawHandle, points: &[FPoint]) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_points") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                let color = state.draw_color;
                state.pending.push(DrawCommand::Points {
                    color,
                    points: points.to_vec(),
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_lines(&self, renderer: RawHandle, points: &[FPoint]) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_lines") {
            return NATIVE_FAILURE;
        }
        if points.len() < 2 {
            return st.fail("Lines need at least two points");
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                let color = state.draw_color;
                state.pending.push(DrawCommand::Lines {
                    color,
                    points: points.to_vec(),
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_fill_rects(&self, renderer: RawHandle, rects: &[FRect]) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_fill_rects") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                let color = state.draw_color;
                state.pending.push(DrawCommand::FillRects {
                    color,
                    rects: rects.to_vec(),
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_copy_ex(
        &self,
        renderer: RawHandle,
        texture: RawHandle,
        src: Option<&Rect>,
        dst: Option<&FRect>,
        angle: f64,
        _center: Option<&FPoint>,
        flip: u32,
    ) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_copy_ex") {
            return NATIVE_FAILURE;
        }
        match st.textures.get(&texture.get()) {
            Some(t) if t.renderer == renderer.get() => {}
            Some(_) => return st.fail("Texture was not created with this renderer"),
            None => return st.fail("Invalid texture"),
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                state.pending.push(DrawCommand::Copy {
                    texture,
                    src: src.copied(),
                    dst: dst.copied(),
                    angle,
                    flip,
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_geometry(
        &self,
        renderer: RawHandle,
        texture: Option<RawHandle>,
        vertices: &[Vertex],
        indices: Option<&[i32]>,
    ) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_geometry") {
            return NATIVE_FAILURE;
        }
        let count = indices.map_or(vertices.len(), <[i32]>::len);
        if count % 3 != 0 {
            return st.fail("Geometry must be made of whole triangles");
        }
        if let Some(bad) = indices
            .into_iter()
            .flatten()
            .find(|&&i| i < 0 || i as usize >= vertices.len())
        {
            return st.fail(format!("Vertex index {} out of range", bad));
        }
        if let Some(texture) = texture {
            if !st.textures.contains_key(&texture.get()) {
                return st.fail("Invalid texture");
            }
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                state.pending.push(DrawCommand::Geometry {
                    texture,
                    vertices: vertices.len(),
                    indices: indices.map_or(0, <[i32]>::len),
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn render_debug_text(&self, renderer: RawHandle, x: f32, y: f32, text: &str) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("render_debug_text") {
            return NATIVE_FAILURE;
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                let color = state.draw_color;
                state.pending.push(DrawCommand::DebugText {
                    color,
                    x,
                    y,
                    text: text.to_string(),
                });
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn set_render_viewport(&self, renderer: RawHandle, rect: Option<&Rect>) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("set_render_viewport") {
            return NATIVE_FAILURE;
        }
        if let Some(rect) = rect {
            if rect.w < 0 || rect.h < 0 {
                return st.fail("Viewport size must not be negative");
            }
        }
        match st.renderers.get_mut(&renderer.get()) {
            Some(state) => {
                state.viewport = rect.copied();
                state.pending.push(DrawCommand::Viewport(rect.copied()));
                0
            }
            None => st.fail("Invalid renderer"),
        }
    }

    fn get_render_viewport(&self, renderer: RawHandle, out: &mut Rect) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("get_render_viewport") {
            return NATIVE_FAILURE;
        }
        let Some(state) = st.renderers.get(&renderer.get()) else {
            return st.fail("Invalid renderer");
        };
        match (state.viewport, st.renderer_output(state)) {
            (Some(viewport), _) => {
                *out = viewport;
                0
            }
            (None, Some((w, h))) => {
                *out = Rect::new(0, 0, w, h);
                0
            }
            (None, None) => st.fail("Renderer has no output"),
        }
    }

    fn get_render_safe_area(&self, renderer: RawHandle, out: &mut Rect) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("get_render_safe_area") {
            return NATIVE_FAILURE;
        }
        let Some(state) = st.renderers.get(&renderer.get()) else {
            return st.fail("Invalid renderer");
        };
        match st.renderer_output(state) {
            Some((w, h)) => {
                *out = Rect::new(0, 0, w, h);
                0
            }
            None => st.fail("Renderer has no output"),
        }
    }

    fn get_render_output_size(&self, renderer: RawHandle, w: &mut i32, h: &mut i32) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("get_render_output_size") {
            return NATIVE_FAILURE;
        }
        let Some(state) = st.renderers.get(&renderer.get()) else {
            return st.fail("Invalid renderer");
        };
        match st.renderer_output(state) {
            Some(size) => {
                (*w, *h) = size;
                0
            }
            None => st.fail("Renderer has no output"),
        }
    }

    fn convert_event_to_render_coordinates(&self, renderer: RawHandle, event: &mut RawEvent) -> i32 {
        let mut st = self.state.borrow_mut();
        let Some(state) = st.renderers.get(&renderer.get()) else {
            return st.fail("Invalid renderer");
        };
        if matches!(
            event.kind,
            event_kind::MOUSE_MOTION | event_kind::MOUSE_BUTTON_DOWN | event_kind::MOUSE_BUTTON_UP
        ) {
            if let Some(viewport) = state.viewport {
                event.x -= viewport.x as f32;
                event.y -= viewport.y as f32;
            }
        }
        0
    }

    fn create_surface(&self, w: i32, h: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_surface") {
            return None;
        }
        if w < 0 || h < 0 || w > MAX_SURFACE_SIZE || h > MAX_SURFACE_SIZE {
            return st.fail_null(format!("Invalid surface size {}x{}", w, h));
        }
        Some(st.new_surface(w, h, SurfaceOwner::Caller))
    }

    fn load_bmp(&self, path: &Path) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("load_bmp") {
            return None;
        }
        match bmp::load(path) {
            Ok(bitmap) => {
                let handle = st.new_surface(bitmap.width, bitmap.height, SurfaceOwner::Caller);
                if let Some(surface) = st.surfaces.get_mut(&handle.get()) {
                    surface.pixels = bitmap.pixels;
                }
                Some(handle)
            }
            Err(e) => st.fail_null(e.to_string()),
        }
    }

    fn destroy_surface(&self, surface: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Surface);
        match st.surfaces.get(&surface.get()).map(|s| s.owner) {
            Some(SurfaceOwner::Caller) => {
                st.surfaces.remove(&surface.get());
            }
            Some(_) => {
                st.fail("Surface is owned by another object");
            }
            None => {
                st.fail("Invalid surface");
            }
        }
    }

    fn get_surface_size(&self, surface: RawHandle, w: &mut i32, h: &mut i32) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.surfaces.get(&surface.get()) {
            Some(state) => {
                *w = state.w;
                *h = state.h;
                0
            }
            None => st.fail("Invalid surface"),
        }
    }

    fn fill_surface_rect(&self, surface: RawHandle, rect: Option<&Rect>, color: Color) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("fill_surface_rect") {
            return NATIVE_FAILURE;
        }
        let Some(state) = st.surfaces.get_mut(&surface.get()) else {
            return st.fail("Invalid surface");
        };
        let bounds = Rect::new(0, 0, state.w, state.h);
        let Some(area) = rect.map_or(Some(bounds), |r| r.intersection(&bounds)) else {
            return 0;
        };
        for y in area.y..area.y + area.h {
            let row = (y * state.w) as usize;
            state.pixels[row + area.x as usize..row + (area.x + area.w) as usize].fill(color);
        }
        0
    }

    fn read_surface_pixel(&self, surface: RawHandle, x: i32, y: i32, out: &mut Color) -> i32 {
        let mut st = self.state.borrow_mut();
        let Some(state) = st.surfaces.get(&surface.get()) else {
            return st.fail("Invalid surface");
        };
        if !Rect::new(0, 0, state.w, state.h).contains(x, y) {
            return st.fail(format!("Pixel {},{} out of bounds", x, y));
        }
        *out = state.pixels[(y * state.w + x) as usize];
        0
    }

    fn set_surface_color_key(&self, surface: RawHandle, enabled: bool, key: Color) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.surfaces.get_mut(&surface.get()) {
            Some(state) => {
                state.color_key = enabled.then_some(key);
                0
            }
            None => st.fail("Invalid surface"),
        }
    }

    fn blit_surface(&self, src: RawHandle, dst: RawHandle, dst_rect: Option<&Rect>) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("blit_surface") {
            return NATIVE_FAILURE;
        }
        if src == dst {
            return st.fail("Cannot blit a surface onto itself");
        }
        let Some(source) = st.surfaces.get(&src.get()) else {
            return st.fail("Invalid source surface");
        };
        let (sw, sh, key) = (source.w, source.h, source.color_key);
        let pixels = source.pixels.clone();

        let Some(target) = st.surfaces.get_mut(&dst.get()) else {
            return st.fail("Invalid destination surface");
        };
        let origin = dst_rect.map_or((0, 0), |r| (r.x, r.y));
        for y in 0..sh {
            let ty = origin.1 + y;
            if ty < 0 || ty >= target.h {
                continue;
            }
            for x in 0..sw {
                let tx = origin.0 + x;
                if tx < 0 || tx >= target.w {
                    continue;
                }
                let pixel = pixels[(y * sw + x) as usize];
                if Some(pixel) != key {
                    target.pixels[(ty * target.w + tx) as usize] = pixel;
                }
            }
        }
        0
    }

    fn create_texture(&self, renderer: RawHandle, w: i32, h: i32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_texture") {
            return None;
        }
        if !st.renderers.contains_key(&renderer.get()) {
            return st.fail_null("Invalid renderer");
        }
        if w <= 0 || h <= 0 || w > MAX_TEXTURE_SIZE || h > MAX_TEXTURE_SIZE {
            return st.fail_null(format!("Invalid texture size {}x{}", w, h));
        }
        let handle = st.handle();
        st.textures.insert(
            handle.get(),
            TextureState {
                renderer: renderer.get(),
                w,
                h,
                blend_mode: 0,
                color_mod: (0xFF, 0xFF, 0xFF),
                alpha_mod: 0xFF,
                pixels: vec![Color::default(); (w * h) as usize],
                updates: 0,
            },
        );
        Some(handle)
    }

    fn create_texture_from_surface(&self, renderer: RawHandle, surface: RawHandle) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("create_texture_from_surface") {
            return None;
        }
        if !st.renderers.contains_key(&renderer.get()) {
            return st.fail_null("Invalid renderer");
        }
        let Some(source) = st.surfaces.get(&surface.get()) else {
            return st.fail_null("Invalid surface");
        };
        // Color-keyed surfaces become alpha blended textures with the key transparent
        let pixels: Vec<Color> = source
            .pixels
            .iter()
            .map(|&p| match source.color_key {
                Some(key) if key == p => Color::rgba(p.r, p.g, p.b, 0),
                _ => p,
            })
            .collect();
        let (w, h) = (source.w, source.h);
        let blend_mode = if source.color_key.is_some() { 1 } else { 0 };

        let handle = st.handle();
        st.textures.insert(
            handle.get(),
            TextureState {
                renderer: renderer.get(),
                w,
                h,
                blend_mode,
                color_mod: (0xFF, 0xFF, 0xFF),
                alpha_mod: 0xFF,
                pixels,
                updates: 0,
            },
        );
        Some(handle)
    }

    fn destroy_texture(&self, texture: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Texture);
        if st.textures.remove(&texture.get()).is_none() {
            st.fail("Invalid texture");
        }
    }

    fn query_texture(&self, texture: RawHandle, w: &mut i32, h: &mut i32) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.textures.get(&texture.get()) {
            Some(state) => {
                *w = state.w;
                *h = state.h;
                0
            }
            None => st.fail("Invalid texture"),
        }
    }

    fn set_texture_blend_mode(&self, texture: RawHandle, mode: u32) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("set_texture_blend_mode") {
            return NATIVE_FAILURE;
        }
        if !matches!(mode, 0x0 | 0x1 | 0x2 | 0x4 | 0x8 | 0x10 | 0x20) {
            return st.fail(format!("Invalid blend mode {:#x}", mode));
        }
        match st.textures.get_mut(&texture.get()) {
            Some(state) => {
                state.blend_mode = mode;
                0
            }
            None => st.fail("Invalid texture"),
        }
    }

    fn get_texture_blend_mode(&self, texture: RawHandle, out: &mut u32) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.textures.get(&texture.get()) {
            Some(state) => {
                *out = state.blend_mode;
                0
            }
            None => st.fail("Invalid texture"),
        }
    }

    fn set_texture_color_mod(&self, texture: RawHandle, r: u8, g: u8, b: u8) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.textures.get_mut(&texture.get()) {
            Some(state) => {
                state.color_mod = (r, g, b);
                0
            }
            None => st.fail("Invalid texture"),
        }
    }

    fn set_texture_alpha_mod(&self, texture: RawHandle, alpha: u8) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.textures.get_mut(&texture.get()) {
            Some(state) => {
                state.alpha_mod = alpha;
                0
            }
            None => st.fail("Invalid texture"),
        }
    }

    fn update_texture(&self, texture: RawHandle, surface: RawHandle) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("update_texture") {
            return NATIVE_FAILURE;
        }
        let Some(source) = st.surfaces.get(&surface.get()) else {
            return st.fail("Invalid surface");
        };
        let (sw, sh) = (source.w, source.h);
        let pixels = source.pixels.clone();
        let Some(state) = st.textures.get_mut(&texture.get()) else {
            return st.fail("Invalid texture");
        };
        if (sw, sh) != (state.w, state.h) {
            return st.fail(format!(
                "Surface size {}x{} does not match texture",
                sw, sh
            ));
        }
        state.pixels = pixels;
        state.updates += 1;
        0
    }

    fn get_joysticks(&self) -> Vec<u32> {
        let mut st = self.state.borrow_mut();
        if !st.is_init(init_bits::JOYSTICK) {
            st.fail("Joystick subsystem has not been initialized");
            return Vec::new();
        }
        st.joystick_devices.keys().copied().collect()
    }

    fn open_joystick(&self, id: u32) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("open_joystick") {
            return None;
        }
        if !st.is_init(init_bits::JOYSTICK) {
            return st.fail_null("Joystick subsystem has not been initialized");
        }
        if !st.joystick_devices.contains_key(&id) {
            return st.fail_null(format!("There are no joysticks with instance id {}", id));
        }
        let handle = st.handle();
        st.open_joysticks.insert(handle.get(), id);
        Some(handle)
    }

    fn close_joystick(&self, joystick: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Joystick);
        if st.open_joysticks.remove(&joystick.get()).is_none() {
            st.fail("Joystick hasn't been opened yet");
        }
    }

    fn get_joystick_id(&self, joystick: RawHandle) -> u32 {
        let mut st = self.state.borrow_mut();
        match st.open_joysticks.get(&joystick.get()) {
            Some(&id) => id,
            None => {
                st.fail("Joystick hasn't been opened yet");
                0
            }
        }
    }

    fn get_joystick_name(&self, joystick: RawHandle) -> Option<String> {
        let mut st = self.state.borrow_mut();
        let device = st
            .open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id));
        match device {
            Some(device) => Some(device.name.clone()),
            None => st.fail_null("Joystick hasn't been opened yet"),
        }
    }

    fn get_joystick_vendor(&self, joystick: RawHandle) -> u16 {
        let st = self.state.borrow();
        st.open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id))
            .map_or(0, |d| d.vendor)
    }

    fn get_joystick_product(&self, joystick: RawHandle) -> u16 {
        let st = self.state.borrow();
        st.open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id))
            .map_or(0, |d| d.product)
    }

    fn get_joystick_serial(&self, joystick: RawHandle) -> Option<String> {
        let mut st = self.state.borrow_mut();
        let device = st
            .open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id));
        match device {
            Some(device) => device.serial.clone(),
            None => st.fail_null("Joystick hasn't been opened yet"),
        }
    }

    fn get_joystick_guid(&self, joystick: RawHandle) -> [u8; 16] {
        let st = self.state.borrow();
        st.open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id))
            .map_or([0; 16], |d| d.guid)
    }

    fn get_joystick_player_index(&self, joystick: RawHandle) -> i32 {
        let st = self.state.borrow();
        st.open_joysticks
            .get(&joystick.get())
            .and_then(|id| st.joystick_devices.get(id))
            .map_or(-1, |d| d.player_index)
    }

    fn set_joystick_player_index(&self, joystick: RawHandle, index: i32) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("set_joystick_player_index") {
            return NATIVE_FAILURE;
        }
        let Some(&id) = st.open_joysticks.get(&joystick.get()) else {
            return st.fail("Joystick hasn't been opened yet");
        };
        match st.joystick_devices.get_mut(&id) {
            Some(device) => {
                device.player_index = index.max(-1);
                0
            }
            None => st.fail("Joystick was disconnected"),
        }
    }

    fn attach_virtual_joystick(&self, desc: &VirtualJoystickDesc) -> u32 {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        if st.injected("attach_virtual_joystick") {
            return 0;
        }
        if !st.is_init(init_bits::JOYSTICK) {
            st.fail("Joystick subsystem has not been initialized");
            return 0;
        }
        let id = st.id();
        let mut guid = [0u8; 16];
        guid[0] = b'v';
        guid[4..8].copy_from_slice(&id.to_le_bytes());
        st.joystick_devices.insert(
            id,
            JoystickDevice {
                name: desc.name.clone(),
                vendor: desc.vendor_id,
                product: desc.product_id,
                serial: None,
                guid,
                is_virtual: true,
                kind: desc.kind,
                player_index: -1,
            },
        );
        st.push(
            RawEvent {
                kind: event_kind::JOYSTICK_ADDED,
                which: id,
                ..RawEvent::default()
            },
            now,
        );
        if desc.kind == JoystickType::Gamepad && st.is_init(init_bits::GAMEPAD) {
            st.push(
                RawEvent {
                    kind: event_kind::GAMEPAD_ADDED,
                    which: id,
                    ..RawEvent::default()
                },
                now,
            );
        }
        id
    }

    fn detach_virtual_joystick(&self, id: u32) -> i32 {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        match st.joystick_devices.get(&id) {
            Some(device) if device.is_virtual => {}
            _ => return st.fail(format!("Virtual joystick {} not found", id)),
        }
        let kind = st.joystick_devices.remove(&id).map(|d| d.kind);
        if kind == Some(JoystickType::Gamepad) && st.is_init(init_bits::GAMEPAD) {
            st.push(
                RawEvent {
                    kind: event_kind::GAMEPAD_REMOVED,
                    which: id,
                    ..RawEvent::default()
                },
                now,
            );
        }
        st.push(
            RawEvent {
                kind: event_kind::JOYSTICK_REMOVED,
                which: id,
                ..RawEvent::default()
            },
            now,
        );
        0
    }

    fn is_joystick_virtual(&self, id: u32) -> bool {
        self.state
            .borrow()
            .joystick_devices
            .get(&id)
            .is_some_and(|d| d.is_virtual)
    }

    fn is_gamepad(&self, id: u32) -> bool {
        self.state
            .borrow()
            .joystick_devices
            .get(&id)
            .is_some_and(|d| d.kind == JoystickType::Gamepad)
    }

    fn get_cameras(&self) -> Vec<u32> {
        let mut st = self.state.borrow_mut();
        if !st.is_init(init_bits::CAMERA) {
            st.fail("Camera subsystem has not been initialized");
            return Vec::new();
        }
        st.camera_devices.keys().copied().collect()
    }

    fn get_camera_name(&self, id: u32) -> Option<String> {
        let mut st = self.state.borrow_mut();
        match st.camera_devices.get(&id) {
            Some(camera) => Some(camera.name.clone()),
            None => st.fail_null(format!("Invalid camera id {}", id)),
        }
    }

    fn get_camera_position(&self, id: u32) -> u32 {
        self.state
            .borrow()
            .camera_devices
            .get(&id)
            .map_or(camera_position::UNKNOWN, |c| c.position)
    }

    fn get_camera_supported_formats(&self, id: u32) -> Vec<CameraSpec> {
        self.state
            .borrow()
            .camera_devices
            .get(&id)
            .map(|c| c.specs.clone())
            .unwrap_or_default()
    }

    fn open_camera(&self, id: u32, spec: Option<&CameraSpec>) -> Option<RawHandle> {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        if st.injected("open_camera") {
            return None;
        }
        if !st.is_init(init_bits::CAMERA) {
            return st.fail_null("Camera subsystem has not been initialized");
        }
        let Some(device) = st.camera_devices.get(&id) else {
            return st.fail_null(format!("Invalid camera id {}", id));
        };
        let Some(spec) = spec.copied().or_else(|| device.specs.first().copied()) else {
            return st.fail_null("Camera has no supported formats");
        };
        if spec.width <= 0 || spec.height <= 0 || spec.width > MAX_SURFACE_SIZE || spec.height > MAX_SURFACE_SIZE {
            return st.fail_null(format!("Invalid camera format {}x{}", spec.width, spec.height));
        }
        let denied = device.deny_permission;

        let handle = st.handle();
        st.open_cameras.insert(
            handle.get(),
            OpenCamera {
                device: id,
                spec,
                permission: if denied { -1 } else { 1 },
                frame: None,
                frames_delivered: 0,
            },
        );
        let kind = if denied {
            event_kind::CAMERA_DEVICE_DENIED
        } else {
            event_kind::CAMERA_DEVICE_APPROVED
        };
        st.push(
            RawEvent {
                kind,
                which: id,
                ..RawEvent::default()
            },
            now,
        );
        Some(handle)
    }

    fn close_camera(&self, camera: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::Camera);
        match st.open_cameras.remove(&camera.get()) {
            Some(open) => {
                if let Some(frame) = open.frame {
                    st.surfaces.remove(&frame);
                }
            }
            None => {
                st.fail("Invalid camera");
            }
        }
    }

    fn get_camera_permission_state(&self, camera: RawHandle) -> i32 {
        let st = self.state.borrow();
        st.open_cameras
            .get(&camera.get())
            .map_or(-1, |c| c.permission)
    }

    fn acquire_camera_frame(&self, camera: RawHandle, timestamp_ns: &mut u64) -> Option<RawHandle> {
        let now = self.get_ticks();
        let mut st = self.state.borrow_mut();
        let (spec, outstanding, delivered) = match st.open_cameras.get(&camera.get()) {
            Some(open) if open.permission == 1 => (open.spec, open.frame, open.frames_delivered),
            Some(_) => return None,
            None => return st.fail_null("Invalid camera"),
        };
        if outstanding.is_some() {
            return None;
        }

        // Test pattern: the frame color steps every frame
        let shade = (delivered % 256) as u8;
        let frame = st.new_surface(spec.width, spec.height, SurfaceOwner::Camera(camera.get()));
        if let Some(surface) = st.surfaces.get_mut(&frame.get()) {
            surface.pixels.fill(Color::rgb(shade, 0x40, 0xFF - shade));
        }
        if let Some(open) = st.open_cameras.get_mut(&camera.get()) {
            open.frame = Some(frame.get());
            open.frames_delivered += 1;
        }
        *timestamp_ns = now * 1_000_000;
        Some(frame)
    }

    fn release_camera_frame(&self, camera: RawHandle, frame: RawHandle) {
        let mut st = self.state.borrow_mut();
        match st.open_cameras.get_mut(&camera.get()) {
            Some(open) if open.frame == Some(frame.get()) => {
                open.frame = None;
                st.surfaces.remove(&frame.get());
            }
            Some(_) => {
                st.fail("Frame does not belong to this camera");
            }
            None => {
                st.fail("Invalid camera");
            }
        }
    }

    fn open_audio_device(&self, spec: &AudioSpec) -> Option<RawHandle> {
        let mut st = self.state.borrow_mut();
        if st.injected("open_audio_device") {
            return None;
        }
        if !st.is_init(init_bits::AUDIO) {
            return st.fail_null("Audio subsystem has not been initialized");
        }
        if spec.channels == 0 || spec.freq <= 0 {
            return st.fail_null(format!(
                "Unsupported audio spec: {} channels at {} Hz",
                spec.channels, spec.freq
            ));
        }
        let handle = st.handle();
        st.audio_devices.insert(
            handle.get(),
            AudioDeviceState {
                spec: *spec,
                paused: true,
                queued: 0,
            },
        );
        Some(handle)
    }

    fn close_audio_device(&self, device: RawHandle) {
        let mut st = self.state.borrow_mut();
        st.count_destroy(ResourceKind::AudioDevice);
        if st.audio_devices.remove(&device.get()).is_none() {
            st.fail("Invalid audio device");
        }
    }

    fn pause_audio_device(&self, device: RawHandle, pause: bool) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.audio_devices.get_mut(&device.get()) {
            Some(state) => {
                state.paused = pause;
                0
            }
            None => st.fail("Invalid audio device"),
        }
    }

    fn is_audio_device_paused(&self, device: RawHandle) -> bool {
        self.state
            .borrow()
            .audio_devices
            .get(&device.get())
            .is_some_and(|d| d.paused)
    }

    fn queue_audio(&self, device: RawHandle, data: &[u8]) -> i32 {
        let mut st = self.state.borrow_mut();
        if st.injected("queue_audio") {
            return NATIVE_FAILURE;
        }
        match st.audio_devices.get_mut(&device.get()) {
            Some(state) => {
                state.queued += data.len();
                0
            }
            None => st.fail("Invalid audio device"),
        }
    }

    fn get_queued_audio_size(&self, device: RawHandle) -> u32 {
        self.state
            .borrow()
            .audio_devices
            .get(&device.get())
            .map_or(0, |d| d.queued as u32)
    }

    fn clear_queued_audio(&self, device: RawHandle) -> i32 {
        let mut st = self.state.borrow_mut();
        match st.audio_devices.get_mut(&device.get()) {
            Some(state) => {
                state.queued = 0;
                0
            }
            None => st.fail("Invalid audio device"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> HeadlessLibrary {
        let lib = HeadlessLibrary::new();
        assert_eq!(lib.init(init_bits::VIDEO), 0);
        lib
    }

    #[test]
    fn test_window_requires_video() {
        let lib = HeadlessLibrary::new();
        assert!(lib.create_window("t", 10, 10, 0).is_none());
        assert_eq!(lib.get_error(), "Video subsystem has not been initialized");
    }

    #[test]
    fn test_injected_failure_is_consumed() {
        let lib = video();
        lib.fail_next("create_window");
        assert!(lib.create_window("t", 10, 10, 0).is_none());
        assert_eq!(lib.get_error(), "Injected failure in create_window");
        assert!(lib.create_window("t", 10, 10, 0).is_some());
    }

    #[test]
    fn test_present_moves_pending_commands() {
        let lib = video();
        let window = lib.create_window("t", 64, 32, 0).unwrap();
        let renderer = lib.create_renderer(window, -1, 0).unwrap();

        lib.set_render_draw_color(renderer, Color::RED);
        lib.render_clear(renderer);
        assert_eq!(lib.pending_commands(renderer), vec![DrawCommand::Clear(Color::RED)]);

        assert_eq!(lib.render_present(renderer), 0);
        assert!(lib.pending_commands(renderer).is_empty());
        assert_eq!(lib.presented_commands(renderer), vec![DrawCommand::Clear(Color::RED)]);
        assert_eq!(lib.present_count(renderer), 1);
    }

    #[test]
    fn test_one_renderer_per_window() {
        let lib = video();
        let window = lib.create_window("t", 64, 32, 0).unwrap();
        assert!(lib.create_renderer(window, 0, 0).is_some());
        assert!(lib.create_renderer(window, 0, 0).is_none());
        assert_eq!(lib.get_error(), "Renderer already associated with window");
    }

    #[test]
    fn test_destroying_renderer_destroys_textures() {
        let lib = video();
        let window = lib.create_window("t", 64, 32, 0).unwrap();
        let renderer = lib.create_renderer(window, 0, 0).unwrap();
        let texture = lib.create_texture(renderer, 4, 4).unwrap();

        lib.destroy_renderer(renderer);
        let (mut w, mut h) = (0, 0);
        assert_eq!(lib.query_texture(texture, &mut w, &mut h), NATIVE_FAILURE);
        assert_eq!(lib.live_count(ResourceKind::Texture), 0);
    }

    #[test]
    fn test_fill_and_blit_with_color_key() {
        let lib = HeadlessLibrary::new();
        let src = lib.create_surface(2, 1).unwrap();
        let dst = lib.create_surface(4, 4).unwrap();

        lib.fill_surface_rect(src, None, Color::BLUE);
        lib.fill_surface_rect(src, Some(&Rect::new(1, 0, 1, 1)), Color::GREEN);
        lib.set_surface_color_key(src, true, Color::GREEN);
        lib.fill_surface_rect(dst, None, Color::GRAY);
        assert_eq!(lib.blit_surface(src, dst, Some(&Rect::new(3, 3, 0, 0))), 0);

        let mut pixel = Color::default();
        lib.read_surface_pixel(dst, 3, 3, &mut pixel);
        assert_eq!(pixel, Color::BLUE);
        // Clipped away, destination untouched
        lib.read_surface_pixel(dst, 2, 3, &mut pixel);
        assert_eq!(pixel, Color::GRAY);
    }

    #[test]
    fn test_virtual_joystick_events() {
        let lib = HeadlessLibrary::new();
        lib.init(init_bits::GAMEPAD);
        let id = lib.attach_virtual_joystick(&VirtualJoystickDesc::default());
        assert_ne!(id, 0);
        assert!(lib.is_joystick_virtual(id));

        let mut event = RawEvent::default();
        assert!(lib.poll_event(&mut event));
        assert_eq!(event.kind, event_kind::JOYSTICK_ADDED);
        assert!(lib.poll_event(&mut event));
        assert_eq!(event.kind, event_kind::GAMEPAD_ADDED);
        assert_eq!(event.which, id);

        assert_eq!(lib.detach_virtual_joystick(id), 0);
        assert!(!lib.get_joysticks().contains(&id));
    }

    #[test]
    fn test_camera_frame_is_exclusive_until_released() {
        let lib = HeadlessLibrary::new();
        lib.init(init_bits::CAMERA);
        let id = lib.get_cameras()[0];
        let camera = lib.open_camera(id, None).unwrap();
        let mut ts = 0;

        let frame = lib.acquire_camera_frame(camera, &mut ts).unwrap();
        assert!(lib.acquire_camera_frame(camera, &mut ts).is_none());
        lib.release_camera_frame(camera, frame);
        assert!(lib.acquire_camera_frame(camera, &mut ts).is_some());
    }

    #[test]
    fn test_audio_drains_only_while_playing() {
        let lib = HeadlessLibrary::new();
        lib.init(init_bits::AUDIO);
        let spec = AudioSpec {
            freq: 1000,
            channels: 1,
            ..AudioSpec::default()
        };
        let device = lib.open_audio_device(&spec).unwrap();
        lib.queue_audio(device, &[0u8; 4000]);

        lib.advance(500);
        assert_eq!(lib.queued_audio(device), 4000);

        lib.pause_audio_device(device, false);
        lib.advance(500);
        assert_eq!(lib.queued_audio(device), 2000);
    }

    #[test]
    fn test_virtual_clock_advances_on_delay() {
        let lib = HeadlessLibrary::new();
        assert_eq!(lib.get_ticks(), 0);
        lib.delay(16);
        lib.delay(16);
        assert_eq!(lib.get_ticks(), 32);
    }
}
