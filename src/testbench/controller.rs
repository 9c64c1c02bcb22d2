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

//! Controller test
//!
//! Shows the selected gamepad with its identification texts. Keys (see
//! [`KeyBindings`]) attach and detach a virtual gamepad, set the player
//! index and switch between the front and rear images.
//!
//! ```text
//! +--------------------------------------------------------------+
//! |              title / subtitle                           (id) |
//! | panel  |                gamepad image               | panel  |
//! |        |                                            |        |
//! |                 serial                       VID/PID misc    |
//! +--------------------------------------------------------------+
//! ```

use super::Options;
use crate::core::context::{InitFlags, Sdl};
use crate::core::error::Result;
use crate::core::event::Event;
use crate::core::geometry::{Color, FPoint, FRect};
use crate::core::joystick::{guid_string, Joystick, JoystickId, Joysticks};
use crate::core::native::{
    SensorType, VirtualJoystickDesc, VirtualSensor, VirtualTouchpad, DEBUG_TEXT_FONT_CHARACTER_SIZE,
};
use crate::core::renderer::{RenderFlags, Renderer};
use crate::core::surface::Surface;
use crate::core::texture::Texture;
use crate::core::window::{Window, WindowFlags};
use crate::frontend::app::{AppContext, Game};
use crate::frontend::input::{HarnessCommand, KeyBindings};
use clap::Args;
use std::path::PathBuf;

/// Hints applied before the joystick subsystem starts
pub const JOYSTICK_HINTS: [(&str, &str); 8] = [
    ("JOYSTICK_HIDAPI", "1"),
    ("JOYSTICK_HIDAPI_PS4_RUMBLE", "1"),
    ("JOYSTICK_HIDAPI_PS5_RUMBLE", "1"),
    ("JOYSTICK_HIDAPI_STEAM", "1"),
    ("JOYSTICK_ROG_CHAKRAM", "1"),
    ("JOYSTICK_ALLOW_BACKGROUND_EVENTS", "1"),
    ("JOYSTICK_LINUX_DEADZONES", "1"),
    ("RENDER_VSYNC", "1"),
];

/// Arguments of the `controller` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct ControllerArgs {
    /// Simulate a virtual gamepad
    #[arg(long = "virtual")]
    pub use_virtual: bool,
}

/// Scene layout in unscaled pixels
pub struct Layout;

impl Layout {
    pub const TITLE_HEIGHT: f32 = 48.0;
    pub const PANEL_SPACING: f32 = 25.0;
    pub const PANEL_WIDTH: f32 = 250.0;
    pub const GAMEPAD_WIDTH: f32 = 512.0;
    pub const GAMEPAD_HEIGHT: f32 = 560.0;
    pub const FONT_CHARACTER_SIZE: f32 = DEBUG_TEXT_FONT_CHARACTER_SIZE as f32;

    pub const SCENE_WIDTH: f32 = Self::PANEL_WIDTH
        + Self::PANEL_SPACING
        + Self::GAMEPAD_WIDTH
        + Self::PANEL_SPACING
        + Self::PANEL_WIDTH;
    pub const SCENE_HEIGHT: f32 = Self::TITLE_HEIGHT + Self::GAMEPAD_HEIGHT;

    /// Where the gamepad image is drawn
    pub const fn gamepad_image_position() -> FPoint {
        FPoint::new(Self::PANEL_WIDTH + Self::PANEL_SPACING, Self::TITLE_HEIGHT)
    }

    /// Window size for a display content scale, rounded up
    pub fn screen_size(scale: f32) -> (i32, i32) {
        (
            (Self::SCENE_WIDTH * scale).ceil() as i32,
            (Self::SCENE_HEIGHT * scale).ceil() as i32,
        )
    }
}

/// Width of a debug text string in pixels, one glyph per byte
fn text_width(text: &str) -> f32 {
    Layout::FONT_CHARACTER_SIZE * text.len() as f32
}

/// Identification of the displayed gamepad
#[derive(Debug, Clone, PartialEq)]
pub struct GamepadInfo {
    pub id: JoystickId,
    pub name: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial: Option<String>,
    pub is_virtual: bool,
}

impl GamepadInfo {
    pub fn read(joystick: &Joystick) -> Result<Self> {
        Ok(Self {
            id: joystick.id()?,
            name: joystick.name()?,
            vendor_id: joystick.vendor_id()?,
            product_id: joystick.product_id()?,
            serial: joystick.serial()?,
            is_virtual: joystick.is_virtual()?,
        })
    }
}

/// What the scene shows
#[derive(Debug, Clone, PartialEq, Default)]
pub enum GamepadDisplay {
    #[default]
    Detached,
    Front(GamepadInfo),
    Back(GamepadInfo),
}

impl GamepadDisplay {
    fn info(&self) -> Option<&GamepadInfo> {
        match self {
            GamepadDisplay::Detached => None,
            GamepadDisplay::Front(info) | GamepadDisplay::Back(info) => Some(info),
        }
    }

    pub fn title(&self) -> String {
        match self {
            GamepadDisplay::Detached => {
                "Waiting for gamepad, press A to add a virtual controller".to_string()
            }
            GamepadDisplay::Front(info) if info.name.is_empty() => "Front".to_string(),
            GamepadDisplay::Back(info) if info.name.is_empty() => "Back".to_string(),
            GamepadDisplay::Front(info) | GamepadDisplay::Back(info) => info.name.clone(),
        }
    }

    pub fn subtitle(&self) -> String {
        match self.info() {
            Some(_) => "Click on the gamepad image below to generate input".to_string(),
            None => String::new(),
        }
    }

    pub fn joystick_id_text(&self) -> String {
        self.info()
            .map(|info| format!("({})", info.id))
            .unwrap_or_default()
    }

    pub fn misc_id_text(&self) -> String {
        self.info()
            .map(|info| format!("VID: 0x{:x}, PID: 0x{:x}", info.vendor_id, info.product_id))
            .unwrap_or_default()
    }

    /// Serial number line; virtual devices have none
    pub fn serial_text(&self) -> String {
        match self.info() {
            Some(GamepadInfo {
                serial: Some(serial),
                is_virtual: false,
                ..
            }) => format!("Serial: {}", serial),
            _ => String::new(),
        }
    }

    pub fn joystick_id_text_position(&self) -> FPoint {
        FPoint::new(
            Layout::SCENE_WIDTH - text_width(&self.joystick_id_text()) - 8.0,
            8.0,
        )
    }

    pub fn title_text_position(&self) -> FPoint {
        FPoint::new(
            Layout::SCENE_WIDTH / 2.0 - text_width(&self.title()) / 2.0,
            Layout::TITLE_HEIGHT / 2.0 - Layout::FONT_CHARACTER_SIZE / 2.0,
        )
    }

    pub fn subtitle_text_position(&self) -> FPoint {
        FPoint::new(
            Layout::SCENE_WIDTH / 2.0 - text_width(&self.subtitle()) / 2.0,
            Layout::TITLE_HEIGHT / 2.0 - Layout::FONT_CHARACTER_SIZE / 2.0
                + (Layout::FONT_CHARACTER_SIZE + 2.0)
                + 2.0,
        )
    }

    pub fn misc_text_position(&self) -> FPoint {
        FPoint::new(
            Layout::SCENE_WIDTH - 8.0 - text_width(&self.misc_id_text()),
            Layout::SCENE_HEIGHT - 8.0 - Layout::FONT_CHARACTER_SIZE,
        )
    }

    pub fn serial_text_position(&self) -> FPoint {
        FPoint::new(
            Layout::SCENE_WIDTH / 2.0 - text_width(&self.serial_text()) / 2.0,
            Layout::SCENE_HEIGHT - 8.0 - Layout::FONT_CHARACTER_SIZE,
        )
    }
}

/// Description of the gamepad attached with the A key
pub fn virtual_gamepad() -> VirtualJoystickDesc {
    VirtualJoystickDesc {
        touchpads: vec![VirtualTouchpad { fingers: 1 }],
        sensors: vec![VirtualSensor {
            kind: SensorType::Accelerometer,
            rate: 0.0,
        }],
        ..VirtualJoystickDesc::default()
    }
}

/// Loaded gamepad images
struct Images {
    front: Texture,
    back: Texture,
}

/// The controller test
pub struct Controller {
    args: ControllerArgs,
    bindings: KeyBindings,
    front_image: PathBuf,
    back_image: PathBuf,
    renderer: Option<Renderer>,
    images: Option<Images>,
    joystick: Option<Joystick>,
    virtual_id: Option<JoystickId>,
    show_rear: bool,
    display: GamepadDisplay,
}

impl Controller {
    pub fn new(args: ControllerArgs, options: &Options, bindings: KeyBindings) -> Self {
        for (command, keys) in bindings.detect_conflicts() {
            log::warn!("Controller test: {} is bound to several keys: {:?}", command, keys);
        }
        Self {
            args,
            bindings,
            front_image: options.asset("gamepad_front.bmp"),
            back_image: options.asset("gamepad_back.bmp"),
            renderer: None,
            images: None,
            joystick: None,
            virtual_id: None,
            show_rear: false,
            display: GamepadDisplay::Detached,
        }
    }

    pub fn display(&self) -> &GamepadDisplay {
        &self.display
    }

    pub fn joystick(&self) -> Option<&Joystick> {
        self.joystick.as_ref()
    }

    fn apply_hints(sdl: &Sdl) {
        println!("Applying hints...");
        for (name, value) in JOYSTICK_HINTS {
            sdl.set_hint(name, value);
        }
    }

    /// Select (or clear) the displayed joystick and refresh the scene texts
    fn set_joystick(&mut self, joystick: Option<Joystick>) -> Result<()> {
        if let Some(joystick) = &joystick {
            println!("{}", guid_string(&joystick.guid()?));
        }
        self.joystick = joystick;
        self.refresh_display()
    }

    fn refresh_display(&mut self) -> Result<()> {
        self.display = match &self.joystick {
            None => GamepadDisplay::Detached,
            Some(joystick) if self.show_rear => GamepadDisplay::Back(GamepadInfo::read(joystick)?),
            Some(joystick) => GamepadDisplay::Front(GamepadInfo::read(joystick)?),
        };
        Ok(())
    }

    fn attach_virtual(&mut self, sdl: &Sdl) -> Result<()> {
        if self.joystick.is_some() {
            return Ok(());
        }
        let id = Joysticks::attach_virtual(sdl, &virtual_gamepad())?;
        self.virtual_id = Some(id);
        let joystick = Joystick::open(sdl, id)?;
        println!("Is Gamepad: {}", Joysticks::is_gamepad(sdl, id));
        self.set_joystick(Some(joystick))
    }

    fn detach_virtual(&mut self, sdl: &Sdl) -> Result<()> {
        let is_virtual = match &self.joystick {
            Some(joystick) => joystick.is_virtual()?,
            None => false,
        };
        if !is_virtual {
            return Ok(());
        }
        println!("Closing virtual joystick...");
        self.set_joystick(None)?;
        if let Some(id) = self.virtual_id.take() {
            Joysticks::detach_virtual(sdl, id)?;
        }
        Ok(())
    }

    fn handle_command(&mut self, ctx: &mut AppContext, command: HarnessCommand) -> Result<()> {
        log::debug!("Controller test: {}", command);
        let sdl = ctx.sdl().clone();
        match command {
            HarnessCommand::AttachVirtual => self.attach_virtual(&sdl),
            HarnessCommand::DetachVirtual => self.detach_virtual(&sdl),
            HarnessCommand::SetPlayerIndex(index) => match &self.joystick {
                Some(joystick) => joystick.set_player_index(Some(index as u32)),
                None => Ok(()),
            },
            HarnessCommand::ToggleRearView => {
                self.show_rear = !self.show_rear;
                self.refresh_display()
            }
            HarnessCommand::Quit => {
                ctx.quit();
                Ok(())
            }
        }
    }

    fn draw(&self, renderer: &Renderer) -> Result<()> {
        let display = &self.display;
        renderer
            .clear_with(Color::WHITE)?
            .debug_text(&display.joystick_id_text(), display.joystick_id_text_position(), Color::BLACK)?
            .debug_text(&display.title(), display.title_text_position(), Color::BLACK)?
            .debug_text(&display.subtitle(), display.subtitle_text_position(), Color::BLACK)?
            .debug_text(&display.misc_id_text(), display.misc_text_position(), Color::BLACK)?
            .debug_text(&display.serial_text(), display.serial_text_position(), Color::BLACK)?;

        for i in 0..10 {
            let color = if i % 2 == 0 { Color::GREEN } else { Color::RED };
            renderer.fill_rects(&[FRect::new(i as f32 * 10.0, 400.0, 100.0, 100.0)], color)?;
        }

        let texture = match (&self.images, display) {
            (Some(images), GamepadDisplay::Front(_)) => Some(&images.front),
            (Some(images), GamepadDisplay::Back(_)) => Some(&images.back),
            _ => None,
        };
        if let Some(texture) = texture {
            let (w, h) = texture.size()?.to_f32();
            let at = Layout::gamepad_image_position();
            renderer.draw_texture(texture, FRect::new(at.x, at.y, w, h))?;
        }
        renderer.present()
    }
}

impl Game for Controller {
    fn name(&self) -> &str {
        "Controller test"
    }

    fn on_init(&mut self, sdl: &Sdl) -> Result<Window> {
        Self::apply_hints(sdl);

        println!("Initializing subsystems...");
        sdl.init_subsystem(InitFlags::VIDEO | InitFlags::JOYSTICK | InitFlags::GAMEPAD)?;

        let scale = sdl
            .primary_display()
            .and_then(|display| sdl.display_content_scale(display))
            .unwrap_or(1.0);
        let (width, height) = Layout::screen_size(scale);
        Window::new(sdl, "sdlkit test: Controller", width, height, WindowFlags::empty())
    }

    fn on_ready(&mut self, ctx: &mut AppContext, window: &Window) -> Result<()> {
        let renderer = window.create_renderer(None, RenderFlags::PRESENT_VSYNC)?;
        let sdl = ctx.sdl().clone();
        let front = Surface::load_bmp(&sdl, &self.front_image)?;
        let back = Surface::load_bmp(&sdl, &self.back_image)?;
        self.images = Some(Images {
            front: renderer.texture_from_surface(&front)?,
            back: renderer.texture_from_surface(&back)?,
        });
        self.renderer = Some(renderer);

        for (command, keys) in self.bindings.listing() {
            log::info!("  {:<18} {}", command, keys.join(", "));
        }

        if self.args.use_virtual {
            self.attach_virtual(&sdl)?;
        }
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut AppContext, _window: &Window, _delta_ms: u64) -> Result<()> {
        match &self.renderer {
            Some(renderer) => self.draw(renderer),
            None => Ok(()),
        }
    }

    fn on_event(&mut self, ctx: &mut AppContext, _window: &Window, event: &Event) -> Result<()> {
        let event = match &self.renderer {
            Some(renderer) => renderer.convert_event(event)?,
            None => *event,
        };

        match event {
            Event::JoystickAdded { which } => println!("Joystick Added: {}", which),
            Event::JoystickRemoved { which } => {
                println!("Joystick Removed: {}", which);
                let current = self.joystick.as_ref().map(Joystick::id).transpose()?;
                if current == Some(which) {
                    self.set_joystick(None)?;
                }
            }
            Event::GamepadAdded { which } => println!("Gamepad Added: {}", which),
            Event::GamepadRemoved { which } => println!("Gamepad Removed: {}", which),
            _ => {
                if let Some(command) = self.bindings.command_for_event(&event) {
                    self.handle_command(ctx, command)?;
                }
            }
        }
        Ok(())
    }

    fn on_shutdown(&mut self, _ctx: &mut AppContext) -> Result<()> {
        self.joystick = None;
        self.images = None;
        self.renderer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Keycode;
    use crate::core::native::headless::DrawCommand;
    use crate::core::native::HeadlessLibrary;
    use crate::frontend::app::{App, RunOptions};
    use std::rc::Rc;

    fn options() -> Options {
        Options {
            assets: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets"),
            ..Options::default()
        }
    }

    fn info(name: &str, serial: Option<&str>, is_virtual: bool) -> GamepadInfo {
        GamepadInfo {
            id: JoystickId(7),
            name: name.to_string(),
            vendor_id: 0x45e,
            product_id: 0x2ea,
            serial: serial.map(str::to_string),
            is_virtual,
        }
    }

    /// State observed at the end of the last frame
    #[derive(Debug, Default)]
    struct Snapshot {
        display: GamepadDisplay,
        player_index: Option<u32>,
        connected: usize,
        commands: Vec<DrawCommand>,
    }

    struct Recorder<'a> {
        inner: &'a mut Controller,
        lib: Rc<HeadlessLibrary>,
        last: Snapshot,
    }

    impl Game for Recorder<'_> {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_init(&mut self, sdl: &Sdl) -> Result<Window> {
            self.inner.on_init(sdl)
        }

        fn on_ready(&mut self, ctx: &mut AppContext, window: &Window) -> Result<()> {
            self.inner.on_ready(ctx, window)
        }

        fn on_event(&mut self, ctx: &mut AppContext, window: &Window, event: &Event) -> Result<()> {
            self.inner.on_event(ctx, window, event)
        }

        fn on_update(&mut self, ctx: &mut AppContext, window: &Window, delta_ms: u64) -> Result<()> {
            self.inner.on_update(ctx, window, delta_ms)?;
            self.last = Snapshot {
                display: self.inner.display().clone(),
                player_index: match self.inner.joystick() {
                    Some(joystick) => joystick.player_index()?,
                    None => None,
                },
                connected: Joysticks::connected(ctx.sdl())?.len(),
                commands: match &self.inner.renderer {
                    Some(renderer) => self.lib.presented_commands(renderer.raw()?),
                    None => Vec::new(),
                },
            };
            Ok(())
        }

        fn on_shutdown(&mut self, ctx: &mut AppContext) -> Result<()> {
            self.inner.on_shutdown(ctx)
        }
    }

    /// Run one frame with `keys` queued and return what it showed
    fn run_with_keys(args: ControllerArgs, keys: &[Keycode]) -> (Rc<HeadlessLibrary>, Snapshot) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::EVENTS).unwrap();
        for key in keys {
            sdl.push_event(Event::key_down(*key)).unwrap();
        }

        let mut game = Controller::new(args, &options(), KeyBindings::new());
        let mut recorder = Recorder {
            inner: &mut game,
            lib: lib.clone(),
            last: Snapshot::default(),
        };
        let run_options = RunOptions {
            frames: Some(1),
            escape_quits: false,
            ..RunOptions::default()
        };
        App::run(&sdl, &mut recorder, run_options).unwrap();
        let last = std::mem::take(&mut recorder.last);
        (lib, last)
    }

    #[test]
    fn test_layout_scene_size() {
        assert_eq!(Layout::SCENE_WIDTH, 1062.0);
        assert_eq!(Layout::SCENE_HEIGHT, 608.0);
        assert_eq!(Layout::screen_size(1.0), (1062, 608));
        assert_eq!(Layout::screen_size(1.5), (1593, 912));
        assert_eq!(Layout::screen_size(1.25), (1328, 760));
        assert_eq!(Layout::gamepad_image_position(), FPoint::new(275.0, 48.0));
    }

    #[test]
    fn test_detached_texts() {
        let display = GamepadDisplay::Detached;
        assert_eq!(
            display.title(),
            "Waiting for gamepad, press A to add a virtual controller"
        );
        assert!(display.subtitle().is_empty());
        assert!(display.joystick_id_text().is_empty());
        assert!(display.misc_id_text().is_empty());
        assert!(display.serial_text().is_empty());
        // 56 characters centred in the scene
        assert_eq!(display.title_text_position(), FPoint::new(531.0 - 224.0, 20.0));
    }

    #[test]
    fn test_attached_texts_and_positions() {
        let display = GamepadDisplay::Front(info("Pad", Some("ABC123"), false));
        assert_eq!(display.title(), "Pad");
        assert_eq!(display.joystick_id_text(), "(7)");
        assert_eq!(display.misc_id_text(), "VID: 0x45e, PID: 0x2ea");
        assert_eq!(display.serial_text(), "Serial: ABC123");

        assert_eq!(display.joystick_id_text_position(), FPoint::new(1062.0 - 24.0 - 8.0, 8.0));
        assert_eq!(display.subtitle_text_position().y, 20.0 + 10.0 + 2.0);
        assert_eq!(
            display.misc_text_position(),
            FPoint::new(1062.0 - 8.0 - 22.0 * 8.0, 608.0 - 16.0)
        );
        // centred by its own length
        assert_eq!(display.serial_text_position().x, 531.0 - 14.0 * 4.0);
    }

    #[test]
    fn test_non_ascii_title_centred_by_bytes() {
        let display = GamepadDisplay::Front(info("Pad \u{e9}", None, false));
        assert_eq!(display.title().len(), 6);
        assert_eq!(display.title_text_position().x, 531.0 - 24.0);
    }

    #[test]
    fn test_virtual_and_unnamed_gamepads() {
        let back = GamepadDisplay::Back(info("", Some("ABC123"), true));
        assert_eq!(back.title(), "Back");
        assert!(back.serial_text().is_empty());

        let front = GamepadDisplay::Front(info("", None, false));
        assert_eq!(front.title(), "Front");
        assert!(front.serial_text().is_empty());
    }

    #[test]
    fn test_virtual_flag_attaches_at_startup() {
        let (lib, last) = run_with_keys(ControllerArgs { use_virtual: true }, &[]);

        match &last.display {
            GamepadDisplay::Front(info) => {
                assert!(info.is_virtual);
                assert_eq!(info.name, "Virtual Gamepad");
            }
            other => panic!("unexpected display {:?}", other),
        }
        assert_eq!(last.connected, 1);
        // closed at shutdown
        assert_eq!(lib.live_count(crate::core::native::headless::ResourceKind::Joystick), 0);
    }

    #[test]
    fn test_attach_player_index_and_rear_view() {
        let keys = [Keycode::A, Keycode(0x33), Keycode::R];
        let (_lib, last) = run_with_keys(ControllerArgs::default(), &keys);

        assert!(matches!(last.display, GamepadDisplay::Back(_)));
        assert_eq!(last.display.title(), "Virtual Gamepad");
        assert_eq!(last.player_index, Some(3));
    }

    #[test]
    fn test_detach_virtual() {
        let (_lib, last) = run_with_keys(ControllerArgs::default(), &[Keycode::A, Keycode::D]);
        assert_eq!(last.display, GamepadDisplay::Detached);
        assert_eq!(last.connected, 0);
    }

    #[test]
    fn test_second_attach_is_ignored() {
        let (_lib, last) = run_with_keys(ControllerArgs::default(), &[Keycode::A, Keycode::A]);
        assert_eq!(last.connected, 1);
    }

    #[test]
    fn test_escape_binding_quits() {
        let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::EVENTS).unwrap();
        let mut game = Controller::new(ControllerArgs::default(), &options(), KeyBindings::new());
        sdl.push_event(Event::key_down(Keycode::ESCAPE)).unwrap();

        let run_options = RunOptions {
            escape_quits: false,
            ..RunOptions::default()
        };
        let stats = App::run(&sdl, &mut game, run_options).unwrap();
        assert_eq!(stats.frames, 0);
    }

    #[test]
    fn test_window_scaled_by_content_scale() {
        let lib = Rc::new(HeadlessLibrary::new());
        lib.set_content_scale(2.0);
        let sdl = Sdl::init(lib, InitFlags::EVENTS).unwrap();
        let mut game = Controller::new(ControllerArgs::default(), &options(), KeyBindings::new());

        let window = game.on_init(&sdl).unwrap();
        let size = window.size().unwrap();
        assert_eq!((size.w, size.h), (2124, 1216));
        assert!(sdl
            .was_init()
            .contains(InitFlags::VIDEO | InitFlags::JOYSTICK | InitFlags::GAMEPAD));
        assert_eq!(sdl.hint("JOYSTICK_HIDAPI").as_deref(), Some("1"));
    }

    #[test]
    fn test_frame_draws_texts_strip_and_image() {
        let (_lib, last) = run_with_keys(ControllerArgs { use_virtual: true }, &[]);
        let commands = &last.commands;

        assert_eq!(commands.first(), Some(&DrawCommand::Clear(Color::WHITE)));
        let strip: Vec<_> = commands
            .iter()
            .filter_map(|command| match command {
                DrawCommand::FillRects { color, rects } => Some((*color, rects[0])),
                _ => None,
            })
            .collect();
        assert_eq!(strip.len(), 10);
        assert_eq!(strip[0], (Color::GREEN, FRect::new(0.0, 400.0, 100.0, 100.0)));
        assert_eq!(strip[9], (Color::RED, FRect::new(90.0, 400.0, 100.0, 100.0)));

        assert!(commands.iter().any(|command| matches!(
            command,
            DrawCommand::DebugText { text, color, .. } if text == "Virtual Gamepad" && *color == Color::BLACK
        )));
        assert!(commands.iter().any(|command| matches!(
            command,
            DrawCommand::Copy { dst: Some(dst), .. } if *dst == FRect::new(275.0, 48.0, 512.0, 560.0)
        )));
    }
}
