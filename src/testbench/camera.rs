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

//! Camera test
//!
//! Lists the connected cameras, opens the first one (or the one whose name
//! contains `--camera`) and shows its frames, either by blitting onto the
//! window surface or, with `--accelerated`, by streaming into a texture.

use crate::core::camera::{Camera, CameraInfo, Cameras};
use crate::core::context::{InitFlags, Sdl};
use crate::core::error::{Result, SdlError};
use crate::core::event::Event;
use crate::core::geometry::{Color, FRect};
use crate::core::native::CameraSpec;
use crate::core::renderer::{RenderFlags, Renderer};
use crate::core::texture::Texture;
use crate::core::window::Window;
use crate::frontend::app::{AppContext, Game, WindowProperties};
use clap::Args;

/// Arguments of the `camera` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct CameraArgs {
    /// Name of the camera to use
    #[arg(long = "camera")]
    pub camera: Option<String>,

    /// Use hardware accelerated rendering
    #[arg(short = 'a', long)]
    pub accelerated: bool,
}

/// Device listing printed at startup
pub fn camera_listing(cameras: &[CameraInfo]) -> Vec<String> {
    let plural = if cameras.len() == 1 { "" } else { "s" };
    let mut lines = vec![format!("Saw {} camera device{}.", cameras.len(), plural)];
    lines.extend(
        cameras
            .iter()
            .enumerate()
            .map(|(idx, camera)| format!("  - Camera #{}: {} {}", idx, camera.position.tag(), camera.name)),
    );
    lines
}

/// Format listing of the selected camera
pub fn spec_listing(specs: &[CameraSpec]) -> Vec<String> {
    let mut lines = vec!["Available formats:".to_string()];
    lines.extend(specs.iter().map(|spec| {
        format!(
            "    {}x{} {} FPS {}",
            spec.width,
            spec.height,
            spec.frames_per_second(),
            spec.format.name()
        )
    }));
    lines
}

/// The camera test
pub struct CameraTest {
    args: CameraArgs,
    camera: Option<Camera>,
    renderer: Option<Renderer>,
    texture: Option<Texture>,
    frames_shown: u64,
}

impl CameraTest {
    pub fn new(args: CameraArgs) -> Self {
        Self {
            args,
            camera: None,
            renderer: None,
            texture: None,
            frames_shown: 0,
        }
    }

    /// Number of camera frames that reached the screen
    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }

    fn select(&self, sdl: &Sdl) -> Result<Option<CameraInfo>> {
        let wanted = self.args.camera.as_deref().filter(|name| !name.is_empty());
        let found = Cameras::matching(sdl, |camera| match wanted {
            Some(name) => camera.name.contains(name),
            None => true,
        })?;

        let Some(name) = wanted else {
            return Ok(found);
        };
        match found {
            Some(camera) => {
                for line in spec_listing(&Cameras::specs(sdl, camera.id)) {
                    println!("{}", line);
                }
                Ok(Some(camera))
            }
            None => Err(SdlError::custom(format!("Could not find camera \"{}\"", name))),
        }
    }

    fn draw_surface(&mut self, window: &Window) -> Result<()> {
        let surface = window.surface()?;
        surface.clear(Color::GRAY)?;
        if let Some(camera) = &self.camera {
            if camera.draw_to(&surface)? {
                self.frames_shown += 1;
            }
        }
        window.update_surface()
    }

    fn draw_accelerated(&mut self, window: &Window) -> Result<()> {
        if self.renderer.is_none() {
            self.renderer = Some(window.create_renderer(None, RenderFlags::empty())?);
        }
        let Some(renderer) = &self.renderer else {
            return Ok(());
        };

        let (w, h) = renderer.output_size()?.to_f32();
        if let Some(camera) = &self.camera {
            if camera.stream_to(&mut self.texture, renderer)? {
                self.frames_shown += 1;
            }
        }
        if let Some(texture) = &self.texture {
            renderer.draw_texture(texture, FRect::new(0.0, 0.0, w, h))?;
        }
        renderer.present()
    }
}

impl Game for CameraTest {
    fn name(&self) -> &str {
        "Camera test"
    }

    fn window_properties(&self) -> WindowProperties {
        WindowProperties {
            title: "sdlkit test: Camera".to_string(),
            ..WindowProperties::default()
        }
    }

    fn on_ready(&mut self, ctx: &mut AppContext, _window: &Window) -> Result<()> {
        let sdl = ctx.sdl();
        sdl.init_subsystem(InitFlags::CAMERA)?;

        for line in camera_listing(&Cameras::connected(sdl)?) {
            println!("{}", line);
        }

        if let Some(info) = self.select(sdl)? {
            log::info!("Camera test: using {}", info.name);
            self.camera = Some(Camera::open(sdl, info.id, None)?);
        }
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut AppContext, window: &Window, _delta_ms: u64) -> Result<()> {
        if self.args.accelerated {
            self.draw_accelerated(window)
        } else {
            self.draw_surface(window)
        }
    }

    fn on_event(&mut self, _ctx: &mut AppContext, _window: &Window, event: &Event) -> Result<()> {
        match event {
            Event::CameraApproved { .. } => println!("Camera approved!"),
            Event::CameraDenied { .. } => println!("Camera denied"),
            _ => {}
        }
        Ok(())
    }

    fn on_shutdown(&mut self, _ctx: &mut AppContext) -> Result<()> {
        self.texture = None;
        if let Some(camera) = self.camera.take() {
            camera.close();
        }
        self.renderer = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::{CameraId, CameraPosition, Permission};
    use crate::core::native::headless::{ResourceKind, VirtualCamera};
    use crate::core::native::{camera_position, HeadlessLibrary, PixelFormat};
    use crate::frontend::app::{App, RunOptions};
    use std::rc::Rc;

    fn frames(n: u64) -> RunOptions {
        RunOptions {
            frames: Some(n),
            ..RunOptions::default()
        }
    }

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::EVENTS).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_camera_listing() {
        let cameras = vec![
            CameraInfo {
                id: CameraId(1),
                name: "Front".to_string(),
                position: CameraPosition::FrontFacing,
            },
            CameraInfo {
                id: CameraId(2),
                name: "USB".to_string(),
                position: CameraPosition::Unknown,
            },
        ];
        assert_eq!(
            camera_listing(&cameras),
            vec![
                "Saw 2 camera devices.",
                "  - Camera #0: [front-facing] Front",
                "  - Camera #1:  USB",
            ]
        );
        assert_eq!(camera_listing(&cameras[..1])[0], "Saw 1 camera device.");
    }

    #[test]
    fn test_spec_listing() {
        let spec = CameraSpec {
            format: PixelFormat::NV12,
            width: 1280,
            height: 720,
            framerate_numerator: 30,
            framerate_denominator: 1,
        };
        assert_eq!(
            spec_listing(&[spec]),
            vec!["Available formats:", "    1280x720 30 FPS SDL_PIXELFORMAT_NV12"]
        );
    }

    #[test]
    fn test_unknown_camera_name_fails() {
        let (_lib, sdl) = setup();
        let mut game = CameraTest::new(CameraArgs {
            camera: Some("Nonexistent".to_string()),
            accelerated: false,
        });
        let err = App::run(&sdl, &mut game, frames(1)).unwrap_err();
        assert_eq!(err.to_string(), "Could not find camera \"Nonexistent\"");
    }

    #[test]
    fn test_name_match_selects_camera() {
        let (lib, sdl) = setup();
        lib.add_camera(VirtualCamera {
            name: "Rear Module".to_string(),
            position: camera_position::BACK_FACING,
            ..VirtualCamera::default()
        });
        let mut game = CameraTest::new(CameraArgs {
            camera: Some("Rear".to_string()),
            accelerated: false,
        });
        App::run(&sdl, &mut game, frames(3)).unwrap();
        assert_eq!(game.frames_shown(), 3);
        assert_eq!(lib.live_count(ResourceKind::Camera), 0);
    }

    #[test]
    fn test_surface_path_updates_window() {
        let (lib, sdl) = setup();
        let mut game = CameraTest::new(CameraArgs::default());

        struct Recorder<'a> {
            inner: &'a mut CameraTest,
            lib: Rc<HeadlessLibrary>,
            updates: u64,
        }

        impl Game for Recorder<'_> {
            fn name(&self) -> &str {
                "recorder"
            }

            fn on_ready(&mut self, ctx: &mut AppContext, window: &Window) -> Result<()> {
                self.inner.on_ready(ctx, window)
            }

            fn on_update(&mut self, ctx: &mut AppContext, window: &Window, delta_ms: u64) -> Result<()> {
                self.inner.on_update(ctx, window, delta_ms)?;
                self.updates = self.lib.surface_update_count(window.raw()?);
                Ok(())
            }

            fn on_shutdown(&mut self, ctx: &mut AppContext) -> Result<()> {
                self.inner.on_shutdown(ctx)
            }
        }

        let mut recorder = Recorder {
            inner: &mut game,
            lib,
            updates: 0,
        };
        App::run(&sdl, &mut recorder, frames(4)).unwrap();
        assert_eq!(recorder.updates, 4);
        assert_eq!(game.frames_shown(), 4);
    }

    #[test]
    fn test_accelerated_path_streams_texture() {
        let (lib, sdl) = setup();
        let mut game = CameraTest::new(CameraArgs {
            camera: None,
            accelerated: true,
        });
        App::run(&sdl, &mut game, frames(5)).unwrap();

        assert_eq!(game.frames_shown(), 5);
        // texture and renderer released at shutdown
        assert_eq!(lib.live_count(ResourceKind::Texture), 0);
        assert_eq!(lib.live_count(ResourceKind::Renderer), 0);
    }

    #[test]
    fn test_denied_camera_shows_nothing() {
        let (lib, sdl) = setup();
        lib.remove_cameras();
        lib.add_camera(VirtualCamera {
            deny_permission: true,
            ..VirtualCamera::default()
        });
        let mut game = CameraTest::new(CameraArgs::default());

        App::run(&sdl, &mut game, frames(3)).unwrap();
        assert_eq!(game.frames_shown(), 0);
    }

    #[test]
    fn test_open_reports_permission() {
        let (_lib, sdl) = setup();
        sdl.init_subsystem(InitFlags::CAMERA).unwrap();
        let info = Cameras::matching(&sdl, |_| true).unwrap().unwrap();
        let camera = Camera::open(&sdl, info.id, None).unwrap();
        assert_eq!(camera.permission().unwrap(), Permission::Approved);
    }

    #[test]
    fn test_no_cameras_still_runs() {
        let (lib, sdl) = setup();
        lib.remove_cameras();
        let mut game = CameraTest::new(CameraArgs::default());
        App::run(&sdl, &mut game, frames(2)).unwrap();
        assert_eq!(game.frames_shown(), 0);
    }
}
