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

//! Application loop
//!
//! [`App::run`] drives a [`Game`]: it creates the window through
//! [`Game::on_init`], then runs frames until the game quits, the user
//! closes the window (or presses Escape) or the frame limit is reached.
//!
//! Each frame:
//!
//! 1. Drain pending events into [`Game::on_event`]
//! 2. Tick the scheduled actions with the current time in seconds
//! 3. Call [`Game::on_update`] with the milliseconds since the last frame
//! 4. Wait for the next frame with [`FrameTimer`] and [`Sdl::delay`]

use crate::core::action::{Action, ActionHandle, ActionRegistry};
use crate::core::context::{InitFlags, Sdl};
use crate::core::error::Result;
use crate::core::event::{Event, Keycode};
use crate::core::window::{Window, WindowFlags};
use crate::frontend::frame_timer::FrameTimer;

/// Window parameters used by the default [`Game::on_init`]
#[derive(Debug, Clone, PartialEq)]
pub struct WindowProperties {
    pub title: String,
    pub width: i32,
    pub height: i32,
    pub flags: WindowFlags,
}

impl Default for WindowProperties {
    fn default() -> Self {
        Self {
            title: "sdlkit".to_string(),
            width: 640,
            height: 480,
            flags: WindowFlags::empty(),
        }
    }
}

/// Loop parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunOptions {
    /// Stop after this many frames; `None` runs until quit
    pub frames: Option<u64>,
    /// Target frame rate
    pub target_fps: u32,
    /// Whether Escape ends the loop
    pub escape_quits: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            frames: None,
            target_fps: 60,
            escape_quits: true,
        }
    }
}

/// Per-run state shared with the game hooks
pub struct AppContext {
    sdl: Sdl,
    /// Scheduled timed actions, ticked once per frame
    pub actions: ActionRegistry,
    quit_requested: bool,
    frame: u64,
    fps: f32,
}

impl AppContext {
    fn new(sdl: Sdl) -> Self {
        Self {
            sdl,
            actions: ActionRegistry::new(),
            quit_requested: false,
            frame: 0,
            fps: 0.0,
        }
    }

    pub fn sdl(&self) -> &Sdl {
        &self.sdl
    }

    /// Schedule a timed action; its time unit is seconds
    pub fn schedule(&mut self, action: Action) -> ActionHandle {
        self.actions.schedule(action)
    }

    /// End the loop after the current frame
    pub fn quit(&mut self) {
        self.quit_requested = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Number of completed frames
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Most recent frame rate measurement
    pub fn fps(&self) -> f32 {
        self.fps
    }
}

/// A game driven by [`App::run`]
pub trait Game {
    /// Name used in log messages
    fn name(&self) -> &str;

    fn window_properties(&self) -> WindowProperties {
        WindowProperties::default()
    }

    /// Initialize subsystems and create the main window
    fn on_init(&mut self, sdl: &Sdl) -> Result<Window> {
        sdl.init_subsystem(InitFlags::VIDEO)?;
        let props = self.window_properties();
        Window::new(sdl, &props.title, props.width, props.height, props.flags)
    }

    /// Called once before the first frame
    fn on_ready(&mut self, _ctx: &mut AppContext, _window: &Window) -> Result<()> {
        Ok(())
    }

    /// Called once per frame
    fn on_update(&mut self, ctx: &mut AppContext, window: &Window, delta_ms: u64) -> Result<()>;

    fn on_event(&mut self, _ctx: &mut AppContext, _window: &Window, _event: &Event) -> Result<()> {
        Ok(())
    }

    /// Called once after the last frame, even when the loop failed
    fn on_shutdown(&mut self, _ctx: &mut AppContext) -> Result<()> {
        Ok(())
    }
}

/// Summary of a finished run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunStats {
    pub frames: u64,
    pub fps: f32,
    /// Library time when the loop ended, in milliseconds
    pub elapsed_ms: u64,
}

/// Game loop driver
pub struct App;

impl App {
    /// Run a game until it quits
    ///
    /// # Arguments
    ///
    /// * `sdl` - Initialized library context
    /// * `game` - Game to drive
    /// * `options` - Frame limit and pacing
    ///
    /// # Returns
    ///
    /// Run statistics, or the first error raised by a hook. If both the
    /// loop and [`Game::on_shutdown`] fail, the loop error is returned and
    /// the shutdown error is logged.
    pub fn run<G: Game + ?Sized>(sdl: &Sdl, game: &mut G, options: RunOptions) -> Result<RunStats> {
        log::info!("{}: starting", game.name());
        let window = game.on_init(sdl)?;
        let mut ctx = AppContext::new(sdl.clone());

        let result = Self::run_frames(&mut ctx, game, &window, options);
        let shutdown = game.on_shutdown(&mut ctx);
        ctx.actions.clear();

        let stats = RunStats {
            frames: ctx.frame,
            fps: ctx.fps,
            elapsed_ms: sdl.ticks(),
        };

        match (result, shutdown) {
            (Ok(()), Ok(())) => {
                log::info!("{}: finished after {} frames", game.name(), stats.frames);
                Ok(stats)
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(shutdown_error)) => {
                log::error!("{}: shutdown failed: {}", game.name(), shutdown_error);
                Err(e)
            }
        }
    }

    fn run_frames<G: Game + ?Sized>(
        ctx: &mut AppContext,
        game: &mut G,
        window: &Window,
        options: RunOptions,
    ) -> Result<()> {
        game.on_ready(ctx, window)?;

        let sdl = ctx.sdl.clone();
        let mut timer = FrameTimer::new(options.target_fps);
        let mut last = sdl.ticks();

        loop {
            if options.frames.is_some_and(|limit| ctx.frame >= limit) {
                break;
            }

            while let Some(event) = sdl.poll_event() {
                match event {
                    Event::Quit => ctx.quit(),
                    Event::KeyDown {
                        keycode: Keycode::ESCAPE,
                        ..
                    } if options.escape_quits => ctx.quit(),
                    _ => {}
                }
                game.on_event(ctx, window, &event)?;
            }
            if ctx.quit_requested {
                log::debug!("{}: quit requested", game.name());
                break;
            }

            let now = sdl.ticks();
            ctx.actions.tick_all(now as f64 / 1000.0);
            game.on_update(ctx, window, now.saturating_sub(last))?;
            last = now;

            timer.tick(now);
            ctx.frame += 1;
            ctx.fps = timer.fps();
            log::trace!("{}: frame {} done", game.name(), ctx.frame);

            if ctx.quit_requested {
                break;
            }

            let wait = timer.time_until_next_frame(sdl.ticks());
            if wait > 0 {
                sdl.delay(wait.min(u32::MAX as u64) as u32);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SdlError;
    use crate::core::native::HeadlessLibrary;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        updates: u64,
        events: Vec<Event>,
        shutdowns: u32,
        fail_update_at: Option<u64>,
        quit_at: Option<u64>,
        fail_shutdown: bool,
        deltas: Vec<u64>,
    }

    impl Game for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_update(&mut self, ctx: &mut AppContext, _window: &Window, delta_ms: u64) -> Result<()> {
            self.updates += 1;
            self.deltas.push(delta_ms);
            if self.fail_update_at == Some(self.updates) {
                return Err(SdlError::custom("update failed"));
            }
            if self.quit_at == Some(self.updates) {
                ctx.quit();
            }
            Ok(())
        }

        fn on_event(&mut self, _ctx: &mut AppContext, _window: &Window, event: &Event) -> Result<()> {
            self.events.push(*event);
            Ok(())
        }

        fn on_shutdown(&mut self, _ctx: &mut AppContext) -> Result<()> {
            self.shutdowns += 1;
            if self.fail_shutdown {
                return Err(SdlError::custom("shutdown failed"));
            }
            Ok(())
        }
    }

    fn context() -> Sdl {
        Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::EVENTS).unwrap()
    }

    fn frames(n: u64) -> RunOptions {
        RunOptions {
            frames: Some(n),
            ..RunOptions::default()
        }
    }

    #[test]
    fn test_runs_requested_frames() {
        let sdl = context();
        let mut game = Recorder::default();
        let stats = App::run(&sdl, &mut game, frames(10)).unwrap();

        assert_eq!(stats.frames, 10);
        assert_eq!(game.updates, 10);
        assert_eq!(game.shutdowns, 1);
        // virtual clock advances by whole-millisecond frame waits
        assert_eq!(game.deltas[0], 0);
        assert!(game.deltas[1..].iter().all(|&d| d == 17));
        assert_eq!(stats.elapsed_ms, 9 * 17 + 17);
    }

    #[test]
    fn test_quit_event_ends_loop() {
        let sdl = context();
        sdl.push_event(Event::Quit).unwrap();
        let mut game = Recorder::default();
        let stats = App::run(&sdl, &mut game, RunOptions::default()).unwrap();

        assert_eq!(stats.frames, 0);
        assert_eq!(game.events, vec![Event::Quit]);
        assert_eq!(game.shutdowns, 1);
    }

    #[test]
    fn test_escape_ends_loop_unless_disabled() {
        let sdl = context();
        sdl.push_event(Event::key_down(Keycode::ESCAPE)).unwrap();
        let mut game = Recorder::default();
        App::run(&sdl, &mut game, RunOptions::default()).unwrap();
        assert_eq!(game.updates, 0);

        sdl.push_event(Event::key_down(Keycode::ESCAPE)).unwrap();
        let mut game = Recorder::default();
        let options = RunOptions {
            escape_quits: false,
            ..frames(3)
        };
        App::run(&sdl, &mut game, options).unwrap();
        assert_eq!(game.updates, 3);
        assert_eq!(game.events.len(), 1);
    }

    #[test]
    fn test_game_quit() {
        let sdl = context();
        let mut game = Recorder {
            quit_at: Some(4),
            ..Recorder::default()
        };
        let stats = App::run(&sdl, &mut game, RunOptions::default()).unwrap();
        assert_eq!(stats.frames, 4);
    }

    #[test]
    fn test_shutdown_runs_after_update_error() {
        let sdl = context();
        let mut game = Recorder {
            fail_update_at: Some(2),
            fail_shutdown: true,
            ..Recorder::default()
        };
        let err = App::run(&sdl, &mut game, frames(10)).unwrap_err();

        assert_eq!(err.to_string(), "update failed");
        assert_eq!(game.shutdowns, 1);
    }

    #[test]
    fn test_actions_tick_in_seconds() {
        struct Scheduler {
            fired: Rc<Cell<u32>>,
        }

        impl Game for Scheduler {
            fn name(&self) -> &str {
                "scheduler"
            }

            fn on_ready(&mut self, ctx: &mut AppContext, _window: &Window) -> Result<()> {
                let fired = self.fired.clone();
                ctx.schedule(Action::repeating(0.5, move |_| fired.set(fired.get() + 1)));
                Ok(())
            }

            fn on_update(&mut self, _ctx: &mut AppContext, _window: &Window, _delta_ms: u64) -> Result<()> {
                Ok(())
            }
        }

        let sdl = context();
        let fired = Rc::new(Cell::new(0));
        let mut game = Scheduler { fired: fired.clone() };
        // 60 frames at 17 ms span 1003 ms
        App::run(&sdl, &mut game, frames(60)).unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_init_failure_skips_loop() {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::EVENTS).unwrap();
        lib.fail_next("create_window");

        let mut game = Recorder::default();
        let err = App::run(&sdl, &mut game, frames(1)).unwrap_err();
        assert!(err.is_acquisition());
        assert_eq!(game.shutdowns, 0);
    }
}
