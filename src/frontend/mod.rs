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

//! Frontend module
//!
//! The game loop and the pieces around it.
//!
//! # Architecture
//!
//! - [`App`]: runs a [`Game`] frame by frame
//! - [`frame_timer`]: frame pacing driven by the library clock
//! - [`input`]: configurable key bindings for the test harnesses
//!
//! # Example
//!
//! ```
//! use sdlkit::core::context::{InitFlags, Sdl};
//! use sdlkit::core::error::Result;
//! use sdlkit::core::native::HeadlessLibrary;
//! use sdlkit::core::window::Window;
//! use sdlkit::frontend::{App, AppContext, Game, RunOptions};
//! use std::rc::Rc;
//!
//! struct Blank;
//!
//! impl Game for Blank {
//!     fn name(&self) -> &str {
//!         "blank"
//!     }
//!
//!     fn on_update(&mut self, _ctx: &mut AppContext, _window: &Window, _delta_ms: u64) -> Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::empty())?;
//! let options = RunOptions { frames: Some(3), ..RunOptions::default() };
//! let stats = App::run(&sdl, &mut Blank, options)?;
//! assert_eq!(stats.frames, 3);
//! # Ok::<(), sdlkit::SdlError>(())
//! ```

pub mod app;
pub mod frame_timer;
pub mod input;

pub use app::{App, AppContext, Game, RunOptions, RunStats, WindowProperties};
pub use frame_timer::FrameTimer;
pub use input::{ConfigError, HarnessCommand, KeyBindings};
