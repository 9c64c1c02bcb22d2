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

//! sdlkit: typed bindings and a test bench for a native multimedia library
//!
//! The crate wraps the C-style surface of a windowing/rendering/input
//! library in owned, typed resource wrappers and ships sample applications
//! built on top of them.
//!
//! # Architecture
//!
//! - [`core`]: the binding layer (native boundary, resource wrappers,
//!   events, timed actions)
//! - [`frontend`]: the game loop, frame pacing and key bindings
//! - [`testbench`]: the sample applications behind `sdlkit-testbench`
//!
//! # Example
//!
//! ```
//! use sdlkit::core::context::{InitFlags, Sdl};
//! use sdlkit::core::geometry::Color;
//! use sdlkit::core::native::HeadlessLibrary;
//! use sdlkit::core::renderer::RenderFlags;
//! use sdlkit::core::window::{Window, WindowFlags};
//! use std::rc::Rc;
//!
//! let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::VIDEO)?;
//! let window = Window::new(&sdl, "hello", 640, 480, WindowFlags::empty())?;
//! let renderer = window.create_renderer(None, RenderFlags::empty())?;
//! renderer.clear_with(Color::BLACK)?.present()?;
//! # Ok::<(), sdlkit::SdlError>(())
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`core::error::Result<T>`] which is an alias for
//! `Result<T, SdlError>`. Native failures carry a [`core::error::Diagnostic`]
//! with the native message and the call stack.

pub mod core;
pub mod frontend;
pub mod testbench;

// Re-export commonly used types
pub use core::context::{InitFlags, Sdl};
pub use core::error::{Result, SdlError};
