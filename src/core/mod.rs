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

//! Core binding layer
//!
//! - [`native`]: the C-style native boundary and the headless implementation
//! - [`context`]: library initialization and shutdown ([`context::Sdl`])
//! - [`handle`]: the generic resource wrapper
//! - [`window`], [`renderer`], [`texture`], [`surface`]: video
//! - [`joystick`], [`camera`], [`audio`], [`event`]: devices and input
//! - [`action`]: timed actions and their registry
//! - [`geometry`], [`error`]: shared value and error types

pub mod action;
pub mod audio;
pub mod camera;
pub mod context;
pub mod error;
pub mod event;
pub mod geometry;
pub mod handle;
pub mod joystick;
pub mod native;
pub mod renderer;
pub mod surface;
pub mod texture;
pub mod window;
