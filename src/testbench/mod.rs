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

//! Test bench applications
//!
//! Sample programs exercising the bindings, selected by subcommand:
//!
//! - [`sprite`]: move N sprites around the screen as fast as possible
//! - [`controller`]: joystick and gamepad test harness
//! - [`camera`]: camera capture test harness
//! - [`info`]: list render drivers, displays and devices

pub mod camera;
pub mod controller;
pub mod info;
pub mod sprite;

use crate::core::context::{InitFlags, Sdl};
use crate::core::error::SdlError;
use crate::core::native::HeadlessLibrary;
use crate::frontend::app::{App, RunOptions};
use crate::frontend::input::{ConfigError, KeyBindings};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;

/// Test bench errors
#[derive(Debug, Error)]
pub enum TestbenchError {
    #[error(transparent)]
    Sdl(#[from] SdlError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Command line interface of `sdlkit-testbench`
#[derive(Parser, Debug)]
#[command(name = "sdlkit-testbench")]
#[command(author, version, about = "Sample applications for the sdlkit bindings")]
pub struct Cli {
    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every test
#[derive(Args, Debug, Clone)]
pub struct Options {
    /// Stop after N frames (0 runs until quit)
    #[arg(long, global = true, default_value_t = 0)]
    pub frames: u64,

    /// Target frame rate
    #[arg(long, global = true, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub fps: u32,

    /// Key bindings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Set a library hint, NAME=VALUE (repeatable)
    #[arg(long = "hint", global = true, value_parser = parse_hint)]
    pub hints: Vec<(String, String)>,

    /// Follow wall-clock time instead of the virtual clock
    #[arg(long, global = true)]
    pub realtime: bool,

    /// Directory containing the test images
    #[arg(long, global = true, default_value = "assets")]
    pub assets: PathBuf,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            frames: 0,
            fps: 60,
            config: None,
            hints: Vec::new(),
            realtime: false,
            assets: PathBuf::from("assets"),
        }
    }
}

impl Options {
    /// Loop parameters for [`App::run`]
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            frames: (self.frames > 0).then_some(self.frames),
            target_fps: self.fps,
            ..RunOptions::default()
        }
    }

    /// Native library selected by the clock option
    pub fn library(&self) -> Rc<HeadlessLibrary> {
        if self.realtime {
            Rc::new(HeadlessLibrary::realtime())
        } else {
            Rc::new(HeadlessLibrary::new())
        }
    }

    /// Apply the `--hint` values
    pub fn apply_hints(&self, sdl: &Sdl) {
        for (name, value) in &self.hints {
            if sdl.set_hint(name, value) {
                log::debug!("Hint {}={}", name, value);
            }
        }
    }

    /// Path of a test image
    pub fn asset(&self, name: &str) -> PathBuf {
        self.assets.join(name)
    }

    /// Key bindings from `--config`, or the defaults
    pub fn key_bindings(&self) -> Result<KeyBindings, ConfigError> {
        match &self.config {
            Some(path) => KeyBindings::load(path),
            None => Ok(KeyBindings::new()),
        }
    }
}

/// Parse a `NAME=VALUE` hint
fn parse_hint(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got \"{}\"", s)),
    }
}

/// Test to run
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Simple program: move N sprites around on the screen as fast as possible
    Sprite(sprite::SpriteArgs),
    /// Simple program to test the controller routines
    Controller(controller::ControllerArgs),
    /// Simple program to test the camera routines
    Camera(camera::CameraArgs),
    /// List render drivers, displays and devices
    Info(info::InfoArgs),
}

/// Logger configured from `RUST_LOG`, at `info` when it is unset
pub fn logger() -> env_logger::Builder {
    logger_from(env_logger::Env::default())
}

fn logger_from(env: env_logger::Env<'_>) -> env_logger::Builder {
    env_logger::Builder::from_env(env.default_filter_or("info"))
}

/// Run the selected test on a fresh library instance
pub fn run(cli: &Cli) -> Result<(), TestbenchError> {
    let options = &cli.options;
    let sdl = Sdl::init(options.library(), InitFlags::EVENTS)?;
    options.apply_hints(&sdl);

    match &cli.command {
        Command::Sprite(args) => {
            let mut game = sprite::Sprite::new(args.clone(), options);
            App::run(&sdl, &mut game, options.run_options())?;
        }
        Command::Controller(args) => {
            let bindings = options.key_bindings()?;
            let mut game = controller::Controller::new(args.clone(), options, bindings);
            let run_options = RunOptions {
                // Escape goes through the key bindings
                escape_quits: false,
                ..options.run_options()
            };
            App::run(&sdl, &mut game, run_options)?;
        }
        Command::Camera(args) => {
            let mut game = camera::CameraTest::new(args.clone());
            App::run(&sdl, &mut game, options.run_options())?;
        }
        Command::Info(args) => {
            let report = info::collect(&sdl)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_defaults_to_info() {
        let env = env_logger::Env::new().filter("SDLKIT_TEST_LOG_UNSET");
        assert_eq!(logger_from(env).build().filter(), log::LevelFilter::Info);
    }

    #[test]
    fn test_logger_follows_environment_filter() {
        std::env::set_var("SDLKIT_TEST_LOG_DEBUG", "debug");
        let env = env_logger::Env::new().filter("SDLKIT_TEST_LOG_DEBUG");
        assert_eq!(logger_from(env).build().filter(), log::LevelFilter::Debug);

        std::env::set_var("SDLKIT_TEST_LOG_WARN", "warn");
        let env = env_logger::Env::new().filter("SDLKIT_TEST_LOG_WARN");
        assert_eq!(logger_from(env).build().filter(), log::LevelFilter::Warn);
    }

    #[test]
    fn test_parse_hint() {
        assert_eq!(
            parse_hint("RENDER_VSYNC=1"),
            Ok(("RENDER_VSYNC".to_string(), "1".to_string()))
        );
        assert_eq!(parse_hint("EMPTY="), Ok(("EMPTY".to_string(), String::new())));
        assert!(parse_hint("novalue").is_err());
        assert!(parse_hint("=1").is_err());
    }

    #[test]
    fn test_cli_parses_shared_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sdlkit-testbench",
            "sprite",
            "--frames",
            "5",
            "--hint",
            "A=1",
            "--hint",
            "B=2",
            "--blend",
            "add",
            "20",
        ])
        .unwrap();

        assert_eq!(cli.options.frames, 5);
        assert_eq!(cli.options.hints.len(), 2);
        match cli.command {
            Command::Sprite(args) => assert_eq!(args.count, 20),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_run_options_zero_frames_runs_forever() {
        let options = Options::default();
        assert_eq!(options.run_options().frames, None);

        let options = Options {
            frames: 3,
            ..Options::default()
        };
        assert_eq!(options.run_options().frames, Some(3));
    }

    #[test]
    fn test_zero_fps_rejected() {
        assert!(Cli::try_parse_from(["sdlkit-testbench", "info", "--fps", "0"]).is_err());
    }

    #[test]
    fn test_info_runs() {
        let cli = Cli::try_parse_from(["sdlkit-testbench", "info", "--json"]).unwrap();
        run(&cli).unwrap();
    }
}
