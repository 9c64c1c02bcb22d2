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

//! Device report
//!
//! Render drivers, the primary display, joysticks and cameras, printed as
//! text or JSON.

use crate::core::camera::{CameraInfo, Cameras};
use crate::core::context::{InitFlags, Sdl};
use crate::core::error::Result;
use crate::core::joystick::{guid_string, Joystick, JoystickId, Joysticks};
use crate::core::native::RendererInfo;
use clap::Args;
use serde::Serialize;
use std::fmt;

/// Arguments of the `info` subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct InfoArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RendererEntry {
    pub name: String,
    pub flags: Vec<String>,
    pub max_texture_width: i32,
    pub max_texture_height: i32,
}

impl From<&RendererInfo> for RendererEntry {
    fn from(info: &RendererInfo) -> Self {
        Self {
            name: info.name.clone(),
            flags: info
                .render_flags()
                .iter_names()
                .map(|(name, _)| name.to_lowercase())
                .collect(),
            max_texture_width: info.max_texture_width,
            max_texture_height: info.max_texture_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayEntry {
    pub id: u32,
    pub content_scale: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoystickEntry {
    pub id: JoystickId,
    pub name: String,
    pub guid: String,
    pub is_virtual: bool,
    pub is_gamepad: bool,
}

/// Everything `info` prints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoReport {
    pub renderers: Vec<RendererEntry>,
    pub display: Option<DisplayEntry>,
    pub joysticks: Vec<JoystickEntry>,
    pub cameras: Vec<CameraInfo>,
}

/// Query the library, starting the subsystems the report needs
pub fn collect(sdl: &Sdl) -> Result<InfoReport> {
    sdl.init_subsystem(InitFlags::VIDEO | InitFlags::JOYSTICK | InitFlags::GAMEPAD | InitFlags::CAMERA)?;

    let renderers = sdl
        .available_renderers()?
        .iter()
        .map(RendererEntry::from)
        .collect();

    // Headless setups may have no display
    let display = match sdl.primary_display() {
        Ok(id) => Some(DisplayEntry {
            id: id.0,
            content_scale: sdl.display_content_scale(id)?,
        }),
        Err(e) => {
            log::warn!("Info: {}", e);
            None
        }
    };

    let joysticks = Joysticks::connected(sdl)?
        .into_iter()
        .map(|id| {
            let joystick = Joystick::open(sdl, id)?;
            Ok(JoystickEntry {
                id,
                name: joystick.name()?,
                guid: guid_string(&joystick.guid()?),
                is_virtual: Joysticks::is_virtual(sdl, id),
                is_gamepad: Joysticks::is_gamepad(sdl, id),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(InfoReport {
        renderers,
        display,
        joysticks,
        cameras: Cameras::connected(sdl)?,
    })
}

impl fmt::Display for InfoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Render drivers: {}", self.renderers.len())?;
        for (index, renderer) in self.renderers.iter().enumerate() {
            writeln!(
                f,
                "  {}: {} [{}] max texture {}x{}",
                index,
                renderer.name,
                renderer.flags.join(", "),
                renderer.max_texture_width,
                renderer.max_texture_height
            )?;
        }

        match &self.display {
            Some(display) => writeln!(
                f,
                "Primary display: {} (scale {})",
                display.id, display.content_scale
            )?,
            None => writeln!(f, "Primary display: none")?,
        }

        writeln!(f, "Joysticks: {}", self.joysticks.len())?;
        for joystick in &self.joysticks {
            let mut tags = Vec::new();
            if joystick.is_virtual {
                tags.push("virtual");
            }
            if joystick.is_gamepad {
                tags.push("gamepad");
            }
            writeln!(
                f,
                "  ({}) {} {} [{}]",
                joystick.id,
                joystick.name,
                joystick.guid,
                tags.join(", ")
            )?;
        }

        writeln!(f, "Cameras: {}", self.cameras.len())?;
        for (index, camera) in self.cameras.iter().enumerate() {
            match camera.position.tag() {
                "" => writeln!(f, "  #{}: {}", index, camera.name)?,
                tag => writeln!(f, "  #{}: {} {}", index, tag, camera.name)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::native::HeadlessLibrary;
    use crate::core::native::VirtualJoystickDesc;
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::EVENTS).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_collect_starts_subsystems() {
        let (_lib, sdl) = setup();
        let report = collect(&sdl).unwrap();

        assert!(sdl.was_init().contains(InitFlags::VIDEO | InitFlags::CAMERA));
        assert!(!report.renderers.is_empty());
        assert!(report.joysticks.is_empty());
        assert_eq!(report.cameras.len(), 1);
        assert_eq!(report.cameras[0].name, "Headless Test Pattern Camera");
    }

    #[test]
    fn test_collect_lists_joysticks() {
        let (lib, sdl) = setup();
        lib.connect_joystick("Pad", 0x45e, 0x2ea, Some("ABC"));
        sdl.init_subsystem(InitFlags::JOYSTICK | InitFlags::GAMEPAD).unwrap();
        Joysticks::attach_virtual(&sdl, &VirtualJoystickDesc::default()).unwrap();

        let report = collect(&sdl).unwrap();
        assert_eq!(report.joysticks.len(), 2);
        let names: Vec<_> = report.joysticks.iter().map(|j| j.name.as_str()).collect();
        assert!(names.contains(&"Pad"));
        assert!(names.contains(&"Virtual Gamepad"));
        assert_eq!(report.joysticks.iter().filter(|j| j.is_virtual).count(), 1);
    }

    #[test]
    fn test_display_content_scale() {
        let (lib, sdl) = setup();
        lib.set_content_scale(1.5);
        let report = collect(&sdl).unwrap();
        assert_eq!(report.display.map(|d| d.content_scale), Some(1.5));
    }

    #[test]
    fn test_text_report() {
        let (_lib, sdl) = setup();
        let text = collect(&sdl).unwrap().to_string();
        assert!(text.starts_with("Render drivers: "));
        assert!(text.contains("Joysticks: 0\n"));
        assert!(text.contains("  #0: [front-facing] Headless Test Pattern Camera\n"));
    }

    #[test]
    fn test_json_report() {
        let (_lib, sdl) = setup();
        let report = collect(&sdl).unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["cameras"][0]["position"], "FrontFacing");
        assert!(value["renderers"].is_array());
    }
}
