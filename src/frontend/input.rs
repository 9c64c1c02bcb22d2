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

//! Key bindings for the test harnesses
//!
//! Maps keyboard keys to [`HarnessCommand`]s. Bindings can be saved to and
//! loaded from a TOML file:
//!
//! ```toml
//! [bindings]
//! A = "attach_virtual"
//! D = "detach_virtual"
//! 3 = "player_index:3"
//! Escape = "quit"
//! ```

use crate::core::event::{Event, Keycode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading or writing a key bindings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown key name in config: {0}")]
    UnknownKey(String),
}

/// Command a harness key can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HarnessCommand {
    /// Attach a virtual gamepad
    AttachVirtual,
    /// Detach the virtual gamepad
    DetachVirtual,
    /// Set the player index of the selected controller
    SetPlayerIndex(u8),
    /// Show the back of the gamepad image
    ToggleRearView,
    Quit,
}

impl fmt::Display for HarnessCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessCommand::AttachVirtual => f.write_str("attach_virtual"),
            HarnessCommand::DetachVirtual => f.write_str("detach_virtual"),
            HarnessCommand::SetPlayerIndex(index) => write!(f, "player_index:{}", index),
            HarnessCommand::ToggleRearView => f.write_str("toggle_rear_view"),
            HarnessCommand::Quit => f.write_str("quit"),
        }
    }
}

impl FromStr for HarnessCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attach_virtual" => Ok(HarnessCommand::AttachVirtual),
            "detach_virtual" => Ok(HarnessCommand::DetachVirtual),
            "toggle_rear_view" => Ok(HarnessCommand::ToggleRearView),
            "quit" => Ok(HarnessCommand::Quit),
            other => other
                .strip_prefix("player_index:")
                .and_then(|index| index.parse::<u8>().ok())
                .filter(|&index| index <= 9)
                .map(HarnessCommand::SetPlayerIndex)
                .ok_or_else(|| format!("unknown harness command \"{}\"", other)),
        }
    }
}

impl TryFrom<String> for HarnessCommand {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HarnessCommand> for String {
    fn from(command: HarnessCommand) -> Self {
        command.to_string()
    }
}

/// On-disk representation of the bindings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyBindingsFile {
    /// Key name to command
    pub bindings: BTreeMap<String, HarnessCommand>,
}

/// Keyboard to harness command mapping
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    mapping: HashMap<Keycode, HarnessCommand>,
}

impl KeyBindings {
    /// Default bindings
    ///
    /// A attaches and D detaches the virtual gamepad, digits set the
    /// player index, R toggles the rear view and Escape quits.
    pub fn new() -> Self {
        let mut mapping = HashMap::new();
        mapping.insert(Keycode::A, HarnessCommand::AttachVirtual);
        mapping.insert(Keycode::D, HarnessCommand::DetachVirtual);
        mapping.insert(Keycode::R, HarnessCommand::ToggleRearView);
        mapping.insert(Keycode::ESCAPE, HarnessCommand::Quit);
        for digit in 0..=9 {
            if let Some(key) = Keycode::digit(digit) {
                mapping.insert(key, HarnessCommand::SetPlayerIndex(digit));
            }
        }
        Self { mapping }
    }

    /// Bindings with no keys mapped
    pub fn empty() -> Self {
        Self {
            mapping: HashMap::new(),
        }
    }

    /// Load bindings from a TOML file
    ///
    /// Keys missing from the file are left unbound.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let file: KeyBindingsFile = toml::from_str(&contents)?;
        let bindings = Self::try_from(file)?;
        log::info!(
            "Loaded {} key bindings from {}",
            bindings.mapping.len(),
            path.as_ref().display()
        );
        Ok(bindings)
    }

    /// Load bindings from a file, falling back to the defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            log::info!("Using default key bindings ({})", e);
            Self::new()
        })
    }

    /// Save bindings to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Render the bindings as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self.to_file())?)
    }

    fn to_file(&self) -> KeyBindingsFile {
        KeyBindingsFile {
            bindings: self
                .mapping
                .iter()
                .map(|(key, &command)| (key.name(), command))
                .collect(),
        }
    }

    /// Command bound to a key
    pub fn command(&self, key: Keycode) -> Option<HarnessCommand> {
        self.mapping.get(&key).copied()
    }

    /// Command triggered by an event
    ///
    /// Only fresh key presses trigger commands; auto-repeat is ignored.
    pub fn command_for_event(&self, event: &Event) -> Option<HarnessCommand> {
        match *event {
            Event::KeyDown {
                keycode,
                repeat: false,
                ..
            } => self.command(keycode),
            _ => None,
        }
    }

    pub fn bind(&mut self, key: Keycode, command: HarnessCommand) {
        self.mapping.insert(key, command);
    }

    pub fn unbind(&mut self, key: Keycode) {
        self.mapping.remove(&key);
    }

    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// Commands reachable from more than one key
    ///
    /// Keys of each entry are sorted; entries are sorted by command.
    pub fn detect_conflicts(&self) -> Vec<(HarnessCommand, Vec<Keycode>)> {
        let mut conflicts: Vec<_> = self
            .keys_by_command()
            .into_iter()
            .filter(|(_, keys)| keys.len() > 1)
            .collect();
        conflicts.sort_by_key(|(command, _)| *command);
        conflicts
    }

    /// List of (command, key names) sorted by command name, for display
    pub fn listing(&self) -> Vec<(String, Vec<String>)> {
        let mut listing: Vec<_> = self
            .keys_by_command()
            .into_iter()
            .map(|(command, keys)| {
                (
                    command.to_string(),
                    keys.into_iter().map(Keycode::name).collect(),
                )
            })
            .collect();
        listing.sort_by(|a, b| a.0.cmp(&b.0));
        listing
    }

    fn keys_by_command(&self) -> HashMap<HarnessCommand, Vec<Keycode>> {
        let mut by_command: HashMap<HarnessCommand, Vec<Keycode>> = HashMap::new();
        for (&key, &command) in &self.mapping {
            by_command.entry(command).or_default().push(key);
        }
        for keys in by_command.values_mut() {
            keys.sort();
        }
        by_command
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<KeyBindingsFile> for KeyBindings {
    type Error = ConfigError;

    fn try_from(file: KeyBindingsFile) -> Result<Self, Self::Error> {
        let mut mapping = HashMap::new();
        for (name, command) in file.bindings {
            let key = Keycode::from_name(&name).ok_or_else(|| ConfigError::UnknownKey(name.clone()))?;
            if let Some(previous) = mapping.insert(key, command) {
                log::warn!(
                    "Key {} bound twice ({} and {}), keeping {}",
                    key,
                    previous,
                    command,
                    command
                );
            }
        }
        Ok(Self { mapping })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Keymod;
    use tempfile::TempDir;

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();

        assert_eq!(bindings.command(Keycode::A), Some(HarnessCommand::AttachVirtual));
        assert_eq!(bindings.command(Keycode::D), Some(HarnessCommand::DetachVirtual));
        assert_eq!(bindings.command(Keycode::R), Some(HarnessCommand::ToggleRearView));
        assert_eq!(bindings.command(Keycode::ESCAPE), Some(HarnessCommand::Quit));
        assert_eq!(bindings.command(Keycode::NUM_0), Some(HarnessCommand::SetPlayerIndex(0)));
        assert_eq!(bindings.command(Keycode::NUM_9), Some(HarnessCommand::SetPlayerIndex(9)));
        assert_eq!(bindings.command(Keycode::Z), None);
        assert_eq!(bindings.len(), 14);
    }

    #[test]
    fn test_repeat_does_not_trigger() {
        let bindings = KeyBindings::new();
        let repeat = Event::KeyDown {
            keycode: Keycode::A,
            keymod: Keymod::empty(),
            repeat: true,
        };
        assert_eq!(bindings.command_for_event(&repeat), None);
        assert_eq!(
            bindings.command_for_event(&Event::key_down(Keycode::A)),
            Some(HarnessCommand::AttachVirtual)
        );
        assert_eq!(bindings.command_for_event(&Event::Quit), None);
    }

    #[test]
    fn test_bind_and_unbind() {
        let mut bindings = KeyBindings::new();
        bindings.bind(Keycode::SPACE, HarnessCommand::ToggleRearView);
        bindings.unbind(Keycode::R);

        assert_eq!(bindings.command(Keycode::SPACE), Some(HarnessCommand::ToggleRearView));
        assert_eq!(bindings.command(Keycode::R), None);
        assert!(bindings.detect_conflicts().is_empty());
    }

    #[test]
    fn test_detect_conflicts() {
        let mut bindings = KeyBindings::new();
        bindings.bind(Keycode::Z, HarnessCommand::Quit);

        let conflicts = bindings.detect_conflicts();
        assert_eq!(conflicts.len(), 1);
        let (command, keys) = &conflicts[0];
        assert_eq!(*command, HarnessCommand::Quit);
        assert_eq!(keys, &vec![Keycode::ESCAPE, Keycode::Z]);
    }

    #[test]
    fn test_listing_is_sorted() {
        let bindings = KeyBindings::new();
        let listing = bindings.listing();
        let names: Vec<&str> = listing.iter().map(|(name, _)| name.as_str()).collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(listing
            .iter()
            .any(|(name, keys)| name == "quit" && keys == &vec!["Escape".to_string()]));
    }

    #[test]
    fn test_command_parsing() {
        assert_eq!("player_index:4".parse::<HarnessCommand>(), Ok(HarnessCommand::SetPlayerIndex(4)));
        assert!("player_index:12".parse::<HarnessCommand>().is_err());
        assert!("jump".parse::<HarnessCommand>().is_err());
        assert_eq!(HarnessCommand::ToggleRearView.to_string(), "toggle_rear_view");
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bindings.toml");

        let mut bindings = KeyBindings::new();
        bindings.bind(Keycode::SPACE, HarnessCommand::Quit);
        bindings.save(&path).unwrap();

        let loaded = KeyBindings::load(&path).unwrap();
        assert_eq!(loaded, bindings);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bindings.toml");
        std::fs::write(&path, "[bindings]\nq = \"quit\"\n5 = \"player_index:5\"\n").unwrap();

        let loaded = KeyBindings::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.command(Keycode::letter('q').unwrap()), Some(HarnessCommand::Quit));
        assert_eq!(loaded.command(Keycode::ESCAPE), None);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();

        let missing = KeyBindings::load(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));

        let bad_command = dir.path().join("bad_command.toml");
        std::fs::write(&bad_command, "[bindings]\nA = \"jump\"\n").unwrap();
        assert!(matches!(KeyBindings::load(&bad_command), Err(ConfigError::Parse(_))));

        let bad_key = dir.path().join("bad_key.toml");
        std::fs::write(&bad_key, "[bindings]\nF13 = \"quit\"\n").unwrap();
        assert!(matches!(KeyBindings::load(&bad_key), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn test_load_or_default_falls_back() {
        let dir = TempDir::new().unwrap();
        let bindings = KeyBindings::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(bindings, KeyBindings::new());
    }
}
