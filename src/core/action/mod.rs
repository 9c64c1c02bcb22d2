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

//! Timed actions
//!
//! An [`Action`] is a unit of work that fires on a cadence derived from the
//! time values it is ticked with. Time is whatever unit the driver uses
//! (the frontend ticks with seconds); the action only compares differences.
//!
//! # State machine
//!
//! ```text
//!   Active-Waiting --(remaining <= 0)--> Active-Due --fire--> Active-Waiting
//!         |                                   |                  (repeating)
//!         |                                   +--fire--> Inert  (one-shot)
//!         +--cancel()--> Inert
//! ```
//!
//! The first tick only records the baseline time and arms the countdown.
//! Every later tick subtracts `(now - previous) * speed` from the remaining
//! time; when it reaches zero the callback receives the elapsed delta of
//! that tick and the countdown restarts from the full interval.
//!
//! # Example
//!
//! ```
//! use sdlkit::core::action::Action;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let fired = Rc::new(Cell::new(0));
//! let counter = fired.clone();
//! let mut action = Action::repeating(100.0, move |_delta| counter.set(counter.get() + 1));
//!
//! action.tick(0.0); // baseline
//! action.tick(50.0);
//! assert_eq!(fired.get(), 0);
//! action.tick(150.0);
//! assert_eq!(fired.get(), 1);
//! assert_eq!(action.remaining(), 100.0);
//! ```

mod registry;

pub use registry::{ActionHandle, ActionRegistry};

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of action identities
static NEXT_ACTION_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActionId(u64);

impl ActionId {
    fn next() -> Self {
        ActionId(NEXT_ACTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Callback invoked with the elapsed time of the firing tick
pub type ActionCallback = Box<dyn FnMut(f64)>;

/// A repeatable or one-shot timed unit of work
pub struct Action {
    id: ActionId,
    repeats: bool,
    speed: f64,
    interval: f64,
    callback: Option<ActionCallback>,
    cancelled: bool,
    /// Time of the previous tick, `None` before the baseline tick
    previous: Option<f64>,
    remaining: f64,
    fire_count: u64,
}

impl Action {
    /// Create an action
    ///
    /// # Arguments
    ///
    /// * `repeats` - Fire every interval instead of once
    /// * `speed` - Multiplier applied to elapsed time
    /// * `interval` - Time between fires; negative values are treated as 0
    /// * `callback` - Work to run, receives the elapsed time of the firing tick
    pub fn new(repeats: bool, speed: f64, interval: f64, callback: impl FnMut(f64) + 'static) -> Self {
        let interval = interval.max(0.0);
        Self {
            id: ActionId::next(),
            repeats,
            speed,
            interval,
            callback: Some(Box::new(callback)),
            cancelled: false,
            previous: None,
            remaining: interval,
            fire_count: 0,
        }
    }

    /// Repeating action at normal speed
    pub fn repeating(interval: f64, callback: impl FnMut(f64) + 'static) -> Self {
        Self::new(true, 1.0, interval, callback)
    }

    /// One-shot action at normal speed
    pub fn once(delay: f64, callback: impl FnMut(f64) + 'static) -> Self {
        Self::new(false, 1.0, delay, callback)
    }

    #[inline]
    pub fn id(&self) -> ActionId {
        self.id
    }

    #[inline]
    pub fn repeats(&self) -> bool {
        self.repeats
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Change the time multiplier; applies from the next tick
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    #[inline]
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Time left before the next fire
    #[inline]
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Time of the previous tick
    #[inline]
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// How many times the callback ran
    #[inline]
    pub fn fire_count(&self) -> u64 {
        self.fire_count
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Whether the action can never fire again
    #[inline]
    pub fn is_inert(&self) -> bool {
        self.cancelled || self.callback.is_none()
    }

    /// Stop the action for good
    ///
    /// Calling it again has no further effect.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::trace!("Action {}: cancelled", self.id.0);
        }
        self.cancelled = true;
    }

    /// Advance the action to time `now`
    ///
    /// # Returns
    ///
    /// `true` if the callback ran during this tick
    pub fn tick(&mut self, now: f64) -> bool {
        if self.is_inert() {
            return false;
        }

        let Some(previous) = self.previous else {
            self.previous = Some(now);
            self.remaining = self.interval;
            return false;
        };

        let delta = now - previous;
        self.remaining -= delta * self.speed;
        self.previous = Some(now);

        if self.remaining > 0.0 {
            return false;
        }

        if let Some(callback) = self.callback.as_mut() {
            callback(delta);
        }
        self.fire_count += 1;
        self.remaining = self.interval;

        if !self.repeats {
            self.callback = None;
        }
        true
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Action {}

impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("id", &self.id.0)
            .field("repeats", &self.repeats)
            .field("speed", &self.speed)
            .field("interval", &self.interval)
            .field("remaining", &self.remaining)
            .field("previous", &self.previous)
            .field("cancelled", &self.cancelled)
            .field("inert", &self.is_inert())
            .finish()
    }
}
