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

//! Action registry
//!
//! Owns the scheduled actions of an application and ticks them once per
//! frame. Actions are addressed by generation-counted [`ActionHandle`]s: a
//! handle stops resolving as soon as its action is removed, even if the
//! slot is later reused.

use super::Action;

/// Handle to a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionHandle {
    index: u32,
    generation: u32,
}

struct Slot {
    generation: u32,
    action: Option<Action>,
}

/// Registry of scheduled actions
#[derive(Default)]
pub struct ActionRegistry {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an action and return its handle
    pub fn schedule(&mut self, action: Action) -> ActionHandle {
        self.len += 1;
        log::trace!("ActionRegistry: scheduled action {}", action.id().get());

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.action = Some(action);
            return ActionHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            action: Some(action),
        });
        ActionHandle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: ActionHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation && slot.action.is_some())
    }

    /// Whether the handle still refers to a scheduled action
    pub fn contains(&self, handle: ActionHandle) -> bool {
        self.slot(handle).is_some()
    }

    pub fn get(&self, handle: ActionHandle) -> Option<&Action> {
        self.slot(handle).and_then(|slot| slot.action.as_ref())
    }

    pub fn get_mut(&mut self, handle: ActionHandle) -> Option<&mut Action> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.action.as_mut())
    }

    /// Cancel and remove an action
    ///
    /// Returns `false` for a stale handle.
    pub fn cancel(&mut self, handle: ActionHandle) -> bool {
        match self.get_mut(handle) {
            Some(action) => {
                action.cancel();
                self.remove_at(handle.index);
                true
            }
            None => false,
        }
    }

    fn remove_at(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if slot.action.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index);
            self.len -= 1;
        }
    }

    /// Tick every action with the current time
    ///
    /// Actions that became inert are removed afterwards.
    ///
    /// # Returns
    ///
    /// Number of actions that fired
    pub fn tick_all(&mut self, now: f64) -> usize {
        let mut fired = 0;
        let mut inert = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            if let Some(action) = slot.action.as_mut() {
                if action.tick(now) {
                    fired += 1;
                }
                if action.is_inert() {
                    inert.push(index as u32);
                }
            }
        }

        for index in inert {
            self.remove_at(index);
        }
        fired
    }

    /// Number of scheduled actions
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every action; outstanding handles become stale
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() as u32 {
            self.remove_at(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut(f64) + 'static) {
        let count = Rc::new(Cell::new(0));
        let inner = count.clone();
        (count, move |_| inner.set(inner.get() + 1))
    }

    #[test]
    fn test_one_shot_is_pruned_after_firing() {
        let mut registry = ActionRegistry::new();
        let (count, callback) = counter();
        let handle = registry.schedule(Action::once(1.0, callback));

        registry.tick_all(0.0);
        assert!(registry.contains(handle));
        assert_eq!(registry.tick_all(1.0), 1);
        assert!(!registry.contains(handle));
        assert!(registry.is_empty());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_cancel_removes() {
        let mut registry = ActionRegistry::new();
        let (count, callback) = counter();
        let handle = registry.schedule(Action::repeating(1.0, callback));

        assert!(registry.cancel(handle));
        assert!(!registry.cancel(handle));
        registry.tick_all(0.0);
        registry.tick_all(5.0);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut registry = ActionRegistry::new();
        let first = registry.schedule(Action::repeating(1.0, |_| {}));
        registry.cancel(first);

        let second = registry.schedule(Action::repeating(1.0, |_| {}));
        assert!(registry.contains(second));
        assert!(!registry.contains(first));
        assert!(registry.get(first).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut registry = ActionRegistry::new();
        let handles: Vec<_> = (0..3)
            .map(|_| registry.schedule(Action::repeating(1.0, |_| {})))
            .collect();
        registry.clear();

        assert!(registry.is_empty());
        assert!(handles.iter().all(|&h| !registry.contains(h)));
    }

    #[test]
    fn test_tick_all_counts_fires() {
        let mut registry = ActionRegistry::new();
        let (fast, fast_cb) = counter();
        let (slow, slow_cb) = counter();
        registry.schedule(Action::repeating(1.0, fast_cb));
        registry.schedule(Action::repeating(3.0, slow_cb));

        let fired: usize = (0..=6).map(|t| registry.tick_all(t as f64)).sum();
        assert_eq!(fired, 8);
        assert_eq!(fast.get(), 6);
        assert_eq!(slow.get(), 2);
    }
}
