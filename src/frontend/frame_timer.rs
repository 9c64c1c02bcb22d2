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

//! Frame timing module
//!
//! Frame pacing for the game loop. The timer is driven by millisecond
//! timestamps read from the library clock ([`Sdl::ticks`]), so it behaves
//! the same under the headless virtual clock and in realtime.
//!
//! [`Sdl::ticks`]: crate::core::context::Sdl::ticks

/// Frame timer for a fixed target frame rate
///
/// Tracks frame time and FPS, and determines when the next frame is due.
///
/// # Example
///
/// ```
/// use sdlkit::frontend::FrameTimer;
///
/// let mut timer = FrameTimer::new(60);
/// timer.tick(0);
///
/// assert!(!timer.should_run_frame(10));
/// assert_eq!(timer.time_until_next_frame(10), 7);
/// assert!(timer.should_run_frame(17));
/// ```
#[derive(Debug, Clone)]
pub struct FrameTimer {
    /// Target frame time in milliseconds
    target_frame_time: f64,
    /// Timestamp of the last executed frame, `None` before the first one
    last_frame: Option<u64>,
    /// Total number of frames executed
    frame_count: u64,
    /// Current FPS (frames per second)
    fps: f32,
    /// Duration of the last frame in milliseconds
    frame_time_ms: f32,
    /// Timestamp when FPS calculation started
    fps_start: u64,
    /// Frames since last FPS calculation
    fps_frame_count: u64,
}

impl FrameTimer {
    /// Create a new FrameTimer
    ///
    /// # Arguments
    ///
    /// * `target_fps` - Target frames per second (must be > 0)
    ///
    /// # Panics
    ///
    /// Panics if `target_fps` is 0
    ///
    /// # Example
    ///
    /// ```
    /// use sdlkit::frontend::FrameTimer;
    ///
    /// let timer = FrameTimer::new(60);
    /// assert_eq!(timer.fps(), 0.0); // No frames executed yet
    /// ```
    pub fn new(target_fps: u32) -> Self {
        assert!(target_fps > 0, "target_fps must be greater than 0");

        Self {
            target_frame_time: 1000.0 / target_fps as f64,
            last_frame: None,
            frame_count: 0,
            fps: 0.0,
            frame_time_ms: 0.0,
            fps_start: 0,
            fps_frame_count: 0,
        }
    }

    /// Target frame time in milliseconds
    #[inline]
    pub fn target_frame_time_ms(&self) -> f64 {
        self.target_frame_time
    }

    /// Update frame timing after executing a frame
    ///
    /// FPS is recomputed approximately once per second.
    ///
    /// # Arguments
    ///
    /// * `now_ms` - Current library time in milliseconds
    pub fn tick(&mut self, now_ms: u64) {
        let Some(last) = self.last_frame else {
            // First frame starts the measurement window
            self.last_frame = Some(now_ms);
            self.fps_start = now_ms;
            self.frame_count = 1;
            self.fps_frame_count = 1;
            return;
        };

        self.frame_time_ms = now_ms.saturating_sub(last) as f32;
        self.frame_count += 1;
        self.fps_frame_count += 1;

        let fps_elapsed = now_ms.saturating_sub(self.fps_start);
        if fps_elapsed >= 1000 {
            self.fps = self.fps_frame_count as f32 * 1000.0 / fps_elapsed as f32;
            log::trace!("FrameTimer: {:.1} fps", self.fps);
            self.fps_frame_count = 0;
            self.fps_start = now_ms;
        }

        self.last_frame = Some(now_ms);
    }

    /// Check if a new frame should be executed
    ///
    /// The first frame is always due.
    #[inline]
    pub fn should_run_frame(&self, now_ms: u64) -> bool {
        match self.last_frame {
            Some(last) => now_ms.saturating_sub(last) as f64 >= self.target_frame_time,
            None => true,
        }
    }

    /// Milliseconds to wait before the next frame is due
    ///
    /// Rounded up so that sleeping for the returned duration always lands
    /// on or after the due time. Returns 0 when a frame is already due.
    pub fn time_until_next_frame(&self, now_ms: u64) -> u64 {
        let Some(last) = self.last_frame else {
            return 0;
        };
        let due = last as f64 + self.target_frame_time;
        let remaining = due - now_ms as f64;
        if remaining <= 0.0 {
            0
        } else {
            remaining.ceil() as u64
        }
    }

    /// Most recent FPS measurement
    #[inline(always)]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Duration of the last frame in milliseconds
    #[inline(always)]
    pub fn frame_time_ms(&self) -> f32 {
        self.frame_time_ms
    }

    /// Total number of frames executed
    ///
    /// # Example
    ///
    /// ```
    /// use sdlkit::frontend::FrameTimer;
    ///
    /// let timer = FrameTimer::new(60);
    /// assert_eq!(timer.frame_count(), 0);
    /// ```
    #[inline(always)]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timer_new() {
        let timer = FrameTimer::new(60);
        assert_eq!(timer.fps(), 0.0);
        assert_eq!(timer.frame_time_ms(), 0.0);
        assert_eq!(timer.frame_count(), 0);
    }

    #[test]
    fn test_first_frame_is_due() {
        let timer = FrameTimer::new(60);
        assert!(timer.should_run_frame(0));
        assert_eq!(timer.time_until_next_frame(0), 0);
    }

    #[test]
    fn test_frame_timer_tick() {
        let mut timer = FrameTimer::new(60);
        timer.tick(100);
        timer.tick(120);
        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.frame_time_ms(), 20.0);
    }

    #[test]
    fn test_fps_calculation() {
        let mut timer = FrameTimer::new(50);
        for i in 0..=50u64 {
            timer.tick(i * 20);
        }
        assert_eq!(timer.frame_count(), 51);
        assert!((timer.fps() - 51.0).abs() < 0.01);
    }

    #[test]
    fn test_time_until_next_frame_rounds_up() {
        let mut timer = FrameTimer::new(60);
        timer.tick(1000);
        assert_eq!(timer.time_until_next_frame(1000), 17);
        assert_eq!(timer.time_until_next_frame(1016), 1);
        assert_eq!(timer.time_until_next_frame(1017), 0);
        assert_eq!(timer.time_until_next_frame(5000), 0);
    }

    #[test]
    #[should_panic(expected = "target_fps must be greater than 0")]
    fn test_zero_fps_panics() {
        let _ = FrameTimer::new(0);
    }

    #[test]
    fn test_frame_timer_default() {
        let timer = FrameTimer::default();
        assert_eq!(timer.frame_count(), 0);
        assert!((timer.target_frame_time_ms() - 16.666).abs() < 0.01);
    }
}
