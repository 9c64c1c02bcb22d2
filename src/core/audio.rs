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

//! Queued audio output
//!
//! Samples are interleaved `f32` in `[-1.0, 1.0]`. They are converted to the
//! device sample format and handed to the native queue; mixing and
//! resampling are left to the native library.

use super::context::Sdl;
use super::error::Result;
use super::handle::{Handle, NativeType};
use super::native::{AudioFormat, AudioSpec, NativeLibrary, RawHandle};

/// Marker for audio device handles
pub struct AudioDeviceKind;

impl NativeType for AudioDeviceKind {
    const KIND: &'static str = "audio device";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.close_audio_device(raw);
    }
}

/// Opened audio output device
///
/// Devices open paused; call [`AudioDevice::resume`] to start playback.
#[derive(Debug)]
pub struct AudioDevice {
    handle: Handle<AudioDeviceKind>,
    spec: AudioSpec,
}

impl AudioDevice {
    pub fn open(sdl: &Sdl, spec: AudioSpec) -> Result<AudioDevice> {
        let handle = Handle::acquire(sdl, |lib| lib.open_audio_device(&spec))?;
        log::info!(
            "Audio: opened device {:?} {} ch @ {} Hz",
            spec.format,
            spec.channels,
            spec.freq
        );
        Ok(Self { handle, spec })
    }

    pub fn spec(&self) -> AudioSpec {
        self.spec
    }

    pub fn pause(&self) -> Result<()> {
        self.handle
            .call("pause audio", |lib, raw| lib.pause_audio_device(raw, true))?;
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.handle
            .call("resume audio", |lib, raw| lib.pause_audio_device(raw, false))?;
        Ok(())
    }

    pub fn is_paused(&self) -> Result<bool> {
        self.handle.with(|lib, raw| lib.is_audio_device_paused(raw))
    }

    /// Queue interleaved samples for playback
    pub fn queue(&self, samples: &[f32]) -> Result<()> {
        match self.spec.format {
            AudioFormat::F32 => {
                let bytes: &[u8] = bytemuck::cast_slice(samples);
                self.handle
                    .call("queue audio", |lib, raw| lib.queue_audio(raw, bytes))?;
            }
            AudioFormat::S16 => {
                let converted: Vec<i16> = samples
                    .iter()
                    .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
                    .collect();
                let bytes: &[u8] = bytemuck::cast_slice(&converted);
                self.handle
                    .call("queue audio", |lib, raw| lib.queue_audio(raw, bytes))?;
            }
        }
        Ok(())
    }

    /// Bytes waiting to be played
    pub fn queued_bytes(&self) -> Result<usize> {
        self.handle
            .with(|lib, raw| lib.get_queued_audio_size(raw) as usize)
    }

    /// Drop all queued audio
    pub fn clear(&self) -> Result<()> {
        self.handle
            .call("clear audio", |lib, raw| lib.clear_queued_audio(raw))?;
        Ok(())
    }

    pub fn close(&self) {
        self.handle.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::InitFlags;
    use crate::core::error::SdlError;
    use crate::core::native::headless::{HeadlessLibrary, ResourceKind};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::AUDIO).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_queue_converts_to_device_format() {
        let (_lib, sdl) = setup();
        let f32_device = AudioDevice::open(&sdl, AudioSpec::default()).unwrap();
        f32_device.queue(&[0.0; 8]).unwrap();
        assert_eq!(f32_device.queued_bytes().unwrap(), 32);

        let s16_device = AudioDevice::open(
            &sdl,
            AudioSpec {
                format: AudioFormat::S16,
                ..AudioSpec::default()
            },
        )
        .unwrap();
        s16_device.queue(&[0.5; 8]).unwrap();
        assert_eq!(s16_device.queued_bytes().unwrap(), 16);
    }

    #[test]
    fn test_playback_drains_queue() {
        let (lib, sdl) = setup();
        let spec = AudioSpec {
            format: AudioFormat::F32,
            channels: 1,
            freq: 100,
        };
        let device = AudioDevice::open(&sdl, spec).unwrap();
        assert!(device.is_paused().unwrap());
        device.queue(&[0.25; 100]).unwrap();

        device.resume().unwrap();
        sdl.delay(500);
        assert_eq!(device.queued_bytes().unwrap(), 200);

        device.clear().unwrap();
        assert_eq!(device.queued_bytes().unwrap(), 0);

        device.close();
        assert!(matches!(
            device.queued_bytes(),
            Err(SdlError::InvalidState { what: "audio device" })
        ));
        assert_eq!(lib.destroy_calls(ResourceKind::AudioDevice), 1);
    }

    #[test]
    fn test_open_requires_audio_subsystem() {
        let sdl = Sdl::init(Rc::new(HeadlessLibrary::new()), InitFlags::VIDEO).unwrap();
        assert!(AudioDevice::open(&sdl, AudioSpec::default())
            .unwrap_err()
            .is_acquisition());
    }
}
