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

//! Camera capture
//!
//! Opening a camera may require user approval; frames only arrive once the
//! native library reports [`Permission::Approved`] (announced with an
//! `Event::CameraApproved`). Each acquired frame is lent out as a
//! [`CameraFrame`] guard and handed back to the camera when the guard drops.

use super::context::{InitFlags, Sdl};
use super::error::{Result, SdlError};
use super::geometry::Point;
use super::handle::{Handle, NativeType};
use super::native::{camera_position, CameraSpec, NativeLibrary, RawHandle};
use super::renderer::Renderer;
use super::surface::Surface;
use super::texture::Texture;
use serde::Serialize;

/// Camera device id (never 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CameraId(pub u32);

/// Where a camera points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CameraPosition {
    #[default]
    Unknown,
    FrontFacing,
    BackFacing,
}

impl CameraPosition {
    pub fn from_raw(raw: u32) -> CameraPosition {
        match raw {
            camera_position::FRONT_FACING => CameraPosition::FrontFacing,
            camera_position::BACK_FACING => CameraPosition::BackFacing,
            _ => CameraPosition::Unknown,
        }
    }

    /// Listing tag, empty for unknown positions
    pub fn tag(self) -> &'static str {
        match self {
            CameraPosition::FrontFacing => "[front-facing]",
            CameraPosition::BackFacing => "[back-facing]",
            CameraPosition::Unknown => "",
        }
    }
}

/// A connected camera
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraInfo {
    pub id: CameraId,
    pub name: String,
    pub position: CameraPosition,
}

/// Camera enumeration
pub struct Cameras;

impl Cameras {
    /// Connected cameras in device order
    pub fn connected(sdl: &Sdl) -> Result<Vec<CameraInfo>> {
        let lib = sdl.lib();
        let ids = lib.get_cameras();
        if ids.is_empty() && !sdl.was_init().contains(InitFlags::CAMERA) {
            return Err(SdlError::operation("list cameras", sdl.error()));
        }
        ids.into_iter()
            .map(|id| {
                let name = lib
                    .get_camera_name(id)
                    .ok_or_else(|| SdlError::operation("camera name", lib.get_error()))?;
                Ok(CameraInfo {
                    id: CameraId(id),
                    name,
                    position: CameraPosition::from_raw(lib.get_camera_position(id)),
                })
            })
            .collect()
    }

    /// Capture formats supported by a camera
    pub fn specs(sdl: &Sdl, id: CameraId) -> Vec<CameraSpec> {
        sdl.lib().get_camera_supported_formats(id.0)
    }

    /// First connected camera accepted by `predicate`
    pub fn matching(sdl: &Sdl, predicate: impl Fn(&CameraInfo) -> bool) -> Result<Option<CameraInfo>> {
        Ok(Self::connected(sdl)?.into_iter().find(|info| predicate(info)))
    }
}

/// Access permission state of an opened camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Pending,
    Approved,
    Denied,
}

/// Marker for camera handles
pub struct CameraKind;

impl NativeType for CameraKind {
    const KIND: &'static str = "camera";

    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
        lib.close_camera(raw);
    }
}

/// Opened camera
pub type Camera = Handle<CameraKind>;

/// A frame lent out by a camera
///
/// The frame surface is owned by the camera and handed back on drop.
pub struct CameraFrame<'a> {
    camera: &'a Camera,
    surface: Surface,
    timestamp_ns: u64,
}

impl CameraFrame<'_> {
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Capture time in nanoseconds
    pub fn timestamp_ns(&self) -> u64 {
        self.timestamp_ns
    }
}

impl Drop for CameraFrame<'_> {
    fn drop(&mut self) {
        if let (Ok(camera), Ok(frame)) = (self.camera.raw(), self.surface.raw()) {
            self.camera.sdl().lib().release_camera_frame(camera, frame);
        }
    }
}

impl Camera {
    /// Open a camera, with its preferred format when `spec` is `None`
    pub fn open(sdl: &Sdl, id: CameraId, spec: Option<&CameraSpec>) -> Result<Camera> {
        let camera = Self::acquire(sdl, |lib| lib.open_camera(id.0, spec))?;
        log::info!("Camera: opened device {}", id.0);
        Ok(camera)
    }

    pub fn permission(&self) -> Result<Permission> {
        self.with(|lib, raw| match lib.get_camera_permission_state(raw) {
            1 => Permission::Approved,
            0 => Permission::Pending,
            _ => Permission::Denied,
        })
    }

    /// Take the next frame, `None` when no new frame is ready
    pub fn acquire_frame(&self) -> Result<Option<CameraFrame<'_>>> {
        let mut timestamp_ns = 0;
        let frame = self.with(|lib, raw| lib.acquire_camera_frame(raw, &mut timestamp_ns))?;
        Ok(frame.map(|raw| CameraFrame {
            camera: self,
            surface: Surface::borrowed(self.sdl(), raw),
            timestamp_ns,
        }))
    }

    /// Blit the next frame onto `surface`
    ///
    /// Returns whether a frame was drawn.
    pub fn draw_to(&self, surface: &Surface) -> Result<bool> {
        match self.acquire_frame()? {
            Some(frame) => {
                frame.surface().blit_to(surface, Point::new(0, 0))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Upload the next frame into `texture`, creating or resizing it as needed
    ///
    /// Returns whether the texture received a new frame.
    pub fn stream_to(&self, texture: &mut Option<Texture>, renderer: &Renderer) -> Result<bool> {
        let Some(frame) = self.acquire_frame()? else {
            return Ok(false);
        };
        let size = frame.surface().size()?;
        let reuse = match texture.as_ref() {
            Some(existing) => existing.size()? == size,
            None => false,
        };
        if !reuse {
            log::debug!("Camera: streaming texture {}x{}", size.w, size.h);
            *texture = Some(renderer.create_texture(size.w, size.h)?);
        }
        if let Some(texture) = texture.as_ref() {
            texture.update_from_surface(frame.surface())?;
        }
        Ok(true)
    }

    pub fn close(&self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::Event;
    use crate::core::geometry::Size;
    use crate::core::native::headless::{HeadlessLibrary, ResourceKind, VirtualCamera};
    use crate::core::renderer::RenderFlags;
    use crate::core::window::{Window, WindowFlags};
    use std::rc::Rc;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::VIDEO | InitFlags::CAMERA).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_enumeration() {
        let (lib, sdl) = setup();
        lib.add_camera(VirtualCamera {
            name: "Rear Module".to_string(),
            position: camera_position::BACK_FACING,
            ..VirtualCamera::default()
        });

        let cameras = Cameras::connected(&sdl).unwrap();
        assert_eq!(cameras.len(), 2);
        assert_eq!(cameras[0].position, CameraPosition::FrontFacing);
        assert_eq!(cameras[1].position.tag(), "[back-facing]");

        let rear = Cameras::matching(&sdl, |info| info.name.contains("Rear")).unwrap();
        assert_eq!(rear.map(|info| info.name).as_deref(), Some("Rear Module"));
        assert!(Cameras::matching(&sdl, |info| info.name.contains("Nope"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_frame_guard_returns_frame() {
        let (_lib, sdl) = setup();
        let info = &Cameras::connected(&sdl).unwrap()[0];
        let camera = Camera::open(&sdl, info.id, None).unwrap();
        assert_eq!(camera.permission().unwrap(), Permission::Approved);
        assert_eq!(sdl.poll_event(), Some(Event::CameraApproved { which: info.id.0 }));

        {
            let frame = camera.acquire_frame().unwrap().unwrap();
            assert_eq!(frame.surface().size().unwrap(), Size::new(640, 480));
            assert!(camera.acquire_frame().unwrap().is_none());
        }
        assert!(camera.acquire_frame().unwrap().is_some());
    }

    #[test]
    fn test_denied_camera_never_delivers() {
        let (lib, sdl) = setup();
        lib.remove_cameras();
        let id = lib.add_camera(VirtualCamera {
            deny_permission: true,
            ..VirtualCamera::default()
        });
        let camera = Camera::open(&sdl, CameraId(id), None).unwrap();
        assert_eq!(camera.permission().unwrap(), Permission::Denied);
        assert!(!camera.draw_to(&Surface::new(&sdl, 4, 4).unwrap()).unwrap());
    }

    #[test]
    fn test_stream_to_creates_texture_once() {
        let (lib, sdl) = setup();
        let window = Window::new(&sdl, "camera", 640, 480, WindowFlags::empty()).unwrap();
        let renderer = window.create_renderer(None, RenderFlags::empty()).unwrap();
        let id = Cameras::connected(&sdl).unwrap()[0].id;
        let camera = Camera::open(&sdl, id, None).unwrap();

        let mut texture = None;
        assert!(camera.stream_to(&mut texture, &renderer).unwrap());
        assert!(camera.stream_to(&mut texture, &renderer).unwrap());

        let texture = texture.unwrap();
        assert_eq!(lib.live_count(ResourceKind::Texture), 1);
        assert_eq!(lib.texture_update_count(texture.raw().unwrap()), 2);
    }

    #[test]
    fn test_open_with_explicit_spec() {
        let (_lib, sdl) = setup();
        let id = Cameras::connected(&sdl).unwrap()[0].id;
        let spec = Cameras::specs(&sdl, id)[1];
        let camera = Camera::open(&sdl, id, Some(&spec)).unwrap();
        let frame = camera.acquire_frame().unwrap().unwrap();
        assert_eq!(frame.surface().size().unwrap(), Size::new(1280, 720));
    }

    #[test]
    fn test_open_with_oversized_spec_fails() {
        let (_lib, sdl) = setup();
        let id = Cameras::connected(&sdl).unwrap()[0].id;
        let spec = CameraSpec {
            width: 70_000,
            height: 70_000,
            ..Cameras::specs(&sdl, id)[0]
        };
        assert!(Camera::open(&sdl, id, Some(&spec)).unwrap_err().is_acquisition());
    }
}
