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

//! Generic resource wrapper
//!
//! [`Handle<K>`] owns one native resource of kind `K`. It is the single place
//! where native sentinels become [`SdlError`]s:
//!
//! - a null create/open result becomes [`SdlError::Acquisition`]
//! - a negative status becomes [`SdlError::Operation`]
//! - any call after [`Handle::release`] becomes [`SdlError::InvalidState`]
//!
//! The concrete wrappers (`Window`, `Renderer`, `Texture`, ...) are type
//! aliases of `Handle<K>` with their own inherent methods.

use super::context::Sdl;
use super::error::{Result, SdlError};
use super::native::{NativeLibrary, RawHandle};
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;

/// A kind of native resource
pub trait NativeType {
    /// Name used in errors and logs
    const KIND: &'static str;

    /// Free the native resource
    fn destroy(lib: &dyn NativeLibrary, raw: RawHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    /// Freed by the wrapper
    Owned,
    /// Owned by another native object (e.g. a window's surface)
    Borrowed,
}

/// Typed wrapper over one native handle
pub struct Handle<K: NativeType> {
    sdl: Sdl,
    raw: Cell<Option<RawHandle>>,
    ownership: Ownership,
    _kind: PhantomData<K>,
}

impl<K: NativeType> Handle<K> {
    /// Acquire a resource with a native create/open call
    ///
    /// # Arguments
    ///
    /// * `sdl` - Library context the resource belongs to
    /// * `create` - Native call returning the new handle, `None` on failure
    ///
    /// # Returns
    ///
    /// The owning wrapper, or `SdlError::Acquisition` with the native error
    pub(crate) fn acquire(
        sdl: &Sdl,
        create: impl FnOnce(&dyn NativeLibrary) -> Option<RawHandle>,
    ) -> Result<Self> {
        match create(sdl.lib()) {
            Some(raw) => {
                log::debug!("{}: acquired {:#x}", K::KIND, raw.get());
                Ok(Self {
                    sdl: sdl.clone(),
                    raw: Cell::new(Some(raw)),
                    ownership: Ownership::Owned,
                    _kind: PhantomData,
                })
            }
            None => Err(SdlError::acquisition(K::KIND, sdl.lib().get_error())),
        }
    }

    /// Wrap a handle owned by another native object
    ///
    /// The wrapper never frees it; `release` only forgets the handle.
    pub(crate) fn borrowed(sdl: &Sdl, raw: RawHandle) -> Self {
        Self {
            sdl: sdl.clone(),
            raw: Cell::new(Some(raw)),
            ownership: Ownership::Borrowed,
            _kind: PhantomData,
        }
    }

    /// The native handle, or `InvalidState` after release
    pub fn raw(&self) -> Result<RawHandle> {
        self.raw
            .get()
            .ok_or(SdlError::InvalidState { what: K::KIND })
    }

    /// Library context of this resource
    pub fn sdl(&self) -> &Sdl {
        &self.sdl
    }

    /// Whether the handle has been released
    pub fn is_released(&self) -> bool {
        self.raw.get().is_none()
    }

    /// Whether the wrapper frees the handle
    pub fn is_owned(&self) -> bool {
        self.ownership == Ownership::Owned
    }

    /// Run a native operation returning a status code
    ///
    /// A negative status maps to `SdlError::Operation` named `what`.
    pub(crate) fn call(
        &self,
        what: &'static str,
        op: impl FnOnce(&dyn NativeLibrary, RawHandle) -> i32,
    ) -> Result<i32> {
        let raw = self.raw()?;
        let lib = self.sdl.lib();
        let status = op(lib, raw);
        if status < 0 {
            return Err(SdlError::operation(what, lib.get_error()));
        }
        Ok(status)
    }

    /// Run a native query whose failure is a missing value
    pub(crate) fn query<T>(
        &self,
        what: &'static str,
        op: impl FnOnce(&dyn NativeLibrary, RawHandle) -> Option<T>,
    ) -> Result<T> {
        let raw = self.raw()?;
        let lib = self.sdl.lib();
        op(lib, raw).ok_or_else(|| SdlError::operation(what, lib.get_error()))
    }

    /// Run a native call that cannot fail on a live handle
    pub(crate) fn with<T>(&self, op: impl FnOnce(&dyn NativeLibrary, RawHandle) -> T) -> Result<T> {
        let raw = self.raw()?;
        Ok(op(self.sdl.lib(), raw))
    }

    /// Free the native resource
    ///
    /// Only the first call frees; later calls do nothing.
    pub fn release(&self) {
        if let Some(raw) = self.raw.take() {
            if self.ownership == Ownership::Owned {
                K::destroy(self.sdl.lib(), raw);
                log::debug!("{}: released {:#x}", K::KIND, raw.get());
            }
        }
    }

    /// Give up ownership without freeing
    ///
    /// Returns `None` if the handle was already released.
    pub fn into_raw(self) -> Option<RawHandle> {
        self.raw.take()
    }
}

impl<K: NativeType> Drop for Handle<K> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<K: NativeType> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::KIND)
            .field("raw", &self.raw.get().map(RawHandle::get))
            .field("ownership", &self.ownership)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::InitFlags;
    use crate::core::native::headless::{HeadlessLibrary, ResourceKind};
    use std::rc::Rc;

    struct TestSurfaceKind;

    impl NativeType for TestSurfaceKind {
        const KIND: &'static str = "test surface";

        fn destroy(lib: &dyn NativeLibrary, raw: RawHandle) {
            lib.destroy_surface(raw);
        }
    }

    type TestSurface = Handle<TestSurfaceKind>;

    fn setup() -> (Rc<HeadlessLibrary>, Sdl) {
        let lib = Rc::new(HeadlessLibrary::new());
        let sdl = Sdl::init(lib.clone(), InitFlags::empty()).unwrap();
        (lib, sdl)
    }

    #[test]
    fn test_acquire_failure_is_acquisition_error() {
        let (lib, sdl) = setup();
        lib.fail_next("create_surface");

        let err = TestSurface::acquire(&sdl, |lib| lib.create_surface(4, 4)).unwrap_err();
        assert!(err.is_acquisition());
        assert_eq!(
            err.to_string(),
            "Failed to acquire test surface: Injected failure in create_surface"
        );
    }

    #[test]
    fn test_double_release_frees_once() {
        let (lib, sdl) = setup();
        let surface = TestSurface::acquire(&sdl, |lib| lib.create_surface(4, 4)).unwrap();

        surface.release();
        surface.release();
        drop(surface);

        assert_eq!(lib.destroy_calls(ResourceKind::Surface), 1);
        assert_eq!(lib.live_count(ResourceKind::Surface), 0);
    }

    #[test]
    fn test_operation_after_release_is_invalid_state() {
        let (_lib, sdl) = setup();
        let surface = TestSurface::acquire(&sdl, |lib| lib.create_surface(4, 4)).unwrap();
        surface.release();

        let err = surface
            .call("fill", |lib, raw| lib.fill_surface_rect(raw, None, Default::default()))
            .unwrap_err();
        assert!(matches!(err, SdlError::InvalidState { what: "test surface" }));
        assert!(surface.is_released());
    }

    #[test]
    fn test_negative_status_is_operation_error() {
        let (_lib, sdl) = setup();
        let surface = TestSurface::acquire(&sdl, |lib| lib.create_surface(4, 4)).unwrap();

        let err = surface
            .call("read pixel", |lib, raw| {
                lib.read_surface_pixel(raw, 10, 10, &mut Default::default())
            })
            .unwrap_err();
        assert!(err.is_operation());
        assert_eq!(err.to_string(), "read pixel failed: Pixel 10,10 out of bounds");
    }

    #[test]
    fn test_into_raw_skips_destroy() {
        let (lib, sdl) = setup();
        let surface = TestSurface::acquire(&sdl, |lib| lib.create_surface(4, 4)).unwrap();

        let raw = surface.into_raw();
        assert!(raw.is_some());
        assert_eq!(lib.destroy_calls(ResourceKind::Surface), 0);
        assert_eq!(lib.live_count(ResourceKind::Surface), 1);
    }

    #[test]
    fn test_borrowed_handle_is_never_freed() {
        let (lib, sdl) = setup();
        let raw = lib.create_surface(2, 2).unwrap();

        let borrowed = TestSurface::borrowed(&sdl, raw);
        assert!(!borrowed.is_owned());
        drop(borrowed);

        assert_eq!(lib.destroy_calls(ResourceKind::Surface), 0);
    }
}
