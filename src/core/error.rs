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

//! Error types for the binding layer
//!
//! Native calls report failure through sentinel values (a null handle or a
//! negative return code) and a separate "last error" string. Every such
//! failure is turned into an [`SdlError`] that carries a [`Diagnostic`]:
//! the native message plus the call stack at the moment of failure.

use std::backtrace::Backtrace;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for binding operations
pub type Result<T> = std::result::Result<T, SdlError>;

/// Diagnostic context captured when a native call fails
///
/// The backtrace honours `RUST_BACKTRACE`; when capture is disabled only the
/// native message is available.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    message: String,
    backtrace: Arc<Backtrace>,
}

impl Diagnostic {
    /// Capture a diagnostic for the given native error message
    pub fn capture(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Native error message reported by the library
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Call stack at the time of failure
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str("unknown native error")
        } else {
            f.write_str(&self.message)
        }
    }
}

/// Binding layer error types
#[derive(Debug, Error)]
pub enum SdlError {
    /// A create/open call returned a null handle
    #[error("Failed to acquire {what}: {context}")]
    Acquisition {
        what: &'static str,
        context: Diagnostic,
    },

    /// A call on an acquired resource returned a failure code
    #[error("{what} failed: {context}")]
    Operation {
        what: &'static str,
        context: Diagnostic,
    },

    /// The resource was already released
    #[error("{what} used after release")]
    InvalidState { what: &'static str },

    /// Application-level failure
    #[error("{0}")]
    Custom(String),

    /// File access error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SdlError {
    pub(crate) fn acquisition(what: &'static str, message: impl Into<String>) -> Self {
        SdlError::Acquisition {
            what,
            context: Diagnostic::capture(message),
        }
    }

    pub(crate) fn operation(what: &'static str, message: impl Into<String>) -> Self {
        SdlError::Operation {
            what,
            context: Diagnostic::capture(message),
        }
    }

    /// Create an application-level error
    pub fn custom(message: impl Into<String>) -> Self {
        SdlError::Custom(message.into())
    }

    /// Diagnostic context, for errors that came from a native call
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            SdlError::Acquisition { context, .. } | SdlError::Operation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// Whether this error reports a failed acquisition
    pub fn is_acquisition(&self) -> bool {
        matches!(self, SdlError::Acquisition { .. })
    }

    /// Whether this error reports a failed operation on a live resource
    pub fn is_operation(&self) -> bool {
        matches!(self, SdlError::Operation { .. })
    }
}
