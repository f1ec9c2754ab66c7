//! Cross-boundary Call Harness
//!
//! Every exported function body runs inside [`bridge_call`], which maps the
//! three possible outcomes onto the status record the host allocated:
//!
//! ```text
//! Host binding
//!       │  zeroed CallStatus
//!       ▼
//! extern "C" export
//!       │
//!       ▼
//! bridge_call ──── Ok(value)  ──▶ CALL_SUCCESS, value returned
//!       │     ──── Err(e)     ──▶ CALL_ERROR, error lowered into error_buf
//!       │     ──── panic      ──▶ CALL_UNEXPECTED_PANIC, message lowered
//!       ▼
//! never unwinds past the extern "C" frame
//! ```
//!
//! Calls are synchronous and blocking on the caller's thread; the harness
//! keeps no state between calls.

use std::panic::AssertUnwindSafe;

use thiserror::Error;

use super::buffer::{BridgeBuffer, BufferError};
use super::handle::HandleError;
use super::serialize::WireError;
use super::status::CallStatus;

/// Errors an exported call can surface to the host as `CALL_ERROR`.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("wire format error: {0}")]
    Wire(#[from] WireError),

    #[error("buffer contract violation: {0}")]
    Buffer(#[from] BufferError),

    #[error("handle error: {0}")]
    Handle(#[from] HandleError),

    #[error("{0}")]
    Message(String),
}

impl BridgeError {
    /// Build an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        BridgeError::Message(message.into())
    }
}

/// Placeholder return value for the C signature when a call failed and has
/// nothing real to return. The host binding ignores it after checking the
/// status code.
pub trait FfiDefault {
    fn ffi_default() -> Self;
}

macro_rules! impl_ffi_default_zero {
    ($($ty:ty),*) => {
        $(
            impl FfiDefault for $ty {
                fn ffi_default() -> Self {
                    0 as $ty
                }
            }
        )*
    };
}

impl_ffi_default_zero!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl FfiDefault for () {
    fn ffi_default() -> Self {}
}

impl FfiDefault for bool {
    fn ffi_default() -> Self {
        false
    }
}

impl FfiDefault for BridgeBuffer {
    fn ffi_default() -> Self {
        BridgeBuffer::new_empty()
    }
}

impl<T> FfiDefault for *const T {
    fn ffi_default() -> Self {
        std::ptr::null()
    }
}

impl<T> FfiDefault for *mut T {
    fn ffi_default() -> Self {
        std::ptr::null_mut()
    }
}

/// Run one exported call body, recording the outcome in `status`.
///
/// The closure is treated as unwind-safe: `status` is only written after the
/// closure has returned or its panic has been caught, so no partially
/// mutated state is observable.
pub fn bridge_call<R, F>(status: &mut CallStatus, body: F) -> R
where
    R: FfiDefault,
    F: FnOnce() -> Result<R, BridgeError>,
{
    match std::panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => {
            status.code = crate::bridge::status::CALL_SUCCESS;
            value
        }
        Ok(Err(err)) => {
            log::debug!("bridge call returned error: {}", err);
            status.set_error(err.to_string());
            R::ffi_default()
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::error!("bridge call panicked: {}", message);
            status.set_panic(message);
            R::ffi_default()
        }
    }
}

/// Extract a printable message from a caught panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "native code panicked".to_string()
    }
}
