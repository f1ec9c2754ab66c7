//! Call Status Record
//!
//! One [`CallStatus`] is allocated (zeroed) by the host before every exported
//! call; the native side writes the outcome into it before returning. The
//! host binding inspects `code`, and on a non-success code lifts and then
//! frees `error_buf` through `shashlik_rustbuffer_free`.

use super::buffer::BridgeBuffer;
use super::serialize::Lower;

/// The call completed and its return value is valid.
pub const CALL_SUCCESS: i8 = 0;
/// The call returned an expected error; `error_buf` holds the lowered value.
pub const CALL_ERROR: i8 = 1;
/// The call panicked; `error_buf` holds the panic message as a lowered string.
pub const CALL_UNEXPECTED_PANIC: i8 = 2;

/// Outcome of one cross-boundary call.
///
/// Field order matches the declaration in `include/shashlik_bridge.h`.
#[repr(C)]
#[derive(Debug)]
pub struct CallStatus {
    /// One of [`CALL_SUCCESS`], [`CALL_ERROR`], [`CALL_UNEXPECTED_PANIC`].
    pub code: i8,
    /// Lowered error payload; empty on success.
    pub error_buf: BridgeBuffer,
}

impl CallStatus {
    /// A fresh success status, as the host binding zero-initializes it.
    pub fn new() -> Self {
        Self {
            code: CALL_SUCCESS,
            error_buf: BridgeBuffer::new_empty(),
        }
    }

    /// Record an expected error. The message crosses the boundary as a
    /// lowered string the host must free.
    pub fn set_error(&mut self, message: String) {
        self.code = CALL_ERROR;
        self.error_buf = message.lower();
    }

    /// Record a panic caught at the boundary.
    pub fn set_panic(&mut self, message: String) {
        self.code = CALL_UNEXPECTED_PANIC;
        self.error_buf = message.lower();
    }

    /// Check for the success code.
    pub fn is_success(&self) -> bool {
        self.code == CALL_SUCCESS
    }
}

impl Default for CallStatus {
    fn default() -> Self {
        Self::new()
    }
}
