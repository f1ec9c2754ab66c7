//! Exported Function Table
//!
//! The `extern "C"` symbols the host bindings link against, declared for
//! fallback consumers in `include/shashlik_bridge.h`. Every function except
//! the version probe takes a trailing `&mut CallStatus` the host
//! zero-initializes, and runs its body inside [`bridge_call`] so no panic
//! crosses the boundary.
//!
//! Buffer ownership across these calls:
//!
//! - `alloc`, `from_bytes`, `reserve` return buffers the host owns and must
//!   release with `free` (or hand back to another export that consumes them).
//! - `free` and `reserve` consume the buffer passed in.

use crate::bridge::buffer::{BridgeBuffer, BufferError, ForeignBytes};
use crate::bridge::call::bridge_call;
use crate::bridge::status::CallStatus;
use crate::logging::{install_log_callback, level_filter_from_i32, ForeignLogCallback};
use crate::CONTRACT_VERSION;

/// ABI contract version probe. Bindings generated against a different
/// runtime revision compare this before making any other call.
#[no_mangle]
pub extern "C" fn shashlik_contract_version() -> u32 {
    CONTRACT_VERSION
}

/// Allocate a buffer with at least `size` bytes of capacity and zero length.
/// The host writes data into it and updates `len` before passing it back.
#[no_mangle]
pub extern "C" fn shashlik_rustbuffer_alloc(size: u64, status: &mut CallStatus) -> BridgeBuffer {
    bridge_call(status, || {
        if size > isize::MAX as u64 {
            return Err(BufferError::TooLarge(size).into());
        }
        Ok(BridgeBuffer::from_vec(Vec::with_capacity(size as usize)))
    })
}

/// Copy host-owned bytes into a fresh Rust-owned buffer.
#[no_mangle]
pub extern "C" fn shashlik_rustbuffer_from_bytes(
    bytes: ForeignBytes,
    status: &mut CallStatus,
) -> BridgeBuffer {
    bridge_call(status, || {
        let slice = bytes.try_as_slice()?;
        Ok(BridgeBuffer::from_vec(slice.to_vec()))
    })
}

/// Release a buffer previously returned by this library. Must be called
/// exactly once per buffer.
#[no_mangle]
pub extern "C" fn shashlik_rustbuffer_free(buf: BridgeBuffer, status: &mut CallStatus) {
    bridge_call(status, || {
        buf.destroy()?;
        Ok(())
    })
}

/// Grow a buffer's capacity by at least `additional` bytes, consuming the
/// old descriptor and returning the new one. Contents are preserved.
#[no_mangle]
pub extern "C" fn shashlik_rustbuffer_reserve(
    buf: BridgeBuffer,
    additional: u64,
    status: &mut CallStatus,
) -> BridgeBuffer {
    bridge_call(status, || {
        if additional > isize::MAX as u64 {
            return Err(BufferError::TooLarge(additional).into());
        }
        let mut vec = buf.try_into_vec()?;
        vec.reserve(additional as usize);
        Ok(BridgeBuffer::from_vec(vec))
    })
}

/// Register the host log sink and maximum forwarded level. Passing a null
/// callback detaches the current sink. Installs the panic-to-log hook on
/// first use.
#[no_mangle]
pub extern "C" fn shashlik_install_log_callback(
    callback: Option<ForeignLogCallback>,
    max_level: i32,
    status: &mut CallStatus,
) {
    bridge_call(status, || {
        install_log_callback(callback, level_filter_from_i32(max_level));
        Ok(())
    })
}
