//! Shashlik Bridge - FFI buffer-passing runtime
//!
//! The native side of the Shashlik map renderer's language boundary. The
//! mobile hosts (Swift on iOS, Kotlin on Android) talk to the renderer
//! through generated bindings; those bindings bottom out in the small C ABI
//! this crate provides:
//!
//! - **[`BridgeBuffer`]**: a Rust-owned byte allocation passed by value,
//!   allocated here and released here exactly once via the exported free
//! - **[`ForeignBytes`]**: a borrowed view of host memory, valid for one call
//! - **[`CallStatus`]**: per-call outcome record; errors and panics come back
//!   as status codes plus a lowered message, never as an unwind across the
//!   boundary
//! - **[`HandleMap`]**: opaque `u64` handles for exported objects
//! - **exported function table**: `shashlik_rustbuffer_*`,
//!   `shashlik_contract_version`, `shashlik_install_log_callback`
//!
//! Hosts whose automatic module import fails include
//! `include/shashlik_bridge.h` to see the same declarations.
//!
//! # Example
//!
//! ```rust
//! use shashlik_bridge::{bridge_call, CallStatus, Lift, Lower};
//!
//! // What an exported call does, minus the extern "C" plumbing:
//! let mut status = CallStatus::new();
//! let buf = bridge_call(&mut status, || Ok("Дорогомилово".to_string().lower()));
//! assert!(status.is_success());
//!
//! // The host side lifts the value back out of the buffer.
//! assert_eq!(String::try_lift(buf).unwrap(), "Дорогомилово");
//! ```
//!
//! All exported calls are synchronous and blocking on the caller's thread;
//! shared state (handle tables, the log callback) is internally synchronized.

#![warn(clippy::all)]

pub mod bridge;
pub mod exports;
pub mod logging;

pub use bridge::{
    bridge_call, BridgeBuffer, BridgeError, BufferError, CallStatus, FfiDefault, ForeignBytes,
    Handle, HandleError, HandleMap, Lift, Lower, Reader, WireError, CALL_ERROR, CALL_SUCCESS,
    CALL_UNEXPECTED_PANIC,
};
pub use logging::{install_log_callback, ForeignLogCallback};

/// ABI contract version reported by `shashlik_contract_version`. Bumped
/// whenever a struct layout, symbol signature, or wire encoding changes.
pub const CONTRACT_VERSION: u32 = 1;
