//! Bridge Runtime
//!
//! Core machinery for moving values and outcomes between the native library
//! and a host binding across the C ABI.
//!
//! # Architecture
//!
//! ```text
//! Host binding (Swift / Kotlin)
//!       │
//!       ▼
//! extern "C" export          (exports module)
//!       │
//!       ▼
//! bridge_call harness        (panic + error → CallStatus)
//!       │
//!       ▼
//! lift / lower               (wire format ↔ Rust values)
//!       │
//!       ▼
//! BridgeBuffer / ForeignBytes / HandleMap
//! ```

pub mod buffer;
pub mod call;
pub mod handle;
pub mod serialize;
pub mod status;

pub use buffer::{BridgeBuffer, BufferError, ForeignBytes};
pub use call::{bridge_call, BridgeError, FfiDefault};
pub use handle::{Handle, HandleError, HandleMap};
pub use serialize::{Lift, Lower, Reader, WireError};
pub use status::{CallStatus, CALL_ERROR, CALL_SUCCESS, CALL_UNEXPECTED_PANIC};
