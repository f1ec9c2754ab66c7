//! Buffer Descriptors
//!
//! Defines the two by-value structs that carry byte data across the language
//! boundary: [`BridgeBuffer`] for Rust-owned allocations handed to the host,
//! and [`ForeignBytes`] for host-owned memory borrowed for one call.

use std::collections::HashMap;
use std::mem::ManuallyDrop;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use thiserror::Error;

/// Data pointer and capacity of every allocation currently on loan to the
/// host. Lets the exported free path reject a double free, a pointer this
/// crate never issued, or a descriptor whose capacity the host inflated,
/// instead of corrupting the heap. Best-effort: a freed address can be
/// reissued to a later allocation, so a stale descriptor that races a fresh
/// one is still a host bug this cannot catch.
static LIVE_ALLOCATIONS: Lazy<Mutex<HashMap<usize, u64>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

fn register(ptr: *mut u8, capacity: u64) {
    LIVE_ALLOCATIONS.lock().insert(ptr as usize, capacity);
}

/// Verify a descriptor against the registry without releasing it.
fn check_live(ptr: *mut u8, capacity: u64) -> Result<(), BufferError> {
    match LIVE_ALLOCATIONS.lock().get(&(ptr as usize)) {
        None => Err(BufferError::NotAllocated(ptr as usize)),
        Some(&registered) if registered != capacity => Err(BufferError::CapacityMismatch {
            descriptor: capacity,
            registered,
        }),
        Some(_) => Ok(()),
    }
}

/// Verify a descriptor and remove it from the registry in one step, so a
/// concurrent free of the same descriptor cannot pass the check twice.
fn take_live(ptr: *mut u8, capacity: u64) -> Result<(), BufferError> {
    let mut live = LIVE_ALLOCATIONS.lock();
    match live.get(&(ptr as usize)) {
        None => Err(BufferError::NotAllocated(ptr as usize)),
        Some(&registered) if registered != capacity => Err(BufferError::CapacityMismatch {
            descriptor: capacity,
            registered,
        }),
        Some(_) => {
            live.remove(&(ptr as usize));
            Ok(())
        }
    }
}

/// Errors raised when a descriptor received from the host violates the
/// boundary contract.
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("buffer length {len} exceeds capacity {capacity}")]
    LenExceedsCapacity { len: u64, capacity: u64 },

    #[error("buffer has null data but non-zero capacity {0}")]
    NullData(u64),

    #[error("buffer size {0} exceeds the maximum allocation size")]
    TooLarge(u64),

    #[error("buffer data pointer {0:#x} is not a live bridge allocation (double free?)")]
    NotAllocated(usize),

    #[error("buffer capacity {descriptor} does not match the issued allocation's capacity {registered}")]
    CapacityMismatch { descriptor: u64, registered: u64 },

    #[error("foreign byte slice has negative length {0}")]
    NegativeLength(i32),

    #[error("foreign byte slice has null data but length {0}")]
    NullForeignData(i32),
}

/// A contiguous block of Rust-owned heap memory, passed by value across the
/// FFI boundary.
///
/// The allocation behind `data` is always created by this crate (from a
/// `Vec<u8>`) and must be released by this crate, exactly once, via
/// [`BridgeBuffer::destroy`] or [`BridgeBuffer::destroy_into_vec`] — in
/// practice through the exported `shashlik_rustbuffer_free` symbol called
/// from the host binding.
///
/// Field order matches the declaration in `include/shashlik_bridge.h`.
#[repr(C)]
#[derive(Debug)]
pub struct BridgeBuffer {
    /// Total allocation size in bytes.
    pub capacity: u64,
    /// Initialized prefix length, `len <= capacity`.
    pub len: u64,
    /// Start of the allocation; null exactly when `capacity == 0`.
    pub data: *mut u8,
}

// SAFETY: the buffer owns its allocation outright; nothing aliases `data`
// while the descriptor is in transit between threads.
unsafe impl Send for BridgeBuffer {}

impl BridgeBuffer {
    /// Create a descriptor with no allocation behind it.
    pub fn new_empty() -> Self {
        Self {
            capacity: 0,
            len: 0,
            data: std::ptr::null_mut(),
        }
    }

    /// Take ownership of a `Vec`'s allocation without copying.
    pub fn from_vec(vec: Vec<u8>) -> Self {
        if vec.capacity() == 0 {
            // A zero-capacity Vec holds a dangling pointer; normalize to null
            // so the null-iff-empty invariant holds on the wire.
            return Self::new_empty();
        }
        let mut vec = ManuallyDrop::new(vec);
        let data = vec.as_mut_ptr();
        let capacity = vec.capacity() as u64;
        register(data, capacity);
        Self {
            capacity,
            len: vec.len() as u64,
            data,
        }
    }

    /// Number of initialized bytes.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Check if the buffer holds no data.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// View the initialized prefix.
    ///
    /// Returns an error if the descriptor violates the contract (the host may
    /// have rewritten the fields before passing it back).
    pub fn try_as_slice(&self) -> Result<&[u8], BufferError> {
        self.check_invariants()?;
        if self.data.is_null() {
            return Ok(&[]);
        }
        check_live(self.data, self.capacity)?;
        // SAFETY: invariants checked above and the descriptor matches the
        // registered allocation; data points at an allocation of at least
        // `len` initialized bytes owned by this descriptor.
        Ok(unsafe { std::slice::from_raw_parts(self.data, self.len as usize) })
    }

    /// Reconstitute the `Vec` this buffer was built from, transferring
    /// ownership back to Rust. Consumes the descriptor.
    pub fn try_into_vec(self) -> Result<Vec<u8>, BufferError> {
        self.check_invariants()?;
        if self.data.is_null() {
            return Ok(Vec::new());
        }
        take_live(self.data, self.capacity)?;
        // SAFETY: data/len/capacity came from the Vec this crate leaked in
        // `from_vec`, the allocation was still registered as live with this
        // exact capacity, and the field invariants were re-checked after the
        // round trip through foreign code.
        Ok(unsafe { Vec::from_raw_parts(self.data, self.len as usize, self.capacity as usize) })
    }

    /// Release the allocation.
    pub fn destroy(self) -> Result<(), BufferError> {
        self.try_into_vec().map(drop)
    }

    fn check_invariants(&self) -> Result<(), BufferError> {
        if self.capacity > isize::MAX as u64 {
            return Err(BufferError::TooLarge(self.capacity));
        }
        if self.len > self.capacity {
            return Err(BufferError::LenExceedsCapacity {
                len: self.len,
                capacity: self.capacity,
            });
        }
        if self.data.is_null() && self.capacity != 0 {
            return Err(BufferError::NullData(self.capacity));
        }
        Ok(())
    }
}

/// A borrowed view of host-owned memory, valid only for the duration of the
/// call that received it. The host keeps ownership; this side never frees it.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ForeignBytes {
    /// Length in bytes; the host binding guarantees non-negative.
    pub len: i32,
    /// Start of the host's allocation.
    pub data: *const u8,
}

impl ForeignBytes {
    /// View the foreign memory, validating the descriptor first.
    pub fn try_as_slice(&self) -> Result<&[u8], BufferError> {
        if self.len < 0 {
            return Err(BufferError::NegativeLength(self.len));
        }
        if self.len == 0 {
            return Ok(&[]);
        }
        if self.data.is_null() {
            return Err(BufferError::NullForeignData(self.len));
        }
        // SAFETY: non-null, non-negative length, and the host contract keeps
        // the memory alive and unaliased for the duration of this call.
        Ok(unsafe { std::slice::from_raw_parts(self.data, self.len as usize) })
    }
}
