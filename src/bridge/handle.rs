//! Object Handle Table
//!
//! Exported objects cross the boundary as opaque `u64` handles. Each object
//! type gets one global [`HandleMap`] holding `Arc`s; the host binding calls
//! the exported clone/free functions to manage the reference it was given.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

/// Opaque identifier handed to the host. Never zero, never reused within one
/// table's lifetime.
pub type Handle = u64;

/// Errors raised for handles the table does not currently hold.
#[derive(Debug, Error)]
pub enum HandleError {
    #[error("handle must be non-zero")]
    Zero,

    #[error("handle {0} was never issued or already released")]
    NotFound(Handle),
}

/// Concurrent table mapping handles to live objects.
pub struct HandleMap<T> {
    entries: RwLock<HashMap<Handle, Arc<T>>>,
    next: AtomicU64,
}

impl<T> HandleMap<T> {
    /// Create an empty table. Global tables wrap this in a
    /// `once_cell::sync::Lazy`.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            next: AtomicU64::new(1),
        }
    }

    /// Move an object into the table, returning its handle.
    pub fn insert(&self, value: T) -> Handle {
        self.insert_arc(Arc::new(value))
    }

    /// Insert an already shared object.
    pub fn insert_arc(&self, value: Arc<T>) -> Handle {
        let handle = self.next.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(handle, value);
        handle
    }

    /// Borrow the object behind a handle, bumping its refcount.
    pub fn get(&self, handle: Handle) -> Result<Arc<T>, HandleError> {
        if handle == 0 {
            return Err(HandleError::Zero);
        }
        self.entries
            .read()
            .get(&handle)
            .cloned()
            .ok_or(HandleError::NotFound(handle))
    }

    /// Issue a new handle to the same object, for host-side clone semantics.
    pub fn clone_handle(&self, handle: Handle) -> Result<Handle, HandleError> {
        let value = self.get(handle)?;
        Ok(self.insert_arc(value))
    }

    /// Release a handle, exactly once. The object is dropped when the last
    /// handle and all outstanding `get` references are gone.
    pub fn remove(&self, handle: Handle) -> Result<Arc<T>, HandleError> {
        if handle == 0 {
            return Err(HandleError::Zero);
        }
        self.entries
            .write()
            .remove(&handle)
            .ok_or(HandleError::NotFound(handle))
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the table holds no handles.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl<T> Default for HandleMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
