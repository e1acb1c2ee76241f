//! Handle lifecycle
//!
//! Every handle-bearing entity (File, Group, Dataset, Attribute,
//! TypeDescriptor) owns exactly one engine handle, exclusively. The state
//! machine is `Unopened -> Open -> Closed`: a failed open/create leaves the
//! entity Unopened and its drop is a no-op; a successful close or drop
//! releases the handle exactly once; Closed is permanent.

use std::sync::Arc;

use crate::engine::{Engine, HandleId};
use crate::error::{Result, VaultError};

/// An owned, open engine handle. Released exactly once, on drop.
///
/// Releasing after the owning file has been closed is a no-op at the engine:
/// the handle table was already cleared, never a double release.
pub struct ObjectHandle {
    engine: Arc<Engine>,
    id: HandleId,
}

impl ObjectHandle {
    pub fn new(engine: Arc<Engine>, id: HandleId) -> Self {
        Self { engine, id }
    }

    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        self.engine.release(self.id);
    }
}

/// Lifecycle state shared by all handle-bearing entities.
pub enum HandleState {
    Unopened,
    Open(ObjectHandle),
    Closed,
}

impl HandleState {
    /// The open handle, or `InvalidHandle` outside the Open state.
    pub fn object(&self) -> Result<&ObjectHandle> {
        match self {
            HandleState::Open(handle) => Ok(handle),
            _ => Err(VaultError::InvalidHandle),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, HandleState::Open(_))
    }

    /// Transition to Closed, releasing the handle if one was held.
    /// Idempotent; an Unopened entity also lands in Closed with nothing to
    /// release.
    pub fn close(&mut self) {
        *self = HandleState::Closed;
    }
}
