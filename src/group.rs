//! Groups
//!
//! A [`Group`] is a [`Container`] nested inside a File or another Group: the
//! same namespace capability, with no storage lifecycle of its own. Groups
//! are born Open from their factory and release their handle on close or
//! drop.

use crate::container::{private::ContainerNode, Container};
use crate::error::Result;
use crate::handle::{HandleState, ObjectHandle};

/// A namespace node nested inside a container file.
pub struct Group {
    state: HandleState,
}

impl Group {
    pub(crate) fn from_handle(handle: ObjectHandle) -> Self {
        Self {
            state: HandleState::Open(handle),
        }
    }

    /// Release this group's handle early. Idempotent; drop does the same.
    pub fn close(&mut self) {
        self.state.close();
    }
}

impl ContainerNode for Group {
    fn node(&self) -> Result<&ObjectHandle> {
        self.state.object()
    }
}

impl Container for Group {}
