//! Container files
//!
//! A [`File`] is a [`Container`] bound to persistent storage: it owns the
//! root namespace and the open/create/close lifecycle. Instances are
//! two-phase: `File::new()` yields an Unopened file, `open`/`create`
//! transition it to Open, and `close` (or drop) lands it permanently in
//! Closed. A failed open leaves the instance Unopened with nothing to
//! release.

use std::path::Path;

use crate::container::{private::ContainerNode, Container};
use crate::engine::Engine;
use crate::error::{Result, VaultError};
use crate::handle::{HandleState, ObjectHandle};

/// A container file: the root of a dataset namespace.
pub struct File {
    state: HandleState,
    readonly: bool,
}

impl File {
    /// A new, unopened file. Call [`open`](Self::open) or
    /// [`create`](Self::create) before anything else.
    pub fn new() -> Self {
        Self {
            state: HandleState::Unopened,
            readonly: false,
        }
    }

    /// Open an existing container file.
    ///
    /// `readonly` selects one of the two mutually exclusive access modes;
    /// in read-only mode every create and write against the file fails.
    /// Fails with `NotFound` if the target does not exist, leaving the
    /// instance Unopened.
    pub fn open(&mut self, path: impl AsRef<Path>, readonly: bool) -> Result<()> {
        match self.state {
            HandleState::Unopened => {}
            _ => return Err(VaultError::InvalidHandle),
        }
        let (engine, root) = Engine::open(path.as_ref(), readonly)?;
        self.state = HandleState::Open(ObjectHandle::new(engine, root));
        self.readonly = readonly;
        Ok(())
    }

    /// Create a container file.
    ///
    /// With `overwrite` any existing content is unconditionally truncated;
    /// without it an existing target fails with `AlreadyExists`. New files
    /// are always writable.
    pub fn create(&mut self, path: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        match self.state {
            HandleState::Unopened => {}
            _ => return Err(VaultError::InvalidHandle),
        }
        let (engine, root) = Engine::create(path.as_ref(), overwrite)?;
        self.state = HandleState::Open(ObjectHandle::new(engine, root));
        self.readonly = false;
        Ok(())
    }

    /// Close the file: flush the catalog (unless readonly) and release all
    /// engine resources for it. Idempotent; once closed the instance cannot
    /// be reopened.
    ///
    /// Handles previously obtained from this file stay independently owned —
    /// their operations fail with `InvalidHandle` from here on, and dropping
    /// them stays a no-op release.
    pub fn close(&mut self) -> Result<()> {
        let result = match &self.state {
            HandleState::Open(handle) => handle.engine().close_file(handle.id()),
            _ => Ok(()),
        };
        self.state.close();
        result
    }

    /// Whether the file is currently open.
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    /// Whether the file was opened read-only.
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }
}

impl Default for File {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if self.state.is_open() {
            if let Err(e) = self.close() {
                tracing::warn!("file close on drop failed: {e}");
            }
        }
    }
}

impl ContainerNode for File {
    fn node(&self) -> Result<&ObjectHandle> {
        self.state.object()
    }
}

impl Container for File {}
