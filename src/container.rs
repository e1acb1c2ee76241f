//! Container capability
//!
//! [`Container`] is the capability shared by [`File`](crate::File) and
//! [`Group`](crate::Group): creating and opening datasets and groups by path.
//! It is a trait over the one thing both carry (an open namespace handle),
//! not an inheritance relationship. Returned objects are independently owned
//! by the caller; a container does not track or close its children.

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::dims::Dimensions;
use crate::dtype::Scalar;
use crate::error::Result;
use crate::group::Group;
use crate::handle::ObjectHandle;

/// Creation options for a dataset: storage layout and filter pipeline.
///
/// Compression requires a chunked layout, and chunk rank must match the
/// dataset rank; both are checked at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetOptions {
    shuffle: bool,
    chunk_dims: Option<Dimensions>,
    compression_level: Option<u32>,
}

impl DatasetOptions {
    /// Default options: contiguous layout, no filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the byte-shuffle filter.
    pub fn shuffle(mut self) -> Self {
        self.shuffle = true;
        self
    }

    /// Store the dataset in chunks of the given shape.
    pub fn chunk(mut self, dims: impl Into<Dimensions>) -> Self {
        self.chunk_dims = Some(dims.into());
        self
    }

    /// Set the deflate compression level (0..=9).
    pub fn deflate(mut self, level: u32) -> Self {
        self.compression_level = Some(level);
        self
    }

    pub fn is_shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn chunk_dims(&self) -> Option<&Dimensions> {
        self.chunk_dims.as_ref()
    }

    pub fn compression_level(&self) -> Option<u32> {
        self.compression_level
    }
}

pub(crate) mod private {
    use crate::error::Result;
    use crate::handle::ObjectHandle;

    /// The one capability a namespace node needs to expose: its open handle.
    pub trait ContainerNode {
        fn node(&self) -> Result<&ObjectHandle>;
    }
}

/// Namespace operations shared by File and Group.
pub trait Container: private::ContainerNode {
    /// Create a dataset at `path` with element type `T` and the given shape.
    ///
    /// Fails if the path already exists, the shape has rank 0, the options
    /// are inconsistent (compression without chunking, chunk rank mismatch),
    /// or the engine rejects the allocation.
    fn create_dataset<T: Scalar>(
        &self,
        path: &str,
        dims: &Dimensions,
        options: &DatasetOptions,
    ) -> Result<Dataset> {
        let node = self.node()?;
        let id = node
            .engine()
            .create_dataset(node.id(), path, T::KIND, dims, options)?;
        Ok(Dataset::from_handle(ObjectHandle::new(
            node.engine().clone(),
            id,
        )))
    }

    /// Open an existing dataset at `path`.
    fn open_dataset(&self, path: &str) -> Result<Dataset> {
        let node = self.node()?;
        let id = node.engine().open_dataset(node.id(), path)?;
        Ok(Dataset::from_handle(ObjectHandle::new(
            node.engine().clone(),
            id,
        )))
    }

    /// Create a group at `path`.
    fn create_group(&self, path: &str) -> Result<Group> {
        let node = self.node()?;
        let id = node.engine().create_group(node.id(), path)?;
        Ok(Group::from_handle(ObjectHandle::new(
            node.engine().clone(),
            id,
        )))
    }

    /// Open an existing group at `path`.
    fn open_group(&self, path: &str) -> Result<Group> {
        let node = self.node()?;
        let id = node.engine().open_group(node.id(), path)?;
        Ok(Group::from_handle(ObjectHandle::new(
            node.engine().clone(),
            id,
        )))
    }
}
