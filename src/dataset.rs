//! Datasets
//!
//! A [`Dataset`] is a named, fixed-shape, fixed-element-type array resource.
//! Rank, shape, and element type are set at creation and immutable
//! thereafter; there is no reshape or retype. Bulk reads and writes convert
//! between the caller's scalar type and the on-disk element type under
//! ordinary numeric rules — the stored type never changes.

use crate::attribute::Attribute;
use crate::dims::Dimensions;
use crate::dtype::{Scalar, TypeDescriptor};
use crate::error::Result;
use crate::handle::{HandleState, ObjectHandle};

/// A typed, shaped array stored in a container file.
pub struct Dataset {
    state: HandleState,
}

impl Dataset {
    pub(crate) fn from_handle(handle: ObjectHandle) -> Self {
        Self {
            state: HandleState::Open(handle),
        }
    }

    fn object(&self) -> Result<&ObjectHandle> {
        self.state.object()
    }

    /// Number of axes, fixed at creation.
    pub fn get_rank(&self) -> Result<usize> {
        Ok(self.get_dimensions()?.rank())
    }

    /// The shape fixed at creation.
    pub fn get_dimensions(&self) -> Result<Dimensions> {
        let handle = self.object()?;
        let (_, dims) = handle.engine().dataset_info(handle.id())?;
        Ok(dims)
    }

    /// A descriptor of the on-disk element type. Deliberately decoupled from
    /// whatever type the caller later reads with; the descriptor owns its
    /// own engine handle, released when it is dropped.
    pub fn get_type(&self) -> Result<TypeDescriptor> {
        let handle = self.object()?;
        let (id, info) = handle.engine().open_type(handle.id())?;
        Ok(TypeDescriptor::new(
            ObjectHandle::new(handle.engine().clone(), id),
            info,
        ))
    }

    /// Total element count: the product of the extents.
    pub fn get_size_in_elements(&self) -> Result<u64> {
        Ok(self.get_dimensions()?.element_count())
    }

    /// Logical size: element count times the on-disk element width. Not the
    /// file-resident size.
    pub fn get_size_in_bytes(&self) -> Result<u64> {
        let handle = self.object()?;
        let (kind, dims) = handle.engine().dataset_info(handle.id())?;
        Ok(dims.element_count() * kind.size_bytes() as u64)
    }

    /// Persistent storage actually consumed, as reported by the engine.
    /// Compression makes this differ from
    /// [`get_size_in_bytes`](Self::get_size_in_bytes), so it is queried,
    /// never computed.
    pub fn get_size_in_file_bytes(&self) -> Result<u64> {
        let handle = self.object()?;
        handle.engine().dataset_storage_size(handle.id())
    }

    /// Read the whole dataset into `values`, converting each stored element
    /// to `T`. The buffer must hold at least `get_size_in_elements()`
    /// values. Returns `true` on success; failures are reported on the log
    /// and never panic.
    pub fn read<T: Scalar>(&self, values: &mut [T]) -> bool {
        let result = self
            .object()
            .and_then(|handle| handle.engine().read_dataset(handle.id(), values));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("dataset read failed: {e}");
                false
            }
        }
    }

    /// Write exactly `get_size_in_elements()` values from `values`,
    /// converting from `T` to the on-disk element type fixed at creation.
    /// Returns `true` on success.
    pub fn write<T: Scalar>(&self, values: &[T]) -> bool {
        let result = self
            .object()
            .and_then(|handle| handle.engine().write_dataset(handle.id(), values));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("dataset write failed: {e}");
                false
            }
        }
    }

    /// Create a named attribute with element type `T`. Attribute names are
    /// unique per dataset; a duplicate fails with a create error.
    pub fn create_attribute<T: Scalar>(&self, name: &str, dims: &Dimensions) -> Result<Attribute> {
        let handle = self.object()?;
        let id = handle
            .engine()
            .create_attribute(handle.id(), name, T::KIND, dims)?;
        Ok(Attribute::from_handle(ObjectHandle::new(
            handle.engine().clone(),
            id,
        )))
    }

    /// Open an existing attribute by name.
    pub fn get_attribute(&self, name: &str) -> Result<Attribute> {
        let handle = self.object()?;
        let id = handle.engine().open_attribute(handle.id(), name)?;
        Ok(Attribute::from_handle(ObjectHandle::new(
            handle.engine().clone(),
            id,
        )))
    }

    /// Release this dataset's handle early. Idempotent; drop does the same.
    pub fn close(&mut self) {
        self.state.close();
    }
}
