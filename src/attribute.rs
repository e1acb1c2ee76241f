//! Attributes
//!
//! An [`Attribute`] is a small named, typed, shaped array bound exclusively
//! to one dataset. It follows the dataset read/write contract but is always
//! fully materialized: no chunking, no compression, no partial I/O.

use crate::dims::Dimensions;
use crate::dtype::{Scalar, TypeDescriptor};
use crate::error::Result;
use crate::handle::{HandleState, ObjectHandle};

/// A named, typed annotation attached to a dataset.
pub struct Attribute {
    state: HandleState,
}

impl Attribute {
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
        let (_, dims) = handle.engine().attribute_info(handle.id())?;
        Ok(dims)
    }

    /// A descriptor of the on-disk element type, with its own handle.
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

    /// Read the whole attribute into `values`, converting each stored
    /// element to `T`. Returns `true` on success.
    pub fn read<T: Scalar>(&self, values: &mut [T]) -> bool {
        let result = self
            .object()
            .and_then(|handle| handle.engine().read_attribute(handle.id(), values));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("attribute read failed: {e}");
                false
            }
        }
    }

    /// Write the whole attribute from `values`, converting from `T` to the
    /// on-disk element type fixed at creation. Returns `true` on success.
    pub fn write<T: Scalar>(&self, values: &[T]) -> bool {
        let result = self
            .object()
            .and_then(|handle| handle.engine().write_attribute(handle.id(), values));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("attribute write failed: {e}");
                false
            }
        }
    }

    /// Release this attribute's handle early. Idempotent; drop does the
    /// same.
    pub fn close(&mut self) {
        self.state.close();
    }
}
