//! Storage engine
//!
//! The engine is the collaborator behind the object model: it owns the
//! container file, the catalog, and the handle table, and exposes the
//! handle-based primitives the core objects are built on — open/create/close,
//! typed create/read/write, type introspection, and storage accounting. The
//! core never touches bytes on disk; it issues requests here and interprets
//! the replies.
//!
//! ## Responsibilities
//! - Resolve namespace paths against the catalog
//! - Track live handles and reject operations on released ones
//! - Run the segment filter pipeline (shuffle, deflate) on dataset I/O
//! - Persist the catalog on flush/close

pub(crate) mod catalog;
mod filters;
mod store;

use std::collections::HashMap;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::container::DatasetOptions;
use crate::dims::Dimensions;
use crate::dtype::{self, Scalar, ScalarKind, TypeInfo};
use crate::error::{Result, VaultError};

use catalog::{
    AttrRecord, Catalog, DatasetRecord, GroupRecord, NodeId, NodeRecord, SegmentMeta, ROOT_NODE,
};
use store::Store;

/// Opaque identifier for a live engine handle.
pub type HandleId = u64;

/// What a live handle refers to.
#[derive(Clone)]
enum HandleTarget {
    Group(NodeId),
    Dataset(NodeId),
    Attr(NodeId, String),
    Type,
}

/// The storage engine for one container file.
///
/// Shared through `Arc` by every object opened from the file. Interior state
/// is field-locked so the sharing is sound; no concurrency model is offered
/// beyond that — callers serialize their own use.
pub struct Engine {
    /// Container file path (for log and error context)
    path: PathBuf,

    /// Access mode fixed at open
    readonly: bool,

    /// Open container file; `None` once the file has been closed
    store: Mutex<Option<Store>>,

    /// Namespace and metadata, flushed to the store on close
    catalog: RwLock<Catalog>,

    /// Live handles; cleared wholesale when the file closes
    handles: RwLock<HashMap<HandleId, HandleTarget>>,

    /// Next handle id (atomic, lock-free)
    next_handle: AtomicU64,
}

impl Engine {
    // =========================================================================
    // File lifecycle
    // =========================================================================

    /// Create a fresh container file. Returns the engine and the root group
    /// handle.
    pub fn create(path: &Path, overwrite: bool) -> Result<(Arc<Self>, HandleId)> {
        let store = Store::create(path, overwrite)?;
        let engine = Self::with_store(path, false, store, Catalog::new());
        let root = engine.register(HandleTarget::Group(ROOT_NODE));
        tracing::debug!(path = %path.display(), overwrite, "container created");
        Ok((engine, root))
    }

    /// Open an existing container file in the requested access mode.
    pub fn open(path: &Path, readonly: bool) -> Result<(Arc<Self>, HandleId)> {
        let (store, catalog) = Store::open(path, readonly)?;
        let engine = Self::with_store(path, readonly, store, catalog);
        let root = engine.register(HandleTarget::Group(ROOT_NODE));
        tracing::debug!(path = %path.display(), readonly, "container opened");
        Ok((engine, root))
    }

    fn with_store(path: &Path, readonly: bool, store: Store, catalog: Catalog) -> Arc<Self> {
        Arc::new(Self {
            path: path.to_path_buf(),
            readonly,
            store: Mutex::new(Some(store)),
            catalog: RwLock::new(catalog),
            handles: RwLock::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    /// Flush the catalog without closing.
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.store.lock();
        let store = guard.as_mut().ok_or(VaultError::InvalidHandle)?;
        if self.readonly {
            return Ok(());
        }
        store.flush_catalog(&self.catalog.read())
    }

    /// Close the container file: flush the catalog (unless readonly), drop
    /// the OS file, and invalidate every outstanding handle. Idempotent.
    pub fn close_file(&self, _root: HandleId) -> Result<()> {
        let mut guard = self.store.lock();
        if let Some(mut store) = guard.take() {
            if !self.readonly {
                store.flush_catalog(&self.catalog.read())?;
            }
            tracing::debug!(path = %self.path.display(), "container closed");
        }
        self.handles.write().clear();
        Ok(())
    }

    /// Release one handle. Unknown ids are a no-op, so releasing after the
    /// file has been closed is safe and never a double release.
    pub fn release(&self, handle: HandleId) {
        self.handles.write().remove(&handle);
    }

    // =========================================================================
    // Namespace operations
    // =========================================================================

    /// Create a group at `path` relative to the `parent` group handle.
    pub fn create_group(&self, parent: HandleId, path: &str) -> Result<HandleId> {
        let base = self.group_target(parent)?;
        self.writable_for_create()?;
        let mut catalog = self.catalog.write();
        let (group, leaf) = catalog
            .resolve_parent(base, path)
            .map_err(not_found_to_create)?;
        let node = catalog.insert(group, leaf, NodeRecord::Group(GroupRecord::default()))?;
        Ok(self.register(HandleTarget::Group(node)))
    }

    /// Open an existing group.
    pub fn open_group(&self, parent: HandleId, path: &str) -> Result<HandleId> {
        let base = self.group_target(parent)?;
        let catalog = self.catalog.read();
        let node = catalog.resolve(base, path)?;
        if !catalog.is_group(node) {
            return Err(VaultError::NotFound(format!("not a group: {path}")));
        }
        Ok(self.register(HandleTarget::Group(node)))
    }

    /// Create a dataset at `path` with the given element kind, shape, and
    /// options.
    pub fn create_dataset(
        &self,
        parent: HandleId,
        path: &str,
        kind: ScalarKind,
        dims: &Dimensions,
        options: &DatasetOptions,
    ) -> Result<HandleId> {
        let base = self.group_target(parent)?;
        self.writable_for_create()?;
        validate_shape(dims)?;
        validate_options(dims, options)?;
        let mut catalog = self.catalog.write();
        let (group, leaf) = catalog
            .resolve_parent(base, path)
            .map_err(not_found_to_create)?;
        let node = catalog.insert(
            group,
            leaf,
            NodeRecord::Dataset(DatasetRecord {
                kind,
                dims: dims.clone(),
                options: options.clone(),
                segments: Vec::new(),
                attrs: Default::default(),
            }),
        )?;
        tracing::debug!(path, %kind, rank = dims.rank(), "dataset created");
        Ok(self.register(HandleTarget::Dataset(node)))
    }

    /// Open an existing dataset.
    pub fn open_dataset(&self, parent: HandleId, path: &str) -> Result<HandleId> {
        let base = self.group_target(parent)?;
        let catalog = self.catalog.read();
        let node = catalog.resolve(base, path)?;
        catalog
            .dataset(node)
            .map_err(|_| VaultError::NotFound(format!("not a dataset: {path}")))?;
        Ok(self.register(HandleTarget::Dataset(node)))
    }

    // =========================================================================
    // Type introspection
    // =========================================================================

    /// Open a type handle on a dataset or attribute, returning the handle
    /// and the canonical tag. The handle exists only to be released.
    pub fn open_type(&self, object: HandleId) -> Result<(HandleId, TypeInfo)> {
        let kind = match self.target(object)? {
            HandleTarget::Dataset(node) => self.catalog.read().dataset(node)?.kind,
            HandleTarget::Attr(node, name) => self.attr_record(node, &name)?.kind,
            _ => return Err(VaultError::InvalidHandle),
        };
        Ok((self.register(HandleTarget::Type), kind.type_info()))
    }

    // =========================================================================
    // Dataset I/O
    // =========================================================================

    /// Element kind and shape of a dataset.
    pub fn dataset_info(&self, dataset: HandleId) -> Result<(ScalarKind, Dimensions)> {
        let node = self.dataset_target(dataset)?;
        let catalog = self.catalog.read();
        let record = catalog.dataset(node)?;
        Ok((record.kind, record.dims.clone()))
    }

    /// Persistent bytes currently backing a dataset (after filters). This is
    /// measured from the stored segments, not computed from the shape.
    pub fn dataset_storage_size(&self, dataset: HandleId) -> Result<u64> {
        let node = self.dataset_target(dataset)?;
        let catalog = self.catalog.read();
        let record = catalog.dataset(node)?;
        Ok(record.segments.iter().map(|s| s.stored_len as u64).sum())
    }

    /// Write a full dataset: convert `values` to the on-disk element kind,
    /// run the filter pipeline, and append the segments. Replaces any
    /// previous contents (old segments are orphaned).
    pub fn write_dataset<T: Scalar>(&self, dataset: HandleId, values: &[T]) -> Result<()> {
        let node = self.dataset_target(dataset)?;
        self.writable_for_io()?;
        let (kind, dims, options) = {
            let catalog = self.catalog.read();
            let record = catalog.dataset(node)?;
            (record.kind, record.dims.clone(), record.options.clone())
        };
        let count = dims.element_count() as usize;
        if values.len() < count {
            return Err(buffer_too_small(values.len(), count));
        }

        let raw = dtype::encode_slice(kind, &values[..count]);
        let element_size = kind.size_bytes();
        let chunk_bytes = options
            .chunk_dims()
            .map(|c| c.element_count() as usize * element_size);

        let mut segments = Vec::new();
        {
            let mut guard = self.store.lock();
            let store = guard.as_mut().ok_or(VaultError::InvalidHandle)?;
            let pieces: Vec<&[u8]> = if raw.is_empty() {
                Vec::new()
            } else if let Some(chunk_bytes) = chunk_bytes {
                raw.chunks(chunk_bytes).collect()
            } else {
                vec![raw.as_slice()]
            };
            for piece in pieces {
                let shuffled = if options.is_shuffle() {
                    filters::shuffle(piece, element_size)
                } else {
                    piece.to_vec()
                };
                let stored = match options.compression_level() {
                    Some(level) => filters::deflate(&shuffled, level)?,
                    None => shuffled,
                };
                let offset = store.append_segment(&stored)?;
                segments.push(SegmentMeta {
                    offset,
                    stored_len: stored.len() as u32,
                    raw_len: piece.len() as u32,
                    crc: crc32fast::hash(&stored),
                });
            }
        }

        self.catalog.write().dataset_mut(node)?.segments = segments;
        Ok(())
    }

    /// Read a full dataset, converting every stored element to `T`. A
    /// dataset that has never been written reads back as zeroes.
    pub fn read_dataset<T: Scalar>(&self, dataset: HandleId, out: &mut [T]) -> Result<()> {
        let node = self.dataset_target(dataset)?;
        let (kind, dims, options, segments) = {
            let catalog = self.catalog.read();
            let record = catalog.dataset(node)?;
            (
                record.kind,
                record.dims.clone(),
                record.options.clone(),
                record.segments.clone(),
            )
        };
        let count = dims.element_count() as usize;
        if out.len() < count {
            return Err(buffer_too_small(out.len(), count));
        }
        let out = &mut out[..count];
        if segments.is_empty() {
            out.fill(T::default());
            return Ok(());
        }

        let element_size = kind.size_bytes();
        let mut raw = Vec::with_capacity(count * element_size);
        {
            let mut guard = self.store.lock();
            let store = guard.as_mut().ok_or(VaultError::InvalidHandle)?;
            for segment in &segments {
                let stored = store.read_segment(segment.offset, segment.stored_len)?;
                if crc32fast::hash(&stored) != segment.crc {
                    return Err(VaultError::Corrupt(
                        "data segment checksum mismatch".into(),
                    ));
                }
                let piece = match options.compression_level() {
                    Some(_) => filters::inflate(&stored, segment.raw_len as usize)?,
                    None => stored,
                };
                let piece = if options.is_shuffle() {
                    filters::unshuffle(&piece, element_size)
                } else {
                    piece
                };
                raw.extend_from_slice(&piece);
            }
        }

        if raw.len() != count * element_size {
            return Err(VaultError::Corrupt(format!(
                "dataset payload is {} bytes, expected {}",
                raw.len(),
                count * element_size
            )));
        }
        dtype::decode_slice(kind, &raw, out);
        Ok(())
    }

    // =========================================================================
    // Attribute I/O
    // =========================================================================

    /// Create a named attribute on a dataset. Names are single components
    /// and unique per dataset.
    pub fn create_attribute(
        &self,
        dataset: HandleId,
        name: &str,
        kind: ScalarKind,
        dims: &Dimensions,
    ) -> Result<HandleId> {
        let node = self.dataset_target(dataset)?;
        self.writable_for_create()?;
        if name.is_empty() || name.contains('/') {
            return Err(VaultError::Create(format!(
                "invalid attribute name {name:?}"
            )));
        }
        validate_shape(dims)?;
        let mut catalog = self.catalog.write();
        let record = catalog.dataset_mut(node)?;
        if record.attrs.contains_key(name) {
            return Err(VaultError::Create(format!(
                "attribute {name:?} already exists"
            )));
        }
        record.attrs.insert(
            name.to_string(),
            AttrRecord {
                kind,
                dims: dims.clone(),
                data: Vec::new(),
            },
        );
        Ok(self.register(HandleTarget::Attr(node, name.to_string())))
    }

    /// Open an existing attribute by name.
    pub fn open_attribute(&self, dataset: HandleId, name: &str) -> Result<HandleId> {
        let node = self.dataset_target(dataset)?;
        let catalog = self.catalog.read();
        if !catalog.dataset(node)?.attrs.contains_key(name) {
            return Err(VaultError::NotFound(format!("attribute {name:?}")));
        }
        Ok(self.register(HandleTarget::Attr(node, name.to_string())))
    }

    /// Element kind and shape of an attribute.
    pub fn attribute_info(&self, attribute: HandleId) -> Result<(ScalarKind, Dimensions)> {
        let (node, name) = self.attr_target(attribute)?;
        let record = self.attr_record(node, &name)?;
        Ok((record.kind, record.dims))
    }

    /// Write a full attribute payload. Attributes are materialized inline in
    /// the catalog; no filter pipeline applies.
    pub fn write_attribute<T: Scalar>(&self, attribute: HandleId, values: &[T]) -> Result<()> {
        let (node, name) = self.attr_target(attribute)?;
        self.writable_for_io()?;
        let mut catalog = self.catalog.write();
        let record = catalog
            .dataset_mut(node)?
            .attrs
            .get_mut(&name)
            .ok_or(VaultError::InvalidHandle)?;
        let count = record.dims.element_count() as usize;
        if values.len() < count {
            return Err(buffer_too_small(values.len(), count));
        }
        record.data = dtype::encode_slice(record.kind, &values[..count]);
        Ok(())
    }

    /// Read a full attribute payload. A never-written attribute reads back
    /// as zeroes.
    pub fn read_attribute<T: Scalar>(&self, attribute: HandleId, out: &mut [T]) -> Result<()> {
        let (node, name) = self.attr_target(attribute)?;
        let record = self.attr_record(node, &name)?;
        let count = record.dims.element_count() as usize;
        if out.len() < count {
            return Err(buffer_too_small(out.len(), count));
        }
        let out = &mut out[..count];
        if record.data.is_empty() {
            out.fill(T::default());
            return Ok(());
        }
        if record.data.len() != count * record.kind.size_bytes() {
            return Err(VaultError::Corrupt(format!(
                "attribute {name:?} payload is {} bytes, expected {}",
                record.data.len(),
                count * record.kind.size_bytes()
            )));
        }
        dtype::decode_slice(record.kind, &record.data, out);
        Ok(())
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn register(&self, target: HandleTarget) -> HandleId {
        let id = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.handles.write().insert(id, target);
        id
    }

    fn target(&self, handle: HandleId) -> Result<HandleTarget> {
        self.handles
            .read()
            .get(&handle)
            .cloned()
            .ok_or(VaultError::InvalidHandle)
    }

    fn group_target(&self, handle: HandleId) -> Result<NodeId> {
        match self.target(handle)? {
            HandleTarget::Group(node) => Ok(node),
            _ => Err(VaultError::InvalidHandle),
        }
    }

    fn dataset_target(&self, handle: HandleId) -> Result<NodeId> {
        match self.target(handle)? {
            HandleTarget::Dataset(node) => Ok(node),
            _ => Err(VaultError::InvalidHandle),
        }
    }

    fn attr_target(&self, handle: HandleId) -> Result<(NodeId, String)> {
        match self.target(handle)? {
            HandleTarget::Attr(node, name) => Ok((node, name)),
            _ => Err(VaultError::InvalidHandle),
        }
    }

    fn attr_record(&self, node: NodeId, name: &str) -> Result<AttrRecord> {
        self.catalog
            .read()
            .dataset(node)?
            .attrs
            .get(name)
            .cloned()
            .ok_or(VaultError::InvalidHandle)
    }

    fn writable_for_create(&self) -> Result<()> {
        if self.readonly {
            return Err(VaultError::Create("file is read-only".into()));
        }
        Ok(())
    }

    fn writable_for_io(&self) -> Result<()> {
        if self.readonly {
            return Err(VaultError::Io(io::Error::new(
                ErrorKind::PermissionDenied,
                "file is read-only",
            )));
        }
        Ok(())
    }
}

fn buffer_too_small(got: usize, need: usize) -> VaultError {
    VaultError::Io(io::Error::new(
        ErrorKind::InvalidInput,
        format!("buffer holds {got} elements, {need} required"),
    ))
}

fn not_found_to_create(err: VaultError) -> VaultError {
    match err {
        VaultError::NotFound(msg) => VaultError::Create(msg),
        other => other,
    }
}

fn validate_shape(dims: &Dimensions) -> Result<()> {
    if dims.rank() == 0 {
        return Err(VaultError::Create(
            "shape must have at least one axis".into(),
        ));
    }
    Ok(())
}

fn validate_options(dims: &Dimensions, options: &DatasetOptions) -> Result<()> {
    if let Some(level) = options.compression_level() {
        if level > 9 {
            return Err(VaultError::Create(format!(
                "compression level {level} out of range 0..=9"
            )));
        }
        if options.chunk_dims().is_none() {
            return Err(VaultError::Create(
                "compression requires a chunked layout".into(),
            ));
        }
    }
    if let Some(chunk) = options.chunk_dims() {
        if chunk.rank() != dims.rank() {
            return Err(VaultError::Create(format!(
                "chunk rank {} does not match dataset rank {}",
                chunk.rank(),
                dims.rank()
            )));
        }
        if chunk.extents().iter().any(|&extent| extent == 0) {
            return Err(VaultError::Create("chunk extents must be non-zero".into()));
        }
    }
    Ok(())
}
