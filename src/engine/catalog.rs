//! Container catalog
//!
//! The in-memory namespace of a container file: a flat arena of nodes (groups
//! and datasets) addressed by [`NodeId`], with node 0 as the root group.
//! Datasets carry their type tag, shape, creation options, data segment
//! locations, and attribute records. The whole catalog serializes to one
//! bincode block in the container file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::container::DatasetOptions;
use crate::dims::Dimensions;
use crate::dtype::ScalarKind;
use crate::error::{Result, VaultError};

/// Index of a node in the catalog arena.
pub(crate) type NodeId = u32;

/// The root group is always node 0.
pub(crate) const ROOT_NODE: NodeId = 0;

/// Location of one stored data segment (one chunk's worth after filtering).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SegmentMeta {
    /// Byte offset in the container file.
    pub offset: u64,
    /// Bytes on disk (after filters).
    pub stored_len: u32,
    /// Bytes before filters.
    pub raw_len: u32,
    /// CRC32 of the stored bytes.
    pub crc: u32,
}

/// A named attribute: type, shape, and inline payload (little-endian element
/// bytes; empty until first written).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AttrRecord {
    pub kind: ScalarKind,
    pub dims: Dimensions,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct GroupRecord {
    pub children: BTreeMap<String, NodeId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct DatasetRecord {
    pub kind: ScalarKind,
    pub dims: Dimensions,
    pub options: DatasetOptions,
    pub segments: Vec<SegmentMeta>,
    pub attrs: BTreeMap<String, AttrRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum NodeRecord {
    Group(GroupRecord),
    Dataset(DatasetRecord),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Catalog {
    nodes: Vec<NodeRecord>,
}

impl Catalog {
    /// A fresh catalog holding only the empty root group.
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![NodeRecord::Group(GroupRecord::default())],
        }
    }

    fn node(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id as usize]
    }

    pub(crate) fn group(&self, id: NodeId) -> Result<&GroupRecord> {
        match self.node(id) {
            NodeRecord::Group(group) => Ok(group),
            NodeRecord::Dataset(_) => Err(VaultError::InvalidHandle),
        }
    }

    fn group_mut(&mut self, id: NodeId) -> Result<&mut GroupRecord> {
        match &mut self.nodes[id as usize] {
            NodeRecord::Group(group) => Ok(group),
            NodeRecord::Dataset(_) => Err(VaultError::InvalidHandle),
        }
    }

    pub(crate) fn dataset(&self, id: NodeId) -> Result<&DatasetRecord> {
        match self.node(id) {
            NodeRecord::Dataset(dataset) => Ok(dataset),
            NodeRecord::Group(_) => Err(VaultError::InvalidHandle),
        }
    }

    pub(crate) fn dataset_mut(&mut self, id: NodeId) -> Result<&mut DatasetRecord> {
        match &mut self.nodes[id as usize] {
            NodeRecord::Dataset(dataset) => Ok(dataset),
            NodeRecord::Group(_) => Err(VaultError::InvalidHandle),
        }
    }

    pub(crate) fn is_group(&self, id: NodeId) -> bool {
        matches!(self.node(id), NodeRecord::Group(_))
    }

    /// Split a path into its components, resolving a leading `/` to the
    /// root. Empty paths and empty components are rejected.
    fn components<'p>(
        start: NodeId,
        path: &'p str,
    ) -> Result<(NodeId, std::str::Split<'p, char>)> {
        let (base, rest) = match path.strip_prefix('/') {
            Some(rest) => (ROOT_NODE, rest),
            None => (start, path),
        };
        if rest.is_empty() || rest.split('/').any(str::is_empty) {
            return Err(VaultError::NotFound(format!("invalid path {path:?}")));
        }
        Ok((base, rest.split('/')))
    }

    /// Resolve a full path relative to `start` to a node.
    pub(crate) fn resolve(&self, start: NodeId, path: &str) -> Result<NodeId> {
        let (mut node, components) = Self::components(start, path)?;
        for name in components {
            node = *self
                .group(node)
                .map_err(|_| VaultError::NotFound(format!("{path:?}: not a group")))?
                .children
                .get(name)
                .ok_or_else(|| VaultError::NotFound(path.to_string()))?;
        }
        Ok(node)
    }

    /// Resolve all but the last component of a path, for creation. Returns
    /// the parent group and the leaf name. Intermediate components must name
    /// existing groups.
    pub(crate) fn resolve_parent(&self, start: NodeId, path: &str) -> Result<(NodeId, String)> {
        let (mut node, components) = Self::components(start, path)?;
        let mut components = components.peekable();
        loop {
            // components is non-empty after validation
            let name = components.next().unwrap();
            if components.peek().is_none() {
                return Ok((node, name.to_string()));
            }
            node = *self
                .group(node)
                .map_err(|_| VaultError::NotFound(format!("{path:?}: not a group")))?
                .children
                .get(name)
                .ok_or_else(|| {
                    VaultError::NotFound(format!("{path:?}: missing intermediate group {name:?}"))
                })?;
        }
    }

    /// Add a node under `parent` with the given leaf name. Fails on
    /// collision.
    pub(crate) fn insert(
        &mut self,
        parent: NodeId,
        name: String,
        record: NodeRecord,
    ) -> Result<NodeId> {
        if self.group(parent)?.children.contains_key(&name) {
            return Err(VaultError::Create(format!("path {name:?} already exists")));
        }
        let id = self.nodes.len() as NodeId;
        self.nodes.push(record);
        self.group_mut(parent)?.children.insert(name, id);
        Ok(id)
    }
}
