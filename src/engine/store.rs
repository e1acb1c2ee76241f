//! Container file store
//!
//! Physical layout of a container file:
//!
//! ```text
//! [header: magic(4) version(2) flags(2) catalog_offset(8)]
//! [data segments and catalog blocks, append-only]
//! ```
//!
//! A catalog block is `[len(4)][crc(4)][bincode payload]`. Flushing the
//! catalog appends a fresh block and rewrites the header pointer; superseded
//! blocks and rewritten dataset segments are simply orphaned (the file only
//! grows; free-space management is out of scope).

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::engine::catalog::Catalog;
use crate::error::{Result, VaultError};

const MAGIC: &[u8; 4] = b"GVLT";
const VERSION: u16 = 1;
const HEADER_SIZE: u64 = 16;
const CATALOG_OFFSET_POS: u64 = 8;

/// Open container file plus its append position.
pub(crate) struct Store {
    file: File,
    end: u64,
}

impl Store {
    /// Create a fresh container file and write its header and an empty
    /// catalog. With `overwrite` an existing target is truncated; without it
    /// an existing target is an error.
    pub(crate) fn create(path: &Path, overwrite: bool) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(path).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                VaultError::AlreadyExists(path.display().to_string())
            } else {
                VaultError::Io(e)
            }
        })?;

        let mut store = Self {
            file,
            end: HEADER_SIZE,
        };
        store.file.write_all(MAGIC)?;
        store.file.write_all(&VERSION.to_le_bytes())?;
        store.file.write_all(&0u16.to_le_bytes())?; // Flags, reserved
        store.file.write_all(&0u64.to_le_bytes())?; // Catalog offset placeholder
        store.flush_catalog(&Catalog::new())?;
        Ok(store)
    }

    /// Open an existing container file, validating the header and loading
    /// the current catalog.
    pub(crate) fn open(path: &Path, readonly: bool) -> Result<(Self, Catalog)> {
        let mut options = OpenOptions::new();
        options.read(true);
        if !readonly {
            options.write(true);
        }
        let mut file = options.open(path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                VaultError::NotFound(path.display().to_string())
            } else {
                VaultError::Io(e)
            }
        })?;
        let end = file.metadata()?.len();

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header).map_err(|_| {
            VaultError::Corrupt(format!("{}: truncated header", path.display()))
        })?;
        if &header[0..4] != MAGIC {
            return Err(VaultError::Corrupt(format!(
                "{}: bad magic {:?}",
                path.display(),
                &header[0..4]
            )));
        }
        let version = u16::from_le_bytes(header[4..6].try_into().unwrap());
        if version != VERSION {
            return Err(VaultError::Corrupt(format!(
                "{}: unsupported format version {version}",
                path.display()
            )));
        }
        let catalog_offset = u64::from_le_bytes(header[8..16].try_into().unwrap());

        let mut store = Self { file, end };
        let catalog = store.read_catalog(catalog_offset)?;
        Ok((store, catalog))
    }

    fn read_catalog(&mut self, offset: u64) -> Result<Catalog> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut frame = [0u8; 8];
        self.file
            .read_exact(&mut frame)
            .map_err(|_| VaultError::Corrupt("truncated catalog block".into()))?;
        let len = u32::from_le_bytes(frame[0..4].try_into().unwrap());
        let crc = u32::from_le_bytes(frame[4..8].try_into().unwrap());

        let mut payload = vec![0u8; len as usize];
        self.file
            .read_exact(&mut payload)
            .map_err(|_| VaultError::Corrupt("truncated catalog block".into()))?;
        if crc32fast::hash(&payload) != crc {
            return Err(VaultError::Corrupt("catalog checksum mismatch".into()));
        }
        bincode::deserialize(&payload)
            .map_err(|e| VaultError::Corrupt(format!("catalog decode failed: {e}")))
    }

    /// Append a catalog block and repoint the header at it.
    pub(crate) fn flush_catalog(&mut self, catalog: &Catalog) -> Result<()> {
        let payload =
            bincode::serialize(catalog).map_err(|e| VaultError::Serialization(e.to_string()))?;
        let crc = crc32fast::hash(&payload);
        let offset = self.end;

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&(payload.len() as u32).to_le_bytes())?;
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.write_all(&payload)?;
        self.end = offset + 8 + payload.len() as u64;

        self.file.seek(SeekFrom::Start(CATALOG_OFFSET_POS))?;
        self.file.write_all(&offset.to_le_bytes())?;
        self.file.sync_all()?;

        tracing::trace!(offset, len = payload.len(), "catalog flushed");
        Ok(())
    }

    /// Append one data segment, returning its offset.
    pub(crate) fn append_segment(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.end;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(bytes)?;
        self.end = offset + bytes.len() as u64;
        tracing::trace!(offset, len = bytes.len(), "segment appended");
        Ok(offset)
    }

    /// Read back one data segment.
    pub(crate) fn read_segment(&mut self, offset: u64, stored_len: u32) -> Result<Vec<u8>> {
        self.file.seek(SeekFrom::Start(offset))?;
        let mut bytes = vec![0u8; stored_len as usize];
        self.file
            .read_exact(&mut bytes)
            .map_err(|_| VaultError::Corrupt("truncated data segment".into()))?;
        Ok(bytes)
    }
}
