//! Segment filter pipeline
//!
//! Optional per-segment transforms applied on the write path and inverted on
//! the read path: byte shuffle first, then deflate. Shuffle groups bytes by
//! position within each element (all byte-0s, then all byte-1s, ...), which
//! typically makes numeric data far more compressible.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Result, VaultError};

/// Shuffle (write direction): group bytes by position within each element.
///
/// `data` length must be a multiple of `element_size`.
pub(crate) fn shuffle(data: &[u8], element_size: usize) -> Vec<u8> {
    if element_size <= 1 {
        return data.to_vec();
    }
    debug_assert_eq!(data.len() % element_size, 0);
    let num_elements = data.len() / element_size;
    let mut result = vec![0u8; data.len()];

    for i in 0..num_elements {
        for j in 0..element_size {
            result[j * num_elements + i] = data[i * element_size + j];
        }
    }

    result
}

/// Unshuffle (read direction): reconstruct interleaved element bytes.
pub(crate) fn unshuffle(data: &[u8], element_size: usize) -> Vec<u8> {
    if element_size <= 1 {
        return data.to_vec();
    }
    debug_assert_eq!(data.len() % element_size, 0);
    let num_elements = data.len() / element_size;
    let mut result = vec![0u8; data.len()];

    for i in 0..num_elements {
        for j in 0..element_size {
            result[i * element_size + j] = data[j * num_elements + i];
        }
    }

    result
}

/// Compress a segment with zlib at the given level (0..=9).
pub(crate) fn deflate(data: &[u8], level: u32) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a zlib segment. `raw_len` is the expected output size; a
/// mismatch means the segment is damaged.
pub(crate) fn inflate(data: &[u8], raw_len: usize) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::with_capacity(raw_len);
    decoder
        .read_to_end(&mut out)
        .map_err(|e| VaultError::Corrupt(format!("segment decompression failed: {e}")))?;
    if out.len() != raw_len {
        return Err(VaultError::Corrupt(format!(
            "segment inflated to {} bytes, expected {}",
            out.len(),
            raw_len
        )));
    }
    Ok(out)
}
