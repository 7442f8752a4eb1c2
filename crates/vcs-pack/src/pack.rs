//! PackFile: reading .pack files.
//!
//! A pack file contains a header, a sequence of compressed objects
//! (possibly deltified), and a trailing checksum. This module only parses
//! entry headers and inflates their payloads; delta chain resolution lives
//! in [`crate::chain`].

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::bufread::ZlibDecoder;
use memmap2::Mmap;

use crate::entry::{parse_entry_header, PackEntry};
use crate::index::PackIndex;
use crate::{PackError, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_VERSION};

/// A memory-mapped packfile with its index.
pub struct PackFile {
    data: Mmap,
    index: PackIndex,
    pack_path: PathBuf,
    num_objects: u32,
}

impl PackFile {
    /// Open a pack file and its associated index.
    ///
    /// Given a `.pack` file path, opens both the pack and its `.idx` file.
    pub fn open(pack_path: impl AsRef<Path>) -> Result<Self, PackError> {
        let pack_path = pack_path.as_ref().to_path_buf();

        // Derive .idx path from .pack path
        let idx_path = pack_path.with_extension("idx");

        let file = std::fs::File::open(&pack_path)?;
        let data = unsafe { Mmap::map(&file)? };

        // Validate pack header
        if data.len() < PACK_HEADER_SIZE {
            return Err(PackError::BadPackFile("file too small".into()));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::BadPackFile("bad PACK signature".into()));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != PACK_VERSION {
            return Err(PackError::BadPackFile(format!(
                "unsupported pack version {version}"
            )));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        let index = PackIndex::open(&idx_path)?;

        // Validate object count matches between pack and index
        if index.num_objects() != num_objects {
            return Err(PackError::BadPackFile(format!(
                "pack has {} objects but index has {}",
                num_objects,
                index.num_objects()
            )));
        }

        Ok(Self {
            data,
            index,
            pack_path,
            num_objects,
        })
    }

    /// Parse and inflate the raw entry at `offset`.
    ///
    /// Returns the entry header metadata and the (still deltified, if
    /// applicable) inflated payload bytes.
    pub fn read_raw_entry(&self, offset: u64) -> Result<(PackEntry, Vec<u8>), PackError> {
        let entry = parse_entry_header(&self.data[offset as usize..], offset)?;
        let compressed = &self.data[entry.data_offset as usize..];
        let decompressed = decompress(compressed, entry.uncompressed_size, offset)?;
        Ok((entry, decompressed))
    }

    /// Check if this pack contains the given OID.
    pub fn contains(&self, oid: &vcs_hash::ObjectId) -> bool {
        self.index.lookup(oid).is_some()
    }

    /// Get the number of objects in this pack.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Get the pack index.
    pub fn index(&self) -> &PackIndex {
        &self.index
    }

    /// Get the path to the .pack file.
    pub fn path(&self) -> &Path {
        &self.pack_path
    }

    /// Get the raw memory-mapped pack data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Decompress zlib data with an expected uncompressed size.
pub(crate) fn decompress(
    compressed: &[u8],
    expected_size: usize,
    offset: u64,
) -> Result<Vec<u8>, PackError> {
    let mut decoder = ZlibDecoder::new(compressed);
    let mut buf = Vec::with_capacity(expected_size);
    decoder
        .read_to_end(&mut buf)
        .map_err(|_| PackError::BadPackFile(format!("inflate failed at offset {offset}")))?;
    Ok(buf)
}
