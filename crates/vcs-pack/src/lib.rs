//! Packfile reading and delta resolution.
//!
//! This crate implements reading git's packfile format: the index (fan-out
//! table + binary search), the pack itself (variable-length object headers,
//! zlib payloads, OFS/REF delta references), iterative delta chain
//! resolution across pack boundaries, and the bounded caches that keep
//! repeated reads cheap.

pub mod cache;
pub mod chain;
pub mod delta;
pub mod entry;
pub mod index;
pub mod materialize;
pub mod pack;

use vcs_hash::ObjectId;
use vcs_object::ObjectType;

/// Errors that can occur during pack operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    /// The requested object does not exist anywhere reachable.
    #[error("object not found: {0}")]
    NoObj(ObjectId),

    /// Malformed pack index (bad signature, version, or truncated tables).
    #[error("invalid pack index: {0}")]
    BadPackIdx(String),

    /// Pack index trailer checksum did not match the computed SHA-1.
    #[error("pack index checksum mismatch: expected {expected}, got {actual}")]
    PackIdxCsum { expected: ObjectId, actual: ObjectId },

    /// Malformed pack file (bad signature, version, entry header, or zlib stream).
    #[error("invalid pack file: {0}")]
    BadPackFile(String),

    /// A delta instruction stream or chain could not be resolved.
    #[error("bad delta chain: {0}")]
    BadDeltaChain(String),

    /// Delta chain exceeded the configured maximum depth.
    #[error("delta chain too deep (>{max_depth} levels) at offset {offset}")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },

    /// A REF_DELTA base could not be found in this pack or any other open pack.
    #[error("delta base not found: {0}")]
    MissingBase(ObjectId),

    /// Object bytes did not parse as the claimed object type.
    #[error("object type error: {0}")]
    ObjType(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Object(#[from] vcs_object::ObjectError),

    #[error(transparent)]
    Hash(#[from] vcs_hash::HashError),

    #[error(transparent)]
    TempFile(#[from] vcs_utils::UtilError),
}

/// Type of a packed object entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackEntryType {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta with offset to base in same pack.
    OfsDelta { base_offset: u64 },
    /// Delta referencing base by OID.
    RefDelta { base_oid: ObjectId },
}

impl PackEntryType {
    /// Convert a non-delta pack entry type to an ObjectType.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta { .. } | Self::RefDelta { .. } => None,
        }
    }

    /// Type number as used in pack entry headers.
    pub fn type_number(&self) -> u8 {
        match self {
            Self::Commit => 1,
            Self::Tree => 2,
            Self::Blob => 3,
            Self::Tag => 4,
            Self::OfsDelta { .. } => 6,
            Self::RefDelta { .. } => 7,
        }
    }
}

/// A fully resolved object read from a packfile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedObject {
    pub obj_type: ObjectType,
    pub data: Vec<u8>,
}

/// Pack format constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Pack index v2 constants.
pub const IDX_SIGNATURE: [u8; 4] = [0xff, 0x74, 0x4f, 0x63]; // "\377tOc"
pub const IDX_VERSION: u32 = 2;

/// Maximum delta chain depth before we bail out.
pub const MAX_DELTA_CHAIN_DEPTH: usize = 50;

/// Number of open (index, pack) pairs [`cache::PackCache`] keeps resident.
pub const PACK_CACHE_CAPACITY: usize = 4;

/// Number of inflated delta payloads [`cache::DeltaCache`] keeps per pack.
pub const DELTA_CACHE_CAPACITY: usize = 256;

/// Objects at or below this size are materialized entirely in memory by
/// [`materialize`]; larger objects spill to a temp file.
pub const IN_MEMORY_THRESHOLD: usize = 8 * 1024 * 1024;
