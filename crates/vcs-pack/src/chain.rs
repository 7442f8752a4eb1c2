//! Iterative delta chain resolution.
//!
//! A packed object may be stored as a chain of deltas, each applied against
//! the one before it, terminating in a non-delta base. OFS_DELTA bases live
//! at a known byte offset in the same pack; REF_DELTA bases are named by
//! OID and may live in this pack or another pack entirely. We walk the
//! chain with an explicit loop (never recursion) so a maliciously deep or
//! cyclic chain fails with [`PackError::DeltaChainTooDeep`] instead of
//! blowing the stack.

use std::sync::Arc;

use vcs_hash::ObjectId;
use vcs_object::ObjectType;

use crate::cache::DeltaCache;
use crate::delta::apply::apply_delta;
use crate::entry::{parse_entry_header, PackEntry};
use crate::pack::{decompress, PackFile};
use crate::{PackEntryType, PackError, PackedObject, MAX_DELTA_CHAIN_DEPTH};

/// Resolves REF_DELTA bases that are not present in the pack currently
/// being walked.
pub trait BaseResolver {
    /// Look up a base object by OID outside the current pack.
    fn resolve(&mut self, oid: &ObjectId) -> Option<(ObjectType, Vec<u8>)>;

    /// The delta cache backing this resolver's lookups, if it has one.
    /// Chain resolution consults this to skip re-inflating a delta body
    /// it has already seen. Resolvers with no cache (e.g. one-off,
    /// single-pack reads) return `None`, which simply disables caching.
    fn delta_cache(&mut self) -> Option<&mut DeltaCache> {
        None
    }
}

impl<F> BaseResolver for F
where
    F: FnMut(&ObjectId) -> Option<(ObjectType, Vec<u8>)>,
{
    fn resolve(&mut self, oid: &ObjectId) -> Option<(ObjectType, Vec<u8>)> {
        self(oid)
    }
}

/// A resolver that never finds anything — used when only a single pack's
/// contents are in scope.
pub struct NoCrossPackBases;

impl BaseResolver for NoCrossPackBases {
    fn resolve(&mut self, _oid: &ObjectId) -> Option<(ObjectType, Vec<u8>)> {
        None
    }
}

/// Read an object by OID from a single pack, resolving any delta chain
/// that stays entirely within that pack.
pub fn read_object(pack: &PackFile, oid: &ObjectId) -> Result<Option<PackedObject>, PackError> {
    read_object_with_resolver(pack, oid, &mut NoCrossPackBases)
}

/// Read an object by OID, falling back to `resolver` for REF_DELTA bases
/// not present in `pack`.
pub fn read_object_with_resolver(
    pack: &PackFile,
    oid: &ObjectId,
    resolver: &mut dyn BaseResolver,
) -> Result<Option<PackedObject>, PackError> {
    match pack.index().lookup(oid) {
        Some(offset) => {
            resolve_at_offset(pack, offset, resolver, MAX_DELTA_CHAIN_DEPTH).map(Some)
        }
        None => Ok(None),
    }
}

/// Where a delta chain bottoms out.
enum Terminus {
    /// A non-delta entry found within the same pack.
    InPackBase {
        offset: u64,
        entry: PackEntry,
        obj_type: ObjectType,
    },
    /// A REF_DELTA base supplied by the cross-pack resolver.
    CrossPackBase { obj_type: ObjectType, data: Vec<u8> },
}

/// Resolve the object stored at `offset`, walking OFS/REF delta chains
/// iteratively until a base object is found, never descending past
/// `max_depth` levels.
///
/// This walks the chain in two passes. The first pass follows entry headers
/// only, target-to-base, without inflating any payload, so discovering the
/// chain's shape costs nothing beyond header reads. The second pass applies
/// deltas base-to-target, inflating and discarding one delta body at a time
/// against a single rolling output buffer, so peak memory stays close to one
/// working buffer regardless of how deep the chain runs.
pub fn resolve_at_offset(
    pack: &PackFile,
    offset: u64,
    resolver: &mut dyn BaseResolver,
    max_depth: usize,
) -> Result<PackedObject, PackError> {
    let mut deltas: Vec<(u64, PackEntry)> = Vec::new();
    let mut current_offset = offset;
    let mut depth = 0;

    let terminus = loop {
        if depth >= max_depth {
            return Err(PackError::DeltaChainTooDeep { offset, max_depth });
        }
        depth += 1;

        let entry = parse_entry_header(&pack.data()[current_offset as usize..], current_offset)?;

        match entry.entry_type {
            PackEntryType::Commit | PackEntryType::Tree | PackEntryType::Blob | PackEntryType::Tag => {
                let obj_type = entry.entry_type.to_object_type().expect("non-delta type");
                break Terminus::InPackBase {
                    offset: current_offset,
                    entry,
                    obj_type,
                };
            }
            PackEntryType::OfsDelta { base_offset } => {
                deltas.push((current_offset, entry));
                current_offset = base_offset;
            }
            PackEntryType::RefDelta { base_oid } => {
                if let Some(base_offset) = pack.index().lookup(&base_oid) {
                    deltas.push((current_offset, entry));
                    current_offset = base_offset;
                } else if let Some((obj_type, base_data)) = resolver.resolve(&base_oid) {
                    deltas.push((current_offset, entry));
                    break Terminus::CrossPackBase {
                        obj_type,
                        data: base_data,
                    };
                } else {
                    return Err(PackError::MissingBase(base_oid));
                }
            }
        }
    };

    let (obj_type, mut data) = match terminus {
        Terminus::InPackBase {
            offset: base_offset,
            entry,
            obj_type,
        } => {
            let compressed = &pack.data()[entry.data_offset as usize..];
            let decompressed = decompress(compressed, entry.uncompressed_size, base_offset)?;
            (obj_type, decompressed)
        }
        Terminus::CrossPackBase { obj_type, data } => (obj_type, data),
    };

    for (entry_offset, entry) in deltas.iter().rev() {
        let delta_bytes = inflate_delta_body(pack, *entry_offset, entry, resolver.delta_cache())?;
        data = apply_delta(&data, &delta_bytes)?;
    }

    Ok(PackedObject { obj_type, data })
}

/// Inflate a delta entry's body, consulting and populating `cache` if one
/// is available so walking the same chain twice doesn't re-run zlib.
fn inflate_delta_body(
    pack: &PackFile,
    entry_offset: u64,
    entry: &PackEntry,
    cache: Option<&mut DeltaCache>,
) -> Result<Arc<Vec<u8>>, PackError> {
    match cache {
        Some(cache) => {
            if let Some(cached) = cache.get(pack.path(), entry_offset) {
                return Ok(cached);
            }
            let compressed = &pack.data()[entry.data_offset as usize..];
            let inflated = Arc::new(decompress(compressed, entry.uncompressed_size, entry_offset)?);
            cache.insert(pack.path(), entry_offset, inflated.clone());
            Ok(inflated)
        }
        None => {
            let compressed = &pack.data()[entry.data_offset as usize..];
            Ok(Arc::new(decompress(
                compressed,
                entry.uncompressed_size,
                entry_offset,
            )?))
        }
    }
}
