//! Repository-level configuration: cache sizes and resolution bounds.
//!
//! A plain value struct, not a file-backed configuration system — there is
//! no `.git/config` parser here, since reference resolution beyond reading
//! a name is out of scope. Every field has a default matching the values
//! named throughout the object-access core; the CLI overrides them via
//! flags rather than a config file.

/// Tunable limits for a single [`crate::Repository`] handle.
///
/// Every [`crate::Repository`] owns its own config and its own caches —
/// these are never process-global, so two handles opened in the same
/// process with different configs behave independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoConfig {
    /// Number of open `(index, pack)` pairs the pack cache keeps resident.
    pub pack_cache_capacity: usize,
    /// Number of inflated delta payloads the delta cache keeps, per pack.
    pub delta_cache_capacity: usize,
    /// Maximum delta chain depth before resolution gives up.
    pub max_delta_depth: usize,
    /// Objects at or below this size materialize in memory; larger ones
    /// spill to a temp file.
    pub in_mem_threshold: u64,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            pack_cache_capacity: vcs_pack::PACK_CACHE_CAPACITY,
            delta_cache_capacity: vcs_pack::DELTA_CACHE_CAPACITY,
            max_delta_depth: vcs_pack::MAX_DELTA_CHAIN_DEPTH,
            in_mem_threshold: vcs_pack::IN_MEMORY_THRESHOLD as u64,
        }
    }
}
