//! Repository handle: dispatches object lookups across loose storage and
//! packfiles.
//!
//! A [`Repository`] validates a directory layout once at `open()` time,
//! then owns the caches (`PackCache`, `DeltaCache`) and config
//! ([`RepoConfig`]) that every subsequent `open_object` call reuses.
//! Handles are cheap to open and are not shared across threads; callers
//! wanting parallelism open one handle per thread.

pub mod config;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use vcs_hash::ObjectId;
use vcs_loose::LooseObjectStore;
use vcs_object::{Object, ObjectType};
use vcs_pack::cache::{DeltaCache, PackCache};
use vcs_pack::chain::BaseResolver;
use vcs_pack::{chain, materialize};

pub use config::RepoConfig;

/// Errors surfaced by repository-level object lookups.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a repository: {0}")]
    NotARepository(PathBuf),

    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Loose(#[from] vcs_loose::LooseError),

    #[error(transparent)]
    Pack(#[from] vcs_pack::PackError),

    #[error(transparent)]
    Object(#[from] vcs_object::ObjectError),
}

/// A single open pack, kept around only for directory-scan bookkeeping;
/// the actual file handle lives in [`PackCache`], opened lazily on demand.
struct PackSlot {
    pack_path: PathBuf,
}

/// Dispatches object lookups across a repository's loose store and its
/// packfiles, caching open packs and inflated delta payloads along the way.
pub struct Repository {
    root: PathBuf,
    objects_dir: PathBuf,
    loose: LooseObjectStore,
    packs: Vec<PackSlot>,
    pack_cache: Mutex<PackCache>,
    delta_cache: Mutex<DeltaCache>,
    config: RepoConfig,
}

impl Repository {
    /// Open the repository at `path`, using [`RepoConfig::default`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepoError> {
        Self::open_with_config(path, RepoConfig::default())
    }

    /// Open the repository at `path` with an explicit [`RepoConfig`].
    ///
    /// `path` itself must contain `objects/` and `HEAD`, or `path/.git`
    /// must — matching a working tree checkout as well as a bare repo.
    pub fn open_with_config(path: impl AsRef<Path>, config: RepoConfig) -> Result<Self, RepoError> {
        let path = path.as_ref();
        let root = Self::locate_root(path)?;
        let objects_dir = root.join("objects");

        let loose = LooseObjectStore::open(&objects_dir);
        let packs = Self::discover_packs(&objects_dir);

        debug!(
            "opened repository at {} ({} pack(s) discovered)",
            root.display(),
            packs.len()
        );

        Ok(Self {
            root,
            objects_dir,
            loose,
            packs,
            pack_cache: Mutex::new(PackCache::new(config.pack_cache_capacity)),
            delta_cache: Mutex::new(DeltaCache::new(config.delta_cache_capacity)),
            config,
        })
    }

    /// Validate that `path` (or `path/.git`) has the layout of a repository
    /// and return the directory that directly contains `objects/`/`HEAD`.
    fn locate_root(path: &Path) -> Result<PathBuf, RepoError> {
        for candidate in [path.to_path_buf(), path.join(".git")] {
            if candidate.join("objects").is_dir() && candidate.join("HEAD").is_file() {
                return Ok(candidate);
            }
        }
        Err(RepoError::NotARepository(path.to_path_buf()))
    }

    /// Scan `objects/pack/` for `.pack` files, newest first (matching the
    /// on-disk discovery order used by the reference implementation).
    fn discover_packs(objects_dir: &Path) -> Vec<PackSlot> {
        let pack_dir = objects_dir.join("pack");
        let Ok(read_dir) = fs::read_dir(&pack_dir) else {
            return Vec::new();
        };

        let mut entries: Vec<_> = read_dir.filter_map(|e| e.ok()).collect();
        entries.sort_by_key(|e| {
            std::cmp::Reverse(e.metadata().and_then(|m| m.modified()).ok())
        });

        entries
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "pack"))
            .map(|pack_path| PackSlot { pack_path })
            .collect()
    }

    /// Path to the repository root (the directory containing `objects/`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The config this handle was opened with.
    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Look up `id`'s object type without fully materializing its content.
    pub fn object_type(&self, id: &ObjectId) -> Result<ObjectType, RepoError> {
        if let Some((obj_type, _)) = self.loose.read_header(id)? {
            return Ok(obj_type);
        }
        if let Some((obj_type, _)) = self.find_in_packs_header(id)? {
            return Ok(obj_type);
        }
        Err(RepoError::NotFound(*id))
    }

    /// Open and fully parse the object named by `id`.
    ///
    /// Tries the loose store first, then every known pack (resolving cross
    /// -pack REF_DELTA bases as needed).
    pub fn open_object(&self, id: &ObjectId) -> Result<Object, RepoError> {
        if let Some(obj) = self.loose.read(id)? {
            return Ok(obj);
        }

        if let Some((obj_type, data)) = self.find_in_packs(id)? {
            let obj = Object::parse_content(obj_type, &data)?;
            return Ok(obj);
        }

        Err(RepoError::NotFound(*id))
    }

    /// Materialize the raw (header-stripped) bytes of `id` into memory,
    /// along with its type. Used by the inspection CLI, which needs the raw
    /// payload rather than a parsed [`Object`].
    pub fn extract_to_mem(&self, id: &ObjectId) -> Result<(ObjectType, Vec<u8>), RepoError> {
        if let Some(obj) = self.loose.read(id)? {
            return Ok((obj.object_type(), obj.serialize_content()));
        }
        self.find_in_packs(id)?.ok_or(RepoError::NotFound(*id))
    }

    /// Materialize the raw bytes of `id` directly into `out`.
    pub fn extract_to_file(
        &self,
        id: &ObjectId,
        out: &mut impl std::io::Write,
    ) -> Result<ObjectType, RepoError> {
        let (obj_type, data) = self.extract_to_mem(id)?;
        out.write_all(&data)?;
        Ok(obj_type)
    }

    /// Check whether `id` exists loose or in any known pack, without
    /// materializing it.
    pub fn contains(&self, id: &ObjectId) -> bool {
        if self.loose.contains(id) {
            return true;
        }
        let mut cache = self.pack_cache.lock().unwrap();
        self.packs.iter().any(|slot| {
            cache
                .get_or_open(&slot.pack_path)
                .is_ok_and(|pack| pack.contains(id))
        })
    }

    fn find_in_packs(&self, id: &ObjectId) -> Result<Option<(ObjectType, Vec<u8>)>, RepoError> {
        let mut pack_cache = self.pack_cache.lock().unwrap();
        let mut delta_cache = self.delta_cache.lock().unwrap();

        for slot in &self.packs {
            let pack = match pack_cache.get_or_open(&slot.pack_path) {
                Ok(pack) => pack,
                Err(e) => {
                    warn!("skipping corrupt pack {}: {e}", slot.pack_path.display());
                    continue;
                }
            };
            let Some(offset) = pack.index().lookup(id) else {
                continue;
            };

            let mut resolver = CrossPackResolver {
                repo: self,
                pack_cache: &mut pack_cache,
                delta_cache: &mut delta_cache,
            };
            let (obj_type, data) = materialize::extract_to_mem(
                &pack,
                offset,
                &mut resolver,
                self.config.max_delta_depth,
            )?;
            return Ok(Some((obj_type, data)));
        }
        Ok(None)
    }

    fn find_in_packs_header(
        &self,
        id: &ObjectId,
    ) -> Result<Option<(ObjectType, usize)>, RepoError> {
        self.find_in_packs(id)
            .map(|found| found.map(|(t, data)| (t, data.len())))
    }
}

/// Resolves a REF_DELTA base not present in the pack currently being
/// walked by searching the repository's loose store, then its other packs.
///
/// Bounded by the number of packs in the repository: each candidate pack
/// is tried at most once per call, and a hit still goes through the same
/// depth-bounded chain resolution as any other lookup.
struct CrossPackResolver<'a> {
    repo: &'a Repository,
    pack_cache: &'a mut PackCache,
    delta_cache: &'a mut DeltaCache,
}

impl BaseResolver for CrossPackResolver<'_> {
    fn delta_cache(&mut self) -> Option<&mut DeltaCache> {
        Some(&mut *self.delta_cache)
    }

    fn resolve(&mut self, oid: &ObjectId) -> Option<(ObjectType, Vec<u8>)> {
        if let Ok(Some(obj)) = self.repo.loose.read(oid) {
            return Some((obj.object_type(), obj.serialize_content()));
        }

        for slot in &self.repo.packs {
            let pack = self.pack_cache.get_or_open(&slot.pack_path).ok()?;
            let Some(offset) = pack.index().lookup(oid) else {
                continue;
            };
            let mut nested = CrossPackResolver {
                repo: self.repo,
                pack_cache: self.pack_cache,
                delta_cache: self.delta_cache,
            };
            if let Ok((obj_type, data)) = materialize::extract_to_mem(
                &pack,
                offset,
                &mut nested,
                self.repo.config.max_delta_depth,
            ) {
                return Some((obj_type, data));
            }
        }
        None
    }
}
