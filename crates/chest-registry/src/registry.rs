use std::fmt;
use std::fs;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use chest_graph::{ChestGraph, ItemChest, ValidationReport};
use chest_schema::{MigrationContext, MigrationReport, Migrator, RegistryDocument};
use chest_types::{ChestId, ChestLocation, Coordinate, WorldRef, WorldResolver};

use crate::config::{RegistryConfig, WritePolicy};
use crate::error::{RegistryError, RegistryResult};
use crate::persist;
use crate::sink::MessageSink;

/// Cached document plus whether it holds unflushed changes.
#[derive(Default)]
struct CacheState {
    document: Option<RegistryDocument>,
    dirty: bool,
}

/// File-backed registry of chests and their sender/receiver links.
///
/// The document is loaded on first use and cached for the lifetime of the
/// registry. All access is serialized through one mutex, so a registry can
/// be shared across threads behind an `Arc`; reads return owned snapshots.
pub struct ChestRegistry {
    config: RegistryConfig,
    policy: WritePolicy,
    resolver: Arc<dyn WorldResolver>,
    sink: Option<Arc<dyn MessageSink>>,
    migrator: Migrator,
    state: Mutex<CacheState>,
}

impl ChestRegistry {
    /// Prepare the data directory and marker file.
    ///
    /// The data file itself is not touched until the first operation,
    /// unless `config.default_world` is set, in which case the document is
    /// loaded and migrated right away.
    pub fn open(config: RegistryConfig, resolver: Arc<dyn WorldResolver>) -> RegistryResult<Self> {
        Self::open_inner(config, resolver, None)
    }

    /// Like [`open`](Self::open), with `sink` attached before the document
    /// is first touched, so creation during an eager migration is reported.
    pub fn open_with_sink(
        config: RegistryConfig,
        resolver: Arc<dyn WorldResolver>,
        sink: Arc<dyn MessageSink>,
    ) -> RegistryResult<Self> {
        Self::open_inner(config, resolver, Some(sink))
    }

    fn open_inner(
        config: RegistryConfig,
        resolver: Arc<dyn WorldResolver>,
        sink: Option<Arc<dyn MessageSink>>,
    ) -> RegistryResult<Self> {
        fs::create_dir_all(&config.data_dir)?;
        persist::write_marker(&config.marker_path())?;

        let registry = Self {
            policy: config.write_policy(),
            config,
            resolver,
            sink,
            migrator: Migrator::default(),
            state: Mutex::new(CacheState::default()),
        };

        if let Some(world) = registry.config.default_world.clone() {
            registry.migrate(&world)?;
        }
        Ok(registry)
    }

    /// Report first-time creation of the data file to `sink`.
    ///
    /// Only covers creation that happens after this call; use
    /// [`open_with_sink`](Self::open_with_sink) when `default_world` is set.
    pub fn with_message_sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Override the write policy taken from the config.
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.policy
    }

    pub fn resolver(&self) -> &dyn WorldResolver {
        self.resolver.as_ref()
    }

    // ---------------------------------------------------------------
    // Identity
    // ---------------------------------------------------------------

    /// Derive the id of a chest at `location`.
    pub fn generate_id(&self, location: &ChestLocation) -> RegistryResult<ChestId> {
        Ok(ChestId::generate(location, self.resolver())?)
    }

    /// Build an unlinked chest at `location` with a derived id.
    pub fn new_chest(&self, location: ChestLocation) -> RegistryResult<ItemChest> {
        Ok(ItemChest::new(location, self.resolver())?)
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn version(&self) -> RegistryResult<u32> {
        self.read(|document| document.version)
    }

    pub fn get_chest_by_id(&self, id: &str) -> RegistryResult<Option<ItemChest>> {
        self.read(|document| document.chests.get_by_id(id).cloned())
    }

    /// The chest occupying `coordinate` with either half.
    pub fn get_chest_by_location(&self, coordinate: &Coordinate) -> RegistryResult<Option<ItemChest>> {
        self.read(|document| document.chests.get_by_location(coordinate).cloned())
    }

    pub fn is_sender(&self, id: &str) -> RegistryResult<bool> {
        self.read(|document| document.chests.is_sender(id))
    }

    /// Returns `true` if the (already resolved) chest has at least one sender.
    pub fn is_receiver(&self, chest: Option<&ItemChest>) -> bool {
        chest.is_some_and(ItemChest::is_receiver)
    }

    /// All chests with at least one receiver, in document order.
    pub fn senders(&self) -> RegistryResult<Vec<ItemChest>> {
        self.read(|document| document.chests.senders().into_iter().cloned().collect())
    }

    pub fn count_by_owner(&self, player: &str) -> RegistryResult<usize> {
        self.read(|document| document.chests.count_by_owner(player))
    }

    /// Snapshot of every tracked chest.
    pub fn chests(&self) -> RegistryResult<ChestGraph> {
        self.read(|document| document.chests.clone())
    }

    pub fn validate(&self) -> RegistryResult<ValidationReport> {
        self.read(|document| document.chests.validate())
    }

    /// Returns `true` once the document has been loaded into the cache.
    pub fn is_loaded(&self) -> RegistryResult<bool> {
        Ok(self.lock()?.document.is_some())
    }

    /// Returns `true` if the cache holds changes not yet written to disk.
    pub fn is_dirty(&self) -> RegistryResult<bool> {
        Ok(self.lock()?.dirty)
    }

    // ---------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------

    /// Track `chest`. Returns `false`, changing nothing, if its id is
    /// already tracked.
    ///
    /// An `Err` after a successful insert means the change is cached but
    /// could not be flushed.
    pub fn add_chest(&self, chest: ItemChest) -> RegistryResult<bool> {
        self.mutate("add_chest", |chests| {
            let added = chests.add_chest(chest);
            (added, added)
        })
    }

    /// Make `sender_id` send to `receiver_id`. Returns `false` if either
    /// chest is unknown.
    pub fn link(&self, receiver_id: &str, sender_id: &str) -> RegistryResult<bool> {
        self.mutate("link", |chests| {
            let already = chests.is_linked(receiver_id, sender_id);
            let linked = chests.link(receiver_id, sender_id);
            (linked, linked && !already)
        })
    }

    /// Drop the link from `sender_id` to `receiver_id`. Returns `false` if
    /// there was none.
    pub fn unlink(&self, receiver_id: &str, sender_id: &str) -> RegistryResult<bool> {
        self.mutate("unlink", |chests| {
            let unlinked = chests.unlink(receiver_id, sender_id);
            (unlinked, unlinked)
        })
    }

    /// Stop tracking a chest and scrub every link to it.
    pub fn remove_chest(&self, id: &str) -> RegistryResult<bool> {
        self.mutate("remove_chest", |chests| {
            let removed = chests.remove_chest(id);
            (removed, removed)
        })
    }

    // ---------------------------------------------------------------
    // Migration and persistence
    // ---------------------------------------------------------------

    /// Bring the document up to the current schema version.
    ///
    /// Does nothing if it is already current. Otherwise the migrated
    /// document is written immediately, whatever the write policy.
    pub fn migrate(&self, default_world: &WorldRef) -> RegistryResult<MigrationReport> {
        let mut state = self.lock()?;
        let document = self.document(&mut state)?;
        let ctx = MigrationContext::new(default_world, self.resolver.as_ref());
        let report = self.migrator.run(document, &ctx)?;

        if report.is_noop() {
            debug!(version = report.to_version, "registry document already current");
            return Ok(report);
        }

        info!(
            from = report.from_version,
            to = report.to_version,
            created = report.chests_created,
            backfilled = report.locations_backfilled,
            failed_links = report.failed_links.len(),
            "registry document migrated"
        );
        state.dirty = true;
        self.flush_locked(&mut state)?;
        Ok(report)
    }

    /// Write the cached document to disk.
    ///
    /// Returns `Ok(false)` if nothing has been loaded yet. On failure the
    /// cache is left as it was and the data file keeps its previous
    /// content.
    pub fn flush(&self) -> RegistryResult<bool> {
        let mut state = self.lock()?;
        self.flush_locked(&mut state)
    }

    /// Final flush of any pending changes.
    pub fn shutdown(self) -> RegistryResult<()> {
        let mut state = self.lock()?;
        if state.dirty {
            self.flush_locked(&mut state)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn lock(&self) -> RegistryResult<MutexGuard<'_, CacheState>> {
        self.state.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    fn read<T>(&self, f: impl FnOnce(&RegistryDocument) -> T) -> RegistryResult<T> {
        let mut state = self.lock()?;
        Ok(f(self.document(&mut state)?))
    }

    /// Apply a graph change. `f` returns the caller-facing result and
    /// whether the document actually changed.
    fn mutate(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut ChestGraph) -> (bool, bool),
    ) -> RegistryResult<bool> {
        let mut state = self.lock()?;
        let (result, changed) = f(&mut self.document(&mut state)?.chests);
        debug!(op, result, changed, "registry mutation");

        if changed {
            state.dirty = true;
            if !self.policy.is_deferred() {
                self.flush_locked(&mut state)?;
            }
        }
        Ok(result)
    }

    /// The cached document, loading or creating it on first use.
    fn document<'s>(&self, state: &'s mut CacheState) -> RegistryResult<&'s mut RegistryDocument> {
        let document = match state.document.take() {
            Some(document) => document,
            None => self.load_or_create()?,
        };
        Ok(state.document.insert(document))
    }

    fn load_or_create(&self) -> RegistryResult<RegistryDocument> {
        let path = self.config.data_path();
        if let Some(document) = persist::read_document(&path)? {
            let report = document.chests.validate();
            for violation in &report.violations {
                warn!(
                    chest = %violation.chest,
                    kind = ?violation.kind,
                    "{}",
                    violation.description
                );
            }
            return Ok(document);
        }

        let document = RegistryDocument::new();
        persist::write_document(&path, &document)?;
        info!(path = %path.display(), "created registry data file");
        if let Some(sink) = &self.sink {
            sink.send_message("created json file");
        }
        Ok(document)
    }

    fn flush_locked(&self, state: &mut CacheState) -> RegistryResult<bool> {
        let Some(document) = state.document.as_ref() else {
            return Ok(false);
        };
        let path = self.config.data_path();
        if let Err(e) = persist::write_document(&path, document) {
            warn!(path = %path.display(), error = %e, "registry flush failed");
            return Err(e);
        }
        state.dirty = false;
        Ok(true)
    }
}

impl fmt::Debug for ChestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChestRegistry")
            .field("data_path", &self.config.data_path())
            .field("policy", &self.policy)
            .field("migrator", &self.migrator)
            .finish()
    }
}
