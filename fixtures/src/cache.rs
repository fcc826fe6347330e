//! Load-once, restore-per-test fixture cache.
//!
//! A fixture is an async setup function taking a chain backend. The first
//! [`FixtureCache::load`] of a setup function runs it, snapshots the backend
//! and remembers the result. Every later `load` of the same function restores
//! that snapshot instead of running setup again, so each test starts from the
//! same baseline without paying for redeployment.
//!
//! Setup functions are keyed by their Rust type. Each `async fn` item (and
//! each closure) is a distinct lineage.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::future::Future;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{FixtureError, FixtureResult};

/// Chain state that can be captured and put back.
#[async_trait]
pub trait SnapshotBackend: Clone + Send + Sync + 'static {
    type Snapshot: Send + Sync + 'static;

    /// Capture the current state.
    async fn snapshot(&self) -> FixtureResult<Self::Snapshot>;

    /// Reset state to a previously captured snapshot.
    async fn restore(&self, snapshot: &Self::Snapshot) -> FixtureResult<()>;
}

/// Identity of a setup function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineageId {
    type_id: TypeId,
    name: &'static str,
}

impl LineageId {
    pub fn of<F: 'static>(_setup: &F) -> Self {
        Self {
            type_id: TypeId::of::<F>(),
            name: type_name::<F>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

struct CachedFixture<S> {
    value: Box<dyn Any + Send + Sync>,
    snapshot: S,
    restores: u64,
}

/// Memoizes fixture setups against one backend.
pub struct FixtureCache<B: SnapshotBackend> {
    backend: B,
    entries: Mutex<HashMap<LineageId, CachedFixture<B::Snapshot>>>,
}

impl<B: SnapshotBackend> FixtureCache<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run `setup` once per lineage; restore its snapshot on every later call.
    pub async fn load<F, Fut, T>(&self, setup: F) -> FixtureResult<T>
    where
        F: FnOnce(B) -> Fut + 'static,
        Fut: Future<Output = FixtureResult<T>>,
        T: Clone + Send + Sync + 'static,
    {
        let lineage = LineageId::of(&setup);

        // Held across setup so concurrent loaders never run it twice
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get_mut(&lineage) {
            return self.restore_entry(lineage, entry).await;
        }

        let (value, entry) = self.run_setup(lineage, setup).await?;
        entries.insert(lineage, entry);
        Ok(value)
    }

    /// Always run `setup`, replacing any cached result for its lineage.
    pub async fn create<F, Fut, T>(&self, setup: F) -> FixtureResult<T>
    where
        F: FnOnce(B) -> Fut + 'static,
        Fut: Future<Output = FixtureResult<T>>,
        T: Clone + Send + Sync + 'static,
    {
        let lineage = LineageId::of(&setup);
        let mut entries = self.entries.lock().await;

        let (value, entry) = self.run_setup(lineage, setup).await?;
        entries.insert(lineage, entry);
        Ok(value)
    }

    /// Restore the snapshot taken when `setup` was created.
    ///
    /// Fails if `setup` has not been created through this cache.
    pub async fn restore<F, T>(&self, setup: &F) -> FixtureResult<T>
    where
        F: 'static,
        T: Clone + Send + Sync + 'static,
    {
        let lineage = LineageId::of(setup);
        let mut entries = self.entries.lock().await;

        match entries.get_mut(&lineage) {
            Some(entry) => self.restore_entry(lineage, entry).await,
            None => Err(FixtureError::snapshot(format!(
                "fixture '{}' has not been created",
                lineage.name()
            ))),
        }
    }

    /// Whether `setup` has a cached snapshot.
    pub async fn contains<F: 'static>(&self, setup: &F) -> bool {
        let lineage = LineageId::of(setup);
        self.entries.lock().await.contains_key(&lineage)
    }

    /// How many times the snapshot of `setup` has been restored.
    pub async fn restore_count<F: 'static>(&self, setup: &F) -> u64 {
        let lineage = LineageId::of(setup);
        self.entries
            .lock()
            .await
            .get(&lineage)
            .map_or(0, |entry| entry.restores)
    }

    async fn run_setup<F, Fut, T>(
        &self,
        lineage: LineageId,
        setup: F,
    ) -> FixtureResult<(T, CachedFixture<B::Snapshot>)>
    where
        F: FnOnce(B) -> Fut,
        Fut: Future<Output = FixtureResult<T>>,
        T: Clone + Send + Sync + 'static,
    {
        info!("Running fixture setup '{}'", lineage.name());

        let value = setup(self.backend.clone()).await?;
        let snapshot = self.backend.snapshot().await?;

        debug!("Snapshot taken for fixture '{}'", lineage.name());

        let entry = CachedFixture {
            value: Box::new(value.clone()),
            snapshot,
            restores: 0,
        };
        Ok((value, entry))
    }

    async fn restore_entry<T>(
        &self,
        lineage: LineageId,
        entry: &mut CachedFixture<B::Snapshot>,
    ) -> FixtureResult<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        debug!("Restoring snapshot for fixture '{}'", lineage.name());

        let value = entry.value.downcast_ref::<T>().cloned().ok_or_else(|| {
            FixtureError::snapshot(format!(
                "fixture '{}' was cached with a different result type than {}",
                lineage.name(),
                type_name::<T>()
            ))
        })?;

        self.backend.restore(&entry.snapshot).await?;
        entry.restores += 1;

        Ok(value)
    }
}
