use std::sync::Arc;

use log::{debug, warn};

use crate::errors::CoreError;
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::Investment;
#[cfg(not(target_arch = "wasm32"))]
use crate::models::settings::Settings;

use super::backend::KeyValueStore;
#[cfg(not(target_arch = "wasm32"))]
use super::backend::FileKeyValueStore;
use super::local::LocalStore;
use super::migration::migrate_investments;
use super::remote::{CloudRead, RemoteStore, Subscription};

/// What happened to a save.
///
/// Saves never fail as a whole: the local write comes first and the cloud
/// push is best-effort. Callers that care about sync state can inspect this.
#[derive(Debug, Default)]
pub struct PersistOutcome {
    pub persisted_locally: bool,
    pub persisted_remotely: bool,
    pub local_error: Option<CoreError>,
    pub remote_error: Option<CoreError>,
}

impl PersistOutcome {
    /// Stored locally and, if the cloud was reachable, there too.
    pub fn is_ok(&self) -> bool {
        self.local_error.is_none() && self.remote_error.is_none()
    }
}

/// Single entry point for reading and writing the canonical collection.
///
/// Hides the local/cloud topology:
/// - Reads prefer the cloud when it has data (overwriting the local copy),
///   seed the cloud from local data when it is empty, and fall back to local
///   storage otherwise.
/// - Writes go to local storage first, then to the cloud on a best-effort basis.
///
/// No method here ever returns an error; failures are logged and the best
/// available local data is used.
#[derive(Debug, Clone)]
pub struct StorageManager {
    local: LocalStore,
    remote: RemoteStore,
}

impl StorageManager {
    pub fn new(local: LocalStore, remote: RemoteStore) -> Self {
        Self { local, remote }
    }

    /// Device-only storage on the given backend.
    pub fn local_only(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::new(LocalStore::new(backend), RemoteStore::disabled())
    }

    /// File-backed local storage in `settings.data_dir`, mirrored to
    /// Firestore when cloud settings are present (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        let backend = FileKeyValueStore::open(&settings.data_dir)?;
        Ok(Self::new(
            LocalStore::new(Arc::new(backend)),
            RemoteStore::from_config(settings.cloud.clone()),
        ))
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn remote(&self) -> &RemoteStore {
        &self.remote
    }

    /// Resolve the canonical record collection.
    ///
    /// 1. Cloud has readable records: they win unconditionally, are mirrored
    ///    locally and returned migrated. Entries that fail to decode are left out.
    /// 2. Cloud is empty but something is stored locally: the local records
    ///    are pushed up once (failure ignored) and returned.
    /// 3. Otherwise: local storage, which falls back to seed data.
    ///
    /// The cloud is only ever seeded when it is known to be empty. A failed
    /// read, or a document whose entries are all unreadable, leaves it alone.
    pub async fn get_investments(&self) -> Vec<Investment> {
        if self.remote.availability() {
            match self.remote.read_investments().await {
                CloudRead::Entries { items, skipped } if !items.is_empty() => {
                    if skipped > 0 {
                        warn!("Left out {skipped} unreadable cloud investments");
                    }
                    debug!("Loaded {} investments from cloud", items.len());
                    self.local.write_all(&items);
                    return migrate_investments(items);
                }
                CloudRead::Entries { skipped, .. } => {
                    warn!("None of the {skipped} cloud investments are readable, using local data");
                }
                CloudRead::Unreachable => {
                    debug!("Cloud investments could not be read, using local data");
                }
                CloudRead::Empty => {
                    if let Some(local) = self.local.read_stored() {
                        if !local.is_empty() {
                            debug!("Cloud is empty, seeding it with {} local investments", local.len());
                            if let Err(e) = self.remote.push_all(&local).await {
                                warn!("Failed to seed cloud with local investments: {e}");
                            }
                        }
                        return local;
                    }
                }
            }
        }

        self.local.read_all()
    }

    /// Persist the full collection: locally first, then to the cloud if available.
    pub async fn save_investments(&self, investments: &[Investment]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        match self.local.try_write_all(investments) {
            Ok(()) => outcome.persisted_locally = true,
            Err(e) => {
                warn!("Failed to save investments locally: {e}");
                outcome.local_error = Some(e);
            }
        }

        if self.remote.availability() {
            match self.remote.push_all(investments).await {
                Ok(()) => outcome.persisted_remotely = true,
                Err(e) => {
                    warn!("Failed to save investments to cloud: {e}");
                    outcome.remote_error = Some(e);
                }
            }
        }

        outcome
    }

    /// Resolve fund-level current values with the same cloud-first policy as records.
    pub async fn get_fund_values(&self) -> Vec<FundCurrentValue> {
        if self.remote.availability() {
            match self.remote.read_fund_values().await {
                CloudRead::Entries { items, skipped } if !items.is_empty() => {
                    if skipped > 0 {
                        warn!("Left out {skipped} unreadable cloud fund values");
                    }
                    self.local.write_fund_values(&items);
                    return items;
                }
                CloudRead::Entries { .. } | CloudRead::Unreachable => {}
                CloudRead::Empty => {
                    let local = self.local.read_fund_values();
                    if !local.is_empty() {
                        if let Err(e) = self.remote.push_fund_values(&local).await {
                            warn!("Failed to seed cloud with local fund values: {e}");
                        }
                    }
                    return local;
                }
            }
        }

        self.local.read_fund_values()
    }

    pub async fn save_fund_values(&self, values: &[FundCurrentValue]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        match self.local.try_write_fund_values(values) {
            Ok(()) => outcome.persisted_locally = true,
            Err(e) => {
                warn!("Failed to save fund values locally: {e}");
                outcome.local_error = Some(e);
            }
        }

        if self.remote.availability() {
            match self.remote.push_fund_values(values).await {
                Ok(()) => outcome.persisted_remotely = true,
                Err(e) => {
                    warn!("Failed to save fund values to cloud: {e}");
                    outcome.remote_error = Some(e);
                }
            }
        }

        outcome
    }

    /// Follow cloud changes in real time.
    ///
    /// Every non-empty cloud snapshot overwrites local storage and is handed,
    /// migrated, to `on_change`. Unreadable entries are left out of a
    /// snapshot, and snapshots with nothing readable are ignored so a wiped or
    /// garbled cloud document never blanks the local view. `None` when the
    /// cloud is unavailable.
    pub fn subscribe<F>(&self, on_change: F) -> Option<Subscription>
    where
        F: Fn(Vec<Investment>) + Send + Sync + 'static,
    {
        let local = self.local.clone();
        self.remote.subscribe(move |cloud| {
            if cloud.is_empty() {
                return;
            }
            local.write_all(&cloud);
            on_change(migrate_investments(cloud));
        })
    }
}
