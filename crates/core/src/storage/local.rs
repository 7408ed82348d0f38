use std::sync::Arc;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::CoreError;
use crate::models::fund_value::FundCurrentValue;
use crate::models::investment::Investment;

use super::backend::KeyValueStore;
use super::migration::migrate_investments;
use super::seed::seed_investments;

/// Key holding the JSON array of investment records.
pub const INVESTMENTS_KEY: &str = "portfolio-investments";

/// Key holding the JSON array of fund-level current values.
pub const FUND_VALUES_KEY: &str = "portfolio-fund-current-values";

/// Device-local persistence of the full record set and the fund values.
///
/// Reads never fail: missing or corrupt data degrades to the seed dataset
/// (records) or an empty list (fund values). Every write replaces the whole
/// collection.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Read all records, migrated to the current schema.
    ///
    /// First run (nothing stored): the seed dataset is persisted and returned.
    /// Unreadable data: the seed dataset is returned and the stored blob is
    /// left alone so it can still be recovered by hand.
    pub fn read_all(&self) -> Vec<Investment> {
        match self.backend.get(INVESTMENTS_KEY) {
            Ok(None) => {
                debug!("No local investments found, seeding initial data");
                let seed = seed_investments();
                self.write_all(&seed);
                seed
            }
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Investment>>(&raw) {
                Ok(investments) => migrate_investments(investments),
                Err(e) => {
                    warn!("Stored investments are unreadable, using seed data: {e}");
                    seed_investments()
                }
            },
            Err(e) => {
                warn!("Failed to read local investments, using seed data: {e}");
                seed_investments()
            }
        }
    }

    /// Read the stored records without any seed fallback.
    ///
    /// `None` means nothing usable is stored; `Some(vec![])` means an empty
    /// collection was saved on purpose.
    pub fn read_stored(&self) -> Option<Vec<Investment>> {
        let raw = match self.backend.get(INVESTMENTS_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read local investments: {e}");
                return None;
            }
        };
        match serde_json::from_str::<Vec<Investment>>(&raw) {
            Ok(investments) => Some(migrate_investments(investments)),
            Err(e) => {
                warn!("Stored investments are unreadable: {e}");
                None
            }
        }
    }

    /// Replace the stored records. Failures are logged and swallowed; the
    /// caller's in-memory copy stays authoritative for the session.
    pub fn write_all(&self, investments: &[Investment]) {
        if let Err(e) = self.try_write_all(investments) {
            warn!("Failed to save investments locally: {e}");
        }
    }

    /// Replace the stored records, reporting failure.
    pub fn try_write_all(&self, investments: &[Investment]) -> Result<(), CoreError> {
        self.write_json(INVESTMENTS_KEY, investments)
    }

    /// Read fund-level current values. Missing or unreadable data yields an empty list.
    pub fn read_fund_values(&self) -> Vec<FundCurrentValue> {
        self.read_json(FUND_VALUES_KEY).unwrap_or_default()
    }

    /// Replace the stored fund values, swallowing failures.
    pub fn write_fund_values(&self, values: &[FundCurrentValue]) {
        if let Err(e) = self.try_write_fund_values(values) {
            warn!("Failed to save fund values locally: {e}");
        }
    }

    pub fn try_write_fund_values(&self, values: &[FundCurrentValue]) -> Result<(), CoreError> {
        self.write_json(FUND_VALUES_KEY, values)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read local key {key}: {e}");
                return None;
            }
        };
        serde_json::from_str(&raw)
            .map_err(|e| warn!("Local key {key} is unreadable: {e}"))
            .ok()
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string(value)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize {key}: {e}")))?;
        self.backend.set(key, &json)
    }
}
