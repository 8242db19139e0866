//! Upgrade record storage. Progression is best-effort durable: read failures
//! fall back to defaults and write failures are logged and dropped.

use super::logic::{grant_ink, try_purchase};
use super::types::*;
use crate::core::constants::UPGRADE_SAVE_KEY;
use crate::utils::persistence::inkflip_dir;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("stored upgrade record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage is unavailable")]
    Unavailable,
}

/// A key-value store holding serialized records.
pub trait UpgradeStorage {
    /// Returns Ok(None) when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistenceError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Storage under `~/.inkflip/`.
    pub fn in_home() -> io::Result<Self> {
        Ok(Self::new(inkflip_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl UpgradeStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process storage. Also used when no home directory can be found.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    available: bool,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            available: true,
        }
    }

    /// Storage whose every operation fails, like a browser with storage
    /// disabled.
    pub fn unavailable() -> Self {
        Self {
            entries: HashMap::new(),
            available: false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.available {
            Ok(())
        } else {
            Err(PersistenceError::Unavailable)
        }
    }
}

impl UpgradeStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.check()?;
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.check()?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.check()?;
        self.entries.remove(key);
        Ok(())
    }
}

/// Loads and persists the [`UpgradeRecord`]. The record itself is owned by
/// the caller and passed into every mutating call, which writes it through
/// before returning.
#[derive(Debug, Clone)]
pub struct UpgradeStore<S: UpgradeStorage> {
    storage: S,
}

impl<S: UpgradeStorage> UpgradeStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Never fails: missing keys take defaults, unreadable records become
    /// the default record.
    pub fn load(&self) -> UpgradeRecord {
        match self.try_load() {
            Ok(Some(mut record)) => {
                record.clamp_levels();
                record
            }
            Ok(None) => UpgradeRecord::default(),
            Err(e) => {
                warn!(error = %e, "failed to load upgrades, using defaults");
                UpgradeRecord::default()
            }
        }
    }

    fn try_load(&self) -> Result<Option<UpgradeRecord>, PersistenceError> {
        match self.storage.read(UPGRADE_SAVE_KEY)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Persist the record. Failures are logged and swallowed.
    pub fn save(&mut self, record: &UpgradeRecord) {
        if let Err(e) = self.try_save(record) {
            warn!(error = %e, "failed to save upgrades");
        }
    }

    fn try_save(&mut self, record: &UpgradeRecord) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(record)?;
        self.storage.write(UPGRADE_SAVE_KEY, &json)
    }

    /// Buy the next level of `kind` and persist. On error nothing changes
    /// and nothing is written.
    pub fn purchase(
        &mut self,
        record: &mut UpgradeRecord,
        kind: UpgradeKind,
    ) -> Result<PurchaseReceipt, PurchaseError> {
        let receipt = try_purchase(record, kind)?;
        self.save(record);
        info!(
            upgrade = %kind,
            level = receipt.new_level,
            cost = receipt.cost,
            balance = receipt.balance,
            "upgrade purchased"
        );
        Ok(receipt)
    }

    /// Combat-clear reward. Returns the new balance.
    pub fn grant_reward(&mut self, record: &mut UpgradeRecord, amount: u32) -> u32 {
        let balance = grant_ink(record, amount);
        self.save(record);
        info!(amount, balance, "ink awarded");
        balance
    }

    /// Forget all progression.
    pub fn reset(&mut self) -> UpgradeRecord {
        if let Err(e) = self.storage.remove(UPGRADE_SAVE_KEY) {
            warn!(error = %e, "failed to clear upgrades");
        }
        UpgradeRecord::default()
    }
}

impl UpgradeStore<FileStorage> {
    /// Store under `~/.inkflip/`, or None if the home directory is unknown.
    pub fn in_home() -> Option<Self> {
        FileStorage::in_home().ok().map(Self::new)
    }
}
