//! Durable ledger snapshots
//!
//! The whole engine state (configuration, registry, ballots, tallies and the
//! FHE service's own store) is written as one JSON document. Writes go to a
//! temporary file in the target directory and are renamed into place, so a
//! crash mid-write never leaves a torn ledger behind.

use std::{
    fs,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;
use voteshield_runtime::{Result, VoteShieldError};

use crate::{
    config::EngineConfig,
    fhe::FheService,
    lifecycle::{LedgerState, VoteShield},
};

#[derive(Serialize)]
struct SnapshotRef<'a, F> {
    config: &'a EngineConfig,
    state: &'a LedgerState,
    fhe: &'a F,
}

#[derive(Deserialize)]
struct Snapshot<F> {
    config: EngineConfig,
    state: LedgerState,
    fhe: F,
}

pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    pub fn load<F>(&self) -> Result<VoteShield<F>>
    where
        F: FheService + DeserializeOwned,
    {
        let content = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot<F> = serde_json::from_str(&content)
            .map_err(|e| VoteShieldError::serialization(format!("{:?}: {}", self.path, e)))?;

        debug!(path = ?self.path, polls = snapshot.state.registry.poll_count(), "ledger loaded");
        Ok(VoteShield::from_parts(snapshot.config, snapshot.state, snapshot.fhe))
    }

    /// Writes an empty ledger for a newly deployed engine.
    ///
    /// Refuses to overwrite an existing ledger file.
    pub fn init<F>(&self, config: EngineConfig, fhe: F) -> Result<VoteShield<F>>
    where
        F: FheService + Serialize,
    {
        if self.exists() {
            let message = format!("ledger already exists at {:?}", self.path);
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, message).into());
        }

        let engine = VoteShield::new(config, fhe);
        self.save(&engine)?;
        Ok(engine)
    }

    /// Writes the full snapshot, including every ciphertext the service still holds.
    pub fn save<F>(&self, engine: &VoteShield<F>) -> Result<()>
    where
        F: FheService + Serialize,
    {
        let dir = self.directory();
        fs::create_dir_all(dir)?;

        let snapshot =
            SnapshotRef { config: engine.config(), state: engine.state(), fhe: engine.fhe() };
        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, &snapshot)
                .map_err(|e| VoteShieldError::serialization(e.to_string()))?;
            writer.flush()?;
        }
        file.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = ?self.path, "ledger saved");
        Ok(())
    }
}
