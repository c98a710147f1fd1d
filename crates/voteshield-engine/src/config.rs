//! Engine configuration

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use voteshield_runtime::{Address, Result, VoteShieldError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Address of the poll contract; encrypted-input proofs are bound to it
    pub contract_address: Address,
    /// Default transaction sender for local tooling
    pub deployer: Address,
}

impl EngineConfig {
    pub fn new(contract_address: Address, deployer: Address) -> Self {
        Self { contract_address, deployer }
    }

    /// Fresh random contract and deployer addresses, for a newly deployed ledger.
    pub fn random() -> Self {
        Self {
            contract_address: Address::new(rand::random()),
            deployer: Address::new(rand::random()),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|e| VoteShieldError::serialization(e.to_string()))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VoteShieldError::serialization(e.to_string()))?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let config = EngineConfig::new(Address::new([1; 20]), Address::new([2; 20]));

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_config_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(EngineConfig::load(&path), Err(VoteShieldError::Serialization(_))));
    }

    #[test]
    fn test_random_configs_differ() {
        let (first, second) = (EngineConfig::random(), EngineConfig::random());
        assert_ne!(first.contract_address, second.contract_address);
    }
}
