//! Deployment-time configuration and the execution environment
//!
//! `CustodyConfig` carries the values the deployer supplies: the authorizer
//! identity and the addresses the two services are instantiated at.
//! `ExecutionContext` carries what the running environment provides; the
//! chain identifier is read from there, never configured on the vault.

use custody_types::ids::{Address, ChainId};
use serde::{Deserialize, Serialize};

use crate::errors::SetupError;
use crate::signature;

/// Execution environment visible to contract operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Identifier of the network executing the operation
    pub chain_id: ChainId,
}

impl ExecutionContext {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(ChainId::LOCAL_DEVNET)
    }
}

/// Custody system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodyConfig {
    /// Network the system is deployed on
    pub chain_id: ChainId,
    /// Address of the authorization manager instance
    pub manager_address: Address,
    /// Address of the vault instance
    pub vault_address: Address,
    /// Ed25519 verifying key of the authorizer (also the administrator)
    pub authorizer: Address,
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            chain_id: ChainId::LOCAL_DEVNET,
            manager_address: Address::derive("custody/authorization-manager"),
            vault_address: Address::derive("custody/secure-vault"),
            authorizer: Address::ZERO,
        }
    }
}

impl CustodyConfig {
    /// Config with default addresses for the given authorizer.
    pub fn with_authorizer(authorizer: Address) -> Self {
        Self {
            authorizer,
            ..Self::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SetupError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| SetupError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a working deployment.
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.authorizer == Address::ZERO {
            return Err(SetupError::InvalidConfig("authorizer must be set".to_string()));
        }
        signature::authorizer_key(self.authorizer)?;
        if self.manager_address == self.vault_address {
            return Err(SetupError::InvalidConfig(
                "manager and vault addresses must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Execution context for the configured network.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.chain_id)
    }
}
