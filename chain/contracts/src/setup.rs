//! Staged deployment of the custody system
//!
//! The manager must trust the vault and the vault must know the manager.
//! The cycle is broken in three explicit phases:
//! 1. Create the authorization manager with the fixed authorizer
//! 2. Create the vault bound to the manager's address
//! 3. Register the vault with the manager (administrator call)

use custody_types::ids::{Address, Nonce};
use custody_types::numeric::Amount;
use tracing::info;

use crate::authorization::AuthorizationManager;
use crate::config::{CustodyConfig, ExecutionContext};
use crate::errors::{SetupError, VaultError};
use crate::events::ContractEvent;
use crate::signature::AuthorizationDigest;
use crate::vault::{Recipient, SecureVault};

/// A deployed manager and vault pair sharing one execution context.
#[derive(Debug)]
pub struct CustodySystem {
    pub manager: AuthorizationManager,
    pub vault: SecureVault,
    pub context: ExecutionContext,
}

impl CustodySystem {
    /// Run the three setup phases from a validated configuration.
    ///
    /// The authorizer doubles as administrator, so it performs the
    /// registration in phase 3.
    pub fn deploy(config: &CustodyConfig) -> Result<Self, SetupError> {
        config.validate()?;

        let mut manager = AuthorizationManager::new(config.manager_address, config.authorizer)?;
        info!(
            manager = %manager.address(),
            authorizer = %config.authorizer,
            "authorization manager created"
        );

        let vault = SecureVault::new(config.vault_address, manager.address());
        info!(vault = %vault.address(), manager = %vault.manager(), "vault created");

        manager.register_vault(&config.authorizer, vault.address(), true)?;

        Ok(Self {
            manager,
            vault,
            context: config.context(),
        })
    }

    /// Digest an off-chain signer must sign for a withdrawal from this vault.
    pub fn authorization_digest(
        &self,
        recipient: Address,
        amount: Amount,
        nonce: Nonce,
    ) -> AuthorizationDigest {
        self.manager.compute_authorization_digest(
            self.vault.address(),
            recipient,
            amount,
            self.context.chain_id,
            nonce,
        )
    }

    /// Inbound transfer to the vault.
    pub fn deposit(&mut self, from: Address, amount: Amount) -> Result<ContractEvent, VaultError> {
        self.vault.deposit(from, amount)
    }

    /// Withdraw from the vault through its bound manager.
    pub fn withdraw(
        &mut self,
        recipient: &mut dyn Recipient,
        amount: Amount,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<ContractEvent, VaultError> {
        self.vault.withdraw(
            &mut self.manager,
            &self.context,
            recipient,
            amount,
            nonce,
            signature,
        )
    }
}
