//! Authorization Manager — vault registry, digest verification, replay ledger
//!
//! Validates off-chain withdrawal authorizations on behalf of registered vaults:
//! - Registry of trusted vaults (administrator-only mutation)
//! - Canonical digest over (vault, recipient, amount, chain, nonce)
//! - Ed25519 verification against the fixed authorizer identity
//! - Per-vault replay ledger; each nonce is consumed at most once

use custody_types::ids::{Address, ChainId, Nonce};
use custody_types::numeric::Amount;
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::errors::AuthorizationError;
use crate::events::{AuthorizationRejected, ContractEvent, VaultRegistered};
use crate::security::{AccessControl, ReplayLedger};
use crate::signature::{self, AuthorizationDigest};

/// Proof that a nonce was consumed for one verified withdrawal.
///
/// Only the manager can create one. The vault hands it back to
/// [`AuthorizationManager::rollback`] if delivering the funds fails, which
/// keeps "nonce consumed" and "value delivered" a single atomic fact.
#[derive(Debug, PartialEq, Eq)]
pub struct AuthorizationReceipt {
    vault: Address,
    nonce: Nonce,
    digest: AuthorizationDigest,
}

impl AuthorizationReceipt {
    pub fn vault(&self) -> Address {
        self.vault
    }

    pub fn nonce(&self) -> Nonce {
        self.nonce
    }

    pub fn digest(&self) -> AuthorizationDigest {
        self.digest
    }
}

/// Read-only export of the manager's persisted state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub address: Address,
    pub authorizer: Address,
    pub registry: BTreeMap<Address, bool>,
    pub consumed: BTreeMap<Address, BTreeSet<Nonce>>,
}

/// Authorization service shared by one or more vaults.
///
/// The registry and replay ledger are private; every read and write goes
/// through the operations below.
#[derive(Debug)]
pub struct AuthorizationManager {
    /// Identity of this service instance
    address: Address,
    /// Identity whose signatures authorize withdrawals
    authorizer: Address,
    authorizer_key: VerifyingKey,
    /// Administrator gate for registry mutation (the authorizer)
    access_control: AccessControl,
    /// Vault trust flags
    registry: BTreeMap<Address, bool>,
    /// Consumed nonces, per vault
    ledger: ReplayLedger,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl AuthorizationManager {
    /// Create a manager with a fixed authorizer.
    ///
    /// Fails with `InvalidAuthorizer` if the authorizer address is not a
    /// valid Ed25519 verifying key.
    pub fn new(address: Address, authorizer: Address) -> Result<Self, AuthorizationError> {
        let authorizer_key = signature::authorizer_key(authorizer)?;
        Ok(Self {
            address,
            authorizer,
            authorizer_key,
            access_control: AccessControl::new(authorizer),
            registry: BTreeMap::new(),
            ledger: ReplayLedger::new(),
            events: Vec::new(),
        })
    }

    // ───────────────────────── Registry ─────────────────────────

    /// Set the trust flag for a vault. Administrator-only, idempotent.
    pub fn register_vault(
        &mut self,
        caller: &Address,
        vault: Address,
        trusted: bool,
    ) -> Result<ContractEvent, AuthorizationError> {
        if !self.access_control.is_admin(caller) {
            warn!(%caller, %vault, "rejected vault registration from non-administrator");
            return Err(AuthorizationError::Unauthorized);
        }

        self.registry.insert(vault, trusted);
        info!(%vault, trusted, "vault registration updated");

        let event = ContractEvent::VaultRegistered(VaultRegistered { vault, trusted });
        self.events.push(event.clone());
        Ok(event)
    }

    /// Check if a vault is currently trusted.
    pub fn is_vault_registered(&self, vault: &Address) -> bool {
        self.registry.get(vault).copied().unwrap_or(false)
    }

    // ───────────────────────── Verification ─────────────────────────

    /// Canonical digest the authorizer must sign for a withdrawal.
    pub fn compute_authorization_digest(
        &self,
        vault: Address,
        recipient: Address,
        amount: Amount,
        chain_id: ChainId,
        nonce: Nonce,
    ) -> AuthorizationDigest {
        signature::compute_authorization_digest(vault, recipient, amount, chain_id, nonce)
    }

    /// Verify a withdrawal authorization and consume its nonce.
    ///
    /// Checks, in order: vault trusted, nonce unused, signature by the
    /// authorizer over the recomputed digest. The nonce is recorded only
    /// when every check passes.
    pub fn verify_and_consume(
        &mut self,
        vault: Address,
        recipient: Address,
        amount: Amount,
        chain_id: ChainId,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<AuthorizationReceipt, AuthorizationError> {
        self.try_verify_and_consume(vault, recipient, amount, chain_id, nonce, signature)
            .map_err(|err| {
                self.log_rejection(vault, nonce, &err);
                err
            })
    }

    fn try_verify_and_consume(
        &mut self,
        vault: Address,
        recipient: Address,
        amount: Amount,
        chain_id: ChainId,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<AuthorizationReceipt, AuthorizationError> {
        if !self.is_vault_registered(&vault) {
            return Err(AuthorizationError::VaultNotRegistered { vault });
        }

        // Replays are refused before the signature is looked at.
        if self.ledger.is_consumed(&vault, &nonce) {
            return Err(AuthorizationError::NonceAlreadyUsed { vault, nonce });
        }

        let digest = self.compute_authorization_digest(vault, recipient, amount, chain_id, nonce);
        signature::verify_authorization(&self.authorizer_key, &digest, signature)?;

        if !self.ledger.consume(vault, nonce) {
            return Err(AuthorizationError::NonceAlreadyUsed { vault, nonce });
        }

        Ok(AuthorizationReceipt {
            vault,
            nonce,
            digest,
        })
    }

    /// Retract a consumption whose withdrawal could not be delivered.
    pub(crate) fn rollback(&mut self, receipt: AuthorizationReceipt) {
        if self.ledger.rollback(&receipt.vault, &receipt.nonce) {
            warn!(vault = %receipt.vault, nonce = %receipt.nonce, "nonce consumption rolled back");
        }
    }

    fn log_rejection(&self, vault: Address, nonce: Nonce, err: &AuthorizationError) {
        if let Some(rejected) = AuthorizationRejected::from_error(vault, nonce, err) {
            warn!(
                vault = %rejected.vault,
                nonce = %rejected.nonce,
                reason = ?rejected.reason,
                "authorization rejected"
            );
        }
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn authorizer(&self) -> Address {
        self.authorizer
    }

    /// Check if a nonce has been consumed for a vault.
    pub fn is_nonce_consumed(&self, vault: &Address, nonce: &Nonce) -> bool {
        self.ledger.is_consumed(vault, nonce)
    }

    /// Total consumed nonces across all vaults.
    pub fn consumed_nonce_count(&self) -> usize {
        self.ledger.count()
    }

    /// Export registry and ledger without mutating them.
    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            address: self.address,
            authorizer: self.authorizer,
            registry: self.registry.clone(),
            consumed: self.ledger.entries().clone(),
        }
    }

    // ───────────────────────── Events ─────────────────────────

    /// Get all emitted events.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ContractEvent> {
        std::mem::take(&mut self.events)
    }
}
