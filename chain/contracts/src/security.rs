//! Shared security primitives for contract modules
//!
//! Provides the reentrancy guard used by the vault, single-administrator
//! access control, and the replay-protection ledger owned by the
//! authorization manager.

use custody_types::ids::{Address, Nonce};
use std::collections::{BTreeMap, BTreeSet};

/// Reentrancy guard preventing nested calls into protected functions.
///
/// A contract function acquires the guard before executing state-changing
/// logic and releases it on completion. Any nested call attempt fails.
#[derive(Debug, Clone)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    /// Create a new unlocked guard.
    pub fn new() -> Self {
        Self { locked: false }
    }

    /// Acquire the guard. Returns `true` if successfully acquired.
    /// Returns `false` if already locked (reentrancy attempt).
    pub fn acquire(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    /// Release the guard.
    pub fn release(&mut self) {
        self.locked = false;
    }

    /// Check if currently locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }
}

impl Default for ReentrancyGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-administrator access control.
///
/// The administrator is fixed at construction; there is no transfer path.
#[derive(Debug, Clone)]
pub struct AccessControl {
    admin: Address,
}

impl AccessControl {
    pub fn new(admin: Address) -> Self {
        Self { admin }
    }

    /// Check if a caller is admin.
    pub fn is_admin(&self, caller: &Address) -> bool {
        *caller == self.admin
    }

    /// Get the administrator identity.
    pub fn admin(&self) -> Address {
        self.admin
    }
}

/// Replay-protection ledger of consumed nonces, scoped per vault.
///
/// The same nonce value may be consumed once by each vault, matching the
/// digest's inclusion of the vault identity. Entries are only removed by
/// crate-internal rollback of a consumption inside the same operation.
#[derive(Debug, Clone, Default)]
pub struct ReplayLedger {
    consumed: BTreeMap<Address, BTreeSet<Nonce>>,
}

impl ReplayLedger {
    /// Create a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a nonce has been consumed for a vault.
    pub fn is_consumed(&self, vault: &Address, nonce: &Nonce) -> bool {
        self.consumed
            .get(vault)
            .map_or(false, |nonces| nonces.contains(nonce))
    }

    /// Mark a nonce as consumed. Returns `false` if already consumed (replay attempt).
    pub fn consume(&mut self, vault: Address, nonce: Nonce) -> bool {
        self.consumed.entry(vault).or_default().insert(nonce)
    }

    /// Undo a consumption made earlier in the same operation.
    pub(crate) fn rollback(&mut self, vault: &Address, nonce: &Nonce) -> bool {
        let Some(nonces) = self.consumed.get_mut(vault) else {
            return false;
        };
        let removed = nonces.remove(nonce);
        if nonces.is_empty() {
            self.consumed.remove(vault);
        }
        removed
    }

    /// Number of consumed nonces across all vaults.
    pub fn count(&self) -> usize {
        self.consumed.values().map(BTreeSet::len).sum()
    }

    /// Consumed nonces grouped by vault, in deterministic order.
    pub fn entries(&self) -> &BTreeMap<Address, BTreeSet<Nonce>> {
        &self.consumed
    }
}
