//! Contract events for external auditing and indexing
//!
//! Events are immutable records emitted by contract operations.

use custody_types::ids::{Address, Nonce};
use custody_types::numeric::Amount;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AuthorizationError;

/// Vault trust flag set by the administrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRegistered {
    pub vault: Address,
    pub trusted: bool,
}

/// Inbound value credited to a vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub vault: Address,
    pub from: Address,
    pub amount: Amount,
}

/// Authorized value delivered to a recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalCompleted {
    pub withdrawal_id: Uuid,
    pub vault: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub nonce: Nonce,
}

/// Why a verification request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionReason {
    VaultNotRegistered,
    NonceAlreadyUsed,
    InvalidSignature,
}

impl RejectionReason {
    /// Reason for an authorization error, if it is a verification outcome.
    pub fn from_error(err: &AuthorizationError) -> Option<Self> {
        match err {
            AuthorizationError::VaultNotRegistered { .. } => Some(Self::VaultNotRegistered),
            AuthorizationError::NonceAlreadyUsed { .. } => Some(Self::NonceAlreadyUsed),
            AuthorizationError::InvalidSignature => Some(Self::InvalidSignature),
            AuthorizationError::Unauthorized | AuthorizationError::InvalidAuthorizer { .. } => None,
        }
    }
}

/// Verification request refused by the authorization manager.
///
/// Not kept in any component's log; failed calls leave no state behind.
/// Built from the returned error for logging and off-chain indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRejected {
    pub vault: Address,
    pub nonce: Nonce,
    pub reason: RejectionReason,
}

impl AuthorizationRejected {
    pub fn from_error(vault: Address, nonce: Nonce, err: &AuthorizationError) -> Option<Self> {
        RejectionReason::from_error(err).map(|reason| Self {
            vault,
            nonce,
            reason,
        })
    }
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    VaultRegistered(VaultRegistered),
    Deposited(Deposited),
    WithdrawalCompleted(WithdrawalCompleted),
}
