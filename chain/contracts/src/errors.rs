//! Contract-specific error types
//!
//! Error taxonomy for authorization, custody, and setup operations. Every
//! variant corresponds to a full rollback: the failing operation leaves no
//! state change behind.

use custody_types::ids::{Address, Nonce};
use custody_types::numeric::Amount;
use thiserror::Error;

/// Authorization manager errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AuthorizationError {
    #[error("Unauthorized: caller is not the administrator")]
    Unauthorized,

    #[error("Vault not registered: {vault}")]
    VaultNotRegistered { vault: Address },

    #[error("Nonce already used: vault {vault}, nonce {nonce}")]
    NonceAlreadyUsed { vault: Address, nonce: Nonce },

    #[error("Invalid signature for withdrawal authorization")]
    InvalidSignature,

    #[error("Invalid authorizer key: {authorizer}")]
    InvalidAuthorizer { authorizer: Address },
}

/// Vault-specific errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VaultError {
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Amount, available: Amount },

    #[error("Authorization failed: {0}")]
    Authorization(#[from] AuthorizationError),

    #[error("Transfer to {recipient} failed: {reason}")]
    TransferFailed { recipient: Address, reason: String },

    #[error("Authorization manager mismatch: vault bound to {expected}, got {actual}")]
    ManagerMismatch { expected: Address, actual: Address },

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Failure reported by a recipient refusing inbound value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Recipient rejected transfer: {reason}")]
    Rejected { reason: String },

    #[error("Recipient callback failed: {0}")]
    Callback(Box<VaultError>),
}

/// Deployment and configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SetupError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Authorization setup failed: {0}")]
    Authorization(#[from] AuthorizationError),
}
