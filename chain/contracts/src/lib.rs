//! Signature-gated Custody Contracts
//!
//! This crate implements off-chain-authorized, on-chain-verified custody:
//! a vault holds value and releases it only against a signature from the
//! designated authorizer, validated once by a separate authorization manager.
//!
//! # Modules
//! - `signature`: Authorization digest, signed-message hash, Ed25519 sign/verify
//! - `security`: Reentrancy guard, access control, replay ledger
//! - `authorization`: Vault registry and one-time verification
//! - `vault`: Value custody, deposits, authorized withdrawals
//! - `events`: Observable contract events
//! - `errors`: Contract-specific error types
//! - `config`: Deployment configuration and execution context
//! - `setup`: Staged deployment of manager and vault

pub mod errors;
pub mod events;
pub mod signature;
pub mod security;
pub mod authorization;
pub mod vault;
pub mod config;
pub mod setup;

pub use authorization::{AuthorizationManager, AuthorizationReceipt, ManagerSnapshot};
pub use config::{CustodyConfig, ExecutionContext};
pub use setup::CustodySystem;
pub use vault::{Account, Recipient, Reentry, SecureVault};

/// Contract ABI version — frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
