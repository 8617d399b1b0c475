//! Secure Vault — value custody released only against verified authorizations
//!
//! - Deposits are accepted unconditionally from any party
//! - Withdrawals are delegated to the bound authorization manager first
//! - Effects before interactions: nonce consumed and balance decremented
//!   before the recipient is called
//! - A failed delivery restores the balance and retracts the nonce
//! - Reentrancy guard held for the whole withdrawal, including the callback

use custody_types::ids::{Address, Nonce};
use custody_types::numeric::Amount;
use tracing::{info, warn};
use uuid::Uuid;

use crate::authorization::AuthorizationManager;
use crate::config::ExecutionContext;
use crate::errors::{TransferError, VaultError};
use crate::events::{ContractEvent, Deposited, WithdrawalCompleted};
use crate::security::ReentrancyGuard;

/// Destination of an outbound value transfer.
///
/// `receive` runs while the withdrawal is still in progress and may call
/// back into the vault through the [`Reentry`] handle.
pub trait Recipient {
    /// Identity the authorization must name.
    fn address(&self) -> Address;

    /// Accept `amount`, or refuse it with an error.
    fn receive(&mut self, amount: Amount, reentry: Reentry<'_>) -> Result<(), TransferError>;
}

/// Plain account that accepts every inbound transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub address: Address,
    pub balance: Amount,
}

impl Account {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            balance: Amount::ZERO,
        }
    }
}

impl Recipient for Account {
    fn address(&self) -> Address {
        self.address
    }

    fn receive(&mut self, amount: Amount, _reentry: Reentry<'_>) -> Result<(), TransferError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| TransferError::Rejected {
                reason: "recipient balance overflow".to_string(),
            })?;
        Ok(())
    }
}

/// Handle given to a recipient during delivery.
///
/// Exposes what an external contract could reach mid-transfer: state
/// queries and a nested `withdraw`.
pub struct Reentry<'a> {
    vault: &'a mut SecureVault,
    manager: &'a mut AuthorizationManager,
    context: &'a ExecutionContext,
}

impl Reentry<'_> {
    /// Vault balance as seen mid-transfer.
    pub fn vault_balance(&self) -> Amount {
        self.vault.balance()
    }

    /// Whether the vault's nonce is already consumed mid-transfer.
    pub fn is_nonce_consumed(&self, nonce: &Nonce) -> bool {
        self.manager.is_nonce_consumed(&self.vault.address(), nonce)
    }

    /// Attempt a nested withdrawal from the vault.
    pub fn withdraw(
        &mut self,
        recipient: &mut dyn Recipient,
        amount: Amount,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<ContractEvent, VaultError> {
        self.vault
            .withdraw(self.manager, self.context, recipient, amount, nonce, signature)
    }
}

/// Custodian of a single value balance.
///
/// Bound at construction to one authorization manager; `withdraw` refuses
/// any other instance.
#[derive(Debug)]
pub struct SecureVault {
    /// Identity of this vault
    address: Address,
    /// Identity of the bound authorization manager
    manager: Address,
    /// Custodied value
    balance: Amount,
    /// Security: reentrancy guard
    reentrancy_guard: ReentrancyGuard,
    /// Emitted events log (append-only)
    events: Vec<ContractEvent>,
}

impl SecureVault {
    /// Create an empty vault bound to `manager`.
    pub fn new(address: Address, manager: Address) -> Self {
        Self {
            address,
            manager,
            balance: Amount::ZERO,
            reentrancy_guard: ReentrancyGuard::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Deposit ─────────────────────────

    /// Credit inbound value. Open to any sender; zero is a no-op credit.
    pub fn deposit(&mut self, from: Address, amount: Amount) -> Result<ContractEvent, VaultError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(VaultError::Overflow)?;

        info!(vault = %self.address, %from, %amount, balance = %self.balance, "deposit received");

        let event = ContractEvent::Deposited(Deposited {
            vault: self.address,
            from,
            amount,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ───────────────────────── Withdraw ─────────────────────────

    /// Release `amount` to `recipient` against an authorizer signature.
    ///
    /// Callable by anyone holding a valid signature. All-or-nothing: on any
    /// error the balance and the manager's ledger are as they were before.
    pub fn withdraw(
        &mut self,
        manager: &mut AuthorizationManager,
        context: &ExecutionContext,
        recipient: &mut dyn Recipient,
        amount: Amount,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<ContractEvent, VaultError> {
        if !self.reentrancy_guard.acquire() {
            warn!(vault = %self.address, %nonce, "reentrant withdrawal blocked");
            return Err(VaultError::Reentrancy);
        }

        let result = self.withdraw_locked(manager, context, recipient, amount, nonce, signature);
        self.reentrancy_guard.release();

        if let Err(err) = &result {
            warn!(
                vault = %self.address,
                recipient = %recipient.address(),
                %amount,
                %nonce,
                error = %err,
                "withdrawal failed"
            );
        }
        result
    }

    fn withdraw_locked(
        &mut self,
        manager: &mut AuthorizationManager,
        context: &ExecutionContext,
        recipient: &mut dyn Recipient,
        amount: Amount,
        nonce: Nonce,
        signature: &[u8],
    ) -> Result<ContractEvent, VaultError> {
        // Checks
        if amount.is_zero() || amount > self.balance {
            return Err(VaultError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }
        if manager.address() != self.manager {
            return Err(VaultError::ManagerMismatch {
                expected: self.manager,
                actual: manager.address(),
            });
        }

        let recipient_address = recipient.address();
        let receipt = manager.verify_and_consume(
            self.address,
            recipient_address,
            amount,
            context.chain_id,
            nonce,
            signature,
        )?;

        // Effects
        let Some(remaining) = self.balance.checked_sub(amount) else {
            manager.rollback(receipt);
            return Err(VaultError::Overflow);
        };
        self.balance = remaining;

        // Interaction
        let delivery = recipient.receive(
            amount,
            Reentry {
                vault: &mut *self,
                manager: &mut *manager,
                context,
            },
        );

        if let Err(err) = delivery {
            manager.rollback(receipt);
            self.balance = self
                .balance
                .checked_add(amount)
                .ok_or(VaultError::Overflow)?;
            return Err(VaultError::TransferFailed {
                recipient: recipient_address,
                reason: err.to_string(),
            });
        }

        info!(
            vault = %self.address,
            recipient = %recipient_address,
            %amount,
            %nonce,
            balance = %self.balance,
            "withdrawal completed"
        );

        let event = ContractEvent::WithdrawalCompleted(WithdrawalCompleted {
            withdrawal_id: Uuid::now_v7(),
            vault: self.address,
            recipient: recipient_address,
            amount,
            nonce,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    // ───────────────────────── Queries ─────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    /// Identity of the bound authorization manager.
    pub fn manager(&self) -> Address {
        self.manager
    }

    /// Current custodied balance.
    pub fn balance(&self) -> Amount {
        self.balance
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AuthorizationError;
    use crate::signature::{AuthorizationSigner, WithdrawalAuthorization};
    use custody_types::ids::ChainId;

    struct Fixture {
        signer: AuthorizationSigner,
        manager: AuthorizationManager,
        vault: SecureVault,
        context: ExecutionContext,
        user: Account,
    }

    impl Fixture {
        fn new() -> Self {
            let signer = AuthorizationSigner::from_seed([3u8; 32]);
            let mut manager =
                AuthorizationManager::new(Address::derive("manager"), signer.address()).unwrap();
            let vault = SecureVault::new(Address::derive("vault"), manager.address());
            manager
                .register_vault(&signer.address(), vault.address(), true)
                .unwrap();
            Self {
                signer,
                manager,
                vault,
                context: ExecutionContext::new(ChainId::LOCAL_DEVNET),
                user: Account::new(Address::derive("user")),
            }
        }

        fn sign(&self, amount: u128, nonce: &str) -> Vec<u8> {
            self.signer.sign(&WithdrawalAuthorization {
                vault: self.vault.address(),
                recipient: self.user.address,
                amount: Amount::new(amount),
                chain_id: self.context.chain_id,
                nonce: Nonce::from_label(nonce),
            })
        }

        fn withdraw(
            &mut self,
            amount: u128,
            nonce: &str,
            sig: &[u8],
        ) -> Result<ContractEvent, VaultError> {
            self.vault.withdraw(
                &mut self.manager,
                &self.context,
                &mut self.user,
                Amount::new(amount),
                Nonce::from_label(nonce),
                sig,
            )
        }
    }

    // ─── Deposit tests ───

    #[test]
    fn test_deposit_accumulates() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::derive("a"), Amount::new(2)).unwrap();
        f.vault.deposit(Address::derive("b"), Amount::new(3)).unwrap();
        assert_eq!(f.vault.balance(), Amount::new(5));
        assert_eq!(f.vault.events().len(), 2);
    }

    #[test]
    fn test_deposit_zero_is_accepted() {
        let mut f = Fixture::new();
        let event = f.vault.deposit(Address::derive("a"), Amount::ZERO).unwrap();
        assert!(matches!(event, ContractEvent::Deposited(_)));
        assert_eq!(f.vault.balance(), Amount::ZERO);
    }

    #[test]
    fn test_deposit_overflow() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(u128::MAX)).unwrap();
        let result = f.vault.deposit(Address::ZERO, Amount::new(1));
        assert_eq!(result, Err(VaultError::Overflow));
        assert_eq!(f.vault.balance(), Amount::new(u128::MAX));
    }

    // ─── Withdraw tests ───

    #[test]
    fn test_withdraw_success() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(10)).unwrap();
        let sig = f.sign(4, "n1");

        let event = f.withdraw(4, "n1", &sig).unwrap();
        assert!(matches!(event, ContractEvent::WithdrawalCompleted(_)));
        assert_eq!(f.vault.balance(), Amount::new(6));
        assert_eq!(f.user.balance, Amount::new(4));
    }

    #[test]
    fn test_withdraw_zero_amount() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(10)).unwrap();
        let sig = f.sign(0, "n1");
        let result = f.withdraw(0, "n1", &sig);
        assert!(matches!(result, Err(VaultError::InsufficientBalance { .. })));
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(1)).unwrap();
        let sig = f.sign(2, "n1");
        let result = f.withdraw(2, "n1", &sig);
        assert_eq!(
            result,
            Err(VaultError::InsufficientBalance {
                requested: Amount::new(2),
                available: Amount::new(1),
            })
        );
        // Balance check precedes verification: nonce still fresh
        assert!(!f
            .manager
            .is_nonce_consumed(&f.vault.address(), &Nonce::from_label("n1")));
    }

    #[test]
    fn test_withdraw_propagates_authorization_error() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(10)).unwrap();
        let result = f.withdraw(1, "n1", &[0u8; 64]);
        assert_eq!(
            result,
            Err(VaultError::Authorization(AuthorizationError::InvalidSignature))
        );
        assert_eq!(f.vault.balance(), Amount::new(10));
    }

    #[test]
    fn test_withdraw_rejects_foreign_manager() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(10)).unwrap();
        let mut other =
            AuthorizationManager::new(Address::derive("other-manager"), f.signer.address())
                .unwrap();
        let sig = f.sign(1, "n1");

        let result = f.vault.withdraw(
            &mut other,
            &f.context,
            &mut f.user,
            Amount::new(1),
            Nonce::from_label("n1"),
            &sig,
        );
        assert!(matches!(result, Err(VaultError::ManagerMismatch { .. })));
        assert_eq!(other.consumed_nonce_count(), 0);
    }

    #[test]
    fn test_guard_released_after_failure() {
        let mut f = Fixture::new();
        f.vault.deposit(Address::ZERO, Amount::new(10)).unwrap();
        assert!(f.withdraw(1, "n1", b"bad").is_err());

        let sig = f.sign(1, "n1");
        assert!(f.withdraw(1, "n1", &sig).is_ok());
    }
}
