//! Signature Module — authorization digest, signing, and verification
//!
//! Provides the fixed-width digest encoding shared by off-chain signers and
//! the on-chain verifier, the signed-message prefix, Ed25519 signing for the
//! authorizer, and strict verification against the authorizer key.

use custody_types::ids::{Address, ChainId, Nonce, WORD_LEN};
use custody_types::numeric::Amount;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::debug;

use crate::errors::AuthorizationError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of the encoded withdrawal tuple: five 32-byte words.
pub const ENCODED_LEN: usize = 5 * WORD_LEN;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Prefix applied before signing so a digest can never double as another payload.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Custody Signed Message:\n32";

// ---------------------------------------------------------------------------
// Digest
// ---------------------------------------------------------------------------

/// SHA-256 digest binding one withdrawal to one vault on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationDigest([u8; 32]);

impl AuthorizationDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Hash of `SIGNED_MESSAGE_PREFIX ‖ digest`; the bytes actually signed.
    pub fn signed_message_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(SIGNED_MESSAGE_PREFIX);
        hasher.update(self.0);
        hasher.finalize().into()
    }
}

impl fmt::Display for AuthorizationDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// The ordered withdrawal tuple covered by an authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalAuthorization {
    pub vault: Address,
    pub recipient: Address,
    pub amount: Amount,
    pub chain_id: ChainId,
    pub nonce: Nonce,
}

impl WithdrawalAuthorization {
    /// Fixed-width encoding: `vault ‖ recipient ‖ amount ‖ chain_id ‖ nonce`,
    /// numeric fields big-endian and left-padded to 32 bytes.
    pub fn encode(&self) -> [u8; ENCODED_LEN] {
        let mut out = [0u8; ENCODED_LEN];
        out[..32].copy_from_slice(self.vault.as_bytes());
        out[32..64].copy_from_slice(self.recipient.as_bytes());
        out[64..96].copy_from_slice(&self.amount.to_word());
        out[96..128].copy_from_slice(&chain_word(self.chain_id));
        out[128..].copy_from_slice(self.nonce.as_bytes());
        out
    }

    pub fn digest(&self) -> AuthorizationDigest {
        AuthorizationDigest(Sha256::digest(self.encode()).into())
    }
}

fn chain_word(chain_id: ChainId) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 8..].copy_from_slice(&chain_id.as_u64().to_be_bytes());
    word
}

/// Canonical authorization digest for a withdrawal tuple.
///
/// Pure and public: off-chain signers and the on-chain verifier must derive
/// byte-identical results.
pub fn compute_authorization_digest(
    vault: Address,
    recipient: Address,
    amount: Amount,
    chain_id: ChainId,
    nonce: Nonce,
) -> AuthorizationDigest {
    let digest = WithdrawalAuthorization {
        vault,
        recipient,
        amount,
        chain_id,
        nonce,
    }
    .digest();
    debug!(
        %vault,
        %recipient,
        %amount,
        %chain_id,
        %nonce,
        %digest,
        "computed authorization digest"
    );
    digest
}

// ---------------------------------------------------------------------------
// Signing (off-chain authorizer)
// ---------------------------------------------------------------------------

/// Holder of the authorizer's Ed25519 signing key.
pub struct AuthorizationSigner {
    signing_key: SigningKey,
}

impl AuthorizationSigner {
    /// Signer from a fixed 32-byte seed.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&seed),
        }
    }

    /// Signer with a freshly generated key.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Identity of this signer: the raw verifying key bytes.
    pub fn address(&self) -> Address {
        Address::from_bytes(self.signing_key.verifying_key().to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign an already computed digest (prefix applied here).
    pub fn sign_digest(&self, digest: &AuthorizationDigest) -> Vec<u8> {
        self.signing_key
            .sign(&digest.signed_message_hash())
            .to_bytes()
            .to_vec()
    }

    /// Sign a withdrawal tuple.
    pub fn sign(&self, authorization: &WithdrawalAuthorization) -> Vec<u8> {
        self.sign_digest(&authorization.digest())
    }
}

impl fmt::Debug for AuthorizationSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationSigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Verification (on-chain)
// ---------------------------------------------------------------------------

/// Interpret an authorizer address as an Ed25519 verifying key.
///
/// Small-order keys are refused: strict verification rejects every
/// signature under them, so no withdrawal could ever be authorized.
pub fn authorizer_key(authorizer: Address) -> Result<VerifyingKey, AuthorizationError> {
    let key = VerifyingKey::from_bytes(authorizer.as_bytes())
        .map_err(|_| AuthorizationError::InvalidAuthorizer { authorizer })?;
    if key.is_weak() {
        return Err(AuthorizationError::InvalidAuthorizer { authorizer });
    }
    Ok(key)
}

/// Verify that `signature` was produced by `authorizer` over `digest`.
///
/// Malformed signatures and signatures by any other key both fail with
/// `InvalidSignature`.
pub fn verify_authorization(
    authorizer: &VerifyingKey,
    digest: &AuthorizationDigest,
    signature: &[u8],
) -> Result<(), AuthorizationError> {
    let sig_bytes: [u8; SIGNATURE_LEN] = signature
        .try_into()
        .map_err(|_| AuthorizationError::InvalidSignature)?;
    let signature = Signature::from_bytes(&sig_bytes);

    authorizer
        .verify_strict(&digest.signed_message_hash(), &signature)
        .map_err(|_| AuthorizationError::InvalidSignature)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn test_signer() -> AuthorizationSigner {
        // Deterministic seed for repeatable test vectors
        AuthorizationSigner::from_seed([7u8; 32])
    }

    fn sample() -> WithdrawalAuthorization {
        WithdrawalAuthorization {
            vault: Address::derive("vault"),
            recipient: Address::derive("user"),
            amount: Amount::new(1_000),
            chain_id: ChainId::LOCAL_DEVNET,
            nonce: Nonce::from_label("n1"),
        }
    }

    #[test]
    fn test_encoding_layout() {
        let auth = sample();
        let encoded = auth.encode();
        assert_eq!(&encoded[..32], auth.vault.as_bytes());
        assert_eq!(&encoded[32..64], auth.recipient.as_bytes());
        assert_eq!(&encoded[94..96], &1_000u16.to_be_bytes());
        assert_eq!(&encoded[120..128], &31337u64.to_be_bytes());
        assert_eq!(&encoded[128..], auth.nonce.as_bytes());
    }

    #[test]
    fn test_digest_deterministic() {
        assert_eq!(sample().digest(), sample().digest());
        let d = sample();
        assert_eq!(
            compute_authorization_digest(d.vault, d.recipient, d.amount, d.chain_id, d.nonce),
            d.digest()
        );
    }

    #[test]
    fn test_digest_changes_with_every_field() {
        let base = sample().digest();

        let mut a = sample();
        a.vault = Address::derive("other-vault");
        assert_ne!(a.digest(), base);

        let mut a = sample();
        a.recipient = Address::derive("other-user");
        assert_ne!(a.digest(), base);

        let mut a = sample();
        a.amount = Amount::new(1_001);
        assert_ne!(a.digest(), base);

        let mut a = sample();
        a.chain_id = ChainId::new(1);
        assert_ne!(a.digest(), base);

        let mut a = sample();
        a.nonce = Nonce::from_label("n2");
        assert_ne!(a.digest(), base);
    }

    #[test]
    fn test_signed_message_hash_differs_from_digest() {
        let digest = sample().digest();
        assert_ne!(&digest.signed_message_hash(), digest.as_bytes());
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = test_signer();
        let auth = sample();
        let sig = signer.sign(&auth);
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert!(verify_authorization(&signer.verifying_key(), &auth.digest(), &sig).is_ok());
    }

    #[test]
    fn test_verify_wrong_key_fails() {
        let signer = test_signer();
        let other = AuthorizationSigner::from_seed([9u8; 32]);
        let auth = sample();
        let sig = other.sign(&auth);
        assert_eq!(
            verify_authorization(&signer.verifying_key(), &auth.digest(), &sig),
            Err(AuthorizationError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_raw_digest_signature_fails() {
        // A signature over the unprefixed digest must not verify
        let signer = test_signer();
        let auth = sample();
        let raw = signer
            .signing_key
            .sign(auth.digest().as_bytes())
            .to_bytes();
        assert_eq!(
            verify_authorization(&signer.verifying_key(), &auth.digest(), &raw),
            Err(AuthorizationError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_malformed_length() {
        let signer = test_signer();
        assert_eq!(
            verify_authorization(&signer.verifying_key(), &sample().digest(), &[0u8; 10]),
            Err(AuthorizationError::InvalidSignature)
        );
        assert_eq!(
            verify_authorization(&signer.verifying_key(), &sample().digest(), &[]),
            Err(AuthorizationError::InvalidSignature)
        );
    }

    #[test]
    fn test_signature_stable_for_fixed_seed() {
        let signer = test_signer();
        assert_eq!(signer.sign(&sample()), signer.sign(&sample()));
    }

    #[test]
    fn test_signer_address_roundtrips_to_key() {
        let signer = test_signer();
        let key = authorizer_key(signer.address()).unwrap();
        assert_eq!(key, signer.verifying_key());
    }

    #[test]
    fn test_small_order_authorizer_rejected() {
        // Compressed identity point
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let authorizer = Address::from_bytes(identity);

        assert_eq!(
            authorizer_key(authorizer),
            Err(AuthorizationError::InvalidAuthorizer { authorizer })
        );
    }

    #[test]
    fn test_generated_signers_differ() {
        assert_ne!(
            AuthorizationSigner::generate().address(),
            AuthorizationSigner::generate().address()
        );
    }
}
