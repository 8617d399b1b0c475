//! Types library for the authorized custody protocol
//!
//! Identity and value types shared by the on-chain components
//! (authorization manager, vault) and by off-chain signing tooling, so both
//! sides encode withdrawal parameters byte-for-byte identically.
//!
//! # Modules
//! - `ids`: Identities and one-time tokens (Address, Nonce, ChainId)
//! - `numeric`: Base-unit value amounts (Amount)
//! - `errors`: Parse and conversion errors

pub mod ids;
pub mod numeric;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::*;
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
