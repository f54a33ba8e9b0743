//! secp256k1 ECDSA engine built on `secp-primitives`.
//!
//! A [`Context`] owns the precomputed generator tables and the blinding state
//! used for constant-time generator multiplication. Callers create one,
//! pass it explicitly to every key and signature operation, and may reseed
//! it at any time without changing results.

pub mod config;
pub mod context;
pub mod ecdsa;
pub mod private_key;
pub mod public_key;
pub mod rfc6979;
pub mod shared;
pub mod signature;
mod error;

pub use config::ContextConfig;
pub use context::Context;
pub use ecdsa::DIGEST_LEN;
pub use error::EcdsaError;
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use rfc6979::NonceSource;
pub use shared::SharedContext;
pub use signature::{RecoverableSignature, Signature};
