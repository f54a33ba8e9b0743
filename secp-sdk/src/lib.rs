#![deny(missing_docs)]

//! secp256k1 SDK - Complete SDK.
//!
//! Re-exports all components for convenient single-crate usage.

pub use secp_ecdsa as ecdsa;
pub use secp_primitives as primitives;
