//! Hash function primitives for the secp256k1 engine.
//!
//! Provides SHA-256 and HMAC-SHA256. HMAC drives deterministic nonce
//! generation and context re-randomization; SHA-256 hashes ECDH shared points.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Compute SHA-256 hash of the input data.
///
/// # Arguments
/// * `data` - Byte slice to hash.
///
/// # Returns
/// A 32-byte SHA-256 digest.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 over the concatenation of several byte slices.
pub fn sha256_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute HMAC-SHA256 of the input data with the given key.
///
/// # Arguments
/// * `key` - The HMAC key bytes.
/// * `data` - The message bytes to authenticate.
///
/// # Returns
/// A 32-byte HMAC-SHA256 tag.
pub fn sha256_hmac(key: &[u8], data: &[u8]) -> [u8; 32] {
    sha256_hmac_parts(key, &[data])
}

/// Compute HMAC-SHA256 over the concatenation of several byte slices.
///
/// Avoids building temporary buffers for the `V || 0x00 || x || h` style
/// inputs of RFC6979.
///
/// # Arguments
/// * `key` - The HMAC key bytes.
/// * `parts` - Message fragments, authenticated in order.
///
/// # Returns
/// A 32-byte HMAC-SHA256 tag.
pub fn sha256_hmac_parts(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key)
        .expect("HMAC accepts any key length");
    for part in parts {
        mac.update(part);
    }
    mac.finalize().into_bytes().into()
}
