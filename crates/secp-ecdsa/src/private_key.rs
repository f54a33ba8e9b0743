//! secp256k1 private keys.
//!
//! Wraps a validated non-zero scalar and adds signing, tweaking and ECDH
//! shared secret computation. The scalar is wiped on drop.

use std::fmt;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use secp_primitives::hash::sha256;
use secp_primitives::{PrimitivesError, Scalar};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::context::Context;
use crate::public_key::PublicKey;
use crate::rfc6979::NonceSource;
use crate::signature::{RecoverableSignature, Signature};
use crate::EcdsaError;

/// Length of a serialized private key in bytes.
pub const PRIVATE_KEY_BYTES_LEN: usize = 32;

/// A secp256k1 private key: a scalar in [1, n-1].
#[derive(Clone)]
pub struct PrivateKey {
    scalar: Scalar,
}

impl PrivateKey {
    /// Generate a new random private key using the OS random number generator.
    ///
    /// # Returns
    /// A new `PrivateKey`, or `EcdsaError::Entropy` if the OS RNG fails.
    pub fn new() -> Result<Self, EcdsaError> {
        Self::random(&mut OsRng)
    }

    /// Generate a random private key from the given RNG.
    ///
    /// Candidates outside [1, n-1] are discarded and redrawn.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, EcdsaError> {
        loop {
            let mut bytes = [0u8; PRIVATE_KEY_BYTES_LEN];
            rng.try_fill_bytes(&mut bytes)
                .map_err(|e| EcdsaError::Entropy(e.to_string()))?;
            let candidate = parse_secret_scalar(&bytes);
            bytes.zeroize();
            if let Ok(scalar) = candidate {
                return Ok(PrivateKey { scalar });
            }
        }
    }

    /// Create a private key from raw 32-byte scalar.
    ///
    /// # Arguments
    /// * `bytes` - A 32-byte slice representing the private key scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)`, or `EcdsaError::InvalidPrivateKey` if the length is
    /// wrong or the scalar is zero or not below the curve order.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EcdsaError> {
        Ok(PrivateKey {
            scalar: parse_secret_scalar(bytes)?,
        })
    }

    /// Create a private key from a hexadecimal string.
    ///
    /// # Arguments
    /// * `hex_str` - A 64-character hex string representing the 32-byte scalar.
    ///
    /// # Returns
    /// `Ok(PrivateKey)` on success, or an error if the hex or the scalar is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, EcdsaError> {
        if hex_str.is_empty() {
            return Err(EcdsaError::InvalidPrivateKey(
                "private key hex is empty".to_string(),
            ));
        }
        let mut bytes = hex::decode(hex_str).map_err(PrimitivesError::from)?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Serialize the private key as a 32-byte big-endian array.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_BYTES_LEN] {
        self.scalar.to_bytes()
    }

    /// Serialize the private key as a lowercase hexadecimal string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Derive the corresponding public key.
    ///
    /// # Arguments
    /// * `ctx` - Context providing blinded generator multiplication.
    pub fn public_key(&self, ctx: &Context) -> PublicKey {
        ctx.public_key_for(&self.scalar)
    }

    /// Sign a 32-byte digest with an RFC6979 nonce.
    ///
    /// # Arguments
    /// * `ctx` - The signing context.
    /// * `digest` - The message hash to sign (exactly 32 bytes).
    ///
    /// # Returns
    /// A low-S `Signature`, or `EcdsaError::InvalidInput` for a bad digest.
    pub fn sign(&self, ctx: &Context, digest: &[u8]) -> Result<Signature, EcdsaError> {
        ctx.sign_scalar(&self.scalar, digest, NonceSource::Rfc6979)
            .map(|(sig, _)| sig)
    }

    /// Sign a 32-byte digest and keep the recovery id.
    pub fn sign_recoverable(
        &self,
        ctx: &Context,
        digest: &[u8],
    ) -> Result<RecoverableSignature, EcdsaError> {
        let (sig, recovery_id) = ctx.sign_scalar(&self.scalar, digest, NonceSource::Rfc6979)?;
        RecoverableSignature::new(sig, recovery_id)
    }

    /// Add `tweak` to this key modulo n.
    ///
    /// # Arguments
    /// * `tweak` - A 32-byte scalar below the curve order.
    ///
    /// # Returns
    /// The tweaked key, `EcdsaError::InvalidInput` for a malformed tweak, or
    /// `EcdsaError::InvalidPrivateKey` if the sum is zero.
    pub fn tweak_add(&self, tweak: &[u8]) -> Result<PrivateKey, EcdsaError> {
        let t = parse_tweak(tweak)?;
        Self::from_nonzero(self.scalar.add(&t), "tweak produced the zero key")
    }

    /// Multiply this key by `tweak` modulo n.
    ///
    /// # Arguments
    /// * `tweak` - A non-zero 32-byte scalar below the curve order.
    pub fn tweak_mul(&self, tweak: &[u8]) -> Result<PrivateKey, EcdsaError> {
        let t = parse_tweak(tweak)?;
        if bool::from(t.is_zero()) {
            return Err(EcdsaError::InvalidInput("multiplicative tweak is zero".to_string()));
        }
        Self::from_nonzero(self.scalar.mul(&t), "tweak produced the zero key")
    }

    /// The key `n - d`, whose public key is the negation of this one.
    pub fn negate(&self) -> PrivateKey {
        PrivateKey {
            scalar: self.scalar.negate(),
        }
    }

    /// Compute the ECDH shared point with another public key.
    ///
    /// Multiplies the other party's public key by this private key's scalar
    /// with the constant-time ladder.
    ///
    /// # Arguments
    /// * `pub_key` - The other party's public key.
    ///
    /// # Returns
    /// The shared point as a `PublicKey`.
    pub fn derive_shared_secret(&self, pub_key: &PublicKey) -> Result<PublicKey, EcdsaError> {
        let shared = pub_key.to_projective().mul(&self.scalar);
        PublicKey::from_projective(&shared)
    }

    /// Compute a 32-byte ECDH secret: SHA-256 of the compressed shared point.
    pub fn shared_secret(&self, pub_key: &PublicKey) -> Result<[u8; 32], EcdsaError> {
        let point = self.derive_shared_secret(pub_key)?;
        Ok(sha256(&point.to_compressed()))
    }

    fn from_nonzero(scalar: Scalar, reason: &str) -> Result<PrivateKey, EcdsaError> {
        if bool::from(scalar.is_zero()) {
            return Err(EcdsaError::InvalidPrivateKey(reason.to_string()));
        }
        Ok(PrivateKey { scalar })
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.scalar.zeroize();
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.scalar.ct_eq(&other.scalar).into()
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// Parse a secret key: exactly 32 bytes, non-zero, below n.
pub(crate) fn parse_secret_scalar(bytes: &[u8]) -> Result<Scalar, EcdsaError> {
    if bytes.len() != PRIVATE_KEY_BYTES_LEN {
        return Err(EcdsaError::InvalidPrivateKey(format!(
            "expected {} bytes, got {}",
            PRIVATE_KEY_BYTES_LEN,
            bytes.len()
        )));
    }
    let mut buf = [0u8; PRIVATE_KEY_BYTES_LEN];
    buf.copy_from_slice(bytes);
    let parsed = Option::<Scalar>::from(Scalar::from_bytes(&buf));
    buf.zeroize();
    match parsed {
        Some(scalar) if !bool::from(scalar.is_zero()) => Ok(scalar),
        Some(_) => Err(EcdsaError::InvalidPrivateKey("private key is zero".to_string())),
        None => Err(EcdsaError::InvalidPrivateKey(
            "private key is not below the curve order".to_string(),
        )),
    }
}

/// Parse a tweak: exactly 32 bytes, below n (zero allowed).
pub(crate) fn parse_tweak(bytes: &[u8]) -> Result<Scalar, EcdsaError> {
    if bytes.len() != 32 {
        return Err(EcdsaError::InvalidInput(format!(
            "tweak must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut buf = [0u8; 32];
    buf.copy_from_slice(bytes);
    let parsed = Option::<Scalar>::from(Scalar::from_bytes(&buf));
    buf.zeroize();
    parsed.ok_or_else(|| EcdsaError::InvalidInput("tweak is not below the curve order".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CURVE_ORDER_HEX: &str = "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141";

    fn test_context() -> Context {
        Context::with_config(ContextConfig::deterministic()).unwrap()
    }

    /// Test basic private key parsing, serialization, and signing.
    #[test]
    fn test_priv_keys() {
        let ctx = test_context();
        let key_bytes: [u8; 32] = [
            0xea, 0xf0, 0x2c, 0xa3, 0x48, 0xc5, 0x24, 0xe6, 0x39, 0x26, 0x55, 0xba, 0x4d, 0x29,
            0x60, 0x3c, 0xd1, 0xa7, 0x34, 0x7d, 0x9d, 0x65, 0xcf, 0xe9, 0x3c, 0xe1, 0xeb, 0xff,
            0xdc, 0xa2, 0x26, 0x94,
        ];

        let priv_key = PrivateKey::from_bytes(&key_bytes).unwrap();
        let pub_key = priv_key.public_key(&ctx);

        // Verify public key can be parsed from uncompressed bytes
        let uncompressed = pub_key.to_uncompressed();
        assert_eq!(PublicKey::from_bytes(&uncompressed).unwrap(), pub_key);

        // Sign and verify
        let hash = sha256(&[0x0, 0x1, 0x2, 0x3, 0x4, 0x5, 0x6, 0x7, 0x8, 0x9]);
        let sig = priv_key.sign(&ctx, &hash).unwrap();
        assert!(pub_key.verify(&ctx, &hash, &sig));

        // Round-trip serialization
        assert_eq!(priv_key.to_bytes(), key_bytes);
    }

    /// Test known public keys for small private keys.
    #[test]
    fn test_known_public_keys() {
        let ctx = test_context();
        let one = PrivateKey::from_hex("0000000000000000000000000000000000000000000000000000000000000001").unwrap();
        assert_eq!(
            one.public_key(&ctx).to_hex(),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        let n_minus_one = PrivateKey::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140").unwrap();
        assert_eq!(
            n_minus_one.public_key(&ctx).to_hex(),
            "0379be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    /// Test private key serialization and deserialization via bytes and hex.
    #[test]
    fn test_private_key_serialization_and_deserialization() {
        let pk = PrivateKey::new().unwrap();

        let serialized = pk.to_bytes();
        let deserialized = PrivateKey::from_bytes(&serialized).unwrap();
        assert_eq!(pk, deserialized);

        let hex_str = pk.to_hex();
        let deserialized = PrivateKey::from_hex(&hex_str).unwrap();
        assert_eq!(pk, deserialized);
    }

    /// Test that seeded generation is reproducible.
    #[test]
    fn test_random_from_seeded_rng() {
        let a = PrivateKey::random(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = PrivateKey::random(&mut StdRng::seed_from_u64(7)).unwrap();
        let c = PrivateKey::random(&mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    /// Test that empty or malformed hex returns an error.
    #[test]
    fn test_private_key_from_invalid_hex() {
        assert!(matches!(
            PrivateKey::from_hex(""),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            PrivateKey::from_hex("L4o1GXuUSHauk19f9Cfpm1qfSXZuGLBUAC2VZM6vdmfMxRxAYkWq"),
            Err(EcdsaError::Primitives(PrimitivesError::InvalidHex(_)))
        ));
    }

    /// Test rejection of zero, the curve order and wrong lengths.
    #[test]
    fn test_private_key_out_of_range() {
        assert!(matches!(
            PrivateKey::from_bytes(&[0u8; 32]),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            PrivateKey::from_hex(CURVE_ORDER_HEX),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&[0xffu8; 32]),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&[1u8; 31]),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
    }

    /// Test additive and multiplicative tweaks on the scalar.
    #[test]
    fn test_tweaks() {
        let key = PrivateKey::from_hex("0000000000000000000000000000000000000000000000000000000000000005").unwrap();
        let mut tweak = [0u8; 32];
        tweak[31] = 3;

        assert_eq!(key.tweak_add(&tweak).unwrap().to_bytes()[31], 8);
        assert_eq!(key.tweak_mul(&tweak).unwrap().to_bytes()[31], 15);

        let neg = key.negate();
        assert!(matches!(
            key.tweak_add(&neg.to_bytes()),
            Err(EcdsaError::InvalidPrivateKey(_))
        ));
        assert!(matches!(key.tweak_mul(&[0u8; 32]), Err(EcdsaError::InvalidInput(_))));
        assert!(matches!(key.tweak_add(&[0u8; 16]), Err(EcdsaError::InvalidInput(_))));
        assert_eq!(neg.negate(), key);
    }

    /// Test that both ECDH parties arrive at the same secret.
    #[test]
    fn test_shared_secret_symmetry() {
        let ctx = test_context();
        let mut rng = StdRng::seed_from_u64(1234);
        let alice = PrivateKey::random(&mut rng).unwrap();
        let bob = PrivateKey::random(&mut rng).unwrap();

        let ab = alice.shared_secret(&bob.public_key(&ctx)).unwrap();
        let ba = bob.shared_secret(&alice.public_key(&ctx)).unwrap();
        assert_eq!(ab, ba);

        let point = alice.derive_shared_secret(&bob.public_key(&ctx)).unwrap();
        assert_eq!(sha256(&point.to_compressed()), ab);
    }

    /// Test that debug output never shows the key.
    #[test]
    fn test_debug_redacts() {
        let key = PrivateKey::from_hex("eaf02ca348c524e6392655ba4d29603cd1a7347d9d65cfe93ce1ebffdca22694").unwrap();
        assert_eq!(format!("{:?}", key), "PrivateKey(..)");
    }
}
