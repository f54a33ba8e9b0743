//! secp256k1 public keys.
//!
//! Supports SEC1 compressed/uncompressed serialization, signature
//! verification, additive and multiplicative tweaks, and key combination.

use std::fmt;

use secp_primitives::arith::{COMPRESSED_LEN, UNCOMPRESSED_LEN};
use secp_primitives::{AffinePoint, ProjectivePoint};

use crate::context::Context;
use crate::private_key::parse_tweak;
use crate::signature::Signature;
use crate::EcdsaError;

/// A secp256k1 public key: a point on the curve other than infinity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    /// Create a PublicKey from raw SEC1 encoded bytes.
    ///
    /// Accepts both compressed (33-byte) and uncompressed (65-byte) formats.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded public key bytes.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or `EcdsaError::InvalidPublicKey` if the
    /// bytes don't represent a valid point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EcdsaError> {
        if bytes.is_empty() {
            return Err(EcdsaError::InvalidPublicKey(
                "pubkey bytes are empty".to_string(),
            ));
        }
        let point = AffinePoint::from_sec1(bytes)
            .map_err(|e| EcdsaError::InvalidPublicKey(e.to_string()))?;
        Self::from_point(point)
    }

    /// Create a PublicKey from a hex-encoded SEC1 string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string of a compressed (66 chars) or uncompressed (130 chars) key.
    ///
    /// # Returns
    /// `Ok(PublicKey)` on success, or an error if the hex or point is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, EcdsaError> {
        let bytes = hex::decode(hex_str).map_err(secp_primitives::PrimitivesError::from)?;
        Self::from_bytes(&bytes)
    }

    /// Wrap an affine point, rejecting infinity and off-curve coordinates.
    pub fn from_point(point: AffinePoint) -> Result<Self, EcdsaError> {
        if bool::from(point.is_identity()) {
            return Err(EcdsaError::InvalidPublicKey(
                "point at infinity is not a public key".to_string(),
            ));
        }
        if !bool::from(point.is_on_curve()) {
            return Err(EcdsaError::InvalidPublicKey("point not on curve".to_string()));
        }
        Ok(PublicKey { point })
    }

    /// Wrap a point derived from a non-zero scalar, which cannot be infinity.
    pub(crate) fn from_affine_unchecked(point: AffinePoint) -> Self {
        debug_assert!(!bool::from(point.is_identity()));
        PublicKey { point }
    }

    /// Normalize a Jacobian point, rejecting infinity.
    pub(crate) fn from_projective(point: &ProjectivePoint) -> Result<Self, EcdsaError> {
        Self::from_point(point.to_affine())
    }

    /// The underlying curve point.
    pub fn point(&self) -> &AffinePoint {
        &self.point
    }

    pub(crate) fn to_projective(&self) -> ProjectivePoint {
        ProjectivePoint::from_affine(&self.point)
    }

    /// Serialize the public key in compressed SEC1 format (33 bytes).
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        self.point.to_compressed()
    }

    /// Serialize the public key in uncompressed SEC1 format (65 bytes).
    ///
    /// The first byte is 0x04, followed by 32-byte X and 32-byte Y coordinates.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        self.point.to_uncompressed()
    }

    /// Hex encoding of the compressed form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_compressed())
    }

    /// Verify a signature over a 32-byte digest with this key.
    ///
    /// # Returns
    /// `true` if the signature is valid, `false` otherwise.
    pub fn verify(&self, ctx: &Context, digest: &[u8], sig: &Signature) -> bool {
        ctx.verify(self, digest, sig)
    }

    /// Add `tweak * G` to this key.
    ///
    /// Matches [`PrivateKey::tweak_add`](crate::PrivateKey::tweak_add) on the
    /// corresponding private key.
    ///
    /// # Arguments
    /// * `ctx` - Context used for the generator multiplication.
    /// * `tweak` - A 32-byte scalar below the curve order.
    ///
    /// # Returns
    /// The tweaked key, `EcdsaError::InvalidInput` for a malformed tweak, or
    /// `EcdsaError::InvalidPublicKey` if the result is the point at infinity.
    pub fn tweak_add(&self, ctx: &Context, tweak: &[u8]) -> Result<PublicKey, EcdsaError> {
        let t = parse_tweak(tweak)?;
        let sum = self.to_projective().add(&ctx.mul_gen(&t));
        Self::from_projective(&sum)
            .map_err(|_| EcdsaError::InvalidPublicKey("tweak produced the point at infinity".to_string()))
    }

    /// Multiply this key by `tweak`.
    ///
    /// # Arguments
    /// * `tweak` - A non-zero 32-byte scalar below the curve order.
    pub fn tweak_mul(&self, tweak: &[u8]) -> Result<PublicKey, EcdsaError> {
        let t = parse_tweak(tweak)?;
        if bool::from(t.is_zero()) {
            return Err(EcdsaError::InvalidInput("multiplicative tweak is zero".to_string()));
        }
        Self::from_projective(&self.to_projective().mul(&t))
    }

    /// The key for the negated private key.
    pub fn negate(&self) -> PublicKey {
        PublicKey {
            point: self.point.negate(),
        }
    }

    /// Sum several public keys.
    ///
    /// # Arguments
    /// * `keys` - At least one key.
    ///
    /// # Returns
    /// The point sum, `EcdsaError::InvalidInput` for an empty list, or
    /// `EcdsaError::InvalidPublicKey` if the keys cancel out.
    pub fn combine(keys: &[PublicKey]) -> Result<PublicKey, EcdsaError> {
        if keys.is_empty() {
            return Err(EcdsaError::InvalidInput("no public keys to combine".to_string()));
        }
        let sum = keys
            .iter()
            .fold(ProjectivePoint::IDENTITY, |acc, key| acc.add(&key.to_projective()));
        Self::from_projective(&sum)
            .map_err(|_| EcdsaError::InvalidPublicKey("combined keys sum to infinity".to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}
