//! ECDSA over secp256k1: key derivation, signing, verification, recovery.
//!
//! Secret-dependent work (the nonce point `k*G`, the public key `d*G`) goes
//! through the context's blinded table. Verification and recovery only touch
//! public data and use the faster variable-time wNAF combination.

use secp_primitives::arith::wnaf::lincomb_vartime;
use secp_primitives::{AffinePoint, FieldElement, ProjectivePoint, Scalar};
use subtle::{Choice, ConditionallySelectable};
use tracing::warn;
use zeroize::Zeroize;

use crate::context::Context;
use crate::private_key::parse_secret_scalar;
use crate::public_key::PublicKey;
use crate::rfc6979::{nonce_drbg, NonceSource};
use crate::signature::{RecoverableSignature, Signature};
use crate::EcdsaError;

/// Length of the message digest accepted by sign and verify.
pub const DIGEST_LEN: usize = 32;

impl Context {
    /// Check whether `secret_key` is a valid private key (32 bytes, in [1, n-1]).
    pub fn verify_secret_key(&self, secret_key: &[u8]) -> bool {
        parse_secret_scalar(secret_key).is_ok()
    }

    /// Derive the public key `d * G` for a private scalar.
    ///
    /// # Arguments
    /// * `secret_key` - 32-byte big-endian private scalar.
    ///
    /// # Returns
    /// The public key, or `EcdsaError::InvalidPrivateKey` if the scalar is zero
    /// or not below the curve order.
    pub fn derive_public_key(&self, secret_key: &[u8]) -> Result<PublicKey, EcdsaError> {
        let mut d = parse_secret_scalar(secret_key)?;
        let public_key = self.public_key_for(&d);
        d.zeroize();
        Ok(public_key)
    }

    /// Sign a 32-byte digest with a deterministic RFC6979 nonce.
    ///
    /// # Arguments
    /// * `secret_key` - 32-byte big-endian private scalar.
    /// * `digest` - The message hash, exactly 32 bytes.
    ///
    /// # Returns
    /// A low-S `Signature`, `EcdsaError::InvalidPrivateKey` for a bad key, or
    /// `EcdsaError::InvalidInput` for a bad digest.
    pub fn sign(&self, secret_key: &[u8], digest: &[u8]) -> Result<Signature, EcdsaError> {
        self.sign_with(secret_key, digest, NonceSource::Rfc6979)
    }

    /// Sign a 32-byte digest with the given nonce source.
    ///
    /// RFC6979 sources draw a new candidate whenever a nonce yields r = 0 or
    /// s = 0, up to `max_nonce_retries` extra times. An explicit nonce that
    /// is out of range or yields r = 0 or s = 0 fails with
    /// `EcdsaError::InvalidInput`.
    pub fn sign_with(
        &self,
        secret_key: &[u8],
        digest: &[u8],
        nonce: NonceSource<'_>,
    ) -> Result<Signature, EcdsaError> {
        let mut d = parse_secret_scalar(secret_key)?;
        let signed = self.sign_scalar(&d, digest, nonce);
        d.zeroize();
        signed.map(|(sig, _)| sig)
    }

    /// Sign and return the recovery id alongside the signature.
    pub fn sign_recoverable(
        &self,
        secret_key: &[u8],
        digest: &[u8],
        nonce: NonceSource<'_>,
    ) -> Result<RecoverableSignature, EcdsaError> {
        let mut d = parse_secret_scalar(secret_key)?;
        let signed = self.sign_scalar(&d, digest, nonce);
        d.zeroize();
        let (sig, recovery_id) = signed?;
        RecoverableSignature::new(sig, recovery_id)
    }

    /// Verify a signature over a 32-byte digest.
    ///
    /// Never fails: a digest of the wrong length, a high-S signature (when
    /// the context enforces low-S) or any mismatch all return `false`.
    ///
    /// # Arguments
    /// * `public_key` - The signer's public key.
    /// * `digest` - The message hash that was signed.
    /// * `signature` - The signature to check.
    ///
    /// # Returns
    /// `true` if the signature is valid, `false` otherwise.
    pub fn verify(&self, public_key: &PublicKey, digest: &[u8], signature: &Signature) -> bool {
        let message = match parse_digest(digest) {
            Ok(message) => message,
            Err(_) => return false,
        };
        if self.config().enforce_low_s && !signature.is_low_s() {
            return false;
        }
        let s_inv = match signature.s().invert() {
            Ok(s_inv) => s_inv,
            Err(_) => return false,
        };

        let u1 = message.mul(&s_inv);
        let u2 = signature.r().mul(&s_inv);
        let big_r = lincomb_vartime(
            &ProjectivePoint::GENERATOR,
            &u1,
            &public_key.to_projective(),
            &u2,
        );
        if bool::from(big_r.is_identity()) {
            return false;
        }
        Scalar::from_field_reduced(big_r.to_affine().x()) == *signature.r()
    }

    /// Verify from raw encodings: SEC1 public key and 64-byte compact signature.
    ///
    /// Unparseable inputs verify `false`.
    pub fn verify_bytes(&self, public_key: &[u8], digest: &[u8], signature: &[u8]) -> bool {
        let public_key = match PublicKey::from_bytes(public_key) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let signature = match Signature::from_compact(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        self.verify(&public_key, digest, &signature)
    }

    /// Recover the signer's public key from a recoverable signature.
    ///
    /// # Arguments
    /// * `digest` - The message hash that was signed.
    /// * `signature` - Signature plus recovery id.
    ///
    /// # Returns
    /// The public key, or `EcdsaError::InvalidSignature` if no valid key
    /// corresponds to the signature.
    pub fn recover(
        &self,
        digest: &[u8],
        signature: &RecoverableSignature,
    ) -> Result<PublicKey, EcdsaError> {
        let message = parse_digest(digest)?;
        let recovery_id = signature.recovery_id();
        let r = signature.signature().r();
        let s = signature.signature().s();

        let x = Option::<FieldElement>::from(r.to_field(Choice::from((recovery_id >> 1) & 1)))
            .ok_or_else(|| {
                EcdsaError::InvalidSignature("recovery id selects an x beyond the field".to_string())
            })?;
        let big_r = Option::<AffinePoint>::from(AffinePoint::decompress(&x, Choice::from(recovery_id & 1)))
            .ok_or_else(|| EcdsaError::InvalidSignature("R is not on the curve".to_string()))?;

        let r_inv = r.invert().map_err(|e| EcdsaError::Arithmetic(e.to_string()))?;
        let u1 = message.mul(&r_inv).negate();
        let u2 = s.mul(&r_inv);
        let q = lincomb_vartime(
            &ProjectivePoint::GENERATOR,
            &u1,
            &ProjectivePoint::from_affine(&big_r),
            &u2,
        );
        PublicKey::from_projective(&q)
            .map_err(|_| EcdsaError::InvalidSignature("recovered the point at infinity".to_string()))
    }

    /// Public key for a scalar already known to be in [1, n-1].
    pub(crate) fn public_key_for(&self, d: &Scalar) -> PublicKey {
        PublicKey::from_affine_unchecked(self.mul_gen(d).to_affine())
    }

    /// Sign with a validated private scalar.
    ///
    /// # Returns
    /// The signature and its recovery id.
    pub(crate) fn sign_scalar(
        &self,
        d: &Scalar,
        digest: &[u8],
        nonce: NonceSource<'_>,
    ) -> Result<(Signature, u8), EcdsaError> {
        let message = parse_digest(digest)?;
        match nonce {
            NonceSource::Explicit(k_bytes) => {
                let mut k = Option::<Scalar>::from(Scalar::from_bytes(k_bytes))
                    .filter(|k| !bool::from(k.is_zero()))
                    .ok_or_else(|| {
                        EcdsaError::InvalidInput("explicit nonce must be in [1, n-1]".to_string())
                    })?;
                let signed = self.sign_with_nonce(d, &message, &k);
                k.zeroize();
                signed.ok_or_else(|| {
                    EcdsaError::InvalidInput("explicit nonce yields r = 0 or s = 0".to_string())
                })
            }
            NonceSource::Rfc6979 => self.sign_rfc6979(d, &message, None),
            NonceSource::Rfc6979WithData(extra) => self.sign_rfc6979(d, &message, Some(extra)),
        }
    }

    fn sign_rfc6979(
        &self,
        d: &Scalar,
        message: &Scalar,
        extra: Option<&[u8; 32]>,
    ) -> Result<(Signature, u8), EcdsaError> {
        let mut drbg = nonce_drbg(d, message, extra);
        let attempts = self.config().max_nonce_retries.saturating_add(1);
        for attempt in 0..attempts {
            if let Some(mut k) = drbg.next_scalar() {
                let signed = self.sign_with_nonce(d, message, &k);
                k.zeroize();
                if let Some(result) = signed {
                    return Ok(result);
                }
            }
            warn!(attempt = attempt, "rfc6979 nonce candidate rejected, drawing another");
        }
        Err(EcdsaError::Arithmetic(format!(
            "no usable nonce after {} attempts",
            attempts
        )))
    }

    /// One signing attempt: `r = x(k*G) mod n`, `s = k^-1 (m + r*d)`.
    ///
    /// `None` when r or s is zero. S is always normalized to the low half,
    /// flipping the parity bit of the recovery id when it is negated.
    fn sign_with_nonce(&self, d: &Scalar, message: &Scalar, k: &Scalar) -> Option<(Signature, u8)> {
        let big_r = self.mul_gen(k).to_affine();
        let r = Scalar::from_field_reduced(big_r.x());
        if bool::from(r.is_zero()) {
            return None;
        }
        let mut recovery_id =
            big_r.y().is_odd().unwrap_u8() | (Scalar::field_overflows(big_r.x()).unwrap_u8() << 1);

        let mut k_inv = k.invert_ct().unwrap_or(Scalar::ZERO);
        let s = k_inv.mul(&message.add(&r.mul(d)));
        k_inv.zeroize();
        if bool::from(s.is_zero()) {
            return None;
        }

        let high = s.is_high();
        let s = Scalar::conditional_select(&s, &s.negate(), high);
        recovery_id ^= high.unwrap_u8();
        Some((Signature::new_unchecked(r, s), recovery_id))
    }
}

/// Interpret a 32-byte digest as a scalar, reduced modulo n.
fn parse_digest(digest: &[u8]) -> Result<Scalar, EcdsaError> {
    if digest.len() != DIGEST_LEN {
        return Err(EcdsaError::InvalidInput(format!(
            "digest must be {} bytes, got {}",
            DIGEST_LEN,
            digest.len()
        )));
    }
    let mut buf = [0u8; DIGEST_LEN];
    buf.copy_from_slice(digest);
    Ok(Scalar::from_bytes_reduced(&buf))
}
