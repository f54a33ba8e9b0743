//! Deterministic nonce generation (RFC6979) on top of HMAC-DRBG.
//!
//! The same DRBG also derives fresh blinding values when a context is
//! reseeded, so no other randomness expander is needed.

use std::fmt;

use secp_primitives::hash::sha256_hmac_parts;
use secp_primitives::Scalar;
use zeroize::Zeroize;

/// How the per-signature nonce `k` is chosen.
#[derive(Clone, Copy, Default)]
pub enum NonceSource<'a> {
    /// RFC6979 with HMAC-SHA256, keyed by the private key and digest.
    #[default]
    Rfc6979,
    /// RFC6979 with 32 bytes of additional data mixed into the seed.
    ///
    /// Signatures stay deterministic for a fixed `extra` value but differ
    /// from plain RFC6979 output.
    Rfc6979WithData(&'a [u8; 32]),
    /// A caller-supplied nonce, used as-is. It must be a valid non-zero scalar
    /// and must never be reused with a different digest.
    Explicit(&'a [u8; 32]),
}

impl fmt::Debug for NonceSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NonceSource::Rfc6979 => f.write_str("Rfc6979"),
            NonceSource::Rfc6979WithData(extra) => {
                write!(f, "Rfc6979WithData({})", hex::encode(extra))
            }
            NonceSource::Explicit(_) => f.write_str("Explicit(..)"),
        }
    }
}

/// HMAC-SHA256 DRBG as specified in RFC6979 section 3.2.
pub(crate) struct HmacDrbg {
    k: [u8; 32],
    v: [u8; 32],
    /// Set after the first output; later calls first step the state (3.2.h.3).
    retry: bool,
}

impl HmacDrbg {
    /// Instantiate from the concatenation of `seed` fragments.
    pub(crate) fn new(seed: &[&[u8]]) -> Self {
        let mut drbg = HmacDrbg {
            k: [0x00; 32],
            v: [0x01; 32],
            retry: false,
        };
        drbg.update(seed, 0x00);
        drbg.update(seed, 0x01);
        drbg
    }

    fn update(&mut self, seed: &[&[u8]], separator: u8) {
        let sep = [separator];
        let mut parts: Vec<&[u8]> = Vec::with_capacity(seed.len() + 2);
        parts.push(&self.v[..]);
        parts.push(&sep[..]);
        parts.extend_from_slice(seed);
        self.k = sha256_hmac_parts(&self.k, &parts);
        self.v = sha256_hmac_parts(&self.k, &[&self.v[..]]);
    }

    /// Produce the next 32 output bytes.
    pub(crate) fn fill(&mut self, out: &mut [u8; 32]) {
        if self.retry {
            self.k = sha256_hmac_parts(&self.k, &[&self.v[..], &[0x00u8][..]]);
            self.v = sha256_hmac_parts(&self.k, &[&self.v[..]]);
        }
        self.v = sha256_hmac_parts(&self.k, &[&self.v[..]]);
        out.copy_from_slice(&self.v);
        self.retry = true;
    }

    /// Draw the next candidate and accept it only if it lies in [1, n-1].
    ///
    /// # Returns
    /// `Some(Scalar)` for an acceptable candidate, `None` when the output was
    /// zero or not below n and the caller should draw again.
    pub(crate) fn next_scalar(&mut self) -> Option<Scalar> {
        let mut out = [0u8; 32];
        self.fill(&mut out);
        let candidate = Option::<Scalar>::from(Scalar::from_bytes(&out));
        out.zeroize();
        candidate.filter(|k| !bool::from(k.is_zero()))
    }
}

impl Drop for HmacDrbg {
    fn drop(&mut self) {
        self.k.zeroize();
        self.v.zeroize();
    }
}

/// Seed a DRBG for signing: `int2octets(x) || bits2octets(h) [|| extra]`.
///
/// # Arguments
/// * `secret` - The private scalar.
/// * `message` - The digest already reduced modulo n.
/// * `extra` - Optional additional data.
pub(crate) fn nonce_drbg(secret: &Scalar, message: &Scalar, extra: Option<&[u8; 32]>) -> HmacDrbg {
    let mut key = secret.to_bytes();
    let msg = message.to_bytes();
    let drbg = match extra {
        Some(extra) => HmacDrbg::new(&[&key[..], &msg[..], &extra[..]]),
        None => HmacDrbg::new(&[&key[..], &msg[..]]),
    };
    key.zeroize();
    drbg
}
