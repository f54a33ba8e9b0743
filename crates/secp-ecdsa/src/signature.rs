//! ECDSA signatures: compact, DER and recoverable encodings.
//!
//! DER parsing is strict: one canonical encoding per signature, no trailing
//! data, no superfluous padding, no negative integers.

use std::fmt;

use secp_primitives::Scalar;
use subtle::ConditionallySelectable;

use crate::EcdsaError;

/// Length of a compact `r || s` signature.
pub const COMPACT_SIGNATURE_LEN: usize = 64;

/// Length of a recoverable `r || s || recovery_id` signature.
pub const RECOVERABLE_SIGNATURE_LEN: usize = 65;

/// Longest possible DER signature: two 33-byte integers plus headers.
const MAX_DER_LEN: usize = 72;

/// Shortest possible DER signature: two 1-byte integers plus headers.
const MIN_DER_LEN: usize = 8;

/// An ECDSA signature with R and S components, both in [1, n-1].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    r: Scalar,
    s: Scalar,
}

impl Signature {
    /// Create a signature from its scalar components.
    ///
    /// # Arguments
    /// * `r` - The R component.
    /// * `s` - The S component.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `EcdsaError::InvalidSignature` if either value is zero.
    pub fn from_scalars(r: Scalar, s: Scalar) -> Result<Self, EcdsaError> {
        if bool::from(r.is_zero()) {
            return Err(EcdsaError::InvalidSignature("signature R is zero".to_string()));
        }
        if bool::from(s.is_zero()) {
            return Err(EcdsaError::InvalidSignature("signature S is zero".to_string()));
        }
        Ok(Signature { r, s })
    }

    /// Build from components already known to be non-zero.
    pub(crate) fn new_unchecked(r: Scalar, s: Scalar) -> Self {
        Signature { r, s }
    }

    /// Access the R component of the signature.
    pub fn r(&self) -> &Scalar {
        &self.r
    }

    /// Access the S component of the signature.
    pub fn s(&self) -> &Scalar {
        &self.s
    }

    /// Parse a 64-byte compact signature (`r || s`, big-endian).
    ///
    /// # Arguments
    /// * `bytes` - Exactly 64 bytes.
    ///
    /// # Returns
    /// `Ok(Signature)`, or `EcdsaError::InvalidSignature` if the length is wrong
    /// or either component is zero or not below the curve order.
    pub fn from_compact(bytes: &[u8]) -> Result<Self, EcdsaError> {
        if bytes.len() != COMPACT_SIGNATURE_LEN {
            return Err(EcdsaError::InvalidSignature(format!(
                "compact signature must be {} bytes, got {}",
                COMPACT_SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let r = scalar_component(&bytes[..32], "R")?;
        let s = scalar_component(&bytes[32..], "S")?;
        Self::from_scalars(r, s)
    }

    /// Serialize as 64 bytes: `r || s`, big-endian.
    pub fn to_compact(&self) -> [u8; COMPACT_SIGNATURE_LEN] {
        let mut out = [0u8; COMPACT_SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r.to_bytes());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }

    /// Parse a strictly DER-encoded ECDSA signature.
    ///
    /// Expected format: 0x30 <len> 0x02 <r_len> <r> 0x02 <s_len> <s>
    ///
    /// # Arguments
    /// * `bytes` - DER-encoded signature bytes.
    ///
    /// # Returns
    /// `Ok(Signature)` on success, or `EcdsaError::InvalidSignature` if the
    /// encoding is malformed or not canonical.
    pub fn from_der(bytes: &[u8]) -> Result<Self, EcdsaError> {
        if bytes.len() < MIN_DER_LEN {
            return Err(malformed("too short"));
        }
        if bytes.len() > MAX_DER_LEN {
            return Err(malformed("too long"));
        }
        if bytes[0] != 0x30 {
            return Err(malformed("no header magic"));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(malformed("bad length"));
        }

        let (r, rest) = parse_der_int(&bytes[2..], "R")?;
        let (s, rest) = parse_der_int(rest, "S")?;
        if !rest.is_empty() {
            return Err(malformed("trailing bytes"));
        }
        Self::from_scalars(r, s)
    }

    /// Serialize in canonical DER.
    ///
    /// Output format: 0x30 <len> 0x02 <r_len> <r_bytes> 0x02 <s_len> <s_bytes>.
    /// S is written as stored; call [`normalize_s`](Self::normalize_s) first
    /// to force the low-S form.
    pub fn to_der(&self) -> Vec<u8> {
        let rb = canonicalize_int(&self.r.to_bytes());
        let sb = canonicalize_int(&self.s.to_bytes());

        let total_len = 6 + rb.len() + sb.len();
        let mut out = Vec::with_capacity(total_len);
        out.push(0x30);
        out.push((total_len - 2) as u8);
        out.push(0x02);
        out.push(rb.len() as u8);
        out.extend_from_slice(&rb);
        out.push(0x02);
        out.push(sb.len() as u8);
        out.extend_from_slice(&sb);
        out
    }

    /// Whether S lies in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        !bool::from(self.s.is_high())
    }

    /// Return the equivalent signature with S replaced by n - S when S > n/2.
    pub fn normalize_s(&self) -> Self {
        Signature {
            r: self.r,
            s: Scalar::conditional_select(&self.s, &self.s.negate(), self.s.is_high()),
        }
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.to_compact()))
    }
}

/// A signature plus the recovery id needed to rebuild the signer's public key.
///
/// Bit 0 of the id is the parity of R's y-coordinate; bit 1 is set when R's
/// x-coordinate was reduced modulo n.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: u8,
}

impl RecoverableSignature {
    /// Pair a signature with a recovery id.
    ///
    /// # Returns
    /// `Ok(RecoverableSignature)`, or `EcdsaError::InvalidSignature` if
    /// `recovery_id` is greater than 3.
    pub fn new(signature: Signature, recovery_id: u8) -> Result<Self, EcdsaError> {
        if recovery_id > 3 {
            return Err(EcdsaError::InvalidSignature(format!(
                "invalid recovery id {}",
                recovery_id
            )));
        }
        Ok(RecoverableSignature {
            signature,
            recovery_id,
        })
    }

    /// The plain signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The recovery id, in 0..=3.
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// Drop the recovery id.
    pub fn to_signature(&self) -> Signature {
        self.signature
    }

    /// Parse 65 bytes: `r || s || recovery_id`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EcdsaError> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LEN {
            return Err(EcdsaError::InvalidSignature(format!(
                "recoverable signature must be {} bytes, got {}",
                RECOVERABLE_SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let signature = Signature::from_compact(&bytes[..COMPACT_SIGNATURE_LEN])?;
        Self::new(signature, bytes[COMPACT_SIGNATURE_LEN])
    }

    /// Serialize as 65 bytes: `r || s || recovery_id`.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LEN] {
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LEN];
        out[..COMPACT_SIGNATURE_LEN].copy_from_slice(&self.signature.to_compact());
        out[COMPACT_SIGNATURE_LEN] = self.recovery_id;
        out
    }
}

fn malformed(reason: &str) -> EcdsaError {
    EcdsaError::InvalidSignature(format!("malformed signature: {}", reason))
}

/// Parse one 32-byte big-endian component, rejecting values >= n.
fn scalar_component(bytes: &[u8], name: &str) -> Result<Scalar, EcdsaError> {
    let mut buf = [0u8; 32];
    buf[32 - bytes.len()..].copy_from_slice(bytes);
    Option::from(Scalar::from_bytes(&buf)).ok_or_else(|| {
        EcdsaError::InvalidSignature(format!("signature {} is >= curve order", name))
    })
}

/// Parse one DER INTEGER from the front of `data`.
///
/// # Returns
/// The integer as a scalar and the bytes following it.
fn parse_der_int<'a>(data: &'a [u8], name: &str) -> Result<(Scalar, &'a [u8]), EcdsaError> {
    if data.len() < 2 || data[0] != 0x02 {
        return Err(malformed(&format!("no {} int marker", name)));
    }
    let len = data[1] as usize;
    if len == 0 || len > 33 || 2 + len > data.len() {
        return Err(malformed(&format!("bogus {} length", name)));
    }
    let int = &data[2..2 + len];
    if int[0] & 0x80 != 0 {
        return Err(malformed(&format!("{} is negative", name)));
    }
    if len > 1 && int[0] == 0x00 && int[1] & 0x80 == 0 {
        return Err(malformed(&format!("{} has excessive padding", name)));
    }
    let trimmed = if int[0] == 0x00 && len > 1 { &int[1..] } else { int };
    if trimmed.len() > 32 {
        return Err(malformed(&format!("{} is too large", name)));
    }
    Ok((scalar_component(trimmed, name)?, &data[2 + len..]))
}

/// Canonicalize an integer for DER encoding.
///
/// Strips leading zeros from the big-endian representation and adds
/// a 0x00 padding byte if the high bit is set (to prevent interpretation
/// as a negative number).
fn canonicalize_int(val: &[u8; 32]) -> Vec<u8> {
    let mut start = 0;
    while start < 31 && val[start] == 0 {
        start += 1;
    }
    let trimmed = &val[start..];

    if trimmed[0] & 0x80 != 0 {
        let mut out = Vec::with_capacity(trimmed.len() + 1);
        out.push(0x00);
        out.extend_from_slice(trimmed);
        out
    } else {
        trimmed.to_vec()
    }
}
