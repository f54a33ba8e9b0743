//! Fixed-width 256-bit limb arithmetic shared by the field and scalar types.
//!
//! Values are four little-endian `u64` limbs. Every routine here runs a fixed
//! number of iterations and derives carries and borrows arithmetically, so the
//! instruction trace does not depend on the operand values.

#![allow(clippy::needless_range_loop)]

use subtle::{Choice, ConditionallySelectable};

/// Four little-endian 64-bit limbs.
pub(crate) type Limbs = [u64; 4];

/// Add with carry: returns `(a + b + carry) mod 2^64` and the outgoing carry.
#[inline(always)]
pub(crate) const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// Subtract with borrow: returns `(a - b - borrow) mod 2^64` and the outgoing borrow (0 or 1).
#[inline(always)]
pub(crate) const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub((b as u128) + (borrow as u128));
    (t as u64, ((t >> 64) as u64) & 1)
}

/// Multiply-accumulate: returns the low and high words of `a + b * c + carry`.
#[inline(always)]
pub(crate) const fn mac(a: u64, b: u64, c: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) * (c as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// `a + b` over 256 bits, returning the sum and the carry out of the top limb.
#[inline]
pub(crate) fn add(a: &Limbs, b: &Limbs) -> (Limbs, u64) {
    let mut r = [0u64; 4];
    let mut carry = 0;
    for i in 0..4 {
        let (v, c) = adc(a[i], b[i], carry);
        r[i] = v;
        carry = c;
    }
    (r, carry)
}

/// `a - b` over 256 bits, returning the difference and the borrow out of the top limb.
#[inline]
pub(crate) fn sub(a: &Limbs, b: &Limbs) -> (Limbs, u64) {
    let mut r = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        let (v, b_out) = sbb(a[i], b[i], borrow);
        r[i] = v;
        borrow = b_out;
    }
    (r, borrow)
}

/// Full 256x256 -> 512 bit schoolbook product.
#[inline]
pub(crate) fn mul_wide(a: &Limbs, b: &Limbs) -> [u64; 8] {
    let mut t = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..4 {
            let (lo, hi) = mac(t[i + j], a[i], b[j], carry);
            t[i + j] = lo;
            carry = hi;
        }
        t[i + 4] = carry;
    }
    t
}

/// Fold the upper half of a 512-bit value onto the lower half.
///
/// Computes `lo + hi * c` where `c = 2^256 mod m` for the modulus being
/// reduced. The result is congruent to the input and strictly smaller once
/// `hi` is non-zero; callers apply it a fixed number of times.
#[inline]
pub(crate) fn fold(t: &[u64; 8], c: &Limbs) -> [u64; 8] {
    let mut r = [0u64; 8];
    r[..4].copy_from_slice(&t[..4]);
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..4 {
            let (lo, hi) = mac(r[i + j], t[i + 4], c[j], carry);
            r[i + j] = lo;
            carry = hi;
        }
        // Propagate the row carry through the remaining limbs.
        for k in (i + 4)..8 {
            let (v, c_out) = adc(r[k], carry, 0);
            r[k] = v;
            carry = c_out;
        }
    }
    r
}

/// Subtract `m` from `a` when `a >= m` (or when `extra` signals a carried-out bit).
///
/// The caller guarantees `a + extra * 2^256 < 2m`.
#[inline]
pub(crate) fn conditional_sub_modulus(a: &Limbs, extra: u64, m: &Limbs) -> Limbs {
    let (d, borrow) = sub(a, m);
    // Keep the difference if there was no borrow, or if the carried-out bit absorbs it.
    let keep_diff = Choice::from(((borrow ^ 1) | extra) as u8 & 1);
    select(a, &d, keep_diff)
}

/// Constant-time `a >= b`.
#[inline]
pub(crate) fn ct_ge(a: &Limbs, b: &Limbs) -> Choice {
    let (_, borrow) = sub(a, b);
    Choice::from((borrow ^ 1) as u8)
}

/// Constant-time all-zero test.
#[inline]
pub(crate) fn ct_is_zero(a: &Limbs) -> Choice {
    let acc = a[0] | a[1] | a[2] | a[3];
    // acc | -acc has the top bit set iff acc != 0.
    let nonzero = (acc | acc.wrapping_neg()) >> 63;
    Choice::from((nonzero ^ 1) as u8)
}

/// Select `b` when `choice` is set, otherwise `a`.
#[inline]
pub(crate) fn select(a: &Limbs, b: &Limbs, choice: Choice) -> Limbs {
    let mut r = [0u64; 4];
    for i in 0..4 {
        r[i] = u64::conditional_select(&a[i], &b[i], choice);
    }
    r
}

/// Decode 32 big-endian bytes into limbs.
#[inline]
pub(crate) fn from_be_bytes(bytes: &[u8; 32]) -> Limbs {
    let mut d = [0u64; 4];
    for i in 0..4 {
        let offset = (3 - i) * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[offset..offset + 8]);
        d[i] = u64::from_be_bytes(word);
    }
    d
}

/// Encode limbs as 32 big-endian bytes.
#[inline]
pub(crate) fn to_be_bytes(d: &Limbs) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for i in 0..4 {
        let offset = (3 - i) * 8;
        bytes[offset..offset + 8].copy_from_slice(&d[i].to_be_bytes());
    }
    bytes
}

/// Bit `i` of a 256-bit value (0 = least significant).
#[inline]
pub(crate) fn bit(d: &Limbs, i: usize) -> u64 {
    (d[i / 64] >> (i % 64)) & 1
}

/// Four-bit window `i` of a 256-bit value (window 0 = least significant nibble).
#[inline]
pub(crate) fn nibble(d: &Limbs, i: usize) -> u64 {
    (d[i / 16] >> ((i % 16) * 4)) & 0xf
}
