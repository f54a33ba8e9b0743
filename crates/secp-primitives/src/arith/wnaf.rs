//! Windowed non-adjacent form recoding and variable-time multiplication.
//!
//! Only for public inputs: signature verification and public key recovery.
//! The digit sequence and the additions performed depend on the scalar.

use super::point::ProjectivePoint;
use super::scalar::Scalar;

/// Window width used for variable-time multiplication.
pub const WNAF_WINDOW: usize = 5;

/// Maximum number of wNAF digits for a 256-bit scalar.
const WNAF_LEN: usize = 257;

/// Recode a scalar into width-`w` NAF digits, least significant first.
///
/// Every non-zero digit is odd and lies in `(-2^(w-1), 2^(w-1))`; any two
/// non-zero digits are at least `w` positions apart.
pub fn wnaf(k: &Scalar, w: usize) -> [i8; WNAF_LEN] {
    debug_assert!((2..=8).contains(&w));
    let mut naf = [0i8; WNAF_LEN];
    // One spare limb absorbs the carry from negative digits.
    let mut d = [0u64; 5];
    d[..4].copy_from_slice(k.limbs());
    let width = 1i64 << w;
    let mask = (width - 1) as u64;

    let mut i = 0;
    while d.iter().any(|&limb| limb != 0) && i < WNAF_LEN {
        if d[0] & 1 == 1 {
            let mut digit = (d[0] & mask) as i64;
            if digit >= width / 2 {
                digit -= width;
            }
            naf[i] = digit as i8;
            if digit > 0 {
                sub_small(&mut d, digit as u64);
            } else {
                add_small(&mut d, (-digit) as u64);
            }
        }
        shr1(&mut d);
        i += 1;
    }
    naf
}

fn add_small(d: &mut [u64; 5], v: u64) {
    let mut carry = v;
    for limb in d.iter_mut() {
        let (sum, overflow) = limb.overflowing_add(carry);
        *limb = sum;
        carry = overflow as u64;
        if carry == 0 {
            break;
        }
    }
}

fn sub_small(d: &mut [u64; 5], v: u64) {
    let mut borrow = v;
    for limb in d.iter_mut() {
        let (diff, underflow) = limb.overflowing_sub(borrow);
        *limb = diff;
        borrow = underflow as u64;
        if borrow == 0 {
            break;
        }
    }
}

fn shr1(d: &mut [u64; 5]) {
    for i in 0..4 {
        d[i] = (d[i] >> 1) | (d[i + 1] << 63);
    }
    d[4] >>= 1;
}

/// Odd multiples P, 3P, 5P, ..., 15P.
fn odd_multiples(p: &ProjectivePoint) -> [ProjectivePoint; 1 << (WNAF_WINDOW - 2)] {
    let mut odd = [ProjectivePoint::IDENTITY; 1 << (WNAF_WINDOW - 2)];
    odd[0] = *p;
    let p2 = p.double();
    for i in 1..odd.len() {
        odd[i] = odd[i - 1].add(&p2);
    }
    odd
}

fn add_digit(acc: &ProjectivePoint, odd: &[ProjectivePoint], digit: i8) -> ProjectivePoint {
    if digit > 0 {
        acc.add(&odd[(digit as usize) / 2])
    } else if digit < 0 {
        acc.sub(&odd[(-digit as usize) / 2])
    } else {
        *acc
    }
}

/// Variable-time `k * p` using width-5 wNAF.
///
/// Must not be used with secret scalars.
pub fn mul_vartime(p: &ProjectivePoint, k: &Scalar) -> ProjectivePoint {
    lincomb_vartime(p, k, &ProjectivePoint::IDENTITY, &Scalar::ZERO)
}

/// Variable-time `k1 * p1 + k2 * p2` with interleaved wNAF digits.
///
/// Both multiplications share one doubling chain (Shamir's trick). Used by
/// verification (`u1*G + u2*Q`) and public key recovery. Must not be used
/// with secret scalars.
pub fn lincomb_vartime(
    p1: &ProjectivePoint,
    k1: &Scalar,
    p2: &ProjectivePoint,
    k2: &Scalar,
) -> ProjectivePoint {
    let odd1 = odd_multiples(p1);
    let odd2 = odd_multiples(p2);
    let naf1 = wnaf(k1, WNAF_WINDOW);
    let naf2 = wnaf(k2, WNAF_WINDOW);

    let top = naf1
        .iter()
        .zip(naf2.iter())
        .rposition(|(&a, &b)| a != 0 || b != 0);
    let top = match top {
        Some(top) => top,
        None => return ProjectivePoint::IDENTITY,
    };

    let mut acc = ProjectivePoint::IDENTITY;
    for i in (0..=top).rev() {
        acc = acc.double();
        acc = add_digit(&acc, &odd1, naf1[i]);
        acc = add_digit(&acc, &odd2, naf2[i]);
    }
    acc
}
