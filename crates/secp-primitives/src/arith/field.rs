//! Arithmetic modulo the secp256k1 field prime.
//!
//! p = 2^256 - 2^32 - 977
//!
//! Elements are kept fully reduced in four 64-bit limbs. Multiplication folds
//! the high half of the wide product using `2^256 = 2^32 + 977 (mod p)`.

use std::fmt;

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};
use zeroize::Zeroize;

use super::limbs::{self, Limbs};
use crate::PrimitivesError;

/// The field prime p, little-endian limbs.
const P: Limbs = [
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// 2^256 mod p.
const R: Limbs = [0x1_0000_03D1, 0, 0, 0];

/// p - 2, the Fermat inversion exponent.
const P_MINUS_2: Limbs = [
    0xFFFF_FFFE_FFFF_FC2D,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// (p + 1) / 4, the square root exponent (p = 3 mod 4).
const P_PLUS_1_DIV_4: Limbs = [
    0xFFFF_FFFF_BFFF_FF0C,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0x3FFF_FFFF_FFFF_FFFF,
];

/// An element of GF(p).
#[derive(Clone, Copy, Default)]
pub struct FieldElement(Limbs);

impl FieldElement {
    /// The additive identity.
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    /// The multiplicative identity.
    pub const ONE: Self = Self([1, 0, 0, 0]);
    /// The curve constant b = 7 in y^2 = x^3 + 7.
    pub const B: Self = Self([7, 0, 0, 0]);

    /// Wrap limbs already known to be below p (curve constants).
    pub(crate) const fn from_limbs_unchecked(limbs: Limbs) -> Self {
        Self(limbs)
    }

    /// Build a field element from a small integer.
    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    /// Decode a 32-byte big-endian value.
    ///
    /// The result is `None` if the value is not below p.
    pub fn from_bytes(bytes: &[u8; 32]) -> CtOption<Self> {
        let d = limbs::from_be_bytes(bytes);
        let in_range = !limbs::ct_ge(&d, &P);
        CtOption::new(Self(d), in_range)
    }

    /// Decode a 32-byte big-endian value from a slice, rejecting bad lengths and values >= p.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 32 big-endian bytes.
    ///
    /// # Returns
    /// `Ok(FieldElement)` or an error describing the rejection.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: &[u8; 32] = bytes.try_into().map_err(|_| PrimitivesError::InvalidLength {
            expected: 32,
            got: bytes.len(),
        })?;
        Option::from(Self::from_bytes(arr)).ok_or_else(|| {
            PrimitivesError::InvalidEncoding("field element is not below the field prime".to_string())
        })
    }

    /// Encode as 32 big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        limbs::to_be_bytes(&self.0)
    }

    /// Constant-time zero test.
    pub fn is_zero(&self) -> Choice {
        limbs::ct_is_zero(&self.0)
    }

    /// Constant-time parity of the canonical representative.
    pub fn is_odd(&self) -> Choice {
        Choice::from((self.0[0] & 1) as u8)
    }

    /// Modular addition.
    pub fn add(&self, rhs: &Self) -> Self {
        let (sum, carry) = limbs::add(&self.0, &rhs.0);
        Self(limbs::conditional_sub_modulus(&sum, carry, &P))
    }

    /// Modular subtraction.
    pub fn sub(&self, rhs: &Self) -> Self {
        let (diff, borrow) = limbs::sub(&self.0, &rhs.0);
        // Add p back if the subtraction wrapped.
        let mask = borrow.wrapping_neg();
        let addend = [P[0] & mask, P[1] & mask, P[2] & mask, P[3] & mask];
        let (r, _) = limbs::add(&diff, &addend);
        Self(r)
    }

    /// Modular negation.
    pub fn negate(&self) -> Self {
        Self::ZERO.sub(self)
    }

    /// Doubling, `2 * self`.
    pub fn double(&self) -> Self {
        self.add(self)
    }

    /// Multiply by a small constant.
    pub fn mul_small(&self, k: u64) -> Self {
        self.mul(&Self::from_u64(k))
    }

    /// Modular multiplication.
    pub fn mul(&self, rhs: &Self) -> Self {
        Self::reduce_wide(&limbs::mul_wide(&self.0, &rhs.0))
    }

    /// Modular squaring.
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Reduce a 512-bit product mod p.
    fn reduce_wide(t: &[u64; 8]) -> Self {
        // hi * R contributes at most 33 extra bits; three folds always clear the upper half.
        let t = limbs::fold(t, &R);
        let t = limbs::fold(&t, &R);
        let t = limbs::fold(&t, &R);
        let lo = [t[0], t[1], t[2], t[3]];
        Self(limbs::conditional_sub_modulus(&lo, t[4], &P))
    }

    /// Raise to a public exponent with fixed square-and-multiply.
    ///
    /// The exponent is a compile-time constant, so branching on its bits leaks nothing.
    fn pow_public(&self, exp: &Limbs) -> Self {
        let mut acc = Self::ONE;
        for i in (0..256).rev() {
            acc = acc.square();
            if limbs::bit(exp, i) == 1 {
                acc = acc.mul(self);
            }
        }
        acc
    }

    /// Multiplicative inverse via Fermat's little theorem.
    ///
    /// # Returns
    /// `Ok(inverse)`, or `PrimitivesError::Arithmetic` when `self` is zero.
    pub fn invert(&self) -> Result<Self, PrimitivesError> {
        Option::from(self.invert_ct())
            .ok_or_else(|| PrimitivesError::Arithmetic("inversion of zero field element".to_string()))
    }

    /// Constant-time inverse; `None` for zero.
    pub fn invert_ct(&self) -> CtOption<Self> {
        CtOption::new(self.pow_public(&P_MINUS_2), !self.is_zero())
    }

    /// Square root, if one exists.
    ///
    /// Uses `a^((p+1)/4)` and checks the candidate, since p = 3 mod 4.
    pub fn sqrt(&self) -> CtOption<Self> {
        let candidate = self.pow_public(&P_PLUS_1_DIV_4);
        let is_root = candidate.square().ct_eq(self);
        CtOption::new(candidate, is_root)
    }

    /// Evaluate the curve right-hand side, x^3 + 7.
    pub fn curve_rhs(&self) -> Self {
        self.square().mul(self).add(&Self::B)
    }

    /// Raw limbs, used by the scalar type to reduce x-coordinates mod n.
    pub(crate) fn limbs(&self) -> &Limbs {
        &self.0
    }
}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(limbs::select(&a.0, &b.0, choice))
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", hex::encode(self.to_bytes()))
    }
}

impl Zeroize for FieldElement {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(hex_str: &str) -> FieldElement {
        let bytes: [u8; 32] = hex::decode(hex_str).unwrap().try_into().unwrap();
        FieldElement::from_bytes(&bytes).unwrap()
    }

    fn p_minus_one() -> FieldElement {
        fe("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2e")
    }

    /// Test that values >= p are rejected on decode.
    #[test]
    fn test_from_bytes_range() {
        let p_bytes = limbs::to_be_bytes(&P);
        assert!(bool::from(FieldElement::from_bytes(&p_bytes).is_none()));
        assert!(FieldElement::from_slice(&[0u8; 31]).is_err());
        assert_eq!(p_minus_one().add(&FieldElement::ONE), FieldElement::ZERO);
    }

    /// Test wraparound in addition and subtraction.
    #[test]
    fn test_add_sub_wrap() {
        let a = p_minus_one();
        let two = FieldElement::from_u64(2);
        assert_eq!(a.add(&two), FieldElement::ONE);
        assert_eq!(FieldElement::ONE.sub(&two), a);
        assert_eq!(FieldElement::ONE.negate(), a);
        assert_eq!(FieldElement::ZERO.negate(), FieldElement::ZERO);
    }

    /// Test multiplication at the top of the range: (p-1)^2 = 1.
    #[test]
    fn test_mul_minus_one_squared() {
        let a = p_minus_one();
        assert_eq!(a.square(), FieldElement::ONE);
        assert_eq!(a.mul(&FieldElement::from_u64(3)), FieldElement::from_u64(3).negate());
    }

    /// Test inversion round trip and the zero failure.
    #[test]
    fn test_invert() {
        let a = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        let inv = a.invert().unwrap();
        assert_eq!(a.mul(&inv), FieldElement::ONE);
        assert!(matches!(
            FieldElement::ZERO.invert(),
            Err(PrimitivesError::Arithmetic(_))
        ));
    }

    /// Test square roots of the generator's curve equation.
    #[test]
    fn test_sqrt_generator_y() {
        let x = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        let y = fe("483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8");
        let root = x.curve_rhs().sqrt().unwrap();
        assert!(root == y || root == y.negate());
        // -1 is a non-residue since p = 3 mod 4.
        assert!(bool::from(FieldElement::ONE.negate().sqrt().is_none()));
    }
}
