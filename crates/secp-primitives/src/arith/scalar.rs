//! secp256k1 scalar arithmetic (mod n).
//!
//! n = 0xFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141
//!
//! Scalars are private keys, nonces and signature components. All operations on
//! values that may be secret run in constant time.

use std::fmt;

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};
use zeroize::Zeroize;

use super::field::FieldElement;
use super::limbs::{self, Limbs};
use crate::PrimitivesError;

/// The curve order n.
const N: Limbs = [
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// 2^256 - n, used to fold wide products.
const N_COMPLEMENT: Limbs = [0x402D_A173_2FC9_BEBF, 0x4551_2319_50B7_5FC4, 0x1, 0];

/// n - 2, the Fermat inversion exponent.
const N_MINUS_2: Limbs = [
    0xBFD2_5E8C_D036_413F,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// floor(n / 2), the low-S boundary.
const N_HALF: Limbs = [
    0xDFE9_2F46_681B_20A0,
    0x5D57_6E73_57A4_501D,
    0xFFFF_FFFF_FFFF_FFFF,
    0x7FFF_FFFF_FFFF_FFFF,
];

/// Length of an encoded scalar in bytes.
pub const SCALAR_BYTES_LEN: usize = 32;

/// An integer modulo the curve order.
#[derive(Clone, Copy, Default)]
pub struct Scalar(Limbs);

impl Scalar {
    /// The additive identity.
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    /// The multiplicative identity.
    pub const ONE: Self = Self([1, 0, 0, 0]);

    /// Build a scalar from a small integer.
    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    /// Decode a 32-byte big-endian value, rejecting values >= n.
    pub fn from_bytes(bytes: &[u8; 32]) -> CtOption<Self> {
        let d = limbs::from_be_bytes(bytes);
        let in_range = !limbs::ct_ge(&d, &N);
        CtOption::new(Self(d), in_range)
    }

    /// Decode a 32-byte big-endian value and reduce it mod n.
    ///
    /// Any 256-bit value is below 2n, so one conditional subtraction suffices.
    /// This is how message digests are mapped onto scalars.
    pub fn from_bytes_reduced(bytes: &[u8; 32]) -> Self {
        let d = limbs::from_be_bytes(bytes);
        Self(limbs::conditional_sub_modulus(&d, 0, &N))
    }

    /// Decode a scalar from a byte slice.
    ///
    /// # Arguments
    /// * `bytes` - Exactly 32 big-endian bytes.
    ///
    /// # Returns
    /// `Ok(Scalar)` when the length is right and the value is below n.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        let arr: &[u8; 32] = bytes.try_into().map_err(|_| PrimitivesError::InvalidLength {
            expected: SCALAR_BYTES_LEN,
            got: bytes.len(),
        })?;
        Option::from(Self::from_bytes(arr)).ok_or_else(|| {
            PrimitivesError::InvalidScalar("scalar is not below the curve order".to_string())
        })
    }

    /// Decode a scalar from a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, PrimitivesError> {
        let bytes = hex::decode(hex_str)?;
        Self::from_slice(&bytes)
    }

    /// Reduce a field element (an x-coordinate) mod n.
    ///
    /// Field elements are below p < 2n, so at most one subtraction is needed.
    pub fn from_field_reduced(fe: &FieldElement) -> Self {
        Self(limbs::conditional_sub_modulus(fe.limbs(), 0, &N))
    }

    /// Whether reducing `fe` mod n changed its value (i.e. `fe >= n`).
    pub fn field_overflows(fe: &FieldElement) -> Choice {
        limbs::ct_ge(fe.limbs(), &N)
    }

    /// Lift this scalar into the field, optionally adding n first.
    ///
    /// Used to rebuild a nonce point's x-coordinate from `r` during public key
    /// recovery. `None` if the lifted value is not below p.
    pub fn to_field(&self, add_order: Choice) -> CtOption<FieldElement> {
        let addend = limbs::select(&[0; 4], &N, add_order);
        let (sum, carry) = limbs::add(&self.0, &addend);
        let fe = FieldElement::from_bytes(&limbs::to_be_bytes(&sum));
        let no_carry = carry.ct_eq(&0);
        CtOption::new(fe.unwrap_or(FieldElement::ZERO), fe.is_some() & no_carry)
    }

    /// Encode as 32 big-endian bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        limbs::to_be_bytes(&self.0)
    }

    /// Constant-time zero test.
    pub fn is_zero(&self) -> Choice {
        limbs::ct_is_zero(&self.0)
    }

    /// Constant-time test for s > n/2.
    pub fn is_high(&self) -> Choice {
        let (_, borrow) = limbs::sub(&N_HALF, &self.0);
        Choice::from(borrow as u8)
    }

    /// Four-bit window `i` (0 = least significant), for fixed-window multiplication.
    pub fn nibble(&self, i: usize) -> u8 {
        limbs::nibble(&self.0, i) as u8
    }

    /// Bit `i` (0 = least significant).
    pub fn bit(&self, i: usize) -> u8 {
        limbs::bit(&self.0, i) as u8
    }

    /// Modular addition.
    pub fn add(&self, rhs: &Self) -> Self {
        let (sum, carry) = limbs::add(&self.0, &rhs.0);
        Self(limbs::conditional_sub_modulus(&sum, carry, &N))
    }

    /// Modular subtraction.
    pub fn sub(&self, rhs: &Self) -> Self {
        let (diff, borrow) = limbs::sub(&self.0, &rhs.0);
        let mask = borrow.wrapping_neg();
        let addend = [N[0] & mask, N[1] & mask, N[2] & mask, N[3] & mask];
        let (r, _) = limbs::add(&diff, &addend);
        Self(r)
    }

    /// Modular negation; zero stays zero.
    pub fn negate(&self) -> Self {
        Self::ZERO.sub(self)
    }

    /// Modular multiplication.
    pub fn mul(&self, rhs: &Self) -> Self {
        Self::reduce_wide(&limbs::mul_wide(&self.0, &rhs.0))
    }

    /// Modular squaring.
    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Reduce a 512-bit value mod n.
    fn reduce_wide(t: &[u64; 8]) -> Self {
        // 2^256 - n is a 129-bit constant: four folds take the upper half to zero.
        let t = limbs::fold(t, &N_COMPLEMENT);
        let t = limbs::fold(&t, &N_COMPLEMENT);
        let t = limbs::fold(&t, &N_COMPLEMENT);
        let t = limbs::fold(&t, &N_COMPLEMENT);
        let lo = [t[0], t[1], t[2], t[3]];
        Self(limbs::conditional_sub_modulus(&lo, t[4], &N))
    }

    /// Multiplicative inverse via Fermat's little theorem.
    ///
    /// # Returns
    /// `Ok(inverse)`, or `PrimitivesError::Arithmetic` when `self` is zero.
    pub fn invert(&self) -> Result<Self, PrimitivesError> {
        Option::from(self.invert_ct())
            .ok_or_else(|| PrimitivesError::Arithmetic("inversion of zero scalar".to_string()))
    }

    /// Constant-time inverse; `None` for zero.
    pub fn invert_ct(&self) -> CtOption<Self> {
        let mut acc = Self::ONE;
        for i in (0..256).rev() {
            acc = acc.square();
            // Exponent n - 2 is public.
            if limbs::bit(&N_MINUS_2, i) == 1 {
                acc = acc.mul(self);
            }
        }
        CtOption::new(acc, !self.is_zero())
    }

    /// Raw limbs for recoding inside the crate.
    pub(crate) fn limbs(&self) -> &Limbs {
        &self.0
    }
}

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(limbs::select(&a.0, &b.0, choice))
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[0].ct_eq(&other.0[0])
            & self.0[1].ct_eq(&other.0[1])
            & self.0[2].ct_eq(&other.0[2])
            & self.0[3].ct_eq(&other.0[3])
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Scalars are frequently secret; never print the value.
        f.write_str("Scalar(..)")
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n_minus_one() -> Scalar {
        Scalar::from_hex("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140").unwrap()
    }

    /// Test range checking on decode.
    #[test]
    fn test_from_bytes_range() {
        let n_bytes = limbs::to_be_bytes(&N);
        assert!(bool::from(Scalar::from_bytes(&n_bytes).is_none()));
        assert!(Scalar::from_slice(&n_bytes).is_err());
        assert!(Scalar::from_slice(&[1u8; 33]).is_err());
        assert_eq!(Scalar::from_bytes_reduced(&n_bytes), Scalar::ZERO);
        // 2^256 - 1 - n = N_COMPLEMENT - 1
        let mut expected = limbs::to_be_bytes(&N_COMPLEMENT);
        expected[31] -= 1;
        assert_eq!(Scalar::from_bytes_reduced(&[0xff; 32]).to_bytes(), expected);
    }

    /// Test additive wraparound and negation.
    #[test]
    fn test_add_sub_negate() {
        let a = n_minus_one();
        assert_eq!(a.add(&Scalar::ONE), Scalar::ZERO);
        assert_eq!(Scalar::ZERO.sub(&Scalar::ONE), a);
        assert_eq!(Scalar::ONE.negate(), a);
        assert_eq!(Scalar::ZERO.negate(), Scalar::ZERO);
        let b = Scalar::from_u64(12345);
        assert_eq!(b.add(&b.negate()), Scalar::ZERO);
    }

    /// Test multiplication near the modulus: (n-1)^2 = 1.
    #[test]
    fn test_mul_reduction() {
        let a = n_minus_one();
        assert_eq!(a.square(), Scalar::ONE);
        assert_eq!(a.mul(&Scalar::from_u64(2)), Scalar::from_u64(2).negate());
        let big = Scalar::from_hex("7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a1").unwrap();
        // (n+1)/2 * 2 = 1
        assert_eq!(big.mul(&Scalar::from_u64(2)), Scalar::ONE);
    }

    /// Test inversion and the zero failure.
    #[test]
    fn test_invert() {
        let a = Scalar::from_hex("eaf02ca348c524e6392655ba4d29603cd1a7347d9d65cfe93ce1ebffdca22694").unwrap();
        assert_eq!(a.mul(&a.invert().unwrap()), Scalar::ONE);
        assert!(matches!(Scalar::ZERO.invert(), Err(PrimitivesError::Arithmetic(_))));
    }

    /// Test the low-S boundary.
    #[test]
    fn test_is_high() {
        let half = Scalar(N_HALF);
        assert!(!bool::from(half.is_high()));
        assert!(bool::from(half.add(&Scalar::ONE).is_high()));
        assert!(bool::from(n_minus_one().is_high()));
        assert!(!bool::from(Scalar::ONE.is_high()));
    }

    /// Test lifting r back into the field with and without the order added.
    #[test]
    fn test_to_field() {
        let one = Scalar::ONE;
        let plain = one.to_field(Choice::from(0)).unwrap();
        assert_eq!(plain, FieldElement::ONE);
        // 1 + n < p
        let lifted = one.to_field(Choice::from(1)).unwrap();
        assert!(bool::from(Scalar::field_overflows(&lifted)));
        assert_eq!(Scalar::from_field_reduced(&lifted), one);
        // (n - 1) + n overflows p
        assert!(bool::from(n_minus_one().to_field(Choice::from(1)).is_none()));
    }
}
