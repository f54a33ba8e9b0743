//! secp256k1 group elements: y^2 = x^3 + 7 over GF(p).
//!
//! `ProjectivePoint` uses Jacobian coordinates (x = X/Z^2, y = Y/Z^3) with
//! Z = 0 as the point at infinity. `AffinePoint` is the normalized form used
//! at API boundaries and for SEC1 encoding.

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};
use zeroize::Zeroize;

use super::field::FieldElement;
use super::limbs::Limbs;
use super::scalar::Scalar;
use crate::PrimitivesError;

/// Length of a compressed SEC1 point (prefix + 32 byte x-coordinate).
pub const COMPRESSED_LEN: usize = 33;

/// Length of an uncompressed SEC1 point (prefix + 32 byte x + 32 byte y).
pub const UNCOMPRESSED_LEN: usize = 65;

const GENERATOR_X: Limbs = [
    0x59F2_815B_16F8_1798,
    0x029B_FCDB_2DCE_28D9,
    0x55A0_6295_CE87_0B07,
    0x79BE_667E_F9DC_BBAC,
];

const GENERATOR_Y: Limbs = [
    0x9C47_D08F_FB10_D4B8,
    0xFD17_B448_A685_5419,
    0x5DA4_FBFC_0E11_08A8,
    0x483A_DA77_26A3_C465,
];

/// A point in affine coordinates, or the point at infinity.
#[derive(Clone, Copy, Debug)]
pub struct AffinePoint {
    x: FieldElement,
    y: FieldElement,
    /// 1 for the point at infinity, 0 otherwise.
    infinity: u8,
}

impl AffinePoint {
    /// The point at infinity.
    pub const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ZERO,
        infinity: 1,
    };

    /// The standard generator G.
    pub const GENERATOR: Self = Self {
        x: FieldElement::from_limbs_unchecked(GENERATOR_X),
        y: FieldElement::from_limbs_unchecked(GENERATOR_Y),
        infinity: 0,
    };

    /// Build a point from coordinates, checking the curve equation.
    pub fn from_xy(x: FieldElement, y: FieldElement) -> CtOption<Self> {
        let point = Self { x, y, infinity: 0 };
        CtOption::new(point, point.is_on_curve())
    }

    /// Recover a point from its x-coordinate and the parity of y.
    pub fn decompress(x: &FieldElement, y_is_odd: Choice) -> CtOption<Self> {
        x.curve_rhs().sqrt().map(|y| {
            let flip = y.is_odd() ^ y_is_odd;
            let y = FieldElement::conditional_select(&y, &y.negate(), flip);
            Self {
                x: *x,
                y,
                infinity: 0,
            }
        })
    }

    /// Whether the coordinates satisfy y^2 = x^3 + 7 (the identity counts as on-curve).
    pub fn is_on_curve(&self) -> Choice {
        self.y.square().ct_eq(&self.x.curve_rhs()) | self.is_identity()
    }

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> Choice {
        Choice::from(self.infinity)
    }

    /// The x-coordinate (zero for the identity).
    pub fn x(&self) -> &FieldElement {
        &self.x
    }

    /// The y-coordinate (zero for the identity).
    pub fn y(&self) -> &FieldElement {
        &self.y
    }

    /// Negate the point.
    pub fn negate(&self) -> Self {
        Self {
            x: self.x,
            y: self.y.negate(),
            infinity: self.infinity,
        }
    }

    /// Parse a SEC1 encoded point.
    ///
    /// Accepts compressed (0x02/0x03, 33 bytes), uncompressed (0x04, 65 bytes)
    /// and hybrid (0x06/0x07, 65 bytes) forms.
    ///
    /// # Arguments
    /// * `bytes` - SEC1-encoded point bytes.
    ///
    /// # Returns
    /// `Ok(AffinePoint)` on success, or an error if the encoding or point is invalid.
    pub fn from_sec1(bytes: &[u8]) -> Result<Self, PrimitivesError> {
        match (bytes.first().copied(), bytes.len()) {
            (Some(0x02) | Some(0x03), COMPRESSED_LEN) => {
                let x = FieldElement::from_slice(&bytes[1..33])?;
                let odd = Choice::from(bytes[0] & 1);
                Option::from(Self::decompress(&x, odd)).ok_or(PrimitivesError::PointNotOnCurve)
            }
            (Some(0x04) | Some(0x06) | Some(0x07), UNCOMPRESSED_LEN) => {
                let x = FieldElement::from_slice(&bytes[1..33])?;
                let y = FieldElement::from_slice(&bytes[33..65])?;
                if bytes[0] != 0x04 && (bytes[0] & 1) != (y.is_odd().unwrap_u8()) {
                    return Err(PrimitivesError::InvalidEncoding(
                        "hybrid prefix does not match y parity".to_string(),
                    ));
                }
                Option::from(Self::from_xy(x, y)).ok_or(PrimitivesError::PointNotOnCurve)
            }
            (None, _) => Err(PrimitivesError::InvalidEncoding("empty point encoding".to_string())),
            (Some(prefix), len) => Err(PrimitivesError::InvalidEncoding(format!(
                "unsupported point encoding: prefix 0x{:02x}, length {}",
                prefix, len
            ))),
        }
    }

    /// Serialize in compressed SEC1 form.
    ///
    /// The identity has no SEC1 encoding; callers must exclude it first.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_LEN] {
        let mut out = [0u8; COMPRESSED_LEN];
        out[0] = 0x02 | self.y.is_odd().unwrap_u8();
        out[1..].copy_from_slice(&self.x.to_bytes());
        out
    }

    /// Serialize in uncompressed SEC1 form.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_LEN] {
        let mut out = [0u8; UNCOMPRESSED_LEN];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x.to_bytes());
        out[33..].copy_from_slice(&self.y.to_bytes());
        out
    }
}

impl ConditionallySelectable for AffinePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            infinity: u8::conditional_select(&a.infinity, &b.infinity, choice),
        }
    }
}

impl ConstantTimeEq for AffinePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        let both_identity = self.is_identity() & other.is_identity();
        let neither = !self.is_identity() & !other.is_identity();
        both_identity | (neither & self.x.ct_eq(&other.x) & self.y.ct_eq(&other.y))
    }
}

impl PartialEq for AffinePoint {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for AffinePoint {}

impl Default for AffinePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A point in Jacobian coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ProjectivePoint {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl ProjectivePoint {
    /// The point at infinity.
    pub const IDENTITY: Self = Self {
        x: FieldElement::ONE,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    /// The standard generator G.
    pub const GENERATOR: Self = Self {
        x: FieldElement::from_limbs_unchecked(GENERATOR_X),
        y: FieldElement::from_limbs_unchecked(GENERATOR_Y),
        z: FieldElement::ONE,
    };

    /// Lift an affine point (Z = 1), mapping the affine identity to Z = 0.
    pub fn from_affine(p: &AffinePoint) -> Self {
        let lifted = Self {
            x: p.x,
            y: p.y,
            z: FieldElement::ONE,
        };
        Self::conditional_select(&lifted, &Self::IDENTITY, p.is_identity())
    }

    /// Normalize to affine coordinates.
    pub fn to_affine(&self) -> AffinePoint {
        let z_inv = self.z.invert_ct();
        let is_identity = z_inv.is_none();
        let z_inv = z_inv.unwrap_or(FieldElement::ZERO);
        let z_inv2 = z_inv.square();
        let z_inv3 = z_inv2.mul(&z_inv);
        let affine = AffinePoint {
            x: self.x.mul(&z_inv2),
            y: self.y.mul(&z_inv3),
            infinity: 0,
        };
        AffinePoint::conditional_select(&affine, &AffinePoint::IDENTITY, is_identity)
    }

    /// Normalize many points with a single field inversion.
    ///
    /// Montgomery's trick: accumulate the product of all Z coordinates, invert
    /// once, then peel off each inverse. Identity inputs map to the affine identity.
    pub fn batch_to_affine(points: &[Self]) -> Vec<AffinePoint> {
        // Identity Z = 0 would poison the running product; substitute 1.
        let zs: Vec<FieldElement> = points
            .iter()
            .map(|p| FieldElement::conditional_select(&p.z, &FieldElement::ONE, p.is_identity()))
            .collect();

        let mut prefix = Vec::with_capacity(zs.len());
        let mut acc = FieldElement::ONE;
        for z in &zs {
            prefix.push(acc);
            acc = acc.mul(z);
        }
        // acc is a product of non-zero values, so the inverse exists.
        let mut inv = acc.invert_ct().unwrap_or(FieldElement::ZERO);

        let mut out = vec![AffinePoint::IDENTITY; points.len()];
        for i in (0..points.len()).rev() {
            let z_inv = inv.mul(&prefix[i]);
            inv = inv.mul(&zs[i]);
            let z_inv2 = z_inv.square();
            let affine = AffinePoint {
                x: points[i].x.mul(&z_inv2),
                y: points[i].y.mul(&z_inv2.mul(&z_inv)),
                infinity: 0,
            };
            out[i] = AffinePoint::conditional_select(&affine, &AffinePoint::IDENTITY, points[i].is_identity());
        }
        out
    }

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> Choice {
        self.z.is_zero()
    }

    /// Point doubling (dbl-2009-l, a = 0).
    pub fn double(&self) -> Self {
        let a = self.x.square();
        let b = self.y.square();
        let c = b.square();
        let d = self.x.add(&b).square().sub(&a).sub(&c).double();
        let e = a.mul_small(3);
        let f = e.square();
        let x3 = f.sub(&d.double());
        let y3 = e.mul(&d.sub(&x3)).sub(&c.mul_small(8));
        let z3 = self.y.mul(&self.z).double();
        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    /// Complete point addition.
    ///
    /// Uses add-2007-bl and resolves the exceptional inputs (identity on either
    /// side, equal points, opposite points) by constant-time selection.
    pub fn add(&self, other: &Self) -> Self {
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x.mul(&z2z2);
        let u2 = other.x.mul(&z1z1);
        let s1 = self.y.mul(&other.z).mul(&z2z2);
        let s2 = other.y.mul(&self.z).mul(&z1z1);
        let h = u2.sub(&u1);
        let i = h.double().square();
        let j = h.mul(&i);
        let r = s2.sub(&s1).double();
        let v = u1.mul(&i);
        let x3 = r.square().sub(&j).sub(&v.double());
        let y3 = r.mul(&v.sub(&x3)).sub(&s1.mul(&j).double());
        // Opposite points give h = 0, which zeroes Z3 and yields the identity.
        let z3 = self.z.add(&other.z).square().sub(&z1z1).sub(&z2z2).mul(&h);
        let sum = Self {
            x: x3,
            y: y3,
            z: z3,
        };

        let doubled = self.double();
        let same_point = h.is_zero() & r.is_zero();
        let mut out = Self::conditional_select(&sum, &doubled, same_point);
        out = Self::conditional_select(&out, other, self.is_identity());
        out = Self::conditional_select(&out, self, other.is_identity());
        out
    }

    /// `self - other`.
    pub fn sub(&self, other: &Self) -> Self {
        self.add(&other.negate())
    }

    /// Negate the point.
    pub fn negate(&self) -> Self {
        Self {
            x: self.x,
            y: self.y.negate(),
            z: self.z,
        }
    }

    /// Re-randomize the Jacobian representation: (l^2 X, l^3 Y, l Z).
    ///
    /// The represented point is unchanged for any non-zero `l`.
    pub fn rescale(&self, l: &FieldElement) -> Self {
        let l2 = l.square();
        let l3 = l2.mul(l);
        Self {
            x: self.x.mul(&l2),
            y: self.y.mul(&l3),
            z: self.z.mul(l),
        }
    }

    /// Constant-time scalar multiplication with a fixed 4-bit window.
    ///
    /// Every window performs four doublings, a full scan of the 16-entry table
    /// and one addition, regardless of the scalar value. A zero scalar yields
    /// the identity.
    pub fn mul(&self, k: &Scalar) -> Self {
        let mut table = [Self::IDENTITY; 16];
        table[1] = *self;
        for i in 2..16 {
            table[i] = table[i - 1].add(self);
        }

        let mut acc = Self::IDENTITY;
        for w in (0..64).rev() {
            acc = acc.double().double().double().double();
            acc = acc.add(&Self::lookup(&table, k.nibble(w)));
        }
        table.zeroize();
        acc
    }

    /// Constant-time table lookup: reads every entry.
    fn lookup(table: &[Self; 16], digit: u8) -> Self {
        let mut out = Self::IDENTITY;
        for (j, entry) in table.iter().enumerate() {
            out = Self::conditional_select(&out, entry, (j as u8).ct_eq(&digit));
        }
        out
    }
}

impl ConditionallySelectable for ProjectivePoint {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl ConstantTimeEq for ProjectivePoint {
    fn ct_eq(&self, other: &Self) -> Choice {
        // Cross-multiply instead of normalizing.
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let x_eq = self.x.mul(&z2z2).ct_eq(&other.x.mul(&z1z1));
        let y_eq = self
            .y
            .mul(&z2z2.mul(&other.z))
            .ct_eq(&other.y.mul(&z1z1.mul(&self.z)));
        let id1 = self.is_identity();
        let id2 = other.is_identity();
        (id1 & id2) | (!id1 & !id2 & x_eq & y_eq)
    }
}

impl PartialEq for ProjectivePoint {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for ProjectivePoint {}

impl Default for ProjectivePoint {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Zeroize for ProjectivePoint {
    fn zeroize(&mut self) {
        self.x.zeroize();
        self.y.zeroize();
        self.z.zeroize();
    }
}

impl From<AffinePoint> for ProjectivePoint {
    fn from(p: AffinePoint) -> Self {
        Self::from_affine(&p)
    }
}
