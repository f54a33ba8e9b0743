/// secp256k1 arithmetic: the base field, the scalar field and the curve group.
///
/// Field and scalar values are four 64-bit limbs kept fully reduced. Group
/// elements are Jacobian internally and normalized to affine at boundaries.

mod limbs;

pub mod field;
pub mod scalar;
pub mod point;
pub mod wnaf;

pub use field::FieldElement;
pub use point::{AffinePoint, ProjectivePoint, COMPRESSED_LEN, UNCOMPRESSED_LEN};
pub use scalar::{Scalar, SCALAR_BYTES_LEN};
