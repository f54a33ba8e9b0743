/// secp256k1 primitives - field, scalar and group arithmetic, and hashing.
///
/// This crate provides the arithmetic layer of the secp256k1 engine:
/// - Field elements modulo the curve prime p
/// - Scalars modulo the group order n
/// - Jacobian and affine points with complete addition
/// - Constant-time fixed-window and variable-time wNAF scalar multiplication
/// - SEC1 point encoding
/// - Hash functions (SHA-256, HMAC-SHA256)

pub mod arith;
pub mod hash;

mod error;
pub use error::PrimitivesError;

pub use arith::{AffinePoint, FieldElement, ProjectivePoint, Scalar};
