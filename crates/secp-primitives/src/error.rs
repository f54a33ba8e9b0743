/// Unified error type for arithmetic and encoding operations.
///
/// Covers invalid encodings, out-of-range values and arithmetic failures
/// such as inverting zero.
#[derive(Debug, thiserror::Error)]
pub enum PrimitivesError {
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("invalid scalar: {0}")]
    InvalidScalar(String),

    #[error("point not on curve")]
    PointNotOnCurve,

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl From<hex::FromHexError> for PrimitivesError {
    fn from(e: hex::FromHexError) -> Self {
        PrimitivesError::InvalidHex(e.to_string())
    }
}
