use secp_primitives::PrimitivesError;

/// Error types for context, key and signature operations.
///
/// Verification never produces one of these: malformed inputs to `verify`
/// simply fail to verify.
#[derive(Debug, thiserror::Error)]
pub enum EcdsaError {
    #[error("context initialization failed: {0}")]
    InitFailure(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("entropy source unavailable: {0}")]
    Entropy(String),

    #[error("{0}")]
    Primitives(#[from] PrimitivesError),
}
