//! Context configuration.

use serde::{Deserialize, Serialize};

/// Default bound on RFC6979 candidates tried before signing gives up.
pub const DEFAULT_MAX_NONCE_RETRIES: u32 = 16;

/// Behavior knobs for a [`Context`](crate::Context).
///
/// Missing fields fall back to their defaults when deserialized, so a partial
/// JSON object such as `{"enforce_low_s": false}` is accepted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Seed the blinding state from the OS RNG at construction.
    pub randomize_on_create: bool,
    /// Reject signatures with s > n/2 during verification.
    pub enforce_low_s: bool,
    /// Extra RFC6979 candidates tried when a nonce yields r = 0 or s = 0.
    pub max_nonce_retries: u32,
}

impl ContextConfig {
    /// Configuration with OS-seeded blinding and low-S enforcement.
    pub fn randomized() -> Self {
        ContextConfig {
            randomize_on_create: true,
            enforce_low_s: true,
            max_nonce_retries: DEFAULT_MAX_NONCE_RETRIES,
        }
    }

    /// Configuration that never touches the OS RNG.
    ///
    /// The context starts with a neutral blinding value until `reseed` is
    /// called. Useful for reproducible tests and for environments without an
    /// entropy source.
    pub fn deterministic() -> Self {
        ContextConfig {
            randomize_on_create: false,
            ..Self::randomized()
        }
    }

    /// Accept high-S signatures during verification.
    pub fn allow_high_s(mut self) -> Self {
        self.enforce_low_s = false;
        self
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::randomized()
    }
}
