//! A context shared across threads.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use rand_core::{CryptoRng, RngCore};

use crate::config::ContextConfig;
use crate::context::Context;
use crate::EcdsaError;

/// Cheaply clonable handle to one [`Context`].
///
/// Signing and verification take a read lock and run concurrently; reseeding
/// takes the write lock, so readers never observe a half-updated blinding
/// state.
#[derive(Clone, Debug)]
pub struct SharedContext {
    inner: Arc<RwLock<Context>>,
}

impl SharedContext {
    /// Wrap an existing context.
    pub fn new(ctx: Context) -> Self {
        SharedContext {
            inner: Arc::new(RwLock::new(ctx)),
        }
    }

    /// Create and wrap a context built from `config`.
    pub fn with_config(config: ContextConfig) -> Result<Self, EcdsaError> {
        Ok(Self::new(Context::with_config(config)?))
    }

    /// Borrow the context for signing or verification.
    pub fn read(&self) -> RwLockReadGuard<'_, Context> {
        self.inner.read()
    }

    /// Reseed the blinding state under the write lock.
    ///
    /// # Arguments
    /// * `entropy` - Exactly 32 bytes of fresh entropy.
    pub fn reseed(&self, entropy: &[u8]) -> Result<(), EcdsaError> {
        self.inner.write().reseed(entropy)
    }

    /// Reseed from a cryptographic RNG under the write lock.
    pub fn randomize<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<(), EcdsaError> {
        self.inner.write().randomize(rng)
    }
}
