//! The secp256k1 context: precomputed generator tables plus blinding state.
//!
//! A `Context` is built once and then shared by reference. Every operation
//! that multiplies the generator by a secret goes through [`Context::mul_gen`],
//! which combines a 64x16 table of multiples of G with a secret additive
//! blinding value and a randomized projective representation. The only
//! mutation after construction is re-randomizing that blinding state.

use std::fmt;

use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use secp_primitives::{AffinePoint, FieldElement, ProjectivePoint, Scalar};
use subtle::{ConditionallySelectable, ConstantTimeEq};
use tracing::{debug, error, info};
use zeroize::Zeroize;

use crate::config::ContextConfig;
use crate::rfc6979::HmacDrbg;
use crate::EcdsaError;

/// Number of 4-bit windows covering a 256-bit scalar.
const WINDOWS: usize = 64;

/// Entries per window: the multiples 0..=15.
const ENTRIES: usize = 16;

/// Length of the entropy accepted by [`Context::reseed`].
pub const RESEED_ENTROPY_LEN: usize = 32;

/// Secret blinding state for generator multiplication.
///
/// `point` always equals `-scalar * G`, so `(k + scalar) * G + point = k * G`.
#[derive(Clone)]
struct Blinding {
    scalar: Scalar,
    point: ProjectivePoint,
    /// Applied to the accumulator's Jacobian coordinates before the table walk.
    z: FieldElement,
}

impl Blinding {
    /// The neutral state: no offset, unit projective factor.
    fn neutral() -> Self {
        Blinding {
            scalar: Scalar::ZERO,
            point: ProjectivePoint::IDENTITY,
            z: FieldElement::ONE,
        }
    }

    /// Draw a fresh blinding scalar and projective factor from `drbg`.
    fn derive(drbg: &mut HmacDrbg) -> Self {
        let scalar = loop {
            if let Some(b) = drbg.next_scalar() {
                break b;
            }
        };
        let z = loop {
            let mut bytes = [0u8; 32];
            drbg.fill(&mut bytes);
            let candidate = Option::<FieldElement>::from(FieldElement::from_bytes(&bytes));
            bytes.zeroize();
            if let Some(z) = candidate.filter(|z| !bool::from(z.is_zero())) {
                break z;
            }
        };
        let point = ProjectivePoint::GENERATOR.mul(&scalar).negate();
        Blinding { scalar, point, z }
    }
}

impl Zeroize for Blinding {
    fn zeroize(&mut self) {
        self.scalar.zeroize();
        self.point.zeroize();
        self.z.zeroize();
    }
}

/// Precomputed state for constant-time secp256k1 operations.
///
/// Construction either fully succeeds or returns an error, so a `Context`
/// value is always ready to use. Dropping it wipes the blinding state.
/// `Context` is `Send + Sync`; share it by reference, or wrap it in a
/// [`SharedContext`](crate::SharedContext) to reseed while other threads sign.
#[derive(Clone)]
pub struct Context {
    config: ContextConfig,
    /// `table[i][j] = j * 16^i * G`, normalized.
    table: Vec<[AffinePoint; ENTRIES]>,
    blinding: Blinding,
}

impl Context {
    /// Create a context with the default configuration.
    ///
    /// The blinding state is seeded from the OS random number generator.
    ///
    /// # Returns
    /// `Ok(Context)`, or `EcdsaError::InitFailure` if the tables cannot be
    /// allocated, the OS RNG fails, or the generator self-check fails.
    pub fn create() -> Result<Self, EcdsaError> {
        Self::with_config(ContextConfig::default())
    }

    /// Create a context with an explicit configuration.
    ///
    /// # Arguments
    /// * `config` - Behavior settings, see [`ContextConfig`].
    ///
    /// # Returns
    /// `Ok(Context)`, or `EcdsaError::InitFailure` on any setup failure.
    pub fn with_config(config: ContextConfig) -> Result<Self, EcdsaError> {
        let table = build_table()?;
        let mut ctx = Context {
            config,
            table,
            blinding: Blinding::neutral(),
        };

        if ctx.config.randomize_on_create {
            ctx.randomize(&mut OsRng).map_err(|e| {
                error!(error = %e, "failed to seed context blinding");
                EcdsaError::InitFailure(e.to_string())
            })?;
        }

        ctx.self_check()?;
        info!(
            randomized = ctx.config.randomize_on_create,
            enforce_low_s = ctx.config.enforce_low_s,
            "secp256k1 context created"
        );
        Ok(ctx)
    }

    /// The configuration this context was built with.
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Re-randomize the blinding state from caller-supplied entropy.
    ///
    /// The new state is derived with HMAC-DRBG from `entropy` and the previous
    /// blinding scalar, so reseeding never reduces the accumulated randomness.
    /// Results of every operation are unchanged; only the internal
    /// intermediate values differ.
    ///
    /// # Arguments
    /// * `entropy` - Exactly 32 bytes of fresh entropy.
    ///
    /// # Returns
    /// `Ok(())`, or `EcdsaError::InvalidInput` if `entropy` has the wrong length.
    pub fn reseed(&mut self, entropy: &[u8]) -> Result<(), EcdsaError> {
        if entropy.len() != RESEED_ENTROPY_LEN {
            return Err(EcdsaError::InvalidInput(format!(
                "reseed entropy must be {} bytes, got {}",
                RESEED_ENTROPY_LEN,
                entropy.len()
            )));
        }

        let mut previous = self.blinding.scalar.to_bytes();
        let mut drbg = HmacDrbg::new(&[entropy, &previous[..]]);
        previous.zeroize();

        let fresh = Blinding::derive(&mut drbg);
        self.blinding.zeroize();
        self.blinding = fresh;
        debug!("context blinding reseeded");
        Ok(())
    }

    /// Re-randomize the blinding state from a cryptographic RNG.
    ///
    /// # Arguments
    /// * `rng` - Source of 32 bytes of entropy.
    ///
    /// # Returns
    /// `Ok(())`, or `EcdsaError::Entropy` if the RNG fails.
    pub fn randomize<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<(), EcdsaError> {
        let mut seed = [0u8; RESEED_ENTROPY_LEN];
        rng.try_fill_bytes(&mut seed)
            .map_err(|e| EcdsaError::Entropy(e.to_string()))?;
        let result = self.reseed(&seed);
        seed.zeroize();
        result
    }

    /// Constant-time `k * G` using the precomputed table and blinding.
    ///
    /// Computes `(k + b) * G + B` with `B = -b * G`. Every window scans all
    /// sixteen table entries. A zero scalar yields the point at infinity.
    ///
    /// # Arguments
    /// * `k` - The (possibly secret) scalar.
    ///
    /// # Returns
    /// `k * G` in Jacobian coordinates.
    pub fn mul_gen(&self, k: &Scalar) -> ProjectivePoint {
        let mut blinded = k.add(&self.blinding.scalar);
        let mut acc = self.blinding.point.rescale(&self.blinding.z);
        for (i, row) in self.table.iter().enumerate() {
            let entry = lookup(row, blinded.nibble(i));
            acc = acc.add(&ProjectivePoint::from_affine(&entry));
        }
        blinded.zeroize();
        acc
    }

    /// Compare table-driven and ladder-driven multiplication of G.
    fn self_check(&self) -> Result<(), EcdsaError> {
        // 2^252 = 16^63 selects entry 1 of the last window.
        let mut top = [0u8; 32];
        top[0] = 0x10;
        let two_252 = Scalar::from_bytes_reduced(&top);

        let from_table = self.table[WINDOWS - 1][1];
        let from_ladder = ProjectivePoint::GENERATOR.mul(&two_252).to_affine();
        let blinded_one = self.mul_gen(&Scalar::ONE).to_affine();

        if from_table != from_ladder || blinded_one != AffinePoint::GENERATOR {
            error!("generator self-check failed");
            return Err(EcdsaError::InitFailure(
                "generator self-check failed".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .field("windows", &self.table.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.blinding.zeroize();
        debug!("secp256k1 context destroyed");
    }
}

/// Build the normalized generator table with a single batched inversion.
fn build_table() -> Result<Vec<[AffinePoint; ENTRIES]>, EcdsaError> {
    let mut points = Vec::new();
    points
        .try_reserve_exact(WINDOWS * ENTRIES)
        .map_err(|e| EcdsaError::InitFailure(format!("cannot allocate generator table: {}", e)))?;

    let mut base = ProjectivePoint::GENERATOR;
    for _ in 0..WINDOWS {
        let mut multiple = ProjectivePoint::IDENTITY;
        for _ in 0..ENTRIES {
            points.push(multiple);
            multiple = multiple.add(&base);
        }
        base = base.double().double().double().double();
    }

    let affine = ProjectivePoint::batch_to_affine(&points);
    let mut table = Vec::new();
    table
        .try_reserve_exact(WINDOWS)
        .map_err(|e| EcdsaError::InitFailure(format!("cannot allocate generator table: {}", e)))?;
    for chunk in affine.chunks_exact(ENTRIES) {
        let mut row = [AffinePoint::IDENTITY; ENTRIES];
        row.copy_from_slice(chunk);
        table.push(row);
    }
    Ok(table)
}

/// Constant-time row lookup: reads every entry.
fn lookup(row: &[AffinePoint; ENTRIES], digit: u8) -> AffinePoint {
    let mut out = AffinePoint::IDENTITY;
    for (j, entry) in row.iter().enumerate() {
        out = AffinePoint::conditional_select(&out, entry, (j as u8).ct_eq(&digit));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_context() -> Context {
        Context::with_config(ContextConfig::deterministic()).unwrap()
    }

    fn sample_scalars() -> Vec<Scalar> {
        vec![
            Scalar::ONE,
            Scalar::from_u64(2),
            Scalar::from_u64(0xffff_ffff),
            Scalar::ONE.negate(),
            Scalar::from_hex("eaf02ca348c524e6392655ba4d29603cd1a7347d9d65cfe93ce1ebffdca22694")
                .unwrap(),
        ]
    }

    /// Test that table entries hold the expected multiples of G.
    #[test]
    fn test_table_layout() {
        let ctx = test_context();
        assert_eq!(ctx.table.len(), WINDOWS);
        assert!(bool::from(ctx.table[0][0].is_identity()));
        assert_eq!(ctx.table[0][1], AffinePoint::GENERATOR);
        assert_eq!(
            hex::encode(ctx.table[0][2].to_compressed()),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
        let sixteen_g = ProjectivePoint::GENERATOR.mul(&Scalar::from_u64(16)).to_affine();
        assert_eq!(ctx.table[1][1], sixteen_g);
    }

    /// Test generator multiplication against the plain ladder.
    #[test]
    fn test_mul_gen_matches_ladder() {
        let ctx = test_context();
        for k in sample_scalars() {
            assert_eq!(ctx.mul_gen(&k), ProjectivePoint::GENERATOR.mul(&k));
        }
        assert!(bool::from(ctx.mul_gen(&Scalar::ZERO).is_identity()));
    }

    /// Test that reseeding changes the blinding but not the results.
    #[test]
    fn test_reseed_keeps_results() {
        let mut ctx = test_context();
        let before: Vec<ProjectivePoint> = sample_scalars().iter().map(|k| ctx.mul_gen(k)).collect();

        ctx.reseed(&[0x5a; 32]).unwrap();
        assert!(!bool::from(ctx.blinding.scalar.is_zero()));
        assert_eq!(
            ctx.blinding.point,
            ProjectivePoint::GENERATOR.mul(&ctx.blinding.scalar).negate()
        );

        for (k, expected) in sample_scalars().iter().zip(before.iter()) {
            assert_eq!(&ctx.mul_gen(k), expected);
        }
        assert!(bool::from(ctx.mul_gen(&Scalar::ZERO).is_identity()));
    }

    /// Test that reseeding chains the previous blinding value.
    #[test]
    fn test_reseed_is_chained() {
        let mut a = test_context();
        let mut b = test_context();
        a.reseed(&[1; 32]).unwrap();
        b.reseed(&[1; 32]).unwrap();
        assert_eq!(a.blinding.scalar, b.blinding.scalar);

        a.reseed(&[2; 32]).unwrap();
        b.reseed(&[3; 32]).unwrap();
        b.reseed(&[2; 32]).unwrap();
        assert_ne!(a.blinding.scalar, b.blinding.scalar);
    }

    /// Test that reseed rejects entropy of the wrong length.
    #[test]
    fn test_reseed_rejects_bad_length() {
        let mut ctx = test_context();
        for len in [0usize, 16, 31, 33, 64] {
            let entropy = vec![7u8; len];
            assert!(matches!(
                ctx.reseed(&entropy),
                Err(EcdsaError::InvalidInput(_))
            ));
        }
        assert!(bool::from(ctx.blinding.scalar.is_zero()));
    }

    /// Test randomization from a seeded RNG.
    #[test]
    fn test_randomize_with_rng() {
        let mut ctx = test_context();
        let mut rng = StdRng::seed_from_u64(42);
        ctx.randomize(&mut rng).unwrap();
        assert!(!bool::from(ctx.blinding.scalar.is_zero()));
        assert_eq!(ctx.mul_gen(&Scalar::ONE).to_affine(), AffinePoint::GENERATOR);
    }

    /// Test that a default context seeds itself from the OS RNG.
    #[test]
    fn test_create_randomizes() {
        let ctx = Context::create().unwrap();
        assert!(ctx.config().randomize_on_create);
        assert!(!bool::from(ctx.blinding.scalar.is_zero()));
    }

    /// Test that clones are independent and debug output hides blinding.
    #[test]
    fn test_clone_and_debug() {
        let mut ctx = test_context();
        let copy = ctx.clone();
        ctx.reseed(&[9; 32]).unwrap();
        assert!(bool::from(copy.blinding.scalar.is_zero()));
        assert_eq!(copy.mul_gen(&Scalar::ONE), ctx.mul_gen(&Scalar::ONE));

        let rendered = format!("{:?}", ctx);
        assert!(rendered.starts_with("Context"));
        assert!(rendered.contains("windows: 64"));
        assert!(!rendered.contains("blinding"));
    }
}
