//! Tests for context lifecycle and the signing contract across contexts.

use rand::rngs::StdRng;
use rand::SeedableRng;
use secp_ecdsa::{Context, ContextConfig, EcdsaError, NonceSource, PrivateKey, Signature};
use secp_primitives::hash::sha256;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_context_is_send_and_sync() {
    assert_send_sync::<Context>();
    assert_send_sync::<secp_ecdsa::SharedContext>();
    assert_send_sync::<PrivateKey>();
}

#[test]
fn test_two_contexts_sign_identically() {
    let a = Context::create().unwrap();
    let b = Context::create().unwrap();
    let secret = sha256(b"two contexts");
    let digest = sha256(b"same input");

    let sig_a = a.sign(&secret, &digest).unwrap();
    let sig_b = b.sign(&secret, &digest).unwrap();
    assert_eq!(sig_a, sig_b);
    assert_eq!(
        a.derive_public_key(&secret).unwrap(),
        b.derive_public_key(&secret).unwrap()
    );
}

#[test]
fn test_derive_public_key_is_deterministic_and_on_curve() {
    let ctx = Context::create().unwrap();
    let secret = sha256(b"derive");
    let first = ctx.derive_public_key(&secret).unwrap();
    let second = ctx.derive_public_key(&secret).unwrap();
    assert_eq!(first, second);
    assert!(bool::from(first.point().is_on_curve()));
}

#[test]
fn test_reseed_does_not_change_results() {
    let mut ctx = Context::with_config(ContextConfig::deterministic()).unwrap();
    let secret = sha256(b"reseed");
    let digest = sha256(b"reseed digest");
    let pk = ctx.derive_public_key(&secret).unwrap();
    let sig = ctx.sign(&secret, &digest).unwrap();

    ctx.reseed(&sha256(b"fresh entropy")).unwrap();
    assert!(ctx.verify(&pk, &digest, &sig));
    assert_eq!(ctx.derive_public_key(&secret).unwrap(), pk);
    assert_eq!(ctx.sign(&secret, &digest).unwrap(), sig);

    ctx.randomize(&mut StdRng::seed_from_u64(99)).unwrap();
    assert!(ctx.verify(&pk, &digest, &sig));
    assert_eq!(ctx.sign(&secret, &digest).unwrap(), sig);
}

#[test]
fn test_sign_then_verify_with_each_nonce_source() {
    let ctx = Context::create().unwrap();
    let secret = sha256(b"nonce sources");
    let digest = sha256(b"payload");
    let pk = ctx.derive_public_key(&secret).unwrap();
    let extra = [0x10u8; 32];
    let explicit = sha256(b"explicit k");

    for nonce in [
        NonceSource::Rfc6979,
        NonceSource::Rfc6979WithData(&extra),
        NonceSource::Explicit(&explicit),
    ] {
        let sig = ctx.sign_with(&secret, &digest, nonce).unwrap();
        assert!(ctx.verify(&pk, &digest, &sig), "nonce source {:?}", nonce);
    }
}

#[test]
fn test_tampering_any_byte_fails_verification() {
    let ctx = Context::create().unwrap();
    let secret = sha256(b"tamper");
    let digest = sha256(b"tamper digest");
    let pk = ctx.derive_public_key(&secret).unwrap();
    let compact = ctx.sign(&secret, &digest).unwrap().to_compact();
    assert!(ctx.verify_bytes(&pk.to_compressed(), &digest, &compact));

    for i in 0..compact.len() {
        for flip in [0x01u8, 0x80] {
            let mut tampered = compact;
            tampered[i] ^= flip;
            assert!(
                !ctx.verify_bytes(&pk.to_compressed(), &digest, &tampered),
                "byte {} flipped with {:#04x} still verifies",
                i,
                flip
            );
        }
    }
}

#[test]
fn test_invalid_private_key_is_reported() {
    let ctx = Context::create().unwrap();
    let digest = sha256(b"bad key");
    let order = hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap();

    assert!(matches!(ctx.sign(&[0u8; 32], &digest), Err(EcdsaError::InvalidPrivateKey(_))));
    assert!(matches!(ctx.sign(&order, &digest), Err(EcdsaError::InvalidPrivateKey(_))));
    assert!(matches!(
        ctx.derive_public_key(&[0u8; 32]),
        Err(EcdsaError::InvalidPrivateKey(_))
    ));
}

#[test]
fn test_der_round_trip_through_context() {
    let ctx = Context::create().unwrap();
    let key = PrivateKey::random(&mut StdRng::seed_from_u64(5)).unwrap();
    let digest = sha256(b"der");
    let sig = key.sign(&ctx, &digest).unwrap();

    let parsed = Signature::from_der(&sig.to_der()).unwrap();
    assert_eq!(parsed, sig);
    assert!(key.public_key(&ctx).verify(&ctx, &digest, &parsed));
}

#[test]
fn test_config_from_json() {
    let config: ContextConfig = serde_json::from_str(r#"{"enforce_low_s": false}"#).unwrap();
    assert!(config.randomize_on_create);
    assert!(!config.enforce_low_s);
    assert_eq!(config.max_nonce_retries, 16);

    let full: ContextConfig = serde_json::from_str(
        r#"{"randomize_on_create": false, "enforce_low_s": true, "max_nonce_retries": 4}"#,
    )
    .unwrap();
    let ctx = Context::with_config(full.clone()).unwrap();
    assert_eq!(ctx.config(), &full);

    let encoded = serde_json::to_string(&full).unwrap();
    let decoded: ContextConfig = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, full);
}
