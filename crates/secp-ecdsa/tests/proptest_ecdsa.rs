use proptest::prelude::*;

use secp_ecdsa::{Context, ContextConfig, PrivateKey, PublicKey, RecoverableSignature, Signature};

fn secret_strategy() -> impl Strategy<Value = [u8; 32]> {
    // Leading zero byte keeps the value below n; the low byte forced to 1 keeps it non-zero.
    prop::array::uniform32(any::<u8>()).prop_map(|mut b| {
        b[0] = 0;
        b[31] |= 1;
        b
    })
}

fn context() -> Context {
    Context::with_config(ContextConfig::deterministic()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn sign_then_verify(secret in secret_strategy(), digest in prop::array::uniform32(any::<u8>())) {
        let ctx = context();
        let pk = ctx.derive_public_key(&secret).unwrap();
        let sig = ctx.sign(&secret, &digest).unwrap();
        prop_assert!(sig.is_low_s());
        prop_assert!(ctx.verify(&pk, &digest, &sig));
    }

    #[test]
    fn recovery_returns_signer(secret in secret_strategy(), digest in prop::array::uniform32(any::<u8>())) {
        let ctx = context();
        let key = PrivateKey::from_bytes(&secret).unwrap();
        let rec = key.sign_recoverable(&ctx, &digest).unwrap();
        let round_tripped = RecoverableSignature::from_bytes(&rec.to_bytes()).unwrap();
        prop_assert_eq!(ctx.recover(&digest, &round_tripped).unwrap(), key.public_key(&ctx));
    }

    #[test]
    fn encodings_round_trip(secret in secret_strategy(), digest in prop::array::uniform32(any::<u8>())) {
        let ctx = context();
        let sig = ctx.sign(&secret, &digest).unwrap();
        prop_assert_eq!(Signature::from_der(&sig.to_der()).unwrap(), sig);
        prop_assert_eq!(Signature::from_compact(&sig.to_compact()).unwrap(), sig);

        let pk = ctx.derive_public_key(&secret).unwrap();
        prop_assert_eq!(PublicKey::from_bytes(&pk.to_compressed()).unwrap(), pk);
        prop_assert_eq!(PublicKey::from_bytes(&pk.to_uncompressed()).unwrap(), pk);
    }

    #[test]
    fn ecdh_is_symmetric(a in secret_strategy(), b in secret_strategy()) {
        let ctx = context();
        let alice = PrivateKey::from_bytes(&a).unwrap();
        let bob = PrivateKey::from_bytes(&b).unwrap();
        prop_assert_eq!(
            alice.shared_secret(&bob.public_key(&ctx)).unwrap(),
            bob.shared_secret(&alice.public_key(&ctx)).unwrap()
        );
    }

    #[test]
    fn tweak_add_commutes_with_derivation(secret in secret_strategy(), tweak in secret_strategy()) {
        let ctx = context();
        let key = PrivateKey::from_bytes(&secret).unwrap();
        let via_private = key.tweak_add(&tweak).unwrap().public_key(&ctx);
        let via_public = key.public_key(&ctx).tweak_add(&ctx, &tweak).unwrap();
        prop_assert_eq!(via_private, via_public);
    }

    #[test]
    fn reseed_preserves_signatures(secret in secret_strategy(), entropy in prop::array::uniform32(any::<u8>())) {
        let mut ctx = context();
        let digest = [0x33u8; 32];
        let before = ctx.sign(&secret, &digest).unwrap();
        ctx.reseed(&entropy).unwrap();
        prop_assert_eq!(ctx.sign(&secret, &digest).unwrap(), before);
    }
}
