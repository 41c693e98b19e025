//! Signature subsystem dispatch
//!
//! Drives every family through the construction path outer code uses:
//! a stored key-type tag plus raw key bytes, yielding boxed capability
//! objects. RSA-3072/4096 are exercised for their parameter table only;
//! generating those moduli is too slow for routine runs.

use i2p_core::{create_signer, create_verifier, generate_keypair, SigningKeyType};

fn roundtrip(key_type: SigningKeyType) {
    let keys = generate_keypair(key_type).unwrap();
    assert_eq!(keys.public.len(), key_type.public_key_len(), "{key_type:?}");
    assert_eq!(
        keys.private.len(),
        key_type.private_key_len(),
        "{key_type:?}"
    );

    let signer = create_signer(key_type, &keys.private).unwrap();
    let verifier = create_verifier(key_type, &keys.public).unwrap();
    assert_eq!(verifier.public_key_len(), key_type.public_key_len());
    assert_eq!(verifier.signature_len(), key_type.signature_len());
    assert_eq!(verifier.private_key_len(), key_type.private_key_len());

    let message = b"router identity bytes to authenticate";
    let signature = signer.sign(message).unwrap();
    assert_eq!(signature.len(), key_type.signature_len(), "{key_type:?}");
    assert!(verifier.verify(message, &signature), "{key_type:?}");

    // Any single corrupted signature byte must fail verification
    let mut bad_sig = signature.clone();
    bad_sig[signature.len() / 2] ^= 0x04;
    assert!(!verifier.verify(message, &bad_sig), "{key_type:?}");

    // As must a corrupted message
    let mut bad_msg = message.to_vec();
    bad_msg[0] ^= 0x01;
    assert!(!verifier.verify(&bad_msg, &signature), "{key_type:?}");
}

#[test]
fn dsa_dispatch_roundtrip() {
    roundtrip(SigningKeyType::DsaSha1);
}

#[test]
fn ecdsa_p256_dispatch_roundtrip() {
    roundtrip(SigningKeyType::EcdsaSha256P256);
}

#[test]
fn ecdsa_p384_dispatch_roundtrip() {
    roundtrip(SigningKeyType::EcdsaSha384P384);
}

#[test]
fn ecdsa_p521_dispatch_roundtrip() {
    roundtrip(SigningKeyType::EcdsaSha512P521);
}

#[test]
fn rsa_2048_dispatch_roundtrip() {
    roundtrip(SigningKeyType::RsaSha2562048);
}

#[test]
fn eddsa_dispatch_roundtrip() {
    roundtrip(SigningKeyType::EddsaSha512Ed25519);
}

#[test]
fn verifiers_share_across_threads() {
    let keys = generate_keypair(SigningKeyType::EddsaSha512Ed25519).unwrap();
    let signer = create_signer(SigningKeyType::EddsaSha512Ed25519, &keys.private).unwrap();
    let verifier = create_verifier(SigningKeyType::EddsaSha512Ed25519, &keys.public).unwrap();

    let message = b"shared read-only verification";
    let signature = signer.sign(message).unwrap();

    let verifier = std::sync::Arc::new(verifier);
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let verifier = verifier.clone();
            let signature = signature.clone();
            std::thread::spawn(move || verifier.verify(message, &signature))
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
