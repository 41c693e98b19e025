//! Ed25519 family
//!
//! The modern signature scheme. Unlike the `r‖s` families this is a
//! distinct algebraic construction with its own compressed-point-plus-
//! scalar signature encoding; SHA-512 is internal to the algorithm.

use ed25519_dalek::{
    Signature, Signer as DalekSigner, SigningKey, Verifier as DalekVerifier, VerifyingKey,
};
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use super::{check_key_len, KeyPair, Signer, Verifier};
use crate::error::{Error, Result};

pub const EDDSA25519_PUBLIC_KEY_LENGTH: usize = 32;
pub const EDDSA25519_SIGNATURE_LENGTH: usize = 64;
pub const EDDSA25519_PRIVATE_KEY_LENGTH: usize = 32;

pub struct Eddsa25519Verifier {
    key: VerifyingKey,
}

impl Eddsa25519Verifier {
    pub fn new(signing_key: &[u8]) -> Result<Self> {
        check_key_len(
            "Ed25519 public key",
            EDDSA25519_PUBLIC_KEY_LENGTH,
            signing_key.len(),
        )?;
        let mut bytes = [0u8; EDDSA25519_PUBLIC_KEY_LENGTH];
        bytes.copy_from_slice(signing_key);
        let key = VerifyingKey::from_bytes(&bytes)
            .map_err(|e| Error::KeyMaterial(format!("invalid Ed25519 point: {e}")))?;
        Ok(Self { key })
    }
}

impl Verifier for Eddsa25519Verifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        if signature.len() != EDDSA25519_SIGNATURE_LENGTH {
            return false;
        }
        let mut bytes = [0u8; EDDSA25519_SIGNATURE_LENGTH];
        bytes.copy_from_slice(signature);
        let sig = Signature::from_bytes(&bytes);
        self.key.verify(message, &sig).is_ok()
    }

    fn public_key_len(&self) -> usize {
        EDDSA25519_PUBLIC_KEY_LENGTH
    }

    fn signature_len(&self) -> usize {
        EDDSA25519_SIGNATURE_LENGTH
    }
}

pub struct Eddsa25519Signer {
    key: SigningKey,
}

impl Eddsa25519Signer {
    pub fn new(signing_private_key: &[u8]) -> Result<Self> {
        check_key_len(
            "Ed25519 private key",
            EDDSA25519_PRIVATE_KEY_LENGTH,
            signing_private_key.len(),
        )?;
        let mut bytes = [0u8; EDDSA25519_PRIVATE_KEY_LENGTH];
        bytes.copy_from_slice(signing_private_key);
        Ok(Self {
            key: SigningKey::from_bytes(&bytes),
        })
    }

    /// The encoded public key derived from the private seed, for callers
    /// publishing an identity alongside their signatures.
    pub fn public_key(&self) -> [u8; EDDSA25519_PUBLIC_KEY_LENGTH] {
        self.key.verifying_key().to_bytes()
    }
}

impl Signer for Eddsa25519Signer {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.key.sign(message).to_bytes().to_vec())
    }
}

pub fn generate_eddsa25519_keys() -> Result<KeyPair> {
    let key = SigningKey::generate(&mut OsRng);
    Ok(KeyPair {
        public: key.verifying_key().to_bytes().to_vec(),
        private: Zeroizing::new(key.to_bytes().to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let keys = generate_eddsa25519_keys().unwrap();
        assert_eq!(keys.public.len(), EDDSA25519_PUBLIC_KEY_LENGTH);
        assert_eq!(keys.private.len(), EDDSA25519_PRIVATE_KEY_LENGTH);

        let signer = Eddsa25519Signer::new(&keys.private).unwrap();
        let verifier = Eddsa25519Verifier::new(&keys.public).unwrap();
        assert_eq!(verifier.private_key_len(), EDDSA25519_PRIVATE_KEY_LENGTH);

        let message = b"garlic clove";
        let signature = signer.sign(message).unwrap();
        assert_eq!(signature.len(), EDDSA25519_SIGNATURE_LENGTH);
        assert!(verifier.verify(message, &signature));
    }

    #[test]
    fn bit_flips_break_verification() {
        let keys = generate_eddsa25519_keys().unwrap();
        let signer = Eddsa25519Signer::new(&keys.private).unwrap();
        let verifier = Eddsa25519Verifier::new(&keys.public).unwrap();

        let message = b"exact bytes matter";
        let signature = signer.sign(message).unwrap();

        for position in [0, 31, 32, 63] {
            let mut bad_sig = signature.clone();
            bad_sig[position] ^= 0x01;
            assert!(!verifier.verify(message, &bad_sig));
        }

        let mut bad_msg = message.to_vec();
        bad_msg[5] ^= 0x20;
        assert!(!verifier.verify(&bad_msg, &signature));
    }

    #[test]
    fn signer_exposes_matching_public_key() {
        let keys = generate_eddsa25519_keys().unwrap();
        let signer = Eddsa25519Signer::new(&keys.private).unwrap();
        assert_eq!(signer.public_key().as_slice(), keys.public.as_slice());
    }
}
