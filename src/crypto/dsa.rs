//! Legacy DSA-1024/SHA-1 family
//!
//! The network's original signature scheme. Domain parameters (1024-bit
//! p, 160-bit q, generator g) are fixed network-wide constants; keys
//! carry only y (public) or x (private). Signatures are the two 20-byte
//! big-endian integers `r‖s`.

use dsa::{Components, Signature, SigningKey, VerifyingKey};
use num_bigint_dig::BigUint;
use rand::rngs::OsRng;
use sha1::{Digest, Sha1};
use signature::{DigestSigner, DigestVerifier};
use zeroize::Zeroizing;

use super::{check_key_len, to_fixed_be, KeyPair, Signer, Verifier};
use crate::error::{Error, Result};

pub const DSA_PUBLIC_KEY_LENGTH: usize = 128;
pub const DSA_SIGNATURE_LENGTH: usize = 40;
pub const DSA_PRIVATE_KEY_LENGTH: usize = DSA_SIGNATURE_LENGTH / 2;

// Network-wide domain parameters. Every router must use these exact
// values or its signatures will not interoperate.
const DSA_P_HEX: &str = "9c05b2aa960d9b97b8931963c9cc9e8c3026e9b8ed92fad0a69cc886d5bf8015\
                         fcadae31a0ad18fab3f01b00a358de237655c4964afaa2b337e96ad316b9fb1c\
                         c564b5aec5b69a9ff6c3e4548707fef8503d91dd8602e867e6d35d2235c1869c\
                         e2479c3b9d5401de04e0727fb33d6511285d4cf29538d9e3b6051f5b22cc1c93";
const DSA_Q_HEX: &str = "a5dfc28fef4ca1e286744cd8eed9d29d684046b7";
const DSA_G_HEX: &str = "0c1f4d27d40093b429e962d7223824e0bbc47e7c832a39236fc683af84889581\
                         075ff9082ed32353d4374d7301cda1d23c431f4698599dda02451824ff369752\
                         593647cc3ddc197de985e43d136cdcfc6bd5409cd2f450821142a5e6f8eb1c3a\
                         b5d0484b8129fcf17bce4f7f33321c3cb3dbb14a905e7b2b3e93be4708cbcc82";

fn biguint_from_hex(hex_str: &str) -> Result<BigUint> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| Error::Crypto(format!("bad domain parameter constant: {e}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

fn dsa_components() -> Result<Components> {
    let p = biguint_from_hex(DSA_P_HEX)?;
    let q = biguint_from_hex(DSA_Q_HEX)?;
    let g = biguint_from_hex(DSA_G_HEX)?;
    Components::from_components(p, q, g)
        .map_err(|e| Error::Crypto(format!("DSA domain parameters rejected: {e}")))
}

/// Verifier over a raw 128-byte y value.
pub struct DsaVerifier {
    key: VerifyingKey,
}

impl DsaVerifier {
    pub fn new(signing_key: &[u8]) -> Result<Self> {
        check_key_len("DSA public key", DSA_PUBLIC_KEY_LENGTH, signing_key.len())?;
        let y = BigUint::from_bytes_be(signing_key);
        let key = VerifyingKey::from_components(dsa_components()?, y)
            .map_err(|e| Error::KeyMaterial(format!("DSA public key rejected: {e}")))?;
        Ok(Self { key })
    }
}

impl Verifier for DsaVerifier {
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        if signature.len() != DSA_SIGNATURE_LENGTH {
            return false;
        }
        let half = DSA_SIGNATURE_LENGTH / 2;
        let r = BigUint::from_bytes_be(&signature[..half]);
        let s = BigUint::from_bytes_be(&signature[half..]);
        let Ok(sig) = Signature::from_components(r, s) else {
            return false;
        };
        self.key
            .verify_digest(Sha1::new_with_prefix(message), &sig)
            .is_ok()
    }

    fn public_key_len(&self) -> usize {
        DSA_PUBLIC_KEY_LENGTH
    }

    fn signature_len(&self) -> usize {
        DSA_SIGNATURE_LENGTH
    }
}

/// Signer over a raw 20-byte x value. The public y is recomputed from
/// the domain parameters at construction.
pub struct DsaSigner {
    key: SigningKey,
}

impl DsaSigner {
    pub fn new(signing_private_key: &[u8]) -> Result<Self> {
        check_key_len(
            "DSA private key",
            DSA_PRIVATE_KEY_LENGTH,
            signing_private_key.len(),
        )?;
        let components = dsa_components()?;
        let x = BigUint::from_bytes_be(signing_private_key);
        let y = components.g().modpow(&x, components.p());
        let verifying_key = VerifyingKey::from_components(components, y)
            .map_err(|e| Error::KeyMaterial(format!("derived DSA public key rejected: {e}")))?;
        let key = SigningKey::from_components(verifying_key, x)
            .map_err(|e| Error::KeyMaterial(format!("DSA private key rejected: {e}")))?;
        Ok(Self { key })
    }
}

impl Signer for DsaSigner {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let sig: Signature = self
            .key
            .try_sign_digest(Sha1::new_with_prefix(message))
            .map_err(|e| Error::Crypto(format!("DSA signing failed: {e}")))?;
        let half = DSA_SIGNATURE_LENGTH / 2;
        let mut out = to_fixed_be(sig.r(), half)?;
        out.extend(to_fixed_be(sig.s(), half)?);
        Ok(out)
    }
}

/// Random keypair under the fixed domain parameters.
pub fn generate_dsa_keys() -> Result<KeyPair> {
    let components = dsa_components()?;
    let key = SigningKey::generate(&mut OsRng, components);
    let public = to_fixed_be(key.verifying_key().y(), DSA_PUBLIC_KEY_LENGTH)?;
    let private = Zeroizing::new(to_fixed_be(key.x(), DSA_PRIVATE_KEY_LENGTH)?);
    Ok(KeyPair { public, private })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let keys = generate_dsa_keys().unwrap();
        assert_eq!(keys.public.len(), DSA_PUBLIC_KEY_LENGTH);
        assert_eq!(keys.private.len(), DSA_PRIVATE_KEY_LENGTH);

        let signer = DsaSigner::new(&keys.private).unwrap();
        let verifier = DsaVerifier::new(&keys.public).unwrap();

        let message = b"tunnel build request";
        let signature = signer.sign(message).unwrap();
        assert_eq!(signature.len(), DSA_SIGNATURE_LENGTH);
        assert!(verifier.verify(message, &signature));
    }

    #[test]
    fn bit_flips_break_verification() {
        let keys = generate_dsa_keys().unwrap();
        let signer = DsaSigner::new(&keys.private).unwrap();
        let verifier = DsaVerifier::new(&keys.public).unwrap();

        let message = b"flip me";
        let signature = signer.sign(message).unwrap();

        let mut bad_sig = signature.clone();
        bad_sig[7] ^= 0x01;
        assert!(!verifier.verify(message, &bad_sig));

        assert!(!verifier.verify(b"flip mf", &signature));
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(DsaVerifier::new(&[0u8; 64]).is_err());
        assert!(DsaSigner::new(&[0u8; 19]).is_err());

        let keys = generate_dsa_keys().unwrap();
        let verifier = DsaVerifier::new(&keys.public).unwrap();
        // A short signature is a plain verification failure
        assert!(!verifier.verify(b"msg", &[0u8; 39]));
    }

    #[test]
    fn default_private_key_length() {
        let keys = generate_dsa_keys().unwrap();
        let verifier = DsaVerifier::new(&keys.public).unwrap();
        assert_eq!(verifier.private_key_len(), DSA_PRIVATE_KEY_LENGTH);
    }
}
