//! Signature subsystem
//!
//! One abstract capability pair — [`Verifier`] / [`Signer`] — over four
//! algorithm families: legacy DSA, ECDSA on three NIST curves, RSA
//! PKCS#1 v1.5 in three moduli, and Ed25519. Key, signature and private
//! key lengths are fixed per family and never vary at runtime; the
//! family is selected at construction time from a [`SigningKeyType`] tag
//! carried by router identities.
//!
//! The group/curve arithmetic is delegated to the underlying crates;
//! this module owns parameter sets, byte layouts and dispatch. All
//! families except Ed25519 encode signatures as two equal-length
//! big-endian integers `r‖s`; Ed25519 uses its own point-plus-scalar
//! encoding.

mod dsa;
mod ecdsa;
mod eddsa;
mod rsa;

pub use self::dsa::{
    generate_dsa_keys, DsaSigner, DsaVerifier, DSA_PRIVATE_KEY_LENGTH, DSA_PUBLIC_KEY_LENGTH,
    DSA_SIGNATURE_LENGTH,
};
pub use self::ecdsa::{
    generate_ecdsa_p256_keys, generate_ecdsa_p384_keys, generate_ecdsa_p521_keys,
    EcdsaP256Signer, EcdsaP256Verifier, EcdsaP384Signer, EcdsaP384Verifier, EcdsaP521Signer,
    EcdsaP521Verifier, ECDSA_P256_KEY_LENGTH, ECDSA_P384_KEY_LENGTH, ECDSA_P521_KEY_LENGTH,
};
pub use self::eddsa::{
    generate_eddsa25519_keys, Eddsa25519Signer, Eddsa25519Verifier,
    EDDSA25519_PRIVATE_KEY_LENGTH, EDDSA25519_PUBLIC_KEY_LENGTH, EDDSA25519_SIGNATURE_LENGTH,
};
pub use self::rsa::{
    generate_rsa_2048_keys, generate_rsa_3072_keys, generate_rsa_4096_keys, RsaSha2562048Signer,
    RsaSha2562048Verifier, RsaSha3843072Signer, RsaSha3843072Verifier, RsaSha5124096Signer,
    RsaSha5124096Verifier, RSA_SHA256_2048_KEY_LENGTH, RSA_SHA384_3072_KEY_LENGTH,
    RSA_SHA512_4096_KEY_LENGTH,
};

use std::fmt;

use num_bigint_dig::BigUint;
use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Signature verification capability.
///
/// Verifiers are immutable after construction and safe to share across
/// threads. A failed verification is `false`, never an error — the
/// caller decides whether a bad signature is a hard reject.
pub trait Verifier: Send + Sync {
    /// Verify `signature` over `message`, recomputing the digest with
    /// this family's designated hash.
    fn verify(&self, message: &[u8], signature: &[u8]) -> bool;

    fn public_key_len(&self) -> usize;

    fn signature_len(&self) -> usize;

    /// Private key length. Half the signature for every family except
    /// RSA, which overrides this with twice the modulus length.
    fn private_key_len(&self) -> usize {
        self.signature_len() / 2
    }
}

/// Signing capability. The produced signature is always exactly the
/// family's fixed signature length.
pub trait Signer: Send + Sync {
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>>;
}

/// Algorithm family tags as carried in router identity certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SigningKeyType {
    DsaSha1 = 0,
    EcdsaSha256P256 = 1,
    EcdsaSha384P384 = 2,
    EcdsaSha512P521 = 3,
    RsaSha2562048 = 4,
    RsaSha3843072 = 5,
    RsaSha5124096 = 6,
    EddsaSha512Ed25519 = 7,
}

impl SigningKeyType {
    pub fn from_u16(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(SigningKeyType::DsaSha1),
            1 => Some(SigningKeyType::EcdsaSha256P256),
            2 => Some(SigningKeyType::EcdsaSha384P384),
            3 => Some(SigningKeyType::EcdsaSha512P521),
            4 => Some(SigningKeyType::RsaSha2562048),
            5 => Some(SigningKeyType::RsaSha3843072),
            6 => Some(SigningKeyType::RsaSha5124096),
            7 => Some(SigningKeyType::EddsaSha512Ed25519),
            _ => None,
        }
    }

    pub fn public_key_len(self) -> usize {
        match self {
            SigningKeyType::DsaSha1 => DSA_PUBLIC_KEY_LENGTH,
            SigningKeyType::EcdsaSha256P256 => ECDSA_P256_KEY_LENGTH,
            SigningKeyType::EcdsaSha384P384 => ECDSA_P384_KEY_LENGTH,
            SigningKeyType::EcdsaSha512P521 => ECDSA_P521_KEY_LENGTH,
            SigningKeyType::RsaSha2562048 => RSA_SHA256_2048_KEY_LENGTH,
            SigningKeyType::RsaSha3843072 => RSA_SHA384_3072_KEY_LENGTH,
            SigningKeyType::RsaSha5124096 => RSA_SHA512_4096_KEY_LENGTH,
            SigningKeyType::EddsaSha512Ed25519 => EDDSA25519_PUBLIC_KEY_LENGTH,
        }
    }

    pub fn signature_len(self) -> usize {
        match self {
            SigningKeyType::DsaSha1 => DSA_SIGNATURE_LENGTH,
            SigningKeyType::EddsaSha512Ed25519 => EDDSA25519_SIGNATURE_LENGTH,
            // ECDSA and RSA signatures match their key length
            other => other.public_key_len(),
        }
    }

    pub fn private_key_len(self) -> usize {
        match self {
            // n ‖ d, twice the modulus
            SigningKeyType::RsaSha2562048
            | SigningKeyType::RsaSha3843072
            | SigningKeyType::RsaSha5124096 => self.public_key_len() * 2,
            other => other.signature_len() / 2,
        }
    }
}

/// Construct the verifier matching a router's declared key type.
///
/// `signing_key` must be exactly the family's public key length;
/// anything else is malformed key material and fails construction.
pub fn create_verifier(key_type: SigningKeyType, signing_key: &[u8]) -> Result<Box<dyn Verifier>> {
    Ok(match key_type {
        SigningKeyType::DsaSha1 => Box::new(DsaVerifier::new(signing_key)?),
        SigningKeyType::EcdsaSha256P256 => Box::new(EcdsaP256Verifier::new(signing_key)?),
        SigningKeyType::EcdsaSha384P384 => Box::new(EcdsaP384Verifier::new(signing_key)?),
        SigningKeyType::EcdsaSha512P521 => Box::new(EcdsaP521Verifier::new(signing_key)?),
        SigningKeyType::RsaSha2562048 => Box::new(RsaSha2562048Verifier::new(signing_key)?),
        SigningKeyType::RsaSha3843072 => Box::new(RsaSha3843072Verifier::new(signing_key)?),
        SigningKeyType::RsaSha5124096 => Box::new(RsaSha5124096Verifier::new(signing_key)?),
        SigningKeyType::EddsaSha512Ed25519 => Box::new(Eddsa25519Verifier::new(signing_key)?),
    })
}

/// Construct the signer matching a key type from raw private key bytes.
pub fn create_signer(key_type: SigningKeyType, private_key: &[u8]) -> Result<Box<dyn Signer>> {
    Ok(match key_type {
        SigningKeyType::DsaSha1 => Box::new(DsaSigner::new(private_key)?),
        SigningKeyType::EcdsaSha256P256 => Box::new(EcdsaP256Signer::new(private_key)?),
        SigningKeyType::EcdsaSha384P384 => Box::new(EcdsaP384Signer::new(private_key)?),
        SigningKeyType::EcdsaSha512P521 => Box::new(EcdsaP521Signer::new(private_key)?),
        SigningKeyType::RsaSha2562048 => Box::new(RsaSha2562048Signer::new(private_key)?),
        SigningKeyType::RsaSha3843072 => Box::new(RsaSha3843072Signer::new(private_key)?),
        SigningKeyType::RsaSha5124096 => Box::new(RsaSha5124096Signer::new(private_key)?),
        SigningKeyType::EddsaSha512Ed25519 => Box::new(Eddsa25519Signer::new(private_key)?),
    })
}

/// A freshly generated signing keypair, raw bytes in the family's wire
/// encoding. Private material is zeroed on drop.
pub struct KeyPair {
    pub public: Vec<u8>,
    pub private: Zeroizing<Vec<u8>>,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print private key material
        f.debug_struct("KeyPair")
            .field("public_len", &self.public.len())
            .finish_non_exhaustive()
    }
}

/// Generate a random keypair for the given family from OS entropy.
pub fn generate_keypair(key_type: SigningKeyType) -> Result<KeyPair> {
    match key_type {
        SigningKeyType::DsaSha1 => generate_dsa_keys(),
        SigningKeyType::EcdsaSha256P256 => generate_ecdsa_p256_keys(),
        SigningKeyType::EcdsaSha384P384 => generate_ecdsa_p384_keys(),
        SigningKeyType::EcdsaSha512P521 => generate_ecdsa_p521_keys(),
        SigningKeyType::RsaSha2562048 => generate_rsa_2048_keys(),
        SigningKeyType::RsaSha3843072 => generate_rsa_3072_keys(),
        SigningKeyType::RsaSha5124096 => generate_rsa_4096_keys(),
        SigningKeyType::EddsaSha512Ed25519 => generate_eddsa25519_keys(),
    }
}

/// Serialize a big integer to exactly `len` big-endian bytes, left-padded
/// with zeros. Fails if the value does not fit.
pub(crate) fn to_fixed_be(value: &BigUint, len: usize) -> Result<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > len {
        return Err(Error::Crypto(format!(
            "integer of {} bytes exceeds the {len}-byte field",
            bytes.len()
        )));
    }
    let mut out = vec![0u8; len];
    out[len - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Check a raw key length at construction time.
pub(crate) fn check_key_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::KeyMaterial(format!(
            "{what}: expected {expected} bytes, got {actual}"
        )));
    }
    Ok(())
}
