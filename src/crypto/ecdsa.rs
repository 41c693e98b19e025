//! ECDSA families over the NIST prime curves
//!
//! Three curve/hash pairings: P-256/SHA-256, P-384/SHA-384 and
//! P-521/SHA-512. Public keys are the raw affine coordinates `x‖y`
//! (no SEC1 point tag), signatures the fixed-width scalars `r‖s`, and
//! private keys the raw scalar — so key length, signature length and
//! twice the private length all coincide per curve.

use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::{check_key_len, KeyPair, Signer, Verifier};
use crate::error::{Error, Result};

pub const ECDSA_P256_KEY_LENGTH: usize = 64;
pub const ECDSA_P384_KEY_LENGTH: usize = 96;
pub const ECDSA_P521_KEY_LENGTH: usize = 132;

macro_rules! ecdsa_family {
    (
        $curve:ident, $hash:ty, $key_length:expr,
        $verifier:ident, $signer:ident, $generate:ident
    ) => {
        pub struct $verifier {
            key: $curve::ecdsa::VerifyingKey,
        }

        impl $verifier {
            /// Construct from raw `x‖y` affine coordinates.
            pub fn new(signing_key: &[u8]) -> Result<Self> {
                check_key_len("ECDSA public key", $key_length, signing_key.len())?;
                let half = $key_length / 2;
                let x = $curve::FieldBytes::from_slice(&signing_key[..half]);
                let y = $curve::FieldBytes::from_slice(&signing_key[half..]);
                let point = $curve::EncodedPoint::from_affine_coordinates(x, y, false);
                let key = $curve::ecdsa::VerifyingKey::from_encoded_point(&point)
                    .map_err(|e| Error::KeyMaterial(format!("point not on curve: {e}")))?;
                Ok(Self { key })
            }
        }

        impl Verifier for $verifier {
            fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
                if signature.len() != $key_length {
                    return false;
                }
                let Ok(sig) = $curve::ecdsa::Signature::from_slice(signature) else {
                    return false;
                };
                signature::Verifier::verify(&self.key, message, &sig).is_ok()
            }

            fn public_key_len(&self) -> usize {
                $key_length
            }

            fn signature_len(&self) -> usize {
                $key_length
            }
        }

        pub struct $signer {
            key: $curve::ecdsa::SigningKey,
        }

        impl $signer {
            /// Construct from the raw private scalar.
            pub fn new(signing_private_key: &[u8]) -> Result<Self> {
                check_key_len(
                    "ECDSA private key",
                    $key_length / 2,
                    signing_private_key.len(),
                )?;
                let key = $curve::ecdsa::SigningKey::from_slice(signing_private_key)
                    .map_err(|e| Error::KeyMaterial(format!("scalar out of range: {e}")))?;
                Ok(Self { key })
            }
        }

        impl Signer for $signer {
            fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
                let sig: $curve::ecdsa::Signature =
                    signature::Signer::try_sign(&self.key, message)
                        .map_err(|e| Error::Crypto(format!("ECDSA signing failed: {e}")))?;
                Ok(sig.to_bytes().to_vec())
            }
        }

        /// Random keypair; the underlying crate rejects out-of-range
        /// scalars, so generated keys are always valid for the curve.
        pub fn $generate() -> Result<KeyPair> {
            let key = $curve::ecdsa::SigningKey::random(&mut OsRng);
            let point = $curve::ecdsa::VerifyingKey::from(&key).to_encoded_point(false);
            let (Some(x), Some(y)) = (point.x(), point.y()) else {
                return Err(Error::Crypto("generated key is the identity point".into()));
            };

            let mut public = Vec::with_capacity($key_length);
            public.extend_from_slice(x);
            public.extend_from_slice(y);
            let private = Zeroizing::new(key.to_bytes().to_vec());
            Ok(KeyPair { public, private })
        }
    };
}

ecdsa_family!(
    p256,
    Sha256,
    ECDSA_P256_KEY_LENGTH,
    EcdsaP256Verifier,
    EcdsaP256Signer,
    generate_ecdsa_p256_keys
);
ecdsa_family!(
    p384,
    Sha384,
    ECDSA_P384_KEY_LENGTH,
    EcdsaP384Verifier,
    EcdsaP384Signer,
    generate_ecdsa_p384_keys
);
ecdsa_family!(
    p521,
    Sha512,
    ECDSA_P521_KEY_LENGTH,
    EcdsaP521Verifier,
    EcdsaP521Signer,
    generate_ecdsa_p521_keys
);
