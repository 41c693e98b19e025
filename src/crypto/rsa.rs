//! RSA PKCS#1 v1.5 families
//!
//! Three modulus/hash pairings: 2048/SHA-256, 3072/SHA-384 and
//! 4096/SHA-512, all with the fixed public exponent 65537. The wire
//! encoding is bare big-endian integers: the public key is the modulus
//! alone, the private key is `n‖d` — twice the modulus length, the one
//! family that overrides the half-signature private-length default.

use rand::rngs::OsRng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use super::{check_key_len, to_fixed_be, KeyPair, Signer, Verifier};
use crate::error::{Error, Result};

pub const RSA_SHA256_2048_KEY_LENGTH: usize = 256;
pub const RSA_SHA384_3072_KEY_LENGTH: usize = 384;
pub const RSA_SHA512_4096_KEY_LENGTH: usize = 512;

const RSA_PUBLIC_EXPONENT: u64 = 65537;

macro_rules! rsa_family {
    (
        $hash:ty, $key_length:expr,
        $verifier:ident, $signer:ident, $generate:ident
    ) => {
        pub struct $verifier {
            key: RsaPublicKey,
        }

        impl $verifier {
            /// Construct from the raw modulus; e is fixed.
            pub fn new(signing_key: &[u8]) -> Result<Self> {
                check_key_len("RSA public key", $key_length, signing_key.len())?;
                let n = BigUint::from_bytes_be(signing_key);
                let key = RsaPublicKey::new(n, BigUint::from(RSA_PUBLIC_EXPONENT))
                    .map_err(|e| Error::KeyMaterial(format!("RSA modulus rejected: {e}")))?;
                Ok(Self { key })
            }
        }

        impl Verifier for $verifier {
            fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
                if signature.len() != $key_length {
                    return false;
                }
                let digest = <$hash>::digest(message);
                self.key
                    .verify(Pkcs1v15Sign::new::<$hash>(), &digest, signature)
                    .is_ok()
            }

            fn public_key_len(&self) -> usize {
                $key_length
            }

            fn signature_len(&self) -> usize {
                $key_length
            }

            // n ‖ d
            fn private_key_len(&self) -> usize {
                $key_length * 2
            }
        }

        pub struct $signer {
            key: RsaPrivateKey,
        }

        impl $signer {
            /// Construct from `n‖d`; the prime factors are recovered by
            /// the underlying crate.
            pub fn new(signing_private_key: &[u8]) -> Result<Self> {
                check_key_len(
                    "RSA private key",
                    $key_length * 2,
                    signing_private_key.len(),
                )?;
                let n = BigUint::from_bytes_be(&signing_private_key[..$key_length]);
                let d = BigUint::from_bytes_be(&signing_private_key[$key_length..]);
                let key = RsaPrivateKey::from_components(
                    n,
                    BigUint::from(RSA_PUBLIC_EXPONENT),
                    d,
                    Vec::new(),
                )
                .map_err(|e| Error::KeyMaterial(format!("RSA private key rejected: {e}")))?;
                Ok(Self { key })
            }
        }

        impl Signer for $signer {
            fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
                let digest = <$hash>::digest(message);
                self.key
                    .sign(Pkcs1v15Sign::new::<$hash>(), &digest)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))
            }
        }

        pub fn $generate() -> Result<KeyPair> {
            let key = RsaPrivateKey::new(&mut OsRng, $key_length * 8)
                .map_err(|e| Error::Crypto(format!("RSA key generation failed: {e}")))?;
            let n = to_fixed_be(key.n(), $key_length)?;
            let d = to_fixed_be(key.d(), $key_length)?;

            let mut private = Zeroizing::new(Vec::with_capacity($key_length * 2));
            private.extend_from_slice(&n);
            private.extend_from_slice(&d);
            Ok(KeyPair {
                public: n,
                private,
            })
        }
    };
}

rsa_family!(
    Sha256,
    RSA_SHA256_2048_KEY_LENGTH,
    RsaSha2562048Verifier,
    RsaSha2562048Signer,
    generate_rsa_2048_keys
);
rsa_family!(
    Sha384,
    RSA_SHA384_3072_KEY_LENGTH,
    RsaSha3843072Verifier,
    RsaSha3843072Signer,
    generate_rsa_3072_keys
);
rsa_family!(
    Sha512,
    RSA_SHA512_4096_KEY_LENGTH,
    RsaSha5124096Verifier,
    RsaSha5124096Signer,
    generate_rsa_4096_keys
);

#[cfg(test)]
mod tests {
    use super::*;

    // Key generation for the larger moduli is too slow for routine test
    // runs; the 2048-bit family exercises the shared macro body and the
    // others are covered by the length table.
    #[test]
    fn rsa_2048_sign_verify_roundtrip() {
        let keys = generate_rsa_2048_keys().unwrap();
        assert_eq!(keys.public.len(), RSA_SHA256_2048_KEY_LENGTH);
        assert_eq!(keys.private.len(), RSA_SHA256_2048_KEY_LENGTH * 2);

        let signer = RsaSha2562048Signer::new(&keys.private).unwrap();
        let verifier = RsaSha2562048Verifier::new(&keys.public).unwrap();
        assert_eq!(verifier.private_key_len(), RSA_SHA256_2048_KEY_LENGTH * 2);

        let message = b"router info";
        let signature = signer.sign(message).unwrap();
        assert_eq!(signature.len(), RSA_SHA256_2048_KEY_LENGTH);
        assert!(verifier.verify(message, &signature));

        let mut bad_sig = signature.clone();
        bad_sig[128] ^= 0x01;
        assert!(!verifier.verify(message, &bad_sig));
        assert!(!verifier.verify(b"router inf0", &signature));
    }

    #[test]
    fn wrong_lengths_rejected() {
        assert!(RsaSha2562048Verifier::new(&[0u8; 255]).is_err());
        assert!(RsaSha2562048Signer::new(&[0u8; 256]).is_err());
        assert!(RsaSha3843072Verifier::new(&[1u8; 256]).is_err());
    }
}
