//! Operator signing key.
//!
//! Secret keys arrive base58-encoded with an `ed25519:` prefix, either as a
//! 64-byte secret‖public pair or as the bare 32-byte secret.

use ed25519_dalek::{Signer, SigningKey};

use crate::GatewayError;

const ED25519_PREFIX: &str = "ed25519:";

pub struct OperatorKey {
    signing: SigningKey,
}

impl OperatorKey {
    pub fn from_base58(encoded: &str) -> Result<Self, GatewayError> {
        let stripped = encoded.strip_prefix(ED25519_PREFIX).unwrap_or(encoded);
        let bytes = bs58::decode(stripped)
            .into_vec()
            .map_err(|e| GatewayError::InvalidKey(e.to_string()))?;

        let mut secret = [0u8; 32];
        match bytes.len() {
            32 => secret.copy_from_slice(&bytes),
            64 => {
                secret.copy_from_slice(&bytes[..32]);
                let signing = SigningKey::from_bytes(&secret);
                if signing.verifying_key().to_bytes().as_slice() != &bytes[32..] {
                    return Err(GatewayError::InvalidKey(
                        "keypair halves do not match".to_owned(),
                    ));
                }
                return Ok(Self { signing });
            }
            n => {
                return Err(GatewayError::InvalidKey(format!(
                    "expected 32 or 64 key bytes, got {n}"
                )))
            }
        }
        Ok(Self {
            signing: SigningKey::from_bytes(&secret),
        })
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing.verifying_key().to_bytes()
    }

    /// The `ed25519:`-prefixed base58 form used in access-key queries.
    pub fn public_key_base58(&self) -> String {
        format!(
            "{ED25519_PREFIX}{}",
            bs58::encode(self.public_key_bytes()).into_string()
        )
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing.sign(message).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Verifier, VerifyingKey};

    fn encoded_pair() -> (String, [u8; 32]) {
        let secret = [7u8; 32];
        let signing = SigningKey::from_bytes(&secret);
        let public = signing.verifying_key().to_bytes();
        let mut pair = Vec::with_capacity(64);
        pair.extend_from_slice(&secret);
        pair.extend_from_slice(&public);
        (
            format!("ed25519:{}", bs58::encode(&pair).into_string()),
            public,
        )
    }

    #[test]
    fn test_parse_prefixed_pair() {
        let (encoded, public) = encoded_pair();
        let key = OperatorKey::from_base58(&encoded).unwrap();
        assert_eq!(key.public_key_bytes(), public);
        assert!(key.public_key_base58().starts_with("ed25519:"));
    }

    #[test]
    fn test_parse_bare_secret() {
        let secret = [9u8; 32];
        let encoded = bs58::encode(&secret).into_string();
        let key = OperatorKey::from_base58(&encoded).unwrap();
        assert_eq!(
            key.public_key_bytes(),
            SigningKey::from_bytes(&secret).verifying_key().to_bytes()
        );
    }

    #[test]
    fn test_rejects_mismatched_pair() {
        let mut pair = vec![7u8; 32];
        pair.extend_from_slice(&[1u8; 32]);
        let encoded = format!("ed25519:{}", bs58::encode(&pair).into_string());
        assert!(OperatorKey::from_base58(&encoded).is_err());
    }

    #[test]
    fn test_rejects_bad_length() {
        let encoded = bs58::encode(&[1u8; 16]).into_string();
        assert!(OperatorKey::from_base58(&encoded).is_err());
    }

    #[test]
    fn test_signature_verifies() {
        let (encoded, public) = encoded_pair();
        let key = OperatorKey::from_base58(&encoded).unwrap();
        let signature = key.sign(b"tick");

        let verifying = VerifyingKey::from_bytes(&public).unwrap();
        let signature = ed25519_dalek::Signature::from_bytes(&signature);
        assert!(verifying.verify(b"tick", &signature).is_ok());
    }
}
