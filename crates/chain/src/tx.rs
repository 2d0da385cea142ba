//! Borsh transaction encoding and signing.
//!
//! The wire format is the protocol's: a borsh-serialized transaction is
//! sha256-hashed, the hash is ed25519-signed, and the signed transaction is
//! submitted base64-encoded.

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use borsh::io::{Result as IoResult, Write};
use borsh::BorshSerialize;
use sha2::{Digest, Sha256};

use crate::key::OperatorKey;
use crate::GatewayError;

/// Protocol tag for ed25519 keys and signatures.
const KEY_TYPE_ED25519: u8 = 0;
/// Discriminant of the function-call variant in the protocol's action enum.
const ACTION_FUNCTION_CALL: u8 = 2;

pub struct PublicKey(pub [u8; 32]);

impl BorshSerialize for PublicKey {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        KEY_TYPE_ED25519.serialize(writer)?;
        self.0.serialize(writer)
    }
}

pub struct Signature(pub [u8; 64]);

impl BorshSerialize for Signature {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        KEY_TYPE_ED25519.serialize(writer)?;
        self.0.serialize(writer)
    }
}

#[derive(BorshSerialize)]
pub struct FunctionCall {
    pub method_name: String,
    pub args: Vec<u8>,
    pub gas: u64,
    pub deposit: u128,
}

/// The operator only ever sends function-call actions; the discriminant is
/// still the protocol-wide one.
pub enum Action {
    FunctionCall(FunctionCall),
}

impl BorshSerialize for Action {
    fn serialize<W: Write>(&self, writer: &mut W) -> IoResult<()> {
        match self {
            Action::FunctionCall(call) => {
                ACTION_FUNCTION_CALL.serialize(writer)?;
                call.serialize(writer)
            }
        }
    }
}

#[derive(BorshSerialize)]
pub struct Transaction {
    pub signer_id: String,
    pub public_key: PublicKey,
    pub nonce: u64,
    pub receiver_id: String,
    pub block_hash: [u8; 32],
    pub actions: Vec<Action>,
}

#[derive(BorshSerialize)]
pub struct SignedTransaction {
    pub transaction: Transaction,
    pub signature: Signature,
}

impl Transaction {
    /// Sign and return the base64 wire form for `broadcast_tx_commit`.
    pub fn sign(self, key: &OperatorKey) -> Result<String, GatewayError> {
        let payload = borsh::to_vec(&self)?;
        let hash = Sha256::digest(&payload);
        let signed = SignedTransaction {
            transaction: self,
            signature: Signature(key.sign(&hash)),
        };
        Ok(BASE64_STANDARD.encode(borsh::to_vec(&signed)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NO_DEPOSIT, OPERATION_GAS};

    fn sample_transaction() -> Transaction {
        Transaction {
            signer_id: "op.near".to_owned(),
            public_key: PublicKey([5u8; 32]),
            nonce: 42,
            receiver_id: "pool.near".to_owned(),
            block_hash: [9u8; 32],
            actions: vec![Action::FunctionCall(FunctionCall {
                method_name: "update".to_owned(),
                args: b"{}".to_vec(),
                gas: OPERATION_GAS,
                deposit: NO_DEPOSIT,
            })],
        }
    }

    #[test]
    fn test_transaction_borsh_layout() {
        let bytes = borsh::to_vec(&sample_transaction()).unwrap();

        // signer_id: u32 length prefix + utf8
        assert_eq!(&bytes[..4], &7u32.to_le_bytes());
        assert_eq!(&bytes[4..11], b"op.near");
        // public key: tag + 32 bytes
        assert_eq!(bytes[11], 0);
        assert_eq!(&bytes[12..44], &[5u8; 32]);
        // nonce
        assert_eq!(&bytes[44..52], &42u64.to_le_bytes());
        // receiver_id
        assert_eq!(&bytes[52..56], &9u32.to_le_bytes());
        assert_eq!(&bytes[56..65], b"pool.near");
        // block hash
        assert_eq!(&bytes[65..97], &[9u8; 32]);
        // one action, function-call discriminant
        assert_eq!(&bytes[97..101], &1u32.to_le_bytes());
        assert_eq!(bytes[101], 2);
        // method name
        assert_eq!(&bytes[102..106], &6u32.to_le_bytes());
        assert_eq!(&bytes[106..112], b"update");
        // args
        assert_eq!(&bytes[112..116], &2u32.to_le_bytes());
        assert_eq!(&bytes[116..118], b"{}");
        // gas then 16-byte deposit
        assert_eq!(&bytes[118..126], &OPERATION_GAS.to_le_bytes());
        assert_eq!(&bytes[126..142], &0u128.to_le_bytes());
        assert_eq!(bytes.len(), 142);
    }

    #[test]
    fn test_signed_transaction_appends_signature() {
        let key = OperatorKey::from_base58(&bs58::encode(&[3u8; 32]).into_string()).unwrap();
        let tx_bytes = borsh::to_vec(&sample_transaction()).unwrap();
        let encoded = sample_transaction().sign(&key).unwrap();

        let wire = BASE64_STANDARD.decode(encoded).unwrap();
        // transaction bytes, then signature tag + 64 bytes
        assert_eq!(&wire[..tx_bytes.len()], &tx_bytes[..]);
        assert_eq!(wire[tx_bytes.len()], 0);
        assert_eq!(wire.len(), tx_bytes.len() + 1 + 64);
    }
}
