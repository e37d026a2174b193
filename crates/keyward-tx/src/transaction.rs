//! Legacy (type 0) transactions
//!
//! The signing hash is `keccak256(rlp([nonce, gas_price, gas_limit, to,
//! value, data, chain_id, 0, 0]))` under EIP-155, or the first six fields
//! only when no chain id is given. The signed form replaces the trailing
//! three fields with `v, r, s`.

use serde::{Deserialize, Serialize};

use keyward_core::address::keccak256;
use keyward_core::{Address, ChainId, MessageHash, RecoverableSignature};

use crate::error::{Result, TxError};
use crate::rlp;

/// 50 gwei
pub const DEFAULT_GAS_PRICE: u128 = 50_000_000_000;

/// Enough for simple contract calls
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// Encoding of a transaction for signing and broadcast
pub trait TransactionCodec {
    /// Digest handed to the custodian
    fn signing_hash(&self, chain_id: Option<ChainId>) -> MessageHash;

    /// Raw signed transaction bytes
    fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8>;
}

/// A legacy value transfer or contract call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyTransaction {
    pub nonce: u64,

    /// Gas price in wei
    pub gas_price: u128,

    pub gas_limit: u64,

    /// Recipient address
    pub to: Address,

    /// Value in wei
    pub value: u128,

    /// Call data
    #[serde(default, with = "hex_data")]
    pub data: Vec<u8>,
}

impl LegacyTransaction {
    /// RLP of the six transaction fields, without a list header
    fn fields_payload(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64 + self.data.len());
        rlp::encode_uint(self.nonce as u128, &mut out);
        rlp::encode_uint(self.gas_price, &mut out);
        rlp::encode_uint(self.gas_limit as u128, &mut out);
        rlp::encode_bytes(self.to.as_bytes(), &mut out);
        rlp::encode_uint(self.value, &mut out);
        rlp::encode_bytes(&self.data, &mut out);
        out
    }

    /// The exact bytes hashed for signing
    pub fn signing_preimage(&self, chain_id: Option<ChainId>) -> Vec<u8> {
        let mut payload = self.fields_payload();
        if let Some(chain_id) = chain_id {
            rlp::encode_uint(chain_id.as_u64() as u128, &mut payload);
            rlp::encode_uint(0, &mut payload);
            rlp::encode_uint(0, &mut payload);
        }
        rlp::encode_list(&payload)
    }

    /// Serialize transaction to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize transaction from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl TransactionCodec for LegacyTransaction {
    fn signing_hash(&self, chain_id: Option<ChainId>) -> MessageHash {
        MessageHash::new(keccak256(&self.signing_preimage(chain_id)))
    }

    fn encode_signed(&self, signature: &RecoverableSignature) -> Vec<u8> {
        let mut payload = self.fields_payload();
        rlp::encode_uint(signature.v() as u128, &mut payload);
        rlp::encode_uint_bytes(signature.r(), &mut payload);
        rlp::encode_uint_bytes(signature.s(), &mut payload);
        rlp::encode_list(&payload)
    }
}

/// Transaction builder for easier construction
pub struct TransactionBuilder {
    to: Option<Address>,
    nonce: u64,
    gas_price: u128,
    gas_limit: u64,
    value: u128,
    data: Vec<u8>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self {
            to: None,
            nonce: 0,
            gas_price: DEFAULT_GAS_PRICE,
            gas_limit: DEFAULT_GAS_LIMIT,
            value: 0,
            data: Vec::new(),
        }
    }
}

impl TransactionBuilder {
    /// Create a new transaction builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recipient address
    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    /// Set the nonce
    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Set the gas price in wei
    pub fn gas_price(mut self, gas_price: u128) -> Self {
        self.gas_price = gas_price;
        self
    }

    /// Set the gas limit
    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    /// Set the value in wei
    pub fn value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    /// Set the call data
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    /// Build the transaction
    pub fn build(self) -> Result<LegacyTransaction> {
        let to = self
            .to
            .ok_or_else(|| TxError::InvalidTransaction("Recipient address is required".to_string()))?;

        Ok(LegacyTransaction {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to,
            value: self.value,
            data: self.data,
        })
    }
}

/// Serde helper for `0x`-prefixed call data
mod hex_data {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(data)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        keyward_core::types::decode_hex(&s).map_err(serde::de::Error::custom)
    }
}
