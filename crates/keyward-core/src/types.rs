//! Core newtypes shared by the custodian adapter and the transaction codec

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::{Error, Result};

/// Opaque key identifier issued by the custodian
///
/// Never contains key material; the custodian resolves it to a key pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyHandle(String);

impl KeyHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw uncompressed secp256k1 point (x || y, without the 0x04 marker)
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPublicKey(#[serde(with = "hex_array")] pub [u8; 64]);

impl RawPublicKey {
    pub fn new(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }

    /// SEC1 uncompressed encoding (0x04 || x || y)
    pub fn to_sec1_uncompressed(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[0] = 0x04;
        out[1..].copy_from_slice(&self.0);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for RawPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawPublicKey({})", self.to_hex())
    }
}

/// 20-byte ledger account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex, the form persisted by wallet records
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum form
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = Keccak256::digest(lower.as_bytes());

        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Parse from hex, with or without `0x`, in any letter case
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(strip_0x(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// 32-byte digest handed to the custodian for signing
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageHash(#[serde(with = "hex_array")] pub [u8; 32]);

impl MessageHash {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(strip_0x(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for MessageHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageHash({})", self.to_hex())
    }
}

impl AsRef<[u8]> for MessageHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// ECDSA signature with s in the lower half of the curve order
///
/// Only produced by [`crate::signature`], which enforces `s <= N/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CanonicalSignature {
    #[serde(with = "hex_array")]
    pub(crate) r: [u8; 32],
    #[serde(with = "hex_array")]
    pub(crate) s: [u8; 32],
}

impl CanonicalSignature {
    /// Get the r component (big-endian)
    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// Get the s component (big-endian, low-s)
    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// r || s
    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

/// Canonical signature plus the recovery value expected by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecoverableSignature {
    #[serde(flatten)]
    pub signature: CanonicalSignature,
    pub v: u64,
}

impl RecoverableSignature {
    pub fn new(signature: CanonicalSignature, v: u64) -> Self {
        Self { signature, v }
    }

    pub fn r(&self) -> &[u8; 32] {
        self.signature.r()
    }

    pub fn s(&self) -> &[u8; 32] {
        self.signature.s()
    }

    pub fn v(&self) -> u64 {
        self.v
    }
}

/// Chain ID used for replay protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// Ethereum Mainnet
    pub const ETHEREUM: ChainId = ChainId(1);
    /// Ethereum Sepolia Testnet
    pub const SEPOLIA: ChainId = ChainId(11155111);

    /// Largest chain id allowed by EIP-2294, so that `2 * id + 36` fits a u64
    pub const MAX: u64 = u64::MAX / 2 - 36;

    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this id is within the EIP-2294 bound
    pub fn is_valid(&self) -> bool {
        self.0 <= Self::MAX
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remove an optional `0x` / `0X` prefix
pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Decode variable-length hex, with or without `0x`
pub fn decode_hex(s: &str) -> Result<Vec<u8>> {
    hex::decode(strip_0x(s)).map_err(|e| Error::InvalidHex(e.to_string()))
}

/// Serde helper for fixed-size byte arrays as `0x`-prefixed hex strings
pub mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; N];
        hex::decode_to_slice(super::strip_0x(&s), &mut bytes).map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}
