//! Recovery-id resolution
//!
//! The custodian never says which of the two curve points behind a
//! signature is the signing key. Each candidate v is tried in order: recover
//! the public key for that y-parity, hash it, and compare with the address
//! recorded at provisioning time. Exactly one candidate matches for a
//! signature made by the account's key.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::derive_address;
use crate::error::{Error, Result};
use crate::types::{Address, CanonicalSignature, ChainId, MessageHash, RawPublicKey};

/// How candidate v values are numbered on the target network
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryIdScheme {
    /// `2 * chain_id + 35 + parity`, or `27 + parity` when no chain id is set
    #[default]
    Eip155,
    /// `27 + parity`
    Legacy,
    /// Bare y-parity, as used by typed transactions
    Parity,
}

impl RecoveryIdScheme {
    /// Candidate pair for this scheme, ordered even parity first
    ///
    /// Fails for an EIP-155 chain id above [`ChainId::MAX`].
    pub fn candidates(&self, chain_id: Option<ChainId>) -> Result<RecoveryCandidates> {
        match (self, chain_id) {
            (RecoveryIdScheme::Eip155, Some(chain_id)) => RecoveryCandidates::eip155(chain_id)
                .ok_or(Error::InvalidChainId(chain_id.as_u64())),
            (RecoveryIdScheme::Eip155, None) | (RecoveryIdScheme::Legacy, _) => {
                Ok(RecoveryCandidates::legacy())
            }
            (RecoveryIdScheme::Parity, _) => Ok(RecoveryCandidates::new(0, 1)),
        }
    }
}

/// The two admissible v values; `first` pairs with even y, `second` with odd y
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryCandidates {
    pub first: u64,
    pub second: u64,
}

impl RecoveryCandidates {
    pub fn new(first: u64, second: u64) -> Self {
        Self { first, second }
    }

    /// EIP-155 replay-protected pair, `None` above the EIP-2294 bound
    pub fn eip155(chain_id: ChainId) -> Option<Self> {
        if !chain_id.is_valid() {
            return None;
        }
        let base = chain_id.as_u64().checked_mul(2)?.checked_add(35)?;
        Some(Self::new(base, base.checked_add(1)?))
    }

    /// Pre-EIP-155 pair (27, 28)
    pub fn legacy() -> Self {
        Self::new(27, 28)
    }

    /// Candidates in trial order, each with the y-parity it stands for
    pub fn in_order(&self) -> [(u64, bool); 2] {
        [(self.first, false), (self.second, true)]
    }
}

/// Outcome of a recovery-id search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(u64),
    Unresolved,
}

/// Recover the signing public key for one y-parity
///
/// Returns `None` when no valid point exists for this parity.
pub fn recover_public_key(
    digest: &MessageHash,
    signature: &CanonicalSignature,
    y_odd: bool,
) -> Option<RawPublicKey> {
    let signature = Signature::from_scalars(*signature.r(), *signature.s()).ok()?;
    let recovery_id = RecoveryId::new(y_odd, false);

    let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &signature, recovery_id).ok()?;
    let encoded = key.to_encoded_point(false);

    let raw: [u8; 64] = encoded.as_bytes().get(1..)?.try_into().ok()?;
    Some(RawPublicKey::new(raw))
}

/// Address of the key recovered for one y-parity
pub fn recover_address(
    digest: &MessageHash,
    signature: &CanonicalSignature,
    y_odd: bool,
) -> Option<Address> {
    recover_public_key(digest, signature, y_odd).map(|key| derive_address(&key))
}

/// Find the v whose recovered key hashes to `address`
pub fn resolve(
    address: &Address,
    digest: &MessageHash,
    signature: &CanonicalSignature,
    candidates: RecoveryCandidates,
) -> Resolution {
    for (v, y_odd) in candidates.in_order() {
        match recover_address(digest, signature, y_odd) {
            Some(recovered) if recovered == *address => {
                debug!(v, "Recovery id resolved");
                return Resolution::Resolved(v);
            }
            Some(recovered) => {
                debug!(v, recovered = %recovered, "Candidate recovers a different address");
            }
            None => {
                debug!(v, "Candidate does not recover a valid key");
            }
        }
    }
    Resolution::Unresolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::decode_signature;

    // EIP-155 example: key 0x4646...46 signing the mainnet transfer
    const ADDRESS: &str = "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f";
    const DIGEST: &str = "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53";
    const SIGNATURE_DER: &str = "3044022028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276022067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

    fn fixture() -> (Address, MessageHash, CanonicalSignature) {
        (
            Address::from_hex(ADDRESS).unwrap(),
            MessageHash::from_hex(DIGEST).unwrap(),
            decode_signature(&hex::decode(SIGNATURE_DER).unwrap()).unwrap(),
        )
    }

    #[test]
    fn test_resolves_mainnet_example() {
        let (address, digest, signature) = fixture();
        let candidates = RecoveryIdScheme::Eip155
            .candidates(Some(ChainId::ETHEREUM))
            .unwrap();
        assert_eq!(candidates, RecoveryCandidates::new(37, 38));
        assert_eq!(
            resolve(&address, &digest, &signature, candidates),
            Resolution::Resolved(37)
        );
    }

    #[test]
    fn test_other_parity_recovers_different_address() {
        let (address, digest, signature) = fixture();
        assert_eq!(recover_address(&digest, &signature, false), Some(address));
        assert_ne!(recover_address(&digest, &signature, true), Some(address));
    }

    #[test]
    fn test_unknown_address_is_unresolved() {
        let (_, digest, signature) = fixture();
        let stranger = Address::new([0x42; 20]);
        assert_eq!(
            resolve(&stranger, &digest, &signature, RecoveryCandidates::legacy()),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_tampered_digest_is_unresolved() {
        let (address, mut digest, signature) = fixture();
        digest.0[0] ^= 0x01;
        assert_eq!(
            resolve(&address, &digest, &signature, RecoveryCandidates::legacy()),
            Resolution::Unresolved
        );
    }

    #[test]
    fn test_scheme_candidates() {
        assert_eq!(
            RecoveryIdScheme::Eip155.candidates(Some(ChainId::SEPOLIA)),
            Ok(RecoveryCandidates::new(22310257, 22310258))
        );
        assert_eq!(
            RecoveryIdScheme::Eip155.candidates(None),
            Ok(RecoveryCandidates::new(27, 28))
        );
        assert_eq!(
            RecoveryIdScheme::Legacy.candidates(Some(ChainId::SEPOLIA)),
            Ok(RecoveryCandidates::new(27, 28))
        );
        assert_eq!(
            RecoveryIdScheme::Parity.candidates(Some(ChainId::SEPOLIA)),
            Ok(RecoveryCandidates::new(0, 1))
        );
    }

    #[test]
    fn test_chain_id_bound() {
        let max = ChainId::new(ChainId::MAX);
        assert_eq!(
            RecoveryCandidates::eip155(max),
            Some(RecoveryCandidates::new(u64::MAX - 38, u64::MAX - 37))
        );

        for id in [ChainId::MAX + 1, u64::MAX / 2, u64::MAX] {
            assert_eq!(RecoveryCandidates::eip155(ChainId::new(id)), None);
            assert_eq!(
                RecoveryIdScheme::Eip155.candidates(Some(ChainId::new(id))),
                Err(Error::InvalidChainId(id))
            );
        }

        // Only EIP-155 numbering depends on the chain id
        let huge = Some(ChainId::new(u64::MAX));
        assert!(RecoveryIdScheme::Legacy.candidates(huge).is_ok());
        assert!(RecoveryIdScheme::Parity.candidates(huge).is_ok());
    }

    #[test]
    fn test_candidate_order_is_fixed() {
        let candidates = RecoveryCandidates::new(35, 36);
        assert_eq!(candidates.in_order(), [(35, false), (36, true)]);
    }
}
