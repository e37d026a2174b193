//! Signing a transaction end to end

use serde::Serialize;
use tracing::info;

use keyward_core::address::keccak256;
use keyward_core::{ChainId, MessageHash, RecoverableSignature, RecoveryIdScheme};
use keyward_custodian::{KeyCustodian, ProvisionedKey, RemoteSigner};

use crate::error::{Result, TxError};
use crate::transaction::TransactionCodec;

/// A signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedTransaction {
    /// Raw signed encoding
    #[serde(serialize_with = "serialize_raw")]
    pub raw: Vec<u8>,

    /// Transaction hash, `keccak256(raw)`
    pub hash: MessageHash,

    pub signature: RecoverableSignature,
}

impl SignedTransaction {
    fn new(raw: Vec<u8>, signature: RecoverableSignature) -> Self {
        let hash = MessageHash::new(keccak256(&raw));
        Self {
            raw,
            hash,
            signature,
        }
    }

    /// `0x`-prefixed raw transaction, as accepted by `eth_sendRawTransaction`
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.raw))
    }
}

fn serialize_raw<S>(raw: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(raw)))
}

/// Hash, sign through the custodian, and serialize `tx`
///
/// The signer's recovery scheme must produce values a legacy transaction
/// can carry, so the bare-parity scheme is refused.
pub async fn sign_transaction<C, T>(
    signer: &RemoteSigner<C>,
    account: &ProvisionedKey,
    tx: &T,
    chain_id: Option<ChainId>,
) -> Result<SignedTransaction>
where
    C: KeyCustodian + ?Sized,
    T: TransactionCodec + ?Sized,
{
    if signer.scheme() == RecoveryIdScheme::Parity {
        return Err(TxError::UnsupportedScheme("parity".to_string()));
    }

    let digest = tx.signing_hash(chain_id);
    let signature = signer
        .sign_transaction_digest(&account.key_handle, &account.address, &digest, chain_id)
        .await?;

    let signed = SignedTransaction::new(tx.encode_signed(&signature), signature);
    info!(
        from = %account.address,
        tx_hash = %signed.hash,
        v = signature.v(),
        "Signed transaction"
    );
    Ok(signed)
}
