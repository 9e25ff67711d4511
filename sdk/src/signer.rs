//! Signing backends.
//!
//! A bridge transaction is signed either by a keypair held in process or by a
//! remote custodial service. The service may answer with a fully signed
//! transaction or with a detached signature; both are normalized into the same
//! `SignedEnvelope`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use solana_program::pubkey::Pubkey;
use solana_sdk::{
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use thiserror::Error;

use crate::error::{BridgeError, Result, TransportError};

// ── Custodial Backend ───────────────────────────────────────────────────────

/// Failure reported by a custodial signing service.
#[derive(Error, Debug)]
pub enum CustodialError {
    /// The request never got a verdict. Retrying with the same bytes is safe.
    #[error("transport failure: {0}")]
    Transport(#[source] TransportError),
    /// The service refused to sign.
    #[error("rejected: {0}")]
    Rejected(String),
}

/// Response body of a custodial `signTransaction` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodialResponse {
    /// Base64 bincode-serialized signed transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_transaction: Option<String>,
    /// Base58 ed25519 signature over the transaction message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

/// Remote service holding key material on the account's behalf.
///
/// Implementations may serialize requests per account; callers must not assume
/// a signing round-trip is fast.
#[async_trait::async_trait]
pub trait CustodialBackend: Send + Sync {
    async fn sign_transaction(
        &self,
        unsigned_transaction: &[u8],
        account: &Pubkey,
    ) -> std::result::Result<CustodialResponse, CustodialError>;
}

/// What a custodial service actually handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignOutcome {
    SignedTransaction(Vec<u8>),
    DetachedSignature(Signature),
}

impl CustodialResponse {
    /// Classify the response. A signed transaction takes precedence when both
    /// fields are present.
    pub fn into_outcome(self) -> Result<SignOutcome> {
        if let Some(encoded) = self.signed_transaction {
            let bytes = BASE64.decode(encoded.trim()).map_err(|e| {
                BridgeError::SigningContractViolation(format!("signedTransaction is not base64: {}", e))
            })?;
            return Ok(SignOutcome::SignedTransaction(bytes));
        }
        if let Some(encoded) = self.signature {
            let signature = Signature::from_str(encoded.trim()).map_err(|e| {
                BridgeError::SigningContractViolation(format!("signature is not base58 ed25519: {}", e))
            })?;
            return Ok(SignOutcome::DetachedSignature(signature));
        }
        Err(BridgeError::SigningContractViolation(
            "response carries neither signedTransaction nor signature".to_string(),
        ))
    }
}

#[derive(Clone)]
pub struct CustodialSigner {
    backend: Arc<dyn CustodialBackend>,
    account: Pubkey,
}

impl CustodialSigner {
    pub fn new(backend: Arc<dyn CustodialBackend>, account: Pubkey) -> Self {
        Self { backend, account }
    }

    pub fn account(&self) -> Pubkey {
        self.account
    }
}

impl fmt::Debug for CustodialSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustodialSigner")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

// ── Bridge Signer ───────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum BridgeSigner {
    Local(Keypair),
    Custodial(CustodialSigner),
}

impl BridgeSigner {
    /// Account that pays fees and authorizes the transfer.
    pub fn pubkey(&self) -> Pubkey {
        match self {
            BridgeSigner::Local(keypair) => keypair.pubkey(),
            BridgeSigner::Custodial(custodial) => custodial.account(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            BridgeSigner::Local(_) => "local",
            BridgeSigner::Custodial(_) => "custodial",
        }
    }

    /// Sign `unsigned`, which must already carry its recent blockhash.
    ///
    /// Only signatures are added; the message bytes are never changed.
    pub async fn sign(&self, unsigned: &Transaction) -> Result<SignedEnvelope> {
        match self {
            BridgeSigner::Local(keypair) => {
                let mut tx = unsigned.clone();
                let blockhash = tx.message.recent_blockhash;
                tx.try_sign(&[keypair], blockhash)
                    .map_err(|e| BridgeError::SignerRejected(e.to_string()))?;
                SignedEnvelope::new(tx)
            }
            BridgeSigner::Custodial(custodial) => {
                let wire = bincode::serialize(unsigned)?;
                let response = custodial
                    .backend
                    .sign_transaction(&wire, &custodial.account)
                    .await
                    .map_err(|e| match e {
                        CustodialError::Transport(e) => BridgeError::SignerUnavailable(e),
                        CustodialError::Rejected(reason) => BridgeError::SignerRejected(reason),
                    })?;
                match response.into_outcome()? {
                    SignOutcome::SignedTransaction(bytes) => accept_signed_blob(unsigned, &bytes),
                    SignOutcome::DetachedSignature(signature) => {
                        attach_signature(unsigned, &custodial.account, signature)
                    }
                }
            }
        }
    }
}

fn accept_signed_blob(unsigned: &Transaction, bytes: &[u8]) -> Result<SignedEnvelope> {
    let signed: Transaction = bincode::deserialize(bytes).map_err(|e| {
        BridgeError::SigningContractViolation(format!("signed transaction does not decode: {}", e))
    })?;
    if signed.message != unsigned.message {
        return Err(BridgeError::SigningContractViolation(
            "signed transaction does not match the submitted message".to_string(),
        ));
    }
    SignedEnvelope::new(signed)
}

fn attach_signature(unsigned: &Transaction, account: &Pubkey, signature: Signature) -> Result<SignedEnvelope> {
    let required = unsigned.message.header.num_required_signatures as usize;
    let position = unsigned
        .message
        .account_keys
        .iter()
        .take(required)
        .position(|key| key == account)
        .ok_or_else(|| {
            BridgeError::SigningContractViolation(format!("{} is not a required signer", account))
        })?;

    let mut tx = unsigned.clone();
    tx.signatures.resize(required, Signature::default());
    tx.signatures[position] = signature;
    SignedEnvelope::new(tx)
}

// ── Signed Envelope ─────────────────────────────────────────────────────────

/// Fully signed transaction and its wire bytes, ready to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    transaction: Transaction,
    wire: Vec<u8>,
}

impl SignedEnvelope {
    /// Wrap a transaction carrying one valid signature per required signer.
    pub fn new(transaction: Transaction) -> Result<Self> {
        let required = transaction.message.header.num_required_signatures as usize;
        if required == 0 || transaction.signatures.len() != required {
            return Err(BridgeError::SigningContractViolation(format!(
                "expected {} signatures, got {}",
                required,
                transaction.signatures.len()
            )));
        }
        if transaction.signatures.iter().any(|s| *s == Signature::default()) {
            return Err(BridgeError::SigningContractViolation(
                "transaction is missing a signature".to_string(),
            ));
        }
        // verify() only checks the signatures that are present
        transaction.verify().map_err(|e| {
            BridgeError::SigningContractViolation(format!("signature does not verify: {}", e))
        })?;
        let wire = bincode::serialize(&transaction)?;
        Ok(Self { transaction, wire })
    }

    /// Transaction id (the fee payer's signature).
    pub fn signature(&self) -> Signature {
        self.transaction.signatures[0]
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.wire
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::{hash::Hash, system_instruction};

    fn unsigned_tx(payer: &Pubkey) -> Transaction {
        let ix = system_instruction::transfer(payer, &Pubkey::new_unique(), 1);
        let mut tx = Transaction::new_with_payer(&[ix], Some(payer));
        tx.message.recent_blockhash = Hash::new_unique();
        tx
    }

    #[test]
    fn classifies_responses() {
        let blob = CustodialResponse {
            signed_transaction: Some(BASE64.encode([1u8, 2, 3])),
            signature: Some(Signature::default().to_string()),
        };
        assert_eq!(blob.into_outcome().unwrap(), SignOutcome::SignedTransaction(vec![1, 2, 3]));

        let detached = CustodialResponse {
            signed_transaction: None,
            signature: Some(Signature::default().to_string()),
        };
        assert_eq!(
            detached.into_outcome().unwrap(),
            SignOutcome::DetachedSignature(Signature::default())
        );

        assert!(matches!(
            CustodialResponse::default().into_outcome(),
            Err(BridgeError::SigningContractViolation(_))
        ));
        let garbage = CustodialResponse {
            signed_transaction: None,
            signature: Some("not-a-signature".to_string()),
        };
        assert!(matches!(garbage.into_outcome(), Err(BridgeError::SigningContractViolation(_))));
    }

    #[test]
    fn response_uses_camel_case() {
        let parsed: CustodialResponse =
            serde_json::from_str(r#"{"signedTransaction":"AQID"}"#).unwrap();
        assert_eq!(parsed.signed_transaction.as_deref(), Some("AQID"));
        assert_eq!(parsed.signature, None);
    }

    #[tokio::test]
    async fn local_signer_only_adds_signatures() {
        let keypair = Keypair::new();
        let unsigned = unsigned_tx(&keypair.pubkey());
        let signer = BridgeSigner::Local(keypair);

        let envelope = signer.sign(&unsigned).await.unwrap();
        assert_eq!(envelope.transaction().message, unsigned.message);
        assert_ne!(envelope.signature(), Signature::default());
        assert_eq!(bincode::deserialize::<Transaction>(envelope.as_bytes()).unwrap(), *envelope.transaction());
    }

    #[tokio::test]
    async fn local_signer_rejects_foreign_payer() {
        let unsigned = unsigned_tx(&Pubkey::new_unique());
        let signer = BridgeSigner::Local(Keypair::new());
        assert!(matches!(signer.sign(&unsigned).await, Err(BridgeError::SignerRejected(_))));
    }

    #[test]
    fn detached_signature_must_verify() {
        let keypair = Keypair::new();
        let unsigned = unsigned_tx(&keypair.pubkey());

        let good = keypair.sign_message(&unsigned.message_data());
        let envelope = attach_signature(&unsigned, &keypair.pubkey(), good).unwrap();
        assert_eq!(envelope.signature(), good);

        let forged = Keypair::new().sign_message(&unsigned.message_data());
        assert!(matches!(
            attach_signature(&unsigned, &keypair.pubkey(), forged),
            Err(BridgeError::SigningContractViolation(_))
        ));
        assert!(matches!(
            attach_signature(&unsigned, &Pubkey::new_unique(), good),
            Err(BridgeError::SigningContractViolation(_))
        ));
    }

    #[test]
    fn signed_blob_must_keep_message() {
        let keypair = Keypair::new();
        let unsigned = unsigned_tx(&keypair.pubkey());

        let mut tampered = unsigned_tx(&keypair.pubkey());
        let blockhash = tampered.message.recent_blockhash;
        tampered.sign(&[&keypair], blockhash);
        let bytes = bincode::serialize(&tampered).unwrap();
        assert!(matches!(
            accept_signed_blob(&unsigned, &bytes),
            Err(BridgeError::SigningContractViolation(_))
        ));
        assert!(matches!(
            accept_signed_blob(&unsigned, &[0xde, 0xad]),
            Err(BridgeError::SigningContractViolation(_))
        ));
    }

    #[test]
    fn envelope_requires_every_signature() {
        let keypair = Keypair::new();
        let unsigned = unsigned_tx(&keypair.pubkey());

        let mut stripped = unsigned.clone();
        stripped.signatures.clear();
        assert!(matches!(
            SignedEnvelope::new(stripped.clone()),
            Err(BridgeError::SigningContractViolation(_))
        ));
        let bytes = bincode::serialize(&stripped).unwrap();
        assert!(matches!(
            accept_signed_blob(&unsigned, &bytes),
            Err(BridgeError::SigningContractViolation(_))
        ));

        // placeholder signatures are not signatures
        assert!(matches!(
            SignedEnvelope::new(unsigned.clone()),
            Err(BridgeError::SigningContractViolation(_))
        ));
    }
}
