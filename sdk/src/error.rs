use solana_program::pubkey::Pubkey;
use thiserror::Error;

use crate::orchestrator::BridgeState;

/// Error returned by an external collaborator (RPC node, signing service),
/// carried through unchanged.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum BridgeError {
    // ── Construction (detected before any network call) ─────────────────────
    #[error("Salt must be 32 bytes, got {0}")]
    InvalidSaltLength(usize),
    #[error("Invalid EVM address: {0}")]
    InvalidAddressFormat(String),
    #[error("Invalid amount: {0}")]
    AmountConversion(String),
    #[error("Invalid call data: {0}")]
    InvalidCallData(String),
    #[error("Address derived for program {derived} used with program {expected}")]
    NetworkMismatch { expected: Pubkey, derived: Pubkey },
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Failed to gather salt entropy: {0}")]
    Entropy(String),

    // ── Network / signing ───────────────────────────────────────────────────
    #[error("Failed to read balance: {0}")]
    BalanceUnavailable(#[source] TransportError),
    #[error("Failed to fetch a recent blockhash: {0}")]
    BlockhashUnavailable(#[source] TransportError),
    #[error("Signer returned an unrecognized response: {0}")]
    SigningContractViolation(String),
    #[error("Signer rejected the transaction: {0}")]
    SignerRejected(String),
    #[error("Signing service unreachable: {0}")]
    SignerUnavailable(#[source] TransportError),
    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(#[source] TransportError),
    #[error("Failed to poll confirmation status: {0}")]
    ConfirmationUnavailable(#[source] TransportError),
    #[error("Transaction was not confirmed before its blockhash expired: {0}")]
    ConfirmationTimeout(String),
    #[error("Transaction failed: {0}")]
    ConfirmationFailed(String),
    #[error("Deadline exceeded while {0}")]
    DeadlineExceeded(BridgeState),
}

impl BridgeError {
    /// Whether the error was raised while building the transaction, before any
    /// network call was made.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            BridgeError::InvalidSaltLength(_)
                | BridgeError::InvalidAddressFormat(_)
                | BridgeError::AmountConversion(_)
                | BridgeError::InvalidCallData(_)
                | BridgeError::NetworkMismatch { .. }
                | BridgeError::Encoding(_)
                | BridgeError::Entropy(_)
        )
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::Encoding(e.to_string())
    }
}

impl From<bincode::Error> for BridgeError {
    fn from(e: bincode::Error) -> Self {
        BridgeError::Encoding(e.to_string())
    }
}
