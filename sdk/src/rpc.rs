//! Chain transport used by the orchestrator.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_request::RpcRequest};
use solana_program::{hash::Hash, pubkey::Pubkey};
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature};

use crate::constants::DEFAULT_CONFIRM_POLL_MS;
use crate::error::TransportError;

/// Final word from the chain on a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    /// Executed and failed; carries the chain's error.
    Failed(String),
    /// Not seen before its blockhash stopped being valid.
    Expired,
}

#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// Recent blockhash and the last block height at which it is valid.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), TransportError>;

    async fn balance(&self, address: &Pubkey) -> Result<u64, TransportError>;

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature, TransportError>;

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        last_valid_block_height: u64,
        commitment: CommitmentConfig,
    ) -> Result<Confirmation, TransportError>;
}

/// `ChainClient` over a Solana JSON-RPC node.
pub struct RpcChainClient {
    rpc: RpcClient,
    poll_interval: Duration,
}

impl RpcChainClient {
    pub fn new(rpc_url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url.into(), commitment),
            poll_interval: Duration::from_millis(DEFAULT_CONFIRM_POLL_MS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn url(&self) -> String {
        self.rpc.url()
    }
}

#[async_trait::async_trait]
impl ChainClient for RpcChainClient {
    async fn latest_blockhash(&self) -> Result<(Hash, u64), TransportError> {
        let commitment = self.rpc.commitment();
        Ok(self.rpc.get_latest_blockhash_with_commitment(commitment).await?)
    }

    async fn balance(&self, address: &Pubkey) -> Result<u64, TransportError> {
        Ok(self.rpc.get_balance(address).await?)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> Result<Signature, TransportError> {
        let params = json!([
            BASE64.encode(wire),
            {
                "encoding": "base64",
                "preflightCommitment": self.rpc.commitment().commitment,
            }
        ]);
        let signature: String = self.rpc.send(RpcRequest::SendTransaction, params).await?;
        Ok(signature.parse::<Signature>()?)
    }

    async fn confirm_transaction(
        &self,
        signature: &Signature,
        blockhash: &Hash,
        last_valid_block_height: u64,
        commitment: CommitmentConfig,
    ) -> Result<Confirmation, TransportError> {
        log::debug!(
            "Waiting for {} (blockhash {}, valid until height {})",
            signature,
            blockhash,
            last_valid_block_height
        );
        loop {
            match self
                .rpc
                .get_signature_status_with_commitment(signature, commitment)
                .await?
            {
                Some(Ok(())) => return Ok(Confirmation::Confirmed),
                Some(Err(e)) => return Ok(Confirmation::Failed(e.to_string())),
                None => {}
            }

            let height = self.rpc.get_block_height().await?;
            if height > last_valid_block_height {
                return Ok(Confirmation::Expired);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_program::system_instruction;
    use solana_sdk::{
        signature::{Keypair, Signer},
        transaction::Transaction,
    };

    fn mock(url: &str) -> RpcChainClient {
        RpcChainClient {
            rpc: RpcClient::new_mock(url.to_string()),
            poll_interval: Duration::from_millis(DEFAULT_CONFIRM_POLL_MS),
        }
        .with_poll_interval(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn reads_blockhash_and_balance() {
        let client = mock("succeeds");
        assert!(client.url().contains("succeeds"));
        let (_, last_valid) = client.latest_blockhash().await.unwrap();
        assert_eq!(last_valid, 1234);
        assert_eq!(client.balance(&Pubkey::new_unique()).await.unwrap(), 50);
    }

    #[tokio::test]
    async fn sends_base64_wire_bytes() {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &Pubkey::new_unique(), 1);
        let tx = Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[&payer], Hash::new_unique());
        let wire = bincode::serialize(&tx).unwrap();

        let signature = mock("succeeds").send_raw_transaction(&wire).await.unwrap();
        assert_eq!(signature, tx.signatures[0]);
    }

    #[tokio::test]
    async fn confirmation_reports_chain_outcome() {
        let sig = Signature::default();
        let commitment = CommitmentConfig::confirmed();

        let confirmed = mock("succeeds")
            .confirm_transaction(&sig, &Hash::default(), 2_000, commitment)
            .await
            .unwrap();
        assert_eq!(confirmed, Confirmation::Confirmed);

        let failed = mock("instruction_error")
            .confirm_transaction(&sig, &Hash::default(), 2_000, commitment)
            .await
            .unwrap();
        assert!(matches!(failed, Confirmation::Failed(_)));
    }

    #[tokio::test]
    async fn unseen_signature_expires_with_its_blockhash() {
        let sig = Signature::default();
        let commitment = CommitmentConfig::confirmed();

        // node height is 1234
        let expired = mock("sig_not_found")
            .confirm_transaction(&sig, &Hash::default(), 1_000, commitment)
            .await
            .unwrap();
        assert_eq!(expired, Confirmation::Expired);

        // still valid: keeps polling until the caller gives up
        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            mock("sig_not_found").confirm_transaction(&sig, &Hash::default(), 2_000, commitment),
        )
        .await;
        assert!(pending.is_err());
    }
}
