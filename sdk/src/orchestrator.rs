//! Bridge request orchestration.
//!
//! One request moves through `Building → Signing → Submitting → Confirmed`.
//! `Submitting` spans the broadcast and the confirmation wait; `Confirmed` is
//! entered only once the chain confirms at the requested commitment.
//! Any error moves it to `Failed`; nothing is retried here. A retry has to start
//! from `Building` again with a fresh salt, since the salt identifies the message.

use std::fmt;
use std::future::Future;

use solana_program::pubkey::Pubkey;
use solana_sdk::{commitment_config::CommitmentConfig, signature::Signature, transaction::Transaction};
use thiserror::Error;
use tokio::time::Instant;

use crate::amount::sol_to_lamports;
use crate::error::{BridgeError, Result};
use crate::evm::EvmAddress;
use crate::instructions::{create_bridge_sol_instruction, create_pay_for_relay_instruction, ContractCall};
use crate::network::NetworkProfile;
use crate::pda::{BridgeAddresses, Salt};
use crate::rpc::{ChainClient, Confirmation};
use crate::signer::{BridgeSigner, SignedEnvelope};

// ── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Building,
    Signing,
    /// Broadcasting and polling for confirmation.
    Submitting,
    Confirmed,
    Failed,
}

impl BridgeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BridgeState::Confirmed | BridgeState::Failed)
    }
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeState::Building => "building",
            BridgeState::Signing => "signing",
            BridgeState::Submitting => "submitting",
            BridgeState::Confirmed => "confirmed",
            BridgeState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Terminal failure of a bridge request.
#[derive(Error, Debug)]
#[error("bridge request failed while {state}: {error}")]
pub struct BridgeFailure {
    /// State the request was in when it failed.
    pub state: BridgeState,
    #[source]
    pub error: BridgeError,
}

// ── Request ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub destination: EvmAddress,
    pub amount_lamports: u64,
    pub call: Option<ContractCall>,
    /// Falls back to the profile's default gas limit.
    pub gas_limit: Option<u64>,
}

impl BridgeRequest {
    pub fn transfer(amount_lamports: u64, destination: EvmAddress) -> Self {
        Self {
            destination,
            amount_lamports,
            call: None,
            gas_limit: None,
        }
    }

    /// Plain SOL transfer from user input; floors to whole lamports.
    pub fn transfer_sol(amount_sol: f64, destination: &str) -> Result<Self> {
        let destination = destination.parse()?;
        Ok(Self::transfer(sol_to_lamports(amount_sol)?, destination))
    }

    /// Invoke `call` on the EVM side. The message is addressed to the call
    /// target and bridges no SOL unless `with_amount` is used.
    pub fn contract_call(call: ContractCall) -> Self {
        Self {
            destination: call.target,
            amount_lamports: 0,
            call: Some(call),
            gas_limit: None,
        }
    }

    pub fn with_amount(mut self, amount_lamports: u64) -> Self {
        self.amount_lamports = amount_lamports;
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }
}

/// Output of the construction half of `Building`: no blockhash, no signatures.
#[derive(Debug, Clone)]
pub struct PreparedBridge {
    pub salt: Salt,
    pub addresses: BridgeAddresses,
    pub payer: Pubkey,
    pub gas_limit: u64,
    /// `[pay_for_relay, bridge_sol]`, in that order.
    pub transaction: Transaction,
}

#[derive(Debug, Clone)]
pub struct BridgeReceipt {
    pub signature: Signature,
    pub salt: Salt,
    pub addresses: BridgeAddresses,
    pub explorer_url: String,
}

// ── Orchestrator ────────────────────────────────────────────────────────────

pub struct BridgeOrchestrator<C> {
    client: C,
    profile: NetworkProfile,
    commitment: CommitmentConfig,
}

impl<C: ChainClient> BridgeOrchestrator<C> {
    pub fn new(client: C, profile: NetworkProfile) -> Self {
        Self {
            client,
            profile,
            commitment: CommitmentConfig::confirmed(),
        }
    }

    pub fn with_commitment(mut self, commitment: CommitmentConfig) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn profile(&self) -> &NetworkProfile {
        &self.profile
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub async fn balance(&self, address: &Pubkey) -> Result<u64> {
        self.client
            .balance(address)
            .await
            .map_err(BridgeError::BalanceUnavailable)
    }

    /// Build the unsigned transaction with a fresh salt.
    pub fn prepare(&self, request: &BridgeRequest, payer: &Pubkey) -> Result<PreparedBridge> {
        self.prepare_with_salt(request, payer, Salt::random()?)
    }

    /// Build the unsigned transaction for a caller-chosen salt.
    pub fn prepare_with_salt(&self, request: &BridgeRequest, payer: &Pubkey, salt: Salt) -> Result<PreparedBridge> {
        let profile = &self.profile;
        let addresses = BridgeAddresses::derive(profile, &salt);
        let gas_limit = request.gas_limit.unwrap_or(profile.default_gas_limit);

        log::debug!(
            "Derived addresses for salt {}: outgoing_message={} message_to_relay={} bridge={} sol_vault={} config={}",
            salt,
            addresses.outgoing_message,
            addresses.message_to_relay,
            addresses.bridge,
            addresses.sol_vault,
            addresses.relayer_config
        );

        // The relay payment must precede the message it pays for.
        let pay_for_relay = create_pay_for_relay_instruction(profile, &addresses, payer, &salt, gas_limit)?;
        let bridge_sol = create_bridge_sol_instruction(
            profile,
            &addresses,
            payer,
            &salt,
            &request.destination,
            request.amount_lamports,
            request.call.as_ref(),
        )?;

        let transaction = Transaction::new_with_payer(&[pay_for_relay, bridge_sol], Some(payer));

        Ok(PreparedBridge {
            salt,
            addresses,
            payer: *payer,
            gas_limit,
            transaction,
        })
    }

    /// Run one request to completion or failure. `deadline` bounds every
    /// network wait (blockhash, signing, broadcast, confirmation).
    pub async fn execute(
        &self,
        request: &BridgeRequest,
        signer: &BridgeSigner,
        deadline: Option<Instant>,
    ) -> std::result::Result<BridgeReceipt, BridgeFailure> {
        let mut run = Run::new();
        match self.drive(&mut run, request, signer, deadline).await {
            Ok(receipt) => {
                run.advance(BridgeState::Confirmed);
                Ok(receipt)
            }
            Err(error) => {
                let state = run.state;
                log::error!("Bridge request failed while {}: {}", state, error);
                run.advance(BridgeState::Failed);
                Err(BridgeFailure { state, error })
            }
        }
    }

    async fn drive(
        &self,
        run: &mut Run,
        request: &BridgeRequest,
        signer: &BridgeSigner,
        deadline: Option<Instant>,
    ) -> Result<BridgeReceipt> {
        let payer = signer.pubkey();
        log::info!(
            "Bridging {} lamports from {} to {} on {} ({} signer{})",
            request.amount_lamports,
            payer,
            request.destination,
            self.profile.network,
            signer.kind(),
            if request.call.is_some() { ", with contract call" } else { "" }
        );

        // ── Building ────────────────────────────────────────────────────────
        let prepared = self.prepare(request, &payer)?;

        if request.amount_lamports > 0 {
            match within(deadline, run.state, self.client.balance(&payer)).await? {
                Ok(balance) if balance < request.amount_lamports => log::warn!(
                    "Payer {} holds {} lamports, less than the {} being bridged",
                    payer,
                    balance,
                    request.amount_lamports
                ),
                Ok(_) => {}
                Err(e) => log::warn!("Could not read payer balance: {}", e),
            }
        }

        let (blockhash, last_valid_block_height) = within(deadline, run.state, self.client.latest_blockhash())
            .await?
            .map_err(BridgeError::BlockhashUnavailable)?;
        let mut unsigned = prepared.transaction;
        unsigned.message.recent_blockhash = blockhash;

        // ── Signing ─────────────────────────────────────────────────────────
        run.advance(BridgeState::Signing);
        let envelope: SignedEnvelope = within(deadline, run.state, signer.sign(&unsigned)).await??;

        // ── Submitting ──────────────────────────────────────────────────────
        run.advance(BridgeState::Submitting);
        let signature = within(deadline, run.state, self.client.send_raw_transaction(envelope.as_bytes()))
            .await?
            .map_err(BridgeError::BroadcastRejected)?;
        if signature != envelope.signature() {
            log::warn!(
                "Node reported signature {} for transaction {}",
                signature,
                envelope.signature()
            );
        }
        log::info!("Submitted {}", signature);

        let confirmation = within(
            deadline,
            run.state,
            self.client
                .confirm_transaction(&signature, &blockhash, last_valid_block_height, self.commitment),
        )
        .await?
        .map_err(BridgeError::ConfirmationUnavailable)?;

        match confirmation {
            Confirmation::Confirmed => {}
            Confirmation::Failed(reason) => return Err(BridgeError::ConfirmationFailed(reason)),
            Confirmation::Expired => {
                return Err(BridgeError::ConfirmationTimeout(format!(
                    "{} not confirmed by block height {}",
                    signature, last_valid_block_height
                )))
            }
        }

        let explorer_url = self.profile.explorer_url(&signature);
        log::info!("Bridge transaction confirmed: {}", explorer_url);

        Ok(BridgeReceipt {
            signature,
            salt: prepared.salt,
            addresses: prepared.addresses,
            explorer_url,
        })
    }
}

/// Await `fut`, giving up at `deadline`.
async fn within<F: Future>(deadline: Option<Instant>, state: BridgeState, fut: F) -> Result<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut)
            .await
            .map_err(|_| BridgeError::DeadlineExceeded(state)),
        None => Ok(fut.await),
    }
}

/// Per-request state tracker.
struct Run {
    state: BridgeState,
}

impl Run {
    fn new() -> Self {
        log::debug!("Bridge request -> {}", BridgeState::Building);
        Self {
            state: BridgeState::Building,
        }
    }

    fn advance(&mut self, next: BridgeState) {
        debug_assert!(!self.state.is_terminal(), "{} is terminal", self.state);
        log::debug!("Bridge request {} -> {}", self.state, next);
        self.state = next;
    }
}
