//! Base Bridge SDK: builds, signs and submits Solana → Base bridge messages.
//!
//! A message is one transaction holding two instructions: a relay payment to the
//! relayer program followed by `bridge_sol` on the bridge program, both keyed by
//! the same random salt.

pub mod constants;
pub mod error;
pub mod network;
pub mod pda;
pub mod evm;
pub mod amount;
pub mod instructions;
pub mod signer;
pub mod rpc;
pub mod orchestrator;

pub use error::{BridgeError, Result, TransportError};
pub use evm::EvmAddress;
pub use instructions::ContractCall;
pub use network::{Network, NetworkProfile};
pub use orchestrator::{BridgeFailure, BridgeOrchestrator, BridgeReceipt, BridgeRequest, BridgeState, PreparedBridge};
pub use pda::{BridgeAddresses, Salt};
pub use rpc::{ChainClient, Confirmation, RpcChainClient};
pub use signer::{BridgeSigner, CustodialBackend, CustodialError, CustodialResponse, CustodialSigner, SignOutcome, SignedEnvelope};
