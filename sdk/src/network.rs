//! Network selection: one immutable profile per bridge request.

use std::fmt;
use std::str::FromStr;

use solana_program::pubkey::Pubkey;
use solana_sdk::signature::Signature;

use crate::constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Devnet,
    Mainnet,
}

impl Network {
    /// Cluster name used by the Solana explorer.
    pub fn cluster(&self) -> &'static str {
        match self {
            Network::Devnet => "devnet",
            Network::Mainnet => "mainnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cluster())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Network::Devnet),
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            other => Err(format!("Unknown network '{}', expected devnet or mainnet", other)),
        }
    }
}

/// Program ids, fee receiver and RPC endpoint for one network.
///
/// A profile is selected once per request and never mixed with another inside a
/// single transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    pub network: Network,
    pub rpc_endpoint: String,
    pub bridge_program_id: Pubkey,
    pub relayer_program_id: Pubkey,
    pub gas_fee_receiver: Pubkey,
    pub default_gas_limit: u64,
}

impl NetworkProfile {
    pub fn devnet() -> Self {
        Self {
            network: Network::Devnet,
            rpc_endpoint: RPC_URL_DEVNET.to_string(),
            bridge_program_id: BRIDGE_PROGRAM_ID_DEVNET,
            relayer_program_id: RELAYER_PROGRAM_ID_DEVNET,
            gas_fee_receiver: GAS_FEE_RECEIVER_DEVNET,
            default_gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            rpc_endpoint: RPC_URL_MAINNET.to_string(),
            bridge_program_id: BRIDGE_PROGRAM_ID_MAINNET,
            relayer_program_id: RELAYER_PROGRAM_ID_MAINNET,
            gas_fee_receiver: GAS_FEE_RECEIVER_MAINNET,
            default_gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Devnet => Self::devnet(),
            Network::Mainnet => Self::mainnet(),
        }
    }

    pub fn with_rpc_endpoint(mut self, rpc_endpoint: impl Into<String>) -> Self {
        self.rpc_endpoint = rpc_endpoint.into();
        self
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.default_gas_limit = gas_limit;
        self
    }

    pub fn explorer_url(&self, signature: &Signature) -> String {
        format!(
            "https://explorer.solana.com/tx/{}?cluster={}",
            signature,
            self.network.cluster()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_network_tags() {
        assert_eq!("devnet".parse::<Network>().unwrap(), Network::Devnet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Mainnet);
        assert_eq!("mainnet-beta".parse::<Network>().unwrap(), Network::Mainnet);
        assert!("testnet".parse::<Network>().is_err());
    }

    #[test]
    fn profiles_do_not_share_program_ids() {
        let devnet = NetworkProfile::devnet();
        let mainnet = NetworkProfile::mainnet();
        assert_ne!(devnet.bridge_program_id, mainnet.bridge_program_id);
        assert_ne!(devnet.relayer_program_id, mainnet.relayer_program_id);
        assert_ne!(devnet.gas_fee_receiver, mainnet.gas_fee_receiver);
        assert_eq!(devnet.default_gas_limit, 300_000);
    }

    #[test]
    fn overrides_keep_program_ids() {
        let profile = NetworkProfile::devnet()
            .with_rpc_endpoint("http://localhost:8899")
            .with_gas_limit(500_000);
        assert_eq!(profile.rpc_endpoint, "http://localhost:8899");
        assert_eq!(profile.default_gas_limit, 500_000);
        assert_eq!(profile.bridge_program_id, BRIDGE_PROGRAM_ID_DEVNET);
    }

    #[test]
    fn explorer_url_uses_cluster() {
        let sig = Signature::default();
        let url = NetworkProfile::mainnet().explorer_url(&sig);
        assert!(url.starts_with("https://explorer.solana.com/tx/"));
        assert!(url.ends_with("?cluster=mainnet"));
    }
}
