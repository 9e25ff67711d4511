use std::fmt;
use std::str::FromStr;

use crate::constants::EVM_ADDRESS_LEN;
use crate::error::BridgeError;

/// 20-byte address on the EVM side of the bridge.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvmAddress([u8; EVM_ADDRESS_LEN]);

impl EvmAddress {
    pub fn new(bytes: [u8; EVM_ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; EVM_ADDRESS_LEN] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; EVM_ADDRESS_LEN] {
        self.0
    }
}

impl FromStr for EvmAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = strip_hex_prefix(s);
        if body.len() != EVM_ADDRESS_LEN * 2 {
            return Err(BridgeError::InvalidAddressFormat(format!(
                "expected 40 hex characters, got {} in '{}'",
                body.len(),
                s
            )));
        }
        let mut bytes = [0u8; EVM_ADDRESS_LEN];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| BridgeError::InvalidAddressFormat(format!("'{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmAddress({})", self)
    }
}

/// Parse hex call data, with or without a `0x` prefix.
pub fn parse_call_data(data_hex: &str) -> Result<Vec<u8>, BridgeError> {
    hex::decode(strip_hex_prefix(data_hex.trim()))
        .map_err(|e| BridgeError::InvalidCallData(format!("'{}': {}", data_hex, e)))
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
