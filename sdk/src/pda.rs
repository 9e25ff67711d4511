//! Program-derived addresses shared by the bridge and relayer programs.
//!
//! Salted addresses (`outgoing_message`, `mtr`) are unique per message; the
//! others are program-lifetime singletons.

use std::fmt;

use solana_program::pubkey::Pubkey;

use crate::constants::*;
use crate::error::{BridgeError, Result};
use crate::network::NetworkProfile;

// ── Salt ────────────────────────────────────────────────────────────────────

/// 32 random bytes identifying one bridge message. Never reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    /// Fresh salt from OS entropy.
    pub fn random() -> Result<Self> {
        let mut bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut bytes).map_err(|e| BridgeError::Entropy(e.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn from_bytes(bytes: [u8; SALT_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SALT_LEN] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; SALT_LEN] {
        self.0
    }
}

impl TryFrom<&[u8]> for Salt {
    type Error = BridgeError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SALT_LEN] = bytes
            .try_into()
            .map_err(|_| BridgeError::InvalidSaltLength(bytes.len()))?;
        Ok(Self(array))
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Salt({})", hex::encode(self.0))
    }
}

// ── Derivation ──────────────────────────────────────────────────────────────

/// Derive `(address, bump)` for `seed_label` under `program_id`, optionally
/// salted. A salt that is not exactly 32 bytes is rejected.
pub fn derive(program_id: &Pubkey, seed_label: &[u8], salt: Option<&[u8]>) -> Result<(Pubkey, u8)> {
    match salt {
        Some(salt) => {
            if salt.len() != SALT_LEN {
                return Err(BridgeError::InvalidSaltLength(salt.len()));
            }
            Ok(Pubkey::find_program_address(&[seed_label, salt], program_id))
        }
        None => Ok(Pubkey::find_program_address(&[seed_label], program_id)),
    }
}

pub fn find_outgoing_message(salt: &Salt, bridge_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[OUTGOING_MESSAGE_SEED, salt.as_bytes()], bridge_program_id)
}

pub fn find_message_to_relay(salt: &Salt, relayer_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[MESSAGE_TO_RELAY_SEED, salt.as_bytes()], relayer_program_id)
}

pub fn find_bridge(bridge_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[BRIDGE_SEED], bridge_program_id)
}

pub fn find_sol_vault(bridge_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[SOL_VAULT_SEED], bridge_program_id)
}

pub fn find_relayer_config(relayer_program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RELAYER_CONFIG_SEED], relayer_program_id)
}

// ── Address Set ─────────────────────────────────────────────────────────────

/// The five addresses one bridge message touches, tagged with the program ids
/// they were derived under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeAddresses {
    pub bridge_program_id: Pubkey,
    pub relayer_program_id: Pubkey,
    pub outgoing_message: Pubkey,
    pub message_to_relay: Pubkey,
    pub bridge: Pubkey,
    pub sol_vault: Pubkey,
    pub relayer_config: Pubkey,
}

impl BridgeAddresses {
    pub fn derive(profile: &NetworkProfile, salt: &Salt) -> Self {
        let bridge_program_id = profile.bridge_program_id;
        let relayer_program_id = profile.relayer_program_id;

        let (outgoing_message, _) = find_outgoing_message(salt, &bridge_program_id);
        let (message_to_relay, _) = find_message_to_relay(salt, &relayer_program_id);
        let (bridge, _) = find_bridge(&bridge_program_id);
        let (sol_vault, _) = find_sol_vault(&bridge_program_id);
        let (relayer_config, _) = find_relayer_config(&relayer_program_id);

        Self {
            bridge_program_id,
            relayer_program_id,
            outgoing_message,
            message_to_relay,
            bridge,
            sol_vault,
            relayer_config,
        }
    }

    /// Fails with `NetworkMismatch` unless these addresses were derived under
    /// `profile`'s program ids.
    pub fn ensure_profile(&self, profile: &NetworkProfile) -> Result<()> {
        if self.bridge_program_id != profile.bridge_program_id {
            return Err(BridgeError::NetworkMismatch {
                expected: profile.bridge_program_id,
                derived: self.bridge_program_id,
            });
        }
        if self.relayer_program_id != profile.relayer_program_id {
            return Err(BridgeError::NetworkMismatch {
                expected: profile.relayer_program_id,
                derived: self.relayer_program_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let profile = NetworkProfile::devnet();
        let salt = Salt::from_bytes([7u8; 32]);
        let a = BridgeAddresses::derive(&profile, &salt);
        let b = BridgeAddresses::derive(&profile, &salt);
        assert_eq!(a, b);

        let (addr1, bump1) = derive(&profile.bridge_program_id, OUTGOING_MESSAGE_SEED, Some(&[7u8; 32])).unwrap();
        let (addr2, bump2) = derive(&profile.bridge_program_id, OUTGOING_MESSAGE_SEED, Some(&[7u8; 32])).unwrap();
        assert_eq!((addr1, bump1), (addr2, bump2));
        assert_eq!(addr1, a.outgoing_message);
    }

    #[test]
    fn distinct_salts_give_distinct_message_addresses() {
        let profile = NetworkProfile::devnet();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..32 {
            let salt = Salt::random().unwrap();
            let addrs = BridgeAddresses::derive(&profile, &salt);
            assert_ne!(addrs.outgoing_message, addrs.message_to_relay);
            assert!(seen.insert(addrs.outgoing_message));
            assert!(seen.insert(addrs.message_to_relay));
        }
    }

    #[test]
    fn singletons_ignore_salt() {
        let profile = NetworkProfile::devnet();
        let a = BridgeAddresses::derive(&profile, &Salt::from_bytes([1u8; 32]));
        let b = BridgeAddresses::derive(&profile, &Salt::from_bytes([2u8; 32]));
        assert_eq!(a.bridge, b.bridge);
        assert_eq!(a.sol_vault, b.sol_vault);
        assert_eq!(a.relayer_config, b.relayer_config);
        assert_ne!(a.outgoing_message, b.outgoing_message);
    }

    #[test]
    fn rejects_bad_salt_length() {
        let pid = NetworkProfile::devnet().bridge_program_id;
        assert!(matches!(
            derive(&pid, OUTGOING_MESSAGE_SEED, Some(&[0u8; 31])),
            Err(BridgeError::InvalidSaltLength(31))
        ));
        assert!(matches!(
            Salt::try_from(&[0u8; 33][..]),
            Err(BridgeError::InvalidSaltLength(33))
        ));
        assert!(derive(&pid, BRIDGE_SEED, None).is_ok());
    }

    #[test]
    fn detects_cross_network_addresses() {
        let salt = Salt::from_bytes([3u8; 32]);
        let devnet_addrs = BridgeAddresses::derive(&NetworkProfile::devnet(), &salt);
        assert!(devnet_addrs.ensure_profile(&NetworkProfile::devnet()).is_ok());
        assert!(matches!(
            devnet_addrs.ensure_profile(&NetworkProfile::mainnet()),
            Err(BridgeError::NetworkMismatch { .. })
        ));
    }
}
