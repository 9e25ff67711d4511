//! Instruction builders for the two halves of a bridge message.
//!
//! Relayer program:
//!   `pay_for_relay` = discriminator(8) | salt(32) | outgoing_message(32) | gas_limit u64 LE
//!
//! Bridge program:
//!   `bridge_sol`    = discriminator(8) | salt(32) | to(20) | amount u64 LE | call descriptor
//!
//! Call descriptor:
//!   no call         = 0x00
//!   call            = 0x01 0x00 | target(20) | value u128 LE | data_len u32 LE | data
//!
//! The receiving programs deserialize these layouts with a fixed schema, so the
//! bytes produced here must match them exactly.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
    system_program,
};

use crate::amount::ether_to_wei;
use crate::constants::*;
use crate::error::{BridgeError, Result};
use crate::evm::{parse_call_data, EvmAddress};
use crate::network::NetworkProfile;
use crate::pda::{BridgeAddresses, Salt};

// ── Param Structs (exact Borsh match to program) ────────────────────────────

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct PayForRelayParams {
    pub salt: [u8; SALT_LEN],
    pub outgoing_message: [u8; 32],
    pub gas_limit: u64,
}

#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct BridgeSolParams {
    pub salt: [u8; SALT_LEN],
    pub to: [u8; EVM_ADDRESS_LEN],
    pub amount: u64,
}

/// Body of a call descriptor, following `CALL_HEADER`.
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, PartialEq, Eq)]
pub struct CallParams {
    pub target: [u8; EVM_ADDRESS_LEN],
    pub value: u128,
    pub data: Vec<u8>,
}

// ── Contract Call ───────────────────────────────────────────────────────────

/// A contract call executed on the EVM side once the message is relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub target: EvmAddress,
    pub value_wei: u128,
    pub data: Vec<u8>,
}

impl ContractCall {
    pub fn new(target: EvmAddress, value_wei: u128, data: Vec<u8>) -> Self {
        Self {
            target,
            value_wei,
            data,
        }
    }

    /// Build from user-facing strings: `0x` target, hex call data, ETH value.
    pub fn from_hex(target: &str, data_hex: &str, value_ether: &str) -> Result<Self> {
        Ok(Self {
            target: target.parse()?,
            value_wei: ether_to_wei(value_ether)?,
            data: parse_call_data(data_hex)?,
        })
    }

    pub fn encoded_len(&self) -> usize {
        CALL_DESCRIPTOR_FIXED_LEN + self.data.len()
    }
}

// ── Encoders ────────────────────────────────────────────────────────────────

pub fn encode_pay_for_relay(salt: &Salt, outgoing_message: &Pubkey, gas_limit: u64) -> Result<Vec<u8>> {
    let params = PayForRelayParams {
        salt: salt.to_bytes(),
        outgoing_message: outgoing_message.to_bytes(),
        gas_limit,
    };
    let mut data = Vec::with_capacity(PAY_FOR_RELAY_DATA_LEN);
    data.extend_from_slice(&PAY_FOR_RELAY_DISCRIMINATOR);
    params.serialize(&mut data)?;
    Ok(data)
}

/// Encode the call descriptor; `None` is the single no-call byte.
pub fn encode_call_descriptor(call: Option<&ContractCall>) -> Result<Vec<u8>> {
    let Some(call) = call else {
        return Ok(vec![NO_CALL]);
    };
    if u32::try_from(call.data.len()).is_err() {
        return Err(BridgeError::Encoding(format!(
            "call data of {} bytes exceeds the u32 length prefix",
            call.data.len()
        )));
    }
    let params = CallParams {
        target: call.target.to_bytes(),
        value: call.value_wei,
        data: call.data.clone(),
    };
    let mut data = Vec::with_capacity(call.encoded_len());
    data.extend_from_slice(&CALL_HEADER);
    params.serialize(&mut data)?;
    Ok(data)
}

pub fn encode_bridge_sol(
    salt: &Salt,
    to: &EvmAddress,
    amount: u64,
    call: Option<&ContractCall>,
) -> Result<Vec<u8>> {
    let descriptor = encode_call_descriptor(call)?;
    let params = BridgeSolParams {
        salt: salt.to_bytes(),
        to: to.to_bytes(),
        amount,
    };
    let mut data = Vec::with_capacity(BRIDGE_SOL_FIXED_LEN + descriptor.len());
    data.extend_from_slice(&BRIDGE_SOL_DISCRIMINATOR);
    params.serialize(&mut data)?;
    data.extend_from_slice(&descriptor);
    Ok(data)
}

// ── Decoders ────────────────────────────────────────────────────────────────

/// Decoded `pay_for_relay` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayForRelayData {
    pub salt: Salt,
    pub outgoing_message: Pubkey,
    pub gas_limit: u64,
}

impl PayForRelayData {
    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() != PAY_FOR_RELAY_DATA_LEN {
            return Err(malformed("pay_for_relay", format!("length {}", data.len())));
        }
        let body = strip_discriminator(data, &PAY_FOR_RELAY_DISCRIMINATOR, "pay_for_relay")?;
        let params = PayForRelayParams::try_from_slice(body)
            .map_err(|e| malformed("pay_for_relay", e.to_string()))?;
        Ok(Self {
            salt: Salt::from_bytes(params.salt),
            outgoing_message: Pubkey::new_from_array(params.outgoing_message),
            gas_limit: params.gas_limit,
        })
    }
}

/// Decoded `bridge_sol` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSolData {
    pub salt: Salt,
    pub to: EvmAddress,
    pub amount: u64,
    pub call: Option<ContractCall>,
}

impl BridgeSolData {
    pub fn unpack(data: &[u8]) -> Result<Self> {
        if data.len() < BRIDGE_SOL_FIXED_LEN + 1 {
            return Err(malformed("bridge_sol", format!("length {}", data.len())));
        }
        let body = strip_discriminator(data, &BRIDGE_SOL_DISCRIMINATOR, "bridge_sol")?;
        let (fixed, descriptor) = body.split_at(BRIDGE_SOL_FIXED_LEN - 8);
        let params = BridgeSolParams::try_from_slice(fixed)
            .map_err(|e| malformed("bridge_sol", e.to_string()))?;

        let call = match descriptor {
            [NO_CALL] => None,
            [h0, h1, rest @ ..] if [*h0, *h1] == CALL_HEADER => {
                let call = CallParams::try_from_slice(rest)
                    .map_err(|e| malformed("call descriptor", e.to_string()))?;
                Some(ContractCall::new(EvmAddress::new(call.target), call.value, call.data))
            }
            _ => return Err(malformed("call descriptor", "unknown header".to_string())),
        };

        Ok(Self {
            salt: Salt::from_bytes(params.salt),
            to: EvmAddress::new(params.to),
            amount: params.amount,
            call,
        })
    }
}

fn strip_discriminator<'a>(data: &'a [u8], expected: &[u8; 8], what: &str) -> Result<&'a [u8]> {
    let (discriminator, body) = data.split_at(8);
    if discriminator != expected {
        return Err(malformed(what, "discriminator mismatch".to_string()));
    }
    Ok(body)
}

fn malformed(what: &str, detail: String) -> BridgeError {
    BridgeError::Encoding(format!("malformed {} data: {}", what, detail))
}

// ── Instruction Builders ────────────────────────────────────────────────────

/// Pay the relayer to deliver the message recorded at `outgoing_message`.
///
/// Accounts:
///   0. `[signer, writable]` payer
///   1. `[writable]` relayer config PDA
///   2. `[writable]` gas fee receiver
///   3. `[writable]` message_to_relay PDA
///   4. `[]` system_program
pub fn create_pay_for_relay_instruction(
    profile: &NetworkProfile,
    addresses: &BridgeAddresses,
    payer: &Pubkey,
    salt: &Salt,
    gas_limit: u64,
) -> Result<Instruction> {
    addresses.ensure_profile(profile)?;
    let data = encode_pay_for_relay(salt, &addresses.outgoing_message, gas_limit)?;

    Ok(Instruction {
        program_id: profile.relayer_program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(addresses.relayer_config, false),
            AccountMeta::new(profile.gas_fee_receiver, false),
            AccountMeta::new(addresses.message_to_relay, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    })
}

/// Lock SOL in the bridge vault and record the outgoing message.
///
/// Accounts:
///   0. `[signer, writable]` payer
///   1. `[signer, writable]` from (the payer again)
///   2. `[writable]` gas fee receiver
///   3. `[writable]` sol_vault PDA
///   4. `[writable]` bridge PDA
///   5. `[writable]` outgoing_message PDA
///   6. `[]` system_program
pub fn create_bridge_sol_instruction(
    profile: &NetworkProfile,
    addresses: &BridgeAddresses,
    payer: &Pubkey,
    salt: &Salt,
    to: &EvmAddress,
    amount: u64,
    call: Option<&ContractCall>,
) -> Result<Instruction> {
    addresses.ensure_profile(profile)?;
    let data = encode_bridge_sol(salt, to, amount, call)?;

    Ok(Instruction {
        program_id: profile.bridge_program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(*payer, true),
            AccountMeta::new(profile.gas_fee_receiver, false),
            AccountMeta::new(addresses.sol_vault, false),
            AccountMeta::new(addresses.bridge, false),
            AccountMeta::new(addresses.outgoing_message, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data,
    })
}

/// Index of the outgoing_message PDA in the `bridge_sol` account list.
pub const BRIDGE_SOL_OUTGOING_MESSAGE_INDEX: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;

    fn salt() -> Salt {
        Salt::from_bytes([0x11; 32])
    }

    fn dest() -> EvmAddress {
        EvmAddress::new([0xAB; 20])
    }

    #[test]
    fn pay_for_relay_layout() {
        let outgoing = Pubkey::new_from_array([0x22; 32]);
        let data = encode_pay_for_relay(&salt(), &outgoing, 300_000).unwrap();
        assert_eq!(data.len(), 80);
        assert_eq!(&data[..8], &PAY_FOR_RELAY_DISCRIMINATOR);
        assert_eq!(&data[8..40], &[0x11; 32]);
        assert_eq!(&data[40..72], &[0x22; 32]);
        assert_eq!(&data[72..], &300_000u64.to_le_bytes());
    }

    #[test]
    fn bridge_sol_without_call() {
        let data = encode_bridge_sol(&salt(), &dest(), 5_000_000, None).unwrap();
        assert_eq!(data.len(), 69);
        assert_eq!(&data[..8], &BRIDGE_SOL_DISCRIMINATOR);
        assert_eq!(&data[8..40], &[0x11; 32]);
        assert_eq!(&data[40..60], &[0xAB; 20]);
        assert_eq!(&data[60..68], &5_000_000u64.to_le_bytes());
        assert_eq!(data[68], NO_CALL);
    }

    #[test]
    fn call_descriptor_layout() {
        let call = ContractCall::new(EvmAddress::new([0xCD; 20]), 1u128 << 70, vec![0xd0, 0x9d, 0xe0, 0x8a]);
        let descriptor = encode_call_descriptor(Some(&call)).unwrap();
        assert_eq!(descriptor.len(), 2 + 20 + 16 + 4 + 4);
        assert_eq!(&descriptor[..2], &[0x01, 0x00]);
        assert_eq!(&descriptor[2..22], &[0xCD; 20]);
        assert_eq!(&descriptor[22..38], &(1u128 << 70).to_le_bytes());
        assert_eq!(&descriptor[38..42], &4u32.to_le_bytes());
        assert_eq!(&descriptor[42..], &[0xd0, 0x9d, 0xe0, 0x8a]);

        let data = encode_bridge_sol(&salt(), &call.target, 0, Some(&call)).unwrap();
        assert_eq!(data.len(), 68 + descriptor.len());
        assert_eq!(&data[68..], &descriptor[..]);
    }

    #[test]
    fn zero_amount_is_encoded() {
        let data = encode_bridge_sol(&salt(), &dest(), 0, None).unwrap();
        assert_eq!(&data[60..68], &[0u8; 8]);
    }

    #[test]
    fn payloads_reparse() {
        let outgoing = Pubkey::new_unique();
        let relay = PayForRelayData::unpack(&encode_pay_for_relay(&salt(), &outgoing, 42).unwrap()).unwrap();
        assert_eq!(relay.salt, salt());
        assert_eq!(relay.outgoing_message, outgoing);
        assert_eq!(relay.gas_limit, 42);

        let call = ContractCall::from_hex(&dest().to_string(), "0x60fe47b1", "0.5").unwrap();
        let bridged =
            BridgeSolData::unpack(&encode_bridge_sol(&salt(), &dest(), 3_600_000, Some(&call)).unwrap()).unwrap();
        assert_eq!(bridged.salt, salt());
        assert_eq!(bridged.to, dest());
        assert_eq!(bridged.amount, 3_600_000);
        assert_eq!(bridged.call, Some(call));

        let plain = BridgeSolData::unpack(&encode_bridge_sol(&salt(), &dest(), 1, None).unwrap()).unwrap();
        assert_eq!(plain.call, None);
    }

    #[test]
    fn unpack_rejects_foreign_payloads() {
        let mut data = encode_pay_for_relay(&salt(), &Pubkey::new_unique(), 1).unwrap();
        data[0] ^= 0xff;
        assert!(matches!(PayForRelayData::unpack(&data), Err(BridgeError::Encoding(_))));
        assert!(PayForRelayData::unpack(&data[..79]).is_err());

        let mut bridged = encode_bridge_sol(&salt(), &dest(), 1, None).unwrap();
        *bridged.last_mut().unwrap() = 0x07;
        assert!(BridgeSolData::unpack(&bridged).is_err());
    }

    #[test]
    fn builders_use_profile_program_ids() {
        let profile = NetworkProfile::devnet();
        let addresses = BridgeAddresses::derive(&profile, &salt());
        let payer = Pubkey::new_unique();

        let relay = create_pay_for_relay_instruction(&profile, &addresses, &payer, &salt(), 300_000).unwrap();
        assert_eq!(relay.program_id, profile.relayer_program_id);
        assert_eq!(relay.accounts.len(), 5);
        assert!(relay.accounts[0].is_signer && relay.accounts[0].is_writable);
        assert_eq!(relay.accounts[3].pubkey, addresses.message_to_relay);

        let bridge =
            create_bridge_sol_instruction(&profile, &addresses, &payer, &salt(), &dest(), 1, None).unwrap();
        assert_eq!(bridge.program_id, profile.bridge_program_id);
        assert_eq!(bridge.accounts.len(), 7);
        assert_eq!(bridge.accounts[BRIDGE_SOL_OUTGOING_MESSAGE_INDEX].pubkey, addresses.outgoing_message);
        assert!(!bridge.accounts[6].is_writable);
    }

    #[test]
    fn builders_reject_mixed_networks() {
        let addresses = BridgeAddresses::derive(&NetworkProfile::devnet(), &salt());
        let mainnet = NetworkProfile::mainnet();
        let payer = Pubkey::new_unique();
        assert!(matches!(
            create_pay_for_relay_instruction(&mainnet, &addresses, &payer, &salt(), 1),
            Err(BridgeError::NetworkMismatch { .. })
        ));
        assert!(matches!(
            create_bridge_sol_instruction(&mainnet, &addresses, &payer, &salt(), &dest(), 1, None),
            Err(BridgeError::NetworkMismatch { .. })
        ));
    }
}
