//! Bridge program IDs, PDA seeds, instruction discriminators, and default values.

use solana_program::pubkey::Pubkey;

// ── Program IDs ─────────────────────────────────────────────────────────────

/// Solana bridge program (devnet). Locks SOL and records outgoing messages.
pub const BRIDGE_PROGRAM_ID_DEVNET: Pubkey =
    solana_program::pubkey!("7c6mteAcTXaQ1MFBCrnuzoZVTTAEfZwa6wgy4bqX3KXC");

/// Solana bridge program (mainnet).
pub const BRIDGE_PROGRAM_ID_MAINNET: Pubkey =
    solana_program::pubkey!("HNCne2FkVaNghhjKXapxJzPaBvAKDG1Ge3gqhZyfVWLM");

/// Base relayer program (devnet, relays to Base Sepolia). Collects relay payments.
pub const RELAYER_PROGRAM_ID_DEVNET: Pubkey =
    solana_program::pubkey!("56MBBEYAtQAdjT4e1NzHD8XaoyRSTvfgbSVVcEcHj51H");

/// Base relayer program (mainnet).
pub const RELAYER_PROGRAM_ID_MAINNET: Pubkey =
    solana_program::pubkey!("g1et5VenhfJHJwsdJsDbxWZuotD5H4iELNG61kS4fb9");

// ── Gas Fee Receivers ───────────────────────────────────────────────────────

pub const GAS_FEE_RECEIVER_DEVNET: Pubkey =
    solana_program::pubkey!("AFs1LCbodhvwpgX3u3URLsud6R1XMSaMiQ5LtXw4GKYT");

pub const GAS_FEE_RECEIVER_MAINNET: Pubkey =
    solana_program::pubkey!("4m2jaKbJ4pDZw177BmLPMLsztPF5eVFo2fvxPgajdBNz");

// ── RPC Endpoints ───────────────────────────────────────────────────────────

pub const RPC_URL_DEVNET: &str = "https://api.devnet.solana.com";
pub const RPC_URL_MAINNET: &str = "https://api.mainnet-beta.solana.com";

// ── PDA Seeds ───────────────────────────────────────────────────────────────

// Bridge program, salted (one per message)
pub const OUTGOING_MESSAGE_SEED: &[u8] = b"outgoing_message";

// Relayer program, salted (message-to-relay)
pub const MESSAGE_TO_RELAY_SEED: &[u8] = b"mtr";

// Bridge program, singletons
pub const BRIDGE_SEED: &[u8] = b"bridge";
pub const SOL_VAULT_SEED: &[u8] = b"sol_vault";

// Relayer program, singleton
pub const RELAYER_CONFIG_SEED: &[u8] = b"config";

// ── Instruction Discriminators ──────────────────────────────────────────────
// These are an external protocol contract with the deployed on-chain programs,
// not derived values. Changing them requires a coordinated program upgrade.

/// Relayer program `pay_for_relay`.
pub const PAY_FOR_RELAY_DISCRIMINATOR: [u8; 8] = [41, 191, 218, 201, 250, 164, 156, 55];

/// Bridge program `bridge_sol`.
pub const BRIDGE_SOL_DISCRIMINATOR: [u8; 8] = [190, 190, 32, 158, 75, 153, 32, 86];

// ── Call Descriptor ─────────────────────────────────────────────────────────

/// Leading bytes of an embedded contract call. The first byte marks the call as
/// present; the second is reserved by the bridge program and must stay `0x00`.
pub const CALL_HEADER: [u8; 2] = [0x01, 0x00];

/// Single-byte descriptor for a plain value transfer (no contract call).
pub const NO_CALL: u8 = 0x00;

// ── Sizes ───────────────────────────────────────────────────────────────────

pub const SALT_LEN: usize = 32;
pub const EVM_ADDRESS_LEN: usize = 20;

/// discriminator(8) + salt(32) + outgoing_message(32) + gas_limit(8)
pub const PAY_FOR_RELAY_DATA_LEN: usize = 8 + 32 + 32 + 8;

/// discriminator(8) + salt(32) + to(20) + amount(8), call descriptor follows.
pub const BRIDGE_SOL_FIXED_LEN: usize = 8 + 32 + 20 + 8;

/// header(2) + target(20) + value(16) + data_len(4), call data follows.
pub const CALL_DESCRIPTOR_FIXED_LEN: usize = 2 + 20 + 16 + 4;

// ── Default Config Values ───────────────────────────────────────────────────

/// Gas limit paid for on the Base side of the relay.
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;

/// SOL decimals.
pub const SOL_DECIMALS: u32 = 9;

/// ETH decimals (value attached to a Base contract call).
pub const ETH_DECIMALS: u32 = 18;

/// Lamports per SOL (10^9).
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Poll interval used while waiting for a confirmation, in milliseconds.
pub const DEFAULT_CONFIRM_POLL_MS: u64 = 500;
