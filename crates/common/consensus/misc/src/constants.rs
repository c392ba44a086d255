//! Mainnet preset and consensus constants for phase0 through capella.

use alloy_primitives::{aliases::B32, fixed_bytes};

// Misc
pub const GENESIS_SLOT: u64 = 0;
pub const GENESIS_EPOCH: u64 = 0;
pub const FAR_FUTURE_EPOCH: u64 = u64::MAX;
pub const BASE_REWARDS_PER_EPOCH: u64 = 4;
pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;
pub const JUSTIFICATION_BITS_LENGTH: usize = 4;
pub const UINT64_MAX_SQRT: u64 = 4294967295;
pub const MAX_COMMITTEES_PER_SLOT: u64 = 64;
pub const TARGET_COMMITTEE_SIZE: u64 = 128;
pub const MAX_VALIDATORS_PER_COMMITTEE: u64 = 2048;
pub const SHUFFLE_ROUND_COUNT: u8 = 90;
pub const MAX_RANDOM_BYTE: u64 = 255;

// Withdrawal prefixes
pub const BLS_WITHDRAWAL_PREFIX: u8 = 0x00;
pub const ETH1_ADDRESS_WITHDRAWAL_PREFIX: u8 = 0x01;

// Domain types
pub const DOMAIN_BEACON_PROPOSER: B32 = fixed_bytes!("0x00000000");
pub const DOMAIN_BEACON_ATTESTER: B32 = fixed_bytes!("0x01000000");
pub const DOMAIN_RANDAO: B32 = fixed_bytes!("0x02000000");
pub const DOMAIN_DEPOSIT: B32 = fixed_bytes!("0x03000000");
pub const DOMAIN_VOLUNTARY_EXIT: B32 = fixed_bytes!("0x04000000");
pub const DOMAIN_SYNC_COMMITTEE: B32 = fixed_bytes!("0x07000000");
pub const DOMAIN_BLS_TO_EXECUTION_CHANGE: B32 = fixed_bytes!("0x0A000000");

// Gwei values
pub const MIN_DEPOSIT_AMOUNT: u64 = 1_000_000_000;
pub const MAX_EFFECTIVE_BALANCE: u64 = 32_000_000_000;
pub const EFFECTIVE_BALANCE_INCREMENT: u64 = 1_000_000_000;

// Hysteresis
pub const HYSTERESIS_QUOTIENT: u64 = 4;
pub const HYSTERESIS_DOWNWARD_MULTIPLIER: u64 = 1;
pub const HYSTERESIS_UPWARD_MULTIPLIER: u64 = 5;

// Time parameters
pub const MIN_ATTESTATION_INCLUSION_DELAY: u64 = 1;
pub const SLOTS_PER_EPOCH: u64 = 32;
pub const MIN_SEED_LOOKAHEAD: u64 = 1;
pub const MAX_SEED_LOOKAHEAD: u64 = 4;
pub const EPOCHS_PER_ETH1_VOTING_PERIOD: u64 = 64;
pub const SLOTS_PER_HISTORICAL_ROOT: u64 = 8192;
pub const MIN_EPOCHS_TO_INACTIVITY_PENALTY: u64 = 4;

// State list lengths
pub const EPOCHS_PER_HISTORICAL_VECTOR: u64 = 65536;
pub const EPOCHS_PER_SLASHINGS_VECTOR: u64 = 8192;
pub const HISTORICAL_ROOTS_LIMIT: u64 = 16_777_216;
pub const VALIDATOR_REGISTRY_LIMIT: u64 = 1_099_511_627_776;

// Rewards and penalties
pub const BASE_REWARD_FACTOR: u64 = 64;
pub const WHISTLEBLOWER_REWARD_QUOTIENT: u64 = 512;
pub const PROPOSER_REWARD_QUOTIENT: u64 = 8;
pub const INACTIVITY_PENALTY_QUOTIENT: u64 = 67_108_864;
pub const MIN_SLASHING_PENALTY_QUOTIENT: u64 = 128;
pub const PROPORTIONAL_SLASHING_MULTIPLIER: u64 = 1;
pub const INACTIVITY_PENALTY_QUOTIENT_ALTAIR: u64 = 50_331_648;
pub const MIN_SLASHING_PENALTY_QUOTIENT_ALTAIR: u64 = 64;
pub const PROPORTIONAL_SLASHING_MULTIPLIER_ALTAIR: u64 = 2;
pub const INACTIVITY_PENALTY_QUOTIENT_BELLATRIX: u64 = 16_777_216;
pub const MIN_SLASHING_PENALTY_QUOTIENT_BELLATRIX: u64 = 32;
pub const PROPORTIONAL_SLASHING_MULTIPLIER_BELLATRIX: u64 = 3;

// Max operations per block
pub const MAX_PROPOSER_SLASHINGS: u64 = 16;
pub const MAX_ATTESTER_SLASHINGS: u64 = 2;
pub const MAX_ATTESTATIONS: u64 = 128;
pub const MAX_DEPOSITS: u64 = 16;
pub const MAX_VOLUNTARY_EXITS: u64 = 16;
pub const MAX_BLS_TO_EXECUTION_CHANGES: u64 = 16;

// Sync committee
pub const SYNC_COMMITTEE_SIZE: u64 = 512;
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;

// Execution
pub const MAX_BYTES_PER_TRANSACTION: u64 = 1_073_741_824;
pub const MAX_TRANSACTIONS_PER_PAYLOAD: u64 = 1_048_576;
pub const BYTES_PER_LOGS_BLOOM: u64 = 256;
pub const MAX_EXTRA_DATA_BYTES: u64 = 32;
pub const MAX_WITHDRAWALS_PER_PAYLOAD: u64 = 16;
pub const MAX_VALIDATORS_PER_WITHDRAWALS_SWEEP: u64 = 16384;

// Participation flags
pub const TIMELY_SOURCE_FLAG_INDEX: u8 = 0;
pub const TIMELY_TARGET_FLAG_INDEX: u8 = 1;
pub const TIMELY_HEAD_FLAG_INDEX: u8 = 2;
pub const NUM_FLAG_INDICES: usize = 3;

// Incentivization weights
pub const TIMELY_SOURCE_WEIGHT: u64 = 14;
pub const TIMELY_TARGET_WEIGHT: u64 = 26;
pub const TIMELY_HEAD_WEIGHT: u64 = 14;
pub const SYNC_REWARD_WEIGHT: u64 = 2;
pub const PROPOSER_WEIGHT: u64 = 8;
pub const WEIGHT_DENOMINATOR: u64 = 64;

pub const PARTICIPATION_FLAG_WEIGHTS: [u64; NUM_FLAG_INDICES] = [
    TIMELY_SOURCE_WEIGHT,
    TIMELY_TARGET_WEIGHT,
    TIMELY_HEAD_WEIGHT,
];
