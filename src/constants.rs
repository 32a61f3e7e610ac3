//! Relay policy constants

pub const ONE_KILOBYTE: u64 = 1_000;
pub const ONE_MEGABYTE: u64 = 1_000_000;
pub const ONE_GIGABYTE: u64 = 1_000_000_000;

/// Maximum money supply: 21,000,000 coins in satoshis
pub const MAX_MONEY: i64 = 21_000_000 * 100_000_000;

// ----------------------------------------------------------------------------
// Block size defaults before and after Genesis
// ----------------------------------------------------------------------------

pub const MAIN_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS: u64 = 2 * ONE_GIGABYTE;
pub const MAIN_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS: u64 = 4 * ONE_GIGABYTE - ONE_MEGABYTE;

pub const REGTEST_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS: u64 = 2 * ONE_GIGABYTE;
pub const REGTEST_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS: u64 = 4 * ONE_GIGABYTE - ONE_MEGABYTE;

pub const TESTNET_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS: u64 = 2 * ONE_GIGABYTE;
pub const TESTNET_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS: u64 = 4 * ONE_GIGABYTE - ONE_MEGABYTE;

pub const STN_DEFAULT_MAX_BLOCK_SIZE_BEFORE_GENESIS: u64 = 2 * ONE_GIGABYTE;
pub const STN_DEFAULT_MAX_BLOCK_SIZE_AFTER_GENESIS: u64 = 4 * ONE_GIGABYTE - ONE_MEGABYTE;

// ----------------------------------------------------------------------------
// Generated block size defaults and their activation times
// ----------------------------------------------------------------------------

/// 2019-07-24T14:00:00Z
pub const MAIN_NEW_BLOCKSIZE_ACTIVATION_TIME: u64 = 1_563_976_800;
pub const MAIN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE: u64 = 32 * ONE_MEGABYTE;
pub const MAIN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER: u64 = 128 * ONE_MEGABYTE;

/// 2019-07-24T14:00:00Z
pub const REGTEST_NEW_BLOCKSIZE_ACTIVATION_TIME: u64 = 1_563_976_800;
pub const REGTEST_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE: u64 = 32 * ONE_MEGABYTE;
pub const REGTEST_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER: u64 = 128 * ONE_MEGABYTE;

/// 2019-07-24T14:00:00Z
pub const TESTNET_NEW_BLOCKSIZE_ACTIVATION_TIME: u64 = 1_563_976_800;
pub const TESTNET_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE: u64 = 32 * ONE_MEGABYTE;
pub const TESTNET_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER: u64 = 128 * ONE_MEGABYTE;

/// 2019-05-20T14:00:00Z
pub const STN_NEW_BLOCKSIZE_ACTIVATION_TIME: u64 = 1_558_360_800;
pub const STN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_BEFORE: u64 = 32 * ONE_MEGABYTE;
pub const STN_DEFAULT_MAX_GENERATED_BLOCK_SIZE_AFTER: u64 = 128 * ONE_MEGABYTE;

// ----------------------------------------------------------------------------
// Consensus limits the policy values are derived from
// ----------------------------------------------------------------------------

pub const MAX_BLOCK_SIGOPS_PER_MB_BEFORE_GENESIS: u64 = 20_000;
pub const MAX_TX_SIGOPS_COUNT_BEFORE_GENESIS: u64 = MAX_BLOCK_SIGOPS_PER_MB_BEFORE_GENESIS;
pub const MAX_SCRIPT_SIZE_BEFORE_GENESIS: u64 = 10_000;
pub const MAX_OPS_PER_SCRIPT_BEFORE_GENESIS: u64 = 500;
pub const MAX_SCRIPT_NUM_LENGTH_BEFORE_GENESIS: u64 = 4;
pub const MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS: u64 = 20;

// ----------------------------------------------------------------------------
// Standardness policy
// ----------------------------------------------------------------------------

/// Highest transaction version relayed
pub const MAX_STANDARD_VERSION: i32 = 2;

/// Largest transaction relayed or mined before Genesis
pub const MAX_TX_SIZE_POLICY_BEFORE_GENESIS: u64 = 100_000 - 1;
pub const DEFAULT_MAX_TX_SIZE_POLICY_AFTER_GENESIS: u64 = MAX_TX_SIZE_POLICY_BEFORE_GENESIS;

/// Largest sigop count relayed or mined in a single transaction before Genesis
pub const MAX_TX_SIGOPS_COUNT_POLICY_BEFORE_GENESIS: u64 = MAX_TX_SIGOPS_COUNT_BEFORE_GENESIS / 5;
pub const DEFAULT_TX_SIGOPS_COUNT_POLICY_AFTER_GENESIS: u64 = MAX_TX_SIGOPS_COUNT_POLICY_BEFORE_GENESIS;

/// Maximum signature operations in a standard P2SH redeem script
pub const MAX_P2SH_SIGOPS: u64 = 15;

/// Biggest standard scriptSig before Genesis: a 15-of-15 P2SH multisig with
/// compressed keys fits comfortably.
pub const MAX_STANDARD_SCRIPTSIG_SIZE_BEFORE_GENESIS: u64 = 1650;

pub const DEFAULT_MAX_SCRIPT_SIZE_POLICY_AFTER_GENESIS: u64 = MAX_SCRIPT_SIZE_BEFORE_GENESIS;

/// Key bound for bare multisig outputs before Genesis (x-of-3)
pub const MAX_STANDARD_MULTISIG_KEYS_BEFORE_GENESIS: u64 = 3;
pub const DEFAULT_PUBKEYS_PER_MULTISIG_POLICY_AFTER_GENESIS: u64 = MAX_PUBKEYS_PER_MULTISIG_BEFORE_GENESIS;

/// Post-Genesis script execution limits handed to the interpreter layer
pub const DEFAULT_OPS_PER_SCRIPT_POLICY_AFTER_GENESIS: u64 = MAX_OPS_PER_SCRIPT_BEFORE_GENESIS;
pub const DEFAULT_STACK_MEMORY_USAGE_POLICY_AFTER_GENESIS: u64 = 100 * ONE_MEGABYTE;
pub const DEFAULT_SCRIPT_NUM_LENGTH_POLICY_AFTER_GENESIS: u64 = 250 * ONE_KILOBYTE;
pub const DEFAULT_MAX_BLOCK_SIGOPS_PER_MB_POLICY_AFTER_GENESIS: u64 = MAX_BLOCK_SIGOPS_PER_MB_BEFORE_GENESIS;

/// Blocks on either side of the Genesis activation height during which
/// scripts standard on only one side are tolerated
pub const DEFAULT_GENESIS_GRACEFUL_ACTIVATION_PERIOD: u64 = 72;
pub const MAX_GENESIS_GRACEFUL_ACTIVATION_PERIOD: u64 = 7200;

/// 220 bytes of data, +1 for OP_RETURN, +2 for the pushdata opcodes
pub const DEFAULT_DATA_CARRIER_SIZE: u64 = 223;

// ----------------------------------------------------------------------------
// Fee and mempool defaults
// ----------------------------------------------------------------------------

/// Block space reserved for high priority transactions, in percent
pub const DEFAULT_BLOCK_PRIORITY_PERCENTAGE: u64 = 5;

/// Minimum fee rate (sat/kB) for transactions in generated blocks
pub const DEFAULT_BLOCK_MIN_TX_FEE: i64 = 1000;

/// Mempool memory budget, in megabytes
pub const DEFAULT_MAX_MEMPOOL_SIZE: u64 = 300;
pub const DEFAULT_MAX_NONFINAL_MEMPOOL_SIZE: u64 = 50;

/// Minimum fee rate increase (sat/kB) for mempool limiting and replacement
pub const MEMPOOL_FULL_FEE_INCREMENT: i64 = 1000;

/// Fee rate (sat/kB) that defines dust
pub const DUST_RELAY_TX_FEE: i64 = 1000;

/// Bytes charged per signature operation when sizing for fees
pub const DEFAULT_BYTES_PER_SIGOP: u64 = 20;

/// Size of a typical input spending an output, added to the output size when
/// pricing dust: outpoint 36, script length 1, signature push 107, sequence 4.
pub const DUST_SPEND_INPUT_SIZE: u64 = 32 + 4 + 1 + 107 + 4;

/// Multiplier applied to the spend cost when deriving the dust threshold
pub const DUST_FEE_MULTIPLIER: i64 = 3;

/// Outpoint index marking a coinbase input
pub const COINBASE_PREVOUT_INDEX: u32 = 0xffffffff;

/// Height recorded on coins created by transactions still in the mempool
pub const MEMPOOL_HEIGHT: u64 = 0x7fff_ffff;
