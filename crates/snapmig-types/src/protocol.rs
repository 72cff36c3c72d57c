//! Network-wide protocol constants.

/// Maximum token count of the network. Every full snapshot must conserve it.
pub const TOTAL_SUPPLY: u64 = 2_779_530_283_277_761;

/// Maximum number of outputs a single transaction may create.
pub const MAX_OUTPUTS_PER_GROUP: u16 = 127;

/// Length of a transaction identifier in bytes.
pub const TRANSACTION_ID_LENGTH: usize = 32;

/// Length of an output identifier: transaction id plus a u16 index.
pub const OUTPUT_ID_LENGTH: usize = TRANSACTION_ID_LENGTH + 2;
