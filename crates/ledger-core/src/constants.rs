pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
/// x and y coordinates of a secp256k1 point, without the SEC1 tag byte.
pub const PUBLIC_KEY_COORDS_SIZE: usize = 64;
pub const GENESIS_PREVIOUS_HASH: &str = "genesis";
pub const DEFAULT_DIFFICULTY: u32 = 3;
pub const MIN_DIFFICULTY: u32 = 2;
pub const MAX_DIFFICULTY: u32 = HASH_HEX_SIZE as u32;
pub const CANCEL_CHECK_INTERVAL: u64 = 1 << 12;
