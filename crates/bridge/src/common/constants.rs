//! Protocol constants.

/// Maximum number of beats in one AXI4 INCR burst (`len` is 8 bits, beats = len + 1).
pub const MAX_BURST_BEATS: u64 = 256;

/// Largest beat size exponent (`size` field) accepted on the address channels: 128 bytes.
pub const MAX_BEAT_SIZE_LOG2: u64 = 7;

/// Response code driven on `r_resp` / `b_resp`. The bridge only ever answers OKAY.
pub const RESP_OKAY: u64 = 0;

/// Number of distinct AXI ids the upstream adapter hands out per channel.
pub const DEFAULT_ID_POOL: u64 = 16;

/// Line an upstream flush waits on unless the adapter is told the configured line size.
pub const DEFAULT_FLUSH_LINE: u64 = 64;
