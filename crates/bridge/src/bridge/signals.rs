//! AXI channel signal bundles.
//!
//! One [`AxiInputs`] is sampled per tick from the bus master (the RTL model or the
//! upstream adapter); one [`AxiOutputs`] is what the engine drives back. Field names
//! follow the AXI channel/signal naming (`ar`, `aw`, `w`, `r`, `b`).

/// An address channel (AR or AW).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddrChannel {
    /// Master has a valid address phase on the channel.
    pub valid: bool,
    /// Start address of the burst.
    pub addr: u64,
    /// Transaction id.
    pub id: u64,
    /// Beat size exponent: each beat carries `1 << size` bytes.
    pub size: u64,
    /// Burst length minus one: the burst has `len + 1` beats.
    pub len: u64,
}

impl AddrChannel {
    /// A valid address phase.
    pub const fn request(addr: u64, id: u64, size: u64, len: u64) -> Self {
        Self {
            valid: true,
            addr,
            id,
            size,
            len,
        }
    }

    /// Bytes per beat.
    #[inline]
    pub const fn beat_bytes(&self) -> u64 {
        1 << self.size
    }

    /// Beats in the burst. Saturates for a `len` no burst can have.
    #[inline]
    pub const fn beats(&self) -> u64 {
        self.len.saturating_add(1)
    }

    /// Total bytes moved by the burst.
    #[inline]
    pub const fn burst_bytes(&self) -> u64 {
        self.beats() << self.size
    }
}

/// The write data channel (W).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteChannel {
    /// Master has a valid data beat on the channel.
    pub valid: bool,
    /// Byte enables; bit `i` enables `data[i]`.
    pub strb: u128,
    /// Beat data, lowest address first.
    pub data: Vec<u8>,
    /// Final beat of the burst.
    pub last: bool,
}

impl WriteChannel {
    /// A valid beat with every byte of `data` enabled.
    pub fn beat(data: Vec<u8>, last: bool) -> Self {
        Self {
            valid: true,
            strb: full_strobe(data.len() as u64),
            data,
            last,
        }
    }

    /// Returns `true` if byte lane `lane` is enabled.
    #[inline]
    pub const fn lane_enabled(&self, lane: u64) -> bool {
        lane < 128 && (self.strb >> lane) & 1 == 1
    }
}

/// Strobe mask enabling the low `bytes` lanes.
pub const fn full_strobe(bytes: u64) -> u128 {
    if bytes >= 128 {
        u128::MAX
    } else {
        (1u128 << bytes) - 1
    }
}

/// Everything the master drives on one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxiInputs {
    /// Synchronous, level-sensitive reset.
    pub reset: bool,
    /// Read address channel.
    pub ar: AddrChannel,
    /// Write address channel.
    pub aw: AddrChannel,
    /// Write data channel.
    pub w: WriteChannel,
    /// Master accepts a read data beat.
    pub r_ready: bool,
    /// Master accepts a write response.
    pub b_ready: bool,
}

impl AxiInputs {
    /// Reset asserted, every channel idle.
    pub fn reset() -> Self {
        Self {
            reset: true,
            ..Self::default()
        }
    }

    /// No valid asserted, both response channels ready.
    pub fn idle() -> Self {
        Self {
            r_ready: true,
            b_ready: true,
            ..Self::default()
        }
    }
}

/// Everything the engine drives on one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AxiOutputs {
    /// Read address accepted this tick if valid.
    pub ar_ready: bool,
    /// Write address accepted this tick if valid.
    pub aw_ready: bool,
    /// Write data beat accepted this tick if valid.
    pub w_ready: bool,
    /// A read data beat is presented.
    pub r_valid: bool,
    /// Id of the presented read beat.
    pub r_id: u64,
    /// Data of the presented read beat.
    pub r_data: Vec<u8>,
    /// The presented read beat is the last of its burst.
    pub r_last: bool,
    /// Read response code.
    pub r_resp: u64,
    /// A write response is presented.
    pub b_valid: bool,
    /// Id of the presented write response.
    pub b_id: u64,
    /// Write response code.
    pub b_resp: u64,
}

impl AxiOutputs {
    /// A read beat completes this tick under `inputs`.
    pub const fn r_fire(&self, inputs: &AxiInputs) -> bool {
        self.r_valid && inputs.r_ready
    }

    /// A write response completes this tick under `inputs`.
    pub const fn b_fire(&self, inputs: &AxiInputs) -> bool {
        self.b_valid && inputs.b_ready
    }

    /// A read address handshake completes this tick under `inputs`.
    pub const fn ar_fire(&self, inputs: &AxiInputs) -> bool {
        self.ar_ready && inputs.ar.valid
    }

    /// A write address handshake completes this tick under `inputs`.
    pub const fn aw_fire(&self, inputs: &AxiInputs) -> bool {
        self.aw_ready && inputs.aw.valid
    }

    /// A write data handshake completes this tick under `inputs`.
    pub const fn w_fire(&self, inputs: &AxiInputs) -> bool {
        self.w_ready && inputs.w.valid
    }
}
