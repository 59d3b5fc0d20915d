//! Wire-level byte constants and frame sizes.

/// Marks the beginning of every frame, control or data.
pub const SYN: u8 = 0x16;
/// Line-arbitration request.
pub const ENQ: u8 = 0x05;
/// Piggyback / control: frame received intact.
pub const ACK: u8 = 0x06;
/// Piggyback / control: frame received corrupted.
pub const NAK: u8 = 0x15;
/// End-of-transmission, used for teardown.
pub const EOT: u8 = 0x04;
/// Start-of-text, alternating value A.
pub const DC1: u8 = 0x11;
/// Start-of-text, alternating value B.
pub const DC2: u8 = 0x12;

/// Piggyback byte meaning "no acknowledgement", distinct from NAK,
/// used only on an initiator's ENQ.
pub const NUL: u8 = 0x00;

/// Maximum payload bytes carried by a single data frame.
pub const PAYLOAD_LEN: usize = 1020;

/// Total size of a control frame: SYN, piggyback, code.
pub const CONTROL_FRAME_LEN: usize = 3;

/// Total size of a data frame: SYN, piggyback, SOT, payload, 2-byte CRC.
pub const DATA_FRAME_LEN: usize = 1 + 1 + 1 + PAYLOAD_LEN + 2;

/// Offset of the piggyback byte within either frame shape.
pub const PIGGYBACK_OFFSET: usize = 1;
/// Offset of the SOT byte within a data frame.
pub const SOT_OFFSET: usize = 2;
/// Offset of the first payload byte within a data frame.
pub const PAYLOAD_OFFSET: usize = 3;
/// Offset of the first CRC byte within a data frame.
pub const CRC_OFFSET: usize = PAYLOAD_OFFSET + PAYLOAD_LEN;

const _: () = assert!(DATA_FRAME_LEN == 1025);
