/// Two sync bytes, the frame-start byte, and the reserved byte.
pub const HEADER: [u8; 4] = [0xFF, 0xFF, 0xFD, 0x00];

pub const MIN_ID: u8 = 0;
pub const MAX_ID: u8 = 252;
pub const BROADCAST_ID: u8 = 0xFE;

/// Instruction byte that devices put in front of the error byte of every status packet.
pub const STATUS: u8 = 0x55;

/// Bytes counted by the length field on top of the parameters:
/// the instruction (or error) byte and both CRC bytes.
pub const LENGTH_OVERHEAD: u16 = 3;

#[inline(always)]
pub const fn is_device_id(id: u8) -> bool {
    id <= MAX_ID
}

#[inline(always)]
pub const fn is_valid_id(id: u8) -> bool {
    is_device_id(id) || id == BROADCAST_ID
}
