#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod constants;
pub mod control_table;
pub mod crc;
pub mod instruction;
pub mod parse;
pub mod recv;
pub mod send;
pub mod stream;

#[cfg(test)]
mod test_util;

pub use {
    constants::{BROADCAST_ID, MAX_ID, MIN_ID},
    instruction::Instruction,
    recv::{ErrorCode, StatusPacket},
    send::InstructionPacket,
};
