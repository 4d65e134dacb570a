use {
    crate::{
        constants::{self, HEADER, LENGTH_OVERHEAD, STATUS},
        control_table::Width,
        crc::Crc,
        Instruction,
    },
    alloc::vec::Vec,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BuildError {
    #[error("invalid Dynamixel ID: {0} (devices use 0..=252, broadcast is 254)")]
    InvalidId(u8),
    #[error("{0} parameter bytes don't fit in a single packet")]
    TooManyParameters(usize),
}

/// A request frame, validated when built and immutable afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstructionPacket {
    id: u8,
    instruction: Instruction,
    parameters: Vec<u8>,
}

impl InstructionPacket {
    #[inline]
    pub fn new(id: u8, instruction: Instruction, parameters: Vec<u8>) -> Result<Self, BuildError> {
        if !constants::is_valid_id(id) {
            return Err(BuildError::InvalidId(id));
        }
        let _: u16 = length(parameters.len())?;
        Ok(Self {
            id,
            instruction,
            parameters,
        })
    }

    #[inline]
    pub fn ping(id: u8) -> Result<Self, BuildError> {
        Self::new(id, Instruction::Ping, Vec::new())
    }

    /// Parameters: `[address_lo, address_hi, width_lo, width_hi]`.
    #[inline]
    pub fn read(id: u8, address: u16, width: Width) -> Result<Self, BuildError> {
        let mut parameters = Vec::with_capacity(4);
        parameters.extend_from_slice(&address.to_le_bytes());
        parameters.extend_from_slice(&width.bytes().to_le_bytes());
        Self::new(id, Instruction::Read, parameters)
    }

    /// Parameters: `[address_lo, address_hi, data...]`.
    #[inline]
    pub fn write(id: u8, address: u16, data: &[u8]) -> Result<Self, BuildError> {
        let mut parameters = Vec::with_capacity(2 + data.len());
        parameters.extend_from_slice(&address.to_le_bytes());
        parameters.extend_from_slice(data);
        Self::new(id, Instruction::Write, parameters)
    }

    #[inline(always)]
    pub const fn id(&self) -> u8 {
        self.id
    }

    #[inline(always)]
    pub const fn instruction(&self) -> Instruction {
        self.instruction
    }

    #[inline(always)]
    pub fn parameters(&self) -> &[u8] {
        &self.parameters
    }

    #[inline]
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        self.encode_into(&mut buffer);
        buffer
    }

    /// Append the framed packet to `buffer`.
    #[inline]
    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        // Length was checked when the packet was built.
        let length = self.parameters.len() as u16 + LENGTH_OVERHEAD;
        frame(
            buffer,
            self.id,
            length,
            &[self.instruction.byte()],
            &self.parameters,
        );
    }
}

/// Frame a status packet the way a device would answer:
/// the `0x55` marker, the error byte, then `parameters`.
#[inline]
pub fn encode_status(id: u8, error: u8, parameters: &[u8]) -> Result<Vec<u8>, BuildError> {
    if !constants::is_valid_id(id) {
        return Err(BuildError::InvalidId(id));
    }
    let length = length(parameters.len() + 1)?;
    let mut buffer = Vec::new();
    frame(&mut buffer, id, length, &[STATUS, error], parameters);
    Ok(buffer)
}

#[inline]
fn length(n_parameters: usize) -> Result<u16, BuildError> {
    u16::try_from(n_parameters)
        .ok()
        .and_then(|n| n.checked_add(LENGTH_OVERHEAD))
        .ok_or(BuildError::TooManyParameters(n_parameters))
}

fn frame(buffer: &mut Vec<u8>, id: u8, length: u16, lead: &[u8], parameters: &[u8]) {
    let start = buffer.len();
    buffer.reserve(HEADER.len() + 3 + length as usize);
    buffer.extend_from_slice(&HEADER);
    buffer.push(id);
    buffer.extend_from_slice(&length.to_le_bytes());
    buffer.extend_from_slice(lead);
    buffer.extend_from_slice(parameters);
    let mut crc = Crc::new();
    crc.push_all(&buffer[start..]);
    buffer.extend_from_slice(&crc.collapse().to_le_bytes());
}
