use {
    crate::{
        constants::{HEADER, LENGTH_OVERHEAD, STATUS},
        crc::Crc,
        parse::{self, Mismatch8, Mismatch16},
        stream::{self, Stream},
    },
    alloc::vec::Vec,
};

/// Raw error byte of a status packet.
///
/// Meanings beyond the alert bit vary between models and firmware,
/// so the value is surfaced as-is.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorCode(pub u8);

impl ErrorCode {
    pub const ALERT: u8 = 0x80;

    #[inline(always)]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    /// The device flagged a hardware fault; details live in its Hardware Error Status register.
    #[inline(always)]
    pub const fn is_alert(self) -> bool {
        self.0 & Self::ALERT != 0
    }
}

impl core::fmt::Display for ErrorCode {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "x{:02X}", self.0)?;
        if self.is_alert() {
            write!(f, " (hardware alert)")?;
        }
        Ok(())
    }
}

/// A response frame that passed framing, CRC, and ID checks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusPacket {
    id: u8,
    error: ErrorCode,
    parameters: Vec<u8>,
}

impl StatusPacket {
    #[inline(always)]
    pub const fn id(&self) -> u8 {
        self.id
    }

    #[inline(always)]
    pub const fn error(&self) -> ErrorCode {
        self.error
    }

    #[inline(always)]
    pub fn parameters(&self) -> &[u8] {
        &self.parameters
    }

    #[inline(always)]
    pub fn into_parameters(self) -> Vec<u8> {
        self.parameters
    }

    /// Split off the `0x55` marker real devices send before the error byte.
    /// A marker with nothing after it isn't a status packet.
    #[inline]
    fn from_frame(frame: Frame) -> Option<Self> {
        let Frame {
            id,
            lead,
            mut parameters,
        } = frame;
        let error = if lead == STATUS {
            if parameters.is_empty() {
                return None;
            }
            parameters.remove(0)
        } else {
            lead
        };
        Some(Self {
            id,
            error: ErrorCode(error),
            parameters,
        })
    }
}

/// Everything between the length field and the CRC, already checked against the CRC.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub id: u8,
    /// Instruction byte of a request, or error byte (or `0x55` marker) of a response.
    pub lead: u8,
    pub parameters: Vec<u8>,
}

/// Byte-at-a-time frame parser.
///
/// Noise before a header and frames whose length can't hold a lead byte and a CRC
/// are skipped silently; only a CRC mismatch is an error.
#[derive(Clone, Debug)]
pub enum Parser {
    Header { matched: usize },
    Id,
    LengthLo { id: u8 },
    LengthHi { id: u8, length_lo: u8 },
    Body { id: u8, remaining: u16, body: Vec<u8>, crc: Crc },
    CrcLo { id: u8, body: Vec<u8>, expected: u16 },
    CrcHi { id: u8, body: Vec<u8>, expected: u16, crc_lo: u8 },
}

impl Default for Parser {
    #[inline(always)]
    fn default() -> Self {
        Self::INIT
    }
}

impl Parser {
    pub const INIT: Self = Self::Header { matched: 0 };

    /// Past the header, so running dry now means a truncated frame.
    #[inline]
    pub const fn in_frame(&self) -> bool {
        !matches!(*self, Self::Header { .. })
    }

    #[inline]
    const fn crc_init() -> Crc {
        let mut crc = Crc::new();
        crc.push_all(&HEADER);
        crc
    }
}

/// Longest prefix of the header that ends with `byte`, given `matched` bytes already matched.
#[inline]
const fn advance_header(matched: usize, byte: u8) -> usize {
    if byte == HEADER[matched] {
        matched + 1
    } else if byte == HEADER[0] {
        // `FF FF FF` still ends in two sync bytes.
        if matched == 2 { 2 } else { 1 }
    } else {
        0
    }
}

impl parse::State<u8> for Parser {
    type Output = Frame;
    type Error = Mismatch16;

    #[inline]
    fn push(self, input: u8) -> Result<parse::Status<Self::Output, Self>, Self::Error> {
        Ok(parse::Status::Incomplete(match self {
            Self::Header { matched } => match advance_header(matched, input) {
                n if n == HEADER.len() => Self::Id,
                matched => Self::Header { matched },
            },
            Self::Id => Self::LengthLo { id: input },
            Self::LengthLo { id } => Self::LengthHi {
                id,
                length_lo: input,
            },
            Self::LengthHi { id, length_lo } => {
                let length = u16::from_le_bytes([length_lo, input]);
                if length < LENGTH_OVERHEAD {
                    log::warn!("Discarding a frame with impossible length {length}");
                    return Ok(parse::Status::Incomplete(Self::INIT));
                }
                let mut crc = const { Self::crc_init() };
                crc.push(id);
                crc.push(length_lo);
                crc.push(input);
                let remaining = length - 2;
                Self::Body {
                    id,
                    remaining,
                    body: Vec::with_capacity(usize::from(remaining)),
                    crc,
                }
            }
            Self::Body {
                id,
                remaining,
                mut body,
                mut crc,
            } => {
                crc.push(input);
                body.push(input);
                if remaining == 1 {
                    Self::CrcLo {
                        id,
                        body,
                        expected: crc.collapse(),
                    }
                } else {
                    Self::Body {
                        id,
                        remaining: remaining - 1,
                        body,
                        crc,
                    }
                }
            }
            Self::CrcLo { id, body, expected } => Self::CrcHi {
                id,
                body,
                expected,
                crc_lo: input,
            },
            Self::CrcHi {
                id,
                mut body,
                expected,
                crc_lo,
            } => {
                let actual = u16::from_le_bytes([crc_lo, input]);
                if actual != expected {
                    return Err(Mismatch16 { expected, actual });
                }
                // The length check guarantees at least the lead byte.
                let lead = body.remove(0);
                return Ok(parse::Status::Complete(Frame {
                    id,
                    lead,
                    parameters: body,
                }));
            }
        }))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DecodeError<E> {
    #[error("no packet header arrived")]
    Framing,
    #[error("packet was cut short")]
    Timeout,
    #[error("CRC mismatch: {0}")]
    Crc(Mismatch16),
    #[error("only heard from another device: {0}")]
    IdMismatch(Mismatch8),
    #[error("transport failure while receiving: {0}")]
    Stream(E),
}

/// Read one status packet from `expected_id` out of `stream`.
///
/// Replies from other IDs are dropped and listening continues until the stream times out.
pub fn decode<S, E>(stream: &mut S, expected_id: u8) -> Result<StatusPacket, DecodeError<E>>
where
    S: Stream<Item = Result<u8, stream::Error<E>>>,
{
    let mut parser = Parser::INIT;
    let mut stale: Option<Mismatch8> = None;
    loop {
        let byte = match stream.next() {
            Ok(byte) => byte,
            Err(stream::Error::Io(e)) => return Err(DecodeError::Stream(e)),
            Err(stream::Error::TimedOut) => {
                return Err(if parser.in_frame() {
                    DecodeError::Timeout
                } else if let Some(mismatch) = stale {
                    DecodeError::IdMismatch(mismatch)
                } else {
                    DecodeError::Framing
                });
            }
        };
        parser = match parse::State::push(parser, byte).map_err(DecodeError::Crc)? {
            parse::Status::Incomplete(updated) => updated,
            parse::Status::Complete(frame) => {
                if frame.id != expected_id {
                    log::warn!(
                        "Discarding a status packet from ID {} while waiting for ID {}",
                        frame.id,
                        expected_id,
                    );
                    stale = Some(Mismatch8 {
                        expected: expected_id,
                        actual: frame.id,
                    });
                    Parser::INIT
                } else if let Some(status) = StatusPacket::from_frame(frame) {
                    return Ok(status);
                } else {
                    log::warn!("Discarding a status marker with no error byte");
                    Parser::INIT
                }
            }
        };
    }
}
