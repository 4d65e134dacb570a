use {
    dxl_packet::{
        ErrorCode,
        control_table::Width,
        parse::{Mismatch8, Mismatch16},
        recv::DecodeError,
        send::BuildError,
    },
    std::io,
    thiserror::Error,
};

/// Why a status packet never arrived intact.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum CommError {
    #[error("timed out partway through a status packet")]
    Timeout,
    #[error("no status packet header arrived")]
    Framing,
    #[error("status packet failed its CRC check: {0}")]
    CrcMismatch(Mismatch16),
    #[error("only another device answered: {0}")]
    IdMismatch(Mismatch8),
}

impl CommError {
    /// Split a decoding failure into a retryable communication error or a transport failure.
    #[inline]
    pub(crate) fn classify(error: DecodeError<io::Error>) -> Result<Self, io::Error> {
        match error {
            DecodeError::Framing => Ok(Self::Framing),
            DecodeError::Timeout => Ok(Self::Timeout),
            DecodeError::Crc(mismatch) => Ok(Self::CrcMismatch(mismatch)),
            DecodeError::IdMismatch(mismatch) => Ok(Self::IdMismatch(mismatch)),
            DecodeError::Stream(e) => Err(e),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorClass {
    /// The serial port itself failed; never retried.
    Transport,
    /// Frames were lost or corrupted; already retried as far as the policy allows.
    Communication,
    /// The device answered and rejected the request.
    Device,
    /// Rejected before any I/O.
    Precondition,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't open serial port `{port}`: {source}")]
    Open { port: String, source: io::Error },
    #[error("couldn't list serial ports: {0}")]
    Ports(#[source] io::Error),
    #[error("couldn't set the baud rate to {baud}: {source}")]
    Baud { baud: u32, source: io::Error },
    #[error("couldn't send an instruction packet: {0}")]
    Write(#[source] io::Error),
    #[error("couldn't receive a status packet: {0}")]
    Read(#[source] io::Error),
    #[error("{kind} (after {attempts} attempt(s))")]
    Comm { kind: CommError, attempts: u8 },
    #[error("device {id} reported error {code}")]
    Device { id: u8, code: ErrorCode },
    #[error("not connected")]
    Disconnected,
    #[error("torque must be enabled first")]
    TorqueRequired,
    #[error("{value} is out of range ({min}..={max})")]
    ValueRange { value: i64, min: i64, max: i64 },
    #[error("expected {expected} parameter byte(s) but received {actual}")]
    ShortRead { expected: usize, actual: usize },
    #[error("invalid device ID {0} (expected 0..=252)")]
    InvalidId(u8),
    #[error("broadcast packets get no status reply")]
    Broadcast,
    #[error("request expired before the bus was free")]
    Expired,
    #[error("the bus worker has stopped")]
    WorkerGone,
}

impl Error {
    #[inline]
    pub const fn class(&self) -> ErrorClass {
        match *self {
            Self::Open { .. }
            | Self::Ports(_)
            | Self::Baud { .. }
            | Self::Write(_)
            | Self::Read(_) => ErrorClass::Transport,
            Self::Comm { .. } | Self::ShortRead { .. } => ErrorClass::Communication,
            Self::Device { .. } => ErrorClass::Device,
            Self::Disconnected
            | Self::TorqueRequired
            | Self::ValueRange { .. }
            | Self::InvalidId(_)
            | Self::Broadcast
            | Self::Expired
            | Self::WorkerGone => ErrorClass::Precondition,
        }
    }

    #[inline]
    pub(crate) fn width(value: u32, width: Width) -> Self {
        Self::ValueRange {
            value: value.into(),
            min: 0,
            max: width.max_value().into(),
        }
    }
}

impl From<BuildError> for Error {
    #[inline]
    fn from(error: BuildError) -> Self {
        match error {
            BuildError::InvalidId(id) => Self::InvalidId(id),
            BuildError::TooManyParameters(n) => Self::ValueRange {
                value: n as i64,
                min: 0,
                max: i64::from(u16::MAX - dxl_packet::constants::LENGTH_OVERHEAD),
            },
        }
    }
}
