use {
    crate::{
        error::{CommError, Error},
        link::{Rx, SerialLink},
    },
    dxl_packet::{BROADCAST_ID, InstructionPacket, StatusPacket, recv},
    std::time::Duration,
};

/// How long to wait for each reply and how many times to try.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Policy {
    /// Read window for one status packet.
    pub timeout: Duration,
    /// Write+read cycles per transaction, counting the first.
    pub attempts: u8,
}

impl Policy {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);
    pub const DEFAULT_ATTEMPTS: u8 = 2;

    #[inline(always)]
    pub const fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }

    #[inline(always)]
    pub const fn with_attempts(self, attempts: u8) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            ..self
        }
    }
}

impl Default for Policy {
    #[inline(always)]
    fn default() -> Self {
        Self {
            timeout: Self::DEFAULT_TIMEOUT,
            attempts: Self::DEFAULT_ATTEMPTS,
        }
    }
}

/// One serial bus, one transaction at a time.
pub struct Bus<L: SerialLink> {
    link: L,
    policy: Policy,
}

impl<L: SerialLink> Bus<L> {
    #[inline(always)]
    pub const fn new(link: L, policy: Policy) -> Self {
        Self { link, policy }
    }

    #[inline(always)]
    pub const fn policy(&self) -> Policy {
        self.policy
    }

    #[inline(always)]
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy.with_attempts(policy.attempts);
    }

    #[inline(always)]
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Send `packet` and wait for its status packet, retrying lost or corrupted replies.
    ///
    /// Write failures and device-reported errors end the transaction immediately.
    pub fn execute(&mut self, packet: &InstructionPacket) -> Result<StatusPacket, Error> {
        if packet.id() == BROADCAST_ID {
            return Err(Error::Broadcast);
        }
        let bytes = packet.encode();
        let attempts = if packet.instruction().is_repeatable() {
            self.policy.attempts.max(1)
        } else {
            1
        };
        let mut attempt = 1;
        loop {
            match self.attempt(&bytes, packet.id()) {
                Ok(status) if status.error().is_ok() => return Ok(status),
                Ok(status) => {
                    return Err(Error::Device {
                        id: status.id(),
                        code: status.error(),
                    });
                }
                Err(Attempt::Fatal(e)) => return Err(e),
                Err(Attempt::Lost(kind)) if attempt < attempts => {
                    log::warn!(
                        "{} to ID {}: {kind}; retrying ({attempt}/{attempts})",
                        packet.instruction(),
                        packet.id(),
                    );
                    attempt += 1;
                }
                Err(Attempt::Lost(kind)) => {
                    return Err(Error::Comm {
                        kind,
                        attempts: attempt,
                    });
                }
            }
        }
    }

    fn attempt(&mut self, bytes: &[u8], id: u8) -> Result<StatusPacket, Attempt> {
        self.link
            .clear_input()
            .map_err(|e| Attempt::Fatal(Error::Write(e)))?;
        log::debug!("Sending {bytes:02X?}");
        self.link
            .write_all(bytes)
            .map_err(|e| Attempt::Fatal(Error::Write(e)))?;
        let mut rx = Rx::new(&mut self.link, self.policy.timeout);
        match recv::decode(&mut rx, id) {
            Ok(status) => {
                log::debug!("Received {status:02X?}");
                Ok(status)
            }
            Err(e) => Err(match CommError::classify(e) {
                Ok(kind) => Attempt::Lost(kind),
                Err(io) => Attempt::Fatal(Error::Read(io)),
            }),
        }
    }
}

enum Attempt {
    Lost(CommError),
    Fatal(Error),
}
