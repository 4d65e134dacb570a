use {
    dxl_packet::stream::{self, Stream},
    std::{
        io,
        time::{Duration, Instant},
    },
};

/// Byte-level access to one half-duplex serial bus. Dropping the link closes it.
pub trait SerialLink {
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()>;

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read whatever is available within `timeout`; `Ok(0)` means nothing arrived in time.
    fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Drop bytes that arrived before the next request.
    #[inline]
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Whatever can hand out serial links by port name (`/dev/ttyUSB0`, `COM3`, ...).
pub trait Ports {
    type Link: SerialLink;

    fn open(&mut self, port: &str) -> io::Result<Self::Link>;
}

/// Bytes received from a link until a deadline.
pub(crate) struct Rx<'link, L: SerialLink> {
    link: &'link mut L,
    deadline: Instant,
    buffer: [u8; 64],
    start: usize,
    end: usize,
}

impl<'link, L: SerialLink> Rx<'link, L> {
    #[inline]
    pub(crate) fn new(link: &'link mut L, timeout: Duration) -> Self {
        Self {
            link,
            deadline: Instant::now() + timeout,
            buffer: [0; 64],
            start: 0,
            end: 0,
        }
    }
}

impl<L: SerialLink> Stream for Rx<'_, L> {
    type Item = Result<u8, stream::Error<io::Error>>;

    #[inline]
    fn next(&mut self) -> Self::Item {
        while self.start == self.end {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(stream::Error::TimedOut);
            }
            self.start = 0;
            self.end = match self.link.read(&mut self.buffer, remaining) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => 0,
                Err(e) => return Err(stream::Error::Io(e)),
            };
        }
        let byte = self.buffer[self.start];
        self.start += 1;
        Ok(byte)
    }
}
