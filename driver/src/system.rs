//! Serial ports of the host operating system.

use {
    crate::link::{Ports, SerialLink},
    serialport::{ClearBuffer, SerialPort},
    std::{
        io::{self, Read, Write},
        time::Duration,
    },
};

/// Opened before the bus sets its own baud rate.
const INITIAL_BAUD: u32 = 57_600;

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemPorts;

impl SystemPorts {
    /// Names of the serial ports currently attached.
    #[inline]
    pub fn available() -> io::Result<Vec<String>> {
        Ok(serialport::available_ports()
            .map_err(io::Error::from)?
            .into_iter()
            .map(|info| info.port_name)
            .collect())
    }
}

impl Ports for SystemPorts {
    type Link = SystemLink;

    #[inline]
    fn open(&mut self, port: &str) -> io::Result<SystemLink> {
        let port = serialport::new(port, INITIAL_BAUD)
            .timeout(Duration::from_millis(1))
            .open()?;
        Ok(SystemLink(port))
    }
}

pub struct SystemLink(Box<dyn SerialPort>);

impl SerialLink for SystemLink {
    #[inline]
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        Ok(self.0.set_baud_rate(baud)?)
    }

    #[inline]
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.0.write_all(bytes)?;
        self.0.flush()
    }

    #[inline]
    fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.0.set_timeout(timeout)?;
        match self.0.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(0)
            }
            Err(e) => Err(e),
        }
    }

    #[inline]
    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.0.clear(ClearBuffer::Input)?)
    }
}
