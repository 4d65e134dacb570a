use {
    crate::link::{Ports, SerialLink},
    std::{
        collections::VecDeque,
        io,
        sync::{Arc, Mutex, PoisonError},
        time::Duration,
    },
};

/// What the scripted device does after the next instruction packet.
#[derive(Clone, Debug)]
pub enum Reply {
    Bytes(Vec<u8>),
    Silence,
    WriteFails,
    ReadFails(io::ErrorKind),
}

#[derive(Debug, Default)]
struct Inner {
    replies: VecDeque<Reply>,
    pending: VecDeque<u8>,
    read_error: Option<io::ErrorKind>,
    written: Vec<Vec<u8>>,
    bauds: Vec<u32>,
    fail_baud: bool,
}

/// Scripted serial link. Clones share one script, so tests keep a handle after moving a link away.
#[derive(Clone, Debug, Default)]
pub struct Script(Arc<Mutex<Inner>>);

impl Script {
    pub fn new<I: IntoIterator<Item = Reply>>(replies: I) -> Self {
        Self(Arc::new(Mutex::new(Inner {
            replies: replies.into_iter().collect(),
            ..Inner::default()
        })))
    }

    pub fn failing_baud() -> Self {
        let script = Self::default();
        script.with(|inner| inner.fail_baud = true);
        script
    }

    pub fn written(&self) -> Vec<Vec<u8>> {
        self.with(|inner| inner.written.clone())
    }

    pub fn bauds(&self) -> Vec<u32> {
        self.with(|inner| inner.bauds.clone())
    }

    fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl SerialLink for Script {
    fn set_baud_rate(&mut self, baud: u32) -> io::Result<()> {
        self.with(|inner| {
            if inner.fail_baud {
                return Err(io::Error::new(io::ErrorKind::InvalidInput, "unsupported baud rate"));
            }
            inner.bauds.push(baud);
            Ok(())
        })
    }

    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.with(|inner| {
            match inner.replies.pop_front().unwrap_or(Reply::Silence) {
                Reply::WriteFails => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
                }
                Reply::Bytes(reply) => inner.pending.extend(reply),
                Reply::Silence => {}
                Reply::ReadFails(kind) => inner.read_error = Some(kind),
            }
            inner.written.push(bytes.to_vec());
            Ok(())
        })
    }

    fn read(&mut self, buffer: &mut [u8], timeout: Duration) -> io::Result<usize> {
        let n = self.with(|inner| {
            if let Some(kind) = inner.read_error.take() {
                return Err(io::Error::new(kind, "scripted read failure"));
            }
            let n = buffer.len().min(inner.pending.len());
            for (slot, byte) in buffer.iter_mut().zip(inner.pending.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        })?;
        if n == 0 {
            std::thread::sleep(timeout.min(Duration::from_millis(1)));
        }
        Ok(n)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.with(|inner| inner.pending.clear());
        Ok(())
    }
}

/// Ports that hand out scripted links in order.
#[derive(Debug, Default)]
pub struct MockPorts {
    pub links: VecDeque<Script>,
    pub opened: Vec<String>,
}

impl MockPorts {
    pub fn new<I: IntoIterator<Item = Script>>(links: I) -> Self {
        Self {
            links: links.into_iter().collect(),
            opened: vec![],
        }
    }
}

impl Ports for MockPorts {
    type Link = Script;

    fn open(&mut self, port: &str) -> io::Result<Script> {
        self.opened.push(port.to_owned());
        self.links
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such port"))
    }
}
