//! A thread that owns one [`Session`] and runs requests against it in order.
//!
//! Callers that mustn't block (an interactive shell, a UI) hand requests to
//! the worker and collect each answer later through its [`Pending`] slot.

use {
    crate::{
        client::Ping,
        error::Error,
        link::Ports,
        session::{Session, State},
    },
    crossbeam_channel::{Receiver, RecvTimeoutError, Sender},
    std::{
        thread::{self, JoinHandle},
        time::{Duration, Instant},
    },
};

type Job<P> = Box<dyn FnOnce(Option<&mut Session<P>>) + Send>;

struct Request<P: Ports> {
    deadline: Option<Instant>,
    job: Job<P>,
}

/// Answer to one request, filled in by the worker.
#[must_use = "requests run regardless, but their errors are only visible here"]
pub struct Pending<T>(Receiver<Result<T, Error>>);

impl<T> Pending<T> {
    /// Block until the worker answers.
    #[inline]
    pub fn wait(self) -> Result<T, Error> {
        self.0.recv().unwrap_or(Err(Error::WorkerGone))
    }

    /// Block for at most `timeout`; `None` if the worker hasn't answered yet.
    #[inline]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, Error>> {
        match self.0.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(Error::WorkerGone)),
        }
    }
}

pub struct Handle<P: Ports> {
    sender: Option<Sender<Request<P>>>,
    thread: Option<JoinHandle<Session<P>>>,
}

/// Move `session` onto its own thread.
pub fn spawn<P>(session: Session<P>) -> Handle<P>
where
    P: Ports + Send + 'static,
    P::Link: Send,
{
    let (sender, receiver) = crossbeam_channel::unbounded::<Request<P>>();
    let thread = thread::spawn(move || run(session, &receiver));
    Handle {
        sender: Some(sender),
        thread: Some(thread),
    }
}

fn run<P: Ports>(mut session: Session<P>, receiver: &Receiver<Request<P>>) -> Session<P> {
    for Request { deadline, job } in receiver {
        match deadline {
            Some(deadline) if Instant::now() > deadline => {
                log::warn!("Skipping a request that expired while queued");
                job(None);
            }
            _ => job(Some(&mut session)),
        }
    }
    session.disconnect();
    session
}

impl<P> Handle<P>
where
    P: Ports + Send + 'static,
    P::Link: Send,
{
    /// Queue `f`. If `deadline` passes before the worker reaches it, `f` never runs
    /// and the answer is [`Error::Expired`]. A request that has started always finishes.
    pub fn submit<T, F>(&self, deadline: Option<Instant>, f: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Session<P>) -> Result<T, Error> + Send + 'static,
    {
        let (reply, pending) = crossbeam_channel::bounded(1);
        let job: Job<P> = Box::new(move |session| {
            let result = match session {
                Some(session) => f(session),
                None => Err(Error::Expired),
            };
            // The caller may have stopped listening.
            let _ = reply.send(result);
        });
        if let Some(ref sender) = self.sender {
            // On failure the job (and its reply sender) is dropped, so `pending` reports `WorkerGone`.
            let _ = sender.send(Request { deadline, job });
        }
        Pending(pending)
    }

    #[inline]
    pub fn connect(&self, port: impl Into<String>, baud: u32) -> Pending<()> {
        let port = port.into();
        self.submit(None, move |session| session.connect(&port, baud))
    }

    #[inline]
    pub fn disconnect(&self) -> Pending<()> {
        self.submit(None, |session| {
            session.disconnect();
            Ok(())
        })
    }

    #[inline]
    pub fn set_id(&self, id: u8) -> Pending<()> {
        self.submit(None, move |session| session.set_id(id))
    }

    #[inline]
    pub fn set_torque(&self, enabled: bool) -> Pending<()> {
        self.submit(None, move |session| session.set_torque(enabled))
    }

    #[inline]
    pub fn toggle_torque(&self) -> Pending<()> {
        self.submit(None, Session::toggle_torque)
    }

    #[inline]
    pub fn write_goal_position(&self, position: u32) -> Pending<()> {
        self.submit(None, move |session| session.write_goal_position(position))
    }

    #[inline]
    pub fn read_present_position(&self) -> Pending<u32> {
        self.submit(None, Session::read_present_position)
    }

    #[inline]
    pub fn ping(&self) -> Pending<Ping> {
        self.submit(None, Session::ping)
    }

    #[inline]
    pub fn state(&self) -> Pending<State> {
        self.submit(None, |session| Ok(session.state()))
    }

    #[inline]
    pub fn id(&self) -> Pending<u8> {
        self.submit(None, |session| Ok(session.id()))
    }
}

impl<P: Ports> Handle<P> {
    /// Finish every queued request, disconnect, and hand the session back.
    pub fn shutdown(mut self) -> Result<Session<P>, Error> {
        self.stop().ok_or(Error::WorkerGone)
    }

    fn stop(&mut self) -> Option<Session<P>> {
        drop(self.sender.take());
        self.thread.take()?.join().ok()
    }
}

impl<P: Ports> Drop for Handle<P> {
    #[inline]
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
