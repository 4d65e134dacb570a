pub mod bus;
pub mod client;
pub mod error;
pub mod link;
pub mod session;
#[cfg(feature = "serialport")]
pub mod system;
pub mod worker;

#[cfg(test)]
mod test_util;

pub use {
    bus::{Bus, Policy},
    client::{Ping, RegisterClient},
    error::{CommError, Error, ErrorClass},
    link::{Ports, SerialLink},
    session::{Session, State},
    worker::{Handle, Pending},
};

pub type Result<T, E = Error> = core::result::Result<T, E>;
