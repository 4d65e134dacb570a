use {
    crate::{
        bus::Policy,
        client::{Ping, RegisterClient},
        error::Error,
        link::{Ports, SerialLink},
    },
    dxl_packet::constants,
};

/// Valid goal positions: one revolution at 0.088 degrees per step.
pub const POSITION_MIN: u32 = 0;
pub const POSITION_MAX: u32 = 4095;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum State {
    Disconnected,
    Connected { torque_enabled: bool },
}

/// One addressed actuator behind one port, as seen by an operator.
pub struct Session<P: Ports> {
    ports: P,
    policy: Policy,
    id: u8,
    client: Option<RegisterClient<P::Link>>,
    torque_enabled: bool,
}

impl<P: Ports> Session<P> {
    #[inline]
    pub fn new(ports: P, policy: Policy, id: u8) -> Result<Self, Error> {
        Ok(Self {
            ports,
            policy,
            id: check_id(id)?,
            client: None,
            torque_enabled: false,
        })
    }

    #[inline]
    pub const fn state(&self) -> State {
        match self.client {
            None => State::Disconnected,
            Some(_) => State::Connected {
                torque_enabled: self.torque_enabled,
            },
        }
    }

    #[inline(always)]
    pub const fn torque_enabled(&self) -> bool {
        self.torque_enabled
    }

    #[inline(always)]
    pub const fn id(&self) -> u8 {
        self.id
    }

    /// Address another device. Its torque state is unknown, so the flag resets.
    #[inline]
    pub fn set_id(&mut self, id: u8) -> Result<(), Error> {
        let id = check_id(id)?;
        if id != self.id {
            if self.torque_enabled {
                log::info!("Addressing ID {id}; torque state of ID {} no longer applies", self.id);
            }
            self.id = id;
            self.torque_enabled = false;
        }
        Ok(())
    }

    #[inline(always)]
    pub const fn policy(&self) -> Policy {
        self.policy
    }

    #[inline]
    pub fn set_policy(&mut self, policy: Policy) {
        self.policy = policy.with_attempts(policy.attempts);
        if let Some(ref mut client) = self.client {
            client.bus_mut().set_policy(self.policy);
        }
    }

    /// Open `port` at `baud`, replacing any link already open.
    pub fn connect(&mut self, port: &str, baud: u32) -> Result<(), Error> {
        self.disconnect();
        let mut link = self.ports.open(port).map_err(|source| Error::Open {
            port: port.to_owned(),
            source,
        })?;
        link.set_baud_rate(baud)
            .map_err(|source| Error::Baud { baud, source })?;
        log::info!("Connected to {port} at {baud} baud");
        self.client = Some(RegisterClient::new(link, self.policy));
        Ok(())
    }

    /// Close the link if one is open. Torque is assumed off afterwards.
    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            log::info!("Disconnected");
        }
        self.torque_enabled = false;
    }

    pub fn set_torque(&mut self, enabled: bool) -> Result<(), Error> {
        let id = self.id;
        self.client()?.write_torque_enable(id, enabled.into())?;
        self.torque_enabled = enabled;
        log::info!(
            "Torque {} on ID {id}",
            if enabled { "enabled" } else { "disabled" },
        );
        Ok(())
    }

    #[inline]
    pub fn toggle_torque(&mut self) -> Result<(), Error> {
        self.set_torque(!self.torque_enabled)
    }

    /// Command a move. Torque is checked first, even without a link.
    pub fn write_goal_position(&mut self, position: u32) -> Result<(), Error> {
        if !self.torque_enabled {
            return Err(Error::TorqueRequired);
        }
        if !(POSITION_MIN..=POSITION_MAX).contains(&position) {
            return Err(Error::ValueRange {
                value: position.into(),
                min: POSITION_MIN.into(),
                max: POSITION_MAX.into(),
            });
        }
        let id = self.id;
        self.client()?.write_goal_position(id, position)
    }

    #[inline]
    pub fn read_present_position(&mut self) -> Result<u32, Error> {
        let id = self.id;
        self.client()?.read_present_position(id)
    }

    #[inline]
    pub fn ping(&mut self) -> Result<Ping, Error> {
        let id = self.id;
        self.client()?.ping(id)
    }

    /// Register access for everything the session doesn't wrap.
    #[inline]
    pub fn client(&mut self) -> Result<&mut RegisterClient<P::Link>, Error> {
        self.client.as_mut().ok_or(Error::Disconnected)
    }
}

#[inline]
fn check_id(id: u8) -> Result<u8, Error> {
    if constants::is_device_id(id) {
        Ok(id)
    } else {
        Err(Error::InvalidId(id))
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        crate::{
            ErrorClass,
            test_util::{MockPorts, Reply, Script},
        },
        dxl_packet::send::encode_status,
        std::time::Duration,
    };

    fn ack() -> Reply {
        Reply::Bytes(encode_status(1, 0, &[]).unwrap())
    }

    fn session(links: Vec<Script>) -> Session<MockPorts> {
        Session::new(
            MockPorts::new(links),
            Policy::default().with_timeout(Duration::from_millis(5)),
            1,
        )
        .unwrap()
    }

    fn connected(script: &Script) -> Session<MockPorts> {
        let mut session = session(vec![script.clone()]);
        session.connect("/dev/ttyUSB0", 57_600).unwrap();
        session
    }

    #[test]
    fn starts_disconnected() {
        let mut session = session(vec![]);
        assert_eq!(session.state(), State::Disconnected);
        assert!(matches!(session.ping(), Err(Error::Disconnected)));
        assert!(matches!(session.set_torque(true), Err(Error::Disconnected)));
        assert!(matches!(
            session.read_present_position(),
            Err(Error::Disconnected),
        ));
        assert!(!session.torque_enabled());
    }

    #[test]
    fn connect_sets_baud_rate() {
        let script = Script::new([]);
        let mut session = connected(&script);
        assert_eq!(
            session.state(),
            State::Connected {
                torque_enabled: false,
            },
        );
        assert_eq!(script.bauds(), [57_600]);
        assert_eq!(session.ports.opened, ["/dev/ttyUSB0"]);
        session.disconnect();
    }

    #[test]
    fn failed_open_stays_disconnected() {
        let mut session = session(vec![]);
        match session.connect("/dev/nonexistent", 57_600) {
            Err(e @ Error::Open { .. }) => assert_eq!(e.class(), ErrorClass::Transport),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(session.state(), State::Disconnected);
    }

    #[test]
    fn failed_baud_stays_disconnected() {
        let mut session = session(vec![Script::failing_baud()]);
        assert!(matches!(
            session.connect("/dev/ttyUSB0", 12_345),
            Err(Error::Baud { baud: 12_345, .. }),
        ));
        assert_eq!(session.state(), State::Disconnected);
    }

    #[test]
    fn reconnecting_replaces_the_link() {
        let first = Script::new([]);
        let second = Script::new([ack()]);
        let mut session = session(vec![first.clone(), second.clone()]);
        session.connect("/dev/ttyUSB0", 57_600).unwrap();
        session.connect("/dev/ttyUSB1", 1_000_000).unwrap();
        session.set_torque(true).unwrap();
        assert!(first.written().is_empty());
        assert_eq!(second.written().len(), 1);
        assert_eq!(second.bauds(), [1_000_000]);
    }

    #[test]
    fn disconnect_is_idempotent() {
        let script = Script::new([ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        session.disconnect();
        assert_eq!(session.state(), State::Disconnected);
        assert!(!session.torque_enabled());
        session.disconnect();
        assert_eq!(session.state(), State::Disconnected);
    }

    #[test]
    fn torque_on_sends_the_expected_bytes() {
        let script = Script::new([ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        assert_eq!(
            session.state(),
            State::Connected {
                torque_enabled: true,
            },
        );
        assert_eq!(
            script.written(),
            [vec![
                0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x06, 0x00, 0x03, 0x40, 0x00, 0x01, 0xDB, 0x66,
            ]],
        );
    }

    #[test]
    fn failed_torque_write_keeps_the_flag() {
        let script = Script::new([ack(), Reply::Bytes(encode_status(1, 0x04, &[]).unwrap())]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        assert!(matches!(
            session.set_torque(false),
            Err(Error::Device { id: 1, .. }),
        ));
        assert!(session.torque_enabled());
    }

    #[test]
    fn toggle_torque_flips() {
        let script = Script::new([ack(), ack()]);
        let mut session = connected(&script);
        session.toggle_torque().unwrap();
        assert!(session.torque_enabled());
        session.toggle_torque().unwrap();
        assert!(!session.torque_enabled());
        let written = script.written();
        assert_eq!(written.len(), 2);
        assert_eq!(written[0][10], 1);
        assert_eq!(written[1][10], 0);
    }

    #[test]
    fn goal_requires_torque_even_when_disconnected() {
        let mut session = session(vec![]);
        match session.write_goal_position(512) {
            Err(e @ Error::TorqueRequired) => assert_eq!(e.class(), ErrorClass::Precondition),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn goal_without_torque_sends_nothing() {
        let script = Script::new([]);
        let mut session = connected(&script);
        assert!(matches!(
            session.write_goal_position(512),
            Err(Error::TorqueRequired),
        ));
        assert!(script.written().is_empty());
    }

    #[test]
    fn goal_out_of_range() {
        let script = Script::new([ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        assert!(matches!(
            session.write_goal_position(4096),
            Err(Error::ValueRange {
                value: 4096,
                min: 0,
                max: 4095,
            }),
        ));
        assert_eq!(script.written().len(), 1);
    }

    #[test]
    fn goal_with_torque() {
        let script = Script::new([ack(), ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        session.write_goal_position(2048).unwrap();
        assert_eq!(
            script.written()[1],
            [
                0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x09, 0x00, 0x03, 0x74, 0x00, 0x00, 0x08, 0x00,
                0x00, 0x42, 0x89,
            ],
        );
    }

    #[test]
    fn read_position_with_torque_off() {
        let script = Script::new([Reply::Bytes(
            encode_status(1, 0, &[0x00, 0x08, 0x00, 0x00]).unwrap(),
        )]);
        let mut session = connected(&script);
        assert_eq!(session.read_present_position().unwrap(), 2048);
        assert!(!session.torque_enabled());
    }

    #[test]
    fn read_position_times_out_after_two_attempts() {
        let script = Script::new([]);
        let mut session = connected(&script);
        match session.read_present_position() {
            Err(e @ Error::Comm { attempts: 2, .. }) => {
                assert_eq!(e.class(), ErrorClass::Communication);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(script.written().len(), 2);
    }

    #[test]
    fn set_id_validates() {
        let mut session = session(vec![]);
        session.set_id(252).unwrap();
        assert_eq!(session.id(), 252);
        assert!(matches!(session.set_id(253), Err(Error::InvalidId(253))));
        assert_eq!(session.id(), 252);
        assert!(matches!(
            Session::new(MockPorts::default(), Policy::default(), 254),
            Err(Error::InvalidId(254)),
        ));
    }

    #[test]
    fn switching_devices_forgets_torque() {
        let script = Script::new([ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        session.set_id(2).unwrap();
        assert_eq!(
            session.state(),
            State::Connected {
                torque_enabled: false,
            },
        );
        assert!(matches!(
            session.write_goal_position(2048),
            Err(Error::TorqueRequired),
        ));
        assert_eq!(script.written().len(), 1);
    }

    #[test]
    fn same_id_keeps_torque() {
        let script = Script::new([ack()]);
        let mut session = connected(&script);
        session.set_torque(true).unwrap();
        session.set_id(1).unwrap();
        assert!(session.torque_enabled());
    }

    #[test]
    fn set_id_addresses_another_device() {
        let script = Script::new([Reply::Bytes(encode_status(2, 0, &[0x06, 0x04, 0x26]).unwrap())]);
        let mut session = connected(&script);
        session.set_id(2).unwrap();
        assert_eq!(session.ping().unwrap().model_number, 0x0406);
        assert_eq!(script.written()[0][4], 2);
    }

    #[test]
    fn policy_changes_reach_the_open_link() {
        let script = Script::new([]);
        let mut session = connected(&script);
        session.set_policy(session.policy().with_attempts(0));
        assert_eq!(session.policy().attempts, 1);
        assert!(matches!(
            session.read_present_position(),
            Err(Error::Comm { attempts: 1, .. }),
        ));
        assert_eq!(script.written().len(), 1);
    }
}
