use {
    crate::{
        bus::{Bus, Policy},
        error::Error,
        link::SerialLink,
    },
    dxl_packet::{
        InstructionPacket, constants,
        control_table::{self, Item, Value, Width, Writable},
    },
    paste::paste,
};

macro_rules! read_methods {
    ($($item:ident),* $(,)?) => {
        paste! {
            $(
                #[doc = "Read " $item " from device `id`."]
                #[inline(always)]
                pub fn [< read_ $item:snake >](
                    &mut self,
                    id: u8,
                ) -> Result<<control_table::$item as Item>::Value, Error> {
                    self.read::<control_table::$item>(id)
                }
            )*
        }
    };
}

macro_rules! write_methods {
    ($($item:ident),* $(,)?) => {
        paste! {
            $(
                #[doc = "Write " $item " on device `id`."]
                #[inline(always)]
                pub fn [< write_ $item:snake >](
                    &mut self,
                    id: u8,
                    value: <control_table::$item as Item>::Value,
                ) -> Result<(), Error> {
                    self.write::<control_table::$item>(id, value)
                }
            )*
        }
    };
}

/// Answer to a ping.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ping {
    pub model_number: u16,
    pub firmware_version: u8,
}

/// Register reads and writes on top of a [`Bus`].
pub struct RegisterClient<L: SerialLink> {
    bus: Bus<L>,
}

impl<L: SerialLink> RegisterClient<L> {
    #[inline(always)]
    pub const fn new(link: L, policy: Policy) -> Self {
        Self {
            bus: Bus::new(link, policy),
        }
    }

    #[inline(always)]
    pub fn bus_mut(&mut self) -> &mut Bus<L> {
        &mut self.bus
    }

    /// Write the low `width` bytes of `value` (little-endian) at `address`.
    #[inline]
    pub fn write_register(
        &mut self,
        id: u8,
        address: u16,
        width: Width,
        value: u32,
    ) -> Result<(), Error> {
        check_id(id)?;
        if !width.fits(value) {
            return Err(Error::width(value, width));
        }
        let bytes = value.to_le_bytes();
        let packet = InstructionPacket::write(id, address, &bytes[..usize::from(width.bytes())])?;
        let _ = self.bus.execute(&packet)?;
        Ok(())
    }

    /// Read `width` bytes at `address` as a little-endian integer.
    #[inline]
    pub fn read_register(&mut self, id: u8, address: u16, width: Width) -> Result<u32, Error> {
        check_id(id)?;
        let packet = InstructionPacket::read(id, address, width)?;
        let status = self.bus.execute(&packet)?;
        let parameters = status.parameters();
        let expected = usize::from(width.bytes());
        if parameters.len() != expected {
            return Err(Error::ShortRead {
                expected,
                actual: parameters.len(),
            });
        }
        let mut bytes = [0; 4];
        bytes[..expected].copy_from_slice(parameters);
        Ok(u32::from_le_bytes(bytes))
    }

    #[inline]
    pub fn read<I: Item>(&mut self, id: u8) -> Result<I::Value, Error> {
        let raw = self.read_register(id, I::ADDRESS, <I::Value as Value>::WIDTH)?;
        Ok(<I::Value as Value>::from_raw(raw))
    }

    #[inline]
    pub fn write<I: Writable>(&mut self, id: u8, value: I::Value) -> Result<(), Error> {
        self.write_register(id, I::ADDRESS, <I::Value as Value>::WIDTH, value.into())
    }

    #[inline]
    pub fn ping(&mut self, id: u8) -> Result<Ping, Error> {
        check_id(id)?;
        let status = self.bus.execute(&InstructionPacket::ping(id)?)?;
        match status.parameters() {
            &[lo, hi, firmware_version, ..] => Ok(Ping {
                model_number: u16::from_le_bytes([lo, hi]),
                firmware_version,
            }),
            short => Err(Error::ShortRead {
                expected: 3,
                actual: short.len(),
            }),
        }
    }

    read_methods!(
        ModelNumber,
        FirmwareVersion,
        Id,
        BaudRate,
        ReturnDelayTime,
        OperatingMode,
        TorqueEnable,
        Led,
        StatusReturnLevel,
        HardwareErrorStatus,
        ProfileAcceleration,
        ProfileVelocity,
        GoalPosition,
        Moving,
        PresentVelocity,
        PresentPosition,
        PresentInputVoltage,
        PresentTemperature,
    );

    write_methods!(
        Id,
        BaudRate,
        ReturnDelayTime,
        OperatingMode,
        TorqueEnable,
        Led,
        StatusReturnLevel,
        ProfileAcceleration,
        ProfileVelocity,
        GoalPosition,
    );
}

#[inline]
fn check_id(id: u8) -> Result<(), Error> {
    if constants::is_device_id(id) {
        Ok(())
    } else {
        Err(Error::InvalidId(id))
    }
}
