//! Protocol 2.0 control table of X-series actuators.
//!
//! Every register is a zero-sized type whose [`Item::Value`] fixes its width,
//! so a register can't be read or written with the wrong number of bytes.
//! [`ENTRIES`] mirrors the same table for lookups at runtime.

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Width {
    One = 1,
    Two = 2,
    Four = 4,
}

impl Width {
    #[inline(always)]
    pub const fn bytes(self) -> u16 {
        self as u16
    }

    /// Largest unsigned value representable in this many bytes.
    #[inline]
    pub const fn max_value(self) -> u32 {
        match self {
            Self::One => u8::MAX as u32,
            Self::Two => u16::MAX as u32,
            Self::Four => u32::MAX,
        }
    }

    #[inline]
    pub const fn fits(self, value: u32) -> bool {
        value <= self.max_value()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

pub trait Value: Copy + Into<u32> {
    const WIDTH: Width;

    /// Narrow a raw register value already known to fit in [`Self::WIDTH`].
    fn from_raw(raw: u32) -> Self;
}

macro_rules! value {
    ($ty:ty, $width:ident) => {
        impl Value for $ty {
            const WIDTH: Width = Width::$width;

            #[inline(always)]
            fn from_raw(raw: u32) -> Self {
                raw as $ty
            }
        }
    };
}

value!(u8, One);
value!(u16, Two);
value!(u32, Four);

pub trait Item {
    const ADDRESS: u16;
    const ACCESS: Access;
    const DESCRIPTION: &'static str;
    type Value: Value;
}

/// Registers the host may write.
pub trait Writable: Item {}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entry {
    pub name: &'static str,
    pub address: u16,
    pub width: Width,
    pub access: Access,
    pub description: &'static str,
}

macro_rules! items {
    (@access $name:ident ReadWrite) => {
        impl Writable for $name {}
    };
    (@access $name:ident ReadOnly) => {};
    ($($name:ident @ $address:literal: $value:ty, $access:ident, $description:literal;)*) => {
        $(
            #[derive(Clone, Copy, Debug, Default)]
            pub struct $name;

            impl Item for $name {
                const ADDRESS: u16 = $address;
                const ACCESS: Access = Access::$access;
                const DESCRIPTION: &'static str = $description;
                type Value = $value;
            }

            items!(@access $name $access);
        )*

        pub const ENTRIES: &[Entry] = &[
            $(
                Entry {
                    name: stringify!($name),
                    address: $address,
                    width: <$value as Value>::WIDTH,
                    access: Access::$access,
                    description: $description,
                },
            )*
        ];
    };
}

items! {
    ModelNumber @ 0: u16, ReadOnly, "Model Number";
    FirmwareVersion @ 6: u8, ReadOnly, "Firmware Version";
    Id @ 7: u8, ReadWrite, "ID";
    BaudRate @ 8: u8, ReadWrite, "Baud Rate";
    ReturnDelayTime @ 9: u8, ReadWrite, "Return Delay Time";
    OperatingMode @ 11: u8, ReadWrite, "Operating Mode";
    TorqueEnable @ 64: u8, ReadWrite, "Torque Enable";
    Led @ 65: u8, ReadWrite, "LED";
    StatusReturnLevel @ 68: u8, ReadWrite, "Status Return Level";
    HardwareErrorStatus @ 70: u8, ReadOnly, "Hardware Error Status";
    ProfileAcceleration @ 108: u32, ReadWrite, "Profile Acceleration";
    ProfileVelocity @ 112: u32, ReadWrite, "Profile Velocity";
    GoalPosition @ 116: u32, ReadWrite, "Goal Position";
    Moving @ 122: u8, ReadOnly, "Moving";
    PresentVelocity @ 128: u32, ReadOnly, "Present Velocity";
    PresentPosition @ 132: u32, ReadOnly, "Present Position";
    PresentInputVoltage @ 144: u16, ReadOnly, "Present Input Voltage";
    PresentTemperature @ 146: u8, ReadOnly, "Present Temperature";
}

/// Find a register by name, ignoring case, underscores, dashes, and spaces,
/// so `present_position`, `PresentPosition`, and `present-position` all match.
#[inline]
pub fn lookup(name: &str) -> Option<&'static Entry> {
    fn significant(s: &str) -> impl Iterator<Item = char> + '_ {
        s.chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .map(|c| c.to_ascii_lowercase())
    }
    ENTRIES
        .iter()
        .find(|entry| significant(entry.name).eq(significant(name)))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registers_used_by_sessions() {
        assert_eq!(TorqueEnable::ADDRESS, 64);
        assert_eq!(<TorqueEnable as Item>::Value::WIDTH, Width::One);
        assert_eq!(TorqueEnable::ACCESS, Access::ReadWrite);

        assert_eq!(GoalPosition::ADDRESS, 116);
        assert_eq!(<GoalPosition as Item>::Value::WIDTH, Width::Four);
        assert_eq!(GoalPosition::ACCESS, Access::ReadWrite);

        assert_eq!(PresentPosition::ADDRESS, 132);
        assert_eq!(<PresentPosition as Item>::Value::WIDTH, Width::Four);
        assert_eq!(PresentPosition::ACCESS, Access::ReadOnly);
    }

    #[test]
    fn entries_do_not_overlap() {
        let mut sorted: Vec<_> = ENTRIES.iter().collect();
        sorted.sort_by_key(|entry| entry.address);
        for pair in sorted.windows(2) {
            let [lo, hi] = [pair[0], pair[1]];
            assert!(
                lo.address + lo.width.bytes() <= hi.address,
                "{} overlaps {}",
                lo.name,
                hi.name,
            );
        }
    }

    #[test]
    fn lookup_ignores_spelling() {
        for name in ["PresentPosition", "present_position", "present-position"] {
            let entry = lookup(name).unwrap();
            assert_eq!(entry.address, 132);
        }
        assert_eq!(lookup("Goal Position").map(|e| e.address), Some(116));
        assert!(lookup("present").is_none());
    }

    #[test]
    fn width_limits() {
        assert!(Width::One.fits(255));
        assert!(!Width::One.fits(256));
        assert!(Width::Two.fits(65_535));
        assert!(!Width::Two.fits(65_536));
        assert!(Width::Four.fits(u32::MAX));
    }
}
