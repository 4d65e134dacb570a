#[repr(u8)]
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    strum::FromRepr,
    strum::VariantArray,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Instruction {
    Ping = 0x01,
    Read = 0x02,
    Write = 0x03,
    RegWrite = 0x04,
    Action = 0x05,
    FactoryReset = 0x06,
    Reboot = 0x08,
}

impl Instruction {
    #[inline(always)]
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Whether sending this instruction twice leaves the device
    /// in the same state as sending it once.
    #[inline]
    pub const fn is_repeatable(self) -> bool {
        match self {
            Self::Ping | Self::Read | Self::Write | Self::RegWrite => true,
            Self::Action | Self::FactoryReset | Self::Reboot => false,
        }
    }
}

impl core::fmt::Display for Instruction {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?} (x{:02X})", self.byte())
    }
}

#[cfg(test)]
mod test {
    use {
        super::*,
        quickcheck::{Arbitrary, Gen},
        quickcheck_macros::quickcheck,
        strum::VariantArray,
    };

    impl Arbitrary for Instruction {
        #[inline]
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(Self::VARIANTS).expect("at least one instruction")
        }
    }

    #[quickcheck]
    fn byte_roundtrip(instruction: Instruction) -> bool {
        Instruction::from_repr(instruction.byte()) == Some(instruction)
    }

    #[test]
    fn status_marker_is_not_an_instruction() {
        assert_eq!(Instruction::from_repr(crate::constants::STATUS), None);
        assert_eq!(Instruction::from_repr(0x07), None);
    }

    #[test]
    fn only_state_changing_commands_are_unrepeatable() {
        let unrepeatable: Vec<_> = Instruction::VARIANTS
            .iter()
            .filter(|insn| !insn.is_repeatable())
            .copied()
            .collect();
        assert_eq!(
            unrepeatable,
            [
                Instruction::Action,
                Instruction::FactoryReset,
                Instruction::Reboot
            ]
        );
    }
}
