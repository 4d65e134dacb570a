pub enum Status<Output, Pending> {
    Complete(Output),
    Incomplete(Pending),
}

/// Incremental parser fed one input at a time.
pub trait State<Input>: Sized {
    type Output;
    type Error: core::fmt::Display;

    fn push(self, input: Input) -> Result<Status<Self::Output, Self>, Self::Error>;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mismatch8 {
    pub expected: u8,
    pub actual: u8,
}

impl core::fmt::Display for Mismatch8 {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Self { expected, actual } = *self;
        write!(f, "expected `x{expected:02X}` but received `x{actual:02X}`")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mismatch16 {
    pub expected: u16,
    pub actual: u16,
}

impl core::fmt::Display for Mismatch16 {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let Self { expected, actual } = *self;
        write!(f, "expected `x{expected:04X}` but received `x{actual:04X}`")
    }
}
