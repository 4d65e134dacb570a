pub trait Stream {
    type Item;
    fn next(&mut self) -> Self::Item;
}

impl<S: Stream> Stream for &mut S {
    type Item = S::Item;

    #[inline(always)]
    fn next(&mut self) -> Self::Item {
        S::next(self)
    }
}

/// Why a byte stream stopped producing bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The caller's read window elapsed.
    TimedOut,
    /// The transport itself failed.
    Io(E),
}
