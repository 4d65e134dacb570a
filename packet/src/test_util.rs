use crate::stream::{self, Stream};

/// Yields each byte once, then times out forever.
pub(crate) struct Slice<'slice> {
    index: usize,
    slice: &'slice [u8],
}

impl<'slice> Slice<'slice> {
    #[inline]
    pub(crate) fn new(slice: &'slice [u8]) -> Self {
        Self { index: 0, slice }
    }

    #[inline]
    pub(crate) fn consumed(&self) -> usize {
        self.index
    }
}

impl Stream for Slice<'_> {
    type Item = Result<u8, stream::Error<&'static str>>;

    #[inline]
    fn next(&mut self) -> Self::Item {
        let byte = *self.slice.get(self.index).ok_or(stream::Error::TimedOut)?;
        self.index += 1;
        Ok(byte)
    }
}

pub(crate) struct WithLog<S: Stream>(pub(crate) S);

impl<S: Stream<Item: core::fmt::Debug>> Stream for WithLog<S> {
    type Item = S::Item;

    #[inline]
    fn next(&mut self) -> Self::Item {
        let item = self.0.next();
        println!("Stream log: {item:02X?}");
        item
    }
}
