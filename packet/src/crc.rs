//! CRC-16 as specified by Protocol 2.0: polynomial `0x8005`, seed `0`,
//! most-significant bit first, no final XOR.

const POLYNOMIAL: u16 = 0x8005;

const TABLE: [u16; 256] = {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Crc {
    state: u16,
}

impl Crc {
    #[inline(always)]
    pub const fn new() -> Self {
        Self { state: 0 }
    }

    #[inline(always)]
    pub const fn push(&mut self, byte: u8) {
        let index = ((self.state >> 8) ^ byte as u16) & 0xFF;
        self.state = (self.state << 8) ^ TABLE[index as usize];
    }

    #[inline]
    pub const fn push_all(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.push(bytes[i]);
            i += 1;
        }
    }

    #[inline(always)]
    pub const fn collapse(self) -> u16 {
        self.state
    }
}

#[inline]
pub const fn checksum(bytes: &[u8]) -> u16 {
    let mut crc = Crc::new();
    crc.push_all(bytes);
    crc.collapse()
}
