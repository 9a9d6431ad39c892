//! Implements the CRCs used to validate decoded control data.
//!
//! Bits are shifted MSB-first through a register of the CRC width. Reflected CRCs are
//! handled by feeding each byte LSB-first and reversing the final register.

/// CRC-CCITT with inverted output, used by P25 trunking blocks.
pub type CRC16 = CRC<CRC16Params>;

/// CRC-CCITT with preset register and inverted output, used by the YSF FICH.
pub type CRC16Fich = CRC<CRC16FichParams>;

/// Reflected CRC-CCITT with preset register and inverted output, used by the D-Star
/// radio header.
pub type CRC16Header = CRC<CRC16HeaderParams>;

/// 6-bit CRC used by the NXDN SACCH.
pub type CRC6 = CRC<CRC6Params>;

/// 12-bit CRC used by the NXDN FACCH1.
pub type CRC12 = CRC<CRC12Params>;

pub trait CRCParams {
    /// Number of bits in the CRC.
    fn width() -> usize;

    /// Generator polynomial without its highest-degree term.
    fn gen() -> u32;

    /// Initial register contents.
    fn init() -> u32 { 0 }

    /// Mask applied to the final register.
    fn inv() -> u32;

    /// Whether bytes are fed LSB-first and the result is bit-reversed.
    fn reflect() -> bool { false }
}

pub struct CRC16Params;

impl CRCParams for CRC16Params {
    fn width() -> usize { 16 }
    fn gen() -> u32 { 0x1021 }
    fn inv() -> u32 { 0xFFFF }
}

pub struct CRC16FichParams;

impl CRCParams for CRC16FichParams {
    fn width() -> usize { 16 }
    fn gen() -> u32 { 0x1021 }
    fn init() -> u32 { 0xFFFF }
    fn inv() -> u32 { 0xFFFF }
}

pub struct CRC16HeaderParams;

impl CRCParams for CRC16HeaderParams {
    fn width() -> usize { 16 }
    fn gen() -> u32 { 0x1021 }
    fn init() -> u32 { 0xFFFF }
    fn inv() -> u32 { 0xFFFF }
    fn reflect() -> bool { true }
}

pub struct CRC6Params;

impl CRCParams for CRC6Params {
    fn width() -> usize { 6 }
    fn gen() -> u32 { 0x27 }
    fn init() -> u32 { 0x3F }
    fn inv() -> u32 { 0 }
}

pub struct CRC12Params;

impl CRCParams for CRC12Params {
    fn width() -> usize { 12 }
    fn gen() -> u32 { 0x80F }
    fn init() -> u32 { 0xFFF }
    fn inv() -> u32 { 0 }
}

/// Bitwise CRC calculator.
pub struct CRC<P: CRCParams> {
    params: std::marker::PhantomData<P>,
    /// Current register contents.
    word: u32,
}

impl<P: CRCParams> CRC<P> {
    /// Construct a new `CRC` with the initial register.
    pub fn new() -> CRC<P> {
        CRC {
            params: std::marker::PhantomData,
            word: P::init(),
        }
    }

    fn mask() -> u32 { (1 << P::width()) - 1 }

    /// Feed in a single message bit.
    pub fn feed_bit(&mut self, bit: bool) -> &mut Self {
        let top = self.word >> (P::width() - 1) & 1 == 1;

        self.word = self.word << 1 & Self::mask();

        if top ^ bit {
            self.word ^= P::gen();
        }

        self
    }

    /// Feed in the `num` LSBs of the given word, MSB first.
    pub fn feed_bits(&mut self, bits: u64, num: usize) -> &mut Self {
        assert!(num <= 64);

        for i in (0..num).rev() {
            self.feed_bit(bits >> i & 1 == 1);
        }

        self
    }

    /// Feed in the given byte stream.
    pub fn feed_bytes<T: IntoIterator<Item = u8>>(&mut self, bytes: T) -> &mut Self {
        for byte in bytes {
            if P::reflect() {
                self.feed_bits(byte.reverse_bits() as u64, 8);
            } else {
                self.feed_bits(byte as u64, 8);
            }
        }

        self
    }

    /// Finish the CRC calculation and return the resulting CRC.
    pub fn finish(&self) -> u32 {
        let word = if P::reflect() {
            self.word.reverse_bits() >> (32 - P::width())
        } else {
            self.word
        };

        word ^ P::inv()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CHECK: &[u8] = b"123456789";

    #[test]
    fn test_crc16() {
        assert_eq!(CRC16::new().feed_bytes(CHECK.iter().cloned()).finish(), 0xCE3C);

        let tsbk = [0x07, 0x00, 0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC, 0xDE, 0xF0];
        assert_eq!(CRC16::new().feed_bytes(tsbk.iter().cloned()).finish(), 0xD71F);
    }

    #[test]
    fn test_crc16_fich() {
        assert_eq!(CRC16Fich::new().feed_bytes(CHECK.iter().cloned()).finish(), 0xD64E);
    }

    #[test]
    fn test_crc16_header() {
        assert_eq!(CRC16Header::new().feed_bytes(CHECK.iter().cloned()).finish(), 0x906E);
    }

    #[test]
    fn test_crc6() {
        // 26 bits of 0xA55AC3C0.
        assert_eq!(CRC6::new().feed_bits(0xA55AC3C0 >> 6, 26).finish(), 0x0D);
    }

    #[test]
    fn test_crc12() {
        assert_eq!(CRC12::new().feed_bytes(b"123456789A".iter().cloned()).finish(), 0x759);
    }

    #[test]
    fn test_bits_match_bytes() {
        let mut a = CRC16::new();
        let mut b = CRC16::new();

        a.feed_bytes([0xAB, 0xCD].iter().cloned());
        b.feed_bits(0xA, 4).feed_bits(0xBCD, 12);

        assert_eq!(a.finish(), b.finish());
    }
}
