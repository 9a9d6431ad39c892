//! Symbol types and utilities for packing symbols and bits into and out of bytes.
//!
//! Bit order is fixed across the crate: bit index 0 is the MSB of byte 0, and a dibit
//! packed into a byte lands with its MSB first.

use num::PrimInt;

/// Splits packed bytes back into channel symbols, as when building test streams from
/// encoded frame sections.
pub type Dibits<T> = SubByteIter<DibitParams, T>;
/// Splits bytes into the Reed-Solomon symbols protecting P25 headers and terminators,
/// three bytes at a time.
pub type Hexbits<T> = SubByteIter<HexbitParams, T>;

/// Packs four received symbols per byte, as for TSBK payloads.
pub type DibitBytes<T> = SubByteIter<DibitByteParams, T>;
/// Packs corrected Reed-Solomon symbols back into message bytes, four symbols per three
/// bytes.
pub type HexbitBytes<T> = SubByteIter<HexbitByteParams, T>;

pub trait IterParams {
    type Input;
    type Output;

    /// Width of each produced item in bits.
    fn bits() -> usize;

    /// Items pulled from the source per refill.
    fn buffer() -> usize;

    /// Width of each source item in bits.
    fn shift() -> usize;

    /// Left alignment applied to a refill so its first bit sits at bit 31.
    fn post_shift() -> usize { 32 - Self::shift() * Self::buffer() }

    /// Items produced per refill.
    fn iterations() -> usize { Self::shift() * Self::buffer() / Self::bits() }

    fn to_byte(input: Self::Input) -> u8;
    fn to_output(bits: u8) -> Self::Output;
}

/// Two bits, the unit of every demodulated 4-level channel symbol.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash)]
pub struct Dibit(u8);

impl Dibit {
    /// Wrap a symbol value in 0..=3, where 0b01 is +3 and 0b11 is -3 on the C4FM
    /// deviation scale.
    pub fn new(bits: u8) -> Dibit {
        assert!(bits >> 2 == 0);
        Dibit(bits)
    }

    pub fn bits(&self) -> u8 { self.0 }
    /// First bit on air, the one kept by single-bit channels such as D-Star and the NXDN
    /// LICH.
    pub fn hi(&self) -> u8 { self.0 >> 1 }
    pub fn lo(&self) -> u8 { self.0 & 1 }

    /// Map the dibit to its opposite-polarity symbol, which swaps +3/-3 and +1/-1.
    pub fn invert(&self) -> Dibit { Dibit(self.0 ^ 0b10) }
}

/// One symbol per two bits of each byte.
pub struct DibitParams;

impl IterParams for DibitParams {
    type Input = u8;
    type Output = Dibit;

    fn bits() -> usize { 2 }
    fn buffer() -> usize { 1 }
    fn shift() -> usize { 8 }

    fn to_byte(input: Self::Input) -> u8 { input }
    fn to_output(bits: u8) -> Dibit { Dibit::new(bits) }
}

/// Three bits, the input symbol of the rate-3/4 trellis.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Tribit(u8);

impl Tribit {
    pub fn new(bits: u8) -> Tribit {
        assert!(bits >> 3 == 0);
        Tribit(bits)
    }

    pub fn bits(&self) -> u8 { self.0 }
}

/// Six bits, the symbol size of the Reed-Solomon codes over GF(2<sup>6</sup>).
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct Hexbit(u8);

impl Hexbit {
    pub fn new(bits: u8) -> Hexbit {
        assert!(bits >> 6 == 0);
        Hexbit(bits)
    }

    /// Symbol value, always below 64.
    pub fn bits(&self) -> u8 { self.0 }
}

/// Four symbols per three bytes.
pub struct HexbitParams;

impl IterParams for HexbitParams {
    type Input = u8;
    type Output = Hexbit;

    fn bits() -> usize { 6 }
    fn buffer() -> usize { 3 }
    fn shift() -> usize { 8 }

    fn to_byte(input: Self::Input) -> u8 { input }
    fn to_output(bits: u8) -> Hexbit { Hexbit::new(bits) }
}

/// Four dibits per byte.
pub struct DibitByteParams;

impl IterParams for DibitByteParams {
    type Input = Dibit;
    type Output = u8;

    fn bits() -> usize { 8 }
    fn buffer() -> usize { 4 }
    fn shift() -> usize { 2 }

    fn to_byte(input: Self::Input) -> u8 { input.bits() }
    fn to_output(bits: u8) -> Self::Output { bits }
}

/// Three bytes per four symbols.
pub struct HexbitByteParams;

impl IterParams for HexbitByteParams {
    type Input = Hexbit;
    type Output = u8;

    fn bits() -> usize { 8 }
    fn buffer() -> usize { 4 }
    fn shift() -> usize { 6 }

    fn to_byte(input: Self::Input) -> u8 { input.bits() }
    fn to_output(bits: u8) -> Self::Output { bits }
}

/// Regroups a stream of fixed-width items into items of another width, MSB first.
pub struct SubByteIter<P, T> where
    P: IterParams, T: Iterator<Item = P::Input>
{
    params: std::marker::PhantomData<P>,
    src: T,
    /// Refilled bits, left aligned.
    buf: u32,
    /// Items produced from the current refill.
    idx: u8,
}

impl<P, T> SubByteIter<P, T> where
    P: IterParams, T: Iterator<Item = P::Input>
{
    pub fn new(src: T) -> SubByteIter<P, T> {
        SubByteIter {
            params: std::marker::PhantomData,
            src,
            buf: 0,
            idx: 0,
        }
    }

    /// Pull the next group of source items, or `None` when the source ends on a group
    /// boundary.
    fn buffer(&mut self) -> Option<u32> {
        let (buf, added) = (&mut self.src)
            .take(P::buffer())
            .fold((0, 0), |(buf, added), next| {
                (buf << P::shift() | P::to_byte(next) as u32, added + 1)
            });

        if added == 0 {
            return None;
        }

        assert!(added == P::buffer(), "incomplete source");

        Some(buf << P::post_shift())
    }
}

impl<P, T> Iterator for SubByteIter<P, T> where
    P: IterParams, T: Iterator<Item = P::Input>
{
    type Item = P::Output;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx == 0 {
            self.buf = self.buffer()?;
        }

        let bits = self.buf >> (32 - P::bits());
        self.buf <<= P::bits();

        self.idx += 1;
        self.idx %= P::iterations() as u8;

        Some(P::to_output(bits as u8))
    }
}

/// Bit-level access into a byte buffer, where bit 0 is the MSB of the first byte.
pub trait BitSlice {
    /// Get the bit at the given index.
    fn bit(&self, idx: usize) -> bool;
    /// Set the bit at the given index to the given value.
    fn set_bit(&mut self, idx: usize, val: bool);

    /// Read `len` bits starting at `start` as an MSB-first integer.
    fn bits_at(&self, start: usize, len: usize) -> u64 {
        debug_assert!(len <= 64);
        (start..start + len).fold(0, |acc, i| acc << 1 | self.bit(i) as u64)
    }

    /// Write the `len` low bits of `val` MSB-first starting at `start`.
    fn set_bits_at(&mut self, start: usize, len: usize, val: u64) {
        debug_assert!(len <= 64);

        for i in 0..len {
            self.set_bit(start + i, val >> (len - 1 - i) & 1 == 1);
        }
    }
}

impl BitSlice for [u8] {
    fn bit(&self, idx: usize) -> bool {
        self[idx / 8] >> (7 - idx % 8) & 1 == 1
    }

    fn set_bit(&mut self, idx: usize, val: bool) {
        let mask = 1 << (7 - idx % 8);

        if val {
            self[idx / 8] |= mask;
        } else {
            self[idx / 8] &= !mask;
        }
    }
}

/// Pack the given dibits MSB-first into the given buffer, four to a byte, and return the
/// number of bytes filled.
///
/// The number of dibits must be a multiple of 4 and fit in the buffer.
pub fn pack_msb_first<I>(dibits: I, out: &mut [u8]) -> usize
    where I: IntoIterator<Item = Dibit>
{
    DibitBytes::new(dibits.into_iter())
        .zip(out.iter_mut())
        .fold(0, |n, (b, o)| {
            *o = b;
            n + 1
        })
}

/// Write the dibit MSB-first at the given dibit index of the buffer.
pub fn set_dibit(buf: &mut [u8], idx: usize, d: Dibit) {
    buf.set_bit(idx * 2, d.hi() == 1);
    buf.set_bit(idx * 2 + 1, d.lo() == 1);
}

/// Read the dibit at the given dibit index of the buffer.
pub fn get_dibit(buf: &[u8], idx: usize) -> Dibit {
    Dibit::new((buf.bit(idx * 2) as u8) << 1 | buf.bit(idx * 2 + 1) as u8)
}

/// Compute the even parity bit of the given word, which is 1 when an odd number of bits
/// are set.
pub fn parity<T: PrimInt>(word: T) -> u8 { (word.count_ones() & 1) as u8 }

/// Count the bit positions where the two words differ.
pub fn distance<T: PrimInt>(a: T, b: T) -> usize { (a ^ b).count_ones() as usize }

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_dibits() {
        let bytes = [
            0b00110011,
            0b10011001,
        ];

        let d = Dibits::new(bytes.iter().cloned())
            .map(|d| d.bits())
            .collect::<Vec<u8>>();

        assert_eq!(d, vec![0b00, 0b11, 0b00, 0b11, 0b10, 0b01, 0b10, 0b01]);
    }

    #[test]
    fn test_invert() {
        assert_eq!(Dibit::new(0b01).invert(), Dibit::new(0b11));
        assert_eq!(Dibit::new(0b11).invert(), Dibit::new(0b01));
        assert_eq!(Dibit::new(0b00).invert(), Dibit::new(0b10));
        assert_eq!(Dibit::new(0b10).invert(), Dibit::new(0b00));
    }

    #[test]
    #[should_panic]
    fn test_dibit_bytes_panic() {
        let dibits = [
            Dibit::new(0b00),
            Dibit::new(0b11),
            Dibit::new(0b00),
            Dibit::new(0b11),
            Dibit::new(0b10),
        ];

        let mut d = DibitBytes::new(dibits.iter().cloned());

        d.next();
        d.next();
    }

    #[test]
    fn test_hexbits() {
        let bytes = [0b11111100, 0b00001010, 0b10010101];

        let h = Hexbits::new(bytes.iter().cloned())
            .map(|h| h.bits())
            .collect::<Vec<u8>>();

        assert_eq!(h, vec![0b111111, 0b000000, 0b101010, 0b010101]);

        let b = HexbitBytes::new(h.iter().map(|&h| Hexbit::new(h)))
            .collect::<Vec<u8>>();

        assert_eq!(&b[..], &bytes[..]);
    }

    #[test]
    fn test_pack_msb_first() {
        let dibits = [0b00, 0b11, 0b00, 0b11, 0b10, 0b01, 0b10, 0b01];
        let mut buf = [0; 3];

        let n = pack_msb_first(dibits.iter().map(|&d| Dibit::new(d)), &mut buf);

        assert_eq!(n, 2);
        assert_eq!(buf, [0b00110011, 0b10011001, 0]);
    }

    #[test]
    fn test_bit_slice() {
        let mut buf = [0u8; 3];

        buf.set_bit(0, true);
        buf.set_bit(9, true);
        buf.set_bit(23, true);
        assert_eq!(buf, [0b10000000, 0b01000000, 0b00000001]);
        assert!(buf.bit(0));
        assert!(!buf.bit(1));
        assert!(buf.bit(9));
        assert!(buf.bit(23));

        buf.set_bit(0, false);
        assert_eq!(buf[0], 0);

        buf.set_bits_at(4, 12, 0xABC);
        assert_eq!(buf.bits_at(4, 12), 0xABC);
        assert_eq!(buf, [0b00001010, 0b10111100, 0b00000001]);
    }

    #[test]
    fn test_parity() {
        assert_eq!(parity(0b1011u8), 1);
        assert_eq!(parity(0b1001u16), 0);
        assert_eq!(parity(0u32), 0);
        assert_eq!(distance(0b1100u8, 0b1010u8), 2);
        assert_eq!(distance(0xFFFF_FFFF_FFFFu64, 0), 48);
    }

    #[test]
    fn test_dibit_index() {
        let mut buf = [0u8; 2];

        set_dibit(&mut buf, 0, Dibit::new(0b10));
        set_dibit(&mut buf, 5, Dibit::new(0b11));
        assert_eq!(buf, [0b10000000, 0b00110000]);
        assert_eq!(get_dibit(&buf, 0), Dibit::new(0b10));
        assert_eq!(get_dibit(&buf, 5), Dibit::new(0b11));
        assert_eq!(get_dibit(&buf, 1), Dibit::new(0b00));
    }
}
