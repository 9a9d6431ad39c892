//! Encoding and decoding of the (24, 12, 13) short, (24, 16, 9) medium, and (36, 20, 17)
//! long Reed-Solomon codes over GF(2<sup>6</sup>) used by P25.
//!
//! In a word, the first hexbit maps to the highest-degree coefficient.

use collect_slice::CollectSlice;

use crate::bits::Hexbit;
use crate::coding::bmcf;
use crate::coding::galois::Gf64;

/// Encoding and decoding of the (24, 12, 13) code.
pub mod short {
    use crate::bits::Hexbit;

    /// Transpose of the parity part of the generator.
    const GEN: [[u8; 12]; 12] = [
        [0o62, 0o11, 0o03, 0o21, 0o30, 0o01, 0o61, 0o24, 0o72, 0o72, 0o73, 0o71],
        [0o44, 0o12, 0o01, 0o70, 0o22, 0o41, 0o76, 0o22, 0o42, 0o14, 0o65, 0o05],
        [0o03, 0o11, 0o05, 0o27, 0o03, 0o27, 0o21, 0o71, 0o05, 0o65, 0o36, 0o55],
        [0o25, 0o11, 0o75, 0o45, 0o75, 0o56, 0o55, 0o56, 0o20, 0o54, 0o61, 0o03],
        [0o14, 0o16, 0o14, 0o16, 0o15, 0o76, 0o76, 0o21, 0o43, 0o35, 0o42, 0o71],
        [0o16, 0o64, 0o06, 0o67, 0o15, 0o64, 0o01, 0o35, 0o47, 0o25, 0o22, 0o34],
        [0o27, 0o67, 0o20, 0o23, 0o33, 0o21, 0o63, 0o73, 0o33, 0o41, 0o17, 0o60],
        [0o03, 0o55, 0o44, 0o64, 0o15, 0o53, 0o35, 0o42, 0o56, 0o16, 0o04, 0o11],
        [0o53, 0o01, 0o66, 0o73, 0o51, 0o04, 0o30, 0o57, 0o01, 0o15, 0o44, 0o74],
        [0o04, 0o76, 0o06, 0o33, 0o03, 0o25, 0o13, 0o74, 0o16, 0o40, 0o20, 0o02],
        [0o36, 0o26, 0o70, 0o44, 0o53, 0o01, 0o64, 0o43, 0o13, 0o71, 0o25, 0o41],
        [0o47, 0o73, 0o66, 0o21, 0o50, 0o12, 0o70, 0o76, 0o76, 0o26, 0o05, 0o50],
    ];

    /// Calculate the 12 parity hexbits for the first 12 data hexbits in the given buffer,
    /// placing the parity hexbits at the end of the buffer.
    pub fn encode(buf: &mut [Hexbit; 24]) {
        let (data, parity) = buf.split_at_mut(12);
        super::encode(data, parity, GEN.iter().map(|r| &r[..]));
    }

    /// Try to correct the given 24-hexbit word in place, fixing up to 6 hexbit errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the 12
    /// data hexbits and `err` is the number of corrected hexbits. Otherwise, return
    /// `None` to indicate an unrecoverable error.
    pub fn decode(buf: &mut [Hexbit; 24]) -> Option<(&[Hexbit], usize)> {
        let err = super::decode(&mut buf[..], 12)?;
        Some((&buf[..12], err))
    }
}

/// Encoding and decoding of the (24, 16, 9) code.
pub mod medium {
    use crate::bits::Hexbit;

    /// Transpose of the parity part of the generator.
    const GEN: [[u8; 16]; 8] = [
        [0o51, 0o57, 0o05, 0o73, 0o75, 0o20, 0o02, 0o24, 0o42, 0o32, 0o65, 0o64, 0o62, 0o55, 0o24, 0o67],
        [0o45, 0o25, 0o01, 0o07, 0o15, 0o32, 0o75, 0o74, 0o64, 0o32, 0o36, 0o06, 0o63, 0o43, 0o23, 0o75],
        [0o67, 0o63, 0o31, 0o47, 0o51, 0o14, 0o43, 0o15, 0o07, 0o55, 0o25, 0o54, 0o74, 0o34, 0o23, 0o45],
        [0o15, 0o73, 0o04, 0o14, 0o51, 0o42, 0o05, 0o72, 0o22, 0o41, 0o07, 0o32, 0o70, 0o71, 0o05, 0o60],
        [0o64, 0o71, 0o16, 0o41, 0o17, 0o75, 0o01, 0o24, 0o61, 0o57, 0o50, 0o76, 0o05, 0o57, 0o50, 0o57],
        [0o67, 0o22, 0o54, 0o77, 0o67, 0o42, 0o40, 0o26, 0o20, 0o66, 0o16, 0o46, 0o27, 0o76, 0o70, 0o24],
        [0o52, 0o40, 0o25, 0o47, 0o17, 0o70, 0o12, 0o74, 0o40, 0o21, 0o40, 0o14, 0o37, 0o50, 0o42, 0o06],
        [0o12, 0o15, 0o76, 0o11, 0o57, 0o54, 0o64, 0o61, 0o65, 0o77, 0o51, 0o36, 0o46, 0o64, 0o23, 0o26],
    ];

    /// Calculate the 8 parity hexbits for the first 16 data hexbits in the given buffer,
    /// placing the parity hexbits at the end of the buffer.
    pub fn encode(buf: &mut [Hexbit; 24]) {
        let (data, parity) = buf.split_at_mut(16);
        super::encode(data, parity, GEN.iter().map(|r| &r[..]));
    }

    /// Try to correct the given 24-hexbit word in place, fixing up to 4 hexbit errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the 16
    /// data hexbits and `err` is the number of corrected hexbits.
    pub fn decode(buf: &mut [Hexbit; 24]) -> Option<(&[Hexbit], usize)> {
        let err = super::decode(&mut buf[..], 8)?;
        Some((&buf[..16], err))
    }
}

/// Encoding and decoding of the (36, 20, 17) code.
pub mod long {
    use crate::bits::Hexbit;

    /// Transpose of the parity part of the generator.
    const GEN: [[u8; 20]; 16] = [
        [0o74, 0o04, 0o07, 0o26, 0o23, 0o24, 0o52, 0o55, 0o54, 0o74, 0o54, 0o51, 0o01, 0o11, 0o06, 0o34, 0o63, 0o71, 0o02, 0o34],
        [0o37, 0o17, 0o23, 0o05, 0o73, 0o51, 0o33, 0o62, 0o51, 0o41, 0o70, 0o07, 0o65, 0o70, 0o02, 0o31, 0o43, 0o21, 0o01, 0o35],
        [0o34, 0o50, 0o37, 0o07, 0o73, 0o25, 0o14, 0o56, 0o32, 0o30, 0o11, 0o72, 0o32, 0o05, 0o65, 0o01, 0o25, 0o70, 0o53, 0o02],
        [0o06, 0o24, 0o46, 0o63, 0o41, 0o23, 0o02, 0o25, 0o65, 0o41, 0o03, 0o30, 0o70, 0o10, 0o11, 0o15, 0o44, 0o44, 0o74, 0o23],
        [0o02, 0o11, 0o56, 0o63, 0o72, 0o22, 0o20, 0o73, 0o77, 0o43, 0o13, 0o65, 0o13, 0o65, 0o41, 0o44, 0o77, 0o56, 0o02, 0o21],
        [0o07, 0o05, 0o75, 0o27, 0o34, 0o41, 0o06, 0o60, 0o12, 0o22, 0o22, 0o54, 0o44, 0o24, 0o20, 0o64, 0o63, 0o04, 0o14, 0o27],
        [0o44, 0o30, 0o43, 0o63, 0o21, 0o74, 0o14, 0o15, 0o54, 0o51, 0o16, 0o06, 0o73, 0o15, 0o45, 0o16, 0o17, 0o30, 0o52, 0o22],
        [0o64, 0o57, 0o45, 0o40, 0o51, 0o66, 0o25, 0o30, 0o13, 0o06, 0o57, 0o21, 0o24, 0o77, 0o42, 0o24, 0o17, 0o74, 0o74, 0o33],
        [0o26, 0o33, 0o55, 0o06, 0o67, 0o74, 0o52, 0o13, 0o35, 0o64, 0o03, 0o36, 0o12, 0o22, 0o46, 0o52, 0o64, 0o04, 0o12, 0o64],
        [0o14, 0o03, 0o21, 0o04, 0o16, 0o65, 0o23, 0o17, 0o32, 0o33, 0o45, 0o63, 0o52, 0o24, 0o54, 0o16, 0o14, 0o23, 0o57, 0o42],
        [0o26, 0o02, 0o50, 0o40, 0o31, 0o70, 0o35, 0o20, 0o56, 0o03, 0o72, 0o50, 0o21, 0o24, 0o35, 0o06, 0o40, 0o71, 0o24, 0o05],
        [0o44, 0o02, 0o31, 0o45, 0o74, 0o36, 0o74, 0o02, 0o12, 0o47, 0o31, 0o61, 0o55, 0o74, 0o12, 0o62, 0o74, 0o70, 0o63, 0o73],
        [0o54, 0o15, 0o45, 0o47, 0o11, 0o67, 0o75, 0o70, 0o75, 0o27, 0o30, 0o64, 0o12, 0o07, 0o40, 0o20, 0o31, 0o63, 0o15, 0o51],
        [0o13, 0o16, 0o27, 0o30, 0o21, 0o45, 0o75, 0o55, 0o01, 0o12, 0o56, 0o52, 0o35, 0o44, 0o64, 0o13, 0o72, 0o45, 0o42, 0o46],
        [0o77, 0o25, 0o71, 0o75, 0o12, 0o64, 0o43, 0o14, 0o72, 0o55, 0o35, 0o01, 0o14, 0o07, 0o65, 0o55, 0o54, 0o56, 0o52, 0o73],
        [0o05, 0o26, 0o62, 0o07, 0o21, 0o01, 0o27, 0o47, 0o63, 0o47, 0o22, 0o60, 0o72, 0o46, 0o33, 0o57, 0o06, 0o43, 0o33, 0o60],
    ];

    /// Calculate the 16 parity hexbits for the first 20 data hexbits in the given buffer,
    /// placing the parity hexbits at the end of the buffer.
    pub fn encode(buf: &mut [Hexbit; 36]) {
        let (data, parity) = buf.split_at_mut(20);
        super::encode(data, parity, GEN.iter().map(|r| &r[..]));
    }

    /// Try to correct the given 36-hexbit word in place, fixing up to 8 hexbit errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the 20
    /// data hexbits and `err` is the number of corrected hexbits.
    pub fn decode(buf: &mut [Hexbit; 36]) -> Option<(&[Hexbit], usize)> {
        let err = super::decode(&mut buf[..], 16)?;
        Some((&buf[..20], err))
    }
}

/// Encode the given data with the given generator rows and place the resulting parity
/// symbols in the given destination.
fn encode<'g, G>(data: &[Hexbit], parity: &mut [Hexbit], gen: G)
    where G: Iterator<Item = &'g [u8]>
{
    gen.map(|row| {
        row.iter()
           .zip(data.iter())
           .fold(Gf64::zero(), |s, (&col, &d)| s + Gf64::new(d.bits()) * Gf64::new(col))
           .bits()
    }).map(Hexbit::new).collect_slice_checked(parity);
}

/// Correct the given word in place using the given number of syndromes, returning the
/// number of corrected symbols.
///
/// The word is left untouched when it can't be corrected.
fn decode(word: &mut [Hexbit], syndromes: usize) -> Option<usize> {
    let syn = (1..=syndromes).map(|p| {
        let x = Gf64::for_power(p);
        word.iter().fold(Gf64::zero(), |acc, &h| acc * x + Gf64::new(h.bits()))
    }).collect::<Vec<Gf64>>();

    let errs = bmcf::errors(&syn, word.len())?;
    let last = word.len() - 1;

    for &(pos, val) in errs.iter() {
        let sym = &mut word[last - pos];
        *sym = Hexbit::new((Gf64::new(sym.bits()) + val).bits());
    }

    Some(errs.len())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bits::Hexbit;

    fn hexbits(bits: &[u8], out: &mut [Hexbit]) {
        for (o, &b) in out.iter_mut().zip(bits.iter()) {
            *o = Hexbit::new(b);
        }
    }

    fn corrupt(buf: &mut [Hexbit], positions: &[usize]) {
        for (i, &p) in positions.iter().enumerate() {
            buf[p] = Hexbit::new(buf[p].bits() ^ (i as u8 * 7 % 63 + 1));
        }
    }

    #[test]
    fn test_decode_short() {
        let data = [1, 0, 0o77, 0o12, 0o34, 0o55, 0, 0o11, 0o60, 0o01, 0o70, 0o43];
        let mut buf = [Hexbit::default(); 24];
        hexbits(&data, &mut buf);
        short::encode(&mut buf);

        let sent = buf;
        assert_eq!(short::decode(&mut buf).map(|(_, e)| e), Some(0));

        corrupt(&mut buf, &[0, 5, 11, 12, 20, 23]);

        let (fixed, err) = short::decode(&mut buf).unwrap();
        assert_eq!(err, 6);
        assert_eq!(fixed, &sent[..12]);
        assert_eq!(buf, sent);
    }

    #[test]
    fn test_decode_med() {
        let data = [0o10, 0o20, 0o30, 0o40, 0o50, 0o60, 0o70, 0o77, 1, 2, 3, 4, 5, 6, 7, 0];
        let mut buf = [Hexbit::default(); 24];
        hexbits(&data, &mut buf);
        medium::encode(&mut buf);

        let sent = buf;
        corrupt(&mut buf, &[1, 9, 16, 22]);

        let (fixed, err) = medium::decode(&mut buf).unwrap();
        assert_eq!(err, 4);
        assert_eq!(fixed, &sent[..16]);
    }

    #[test]
    fn test_decode_long() {
        let mut buf = [Hexbit::default(); 36];

        for (i, h) in buf.iter_mut().take(20).enumerate() {
            *h = Hexbit::new((i * 13 % 64) as u8);
        }

        long::encode(&mut buf);

        let sent = buf;
        corrupt(&mut buf, &[0, 3, 7, 19, 20, 27, 31, 35]);

        let (fixed, err) = long::decode(&mut buf).unwrap();
        assert_eq!(err, 8);
        assert_eq!(fixed, &sent[..20]);
    }

    #[test]
    fn test_zero_word() {
        let mut buf = [Hexbit::default(); 36];
        long::encode(&mut buf);
        assert!(buf.iter().all(|h| h.bits() == 0));
        assert_eq!(long::decode(&mut buf).map(|(_, e)| e), Some(0));
    }
}
