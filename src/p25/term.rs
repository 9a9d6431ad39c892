//! Receive the link control word of a terminator (TDULC).

use collect_slice::CollectSlice;

use crate::bits::{Dibit, Hexbit, HexbitBytes, Hexbits};
use crate::buffer::{Buffer, DibitStorage, ShortHexbitStorage};
use crate::coding::{golay, reed_solomon};
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};

use crate::p25::control::{LinkControlFields, LINK_CONTROL_BYTES};

/// Number of Golay words in the terminator.
pub const WORDS: usize = 12;

/// Number of data dibits per Golay word.
const WORD_DIBITS: usize = 12;

/// Receives the data dibits of a terminator, with status symbols removed.
pub struct TerminatorReceiver {
    outer: Buffer<DibitStorage>,
    inner: Buffer<ShortHexbitStorage>,
    stats: Stats,
}

impl TerminatorReceiver {
    pub fn new() -> TerminatorReceiver {
        TerminatorReceiver {
            outer: Buffer::new(DibitStorage::new(WORD_DIBITS)),
            inner: Buffer::new(ShortHexbitStorage::new()),
            stats: Stats::default(),
        }
    }

    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<LinkControlFields>> {
        let word = *self.outer.feed(dibit)? as u32;

        let data = match self.stats.golay.record(golay::g24_12_8::decode(word)) {
            Some(data) => data,
            None => return Some(Err(DecodeError::GolayUnrecoverable)),
        };

        if self.inner.feed(Hexbit::new((data >> 6) as u8)).is_some() {
            return Some(Err(DecodeError::FrameOverflow(WORDS)));
        }

        let hexbits = self.inner.feed(Hexbit::new((data & 0x3F) as u8))?;

        let data = match self.stats.rs.record(reed_solomon::short::decode(hexbits)) {
            Some(data) => data,
            None => return Some(Err(DecodeError::ReedSolomonUnrecoverable)),
        };

        let mut bytes = [0; LINK_CONTROL_BYTES];
        HexbitBytes::new(data.iter().cloned()).collect_slice_checked(&mut bytes[..]);

        Some(Ok(LinkControlFields::new(bytes)))
    }
}

impl HasStats for TerminatorReceiver {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

/// Encode the given link control word into the data dibits of a terminator.
pub fn encode(lc: &[u8; LINK_CONTROL_BYTES]) -> Vec<Dibit> {
    let mut hexbits = [Hexbit::default(); 24];
    Hexbits::new(lc.iter().cloned()).collect_slice_checked(&mut hexbits[..12]);
    reed_solomon::short::encode(&mut hexbits);

    hexbits.chunks(2).flat_map(|pair| {
        let word = golay::g24_12_8::encode((pair[0].bits() as u32) << 6 |
                                           pair[1].bits() as u32);

        (0..WORD_DIBITS).map(move |d| Dibit::new((word >> (22 - d * 2) & 0b11) as u8))
    }).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const LC: [u8; 9] = [0x03, 0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x07];

    #[test]
    fn test_terminator() {
        let mut dibits = encode(&LC);
        assert_eq!(dibits.len(), WORDS * WORD_DIBITS);

        dibits[5] = dibits[5].invert();
        dibits[30] = Dibit::new(dibits[30].bits() ^ 0b11);

        let mut t = TerminatorReceiver::new();
        let (last, rest) = dibits.split_last().unwrap();

        for &d in rest.iter() {
            assert!(t.feed(d).is_none());
        }

        let lc = t.feed(*last).unwrap().unwrap();
        assert_eq!(lc.bytes(), &LC);
        assert_eq!(lc.dest_unit(), 0x000102);
        assert_eq!(lc.src_unit(), 7);
        assert_eq!(t.stats().golay.words, WORDS);
        assert_eq!(t.stats().golay.fixed, 3);
        assert_eq!(t.stats().rs.words, 1);
    }
}
