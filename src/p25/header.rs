//! Receive the header data unit (HDU) that precedes a voice call.

use collect_slice::CollectSlice;

use crate::bits::{BitSlice, Dibit, Hexbit, HexbitBytes, Hexbits};
use crate::buffer::{Buffer, DibitStorage, LongHexbitStorage};
use crate::coding::{golay, reed_solomon};
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};

use crate::p25::crypto::{CryptoAlgorithm, UNENCRYPTED};

/// Number of bytes in the decoded header.
pub const HEADER_BYTES: usize = 15;

/// Number of Golay words in the header.
pub const WORDS: usize = 36;

/// Number of data dibits per shortened Golay word.
const WORD_DIBITS: usize = 9;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct VoiceHeaderFields([u8; HEADER_BYTES]);

impl VoiceHeaderFields {
    pub fn new(buf: [u8; HEADER_BYTES]) -> Self { VoiceHeaderFields(buf) }

    /// Message indicator, which seeds the decryption of the call.
    pub fn crypto_init(&self) -> &[u8] { &self.0[..9] }
    pub fn mfg(&self) -> u8 { self.0[9] }
    pub fn algid(&self) -> u8 { self.0[10] }

    pub fn crypto_alg(&self) -> Option<CryptoAlgorithm> {
        CryptoAlgorithm::from_bits(self.0[10])
    }

    pub fn crypto_key(&self) -> u16 { self.0[..].bits_at(88, 16) as u16 }
    pub fn talkgroup(&self) -> u16 { self.0[..].bits_at(104, 16) as u16 }
    pub fn encrypted(&self) -> bool { self.0[10] != UNENCRYPTED }
}

/// Receives the data dibits of a header, with status symbols removed.
pub struct VoiceHeaderReceiver {
    outer: Buffer<DibitStorage>,
    inner: Buffer<LongHexbitStorage>,
    stats: Stats,
}

impl VoiceHeaderReceiver {
    pub fn new() -> VoiceHeaderReceiver {
        VoiceHeaderReceiver {
            outer: Buffer::new(DibitStorage::new(WORD_DIBITS)),
            inner: Buffer::new(LongHexbitStorage::new()),
            stats: Stats::default(),
        }
    }

    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<VoiceHeaderFields>> {
        let word = *self.outer.feed(dibit)? as u32;

        let data = match self.stats.golay_short.record(golay::g18_6::decode(word)) {
            Some(data) => data,
            None => return Some(Err(DecodeError::GolayUnrecoverable)),
        };

        let hexbits = self.inner.feed(Hexbit::new(data as u8))?;

        let data = match self.stats.rs.record(reed_solomon::long::decode(hexbits)) {
            Some(data) => data,
            None => return Some(Err(DecodeError::ReedSolomonUnrecoverable)),
        };

        let mut bytes = [0; HEADER_BYTES];
        HexbitBytes::new(data.iter().cloned()).collect_slice_checked(&mut bytes[..]);

        Some(Ok(VoiceHeaderFields::new(bytes)))
    }
}

impl HasStats for VoiceHeaderReceiver {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

/// Encode the given header into the data dibits of an HDU.
pub fn encode(header: &[u8; HEADER_BYTES]) -> Vec<Dibit> {
    let mut hexbits = [Hexbit::default(); WORDS];
    Hexbits::new(header.iter().cloned()).collect_slice_checked(&mut hexbits[..20]);
    reed_solomon::long::encode(&mut hexbits);

    hexbits.iter().flat_map(|h| {
        let word = golay::g18_6::encode(h.bits() as u32);
        (0..WORD_DIBITS).map(move |d| Dibit::new((word >> (16 - d * 2) & 0b11) as u8))
    }).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    const HEADER: [u8; HEADER_BYTES] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9,
        0x00,
        0x84,
        0xBE, 0xEF,
        0x12, 0x34,
    ];

    #[test]
    fn test_fields() {
        let h = VoiceHeaderFields::new(HEADER);

        assert_eq!(h.crypto_init(), &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert_eq!(h.mfg(), 0);
        assert_eq!(h.algid(), 0x84);
        assert_eq!(h.crypto_alg(), Some(CryptoAlgorithm::AES));
        assert_eq!(h.crypto_key(), 0xBEEF);
        assert_eq!(h.talkgroup(), 0x1234);
        assert!(h.encrypted());
    }

    #[test]
    fn test_receive() {
        let mut dibits = encode(&HEADER);
        assert_eq!(dibits.len(), WORDS * WORD_DIBITS);

        dibits[0] = dibits[0].invert();
        dibits[100] = Dibit::new(dibits[100].bits() ^ 0b11);
        dibits[300] = dibits[300].invert();

        let mut h = VoiceHeaderReceiver::new();
        let (last, rest) = dibits.split_last().unwrap();

        for &d in rest.iter() {
            assert!(h.feed(d).is_none());
        }

        assert_eq!(h.feed(*last), Some(Ok(VoiceHeaderFields::new(HEADER))));
        assert_eq!(h.stats().golay_short.fixed, 4);
    }
}
