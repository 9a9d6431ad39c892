//! dPMR header frame processing.
//!
//! The frame sync is followed by two copies of the header information (HI), separated by
//! the colour code (CC).

use crate::bits::{self, BitSlice, Dibit};
use crate::coding::hamming;
use crate::decoder::{Context, Event, Step};
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};

/// Number of dibits in a copy of the header information.
pub const HI_DIBITS: usize = 60;

/// Number of dibits in the colour code.
pub const CC_DIBITS: usize = 24;

/// Number of dibits in a frame after the sync.
pub const FRAME_DIBITS: usize = HI_DIBITS * 2 + CC_DIBITS;

/// Number of bytes in the header information.
pub const HI_BYTES: usize = 10;

/// Number of possible colour codes.
pub const COLOUR_CODES: usize = 64;

/// Number of bits in a coded header word.
const WORD_BITS: usize = 12;

lazy_static! {
    /// Transmitted pattern of each colour code.
    static ref COLOUR_CODE_PATTERNS: [u64; COLOUR_CODES] = {
        let mut table = [0; COLOUR_CODES];

        for (cc, pat) in table.iter_mut().enumerate() {
            let word = hamming::h12_8::encode((cc as u32) << 2) as u64;
            let inv = !word & 0xFFF;

            *pat = word << 36 | inv << 24 | word << 12 | inv;
        }

        table
    };
}

/// Find the colour code with the nearest pattern to the given 48 received bits,
/// returning it along with the number of differing bits.
pub fn colour_code(bits: u64) -> (u8, usize) {
    COLOUR_CODE_PATTERNS.iter()
        .enumerate()
        .map(|(cc, &pat)| (cc as u8, bits::distance(pat, bits)))
        .min_by_key(|&(_, dist)| dist)
        .unwrap_or((0, 0))
}

/// Transmitted pattern of the given colour code.
pub fn colour_code_pattern(cc: u8) -> u64 { COLOUR_CODE_PATTERNS[cc as usize % COLOUR_CODES] }

/// Decoded header information.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct DpmrHeader([u8; HI_BYTES]);

impl DpmrHeader {
    pub fn new(buf: [u8; HI_BYTES]) -> DpmrHeader { DpmrHeader(buf) }

    pub fn bytes(&self) -> &[u8; HI_BYTES] { &self.0 }

    pub fn header_type(&self) -> u8 { self.0[0] >> 4 }

    /// Called unit or group.
    pub fn called_id(&self) -> u32 { self.0[..].bits_at(8, 24) as u32 }

    /// Calling unit.
    pub fn own_id(&self) -> u32 { self.0[..].bits_at(32, 24) as u32 }

    /// Communication mode.
    pub fn comm_mode(&self) -> u8 { self.0[7] >> 5 }

    /// Communication format.
    pub fn comm_format(&self) -> u8 { self.0[7] >> 3 & 0b11 }

    /// Encode into transmitted dibits.
    pub fn encode(&self) -> Vec<Dibit> {
        let mut buf = [0; HI_DIBITS / 4];

        for (i, &b) in self.0.iter().enumerate() {
            buf.set_bits_at(i * WORD_BITS, WORD_BITS, hamming::h12_8::encode(b as u32) as u64);
        }

        (0..HI_DIBITS).map(|i| bits::get_dibit(&buf, i)).collect()
    }
}

/// Decode the header information from the given received bits.
pub fn decode_header(rx: &[u8], stats: &mut Stats) -> Result<DpmrHeader> {
    let mut buf = [0; HI_BYTES];

    for (i, b) in buf.iter_mut().enumerate() {
        let word = rx.bits_at(i * WORD_BITS, WORD_BITS) as u32;

        *b = match stats.hamming.record(hamming::h12_8::decode(word)) {
            Some(data) => data as u8,
            None => return Err(DecodeError::HammingUnrecoverable),
        };
    }

    Ok(DpmrHeader(buf))
}

/// Decoded dPMR fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DpmrEvent {
    /// The colour code was matched.
    ColourCode(u8),
    /// The header information was decoded.
    Header(DpmrHeader),
}

/// Processes the dibits following a dPMR frame sync.
pub struct DpmrProcessor {
    pos: usize,
    buf: [u8; HI_DIBITS / 4],
    cc: u64,
    /// Outcome of decoding the first copy of the header information.
    first: Option<Result<DpmrHeader>>,
    stats: Stats,
}

impl DpmrProcessor {
    pub fn new() -> DpmrProcessor {
        DpmrProcessor {
            pos: 0,
            buf: [0; HI_DIBITS / 4],
            cc: 0,
            first: None,
            stats: Stats::default(),
        }
    }

    /// Feed in a dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        let pos = self.pos;
        self.pos += 1;

        if pos < HI_DIBITS {
            bits::set_dibit(&mut self.buf, pos, dibit);

            if pos + 1 == HI_DIBITS {
                self.first = Some(decode_header(&self.buf, &mut self.stats));
            }

            return Step::Pending;
        }

        if pos < HI_DIBITS + CC_DIBITS {
            self.cc = self.cc << 2 | dibit.bits() as u64;

            if pos + 1 < HI_DIBITS + CC_DIBITS {
                return Step::Pending;
            }

            let (cc, dist) = colour_code(self.cc);

            trace!("dPMR colour code {} at distance {}", cc, dist);

            ctx.session.nac = cc as u16;

            return Step::Event(Event::Dpmr(DpmrEvent::ColourCode(cc)));
        }

        if pos >= FRAME_DIBITS {
            return Step::Abort(DecodeError::FrameOverflow(pos));
        }

        bits::set_dibit(&mut self.buf, pos - HI_DIBITS - CC_DIBITS, dibit);

        if pos + 1 < FRAME_DIBITS {
            return Step::Pending;
        }

        let second = decode_header(&self.buf, &mut self.stats);

        let h = match (self.first, second) {
            (Some(Ok(a)), Ok(b)) => {
                if a != b {
                    debug!("dPMR header copies differ");
                }

                b
            },
            (_, Ok(h)) | (Some(Ok(h)), Err(_)) => h,
            (_, Err(e)) => return Step::Abort(e),
        };

        let s = &mut *ctx.session;

        s.talkgroup = h.called_id();
        s.source = h.own_id();
        s.frame_type = "HEADER";

        info!("dPMR CC:{} ID:{} TO:{}", s.nac, h.own_id(), h.called_id());

        Step::Done(Some(Event::Dpmr(DpmrEvent::Header(h))))
    }
}

impl HasStats for DpmrProcessor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{Config, DecodeMode};
    use crate::decoder::{Decoder, FsmState};
    use crate::sync::test_patterns;
    use crate::sync::{SyncType, WARMUP};

    fn decoder() -> Decoder {
        let mut d = Decoder::new(Config::with_mode(DecodeMode::DPMR));

        for _ in 0..WARMUP {
            assert_eq!(d.advance(Dibit::new(0), 1000), None);
        }

        d
    }

    fn cc_dibits(cc: u8) -> Vec<Dibit> {
        let pat = colour_code_pattern(cc);
        (0..CC_DIBITS).rev().map(|i| Dibit::new((pat >> (i * 2) & 0b11) as u8)).collect()
    }

    fn header() -> DpmrHeader {
        DpmrHeader::new([0x10, 0x00, 0x01, 0x2C, 0x00, 0x30, 0x39, 0b010_01_000, 0, 0])
    }

    #[test]
    fn test_colour_codes() {
        for a in 0..COLOUR_CODES as u8 {
            assert_eq!(colour_code(colour_code_pattern(a)), (a, 0));

            for b in 0..a {
                assert!(bits::distance(colour_code_pattern(a), colour_code_pattern(b)) >= 12);
            }
        }

        assert_eq!(colour_code(colour_code_pattern(37) ^ 0b1010_0000_0001), (37, 3));
    }

    #[test]
    fn test_fields() {
        let h = header();

        assert_eq!(h.header_type(), 1);
        assert_eq!(h.called_id(), 300);
        assert_eq!(h.own_id(), 12345);
        assert_eq!(h.comm_mode(), 0b010);
        assert_eq!(h.comm_format(), 0b01);
    }

    #[test]
    fn test_frame() {
        let mut d = decoder();
        let h = header();

        let mut stream = test_patterns::dibits(SyncType::Dpmr);
        stream.extend(h.encode());
        stream.extend(cc_dibits(42));

        // Second copy with one error in each word.
        let mut second = h.encode();

        for w in 0..HI_BYTES {
            second[w * 6] = second[w * 6].invert();
        }

        stream.extend(second);

        let events = stream.iter().filter_map(|&b| d.advance(b, 1000)).collect::<Vec<_>>();

        assert_eq!(events, vec![
            Event::SyncFound(SyncType::Dpmr),
            Event::Dpmr(DpmrEvent::ColourCode(42)),
            Event::Dpmr(DpmrEvent::Header(h)),
        ]);

        assert_eq!(d.state(), FsmState::LookForSync);

        let snap = d.snapshot();
        assert_eq!(snap.nac, 42);
        assert_eq!(snap.talkgroup, 300);
        assert_eq!(snap.source, 12345);
        assert_eq!(d.stats().hamming.words, 20);
        assert_eq!(d.stats().hamming.fixed, 10);
    }

    #[test]
    fn test_damaged_copy() {
        let mut d = decoder();
        let h = header();

        let mut first = h.encode();

        for i in 0..HI_DIBITS {
            first[i] = first[i].invert();
        }

        let mut stream = test_patterns::dibits(SyncType::Dpmr);
        stream.extend(first);
        stream.extend(cc_dibits(5));
        stream.extend(h.encode());

        let events = stream.iter().filter_map(|&b| d.advance(b, 1000)).collect::<Vec<_>>();

        assert_eq!(events.last(), Some(&Event::Dpmr(DpmrEvent::Header(h))));
        assert_eq!(d.snapshot().nac, 5);
    }
}
