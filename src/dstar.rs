//! D-Star frame processing.
//!
//! D-Star carries a single bit per symbol, taken from the high bit of each
//! polarity-corrected dibit. A header sync is followed by the convolutionally coded radio
//! header, and a voice sync by a group of voice frames, each with its slow data.

use std::str;

use crate::bits::{BitSlice, Dibit};
use crate::coding::crc::CRC16Header;
use crate::coding::viterbi::DSTAR;
use crate::decoder::{Context, Event, Step, VoiceFrame};
use crate::error::DecodeError;
use crate::stats::{HasStats, Stats};

/// Number of voice frames following a voice sync.
pub const VOICE_FRAMES: usize = 21;

/// Number of voice bits in a frame.
pub const VOICE_BITS: usize = 72;

/// Number of slow data bits in a frame.
pub const SLOW_DATA_BITS: usize = 24;

/// Number of bits in a frame.
const FRAME_BITS: usize = VOICE_BITS + SLOW_DATA_BITS;

/// Number of coded bits in the radio header.
pub const HEADER_CODED_BITS: usize = 660;

/// Number of bytes in the radio header.
pub const HEADER_BYTES: usize = 41;

/// Number of decoded header bits, including the encoder flush.
const HEADER_BITS: usize = HEADER_CODED_BITS / 2;

/// Rows and columns of the header interleaver.
const HEADER_ROWS: usize = 28;
const HEADER_COLS: usize = 24;

/// Number of full-height columns of the header interleaver.
const HEADER_FULL_COLS: usize = HEADER_CODED_BITS - (HEADER_ROWS - 1) * HEADER_COLS;

/// Scrambling pattern of the slow data.
const SLOW_DATA_SCRAMBLE: [u8; 3] = [0x70, 0x4F, 0x93];

/// Get the transmitted position of the header bit at the given position before
/// interleaving.
///
/// Bits are written into the matrix row by row and sent column by column, where only the
/// first columns reach the last row.
fn header_index(k: usize) -> usize {
    let (row, col) = (k / HEADER_COLS, k % HEADER_COLS);

    let before = if col <= HEADER_FULL_COLS {
        col * HEADER_ROWS
    } else {
        HEADER_FULL_COLS * HEADER_ROWS + (col - HEADER_FULL_COLS) * (HEADER_ROWS - 1)
    };

    before + row
}

/// Apply the x<sup>7</sup> + x<sup>4</sup> + 1 header scrambler to the given bits.
fn scramble(buf: &mut [u8], bits: usize) {
    let mut state = 0x7Fu8;

    for i in 0..bits {
        let fb = (state >> 6 ^ state >> 3) & 1;
        state = (state << 1 | fb) & 0x7F;

        let b = buf.bit(i);
        buf.set_bit(i, b ^ (fb == 1));
    }
}

/// The radio header sent before a voice transmission.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DStarHeader([u8; HEADER_BYTES]);

impl DStarHeader {
    /// Build a header from its fields, with each callsign padded by spaces.
    pub fn new(flags: [u8; 3], rpt2: &str, rpt1: &str, your: &str, my: &str,
               suffix: &str)
        -> DStarHeader
    {
        let mut buf = [b' '; HEADER_BYTES];
        buf[..3].copy_from_slice(&flags);

        for &(start, len, s) in [(3, 8, rpt2), (11, 8, rpt1), (19, 8, your), (27, 8, my),
                                 (35, 4, suffix)].iter()
        {
            let s = s.as_bytes();
            let n = s.len().min(len);

            buf[start..start + n].copy_from_slice(&s[..n]);
        }

        let crc = Self::crc(&buf);
        buf[39] = crc as u8;
        buf[40] = (crc >> 8) as u8;

        DStarHeader(buf)
    }

    fn crc(buf: &[u8; HEADER_BYTES]) -> u32 {
        CRC16Header::new().feed_bytes(buf[..39].iter().cloned()).finish()
    }

    pub fn bytes(&self) -> &[u8; HEADER_BYTES] { &self.0 }

    /// Whether the checksum matches the header.
    pub fn crc_valid(&self) -> bool {
        Self::crc(&self.0) == (self.0[40] as u32) << 8 | self.0[39] as u32
    }

    pub fn flags(&self) -> [u8; 3] { [self.0[0], self.0[1], self.0[2]] }

    fn text(&self, start: usize, len: usize) -> &str {
        str::from_utf8(&self.0[start..start + len]).unwrap_or("").trim_end()
    }

    /// Destination repeater callsign.
    pub fn rpt2(&self) -> &str { self.text(3, 8) }

    /// Departure repeater callsign.
    pub fn rpt1(&self) -> &str { self.text(11, 8) }

    /// Companion callsign.
    pub fn your(&self) -> &str { self.text(19, 8) }

    /// Own callsign.
    pub fn my(&self) -> &str { self.text(27, 8) }

    pub fn my_suffix(&self) -> &str { self.text(35, 4) }

    /// Encode into transmitted dibits.
    pub fn encode(&self) -> Vec<Dibit> {
        let mut data = [0; HEADER_BYTES + 1];
        data[..HEADER_BYTES].copy_from_slice(&self.0);

        let mut coded = [0; HEADER_CODED_BITS / 8 + 1];
        DSTAR.encode(&data, HEADER_BITS, &mut coded);

        let mut tx = [0; HEADER_CODED_BITS / 8 + 1];

        for k in 0..HEADER_CODED_BITS {
            tx.set_bit(header_index(k), coded[..].bit(k));
        }

        scramble(&mut tx, HEADER_CODED_BITS);

        (0..HEADER_CODED_BITS).map(|i| Dibit::new((tx[..].bit(i) as u8) << 1 | 1)).collect()
    }
}

/// Decoded D-Star fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DStarEvent {
    /// A radio header was decoded.
    Header(DStarHeader),
    /// The descrambled slow data of the given voice frame was received.
    SlowData(usize, [u8; 3]),
}

/// Processes the symbols following a D-Star sync.
pub struct DStarProcessor {
    header: bool,
    /// Position of the next bit within the current frame.
    pos: usize,
    /// Current voice frame.
    frame: usize,
    buf: [u8; HEADER_CODED_BITS / 8 + 1],
    stats: Stats,
}

impl DStarProcessor {
    /// Create a new `DStarProcessor` for a radio header if `header` is set, or for voice
    /// frames otherwise.
    pub fn new(header: bool) -> DStarProcessor {
        DStarProcessor {
            header,
            pos: 0,
            frame: 0,
            buf: [0; HEADER_CODED_BITS / 8 + 1],
            stats: Stats::default(),
        }
    }

    /// Whether a radio header is being received.
    pub fn header(&self) -> bool { self.header }

    /// Feed in a polarity-corrected dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        let pos = self.pos;
        self.pos += 1;

        self.buf.set_bit(pos, dibit.hi() == 1);

        if self.header {
            if self.pos < HEADER_CODED_BITS {
                Step::Pending
            } else {
                self.decode_header(ctx)
            }
        } else {
            self.voice(pos, ctx)
        }
    }

    fn voice(&mut self, pos: usize, ctx: &mut Context) -> Step {
        ctx.session.voice_active = true;
        ctx.session.frame_type = "VOICE";

        if pos + 1 == VOICE_BITS {
            let mut bytes = [0; VOICE_BITS / 8];
            bytes.copy_from_slice(&self.buf[..VOICE_BITS / 8]);

            let vf = VoiceFrame::new(ctx.session.mbe_rate, self.frame, &bytes);

            return Step::Event(Event::Voice(vf));
        }

        if pos + 1 < FRAME_BITS {
            return Step::Pending;
        }

        let mut slow = [0; 3];

        for (i, b) in slow.iter_mut().enumerate() {
            *b = self.buf[VOICE_BITS / 8 + i] ^ SLOW_DATA_SCRAMBLE[i];
        }

        let event = Event::DStar(DStarEvent::SlowData(self.frame, slow));

        self.pos = 0;
        self.frame += 1;

        if self.frame < VOICE_FRAMES {
            Step::Event(event)
        } else {
            Step::Done(Some(event))
        }
    }

    fn decode_header(&mut self, ctx: &mut Context) -> Step {
        scramble(&mut self.buf, HEADER_CODED_BITS);

        let mut coded = [0; HEADER_CODED_BITS / 8 + 1];

        for k in 0..HEADER_CODED_BITS {
            coded.set_bit(k, self.buf[..].bit(header_index(k)));
        }

        let mut data = [0; HEADER_BYTES + 1];
        let err = DSTAR.decode(&coded, HEADER_BITS, &mut data);

        self.stats.viterbi.record_fixes(err);

        let mut buf = [0; HEADER_BYTES];
        buf.copy_from_slice(&data[..HEADER_BYTES]);

        let h = DStarHeader(buf);

        if !h.crc_valid() {
            self.stats.record_err(DecodeError::Crc);
            return Step::Abort(DecodeError::Crc);
        }

        ctx.session.frame_type = "HEADER";

        info!("D-Star header MY:{}/{} YOUR:{} RPT1:{} RPT2:{}", h.my(), h.my_suffix(),
              h.your(), h.rpt1(), h.rpt2());

        Step::Done(Some(Event::DStar(DStarEvent::Header(h))))
    }
}

impl HasStats for DStarProcessor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::{Config, DecodeMode};
    use crate::decoder::{Decoder, FsmState};
    use crate::session::MbeRate;
    use crate::sync::test_patterns;
    use crate::sync::{SyncType, WARMUP};

    fn decoder() -> Decoder {
        let mut d = Decoder::new(Config::with_mode(DecodeMode::DStar));

        for _ in 0..WARMUP {
            assert_eq!(d.advance(Dibit::new(0), 1000), None);
        }

        d
    }

    fn feed(d: &mut Decoder, dibits: &[Dibit]) -> Vec<Event> {
        dibits.iter().filter_map(|&b| d.advance(b, 1000)).collect()
    }

    fn header() -> DStarHeader {
        DStarHeader::new([0, 0, 0], "W1AW  B", "W1AW  G", "CQCQCQ", "KD2ABC", "ID51")
    }

    #[test]
    fn test_interleave() {
        let mut seen = vec![false; HEADER_CODED_BITS];

        for k in 0..HEADER_CODED_BITS {
            let i = header_index(k);
            assert!(!seen[i]);
            seen[i] = true;
        }

        assert_eq!(header_index(0), 0);
        assert_eq!(header_index(1), HEADER_ROWS);
        assert_eq!(header_index(HEADER_COLS), 1);
        assert_eq!(header_index(HEADER_CODED_BITS - 1), HEADER_FULL_COLS * HEADER_ROWS - 1);
    }

    #[test]
    fn test_header_fields() {
        let h = header();

        assert!(h.crc_valid());
        assert_eq!(h.rpt2(), "W1AW  B");
        assert_eq!(h.my(), "KD2ABC");
        assert_eq!(h.my_suffix(), "ID51");
        assert_eq!(h.your(), "CQCQCQ");

        let mut bytes = *h.bytes();
        bytes[30] ^= 1;
        assert!(!DStarHeader(bytes).crc_valid());
    }

    #[test]
    fn test_header() {
        let mut d = decoder();
        let h = header();

        let mut stream = test_patterns::dibits(SyncType::DStarHeaderPos);
        let mut coded = h.encode();

        for &i in [5, 200, 400, 610].iter() {
            coded[i] = coded[i].invert();
        }

        stream.extend(coded);

        let events = feed(&mut d, &stream);

        assert_eq!(events, vec![
            Event::SyncFound(SyncType::DStarHeaderPos),
            Event::DStar(DStarEvent::Header(h)),
        ]);

        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().frame_type, "HEADER");
        assert_eq!(d.stats().viterbi.fixed, 4);
    }

    #[test]
    fn test_header_state() {
        let mut d = decoder();

        feed(&mut d, &test_patterns::dibits(SyncType::DStarHeaderNeg));
        d.advance(Dibit::new(0), 1000);

        assert_eq!(d.state(), FsmState::ProcessDStarHeader);
    }

    #[test]
    fn test_voice() {
        let mut d = decoder();
        let mut stream = test_patterns::dibits(SyncType::DStarPos);

        for f in 0..VOICE_FRAMES {
            let voice = (0..VOICE_BITS).map(|i| Dibit::new(((i + f) % 2) as u8 * 2 + 1));
            stream.extend(voice);

            let slow = (0..SLOW_DATA_BITS).map(|i| {
                Dibit::new((SLOW_DATA_SCRAMBLE[i / 8] >> (7 - i % 8) & 1) << 1)
            });

            stream.extend(slow);
        }

        let events = feed(&mut d, &stream);
        assert_eq!(events.len(), 1 + VOICE_FRAMES * 2);

        for (f, pair) in events[1..].chunks(2).enumerate() {
            match pair[0] {
                Event::Voice(vf) => {
                    let fill = if f % 2 == 0 { 0x55 } else { 0xAA };

                    assert_eq!(vf.index, f);
                    assert_eq!(vf.rate, MbeRate::Rate3600x2400);
                    assert_eq!(vf.bytes(), &[fill; VOICE_BITS / 8]);
                },
                _ => panic!(),
            }

            assert_eq!(pair[1], Event::DStar(DStarEvent::SlowData(f, [0; 3])));
        }

        assert_eq!(d.state(), FsmState::LookForSync);
    }
}
