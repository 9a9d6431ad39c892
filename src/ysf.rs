//! Yaesu System Fusion (YSF) frame processing.
//!
//! The sync is followed by the frame information channel header (FICH), which describes
//! the payload, then five blocks that each hold a data channel and a voice channel.

use crate::bits::{self, BitSlice, Dibit};
use crate::coding::convolution::{self, Convolution, TAIL_BITS};
use crate::coding::crc::CRC16Fich;
use crate::coding::golay;
use crate::coding::interleave::Block;
use crate::decoder::{Context, Event, Step, VoiceFrame};
use crate::error::{DecodeError, Result};
use crate::session::MbeRate;
use crate::stats::{HasStats, Stats};

/// Number of dibits in the FICH.
pub const FICH_DIBITS: usize = 100;

/// Number of dibits in a data channel block.
pub const DCH_DIBITS: usize = 20;

/// Number of dibits in a voice channel block.
pub const VCH_DIBITS: usize = 52;

/// Number of bytes in a voice codec frame.
pub const VCH_BYTES: usize = VCH_DIBITS / 4;

/// Number of data and voice blocks in a frame.
pub const BLOCKS: usize = 5;

/// Number of dibits in a frame after the sync.
pub const FRAME_DIBITS: usize = FICH_DIBITS + BLOCKS * (DCH_DIBITS + VCH_DIBITS);

/// Interleaving of the coded FICH.
const FICH_INTERLEAVE: Block = Block::new(20, 10);

/// Number of Golay-coded bits in the FICH, before the encoder tail.
const FICH_GOLAY_BITS: usize = 96;

/// Number of Golay codewords in the FICH.
const FICH_WORDS: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum FrameInfo {
    Header,
    Communication,
    Terminator,
    Test,
}

impl FrameInfo {
    pub fn from_bits(bits: u8) -> FrameInfo {
        match bits & 0b11 {
            0b00 => FrameInfo::Header,
            0b01 => FrameInfo::Communication,
            0b10 => FrameInfo::Terminator,
            _ => FrameInfo::Test,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FrameInfo::Header => "HC",
            FrameInfo::Communication => "CC",
            FrameInfo::Terminator => "TC",
            FrameInfo::Test => "TEST",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum DataType {
    /// Voice/data mode 1, with full-rate codec voice.
    VoiceData1,
    /// Full-rate data.
    DataFullRate,
    /// Voice/data mode 2, with half-rate codec voice.
    VoiceData2,
    /// Full-rate voice.
    VoiceFullRate,
}

impl DataType {
    pub fn from_bits(bits: u8) -> DataType {
        match bits & 0b11 {
            0b00 => DataType::VoiceData1,
            0b01 => DataType::DataFullRate,
            0b10 => DataType::VoiceData2,
            _ => DataType::VoiceFullRate,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DataType::VoiceData1 => "V/D1",
            DataType::DataFullRate => "DFR",
            DataType::VoiceData2 => "V/D2",
            DataType::VoiceFullRate => "VFR",
        }
    }
}

/// Decoded frame information channel header.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Fich(u32);

impl Fich {
    pub fn new(bits: u32) -> Fich { Fich(bits) }

    pub fn bits(&self) -> u32 { self.0 }

    fn field(&self, start: usize, len: usize) -> u8 {
        (self.0 >> (32 - start - len) & ((1 << len) - 1)) as u8
    }

    /// Frame information (FI).
    pub fn frame_info(&self) -> FrameInfo { FrameInfo::from_bits(self.field(0, 2)) }

    /// Callsign information (CS).
    pub fn callsign_info(&self) -> u8 { self.field(2, 2) }

    /// Call mode (CM).
    pub fn call_mode(&self) -> u8 { self.field(4, 2) }

    /// Block number (BN).
    pub fn block_number(&self) -> u8 { self.field(6, 2) }

    /// Block total (BT).
    pub fn block_total(&self) -> u8 { self.field(8, 2) }

    /// Frame number (FN).
    pub fn frame_number(&self) -> u8 { self.field(10, 3) }

    /// Frame total (FT).
    pub fn frame_total(&self) -> u8 { self.field(13, 3) }

    /// Data type (DT).
    pub fn data_type(&self) -> DataType { DataType::from_bits(self.field(22, 2)) }

    /// Whether squelch is enabled (SQL).
    pub fn squelch(&self) -> bool { self.field(24, 1) == 1 }

    /// Squelch code (SC).
    pub fn squelch_code(&self) -> u8 { self.field(25, 7) }

    /// Whether the blocks carry half-rate voice.
    fn voice(&self) -> bool {
        self.frame_info() == FrameInfo::Communication &&
            self.data_type() == DataType::VoiceData2
    }

    /// Golay-coded FICH and checksum, before convolutional coding.
    fn golay_bits(&self) -> [u8; FICH_GOLAY_BITS / 8 + 1] {
        let mut data = [0u8; 6];
        data[..4].copy_from_slice(&self.0.to_be_bytes());

        let crc = CRC16Fich::new().feed_bytes(data[..4].iter().cloned()).finish();
        data.set_bits_at(32, 16, crc as u64);

        let mut out = [0; FICH_GOLAY_BITS / 8 + 1];

        for i in 0..FICH_WORDS {
            let word = golay::g24_12::encode(data[..].bits_at(i * 12, 12) as u32);
            out.set_bits_at(i * 24, 24, word as u64);
        }

        out
    }

    /// Encode into transmitted dibits.
    pub fn encode(&self) -> Vec<Dibit> {
        let mut coded = [0; FICH_DIBITS / 4];
        convolution::encode(&self.golay_bits(), &mut coded, FICH_GOLAY_BITS + TAIL_BITS);

        let mut tx = [0; FICH_DIBITS / 4];
        FICH_INTERLEAVE.interleave(&coded, &mut tx);

        (0..FICH_DIBITS).map(|i| bits::get_dibit(&tx, i)).collect()
    }
}

/// Decode the FICH from the given received bits.
pub fn decode_fich(conv: &mut Convolution, rx: &[u8], stats: &mut Stats) -> Result<Fich> {
    let mut coded = [0; FICH_DIBITS / 4];
    FICH_INTERLEAVE.deinterleave(rx, &mut coded);

    let mut golay_bits = [0; FICH_GOLAY_BITS / 8 + 1];
    convolution::decode_stream(conv, (0..FICH_DIBITS * 2).map(|k| Some(coded[..].bit(k))),
                               &mut golay_bits, FICH_GOLAY_BITS)?;

    let mut check = [0; FICH_DIBITS / 4];
    convolution::encode(&golay_bits, &mut check, FICH_GOLAY_BITS + TAIL_BITS);

    stats.viterbi.record_fixes(
        check.iter().zip(coded.iter()).map(|(&a, &b)| bits::distance(a, b)).sum());

    let mut data = [0u8; 6];

    for i in 0..FICH_WORDS {
        let word = golay_bits[..].bits_at(i * 24, 24) as u32;

        match stats.golay.record(golay::g24_12::decode(word)) {
            Some(bits) => data.set_bits_at(i * 12, 12, bits as u64),
            None => return Err(DecodeError::GolayUnrecoverable),
        }
    }

    let crc = CRC16Fich::new().feed_bytes(data[..4].iter().cloned()).finish();

    if crc as u64 != data[..].bits_at(32, 16) {
        stats.record_err(DecodeError::Crc);
        return Err(DecodeError::Crc);
    }

    Ok(Fich(data[..].bits_at(0, 32) as u32))
}

/// Decoded YSF fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum YsfEvent {
    /// The FICH at the start of a frame was decoded.
    Fich(Fich),
}

/// Processes the dibits following a YSF sync.
pub struct YsfProcessor {
    pos: usize,
    buf: [u8; FICH_DIBITS / 4],
    conv: Convolution,
    stats: Stats,
}

impl YsfProcessor {
    pub fn new() -> YsfProcessor {
        YsfProcessor {
            pos: 0,
            buf: [0; FICH_DIBITS / 4],
            conv: Convolution::new(),
            stats: Stats::default(),
        }
    }

    /// Feed in a dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        let pos = self.pos;
        self.pos += 1;

        if pos < FICH_DIBITS {
            bits::set_dibit(&mut self.buf, pos, dibit);

            return if pos + 1 == FICH_DIBITS { self.fich(ctx) } else { Step::Pending };
        }

        if pos >= FRAME_DIBITS {
            return Step::Abort(DecodeError::FrameOverflow(pos));
        }

        let rel = pos - FICH_DIBITS;
        let (block, off) = (rel / (DCH_DIBITS + VCH_DIBITS), rel % (DCH_DIBITS + VCH_DIBITS));

        if off < DCH_DIBITS {
            return Step::Pending;
        }

        bits::set_dibit(&mut self.buf, off - DCH_DIBITS, dibit);

        if off + 1 < DCH_DIBITS + VCH_DIBITS {
            return Step::Pending;
        }

        let e = Event::Voice(VoiceFrame::new(MbeRate::Rate2450, block, &self.buf[..VCH_BYTES]));

        if block + 1 < BLOCKS { Step::Event(e) } else { Step::Done(Some(e)) }
    }

    fn fich(&mut self, ctx: &mut Context) -> Step {
        let fich = match decode_fich(&mut self.conv, &self.buf, &mut self.stats) {
            Ok(f) => f,
            Err(e) => return Step::Abort(e),
        };

        let s = &mut *ctx.session;
        let event = Event::Ysf(YsfEvent::Fich(fich));

        s.frame_type = fich.frame_info().label();

        debug!("YSF {} {} FN:{}/{} BN:{}/{}", fich.frame_info().label(),
               fich.data_type().label(), fich.frame_number(), fich.frame_total(),
               fich.block_number(), fich.block_total());

        if fich.voice() {
            s.mbe_rate = MbeRate::Rate2450;
            s.voice_active = true;

            return Step::Event(event);
        }

        s.voice_active = false;

        if fich.frame_info() == FrameInfo::Communication {
            info!("YSF {} decoding not implemented", fich.data_type().label());
        }

        Step::Done(Some(event))
    }
}

impl HasStats for YsfProcessor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}
