//! DMR burst processing.
//!
//! A data sync is followed by the rest of a single burst, whose slot type straddles the
//! sync. A voice sync starts a superframe, where the sync burst (A) is followed by five
//! bursts (B-F) that carry the EMB and the embedded link control in place of the sync.

use crate::bits::{self, BitSlice, Dibit};
use crate::coding::interleave::Block;
use crate::coding::{golay, hamming, qr};
use crate::decoder::{Context, Event, FsmState, Step, VoiceFrame};
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};
use crate::sync::{SyncType, Window};

/// Number of dibits in a timeslot, including the CACH that precedes it.
pub const BURST_DIBITS: usize = 144;

/// Number of dibits in the common announcement channel.
pub const CACH_DIBITS: usize = 12;

/// Number of dibits on each side of the sync or EMB field.
pub const HALF_DIBITS: usize = 54;

/// Number of dibits in the sync or EMB field.
pub const CENTER_DIBITS: usize = 24;

/// Number of dibits of the slot type on each side of the sync.
pub const SLOT_TYPE_DIBITS: usize = 5;

/// Number of bytes in a voice codec frame.
pub const VOICE_BYTES: usize = 9;

/// Number of dibits in a voice codec frame.
const VOICE_DIBITS: usize = VOICE_BYTES * 4;

/// Number of bursts after the sync burst in a voice superframe.
pub const VOICE_BURSTS: usize = 5;

/// Number of bursts carrying embedded link control fragments.
const EMBEDDED_BURSTS: usize = 4;

/// Number of bytes in a link control word.
pub const LC_BYTES: usize = 9;

/// Positions of the TACT bits within the CACH.
const TACT_BITS: [usize; 7] = [0, 4, 8, 12, 14, 18, 22];

/// Interleaving of the embedded link control matrix, 8 rows of 16 bits.
const EMBEDDED: Block = Block::new(8, 16);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum DataType {
    PrivacyHeader,
    VoiceHeader,
    Terminator,
    Csbk,
    MultiBlockHeader,
    MultiBlock,
    DataHeader,
    Rate12Data,
    Rate34Data,
    Idle,
    Rate1Data,
    Reserved(u8),
}

impl DataType {
    pub fn from_bits(bits: u8) -> DataType {
        use self::DataType::*;

        match bits & 0xF {
            0b0000 => PrivacyHeader,
            0b0001 => VoiceHeader,
            0b0010 => Terminator,
            0b0011 => Csbk,
            0b0100 => MultiBlockHeader,
            0b0101 => MultiBlock,
            0b0110 => DataHeader,
            0b0111 => Rate12Data,
            0b1000 => Rate34Data,
            0b1001 => Idle,
            0b1010 => Rate1Data,
            b => Reserved(b),
        }
    }

    pub fn to_bits(self) -> u8 {
        use self::DataType::*;

        match self {
            PrivacyHeader => 0b0000,
            VoiceHeader => 0b0001,
            Terminator => 0b0010,
            Csbk => 0b0011,
            MultiBlockHeader => 0b0100,
            MultiBlock => 0b0101,
            DataHeader => 0b0110,
            Rate12Data => 0b0111,
            Rate34Data => 0b1000,
            Idle => 0b1001,
            Rate1Data => 0b1010,
            Reserved(b) => b & 0xF,
        }
    }

    pub fn label(self) -> &'static str {
        use self::DataType::*;

        match self {
            PrivacyHeader => "PI_HDR",
            VoiceHeader => "VLC",
            Terminator => "TLC",
            Csbk => "CSBK",
            MultiBlockHeader => "MBC_HDR",
            MultiBlock => "MBC",
            DataHeader => "DATA_HDR",
            Rate12Data => "R12_DATA",
            Rate34Data => "R34_DATA",
            Idle => "IDLE",
            Rate1Data => "R1_DATA",
            Reserved(_) => "RESERVED",
        }
    }
}

/// Slot type of a data burst.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct SlotType {
    pub colour_code: u8,
    pub data_type: DataType,
}

impl SlotType {
    pub fn from_bits(bits: u8) -> SlotType {
        SlotType {
            colour_code: bits >> 4,
            data_type: DataType::from_bits(bits),
        }
    }

    pub fn to_bits(&self) -> u8 { self.colour_code << 4 | self.data_type.to_bits() }
}

/// TDMA access channel type, carried in the CACH of a repeater's bursts.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Tact {
    /// Whether the inbound channel is busy.
    pub busy: bool,
    /// Timeslot of the following burst.
    pub slot: u8,
    /// Fragment position of the short link control.
    pub lcss: u8,
}

impl Tact {
    pub fn from_bits(bits: u8) -> Tact {
        Tact {
            busy: bits >> 3 & 1 == 1,
            slot: bits >> 2 & 1,
            lcss: bits & 0b11,
        }
    }

    pub fn to_bits(&self) -> u8 { (self.busy as u8) << 3 | (self.slot & 1) << 2 | self.lcss & 0b11 }
}

/// Embedded signalling field of a voice burst.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Emb {
    pub colour_code: u8,
    /// Whether the call is encrypted.
    pub privacy: bool,
    /// Fragment position of the embedded link control.
    pub lcss: u8,
}

impl Emb {
    pub fn from_bits(bits: u8) -> Emb {
        Emb {
            colour_code: bits >> 3 & 0xF,
            privacy: bits >> 2 & 1 == 1,
            lcss: bits & 0b11,
        }
    }

    pub fn to_bits(&self) -> u8 {
        (self.colour_code & 0xF) << 3 | (self.privacy as u8) << 2 | self.lcss & 0b11
    }
}

/// Full link control word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct LinkControl([u8; LC_BYTES]);

impl LinkControl {
    pub fn new(buf: [u8; LC_BYTES]) -> LinkControl { LinkControl(buf) }

    pub fn bytes(&self) -> &[u8; LC_BYTES] { &self.0 }

    /// Whether the link control is protected.
    pub fn protected(&self) -> bool { self.0[0] >> 7 == 1 }

    /// Full link control opcode.
    pub fn opcode(&self) -> u8 { self.0[0] & 0x3F }

    /// Feature set ID.
    pub fn feature_set(&self) -> u8 { self.0[1] }

    pub fn service_options(&self) -> u8 { self.0[2] }

    pub fn emergency(&self) -> bool { self.0[2] >> 7 == 1 }

    /// Whether the call is to a talkgroup rather than a single unit.
    pub fn group(&self) -> bool { self.opcode() == 0 }

    /// Called talkgroup or unit.
    pub fn target(&self) -> u32 { self.0[..].bits_at(24, 24) as u32 }

    /// Calling unit.
    pub fn source(&self) -> u32 { self.0[..].bits_at(48, 24) as u32 }

    /// Checksum carried alongside the link control in the embedded signalling.
    fn checksum(&self) -> u8 {
        (self.0.iter().map(|&b| b as u32).sum::<u32>() % 31) as u8
    }
}

/// Decoded DMR fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DmrEvent {
    /// The slot type of a data burst was decoded.
    SlotType(SlotType),
    /// The TACT of the CACH following a data burst was decoded.
    Tact(Tact),
    /// The EMB of a voice burst was decoded.
    Emb(Emb),
    /// The embedded link control of a voice superframe was decoded.
    LinkControl(LinkControl),
}

/// Decode the embedded link control from the given 128 received bits.
pub fn decode_embedded(rx: &[u8], stats: &mut Stats) -> Result<LinkControl> {
    let mut matrix = [0; 16];
    EMBEDDED.deinterleave(rx, &mut matrix);

    let mut data = [0; 10];
    let mut parity = 0;

    for row in 0..7 {
        let word = matrix[..].bits_at(row * 16, 16) as u32;

        let bits = match stats.hamming.record(hamming::h16_11::decode(word)) {
            Some(bits) => bits,
            None => return Err(DecodeError::HammingUnrecoverable),
        };

        parity ^= hamming::h16_11::encode(bits);
        data.set_bits_at(row * 11, 11, bits as u64);
    }

    if parity as u64 != matrix[..].bits_at(7 * 16, 16) {
        return Err(DecodeError::Parity);
    }

    let mut lc = [0; LC_BYTES];
    lc.copy_from_slice(&data[..LC_BYTES]);

    let lc = LinkControl(lc);

    if data[..].bits_at(72, 5) as u8 != lc.checksum() {
        return Err(DecodeError::Crc);
    }

    Ok(lc)
}

/// Encode the given link control into the four embedded signalling fragments.
pub fn encode_embedded(lc: &LinkControl) -> [u32; EMBEDDED_BURSTS] {
    let mut data = [0; 10];
    data[..LC_BYTES].copy_from_slice(&lc.0);
    data.set_bits_at(72, 5, lc.checksum() as u64);

    let mut matrix = [0; 16];
    let mut parity = 0;

    for row in 0..7 {
        let word = hamming::h16_11::encode(data[..].bits_at(row * 11, 11) as u32);

        parity ^= word;
        matrix.set_bits_at(row * 16, 16, word as u64);
    }

    matrix.set_bits_at(7 * 16, 16, parity as u64);

    let mut tx = [0; 16];
    EMBEDDED.interleave(&matrix, &mut tx);

    let mut out = [0; EMBEDDED_BURSTS];

    for (i, frag) in out.iter_mut().enumerate() {
        *frag = tx[..].bits_at(i * 32, 32) as u32;
    }

    out
}

/// Collects the embedded signalling fragments of bursts B-E.
struct EmbeddedReceiver {
    bits: [u8; 16],
    seen: u8,
}

impl EmbeddedReceiver {
    fn new() -> EmbeddedReceiver {
        EmbeddedReceiver { bits: [0; 16], seen: 0 }
    }

    /// Add the fragment from the given burst, returning the complete bits once every
    /// fragment has been seen.
    fn feed(&mut self, idx: usize, frag: u32) -> Option<&[u8]> {
        self.bits.set_bits_at(idx * 32, 32, frag as u64);
        self.seen |= 1 << idx;

        if self.seen == (1 << EMBEDDED_BURSTS) - 1 {
            Some(&self.bits[..])
        } else {
            None
        }
    }
}

/// Receives the remainder of a data burst, along with the CACH that follows it when
/// sent by a repeater.
struct DataBurst {
    pos: usize,
    /// Whether the following CACH is received.
    cach: bool,
    slot_type: u32,
    cach_bits: u32,
}

impl DataBurst {
    fn new(cach: bool, window: &Window) -> DataBurst {
        // Window holds the first dibit after the sync, then the sync, then the first
        // half of the slot type.
        let start = 1 + CENTER_DIBITS;

        let slot_type = (start..start + SLOT_TYPE_DIBITS).rev().fold(0, |word, n| {
            word << 2 | window.back(n).bits() as u32
        });

        DataBurst {
            pos: 0,
            cach,
            slot_type,
            cach_bits: 0,
        }
    }

    fn feed(&mut self, dibit: Dibit, ctx: &mut Context, stats: &mut Stats) -> Step {
        let pos = self.pos;
        self.pos += 1;

        if pos < SLOT_TYPE_DIBITS {
            self.slot_type = self.slot_type << 2 | dibit.bits() as u32;

            if pos + 1 < SLOT_TYPE_DIBITS {
                return Step::Pending;
            }

            let st = match stats.golay.record(golay::g20_8::decode(self.slot_type)) {
                Some(bits) => SlotType::from_bits(bits as u8),
                None => return Step::Abort(DecodeError::GolayUnrecoverable),
            };

            ctx.session.nac = st.colour_code as u16;
            ctx.session.frame_type = st.data_type.label();

            debug!("DMR CC:{} {}", st.colour_code, st.data_type.label());

            return Step::Event(Event::Dmr(DmrEvent::SlotType(st)));
        }

        if pos < HALF_DIBITS {
            return if pos + 1 == HALF_DIBITS && !self.cach {
                Step::Done(None)
            } else {
                Step::Pending
            };
        }

        let idx = pos - HALF_DIBITS;

        if idx >= CACH_DIBITS {
            return Step::Abort(DecodeError::FrameOverflow(pos));
        }

        self.cach_bits = self.cach_bits << 2 | dibit.bits() as u32;

        if idx + 1 < CACH_DIBITS {
            return Step::Pending;
        }

        let word = TACT_BITS.iter().fold(0, |word, &b| {
            word << 1 | self.cach_bits >> (CACH_DIBITS * 2 - 1 - b) & 1
        });

        match stats.hamming.record(hamming::h7_4::decode(word)) {
            Some(bits) => Step::Done(Some(Event::Dmr(DmrEvent::Tact(
                Tact::from_bits(bits as u8))))),
            None => Step::Abort(DecodeError::HammingUnrecoverable),
        }
    }
}

/// Receives the bursts of a voice superframe following the sync burst.
struct VoiceSuperframe {
    /// Whether bursts of the other timeslot are interleaved, as sent by a repeater.
    base: bool,
    /// Current burst, where 0 is the second half of the sync burst.
    burst: usize,
    /// Position within the current burst.
    pos: usize,
    /// Voice payload of the current burst.
    payload: [u8; HALF_DIBITS / 2],
    emb: [u8; CENTER_DIBITS / 4],
    embedded: EmbeddedReceiver,
}

/// Part of a voice burst holding a received dibit.
enum VoicePart {
    Skip,
    /// Payload dibit with the given index.
    Payload(usize),
    /// EMB field dibit with the given index.
    Center(usize),
}

impl VoiceSuperframe {
    fn new(base: bool) -> VoiceSuperframe {
        VoiceSuperframe {
            base,
            burst: 0,
            pos: 0,
            payload: [0; HALF_DIBITS / 2],
            emb: [0; CENTER_DIBITS / 4],
            embedded: EmbeddedReceiver::new(),
        }
    }

    /// Number of dibits in each burst after the sync burst.
    fn burst_len(&self) -> usize {
        if self.base { BURST_DIBITS * 2 } else { BURST_DIBITS }
    }

    fn part(&self) -> VoicePart {
        if self.burst == 0 {
            return VoicePart::Payload(HALF_DIBITS + self.pos);
        }

        let skip = if self.base { BURST_DIBITS } else { 0 } + CACH_DIBITS;

        if self.pos < skip {
            return VoicePart::Skip;
        }

        match self.pos - skip {
            p if p < HALF_DIBITS => VoicePart::Payload(p),
            p if p < HALF_DIBITS + CENTER_DIBITS => VoicePart::Center(p - HALF_DIBITS),
            p => VoicePart::Payload(p - CENTER_DIBITS),
        }
    }

    fn feed(&mut self, dibit: Dibit, ctx: &mut Context, stats: &mut Stats) -> Step {
        let step = match self.part() {
            VoicePart::Skip => Step::Pending,
            VoicePart::Payload(idx) => {
                bits::set_dibit(&mut self.payload, idx, dibit);
                self.payload_step(idx, ctx)
            },
            VoicePart::Center(idx) => {
                bits::set_dibit(&mut self.emb, idx, dibit);

                if idx + 1 == CENTER_DIBITS {
                    self.center_step(ctx, stats)
                } else {
                    Step::Pending
                }
            },
        };

        self.pos += 1;

        let len = if self.burst == 0 { HALF_DIBITS } else { self.burst_len() };

        if self.pos < len {
            return step;
        }

        self.pos = 0;
        self.burst += 1;

        if self.burst <= VOICE_BURSTS {
            return step;
        }

        match step {
            Step::Event(e) => Step::Done(Some(e)),
            Step::Pending => Step::Done(None),
            other => other,
        }
    }

    /// Emit the voice frame completed by the payload dibit at the given index.
    fn payload_step(&self, idx: usize, ctx: &mut Context) -> Step {
        if (idx + 1) % VOICE_DIBITS != 0 {
            return Step::Pending;
        }

        let frame = idx / VOICE_DIBITS;

        // Only the end of the sync burst was received.
        if self.burst == 0 && frame < 2 {
            return Step::Pending;
        }

        let start = frame * VOICE_BYTES;
        let vf = VoiceFrame::new(ctx.session.mbe_rate, self.burst * 3 + frame,
                                 &self.payload[start..start + VOICE_BYTES]);

        Step::Event(Event::Voice(vf))
    }

    fn center_step(&mut self, ctx: &mut Context, stats: &mut Stats) -> Step {
        let word = (self.emb[..].bits_at(0, 8) << 8 | self.emb[..].bits_at(40, 8)) as u32;

        let emb = match stats.qr.record(qr::qr16_7::decode(word)) {
            Some(bits) => Emb::from_bits(bits as u8),
            None => {
                debug!("skipping DMR burst with bad EMB");
                return Step::Pending;
            },
        };

        let s = &mut *ctx.session;

        s.nac = emb.colour_code as u16;
        s.encrypted = emb.privacy;

        let idx = self.burst - 1;

        if idx >= EMBEDDED_BURSTS {
            return Step::Event(Event::Dmr(DmrEvent::Emb(emb)));
        }

        let frag = self.emb[..].bits_at(8, 32) as u32;

        let bits = match self.embedded.feed(idx, frag) {
            Some(bits) => bits,
            None => return Step::Event(Event::Dmr(DmrEvent::Emb(emb))),
        };

        match decode_embedded(bits, stats) {
            Ok(lc) => {
                s.talkgroup = lc.target();
                s.source = lc.source();
                s.emergency = lc.emergency();

                info!("DMR {} TG:{} SRC:{}", if lc.group() { "group" } else { "unit" },
                      lc.target(), lc.source());

                Step::Event(Event::Dmr(DmrEvent::LinkControl(lc)))
            },
            Err(e) => {
                debug!("DMR embedded link control: {}", e);
                stats.record_err(e);

                Step::Event(Event::Dmr(DmrEvent::Emb(emb)))
            },
        }
    }
}

enum Burst {
    Data(DataBurst),
    Voice(VoiceSuperframe),
}

/// Processes the dibits following a DMR sync.
pub struct DmrProcessor {
    sync: SyncType,
    burst: Burst,
    stats: Stats,
}

impl DmrProcessor {
    /// Create a new `DmrProcessor` for the given sync, where the window ends with the
    /// sync and the first dibit after it.
    pub fn new(sync: SyncType, window: &Window) -> DmrProcessor {
        use crate::sync::SyncType::*;

        let burst = match sync {
            DmrVoice => Burst::Voice(VoiceSuperframe::new(true)),
            DmrVoiceMs => Burst::Voice(VoiceSuperframe::new(false)),
            DmrDataMs => Burst::Data(DataBurst::new(false, window)),
            _ => Burst::Data(DataBurst::new(true, window)),
        };

        DmrProcessor {
            sync,
            burst,
            stats: Stats::default(),
        }
    }

    pub fn fsm_state(&self) -> FsmState {
        match self.sync {
            SyncType::DmrVoice => FsmState::ProcessDmrVoice,
            SyncType::DmrVoiceMs => FsmState::ProcessDmrVoiceMs,
            SyncType::DmrDataMs => FsmState::ProcessDmrDataMs,
            _ => FsmState::ProcessDmrData,
        }
    }

    /// Feed in a dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        match self.burst {
            Burst::Data(ref mut b) => b.feed(dibit, ctx, &mut self.stats),
            Burst::Voice(ref mut v) => {
                ctx.session.frame_type = "VOICE";
                ctx.session.voice_active = true;

                v.feed(dibit, ctx, &mut self.stats)
            },
        }
    }
}

impl HasStats for DmrProcessor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}
