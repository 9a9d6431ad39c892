//! Receive logical data units (LDU1/LDU2), which carry 18 voice frames followed by a
//! link control or encryption sync word and a run of status symbols.

use crate::bits::{self, BitSlice, Dibit};
use crate::buffer::{Buffer, DibitStorage, VoiceFrameStorage};
use crate::coding::golay;
use crate::error::{DecodeError, Result};
use crate::session::Session;
use crate::stats::{HasStats, Stats};

use crate::p25::control::LinkControlFields;
use crate::p25::crypto::EncryptionSync;
use crate::p25::status::StatusCode;
use crate::p25::P25Event;

/// Number of voice frames in an LDU.
pub const VOICE_FRAMES: usize = 18;

/// Number of dibits per voice frame.
pub const FRAME_DIBITS: usize = 88;

/// Number of leading voice frame dibits handed to the vocoder.
pub const VOICE_DIBITS: usize = 44;

/// Number of bytes in a packed voice frame.
pub const VOICE_BYTES: usize = VOICE_DIBITS / 4;

/// Number of Golay words in the link control or encryption sync section.
const EXTRA_WORDS: usize = 6;

/// Number of dibits per Golay word.
const WORD_DIBITS: usize = 12;

/// Number of status dibits at the end of the LDU.
const STATUS_DIBITS: usize = 72;

const VOICE_END: usize = VOICE_FRAMES * FRAME_DIBITS;
const EXTRA_END: usize = VOICE_END + EXTRA_WORDS * WORD_DIBITS;

/// Number of dibits in an LDU following the NID.
pub const LDU_DIBITS: usize = EXTRA_END + STATUS_DIBITS;

/// The word carried after the voice frames, which differs between LDU1 and LDU2.
pub trait Extra {
    type Fields: Copy;

    /// Interpret the decoded bytes.
    fn decode_extra(buf: [u8; 9]) -> Self::Fields;

    /// Record the fields into the current call state.
    fn update(fields: &Self::Fields, s: &mut Session);

    /// Wrap the fields into an event.
    fn event(fields: Self::Fields) -> P25Event;
}

/// Link control word of LDU1.
pub struct LinkControlExtra;

impl Extra for LinkControlExtra {
    type Fields = LinkControlFields;

    fn decode_extra(buf: [u8; 9]) -> Self::Fields { LinkControlFields::new(buf) }

    fn update(lc: &LinkControlFields, s: &mut Session) {
        s.talkgroup = lc.destination();
        s.source = lc.src_unit();
        s.emergency = lc.emergency();

        info!("P25 TG:{} SRC:{}{}", s.talkgroup, s.source,
              if s.emergency { " EMERGENCY" } else { "" });
    }

    fn event(lc: LinkControlFields) -> P25Event { P25Event::LinkControl(lc) }
}

/// Encryption sync word of LDU2.
pub struct EncryptionExtra;

impl Extra for EncryptionExtra {
    type Fields = EncryptionSync;

    fn decode_extra(buf: [u8; 9]) -> Self::Fields { EncryptionSync::new(buf) }

    fn update(es: &EncryptionSync, s: &mut Session) {
        s.algid = es.algid();
        s.keyid = es.crypto_key();
        s.encrypted = es.encrypted();

        info!("P25 ALG:{:02X} ({}) KEY:{:04X}", s.algid,
              es.crypto_alg().map_or("UNKNOWN", |a| a.label()), s.keyid);
    }

    fn event(es: EncryptionSync) -> P25Event { P25Event::EncryptionSync(es) }
}

pub type Ldu1Receiver = LduReceiver<LinkControlExtra>;
pub type Ldu2Receiver = LduReceiver<EncryptionExtra>;

pub enum LduEvent<E: Extra> {
    /// A voice frame with the given index was received.
    VoiceFrame(usize, [u8; VOICE_BYTES]),
    /// The link control or encryption sync word was decoded.
    Extra(E::Fields),
    /// The final dibit was received, with the last status symbol.
    Done(StatusCode),
}

/// Receives the dibits of an LDU following the NID.
pub struct LduReceiver<E: Extra> {
    extra: std::marker::PhantomData<E>,
    frame: Buffer<VoiceFrameStorage>,
    word: Buffer<DibitStorage>,
    /// Decoded bits of the extra word.
    bytes: [u8; 9],
    /// Number of Golay words decoded.
    words: usize,
    /// Most recent status symbol.
    status: StatusCode,
    /// Number of dibits received.
    pos: usize,
    stats: Stats,
}

impl<E: Extra> LduReceiver<E> {
    pub fn new() -> LduReceiver<E> {
        LduReceiver {
            extra: std::marker::PhantomData,
            frame: Buffer::new(VoiceFrameStorage::new()),
            word: Buffer::new(DibitStorage::new(WORD_DIBITS)),
            bytes: [0; 9],
            words: 0,
            status: StatusCode::InboundIdle,
            pos: 0,
            stats: Stats::default(),
        }
    }

    /// Feed in a dibit, possibly producing an event.
    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<LduEvent<E>>> {
        let pos = self.pos;
        self.pos += 1;

        if pos < VOICE_END {
            let buf = self.frame.feed(dibit)?;
            let mut bytes = [0; VOICE_BYTES];

            bits::pack_msb_first(buf[..VOICE_DIBITS].iter().cloned(), &mut bytes);

            Some(Ok(LduEvent::VoiceFrame(pos / FRAME_DIBITS, bytes)))
        } else if pos < EXTRA_END {
            let word = *self.word.feed(dibit)? as u32;

            let data = match self.stats.golay.record(golay::g24_12_8::decode(word)) {
                Some(data) => data,
                None => return Some(Err(DecodeError::GolayUnrecoverable)),
            };

            self.bytes.set_bits_at(self.words * 12, 12, data as u64);
            self.words += 1;

            if self.words == EXTRA_WORDS {
                Some(Ok(LduEvent::Extra(E::decode_extra(self.bytes))))
            } else {
                None
            }
        } else if pos < LDU_DIBITS {
            self.status = StatusCode::from_dibit(dibit);

            if self.pos == LDU_DIBITS {
                Some(Ok(LduEvent::Done(self.status)))
            } else {
                None
            }
        } else {
            Some(Err(DecodeError::FrameOverflow(pos)))
        }
    }
}

impl<E: Extra> HasStats for LduReceiver<E> {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

/// Encode the given 9-byte word into the 72 dibits carried by an LDU.
pub fn encode_extra(buf: &[u8; 9]) -> [Dibit; EXTRA_WORDS * WORD_DIBITS] {
    let mut out = [Dibit::default(); EXTRA_WORDS * WORD_DIBITS];

    for w in 0..EXTRA_WORDS {
        let word = golay::g24_12_8::encode(buf[..].bits_at(w * 12, 12) as u32);

        for d in 0..WORD_DIBITS {
            out[w * WORD_DIBITS + d] = Dibit::new((word >> (22 - d * 2) & 0b11) as u8);
        }
    }

    out
}
