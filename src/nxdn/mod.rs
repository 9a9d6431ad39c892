//! NXDN frame processing, from the LICH that follows the frame sync word through the
//! end of the frame payload.
//!
//! After the 10-dibit sync word, a frame carries the LICH, the SACCH, and a payload of
//! either four voice channels or two FACCH1 halves, as chosen by the LICH steal field.

pub mod channel;
pub mod lich;
pub mod message;

use crate::bits::{self, Dibit};
use crate::coding::convolution::Convolution;
use crate::decoder::{Context, Event, Step, VoiceFrame};
use crate::error::DecodeError;
use crate::session::Session;
use crate::stats::{HasStats, Stats};

use self::channel::{Sacch, FACCH1_DIBITS, SACCH_DIBITS};
use self::lich::{Lich, LichReceiver, RfChannel, Steal, LICH_DIBITS};
use self::message::{Message, MessageType};

/// Number of dibits in a frame after the sync word.
pub const FRAME_DIBITS: usize = 182;

/// Number of dibits in a voice channel.
pub const VCH_DIBITS: usize = 36;

/// Number of bytes in a voice codec frame.
pub const VCH_BYTES: usize = 9;

/// Start of the SACCH within the frame.
const SACCH_START: usize = LICH_DIBITS;

/// Start of the payload within the frame.
const PAYLOAD_START: usize = SACCH_START + SACCH_DIBITS;

/// Decoded NXDN fields.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NxdnEvent {
    /// The LICH at the start of a frame was decoded.
    Lich(Lich),
    /// A SACCH was decoded, along with the superframe message it completed, if any.
    Sacch(Sacch, Option<Message>),
    /// A FACCH1 message was decoded, along with whether its CRC matched.
    Facch(Message, bool),
}

/// Channel occupying part of the frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Section {
    Sacch,
    Facch,
    /// Voice channel with the given index in the frame.
    Voice(usize),
}

/// Processes the dibits following an NXDN frame sync word.
pub struct NxdnProcessor {
    /// Position of the next dibit within the frame.
    pos: usize,
    lich: LichReceiver,
    steal: Steal,
    /// Bits of the section being received.
    buf: [u8; FACCH1_DIBITS / 4],
    conv: Convolution,
    stats: Stats,
}

impl NxdnProcessor {
    pub fn new() -> NxdnProcessor {
        NxdnProcessor {
            pos: 0,
            lich: LichReceiver::new(),
            steal: Steal::None,
            buf: [0; FACCH1_DIBITS / 4],
            conv: Convolution::new(),
            stats: Stats::default(),
        }
    }

    /// Feed in a polarity-corrected dibit.
    pub fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        let pos = self.pos;
        self.pos += 1;

        if pos < SACCH_START {
            return match self.lich.feed(dibit) {
                Some(Ok(lich)) => Self::handle_lich(lich, &mut self.steal, ctx),
                Some(Err(e)) => {
                    self.stats.record_err(e);
                    Step::Abort(e)
                },
                None => Step::Pending,
            };
        }

        if pos >= FRAME_DIBITS {
            return Step::Abort(DecodeError::FrameOverflow(pos));
        }

        let (start, len, section) = self.section(pos);
        bits::set_dibit(&mut self.buf, pos - start, dibit);

        if pos + 1 < start + len {
            return Step::Pending;
        }

        let step = match section {
            Section::Sacch => self.handle_sacch(ctx),
            Section::Facch => self.handle_facch(ctx),
            Section::Voice(idx) => {
                let vf = VoiceFrame::new(ctx.session.mbe_rate, idx, &self.buf[..VCH_BYTES]);
                Step::Event(Event::Voice(vf))
            },
        };

        if pos + 1 < FRAME_DIBITS {
            return step;
        }

        match step {
            Step::Event(e) => Step::Done(Some(e)),
            Step::Pending => Step::Done(None),
            other => other,
        }
    }

    /// Get the start, length, and kind of the section holding the dibit at the given
    /// position.
    fn section(&self, pos: usize) -> (usize, usize, Section) {
        if pos < PAYLOAD_START {
            return (SACCH_START, SACCH_DIBITS, Section::Sacch);
        }

        let half = (pos - PAYLOAD_START) / FACCH1_DIBITS;
        let start = PAYLOAD_START + half * FACCH1_DIBITS;

        if !self.steal.voice(half) {
            return (start, FACCH1_DIBITS, Section::Facch);
        }

        let sub = (pos - start) / VCH_DIBITS;

        (start + sub * VCH_DIBITS, VCH_DIBITS, Section::Voice(half * 2 + sub))
    }

    fn handle_lich(lich: Lich, steal: &mut Steal, ctx: &mut Context) -> Step {
        let rf = lich.rf_channel();
        let event = Event::Nxdn(NxdnEvent::Lich(lich));

        ctx.session.frame_type = rf.label();

        debug!("NXDN LICH {} steal:{:?}", rf.label(), lich.steal());

        match rf {
            RfChannel::Control | RfChannel::Data => {
                info!("NXDN {} decoding not implemented", rf.label());
                Step::Done(Some(event))
            },
            RfChannel::Traffic | RfChannel::Composite => {
                *steal = lich.steal();
                ctx.session.voice_active = *steal != Steal::Both;

                Step::Event(event)
            },
        }
    }

    fn handle_sacch(&mut self, ctx: &mut Context) -> Step {
        let (sacch, fixed) = match channel::decode_sacch(&mut self.conv, &self.buf) {
            Ok(x) => x,
            Err(e) => {
                self.stats.record_err(e);
                return Step::Abort(e);
            },
        };

        self.stats.viterbi.record_fixes(fixed);

        if !sacch.crc_valid() {
            debug!("NXDN SACCH CRC mismatch");
            self.stats.record_err(DecodeError::Crc);

            return Step::Event(Event::Nxdn(NxdnEvent::Sacch(sacch, None)));
        }

        ctx.session.nac = sacch.ran() as u16;

        let msg = ctx.session.sacch.feed(sacch.index(), sacch.fragment());

        if let Some(ref m) = msg {
            Self::update(m, ctx.session);
        }

        Step::Event(Event::Nxdn(NxdnEvent::Sacch(sacch, msg)))
    }

    fn handle_facch(&mut self, ctx: &mut Context) -> Step {
        let (facch, fixed) = match channel::decode_facch1(&mut self.conv, &self.buf) {
            Ok(x) => x,
            Err(e) => {
                self.stats.record_err(e);
                return Step::Abort(e);
            },
        };

        self.stats.viterbi.record_fixes(fixed);

        let msg = Message::new(facch.message());

        if facch.crc_valid() {
            Self::update(&msg, ctx.session);
        } else {
            debug!("NXDN FACCH1 CRC mismatch");
            self.stats.record_err(DecodeError::Crc);
        }

        Step::Event(Event::Nxdn(NxdnEvent::Facch(msg, facch.crc_valid())))
    }

    /// Record the call details of the given message into the session.
    fn update(msg: &Message, s: &mut Session) {
        if let Some(src) = msg.source() {
            s.source = src as u32;
        }

        if let Some(dst) = msg.destination() {
            s.talkgroup = dst as u32;
        }

        match msg.kind() {
            MessageType::TxRelease => s.voice_active = false,
            MessageType::Unknown(b) => debug!("unknown NXDN message type {:02X}", b),
            _ => {},
        }

        if let Some(full) = msg.full_rate() {
            trace!("NXDN {} rate voice", if full { "full" } else { "half" });
        }

        info!("NXDN {:?} RAN:{} SRC:{} DST:{}", msg.kind(), s.nac, s.source, s.talkgroup);
    }
}

impl HasStats for NxdnProcessor {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

/// Encoders for building NXDN frames, used in tests.
#[cfg(test)]
pub mod test_frames {
    use crate::bits::{Dibit, Dibits};

    use super::channel;
    use super::lich::{Lich, RfChannel, Steal};
    use super::VCH_BYTES;

    /// Traffic frame after the sync word, carrying the given SACCH fragment and voice
    /// frames.
    pub fn voice(idx: usize, ran: u8, fragment: u32, vch: [[u8; VCH_BYTES]; 4])
        -> Vec<Dibit>
    {
        let lich = Lich::from_fields(RfChannel::Traffic, 0b10, Steal::None, true);

        let mut out = lich.encode().to_vec();
        out.extend(channel::encode_sacch(3 - idx as u8, ran, fragment));

        for v in vch.iter() {
            out.extend(Dibits::new(v.iter().cloned()));
        }

        out
    }

    /// Split a 72-bit superframe message into its four SACCH fragments.
    pub fn fragments(msg: &[u8; 9]) -> [u32; 4] {
        use crate::bits::BitSlice;

        let mut out = [0; 4];

        for (i, f) in out.iter_mut().enumerate() {
            *f = msg[..].bits_at(i * 18, 18) as u32;
        }

        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::channel::encode_facch1;
    use super::test_frames::{fragments, voice};
    use crate::config::{Config, DecodeMode};
    use crate::decoder::{Decoder, FsmState};
    use crate::sync::test_patterns;
    use crate::sync::{SyncType, WARMUP};

    fn decoder() -> Decoder {
        let mut d = Decoder::new(Config::with_mode(DecodeMode::NXDN96));

        for _ in 0..WARMUP {
            assert_eq!(d.advance(Dibit::new(0), 1000), None);
        }

        d
    }

    fn feed(d: &mut Decoder, dibits: &[Dibit]) -> Vec<Event> {
        dibits.iter().filter_map(|&b| d.advance(b, 1000)).collect()
    }

    /// Bare frame sync word.
    fn fsw() -> Vec<Dibit> {
        let long = test_patterns::dibits(SyncType::NxdnPos);
        long[long.len() - 10..].to_vec()
    }

    const CALL: [u8; 9] = [0x01, 0x00, 0x01, 0x03, 0xE8, 0x00, 0x64, 0x00, 0x00];

    #[test]
    fn test_voice_frame() {
        let mut d = decoder();
        let vch = [[0x11; VCH_BYTES], [0x22; VCH_BYTES], [0x33; VCH_BYTES], [0x44; VCH_BYTES]];

        let mut stream = test_patterns::dibits(SyncType::NxdnPos);
        stream.extend(voice(0, 5, 0x12345, vch));

        let events = feed(&mut d, &stream);

        assert_eq!(events.len(), 7);
        assert_eq!(events[0], Event::SyncFound(SyncType::NxdnPos));

        match events[1] {
            Event::Nxdn(NxdnEvent::Lich(l)) => {
                assert_eq!(l.rf_channel(), RfChannel::Traffic);
                assert_eq!(l.steal(), Steal::None);
            },
            _ => panic!(),
        }

        match events[2] {
            Event::Nxdn(NxdnEvent::Sacch(s, None)) => {
                assert!(s.crc_valid());
                assert_eq!(s.ran(), 5);
                assert_eq!(s.fragment(), 0x12345);
            },
            _ => panic!(),
        }

        for (i, e) in events[3..].iter().enumerate() {
            match *e {
                Event::Voice(vf) => {
                    assert_eq!(vf.index, i);
                    assert_eq!(vf.bytes(), &vch[i][..]);
                },
                _ => panic!(),
            }
        }

        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().nac, 5);
        assert_eq!(d.snapshot().frame_type, "RTCH");
        assert_eq!(d.stats().viterbi.words, 1);
    }

    #[test]
    fn test_superframe() {
        let mut d = decoder();
        let frags = fragments(&CALL);
        let vch = [[0; VCH_BYTES]; 4];

        let mut stream = test_patterns::dibits(SyncType::NxdnPos);

        for (i, &f) in frags.iter().enumerate() {
            if i > 0 {
                stream.extend(fsw());
            }

            stream.extend(voice(i, 1, f, vch));
        }

        let events = feed(&mut d, &stream);

        let syncs = events.iter().filter(|e| match **e {
            Event::SyncFound(SyncType::NxdnPos) => true,
            _ => false,
        }).count();

        assert_eq!(syncs, 4);

        let msgs = events.iter().filter_map(|e| match *e {
            Event::Nxdn(NxdnEvent::Sacch(_, Some(m))) => Some(m),
            _ => None,
        }).collect::<Vec<Message>>();

        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].kind(), MessageType::VoiceCall);
        assert_eq!(msgs[0].source(), Some(1000));
        assert_eq!(msgs[0].destination(), Some(100));

        let snap = d.snapshot();
        assert_eq!(snap.source, 1000);
        assert_eq!(snap.talkgroup, 100);
        assert_eq!(snap.nac, 1);
    }

    #[test]
    fn test_facch() {
        let mut d = decoder();

        let mut msg = [0; 10];
        msg[..9].copy_from_slice(&CALL);
        msg[0] = 0x08;

        let lich = Lich::from_fields(RfChannel::Traffic, 0b10, Steal::Both, true);

        let mut stream = test_patterns::dibits(SyncType::NxdnPos);
        stream.extend(lich.encode().iter().cloned());
        stream.extend(channel::encode_sacch(3, 2, 0));
        stream.extend(encode_facch1(&msg));
        stream.extend(encode_facch1(&msg));

        let events = feed(&mut d, &stream);
        assert_eq!(events.len(), 5);

        let facch = Event::Nxdn(NxdnEvent::Facch(Message::new(msg), true));
        assert_eq!(events[3], facch);
        assert_eq!(events[4], facch);

        assert_eq!(d.state(), FsmState::LookForSync);
        assert!(!d.session().voice_active);
        assert_eq!(d.snapshot().talkgroup, 100);
        assert_eq!(d.stats().viterbi.words, 3);
    }

    #[test]
    fn test_control() {
        let mut d = decoder();
        let lich = Lich::from_fields(RfChannel::Control, 0, Steal::None, true);

        let mut stream = test_patterns::dibits(SyncType::NxdnPos);
        stream.extend(lich.encode().iter().cloned());

        let events = feed(&mut d, &stream);

        assert_eq!(events.last(), Some(&Event::Nxdn(NxdnEvent::Lich(lich))));
        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().frame_type, "RCCH");
    }

    #[test]
    fn test_lich_parity() {
        let mut d = decoder();
        let lich = Lich::from_fields(RfChannel::Traffic, 0, Steal::None, true);

        let mut stream = test_patterns::dibits(SyncType::NxdnPos);
        stream.extend(lich.encode().iter().cloned());
        let first = stream.len() - 8;
        stream[first] = stream[first].invert();

        let events = feed(&mut d, &stream);

        assert_eq!(events.last(), Some(&Event::FrameAborted(DecodeError::Parity)));
        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.stats().crc, 1);
    }
}
