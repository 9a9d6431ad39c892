//! Top-level state machine, which searches for frame sync and hands the frame that
//! follows to the processor for its protocol.

use crate::bits::Dibit;
use crate::config::{Config, DecodeMode};
use crate::dmr::{DmrEvent, DmrProcessor};
use crate::dpmr::{DpmrEvent, DpmrProcessor};
use crate::dstar::{DStarEvent, DStarProcessor};
use crate::error::DecodeError;
use crate::nxdn::{NxdnEvent, NxdnProcessor};
use crate::p25::heuristics::Heuristics;
use crate::p25::{P25Event, P25Processor};
use crate::session::{MbeRate, Session, Snapshot};
use crate::stats::{HasStats, Stats};
use crate::sync::{Protocol, Search, SyncEngine, SyncMatch, SyncType, Window};
use crate::ysf::{YsfEvent, YsfProcessor};

/// Size of the largest voice codec frame.
pub const MAX_VOICE_BYTES: usize = 13;

/// A voice codec frame, meant for an external vocoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VoiceFrame {
    /// Codec variant of the frame.
    pub rate: MbeRate,
    /// Index of the frame within its superframe or frame group.
    pub index: usize,
    /// Whether the frame should be vocoded, which is false for muted encrypted frames.
    pub ready: bool,
    len: usize,
    data: [u8; MAX_VOICE_BYTES],
}

impl VoiceFrame {
    /// Create a frame ready for vocoding from the given bytes.
    pub fn new(rate: MbeRate, index: usize, bytes: &[u8]) -> VoiceFrame {
        assert!(bytes.len() <= MAX_VOICE_BYTES);

        let mut data = [0; MAX_VOICE_BYTES];
        data[..bytes.len()].copy_from_slice(bytes);

        VoiceFrame {
            rate,
            index,
            ready: true,
            len: bytes.len(),
            data,
        }
    }

    /// Packed codec bits.
    pub fn bytes(&self) -> &[u8] { &self.data[..self.len] }
}

/// Events produced while decoding.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Event {
    /// A sync pattern was matched, and a frame of the given type follows.
    SyncFound(SyncType),
    /// Searched too long without finding sync, and the carrier is considered lost.
    NoSync,
    /// The input stayed silent long enough that the frame was given up.
    SquelchTimeout,
    /// The current frame couldn't be decoded.
    FrameAborted(DecodeError),
    /// A voice codec frame was received.
    Voice(VoiceFrame),
    P25(P25Event),
    Nxdn(NxdnEvent),
    Dmr(DmrEvent),
    DStar(DStarEvent),
    Ysf(YsfEvent),
    Dpmr(DpmrEvent),
}

/// Outcome of feeding a dibit to a frame processor.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Step {
    /// Nothing to report yet.
    Pending,
    /// Report the event and keep processing the frame.
    Event(Event),
    /// The frame ended normally, possibly with a final event.
    Done(Option<Event>),
    /// The frame couldn't be decoded.
    Abort(DecodeError),
}

/// State shared with the active frame processor while it handles a dibit.
pub struct Context<'a> {
    pub session: &'a mut Session,
    pub config: &'a Config,
    pub heuristics: &'a mut Heuristics,
    /// Most recent dibits, the newest being the one being processed.
    pub window: &'a Window,
    /// Analog sample of the dibit, with the polarity corrected.
    pub sample: i32,
}

/// Externally visible state of the decoder.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum FsmState {
    LookForSync,
    SyncFound,
    ProcessDmrVoice,
    ProcessDmrVoiceMs,
    ProcessDmrData,
    ProcessDmrDataMs,
    ProcessDStar,
    ProcessDStarHeader,
    ProcessYsf,
    ProcessDpmr,
    ProcessNxdn,
    ProcessP25p1,
}

/// Processor for each protocol with frames to decode.
enum Processor {
    P25(P25Processor),
    Nxdn(NxdnProcessor),
    Dmr(DmrProcessor),
    DStar(DStarProcessor),
    Ysf(YsfProcessor),
    Dpmr(DpmrProcessor),
}

impl Processor {
    /// Create the processor for the frame following the given sync, if the protocol has
    /// one.
    fn start(m: &SyncMatch, window: &Window) -> Option<Processor> {
        use crate::sync::SyncType::*;

        Some(match m.sync {
            P25p1Pos | P25p1Neg => Processor::P25(P25Processor::new()),
            NxdnPos | NxdnNeg => Processor::Nxdn(NxdnProcessor::new()),
            DmrData | DmrDataMs | DmrVoice | DmrVoiceMs =>
                Processor::Dmr(DmrProcessor::new(m.sync, window)),
            DStarPos | DStarNeg => Processor::DStar(DStarProcessor::new(false)),
            DStarHeaderPos | DStarHeaderNeg => Processor::DStar(DStarProcessor::new(true)),
            SyncType::Ysf => Processor::Ysf(YsfProcessor::new()),
            Dpmr => Processor::Dpmr(DpmrProcessor::new()),
            X2TdmaData | X2TdmaVoice | ProVoicePos | ProVoiceNeg => return None,
        })
    }

    fn feed(&mut self, dibit: Dibit, ctx: &mut Context) -> Step {
        match *self {
            Processor::P25(ref mut p) => p.feed(dibit, ctx),
            Processor::Nxdn(ref mut p) => p.feed(dibit, ctx),
            Processor::Dmr(ref mut p) => p.feed(dibit, ctx),
            Processor::DStar(ref mut p) => p.feed(dibit, ctx),
            Processor::Ysf(ref mut p) => p.feed(dibit, ctx),
            Processor::Dpmr(ref mut p) => p.feed(dibit, ctx),
        }
    }

    fn fsm_state(&self) -> FsmState {
        match *self {
            Processor::P25(_) => FsmState::ProcessP25p1,
            Processor::Nxdn(_) => FsmState::ProcessNxdn,
            Processor::Dmr(ref p) => p.fsm_state(),
            Processor::DStar(ref p) => if p.header() {
                FsmState::ProcessDStarHeader
            } else {
                FsmState::ProcessDStar
            },
            Processor::Ysf(_) => FsmState::ProcessYsf,
            Processor::Dpmr(_) => FsmState::ProcessDpmr,
        }
    }
}

impl HasStats for Processor {
    fn stats(&mut self) -> &mut Stats {
        match *self {
            Processor::P25(ref mut p) => p.stats(),
            Processor::Nxdn(ref mut p) => p.stats(),
            Processor::Dmr(ref mut p) => p.stats(),
            Processor::DStar(ref mut p) => p.stats(),
            Processor::Ysf(ref mut p) => p.stats(),
            Processor::Dpmr(ref mut p) => p.stats(),
        }
    }
}

/// Internal state of the state machine.
enum State {
    /// Searching for a sync pattern.
    LookForSync,
    /// A sync pattern was just matched.
    SyncFound(SyncMatch),
    /// Decoding the frame that follows the given sync.
    Process(Processor, SyncType),
}

/// Decodes a stream of dibits into frame fields and voice codec frames.
pub struct Decoder {
    config: Config,
    sync: SyncEngine,
    session: Session,
    heuristics: Heuristics,
    state: State,
    /// Consecutive zero samples seen while decoding a frame.
    squelch: usize,
    stats: Stats,
}

impl Decoder {
    /// Create a new `Decoder` searching for sync with the given options.
    pub fn new(config: Config) -> Decoder {
        Decoder {
            config,
            sync: SyncEngine::new(),
            session: Session::new(),
            heuristics: Heuristics::new(),
            state: State::LookForSync,
            squelch: 0,
            stats: Stats::default(),
        }
    }

    pub fn config(&self) -> &Config { &self.config }

    /// Enable or disable the given protocol, then start searching from scratch.
    pub fn set_decode_mode(&mut self, mode: DecodeMode, on: bool) {
        self.config.set_decode_mode(mode, on);
        self.resync();
        self.session.no_carrier();

        info!("decode mode {:?} {}, {} baud", mode, if on { "on" } else { "off" },
              self.config.data_rate.baud());
    }

    /// Current state of the state machine.
    pub fn state(&self) -> FsmState {
        match self.state {
            State::LookForSync => FsmState::LookForSync,
            State::SyncFound(_) => FsmState::SyncFound,
            State::Process(ref p, _) => p.fsm_state(),
        }
    }

    pub fn session(&self) -> &Session { &self.session }
    pub fn heuristics(&self) -> &Heuristics { &self.heuristics }

    /// Take a copy of the call state.
    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot(self.state() == FsmState::LookForSync)
    }

    /// Estimate the symbol of an ambiguous analog sample from the symbol statistics
    /// gathered so far.
    pub fn estimate(&self, value: i32) -> Option<Dibit> { self.heuristics.estimate(value) }

    /// Feed in an analog sample that doesn't complete a symbol, which only counts
    /// towards the squelch timeout.
    pub fn sample(&mut self, sample: i32) -> Option<Event> { self.squelch(sample) }

    /// Feed in a demodulated dibit along with the analog sample it was sliced from.
    pub fn advance(&mut self, dibit: Dibit, sample: i32) -> Option<Event> {
        self.sync.push(dibit);

        if let Some(e) = self.squelch(sample) {
            return Some(e);
        }

        match self.state {
            State::LookForSync => self.search(),
            State::SyncFound(m) => self.start(m, dibit, sample),
            State::Process(..) => self.process(dibit, sample),
        }
    }

    /// Return to sync search, forgetting any partial frame.
    fn resync(&mut self) {
        self.sync.reset();
        self.state = State::LookForSync;
        self.squelch = 0;
    }

    fn squelch(&mut self, sample: i32) -> Option<Event> {
        if let State::LookForSync = self.state {
            return None;
        }

        if sample != 0 {
            self.squelch = 0;
            return None;
        }

        self.squelch += 1;

        let limit = self.config.squelch_timeout;

        if limit == 0 || self.squelch < limit {
            return None;
        }

        debug!("squelch timeout after {} silent samples", self.squelch);

        self.resync();
        self.session.clear_ids();
        self.session.voice_active = false;

        Some(Event::SquelchTimeout)
    }

    fn search(&mut self) -> Option<Event> {
        match self.sync.search(&self.config) {
            Search::Pending => None,
            Search::Found(m) => {
                debug!("found {} sync with {} mismatches", m.sync.label(), m.mismatches);

                let s = &mut self.session;

                s.sync = Some(m.sync);
                s.carrier = true;
                s.station = m.station;
                s.mbe_rate = m.sync.mbe_rate();

                self.state = State::SyncFound(m);

                Some(Event::SyncFound(m.sync))
            },
            Search::Lost => {
                debug!("no sync");
                self.session.no_carrier();

                Some(Event::NoSync)
            },
        }
    }

    /// Set up the processor for the matched sync, which handles the given first dibit
    /// of the frame.
    fn start(&mut self, m: SyncMatch, dibit: Dibit, sample: i32) -> Option<Event> {
        self.session.clear_ids();

        match Processor::start(&m, self.sync.window()) {
            Some(p) => {
                self.state = State::Process(p, m.sync);
                self.process(dibit, sample)
            },
            None => {
                debug!("{} frames aren't decoded", m.sync.label());

                self.session.no_carrier();
                self.sync.resume();
                self.state = State::LookForSync;

                None
            },
        }
    }

    fn process(&mut self, dibit: Dibit, sample: i32) -> Option<Event> {
        let (step, sync) = match self.state {
            State::Process(ref mut p, sync) => {
                let (dibit, sample) = if sync.inverted() {
                    (dibit.invert(), sample.saturating_neg())
                } else {
                    (dibit, sample)
                };

                let step = p.feed(dibit, &mut Context {
                    session: &mut self.session,
                    config: &self.config,
                    heuristics: &mut self.heuristics,
                    window: self.sync.window(),
                    sample,
                });

                self.stats.merge(p);

                (step, sync)
            },
            _ => return None,
        };

        match step {
            Step::Pending => None,
            Step::Event(e) => Some(e),
            Step::Done(e) => {
                trace!("{} frame done", sync.label());

                if sync.protocol() == Protocol::Nxdn {
                    // Keep the frame cadence so the next bare sync word is accepted.
                    self.sync.resume();
                    self.state = State::LookForSync;
                    self.squelch = 0;
                } else {
                    self.resync();
                }

                e
            },
            Step::Abort(err) => {
                warn!("{} frame aborted: {}", sync.label(), err);
                self.resync();
                self.session.no_carrier();

                Some(Event::FrameAborted(err))
            },
        }
    }
}

impl HasStats for Decoder {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coding::bch;
    use crate::p25::nid::{DataUnit, NetworkAccessCode, NetworkId};
    use crate::p25::test_frames::preamble;
    use crate::sync::test_patterns;
    use crate::sync::{Polarity, WARMUP};

    fn decoder(mode: DecodeMode) -> Decoder {
        let mut d = Decoder::new(Config::with_mode(mode));

        for _ in 0..WARMUP {
            assert_eq!(d.advance(Dibit::new(0), 1000), None);
        }

        d
    }

    fn feed(d: &mut Decoder, dibits: &[Dibit]) -> Vec<Option<Event>> {
        dibits.iter().map(|&b| d.advance(b, 1000)).collect()
    }

    #[test]
    fn test_voice_frame() {
        let vf = VoiceFrame::new(MbeRate::Rate3600x2400, 3, &[1, 2, 3]);

        assert_eq!(vf.bytes(), &[1, 2, 3]);
        assert_eq!(vf.index, 3);
        assert!(vf.ready);
    }

    #[test]
    fn test_sync_found() {
        let mut d = decoder(DecodeMode::P25P1);
        assert_eq!(d.state(), FsmState::LookForSync);
        assert!(d.snapshot().searching);

        let sync = test_patterns::dibits(SyncType::P25p1Pos);
        let events = feed(&mut d, &sync);

        assert!(events[..23].iter().all(|e| e.is_none()));
        assert_eq!(events[23], Some(Event::SyncFound(SyncType::P25p1Pos)));
        assert_eq!(d.state(), FsmState::SyncFound);

        let snap = d.snapshot();
        assert!(!snap.searching);
        assert_eq!(snap.protocol, Some(Protocol::P25p1));
        assert_eq!(snap.polarity, Some(Polarity::Positive));

        assert_eq!(d.advance(Dibit::new(0), 1000), None);
        assert_eq!(d.state(), FsmState::ProcessP25p1);
    }

    #[test]
    fn test_tdu() {
        let mut d = decoder(DecodeMode::P25P1);
        let frame = preamble(0x123, DataUnit::VoiceSimpleTerminator);
        let events = feed(&mut d, &frame);

        let nid = NetworkId::new(NetworkAccessCode::from_bits(0x123),
                                 DataUnit::VoiceSimpleTerminator);

        assert_eq!(events.last(), Some(&Some(Event::P25(P25Event::Nid(nid)))));
        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().nac, 0x123);
        assert_eq!(d.snapshot().frame_type, "TDU");
        assert_eq!(d.stats().bch.words, 1);
    }

    #[test]
    fn test_unknown_duid() {
        let mut d = decoder(DecodeMode::P25P1);
        feed(&mut d, &test_patterns::dibits(SyncType::P25p1Pos));

        let word = bch::encode(0x293 << 4 | 0xB);
        let nid = (0..32).map(|i| Dibit::new((word >> (62 - i * 2) & 0b11) as u8))
            .chain((0..32).map(|_| Dibit::new(0)))
            .collect::<Vec<Dibit>>();

        let events = feed(&mut d, &nid);

        assert!(events[..63].iter().all(|e| e.is_none()));
        assert_eq!(events[63], Some(Event::FrameAborted(DecodeError::UnknownDuid(0xB))));
        assert_eq!(d.state(), FsmState::LookForSync);
    }

    #[test]
    fn test_abort_clears_call() {
        use crate::p25::ldu;

        let mut d = decoder(DecodeMode::P25P1);

        let mut frame = preamble(0x123, DataUnit::VoiceLCFrameGroup);
        frame.extend((0..ldu::VOICE_FRAMES * ldu::FRAME_DIBITS).map(|_| Dibit::new(0b01)));

        // Four errors in the first link control word are beyond Golay correction.
        let mut extra = ldu::encode_extra(&[0, 0, 0, 0, 0, 100, 0, 0x13, 0x88]);

        for i in 0..4 {
            extra[i] = extra[i].invert();
        }

        // The frame ends on the last dibit of that word.
        frame.extend(extra[..12].iter().cloned());

        let events = feed(&mut d, &frame);

        let nid = NetworkId::new(NetworkAccessCode::Other(0x123),
                                 DataUnit::VoiceLCFrameGroup);

        assert_eq!(events[87], Some(Event::P25(P25Event::Nid(nid))));
        assert_eq!(events.last(),
                   Some(&Some(Event::FrameAborted(DecodeError::GolayUnrecoverable))));
        assert_eq!(d.state(), FsmState::LookForSync);

        let snap = d.snapshot();

        assert!(snap.searching);
        assert_eq!(snap.nac, 0);
        assert_eq!(snap.talkgroup, 0);
        assert_eq!(snap.protocol, None);
        assert_eq!(snap.frame_type, "");
        assert!(!d.session().carrier);
        assert_eq!(d.stats().golay.err, 1);

        // Searching starts over right away.
        let frame = preamble(0x293, DataUnit::VoiceSimpleTerminator);
        let events = feed(&mut d, &frame);

        assert_eq!(events[23], Some(Event::SyncFound(SyncType::P25p1Pos)));
        assert_eq!(d.snapshot().nac, 0x293);
    }

    #[test]
    fn test_inverted() {
        let mut d = decoder(DecodeMode::P25P1);

        let mut frame = test_patterns::dibits(SyncType::P25p1Neg);
        frame.extend(preamble(0x293, DataUnit::VoiceSimpleTerminator)[24..].iter()
            .map(|b| b.invert()));

        let events = feed(&mut d, &frame);
        assert_eq!(events[23], Some(Event::SyncFound(SyncType::P25p1Neg)));

        match events.last() {
            Some(&Some(Event::P25(P25Event::Nid(nid)))) =>
                assert_eq!(nid.access_code, NetworkAccessCode::Default),
            _ => panic!(),
        }

        assert_eq!(d.snapshot().polarity, Some(Polarity::Negative));
    }

    #[test]
    fn test_no_sync() {
        let mut d = Decoder::new(Config::with_mode(DecodeMode::P25P1));

        for _ in 0..crate::sync::SEARCH_LIMIT - 1 {
            assert_eq!(d.advance(Dibit::new(0), 1000), None);
        }

        assert_eq!(d.advance(Dibit::new(0), 1000), Some(Event::NoSync));
        assert_eq!(d.state(), FsmState::LookForSync);
    }

    #[test]
    fn test_squelch() {
        let mut d = decoder(DecodeMode::P25P1);
        d.config.squelch_timeout = 5;

        // Silence while searching is ignored.
        for _ in 0..10 {
            assert_eq!(d.sample(0), None);
        }

        feed(&mut d, &test_patterns::dibits(SyncType::P25p1Pos));
        assert_eq!(d.advance(Dibit::new(0), 1000), None);

        d.session.nac = 0x293;
        d.session.talkgroup = 100;
        d.session.source = 5000;

        for _ in 0..3 {
            assert_eq!(d.sample(0), None);
        }

        assert_eq!(d.sample(250), None);

        for _ in 0..4 {
            assert_eq!(d.sample(0), None);
        }

        assert_eq!(d.advance(Dibit::new(0), 0), Some(Event::SquelchTimeout));
        assert_eq!(d.state(), FsmState::LookForSync);

        let snap = d.snapshot();
        assert_eq!(snap.nac, 0);
        assert_eq!(snap.talkgroup, 0);
        assert_eq!(snap.source, 0);
    }

    #[test]
    fn test_x2_no_carrier() {
        let mut d = decoder(DecodeMode::X2TDMA);

        let events = feed(&mut d, &test_patterns::dibits(SyncType::X2TdmaData));
        assert_eq!(events[23], Some(Event::SyncFound(SyncType::X2TdmaData)));
        assert_eq!(d.snapshot().protocol, Some(Protocol::X2Tdma));

        assert_eq!(d.advance(Dibit::new(0), 1000), None);
        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().protocol, None);
        assert!(!d.session().carrier);
    }

    #[test]
    fn test_set_decode_mode() {
        let mut d = decoder(DecodeMode::P25P1);
        feed(&mut d, &test_patterns::dibits(SyncType::P25p1Pos));
        assert_eq!(d.state(), FsmState::SyncFound);

        d.set_decode_mode(DecodeMode::DMR, true);

        assert!(d.config().frame_dmr && d.config().frame_p25p1);
        assert_eq!(d.state(), FsmState::LookForSync);
        assert_eq!(d.snapshot().protocol, None);

        d.set_decode_mode(DecodeMode::None, true);
        assert!(!d.config().frame_dmr && !d.config().frame_p25p1);
    }
}
