//! Frame sync detection over a sliding window of the most recent dibits.
//!
//! Sync patterns are written as strings of channel symbols, where `1` stands for +3
//! (dibit 01) and `3` for -3 (dibit 11). A pattern matches when the window's newest
//! dibits differ from it in at most the pattern's tolerance of positions.

use crate::bits::Dibit;
use crate::config::Config;
use crate::session::{MbeRate, StationType};

/// Number of dibits kept in the window, enough for the longest pattern plus the DMR
/// slot type dibits that precede its sync.
pub const HISTORY: usize = 32;

/// Number of symbols after a reset before matching starts.
pub const WARMUP: usize = 18;

/// Number of symbols searched without a match before the carrier is considered lost.
pub const SEARCH_LIMIT: usize = 1800;

/// Number of symbols in an NXDN frame, which separates consecutive frame sync words.
pub const NXDN_PERIOD: isize = 192;

/// Protocol families, each with one or more sync patterns.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum Protocol {
    P25p1,
    X2Tdma,
    Ysf,
    Dmr,
    ProVoice,
    Nxdn,
    Dpmr,
    DStar,
}

/// Order in which protocols are tested. When a window matches patterns of several
/// protocols, the earliest one in this list wins.
pub const PRIORITY: [Protocol; 8] = [
    Protocol::P25p1,
    Protocol::X2Tdma,
    Protocol::Ysf,
    Protocol::Dmr,
    Protocol::ProVoice,
    Protocol::Nxdn,
    Protocol::Dpmr,
    Protocol::DStar,
];

impl Protocol {
    /// Whether the protocol is selected in the given options.
    pub fn enabled(self, cfg: &Config) -> bool {
        use self::Protocol::*;

        match self {
            P25p1 => cfg.frame_p25p1,
            X2Tdma => cfg.frame_x2tdma,
            Ysf => cfg.frame_ysf,
            Dmr => cfg.frame_dmr,
            ProVoice => cfg.frame_provoice,
            Nxdn => cfg.frame_nxdn(),
            Dpmr => cfg.frame_dpmr,
            DStar => cfg.frame_dstar,
        }
    }

    /// Sync patterns of the protocol, in the order they're tested.
    pub fn patterns(self) -> &'static [Pattern] {
        use self::Protocol::*;

        match self {
            P25p1 => &P25P1_PATTERNS,
            X2Tdma => &X2TDMA_PATTERNS,
            Ysf => &YSF_PATTERNS,
            Dmr => &DMR_PATTERNS,
            ProVoice => &PROVOICE_PATTERNS,
            Nxdn => &NXDN_PATTERNS,
            Dpmr => &DPMR_PATTERNS,
            DStar => &DSTAR_PATTERNS,
        }
    }
}

/// Signal polarity implied by a sync match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum Polarity {
    Positive,
    Negative,
}

/// Kind of frame announced by a sync match.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum SyncType {
    P25p1Pos,
    P25p1Neg,
    X2TdmaData,
    X2TdmaVoice,
    Ysf,
    DmrData,
    DmrDataMs,
    DmrVoice,
    DmrVoiceMs,
    ProVoicePos,
    ProVoiceNeg,
    NxdnPos,
    NxdnNeg,
    Dpmr,
    DStarPos,
    DStarNeg,
    DStarHeaderPos,
    DStarHeaderNeg,
}

impl SyncType {
    pub fn protocol(self) -> Protocol {
        use self::SyncType::*;

        match self {
            P25p1Pos | P25p1Neg => Protocol::P25p1,
            X2TdmaData | X2TdmaVoice => Protocol::X2Tdma,
            Ysf => Protocol::Ysf,
            DmrData | DmrDataMs | DmrVoice | DmrVoiceMs => Protocol::Dmr,
            ProVoicePos | ProVoiceNeg => Protocol::ProVoice,
            NxdnPos | NxdnNeg => Protocol::Nxdn,
            Dpmr => Protocol::Dpmr,
            DStarPos | DStarNeg | DStarHeaderPos | DStarHeaderNeg => Protocol::DStar,
        }
    }

    pub fn polarity(self) -> Polarity {
        use self::SyncType::*;

        match self {
            P25p1Neg | ProVoiceNeg | NxdnNeg | DStarNeg | DStarHeaderNeg =>
                Polarity::Negative,
            _ => Polarity::Positive,
        }
    }

    /// Whether every dibit of the frame must be inverted before decoding.
    pub fn inverted(self) -> bool { self.polarity() == Polarity::Negative }

    /// Voice codec used by frames following the sync.
    pub fn mbe_rate(self) -> MbeRate {
        match self.protocol() {
            Protocol::DStar => MbeRate::Rate3600x2400,
            Protocol::Ysf => MbeRate::None,
            _ => MbeRate::Rate3600x2450,
        }
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        use self::SyncType::*;

        match self {
            P25p1Pos => "+P25p1",
            P25p1Neg => "-P25p1",
            X2TdmaData => "+X2-TDMAd",
            X2TdmaVoice => "+X2-TDMAv",
            Ysf => "+YSF",
            DmrData | DmrDataMs => "+DMRd",
            DmrVoice | DmrVoiceMs => "+DMRv",
            ProVoicePos => "+ProVoice",
            ProVoiceNeg => "-ProVoice",
            NxdnPos => "+NXDN",
            NxdnNeg => "-NXDN",
            Dpmr => "+dPMR",
            DStarPos => "+D-STAR",
            DStarNeg => "-D-STAR",
            DStarHeaderPos => "+D-STAR_HD",
            DStarHeaderNeg => "-D-STAR_HD",
        }
    }
}

/// Extra condition a pattern match must satisfy.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Gate {
    /// Accepted whenever it matches.
    Always,
    /// NXDN preamble and frame sync word, which restarts the frame cadence.
    NxdnLong,
    /// Bare NXDN frame sync word, only accepted on the frame cadence.
    NxdnShort,
}

/// Entry in the sync pattern table.
pub struct Pattern {
    /// Channel symbols, oldest first.
    pub symbols: &'static [u8],
    /// Maximum number of mismatched dibits.
    pub tolerance: usize,
    pub sync: SyncType,
    pub station: StationType,
    pub gate: Gate,
}

impl Pattern {
    const fn new(symbols: &'static [u8], tolerance: usize, sync: SyncType) -> Pattern {
        Pattern {
            symbols,
            tolerance,
            sync,
            station: StationType::NotApplicable,
            gate: Gate::Always,
        }
    }

    const fn station(self, station: StationType) -> Pattern {
        Pattern { station, ..self }
    }

    const fn gate(self, gate: Gate) -> Pattern {
        Pattern { gate, ..self }
    }

    /// Number of dibits in the pattern.
    pub fn len(&self) -> usize { self.symbols.len() }

    /// Get the pattern as dibits, oldest first.
    pub fn dibits<'a>(&'a self) -> impl Iterator<Item = Dibit> + 'a {
        self.symbols.iter().map(|&c| Dibit::new(c - b'0'))
    }

    /// Count the positions where the newest dibits of the window differ from the
    /// pattern.
    pub fn mismatches(&self, window: &Window) -> usize {
        window.recent(self.len()).zip(self.dibits()).filter(|&(a, b)| a != b).count()
    }
}

static P25P1_PATTERNS: [Pattern; 2] = [
    Pattern::new(b"111113113311333313133333", 1, SyncType::P25p1Pos),
    Pattern::new(b"333331331133111131311111", 1, SyncType::P25p1Neg),
];

static X2TDMA_PATTERNS: [Pattern; 4] = [
    Pattern::new(b"331313111113131113331133", 1, SyncType::X2TdmaData)
        .station(StationType::BaseStation),
    Pattern::new(b"313113333111111133333313", 1, SyncType::X2TdmaData)
        .station(StationType::MobileStation),
    Pattern::new(b"113131333331313331113311", 1, SyncType::X2TdmaVoice)
        .station(StationType::BaseStation),
    Pattern::new(b"131331111333333311111131", 1, SyncType::X2TdmaVoice)
        .station(StationType::MobileStation),
];

static YSF_PATTERNS: [Pattern; 1] = [
    Pattern::new(b"31111311313113131131", 1, SyncType::Ysf),
];

static DMR_PATTERNS: [Pattern; 4] = [
    Pattern::new(b"313333111331131131331131", 1, SyncType::DmrData)
        .station(StationType::BaseStation),
    Pattern::new(b"311131133313133331131113", 1, SyncType::DmrDataMs)
        .station(StationType::MobileStation),
    Pattern::new(b"131111333113313313113313", 1, SyncType::DmrVoice)
        .station(StationType::BaseStation),
    Pattern::new(b"133313311131311113313331", 1, SyncType::DmrVoiceMs)
        .station(StationType::MobileStation),
];

static PROVOICE_PATTERNS: [Pattern; 4] = [
    Pattern::new(b"13131333111311311133113311331133", 2, SyncType::ProVoicePos),
    Pattern::new(b"31313111333133133131313131313131", 2, SyncType::ProVoicePos),
    Pattern::new(b"31313111333133133311331133113311", 2, SyncType::ProVoiceNeg),
    Pattern::new(b"13131333111311311313131313131313", 2, SyncType::ProVoiceNeg),
];

static NXDN_PATTERNS: [Pattern; 4] = [
    Pattern::new(b"1113131133313131331131", 1, SyncType::NxdnPos).gate(Gate::NxdnLong),
    Pattern::new(b"3331313311131313113313", 1, SyncType::NxdnNeg).gate(Gate::NxdnLong),
    Pattern::new(b"3131331131", 0, SyncType::NxdnPos).gate(Gate::NxdnShort),
    Pattern::new(b"1313113313", 0, SyncType::NxdnNeg).gate(Gate::NxdnShort),
];

static DPMR_PATTERNS: [Pattern; 1] = [
    Pattern::new(b"111333331133131131111313", 1, SyncType::Dpmr),
];

static DSTAR_PATTERNS: [Pattern; 4] = [
    Pattern::new(b"313131313133131113313111", 1, SyncType::DStarPos),
    Pattern::new(b"131313131311313331131333", 1, SyncType::DStarNeg),
    Pattern::new(b"131313131333133113131111", 1, SyncType::DStarHeaderPos),
    Pattern::new(b"313131313111311331313333", 1, SyncType::DStarHeaderNeg),
];

/// Fixed-length shift register of the most recent dibits.
pub struct Window {
    buf: [Dibit; HISTORY],
    /// Index of the oldest dibit, which is overwritten next.
    pos: usize,
}

impl Window {
    pub fn new() -> Window {
        Window {
            buf: [Dibit::default(); HISTORY],
            pos: 0,
        }
    }

    /// Shift in the given dibit, dropping the oldest.
    pub fn push(&mut self, d: Dibit) {
        self.buf[self.pos] = d;
        self.pos = (self.pos + 1) % HISTORY;
    }

    /// Iterate over the `n` newest dibits, oldest first.
    pub fn recent<'a>(&'a self, n: usize) -> impl Iterator<Item = Dibit> + 'a {
        assert!(n <= HISTORY);
        (HISTORY - n..HISTORY).map(move |i| self.buf[(self.pos + i) % HISTORY])
    }

    /// Get the dibit received `n` symbols ago, where 0 is the newest.
    pub fn back(&self, n: usize) -> Dibit {
        assert!(n < HISTORY);
        self.buf[(self.pos + HISTORY - 1 - n) % HISTORY]
    }
}

/// A successful match against the pattern table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SyncMatch {
    pub sync: SyncType,
    pub station: StationType,
    /// Number of dibits that differed from the pattern.
    pub mismatches: usize,
}

/// Outcome of searching on one symbol.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Search {
    /// Nothing found yet.
    Pending,
    /// The symbol completed a sync pattern.
    Found(SyncMatch),
    /// Searched too long without a match.
    Lost,
}

/// Matches the dibit window against the sync pattern table.
pub struct SyncEngine {
    window: Window,
    /// Symbols seen since the last reset, saturating at the warm-up length.
    warmup: usize,
    /// Symbols searched without a match.
    searched: usize,
    /// Symbols since the last accepted NXDN sync, or -1 when no cadence is tracked.
    nxdn_count: isize,
}

impl SyncEngine {
    pub fn new() -> SyncEngine {
        SyncEngine {
            window: Window::new(),
            warmup: 0,
            searched: 0,
            nxdn_count: -1,
        }
    }

    /// Restart searching from scratch, with a fresh warm-up and no NXDN cadence.
    pub fn reset(&mut self) {
        self.warmup = 0;
        self.searched = 0;
        self.nxdn_count = -1;
    }

    /// Restart searching right after a frame that ended normally, keeping the warm-up
    /// and the NXDN cadence.
    pub fn resume(&mut self) {
        self.searched = 0;
    }

    /// Shift the given symbol into the window. This is done for every symbol, whatever
    /// the decoder is doing.
    pub fn push(&mut self, d: Dibit) {
        self.window.push(d);

        if self.nxdn_count >= 0 {
            self.nxdn_count += 1;
        }
    }

    pub fn window(&self) -> &Window { &self.window }

    /// Symbols since the last accepted NXDN sync, if tracked.
    pub fn nxdn_count(&self) -> Option<usize> {
        if self.nxdn_count < 0 {
            None
        } else {
            Some(self.nxdn_count as usize)
        }
    }

    /// Search the current window for a sync pattern of the enabled protocols.
    pub fn search(&mut self, cfg: &Config) -> Search {
        if self.warmup < WARMUP {
            self.warmup += 1;
        } else if let Some(m) = self.classify(cfg) {
            self.searched = 0;
            return Search::Found(m);
        }

        self.searched += 1;

        if self.searched >= SEARCH_LIMIT {
            self.reset();
            return Search::Lost;
        }

        Search::Pending
    }

    /// Find the first accepted pattern in priority order.
    fn classify(&mut self, cfg: &Config) -> Option<SyncMatch> {
        for &proto in PRIORITY.iter().filter(|p| p.enabled(cfg)) {
            for pat in proto.patterns() {
                let mismatches = pat.mismatches(&self.window);

                if mismatches > pat.tolerance || !self.accept(pat.gate) {
                    continue;
                }

                return Some(SyncMatch {
                    sync: pat.sync,
                    station: pat.station,
                    mismatches,
                });
            }
        }

        None
    }

    /// Check the gate of a matching pattern, updating the NXDN cadence.
    fn accept(&mut self, gate: Gate) -> bool {
        match gate {
            Gate::Always => true,
            Gate::NxdnLong => {
                self.nxdn_count = 0;
                true
            },
            Gate::NxdnShort => {
                let ok = self.nxdn_count > 0 && self.nxdn_count % NXDN_PERIOD == 0;

                if !ok {
                    trace!("rejecting NXDN sync word at count {}", self.nxdn_count);
                }

                self.nxdn_count = 0;
                ok
            },
        }
    }
}

/// Pattern lookup for building test streams.
#[cfg(test)]
pub mod test_patterns {
    use super::*;

    /// Get the dibits of the first pattern announcing the given sync.
    pub fn dibits(sync: SyncType) -> Vec<Dibit> {
        PRIORITY.iter()
            .flat_map(|p| p.patterns().iter())
            .find(|pat| pat.sync == sync)
            .map(|pat| pat.dibits().collect())
            .unwrap()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::DecodeMode;

    fn feed_str(e: &mut SyncEngine, cfg: &Config, s: &[u8]) -> Vec<Search> {
        s.iter().map(|&c| {
            e.push(Dibit::new(c - b'0'));
            e.search(cfg)
        }).collect()
    }

    fn filler(e: &mut SyncEngine, cfg: &Config, n: usize) {
        for _ in 0..n {
            e.push(Dibit::new(0));
            assert_eq!(e.search(cfg), Search::Pending);
        }
    }

    fn found(sync: SyncType, mismatches: usize) -> Search {
        Search::Found(SyncMatch {
            sync,
            station: StationType::NotApplicable,
            mismatches,
        })
    }

    #[test]
    fn test_window() {
        let mut w = Window::new();

        for i in 0..40 {
            w.push(Dibit::new(i % 4));
        }

        assert_eq!(w.back(0), Dibit::new(39 % 4));
        assert_eq!(w.back(5), Dibit::new(34 % 4));

        let r = w.recent(3).map(|d| d.bits()).collect::<Vec<u8>>();
        assert_eq!(r, vec![37 % 4, 38 % 4, 39 % 4]);
    }

    #[test]
    fn test_found_on_last_symbol() {
        let cfg = Config::with_mode(DecodeMode::P25P1);
        let mut e = SyncEngine::new();

        filler(&mut e, &cfg, WARMUP);

        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[0].symbols);
        assert!(res[..23].iter().all(|r| *r == Search::Pending));
        assert_eq!(res[23], found(SyncType::P25p1Pos, 0));
    }

    #[test]
    fn test_warmup() {
        let cfg = Config::with_mode(DecodeMode::P25P1);
        let mut e = SyncEngine::new();

        // The pattern completes on the 18th symbol, which is still in warm-up.
        let res = feed_str(&mut e, &cfg, &P25P1_PATTERNS[0].symbols[6..]);
        assert!(res.iter().all(|r| *r == Search::Pending));

        let mut e = SyncEngine::new();
        let res = feed_str(&mut e, &cfg, &b"1111111111111111111"[..]);
        assert_eq!(res.len(), 19);

        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[0].symbols);
        assert_eq!(res[23], found(SyncType::P25p1Pos, 0));
    }

    #[test]
    fn test_inverted_and_tolerance() {
        let cfg = Config::with_mode(DecodeMode::P25P1);
        let mut e = SyncEngine::new();
        filler(&mut e, &cfg, WARMUP);

        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[1].symbols);
        assert_eq!(res[23], found(SyncType::P25p1Neg, 0));
        assert!(SyncType::P25p1Neg.inverted());

        let mut e = SyncEngine::new();
        filler(&mut e, &cfg, WARMUP);

        let mut pat = P25P1_PATTERNS[0].symbols.to_vec();
        pat[3] = b'3';
        let res = feed_str(&mut e, &cfg, &pat);
        assert_eq!(res[23], found(SyncType::P25p1Pos, 1));

        let mut e = SyncEngine::new();
        filler(&mut e, &cfg, WARMUP);

        pat[10] = b'3';
        let res = feed_str(&mut e, &cfg, &pat);
        assert!(res.iter().all(|r| *r == Search::Pending));
    }

    #[test]
    fn test_disabled() {
        let cfg = Config::with_mode(DecodeMode::DMR);
        let mut e = SyncEngine::new();
        filler(&mut e, &cfg, WARMUP);

        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[0].symbols);
        assert!(res.iter().all(|r| *r == Search::Pending));
    }

    #[test]
    fn test_priority() {
        assert_eq!(PRIORITY[0], Protocol::P25p1);
        assert_eq!(PRIORITY[7], Protocol::DStar);

        let pos = |p| PRIORITY.iter().position(|&x| x == p).unwrap();
        assert!(pos(Protocol::Dmr) < pos(Protocol::Nxdn));
        assert!(pos(Protocol::Ysf) < pos(Protocol::Dmr));

        // DMR base station data sync with its tail replaced by the NXDN sync word, which
        // matches both once the NXDN cadence allows it.
        let mut window = DMR_PATTERNS[0].symbols.to_vec();
        window[14..].copy_from_slice(NXDN_PATTERNS[2].symbols);

        let mut cfg = Config::with_mode(DecodeMode::Auto);
        cfg.frame_x2tdma = false;

        let mut e = SyncEngine::new();
        e.nxdn_count = NXDN_PERIOD - 24;
        e.warmup = WARMUP;

        let res = feed_str(&mut e, &cfg, &window);
        assert_eq!(res[23], Search::Found(SyncMatch {
            sync: SyncType::DmrData,
            station: StationType::BaseStation,
            mismatches: 1,
        }));

        cfg.frame_dmr = false;

        let mut e = SyncEngine::new();
        e.nxdn_count = NXDN_PERIOD - 24;
        e.warmup = WARMUP;

        let res = feed_str(&mut e, &cfg, &window);
        assert_eq!(res[23], found(SyncType::NxdnPos, 0));
    }

    #[test]
    fn test_nxdn_gating() {
        let cfg = Config::with_mode(DecodeMode::NXDN96);
        let long = NXDN_PATTERNS[0].symbols;
        let short = NXDN_PATTERNS[2].symbols;

        let mut e = SyncEngine::new();
        filler(&mut e, &cfg, WARMUP);

        // Without a cadence, the sync word alone is rejected but starts one.
        assert!(feed_str(&mut e, &cfg, short).iter().all(|r| *r == Search::Pending));
        assert_eq!(e.nxdn_count(), Some(0));

        let res = feed_str(&mut e, &cfg, long);
        assert_eq!(res[21], found(SyncType::NxdnPos, 0));
        assert_eq!(e.nxdn_count(), Some(0));

        // One symbol early.
        filler(&mut e, &cfg, 181);
        assert!(feed_str(&mut e, &cfg, short).iter().all(|r| *r == Search::Pending));
        assert_eq!(e.nxdn_count(), Some(0));

        // Exactly one frame after the rejected word.
        filler(&mut e, &cfg, 182);
        let res = feed_str(&mut e, &cfg, short);
        assert_eq!(res[9], found(SyncType::NxdnPos, 0));

        // And again after two frames.
        filler(&mut e, &cfg, 374);
        let res = feed_str(&mut e, &cfg, short);
        assert_eq!(res[9], found(SyncType::NxdnPos, 0));

        e.reset();
        assert_eq!(e.nxdn_count(), None);
    }

    #[test]
    fn test_lost() {
        let cfg = Config::with_mode(DecodeMode::P25P1);
        let mut e = SyncEngine::new();

        filler(&mut e, &cfg, SEARCH_LIMIT - 1);

        e.push(Dibit::new(0));
        assert_eq!(e.search(&cfg), Search::Lost);

        // Searching starts over, including the warm-up.
        filler(&mut e, &cfg, WARMUP);
        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[0].symbols);
        assert_eq!(res[23], found(SyncType::P25p1Pos, 0));
    }

    #[test]
    fn test_resume() {
        let cfg = Config::with_mode(DecodeMode::P25P1);
        let mut e = SyncEngine::new();

        filler(&mut e, &cfg, 100);
        e.resume();

        // No warm-up after resuming.
        let res = feed_str(&mut e, &cfg, P25P1_PATTERNS[0].symbols);
        assert_eq!(res[23], found(SyncType::P25p1Pos, 0));
    }
}
