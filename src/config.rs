//! Decoder options: which protocols to search for and how to treat a dropped carrier.

/// Symbol rate of the demodulated stream.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum DataRate {
    /// 2400 baud, used by NXDN48 and dPMR.
    Rate2400,
    /// 4800 baud, used by most of the supported protocols.
    Rate4800,
    /// 9600 baud, used by ProVoice.
    Rate9600,
}

impl DataRate {
    /// Symbols per second.
    pub fn baud(&self) -> u32 {
        match *self {
            DataRate::Rate2400 => 2400,
            DataRate::Rate4800 => 4800,
            DataRate::Rate9600 => 9600,
        }
    }
}

impl Default for DataRate {
    fn default() -> Self { DataRate::Rate4800 }
}

/// Protocol selection, applied with `Config::set_decode_mode`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum DecodeMode {
    /// Disable every protocol.
    None,
    /// Enable every protocol that runs at the current data rate.
    Auto,
    DStar,
    DMR,
    NXDN48,
    NXDN96,
    P25P1,
    ProVoice,
    X2TDMA,
    YSF,
    DPMR,
}

/// Runtime options read by the decoder.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Config {
    pub frame_dmr: bool,
    pub frame_dstar: bool,
    pub frame_p25p1: bool,
    pub frame_nxdn48: bool,
    pub frame_nxdn96: bool,
    pub frame_provoice: bool,
    pub frame_x2tdma: bool,
    pub frame_dpmr: bool,
    pub frame_ysf: bool,
    /// Symbol rate of the incoming stream.
    pub data_rate: DataRate,
    /// Number of consecutive zero samples, while decoding a frame, after which the
    /// carrier is considered lost.
    pub squelch_timeout: usize,
    /// Number of consecutive P25 terminators with link control tolerated before the call
    /// is dropped, or 0 to never drop it.
    pub resume_after_tdulc: usize,
    /// Whether P25 voice frames of an encrypted call are held back from the vocoder.
    pub mute_encrypted: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            frame_dmr: false,
            frame_dstar: false,
            frame_p25p1: false,
            frame_nxdn48: false,
            frame_nxdn96: false,
            frame_provoice: false,
            frame_x2tdma: false,
            frame_dpmr: false,
            frame_ysf: false,
            data_rate: DataRate::Rate4800,
            squelch_timeout: 48000,
            resume_after_tdulc: 0,
            mute_encrypted: true,
        }
    }
}

impl Config {
    /// Construct a `Config` with the given mode enabled.
    pub fn with_mode(mode: DecodeMode) -> Config {
        let mut c = Config::default();
        c.set_decode_mode(mode, true);
        c
    }

    /// Enable or disable the given protocol, switching the data rate to the one it runs
    /// at.
    ///
    /// `Auto` enables the set of protocols matching the current data rate, and `None`
    /// disables everything regardless of `on`.
    pub fn set_decode_mode(&mut self, mode: DecodeMode, on: bool) -> &mut Self {
        use self::DataRate::*;
        use self::DecodeMode::*;

        match mode {
            None => self.clear(),
            Auto => {
                self.clear();

                match self.data_rate {
                    Rate2400 => {
                        self.frame_nxdn48 = true;
                        self.frame_dpmr = true;
                    },
                    Rate4800 => {
                        self.frame_dmr = true;
                        self.frame_dstar = true;
                        self.frame_x2tdma = true;
                        self.frame_p25p1 = true;
                        self.frame_nxdn96 = true;
                        self.frame_ysf = true;
                    },
                    Rate9600 => self.frame_provoice = true,
                }
            },
            DMR => self.frame_dmr = on,
            DStar => self.enable_4800(on, |c| &mut c.frame_dstar),
            P25P1 => self.enable_4800(on, |c| &mut c.frame_p25p1),
            NXDN96 => self.enable_4800(on, |c| &mut c.frame_nxdn96),
            X2TDMA => self.enable_4800(on, |c| &mut c.frame_x2tdma),
            YSF => self.enable_4800(on, |c| &mut c.frame_ysf),
            NXDN48 => {
                self.frame_nxdn48 = on;
                self.data_rate = if on { Rate2400 } else { Rate4800 };
            },
            DPMR => {
                self.frame_dpmr = on;
                self.data_rate = if on { Rate2400 } else { Rate4800 };
            },
            ProVoice => {
                self.frame_provoice = on;
                self.data_rate = if on { Rate9600 } else { Rate4800 };
            },
        }

        self
    }

    /// Set the flag picked by `f`, moving to 4800 baud when it's turned on.
    fn enable_4800<F>(&mut self, on: bool, f: F) where F: FnOnce(&mut Config) -> &mut bool {
        *f(self) = on;

        if on {
            self.data_rate = DataRate::Rate4800;
        }
    }

    /// Disable every protocol.
    fn clear(&mut self) {
        self.frame_dmr = false;
        self.frame_dstar = false;
        self.frame_p25p1 = false;
        self.frame_nxdn48 = false;
        self.frame_nxdn96 = false;
        self.frame_provoice = false;
        self.frame_x2tdma = false;
        self.frame_dpmr = false;
        self.frame_ysf = false;
    }

    /// Whether either NXDN rate is enabled.
    pub fn frame_nxdn(&self) -> bool { self.frame_nxdn48 || self.frame_nxdn96 }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert!(!c.frame_p25p1 && !c.frame_dmr && !c.frame_nxdn());
        assert_eq!(c.data_rate, DataRate::Rate4800);
        assert_eq!(c.squelch_timeout, 48000);
        assert_eq!(c.data_rate.baud(), 4800);
    }

    #[test]
    fn test_single_modes() {
        let mut c = Config::default();

        c.set_decode_mode(DecodeMode::NXDN48, true);
        assert!(c.frame_nxdn48);
        assert_eq!(c.data_rate, DataRate::Rate2400);

        c.set_decode_mode(DecodeMode::P25P1, true);
        assert!(c.frame_p25p1 && c.frame_nxdn48);
        assert_eq!(c.data_rate, DataRate::Rate4800);

        c.set_decode_mode(DecodeMode::ProVoice, true);
        assert_eq!(c.data_rate, DataRate::Rate9600);
        c.set_decode_mode(DecodeMode::ProVoice, false);
        assert!(!c.frame_provoice);
        assert_eq!(c.data_rate, DataRate::Rate4800);

        // DMR leaves the rate alone.
        c.set_decode_mode(DecodeMode::DPMR, true);
        c.set_decode_mode(DecodeMode::DMR, true);
        assert!(c.frame_dmr);
        assert_eq!(c.data_rate, DataRate::Rate2400);

        c.set_decode_mode(DecodeMode::None, true);
        assert_eq!(Config { data_rate: DataRate::Rate2400, ..Config::default() }, c);
    }

    #[test]
    fn test_auto() {
        let c = Config::with_mode(DecodeMode::Auto);
        assert!(c.frame_dmr && c.frame_dstar && c.frame_x2tdma && c.frame_p25p1);
        assert!(c.frame_nxdn96 && c.frame_ysf);
        assert!(!c.frame_nxdn48 && !c.frame_dpmr && !c.frame_provoice);

        let mut c = Config { data_rate: DataRate::Rate2400, ..Config::default() };
        c.set_decode_mode(DecodeMode::Auto, true);
        assert!(c.frame_nxdn48 && c.frame_dpmr && !c.frame_p25p1);

        let mut c = Config { data_rate: DataRate::Rate9600, ..Config::default() };
        c.set_decode_mode(DecodeMode::Auto, true);
        assert!(c.frame_provoice && !c.frame_dmr);
    }
}
