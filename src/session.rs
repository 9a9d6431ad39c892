//! Per-call state shared between the decoder and the active frame processor.

use crate::nxdn::message::SacchAssembler;
use crate::p25::status::StatusCode;
use crate::sync::{Polarity, Protocol, SyncType};

/// Whether a TDMA burst came from a repeater or a subscriber.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum StationType {
    NotApplicable,
    BaseStation,
    MobileStation,
}

/// Voice codec variant of the frames being produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum MbeRate {
    /// No voice codec, or one chosen later from the frame contents.
    None,
    /// IMBE/AMBE full rate with 3600 bps total and 2450 bps of voice (P25, DMR, NXDN).
    Rate3600x2450,
    /// AMBE at 3600 bps total and 2400 bps of voice (D-Star).
    Rate3600x2400,
    /// AMBE+2 at 2450 bps without FEC (YSF voice/data mode 2 and NXDN half rate).
    Rate2450,
}

/// Call state, reset whenever the carrier is lost.
#[derive(Clone, Debug)]
pub struct Session {
    /// Most recently matched sync.
    pub sync: Option<SyncType>,
    /// Whether a sync has been matched since the carrier was last lost.
    pub carrier: bool,
    pub station: StationType,
    pub mbe_rate: MbeRate,
    /// P25 network access code, or the NXDN RAN and DMR colour code.
    pub nac: u16,
    pub talkgroup: u32,
    pub source: u32,
    pub encrypted: bool,
    pub algid: u8,
    pub keyid: u16,
    pub emergency: bool,
    /// Whether voice frames are currently being received.
    pub voice_active: bool,
    /// Short label of the frame being decoded.
    pub frame_type: &'static str,
    /// Number of consecutive P25 terminators with link control.
    pub tdulc_count: usize,
    /// Most recent P25 status symbol.
    pub status: Option<StatusCode>,
    /// NXDN superframe message being collected from SACCH fragments.
    pub sacch: SacchAssembler,
}

impl Session {
    pub fn new() -> Session {
        Session {
            sync: None,
            carrier: false,
            station: StationType::NotApplicable,
            mbe_rate: MbeRate::Rate3600x2450,
            nac: 0,
            talkgroup: 0,
            source: 0,
            encrypted: false,
            algid: 0,
            keyid: 0,
            emergency: false,
            voice_active: false,
            frame_type: "",
            tdulc_count: 0,
            status: None,
            sacch: SacchAssembler::new(),
        }
    }

    /// Forget everything about the current call.
    pub fn no_carrier(&mut self) {
        let mbe_rate = self.mbe_rate;

        *self = Session {
            mbe_rate,
            ..Session::new()
        };
    }

    /// Clear the identities of the current call, as done when a new frame begins.
    pub fn clear_ids(&mut self) {
        self.nac = 0;
        self.talkgroup = 0;
        self.source = 0;
    }

    /// Take a copy of the externally visible state, where `searching` tells whether the
    /// decoder is hunting for sync.
    pub fn snapshot(&self, searching: bool) -> Snapshot {
        Snapshot {
            searching,
            protocol: self.sync.map(|s| s.protocol()),
            polarity: self.sync.map(|s| s.polarity()),
            sync: self.sync,
            station: self.station,
            nac: self.nac,
            talkgroup: self.talkgroup,
            source: self.source,
            encrypted: self.encrypted,
            algid: self.algid,
            keyid: self.keyid,
            emergency: self.emergency,
            frame_type: self.frame_type,
        }
    }
}

/// Point-in-time view of the session.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Snapshot {
    pub searching: bool,
    /// Protocol of the current or last call, or `None` while searching without carrier.
    pub protocol: Option<Protocol>,
    pub polarity: Option<Polarity>,
    pub sync: Option<SyncType>,
    pub station: StationType,
    pub nac: u16,
    pub talkgroup: u32,
    pub source: u32,
    pub encrypted: bool,
    pub algid: u8,
    pub keyid: u16,
    pub emergency: bool,
    pub frame_type: &'static str,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_no_carrier() {
        let mut s = Session::new();

        s.sync = Some(SyncType::P25p1Neg);
        s.carrier = true;
        s.nac = 0x293;
        s.talkgroup = 100;
        s.source = 5000;
        s.encrypted = true;
        s.mbe_rate = MbeRate::Rate3600x2400;
        s.frame_type = "LDU1";

        let snap = s.snapshot(false);
        assert!(!snap.searching);
        assert_eq!(snap.protocol, Some(Protocol::P25p1));
        assert_eq!(snap.polarity, Some(Polarity::Negative));
        assert_eq!(snap.talkgroup, 100);

        s.no_carrier();

        let snap = s.snapshot(true);
        assert_eq!(snap.protocol, None);
        assert_eq!(snap.nac, 0);
        assert_eq!(snap.source, 0);
        assert!(!snap.encrypted);
        assert_eq!(snap.frame_type, "");
        assert!(!s.carrier);
        assert_eq!(s.mbe_rate, MbeRate::Rate3600x2400);
    }
}
