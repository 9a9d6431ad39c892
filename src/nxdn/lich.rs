//! Link information channel (LICH), which describes how the rest of an NXDN frame is
//! used.
//!
//! Each of the 8 LICH dibits carries a single bit in its high position.

use crate::bits::{self, Dibit};
use crate::error::{DecodeError, Result};

/// Number of dibits in the LICH.
pub const LICH_DIBITS: usize = 8;

/// Kind of RF channel carrying the frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum RfChannel {
    /// Control channel (RCCH).
    Control,
    /// Traffic channel (RTCH).
    Traffic,
    /// Data channel (RDCH).
    Data,
    /// Composite control channel (RTCH_C).
    Composite,
}

impl RfChannel {
    fn from_bits(bits: u8) -> RfChannel {
        match bits & 0b11 {
            0b00 => RfChannel::Control,
            0b01 => RfChannel::Traffic,
            0b10 => RfChannel::Data,
            _ => RfChannel::Composite,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            RfChannel::Control => 0b00,
            RfChannel::Traffic => 0b01,
            RfChannel::Data => 0b10,
            RfChannel::Composite => 0b11,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RfChannel::Control => "RCCH",
            RfChannel::Traffic => "RTCH",
            RfChannel::Data => "RDCH",
            RfChannel::Composite => "RTCH_C",
        }
    }
}

/// Halves of the frame payload taken over by FACCH1 instead of voice.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum Steal {
    /// Four voice channels.
    None,
    /// FACCH1 in the first half and voice in the second.
    First,
    /// Voice in the first half and FACCH1 in the second.
    Second,
    /// FACCH1 in both halves.
    Both,
}

impl Steal {
    fn from_bits(bits: u8) -> Steal {
        match bits & 0b11 {
            0b11 => Steal::None,
            0b01 => Steal::First,
            0b10 => Steal::Second,
            _ => Steal::Both,
        }
    }

    fn to_bits(self) -> u8 {
        match self {
            Steal::None => 0b11,
            Steal::First => 0b01,
            Steal::Second => 0b10,
            Steal::Both => 0b00,
        }
    }

    /// Whether the given half of the payload carries voice.
    pub fn voice(self, half: usize) -> bool {
        self.to_bits() >> (1 - half) & 1 == 1
    }
}

/// A decoded LICH.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Lich(u8);

impl Lich {
    /// Check the parity of the given received bits.
    pub fn new(bits: u8) -> Result<Lich> {
        if bits::parity(bits >> 4) == bits & 1 {
            Ok(Lich(bits))
        } else {
            Err(DecodeError::Parity)
        }
    }

    /// Build a LICH from its fields.
    pub fn from_fields(rf: RfChannel, functional: u8, steal: Steal, outbound: bool) -> Lich {
        let bits = rf.to_bits() << 6 | (functional & 0b11) << 4 | steal.to_bits() << 2 |
                   (outbound as u8) << 1;

        Lich(bits | bits::parity(bits >> 4))
    }

    pub fn rf_channel(&self) -> RfChannel { RfChannel::from_bits(self.0 >> 6) }

    /// Functional channel type, which gives the SACCH and payload arrangement.
    pub fn functional(&self) -> u8 { self.0 >> 4 & 0b11 }

    pub fn steal(&self) -> Steal { Steal::from_bits(self.0 >> 2) }

    /// Whether the frame was sent by a repeater rather than a subscriber.
    pub fn outbound(&self) -> bool { self.0 >> 1 & 1 == 1 }

    pub fn bits(&self) -> u8 { self.0 }

    /// Encode into transmitted dibits.
    pub fn encode(&self) -> [Dibit; LICH_DIBITS] {
        let mut out = [Dibit::default(); LICH_DIBITS];

        for (i, d) in out.iter_mut().enumerate() {
            *d = Dibit::new((self.0 >> (7 - i) & 1) << 1 | 1);
        }

        out
    }
}

/// Receives the LICH dibits following the frame sync.
pub struct LichReceiver {
    bits: u8,
    pos: usize,
}

impl LichReceiver {
    pub fn new() -> LichReceiver {
        LichReceiver { bits: 0, pos: 0 }
    }

    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<Lich>> {
        self.bits = self.bits << 1 | dibit.hi();
        self.pos += 1;

        if self.pos == LICH_DIBITS {
            Some(Lich::new(self.bits))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fields() {
        let l = Lich::from_fields(RfChannel::Traffic, 0b10, Steal::Second, true);

        assert_eq!(l.rf_channel(), RfChannel::Traffic);
        assert_eq!(l.functional(), 0b10);
        assert_eq!(l.steal(), Steal::Second);
        assert!(l.outbound());
        assert_eq!(Lich::new(l.bits()), Ok(l));
        assert_eq!(Lich::new(l.bits() ^ 0b10000000), Err(DecodeError::Parity));

        // Bits outside the parity span aren't covered.
        assert!(Lich::new(l.bits() ^ 0b10).is_ok());
    }

    #[test]
    fn test_steal() {
        assert!(Steal::None.voice(0) && Steal::None.voice(1));
        assert!(!Steal::First.voice(0) && Steal::First.voice(1));
        assert!(Steal::Second.voice(0) && !Steal::Second.voice(1));
        assert!(!Steal::Both.voice(0) && !Steal::Both.voice(1));
    }

    #[test]
    fn test_receive() {
        let l = Lich::from_fields(RfChannel::Data, 0b01, Steal::None, false);
        let mut r = LichReceiver::new();
        let dibits = l.encode();

        for &d in dibits[..7].iter() {
            assert!(r.feed(d).is_none());
        }

        assert_eq!(r.feed(dibits[7]), Some(Ok(l)));
    }
}
