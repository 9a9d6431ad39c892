//! Status symbols, which are interleaved into P25 frames once every 36 dibits.

use crate::bits::Dibit;

use self::StatusCode::*;
use self::StreamSymbol::*;

/// Number of dibits per status period, including the status symbol.
pub const PERIOD: usize = 36;

/// Position in the status period of the first dibit after the NID, counting the 24 sync
/// dibits and the 64 NID dibits.
pub const START: usize = (24 + 64) % PERIOD;

/// A P25 status symbol.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum StatusCode {
    /// Used by a repeater when the inbound channel is idle.
    InboundIdle,
    /// Used by a repeater when the inbound channel is busy.
    InboundBusy,
    /// Used when a subscriber is transmitting to a repeater.
    SubscriberRepeater,
    /// Used when a subscriber is transmitting directly to another subscriber.
    SubscriberDirect,
}

impl StatusCode {
    /// Parse a status code from the given dibit.
    pub fn from_dibit(d: Dibit) -> StatusCode {
        match d.bits() {
            0b01 => InboundBusy,
            0b00 => SubscriberDirect,
            0b10 => SubscriberRepeater,
            _ => InboundIdle,
        }
    }

    /// Convert the status code into a dibit.
    pub fn to_dibit(self) -> Dibit {
        Dibit::new(match self {
            InboundBusy => 0b01,
            SubscriberDirect => 0b00,
            SubscriberRepeater => 0b10,
            InboundIdle => 0b11,
        })
    }
}

/// A symbol in a transmitted P25 stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StreamSymbol {
    /// Current symbol is a status code.
    Status(StatusCode),
    /// Current symbol is a data dibit.
    Data(Dibit),
}

/// Separates status symbols from the data symbols following the NID.
#[derive(Copy, Clone)]
pub struct StatusDeinterleaver {
    /// Current dibit position in current status period.
    pos: usize,
}

impl StatusDeinterleaver {
    /// Create a new `StatusDeinterleaver` for the dibit right after the NID.
    pub fn new() -> StatusDeinterleaver {
        StatusDeinterleaver {
            pos: START,
        }
    }

    /// Parse the given symbol as a status or data symbol.
    pub fn feed(&mut self, d: Dibit) -> StreamSymbol {
        self.pos += 1;
        self.pos %= PERIOD;

        if self.pos == 0 {
            Status(StatusCode::from_dibit(d))
        } else {
            Data(d)
        }
    }
}

/// Interleaves status symbols into a stream of data dibits following the NID.
pub struct StatusInterleaver<T: Iterator<Item = Dibit>> {
    /// Source of dibits to interleave status symbols into.
    src: T,
    /// Status to be output.
    status: StatusCode,
    /// Current dibit position in current status period.
    pos: usize,
}

impl<T: Iterator<Item = Dibit>> StatusInterleaver<T> {
    /// Create a new `StatusInterleaver` over the given data dibits, inserting the given
    /// status code.
    pub fn new(src: T, status: StatusCode) -> StatusInterleaver<T> {
        StatusInterleaver {
            src,
            status,
            pos: START,
        }
    }
}

impl<T: Iterator<Item = Dibit>> Iterator for StatusInterleaver<T> {
    type Item = Dibit;

    fn next(&mut self) -> Option<Self::Item> {
        self.pos += 1;
        self.pos %= PERIOD;

        if self.pos == 0 {
            return Some(self.status.to_dibit());
        }

        self.src.next()
    }
}
