//! Network ID (NID), Network Access Code (NAC), and Data Unit utilities.

use crate::bits::Dibit;
use crate::buffer::{Buffer, DibitStorage};
use crate::coding::bch;
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};

/// Number of dibits taken up by the NID after the frame sync.
pub const NID_DIBITS: usize = 64;

/// Number of leading NID dibits that carry the BCH codeword.
const CODEWORD_DIBITS: usize = 32;

/// "Digital squelch" NAC field of the NID.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NetworkAccessCode {
    /// Default P25 NAC.
    Default,
    /// Allows receiver to unsquelch on any NAC (shouldn't be transmitted.)
    ReceiveAny,
    /// Allows repeater to unsquelch/retransmit any NAC (shouldn't be transmitted.)
    RepeatAny,
    /// Custom NAC.
    Other(u16),
}

impl NetworkAccessCode {
    /// Parse 12 bits into a NAC.
    pub fn from_bits(bits: u16) -> NetworkAccessCode {
        use self::NetworkAccessCode::*;

        assert!(bits >> 12 == 0);

        match bits {
            0x293 => Default,
            0xF7E => ReceiveAny,
            0xF7F => RepeatAny,
            _ => Other(bits),
        }
    }

    /// Convert NAC to a 12-bit word.
    pub fn to_bits(self) -> u16 {
        use self::NetworkAccessCode::*;

        match self {
            Default => 0x293,
            ReceiveAny => 0xF7E,
            RepeatAny => 0xF7F,
            Other(bits) => bits,
        }
    }
}

/// Data unit of associated frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum DataUnit {
    /// Header data unit, which precedes a voice call.
    VoiceHeader,
    /// Terminator with link control.
    VoiceLCTerminator,
    /// Logical data unit 1, carrying link control.
    VoiceLCFrameGroup,
    /// Trunking signalling block.
    TrunkingSignaling,
    /// Packet data unit.
    DataPacket,
    /// Logical data unit 2, carrying encryption sync.
    VoiceCCFrameGroup,
    /// Simple terminator.
    VoiceSimpleTerminator,
}

impl DataUnit {
    /// Parse 4 bits into a data unit type.
    pub fn from_bits(bits: u8) -> Option<DataUnit> {
        use self::DataUnit::*;

        assert!(bits >> 4 == 0);

        match bits {
            0x0 => Some(VoiceHeader),
            0x3 => Some(VoiceLCTerminator),
            0x5 => Some(VoiceLCFrameGroup),
            0x7 => Some(TrunkingSignaling),
            0x9 => Some(DataPacket),
            0xA => Some(VoiceCCFrameGroup),
            0xF => Some(VoiceSimpleTerminator),
            _ => None,
        }
    }

    /// Convert data unit to 4-bit word.
    pub fn to_bits(self) -> u8 {
        use self::DataUnit::*;

        match self {
            VoiceHeader => 0x0,
            VoiceLCTerminator => 0x3,
            VoiceLCFrameGroup => 0x5,
            TrunkingSignaling => 0x7,
            DataPacket => 0x9,
            VoiceCCFrameGroup => 0xA,
            VoiceSimpleTerminator => 0xF,
        }
    }

    /// Short frame type label.
    pub fn label(self) -> &'static str {
        use self::DataUnit::*;

        match self {
            VoiceHeader => "HDU",
            VoiceLCTerminator => "TDULC",
            VoiceLCFrameGroup => "LDU1",
            TrunkingSignaling => "TSBK",
            DataPacket => "PDU",
            VoiceCCFrameGroup => "LDU2",
            VoiceSimpleTerminator => "TDU",
        }
    }
}

/// NID word associated with each P25 frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NetworkId {
    /// NAC field.
    pub access_code: NetworkAccessCode,
    /// DUID field.
    pub data_unit: DataUnit,
}

impl NetworkId {
    /// Create an NID word from the given NAC and data unit.
    pub fn new(access_code: NetworkAccessCode, data_unit: DataUnit) -> NetworkId {
        NetworkId {
            access_code,
            data_unit,
        }
    }

    /// Parse NID from the given 16-bit word, failing on an unknown data unit.
    pub fn from_bits(bits: u16) -> Result<NetworkId> {
        let duid = bits as u8 & 0b1111;
        let du = DataUnit::from_bits(duid).ok_or(DecodeError::UnknownDuid(duid))?;

        Ok(NetworkId::new(NetworkAccessCode::from_bits(bits >> 4), du))
    }

    /// Convert NID to 16-bit representation.
    pub fn to_bits(&self) -> u16 {
        self.access_code.to_bits() << 4 | self.data_unit.to_bits() as u16
    }

    /// Encode NID into a byte sequence.
    pub fn encode(&self) -> [u8; 8] {
        let e = bch::encode(self.to_bits());

        [
            (e >> 56) as u8,
            (e >> 48) as u8,
            (e >> 40) as u8,
            (e >> 32) as u8,
            (e >> 24) as u8,
            (e >> 16) as u8,
            (e >> 8) as u8,
            e as u8,
        ]
    }
}

/// Receives the NID dibits that follow a P25 frame sync.
pub struct NidReceiver {
    /// Codeword dibits.
    dibits: Buffer<DibitStorage>,
    /// Codeword, once received.
    word: Option<u64>,
    /// Number of dibits received so far.
    pos: usize,
    stats: Stats,
}

impl NidReceiver {
    pub fn new() -> NidReceiver {
        NidReceiver {
            dibits: Buffer::new(DibitStorage::new(CODEWORD_DIBITS)),
            word: None,
            pos: 0,
            stats: Stats::default(),
        }
    }

    /// Feed in a dibit, producing the decoded NID once every NID dibit has been received.
    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<NetworkId>> {
        self.pos += 1;

        // The filler after the codeword is only counted.
        if self.pos <= CODEWORD_DIBITS {
            if let Some(&mut word) = self.dibits.feed(dibit) {
                self.word = Some(word);
            }
        }

        if self.pos < NID_DIBITS {
            return None;
        }

        let word = match self.word {
            Some(w) => w,
            None => return Some(Err(DecodeError::FrameOverflow(self.pos))),
        };

        let data = match self.stats.bch.record(bch::decode(word)) {
            Some(data) => data,
            None => return Some(Err(DecodeError::BchUnrecoverable)),
        };

        Some(NetworkId::from_bits(data))
    }
}

impl HasStats for NidReceiver {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}
