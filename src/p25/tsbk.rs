//! Receive and decode trunking signalling blocks (TSBK).

use collect_slice::CollectSlice;

use crate::bits::{BitSlice, Dibit, DibitBytes};
use crate::buffer::{Buffer, TsbkStorage};
use crate::coding::crc::CRC16;
use crate::coding::trellis::{self, DibitStates};
use crate::error::{DecodeError, Result};
use crate::stats::{HasStats, Stats};

/// Number of dibits in a coded block.
pub const CODED_DIBITS: usize = 98;

/// Number of bytes in a decoded block.
pub const TSBK_BYTES: usize = 12;

/// Maximum number of blocks in a TSBK frame.
pub const MAX_BLOCKS: usize = 3;

/// Starting dibit of each row of the block interleaver.
const ROWS: [usize; 4] = [0, 26, 50, 74];

pub type Buf = [u8; TSBK_BYTES];

/// Get the index in the transmitted block of the first dibit of the given coded dibit
/// pair.
fn interleaved(pair: usize) -> usize {
    ROWS[pair % ROWS.len()] + pair / ROWS.len() * 2
}

/// Undo the block interleaving of the given received dibits.
pub fn deinterleave(buf: &[Dibit; CODED_DIBITS]) -> [Dibit; CODED_DIBITS] {
    let mut out = [Dibit::default(); CODED_DIBITS];

    for pair in 0..CODED_DIBITS / 2 {
        let idx = interleaved(pair);

        out[pair * 2] = buf[idx];
        out[pair * 2 + 1] = buf[idx + 1];
    }

    out
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum TsbkOpcode {
    GroupVoiceGrant,
    GroupVoiceUpdate,
    GroupVoiceUpdateExplicit,
    UnitVoiceGrant,
    UnitCallRequest,
    UnitVoiceUpdate,
    PhoneGrant,
    PhoneCallRequest,
    UnitDataGrant,
    GroupDataGrant,
    GroupDataAnnounce,
    GroupDataAnnounceExplicit,
    UnitStatusUpdate,
    UnitStatusQuery,
    UnitShortMessage,
    UnitMonitor,
    UnitCallAlert,
    AckResponse,
    QueuedResponse,
    ExtendedFunctionResponse,
    DenyResponse,
    GroupAffiliationResponse,
    GroupAffiliationQuery,
    LocRegistrationResponse,
    UnitRegistrationResponse,
    UnitRegistrationCommand,
    AuthCommand,
    DeregistrationAck,
    RoamingAddrCommand,
    RoamingAddrUpdate,
    SystemServiceBroadcast,
    AltControlBroadcast,
    RfssStatusBroadcast,
    NetworkStatusBroadcast,
    AdjacentSiteBroadcast,
    ChannelParamsUpdate,
    ProtectionParamBroadcast,
    ProtectionParamUpdate,
    Reserved,
}

impl TsbkOpcode {
    pub fn from_bits(bits: u8) -> TsbkOpcode {
        use self::TsbkOpcode::*;

        assert!(bits >> 6 == 0);

        match bits {
            0b000000 => GroupVoiceGrant,
            0b000010 => GroupVoiceUpdate,
            0b000011 => GroupVoiceUpdateExplicit,
            0b000100 => UnitVoiceGrant,
            0b000101 => UnitCallRequest,
            0b000110 => UnitVoiceUpdate,
            0b001000 => PhoneGrant,
            0b001010 => PhoneCallRequest,
            0b010000 => UnitDataGrant,
            0b010001 => GroupDataGrant,
            0b010010 => GroupDataAnnounce,
            0b010011 => GroupDataAnnounceExplicit,
            0b011000 => UnitStatusUpdate,
            0b011010 => UnitStatusQuery,
            0b011100 => UnitShortMessage,
            0b011101 => UnitMonitor,
            0b011111 => UnitCallAlert,
            0b100000 => AckResponse,
            0b100001 => QueuedResponse,
            0b100100 => ExtendedFunctionResponse,
            0b100111 => DenyResponse,
            0b101000 => GroupAffiliationResponse,
            0b101010 => GroupAffiliationQuery,
            0b101011 => LocRegistrationResponse,
            0b101100 => UnitRegistrationResponse,
            0b101101 => UnitRegistrationCommand,
            0b101110 => AuthCommand,
            0b101111 => DeregistrationAck,
            0b110110 => RoamingAddrCommand,
            0b110111 => RoamingAddrUpdate,
            0b111000 => SystemServiceBroadcast,
            0b111001 => AltControlBroadcast,
            0b111010 => RfssStatusBroadcast,
            0b111011 => NetworkStatusBroadcast,
            0b111100 => AdjacentSiteBroadcast,
            0b111101 => ChannelParamsUpdate,
            0b111110 => ProtectionParamBroadcast,
            0b111111 => ProtectionParamUpdate,
            _ => Reserved,
        }
    }
}

/// A decoded trunking signalling block.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TsbkFields {
    buf: Buf,
    crc_valid: bool,
}

impl TsbkFields {
    /// Wrap the given decoded bytes, checking their CRC.
    pub fn new(buf: Buf) -> TsbkFields {
        TsbkFields {
            buf,
            crc_valid: calc_crc(&buf) == buf[..].bits_at(80, 16) as u16,
        }
    }

    /// Whether this is the last block of the frame.
    pub fn is_tail(&self) -> bool { self.buf[0] >> 7 == 1 }
    pub fn protected(&self) -> bool { self.buf[0] >> 6 & 1 == 1 }

    /// Opcode, if the block uses the standard format.
    pub fn opcode(&self) -> Option<TsbkOpcode> {
        if self.standard() {
            Some(TsbkOpcode::from_bits(self.buf[0] & 0x3F))
        } else {
            None
        }
    }

    pub fn mfg(&self) -> u8 { self.buf[1] }

    /// Whether the manufacturer ID selects the standard message set.
    pub fn standard(&self) -> bool { self.buf[1] <= 1 }

    /// Opcode-specific argument bytes.
    pub fn args(&self) -> &[u8] { &self.buf[2..10] }

    /// Whether the checksum matched the block contents.
    pub fn crc_valid(&self) -> bool { self.crc_valid }

    /// Talkgroup and source unit of a group voice grant.
    pub fn group_grant(&self) -> Option<(u16, u32)> {
        match self.opcode() {
            Some(TsbkOpcode::GroupVoiceGrant) => Some((
                self.buf[..].bits_at(40, 16) as u16,
                self.buf[..].bits_at(56, 24) as u32,
            )),
            _ => None,
        }
    }
}

/// Calculate the CRC over the first 10 bytes of a block.
pub fn calc_crc(buf: &Buf) -> u16 {
    CRC16::new().feed_bytes(buf[..10].iter().cloned()).finish() as u16
}

/// Receives the data dibits of one TSBK block, with status symbols removed.
pub struct TsbkReceiver {
    dibits: Buffer<TsbkStorage>,
    stats: Stats,
}

impl TsbkReceiver {
    pub fn new() -> TsbkReceiver {
        TsbkReceiver {
            dibits: Buffer::new(TsbkStorage::new()),
            stats: Stats::default(),
        }
    }

    pub fn feed(&mut self, dibit: Dibit) -> Option<Result<TsbkFields>> {
        let coded = deinterleave(self.dibits.feed(dibit)?);
        let mut dibits = [Dibit::default(); CODED_DIBITS / 2];

        match trellis::decode_dibits::<DibitStates>(&coded, &mut dibits) {
            Ok(fixed) => self.stats.trellis.record_fixes(fixed),
            Err(e) => {
                self.stats.trellis.record_err();
                return Some(Err(e));
            },
        }

        // The final dibit only flushes the encoder.
        let mut bytes = [0; TSBK_BYTES];
        DibitBytes::new(dibits[..48].iter().cloned()).collect_slice_checked(&mut bytes[..]);

        let tsbk = TsbkFields::new(bytes);

        if !tsbk.crc_valid() {
            warn!("TSBK CRC mismatch");
            self.stats.record_err(DecodeError::Crc);
        }

        Some(Ok(tsbk))
    }
}

impl HasStats for TsbkReceiver {
    fn stats(&mut self) -> &mut Stats { &mut self.stats }
}

/// Encode the given block bytes, with the CRC filled in, into transmitted dibits.
pub fn encode(buf: &Buf) -> [Dibit; CODED_DIBITS] {
    use crate::bits::Dibits;
    use crate::coding::trellis::DibitFSM;

    let mut fsm = DibitFSM::new();
    let mut coded = [Dibit::default(); CODED_DIBITS];

    let pairs = Dibits::new(buf.iter().cloned())
        .map(|d| fsm.feed(d))
        .collect::<Vec<(Dibit, Dibit)>>();

    for (i, &(a, b)) in pairs.iter().chain(std::iter::once(&fsm.finish())).enumerate() {
        let idx = interleaved(i);

        coded[idx] = a;
        coded[idx + 1] = b;
    }

    coded
}

/// Fill in the CRC of the given block.
pub fn seal(buf: &mut Buf) {
    let crc = calc_crc(buf);
    buf[10] = (crc >> 8) as u8;
    buf[11] = crc as u8;
}
