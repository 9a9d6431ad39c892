//! Link control words. LDU1 carries one after its voice frames and a TDULC carries one
//! under Reed-Solomon protection. Both fill the call identities of the session.

use crate::bits::BitSlice;

/// Number of bytes in a link control word.
pub const LINK_CONTROL_BYTES: usize = 9;

/// Corrected link control bytes.
pub type Buf = [u8; LINK_CONTROL_BYTES];

/// Link control opcode (LCO) under the standard manufacturer ID.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum LinkControlOpcode {
    GroupVoiceTraffic,
    GroupVoiceUpdate,
    UnitVoiceTraffic,
    GroupVoiceUpdateExplicit,
    UnitCallRequest,
    PhoneTraffic,
    PhoneAlert,
    CallTermination,
    GroupAffiliationQuery,
    UnitRegistrationRequest,
    UnitAuthenticationRequest,
    UnitStatusRequest,
    SystemServiceBroadcast,
    AltControlChannel,
    AdjacentSite,
    RfssStatusBroadcast,
    NetworkStatusBroadcast,
    UnitStatusUpdate,
    UnitShortMessage,
    UnitCallAlert,
    ExtendedFunction,
    ChannelParamsUpdate,
    ProtectionParamBroadcast,
}

impl LinkControlOpcode {
    /// Look up the low 6 bits of the given byte.
    pub fn from_bits(bits: u8) -> Option<LinkControlOpcode> {
        use self::LinkControlOpcode::*;

        match bits & 0x3F {
            0b000000 => Some(GroupVoiceTraffic),
            0b000010 => Some(GroupVoiceUpdate),
            0b000011 => Some(UnitVoiceTraffic),
            0b000100 => Some(GroupVoiceUpdateExplicit),
            0b000101 => Some(UnitCallRequest),
            0b000110 => Some(PhoneTraffic),
            0b000111 => Some(PhoneAlert),
            0b001111 => Some(CallTermination),
            0b010000 => Some(GroupAffiliationQuery),
            0b010001 => Some(UnitRegistrationRequest),
            0b010010 => Some(UnitAuthenticationRequest),
            0b010011 => Some(UnitStatusRequest),
            0b010100 => Some(UnitStatusUpdate),
            0b010101 => Some(UnitShortMessage),
            0b010110 => Some(UnitCallAlert),
            0b010111 => Some(ExtendedFunction),
            0b011000 => Some(ChannelParamsUpdate),
            0b100000 => Some(SystemServiceBroadcast),
            0b100001 => Some(AltControlChannel),
            0b100010 => Some(AdjacentSite),
            0b100011 => Some(RfssStatusBroadcast),
            0b100100 => Some(NetworkStatusBroadcast),
            0b100101 => Some(ProtectionParamBroadcast),
            _ => None,
        }
    }
}

/// Decoded link control word. Only the call-related fields are interpreted.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LinkControlFields(Buf);

impl LinkControlFields {
    pub fn new(buf: Buf) -> Self { LinkControlFields(buf) }

    /// P bit, set when the remaining bytes are encrypted and the identities are
    /// unreadable.
    pub fn protected(&self) -> bool { self.0[0] >> 7 == 1 }

    /// SF bit, set for the explicit source format.
    pub fn explicit(&self) -> bool { self.0[0] >> 6 & 1 == 1 }

    /// Opcode, or `None` for values with no assigned meaning.
    pub fn opcode(&self) -> Option<LinkControlOpcode> {
        LinkControlOpcode::from_bits(self.0[0] & 0x3F)
    }

    /// MFID byte.
    pub fn mfg(&self) -> u8 { self.0[1] }

    /// Emergency bit of the service options, reported in the session.
    pub fn emergency(&self) -> bool { self.0[2] >> 7 == 1 }

    /// Talkgroup in bytes 4-5.
    pub fn talkgroup(&self) -> u16 { self.0[..].bits_at(32, 16) as u16 }

    /// 24-bit target address in bytes 3-5.
    pub fn dest_unit(&self) -> u32 { self.0[..].bits_at(24, 24) as u32 }

    /// 24-bit source address in bytes 6-8, stored as the session source.
    pub fn src_unit(&self) -> u32 { self.0[..].bits_at(48, 24) as u32 }

    /// Value stored as the session talkgroup. Unit-to-unit calls report the target
    /// address instead.
    pub fn destination(&self) -> u32 {
        match self.opcode() {
            Some(LinkControlOpcode::UnitVoiceTraffic) => self.dest_unit(),
            _ => self.talkgroup() as u32,
        }
    }

    /// Everything after the opcode byte.
    pub fn payload(&self) -> &[u8] { &self.0[1..] }

    pub fn bytes(&self) -> &Buf { &self.0 }
}
