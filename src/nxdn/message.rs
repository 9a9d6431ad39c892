//! Layer-3 messages carried by the NXDN associated control channels.

use crate::bits::BitSlice;

/// Number of bytes in a message.
pub const MESSAGE_BYTES: usize = 10;

/// Number of bits in each SACCH fragment.
pub const FRAGMENT_BITS: usize = 18;

/// Number of SACCH fragments in a superframe message.
pub const FRAGMENTS: usize = 4;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum MessageType {
    VoiceCall,
    VoiceCallReception,
    VoiceCallConnection,
    VoiceCallAssignment,
    VoiceCallAssignmentDup,
    TxRelease,
    DataCallHeader,
    DataCallData,
    DataCallAck,
    HeaderDelay,
    Idle,
    SiteInfo,
    ServiceInfo,
    AdjacentSiteInfo,
    GroupRegistration,
    AuthInquiryRequest,
    AuthInquiryResponse,
    StatusInquiryRequest,
    StatusInquiryResponse,
    StatusRequest,
    StatusResponse,
    RemoteControlRequest,
    RemoteControlResponse,
    ShortDataCallHeader,
    ShortDataCallData,
    ShortDataCallInit,
    ShortDataCallResponse,
    Proprietary,
    Unknown(u8),
}

impl MessageType {
    pub fn from_bits(bits: u8) -> MessageType {
        use self::MessageType::*;

        match bits & 0x3F {
            0x01 => VoiceCall,
            0x02 => VoiceCallReception,
            0x03 => VoiceCallConnection,
            0x04 => VoiceCallAssignment,
            0x05 => VoiceCallAssignmentDup,
            0x08 => TxRelease,
            0x09 => DataCallHeader,
            0x0B => DataCallData,
            0x0C => DataCallAck,
            0x0F => HeaderDelay,
            0x10 => Idle,
            0x18 => SiteInfo,
            0x19 => ServiceInfo,
            0x1B => AdjacentSiteInfo,
            0x24 => GroupRegistration,
            0x28 => AuthInquiryRequest,
            0x29 => AuthInquiryResponse,
            0x30 => StatusInquiryRequest,
            0x31 => StatusInquiryResponse,
            0x32 => StatusRequest,
            0x33 => StatusResponse,
            0x34 => RemoteControlRequest,
            0x35 => RemoteControlResponse,
            0x38 => ShortDataCallHeader,
            0x39 => ShortDataCallData,
            0x3A => ShortDataCallInit,
            0x3B => ShortDataCallResponse,
            0x3F => Proprietary,
            b => Unknown(b),
        }
    }

    /// Whether messages of this type identify the calling and called units.
    pub fn has_call_details(self) -> bool {
        use self::MessageType::*;

        match self {
            AuthInquiryRequest | AuthInquiryResponse => true,
            _ => self.has_group_info(),
        }
    }

    /// Whether messages of this type tell group calls from unit calls.
    pub fn has_group_info(self) -> bool {
        use self::MessageType::*;

        match self {
            VoiceCall | DataCallHeader | DataCallAck | TxRelease | HeaderDelay |
            ShortDataCallHeader | ShortDataCallResponse | StatusInquiryRequest |
            StatusInquiryResponse | StatusRequest | StatusResponse |
            RemoteControlRequest | RemoteControlResponse => true,
            _ => false,
        }
    }

    /// Whether messages of this type announce the voice codec rate.
    pub fn has_rate(self) -> bool {
        use self::MessageType::*;

        match self {
            VoiceCall | VoiceCallReception | VoiceCallConnection | VoiceCallAssignment |
            VoiceCallAssignmentDup => true,
            _ => false,
        }
    }
}

/// Neighbouring site announced by a control channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct AdjacentSite {
    pub site: u8,
    pub channel: u16,
    pub location: u32,
}

/// A layer-3 message.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub struct Message([u8; MESSAGE_BYTES]);

impl Message {
    pub fn new(buf: [u8; MESSAGE_BYTES]) -> Message { Message(buf) }

    pub fn bytes(&self) -> &[u8; MESSAGE_BYTES] { &self.0 }

    pub fn kind(&self) -> MessageType { MessageType::from_bits(self.0[0]) }

    fn word(&self, idx: usize) -> u16 {
        (self.0[idx] as u16) << 8 | self.0[idx + 1] as u16
    }

    fn location_at(&self, idx: usize) -> u32 {
        (self.0[idx] as u32) << 16 | (self.0[idx + 1] as u32) << 8 | self.0[idx + 2] as u32
    }

    /// Calling unit.
    pub fn source(&self) -> Option<u16> {
        if self.kind().has_call_details() { Some(self.word(3)) } else { None }
    }

    /// Called group or unit.
    pub fn destination(&self) -> Option<u16> {
        if self.kind().has_call_details() { Some(self.word(5)) } else { None }
    }

    pub fn group_call(&self) -> Option<bool> {
        if self.kind().has_group_info() {
            Some(self.0[2] & 0x80 == 0)
        } else {
            None
        }
    }

    /// Location ID of the transmitting site.
    pub fn location_id(&self) -> Option<u32> {
        match self.kind() {
            MessageType::SiteInfo | MessageType::ServiceInfo => Some(self.location_at(1)),
            _ => None,
        }
    }

    /// Service information bits of the site.
    pub fn service_info(&self) -> Option<u16> {
        match self.kind() {
            MessageType::SiteInfo => Some(self.word(6)),
            MessageType::ServiceInfo => Some(self.word(4)),
            _ => None,
        }
    }

    /// Get the adjacent site at the given index, if the message carries it.
    pub fn adjacent_site(&self, idx: usize) -> Option<AdjacentSite> {
        if self.kind() != MessageType::AdjacentSiteInfo {
            return None;
        }

        let base = idx * 5;

        if base + 5 >= MESSAGE_BYTES {
            return None;
        }

        Some(AdjacentSite {
            site: self.0[base + 4] >> 2 & 0xF,
            channel: ((self.0[base + 4] & 0b11) as u16) << 8 | self.0[base + 5] as u16,
            location: self.location_at(base + 1),
        })
    }

    /// Whether the call uses full rate voice rather than half rate.
    pub fn full_rate(&self) -> Option<bool> {
        if self.kind().has_rate() { Some(self.0[2] & 1 == 1) } else { None }
    }
}

/// Collects the SACCH fragments of a superframe into a message.
#[derive(Copy, Clone, Debug, Default)]
pub struct SacchAssembler {
    buf: [u8; MESSAGE_BYTES],
    /// Bitmap of received fragments.
    seen: u8,
}

impl SacchAssembler {
    pub fn new() -> SacchAssembler { SacchAssembler::default() }

    /// Add the fragment at the given index, returning the message once every fragment
    /// has been seen.
    pub fn feed(&mut self, idx: usize, fragment: u32) -> Option<Message> {
        assert!(idx < FRAGMENTS);

        if idx == 0 {
            *self = SacchAssembler::default();
        }

        self.buf.set_bits_at(idx * FRAGMENT_BITS, FRAGMENT_BITS, fragment as u64);
        self.seen |= 1 << idx;

        if self.seen != (1 << FRAGMENTS) - 1 {
            return None;
        }

        let msg = Message::new(self.buf);
        *self = SacchAssembler::default();

        Some(msg)
    }
}
