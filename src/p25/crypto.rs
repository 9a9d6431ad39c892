//! Encryption sync words of LDU2 frames, which set the crypto fields of the session and
//! decide whether voice frames are muted.

use crate::bits::BitSlice;

/// ALGID sent by unencrypted calls.
pub const UNENCRYPTED: u8 = 0x80;

/// Number of bytes in an encryption sync word.
pub const ENCRYPTION_SYNC_BYTES: usize = 9;

/// Corrected ES word: ALGID, key ID, then the leading bytes of the message indicator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EncryptionSync([u8; ENCRYPTION_SYNC_BYTES]);

impl EncryptionSync {
    pub fn new(buf: [u8; ENCRYPTION_SYNC_BYTES]) -> Self { EncryptionSync(buf) }

    /// ALGID byte, kept in the session even when no `CryptoAlgorithm` matches.
    pub fn algid(&self) -> u8 { self.0[0] }

    pub fn crypto_alg(&self) -> Option<CryptoAlgorithm> {
        CryptoAlgorithm::from_bits(self.0[0])
    }

    /// Key ID.
    pub fn crypto_key(&self) -> u16 { self.0[..].bits_at(8, 16) as u16 }

    /// The 48 message indicator bits that fit in the word.
    pub fn crypto_init(&self) -> &[u8] { &self.0[3..] }

    /// Any ALGID other than the clear one counts as encrypted, including unknown ones.
    pub fn encrypted(&self) -> bool { self.0[0] != UNENCRYPTED }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "ser", derive(Serialize))]
pub enum CryptoAlgorithm {
    Accordion,
    BatonEven,
    Firefly,
    Mayfly,
    Saville,
    BatonOdd,
    Unencrypted,
    DES,
    TripleDES,
    AES,
}

impl CryptoAlgorithm {
    /// Short name for logs.
    pub fn label(self) -> &'static str {
        use self::CryptoAlgorithm::*;

        match self {
            Accordion => "ACCORDION",
            BatonEven | BatonOdd => "BATON",
            Firefly => "FIREFLY",
            Mayfly => "MAYFLY",
            Saville => "SAVILLE",
            Unencrypted => "CLEAR",
            DES => "DES",
            TripleDES => "3DES",
            AES => "AES",
        }
    }

    pub fn from_bits(bits: u8) -> Option<CryptoAlgorithm> {
        use self::CryptoAlgorithm::*;

        match bits {
            0x00 => Some(Accordion),
            0x01 => Some(BatonEven),
            0x02 => Some(Firefly),
            0x03 => Some(Mayfly),
            0x04 => Some(Saville),
            0x41 => Some(BatonOdd),
            0x80 => Some(Unencrypted),
            0x81 => Some(DES),
            0x83 => Some(TripleDES),
            0x84 => Some(AES),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use super::CryptoAlgorithm::*;

    #[test]
    fn test_crypto() {
        let c = EncryptionSync::new([
            0b10000100,
            0xDE, 0xAD,
            0, 0, 1, 0, 0, 2,
        ]);

        assert_eq!(c.algid(), 0x84);
        assert_eq!(c.crypto_alg(), Some(AES));
        assert_eq!(c.crypto_key(), 0xDEAD);
        assert_eq!(c.crypto_init(), &[0, 0, 1, 0, 0, 2]);
        assert!(c.encrypted());

        let c = EncryptionSync::new([0x80, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(c.crypto_alg(), Some(Unencrypted));
        assert!(!c.encrypted());

        assert_eq!(CryptoAlgorithm::from_bits(0x42), None);
        assert_eq!(AES.label(), "AES");
        assert_eq!(BatonOdd.label(), BatonEven.label());
    }
}
