//! Convolutionally coded NXDN channels: the slow associated control channel (SACCH) and
//! the fast associated control channel (FACCH1).
//!
//! Both are coded with the rate-1/2, K=5 code, punctured, and block interleaved. Each
//! dibit carries two coded bits.

use crate::bits::{BitSlice, Dibit};
use crate::coding::convolution::{self, Convolution, TAIL_BITS};
use crate::coding::crc::{CRC12, CRC6};
use crate::coding::interleave::Block;
use crate::error::Result;

/// Number of dibits in the SACCH.
pub const SACCH_DIBITS: usize = 30;

/// Number of dibits in a FACCH1.
pub const FACCH1_DIBITS: usize = 72;

/// Number of bytes in a FACCH1 message.
pub const FACCH1_BYTES: usize = 10;

/// Largest coded channel, in bytes.
const MAX_CODED_BYTES: usize = 24;

/// Positions of the coded stream that aren't transmitted.
struct Puncture {
    period: usize,
    pos: usize,
}

impl Puncture {
    fn erased(&self, j: usize) -> bool { j % self.period == self.pos }
}

/// Coding parameters of a channel.
struct ChannelCode {
    interleave: Block,
    puncture: Puncture,
    /// Number of data bits, including the CRC.
    data_bits: usize,
}

static SACCH: ChannelCode = ChannelCode {
    interleave: Block::new(12, 5),
    puncture: Puncture { period: 6, pos: 5 },
    data_bits: 32,
};

static FACCH1: ChannelCode = ChannelCode {
    interleave: Block::new(16, 9),
    puncture: Puncture { period: 4, pos: 1 },
    data_bits: 92,
};

impl ChannelCode {
    /// Number of coded bits before puncturing.
    fn coded_bits(&self) -> usize { (self.data_bits + TAIL_BITS) * 2 }

    /// Decode the given received bits into `out`, returning the number of received bits
    /// that differed from the decoded codeword.
    fn decode(&self, conv: &mut Convolution, rx: &[u8], out: &mut [u8]) -> Result<usize> {
        let mut punct = [0; MAX_CODED_BYTES];
        self.interleave.deinterleave(rx, &mut punct);

        let mut next = 0;

        let coded = (0..self.coded_bits()).map(|j| if self.puncture.erased(j) {
            None
        } else {
            next += 1;
            Some(punct[..].bit(next - 1))
        });

        convolution::decode_stream(conv, coded, out, self.data_bits)?;

        let mut check = [0; MAX_CODED_BYTES];
        self.encode_punctured(out, &mut check);

        Ok((0..self.interleave.len()).filter(|&k| check[..].bit(k) != punct[..].bit(k)).count())
    }

    /// Encode and puncture the given data bits, without interleaving.
    fn encode_punctured(&self, data: &[u8], out: &mut [u8]) {
        let mut input = [0; MAX_CODED_BYTES / 2];

        for i in 0..self.data_bits {
            input.set_bit(i, data.bit(i));
        }

        let mut full = [0; MAX_CODED_BYTES];
        convolution::encode(&input, &mut full, self.data_bits + TAIL_BITS);

        let kept = (0..self.coded_bits()).filter(|&j| !self.puncture.erased(j));

        for (k, j) in kept.enumerate() {
            out.set_bit(k, full[..].bit(j));
        }
    }

    /// Encode the given data bits into transmitted dibits.
    fn encode(&self, data: &[u8]) -> Vec<Dibit> {
        let mut punct = [0; MAX_CODED_BYTES];
        self.encode_punctured(data, &mut punct);

        let mut tx = [0; MAX_CODED_BYTES];
        self.interleave.interleave(&punct, &mut tx);

        (0..self.interleave.len() / 2).map(|i| {
            Dibit::new((tx[..].bit(i * 2) as u8) << 1 | tx[..].bit(i * 2 + 1) as u8)
        }).collect()
    }
}

/// A decoded SACCH.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Sacch {
    buf: [u8; 4],
    crc_valid: bool,
}

impl Sacch {
    fn new(buf: [u8; 4]) -> Sacch {
        let crc = CRC6::new().feed_bits(buf[..].bits_at(0, 26), 26).finish();

        Sacch {
            buf,
            crc_valid: crc as u64 == buf[..].bits_at(26, 6),
        }
    }

    /// Position of the fragment within the superframe, where 3 is the first.
    pub fn structure(&self) -> u8 { self.buf[0] >> 6 }

    /// Index of the fragment within the superframe message.
    pub fn index(&self) -> usize { 3 - self.structure() as usize }

    /// Radio access number.
    pub fn ran(&self) -> u8 { self.buf[0] & 0x3F }

    /// Fragment of the superframe message.
    pub fn fragment(&self) -> u32 { self.buf[..].bits_at(8, 18) as u32 }

    pub fn crc_valid(&self) -> bool { self.crc_valid }
}

/// A decoded FACCH1.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Facch1 {
    buf: [u8; 12],
    crc_valid: bool,
}

impl Facch1 {
    fn new(buf: [u8; 12]) -> Facch1 {
        let crc = CRC12::new().feed_bytes(buf[..FACCH1_BYTES].iter().cloned()).finish();

        Facch1 {
            buf,
            crc_valid: crc as u64 == buf[..].bits_at(80, 12),
        }
    }

    /// Message bytes.
    pub fn message(&self) -> [u8; FACCH1_BYTES] {
        let mut msg = [0; FACCH1_BYTES];
        msg.copy_from_slice(&self.buf[..FACCH1_BYTES]);
        msg
    }

    pub fn crc_valid(&self) -> bool { self.crc_valid }
}

/// Decode the given received SACCH bits, returning the SACCH and the number of
/// corrected bits.
pub fn decode_sacch(conv: &mut Convolution, rx: &[u8]) -> Result<(Sacch, usize)> {
    let mut buf = [0; 4];
    let fixed = SACCH.decode(conv, rx, &mut buf)?;

    Ok((Sacch::new(buf), fixed))
}

/// Decode the given received FACCH1 bits, returning the FACCH1 and the number of
/// corrected bits.
pub fn decode_facch1(conv: &mut Convolution, rx: &[u8]) -> Result<(Facch1, usize)> {
    let mut buf = [0; 12];
    let fixed = FACCH1.decode(conv, rx, &mut buf)?;

    Ok((Facch1::new(buf), fixed))
}

/// Encode a SACCH with the given fields.
pub fn encode_sacch(structure: u8, ran: u8, fragment: u32) -> Vec<Dibit> {
    let mut buf = [0; 4];

    buf.set_bits_at(0, 2, structure as u64);
    buf.set_bits_at(2, 6, ran as u64);
    buf.set_bits_at(8, 18, fragment as u64);

    let crc = CRC6::new().feed_bits(buf[..].bits_at(0, 26), 26).finish();
    buf.set_bits_at(26, 6, crc as u64);

    SACCH.encode(&buf)
}

/// Encode a FACCH1 carrying the given message.
pub fn encode_facch1(msg: &[u8; FACCH1_BYTES]) -> Vec<Dibit> {
    let mut buf = [0; 12];
    buf[..FACCH1_BYTES].copy_from_slice(msg);

    let crc = CRC12::new().feed_bytes(msg.iter().cloned()).finish();
    buf.set_bits_at(80, 12, crc as u64);

    FACCH1.encode(&buf)
}
