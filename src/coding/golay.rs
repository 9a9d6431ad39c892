//! Encoding and decoding of the Golay family of codes.
//!
//! This covers the (23, 12, 7) standard code, the (24, 12, 8) extended code (also known
//! as the 24/12/8 code), the (20, 8, 8) code used in the DMR slot type, and the (18, 6,
//! 8) shortened code used in P25 headers. All of them correct up to 3 errors.

block_code!(
    /// Encoding and decoding of the (20, 8, 8) code.
    g20_8, (20, 8, 3), [
        0b01001111,
        0b01101000,
        0b10110100,
        0b11011010,
        0b11101101,
        0b10111001,
        0b00010011,
        0b11000110,
        0b11100011,
        0b00111110,
        0b10011111,
        0b01110101,
    ]
);

block_code!(
    /// Encoding and decoding of the (23, 12, 7) code.
    g23_12, (23, 12, 3), [
        0b101001001111,
        0b111101101000,
        0b011110110100,
        0b001111011010,
        0b000111101101,
        0b101010111001,
        0b111100010011,
        0b110111000110,
        0b011011100011,
        0b100100111110,
        0b010010011111,
    ]
);

block_code!(
    /// Encoding and decoding of the (24, 12, 8) code, which extends the (23, 12, 7)
    /// code with an overall parity bit.
    g24_12, (24, 12, 3), [
        0b101001001111,
        0b111101101000,
        0b011110110100,
        0b001111011010,
        0b000111101101,
        0b101010111001,
        0b111100010011,
        0b110111000110,
        0b011011100011,
        0b100100111110,
        0b010010011111,
        0b110001110101,
    ]
);

pub use self::g24_12 as g24_12_8;

/// Encoding and decoding of the (18, 6, 8) code, shortened from the (24, 12, 8) code by
/// fixing the 6 leading data bits to zero.
pub mod g18_6 {
    use super::g24_12;

    /// Encode the given 6 data bits to an 18-bit codeword.
    pub fn encode(data: u32) -> u32 {
        assert_eq!(data >> 6, 0);
        g24_12::encode(data)
    }

    /// Try to decode the given 18-bit word to the nearest codeword, correcting up to 3
    /// errors.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the 6
    /// data bits and `err` is the number of corrected bits. Otherwise, return `None` to
    /// indicate an unrecoverable error.
    pub fn decode(word: u32) -> Option<(u32, usize)> {
        assert_eq!(word >> 18, 0);

        g24_12::decode(word).and_then(|(data, err)| if data >> 6 == 0 {
            Some((data, err))
        } else {
            None
        })
    }
}
