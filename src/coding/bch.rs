//! Encoding and decoding of the (63, 16, 23) BCH code protecting the P25 NID.
//!
//! Codewords are extended to 64 bits with a trailing parity bit, which the decoder
//! ignores.

use binfield_matrix::matrix_mul_systematic;

use crate::coding::bmcf;
use crate::coding::galois::{Gf64, SIZE};

/// Number of syndromes, 2t for t = 11.
const SYNDROMES: usize = 22;

/// Encode the given 16 data bits into a 64-bit codeword.
pub fn encode(word: u16) -> u64 {
    matrix_mul_systematic(word, GEN)
}

/// Try to decode the given 64-bit word to the nearest codeword, correcting up to 11
/// bit errors.
///
/// If decoding was successful, return `Some((data, err))`, where `data` is the 16 data
/// bits and `err` is the number of bits corrected. Otherwise, return `None` to indicate
/// an unrecoverable error.
pub fn decode(bits: u64) -> Option<(u16, usize)> {
    // The code only covers the first 63 bits.
    let word = bits >> 1;

    let errs = bmcf::errors(&syndromes(word), SIZE)?;

    // A binary code can only have unit error values.
    if errs.iter().any(|&(_, val)| val != Gf64::one()) {
        return None;
    }

    let fixed = errs.iter().fold(word, |w, &(loc, _)| w ^ 1 << loc);

    Some(((fixed >> 47) as u16, errs.len()))
}

/// Compute the syndromes s<sub>1</sub>, ..., s<sub>2t</sub> of the given received word,
/// where s<sub>i</sub> = r(α<sup>i</sup>) and the LSB of the word is the degree-0 term.
fn syndromes(word: u64) -> [Gf64; SYNDROMES] {
    let mut syn = [Gf64::zero(); SYNDROMES];

    for (i, s) in syn.iter_mut().enumerate() {
        let p = i + 1;

        *s = (0..SIZE).filter(|b| word >> b & 1 == 1).fold(Gf64::zero(), |acc, b| {
            acc + Gf64::for_power(b * p)
        });
    }

    syn
}

/// Generator matrix, transformed so each row produces one parity bit.
const GEN: &[u16] = &[
    0b1110110001000111,
    0b1001101001100100,
    0b0100110100110010,
    0b0010011010011001,
    0b1111111100001011,
    0b1001001111000010,
    0b0100100111100001,
    0b1100100010110111,
    0b1000100000011100,
    0b0100010000001110,
    0b0010001000000111,
    0b1111110101000100,
    0b0111111010100010,
    0b0011111101010001,
    0b1111001111101111,
    0b1001010110110000,
    0b0100101011011000,
    0b0010010101101100,
    0b0001001010110110,
    0b0000100101011011,
    0b1110100011101010,
    0b0111010001110101,
    0b1101011001111101,
    0b1000011101111001,
    0b1010111111111011,
    0b1011101110111010,
    0b0101110111011101,
    0b1100001010101001,
    0b1000110100010011,
    0b1010101011001110,
    0b0101010101100111,
    0b1100011011110100,
    0b0110001101111010,
    0b0011000110111101,
    0b1111010010011001,
    0b1001011000001011,
    0b1010011101000010,
    0b0101001110100001,
    0b1100010110010111,
    0b1000111010001100,
    0b0100011101000110,
    0b0010001110100011,
    0b1111110110010110,
    0b0111111011001011,
    0b1101001100100010,
    0b0110100110010001,
    0b1101100010001111,
    0b0000000000000011,
];
