//! Hard-decision Viterbi decoding of small rate-1/2 convolutional codes, used for the
//! D-Star radio header.

use crate::bits::BitSlice;

/// Rate-1/2 convolutional code with the given constraint length and two generator
/// polynomials.
///
/// Each generator masks the shift register, where the newest input bit sits in bit
/// K-1 and the oldest in bit 0.
pub struct ConvCode {
    /// Constraint length K.
    k: usize,
    /// Generator polynomials.
    gens: [u32; 2],
}

/// The K=3 code of the D-Star header, g<sub>1</sub> = 1+D+D<sup>2</sup> and
/// g<sub>2</sub> = 1+D<sup>2</sup>.
pub const DSTAR: ConvCode = ConvCode {
    k: 3,
    gens: [0b111, 0b101],
};

impl ConvCode {
    /// Number of trellis states.
    fn states(&self) -> usize { 1 << (self.k - 1) }

    /// Get the output bit pair and next state for the given input bit applied in the
    /// given state.
    fn transition(&self, state: usize, input: u32) -> (u8, usize) {
        let reg = input << (self.k - 1) | state as u32;

        let out = self.gens.iter().fold(0, |acc, &g| {
            acc << 1 | ((reg & g).count_ones() & 1) as u8
        });

        (out, (reg >> 1) as usize)
    }

    /// Encode the first `bits` bits of `input` into `out` at two output bits per input
    /// bit, starting from the zero state.
    pub fn encode(&self, input: &[u8], bits: usize, out: &mut [u8]) {
        assert!(out.len() * 8 >= bits * 2);

        (0..bits).fold(0, |state, i| {
            let (pair, next) = self.transition(state, input.bit(i) as u32);

            out.set_bit(i * 2, pair >> 1 == 1);
            out.set_bit(i * 2 + 1, pair & 1 == 1);

            next
        });
    }

    /// Decode `bits` input bits from the received stream, which holds two bits per input
    /// bit, writing them MSB-first to `out`.
    ///
    /// The stream must start in the zero state and be flushed back to it with K-1 zero
    /// bits, which are included in `bits`. Return the number of received bits that
    /// differed from the chosen path.
    pub fn decode(&self, input: &[u8], bits: usize, out: &mut [u8]) -> usize {
        assert!(input.len() * 8 >= bits * 2);
        assert!(out.len() * 8 >= bits);

        let states = self.states();
        let mut metrics = vec![std::usize::MAX; states];
        let mut history: Vec<Vec<(usize, u8)>> = Vec::with_capacity(bits);

        metrics[0] = 0;

        for i in 0..bits {
            let received = (input.bit(i * 2) as u8) << 1 | input.bit(i * 2 + 1) as u8;

            let mut next_metrics = vec![std::usize::MAX; states];
            let mut prev = vec![(0, 0); states];

            for state in 0..states {
                if metrics[state] == std::usize::MAX {
                    continue;
                }

                for bit in 0..2 {
                    let (pair, next) = self.transition(state, bit);
                    let m = metrics[state] + (pair ^ received).count_ones() as usize;

                    if m < next_metrics[next] {
                        next_metrics[next] = m;
                        prev[next] = (state, bit as u8);
                    }
                }
            }

            history.push(prev);
            metrics = next_metrics;
        }

        let mut state = 0;

        for (i, prev) in history.iter().enumerate().rev() {
            let (from, bit) = prev[state];
            out.set_bit(i, bit == 1);
            state = from;
        }

        metrics[0]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode() {
        // A single 1 followed by zeros gives the generator impulse responses.
        let mut out = [0; 1];
        DSTAR.encode(&[0b10000000], 4, &mut out);
        assert_eq!(out[0], 0b11_10_11_00);
    }

    #[test]
    fn test_decode() {
        let data = [0xC5, 0x3A, 0x0F, 0x00];
        // 26 data bits and 2 flush bits.
        let bits = 28;

        let mut enc = [0; 7];
        DSTAR.encode(&data, bits, &mut enc);

        let mut out = [0; 4];
        assert_eq!(DSTAR.decode(&enc, bits, &mut out), 0);
        assert_eq!(out, data);

        // Spread errors are corrected.
        enc[0] ^= 0b01000000;
        enc[3] ^= 0b00000100;
        enc[6] ^= 0b00100000;

        let mut out = [0; 4];
        assert_eq!(DSTAR.decode(&enc, bits, &mut out), 3);
        assert_eq!(out, data);
    }
}
