//! Syndrome-table decoding shared by the binary systematic block codes.
//!
//! Each codeword is held in the low `n` bits of a `u32`, with the first transmitted bit
//! in the MSB position. The `k` data bits come first, followed by the `n - k` parity
//! bits, so the generator is described by one row per parity bit, each row masking the
//! data bits that feed into it.

use binfield_matrix::{matrix_mul, matrix_mul_systematic};

/// A binary systematic block code along with its precomputed syndrome table.
pub struct BlockCode {
    /// Total bits per codeword.
    n: usize,
    /// Data bits per codeword.
    k: usize,
    /// Parity generator rows, one per parity bit.
    gen: &'static [u32],
    /// Maps each syndrome to the bit errors that produce it, or 0 if the syndrome isn't
    /// correctable.
    fixes: Vec<u32>,
}

impl BlockCode {
    /// Construct the code and its syndrome table, correcting up to `t` bit errors.
    pub fn new(n: usize, k: usize, t: usize, gen: &'static [u32]) -> BlockCode {
        assert!(n <= 32 && k < n);
        assert_eq!(gen.len(), n - k);

        let mut code = BlockCode {
            n,
            k,
            gen,
            fixes: vec![0; 1 << (n - k)],
        };

        // Lighter patterns are visited first and keep their slot on collision.
        for weight in 1..=t {
            code.fill(weight, 0, 0);
        }

        code
    }

    /// Record every error pattern of the given remaining weight with bits at or above
    /// position `start`, combined with the already chosen `pattern`.
    fn fill(&mut self, weight: usize, start: usize, pattern: u32) {
        if weight == 0 {
            let s = self.syndrome(pattern);

            if s != 0 && self.fixes[s] == 0 {
                self.fixes[s] = pattern;
            }

            return;
        }

        for pos in start..self.n {
            self.fill(weight - 1, pos + 1, pattern | 1 << pos);
        }
    }

    /// Number of parity bits.
    fn parity_bits(&self) -> usize { self.n - self.k }

    /// Compute the syndrome of the given word, which is zero for every codeword.
    pub fn syndrome(&self, word: u32) -> usize {
        let parity = word & ((1 << self.parity_bits()) - 1);
        let expected: u32 = matrix_mul(word >> self.parity_bits(), self.gen);

        (expected ^ parity) as usize
    }

    /// Encode the given data bits into a codeword.
    pub fn encode(&self, data: u32) -> u32 {
        assert!(data >> self.k == 0);
        matrix_mul_systematic(data, self.gen)
    }

    /// Try to decode the given word to the nearest codeword.
    ///
    /// If decoding was successful, return `Some((data, err))`, where `data` is the data
    /// bits and `err` is the number of corrected bits. Otherwise, return `None` to
    /// indicate an unrecoverable error.
    pub fn decode(&self, word: u32) -> Option<(u32, usize)> {
        assert!(word >> self.n == 0);

        let fixed = self.fix(word)?;
        Some((fixed >> self.parity_bits(), (fixed ^ word).count_ones() as usize))
    }

    /// Correct the given codeword in place, returning whether it was correctable.
    ///
    /// The word is left untouched when it isn't correctable.
    pub fn correct(&self, word: &mut u32) -> bool {
        match self.fix(*word) {
            Some(fixed) => {
                *word = fixed;
                true
            },
            None => false,
        }
    }

    fn fix(&self, word: u32) -> Option<u32> {
        match self.syndrome(word) {
            0 => Some(word),
            s => match self.fixes[s] {
                0 => None,
                pattern => Some(word ^ pattern),
            },
        }
    }
}

/// Define a module exposing `encode`, `decode`, and `correct` for a block code built
/// from the given parameters and generator rows.
macro_rules! block_code {
    ($(#[$meta:meta])* $name:ident, ($n:expr, $k:expr, $t:expr), $gen:expr) => {
        $(#[$meta])*
        pub mod $name {
            use crate::coding::syndrome::BlockCode;

            /// Total bits per codeword.
            pub const BITS: usize = $n;
            /// Data bits per codeword.
            pub const DATA_BITS: usize = $k;
            /// Maximum number of correctable bit errors.
            pub const MAX_ERRORS: usize = $t;

            /// Parity generator rows over the data bits.
            const GEN: &[u32] = &$gen;

            lazy_static! {
                static ref CODE: BlockCode = BlockCode::new($n, $k, $t, GEN);
            }

            /// Encode the given data bits into a codeword.
            pub fn encode(data: u32) -> u32 { CODE.encode(data) }

            /// Try to decode the given word, returning `Some((data, err))` on success.
            pub fn decode(word: u32) -> Option<(u32, usize)> { CODE.decode(word) }

            /// Correct the given codeword in place, returning whether it was correctable.
            pub fn correct(word: &mut u32) -> bool { CODE.correct(word) }
        }
    };
}
