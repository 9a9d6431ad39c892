//! Encoding and decoding of the rate-1/2, K=5 convolutional code used by NXDN and the
//! YSF FICH.
//!
//! Received bits are fed in as soft symbols, 0 for a received 0, 2 for a received 1, and 1
//! for an erased (punctured) bit.

use crate::bits::BitSlice;
use crate::error::{DecodeError, Result};

/// Maximum number of decode steps per frame.
pub const CAPACITY: usize = 300;

/// Number of memory bits in the encoder, which delays the decoded stream by as many
/// steps.
pub const TAIL_BITS: usize = 4;

const STATES: usize = 16;
const HALF_STATES: usize = STATES / 2;
const M: u16 = 4;

const BRANCH_TABLE1: [u16; HALF_STATES] = [0, 0, 0, 0, 2, 2, 2, 2];
const BRANCH_TABLE2: [u16; HALF_STATES] = [0, 2, 2, 0, 0, 2, 2, 0];

/// Viterbi decoder over the 16-state trellis, keeping one packed decision word per step.
pub struct Convolution {
    /// Path metrics for the previous and current step.
    metrics: [[u16; STATES]; 2],
    /// Index into `metrics` of the previous step.
    old: usize,
    /// One decision bit per state for each step.
    decisions: Vec<u64>,
}

impl Convolution {
    /// Construct a new `Convolution` ready for decoding.
    pub fn new() -> Convolution {
        Convolution {
            metrics: [[0; STATES]; 2],
            old: 0,
            decisions: Vec::with_capacity(CAPACITY),
        }
    }

    /// Reset the decoder for a new frame.
    pub fn start(&mut self) {
        self.metrics = [[0; STATES]; 2];
        self.old = 0;
        self.decisions.clear();
    }

    /// Number of steps decoded since the last reset.
    pub fn steps(&self) -> usize { self.decisions.len() }

    /// Run one add-compare-select step with the given pair of received symbols.
    pub fn decode(&mut self, s0: u8, s1: u8) -> Result<()> {
        if self.decisions.len() == CAPACITY {
            return Err(DecodeError::ViterbiCapacity(CAPACITY));
        }

        let (s0, s1) = (s0 as i16, s1 as i16);
        let old = self.metrics[self.old];
        let mut new = [0; STATES];
        let mut word = 0u64;

        for i in 0..HALF_STATES {
            let j = i * 2;

            let metric = ((BRANCH_TABLE1[i] as i16 - s0).abs() +
                          (BRANCH_TABLE2[i] as i16 - s1).abs()) as u16;

            let m0 = old[i].wrapping_add(metric);
            let m1 = old[i + HALF_STATES].wrapping_add(M - metric);
            let dec0 = m0 >= m1;
            new[j] = if dec0 { m1 } else { m0 };

            let m0 = old[i].wrapping_add(M - metric);
            let m1 = old[i + HALF_STATES].wrapping_add(metric);
            let dec1 = m0 >= m1;
            new[j + 1] = if dec1 { m1 } else { m0 };

            word |= (dec1 as u64) << (j + 1) | (dec0 as u64) << j;
        }

        self.decisions.push(word);
        self.old ^= 1;
        self.metrics[self.old] = new;

        Ok(())
    }

    /// Trace the decisions back from the final all-zero state and write the most likely
    /// `bits` input bits MSB-first into `out`.
    ///
    /// Since the decoded stream lags by `TAIL_BITS` steps, `bits` is normally the number
    /// of steps minus the tail.
    pub fn chainback(&self, out: &mut [u8], bits: usize) -> Result<()> {
        if bits > self.decisions.len() || bits > out.len() * 8 {
            return Err(DecodeError::FrameOverflow(bits));
        }

        let mut state = 0u32;

        for (n, &word) in self.decisions.iter().rev().take(bits).enumerate() {
            let i = state >> 4;
            let bit = (word >> i & 1) as u32;

            state = bit << 7 | state >> 1;
            out.set_bit(bits - 1 - n, bit == 1);
        }

        Ok(())
    }
}

/// Run a fresh decode over the given received bits, where `None` marks a punctured bit,
/// and write the first `bits` decoded bits into `out`.
pub fn decode_stream<I>(conv: &mut Convolution, coded: I, out: &mut [u8], bits: usize)
    -> Result<()>
    where I: IntoIterator<Item = Option<bool>>
{
    let soft = |b: Option<bool>| match b {
        Some(true) => 2,
        Some(false) => 0,
        None => 1,
    };

    conv.start();

    let mut coded = coded.into_iter();

    while let Some(s0) = coded.next() {
        let s1 = coded.next().ok_or(DecodeError::FrameOverflow(conv.steps() * 2 + 1))?;
        conv.decode(soft(s0), soft(s1))?;
    }

    conv.chainback(out, bits)
}

/// Encode the first `bits` bits of `input` into `out` at two output bits per input bit.
///
/// The caller appends `TAIL_BITS` zero bits to flush the encoder.
pub fn encode(input: &[u8], out: &mut [u8], bits: usize) {
    assert!(out.len() * 8 >= bits * 2);

    let mut reg = [0u8; 4];

    for i in 0..bits {
        let d = input.bit(i) as u8;

        let g1 = (d + reg[2] + reg[3]) & 1;
        let g2 = (d + reg[0] + reg[1] + reg[3]) & 1;

        reg = [d, reg[0], reg[1], reg[2]];

        out.set_bit(i * 2, g1 == 1);
        out.set_bit(i * 2 + 1, g2 == 1);
    }
}
