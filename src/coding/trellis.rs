//! Encoding and decoding of the "trellis" convolutional codes used by P25.
//!
//! Encoding is done with a state machine where each fed-in symbol becomes the next
//! state. The half-rate code is decoded one codeword at a time, choosing the closest
//! transition out of the current state and failing outright when two transitions are
//! equally close. The 3/4-rate code has too little distance between transitions for that,
//! so it's decoded with the Viterbi algorithm over a whole block.

use crate::bits::{Dibit, Tribit};
use crate::error::{DecodeError, Result};

/// Half-rate convolutional ("trellis") code state machine.
pub type DibitFSM = TrellisFSM<DibitStates>;

/// 3/4-rate convolutional ("trellis") code state machine.
pub type TribitFSM = TrellisFSM<TribitStates>;

/// Half-rate convolutional ("trellis") code decoder.
pub type DibitDecoder = TrellisDecoder<DibitStates>;

pub trait States {
    /// Symbol type to use for states and input.
    type Symbol: Copy;

    /// Number of rows/columns in the state machine.
    fn size() -> usize;

    /// Get the "constellation point" on the transition from the current state to the
    /// next state.
    fn pair_idx(cur: usize, next: usize) -> usize;

    /// Convert the given symbol to a state.
    fn state(input: Self::Symbol) -> usize;
    /// Convert the given state to a symbol.
    fn symbol(state: usize) -> Self::Symbol;

    /// Get the "flushing" symbol fed in at the end of a stream.
    fn finisher() -> Self::Symbol;

    /// Get the dibit pair on the transition from the current state to the next state.
    fn pair(state: usize, next: usize) -> (Dibit, Dibit) {
        const PAIRS: [(u8, u8); 16] = [
            (0b00, 0b10),
            (0b10, 0b10),
            (0b01, 0b11),
            (0b11, 0b11),
            (0b11, 0b10),
            (0b01, 0b10),
            (0b10, 0b11),
            (0b00, 0b11),
            (0b11, 0b01),
            (0b01, 0b01),
            (0b10, 0b00),
            (0b00, 0b00),
            (0b00, 0b01),
            (0b10, 0b01),
            (0b01, 0b00),
            (0b11, 0b00),
        ];

        let (hi, lo) = PAIRS[Self::pair_idx(state, next)];
        (Dibit::new(hi), Dibit::new(lo))
    }

    /// Number of bits differing between the received dibit pair and the one on the given
    /// transition.
    fn distance(state: usize, next: usize, input: (Dibit, Dibit)) -> usize {
        let (hi, lo) = Self::pair(state, next);
        let expected = hi.bits() << 2 | lo.bits();
        let received = input.0.bits() << 2 | input.1.bits();

        (expected ^ received).count_ones() as usize
    }
}

/// Half-rate state machine (dibit input).
pub struct DibitStates;

impl States for DibitStates {
    type Symbol = Dibit;

    fn size() -> usize { 4 }

    fn pair_idx(cur: usize, next: usize) -> usize {
        const STATES: [[usize; 4]; 4] = [
            [0, 15, 12, 3],
            [4, 11, 8, 7],
            [13, 2, 1, 14],
            [9, 6, 5, 10],
        ];

        STATES[cur][next]
    }

    fn state(input: Dibit) -> usize { input.bits() as usize }
    fn finisher() -> Self::Symbol { Dibit::new(0b00) }
    fn symbol(state: usize) -> Self::Symbol { Dibit::new(state as u8) }
}

/// 3/4-rate state machine (tribit input).
pub struct TribitStates;

impl States for TribitStates {
    type Symbol = Tribit;

    fn size() -> usize { 8 }

    fn pair_idx(cur: usize, next: usize) -> usize {
        const STATES: [[usize; 8]; 8] = [
            [0,  8, 4, 12, 2, 10, 6, 14],
            [4, 12, 2, 10, 6, 14, 0,  8],
            [1,  9, 5, 13, 3, 11, 7, 15],
            [5, 13, 3, 11, 7, 15, 1,  9],
            [3, 11, 7, 15, 1,  9, 5, 13],
            [7, 15, 1,  9, 5, 13, 3, 11],
            [2, 10, 6, 14, 0,  8, 4, 12],
            [6, 14, 0,  8, 4, 12, 2, 10],
        ];

        STATES[cur][next]
    }

    fn state(input: Tribit) -> usize { input.bits() as usize }
    fn finisher() -> Self::Symbol { Tribit::new(0b000) }
    fn symbol(state: usize) -> Self::Symbol { Tribit::new(state as u8) }
}

/// Convolutional code finite state machine with the given transition table. Each fed-in
/// symbol is used as the next state.
pub struct TrellisFSM<S: States> {
    states: std::marker::PhantomData<S>,
    /// Current state.
    state: usize,
}

impl<S: States> TrellisFSM<S> {
    /// Construct a new `TrellisFSM` at the initial state.
    pub fn new() -> TrellisFSM<S> {
        TrellisFSM {
            states: std::marker::PhantomData,
            state: 0,
        }
    }

    /// Apply the given symbol to the state machine and return the dibit pair on the
    /// transition.
    pub fn feed(&mut self, input: S::Symbol) -> (Dibit, Dibit) {
        let next = S::state(input);
        let pair = S::pair(self.state, next);

        self.state = next;

        pair
    }

    /// Flush the state machine with the finishing symbol and return the final transition.
    pub fn finish(&mut self) -> (Dibit, Dibit) {
        self.feed(S::finisher())
    }
}

/// Decodes one received codeword at a time by taking the nearest transition out of the
/// current state.
pub struct TrellisDecoder<S: States> {
    states: std::marker::PhantomData<S>,
    /// Current state.
    state: usize,
}

impl<S: States> TrellisDecoder<S> {
    /// Construct a new `TrellisDecoder` at the initial state.
    pub fn new() -> TrellisDecoder<S> {
        TrellisDecoder {
            states: std::marker::PhantomData,
            state: 0,
        }
    }

    /// Decode the given received dibit pair.
    ///
    /// On success, return the decoded symbol and the number of bits that differed from
    /// the chosen transition. Fail if no single transition is nearest.
    pub fn feed(&mut self, input: (Dibit, Dibit)) -> Result<(S::Symbol, usize)> {
        let (best, dist, ties) = (0..S::size()).fold((0, std::usize::MAX, 0), |acc, next| {
            let (best, min, ties) = acc;
            let d = S::distance(self.state, next, input);

            if d < min {
                (next, d, 1)
            } else if d == min {
                (best, min, ties + 1)
            } else {
                acc
            }
        });

        if ties > 1 {
            return Err(DecodeError::TrellisAmbiguous);
        }

        self.state = best;

        Ok((S::symbol(best), dist))
    }
}

/// Decode the given stream of dibits, taken two per codeword, into the given symbol
/// buffer with a fresh `TrellisDecoder`, returning the total number of corrected bits.
pub fn decode_dibits<S: States>(dibits: &[Dibit], out: &mut [S::Symbol]) -> Result<usize> {
    assert!(dibits.len() % 2 == 0);
    assert!(out.len() >= dibits.len() / 2);

    let mut dec = TrellisDecoder::<S>::new();

    dibits.chunks(2).zip(out.iter_mut()).fold(Ok(0), |fixed, (pair, o)| {
        let fixed = fixed?;
        let (sym, err) = dec.feed((pair[0], pair[1]))?;

        *o = sym;

        Ok(fixed + err)
    })
}

/// Decode the given stream of dibits, two per codeword, with the Viterbi algorithm,
/// assuming the stream starts and ends (after flushing) in state 0.
///
/// Return the decoded symbols, including the final flushing symbol, along with the
/// total bit distance of the chosen path. Among equally close paths, the one through the
/// lowest-numbered states wins.
pub fn viterbi<S: States>(dibits: &[Dibit]) -> (Vec<S::Symbol>, usize) {
    assert!(dibits.len() % 2 == 0);

    let size = S::size();
    let mut metrics = vec![std::usize::MAX; size];
    let mut survivors: Vec<Vec<usize>> = Vec::with_capacity(dibits.len() / 2);

    metrics[0] = 0;

    for pair in dibits.chunks(2) {
        let mut next_metrics = vec![std::usize::MAX; size];
        let mut prev = vec![0; size];

        for next in 0..size {
            for state in 0..size {
                if metrics[state] == std::usize::MAX {
                    continue;
                }

                let m = metrics[state] + S::distance(state, next, (pair[0], pair[1]));

                if m < next_metrics[next] {
                    next_metrics[next] = m;
                    prev[next] = state;
                }
            }
        }

        survivors.push(prev);
        metrics = next_metrics;
    }

    let mut symbols = Vec::with_capacity(survivors.len());
    let mut state = 0;

    for prev in survivors.iter().rev() {
        symbols.push(S::symbol(state));
        state = prev[state];
    }

    symbols.reverse();

    (symbols, metrics[0])
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bits::{Dibit, Tribit};

    fn encode_dibits(data: &[Dibit]) -> Vec<Dibit> {
        let mut fsm = DibitFSM::new();
        let mut out = vec![];

        for &d in data.iter() {
            let (hi, lo) = fsm.feed(d);
            out.push(hi);
            out.push(lo);
        }

        let (hi, lo) = fsm.finish();
        out.push(hi);
        out.push(lo);

        out
    }

    #[test]
    fn test_dibit_code() {
        let mut fsm = DibitFSM::new();
        assert_eq!(fsm.feed(Dibit::new(0b00)), (Dibit::new(0b00), Dibit::new(0b10)));
        assert_eq!(fsm.feed(Dibit::new(0b00)), (Dibit::new(0b00), Dibit::new(0b10)));
        assert_eq!(fsm.feed(Dibit::new(0b01)), (Dibit::new(0b11), Dibit::new(0b00)));
        assert_eq!(fsm.feed(Dibit::new(0b01)), (Dibit::new(0b00), Dibit::new(0b00)));
        assert_eq!(fsm.feed(Dibit::new(0b10)), (Dibit::new(0b11), Dibit::new(0b01)));
        assert_eq!(fsm.feed(Dibit::new(0b10)), (Dibit::new(0b10), Dibit::new(0b10)));
        assert_eq!(fsm.feed(Dibit::new(0b11)), (Dibit::new(0b01), Dibit::new(0b00)));
        assert_eq!(fsm.finish(), (Dibit::new(0b01), Dibit::new(0b01)));
    }

    #[test]
    fn test_dibit_decoder() {
        let data = (0..48).map(|i| Dibit::new(i as u8 * 3 % 4)).collect::<Vec<Dibit>>();
        let stream = encode_dibits(&data);
        assert_eq!(stream.len(), 98);

        let mut out = [Dibit::default(); 49];
        assert_eq!(decode_dibits::<DibitStates>(&stream, &mut out), Ok(0));
        assert_eq!(&out[..48], &data[..]);
        assert_eq!(out[48], Dibit::new(0));
    }

    #[test]
    fn test_dibit_error() {
        let stream = encode_dibits(&[Dibit::default(); 48]);
        assert_eq!(stream[0], Dibit::new(0b00));
        assert_eq!(stream[1], Dibit::new(0b10));

        // A flipped high bit in the first codeword has a single nearest transition.
        let mut fixed = stream.clone();
        fixed[0] = Dibit::new(0b10);

        let mut out = [Dibit::new(0b11); 49];
        assert_eq!(decode_dibits::<DibitStates>(&fixed, &mut out), Ok(1));
        assert!(out.iter().all(|&d| d == Dibit::new(0)));

        // A flipped low bit in the last codeword is equally close to two transitions.
        let mut tied = stream.clone();
        tied[97] = Dibit::new(0b11);

        assert_eq!(decode_dibits::<DibitStates>(&tied, &mut out),
            Err(DecodeError::TrellisAmbiguous));
    }

    #[test]
    fn test_tribit_viterbi() {
        let data = [1, 2, 3, 4, 5, 6, 7, 0, 3, 5];
        let mut fsm = TribitFSM::new();
        let mut stream = vec![];

        for &t in data.iter() {
            let (hi, lo) = fsm.feed(Tribit::new(t));
            stream.push(hi);
            stream.push(lo);
        }

        let (hi, lo) = fsm.finish();
        stream.push(hi);
        stream.push(lo);

        assert_eq!(&stream[..4], &[
            Dibit::new(0b11), Dibit::new(0b01), Dibit::new(0b01), Dibit::new(0b11),
        ]);

        let expected = data.iter().cloned().chain(Some(0))
            .map(Tribit::new)
            .collect::<Vec<Tribit>>();

        assert_eq!(viterbi::<TribitStates>(&stream), (expected.clone(), 0));

        // Every single bit error is corrected.
        for i in 0..stream.len() {
            for bit in 0..2 {
                let mut s = stream.clone();
                s[i] = Dibit::new(s[i].bits() ^ 1 << bit);

                assert_eq!(viterbi::<TribitStates>(&s), (expected.clone(), 1));
            }
        }

        // Errors spread far apart are corrected too.
        let mut s = stream.clone();
        s[2] = Dibit::new(s[2].bits() ^ 0b10);
        s[16] = Dibit::new(s[16].bits() ^ 0b01);
        assert_eq!(viterbi::<TribitStates>(&s), (expected, 2));
    }
}
