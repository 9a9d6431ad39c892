//! Running per-symbol statistics of the analog signal, which help a symbol slicer
//! resolve samples that fall between two symbol levels.
//!
//! Samples are gathered while an LDU is received and folded in once the whole frame has
//! arrived, so only samples from frames that decoded end to end contribute.

use crate::bits::Dibit;

/// Number of samples buffered per frame.
pub const FRAME_SAMPLES: usize = 400;

/// Number of samples remembered per symbol.
pub const HISTORY: usize = 200;

/// Number of samples every symbol needs before estimates are made.
pub const MIN_SAMPLES: usize = 10;

/// An analog sample along with the symbol it was sliced to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnalogSample {
    pub value: i32,
    pub dibit: Dibit,
}

/// Circular history of the samples of one symbol.
#[derive(Copy, Clone)]
struct SymbolHistory {
    values: [i32; HISTORY],
    /// Number of valid samples.
    len: usize,
    /// Index of the next sample to overwrite.
    pos: usize,
    sum: i64,
    sum_sq: i64,
}

impl SymbolHistory {
    fn new() -> SymbolHistory {
        SymbolHistory {
            values: [0; HISTORY],
            len: 0,
            pos: 0,
            sum: 0,
            sum_sq: 0,
        }
    }

    fn add(&mut self, value: i32) {
        if self.len == HISTORY {
            let old = self.values[self.pos] as i64;
            self.sum -= old;
            self.sum_sq -= old * old;
        } else {
            self.len += 1;
        }

        self.values[self.pos] = value;
        self.pos = (self.pos + 1) % HISTORY;

        let v = value as i64;
        self.sum += v;
        self.sum_sq += v * v;
    }

    fn mean(&self) -> f64 { self.sum as f64 / self.len as f64 }

    fn variance(&self) -> f64 {
        let mean = self.mean();
        (self.sum_sq as f64 / self.len as f64 - mean * mean).max(0.0)
    }
}

/// Statistics of the analog level of each symbol.
pub struct Heuristics {
    symbols: [SymbolHistory; 4],
}

impl Heuristics {
    pub fn new() -> Heuristics {
        Heuristics {
            symbols: [SymbolHistory::new(); 4],
        }
    }

    /// Fold the given samples into the statistics.
    pub fn contribute(&mut self, samples: &[AnalogSample]) {
        for s in samples {
            self.symbols[s.dibit.bits() as usize].add(s.value);
        }

        trace!("heuristics updated with {} samples", samples.len());
    }

    /// Number of samples remembered for the given symbol.
    pub fn count(&self, d: Dibit) -> usize { self.symbols[d.bits() as usize].len }

    /// Mean and variance of the given symbol's samples, if any were seen.
    pub fn level(&self, d: Dibit) -> Option<(f64, f64)> {
        let h = &self.symbols[d.bits() as usize];

        if h.len == 0 {
            None
        } else {
            Some((h.mean(), h.variance()))
        }
    }

    /// Pick the symbol most likely to have produced the given sample, once every symbol
    /// has enough samples.
    pub fn estimate(&self, value: i32) -> Option<Dibit> {
        if self.symbols.iter().any(|h| h.len < MIN_SAMPLES) {
            return None;
        }

        let v = value as f64;

        // Negative log likelihood under a normal distribution, up to constants.
        let cost = |h: &SymbolHistory| {
            let var = h.variance().max(1.0);
            (v - h.mean()).powi(2) / var + var.ln()
        };

        let (best, _) = self.symbols.iter().enumerate().fold((0, std::f64::MAX),
            |(best, min), (i, h)| {
                let c = cost(h);
                if c < min { (i, c) } else { (best, min) }
            });

        Some(Dibit::new(best as u8))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const LEVELS: [i32; 4] = [1000, 3000, -1000, -3000];

    fn samples(n: usize) -> Vec<AnalogSample> {
        (0..n).map(|i| {
            let d = i % 4;
            let jitter = (i as i32 * 37) % 200 - 100;

            AnalogSample { value: LEVELS[d] + jitter, dibit: Dibit::new(d as u8) }
        }).collect()
    }

    #[test]
    fn test_warmup() {
        let mut h = Heuristics::new();
        assert_eq!(h.estimate(0), None);

        h.contribute(&samples(36));
        assert_eq!(h.count(Dibit::new(0)), 9);
        assert_eq!(h.estimate(1000), None);

        h.contribute(&samples(4));
        assert_eq!(h.estimate(1000), Some(Dibit::new(0)));
    }

    #[test]
    fn test_estimate() {
        let mut h = Heuristics::new();
        h.contribute(&samples(FRAME_SAMPLES));

        assert_eq!(h.estimate(2900), Some(Dibit::new(1)));
        assert_eq!(h.estimate(1200), Some(Dibit::new(0)));
        assert_eq!(h.estimate(-800), Some(Dibit::new(2)));
        assert_eq!(h.estimate(-5000), Some(Dibit::new(3)));

        let (mean, var) = h.level(Dibit::new(1)).unwrap();
        assert!((mean - 3000.0).abs() < 100.0);
        assert!(var > 0.0);
    }

    #[test]
    fn test_history() {
        let mut h = Heuristics::new();

        for _ in 0..3 {
            h.contribute(&samples(FRAME_SAMPLES));
        }

        assert_eq!(h.count(Dibit::new(2)), HISTORY);

        let late = (0..HISTORY).map(|_| AnalogSample { value: 50, dibit: Dibit::new(2) })
            .collect::<Vec<AnalogSample>>();
        h.contribute(&late);

        assert_eq!(h.level(Dibit::new(2)), Some((50.0, 0.0)));
    }
}
