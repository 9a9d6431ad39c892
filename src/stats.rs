//! Runtime error correction statistics.

use crate::error::DecodeError;

/// Tracks stats for an error correction code.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeStats {
    /// Total number of received words.
    pub words: usize,
    /// Number of corrected symbols.
    pub fixed: usize,
    /// Number of unrecoverable words.
    pub err: usize,
}

impl CodeStats {
    /// Record that a word was received with the given amount of corrected symbols.
    pub fn record_fixes(&mut self, fixed: usize) {
        self.words += 1;
        self.fixed += fixed;
    }

    /// Record that a word was received with an unrecoverable error.
    pub fn record_err(&mut self) {
        self.words += 1;
        self.err += 1;
    }

    /// Record the outcome of a decode that returns `Some((data, fixed))` on success.
    pub fn record<T>(&mut self, res: Option<(T, usize)>) -> Option<T> {
        match res {
            Some((data, fixed)) => {
                self.record_fixes(fixed);
                Some(data)
            },
            None => {
                self.record_err();
                None
            },
        }
    }

    /// Merge in the stats from the given object and clear the other stats.
    fn merge(&mut self, other: &mut CodeStats) {
        self.words += other.words;
        self.err += other.err;
        self.fixed += other.fixed;

        other.clear();
    }

    /// Clear all stats.
    fn clear(&mut self) {
        *self = CodeStats::default();
    }
}

/// Records error correction statistics for each family of codes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Stats for the BCH code.
    pub bch: CodeStats,
    /// Stats for the (23, 12) and (24, 12) Golay codes.
    pub golay: CodeStats,
    /// Stats for the shortened Golay codes.
    pub golay_short: CodeStats,
    /// Stats for the Hamming codes.
    pub hamming: CodeStats,
    /// Stats for the quadratic residue code.
    pub qr: CodeStats,
    /// Stats for the Reed-Solomon codes.
    pub rs: CodeStats,
    /// Stats for the P25 trellis codes.
    pub trellis: CodeStats,
    /// Stats for the convolutional codes.
    pub viterbi: CodeStats,
    /// Number of checksum and parity failures.
    pub crc: usize,
}

impl Stats {
    /// Merge in the stats from the given object and reset the other stats back to
    /// default.
    pub fn merge<T: HasStats>(&mut self, other: &mut T) {
        let stats = other.stats();

        self.bch.merge(&mut stats.bch);
        self.golay.merge(&mut stats.golay);
        self.golay_short.merge(&mut stats.golay_short);
        self.hamming.merge(&mut stats.hamming);
        self.qr.merge(&mut stats.qr);
        self.rs.merge(&mut stats.rs);
        self.trellis.merge(&mut stats.trellis);
        self.viterbi.merge(&mut stats.viterbi);
        self.crc += stats.crc;
        stats.crc = 0;
    }

    /// Clear all stats.
    pub fn clear(&mut self) {
        *self = Stats::default();
    }

    /// Record the given error into the current stats.
    pub fn record_err(&mut self, err: DecodeError) {
        use crate::error::DecodeError::*;

        match err {
            BchUnrecoverable => self.bch.record_err(),
            GolayUnrecoverable => self.golay.record_err(),
            HammingUnrecoverable => self.hamming.record_err(),
            QrUnrecoverable => self.qr.record_err(),
            ReedSolomonUnrecoverable => self.rs.record_err(),
            TrellisAmbiguous => self.trellis.record_err(),
            ViterbiCapacity(_) => self.viterbi.record_err(),
            Crc | Parity => self.crc += 1,
            UnknownDuid(_) | FrameOverflow(_) => {},
        }
    }
}

/// Indicates that a type captures statistics.
pub trait HasStats {
    /// Retrieve captured statistics.
    fn stats(&mut self) -> &mut Stats;
}
