//! Encoding and decoding for the error correction and checksum schemes used across the
//! supported protocols.

#[macro_use]
pub mod syndrome;

mod bmcf;

pub mod bch;
pub mod convolution;
pub mod crc;
pub mod galois;
pub mod golay;
pub mod hamming;
pub mod interleave;
pub mod qr;
pub mod reed_solomon;
pub mod trellis;
pub mod viterbi;
