//! Errors that may occur while decoding a frame.

use thiserror::Error;

/// Frame-local decode failures.
///
/// Each of these aborts only the frame being decoded. The decoder then returns to sync
/// search.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum DecodeError {
    /// Too many errors were detected when attempting a BCH decode.
    #[error("uncorrectable BCH codeword")]
    BchUnrecoverable,
    /// Too many errors were detected when attempting a Golay decode.
    #[error("uncorrectable Golay codeword")]
    GolayUnrecoverable,
    /// Too many errors were detected when attempting a Hamming decode.
    #[error("uncorrectable Hamming codeword")]
    HammingUnrecoverable,
    /// Too many errors were detected when attempting a quadratic residue decode.
    #[error("uncorrectable quadratic residue codeword")]
    QrUnrecoverable,
    /// Too many errors were detected when attempting a RS decode.
    #[error("uncorrectable Reed-Solomon codeword")]
    ReedSolomonUnrecoverable,
    /// The trellis decoder found two equally likely transitions.
    #[error("ambiguous trellis transition")]
    TrellisAmbiguous,
    /// More symbols were fed into the convolutional decoder than it has room for.
    #[error("convolutional decoder capacity of {0} steps exceeded")]
    ViterbiCapacity(usize),
    /// A checksum didn't match its payload.
    #[error("checksum mismatch")]
    Crc,
    /// A parity check failed on a field without further error correction.
    #[error("parity mismatch")]
    Parity,
    /// A P25 NID carried a data unit ID with no defined meaning.
    #[error("unknown data unit ID {0:#x}")]
    UnknownDuid(u8),
    /// A frame index ran past the end of its frame structure.
    #[error("frame index {0} out of range")]
    FrameOverflow(usize),
}

/// Standard result using `DecodeError`.
pub type Result<T> = std::result::Result<T, DecodeError>;
