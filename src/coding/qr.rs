//! Encoding and decoding of the (16, 7, 6) quadratic residue code protecting the DMR
//! embedded signalling (EMB) field.
//!
//! The code corrects up to 2 errors.

block_code!(
    /// Encoding and decoding of the (16, 7, 6) code.
    qr16_7, (16, 7, 2), [
        0b0111100,
        0b0011110,
        0b1001111,
        0b0011011,
        0b0110001,
        0b1100100,
        0b1110010,
        0b1111001,
        0b1010111,
    ]
);
