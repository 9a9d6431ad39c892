//! Encoding and decoding of the Hamming codes used across the supported protocols.
//!
//! The (7, 4), (12, 8), (15, 11), and (10, 6) codes have minimum distance 3 and correct a
//! single error. The (16, 11, 4) code extends the (15, 11) code with an overall parity
//! row, so it still corrects one error but can also detect two.

block_code!(
    /// Encoding and decoding of the (7, 4, 3) code, used in the DMR CACH TACT.
    h7_4, (7, 4, 1), [
        0b1110,
        0b0111,
        0b1101,
    ]
);

block_code!(
    /// Encoding and decoding of the shortened (10, 6, 3) code.
    h10_6, (10, 6, 1), [
        0b111001,
        0b110101,
        0b101110,
        0b011110,
    ]
);

block_code!(
    /// Encoding and decoding of the shortened (12, 8, 3) code, used in dPMR headers.
    h12_8, (12, 8, 1), [
        0b10101100,
        0b11010110,
        0b11101011,
        0b01011001,
    ]
);

block_code!(
    /// Encoding and decoding of the (15, 11, 3) code.
    h15_11, (15, 11, 1), [
        0b11110101100,
        0b01111010110,
        0b00111101011,
        0b11101011001,
    ]
);

block_code!(
    /// Encoding and decoding of the (16, 11, 4) code, used in the DMR embedded link
    /// control.
    h16_11, (16, 11, 1), [
        0b11110101100,
        0b01111010110,
        0b00111101011,
        0b11101011001,
        0b10100110111,
    ]
);
