//! Block interleaving, where bits are written into a matrix row by row and transmitted
//! column by column.

use crate::bits::BitSlice;

/// Block interleaver with the given matrix dimensions.
#[derive(Copy, Clone, Debug)]
pub struct Block {
    rows: usize,
    cols: usize,
}

impl Block {
    pub const fn new(rows: usize, cols: usize) -> Block {
        Block { rows, cols }
    }

    /// Number of bits in a block.
    pub fn len(&self) -> usize { self.rows * self.cols }

    /// Get the transmitted position of the bit at the given position before
    /// interleaving.
    pub fn index(&self, k: usize) -> usize {
        debug_assert!(k < self.len());
        k % self.cols * self.rows + k / self.cols
    }

    /// Undo the interleaving of the given received bits.
    pub fn deinterleave(&self, input: &[u8], out: &mut [u8]) {
        for k in 0..self.len() {
            out.set_bit(k, input.bit(self.index(k)));
        }
    }

    /// Interleave the given bits for transmission.
    pub fn interleave(&self, input: &[u8], out: &mut [u8]) {
        for k in 0..self.len() {
            out.set_bit(self.index(k), input.bit(k));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_index() {
        let b = Block::new(12, 5);

        assert_eq!(b.len(), 60);
        assert_eq!(b.index(0), 0);
        assert_eq!(b.index(1), 12);
        assert_eq!(b.index(4), 48);
        assert_eq!(b.index(5), 1);
        assert_eq!(b.index(59), 59);

        let mut seen = [false; 60];

        for k in 0..60 {
            assert!(!seen[b.index(k)]);
            seen[b.index(k)] = true;
        }
    }

    #[test]
    fn test_interleave() {
        let b = Block::new(4, 2);

        let mut out = [0];
        b.interleave(&[0b11000000], &mut out);
        assert_eq!(out, [0b10001000]);

        let mut back = [0];
        b.deinterleave(&out, &mut back);
        assert_eq!(back, [0b11000000]);
    }
}
