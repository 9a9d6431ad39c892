//! Fixed-size accumulation of symbols into the frame sections processed as a unit.

use crate::bits::{Dibit, Hexbit};

pub trait Storage {
    type Input: Copy;
    type Buf;

    fn size(&self) -> usize;
    fn buf(&mut self) -> &mut Self::Buf;
    fn add(&mut self, item: Self::Input, pos: usize);
    fn reset(&mut self) {}
}

macro_rules! storage_type {
    ($name: ident, [$input: ty; $size: expr]) => {
        pub struct $name([$input; $size]);

        impl $name {
            pub fn new() -> Self { $name([Default::default(); $size]) }
        }

        impl Storage for $name {
            type Input = $input;
            type Buf = [$input; $size];

            fn size(&self) -> usize { $size }
            fn buf(&mut self) -> &mut Self::Buf { &mut self.0 }
            fn add(&mut self, item: Self::Input, pos: usize) { self.0[pos] = item; }
        }
    };
}

// P25.
storage_type!(VoiceFrameStorage, [Dibit; 88]);
storage_type!(TsbkStorage, [Dibit; 98]);
storage_type!(ShortHexbitStorage, [Hexbit; 24]);
storage_type!(LongHexbitStorage, [Hexbit; 36]);

/// Shifts up to 32 dibits into a word, the first dibit ending up in the highest
/// position.
pub struct DibitStorage {
    buf: u64,
    size: usize,
}

impl DibitStorage {
    pub fn new(size: usize) -> DibitStorage {
        assert!(size <= 32);

        DibitStorage {
            buf: 0,
            size,
        }
    }
}

impl Storage for DibitStorage {
    type Input = Dibit;
    type Buf = u64;

    fn size(&self) -> usize { self.size }
    fn buf(&mut self) -> &mut u64 { &mut self.buf }

    fn add(&mut self, item: Self::Input, _: usize) {
        self.buf <<= 2;
        self.buf |= item.bits() as u64;
    }

    fn reset(&mut self) { self.buf = 0; }
}

/// Accumulates items into its storage, handing out the full buffer once every slot has
/// been written.
pub struct Buffer<S: Storage> {
    storage: S,
    pos: usize,
}

impl<S: Storage> Buffer<S> {
    pub fn new(storage: S) -> Buffer<S> {
        Buffer {
            storage,
            pos: 0,
        }
    }

    /// Discard any partially accumulated items.
    pub fn reset(&mut self) { self.pos = 0; }

    /// Number of items accumulated so far.
    pub fn len(&self) -> usize { self.pos }

    /// Add the given item, returning the full buffer if it completed the buffer. The
    /// buffer is reset once `Some` is returned.
    pub fn feed(&mut self, item: S::Input) -> Option<&mut S::Buf> {
        if self.pos == 0 {
            self.storage.reset();
        }

        self.storage.add(item, self.pos);
        self.pos += 1;

        if self.pos == self.storage.size() {
            self.reset();
            Some(self.storage.buf())
        } else {
            None
        }
    }
}
