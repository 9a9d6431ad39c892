//! Arithmetic over GF(2<sup>6</sup>), the field underlying the BCH and Reed-Solomon codes.
//!
//! The field is generated by the primitive polynomial α<sup>6</sup>+α+1.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul};

/// Number of nonzero elements in the field.
pub const SIZE: usize = 63;

/// Reduction polynomial x<sup>6</sup>+x+1.
const POLY: u16 = 0b1000011;

lazy_static! {
    /// Maps power i to the bit pattern of α<sup>i</sup>, repeated twice so sums of two
    /// powers never need reduction.
    static ref EXP: [u8; SIZE * 2] = {
        let mut exp = [0; SIZE * 2];
        let mut x = 1u16;

        for i in 0..SIZE {
            exp[i] = x as u8;
            exp[i + SIZE] = x as u8;

            x <<= 1;

            if x & 0b1000000 != 0 {
                x ^= POLY;
            }
        }

        exp
    };

    /// Maps each nonzero bit pattern to its power. Entry 0 is unused.
    static ref LOG: [u8; SIZE + 1] = {
        let mut log = [0; SIZE + 1];

        for (i, &x) in EXP[..SIZE].iter().enumerate() {
            log[x as usize] = i as u8;
        }

        log
    };
}

/// An element of GF(2<sup>6</sup>), held as its 6-bit polynomial representation.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Gf64(u8);

impl Gf64 {
    /// Construct a new element from the given bit pattern, which must fit in 6 bits.
    pub fn new(bits: u8) -> Gf64 {
        assert!(bits >> 6 == 0);
        Gf64(bits)
    }

    /// The additive identity.
    pub fn zero() -> Gf64 { Gf64(0) }

    /// The multiplicative identity α<sup>0</sup>.
    pub fn one() -> Gf64 { Gf64(1) }

    /// Construct α<sup>i</sup> for the given power, taken modulo the field size.
    pub fn for_power(pow: usize) -> Gf64 {
        Gf64(EXP[pow % SIZE])
    }

    /// Get the bit pattern of the element.
    pub fn bits(&self) -> u8 { self.0 }

    /// Check if the element is zero.
    pub fn is_zero(&self) -> bool { self.0 == 0 }

    /// Retrieve the power i of the element α<sup>i</sup>, or `None` for zero.
    pub fn power(&self) -> Option<usize> {
        if self.is_zero() {
            None
        } else {
            Some(LOG[self.0 as usize] as usize)
        }
    }

    /// Raise the element to the given power.
    pub fn pow(&self, pow: usize) -> Gf64 {
        match self.power() {
            Some(p) => Gf64::for_power(p * pow),
            None => Gf64::zero(),
        }
    }

    /// Find the multiplicative inverse, or `None` for zero.
    pub fn invert(&self) -> Option<Gf64> {
        self.power().map(|p| Gf64::for_power(SIZE - p))
    }
}

impl Add for Gf64 {
    type Output = Gf64;

    fn add(self, rhs: Gf64) -> Gf64 { Gf64(self.0 ^ rhs.0) }
}

impl AddAssign for Gf64 {
    fn add_assign(&mut self, rhs: Gf64) { self.0 ^= rhs.0 }
}

impl Mul for Gf64 {
    type Output = Gf64;

    fn mul(self, rhs: Gf64) -> Gf64 {
        match (self.power(), rhs.power()) {
            (Some(p), Some(q)) => Gf64(EXP[p + q]),
            _ => Gf64::zero(),
        }
    }
}

/// Divide elements. Panic if the divisor is zero.
impl Div for Gf64 {
    type Output = Gf64;

    fn div(self, rhs: Gf64) -> Gf64 {
        match (self.power(), rhs.power()) {
            (Some(p), Some(q)) => Gf64(EXP[SIZE + p - q]),
            (None, Some(_)) => Gf64::zero(),
            (_, None) => panic!("divide by zero"),
        }
    }
}

impl fmt::Debug for Gf64 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.power() {
            Some(p) => write!(f, "Gf64::for_power({})", p),
            None => write!(f, "Gf64::zero()"),
        }
    }
}

/// Evaluate the polynomial with the given coefficients, lowest degree first, at `x`.
pub fn eval(coefs: &[Gf64], x: Gf64) -> Gf64 {
    coefs.iter().rev().fold(Gf64::zero(), |acc, &c| acc * x + c)
}
