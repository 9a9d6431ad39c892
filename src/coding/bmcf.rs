//! Locates and evaluates symbol errors from a set of syndromes, shared by the BCH and
//! Reed-Solomon decoders.
//!
//! The error locator polynomial Λ(x) is found with the Berlekamp-Massey algorithm, its
//! roots are searched with Chien search, and error values come from Forney's formula.
//! These follow *Coding Theory and Cryptography: The Essentials*, Hankerson, Hoffman, et
//! al, 2000.

use crate::coding::galois::{self, Gf64, SIZE};

/// Find the errors in a received word given its 2t syndromes s<sub>1</sub>, ...,
/// s<sub>2t</sub>, where s<sub>i</sub> = r(α<sup>i</sup>).
///
/// Only the first `positions` coefficients of r(x) are searched. On success, return
/// the list of `(degree, value)` pairs, where `degree` is the power of x in r(x) holding
/// the error and `value` must be added to that coefficient. Return `None` when the errors
/// can't be located, which means more than t errors occurred.
pub fn errors(syn: &[Gf64], positions: usize) -> Option<Vec<(usize, Gf64)>> {
    assert!(positions <= SIZE);

    if syn.iter().all(|s| s.is_zero()) {
        return Some(vec![]);
    }

    let (lambda, degree) = locator(syn);

    // Ω(x) = s(x)Λ(x) mod x^2t.
    let omega = (0..syn.len()).map(|i| {
        (0..=i).fold(Gf64::zero(), |acc, j| acc + syn[i - j] * lambda[j])
    }).collect::<Vec<Gf64>>();

    // Formal derivative, which keeps only the odd-degree terms in characteristic 2.
    let deriv = (1..lambda.len()).map(|i| {
        if i % 2 == 1 { lambda[i] } else { Gf64::zero() }
    }).collect::<Vec<Gf64>>();

    let mut found = Vec::with_capacity(degree);

    for pos in 0..positions {
        // Roots of Λ(x) are the inverses of the error locators α^pos.
        let xinv = Gf64::for_power(SIZE - pos);

        if !galois::eval(&lambda, xinv).is_zero() {
            continue;
        }

        let den = galois::eval(&deriv, xinv);

        if den.is_zero() {
            return None;
        }

        found.push((pos, galois::eval(&omega, xinv) / den));
    }

    if found.len() == degree {
        Some(found)
    } else {
        None
    }
}

/// Run Berlekamp-Massey over the given syndromes, returning the coefficients of Λ(x),
/// lowest degree first, and its degree.
fn locator(syn: &[Gf64]) -> (Vec<Gf64>, usize) {
    let n = syn.len();

    let mut lambda = vec![Gf64::zero(); n + 1];
    let mut prev = vec![Gf64::zero(); n + 1];

    lambda[0] = Gf64::one();
    prev[0] = Gf64::one();

    // Current degree.
    let mut degree = 0;
    // Steps since `prev` was saved.
    let mut shift = 1;
    // Discrepancy when `prev` was saved.
    let mut prev_disc = Gf64::one();

    for k in 0..n {
        let disc = (1..=degree).fold(syn[k], |acc, i| acc + lambda[i] * syn[k - i]);

        if disc.is_zero() {
            shift += 1;
            continue;
        }

        let coef = disc / prev_disc;
        let saved = lambda.clone();

        for i in shift..=n {
            lambda[i] += coef * prev[i - shift];
        }

        if 2 * degree <= k {
            degree = k + 1 - degree;
            prev = saved;
            prev_disc = disc;
            shift = 1;
        } else {
            shift += 1;
        }
    }

    (lambda, degree)
}

#[cfg(test)]
mod test {
    use super::*;

    /// Syndromes of a binary word with bits set at the given degrees.
    fn syndromes(errs: &[usize], count: usize) -> Vec<Gf64> {
        (1..=count).map(|p| {
            errs.iter().fold(Gf64::zero(), |s, &b| s + Gf64::for_power(b * p))
        }).collect()
    }

    #[test]
    fn test_no_errors() {
        assert_eq!(errors(&[Gf64::zero(); 8], 63), Some(vec![]));
    }

    #[test]
    fn test_locate() {
        let found = errors(&syndromes(&[3, 17, 40], 8), 63).unwrap();

        assert_eq!(found, vec![
            (3, Gf64::one()),
            (17, Gf64::one()),
            (40, Gf64::one()),
        ]);
    }

    #[test]
    fn test_locator() {
        // Single error at degree 5: Λ(x) = 1 + α^5 x.
        let (lambda, degree) = locator(&syndromes(&[5], 4));

        assert_eq!(degree, 1);
        assert_eq!(lambda[0], Gf64::one());
        assert_eq!(lambda[1], Gf64::for_power(5));
        assert!(lambda[2..].iter().all(|c| c.is_zero()));
    }

    #[test]
    fn test_too_many() {
        // Five errors can't be located with four syndromes.
        assert_eq!(errors(&syndromes(&[1, 9, 22, 30, 50], 4), 63), None);
    }
}
