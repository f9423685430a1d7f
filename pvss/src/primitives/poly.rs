//! Polynomial operations over the BLS12-381 scalar field.
//!
//! # Warning
//!
//! The security of the polynomial operations is critical for the overall
//! security of the sharing. Ensure that the scalar field operations
//! are performed over the correct field and that all elements are valid.

use super::{
    group::{Element, Point, Scalar},
    Error,
};
use crate::PlayerIndex;
use bytes::{Buf, BufMut};
use pvss_codec::{prefixed, EncodeSize, Error as CodecError, RangeCfg, Read, Write};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Private polynomials are used to generate secret shares.
pub type Private = Poly<Scalar>;

/// A polynomial evaluation at a specific player index.
///
/// With a [Scalar] value this is a private share of the secret (the value a player recovers
/// by decrypting its share).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eval<C: Element> {
    pub index: PlayerIndex,
    pub value: C,
}

/// A polynomial that is using a scalar for the variable x and a generic
/// element for the coefficients.
///
/// The coefficients must be able to multiply the type of the variable,
/// which is always a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
// Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L24-L28
pub struct Poly<C>(Vec<C>);

/// Returns a new scalar polynomial of the given degree where each coefficient is
/// sampled at random from the provided RNG.
///
/// In the context of secret sharing, the threshold is the degree + 1.
pub fn new_from<R: RngCore + CryptoRng>(degree: u32, rng: &mut R) -> Poly<Scalar> {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L46-L52
    let coeffs = (0..=degree).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
    Poly::<Scalar>(coeffs)
}

impl<C> Poly<C> {
    /// Creates a new polynomial from the given coefficients.
    ///
    /// Panics if no coefficients are provided.
    pub fn from(c: Vec<C>) -> Self {
        assert!(!c.is_empty(), "polynomial must have at least one coefficient");
        Self(c)
    }

    /// Returns the constant term of the polynomial.
    pub fn constant(&self) -> &C {
        &self.0[0]
    }

    /// Returns the degree of the polynomial
    pub fn degree(&self) -> u32 {
        (self.0.len() - 1) as u32 // check size in deserialize, safe to cast
    }

    /// Returns the number of required shares to reconstruct the polynomial.
    ///
    /// This will be the threshold
    pub fn required(&self) -> u32 {
        self.0.len() as u32 // check size in deserialize, safe to cast
    }

    /// Returns the coefficients in ascending order of degree.
    pub fn coefficients(&self) -> &[C] {
        &self.0
    }
}

impl<C: Element> Poly<C> {
    /// Commits the scalar polynomial to the group and returns a polynomial over
    /// the group.
    ///
    /// This is done by multiplying each coefficient of the polynomial with the
    /// group's generator.
    pub fn commit(commits: &Poly<Scalar>) -> Self {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L322-L340
        let commits = commits
            .0
            .iter()
            .map(|c| {
                let mut commitment = C::one();
                commitment.mul(c);
                commitment
            })
            .collect::<Vec<C>>();

        Poly::<C>::from(commits)
    }

    /// Evaluates the polynomial at the specified player.
    ///
    /// Players are 1-based, so the polynomial is never evaluated at `x = 0` (the secret).
    pub fn evaluate(&self, index: PlayerIndex) -> Eval<C> {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L111-L129
        let xi = index.scalar();

        // Use Horner's method to evaluate the polynomial
        let res = self.0.iter().rev().fold(C::zero(), |mut sum, coeff| {
            sum.mul(&xi);
            sum.add(coeff);
            sum
        });
        Eval { value: res, index }
    }

    /// Evaluates the polynomial at players `1..=n` (capped at [MAX_PLAYERS](crate::MAX_PLAYERS)).
    pub fn evaluate_all(&self, n: u16) -> Vec<C> {
        PlayerIndex::all(n)
            .map(|index| self.evaluate(index).value)
            .collect()
    }

    /// Recovers the constant term of a polynomial of degree less than `t` using at least `t`
    /// evaluations of the polynomial.
    ///
    /// This function uses Lagrange interpolation to compute the constant term (i.e., the value
    /// of the polynomial at `x=0`) given at least `t` distinct evaluations of the polynomial.
    /// Each evaluation is taken at `x = index`.
    pub fn recover<'a, I>(t: u32, evals: I) -> Result<C, Error>
    where
        C: 'a,
        I: IntoIterator<Item = &'a Eval<C>>,
    {
        // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/a714310be76620e10e8797d6637df64011926430/crates/threshold-bls/src/poly.rs#L131-L165

        // Check if we have at least `t` evaluations; if not, return an error
        let t = t as usize;
        let mut evals = evals.into_iter().collect::<Vec<_>>();
        if evals.len() < t {
            return Err(Error::NotEnoughEvaluations(t, evals.len()));
        }

        // We sort the evaluations by index to ensure that two invocations of
        // `recover` select the same evals.
        evals.sort_by_key(|e| e.index);
        if evals.windows(2).any(|w| w[0].index == w[1].index) {
            return Err(Error::DuplicateEval);
        }

        // Take the first `t` evaluations and prepare them for interpolation
        let xs = evals
            .into_iter()
            .take(t)
            .map(|e| (e.index, e.index.scalar(), &e.value))
            .collect::<Vec<_>>();

        // Use Lagrange interpolation to compute the constant term at `x=0`
        //
        // The constant term is `sum_{i=1 to t} yi * l_i(0)`, where `l_i(0) = product_{j != i} (xj / (xj - xi))`.
        xs.iter().try_fold(C::zero(), |mut acc, (i, xi, yi)| {
            let (mut num, den) = xs.iter().fold(
                (Scalar::one(), Scalar::one()),
                |(mut num, mut den), (j, xj, _)| {
                    if i != j {
                        // Include `xj` in the numerator product for `l_i(0)`
                        num.mul(xj);

                        // Compute `xj - xi` and include it in the denominator product
                        let mut tmp = *xj;
                        tmp.sub(xi);
                        den.mul(&tmp);
                    }
                    (num, den)
                },
            );

            // Compute `l_i(0) = num / den`
            let inv = den.inverse().ok_or(Error::NoInverse)?;
            num.mul(&inv);

            // Add `yi * l_i(0)` to the running sum
            let mut yi_scaled = (*yi).clone();
            yi_scaled.mul(&num);
            acc.add(&yi_scaled);
            Ok(acc)
        })
    }
}

impl<C: Zeroize> Zeroize for Poly<C> {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl<C: Point> Write for Poly<C> {
    fn write(&self, buf: &mut impl BufMut) {
        prefixed::write_seq::<u16, _>(&self.0, buf);
    }
}

impl<C: Point> Read for Poly<C> {
    type Cfg = RangeCfg;

    fn read_cfg(buf: &mut impl Buf, range: &RangeCfg) -> Result<Self, CodecError> {
        let coeffs = prefixed::read_seq::<u16, C>(buf, range, &())?;
        if coeffs.is_empty() {
            return Err(CodecError::InvalidLength(0));
        }
        Ok(Self(coeffs))
    }
}

impl<C: Point> EncodeSize for Poly<C> {
    fn encode_size(&self) -> usize {
        prefixed::seq_size::<u16, _>(&self.0)
    }
}
