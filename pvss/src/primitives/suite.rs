//! Capabilities the PVSS engine consumes: an encryption [Group] and a [PointTranslation] out of it.
//!
//! Both are modeled as traits over unit types (like signature scheme variants) so the same
//! dealing and verification code runs over any pair of groups that share the BLS12-381 scalar
//! field.

use super::{
    group::{Element, Point, Scalar, G1, G2},
    Error,
};
use blst::{Pairing as blst_pairing, BLS12_381_NEG_G1};
use std::{fmt::Debug, hash::Hash, sync::OnceLock};

/// Number of distinct symbols a bit pair can encrypt.
pub const SYMBOLS: usize = 4;

/// A prime-order group in which shares are committed to and encrypted.
pub trait Group: Clone + Debug + Hash + Eq + Send + Sync + 'static {
    /// The group element type.
    type Point: Point;

    /// Name of the suite, embedded on the wire to detect mismatches.
    const NAME: &'static str;

    /// Returns the group generator.
    fn generator() -> Self::Point {
        <Self::Point as Element>::one()
    }

    /// Returns `[0·G, 1·G, 2·G, 3·G]`, the points a bit pair can decrypt to.
    ///
    /// The points are computed once per suite and shared afterwards.
    fn plaintexts() -> &'static [Self::Point; SYMBOLS];
}

/// Maps secrets committed in a source group into a (possibly different) target group and checks
/// that a translated value is consistent with its source commitment.
pub trait PointTranslation: Clone + Debug + Hash + Eq + Send + Sync + 'static {
    /// The group commitments are made in.
    type Source: Point;

    /// The group translated values live in.
    type Target: Point;

    /// Returns `secret` lifted into the target group.
    fn translate(secret: &Scalar) -> Self::Target;

    /// Verifies that `source` and `target` commit to the same secret.
    fn verify_translation(source: &Self::Source, target: &Self::Target) -> Result<(), Error>;
}

/// Computes the four plaintext points of a group.
fn compute_plaintexts<P: Point>() -> [P; SYMBOLS] {
    let mut points = [P::zero(); SYMBOLS];
    for i in 1..SYMBOLS {
        let mut next = points[i - 1];
        next.add(&P::one());
        points[i] = next;
    }
    points
}

/// The BLS12-381 G1 group.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Bls12381G1 {}

impl Group for Bls12381G1 {
    type Point = G1;

    const NAME: &'static str = "BLS12381G1";

    fn plaintexts() -> &'static [G1; SYMBOLS] {
        static PLAINTEXTS: OnceLock<[G1; SYMBOLS]> = OnceLock::new();
        PLAINTEXTS.get_or_init(compute_plaintexts::<G1>)
    }
}

/// Translates secrets committed in G1 into G2 (`s·G1 -> s·G2`).
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct G1ToG2 {}

impl PointTranslation for G1ToG2 {
    type Source = G1;
    type Target = G2;

    fn translate(secret: &Scalar) -> G2 {
        G2::times(&G2::one(), secret)
    }

    /// Verifies that `e(source, G2::one())` is equal to `e(G1::one(), target)` using a single
    /// product check with a negated G1 generator (`e(source,G2::one()) * e(-G1::one(),target) == 1`).
    fn verify_translation(source: &G1, target: &G2) -> Result<(), Error> {
        // Create a pairing context
        //
        // We only pair group elements (no hashing), so we leave the domain separator tag empty.
        let mut pairing = blst_pairing::new(false, &[]);

        // Aggregate `e(-G1::one(), target)`
        let q = target.as_blst_p2_affine();
        unsafe {
            pairing.raw_aggregate(&q, &BLS12_381_NEG_G1);
        }

        // Aggregate `e(source, G2::one())`
        let generator = G2::one().as_blst_p2_affine();
        pairing.raw_aggregate(&generator, &source.as_blst_p1_affine());

        // Finalize the pairing accumulation and verify the result
        pairing.commit();
        if !pairing.finalverify(None) {
            return Err(Error::InvalidTranslation);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn plaintexts() {
        let points = Bls12381G1::plaintexts();
        for (i, point) in points.iter().enumerate() {
            let expected = G1::times(&G1::one(), &Scalar::from_u64(i as u64));
            assert_eq!(*point, expected);
        }

        // Cached instance is reused
        assert!(std::ptr::eq(points, Bls12381G1::plaintexts()));
    }

    #[test]
    fn translation() {
        let mut rng = StdRng::seed_from_u64(0);
        let secret = Scalar::rand(&mut rng);
        let source = G1::times(&G1::one(), &secret);
        let target = G1ToG2::translate(&secret);
        G1ToG2::verify_translation(&source, &target).unwrap();

        let other = G1ToG2::translate(&Scalar::rand(&mut rng));
        assert!(matches!(
            G1ToG2::verify_translation(&source, &other),
            Err(Error::InvalidTranslation)
        ));
    }
}
