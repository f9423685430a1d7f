//! Group operations over the BLS12-381 scalar field.
//!
//! This module implements basic group operations over BLS12-381 elements,
//! including point addition, negation, scalar multiplication, and hashing
//! to the scalar field.
//!
//! # Warning
//!
//! Ensure that points are checked to belong to the correct subgroup
//! (G1 or G2) to prevent small subgroup attacks. This is particularly important
//! when handling deserialized points or points received from untrusted sources. This
//! is already taken care of for you if you use the provided [Read] implementations.

use blst::{
    blst_bendian_from_scalar, blst_fr, blst_fr_add, blst_fr_cneg, blst_fr_from_scalar,
    blst_fr_from_uint64, blst_fr_inverse, blst_fr_mul, blst_fr_sub, blst_keygen_v3, blst_p1,
    blst_p1_add_or_double, blst_p1_affine, blst_p1_cneg, blst_p1_compress, blst_p1_from_affine,
    blst_p1_in_g1, blst_p1_is_inf, blst_p1_mult, blst_p1_to_affine, blst_p1_uncompress, blst_p2,
    blst_p2_add_or_double, blst_p2_affine, blst_p2_cneg, blst_p2_compress, blst_p2_from_affine,
    blst_p2_in_g2, blst_p2_is_inf, blst_p2_mult, blst_p2_to_affine, blst_p2_uncompress,
    blst_scalar, blst_scalar_fr_check, blst_scalar_from_be_bytes, blst_scalar_from_bendian,
    blst_scalar_from_fr, BLS12_381_G1, BLS12_381_G2, BLST_ERROR,
};
use bytes::{Buf, BufMut};
use pvss_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::{fmt::Debug, ptr};
use zeroize::Zeroize;

/// An element of a group.
pub trait Element: Clone + Eq + PartialEq + Debug + Send + Sync {
    /// Returns the additive identity.
    fn zero() -> Self;

    /// Returns the multiplicative identity (the generator, for points).
    fn one() -> Self;

    /// Adds to self in-place.
    fn add(&mut self, rhs: &Self);

    /// Multiplies self in-place.
    fn mul(&mut self, rhs: &Scalar);
}

/// An element of a prime-order elliptic curve group with a canonical fixed-width encoding.
pub trait Point: Element + Copy + Write + Read<Cfg = ()> + FixedSize {
    /// Negates self in-place.
    fn neg(&mut self);

    /// Subtracts the provided point from self in-place.
    fn sub(&mut self, rhs: &Self) {
        let mut rhs = *rhs;
        rhs.neg();
        self.add(&rhs);
    }

    /// Returns `base * scalar` without modifying `base`.
    fn times(base: &Self, scalar: &Scalar) -> Self {
        let mut ret = *base;
        ret.mul(scalar);
        ret
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct Scalar(blst_fr);

/// Length of a canonically encoded [Scalar].
pub const SCALAR_LENGTH: usize = 32;

/// Number of bits in the BLS12-381 scalar field modulus.
///
/// Every multiplication walks this many bits so the cost does not depend on the
/// magnitude of a (possibly secret) scalar.
pub const SCALAR_BITS: usize = 255;

/// `R = 2^256 mod q` in little-endian Montgomery form which is equivalent to 1 in little-endian
/// non-Montgomery form.
///
/// mod(2^256, 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001) = 0x1824b159acc5056f998c4fefecbc4ff55884b7fa0003480200000001fffffffe
// Reference: https://github.com/filecoin-project/blstrs/blob/ffbb41d1495d84e40a712583346439924603b49a/src/scalar.rs#L77-L89
const BLST_FR_ONE: Scalar = Scalar(blst_fr {
    l: [
        0x0000_0001_ffff_fffe,
        0x5884_b7fa_0003_4802,
        0x998c_4fef_ecbc_4ff5,
        0x1824_b159_acc5_056f,
    ],
});

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G1(blst_p1);

pub const G1_ELEMENT_BYTE_LENGTH: usize = 48;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[repr(transparent)]
pub struct G2(blst_p2);

pub const G2_ELEMENT_BYTE_LENGTH: usize = 96;

impl Scalar {
    /// Generates a random scalar using the provided RNG.
    pub fn rand<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        // Generate a random 64 byte buffer
        let mut ikm = [0u8; 64];
        rng.fill_bytes(&mut ikm);

        // Generate a scalar from the randomly populated buffer
        let mut ret = blst_fr::default();
        unsafe {
            let mut sc = blst_scalar::default();
            blst_keygen_v3(&mut sc, ikm.as_ptr(), ikm.len(), ptr::null(), 0);
            blst_fr_from_scalar(&mut ret, &sc);
        }
        ikm.zeroize();
        Self(ret)
    }

    /// Returns the scalar corresponding to the provided integer.
    pub fn from_u64(i: u64) -> Self {
        // blst requires a buffer of 4 uint64 values. Failure to provide one will
        // result in unexpected behavior (will read past the provided buffer).
        //
        // Reference: https://github.com/supranational/blst/blob/415d4f0e2347a794091836a3065206edfd9c72f3/bindings/blst.h#L102
        let buffer = [i, 0, 0, 0];
        let mut ret = blst_fr::default();
        unsafe { blst_fr_from_uint64(&mut ret, buffer.as_ptr()) };
        Self(ret)
    }

    /// Maps `message` to a scalar, domain separated by `dst`.
    ///
    /// Two SHA-256 blocks are expanded into 64 bytes and reduced modulo the group order, so the
    /// output bias is negligible.
    pub fn hash(dst: &[u8], message: &[u8]) -> Self {
        let dst_len = u16::try_from(dst.len()).expect("domain separation tag too long");
        let mut wide = [0u8; 2 * SCALAR_LENGTH];
        for (counter, chunk) in wide.chunks_mut(SCALAR_LENGTH).enumerate() {
            let mut hasher = Sha256::new();
            hasher.update(dst_len.to_be_bytes());
            hasher.update(dst);
            hasher.update([counter as u8]);
            hasher.update(message);
            chunk.copy_from_slice(&hasher.finalize());
        }
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_be_bytes(&mut scalar, wide.as_ptr(), wide.len());
            blst_fr_from_scalar(&mut ret, &scalar);
        }
        Self(ret)
    }

    /// Computes the inverse of the scalar.
    pub fn inverse(&self) -> Option<Self> {
        if *self == Self::zero() {
            return None;
        }
        let mut ret = blst_fr::default();
        unsafe { blst_fr_inverse(&mut ret, &self.0) };
        Some(Self(ret))
    }

    /// Subtracts the provided scalar from self in-place.
    pub fn sub(&mut self, rhs: &Self) {
        unsafe { blst_fr_sub(&mut self.0, &self.0, &rhs.0) }
    }

    /// Negates self in-place.
    pub fn neg(&mut self) {
        unsafe { blst_fr_cneg(&mut self.0, &self.0, true) }
    }

    /// Returns the canonical big-endian encoding of the scalar.
    pub fn to_bytes(&self) -> [u8; SCALAR_LENGTH] {
        let mut bytes = [0u8; SCALAR_LENGTH];
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_fr(&mut scalar, &self.0);
            blst_bendian_from_scalar(bytes.as_mut_ptr(), &scalar);
            scalar.b.zeroize();
        }
        bytes
    }

    /// Parses a canonical big-endian encoding, rejecting values that are not reduced.
    pub fn from_bytes(bytes: &[u8; SCALAR_LENGTH]) -> Option<Self> {
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_bendian(&mut scalar, bytes.as_ptr());
            if !blst_scalar_fr_check(&scalar) {
                return None;
            }
            blst_fr_from_scalar(&mut ret, &scalar);
            scalar.b.zeroize();
        }
        Some(Self(ret))
    }

    /// Interprets big-endian bytes as an integer and reduces it modulo the group order.
    pub fn from_bytes_reduced(bytes: &[u8]) -> Self {
        let mut ret = blst_fr::default();
        unsafe {
            let mut scalar = blst_scalar::default();
            blst_scalar_from_be_bytes(&mut scalar, bytes.as_ptr(), bytes.len());
            blst_fr_from_scalar(&mut ret, &scalar);
            scalar.b.zeroize();
        }
        Self(ret)
    }
}

/// Returns the big-endian bytes of `scalar + r` for the group order `r` (a non-canonical
/// encoding of the same scalar).
#[cfg(test)]
pub(crate) fn unreduced_bytes(scalar: &Scalar) -> [u8; SCALAR_LENGTH] {
    // r - 1, plus 1 carried in below
    let mut modulus = Scalar::zero();
    modulus.sub(&Scalar::one());
    let modulus = modulus.to_bytes();
    let value = scalar.to_bytes();

    let mut out = [0u8; SCALAR_LENGTH];
    let mut carry = 1u16;
    for i in (0..SCALAR_LENGTH).rev() {
        let sum = value[i] as u16 + modulus[i] as u16 + carry;
        out[i] = sum as u8;
        carry = sum >> 8;
    }
    assert_eq!(carry, 0, "scalar + r overflows");
    out
}

impl Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Scalars are frequently secret, never print them.
        f.write_str("Scalar(..)")
    }
}

impl Zeroize for Scalar {
    fn zeroize(&mut self) {
        self.0.l.zeroize();
    }
}

impl Element for Scalar {
    fn zero() -> Self {
        Self(blst_fr::default())
    }

    fn one() -> Self {
        BLST_FR_ONE
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_add(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Self) {
        unsafe {
            blst_fr_mul(&mut self.0, &self.0, &rhs.0);
        }
    }
}

impl Write for Scalar {
    fn write(&self, buf: &mut impl BufMut) {
        buf.put_slice(&self.to_bytes());
    }
}

impl Read for Scalar {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let bytes = <[u8; SCALAR_LENGTH]>::read(buf)?;
        Self::from_bytes(&bytes).ok_or(CodecError::Invalid("Scalar", "not reduced"))
    }
}

impl FixedSize for Scalar {
    const SIZE: usize = SCALAR_LENGTH;
}

/// Serializes `scalar` into the big-endian byte array the blst multiplication routines expect.
fn mult_input(scalar: &Scalar) -> blst_scalar {
    let mut ret = blst_scalar::default();
    unsafe { blst_scalar_from_fr(&mut ret, &scalar.0) };
    ret
}

impl G1 {
    /// Converts the point to its affine representation.
    pub(crate) fn as_blst_p1_affine(&self) -> blst_p1_affine {
        let mut affine = blst_p1_affine::default();
        unsafe { blst_p1_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G1 {
    fn zero() -> Self {
        Self(blst_p1::default())
    }

    fn one() -> Self {
        let mut ret = blst_p1::default();
        unsafe {
            blst_p1_from_affine(&mut ret, &BLS12_381_G1);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p1_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar = mult_input(rhs);
        unsafe {
            blst_p1_mult(&mut self.0, &self.0, scalar.b.as_ptr(), SCALAR_BITS);
        }
        scalar.b.zeroize();
    }
}

impl Point for G1 {
    fn neg(&mut self) {
        unsafe { blst_p1_cneg(&mut self.0, true) }
    }
}

impl Write for G1 {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; G1_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p1_compress(bytes.as_mut_ptr(), &self.0);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for G1 {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let bytes = <[u8; G1_ELEMENT_BYTE_LENGTH]>::read(buf)?;
        let mut ret = blst_p1::default();
        unsafe {
            let mut affine = blst_p1_affine::default();
            if blst_p1_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return Err(CodecError::Invalid("G1", "invalid encoding"));
            }
            blst_p1_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p1_is_inf(&ret) {
                return Err(CodecError::Invalid("G1", "point at infinity"));
            }

            // Verify that the deserialized element is in G1
            if !blst_p1_in_g1(&ret) {
                return Err(CodecError::Invalid("G1", "not in subgroup"));
            }
        }
        Ok(Self(ret))
    }
}

impl FixedSize for G1 {
    const SIZE: usize = G1_ELEMENT_BYTE_LENGTH;
}

impl G2 {
    /// Converts the point to its affine representation.
    pub(crate) fn as_blst_p2_affine(&self) -> blst_p2_affine {
        let mut affine = blst_p2_affine::default();
        unsafe { blst_p2_to_affine(&mut affine, &self.0) };
        affine
    }
}

impl Element for G2 {
    fn zero() -> Self {
        Self(blst_p2::default())
    }

    fn one() -> Self {
        let mut ret = blst_p2::default();
        unsafe {
            blst_p2_from_affine(&mut ret, &BLS12_381_G2);
        }
        Self(ret)
    }

    fn add(&mut self, rhs: &Self) {
        unsafe {
            blst_p2_add_or_double(&mut self.0, &self.0, &rhs.0);
        }
    }

    fn mul(&mut self, rhs: &Scalar) {
        let mut scalar = mult_input(rhs);
        unsafe {
            blst_p2_mult(&mut self.0, &self.0, scalar.b.as_ptr(), SCALAR_BITS);
        }
        scalar.b.zeroize();
    }
}

impl Point for G2 {
    fn neg(&mut self) {
        unsafe { blst_p2_cneg(&mut self.0, true) }
    }
}

impl Write for G2 {
    fn write(&self, buf: &mut impl BufMut) {
        let mut bytes = [0u8; G2_ELEMENT_BYTE_LENGTH];
        unsafe {
            blst_p2_compress(bytes.as_mut_ptr(), &self.0);
        }
        buf.put_slice(&bytes);
    }
}

impl Read for G2 {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let bytes = <[u8; G2_ELEMENT_BYTE_LENGTH]>::read(buf)?;
        let mut ret = blst_p2::default();
        unsafe {
            let mut affine = blst_p2_affine::default();
            if blst_p2_uncompress(&mut affine, bytes.as_ptr()) != BLST_ERROR::BLST_SUCCESS {
                return Err(CodecError::Invalid("G2", "invalid encoding"));
            }
            blst_p2_from_affine(&mut ret, &affine);

            // Verify that deserialized element isn't infinite
            if blst_p2_is_inf(&ret) {
                return Err(CodecError::Invalid("G2", "point at infinity"));
            }

            // Verify that the deserialized element is in G2
            if !blst_p2_in_g2(&ret) {
                return Err(CodecError::Invalid("G2", "not in subgroup"));
            }
        }
        Ok(Self(ret))
    }
}

impl FixedSize for G2 {
    const SIZE: usize = G2_ELEMENT_BYTE_LENGTH;
}

#[cfg(test)]
mod tests {
    // Reference: https://github.com/celo-org/celo-threshold-bls-rs/blob/b0ef82ff79769d085a5a7d3f4fe690b1c8fe6dc9/crates/threshold-bls/src/curve/bls12381.rs#L200-L220

    use super::*;
    use bytes::Bytes;
    use pvss_codec::{DecodeExt, Encode};
    use rand::{rngs::StdRng, thread_rng, SeedableRng};

    #[test]
    fn basic_group() {
        let s = Scalar::rand(&mut thread_rng());
        let mut s2 = s;
        s2.add(&s);

        // p1 = s2 * G = (s+s)G
        let mut p1 = G1::one();
        p1.mul(&s2);

        // p2 = sG + sG = s2 * G
        let mut p2 = G1::one();
        p2.mul(&s);
        p2.add(&p2.clone());
        assert_eq!(p1, p2);
    }

    #[test]
    fn negation() {
        let mut rng = StdRng::seed_from_u64(0);
        let s = Scalar::rand(&mut rng);
        let p = G1::times(&G1::one(), &s);

        let mut q = p;
        q.sub(&p);
        assert_eq!(q, G1::zero());

        let mut neg_s = s;
        neg_s.neg();
        let mut r = G2::times(&G2::one(), &neg_s);
        r.add(&G2::times(&G2::one(), &s));
        assert_eq!(r, G2::zero());
    }

    #[test]
    fn small_integers() {
        let mut three = G1::one();
        three.add(&G1::one());
        three.add(&G1::one());
        assert_eq!(three, G1::times(&G1::one(), &Scalar::from_u64(3)));
        assert_eq!(G1::times(&G1::one(), &Scalar::zero()), G1::zero());

        let mut bytes = [0u8; SCALAR_LENGTH];
        bytes[SCALAR_LENGTH - 2..].copy_from_slice(&258u16.to_be_bytes());
        assert_eq!(Scalar::from_u64(258).to_bytes(), bytes);
    }

    #[test]
    fn inverse() {
        let mut rng = StdRng::seed_from_u64(1);
        let s = Scalar::rand(&mut rng);
        let mut product = s.inverse().unwrap();
        product.mul(&s);
        assert_eq!(product, Scalar::one());
        assert!(Scalar::zero().inverse().is_none());
    }

    #[test]
    fn hash_is_domain_separated() {
        let a = Scalar::hash(b"A", b"message");
        assert_eq!(a, Scalar::hash(b"A", b"message"));
        assert_ne!(a, Scalar::hash(b"B", b"message"));
        assert_ne!(a, Scalar::hash(b"A", b"massage"));
        assert_ne!(Scalar::hash(b"AB", b"C"), Scalar::hash(b"A", b"BC"));
    }

    #[test]
    fn codec() {
        let mut rng = StdRng::seed_from_u64(2);
        let s = Scalar::rand(&mut rng);
        assert_eq!(Scalar::decode(s.encode()).unwrap(), s);

        let p = G1::times(&G1::one(), &s);
        let encoded = p.encode();
        assert_eq!(encoded.len(), G1_ELEMENT_BYTE_LENGTH);
        assert_eq!(G1::decode(encoded).unwrap(), p);

        let q = G2::times(&G2::one(), &s);
        let encoded = q.encode();
        assert_eq!(encoded.len(), G2_ELEMENT_BYTE_LENGTH);
        assert_eq!(G2::decode(encoded).unwrap(), q);
    }

    #[test]
    fn reject_unreduced_scalar() {
        let bytes = Bytes::from_static(&[0xff; SCALAR_LENGTH]);
        assert!(matches!(
            Scalar::decode(bytes),
            Err(CodecError::Invalid("Scalar", _))
        ));
    }

    #[test]
    fn reduce_wide() {
        let mut rng = StdRng::seed_from_u64(3);
        let s = Scalar::rand(&mut rng);
        assert_eq!(Scalar::from_bytes_reduced(&s.to_bytes()), s);

        // s + r is not canonical but reduces to s
        let bytes = unreduced_bytes(&s);
        assert!(Scalar::from_bytes(&bytes).is_none());
        assert_eq!(Scalar::from_bytes_reduced(&bytes), s);
    }

    #[test]
    fn reject_identity() {
        let encoded = G1::zero().encode();
        assert!(G1::decode(encoded).is_err());
        let encoded = G2::zero().encode();
        assert!(G2::decode(encoded).is_err());
    }
}
