//! Proof of knowledge of a discrete logarithm over an arbitrary base.
//!
//! Used to bind the symbols of a ciphertext to a committed share: the prover shows it knows `X`
//! such that `P = X·base`, where `base` is the recipient's public key.
//!
//! ```text
//! R = k·base
//! c = H(domain ‖ base ‖ P ‖ R)
//! s = k + c·X
//! ```
//!
//! The proof is `c ‖ s`. A verifier recomputes `R = s·base - c·P` and checks the challenge.

use crate::{
    primitives::group::{Element, Point, Scalar, SCALAR_LENGTH},
    self_verify, Error,
};
use bytes::{Buf, BufMut};
use pvss_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Domain separation tag for knowledge proof challenges.
const DST_KNOWLEDGE: &[u8] = b"PVSS_KNOWLEDGE_OF_DL_V1";

/// Length of a knowledge proof: a challenge and a response.
pub const KNOWLEDGE_PROOF_LENGTH: usize = 2 * SCALAR_LENGTH;

/// A non-interactive proof that the prover knows the discrete log of a point over a base.
///
/// Held as raw bytes so that a malformed proof is rejected at verification rather than decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KnowledgeProof([u8; KNOWLEDGE_PROOF_LENGTH]);

fn challenge<P: Point>(domain: &[u8], base: &P, public: &P, commitment: &P) -> Scalar {
    let mut transcript = Vec::with_capacity(domain.len() + 3 * P::SIZE);
    transcript.extend_from_slice(domain);
    base.write(&mut transcript);
    public.write(&mut transcript);
    commitment.write(&mut transcript);
    Scalar::hash(DST_KNOWLEDGE, &transcript)
}

impl KnowledgeProof {
    /// Proves knowledge of `secret` for `secret·base` under `domain`.
    pub fn prove<P: Point, R: RngCore + CryptoRng>(
        rng: &mut R,
        domain: &[u8],
        base: &P,
        secret: &Scalar,
    ) -> Self {
        let public = P::times(base, secret);
        let mut k = Scalar::rand(rng);
        let commitment = P::times(base, &k);
        let c = challenge(domain, base, &public, &commitment);

        // s = k + c·X
        let mut s = c;
        s.mul(secret);
        s.add(&k);
        k.zeroize();

        let mut bytes = [0u8; KNOWLEDGE_PROOF_LENGTH];
        bytes[..SCALAR_LENGTH].copy_from_slice(&c.to_bytes());
        bytes[SCALAR_LENGTH..].copy_from_slice(&s.to_bytes());
        let proof = Self(bytes);
        self_verify("knowledge proof", || proof.verify(domain, base, &public));
        proof
    }

    /// Verifies that the prover knows the discrete log of `public` over `base`.
    pub fn verify<P: Point>(&self, domain: &[u8], base: &P, public: &P) -> Result<(), Error> {
        let mut buf = &self.0[..];
        let c = Scalar::read(&mut buf).map_err(|_| Error::ProofInvalid("knowledge proof encoding"))?;
        let s = Scalar::read(&mut buf).map_err(|_| Error::ProofInvalid("knowledge proof encoding"))?;

        // R = s·base - c·P
        let mut commitment = P::times(base, &s);
        commitment.sub(&P::times(public, &c));
        if challenge(domain, base, public, &commitment) != c {
            return Err(Error::ProofInvalid("knowledge proof"));
        }
        Ok(())
    }

    /// Returns the raw proof.
    pub fn as_bytes(&self) -> &[u8; KNOWLEDGE_PROOF_LENGTH] {
        &self.0
    }
}

impl From<[u8; KNOWLEDGE_PROOF_LENGTH]> for KnowledgeProof {
    fn from(bytes: [u8; KNOWLEDGE_PROOF_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Write for KnowledgeProof {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for KnowledgeProof {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        Ok(Self(<[u8; KNOWLEDGE_PROOF_LENGTH]>::read(buf)?))
    }
}

impl FixedSize for KnowledgeProof {
    const SIZE: usize = KNOWLEDGE_PROOF_LENGTH;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::group::G1;
    use pvss_codec::{DecodeExt, Encode};
    use rand::{rngs::StdRng, SeedableRng};

    fn setup(rng: &mut StdRng) -> (G1, Scalar, G1) {
        let base = G1::times(&G1::one(), &Scalar::rand(rng));
        let secret = Scalar::rand(rng);
        let public = G1::times(&base, &secret);
        (base, secret, public)
    }

    #[test]
    fn test_prove_verify() {
        let mut rng = StdRng::seed_from_u64(0);
        let (base, secret, public) = setup(&mut rng);
        let proof = KnowledgeProof::prove(&mut rng, b"domain", &base, &secret);
        proof.verify(b"domain", &base, &public).unwrap();
    }

    #[test]
    fn test_wrong_statement() {
        let mut rng = StdRng::seed_from_u64(1);
        let (base, secret, public) = setup(&mut rng);
        let proof = KnowledgeProof::prove(&mut rng, b"domain", &base, &secret);

        assert!(matches!(
            proof.verify(b"other", &base, &public),
            Err(Error::ProofInvalid(_))
        ));
        let mut other = public;
        other.add(&G1::one());
        assert!(matches!(
            proof.verify(b"domain", &base, &other),
            Err(Error::ProofInvalid(_))
        ));
        assert!(matches!(
            proof.verify(b"domain", &G1::one(), &public),
            Err(Error::ProofInvalid(_))
        ));
    }

    #[test]
    fn test_tampered() {
        let mut rng = StdRng::seed_from_u64(2);
        let (base, secret, public) = setup(&mut rng);
        let proof = KnowledgeProof::prove(&mut rng, b"domain", &base, &secret);
        for position in [0, SCALAR_LENGTH - 1, SCALAR_LENGTH, KNOWLEDGE_PROOF_LENGTH - 1] {
            let mut bytes = *proof.as_bytes();
            bytes[position] ^= 0x80;
            assert!(matches!(
                KnowledgeProof::from(bytes).verify(b"domain", &base, &public),
                Err(Error::ProofInvalid(_))
            ));
        }

        // Unreduced scalars are rejected without panicking
        let bytes = [0xff; KNOWLEDGE_PROOF_LENGTH];
        assert!(matches!(
            KnowledgeProof::from(bytes).verify(b"domain", &base, &public),
            Err(Error::ProofInvalid("knowledge proof encoding"))
        ));
    }

    #[test]
    fn test_codec() {
        let mut rng = StdRng::seed_from_u64(3);
        let (base, secret, _) = setup(&mut rng);
        let proof = KnowledgeProof::prove(&mut rng, b"domain", &base, &secret);
        let encoded = proof.encode();
        assert_eq!(encoded.len(), KNOWLEDGE_PROOF_LENGTH);
        assert_eq!(KnowledgeProof::decode(encoded).unwrap(), proof);
    }
}
