//! ElGamal encryption of a 2-bit symbol with a proof that it encodes one of `{0, 1, 2, 3}`.
//!
//! # Encryption
//!
//! A symbol `b` is encrypted to the recipient key `pk` with a fresh blinding scalar `x`:
//!
//! ```text
//! B = x·G
//! C = x·pk + b·G
//! ```
//!
//! # Membership Proof
//!
//! Each hypothesis `k ∈ {0, 1, 2, 3}` induces the statement "`B = x·G` and `C - k·G = x·pk`"
//! (equality of discrete logs). The proof is a ring (OR) composition of the four Chaum-Pedersen
//! proofs: the branch for the real symbol is proven with the witness `x`, the other three are
//! simulated, and the challenges are chained so that the ring only closes if at least one branch
//! was proven honestly.
//!
//! The proof is `c_0 ‖ s_0 ‖ s_1 ‖ s_2 ‖ s_3`. A verifier walks the ring once:
//!
//! ```text
//! U_k = s_k·G + c_k·B
//! V_k = s_k·pk + c_k·(C - k·G)
//! c_{k+1} = H(domain, pk, B, C, k, U_k, V_k)
//! ```
//!
//! and accepts iff `c_4 = c_0`. Every branch is processed identically, so the public verification
//! path does not depend on the encrypted symbol.

use crate::{
    primitives::{
        group::{Element, Point, Scalar, SCALAR_LENGTH},
        suite::{Group, SYMBOLS},
    },
    self_verify, Error,
};
use bytes::{Buf, BufMut};
use pvss_codec::{Encode, Error as CodecError, FixedSize, Read, ReadExt, Write};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// Domain separation tag for membership proof challenges.
const DST_MEMBERSHIP: &[u8] = b"PVSS_BIT_PAIR_MEMBERSHIP_V1";

/// Length of a membership proof: one seed challenge and one response per symbol.
pub const MEMBERSHIP_PROOF_LENGTH: usize = (SYMBOLS + 1) * SCALAR_LENGTH;

/// An encrypted 2-bit symbol and its membership proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitPair<G: Group> {
    blinding_commitment: G::Point,
    cipher_text_term: G::Point,
    proof: [u8; MEMBERSHIP_PROOF_LENGTH],
}

/// Computes the challenge for the branch following `branch`.
fn challenge<P: Point>(
    domain: &[u8],
    pk: &P,
    blinding_commitment: &P,
    cipher_text_term: &P,
    branch: usize,
    u: &P,
    v: &P,
) -> Scalar {
    let mut transcript = Vec::with_capacity(domain.len() + 1 + 5 * P::SIZE);
    transcript.extend_from_slice(domain);
    pk.write(&mut transcript);
    blinding_commitment.write(&mut transcript);
    cipher_text_term.write(&mut transcript);
    transcript.push(branch as u8);
    u.write(&mut transcript);
    v.write(&mut transcript);
    Scalar::hash(DST_MEMBERSHIP, &transcript)
}

/// Returns `s·base + c·statement`.
fn commitment<P: Point>(s: &Scalar, base: &P, c: &Scalar, statement: &P) -> P {
    let mut ret = P::times(base, s);
    ret.add(&P::times(statement, c));
    ret
}

impl<G: Group> BitPair<G> {
    /// Encrypts `symbol` to `pk` and proves that the result decrypts to a valid symbol.
    ///
    /// Returns the encrypted pair and its blinding scalar (which the caller must keep secret).
    pub fn encrypt<R: RngCore + CryptoRng>(
        rng: &mut R,
        domain: &[u8],
        pk: &G::Point,
        symbol: u8,
    ) -> Result<(Self, Scalar), Error> {
        let real = symbol as usize;
        if real >= SYMBOLS {
            return Err(Error::InvalidSymbol(symbol));
        }
        let generator = G::generator();
        let plaintexts = G::plaintexts();

        // Encrypt
        let x = Scalar::rand(rng);
        let blinding_commitment = G::Point::times(&generator, &x);
        let mut cipher_text_term = G::Point::times(pk, &x);
        cipher_text_term.add(&plaintexts[real]);
        let statements = Self::statements(&cipher_text_term);

        // Commit to the real branch
        let mut nonce = Scalar::rand(rng);
        let mut challenges = [Scalar::zero(); SYMBOLS];
        let mut responses = [Scalar::zero(); SYMBOLS];
        let u = G::Point::times(&generator, &nonce);
        let v = G::Point::times(pk, &nonce);
        challenges[(real + 1) % SYMBOLS] = challenge(
            domain,
            pk,
            &blinding_commitment,
            &cipher_text_term,
            real,
            &u,
            &v,
        );

        // Simulate the remaining branches, walking the ring from the real one
        for step in 1..SYMBOLS {
            let branch = (real + step) % SYMBOLS;
            responses[branch] = Scalar::rand(rng);
            let u = commitment(
                &responses[branch],
                &generator,
                &challenges[branch],
                &blinding_commitment,
            );
            let v = commitment(
                &responses[branch],
                pk,
                &challenges[branch],
                &statements[branch],
            );
            challenges[(branch + 1) % SYMBOLS] = challenge(
                domain,
                pk,
                &blinding_commitment,
                &cipher_text_term,
                branch,
                &u,
                &v,
            );
        }

        // Close the ring: s = nonce - c·x
        let mut cx = challenges[real];
        cx.mul(&x);
        nonce.sub(&cx);
        responses[real] = nonce;
        nonce.zeroize();
        cx.zeroize();

        let mut proof = [0u8; MEMBERSHIP_PROOF_LENGTH];
        proof[..SCALAR_LENGTH].copy_from_slice(&challenges[0].to_bytes());
        for (chunk, response) in proof[SCALAR_LENGTH..]
            .chunks_mut(SCALAR_LENGTH)
            .zip(responses.iter())
        {
            chunk.copy_from_slice(&response.to_bytes());
        }

        let pair = Self {
            blinding_commitment,
            cipher_text_term,
            proof,
        };
        self_verify("bit pair", || pair.verify(domain, pk));
        Ok((pair, x))
    }

    /// Returns `C - k·G` for each hypothesis `k`.
    fn statements(cipher_text_term: &G::Point) -> [G::Point; SYMBOLS] {
        let plaintexts = G::plaintexts();
        let mut statements = [*cipher_text_term; SYMBOLS];
        for (statement, plaintext) in statements.iter_mut().zip(plaintexts.iter()) {
            statement.sub(plaintext);
        }
        statements
    }

    /// Parses the proof into its seed challenge and responses.
    fn parse_proof(&self) -> Result<(Scalar, [Scalar; SYMBOLS]), Error> {
        let mut buf = &self.proof[..];
        let mut next = || {
            Scalar::read(&mut buf).map_err(|_| Error::ProofInvalid("membership proof encoding"))
        };
        let seed = next()?;
        let mut responses = [Scalar::zero(); SYMBOLS];
        for response in responses.iter_mut() {
            *response = next()?;
        }
        Ok((seed, responses))
    }

    /// Verifies that the pair encrypts one of `{0, 1, 2, 3}` to `pk`.
    pub fn verify(&self, domain: &[u8], pk: &G::Point) -> Result<(), Error> {
        let (seed, responses) = self.parse_proof()?;
        let generator = G::generator();
        let statements = Self::statements(&self.cipher_text_term);

        let mut c = seed;
        for (branch, (response, statement)) in responses.iter().zip(statements.iter()).enumerate() {
            let u = commitment(response, &generator, &c, &self.blinding_commitment);
            let v = commitment(response, pk, &c, statement);
            c = challenge(
                domain,
                pk,
                &self.blinding_commitment,
                &self.cipher_text_term,
                branch,
                &u,
                &v,
            );
        }
        if c != seed {
            return Err(Error::ProofInvalid("membership proof"));
        }
        Ok(())
    }

    /// Decrypts the pair with the recipient's private key.
    ///
    /// Returns [Error::UnknownPlaintext] if the result is not one of the four plaintext points,
    /// which can only happen for a pair that was not encrypted to `sk` (or was corrupted).
    pub fn decrypt(&self, sk: &Scalar) -> Result<u8, Error> {
        let mut plaintext = self.cipher_text_term;
        plaintext.sub(&G::Point::times(&self.blinding_commitment, sk));

        // Compare against every candidate, without stopping at the first match
        let mut symbol = None;
        for (candidate, point) in G::plaintexts().iter().enumerate() {
            if *point == plaintext {
                symbol = Some(candidate as u8);
            }
        }
        symbol.ok_or(Error::UnknownPlaintext)
    }

    /// Returns the blinding commitment `x·G`.
    pub fn blinding_commitment(&self) -> &G::Point {
        &self.blinding_commitment
    }

    /// Returns the ciphertext term `x·pk + b·G`.
    pub fn cipher_text_term(&self) -> &G::Point {
        &self.cipher_text_term
    }

    /// Returns the canonical encoding of the pair.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode().to_vec()
    }
}

impl<G: Group> Write for BitPair<G> {
    fn write(&self, buf: &mut impl BufMut) {
        self.blinding_commitment.write(buf);
        self.cipher_text_term.write(buf);
        self.proof.write(buf);
    }
}

impl<G: Group> Read for BitPair<G> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let blinding_commitment = G::Point::read(buf)?;
        let cipher_text_term = G::Point::read(buf)?;
        let proof = <[u8; MEMBERSHIP_PROOF_LENGTH]>::read(buf)?;
        Ok(Self {
            blinding_commitment,
            cipher_text_term,
            proof,
        })
    }
}

impl<G: Group> FixedSize for BitPair<G> {
    const SIZE: usize = 2 * G::Point::SIZE + MEMBERSHIP_PROOF_LENGTH;
}
