//! An encrypted share: one [BitPair] per 2-bit symbol of the share plus a proof binding the
//! symbols to the share's public commitment.
//!
//! # Binding
//!
//! The share `s` is encoded as 32 big-endian bytes and split into `k = 128` symbols `b_i` (most
//! significant first), so `s = Σ 4^(k-1-i)·b_i`. Aggregating the pairs with the same weights gives:
//!
//! ```text
//! Σ 4^(k-1-i)·C_i = (Σ 4^(k-1-i)·x_i)·pk + s·G
//! ```
//!
//! Subtracting the share commitment `s·G` leaves `X·pk` with `X = Σ 4^(k-1-i)·x_i`. The dealer
//! proves knowledge of `X` over base `pk`, and every pair proves its symbol is in `{0, 1, 2, 3}`,
//! so a valid ciphertext decrypts to the committed share.
//!
//! The aggregate only binds the symbols modulo the group order `r`, and 128 symbols span values up
//! to `2^256 > r`. A dealer may therefore encrypt `s + r` instead of `s`. Decryption reduces the
//! reassembled integer modulo `r`, so every ciphertext that verifies decrypts to the committed
//! share. Ciphertexts must carry exactly [MAX_PAIRS] pairs for the same reason.

use crate::{
    bit_pair::BitPair,
    knowledge::{KnowledgeProof, KNOWLEDGE_PROOF_LENGTH},
    primitives::{
        group::{Element, Point, Scalar},
        poly::{Eval, Private},
        suite::Group,
    },
    self_verify, Error, PlayerIndex, MAX_PAIRS, PAIRS_PER_BYTE,
};
use bytes::{Buf, BufMut};
use pvss_codec::{
    prefixed, Encode, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt, Write,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

/// Bits encrypted by each pair.
const BITS_PER_PAIR: usize = 2;

/// An encrypted share addressed to one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CipherText<G: Group> {
    receiver: PlayerIndex,
    encryption_key: G::Point,
    binding_proof: KnowledgeProof,
    pairs: Vec<BitPair<G>>,
}

/// Returns the domain separator of the pair at `index`.
fn pair_domain(domain: &[u8], index: usize) -> Vec<u8> {
    let mut pair_domain = Vec::with_capacity(domain.len() + 2);
    pair_domain.extend_from_slice(domain);
    pair_domain.extend_from_slice(&(index as u16).to_be_bytes());
    pair_domain
}

/// Multiplies `value` by 4.
fn quadruple<E: Element>(value: &mut E) {
    for _ in 0..BITS_PER_PAIR {
        let copy = value.clone();
        value.add(&copy);
    }
}

/// Folds `values` into `Σ 4^(k-1-i)·values[i]`.
fn weighted_sum<'a, E: Element + 'a>(values: impl IntoIterator<Item = &'a E>) -> E {
    values.into_iter().fold(E::zero(), |mut acc, value| {
        quadruple(&mut acc);
        acc.add(value);
        acc
    })
}

/// Splits big-endian bytes into 2-bit symbols, most significant first.
fn to_symbols(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .flat_map(|byte| {
            (0..PAIRS_PER_BYTE)
                .rev()
                .map(move |i| (byte >> (i * BITS_PER_PAIR)) & 0b11)
        })
        .collect()
}

/// Packs 2-bit symbols (most significant first) back into bytes.
fn from_symbols(symbols: &[u8]) -> Vec<u8> {
    symbols
        .chunks(PAIRS_PER_BYTE)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u8, |byte, symbol| (byte << BITS_PER_PAIR) | symbol)
        })
        .collect()
}

impl<G: Group> CipherText<G> {
    /// Encrypts the evaluation of `secret` at `receiver` to `pk`.
    ///
    /// Returns the ciphertext and the plaintext share.
    pub fn encrypt<R: RngCore + CryptoRng>(
        rng: &mut R,
        domain: &[u8],
        secret: &Private,
        receiver: PlayerIndex,
        pk: &G::Point,
    ) -> Result<(Self, Eval<Scalar>), Error> {
        let share = secret.evaluate(receiver);
        let mut bytes = share.value.to_bytes();
        let mut symbols = to_symbols(&bytes);
        bytes.zeroize();
        let cipher_text = Self::encrypt_symbols(rng, domain, receiver, pk, &symbols);
        symbols.zeroize();
        let cipher_text = cipher_text?;

        self_verify("cipher text", || {
            let commitment = G::Point::times(&G::generator(), &share.value);
            cipher_text.verify(domain, receiver, pk, &commitment)
        });
        Ok((cipher_text, share))
    }

    /// Encrypts `symbols` (most significant first) and proves knowledge of their aggregate
    /// blinding scalar.
    fn encrypt_symbols<R: RngCore + CryptoRng>(
        rng: &mut R,
        domain: &[u8],
        receiver: PlayerIndex,
        pk: &G::Point,
        symbols: &[u8],
    ) -> Result<Self, Error> {
        // Encrypt every symbol, keeping the blinding scalars for the binding proof
        let mut pairs = Vec::with_capacity(symbols.len());
        let mut blindings = Vec::with_capacity(symbols.len());
        for (index, symbol) in symbols.iter().enumerate() {
            match BitPair::<G>::encrypt(rng, &pair_domain(domain, index), pk, *symbol) {
                Ok((pair, blinding)) => {
                    pairs.push(pair);
                    blindings.push(blinding);
                }
                Err(err) => {
                    blindings.zeroize();
                    return Err(err);
                }
            }
        }
        let mut total = weighted_sum(&blindings);
        blindings.zeroize();

        // Bind the proof to this exact set of pairs
        let binding = Self::binding_domain(domain, receiver, pk, &pairs);
        let binding_proof = KnowledgeProof::prove(rng, &binding, pk, &total);
        total.zeroize();

        Ok(Self {
            receiver,
            encryption_key: *pk,
            binding_proof,
            pairs,
        })
    }

    /// Digest of the context and every pair, used as the binding proof's domain.
    fn binding_domain(
        domain: &[u8],
        receiver: PlayerIndex,
        pk: &G::Point,
        pairs: &[BitPair<G>],
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(receiver.to_bytes());
        hasher.update(pk.encode());
        for pair in pairs {
            hasher.update(pair.encode());
        }
        hasher.finalize().into()
    }

    /// Verifies that the ciphertext encrypts, to `pk`, the share committed to by
    /// `share_commitment`.
    ///
    /// The number of pairs is checked before any point arithmetic is performed.
    pub fn verify(
        &self,
        domain: &[u8],
        receiver: PlayerIndex,
        pk: &G::Point,
        share_commitment: &G::Point,
    ) -> Result<(), Error> {
        if self.pairs.len() > MAX_PAIRS {
            return Err(Error::TooManyPairs(self.pairs.len(), MAX_PAIRS));
        }
        if self.pairs.len() != MAX_PAIRS {
            return Err(Error::InvalidPlaintextLength(self.pairs.len()));
        }
        if self.receiver != receiver {
            return Err(Error::ProofInvalid("receiver mismatch"));
        }
        if self.encryption_key != *pk {
            return Err(Error::ProofInvalid("encryption key mismatch"));
        }

        // Verify the binding proof against the aggregate blinding term
        let mut combined = weighted_sum(self.pairs.iter().map(|pair| pair.cipher_text_term()));
        combined.sub(share_commitment);
        let binding = Self::binding_domain(domain, receiver, pk, &self.pairs);
        self.binding_proof.verify(&binding, pk, &combined)?;

        // Verify every symbol is in range
        for (index, pair) in self.pairs.iter().enumerate() {
            pair.verify(&pair_domain(domain, index), pk)?;
        }
        Ok(())
    }

    /// Decrypts the share with the receiver's private key.
    ///
    /// The decrypted integer is reduced modulo the group order.
    pub fn decrypt(&self, sk: &Scalar) -> Result<Eval<Scalar>, Error> {
        if self.pairs.len() != MAX_PAIRS {
            return Err(Error::InvalidPlaintextLength(self.pairs.len()));
        }
        let mut symbols = self
            .pairs
            .iter()
            .map(|pair| pair.decrypt(sk))
            .collect::<Result<Vec<_>, _>>()?;
        let mut plaintext = from_symbols(&symbols);
        symbols.zeroize();
        let value = Scalar::from_bytes_reduced(&plaintext);
        plaintext.zeroize();
        Ok(Eval {
            index: self.receiver,
            value,
        })
    }

    /// Returns the player this ciphertext is addressed to.
    pub fn receiver(&self) -> PlayerIndex {
        self.receiver
    }

    /// Returns the key the ciphertext is encrypted to.
    pub fn encryption_key(&self) -> &G::Point {
        &self.encryption_key
    }

    /// Returns the encrypted symbols.
    pub fn pairs(&self) -> &[BitPair<G>] {
        &self.pairs
    }
}

impl<G: Group> Write for CipherText<G> {
    fn write(&self, buf: &mut impl BufMut) {
        prefixed::write_bytes::<u8>(G::NAME.as_bytes(), buf);
        self.receiver.write(buf);
        self.encryption_key.write(buf);
        prefixed::write_bytes::<u16>(self.binding_proof.as_bytes(), buf);
        prefixed::write_seq::<u16, _>(&self.pairs, buf);
    }
}

impl<G: Group> Read for CipherText<G> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        // The suite is checked before anything else is interpreted
        let name = prefixed::read_bytes::<u8>(buf, &RangeCfg::from(..))?;
        if name.as_ref() != G::NAME.as_bytes() {
            return Err(CodecError::Invalid("CipherText", "suite mismatch"));
        }
        let receiver = PlayerIndex::read(buf)?;
        let encryption_key = G::Point::read(buf)?;
        let proof = prefixed::read_bytes::<u16>(buf, &RangeCfg::exact(KNOWLEDGE_PROOF_LENGTH))?;
        let mut binding_proof = [0u8; KNOWLEDGE_PROOF_LENGTH];
        binding_proof.copy_from_slice(&proof);
        let pairs =
            prefixed::read_seq::<u16, BitPair<G>>(buf, &RangeCfg::exact(MAX_PAIRS), &())?;
        Ok(Self {
            receiver,
            encryption_key,
            binding_proof: KnowledgeProof::from(binding_proof),
            pairs,
        })
    }
}

impl<G: Group> EncodeSize for CipherText<G> {
    fn encode_size(&self) -> usize {
        prefixed::bytes_size::<u8>(G::NAME.len())
            + PlayerIndex::SIZE
            + G::Point::SIZE
            + prefixed::bytes_size::<u16>(KNOWLEDGE_PROOF_LENGTH)
            + u16::SIZE
            + self.pairs.len() * BitPair::<G>::SIZE
    }
}
