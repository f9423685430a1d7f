//! A dealer's complete contribution: the commitment to its secret polynomial, the secret
//! translated into the target group, and one encrypted share per player.
//!
//! # Lifecycle
//!
//! A [ShareSet] is produced once by [ShareSet::deal] and is immutable afterwards. Anyone may
//! [ShareSet::verify] it (any number of times) given the namespace and the players' public keys.
//! Each player [ShareSet::decrypt]s only its own share.
//!
//! # Witness
//!
//! The secret polynomial is dropped (and zeroized) once dealing completes. Callers that need it
//! (for example, to build test fixtures) must use [ShareSet::deal_with_witness], which returns it
//! in a separate [DealWithWitness] value. It is never part of a [ShareSet] and is never encoded.

use crate::{
    primitives::{
        group::{Element, Point, Scalar},
        poly::{self, Eval, Poly, Private},
        suite::{Group, PointTranslation},
    },
    self_verify,
    share::{read_point, Share},
    Error, PlayerIndex, MAX_PLAYERS, MIN_PLAYERS,
};
use bytes::{Buf, BufMut};
use pvss_codec::{
    prefixed, Decode, Encode, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, ReadExt,
    Write,
};
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use zeroize::Zeroizing;

/// One dealer's publicly verifiable sharing of a random secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShareSet<G: Group, T: PointTranslation<Source = G::Point>> {
    dealer: PlayerIndex,
    commitment: Poly<G::Point>,
    public_key: T::Target,
    shares: Vec<Share<G, T>>,
}

/// A [ShareSet] together with the secret polynomial it was dealt from.
///
/// # Warning
///
/// The secret polynomial determines every share. It must never leave the process that dealt it.
pub struct DealWithWitness<G: Group, T: PointTranslation<Source = G::Point>> {
    pub share_set: ShareSet<G, T>,
    pub secret: Zeroizing<Private>,
}

impl<G: Group, T: PointTranslation<Source = G::Point>> ShareSet<G, T> {
    /// Deals a random secret to `players`, recoverable by any `threshold + 1` of them.
    ///
    /// `players` holds each player's public key in committee order (player `i` at position
    /// `i - 1`).
    pub fn deal<R: RngCore + CryptoRng>(
        rng: &mut R,
        namespace: &[u8],
        threshold: u32,
        dealer: PlayerIndex,
        players: &[G::Point],
    ) -> Result<Self, Error> {
        Self::deal_with_witness(rng, namespace, threshold, dealer, players)
            .map(|dealt| dealt.share_set)
    }

    /// Deals like [ShareSet::deal] and also returns the secret polynomial.
    pub fn deal_with_witness<R: RngCore + CryptoRng>(
        rng: &mut R,
        namespace: &[u8],
        threshold: u32,
        dealer: PlayerIndex,
        players: &[G::Point],
    ) -> Result<DealWithWitness<G, T>, Error> {
        // Validate the committee before doing any work
        let n = players.len();
        if n < MIN_PLAYERS {
            return Err(Error::InsufficientPlayers(n, MIN_PLAYERS));
        }
        if n > MAX_PLAYERS {
            return Err(Error::TooManyPlayers(n, MAX_PLAYERS));
        }
        if threshold as usize >= n {
            return Err(Error::ThresholdTooHigh(threshold, n));
        }
        let identity = G::Point::zero();
        if let Some(position) = players.iter().position(|pk| *pk == identity) {
            return Err(Error::InvalidPublicKey(PlayerIndex::from_position(position)?));
        }

        // Sample and commit to the secret polynomial
        let secret = Zeroizing::new(poly::new_from(threshold, rng));
        let commitment = Poly::<G::Point>::commit(&secret);
        let public_key = T::translate(secret.constant());
        let domain = Self::domain(namespace, &commitment, dealer);

        // Encrypt a share to every player
        let mut shares = Vec::with_capacity(n);
        for (position, pk) in players.iter().enumerate() {
            let receiver = PlayerIndex::from_position(position)?;
            shares.push(Share::<G, T>::new(rng, &domain, &secret, receiver, pk)?);
            trace!(%dealer, %receiver, "encrypted share");
        }
        let share_set = Self {
            dealer,
            commitment,
            public_key,
            shares,
        };
        self_verify("share set", || {
            T::verify_translation(share_set.commitment.constant(), &share_set.public_key)
                .map_err(Error::Primitives)
        });
        debug!(%dealer, players = n, threshold, "dealt share set");
        Ok(DealWithWitness { share_set, secret })
    }

    /// Derives the domain every proof in the set is bound to.
    fn domain(namespace: &[u8], commitment: &Poly<G::Point>, dealer: PlayerIndex) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update((namespace.len() as u64).to_be_bytes());
        hasher.update(namespace);
        hasher.update(commitment.encode());
        hasher.update(dealer.to_bytes());
        hasher.finalize().into()
    }

    /// Verifies every share against the commitment and the players' public keys.
    ///
    /// Returns the first failure, annotated with the player whose share failed.
    pub fn verify(&self, namespace: &[u8], players: &[G::Point]) -> Result<(), Error> {
        let n = players.len();
        if n < MIN_PLAYERS {
            return Err(Error::InsufficientPlayers(n, MIN_PLAYERS));
        }
        if n > MAX_PLAYERS {
            return Err(Error::TooManyPlayers(n, MAX_PLAYERS));
        }
        if self.shares.len() != n {
            return Err(Error::PlayerCountMismatch(self.shares.len(), n));
        }
        if self.commitment.degree() as usize >= n {
            return Err(Error::ThresholdTooHigh(self.commitment.degree(), n));
        }
        T::verify_translation(self.commitment.constant(), &self.public_key)
            .map_err(|_| Error::ProofInvalid("public key translation"))?;

        let domain = Self::domain(namespace, &self.commitment, self.dealer);
        for (position, (share, pk)) in self.shares.iter().zip(players).enumerate() {
            let receiver = PlayerIndex::from_position(position)?;
            if let Err(err) = share.verify(&domain, &self.commitment, receiver, pk) {
                debug!(dealer = %self.dealer, %receiver, ?err, "invalid share");
                return Err(Error::ShareInvalid {
                    player: receiver,
                    source: Box::new(err),
                });
            }
        }
        Ok(())
    }

    /// Decodes a share set dealt to `players` and verifies it.
    ///
    /// Nothing decoded is returned unless it passes [ShareSet::verify].
    pub fn unmarshal(
        buf: impl Buf,
        namespace: &[u8],
        players: &[G::Point],
    ) -> Result<Self, Error> {
        let share_set = Self::decode_cfg(buf, &players.len())?;
        share_set.verify(namespace, players)?;
        Ok(share_set)
    }

    /// Decrypts `receiver`'s share and checks it against `share_commitment`.
    pub fn decrypt(
        &self,
        receiver: PlayerIndex,
        sk: &Scalar,
        share_commitment: &G::Point,
    ) -> Result<Eval<Scalar>, Error> {
        receiver.index_into(&self.shares)?.decrypt(sk, share_commitment)
    }

    /// Decrypts `receiver`'s share, checking it against the commitment evaluated at `receiver`.
    pub fn decrypt_checked(
        &self,
        receiver: PlayerIndex,
        sk: &Scalar,
    ) -> Result<Eval<Scalar>, Error> {
        let share_commitment = self.commitment.evaluate(receiver).value;
        self.decrypt(receiver, sk, &share_commitment)
    }

    /// Returns every player's share translated into the target group, in committee order.
    pub fn public_shares(&self) -> Vec<T::Target> {
        self.shares
            .iter()
            .map(|share| *share.sub_key_translation())
            .collect()
    }

    /// Returns the dealer's secret translated into the target group.
    pub fn public_key(&self) -> &T::Target {
        &self.public_key
    }

    /// Returns the commitment to the secret polynomial.
    pub fn commitment(&self) -> &Poly<G::Point> {
        &self.commitment
    }

    /// Returns the dealer.
    pub fn dealer(&self) -> PlayerIndex {
        self.dealer
    }

    /// Returns the minimum number of shares needed to recover the secret.
    pub fn required(&self) -> u32 {
        self.commitment.required()
    }

    /// Returns the encrypted shares, in committee order.
    pub fn shares(&self) -> &[Share<G, T>] {
        &self.shares
    }
}

impl<G: Group, T: PointTranslation<Source = G::Point>> Write for ShareSet<G, T> {
    fn write(&self, buf: &mut impl BufMut) {
        self.dealer.write(buf);
        self.commitment.write(buf);
        prefixed::write_bytes::<u8>(&self.public_key.encode(), buf);
        prefixed::write_seq::<u16, _>(&self.shares, buf);
    }
}

impl<G: Group, T: PointTranslation<Source = G::Point>> Read for ShareSet<G, T> {
    /// The number of players the set was dealt to.
    type Cfg = usize;

    fn read_cfg(buf: &mut impl Buf, players: &usize) -> Result<Self, CodecError> {
        let dealer = PlayerIndex::read(buf)?;
        let commitment = Poly::<G::Point>::read_cfg(buf, &RangeCfg::from(1..=*players))?;
        let public_key = read_point::<T::Target>(buf)?;
        let shares =
            prefixed::read_seq::<u16, Share<G, T>>(buf, &RangeCfg::exact(*players), &())?;
        Ok(Self {
            dealer,
            commitment,
            public_key,
            shares,
        })
    }
}

impl<G: Group, T: PointTranslation<Source = G::Point>> EncodeSize for ShareSet<G, T> {
    fn encode_size(&self) -> usize {
        PlayerIndex::SIZE
            + self.commitment.encode_size()
            + prefixed::bytes_size::<u8>(T::Target::SIZE)
            + prefixed::seq_size::<u16, _>(&self.shares)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{
        group::{G1, G2},
        suite::{Bls12381G1, G1ToG2},
    };
    use bytes::Bytes;
    use rand::{rngs::StdRng, SeedableRng};
    use test_case::test_case;

    type TestShareSet = ShareSet<Bls12381G1, G1ToG2>;

    const NAMESPACE: &[u8] = b"_PVSS_TEST";

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    fn committee(rng: &mut StdRng, n: usize) -> (Vec<Scalar>, Vec<G1>) {
        let keys = (0..n).map(|_| Scalar::rand(rng)).collect::<Vec<_>>();
        let players = keys.iter().map(|sk| G1::times(&G1::one(), sk)).collect();
        (keys, players)
    }

    fn dealer() -> PlayerIndex {
        PlayerIndex::new(1).unwrap()
    }

    #[test]
    fn test_end_to_end() {
        init_tracing();
        let mut rng = StdRng::seed_from_u64(0);
        let (keys, players) = committee(&mut rng, 5);
        let DealWithWitness { share_set, secret } =
            TestShareSet::deal_with_witness(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();
        share_set.verify(NAMESPACE, &players).unwrap();
        assert_eq!(share_set.dealer(), dealer());
        assert_eq!(share_set.required(), 3);
        assert_eq!(share_set.commitment().degree(), 2);
        assert_eq!(
            *share_set.public_key(),
            G2::times(&G2::one(), secret.constant())
        );

        // Every player decrypts its evaluation of the secret polynomial
        let shares = PlayerIndex::all(5)
            .map(|player| {
                let share = share_set
                    .decrypt_checked(player, &keys[player.position()])
                    .unwrap();
                assert_eq!(share, secret.evaluate(player));
                share
            })
            .collect::<Vec<_>>();

        // Any 3 shares recover the committed secret
        for i in 0..5 {
            for j in i + 1..5 {
                for k in j + 1..5 {
                    let subset = [shares[i], shares[j], shares[k]];
                    let recovered = Poly::<Scalar>::recover(3, &subset).unwrap();
                    assert_eq!(recovered, *secret.constant());
                    assert_eq!(
                        G1::times(&G1::one(), &recovered),
                        *share_set.commitment().constant()
                    );
                }
            }
        }

        // Two shares are not enough
        assert!(matches!(
            Poly::<Scalar>::recover(3, &shares[..2]),
            Err(crate::primitives::Error::NotEnoughEvaluations(3, 2))
        ));
    }

    #[test_case(5, 0; "minimum committee, no threshold")]
    #[test_case(5, 4; "minimum committee, maximum threshold")]
    #[test_case(7, 3; "larger committee")]
    fn test_deal_verify(n: usize, threshold: u32) {
        let mut rng = StdRng::seed_from_u64(n as u64 * 31 + threshold as u64);
        let (keys, players) = committee(&mut rng, n);
        let dealer = PlayerIndex::new(n as u16).unwrap();
        let share_set =
            TestShareSet::deal(&mut rng, NAMESPACE, threshold, dealer, &players).unwrap();
        share_set.verify(NAMESPACE, &players).unwrap();
        assert_eq!(share_set.shares().len(), n);
        assert_eq!(share_set.required(), threshold + 1);

        let last = PlayerIndex::new(n as u16).unwrap();
        let share = share_set
            .decrypt_checked(last, &keys[last.position()])
            .unwrap();
        assert_eq!(share.index, last);
    }

    #[test]
    fn test_public_shares() {
        let mut rng = StdRng::seed_from_u64(1);
        let (keys, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();
        let public_shares = share_set.public_shares();
        assert_eq!(public_shares.len(), 5);
        for (player, public_share) in PlayerIndex::all(5).zip(public_shares.iter()) {
            let share_commitment = share_set.commitment().evaluate(player).value;
            G1ToG2::verify_translation(&share_commitment, public_share).unwrap();

            let share = share_set
                .decrypt(player, &keys[player.position()], &share_commitment)
                .unwrap();
            assert_eq!(*public_share, G2::times(&G2::one(), &share.value));
        }
    }

    #[test]
    fn test_invalid_committee() {
        let mut rng = StdRng::seed_from_u64(2);
        let (_, players) = committee(&mut rng, 5);
        assert!(matches!(
            TestShareSet::deal(&mut rng, NAMESPACE, 1, dealer(), &players[..4]),
            Err(Error::InsufficientPlayers(4, MIN_PLAYERS))
        ));
        assert!(matches!(
            TestShareSet::deal(&mut rng, NAMESPACE, 5, dealer(), &players),
            Err(Error::ThresholdTooHigh(5, 5))
        ));
        let oversized = vec![G1::one(); MAX_PLAYERS + 1];
        assert!(matches!(
            TestShareSet::deal(&mut rng, NAMESPACE, 1, dealer(), &oversized),
            Err(Error::TooManyPlayers(_, MAX_PLAYERS))
        ));

        let mut with_identity = players.clone();
        with_identity[2] = G1::zero();
        assert!(matches!(
            TestShareSet::deal(&mut rng, NAMESPACE, 1, dealer(), &with_identity),
            Err(Error::InvalidPublicKey(player)) if player.get() == 3
        ));
    }

    #[test]
    fn test_verify_rejects() {
        init_tracing();
        let mut rng = StdRng::seed_from_u64(3);
        let (_, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();

        // Wrong namespace invalidates the first share
        assert!(matches!(
            share_set.verify(b"other", &players),
            Err(Error::ShareInvalid { player, .. }) if player.get() == 1
        ));

        // Wrong committee size
        let (_, mut extended) = committee(&mut rng, 6);
        extended[..5].copy_from_slice(&players);
        assert!(matches!(
            share_set.verify(NAMESPACE, &extended),
            Err(Error::PlayerCountMismatch(5, 6))
        ));

        // Swapped keys are attributed to the first mismatching player
        let mut swapped = players.clone();
        swapped.swap(1, 3);
        let err = share_set.verify(NAMESPACE, &swapped).unwrap_err();
        match err {
            Error::ShareInvalid { player, source } => {
                assert_eq!(player.get(), 2);
                assert!(matches!(
                    *source,
                    Error::ProofInvalid("encryption key mismatch")
                ));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        // Public key must match the commitment
        let mut forged = share_set.clone();
        forged.public_key = G2::one();
        assert!(matches!(
            forged.verify(NAMESPACE, &players),
            Err(Error::ProofInvalid("public key translation"))
        ));

        // A share moved to another player's slot is rejected
        let mut moved = share_set.clone();
        moved.shares.swap(0, 1);
        assert!(matches!(
            moved.verify(NAMESPACE, &players),
            Err(Error::ShareInvalid { player, .. }) if player.get() == 1
        ));
    }

    #[test]
    fn test_verify_small_committee() {
        let mut rng = StdRng::seed_from_u64(7);
        let (_, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 1, dealer(), &players).unwrap();

        // A set cut down to 3 shares is rejected even against a matching committee
        let mut truncated = share_set.clone();
        truncated.shares.truncate(3);
        assert!(matches!(
            truncated.verify(NAMESPACE, &players[..3]),
            Err(Error::InsufficientPlayers(3, MIN_PLAYERS))
        ));

        // The same holds for a set decoded from the wire
        let encoded = truncated.encode().freeze();
        let decoded = TestShareSet::decode_cfg(encoded.clone(), &3).unwrap();
        assert_eq!(decoded, truncated);
        assert!(matches!(
            TestShareSet::unmarshal(encoded, NAMESPACE, &players[..3]),
            Err(Error::InsufficientPlayers(3, MIN_PLAYERS))
        ));
    }

    #[test]
    fn test_decrypt_errors() {
        let mut rng = StdRng::seed_from_u64(4);
        let (keys, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();
        let first = PlayerIndex::new(1).unwrap();

        // Another player's key does not decrypt
        assert!(matches!(
            share_set.decrypt_checked(first, &keys[1]),
            Err(Error::UnknownPlaintext)
        ));

        // Index beyond the committee
        let outside = PlayerIndex::new(6).unwrap();
        assert!(matches!(
            share_set.decrypt_checked(outside, &keys[0]),
            Err(Error::IndexOutOfRange(6))
        ));
    }

    #[test]
    fn test_round_trip() {
        let mut rng = StdRng::seed_from_u64(5);
        let (_, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();
        let encoded = share_set.encode().freeze();
        assert_eq!(encoded.len(), share_set.encode_size());

        let decoded = TestShareSet::unmarshal(encoded.clone(), NAMESPACE, &players).unwrap();
        assert_eq!(decoded, share_set);

        // Decoding requires the committee size
        assert!(matches!(
            TestShareSet::decode_cfg(encoded.clone(), &6),
            Err(CodecError::InvalidLength(5))
        ));

        // Trailing bytes are rejected
        let mut extended = encoded.to_vec();
        extended.push(0);
        assert!(matches!(
            TestShareSet::unmarshal(Bytes::from(extended), NAMESPACE, &players),
            Err(Error::Codec(CodecError::ExtraData(1)))
        ));

        // Decoded data is verified
        assert!(matches!(
            TestShareSet::unmarshal(encoded, b"other", &players),
            Err(Error::ShareInvalid { .. })
        ));
    }

    #[test]
    fn test_tampered_encoding() {
        let mut rng = StdRng::seed_from_u64(6);
        let (_, players) = committee(&mut rng, 5);
        let share_set = TestShareSet::deal(&mut rng, NAMESPACE, 2, dealer(), &players).unwrap();
        let encoded = share_set.encode().freeze();

        // Offsets of the third share's binding proof and first membership proof
        let header = PlayerIndex::SIZE + share_set.commitment().encode_size() + 1 + 96 + 2;
        let share_size = share_set.shares()[0].encode_size();
        let cipher_text = header + 2 * share_size + 2;
        let binding_proof = cipher_text + 1 + Bls12381G1::NAME.len() + 2 + 48 + 2;
        let membership_proof = binding_proof + 64 + 2 + 2 * 48;
        for position in [binding_proof, binding_proof + 40, membership_proof + 100] {
            let mut tampered = encoded.to_vec();
            tampered[position] ^= 0x04;
            match TestShareSet::unmarshal(Bytes::from(tampered), NAMESPACE, &players) {
                Err(Error::ShareInvalid { player, source }) => {
                    assert_eq!(player.get(), 3);
                    assert!(matches!(*source, Error::ProofInvalid(_)));
                }
                other => panic!("tampering not detected: {:?}", other.map(|_| ())),
            }
        }

        // Tampering with the commitment breaks the public key translation or decoding
        let mut tampered = encoded.to_vec();
        tampered[PlayerIndex::SIZE + 2 + 10] ^= 0x01;
        assert!(TestShareSet::unmarshal(Bytes::from(tampered), NAMESPACE, &players).is_err());
    }
}
