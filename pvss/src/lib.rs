//! Deal, encrypt, and publicly verify shares of a secret over BLS12-381.
//!
//! A dealer samples a random polynomial of degree `t` whose constant term is the secret, commits
//! to its coefficients (Feldman), and encrypts the evaluation for each player to that player's
//! public key. Anyone holding the dealing, the namespace, and the players' public keys can check
//! that every encrypted share is consistent with the commitment without learning any share. A
//! player decrypts only its own share.
//!
//! # Encryption
//!
//! Each share (a 32-byte scalar) is split into 128 symbols of 2 bits. Every symbol is encrypted
//! with exponential ElGamal ([bit_pair]) and carries a proof that it is one of `{0, 1, 2, 3}`, so
//! decryption is a lookup in four precomputed points. The symbols are bound to the committed share
//! by a single proof of knowledge over the player's public key ([knowledge]): the weighted sum of
//! the symbol ciphertexts minus the share commitment must be a known multiple of the key.
//!
//! # Structure
//!
//! * [ShareSet]: a complete dealing (commitment, translated public key, one share per player).
//! * [share::Share]: a player's encrypted share plus the translation of its share into the
//!   target group.
//! * [cipher_text::CipherText]: the encrypted share and its binding proof.
//! * [bit_pair::BitPair]: one encrypted 2-bit symbol and its membership proof.
//!
//! # Example
//!
//! ```rust
//! use pvss::{
//!     primitives::{
//!         group::{Element, Point, Scalar, G1},
//!         poly::{Eval, Poly},
//!         suite::{Bls12381G1, G1ToG2},
//!     },
//!     PlayerIndex, ShareSet,
//! };
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(0);
//!
//! // Generate keys for 5 players
//! let keys = (0..5).map(|_| Scalar::rand(&mut rng)).collect::<Vec<_>>();
//! let players = keys
//!     .iter()
//!     .map(|sk| G1::times(&G1::one(), sk))
//!     .collect::<Vec<_>>();
//!
//! // Deal a secret recoverable by any 3 players
//! let dealer = PlayerIndex::new(1).unwrap();
//! let dealing =
//!     ShareSet::<Bls12381G1, G1ToG2>::deal(&mut rng, b"example", 2, dealer, &players).unwrap();
//!
//! // Anyone can verify the dealing
//! dealing.verify(b"example", &players).unwrap();
//!
//! // Each player decrypts its own share
//! let shares = PlayerIndex::all(5)
//!     .map(|player| dealing.decrypt_checked(player, &keys[player.position()]).unwrap())
//!     .collect::<Vec<Eval<Scalar>>>();
//!
//! // Any 3 shares recover the committed secret
//! let secret = Poly::<Scalar>::recover(3, &shares[2..]).unwrap();
//! assert_eq!(G1::times(&G1::one(), &secret), *dealing.commitment().constant());
//! ```
//!
//! # Status
//!
//! `pvss` is **ALPHA** software and is not yet recommended for production use. Developers should
//! expect breaking changes and occasional instability.

use thiserror::Error;

pub mod bit_pair;
pub mod cipher_text;
pub mod knowledge;
pub mod player;
pub use player::PlayerIndex;
pub mod primitives;
pub mod share;
pub mod share_set;
pub use share_set::{DealWithWitness, ShareSet};

/// Minimum number of players in a committee.
pub const MIN_PLAYERS: usize = 5;

/// Maximum number of players in a committee.
pub const MAX_PLAYERS: usize = 1 << 15;

/// Maximum length of an encrypted plaintext, in bytes.
pub const MAX_PLAINTEXT_BYTES: usize = 32;

/// Number of bit pairs that encode one byte.
pub const PAIRS_PER_BYTE: usize = 4;

/// Maximum number of bit pairs in a ciphertext.
pub const MAX_PAIRS: usize = MAX_PLAINTEXT_BYTES * PAIRS_PER_BYTE;

/// Errors that can occur when dealing, verifying, or decrypting shares.
#[derive(Error, Debug)]
pub enum Error {
    #[error("insufficient players: {0} < {1}")]
    InsufficientPlayers(usize, usize),
    #[error("too many players: {0} > {1}")]
    TooManyPlayers(usize, usize),
    #[error("threshold too high: {0} >= {1}")]
    ThresholdTooHigh(u32, usize),
    #[error("index out of range: {0}")]
    IndexOutOfRange(usize),
    #[error("invalid symbol: {0}")]
    InvalidSymbol(u8),
    #[error("invalid public key for player {0}")]
    InvalidPublicKey(PlayerIndex),
    #[error("player count mismatch: {0} != {1}")]
    PlayerCountMismatch(usize, usize),
    #[error("invalid plaintext length: {0}")]
    InvalidPlaintextLength(usize),
    #[error("too many pairs: {0} > {1}")]
    TooManyPairs(usize, usize),
    #[error("decrypted point is not a known plaintext")]
    UnknownPlaintext,
    #[error("decrypted share does not match commitment")]
    ShareMismatch,
    #[error("invalid proof: {0}")]
    ProofInvalid(&'static str),
    #[error("invalid share for player {player}: {source}")]
    ShareInvalid {
        player: PlayerIndex,
        #[source]
        source: Box<Error>,
    },
    #[error("codec: {0}")]
    Codec(#[from] pvss_codec::Error),
    #[error("primitives: {0}")]
    Primitives(#[from] primitives::Error),
}

/// Runs `check` on values this crate just produced and panics if it fails.
///
/// Enabled in debug builds and with the `self-verify` feature. A failure means the dealer's own
/// output is malformed, which is a bug rather than a recoverable condition.
#[cfg(any(debug_assertions, feature = "self-verify"))]
pub(crate) fn self_verify(what: &str, check: impl FnOnce() -> Result<(), Error>) {
    if let Err(err) = check() {
        panic!("{} failed self-verification: {}", what, err);
    }
}

/// No-op in release builds without the `self-verify` feature.
#[cfg(not(any(debug_assertions, feature = "self-verify")))]
#[inline(always)]
pub(crate) fn self_verify(_: &str, _: impl FnOnce() -> Result<(), Error>) {}
