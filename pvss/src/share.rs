//! A single player's encrypted share and the public translation of its commitment.

use crate::{
    cipher_text::CipherText,
    primitives::{
        group::{Point, Scalar},
        poly::{Eval, Poly, Private},
        suite::{Group, PointTranslation},
    },
    self_verify, Error, PlayerIndex,
};
use bytes::{Buf, BufMut};
use pvss_codec::{
    prefixed, Decode, Encode, EncodeSize, Error as CodecError, FixedSize, RangeCfg, Read, Write,
};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

/// An encrypted share addressed to one player, together with `s·T` for the player's share `s`
/// (so anyone can check the share against the dealer's commitment without decrypting it).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Share<G: Group, T: PointTranslation<Source = G::Point>> {
    cipher_text: CipherText<G>,
    encryption_key: G::Point,
    sub_key_translation: T::Target,
}

impl<G: Group, T: PointTranslation<Source = G::Point>> Share<G, T> {
    /// Encrypts the evaluation of `secret` at `receiver` to `pk`.
    pub fn new<R: RngCore + CryptoRng>(
        rng: &mut R,
        domain: &[u8],
        secret: &Private,
        receiver: PlayerIndex,
        pk: &G::Point,
    ) -> Result<Self, Error> {
        let (cipher_text, mut share) =
            CipherText::<G>::encrypt(rng, domain, secret, receiver, pk)?;
        let sub_key_translation = T::translate(&share.value);
        let result = Self {
            cipher_text,
            encryption_key: *pk,
            sub_key_translation,
        };
        self_verify("share", || {
            let share_commitment = G::Point::times(&G::generator(), &share.value);
            result.verify_share(domain, &share_commitment, receiver, pk)
        });
        share.value.zeroize();
        Ok(result)
    }

    /// Verifies the share for `receiver` against the dealer's polynomial commitment.
    pub fn verify(
        &self,
        domain: &[u8],
        commitment: &Poly<G::Point>,
        receiver: PlayerIndex,
        pk: &G::Point,
    ) -> Result<(), Error> {
        let share_commitment = commitment.evaluate(receiver).value;
        self.verify_share(domain, &share_commitment, receiver, pk)
    }

    /// Verifies the share against an already evaluated share commitment.
    pub(crate) fn verify_share(
        &self,
        domain: &[u8],
        share_commitment: &G::Point,
        receiver: PlayerIndex,
        pk: &G::Point,
    ) -> Result<(), Error> {
        if self.encryption_key != *pk {
            return Err(Error::ProofInvalid("encryption key mismatch"));
        }
        T::verify_translation(share_commitment, &self.sub_key_translation)
            .map_err(|_| Error::ProofInvalid("share translation"))?;
        self.cipher_text.verify(domain, receiver, pk, share_commitment)
    }

    /// Decrypts the share and checks it against `share_commitment`.
    pub fn decrypt(
        &self,
        sk: &Scalar,
        share_commitment: &G::Point,
    ) -> Result<Eval<Scalar>, Error> {
        let share = self.cipher_text.decrypt(sk)?;
        if G::Point::times(&G::generator(), &share.value) != *share_commitment {
            return Err(Error::ShareMismatch);
        }
        Ok(share)
    }

    /// Returns the encrypted share.
    pub fn cipher_text(&self) -> &CipherText<G> {
        &self.cipher_text
    }

    /// Returns the key the share is encrypted to.
    pub fn encryption_key(&self) -> &G::Point {
        &self.encryption_key
    }

    /// Returns the share translated into the target group.
    pub fn sub_key_translation(&self) -> &T::Target {
        &self.sub_key_translation
    }
}

/// Reads a length-prefixed point, requiring the prefix to match the point size exactly.
pub(crate) fn read_point<P: Point>(buf: &mut impl Buf) -> Result<P, CodecError> {
    let bytes = prefixed::read_bytes::<u8>(buf, &RangeCfg::exact(P::SIZE))?;
    P::decode_cfg(bytes, &())
}

impl<G: Group, T: PointTranslation<Source = G::Point>> Write for Share<G, T> {
    fn write(&self, buf: &mut impl BufMut) {
        prefixed::write_bytes::<u16>(&self.cipher_text.encode(), buf);
        prefixed::write_bytes::<u8>(&self.encryption_key.encode(), buf);
        prefixed::write_bytes::<u8>(&self.sub_key_translation.encode(), buf);
    }
}

impl<G: Group, T: PointTranslation<Source = G::Point>> Read for Share<G, T> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let cipher_text = prefixed::read_bytes::<u16>(buf, &RangeCfg::from(..))?;
        let cipher_text = CipherText::<G>::decode_cfg(cipher_text, &())?;
        let encryption_key = read_point::<G::Point>(buf)?;
        let sub_key_translation = read_point::<T::Target>(buf)?;
        Ok(Self {
            cipher_text,
            encryption_key,
            sub_key_translation,
        })
    }
}

impl<G: Group, T: PointTranslation<Source = G::Point>> EncodeSize for Share<G, T> {
    fn encode_size(&self) -> usize {
        prefixed::bytes_size::<u16>(self.cipher_text.encode_size())
            + prefixed::bytes_size::<u8>(G::Point::SIZE)
            + prefixed::bytes_size::<u8>(T::Target::SIZE)
    }
}
