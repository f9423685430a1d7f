//! Identifiers for committee members.

use crate::{primitives::group::Scalar, Error, MAX_PLAYERS};
use bytes::{Buf, BufMut};
use pvss_codec::{Error as CodecError, FixedSize, Read, ReadExt, Write};
use std::fmt;

/// A 1-based position in the committee, in `[1, MAX_PLAYERS]`.
///
/// Dealers are identified the same way. Zero is never a valid index (it is the evaluation point
/// of the secret), so every constructed value is non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerIndex(u16);

impl PlayerIndex {
    /// Creates a new index, failing if it is zero or exceeds [MAX_PLAYERS].
    pub fn new(index: u16) -> Result<Self, Error> {
        if index == 0 || index as usize > MAX_PLAYERS {
            return Err(Error::IndexOutOfRange(index as usize));
        }
        Ok(Self(index))
    }

    /// Returns the index of the member at 0-based `position` in committee order.
    pub fn from_position(position: usize) -> Result<Self, Error> {
        let index = position
            .checked_add(1)
            .and_then(|index| u16::try_from(index).ok())
            .ok_or(Error::IndexOutOfRange(position.saturating_add(1)))?;
        Self::new(index)
    }

    /// Returns every index in `1..=n`, stopping at [MAX_PLAYERS].
    pub fn all(n: u16) -> impl Iterator<Item = Self> {
        (1..=n.min(MAX_PLAYERS as u16)).map(Self)
    }

    /// Returns the raw index.
    pub fn get(&self) -> u16 {
        self.0
    }

    /// Returns the 0-based position in committee order.
    pub fn position(&self) -> usize {
        self.0 as usize - 1
    }

    /// Returns the index as a field element (the x-coordinate of this player's evaluation).
    pub fn scalar(&self) -> Scalar {
        Scalar::from_u64(self.0 as u64)
    }

    /// Returns the item belonging to this player in a committee-ordered slice.
    pub fn index_into<'a, T>(&self, items: &'a [T]) -> Result<&'a T, Error> {
        items
            .get(self.position())
            .ok_or(Error::IndexOutOfRange(self.0 as usize))
    }

    /// Returns the big-endian encoding of the index.
    pub fn to_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for PlayerIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Write for PlayerIndex {
    fn write(&self, buf: &mut impl BufMut) {
        self.0.write(buf);
    }
}

impl Read for PlayerIndex {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, CodecError> {
        let index = u16::read(buf)?;
        Self::new(index).map_err(|_| CodecError::Invalid("PlayerIndex", "out of range"))
    }
}

impl FixedSize for PlayerIndex {
    const SIZE: usize = u16::SIZE;
}
