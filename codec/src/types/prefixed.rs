//! Explicitly length-prefixed byte strings and sequences.
//!
//! A length prefix is a fixed-width big-endian integer ([u8] or [u16]) that precedes the
//! payload. Readers bound every declared length with a [RangeCfg] before allocating.

use crate::{at_least, EncodeSize, Error, FixedSize, RangeCfg, Read, ReadExt, Write};
use bytes::{Buf, BufMut, Bytes};

/// A fixed-width integer used as a length prefix.
pub trait Prefix: Write + ReadExt + FixedSize + Copy + Into<usize> + TryFrom<usize> {
    /// Human-readable name used in panics and errors.
    const NAME: &'static str;
}

impl Prefix for u8 {
    const NAME: &'static str = "u8";
}

impl Prefix for u16 {
    const NAME: &'static str = "u16";
}

fn write_len<P: Prefix>(len: usize, buf: &mut impl BufMut) {
    let Ok(prefix) = P::try_from(len) else {
        panic!("length {} does not fit a {} prefix", len, P::NAME);
    };
    prefix.write(buf);
}

fn read_len<P: Prefix>(buf: &mut impl Buf, range: &RangeCfg) -> Result<usize, Error> {
    let len: usize = P::read(buf)?.into();
    if !range.contains(len) {
        return Err(Error::InvalidLength(len));
    }
    Ok(len)
}

/// Writes `bytes` preceded by its length.
///
/// Panics if the length does not fit in `P`.
pub fn write_bytes<P: Prefix>(bytes: &[u8], buf: &mut impl BufMut) {
    write_len::<P>(bytes.len(), buf);
    buf.put_slice(bytes);
}

/// Reads a length-prefixed byte string whose length must fall in `range`.
pub fn read_bytes<P: Prefix>(buf: &mut impl Buf, range: &RangeCfg) -> Result<Bytes, Error> {
    let len = read_len::<P>(buf, range)?;
    at_least(buf, len)?;
    Ok(buf.copy_to_bytes(len))
}

/// Returns the encoded size of a length-prefixed byte string of `len` bytes.
pub fn bytes_size<P: Prefix>(len: usize) -> usize {
    P::SIZE + len
}

/// Writes `items` preceded by their count.
///
/// Panics if the count does not fit in `P`.
pub fn write_seq<P: Prefix, T: Write>(items: &[T], buf: &mut impl BufMut) {
    write_len::<P>(items.len(), buf);
    for item in items {
        item.write(buf);
    }
}

/// Reads a count-prefixed sequence whose count must fall in `range`.
pub fn read_seq<P: Prefix, T: Read>(
    buf: &mut impl Buf,
    range: &RangeCfg,
    cfg: &T::Cfg,
) -> Result<Vec<T>, Error> {
    let len = read_len::<P>(buf, range)?;
    let mut items = Vec::with_capacity(len);
    for _ in 0..len {
        items.push(T::read_cfg(buf, cfg)?);
    }
    Ok(items)
}

/// Returns the encoded size of a count-prefixed sequence.
pub fn seq_size<P: Prefix, T: EncodeSize>(items: &[T]) -> usize {
    P::SIZE + items.iter().map(EncodeSize::encode_size).sum::<usize>()
}
