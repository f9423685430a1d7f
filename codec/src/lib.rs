//! Serialize PVSS artifacts.
//!
//! # Overview
//!
//! A binary serialization library designed to:
//! - Serialize structured data into a canonical binary format
//! - Deserialize untrusted binary input into structured data
//!
//! Every field has a width known from the layout: integers are fixed-width big-endian and
//! variable-length payloads carry an explicit `u8` or `u16` length prefix (see [prefixed]).
//! There are no varints and no implicit terminators.
//!
//! # Example
//!
//! ```
//! use bytes::{Buf, BufMut};
//! use pvss_codec::{prefixed, DecodeExt, Encode, EncodeSize, Error, RangeCfg, Read, ReadExt, Write};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Item {
//!     index: u16,
//!     payload: Vec<u8>,
//! }
//!
//! impl Write for Item {
//!     fn write(&self, buf: &mut impl BufMut) {
//!         self.index.write(buf);
//!         prefixed::write_bytes::<u8>(&self.payload, buf);
//!     }
//! }
//!
//! impl Read for Item {
//!     type Cfg = ();
//!
//!     fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
//!         let index = u16::read(buf)?;
//!         let payload = prefixed::read_bytes::<u8>(buf, &RangeCfg::from(..=32))?.to_vec();
//!         Ok(Self { index, payload })
//!     }
//! }
//!
//! impl EncodeSize for Item {
//!     fn encode_size(&self) -> usize {
//!         self.index.encode_size() + prefixed::bytes_size::<u8>(self.payload.len())
//!     }
//! }
//!
//! let item = Item { index: 3, payload: vec![1, 2, 3] };
//! assert_eq!(Item::decode(item.encode()).unwrap(), item);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod types {
    pub mod prefixed;
    pub mod primitives;
}

// Re-export main types and traits
pub use codec::{
    at_least, Codec, Decode, DecodeExt, Encode, EncodeSize, FixedSize, Read, ReadExt, Write,
};
pub use config::RangeCfg;
pub use error::Error;
pub use types::prefixed;
