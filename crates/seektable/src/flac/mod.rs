//! Decoders for the parts of a flac stream we need to find frames

pub mod frameheader;
pub mod metablock;
pub mod streaminfo;

#[cfg(test)]
pub(crate) mod testutil;

/// The four bytes every flac stream starts with
pub const MAGIC: [u8; 4] = [0x66, 0x4C, 0x61, 0x43];
