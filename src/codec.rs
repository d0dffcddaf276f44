//! Block codec adapter (C1).
//!
//! The container format does not carry a codec identifier, so the choice of
//! block codec is fixed per build. This crate uses bzip2; any `(src,
//! src_len, dst, dst_cap) -> out_len`-shaped LZ-family codec would satisfy
//! the container's contract.
use std::io::{Read, Write};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;

pub use bzip2::Compression;

use crate::error::{DeltaError, Result};

/// Compresses `data` as one complete block.
pub fn compress(level: Compression, data: &[u8]) -> Result<Vec<u8>> {
    let mut enc = BzEncoder::new(Vec::new(), level);
    enc.write_all(data)
        .map_err(|_| DeltaError::Codec("bzip2 compression failed"))?;
    enc.finish()
        .map_err(|_| DeltaError::Codec("bzip2 compression failed"))
}

/// Decompresses `data`, refusing to produce more than `max_len` bytes.
///
/// `max_len` is the caller's a-priori bound on the raw stream size (for
/// example the declared target size); exceeding it signals a corrupt or
/// hostile patch rather than a legitimate one, so it is treated as a codec
/// failure rather than silently truncated.
pub fn decompress(data: &[u8], max_len: usize) -> Result<Vec<u8>> {
    let mut dec = BzDecoder::new(data);
    let mut out = Vec::new();
    let read = (&mut dec)
        .take(max_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|_| DeltaError::Codec("bzip2 decompression failed"))?;
    if read > max_len {
        return Err(DeltaError::Codec("decompressed stream exceeds declared bound"));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(64);
        let packed = compress(Compression::Default, &data).unwrap();
        let unpacked = decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn rejects_bound_violation() {
        let data = vec![7u8; 4096];
        let packed = compress(Compression::Default, &data).unwrap();
        assert!(decompress(&packed, 10).is_err());
    }
}
