//! Patch applicator (C7).

use std::io::{self, Write};

use log::debug;

use crate::bsdiff::{LEGACY_MAGIC, MAGIC};
use crate::codec;
use crate::error::{check_length, DeltaError};
use crate::varint;

/// Cheap syntactic header check: magic present, declared lengths
/// non-negative and in bounds. Does not decompress anything.
pub fn bspatch_valid_header(patch: &[u8]) -> bool {
    parse_header(patch).is_ok()
}

/// Reads the declared target size from a patch header, or `-1` if the
/// header is not valid.
pub fn bspatch_newsize(patch: &[u8]) -> i64 {
    match parse_header(patch) {
        Ok(h) => h.new_size,
        Err(_) => -1,
    }
}

struct Header<'p> {
    new_size: i64,
    ctrl_bytes: &'p [u8],
    diff_bytes: &'p [u8],
    extra_bytes: &'p [u8],
}

fn parse_header(patch: &[u8]) -> Result<Header<'_>, DeltaError> {
    if patch.len() < 32 {
        return Err(DeltaError::InvalidHeader("patch shorter than 32 bytes"));
    }
    let magic = &patch[0..8];
    if magic != MAGIC && magic != LEGACY_MAGIC {
        return Err(DeltaError::InvalidHeader("unrecognized magic"));
    }

    let ctrl_len = varint::decode_int(&patch[8..16]);
    let diff_len = varint::decode_int(&patch[16..24]);
    let new_size = varint::decode_int(&patch[24..32]);
    if ctrl_len < 0 || diff_len < 0 || new_size < 0 {
        return Err(DeltaError::InvalidHeader("negative length in header"));
    }

    let rest = patch.len() as i64 - 32;
    if ctrl_len > rest || diff_len > rest - ctrl_len {
        return Err(DeltaError::InvalidHeader("declared stream lengths exceed patch length"));
    }

    let ctrl_start = 32usize;
    let ctrl_end = ctrl_start + ctrl_len as usize;
    let diff_end = ctrl_end + diff_len as usize;

    Ok(Header {
        new_size,
        ctrl_bytes: &patch[ctrl_start..ctrl_end],
        diff_bytes: &patch[ctrl_end..diff_end],
        extra_bytes: &patch[diff_end..],
    })
}

/// Parsed and decompressed patch, ready to be applied against any source
/// buffer that matches what it was generated from.
pub struct Bspatch {
    new_size: i64,
    ctrl: Vec<u8>,
    diff: Vec<u8>,
    extra: Vec<u8>,
}

impl Bspatch {
    /// Parses the header and eagerly decompresses the three streams.
    /// Fails if the header is malformed or a stream fails to decompress
    /// within its size bound.
    pub fn new(patch: &[u8]) -> io::Result<Self> {
        let header = parse_header(patch).map_err(io::Error::from)?;
        check_length(header.new_size as usize).map_err(io::Error::from)?;

        let ctrl_cap = (header.new_size as u64)
            .saturating_add(1)
            .saturating_mul(3 * varint::SIZE as u64) as usize;
        let ctrl = codec::decompress(header.ctrl_bytes, ctrl_cap).map_err(io::Error::from)?;
        if ctrl.len() % (3 * varint::SIZE) != 0 {
            return Err(
                DeltaError::Codec("control stream size is not a multiple of one triple").into(),
            );
        }

        let stream_cap = header.new_size as usize;
        let diff = codec::decompress(header.diff_bytes, stream_cap).map_err(io::Error::from)?;
        let extra = codec::decompress(header.extra_bytes, stream_cap).map_err(io::Error::from)?;

        debug!(
            "bspatch: {} control bytes, {} diff bytes, {} extra bytes (raw)",
            ctrl.len(),
            diff.len(),
            extra.len()
        );

        Ok(Bspatch {
            new_size: header.new_size,
            ctrl,
            diff,
            extra,
        })
    }

    /// Hints the final target size, for preallocating the output buffer.
    pub fn hint_target_size(&self) -> u64 {
        self.new_size as u64
    }

    /// Replays the edit script against `old`, writing the reconstructed
    /// bytes to `target`. Returns the number of bytes written.
    ///
    /// `out` is never sized directly from the header's declared `new_size`:
    /// that field is untrusted (a single bit flip can turn it into an
    /// absurd value) and `vec![0u8; new_size]` would abort the process
    /// rather than fail gracefully. Instead `out` is reserved only up to
    /// `diff.len() + extra.len()` — bytes already decompressed and sitting
    /// in memory — and grown by pushing/extending as triples are replayed,
    /// so it can never exceed what the (bounds-checked) streams actually
    /// contain.
    pub fn apply<T: Write>(&self, old: &[u8], mut target: T) -> io::Result<u64> {
        check_length(old.len()).map_err(io::Error::from)?;

        let new_size = self.new_size;
        let mut out = Vec::new();
        out.try_reserve_exact(self.diff.len() + self.extra.len())
            .map_err(|_| DeltaError::ResourceExhausted("could not allocate output buffer"))?;

        let mut ctrl_pos = 0usize;
        let mut diff_pos = 0usize;
        let mut extra_pos = 0usize;
        let mut oldpos: i64 = 0;
        let mut newpos: i64 = 0;

        while newpos < new_size {
            if ctrl_pos + 3 * varint::SIZE > self.ctrl.len() {
                return Err(DeltaError::ScriptUnderrun.into());
            }
            let add = varint::decode_int(&self.ctrl[ctrl_pos..ctrl_pos + 8]);
            let copy = varint::decode_int(&self.ctrl[ctrl_pos + 8..ctrl_pos + 16]);
            let seek = varint::decode_int(&self.ctrl[ctrl_pos + 16..ctrl_pos + 24]);
            ctrl_pos += 3 * varint::SIZE;

            if add < 0 || copy < 0 {
                return Err(DeltaError::ScriptBounds("negative add/copy length").into());
            }
            if newpos + add > new_size {
                return Err(DeltaError::ScriptBounds("add run overruns target size").into());
            }
            if oldpos + add > old.len() as i64 {
                return Err(DeltaError::ScriptBounds("add run overruns source size").into());
            }
            if newpos + add + copy > new_size {
                return Err(DeltaError::ScriptBounds("copy run overruns target size").into());
            }
            if diff_pos + add as usize > self.diff.len() {
                return Err(DeltaError::ScriptUnderrun.into());
            }
            if extra_pos + copy as usize > self.extra.len() {
                return Err(DeltaError::ScriptUnderrun.into());
            }

            for i in 0..add as usize {
                let op = oldpos + i as i64;
                let base = if op >= 0 && (op as usize) < old.len() {
                    old[op as usize]
                } else {
                    0
                };
                out.push(base.wrapping_add(self.diff[diff_pos + i]));
            }
            diff_pos += add as usize;
            newpos += add;
            oldpos += add;

            if copy > 0 {
                let n = copy as usize;
                out.extend_from_slice(&self.extra[extra_pos..extra_pos + n]);
                extra_pos += n;
            }
            newpos += copy;
            oldpos += seek;
        }

        if ctrl_pos != self.ctrl.len() || diff_pos != self.diff.len() || extra_pos != self.extra.len() {
            return Err(DeltaError::ScriptBounds("trailing unconsumed stream data").into());
        }

        target.write_all(&out)?;
        target.flush()?;
        Ok(out.len() as u64)
    }
}
