//! Multi-patch container (C8): batches N independent old/new pairs behind a
//! single addressable archive.
//!
//! Absent from the upstream crate this workspace grew out of; restored here
//! because the upstream C sources this format was distilled from carry it,
//! and a delta engine for firmware-style update scenarios routinely needs to
//! batch many independent chunks into one artifact.

use std::io;

use log::debug;

use crate::bsdiff::{bsdiff_patchsize_max, Bsdiff, Compression, LEVEL};
use crate::bspatch::Bspatch;
use crate::control::DISMATCH_COUNT;
use crate::error::{check_length, DeltaError};
use crate::varint;

/// Magic for multi-patch containers.
pub const MAGIC: &[u8; 8] = b"MPATCH01";

const HEADER_SIZE: usize = 24;
const ENTRY_SIZE: usize = 4 * varint::SIZE;

/// One entry in a multi-patch container's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    patch_offset: i64,
    patch_size: i64,
    input_size: i64,
    output_size: i64,
}

/// Builds multi-patch containers out of independent old/new pairs.
///
/// Mirrors [`Bsdiff`]'s builder shape; unlike `Bsdiff`, each pair carries its
/// own suffix array, so this holds configuration only, not per-pair state.
pub struct Multidiff {
    dismatch: usize,
    level: Compression,
}

impl Default for Multidiff {
    fn default() -> Self {
        Multidiff {
            dismatch: DISMATCH_COUNT,
            level: LEVEL,
        }
    }
}

impl Multidiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dismatch_count(mut self, n: usize) -> Self {
        self.dismatch = n.max(1);
        self
    }

    pub fn compression_level(mut self, level: Compression) -> Self {
        self.level = level;
        self
    }

    /// Computes one single-patch blob per `(old, new)` pair and assembles
    /// them into a multi-patch container.
    pub fn compare(&self, pairs: &[(&[u8], &[u8])]) -> io::Result<Vec<u8>> {
        check_length(pairs.len()).map_err(io::Error::from)?;

        let mut blobs = Vec::with_capacity(pairs.len());
        let mut total_newsize: i64 = 0;
        for (old, new) in pairs {
            let cap = bsdiff_patchsize_max(old.len() as i64, new.len() as i64) as usize;
            let mut blob = Vec::with_capacity(cap);
            let bsdiff = Bsdiff::new(old)?.dismatch_count(self.dismatch).compression_level(self.level);
            bsdiff.compare(new, &mut blob)?;
            total_newsize += new.len() as i64;
            blobs.push((blob, old.len() as i64, new.len() as i64));
        }

        let mut out = vec![0u8; HEADER_SIZE];
        out[0..8].copy_from_slice(MAGIC);
        varint::encode_int(pairs.len() as i64, &mut out[8..16]);
        varint::encode_int(total_newsize, &mut out[16..24]);

        let index_size = pairs.len() * ENTRY_SIZE;
        out.resize(HEADER_SIZE + index_size, 0);

        let mut offset = (HEADER_SIZE + index_size) as i64;
        for (i, (blob, input_size, output_size)) in blobs.iter().enumerate() {
            let entry_at = HEADER_SIZE + i * ENTRY_SIZE;
            varint::encode_int(offset, &mut out[entry_at..entry_at + 8]);
            varint::encode_int(blob.len() as i64, &mut out[entry_at + 8..entry_at + 16]);
            varint::encode_int(*input_size, &mut out[entry_at + 16..entry_at + 24]);
            varint::encode_int(*output_size, &mut out[entry_at + 24..entry_at + 32]);
            offset += blob.len() as i64;
        }
        for (blob, _, _) in &blobs {
            out.extend_from_slice(blob);
        }

        debug!(
            "multidiff: {} entries, {} bytes total",
            pairs.len(),
            out.len()
        );
        Ok(out)
    }
}

/// Parses and applies a multi-patch container.
pub struct Multipatch<'c> {
    container: &'c [u8],
    entries: Vec<Entry>,
    total_newsize: i64,
}

impl<'c> Multipatch<'c> {
    /// Validates the header and index against the container's invariants:
    /// in-bounds offsets, `patch_offset + patch_size <= container_size`, and
    /// `sum(output_size) == total_newsize`.
    pub fn new(container: &'c [u8]) -> io::Result<Self> {
        if container.len() < HEADER_SIZE {
            return Err(DeltaError::InvalidHeader("multi-patch container shorter than header").into());
        }
        if &container[0..8] != MAGIC {
            return Err(DeltaError::InvalidHeader("unrecognized multi-patch magic").into());
        }

        let num_patches = varint::decode_int(&container[8..16]);
        let total_newsize = varint::decode_int(&container[16..24]);
        if num_patches < 0 || total_newsize < 0 {
            return Err(DeltaError::InvalidHeader("negative count in multi-patch header").into());
        }
        check_length(num_patches as usize).map_err(io::Error::from)?;

        let index_size = num_patches as usize * ENTRY_SIZE;
        let index_end = HEADER_SIZE
            .checked_add(index_size)
            .ok_or_else(|| DeltaError::InvalidHeader("entry index overflows container size"))?;
        if index_end > container.len() {
            return Err(DeltaError::InvalidHeader("entry index overruns container").into());
        }

        let mut entries = Vec::with_capacity(num_patches as usize);
        let mut output_sum: i64 = 0;
        for i in 0..num_patches as usize {
            let at = HEADER_SIZE + i * ENTRY_SIZE;
            let patch_offset = varint::decode_int(&container[at..at + 8]);
            let patch_size = varint::decode_int(&container[at + 8..at + 16]);
            let input_size = varint::decode_int(&container[at + 16..at + 24]);
            let output_size = varint::decode_int(&container[at + 24..at + 32]);

            if patch_offset < 0 || patch_size < 0 || input_size < 0 || output_size < 0 {
                return Err(DeltaError::InvalidHeader("negative field in multi-patch entry").into());
            }
            let end = patch_offset
                .checked_add(patch_size)
                .ok_or_else(|| DeltaError::InvalidHeader("entry patch range overflows"))?;
            if end > container.len() as i64 {
                return Err(DeltaError::InvalidHeader("entry patch range out of bounds").into());
            }

            output_sum += output_size;
            entries.push(Entry {
                patch_offset,
                patch_size,
                input_size,
                output_size,
            });
        }

        if output_sum != total_newsize {
            return Err(DeltaError::InvalidHeader(
                "sum of entry output sizes does not match declared total",
            )
            .into());
        }

        Ok(Multipatch {
            container,
            entries,
            total_newsize,
        })
    }

    /// Declared total size of the concatenated output.
    pub fn hint_target_size(&self) -> u64 {
        self.total_newsize as u64
    }

    /// Applies every entry to its slice of `input` and concatenates the
    /// results.
    ///
    /// Entry `i`'s slice of `input` is determined by summing `input_size`
    /// sequentially: entry 0 gets `input[0..input_size_0]`, entry 1 gets
    /// `input[input_size_0..input_size_0 + input_size_1]`, and so on. A
    /// container whose entries' `input_size` fields do not sum to
    /// `input.len()` is rejected before any patch is applied.
    pub fn apply(&self, input: &[u8]) -> io::Result<Vec<u8>> {
        let mut input_sum: i64 = 0;
        for e in &self.entries {
            input_sum = input_sum
                .checked_add(e.input_size)
                .ok_or_else(|| io::Error::from(DeltaError::InvalidHeader("entry input sizes overflow")))?;
        }
        if input_sum != input.len() as i64 {
            return Err(DeltaError::InvalidHeader(
                "sum of entry input sizes does not match supplied input length",
            )
            .into());
        }

        let mut out = Vec::with_capacity(self.total_newsize as usize);
        let mut input_cursor = 0usize;
        for (i, e) in self.entries.iter().enumerate() {
            let input_slice = &input[input_cursor..input_cursor + e.input_size as usize];
            input_cursor += e.input_size as usize;

            let blob = &self.container[e.patch_offset as usize..(e.patch_offset + e.patch_size) as usize];
            let patch = Bspatch::new(blob)?;
            if patch.hint_target_size() != e.output_size as u64 {
                return Err(DeltaError::InvalidHeader(
                    "entry patch's declared size disagrees with its index entry",
                )
                .into());
            }

            let before = out.len();
            patch.apply(input_slice, &mut out)?;
            debug!(
                "multipatch: entry {} applied, {} -> {} bytes",
                i,
                input_slice.len(),
                out.len() - before
            );
        }

        Ok(out)
    }
}
