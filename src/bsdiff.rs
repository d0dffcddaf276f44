//! Diff engine (C5) and single-patch container writer (C6).

use std::io::{self, Write};
use std::ops::Range;

use log::debug;

pub use crate::codec::Compression;
use crate::codec;
use crate::control::{Control, DISMATCH_COUNT};
use crate::error::check_length;
use crate::suffix::SuffixArray;
use crate::varint;

/// Preferred magic for patches written by this crate.
pub const MAGIC: &[u8; 8] = b"MBSDIF43";
/// Legacy magic accepted (but never written) for bsdiff 4.x compatibility.
pub const LEGACY_MAGIC: &[u8; 8] = b"BSDIFF40";

/// Default compression level.
pub const LEVEL: Compression = Compression::Default;

/// Conservative upper bound on the size of `bsdiff(old, new)`'s output, for
/// any `old`/`new` of the given sizes.
///
/// `old_size` is accepted for symmetry with the historical C API; the bound
/// depends only on `new_size` because the control stream is sized off the
/// number of edits against the new file, never against the old one.
pub fn bsdiff_patchsize_max(_old_size: i64, new_size: i64) -> i64 {
    let new_size = new_size.max(0);
    // Worst case: one control triple per byte of output, plus the
    // terminating triple.
    let ctrl_raw = (new_size.saturating_add(1)).saturating_mul(3 * varint::SIZE as i64);
    let diff_raw = new_size;
    let extra_raw = new_size;

    let expand = |raw: i64| raw.saturating_add(raw / 255).saturating_add(16);
    32 + expand(ctrl_raw) + expand(diff_raw) + expand(extra_raw)
}

/// Memory-saving bsdiff 4.x compatible delta compressor.
///
/// Builds the suffix array over `old` eagerly; [`Bsdiff::compare`] may then
/// be called against any number of `new` buffers.
pub struct Bsdiff<'s> {
    old: &'s [u8],
    sa: SuffixArray,
    dismatch: usize,
    level: Compression,
}

impl<'s> Bsdiff<'s> {
    /// Prepares for delta compression and immediately sorts the suffix
    /// array. Fails if `old` exceeds the supported 63-bit length.
    pub fn new(old: &'s [u8]) -> io::Result<Self> {
        let sa = SuffixArray::new(old).map_err(io::Error::from)?;
        Ok(Bsdiff {
            old,
            sa,
            dismatch: DISMATCH_COUNT,
            level: LEVEL,
        })
    }

    /// Sets the dismatch threshold (`n >= 1`, default [`DISMATCH_COUNT`]):
    /// a newly found match is only preferred over extending the current one
    /// once it beats it by more than `n` bytes.
    pub fn dismatch_count(mut self, n: usize) -> Self {
        self.dismatch = n.max(1);
        self
    }

    /// Sets the bzip2 compression level (default [`LEVEL`]).
    pub fn compression_level(mut self, level: Compression) -> Self {
        self.level = level;
        self
    }

    /// Computes the delta from `old` to `new` and writes a bsdiff 4.x
    /// compatible patch to `patch`. Returns the number of bytes written.
    pub fn compare<P: Write>(&self, new: &[u8], mut patch: P) -> io::Result<u64> {
        check_length(new.len()).map_err(io::Error::from)?;

        let mut ctrl_raw = Vec::new();
        let mut diff_raw = Vec::new();
        let mut extra_raw = Vec::new();

        let mut spos: i64 = 0;
        let mut tpos: i64 = 0;
        let mut ctl = [0u8; 24];
        for c in MatchWalk::new(self.old, new, &self.sa, self.dismatch) {
            varint::encode_int(c.add, &mut ctl[0..8]);
            varint::encode_int(c.copy, &mut ctl[8..16]);
            varint::encode_int(c.seek, &mut ctl[16..24]);
            ctrl_raw.extend_from_slice(&ctl);

            if c.add > 0 {
                let (s0, t0) = (spos as usize, tpos as usize);
                let n = c.add as usize;
                for i in 0..n {
                    diff_raw.push(new[t0 + i].wrapping_sub(self.old[s0 + i]));
                }
                spos += c.add;
                tpos += c.add;
            }

            if c.copy > 0 {
                let t0 = tpos as usize;
                let n = c.copy as usize;
                extra_raw.extend_from_slice(&new[t0..t0 + n]);
                tpos += c.copy;
            }

            spos = spos.wrapping_add(c.seek);
        }

        debug!(
            "bsdiff: {} control bytes, {} diff bytes, {} extra bytes (raw)",
            ctrl_raw.len(),
            diff_raw.len(),
            extra_raw.len()
        );

        let ctrl_packed = codec::compress(self.level, &ctrl_raw).map_err(io::Error::from)?;
        let diff_packed = codec::compress(self.level, &diff_raw).map_err(io::Error::from)?;
        let extra_packed = codec::compress(self.level, &extra_raw).map_err(io::Error::from)?;

        let mut header = [0u8; 32];
        header[0..8].copy_from_slice(MAGIC);
        varint::encode_int(ctrl_packed.len() as i64, &mut header[8..16]);
        varint::encode_int(diff_packed.len() as i64, &mut header[16..24]);
        varint::encode_int(new.len() as i64, &mut header[24..32]);

        patch.write_all(&header)?;
        patch.write_all(&ctrl_packed)?;
        patch.write_all(&diff_packed)?;
        patch.write_all(&extra_packed)?;
        patch.flush()?;

        Ok(32 + ctrl_packed.len() as u64 + diff_packed.len() as u64 + extra_packed.len() as u64)
    }
}

/// Walks `new`, consulting the suffix array, yielding one control triple per
/// matched/unmatched region (C5).
struct MatchWalk<'s, 't, 'sa> {
    s: &'s [u8],
    t: &'t [u8],
    sa: &'sa SuffixArray,
    dismatch: usize,

    // State of the previously emitted match: its position/start in old and
    // new, its matched length, and the backward-extension overlap already
    // consumed from it.
    prev_old: usize,
    prev_new: usize,
    prev_len: usize,
    prev_back: usize,
}

impl<'s, 't, 'sa> MatchWalk<'s, 't, 'sa> {
    fn new(s: &'s [u8], t: &'t [u8], sa: &'sa SuffixArray, dismatch: usize) -> Self {
        MatchWalk {
            s,
            t,
            sa,
            dismatch,
            prev_old: 0,
            prev_new: 0,
            prev_len: 0,
            prev_back: 0,
        }
    }

    /// Advances `scan` from the end of the previous match, looking for a
    /// match worth emitting a control triple for.
    fn search_next(&self) -> Option<(usize, usize, usize)> {
        if self.prev_new == self.t.len() && self.prev_back == 0 {
            return None;
        }

        let mut scan = self.prev_new + self.prev_len;
        let mut k = scan;
        let mut oldscore: usize = 0;
        while scan < self.t.len() {
            let (pos, len) = range_to_extent(self.lcp_range(scan));

            while k < scan + len {
                let i = self.prev_old.saturating_add(k - self.prev_new);
                if i < self.s.len() && self.s[i] == self.t[k] {
                    oldscore += 1;
                }
                k += 1;
            }

            if oldscore == len && len != 0 {
                oldscore = 0;
                scan += len;
                continue;
            } else if len <= oldscore + self.dismatch {
                if scan < k {
                    let i = self.prev_old.saturating_add(scan - self.prev_new);
                    if i < self.s.len() && self.s[i] == self.t[scan] {
                        oldscore -= 1;
                    }
                    scan += 1;
                } else {
                    scan += 1;
                    k = scan;
                    oldscore = 0;
                }
                continue;
            } else {
                return Some((pos, scan, len));
            }
        }

        Some((self.s.len(), self.t.len(), 0))
    }

    fn lcp_range(&self, scan: usize) -> Range<usize> {
        let (pos, len) = self.sa.search(self.s, &self.t[scan..]);
        pos as usize..pos as usize + len
    }

    /// Extends the previous and current matches toward each other,
    /// resolving any overlap in `new`, per spec step 2.
    fn shrink_gap(&self, pos: usize, scan: usize) -> (usize, usize) {
        let gap = &self.t[self.prev_new + self.prev_len..scan];
        let forward_ref = &self.s[self.prev_old + self.prev_len..];
        let backward_ref = &self.s[..pos];

        let mut lenf = scan_similar(gap.iter(), forward_ref.iter());
        let mut lenb = scan_similar(gap.iter().rev(), backward_ref.iter().rev());

        if lenf + lenb > gap.len() {
            let overlap = lenf + lenb - gap.len();
            let xs = gap[gap.len() - lenb..lenf].iter();
            let ys = forward_ref[gap.len() - lenb..lenf].iter();
            let zs = backward_ref[backward_ref.len() - lenb..backward_ref.len() - lenb + overlap].iter();

            let split = scan_divide(xs, ys, zs);
            lenf = lenf - overlap + split;
            lenb -= split;
        }

        (lenf, lenb)
    }
}

impl<'s, 't, 'sa> Iterator for MatchWalk<'s, 't, 'sa> {
    type Item = Control;

    fn next(&mut self) -> Option<Control> {
        let (pos, scan, matched_len) = self.search_next()?;
        let (prev_old, prev_new, prev_len, prev_back) =
            (self.prev_old, self.prev_new, self.prev_len, self.prev_back);
        let (lenf, lenb) = self.shrink_gap(pos, scan);

        let add = (prev_back + prev_len + lenf) as i64;
        let copy = ((scan - lenb) - (prev_new + prev_len + lenf)) as i64;
        let seek = (pos - lenb) as i64 - (prev_old + prev_len + lenf) as i64;

        self.prev_old = pos;
        self.prev_new = scan;
        self.prev_len = matched_len;
        self.prev_back = lenb;

        Some(Control { add, copy, seek })
    }
}

#[inline]
fn range_to_extent(range: Range<usize>) -> (usize, usize) {
    (range.start, range.end.saturating_sub(range.start))
}

/// Finds the extension length maximizing `matches - mismatches`.
fn scan_similar<'a, I>(xs: I, ys: I) -> usize
where
    I: Iterator<Item = &'a u8>,
{
    let mut best_len = 0;
    let mut matched = 0i64;
    let mut best_score = 0i64;
    for (n, eq) in (1..).zip(xs.zip(ys).map(|(x, y)| x == y)) {
        matched += i64::from(eq);
        let score = matched - (n as i64 - matched);
        if score > best_score {
            best_len = n;
            best_score = score;
        }
    }
    best_len
}

/// Finds the split point maximizing agreement with the forward extension
/// over agreement with the backward extension, for the overlapping region.
fn scan_divide<'a, I>(xs: I, ys: I, zs: I) -> usize
where
    I: Iterator<Item = &'a u8>,
{
    let mut best_len = 0;
    let mut y_matched = 0i64;
    let mut z_matched = 0i64;
    let mut best_score = 0i64;
    let eqs = xs.zip(ys).zip(zs).map(|((x, y), z)| (x == y, x == z));
    for (n, (y_eq, z_eq)) in (1..).zip(eqs) {
        y_matched += i64::from(y_eq);
        z_matched += i64::from(z_eq);
        let score = y_matched - z_matched;
        if score > best_score {
            best_len = n;
            best_score = score;
        }
    }
    best_len
}
