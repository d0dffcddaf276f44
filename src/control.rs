/// One bsdiff control triple: add `add` bytes of diffed old data, then copy
/// `copy` bytes of literal extra data, then seek the old cursor by `seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub add: i64,
    pub copy: i64,
    pub seek: i64,
}

/// Default threshold (in bytes) above which a newly found match is
/// preferred over continuing to extend the current one.
pub const DISMATCH_COUNT: usize = 8;
