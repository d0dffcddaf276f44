#![allow(unused)]

use std::io;

use bsdelta::{Bsdiff, Bspatch};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn diff(old: &[u8], new: &[u8]) -> io::Result<Vec<u8>> {
    let mut patch = Vec::new();
    Bsdiff::new(old)?.compare(new, &mut patch)?;
    Ok(patch)
}

pub fn apply(old: &[u8], patch: &[u8]) -> io::Result<Vec<u8>> {
    let patcher = Bspatch::new(patch)?;
    let mut new = Vec::with_capacity(patcher.hint_target_size() as usize);
    patcher.apply(old, &mut new)?;
    Ok(new)
}

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}
