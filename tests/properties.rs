#[macro_use]
extern crate quickcheck_macros;

mod common;

use bsdelta::bsdiff_patchsize_max;
use common::{apply, diff};

#[quickcheck]
fn round_trip(old: Vec<u8>, new: Vec<u8>) -> bool {
    let patch = diff(&old, &new).expect("diff should not fail on arbitrary input");
    apply(&old, &patch).expect("apply should not fail on our own patch") == new
}

#[quickcheck]
fn size_discipline(old: Vec<u8>, new: Vec<u8>) -> bool {
    let patch = diff(&old, &new).expect("diff should not fail on arbitrary input");
    patch.len() as i64 <= bsdiff_patchsize_max(old.len() as i64, new.len() as i64)
}

#[quickcheck]
fn identity_round_trips_and_stays_small(old: Vec<u8>) -> bool {
    let patch = diff(&old, &old).expect("diff should not fail on arbitrary input");
    let out = apply(&old, &patch).expect("apply should not fail on our own patch");
    out == old && (patch.len() as usize) < old.len().saturating_mul(2) + 256
}

#[quickcheck]
fn determinism(old: Vec<u8>, new: Vec<u8>) -> bool {
    let p1 = diff(&old, &new).expect("diff should not fail on arbitrary input");
    let p2 = diff(&old, &new).expect("diff should not fail on arbitrary input");
    p1 == p2
}

#[quickcheck]
fn header_self_describes_target_size(old: Vec<u8>, new: Vec<u8>) -> bool {
    let patch = diff(&old, &new).expect("diff should not fail on arbitrary input");
    bsdelta::bspatch_newsize(&patch) == new.len() as i64
}
