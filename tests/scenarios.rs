mod common;

use bsdelta::bspatch_newsize;
use common::{apply, diff, random_bytes};

/// S1: a short literal edit produces a small patch.
#[test]
fn s1_short_text_edit() {
    let old = b"hello world";
    let new = b"hello, world!";
    let patch = diff(old, new).unwrap();
    assert!(patch.len() < 64, "patch too large: {} bytes", patch.len());
    assert_eq!(apply(old, &patch).unwrap(), new);
}

/// S2: identical zero-filled buffers collapse to one control triple.
#[test]
fn s2_identical_zeros() {
    let old = vec![0u8; 1024];
    let new = vec![0u8; 1024];
    let patch = diff(&old, &new).unwrap();
    assert!(patch.len() < old.len(), "patch did not exploit the match");
    assert_eq!(apply(&old, &patch).unwrap(), new);
}

/// S3: every byte flips from 0x00 to 0xFF; nothing copies verbatim.
#[test]
fn s3_uniform_flip() {
    let old = vec![0u8; 1024];
    let new = vec![0xFFu8; 1024];
    let patch = diff(&old, &new).unwrap();
    assert_eq!(apply(&old, &patch).unwrap(), new);
}

/// S4: a localized edit in the middle of an otherwise-matching buffer.
#[test]
fn s4_localized_edit() {
    let old = random_bytes(4096, 1);
    let mut new = old.clone();
    let replacement = random_bytes(100, 2);
    new[1000..1100].copy_from_slice(&replacement);
    let patch = diff(&old, &new).unwrap();
    assert_eq!(apply(&old, &patch).unwrap(), new);
}

/// S5: a fully reversed buffer has no usable common structure.
#[test]
fn s5_reversed_worst_case() {
    let old = random_bytes(512, 3);
    let mut new = old.clone();
    new.reverse();
    let patch = diff(&old, &new).unwrap();
    assert_eq!(apply(&old, &patch).unwrap(), new);
}

/// S6: new is old with extra random bytes appended.
#[test]
fn s6_append() {
    let old = random_bytes(2048, 4);
    let mut new = old.clone();
    new.extend(random_bytes(512, 5));
    let patch = diff(&old, &new).unwrap();
    assert_eq!(bspatch_newsize(&patch), new.len() as i64);
    assert_eq!(apply(&old, &patch).unwrap(), new);
}
