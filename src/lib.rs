/*!
Memory saving bsdiff 4.x compatible delta compressor and patcher, with an
in-crate suffix array and a multi-patch container format for batching many
independent old/new pairs into one archive.

Add dependency to `Cargo.toml` under your project:
```toml
[dependencies]
bsdelta = "0.1"
```

Build commands
--------------

The `bsdiff` and `bspatch` binaries build with:
```shell
$ cargo build --release --bins --features cmd
$ target/release/bsdiff -h
$ target/release/bspatch -h
```

Examples
--------

Compare old with new then generate a patch:
```rust
use std::io;
use bsdelta::Bsdiff;

fn diff(old: &[u8], new: &[u8]) -> io::Result<Vec<u8>> {
    let mut patch = Vec::new();
    Bsdiff::new(old)?.compare(new, &mut patch)?;
    Ok(patch)
}
```

Apply a patch to old and reconstruct new:
```rust
use std::io;
use bsdelta::Bspatch;

fn apply(old: &[u8], patch: &[u8]) -> io::Result<Vec<u8>> {
    let patcher = Bspatch::new(patch)?;
    let mut new = Vec::with_capacity(patcher.hint_target_size() as usize);
    patcher.apply(old, &mut new)?;
    Ok(new)
}
```

Batch several independent pairs into one multi-patch container:
```rust
use std::io;
use bsdelta::{Multidiff, Multipatch};

fn roundtrip(pairs: &[(&[u8], &[u8])]) -> io::Result<Vec<u8>> {
    let container = Multidiff::new().compare(pairs)?;
    let input: Vec<u8> = pairs.iter().flat_map(|(old, _)| old.iter().copied()).collect();
    Multipatch::new(&container)?.apply(&input)
}
```

Note that this crate does not generate exactly the same patch bytes as the
original `bsdiff`. Only the container format is promised to be compatible.
*/

pub mod bsdiff;
pub mod bspatch;
mod codec;
mod control;
pub mod error;
mod multipatch;
mod suffix;
mod varint;

pub use bsdiff::{bsdiff_patchsize_max, Bsdiff, Compression};
pub use bspatch::{bspatch_newsize, bspatch_valid_header, Bspatch};
pub use control::{Control, DISMATCH_COUNT};
pub use error::DeltaError;
pub use multipatch::{Multidiff, Multipatch};
