#![forbid(unsafe_code)]
#[macro_use]
extern crate clap;

use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;
use std::str::FromStr;

use bsdelta::{Bsdiff, Compression, Multidiff};

fn main() {
    let matches = clap_app!(
        bsdiff =>
        (version: "0.1.0")
        (about: "memory saving bsdiff 4.x compatible delta compressor")
        (@arg COMPRESS:
            -z +takes_value
            "bzip2 compression level (1-9)")
        (@arg DISMATCH:
            -d +takes_value
            "dismatch count tolerance")
        (@arg CHUNK:
            -c +takes_value
            "split SOURCE/TARGET into CHUNK-byte pairs and write a multi-patch container")
        (@arg SOURCE:
            +required
            "source file")
        (@arg TARGET:
            +required
            "target file")
        (@arg PATCH:
            +required
            "patch file"))
    .get_matches();

    if let Err(e) = execute(matches) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn execute(matches: clap::ArgMatches) -> io::Result<()> {
    let level = match matches.value_of("COMPRESS") {
        Some(expr) => compression_level(parse_usize(expr)?)?,
        None => bsdelta::bsdiff::LEVEL,
    };
    let dismatch = match matches.value_of("DISMATCH") {
        Some(expr) => parse_usize(expr)?,
        None => bsdelta::DISMATCH_COUNT,
    };

    let source_name = matches.value_of("SOURCE").unwrap();
    let target_name = matches.value_of("TARGET").unwrap();
    let patch_name = matches.value_of("PATCH").unwrap();

    let source = read_input(source_name)?;
    let target = read_input(target_name)?;
    let mut patch = make_output(patch_name)?;

    match matches.value_of("CHUNK") {
        Some(expr) => {
            let chunk = Ord::max(parse_usize(expr)?, 1);
            let pairs = chunk_pairs(&source, &target, chunk);
            let container = Multidiff::new()
                .dismatch_count(dismatch)
                .compression_level(level)
                .compare(&pairs)?;
            patch.write_all(&container)?;
            patch.flush()?;
        }
        None => {
            Bsdiff::new(&source[..])?
                .dismatch_count(dismatch)
                .compression_level(level)
                .compare(&target[..], &mut patch)?;
        }
    }

    Ok(())
}

/// Splits `source`/`target` into `chunk`-byte pieces, pairing them up
/// positionally. The final pieces may be shorter than `chunk`. Extra pieces
/// on the longer side are paired against an empty counterpart.
fn chunk_pairs<'a>(source: &'a [u8], target: &'a [u8], chunk: usize) -> Vec<(&'a [u8], &'a [u8])> {
    let n = (source.len().max(target.len()) + chunk - 1) / chunk;
    let n = n.max(1);
    (0..n)
        .map(|i| {
            let s = &source[source.len().min(i * chunk)..source.len().min((i + 1) * chunk)];
            let t = &target[target.len().min(i * chunk)..target.len().min((i + 1) * chunk)];
            (s, t)
        })
        .collect()
}

fn read_input(name: &str) -> io::Result<Vec<u8>> {
    let mut data = if name == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        buf
    } else {
        fs::read(name)?
    };
    data.shrink_to_fit();
    Ok(data)
}

fn make_output(name: &str) -> io::Result<Box<dyn Write>> {
    if name == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(fs::File::create(name)?))
    }
}

fn compression_level(n: usize) -> io::Result<Compression> {
    match n {
        0..=3 => Ok(Compression::Fastest),
        4..=6 => Ok(Compression::Default),
        7..=9 => Ok(Compression::Best),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "compression level must be in range 0-9",
        )),
    }
}

fn parse_usize(expr: &str) -> io::Result<usize> {
    usize::from_str(expr).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
}
