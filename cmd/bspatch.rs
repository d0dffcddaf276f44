#![forbid(unsafe_code)]
#[macro_use]
extern crate clap;

use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;

use bsdelta::{Bspatch, Multipatch};

fn main() {
    let matches = clap_app!(
        bspatch =>
        (version: "0.1.0")
        (about: "memory saving bsdiff 4.x compatible patcher")
        (@arg MULTI:
            -m --multi
            "treat PATCH as a multi-patch container")
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
    let source_name = matches.value_of("SOURCE").unwrap();
    let target_name = matches.value_of("TARGET").unwrap();
    let patch_name = matches.value_of("PATCH").unwrap();

    let mut source = read_input(source_name)?;
    source.shrink_to_fit();
    let mut patch = read_input(patch_name)?;
    patch.shrink_to_fit();
    let mut target = make_output(target_name)?;

    if matches.is_present("MULTI") {
        let out = Multipatch::new(&patch[..])?.apply(&source[..])?;
        target.write_all(&out)?;
        target.flush()?;
    } else {
        Bspatch::new(&patch[..])?.apply(&source[..], &mut target)?;
    }

    Ok(())
}

fn read_input(name: &str) -> io::Result<Vec<u8>> {
    if name == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(name)
    }
}

fn make_output(name: &str) -> io::Result<Box<dyn Write>> {
    if name == "-" {
        Ok(Box::new(io::stdout()))
    } else {
        Ok(Box::new(fs::File::create(name)?))
    }
}
