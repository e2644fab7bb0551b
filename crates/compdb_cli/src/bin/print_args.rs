//! Stand-in compiler for unwrapping `emcc`.
//!
//! `emcc` is pointed at this binary in place of clang. It prints the
//! arguments it was given between two sentinel lines and fails, so `emcc`
//! stops before doing any real work.

use std::io::{self, Write};
use std::process;

use compdb_extract::{BEGIN_ARGS, END_ARGS};

fn main() {
    let mut out = io::stdout().lock();
    let mut lines = vec![BEGIN_ARGS.to_string()];
    lines.extend(std::env::args_os().skip(1).map(|arg| arg.to_string_lossy().into_owned()));
    lines.push(END_ARGS.to_string());
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    let _ = out.flush();
    process::exit(1);
}
