use std::io;
use std::process;

use clap::Parser;

use optgen::cli::args::OptgenArgs;
use optgen::cli::Optgen;

fn main() {
    let args = OptgenArgs::parse();

    let mut gen = Optgen::new();
    if let Some(out) = args.out {
        gen.set_out(out);
    }

    if !gen.run(args.command, &args.sources, &mut io::stderr()) {
        process::exit(2);
    }
}
