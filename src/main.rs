//! gitmeta binary entry point.
//!
//! Parses arguments, runs the requested command, and turns failures into
//! the `<ErrorKind>: <message>` stderr line and a non-zero exit code.
//! With `--verbose`, the full error chain is printed instead.

use gitmeta::cli::{self, Cli};
use gitmeta::meta::MetaError;

fn main() {
    let cli = Cli::parse_args();
    let verbose = cli.verbose;

    if let Err(err) = cli::run(cli) {
        if verbose {
            eprintln!("{:?}", err);
        } else if let Some(meta) = err.downcast_ref::<MetaError>() {
            eprintln!("{}: {}", meta.kind(), meta);
        } else {
            eprintln!("Error: {:#}", err);
        }
        std::process::exit(1);
    }
}
