//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `-v` / `--verbose`: Debug tracing to stderr
//! - `-m` / `--metadataref <REF>`: Metadata reference to use

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::meta::METADATA_REF_DEFAULT;

/// gitmeta - attach mutable JSON metadata to versioned objects in Git
///
/// Path expressions have the form `[s+|s-]datarev:path[:stream]` where
/// `s+` searches data history backwards for the commit that introduced
/// the object and `s-` uses exactly the revision given.
#[derive(Parser, Debug)]
#[command(name = "gitmeta")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output (debug tracing to stderr)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Metadata reference; a bare name is rewritten to refs/heads/<name>
    #[arg(
        short,
        long,
        global = true,
        value_name = "REF",
        default_value = METADATA_REF_DEFAULT
    )]
    pub metadataref: String,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the metadata blob for an object version
    #[command(name = "get")]
    Get {
        /// Path expression: [s+|s-]datarev:path[:stream]
        path: String,

        /// Print the raw blob without attempting to parse it
        #[arg(long)]
        dump: bool,

        /// Parse the blob as JSON and pretty-print it
        #[arg(long, conflicts_with = "dump")]
        json: bool,
    },

    /// Store a file's contents as the metadata blob for an object version
    #[command(name = "set")]
    Set {
        /// Path expression: (s+|s-)datarev:path[:stream]
        path: String,

        /// File with the new metadata content ('-' reads stdin)
        file: PathBuf,

        /// Replace a blocking non-tree entry in the metadata tree
        #[arg(long)]
        force: bool,
    },

    /// Merge a key=value pair into the JSON metadata for an object version
    #[command(name = "setvalue")]
    Setvalue {
        /// Path expression: (s+|s-)datarev:path[:stream]
        path: String,

        /// Key and value in key=value form
        keyvalue: String,

        /// Replace a blocking non-tree entry in the metadata tree
        #[arg(long)]
        force: bool,
    },

    /// Print the keys and values of the JSON metadata for an object version
    #[command(name = "getvalue")]
    Getvalue {
        /// Path expression: (s+|s-)datarev:path[:stream]
        path: String,

        /// Only show this key
        #[arg(long)]
        key: Option<String>,

        /// Only show entries with this value
        #[arg(long)]
        value: Option<String>,
    },

    /// List metadata entries in a stream, classified against a revision
    #[command(name = "list")]
    List {
        /// Path expression: datarev:path[:stream] (search prefix ignored)
        #[arg(default_value = "")]
        path: String,
    },

    /// Walk a revision's history marking commits that carry metadata
    #[command(name = "log")]
    Log {
        /// Path expression: datarev:path[:stream] (search prefix ignored)
        #[arg(default_value = "")]
        path: String,
    },

    /// Copy a metadata blob between two object versions
    #[command(name = "copy")]
    Copy {
        /// Source path expression: (s+|s-)datarev:path[:stream]
        source: String,

        /// Destination path expression: (s+|s-)datarev:path[:stream]
        dest: String,

        /// Replace a blocking non-tree entry in the metadata tree
        #[arg(long)]
        force: bool,
    },

    /// Enumerate annotated paths on the metadata reference
    #[command(name = "ls")]
    Ls {
        /// Path to list from (defaults to the repository root)
        #[arg(default_value = "")]
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_get_with_globals() {
        let cli = Cli::try_parse_from([
            "gitmeta",
            "-v",
            "-m",
            "annotations",
            "get",
            "s-HEAD:a.txt",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.metadataref, "annotations");
        match cli.command {
            Command::Get { path, dump, json } => {
                assert_eq!(path, "s-HEAD:a.txt");
                assert!(!dump);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn metadataref_defaults() {
        let cli = Cli::try_parse_from(["gitmeta", "list"]).unwrap();
        assert_eq!(cli.metadataref, "refs/heads/metadata");
    }

    #[test]
    fn dump_and_json_conflict() {
        assert!(Cli::try_parse_from(["gitmeta", "get", "s-HEAD:a", "--dump", "--json"]).is_err());
    }
}
