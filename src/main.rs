use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use backref::commands;
use backref::error::Error;
use backref::types::{ReferenceLocation, Variant};
use backref::watch;

/// Command line.
#[derive(Parser)]
#[command(name = "backref", about = "Bidirectional text references for markdown vaults")]
struct Cli {
    /// What to run.
    #[command(subcommand)]
    command: Commands,
    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List backlinks pointing at one document
    Backlinks {
        /// Vault-relative path of the referenced document
        file: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify every reference still matches its target text
    Check,
    /// Decode a reference token and print its location as JSON
    Decode {
        /// The token, starting with ref://
        token: String,
    },
    /// Build a reference token from its parts
    Encode(EncodeArgs),
    /// Scan every document and list all backlinks
    Index {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep the index current as documents change
    Watch,
}

/// Parts of a token for `encode`.
#[derive(Args)]
struct EncodeArgs {
    /// Vault-relative path of the referenced document
    #[arg(long)]
    file: String,
    /// Byte offset where the range starts
    #[arg(long)]
    from: usize,
    /// Text right before the range
    #[arg(long, default_value = "")]
    prefix: String,
    /// Render as a portal with a text preview
    #[arg(long)]
    portal: bool,
    /// Text right after the range
    #[arg(long, default_value = "")]
    suffix: String,
    /// The referenced text
    #[arg(long)]
    text: String,
    /// Byte offset one past the end of the range
    #[arg(long)]
    to: usize,
}

impl From<EncodeArgs> for ReferenceLocation {
    fn from(args: EncodeArgs) -> Self {
        return Self {
            filename: args.file,
            from: args.from,
            prefix: args.prefix,
            suffix: args.suffix,
            text: args.text,
            to: args.to,
            variant: if args.portal { Variant::Portal } else { Variant::Plain },
        };
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    return match cli.command {
        Commands::Backlinks { file, json } => exit_on_error(commands::backlinks(&file, json)),
        Commands::Check => match commands::check() {
            Err(e) => {
                eprintln!("error: {e}");
                ExitCode::from(3_u8)
            },
            Ok(code) => code,
        },
        Commands::Decode { token } => exit_on_error(commands::decode(&token)),
        Commands::Encode(args) => exit_on_error(commands::encode(&ReferenceLocation::from(args))),
        Commands::Index { json } => exit_on_error(commands::index(json)),
        Commands::Watch => exit_on_error(watch::run()),
    };
}

/// Print an error and map it to a failing exit code.
fn exit_on_error(result: Result<(), Error>) -> ExitCode {
    return match result {
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        },
        Ok(()) => ExitCode::SUCCESS,
    };
}

/// Log to stderr, filtered by `RUST_LOG` or else by the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "backref=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
