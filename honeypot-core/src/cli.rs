use clap::Parser;

/// Every listener binary's command line: no subcommands, just the
/// `--version`/`-h` surface clap derives for free. All real configuration
/// is environment-variable driven, per spec §6.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {}

/// Parses `std::env::args()` against [`Cli`] and exits on `--help`/`--version`
/// the way clap's generated binaries always do.
pub fn parse() -> Cli {
    Cli::parse()
}
