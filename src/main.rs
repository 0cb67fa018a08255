use clap::Parser;
use smartstock::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
