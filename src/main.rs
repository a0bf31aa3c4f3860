use clap::Parser;
use petrader::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
