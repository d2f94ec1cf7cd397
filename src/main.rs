use clap::Parser;
use stratlang::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    env_logger::init();
    run(Cli::parse())
}
