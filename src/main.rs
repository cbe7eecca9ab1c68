use clap::Parser;
use quantfolio::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("quantfolio"), log::LevelFilter::Info)
        .parse_default_env()
        .init();

    run(Cli::parse())
}
