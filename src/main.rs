use clap::Parser;
use env_logger::{Builder, Env};
use mediasort::cli::{Cli, run_cli};
use mediasort::config::Config;
use mediasort::error::CatalogError;
use mediasort::output::OutputFormatter;
use std::process;

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with(CatalogError::from(e)),
    };

    // --log-level beats RUST_LOG, which beats the config file.
    let mut logger = Builder::from_env(Env::default().default_filter_or(config.logging.level.as_str()));
    if let Some(level) = &cli.log_level {
        logger.parse_filters(level);
    }
    logger.init();

    if let Err(e) = run_cli(&cli, &config) {
        exit_with(e);
    }
}

fn exit_with(error: CatalogError) -> ! {
    OutputFormatter::error(&error.to_string());
    process::exit(error.kind().exit_code());
}
