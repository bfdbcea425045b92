use clap::Parser;
use flexi_logger::Logger;
use wardboard::cli::commands::{Cli, Commands};
use wardboard::cli::handlers;

fn main() {
    // RUST_LOG overrides; library warnings (e.g. unknown task IDs) go to stderr
    let _logger = match Logger::try_with_env_or_str("warn")
        .and_then(|logger| logger.log_to_stderr().start())
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init(args)) => {
            // Init is handled before board discovery
            if let Err(e) = handlers::cmd_init(args) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
        _ => {
            if let Err(e) = handlers::dispatch(cli) {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    }
}
