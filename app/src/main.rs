use std::process::ExitCode;

use clap::Parser;
use translate_bot::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    translate_bot::log::init();
    let cli = Cli::parse();

    match translate_bot::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}
