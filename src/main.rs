//! leadsync binary entry point.

use std::process::ExitCode;

use clap::Parser;

use leadsync_lib::cli::{execute, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Settings may pick the log level, so the file is read before the
    // logger exists and any failure is reported once it does.
    let config = cli.load_config();
    let level = config
        .as_ref()
        .map(|c| c.monthly_run.log_level.to_lowercase())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            log::error!("{}", e.recovery_suggestion());
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(execute(cli.command, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            log::error!("{}", e.recovery_suggestion());
            ExitCode::FAILURE
        }
    }
}
