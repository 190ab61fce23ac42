mod artifact;
mod catalog;
mod config;
mod context;
mod error;
mod logging;
mod output;
mod test_helpers;
mod traits;
mod wizard;

use clap::Parser;
use config::{Cli, Settings};
use context::Context;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::from_cli(cli) {
        Ok(settings) => settings,
        Err(e) => {
            output::error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::initialize(&settings.log_file, settings.log_level) {
        output::warning(&format!("Logging disabled: {:#}", e));
    }
    log::info!("docker-menu {} starting", env!("CARGO_PKG_VERSION"));

    let ctx = match Context::new(settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("{:#}", e);
            output::error(&format!("{:#}", e));
            return ExitCode::FAILURE;
        }
    };

    let interrupted = ctx.interrupted.clone();
    if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst)) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let reason = wizard::run(&ctx);
    ExitCode::from(reason.exit_code())
}
