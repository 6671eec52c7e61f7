//! Application entry point and thread bootstrapper.

use clap::Parser;
use companella::app::{AppPaths, AppRoot};
use companella::logging;
use std::path::PathBuf;

/// Recognized CLI surface (spec §6): one executable, no positional
/// arguments.
#[derive(Parser, Debug)]
#[command(name = "companella", version, about = "osu!mania session companion")]
struct Cli {
    /// Boots the aggregation/training UI instead of the main UI.
    #[arg(long)]
    training: bool,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let data_dir = PathBuf::from("companella-data");
    if let Err(e) = logging::FileLogger::install(data_dir.join("companella.log"), log::LevelFilter::Info) {
        eprintln!("failed to install file logger: {e}");
    }

    log::info!("MAIN: booting companella (training mode: {})", cli.training);

    let paths = AppPaths {
        data_dir: data_dir.clone(),
        songs_dir: PathBuf::from("songs"),
        msd_tool_executable: PathBuf::from("tools/msd-calculator"),
    };

    let app_root = match AppRoot::bootstrap(paths).await {
        Ok(root) => root,
        Err(e) => {
            log::error!("MAIN: failed to bootstrap application root: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    if cli.training {
        log::info!("MAIN: training/aggregation UI is out of scope for the core; running tracker only");
    }

    app_root.run_until(shutdown_signal()).await;
    log::info!("MAIN: clean shutdown");
    std::process::ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
