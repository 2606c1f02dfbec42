use std::{env, process};

use clap::Parser;
use geocat::GeocatResult;
use geocat::config::args::Args;
use geocat::config::env::OsEnv;
use geocat::config::file::{Config, read_config};
use geocat::logging::{init_tracing, log_filter};
use geocat::srv::new_server;
use log::log_enabled;
use tracing::{error, info};

const VERSION: &str = env!("CARGO_PKG_VERSION");

async fn start(args: Args) -> GeocatResult<()> {
    info!("Starting geocat v{VERSION}");

    let env = OsEnv::default();
    let save_config = args.meta.save_config.clone();
    let mut config = if let Some(ref cfg_filename) = args.meta.config {
        info!("Using {}", cfg_filename.display());
        read_config(cfg_filename, &env)?
    } else {
        info!("Config file is not specified, starting with an empty catalog");
        Config::default()
    };

    args.merge_into_config(&mut config, &env);
    config.finalize()?;
    let state = config.resolve()?;

    if let Some(file_name) = save_config {
        config.save_to_file(file_name.as_path())?;
    } else {
        info!("Use --save-config to save or print the geocat configuration.");
    }

    let (server, listen_addresses) = new_server(config.srv, state)?;
    info!("geocat has been started on {listen_addresses}.");
    info!("Use http://{listen_addresses}/api/workspaces to get the list of workspaces.");

    server.await
}

#[tokio::main]
async fn main() {
    let filter = log_filter(env::var("RUST_LOG").ok());
    init_tracing(&filter, env::var("GEOCAT_FORMAT").ok());

    let args = Args::parse();
    if let Err(e) = start(args).await {
        // Ensure the message is printed, even if the logging is disabled
        if log_enabled!(log::Level::Error) {
            error!("{e}");
        } else {
            eprintln!("{e}");
        }
        process::exit(1);
    }
}
