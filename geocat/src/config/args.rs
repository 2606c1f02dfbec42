use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use tracing::info;

use crate::config::env::Env;
use crate::config::file::Config;
use crate::config::file::srv::{KEEP_ALIVE_DEFAULT, LISTEN_ADDRESSES_DEFAULT};

/// Environment variable read when no data directory is configured.
pub const DATA_DIR_ENV: &str = "GEOCAT_DATA_DIR";

/// Defines the styles used for the CLI help output.
const HELP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Blue.on_default().bold())
    .usage(AnsiColor::Blue.on_default().bold())
    .literal(AnsiColor::White.on_default())
    .placeholder(AnsiColor::Green.on_default());

#[derive(Parser, Debug, PartialEq, Default)]
#[command(
    about,
    version,
    after_help = "Use RUST_LOG environment variable to control logging level, e.g. RUST_LOG=debug or RUST_LOG=geocat=debug. Use GEOCAT_FORMAT to choose between full, compact, pretty and json output.",
    styles = HELP_STYLES
)]
pub struct Args {
    #[command(flatten)]
    pub meta: MetaArgs,
    #[command(flatten)]
    pub srv: SrvArgs,
}

// None of these params will be transferred to the config
#[derive(Parser, Debug, Clone, PartialEq, Default)]
#[command(about, version)]
pub struct MetaArgs {
    /// Path to the YAML config file describing the server and the initial catalog.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Save resulting config to a file or use "-" to print to stdout.
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

#[derive(clap::Args, Debug, PartialEq, Default)]
#[command(about, version)]
pub struct SrvArgs {
    #[arg(help = format!("Connection keep alive timeout. [DEFAULT: {KEEP_ALIVE_DEFAULT}]"), short, long)]
    pub keep_alive: Option<u64>,
    #[arg(help = format!("The socket address to bind. [DEFAULT: {LISTEN_ADDRESSES_DEFAULT}]"), short, long)]
    pub listen_addresses: Option<String>,
    /// Number of web server workers
    #[arg(short = 'W', long)]
    pub workers: Option<usize>,
    /// Configuration directory used to backfill map modification dates.
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,
    /// Workspace the `default` path alias resolves to.
    #[arg(long)]
    pub default_workspace: Option<String>,
}

impl Args {
    /// Overrides config file values with the ones given on the command line.
    pub fn merge_into_config<'a>(self, config: &mut Config, env: &impl Env<'a>) {
        let srv = self.srv;
        if srv.keep_alive.is_some() {
            config.srv.keep_alive = srv.keep_alive;
        }
        if srv.listen_addresses.is_some() {
            config.srv.listen_addresses = srv.listen_addresses;
        }
        if srv.workers.is_some() {
            config.srv.worker_processes = srv.workers;
        }
        if srv.default_workspace.is_some() {
            config.catalog.default_workspace = srv.default_workspace;
        }
        if srv.data_dir.is_some() {
            config.data_dir = srv.data_dir;
        } else if config.data_dir.is_none() {
            config.data_dir = env.get_env_str(DATA_DIR_ENV).map(PathBuf::from);
        } else if env.has_unused_var(DATA_DIR_ENV) {
            info!("{DATA_DIR_ENV} is set but ignored, the config file sets data_dir");
        }
    }
}
