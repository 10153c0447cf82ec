//! descfs - Browse captured system descriptions as a filesystem
//!
//! Usage:
//!   descfs mount <name> <mount_point>  - Mount a description (blocks until unmounted)
//!   descfs unmount <mount_point>       - Unmount a running session
//!   descfs list                        - List stored descriptions

use clap::{Parser, Subcommand};
use descfs::{
    archive::TarArchiver, config::Config, description::DescriptionStore, session::MountSession,
    Error, Result,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "descfs")]
#[command(author = "descfs Contributors")]
#[command(version)]
#[command(about = "Read-only filesystem view of captured system descriptions")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "~/.config/descfs/config.json")]
    config: PathBuf,

    /// Description store directory (overrides the configuration)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a description and serve it until unmounted
    Mount {
        /// Description name
        name: String,

        /// Mount point directory (must exist)
        mount_point: PathBuf,

        /// Allow other users to access the mount
        #[arg(long)]
        allow_other: bool,
    },

    /// Unmount a mounted description
    Unmount {
        /// Mount point to unmount
        mount_point: PathBuf,
    },

    /// List stored descriptions
    List,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load_or_default(expand_tilde(&cli.config))?;
    if let Some(store) = cli.store {
        config.store.base_path = expand_tilde(&store);
    }

    match cli.command {
        Commands::Mount {
            name,
            mount_point,
            allow_other,
        } => cmd_mount(config, &name, &mount_point, allow_other),

        Commands::Unmount { mount_point } => cmd_unmount(&mount_point),

        Commands::List => cmd_list(&config),
    }
}

fn cmd_mount(mut config: Config, name: &str, mount_point: &Path, allow_other: bool) -> Result<()> {
    config.mount.allow_other |= allow_other;

    let store = DescriptionStore::new(&config.store.base_path);
    let description = store.load(name)?;
    let archiver = Arc::new(TarArchiver::new(&config.archive.tar_program));

    let session = MountSession::new(description, mount_point, &config, archiver)?;
    info!("Mounting description '{}' at {:?}", name, session.mount_point());
    debug!("Mount options: {:?}", session.options());
    session.run()
}

fn cmd_unmount(mount_point: &Path) -> Result<()> {
    info!("Unmounting {:?}...", mount_point);

    #[cfg(target_os = "linux")]
    let output = std::process::Command::new("fusermount")
        .arg("-u")
        .arg(mount_point)
        .output()?;

    #[cfg(not(target_os = "linux"))]
    let output = std::process::Command::new("umount")
        .arg(mount_point)
        .output()?;

    if output.status.success() {
        info!("Unmounted successfully");
        Ok(())
    } else {
        Err(Error::Mount(format!(
            "Failed to unmount: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )))
    }
}

fn cmd_list(config: &Config) -> Result<()> {
    let store = DescriptionStore::new(&config.store.base_path);
    let names = store.list()?;

    if names.is_empty() {
        println!("No descriptions in {:?}", store.base_path());
        return Ok(());
    }

    for name in names {
        println!("{}", name);
    }
    Ok(())
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
