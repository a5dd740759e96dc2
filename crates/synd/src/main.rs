use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use synd::{BatchRequest, RootConfig, RootError, SyndicationService};

/// Synd: syndicated entity resolution
///
/// Assembles virtual identity records from signed, partially obfuscated
/// subjects and reports which privacy actions must run to read them.
#[derive(Parser, Debug)]
#[command(name = "synd", version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Hostname used to mint syndicated entity ids
        #[arg(long)]
        hostname: Option<String>,
    },

    /// Materialize the entities of a batch file
    Resolve {
        /// Batch file (JSON)
        batch: PathBuf,
    },

    /// List the deobfuscation requirements of a batch file
    Scan {
        /// Batch file (JSON)
        batch: PathBuf,
    },
}

fn init_tracing(verbose: bool, configured: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("synd=debug,synd_core=debug,synd_entity=debug,synd_resolve=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<RootConfig, RootError> {
    match path {
        Some(p) => RootConfig::load(p),
        None => {
            let default_path = RootConfig::default_config_path();
            RootConfig::load(&default_path)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging is configured from the file, so the file is read first.
    let config = match load_config(cli.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("synd: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(cli.verbose, &config.logging.filter);

    if let Err(e) = run(cli, config).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: RootConfig) -> Result<(), RootError> {
    match cli.command {
        Commands::Init { hostname } => cmd_init(cli.config.as_ref(), config, hostname),
        Commands::Resolve { batch } => cmd_resolve(config, batch).await,
        Commands::Scan { batch } => cmd_scan(config, batch).await,
    }
}

fn cmd_init(
    config_path: Option<&PathBuf>,
    mut config: RootConfig,
    hostname: Option<String>,
) -> Result<(), RootError> {
    if let Some(h) = hostname {
        config.identity.hostname = h;
    }
    config.validate()?;

    let save_path = config_path
        .cloned()
        .unwrap_or_else(RootConfig::default_config_path);
    config.save(&save_path)?;
    info!(path = %save_path.display(), "configuration written");

    println!("Synd initialized successfully.");
    println!("  Hostname: {}", config.identity.hostname);
    println!("  Config:   {}", save_path.display());
    Ok(())
}

async fn cmd_resolve(config: RootConfig, batch: PathBuf) -> Result<(), RootError> {
    let service = SyndicationService::new(config)?;
    let request = BatchRequest::from_file(&batch).await?;
    let records = service.resolve(&request).await?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

async fn cmd_scan(config: RootConfig, batch: PathBuf) -> Result<(), RootError> {
    let service = SyndicationService::new(config)?;
    let request = BatchRequest::from_file(&batch).await?;
    let required = service.scan(&request)?;
    println!("{}", serde_json::to_string_pretty(&required)?);
    Ok(())
}
