//! ADDRESSFACTORY DIRECT command line client.
//!
//! Run with: `addressfactory-direct --config config.yaml --country Deutschland ...`

use addressfactory_direct::{
    ClientConfig, CommunicationLogger, RequestBuilder, ServiceFactory, TracingLogger, WriterLogger,
};
use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Verify one address against ADDRESSFACTORY DIRECT.
///
/// Opens a session with the configured credentials, submits the record and
/// closes the session again.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Append SOAP communication to this file instead of the log output
    #[arg(long)]
    audit_log: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Correlation id of the record
    #[arg(long)]
    metadata_id: Option<u64>,

    #[arg(long)]
    given_name: Option<String>,

    #[arg(long)]
    family_name: Option<String>,

    #[arg(long)]
    country: String,

    #[arg(long)]
    postal_code: String,

    #[arg(long)]
    city: String,

    #[arg(long)]
    street: String,

    #[arg(long)]
    house_number: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Config file: {}", args.config.display());

    let config = if args.config.exists() {
        let content =
            std::fs::read_to_string(&args.config).context("Failed to read config file")?;
        ClientConfig::from_yaml(&content).context("Failed to parse config file")?
    } else {
        info!("Config file not found, using defaults");
        ClientConfig::default()
    };

    info!(
        endpoint = %config.endpoint,
        timeout_secs = config.timeout_secs,
        "Configuration loaded"
    );

    let mut builder = RequestBuilder::new();
    if let Some(id) = args.metadata_id {
        builder.set_metadata(id);
    }
    if let (Some(given), Some(family)) = (&args.given_name, &args.family_name) {
        builder.set_person(given, family)?;
    }
    builder.set_address(
        &args.country,
        &args.postal_code,
        &args.city,
        &args.street,
        &args.house_number,
    )?;
    let record = builder.create()?;

    let logger: Arc<dyn CommunicationLogger> = match args.audit_log {
        Some(ref path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open audit log {}", path.display()))?;
            Arc::new(WriterLogger::new(file))
        }
        None => Arc::new(TracingLogger),
    };

    let mut service =
        ServiceFactory::from_config(&config).create_address_verification_service(logger);

    let session_id = service
        .open_session(&config.credentials.to_credentials())
        .context("Failed to open session")?;

    let results = service.get_records(&session_id, std::slice::from_ref(&record));

    if let Err(e) = service.close_session(&session_id) {
        warn!(error = %e, "Failed to close session");
    }

    for result in results.context("Failed to verify record")? {
        match result.record {
            Some(verified) => println!(
                "{}",
                serde_yaml::to_string(&verified).context("Failed to render result")?
            ),
            None => println!("No match"),
        }
    }

    Ok(())
}
