use anyhow::Result;
use clap::Parser;
use customer_loader::{
    config::{
        LoaderConfig, ReplaceMode, DEFAULT_COLLECTION, DEFAULT_CSV_PATH, DEFAULT_DATABASE,
        DEFAULT_ENV_FILE, URI_VAR,
    },
    loader::{report, upload},
    LoadSummary,
};
use std::{env, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Replace a MongoDB collection with the rows of a CSV file.
#[derive(Parser, Debug)]
struct Args {
    /// dotenv file holding MONGODB_URI
    #[arg(long, default_value = DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// CSV file to load
    #[arg(long, default_value = DEFAULT_CSV_PATH)]
    csv: PathBuf,

    #[arg(long, default_value = DEFAULT_DATABASE)]
    database: String,

    #[arg(long, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Load into a staging collection and rename it over the target
    #[arg(long)]
    staged: bool,
}

async fn run(args: &Args) -> customer_loader::Result<LoadSummary> {
    let mode = if args.staged {
        ReplaceMode::Staged
    } else {
        ReplaceMode::DeleteThenInsert
    };
    let config = LoaderConfig::resolve(&args.env_file, env::var(URI_VAR).ok())?
        .with_csv_path(&args.csv)
        .with_target(&args.database, &args.collection)
        .with_replace_mode(mode);

    info!(
        csv = %config.csv_path.display(),
        database = %config.database,
        collection = %config.collection,
        mode = ?config.replace_mode,
        "configuration"
    );
    upload(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    info!("startup");

    let outcome = run(&args).await;
    println!("{}", report(&outcome));
    Ok(())
}
