//! The load run: read, coerce, replace, release.

use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use crate::{
    config::LoaderConfig,
    error::{LoadError, Result},
    source::read_dataset,
    store::{DocumentStore, MongoStore},
    transform::{coerce_numeric, CoercionReport},
};

#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub database: String,
    pub collection: String,
    pub rows_read: usize,
    pub inserted: usize,
    pub coercion: CoercionReport,
    pub elapsed: Duration,
}

/// Connect to MongoDB and replace the target collection with the CSV rows.
/// The client is shut down before this returns, whatever the outcome.
pub async fn upload(config: &LoaderConfig) -> Result<LoadSummary> {
    let store = MongoStore::connect(config).await?;
    load_with(store, config).await
}

/// Run a load against an already-open store, then close it.
pub async fn load_with<S: DocumentStore>(mut store: S, config: &LoaderConfig) -> Result<LoadSummary> {
    let outcome = replace_from_csv(&mut store, config).await;
    store.close().await;
    outcome
}

#[instrument(level = "info", skip_all, fields(csv = %config.csv_path.display(), mode = ?config.replace_mode))]
async fn replace_from_csv<S: DocumentStore>(
    store: &mut S,
    config: &LoaderConfig,
) -> Result<LoadSummary> {
    let start = Instant::now();

    let mut dataset = read_dataset(&config.csv_path)?;
    let rows_read = dataset.len();

    let missing = dataset.missing_columns(&config.numeric_columns);
    if !missing.is_empty() {
        return Err(LoadError::Source {
            path: config.csv_path.clone(),
            message: format!("required column(s) missing: {}", missing.join(", ")),
        });
    }

    let coercion = coerce_numeric(&mut dataset, &config.numeric_columns);

    let docs = dataset
        .to_documents()
        .map_err(|e| LoadError::store("encode", e))?;
    drop(dataset);

    let inserted = store.replace_all(docs, config.replace_mode).await?;
    let elapsed = start.elapsed();
    info!(
        rows_read,
        inserted,
        zeroed = coercion.total_zeroed(),
        elapsed = ?elapsed,
        "load complete"
    );

    Ok(LoadSummary {
        database: config.database.clone(),
        collection: config.collection.clone(),
        rows_read,
        inserted,
        coercion,
        elapsed,
    })
}

/// One human-readable line describing how the run ended.
pub fn report(outcome: &Result<LoadSummary>) -> String {
    match outcome {
        Ok(s) => format!(
            "success: uploaded {} documents to {}.{} ({} rows read, {} non-numeric values zeroed, {:.2}s)",
            s.inserted,
            s.database,
            s.collection,
            s.rows_read,
            s.coercion.total_zeroed(),
            s.elapsed.as_secs_f64()
        ),
        Err(e) => {
            error!(error = %e, "load failed");
            if e.is_store_error() {
                return format!("error during MongoDB upload: {e}");
            }
            match e {
                LoadError::Source { .. } => format!("error reading source data: {e}"),
                _ => format!("error: {e}"),
            }
        }
    }
}
