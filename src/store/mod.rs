// src/store/mod.rs
#[cfg(test)]
pub mod memory;
pub mod mongo;

use mongodb::bson::Document;
use tracing::{debug, info};

use crate::{config::ReplaceMode, error::Result};

pub use mongo::MongoStore;

/// The target collection of a load, plus a side collection for staged replaces.
///
/// Implementations run each call to completion before returning; callers
/// never overlap calls.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Remove every document from the target. Returns how many were removed.
    async fn delete_all(&mut self) -> Result<u64>;

    /// Insert `docs` into the target. Returns how many were inserted.
    async fn insert_all(&mut self, docs: Vec<Document>) -> Result<usize>;

    /// Drop the staging collection if it exists.
    async fn clear_staging(&mut self) -> Result<()>;

    async fn insert_staging(&mut self, docs: Vec<Document>) -> Result<usize>;

    /// Atomically replace the target with the staging collection.
    async fn promote_staging(&mut self) -> Result<()>;

    /// Release the connection.
    async fn close(self)
    where
        Self: Sized;

    /// Make `docs` the full contents of the target.
    async fn replace_all(&mut self, docs: Vec<Document>, mode: ReplaceMode) -> Result<usize> {
        if docs.is_empty() || mode == ReplaceMode::DeleteThenInsert {
            let deleted = self.delete_all().await?;
            info!(deleted, "cleared target collection");
            if docs.is_empty() {
                return Ok(0);
            }
            return self.insert_all(docs).await;
        }

        self.clear_staging().await?;
        let inserted = self
            .insert_staging(docs)
            .await
            .inspect_err(|_| debug!("staging collection left behind; dropped on next staged run"))?;
        info!(inserted, "staged documents");
        self.promote_staging()
            .await
            .inspect_err(|_| debug!("staging collection left behind; dropped on next staged run"))?;
        info!("staging collection promoted");
        Ok(inserted)
    }
}
