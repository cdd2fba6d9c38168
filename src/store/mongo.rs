use mongodb::{
    bson::{doc, Document},
    Client, Collection, Database,
};
use tracing::{debug, info, instrument};

use super::DocumentStore;
use crate::{
    config::LoaderConfig,
    error::{LoadError, Result},
};

/// [`DocumentStore`] over a MongoDB deployment.
pub struct MongoStore {
    client: Client,
    database: Database,
    collection: Collection<Document>,
    staging: Collection<Document>,
}

impl MongoStore {
    /// Open a client and ping the target database so an unreachable server
    /// fails here rather than on the first write.
    #[instrument(level = "info", skip(config), fields(database = %config.database, collection = %config.collection))]
    pub async fn connect(config: &LoaderConfig) -> Result<Self> {
        let client = Client::with_uri_str(&config.mongodb_uri)
            .await
            .map_err(LoadError::connection)?;
        let database = client.database(&config.database);

        if let Err(e) = database.run_command(doc! { "ping": 1 }).await {
            client.shutdown().await;
            return Err(LoadError::connection(e));
        }
        info!("connected");

        let collection = database.collection::<Document>(&config.collection);
        let staging = database.collection::<Document>(&config.staging_collection());
        Ok(Self {
            client,
            database,
            collection,
            staging,
        })
    }

    fn namespace(&self, coll: &Collection<Document>) -> String {
        format!("{}.{}", self.database.name(), coll.name())
    }
}

impl DocumentStore for MongoStore {
    async fn delete_all(&mut self) -> Result<u64> {
        let res = self
            .collection
            .delete_many(doc! {})
            .await
            .map_err(|e| LoadError::store("delete", e))?;
        Ok(res.deleted_count)
    }

    async fn insert_all(&mut self, docs: Vec<Document>) -> Result<usize> {
        let res = self
            .collection
            .insert_many(docs)
            .await
            .map_err(|e| LoadError::store("insert", e))?;
        Ok(res.inserted_ids.len())
    }

    async fn clear_staging(&mut self) -> Result<()> {
        debug!(namespace = %self.namespace(&self.staging), "dropping staging collection");
        self.staging
            .drop()
            .await
            .map_err(|e| LoadError::store("drop staging", e))
    }

    async fn insert_staging(&mut self, docs: Vec<Document>) -> Result<usize> {
        let res = self
            .staging
            .insert_many(docs)
            .await
            .map_err(|e| LoadError::store("insert staging", e))?;
        Ok(res.inserted_ids.len())
    }

    async fn promote_staging(&mut self) -> Result<()> {
        let cmd = doc! {
            "renameCollection": self.namespace(&self.staging),
            "to": self.namespace(&self.collection),
            "dropTarget": true,
        };
        self.client
            .database("admin")
            .run_command(cmd)
            .await
            .map_err(|e| LoadError::store("rename", e))?;
        Ok(())
    }

    async fn close(self) {
        self.client.shutdown().await;
        debug!("client shut down");
    }
}
