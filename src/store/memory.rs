//! In-process store used by the loader tests.

use mongodb::bson::Document;
use std::sync::{Arc, Mutex};

use super::DocumentStore;
use crate::error::{LoadError, Result};

#[derive(Debug, Default)]
pub struct MemoryState {
    pub documents: Vec<Document>,
    pub staging: Option<Vec<Document>>,
    pub closed: bool,
    /// Operations in the order they ran.
    pub operations: Vec<&'static str>,
    /// Make the named operation fail once reached.
    pub fail_on: Option<&'static str>,
}

/// Cloning shares the underlying state, so a test can keep a handle
/// after the loader consumes the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::default();
        store.state().documents = documents;
        store
    }

    pub fn failing_on(self, operation: &'static str) -> Self {
        self.state().fail_on = Some(operation);
        self
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        let mut st = self.state();
        st.operations.push(operation);
        if st.fail_on == Some(operation) {
            return Err(LoadError::store(operation, "injected failure"));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn delete_all(&mut self) -> Result<u64> {
        self.record("delete")?;
        let mut st = self.state();
        let n = st.documents.len() as u64;
        st.documents.clear();
        Ok(n)
    }

    async fn insert_all(&mut self, docs: Vec<Document>) -> Result<usize> {
        self.record("insert")?;
        let n = docs.len();
        self.state().documents.extend(docs);
        Ok(n)
    }

    async fn clear_staging(&mut self) -> Result<()> {
        self.record("drop staging")?;
        self.state().staging = None;
        Ok(())
    }

    async fn insert_staging(&mut self, docs: Vec<Document>) -> Result<usize> {
        self.record("insert staging")?;
        let n = docs.len();
        self.state().staging.get_or_insert_with(Vec::new).extend(docs);
        Ok(n)
    }

    async fn promote_staging(&mut self) -> Result<()> {
        self.record("rename")?;
        let mut st = self.state();
        match st.staging.take() {
            Some(staged) => {
                st.documents = staged;
                Ok(())
            }
            None => Err(LoadError::store("rename", "source namespace does not exist")),
        }
    }

    async fn close(self) {
        let mut st = self.state();
        st.operations.push("close");
        st.closed = true;
    }
}
