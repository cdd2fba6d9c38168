pub mod config;
pub mod error;
pub mod loader;
pub mod source;
pub mod store;
pub mod transform;

pub use config::{LoaderConfig, ReplaceMode};
pub use error::{LoadError, Result};
pub use loader::{upload, LoadSummary};
pub use source::{Dataset, Record, Value};
