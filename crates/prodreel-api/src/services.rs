//! Business logic services.

pub mod ingest;
pub mod refresh;
pub mod remove;

pub use ingest::{run_ingestion, PgVideoStore, VideoStore};
pub use refresh::{run_refresh, RefreshStore};
pub use remove::{run_removal, RemovalStore};
