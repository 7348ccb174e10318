//! API layer
//!
//! HTTP handlers for:
//! - Document uploads
//! - JSON backups and the most-recent-backup lookup
//! - Metrics (Prometheus)

mod backup;
pub mod metrics;
mod upload;

pub use backup::{backup_json, latest_backup};
pub use metrics::metrics_router;
pub use upload::upload_files;
