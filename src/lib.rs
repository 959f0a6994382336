//! K9 Flux - Ingestion and performance metrics for K9 detection training records
//!
//! Flux turns the loosely-typed rows of a shared training spreadsheet into
//! canonical records through a deterministic pipeline: field normalization →
//! entity reconciliation → session building → metrics. The reverse direction
//! encodes new sessions into the sheet's positional row format.
//!
//! ## Modules
//!
//! - **Ingestion**: `schema`, `normalizer`, `adapters`, `dates`
//! - **Read models**: `metrics`
//! - **Command side**: `entry`, `catalog`, `encoder`, `store`
//! - **Application state**: `pipeline` (snapshot and controller), `config`

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod dates;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod types;

pub use config::DashboardConfig;
pub use encoder::SubmissionEncoder;
pub use entry::{EntryDraft, EntryQueue};
pub use error::{EntryError, FluxError, StoreError};
pub use metrics::MetricsAggregator;
pub use pipeline::{build_snapshot, payload_to_snapshot, Command, Dashboard, Snapshot};
pub use schema::{RawRow, SheetPayload};
pub use store::{HttpSheetStore, SheetStore, StoreCommand};

/// Crate version
pub const FLUX_VERSION: &str = env!("CARGO_PKG_VERSION");
