//! Campus-placement analytics core.
//!
//! A validated [`Table`] is loaded once per session. Each [`FilterSpec`]
//! produces a [`FilteredView`], a [`MetricsSnapshot`], ten chart datasets
//! and one insight sentence per dataset, all pure functions of the table
//! and the spec.
pub mod aggregate;
pub mod charts;
pub mod error;
pub mod filter;
pub mod insight;
pub mod loader;
pub mod metrics;
pub mod output;
pub mod session;
pub mod types;
pub mod util;

#[cfg(test)]
mod fixtures;

pub use aggregate::aggregate;
pub use charts::{ChartDataset, ChartKind, ChartSet, Correlation};
pub use error::SchemaError;
pub use filter::{apply as filter, Bounds, FilterOptions, FilterSpec};
pub use insight::{describe, NO_DATA_MESSAGE};
pub use loader::{load_table, read_raw, read_table, validate};
pub use metrics::{compute as metrics, Kpi, MetricsSnapshot};
pub use session::{Evaluation, Insight, Session};
pub use types::{FilteredView, RawTable, Record, Table};
