//! End-to-end evaluation of one filter selection.
use crate::aggregate::aggregate;
use crate::charts::{ChartKind, ChartSet};
use crate::filter::{self, FilterOptions, FilterSpec};
use crate::insight::describe;
use crate::metrics::{self, MetricsSnapshot};
use crate::types::{FilteredView, Table};
use serde::Serialize;
use tracing::info;

/// The insight sentence for one chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub chart: ChartKind,
    pub title: &'static str,
    pub text: String,
}

/// Everything the presentation layer renders for one [`FilterSpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub filters: FilterSpec,
    pub active_filter_count: usize,
    pub row_count: usize,
    pub metrics: MetricsSnapshot,
    pub charts: ChartSet,
    pub insights: Vec<Insight>,
    #[serde(skip)]
    pub view: FilteredView,
}

/// Holds the loaded table for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct Session {
    table: Table,
}

impl Session {
    pub fn new(table: Table) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn options(&self) -> FilterOptions {
        filter::options(&self.table)
    }

    /// Run filter → metrics → charts → insights for `spec`.
    pub fn evaluate(&self, spec: &FilterSpec) -> Evaluation {
        let view = filter::apply(&self.table, spec);
        let metrics = metrics::compute(&view, &self.table, spec);
        let charts = aggregate(&view);
        let insights = charts
            .iter()
            .map(|dataset| Insight {
                chart: dataset.kind(),
                title: dataset.kind().title(),
                text: describe(dataset),
            })
            .collect();
        info!(
            rows = view.len(),
            active_filters = view.active_filter_count(),
            "evaluated filter selection"
        );
        Evaluation {
            filters: spec.clone(),
            active_filter_count: view.active_filter_count(),
            row_count: view.len(),
            metrics,
            charts,
            insights,
            view,
        }
    }
}
