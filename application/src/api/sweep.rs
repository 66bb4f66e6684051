//! Operator-triggered sweep of [`Order`]s.
//!
//! [`Order`]: service::domain::Order

use axum::{Extension, Json};
use common::operations::{By, Perform};
use serde::Serialize;
use service::{
    task::{sweep_orders::Report, SweepOrders},
    Task as _,
};

use crate::{auth::Authorized, AsError, Error, Service};

/// Outcome of a sweep run.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "UPPERCASE")]
pub enum Outcome {
    /// Sweep is finished.
    Finished {
        /// Number of reminders enqueued.
        reminders: usize,

        /// Number of orders expired.
        expired: usize,

        /// Number of orders failed to be processed.
        failed: usize,
    },

    /// Sweep is skipped, since another one is still running.
    Skipped,
}

impl From<Option<Report>> for Outcome {
    fn from(report: Option<Report>) -> Self {
        report.map_or(Self::Skipped, |r| Self::Finished {
            reminders: r.reminders,
            expired: r.expired,
            failed: r.failed,
        })
    }
}

/// Sweeps the stored orders right away, as of today.
#[tracing::instrument(skip_all, fields(api.name = "sweep"))]
pub async fn run(
    _: Authorized,
    Extension(service): Extension<Service>,
) -> Result<Json<Outcome>, Error> {
    service
        .execute(Perform(By::<SweepOrders, _>::new(service.today())))
        .await
        .map(|r| Json(r.into()))
        .map_err(AsError::into_error)
}

#[cfg(test)]
mod spec {
    use service::task::sweep_orders::Report;

    use super::Outcome;

    #[test]
    fn tags_outcome() {
        let finished = Outcome::from(Some(Report {
            reminders: 2,
            expired: 1,
            failed: 0,
        }));
        assert_eq!(
            serde_json::to_value(finished).unwrap(),
            serde_json::json!({
                "outcome": "FINISHED",
                "reminders": 2,
                "expired": 1,
                "failed": 0,
            }),
        );

        assert_eq!(
            serde_json::to_value(Outcome::from(None)).unwrap(),
            serde_json::json!({ "outcome": "SKIPPED" }),
        );
    }
}
