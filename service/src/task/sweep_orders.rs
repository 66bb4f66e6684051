//! [`SweepOrders`] [`Task`].

use std::{convert::Infallible, time::Duration};

use common::{
    operations::{By, Perform, Select, Start},
    Date, DateTime,
};
use smart_default::SmartDefault;
use time::{OffsetDateTime, Time, UtcOffset};
use tokio::time::sleep;
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{self, ExpireOrder, RecordReminder},
    domain::{order, Notification, Order},
    infra::{database, Database},
    read::order::list::Filter,
    Command, Service,
};

use super::Task;

/// Configuration of [`SweepOrders`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Wall-clock time of the warehouse calendar to sweep [`Order`]s at
    /// daily.
    #[default(Time::from_hms(9, 0, 0).unwrap_or(Time::MIDNIGHT))]
    pub at: Time,
}

/// [`Task`] reminding customers about their rentals ending soon and expiring
/// the overdue ones.
#[derive(Clone, Copy, Debug)]
pub struct SweepOrders;

/// Outcome of a single [`SweepOrders`] run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Report {
    /// Number of reminders enqueued.
    pub reminders: usize,

    /// Number of [`Order`]s expired.
    pub expired: usize,

    /// Number of [`Order`]s failed to be processed.
    pub failed: usize,
}

impl<Db> Task<Start<By<SweepOrders, Config>>> for Service<Db>
where
    Self: Task<
        Perform<By<SweepOrders, Date>>,
        Ok = Option<Report>,
        Err = ExecutionError,
    >,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<SweepOrders, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();

        loop {
            sleep(until_next(config.at, self.config().utc_offset)).await;

            _ = self
                .execute(Perform(By::new(self.today())))
                .await
                .map_err(|e| {
                    log::error!("`task::SweepOrders` failed: {e}");
                });
        }
    }
}

impl<Db> Task<Perform<By<SweepOrders, Date>>> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Order>, Filter>>,
        Ok = Vec<Order>,
        Err = Traced<database::Error>,
    >,
    Self: Command<
            ExpireOrder,
            Ok = Option<Order>,
            Err = Traced<command::TransitionError>,
        > + Command<
            RecordReminder,
            Ok = Option<(Order, u8)>,
            Err = Traced<command::TransitionError>,
        >,
{
    type Ok = Option<Report>;
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(by): Perform<By<SweepOrders, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();

        let Ok(_running) = self.sweep_lock.try_lock() else {
            log::info!(%today, "`task::SweepOrders` skipped: already running");
            return Ok(None);
        };

        let stored = self
            .database()
            .execute(Select(By::<Vec<Order>, _>::new(Filter {
                status: Some(order::Status::InStorage),
                ..Filter::default()
            })))
            .await
            .map_err(tracerr::wrap!())?;

        let mut report = Report::default();
        for o in stored {
            let order_id = o.id;
            if o.is_overdue(today) {
                self.expire_overdue(order_id, today, &mut report).await;
            } else {
                match self.execute(RecordReminder { order_id, today }).await {
                    Ok(Some((reminded, threshold))) => {
                        let unit = self.catalog().unit(&reminded.unit_id);
                        self.outbox().push(Notification::reminder(
                            &reminded, unit, threshold,
                        ));
                        report.reminders += 1;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        log::error!(%order_id, "failed to remind `Order`: {e}");
                        report.failed += 1;
                    }
                }
            }
        }

        log::info!(
            %today,
            reminders = report.reminders,
            expired = report.expired,
            failed = report.failed,
            "`task::SweepOrders` finished",
        );

        Ok(Some(report))
    }
}

impl<Db> Service<Db> {
    /// Expires the overdue [`Order`] within a [`SweepOrders`] run, noting
    /// the outcome in the provided [`Report`].
    ///
    /// An [`Order`] which left storage after being listed is skipped.
    async fn expire_overdue(
        &self,
        order_id: order::Id,
        today: Date,
        report: &mut Report,
    ) where
        Self: Command<
            ExpireOrder,
            Ok = Option<Order>,
            Err = Traced<command::TransitionError>,
        >,
    {
        match self.execute(ExpireOrder { order_id, today }).await {
            Ok(Some(expired)) => {
                let unit = self.catalog().unit(&expired.unit_id);
                self.outbox().push(Notification::expired(&expired, unit));
                report.expired += 1;
            }
            Ok(None) => {}
            Err(e)
                if matches!(
                    e.as_ref(),
                    command::TransitionError::InvalidTransition(_),
                ) =>
            {
                log::debug!(
                    %order_id,
                    "`Order` left storage before expiring: {e}",
                );
            }
            Err(e) => {
                log::error!(%order_id, "failed to expire `Order`: {e}");
                report.failed += 1;
            }
        }
    }
}

/// Error of [`SweepOrders`] execution.
pub type ExecutionError = Traced<database::Error>;

/// Returns [`Duration`] until the next occurrence of the provided wall-clock
/// time at the provided [`UtcOffset`].
fn until_next(at: Time, offset: UtcOffset) -> Duration {
    let now = OffsetDateTime::from(DateTime::now()).to_offset(offset);
    let mut next = now.replace_time(at);
    if next <= now {
        next += time::Duration::DAY;
    }
    Duration::try_from(next - now).unwrap_or_default()
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Insert, Perform, Select},
        Date,
    };
    use time::{Time, UtcOffset};

    use crate::{
        domain::{
            notification::Kind,
            order::{
                self,
                spec::{date, order},
            },
            Order,
        },
        infra::Database as _,
        spec::service,
        Task as _,
    };

    use super::{until_next, Report, SweepOrders};

    fn stored(start: Date) -> Order {
        let mut o = order(1000);
        _ = o.confirm_payment(start).unwrap();
        o.receive().unwrap();
        o
    }

    #[tokio::test]
    async fn reminds_once_per_threshold() {
        let (svc, mut inbox) = service();
        // Ends on 2025-01-31.
        let o = stored(date(2025, 1, 1));
        svc.database().execute(Insert(o.clone())).await.unwrap();

        let sweep =
            |d: Date| svc.execute(Perform(By::<SweepOrders, _>::new(d)));

        let report = sweep(date(2025, 1, 24)).await.unwrap().unwrap();
        assert_eq!(
            report,
            Report {
                reminders: 1,
                ..Report::default()
            },
        );
        let n = inbox.try_recv().unwrap();
        assert_eq!(n.kind, Kind::Reminder(7));
        assert_eq!(n.order_id, o.id);

        let again = sweep(date(2025, 1, 24)).await.unwrap().unwrap();
        assert_eq!(again.reminders, 0);
        assert!(inbox.try_recv().is_none());

        let off = sweep(date(2025, 1, 25)).await.unwrap().unwrap();
        assert_eq!(off, Report::default());
        assert!(inbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn expires_overdue_with_single_notice() {
        let (svc, mut inbox) = service();
        let overdue = stored(date(2025, 1, 1));
        let mut paid = order(1000);
        _ = paid.confirm_payment(date(2025, 1, 1)).unwrap();
        for o in [&overdue, &paid] {
            svc.database().execute(Insert(o.clone())).await.unwrap();
        }

        let sweep =
            |d: Date| svc.execute(Perform(By::<SweepOrders, _>::new(d)));

        let report = sweep(date(2025, 2, 1)).await.unwrap().unwrap();
        assert_eq!(
            report,
            Report {
                expired: 1,
                ..Report::default()
            },
        );
        let n = inbox.try_recv().unwrap();
        assert_eq!(n.kind, Kind::Expired);
        assert_eq!(n.order_id, overdue.id);
        assert!(inbox.try_recv().is_none());

        let expired = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(overdue.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(expired.status, order::Status::Expired);
        let untouched = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(paid.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, order::Status::Paid);

        let again = sweep(date(2025, 2, 2)).await.unwrap().unwrap();
        assert_eq!(again, Report::default());
        assert!(inbox.try_recv().is_none());
    }

    #[tokio::test]
    async fn ignores_order_picked_up_meanwhile() {
        let (svc, mut inbox) = service();
        let mut picked = stored(date(2025, 1, 1));
        picked.complete_pickup().unwrap();
        svc.database().execute(Insert(picked.clone())).await.unwrap();

        let mut report = Report::default();
        svc.expire_overdue(picked.id, date(2025, 2, 1), &mut report)
            .await;

        assert_eq!(report, Report::default());
        assert!(inbox.try_recv().is_none());
        let kept = svc
            .database()
            .execute(Select(By::<Option<Order>, _>::new(picked.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.status, order::Status::Completed);
    }

    #[tokio::test]
    async fn skips_if_running() {
        let (svc, _inbox) = service();

        let running = svc.sweep_lock.lock().await;
        let skipped = svc
            .execute(Perform(By::<SweepOrders, _>::new(date(2025, 1, 1))))
            .await
            .unwrap();
        assert!(skipped.is_none());

        drop(running);
        let done = svc
            .execute(Perform(By::<SweepOrders, _>::new(date(2025, 1, 1))))
            .await
            .unwrap();
        assert_eq!(done, Some(Report::default()));
    }

    #[test]
    fn waits_at_most_a_day() {
        let wait = until_next(Time::MIDNIGHT, UtcOffset::UTC);

        assert!(wait.as_secs() <= 24 * 60 * 60);
    }
}
