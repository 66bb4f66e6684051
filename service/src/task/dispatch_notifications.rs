//! [`DispatchNotifications`] [`Task`].

use std::convert::Infallible;

use common::operations::{Dispatch, Perform, Start};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::Notification,
    infra::{
        notifier::{self, Inbox},
        Notifier,
    },
};

use super::Task;

/// [`Task`] delivering [`Notification`]s enqueued into an [`Outbox`] via a
/// [`Notifier`].
///
/// Failed deliveries are logged and never retried.
///
/// [`Outbox`]: crate::infra::Outbox
#[derive(Clone, Copy, Debug)]
pub struct DispatchNotifications<N> {
    /// [`Notifier`] delivering [`Notification`]s.
    notifier: N,
}

impl<N> DispatchNotifications<N> {
    /// Creates a new [`DispatchNotifications`] [`Task`] delivering via the
    /// provided [`Notifier`].
    #[must_use]
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }
}

impl<N> Task<Start<Inbox>> for DispatchNotifications<N>
where
    Self: Task<Perform<Notification>, Ok = (), Err = ExecutionError>,
{
    type Ok = ();
    type Err = Infallible;

    /// Delivers [`Notification`]s one by one until every [`Outbox`] is
    /// dropped.
    ///
    /// [`Outbox`]: crate::infra::Outbox
    async fn execute(
        &self,
        Start(mut inbox): Start<Inbox>,
    ) -> Result<Self::Ok, Self::Err> {
        while let Some(n) = inbox.recv().await {
            _ = self.execute(Perform(n)).await;
        }
        log::info!("`task::DispatchNotifications` stopped: `Outbox` is gone");
        Ok(())
    }
}

impl<N> Task<Perform<Notification>> for DispatchNotifications<N>
where
    N: Notifier<
        Dispatch<Notification>,
        Ok = (),
        Err = Traced<notifier::Error>,
    >,
{
    type Ok = ();
    type Err = ExecutionError;

    async fn execute(
        &self,
        Perform(n): Perform<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let (recipient, subject, order_id) =
            (n.recipient.clone(), n.subject.clone(), n.order_id);

        self.notifier
            .execute(Dispatch(n))
            .await
            .map_err(tracerr::wrap!())
            .inspect_err(|e| {
                log::error!(
                    %recipient,
                    %subject,
                    %order_id,
                    "failed to deliver `Notification`: {e}",
                );
            })
    }
}

/// Error of [`DispatchNotifications`] execution.
pub type ExecutionError = Traced<notifier::Error>;

#[cfg(test)]
mod spec {
    use std::sync::{Arc, Mutex};

    use common::operations::{Dispatch, Perform, Start};
    use tracerr::Traced;

    use crate::{
        domain::{
            notification::{Kind, Notification},
            order::{self, Email},
        },
        infra::{notifier, Notifier, Outbox},
        Task as _,
    };

    use super::DispatchNotifications;

    /// [`Notifier`] recording delivered [`Notification`]s and rejecting
    /// the ones addressed to `bounce@example.com`.
    #[derive(Clone, Debug, Default)]
    struct Recording(Arc<Mutex<Vec<Notification>>>);

    impl Notifier<Dispatch<Notification>> for Recording {
        type Ok = ();
        type Err = Traced<notifier::Error>;

        async fn execute(
            &self,
            Dispatch(n): Dispatch<Notification>,
        ) -> Result<Self::Ok, Self::Err> {
            if n.recipient.as_ref() == "bounce@example.com" {
                return Err(tracerr::new!(notifier::Error::Rejected(
                    n.recipient.to_string(),
                )));
            }
            self.0.lock().unwrap().push(n);
            Ok(())
        }
    }

    fn notification(email: &str) -> Notification {
        Notification {
            recipient: Email::new(email).unwrap(),
            subject: "Rental extended".to_owned(),
            body: String::new(),
            order_id: order::Id::new(),
            kind: Kind::Extended,
        }
    }

    #[tokio::test]
    async fn failure_does_not_stop_delivery() {
        let recording = Recording::default();
        let task = DispatchNotifications::new(recording.clone());
        let (outbox, inbox) = Outbox::new();

        let first = notification("first@example.com");
        let last = notification("last@example.com");
        outbox.push(first.clone());
        outbox.push(notification("bounce@example.com"));
        outbox.push(last.clone());
        drop(outbox);

        task.execute(Start(inbox)).await.unwrap();

        assert_eq!(*recording.0.lock().unwrap(), [first, last]);
    }

    #[tokio::test]
    async fn reports_rejection() {
        let task = DispatchNotifications::new(Recording::default());

        let res = task
            .execute(Perform(notification("bounce@example.com")))
            .await;

        assert!(matches!(
            res.unwrap_err().as_ref(),
            notifier::Error::Rejected(_),
        ));
    }
}
