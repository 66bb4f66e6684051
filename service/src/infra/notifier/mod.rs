//! [`Notifier`]-related implementations.

#[cfg(feature = "smtp")]
pub mod smtp;

use common::operations::Dispatch;
use derive_more::{Display, Error as StdError, From};
use tokio::sync::mpsc;
use tracerr::Traced;
use tracing as log;

use crate::domain::Notification;

#[cfg(feature = "smtp")]
pub use self::smtp::Smtp;

/// Delivery of [`Notification`]s to customers.
pub use common::Handler as Notifier;

/// Sending side of the queue of [`Notification`]s awaiting delivery.
///
/// Pushing never blocks, so committed state transitions are never held by
/// the delivery.
#[derive(Clone, Debug)]
pub struct Outbox(mpsc::UnboundedSender<Notification>);

/// Receiving side of the queue of [`Notification`]s awaiting delivery.
#[derive(Debug)]
pub struct Inbox(mpsc::UnboundedReceiver<Notification>);

impl Outbox {
    /// Creates a new [`Outbox`] along with its [`Inbox`].
    #[must_use]
    pub fn new() -> (Self, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), Inbox(rx))
    }

    /// Enqueues the provided [`Notification`] for delivery.
    ///
    /// The [`Notification`] is dropped with an error logged if the [`Inbox`]
    /// is gone.
    pub fn push(&self, notification: Notification) {
        if let Err(mpsc::error::SendError(n)) = self.0.send(notification) {
            log::error!(
                order_id = %n.order_id,
                kind = %n.kind,
                "`Notification` dropped: `Inbox` is closed",
            );
        }
    }
}

impl Inbox {
    /// Waits for the next [`Notification`].
    ///
    /// [`None`] is returned once every [`Outbox`] is dropped.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.0.recv().await
    }

    /// Returns the next already enqueued [`Notification`], if any.
    pub fn try_recv(&mut self) -> Option<Notification> {
        self.0.try_recv().ok()
    }
}

/// [`Notifier`] writing [`Notification`]s to the log instead of delivering
/// them.
#[derive(Clone, Copy, Debug, Default)]
pub struct Log;

impl Notifier<Dispatch<Notification>> for Log {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Dispatch(n): Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        log::info!(
            recipient = %n.recipient,
            subject = %n.subject,
            order_id = %n.order_id,
            "{}",
            n.body,
        );
        Ok(())
    }
}

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Smtp`] delivery error.
    #[cfg(feature = "smtp")]
    #[display("SMTP delivery failed: {_0}")]
    Smtp(smtp::Error),

    /// Recipient refused the [`Notification`].
    #[display("`{_0}` recipient is rejected")]
    #[from(ignore)]
    Rejected(#[error(not(source))] String),
}

#[cfg(test)]
mod spec {
    use common::{operations::Dispatch, Handler as _};

    use crate::domain::{
        notification::{Kind, Notification},
        order::{self, Email},
    };

    use super::{Log, Outbox};

    fn notification() -> Notification {
        Notification {
            recipient: Email::new("client@example.com").unwrap(),
            subject: "subject".to_owned(),
            body: "body".to_owned(),
            order_id: order::Id::new(),
            kind: Kind::Expired,
        }
    }

    #[tokio::test]
    async fn outbox_delivers_in_order() {
        let (outbox, mut inbox) = Outbox::new();
        let (first, second) = (notification(), notification());

        outbox.push(first.clone());
        outbox.clone().push(second.clone());

        assert_eq!(inbox.recv().await, Some(first));
        assert_eq!(inbox.try_recv(), Some(second));
        assert_eq!(inbox.try_recv(), None);

        drop(outbox);
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn push_to_closed_inbox_is_dropped() {
        let (outbox, inbox) = Outbox::new();
        drop(inbox);

        outbox.push(notification());
    }

    #[tokio::test]
    async fn log_never_fails() {
        assert!(Log.execute(Dispatch(notification())).await.is_ok());
    }
}
