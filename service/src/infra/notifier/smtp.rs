//! [`Smtp`] [`Notifier`] implementation.

use common::operations::Dispatch;
use derive_more::{Display, Error as StdError, From};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport as _, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret as _, SecretString};
use tracerr::Traced;

use crate::{
    domain::Notification,
    infra::notifier::{self, Notifier},
};

/// [`Smtp`] [`Notifier`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Host of the SMTP relay.
    pub host: String,

    /// Port of the SMTP relay.
    pub port: u16,

    /// Indicator whether `STARTTLS` should be used instead of an implicit
    /// TLS connection.
    pub starttls: bool,

    /// Username to authenticate with.
    pub username: String,

    /// Password to authenticate with.
    pub password: SecretString,

    /// Sender address of the [`Notification`]s, like
    /// `Self Storage <noreply@example.com>`.
    pub from: String,
}

/// [`Notifier`] delivering [`Notification`]s via email.
#[derive(Clone, Debug)]
pub struct Smtp {
    /// Sender [`Mailbox`].
    from: Mailbox,

    /// Transport to the SMTP relay.
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl Smtp {
    /// Creates a new [`Smtp`] [`Notifier`] out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the sender address is malformed or the relay cannot be set up.
    pub fn new(config: Config) -> Result<Self, Traced<notifier::Error>> {
        let Config {
            host,
            port,
            starttls,
            username,
            password,
            from,
        } = config;

        let from = from
            .parse::<Mailbox>()
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        let relay = if starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
        }
        .map_err(tracerr::from_and_wrap!(=> Error))
        .map_err(tracerr::map_from)?;

        let transport = relay
            .port(port)
            .credentials(Credentials::new(
                username,
                password.expose_secret().to_owned(),
            ))
            .build();

        Ok(Self { from, transport })
    }
}

impl Notifier<Dispatch<Notification>> for Smtp {
    type Ok = ();
    type Err = Traced<notifier::Error>;

    async fn execute(
        &self,
        Dispatch(n): Dispatch<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let to = n.recipient.as_ref().parse::<Mailbox>().map_err(|_| {
            tracerr::new!(notifier::Error::Rejected(n.recipient.to_string()))
        })?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(n.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(n.body)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;

        self.transport
            .send(message)
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)
            .map(drop)
    }
}

/// [`Smtp`] delivery error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Malformed email address.
    #[display("Malformed email address: {_0}")]
    Address(lettre::address::AddressError),

    /// Failed to build a [`Message`].
    #[display("Failed to build `Message`: {_0}")]
    Message(lettre::error::Error),

    /// SMTP transport error.
    #[display("SMTP transport failed: {_0}")]
    Transport(lettre::transport::smtp::Error),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretString;

    use super::{Config, Smtp};

    fn config(from: &str) -> Config {
        Config {
            host: "smtp.example.com".to_owned(),
            port: 465,
            starttls: false,
            username: "user".to_owned(),
            password: SecretString::from("password"),
            from: from.to_owned(),
        }
    }

    #[test]
    fn rejects_malformed_sender() {
        let valid = config("Self Storage <noreply@example.com>");

        assert!(Smtp::new(valid).is_ok());
        assert!(Smtp::new(config("not an address")).is_err());
    }
}
