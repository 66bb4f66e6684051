//! [`Config`]-related definitions.

use std::sync::Arc;

use common::{money::Currency, Money};
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use service::{
    domain::{catalog, unit},
    infra::payment,
};
use smart_default::SmartDefault;
use time::{macros::format_description, UtcOffset};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// SMTP configuration.
    pub smtp: Smtp,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// Bearer secret the payment provider and operators authenticate with.
    #[default(SecretString::from("secret"))]
    pub secret: SecretString,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Base URL of the payment provider's checkout page.
    #[default("https://pay.example.com/checkout".to_owned())]
    pub payment_url: String,

    /// Offset of the warehouse calendar from UTC, in hours.
    #[default(3)]
    pub utc_offset_hours: i8,

    /// Catalog of the rented units.
    pub catalog: Catalog,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl TryFrom<Service> for service::Config {
    type Error = InvalidService;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            payment_url,
            utc_offset_hours,
            catalog,
            tasks: Tasks { sweep_orders },
        } = value;

        let payment = payment::Link::new(&payment_url)
            .ok_or(InvalidService::PaymentUrl(payment_url))?;
        let utc_offset = UtcOffset::from_hms(utc_offset_hours, 0, 0)
            .map_err(InvalidService::UtcOffset)?;
        let at = time::Time::parse(
            &sweep_orders.at,
            format_description!("[hour]:[minute]"),
        )
        .map_err(|_| InvalidService::SweepTime(sweep_orders.at))?;

        Ok(Self {
            catalog: Arc::new(catalog.try_into()?),
            payment,
            utc_offset,
            sweep_orders: service::task::sweep_orders::Config { at },
        })
    }
}

/// Catalog configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Catalog {
    /// Storage units offered for rent.
    #[default(vec![
        Unit {
            id: "small".to_owned(),
            name: "Small box".to_owned(),
            size: "1 m³".to_owned(),
            dimensions: "1 × 1 × 1 m".to_owned(),
            description: "Seasonal clothes, books, a few boxes.".to_owned(),
            price_per_month: Money::new(1000, Currency::Rub),
        },
        Unit {
            id: "medium".to_owned(),
            name: "Medium box".to_owned(),
            size: "3 m³".to_owned(),
            dimensions: "1.5 × 1 × 2 m".to_owned(),
            description: "Furniture of a single room.".to_owned(),
            price_per_month: Money::new(3000, Currency::Rub),
        },
    ])]
    pub units: Vec<Unit>,

    /// Price multiplier applied when a customer delivers the goods by
    /// themselves.
    #[default(Decimal::new(8, 1))]
    pub self_delivery_factor: Decimal,

    /// Keywords of items forbidden for storage.
    pub prohibited: Vec<String>,

    /// Keywords of items explicitly allowed for storage.
    pub allowed: Vec<String>,
}

impl TryFrom<Catalog> for service::domain::Catalog {
    type Error = InvalidService;

    fn try_from(value: Catalog) -> Result<Self, Self::Error> {
        let Catalog {
            units,
            self_delivery_factor,
            prohibited,
            allowed,
        } = value;

        let units = units
            .into_iter()
            .map(|u| {
                Ok(service::domain::Unit {
                    id: unit::Id::new(u.id.clone())
                        .ok_or(InvalidService::UnitId(u.id))?,
                    name: u.name,
                    size: u.size,
                    dimensions: u.dimensions,
                    description: u.description,
                    price_per_month: u.price_per_month,
                })
            })
            .collect::<Result<Vec<_>, InvalidService>>()?;
        let delivery = catalog::Delivery::new(self_delivery_factor)
            .ok_or(InvalidService::DeliveryFactor(self_delivery_factor))?;

        Self::new(
            units,
            delivery,
            catalog::Keywords {
                prohibited,
                allowed,
            },
        )
        .map_err(InvalidService::Catalog)
    }
}

/// Storage unit configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Unit {
    /// Unique ID of the unit.
    pub id: String,

    /// Human-readable name of the unit.
    pub name: String,

    /// Volume of the unit.
    #[serde(default)]
    pub size: String,

    /// Dimensions of the unit.
    #[serde(default)]
    pub dimensions: String,

    /// Free-form description of the unit.
    #[serde(default)]
    pub description: String,

    /// Monthly rent rate of the unit, like `1000RUB`.
    pub price_per_month: Money,
}

/// Service tasks configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Tasks {
    /// `SweepOrders` task configuration.
    pub sweep_orders: SweepOrders,
}

/// `SweepOrders` task configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SweepOrders {
    /// Wall-clock `HH:MM` time of the warehouse calendar to sweep at.
    #[default("09:00".to_owned())]
    pub at: String,
}

/// Error of converting [`Service`] configuration.
#[derive(Debug, Display, Error)]
pub enum InvalidService {
    /// Catalog is inconsistent.
    #[display("invalid catalog: {_0}")]
    Catalog(catalog::Error),

    /// Self-delivery factor is out of the `(0, 1]` range.
    #[display("self-delivery factor `{_0}` is out of `(0, 1]` range")]
    DeliveryFactor(#[error(not(source))] Decimal),

    /// Payment URL is not an HTTP(S) one.
    #[display("`{_0}` is not a valid payment URL")]
    PaymentUrl(#[error(not(source))] String),

    /// Sweep time is not in `HH:MM` format.
    #[display("`{_0}` is not a valid `HH:MM` time")]
    SweepTime(#[error(not(source))] String),

    /// Unit ID is empty.
    #[display("`{_0}` is not a valid unit ID")]
    UnitId(#[error(not(source))] String),

    /// UTC offset is out of range.
    #[display("invalid UTC offset: {_0}")]
    UtcOffset(time::error::ComponentRange),
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// SMTP configuration.
///
/// Notifications are written to the log when disabled.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Smtp {
    /// Indicator whether notifications are delivered via email.
    pub enabled: bool,

    /// Host of the SMTP relay.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port of the SMTP relay.
    #[default(587)]
    pub port: u16,

    /// Indicator whether `STARTTLS` is used instead of an implicit TLS.
    #[default(true)]
    pub starttls: bool,

    /// Username to authenticate with.
    pub username: String,

    /// Password to authenticate with.
    #[default(SecretString::from(""))]
    pub password: SecretString,

    /// Sender address of the notifications.
    #[default("Self Storage <noreply@example.com>".to_owned())]
    pub from: String,
}

impl From<Smtp> for service::infra::notifier::smtp::Config {
    fn from(value: Smtp) -> Self {
        let Smtp {
            enabled: _,
            host,
            port,
            starttls,
            username,
            password,
            from,
        } = value;

        Self {
            host,
            port,
            starttls,
            username,
            password,
            from,
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain::unit;

    use super::{Config, InvalidService, Service};

    #[test]
    fn defaults_are_valid() {
        let config = service::Config::try_from(Config::default().service)
            .unwrap();

        assert!(config
            .catalog
            .unit(&unit::Id::new("small").unwrap())
            .is_some());
        assert_eq!(config.sweep_orders.at.hour(), 9);
        assert_eq!(config.utc_offset.whole_hours(), 3);
    }

    #[test]
    fn rejects_malformed() {
        let mut invalid = Service::default();
        invalid.tasks.sweep_orders.at = "25:00".to_owned();
        assert!(matches!(
            service::Config::try_from(invalid),
            Err(InvalidService::SweepTime(_)),
        ));

        let mut invalid = Service::default();
        invalid.payment_url = "ftp://pay".to_owned();
        assert!(matches!(
            service::Config::try_from(invalid),
            Err(InvalidService::PaymentUrl(_)),
        ));

        let mut invalid = Service::default();
        invalid.catalog.units.clear();
        assert!(matches!(
            service::Config::try_from(invalid),
            Err(InvalidService::Catalog(_)),
        ));
    }
}
