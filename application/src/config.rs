//! [`Config`]-related definitions.

use std::time::Duration;

use common::money::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use service::domain::loan::Rates;
use smart_default::SmartDefault;
use time::{error::ComponentRange, UtcOffset};

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

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
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [`Currency`] all the loans are lent in.
    #[default(Currency::Brl)]
    pub currency: Currency,

    /// Offset from UTC (in whole hours) calendar days are observed at.
    #[default(-3)]
    pub utc_offset_hours: i8,

    /// [`Rates`] late loans are charged with.
    pub ledger: Rates,
}

impl TryFrom<Service> for service::Config {
    type Error = ComponentRange;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            currency,
            utc_offset_hours,
            ledger,
        } = value;

        Ok(Self {
            currency,
            utc_offset: UtcOffset::from_hms(utc_offset_hours, 0, 0)?,
            rates: ledger,
        })
    }
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
    #[default("credix".to_owned())]
    pub dbname: String,

    /// Connection pool configuration.
    pub pool: Pool,
}

/// Postgres connection pool configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Pool {
    /// Maximum number of connections in the pool.
    #[default(16)]
    pub max_size: usize,

    /// Time to wait for a free connection before failing.
    #[default(Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        use service::infra::postgres::{PoolConfig, Timeouts};

        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
            pool:
                Pool {
                    max_size,
                    wait_timeout,
                },
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            pool: Some(PoolConfig {
                max_size,
                timeouts: Timeouts {
                    wait: Some(wait_timeout),
                    ..Timeouts::default()
                },
                ..PoolConfig::default()
            }),
            ..Self::default()
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
    use common::money::Currency;

    use super::{Config, Service};

    #[test]
    fn defaults_to_brazilian_deployment() {
        let conf = Config::new("non-existent.toml").unwrap();

        assert_eq!(conf.service.currency, Currency::Brl);
        assert_eq!(conf.service.utc_offset_hours, -3);
        assert_eq!(conf.server.port, 8080);
    }

    #[test]
    fn converts_offset_hours() {
        let conf = service::Config::try_from(Service::default()).unwrap();

        assert_eq!(conf.utc_offset.whole_hours(), -3);
        assert_eq!(conf.rates, Default::default());
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let service = Service {
            utc_offset_hours: 30,
            ..Service::default()
        };

        assert!(service::Config::try_from(service).is_err());
    }
}
