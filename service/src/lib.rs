//! Business logic of the Credix loan tracker.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;

use common::{money::Currency, Date, DateTimeOf};
use time::UtcOffset;

#[cfg(doc)]
use common::DateTime;
#[cfg(doc)]
use infra::Database;

use self::domain::{loan, Loan};

pub use self::{command::Command, query::Query};

/// [`Service`] configuration.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// [`Currency`] all the [`Loan`]s are lent and reported in.
    pub currency: Currency,

    /// [`UtcOffset`] calendar days are observed at.
    pub utc_offset: UtcOffset,

    /// [`loan::Rates`] late [`Loan`]s are charged with.
    pub rates: loan::Rates,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    #[must_use]
    pub fn new(config: Config, database: Db) -> Self {
        Self { config, database }
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the calendar [`Date`] the provided [`DateTime`] falls on, as
    /// observed at the configured [`UtcOffset`].
    #[must_use]
    pub fn date_of<Of: ?Sized>(&self, at: DateTimeOf<Of>) -> Date {
        at.date_at(self.config.utc_offset)
    }

    /// Computes a [`read::loan::Statement`] of the provided [`Loan`] as of
    /// `today`, using the configured [`loan::Rates`].
    #[must_use]
    pub fn statement(&self, loan: Loan, today: Date) -> read::loan::Statement {
        read::loan::Statement::new(loan, &self.config.rates, today)
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, DateTime};
    use time::UtcOffset;

    use crate::{domain::loan::Rates, infra::Memory};

    use super::{Config, Service};

    /// Creates a new [`Service`] backed by an empty [`Memory`] database.
    pub(crate) fn service() -> Service<Memory> {
        Service::new(
            Config {
                currency: Currency::Brl,
                utc_offset: UtcOffset::from_hms(-3, 0, 0).unwrap(),
                rates: Rates::default(),
            },
            Memory::default(),
        )
    }

    #[test]
    fn dates_are_observed_at_offset() {
        let svc = service();
        let at = DateTime::from_rfc3339("2024-06-15T02:00:00Z").unwrap();

        assert_eq!(svc.date_of(at).to_string(), "2024-06-14");
    }
}
