//! [`Loan`] definitions.

pub mod ledger;
pub mod reminder;

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateOf, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::client;

pub use self::{
    ledger::{Rates, Snapshot, Status},
    reminder::Reminder,
};

/// Money lent to a [`Client`].
///
/// [`Client`]: crate::domain::Client
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Loan {
    /// ID of this [`Loan`].
    pub id: Id,

    /// ID of the [`Client`] who borrowed this [`Loan`].
    ///
    /// [`Client`]: crate::domain::Client
    pub client_id: client::Id,

    /// Original amount lent, excluding any interest or fines.
    pub principal: Money,

    /// [`Date`] this [`Loan`] began running its [`Term`].
    pub start_date: StartDate,

    /// [`Term`] of this [`Loan`].
    pub term: Term,

    /// [`Date`] this [`Loan`] was settled, if it was.
    pub paid_date: Option<PaidDate>,

    /// [`DateTime`] when this [`Loan`] was created.
    pub created_at: CreationDateTime,
}

impl Loan {
    /// Returns the [`DueDate`] of this [`Loan`].
    #[must_use]
    pub fn due_date(&self) -> DueDate {
        self.start_date.plus_days(self.term.days()).coerce()
    }

    /// Indicates whether a payment has been recorded for this [`Loan`].
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.paid_date.is_some()
    }

    /// Computes the [`Snapshot`] of this [`Loan`] as of the provided `today`.
    #[must_use]
    pub fn snapshot(&self, rates: &Rates, today: Date) -> Snapshot {
        Snapshot::compute(
            rates,
            self.principal,
            self.start_date,
            self.paid_date,
            self.term,
            today,
        )
    }
}

/// ID of a [`Loan`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new [`Id`], ordered after all the previously created ones.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

/// Number of days a [`Loan`] runs before becoming due.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct Term(u16);

impl Term {
    /// [`Term`] applied when none is specified.
    pub const DEFAULT: Self = Self(20);

    /// Longest allowed [`Term`], in days.
    pub const MAX_DAYS: u16 = 3650;

    /// Creates a new [`Term`] if the given number of `days` is positive and
    /// doesn't exceed [`Term::MAX_DAYS`].
    #[must_use]
    pub fn new(days: u16) -> Option<Self> {
        (1..=Self::MAX_DAYS).contains(&days).then_some(Self(days))
    }

    /// Returns the number of days of this [`Term`].
    #[must_use]
    pub const fn days(self) -> u16 {
        self.0
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for Term {
    postgres_types::accepts!(INT4);

    fn from_sql(
        ty: &postgres_types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        let days = i32::from_sql(ty, raw)?;
        u16::try_from(days)
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| format!("invalid `Term` value: {days}").into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Term {
    postgres_types::accepts!(INT4);
    postgres_types::to_sql_checked!();

    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<postgres_types::IsNull, Box<dyn std::error::Error + Sync + Send>>
    {
        i32::from(self.0).to_sql(ty, w)
    }
}

impl TryFrom<u16> for Term {
    type Error = &'static str;

    fn try_from(days: u16) -> Result<Self, Self::Error> {
        Self::new(days).ok_or("`Term` must be within 1..=3650 days")
    }
}

impl FromStr for Term {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u16>()
            .map_err(|_| "invalid `Term`")
            .and_then(Self::try_from)
    }
}

/// [`Date`] when a [`Loan`] started.
pub type StartDate = DateOf<(Loan, unit::Start)>;

/// [`Date`] when a [`Loan`] was paid.
pub type PaidDate = DateOf<(Loan, unit::Payment)>;

/// [`Date`] when a [`Loan`] becomes due.
pub type DueDate = DateOf<(Loan, unit::Due)>;

/// [`DateTime`] when a [`Loan`] was created.
pub type CreationDateTime = DateTimeOf<(Loan, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::Term;

    #[test]
    fn term_bounds() {
        assert_eq!(Term::default().days(), 20);

        assert!(Term::new(1).is_some());
        assert!(Term::new(Term::MAX_DAYS).is_some());

        assert!(Term::new(0).is_none());
        assert!(Term::new(Term::MAX_DAYS + 1).is_none());
    }

    #[test]
    fn term_from_str() {
        assert_eq!("30".parse::<Term>().unwrap().days(), 30);

        assert!("0".parse::<Term>().is_err());
        assert!("-5".parse::<Term>().is_err());
        assert!("twenty".parse::<Term>().is_err());
    }
}
