//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{format_description::BorrowedFormatItem, macros::format_description};

/// Untyped calendar date.
pub type Date = DateOf;

/// `YYYY-MM-DD` format of a [`Date`].
const ISO_8601: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]");

/// Calendar day without any time of day or offset.
///
/// All the day arithmetic happens on whole days, so no fractional-day
/// artifacts are possible.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_calendar_date(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = time::Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from)
    }

    /// Parses a new [`Date`] from the provided [ISO 8601] `YYYY-MM-DD`
    /// string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid [ISO 8601] date.
    ///
    /// [ISO 8601]: https://en.wikipedia.org/wiki/ISO_8601
    pub fn from_iso8601(input: &str) -> Result<Self, ParseError> {
        time::Date::parse(input, ISO_8601)
            .map(Self::from)
            .map_err(ParseError)
    }

    /// Returns this [`Date`] as an [ISO 8601] `YYYY-MM-DD` string.
    ///
    /// [ISO 8601]: https://en.wikipedia.org/wiki/ISO_8601
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn to_iso8601(&self) -> String {
        self.inner.format(ISO_8601).unwrap_or_else(|e| {
            panic!("cannot format `Date` as ISO 8601: {e}")
        })
    }

    /// Returns this [`Date`] formatted as `DD/MM/YYYY`.
    #[must_use]
    pub fn to_day_month_year(&self) -> String {
        format!(
            "{:02}/{:02}/{:04}",
            self.inner.day(),
            u8::from(self.inner.month()),
            self.inner.year(),
        )
    }

    /// Returns the [`Date`] the provided number of `days` after this one.
    ///
    /// Saturates at the maximum representable [`Date`].
    #[must_use]
    pub fn plus_days(self, days: u16) -> Self {
        Self {
            inner: self
                .inner
                .saturating_add(time::Duration::days(i64::from(days))),
            _of: PhantomData,
        }
    }

    /// Returns the [`Date`] the provided number of `days` before this one.
    ///
    /// Saturates at the minimum representable [`Date`].
    #[must_use]
    pub fn minus_days(self, days: u16) -> Self {
        Self {
            inner: self
                .inner
                .saturating_sub(time::Duration::days(i64::from(days))),
            _of: PhantomData,
        }
    }

    /// Returns the number of whole calendar days from this [`Date`] to the
    /// `other` one.
    ///
    /// The result is negative if `other` precedes this [`Date`].
    #[must_use]
    pub fn days_until<OtherOf: ?Sized>(&self, other: &DateOf<OtherOf>) -> i64 {
        (other.inner - self.inner).whole_days()
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

/// Error of parsing [`Date`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub struct ParseError(time::error::Parse);

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_iso8601(s)
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a [ISO 8601] `YYYY-MM-DD` format.
    ///
    /// [ISO 8601]: https://en.wikipedia.org/wiki/ISO_8601
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_iso8601())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_iso8601(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_iso8601() {
        assert_eq!(date("2024-02-29").to_iso8601(), "2024-02-29");
        assert_eq!(date("2024-01-05").to_string(), "2024-01-05");

        assert!(Date::from_iso8601("2023-02-29").is_err());
        assert!(Date::from_iso8601("2024-1-5").is_err());
        assert!(Date::from_iso8601("2024-01-05T10:00:00Z").is_err());
        assert!(Date::from_iso8601("").is_err());
    }

    #[test]
    fn formats_day_month_year() {
        assert_eq!(date("2024-01-05").to_day_month_year(), "05/01/2024");
    }

    #[test]
    fn adds_days_across_months() {
        assert_eq!(date("2024-01-25").plus_days(20), date("2024-02-14"));
        assert_eq!(date("2024-02-20").plus_days(10), date("2024-03-01"));
        assert_eq!(date("2023-12-31").plus_days(1), date("2024-01-01"));
        assert_eq!(date("2024-03-01").minus_days(1), date("2024-02-29"));
    }

    #[test]
    fn counts_days_between() {
        let from = date("2024-01-01");

        assert_eq!(from.days_until(&date("2024-01-01")), 0);
        assert_eq!(from.days_until(&date("2024-01-04")), 3);
        assert_eq!(from.days_until(&date("2023-12-29")), -3);
        assert_eq!(from.days_until(&date("2025-01-01")), 366);
    }

    #[test]
    fn orders_chronologically() {
        assert!(date("2024-01-01") < date("2024-01-02"));
        assert!(date("2023-12-31") < date("2024-01-01"));
    }
}
