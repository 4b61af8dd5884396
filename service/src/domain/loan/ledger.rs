//! Ledger of a [`Loan`]: its lifecycle [`Status`] and accrued charges.
//!
//! [`Snapshot::compute()`] is the only place where these are derived. They are
//! never stored, but recomputed against an explicitly provided reference
//! [`Date`] on every read, so a [`Loan`] moves from [`Status::Ongoing`] to
//! [`Status::Late`] purely by the passage of time.
//!
//! Charges are independent of the [`Status`]: a [`Loan`] paid after its
//! [`DueDate`] is [`Status::Paid`], yet still carries its interest and fine.

use common::{define_kind, Date, DateOf, Money, Percent};
use rust_decimal::Decimal;
use serde::Deserialize;
use smart_default::SmartDefault;

#[cfg(doc)]
use super::Loan;
use super::{DueDate, PaidDate, StartDate, Term};

/// Rates a [`Loan`] is charged with once it becomes late.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, SmartDefault)]
#[serde(default)]
pub struct Rates {
    /// Flat interest on the principal, charged once regardless of how many
    /// days late the [`Loan`] is.
    #[default(Percent::new(Decimal::new(40, 0)).unwrap_or_else(|| {
        unreachable!("40% is a valid `Percent`")
    }))]
    pub interest: Percent,

    /// Fine charged for each whole calendar day past the [`DueDate`], in
    /// units of the principal currency.
    #[default(Decimal::new(50, 0))]
    pub daily_fine: Decimal,

    /// Number of days before the [`DueDate`] a [`Loan`] is considered
    /// [`Status::NearDue`].
    #[default(3)]
    pub near_due_days: u16,
}

define_kind! {
    #[doc = "Lifecycle status of a [`Loan`]."]
    enum Status {
        #[doc = "Not paid, due in more than the near-due window."]
        Ongoing = 1,

        #[doc = "Not paid, due within the near-due window."]
        NearDue = 2,

        #[doc = "Not paid, due today."]
        Due = 3,

        #[doc = "Not paid, its due date has passed."]
        Late = 4,

        #[doc = "Paid, no further transitions."]
        Paid = 5,
    }
}

impl Status {
    /// Returns the human-readable (Portuguese) label of this [`Status`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ongoing => "EM ANDAMENTO",
            Self::NearDue => "A VENCER",
            Self::Due => "VENCE HOJE",
            Self::Late => "ATRASADO",
            Self::Paid => "PAGO",
        }
    }

    /// Indicates whether a [`Loan`] in this [`Status`] requires attention.
    #[must_use]
    pub const fn is_alert(self) -> bool {
        matches!(self, Self::NearDue | Self::Late)
    }
}

/// Derived state of a [`Loan`] as of some reference [`Date`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Snapshot {
    /// Original amount lent.
    pub principal: Money,

    /// Accrued interest.
    pub interest: Money,

    /// Accrued fine.
    pub fine: Money,

    /// Total amount owed: `principal + interest + fine`.
    pub total: Money,

    /// Whole calendar days the reference [`Date`] falls after the
    /// [`DueDate`].
    pub days_late: u32,

    /// Lifecycle [`Status`].
    pub status: Status,

    /// [`DueDate`] of the [`Loan`].
    pub due_date: DueDate,
}

impl Snapshot {
    /// Computes a [`Snapshot`] of a [`Loan`] with the provided terms.
    ///
    /// The reference [`Date`] is the `paid` one if present, or `today`
    /// otherwise. All the dates are calendar days already, so no time of day
    /// can shift a comparison.
    #[must_use]
    pub fn compute(
        rates: &Rates,
        principal: Money,
        start: StartDate,
        paid: Option<PaidDate>,
        term: Term,
        today: Date,
    ) -> Self {
        let due_date: DueDate = start.plus_days(term.days()).coerce();
        let reference = paid.map_or(today, DateOf::coerce);
        let days_to_due = reference.days_until(&due_date);

        let status = if paid.is_some() {
            Status::Paid
        } else if days_to_due < 0 {
            Status::Late
        } else if days_to_due == 0 {
            Status::Due
        } else if days_to_due <= i64::from(rates.near_due_days) {
            Status::NearDue
        } else {
            Status::Ongoing
        };

        // Lateness is judged apart from the `status`, as `Status::Paid`
        // hides it.
        let days_late = if days_to_due < 0 {
            u32::try_from(days_to_due.unsigned_abs()).unwrap_or(u32::MAX)
        } else {
            0
        };
        let (interest, fine) = if days_late > 0 {
            (
                rates.interest.of(principal.amount),
                rates.daily_fine * Decimal::from(days_late),
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let currency = principal.currency;
        Self {
            principal,
            interest: Money {
                amount: interest,
                currency,
            },
            fine: Money {
                amount: fine,
                currency,
            },
            total: Money {
                amount: principal.amount + interest + fine,
                currency,
            },
            days_late,
            status,
            due_date,
        }
    }

    /// Indicates whether the reference [`Date`] of this [`Snapshot`] falls
    /// after its [`DueDate`].
    #[must_use]
    pub const fn is_late(&self) -> bool {
        self.days_late > 0
    }
}
