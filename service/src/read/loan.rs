//! [`Loan`]-related read definitions.

use common::Date;
use smart_default::SmartDefault;

use crate::domain::{
    loan::{Rates, Snapshot},
    Loan,
};

/// [`Loan`] along with its [`Snapshot`] as of some reference [`Date`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Statement {
    /// [`Loan`] this [`Statement`] is about.
    pub loan: Loan,

    /// [`Snapshot`] of the [`Loan`].
    pub snapshot: Snapshot,
}

impl Statement {
    /// Computes a new [`Statement`] of the provided [`Loan`] as of `today`.
    #[must_use]
    pub fn new(loan: Loan, rates: &Rates, today: Date) -> Self {
        let snapshot = loan.snapshot(rates, today);
        Self { loan, snapshot }
    }
}

/// Selector of the given number of most recently created [`Loan`]s.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, SmartDefault)]
pub struct Recent(#[default(5)] pub usize);

pub mod list {
    //! [`Loan`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    #[cfg(doc)]
    use crate::domain::Client;
    use crate::domain::{client, loan, Loan};

    define_pagination!(Cursor, Filter);

    /// Cursor pointing to a specific [`Loan`] in a list.
    pub type Cursor = loan::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct Filter {
        /// ID of the [`Client`] to list [`Loan`]s of.
        pub client_id: Option<client::Id>,

        /// Whether to list only paid (`true`) or only outstanding (`false`)
        /// [`Loan`]s.
        pub paid: Option<bool>,
    }

    impl Filter {
        /// Indicates whether the provided [`Loan`] passes this [`Filter`].
        #[must_use]
        pub fn matches(&self, loan: &Loan) -> bool {
            self.client_id.map_or(true, |id| loan.client_id == id)
                && self.paid.map_or(true, |paid| loan.is_paid() == paid)
        }
    }

    /// Total count of [`Loan`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
