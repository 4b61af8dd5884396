//! [`Client`]-related read definitions.

use derive_more::Deref;

#[cfg(doc)]
use crate::domain::{Client, Loan};

/// Indicator whether a [`Client`] has any [`Loan`]s.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasLoans(pub bool);

impl PartialEq<bool> for HasLoans {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

pub mod list {
    //! [`Client`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::client;
    #[cfg(doc)]
    use crate::domain::Client;

    define_pagination!(Cursor, Filter);

    /// Cursor pointing to a specific [`Client`] in a list.
    pub type Cursor = client::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Words any of which a [`client::Name`] contains, case-insensitively.
        pub name: Option<String>,
    }

    /// Total count of [`Client`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}
