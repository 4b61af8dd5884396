//! [`Query`] collection related to the multiple [`Loan`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Loan, Query};
use crate::read;

use super::DatabaseQuery;

/// Queries a list of [`Loan`]s.
pub type List =
    DatabaseQuery<By<read::loan::list::Page, read::loan::list::Selector>>;

/// Queries total count of [`Loan`]s.
pub type TotalCount =
    DatabaseQuery<By<read::loan::list::TotalCount, read::loan::list::Filter>>;
