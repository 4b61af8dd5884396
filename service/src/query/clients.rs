//! [`Query`] collection related to the multiple [`Client`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Client, Query};

use super::DatabaseQuery;

/// Queries a list of [`Client`]s.
pub type List =
    DatabaseQuery<By<read::client::list::Page, read::client::list::Selector>>;

/// Queries total count of [`Client`]s.
pub type TotalCount = DatabaseQuery<
    By<read::client::list::TotalCount, read::client::list::Filter>,
>;
