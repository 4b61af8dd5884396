//! GraphQL API definitions.

pub mod client;
pub mod dashboard;
pub mod loan;
pub mod money;
mod mutation;
mod query;
pub mod scalar;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    client::Client, dashboard::Dashboard, loan::Loan, mutation::Mutation,
    query::Query,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}
