//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Client` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "client",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn client(
        id: api::client::Id,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.service()
            .execute(query::client::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ClientError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Client` with the specified CPF.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - no `Client` has the specified CPF.
    #[tracing::instrument(
        skip_all,
        fields(
            cpf = %cpf,
            gql.name = "clientByCpf",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn client_by_cpf(
        cpf: api::client::Cpf,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.service()
            .execute(query::client::ByCpf::by(cpf.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ClientError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `Client`s, optionally filtered by the words of
    /// their names.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "clients",
            last = ?last,
            name = ?name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn clients(
        first: Option<i32>,
        after: Option<api::client::list::Cursor>,
        last: Option<i32>,
        before: Option<api::client::list::Cursor>,
        name: Option<String>,
        ctx: &Context,
    ) -> Result<api::client::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        let filter = read::client::list::Filter {
            name: name
                .map(|n| n.trim().to_owned())
                .filter(|n| !n.is_empty()),
        };

        ctx.service()
            .execute(query::clients::List::by(read::client::list::Selector {
                arguments: read::client::list::Arguments::new(
                    first,
                    after.map(Into::into),
                    last,
                    before.map(Into::into),
                    DEFAULT_PAGE_SIZE,
                )
                .ok_or_else(|| api::PaginationError::Ambiguous.into())
                .map_err(ctx.error())?,
                filter: filter.clone(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| api::client::list::Connection::new(c, filter))
    }

    /// Returns the `Loan` with the specified ID, as seen on the `asOf` `Date`
    /// (today by default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOAN_NOT_EXISTS` - the `Loan` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            as_of = ?as_of,
            gql.name = "loan",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn loan(
        id: api::loan::Id,
        as_of: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Loan, Error> {
        let today = ctx.today(as_of);

        ctx.service()
            .execute(query::loan::Statement {
                loan_id: id.into(),
                today,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| LoanError::NotExists.into())
            .map_err(ctx.error())
            .map(|s| api::Loan::from_statement(s, today))
    }

    /// Fetches the page of `Loan`s, as seen on the `asOf` `Date` (today by
    /// default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            as_of = ?as_of,
            before = ?before,
            client_id = ?client_id,
            first = ?first,
            gql.name = "loans",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            paid = ?paid,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn loans(
        first: Option<i32>,
        after: Option<api::loan::list::Cursor>,
        last: Option<i32>,
        before: Option<api::loan::list::Cursor>,
        client_id: Option<api::client::Id>,
        paid: Option<bool>,
        as_of: Option<Date>,
        ctx: &Context,
    ) -> Result<api::loan::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 10;

        let filter = read::loan::list::Filter {
            client_id: client_id.map(Into::into),
            paid,
        };

        ctx.service()
            .execute(query::loans::List::by(read::loan::list::Selector {
                arguments: read::loan::list::Arguments::new(
                    first,
                    after.map(Into::into),
                    last,
                    before.map(Into::into),
                    DEFAULT_PAGE_SIZE,
                )
                .ok_or_else(|| api::PaginationError::Ambiguous.into())
                .map_err(ctx.error())?,
                filter,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|c| {
                api::loan::list::Connection::new(c, filter, ctx.today(as_of))
            })
    }

    /// Returns the not yet paid `Loan`s requiring attention on the `asOf`
    /// `Date` (today by default): the `NEAR_DUE` and `LATE` ones, the
    /// earliest due first.
    #[tracing::instrument(
        skip_all,
        fields(
            as_of = ?as_of,
            gql.name = "alerts",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn alerts(
        as_of: Option<Date>,
        ctx: &Context,
    ) -> Result<Vec<api::Loan>, Error> {
        let today = ctx.today(as_of);

        ctx.service()
            .execute(query::Alerts { today })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|alerts| {
                alerts
                    .into_iter()
                    .map(|s| api::Loan::from_statement(s, today))
                    .collect()
            })
    }

    /// Summarizes the whole portfolio of `Loan`s on the `asOf` `Date` (today
    /// by default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RECENT_COUNT` - the `recent` number of `Loan`s is negative.
    #[tracing::instrument(
        skip_all,
        fields(
            as_of = ?as_of,
            gql.name = "dashboard",
            otel.name = Self::SPAN_NAME,
            recent = ?recent,
        ),
    )]
    pub async fn dashboard(
        as_of: Option<Date>,
        recent: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Dashboard, Error> {
        let today = ctx.today(as_of);
        let recent = recent
            .map(|n| {
                usize::try_from(n)
                    .map(read::loan::Recent)
                    .map_err(|_| DashboardError::InvalidRecent.into())
                    .map_err(ctx.error())
            })
            .transpose()?
            .unwrap_or_default();

        ctx.service()
            .execute(query::Dashboard { today, recent })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|output| api::Dashboard::new(output, today))
    }

    /// Previews the amounts owed on a hypothetical `Loan` on the `asOf` `Date`
    /// (today by default), without storing anything.
    ///
    /// The `Loan` starts on `startDate` (the `asOf` `Date` by default) and
    /// runs for `term` days (20 by default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PRINCIPAL` - the `principal` is not positive;
    /// - `INVALID_PAID_DATE` - the `paidDate` precedes the `startDate`.
    #[tracing::instrument(
        skip_all,
        fields(
            as_of = ?as_of,
            gql.name = "simulateLoan",
            otel.name = Self::SPAN_NAME,
            paid_date = ?paid_date,
            principal = %principal,
            start_date = ?start_date,
            term = ?term,
        ),
    )]
    pub async fn simulate_loan(
        principal: api::money::Amount,
        start_date: Option<Date>,
        term: Option<api::loan::Term>,
        paid_date: Option<Date>,
        as_of: Option<Date>,
        ctx: &Context,
    ) -> Result<api::loan::Snapshot, Error> {
        let today = ctx.today(as_of);

        ctx.service()
            .execute(query::SimulateLoan {
                principal: principal
                    .in_currency(ctx.service().config().currency),
                start_date: start_date.unwrap_or(today).coerce(),
                term: term.map(Into::into).unwrap_or_default(),
                paid_date: paid_date.map(|d| d.coerce()),
                today,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum ClientError {
        #[code = "CLIENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Client` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum LoanError {
        #[code = "LOAN_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Loan` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PrincipalError {
        #[code = "INVALID_PRINCIPAL"]
        #[status = BAD_REQUEST]
        #[message = "`Loan` principal must be positive"]
        NotPositive,
    }
}

define_error! {
    enum PaymentError {
        #[code = "LOAN_ALREADY_PAID"]
        #[status = CONFLICT]
        #[message = "`Loan` is paid already"]
        AlreadyPaid,

        #[code = "INVALID_PAID_DATE"]
        #[status = BAD_REQUEST]
        #[message = "`Loan` cannot be paid before it starts"]
        BeforeStart,
    }
}

define_error! {
    enum DashboardError {
        #[code = "INVALID_RECENT_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "Number of recent `Loan`s must not be negative"]
        InvalidRecent,
    }
}

impl AsError for query::simulation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::PrincipalNotPositive(_) => PrincipalError::NotPositive.into(),
            Self::PaidBeforeStart { .. } => PaymentError::BeforeStart.into(),
        })
    }
}
