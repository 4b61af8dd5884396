//! [`Dashboard`] report definition.

use common::Date;
use juniper::{graphql_object, GraphQLObject};
use service::query;

use crate::{api, Context};

/// Summary of the whole portfolio of loans as of some reference [`Date`].
#[derive(Clone, Debug)]
pub struct Dashboard {
    /// Underlying [`query::report::dashboard::Output`].
    output: query::report::dashboard::Output,

    /// Reference [`Date`] this [`Dashboard`] is computed as of.
    today: Date,
}

impl Dashboard {
    /// Wraps the provided [`query::report::dashboard::Output`] computed as of
    /// `today`.
    #[must_use]
    pub fn new(output: query::report::dashboard::Output, today: Date) -> Self {
        Self { output, today }
    }
}

/// Summary of the whole portfolio of `Loan`s as of some reference `Date`.
#[graphql_object(context = Context)]
impl Dashboard {
    /// Reference `Date` this `Dashboard` is computed as of.
    #[must_use]
    pub fn as_of(&self) -> Date {
        self.today
    }

    /// `Currency` all the amounts are expressed in.
    #[must_use]
    pub fn currency(&self) -> api::money::Currency {
        self.output.totals.lent.currency.into()
    }

    /// Principal lent by all the `Loan`s.
    #[must_use]
    pub fn lent(&self) -> api::money::Amount {
        self.output.totals.lent.into()
    }

    /// Total amount received for the paid `Loan`s.
    #[must_use]
    pub fn received(&self) -> api::money::Amount {
        self.output.totals.received.into()
    }

    /// Total amount still owed on the not yet paid `Loan`s.
    #[must_use]
    pub fn open(&self) -> api::money::Amount {
        self.output.totals.open.into()
    }

    /// Total amount owed on the late `Loan`s.
    #[must_use]
    pub fn late(&self) -> api::money::Amount {
        self.output.totals.late.into()
    }

    /// Interest accrued by all the `Loan`s.
    #[must_use]
    pub fn interest(&self) -> api::money::Amount {
        self.output.totals.interest.into()
    }

    /// Fines accrued by all the `Loan`s.
    #[must_use]
    pub fn fines(&self) -> api::money::Amount {
        self.output.totals.fines.into()
    }

    /// Number of `Loan`s in each `LoanStatus`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Dashboard.statusCounts",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn status_counts(&self) -> Vec<StatusCount> {
        self.output
            .counts
            .iter()
            .map(|(status, count)| StatusCount {
                status: (*status).into(),
                label: status.label().to_owned(),
                count: i32::try_from(*count).unwrap_or(i32::MAX),
            })
            .collect()
    }

    /// Most recently created `Loan`s, newest first.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Dashboard.recentLoans",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn recent_loans(&self) -> Vec<api::Loan> {
        self.output
            .recent
            .iter()
            .map(|s| api::Loan::from_statement(s.clone(), self.today))
            .collect()
    }
}

/// Number of `Loan`s in some `LoanStatus`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "LoanStatusCount")]
pub struct StatusCount {
    /// `LoanStatus` the `Loan`s are counted in.
    pub status: api::loan::Status,

    /// Human-readable (Portuguese) label of the `LoanStatus`.
    pub label: String,

    /// Number of `Loan`s in the `LoanStatus`.
    pub count: i32,
}

#[cfg(test)]
mod spec {
    use juniper::{graphql_value, graphql_vars};

    use crate::spec::{context, execute, lend_thousand};

    #[tokio::test]
    async fn sums_portfolio_as_of() {
        let ctx = context("2024-06-01T12:00:00Z");
        let loan = lend_thousand(&ctx).await;

        let value = execute(
            &ctx,
            r#"{
                dashboard(asOf: "2024-06-18") {
                    asOf
                    currency
                    lent
                    received
                    open
                    late
                    interest
                    fines
                    recentLoans {
                        id
                        status
                        snapshot { total }
                    }
                }
            }"#,
            &graphql_vars! {},
        )
        .await;

        assert_eq!(
            value,
            graphql_value!({
                "dashboard": {
                    "asOf": "2024-06-18",
                    "currency": "BRL",
                    "lent": 1000,
                    "received": 0,
                    "open": 1550,
                    "late": 1550,
                    "interest": 400,
                    "fines": 150,
                    "recentLoans": [{
                        "id": (loan.id.to_string()),
                        "status": "LATE",
                        "snapshot": {"total": 1550},
                    }],
                },
            }),
        );
    }
}
