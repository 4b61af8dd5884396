//! [`Loan`]-related definitions.

use std::future;

use common::{Date, DateTime};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, read, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Money lent to an [`api::Client`], as seen on some reference [`Date`].
#[derive(Clone, Debug)]
pub struct Loan {
    /// ID of this [`Loan`].
    id: Id,

    /// Reference [`Date`] this [`Loan`] is observed on.
    today: Date,

    /// Underlying [`domain::Loan`].
    loan: OnceCell<domain::Loan>,

    /// [`domain::loan::Snapshot`] of the [`Loan`] as of `today`.
    snapshot: OnceCell<domain::loan::Snapshot>,
}

impl Loan {
    /// Wraps the provided [`domain::Loan`] observed on `today`.
    #[must_use]
    pub fn new(loan: domain::Loan, today: Date) -> Self {
        Self {
            id: loan.id.into(),
            today,
            loan: OnceCell::new_with(Some(loan)),
            snapshot: OnceCell::new(),
        }
    }

    /// Wraps the provided [`read::loan::Statement`] computed as of `today`.
    #[must_use]
    pub fn from_statement(
        statement: read::loan::Statement,
        today: Date,
    ) -> Self {
        let read::loan::Statement { loan, snapshot } = statement;
        Self {
            id: loan.id.into(),
            today,
            loan: OnceCell::new_with(Some(loan)),
            snapshot: OnceCell::new_with(Some(snapshot)),
        }
    }

    /// Creates a new [`Loan`] with the provided ID, observed on `today`.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Loan`] with the provided ID exists,
    /// otherwise accessing this [`Loan`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>, today: Date) -> Self {
        Self {
            id: id.into(),
            today,
            loan: OnceCell::new(),
            snapshot: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Loan`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Loan`] doesn't exist.
    async fn loan(&self, ctx: &Context) -> Result<&domain::Loan, Error> {
        let id = self.id.into();
        self.loan
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::loan::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|l| {
                        future::ready(
                            l.ok_or_else(|| {
                                api::query::LoanError::NotExists.into()
                            })
                            .map_err(ctx.error()),
                        )
                    })
            })
            .await
    }

    /// Returns the [`domain::loan::Snapshot`] of this [`Loan`] as of its
    /// reference [`Date`], computing it on first access.
    async fn computed(
        &self,
        ctx: &Context,
    ) -> Result<domain::loan::Snapshot, Error> {
        self.snapshot
            .get_or_try_init(|| async {
                let loan = self.loan(ctx).await?;
                Ok::<_, Error>(
                    loan.snapshot(&ctx.service().config().rates, self.today),
                )
            })
            .await
            .copied()
    }
}

/// Money lent to a `Client`, as seen on some reference `Date`.
#[graphql_object(context = Context)]
impl Loan {
    /// Unique identifier of this `Loan`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Client` who borrowed this `Loan`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.client",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client(&self, ctx: &Context) -> Result<api::Client, Error> {
        let client_id = self.loan(ctx).await?.client_id;

        #[expect(
            unsafe_code,
            reason = "`Loan` cannot outlive the `Client` it's borrowed by"
        )]
        let client = unsafe { api::Client::new_unchecked(client_id) };
        Ok(client)
    }

    /// Original amount lent, excluding any interest or fines.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.principal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn principal(
        &self,
        ctx: &Context,
    ) -> Result<api::money::Amount, Error> {
        Ok(self.loan(ctx).await?.principal.into())
    }

    /// `Currency` the `principal` is lent in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.currency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn currency(
        &self,
        ctx: &Context,
    ) -> Result<api::money::Currency, Error> {
        Ok(self.loan(ctx).await?.principal.currency.into())
    }

    /// `Date` this `Loan` started running its term.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.startDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn start_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.loan(ctx).await?.start_date.coerce())
    }

    /// Number of days this `Loan` runs before becoming due.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.term",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn term(&self, ctx: &Context) -> Result<Term, Error> {
        Ok(self.loan(ctx).await?.term.into())
    }

    /// `Date` this `Loan` becomes due.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.dueDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn due_date(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.loan(ctx).await?.due_date().coerce())
    }

    /// `Date` this `Loan` was paid, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.paidDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn paid_date(
        &self,
        ctx: &Context,
    ) -> Result<Option<Date>, Error> {
        Ok(self.loan(ctx).await?.paid_date.map(|d| d.coerce()))
    }

    /// Indicator whether this `Loan` is paid.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.isPaid",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_paid(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.loan(ctx).await?.is_paid())
    }

    /// `DateTime` when this `Loan` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.loan(ctx).await?.created_at.coerce())
    }

    /// Reference `Date` the `snapshot` and `status` of this `Loan` are
    /// computed as of.
    #[must_use]
    pub fn as_of(&self) -> Date {
        self.today
    }

    /// `LoanStatus` of this `Loan` as of its reference `Date`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.computed(ctx).await?.status.into())
    }

    /// Amounts owed on this `Loan` as of its reference `Date`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.snapshot",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn snapshot(&self, ctx: &Context) -> Result<Snapshot, Error> {
        self.computed(ctx).await.map(Into::into)
    }

    /// [WhatsApp] link opening a chat with the `Client`, pre-filled with a
    /// reminder about the amount owed and the due `Date`.
    ///
    /// [WhatsApp]: https://faq.whatsapp.com/5913398998672934
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Loan.reminderLink",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reminder_link(&self, ctx: &Context) -> Result<String, Error> {
        let snapshot = self.computed(ctx).await?;
        let client = self.client(ctx).await?;
        let client = client.client(ctx).await?;

        Ok(domain::loan::Reminder::new(client, &snapshot).link())
    }
}

/// Amounts owed on a [`Loan`] as of some reference [`Date`].
#[derive(Clone, Copy, Debug, From, Into)]
pub struct Snapshot(domain::loan::Snapshot);

/// Amounts owed on a `Loan` as of some reference `Date`.
#[graphql_object(name = "LoanSnapshot", context = Context)]
impl Snapshot {
    /// Original amount lent.
    #[must_use]
    pub fn principal(&self) -> api::money::Amount {
        self.0.principal.into()
    }

    /// Flat interest charged once the `Loan` is late.
    #[must_use]
    pub fn interest(&self) -> api::money::Amount {
        self.0.interest.into()
    }

    /// Fine accrued for every day past the due `Date`.
    #[must_use]
    pub fn fine(&self) -> api::money::Amount {
        self.0.fine.into()
    }

    /// Total amount owed: principal, interest and fine together.
    #[must_use]
    pub fn total(&self) -> api::money::Amount {
        self.0.total.into()
    }

    /// `Currency` all the amounts are expressed in.
    #[must_use]
    pub fn currency(&self) -> api::money::Currency {
        self.0.total.currency.into()
    }

    /// Whole days past the due `Date`.
    #[must_use]
    pub fn days_late(&self) -> i32 {
        i32::try_from(self.0.days_late).unwrap_or(i32::MAX)
    }

    /// Indicator whether the due `Date` has passed.
    #[must_use]
    pub fn is_late(&self) -> bool {
        self.0.is_late()
    }

    /// `Date` the `Loan` becomes due.
    #[must_use]
    pub fn due_date(&self) -> Date {
        self.0.due_date.coerce()
    }

    /// `LoanStatus` of the `Loan`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status.into()
    }

    /// Human-readable (Portuguese) label of the `LoanStatus`.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        self.0.status.label()
    }
}

/// Lifecycle status of a `Loan`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "LoanStatus")]
pub enum Status {
    /// Not paid, due in more than a few days.
    Ongoing,

    /// Not paid, due within a few days.
    NearDue,

    /// Not paid, due today.
    Due,

    /// Not paid, the due `Date` has passed.
    Late,

    /// Paid.
    Paid,
}

impl From<domain::loan::Status> for Status {
    fn from(status: domain::loan::Status) -> Self {
        use domain::loan::Status as S;
        match status {
            S::Ongoing => Self::Ongoing,
            S::NearDue => Self::NearDue,
            S::Due => Self::Due,
            S::Late => Self::Late,
            S::Paid => Self::Paid,
        }
    }
}

/// Unique identifier of a `Loan`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::loan::Id)]
#[into(domain::loan::Id)]
#[graphql(name = "LoanId", transparent)]
pub struct Id(Uuid);

/// Number of days a `Loan` runs before becoming due, within `1..=3650`.
#[derive(Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "LoanTerm",
    with = scalar::ViaInt::<domain::loan::Term>,
)]
pub struct Term(domain::loan::Term);

pub mod list {
    //! Definitions related to the [`Loan`] list.

    use common::Date;
    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Loan};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Loan` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::loan::list::Cursor)]
    #[graphql(
        name = "LoanListCursor",
        with = scalar::Via::<read::loan::list::Cursor>,
    )]
    pub struct Cursor(pub read::loan::list::Cursor);

    /// Edge in the [`Loan`] list, pointing to the [`Loan`] by its ID.
    #[derive(Clone, Copy, Debug)]
    pub struct Edge {
        /// ID of the [`Loan`].
        id: Id,

        /// Reference [`Date`] the [`Loan`] is observed on.
        today: Date,
    }

    /// Edge in the `Loan` list.
    #[graphql_object(name = "LoanListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `LoanListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.id.into()
        }

        /// Node of this `LoanListEdge`.
        #[must_use]
        pub fn node(&self) -> Loan {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Loan` \
                          existence"
            )]
            unsafe {
                Loan::new_unchecked(self.id, self.today)
            }
        }
    }

    /// Connection of the [`Loan`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::loan::list::Page`].
        page: read::loan::list::Page,

        /// [`read::loan::list::Filter`] this [`Connection`] was selected
        /// with.
        filter: read::loan::list::Filter,

        /// Reference [`Date`] the [`Loan`]s are observed on.
        today: Date,
    }

    impl Connection {
        /// Creates a new [`Connection`] selected with the provided
        /// [`read::loan::list::Filter`], observing [`Loan`]s on `today`.
        #[must_use]
        pub fn new(
            page: read::loan::list::Page,
            filter: read::loan::list::Filter,
            today: Date,
        ) -> Self {
            Self {
                page,
                filter,
                today,
            }
        }
    }

    /// Connection of the `Loan` list.
    #[graphql_object(name = "LoanListConnection", context = Context)]
    impl Connection {
        /// Edges of this `LoanListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page
                .ids
                .iter()
                .map(|id| Edge {
                    id: (*id).into(),
                    today: self.today,
                })
                .collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo(self.clone())
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo(Connection);

    /// Information about a `LoanListConnection` page.
    #[graphql_object(name = "LoanListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.0.page.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.0.page.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.0.page.start_cursor().copied().map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.0.page.end_cursor().copied().map(Into::into)
        }

        /// Total count of `Loan`s matching the filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::loans::TotalCount::by(self.0.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}

#[cfg(test)]
mod spec {
    use juniper::{graphql_value, graphql_vars, EmptySubscription};

    use crate::{
        api,
        spec::{context, execute, lend_thousand},
    };

    use super::Loan;

    #[tokio::test]
    async fn computes_snapshot_once() {
        let ctx = context("2024-06-18T12:00:00Z");
        let loan = lend_thousand(&ctx).await;
        let loan = Loan::new(loan, ctx.today(None));
        assert!(loan.snapshot.get().is_none());

        let first = loan.computed(&ctx).await.unwrap();
        assert_eq!(loan.snapshot.get(), Some(&first));
        assert_eq!(loan.computed(&ctx).await.unwrap(), first);
        assert_eq!(first.total.amount, 1550.into());
    }

    #[tokio::test]
    async fn reports_late_loan_as_of() {
        let ctx = context("2024-06-01T12:00:00Z");
        let loan = lend_thousand(&ctx).await;

        let value = execute(
            &ctx,
            r#"query($id: LoanId!) {
                late: loan(id: $id, asOf: "2024-06-18") {
                    asOf
                    status
                    principal
                    snapshot {
                        currency
                        interest
                        fine
                        total
                        daysLate
                        statusLabel
                    }
                }
                near: loan(id: $id, asOf: "2024-06-13") {
                    status
                    snapshot { total }
                }
                today: loan(id: $id) {
                    asOf
                    status
                }
            }"#,
            &graphql_vars! {"id": loan.id.to_string()},
        )
        .await;

        assert_eq!(
            value,
            graphql_value!({
                "late": {
                    "asOf": "2024-06-18",
                    "status": "LATE",
                    "principal": 1000,
                    "snapshot": {
                        "currency": "BRL",
                        "interest": 400,
                        "fine": 150,
                        "total": 1550,
                        "daysLate": 3,
                        "statusLabel": "ATRASADO",
                    },
                },
                "near": {
                    "status": "NEAR_DUE",
                    "snapshot": {"total": 1000},
                },
                "today": {
                    "asOf": "2024-06-01",
                    "status": "ONGOING",
                },
            }),
        );
    }

    #[tokio::test]
    async fn pages_loans_in_creation_order() {
        let ctx = context("2024-06-01T12:00:00Z");
        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(lend_thousand(&ctx).await.id.to_string());
        }

        let value = execute(
            &ctx,
            r#"{
                head: loans(first: 2) {
                    edges { node { id } }
                    pageInfo { hasNextPage hasPreviousPage totalCount }
                }
                tail: loans(last: 1) {
                    edges { cursor }
                    pageInfo { hasNextPage hasPreviousPage }
                }
            }"#,
            &graphql_vars! {},
        )
        .await;

        assert_eq!(
            value,
            graphql_value!({
                "head": {
                    "edges": [
                        {"node": {"id": (ids[0].clone())}},
                        {"node": {"id": (ids[1].clone())}},
                    ],
                    "pageInfo": {
                        "hasNextPage": true,
                        "hasPreviousPage": false,
                        "totalCount": 3,
                    },
                },
                "tail": {
                    "edges": [{"cursor": (ids[2].clone())}],
                    "pageInfo": {
                        "hasNextPage": false,
                        "hasPreviousPage": true,
                    },
                },
            }),
        );
    }

    #[tokio::test]
    async fn simulates_with_numeric_principal() {
        let ctx = context("2024-06-18T12:00:00Z");

        let value = execute(
            &ctx,
            r#"{
                simulateLoan(principal: 1001.25, startDate: "2024-05-26") {
                    status
                    interest
                    total
                }
            }"#,
            &graphql_vars! {},
        )
        .await;

        assert_eq!(
            value,
            graphql_value!({
                "simulateLoan": {
                    "status": "LATE",
                    "interest": 400.5,
                    "total": 1551.75,
                },
            }),
        );
    }

    #[tokio::test]
    async fn rejects_simulated_payment_before_start() {
        let ctx = context("2024-06-18T12:00:00Z");
        let schema =
            api::Schema::new(api::Query, api::Mutation, EmptySubscription::new());

        let (_, errors) = juniper::execute(
            r#"{
                simulateLoan(
                    principal: 1000,
                    startDate: "2024-05-26",
                    paidDate: "2024-05-25",
                ) { total }
            }"#,
            None,
            &schema,
            &graphql_vars! {},
            &ctx,
        )
        .await
        .unwrap();

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0]
                .error()
                .extensions()
                .as_object_value()
                .and_then(|ext| ext.get_field_value("code")),
            Some(&graphql_value!("INVALID_PAID_DATE")),
        );
    }
}
