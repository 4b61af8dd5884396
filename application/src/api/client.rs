//! [`Client`]-related definitions.

use std::future;

use common::{Date, DateTime};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A borrower of [`api::Loan`]s.
#[derive(Clone, Debug)]
pub struct Client {
    /// ID of this [`Client`].
    id: Id,

    /// Underlying [`domain::Client`].
    client: OnceCell<domain::Client>,
}

impl From<domain::Client> for Client {
    fn from(client: domain::Client) -> Self {
        Self {
            id: client.id.into(),
            client: OnceCell::new_with(Some(client)),
        }
    }
}

impl Client {
    /// Creates a new [`Client`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Client`] with the provided ID exists,
    /// otherwise accessing this [`Client`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            client: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Client`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Client`] doesn't exist.
    pub(crate) async fn client(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Client, Error> {
        let id = self.id.into();
        self.client
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::client::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|c| {
                        future::ready(
                            c.ok_or_else(|| {
                                api::query::ClientError::NotExists.into()
                            })
                            .map_err(ctx.error()),
                        )
                    })
            })
            .await
    }
}

/// A borrower of `Loan`s.
#[graphql_object(context = Context)]
impl Client {
    /// Unique identifier of this `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Full name of this `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.client(ctx).await?.name.clone().into())
    }

    /// Phone number of this `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Phone, Error> {
        Ok(self.client(ctx).await?.phone.clone().into())
    }

    /// Postal address of this `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.address",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn address(&self, ctx: &Context) -> Result<Address, Error> {
        Ok(self.client(ctx).await?.address.clone().into())
    }

    /// CPF of this `Client`, if known.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.cpf",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn cpf(&self, ctx: &Context) -> Result<Option<Cpf>, Error> {
        Ok(self.client(ctx).await?.cpf.clone().map(Into::into))
    }

    /// CPF of this `Client` formatted as `000.000.000-00`, if known.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.formattedCpf",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn formatted_cpf(
        &self,
        ctx: &Context,
    ) -> Result<Option<String>, Error> {
        Ok(self
            .client(ctx)
            .await?
            .cpf
            .as_ref()
            .map(domain::client::Cpf::formatted))
    }

    /// Free-form notes about this `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.notes",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn notes(&self, ctx: &Context) -> Result<Option<Notes>, Error> {
        Ok(self.client(ctx).await?.notes.clone().map(Into::into))
    }

    /// `DateTime` when this `Client` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.client(ctx).await?.created_at.coerce())
    }

    /// Fetches the page of `Loan`s borrowed by this `Client`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Client.loans",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn loans(
        &self,
        first: Option<i32>,
        after: Option<api::loan::list::Cursor>,
        last: Option<i32>,
        before: Option<api::loan::list::Cursor>,
        paid: Option<bool>,
        as_of: Option<Date>,
        ctx: &Context,
    ) -> Result<api::loan::list::Connection, Error> {
        api::Query::loans(
            first,
            after,
            last,
            before,
            Some(self.id),
            paid,
            as_of,
            ctx,
        )
        .await
    }
}

/// Unique identifier of a `Client`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::client::Id)]
#[into(domain::client::Id)]
#[graphql(name = "ClientId", transparent)]
pub struct Id(Uuid);

/// Full name of a `Client`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClientName",
    with = scalar::Via::<domain::client::Name>,
)]
pub struct Name(domain::client::Name);

/// Phone number of a `Client`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClientPhone",
    with = scalar::Via::<domain::client::Phone>,
)]
pub struct Phone(domain::client::Phone);

/// Postal address of a `Client`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClientAddress",
    with = scalar::Via::<domain::client::Address>,
)]
pub struct Address(domain::client::Address);

/// [CPF] of a `Client`: 11 digits, punctuation is ignored on input.
///
/// [CPF]: https://en.wikipedia.org/wiki/CPF_number
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClientCpf",
    with = scalar::Via::<domain::client::Cpf>,
)]
pub struct Cpf(domain::client::Cpf);

/// Free-form notes about a `Client`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClientNotes",
    with = scalar::Via::<domain::client::Notes>,
)]
pub struct Notes(domain::client::Notes);

pub mod list {
    //! Definitions related to the [`Client`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Client, Id};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Client` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::client::list::Cursor)]
    #[graphql(
        name = "ClientListCursor",
        with = scalar::Via::<read::client::list::Cursor>,
    )]
    pub struct Cursor(pub read::client::list::Cursor);

    /// Edge in the [`Client`] list, pointing to the [`Client`] by its ID.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(Id);

    /// Edge in the `Client` list.
    #[graphql_object(name = "ClientListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `ClientListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.into()
        }

        /// Node of this `ClientListEdge`.
        #[must_use]
        pub fn node(&self) -> Client {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Client` \
                          existence"
            )]
            unsafe {
                Client::new_unchecked(self.0)
            }
        }
    }

    /// Connection of the [`Client`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::client::list::Page`].
        page: read::client::list::Page,

        /// [`read::client::list::Filter`] this [`Connection`] was selected
        /// with.
        filter: read::client::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] selected with the provided
        /// [`read::client::list::Filter`].
        #[must_use]
        pub fn new(
            page: read::client::list::Page,
            filter: read::client::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Client` list.
    #[graphql_object(name = "ClientListConnection", context = Context)]
    impl Connection {
        /// Edges of this `ClientListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.ids.iter().map(|id| Edge(Id::from(*id))).collect()
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

    /// Information about a `ClientListConnection` page.
    #[graphql_object(name = "ClientListPageInfo", context = Context)]
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

        /// Total count of `Client`s matching the filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::clients::TotalCount::by(self.0.filter.clone()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}
