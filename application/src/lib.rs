//! GraphQL API of the Credix loan tracker over the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Extension, Json,
};
use derive_more::Debug;
use juniper::{http::GraphQLBatchResponse, DefaultScalarValue, ScalarValue};
use juniper_axum::extract::JuniperRequest;
// Used in binary.
use axum_client_ip as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    context::Context,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
#[cfg(not(test))]
pub type Service = service::Service<service::infra::Postgres>;

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
#[cfg(test)]
pub type Service = service::Service<service::infra::Memory>;

/// [`juniper`] GraphQL response.
#[derive(Debug)]
pub struct JuniperResponse<S = DefaultScalarValue>
where
    S: ScalarValue,
{
    /// Status code of the response.
    pub status_code: http::StatusCode,

    /// Underlying GraphQL response.
    #[debug(skip)]
    pub response: GraphQLBatchResponse<S>,
}

impl<S> IntoResponse for JuniperResponse<S>
where
    S: ScalarValue,
{
    fn into_response(self) -> Response {
        let Self {
            status_code,
            response,
        } = self;

        if response.is_ok() {
            Json(response).into_response()
        } else {
            (status_code, Json(response)).into_response()
        }
    }
}

/// GraphQL API handler.
pub async fn graphql(
    Extension(schema): Extension<Arc<api::Schema>>,
    context: Context,
    JuniperRequest(gql_request): JuniperRequest,
) -> JuniperResponse {
    let response = gql_request.execute(&*schema, &context).await;
    JuniperResponse {
        status_code: context.error_status_code(),
        response,
    }
}

#[cfg(test)]
mod spec {
    use common::{
        money::{Currency, Money},
        Date, DateTime,
    };
    use juniper::{DefaultScalarValue, EmptySubscription, Value, Variables};
    use rust_decimal::Decimal;
    use service::{
        command,
        domain::{self, loan::Rates},
        infra::Memory,
        Command as _,
    };
    use time::UtcOffset;

    use crate::{api, Context, Service};

    /// Creates a new [`Context`] of a request received at the provided
    /// RFC 3339 `now`, over an empty [`Memory`] database.
    pub(crate) fn context(now: &str) -> Context {
        let service = Service::new(
            service::Config {
                currency: Currency::Brl,
                utc_offset: UtcOffset::from_hms(-3, 0, 0).unwrap(),
                rates: Rates::default(),
            },
            Memory::default(),
        );
        Context::new(service, DateTime::from_rfc3339(now).unwrap())
    }

    /// Lends R$ 1000 to a new `Client` for 20 days starting on 2024-05-26,
    /// so due on 2024-06-15.
    pub(crate) async fn lend_thousand(ctx: &Context) -> domain::Loan {
        let client = ctx
            .service()
            .execute(command::CreateClient {
                name: "Maria Souza".parse().unwrap(),
                phone: "(11) 98765-4321".parse().unwrap(),
                address: "Rua das Flores, 12".parse().unwrap(),
                cpf: None,
                notes: None,
            })
            .await
            .unwrap();

        ctx.service()
            .execute(command::CreateLoan {
                client_id: client.id,
                principal: Money {
                    amount: Decimal::from(1000),
                    currency: Currency::Brl,
                },
                start_date: Date::from_calendar_date(2024, 5, 26)
                    .unwrap()
                    .coerce(),
                term: domain::loan::Term::default(),
            })
            .await
            .unwrap()
    }

    /// Executes the provided GraphQL `document` against [`api::Schema`],
    /// asserting it to succeed.
    pub(crate) async fn execute(
        ctx: &Context,
        document: &str,
        variables: &Variables<DefaultScalarValue>,
    ) -> Value<DefaultScalarValue> {
        let schema = api::Schema::new(
            api::Query,
            api::Mutation,
            EmptySubscription::new(),
        );

        let (value, errors) =
            juniper::execute(document, None, &schema, variables, ctx)
                .await
                .unwrap();
        assert!(errors.is_empty(), "failed to execute: {errors:?}");
        value
    }
}
