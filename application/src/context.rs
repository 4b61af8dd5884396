//! [`Context`]-related definitions.

use std::sync::atomic::{self, AtomicU16};

use axum::{async_trait, extract::FromRequestParts};
use common::{Date, DateTime};
use juniper::{
    http::{GraphQLBatchResponse, GraphQLResponse},
    IntoFieldError as _,
};

use crate::{Error, JuniperResponse, Service};

/// Application context.
#[derive(Debug)]
pub struct Context {
    /// [`Service`] instance.
    service: Service,

    /// Error status code.
    error_status_code: AtomicU16,

    /// [`DateTime`] the HTTP request was received at.
    now: DateTime,
}

impl Context {
    /// Creates a new [`Context`] of the HTTP request received at `now`.
    #[must_use]
    pub fn new(service: Service, now: DateTime) -> Self {
        Self {
            service,
            error_status_code: AtomicU16::new(
                http::StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            ),
            now,
        }
    }

    /// Returns [`Service`] instance of this [`Context`].
    #[must_use]
    pub fn service(&self) -> &Service {
        &self.service
    }

    /// Returns the [`DateTime`] the current HTTP request was received at.
    #[must_use]
    pub fn now(&self) -> DateTime {
        self.now
    }

    /// Returns the reference [`Date`] for the current HTTP request.
    ///
    /// The provided `as_of` [`Date`] takes precedence, otherwise it's the
    /// calendar day the request was received on.
    #[must_use]
    pub fn today(&self, as_of: Option<Date>) -> Date {
        as_of.unwrap_or_else(|| self.service.date_of(self.now))
    }

    /// Returns the error status code of this [`Context`].
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn error_status_code(&self) -> http::StatusCode {
        http::StatusCode::from_u16(
            self.error_status_code.load(atomic::Ordering::Relaxed),
        )
        .expect("invalid status code")
    }

    /// Sets the error status code for this [`Context`].
    ///
    /// Provided [`http::StatusCode`] will be applied to the response.
    pub fn set_error_status_code(&self, status_code: http::StatusCode) {
        self.error_status_code
            .store(status_code.as_u16(), atomic::Ordering::Relaxed);
    }

    /// Helper method calling [`Context::set_error_status_code()`] inside
    /// [`Result::map_err()`] closure.
    pub fn error(&self) -> impl FnOnce(Error) -> Error + '_ {
        move |err| {
            self.set_error_status_code(err.status_code);
            err
        }
    }
}

impl juniper::Context for Context {}

#[async_trait]
impl<S> FromRequestParts<S> for Context
where
    S: Send + Sync,
{
    type Rejection = JuniperResponse;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service =
            parts.extensions.get::<Service>().cloned().ok_or_else(|| {
                JuniperResponse {
                    status_code: http::StatusCode::INTERNAL_SERVER_ERROR,
                    response: GraphQLBatchResponse::Single(
                        GraphQLResponse::error(
                            Error::internal(&"missing `Service` extension")
                                .into_field_error(),
                        ),
                    ),
                }
            })?;

        Ok(Self::new(service, DateTime::now()))
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::spec::context;

    #[test]
    fn observes_request_day_at_offset() {
        // Still the evening of the 14th in Brasília.
        let ctx = context("2024-06-15T02:00:00Z");

        assert_eq!(ctx.today(None).to_string(), "2024-06-14");
    }

    #[test]
    fn as_of_overrides_request_day() {
        let ctx = context("2024-06-15T12:00:00Z");
        let as_of = Date::from_calendar_date(2024, 7, 1).unwrap();

        assert_eq!(ctx.today(Some(as_of)), as_of);
        assert_eq!(ctx.today(None).to_string(), "2024-06-15");
    }

    #[test]
    fn captures_now_once() {
        let ctx = context("2024-06-15T23:59:59-03:00");

        let (first, day) = (ctx.now(), ctx.today(None));
        assert_eq!(ctx.now(), first);
        assert_eq!(ctx.today(None), day);
        assert_eq!(day.to_string(), "2024-06-15");
    }
}
