//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::{graphql_object, Nullable};
use service::{command, Command as _};

use crate::{
    api::{
        self,
        query::{ClientError, LoanError, PaymentError, PrincipalError},
    },
    define_error, AsError, Context, Error,
};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `Client` with the provided contact info.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CPF_OCCUPIED` - provided `ClientCpf` belongs to another `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            address = %address,
            cpf = ?cpf.as_ref().map(ToString::to_string),
            gql.name = "createClient",
            name = %name,
            otel.name = Self::SPAN_NAME,
            phone = %phone,
        ),
    )]
    pub async fn create_client(
        name: api::client::Name,
        phone: api::client::Phone,
        address: api::client::Address,
        cpf: Option<api::client::Cpf>,
        notes: Option<api::client::Notes>,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.service()
            .execute(command::CreateClient {
                name: name.into(),
                phone: phone.into(),
                address: address.into(),
                cpf: cpf.map(Into::into),
                notes: notes.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided details of the `Client`, leaving the omitted ones
    /// intact.
    ///
    /// Explicit `null` clears the `cpf` and `notes`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist;
    /// - `CPF_OCCUPIED` - provided `ClientCpf` belongs to another `Client`.
    #[tracing::instrument(
        skip_all,
        fields(
            address = ?address.as_ref().map(ToString::to_string),
            gql.name = "updateClient",
            id = %id,
            name = ?name.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            phone = ?phone.as_ref().map(ToString::to_string),
        ),
    )]
    pub async fn update_client(
        id: api::client::Id,
        name: Option<api::client::Name>,
        phone: Option<api::client::Phone>,
        address: Option<api::client::Address>,
        cpf: Nullable<api::client::Cpf>,
        notes: Nullable<api::client::Notes>,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.service()
            .execute(command::UpdateClient {
                client_id: id.into(),
                name: name.map(Into::into),
                phone: phone.map(Into::into),
                address: address.map(Into::into),
                cpf: cpf.explicit().map(|c| c.map(Into::into)),
                notes: notes.explicit().map(|n| n.map(Into::into)),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Client` without any `Loan`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist;
    /// - `CLIENT_HAS_LOANS` - the `Client` still has `Loan`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteClient",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_client(
        id: api::client::Id,
        ctx: &Context,
    ) -> Result<api::Client, Error> {
        ctx.service()
            .execute(command::DeleteClient {
                client_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lends the `principal` to the `Client`.
    ///
    /// The `Loan` starts on `startDate` (today by default) and runs for
    /// `term` days (20 by default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `CLIENT_NOT_EXISTS` - the `Client` with the specified ID does not
    ///                         exist;
    /// - `INVALID_PRINCIPAL` - the `principal` is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            client_id = %client_id,
            gql.name = "createLoan",
            otel.name = Self::SPAN_NAME,
            principal = %principal,
            start_date = ?start_date,
            term = ?term,
        ),
    )]
    pub async fn create_loan(
        client_id: api::client::Id,
        principal: api::money::Amount,
        start_date: Option<Date>,
        term: Option<api::loan::Term>,
        ctx: &Context,
    ) -> Result<api::Loan, Error> {
        let today = ctx.today(None);

        ctx.service()
            .execute(command::CreateLoan {
                client_id: client_id.into(),
                principal: principal
                    .in_currency(ctx.service().config().currency),
                start_date: start_date.unwrap_or(today).coerce(),
                term: term.map(Into::into).unwrap_or_default(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|l| api::Loan::new(l, today))
    }

    /// Changes the term of the not yet paid `Loan`, moving its due `Date`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOAN_NOT_EXISTS` - the `Loan` with the specified ID does not exist;
    /// - `LOAN_ALREADY_PAID` - the `Loan` is paid already.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateLoanTerm",
            id = %id,
            otel.name = Self::SPAN_NAME,
            term = %term,
        ),
    )]
    pub async fn update_loan_term(
        id: api::loan::Id,
        term: api::loan::Term,
        ctx: &Context,
    ) -> Result<api::Loan, Error> {
        ctx.service()
            .execute(command::UpdateLoanTerm {
                loan_id: id.into(),
                term: term.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|l| api::Loan::new(l, ctx.today(None)))
    }

    /// Records the payment of the `Loan` made on `paidDate` (today by
    /// default).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOAN_NOT_EXISTS` - the `Loan` with the specified ID does not exist;
    /// - `LOAN_ALREADY_PAID` - the `Loan` is paid already;
    /// - `INVALID_PAID_DATE` - the `paidDate` precedes the start of the
    ///                         `Loan`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "recordLoanPayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
            paid_date = ?paid_date,
        ),
    )]
    pub async fn record_loan_payment(
        id: api::loan::Id,
        paid_date: Option<Date>,
        ctx: &Context,
    ) -> Result<api::Loan, Error> {
        let today = ctx.today(None);

        ctx.service()
            .execute(command::RecordLoanPayment {
                loan_id: id.into(),
                paid_date: paid_date.unwrap_or(today).coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|l| api::Loan::new(l, today))
    }

    /// Deletes the `Loan`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `LOAN_NOT_EXISTS` - the `Loan` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteLoan",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_loan(
        id: api::loan::Id,
        ctx: &Context,
    ) -> Result<api::Loan, Error> {
        ctx.service()
            .execute(command::DeleteLoan { loan_id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|l| api::Loan::new(l, ctx.today(None)))
    }
}

define_error! {
    enum CpfError {
        #[code = "CPF_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`ClientCpf` belongs to another `Client`"]
        Occupied,
    }
}

impl AsError for command::create_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::CpfOccupied(_) => Some(CpfError::Occupied.into()),
        }
    }
}

impl AsError for command::update_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(ClientError::NotExists.into()),
            Self::CpfOccupied(_) => Some(CpfError::Occupied.into()),
        }
    }
}

impl AsError for command::delete_client::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "CLIENT_HAS_LOANS"]
                #[status = CONFLICT]
                #[message = "`Client` still has `Loan`s"]
                HasLoans,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(ClientError::NotExists.into()),
            Self::ClientHasLoans(_) => Some(Error::HasLoans.into()),
        }
    }
}

impl AsError for command::create_loan::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ClientNotExists(_) => Some(ClientError::NotExists.into()),
            Self::PrincipalNotPositive(_) => {
                Some(PrincipalError::NotPositive.into())
            }
        }
    }
}

impl AsError for command::update_loan_term::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoanNotExists(_) => Some(LoanError::NotExists.into()),
            Self::LoanAlreadyPaid(_) => Some(PaymentError::AlreadyPaid.into()),
        }
    }
}

impl AsError for command::record_loan_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoanNotExists(_) => Some(LoanError::NotExists.into()),
            Self::LoanAlreadyPaid(_) => Some(PaymentError::AlreadyPaid.into()),
            Self::PaidBeforeStart { .. } => {
                Some(PaymentError::BeforeStart.into())
            }
        }
    }
}

impl AsError for command::delete_loan::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoanNotExists(_) => Some(LoanError::NotExists.into()),
        }
    }
}
