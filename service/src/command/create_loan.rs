//! [`Command`] for lending a new [`Loan`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::loan::{StartDate, Term};
use crate::{
    domain::{client, loan, Client, Loan},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for lending a new [`Loan`] to a [`Client`].
#[derive(Clone, Copy, Debug)]
pub struct CreateLoan {
    /// ID of the [`Client`] borrowing the [`Loan`].
    pub client_id: client::Id,

    /// Amount lent.
    pub principal: Money,

    /// [`StartDate`] of the [`Loan`].
    pub start_date: loan::StartDate,

    /// [`Term`] of the [`Loan`].
    pub term: loan::Term,
}

impl<Db> Command<CreateLoan> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Client, client::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Loan>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Loan;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLoan) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLoan {
            client_id,
            principal,
            start_date,
            term,
        } = cmd;

        if !principal.is_positive() {
            return Err(tracerr::new!(E::PrincipalNotPositive(principal)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid the `Client` being deleted meanwhile.
        tx.execute(Lock(By::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        _ = tx
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())?;

        let loan = Loan {
            id: loan::Id::new(),
            client_id,
            principal,
            start_date,
            term,
            paid_date: None,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(loan.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            "`Loan(id: {})` of {principal} lent to `Client(id: {client_id})`",
            loan.id,
        );

        Ok(loan)
    }
}

/// Error of [`CreateLoan`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] doesn't exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// Principal of the [`Loan`] is zero or negative.
    #[display("`Loan` principal must be positive, but is {_0}")]
    #[from(ignore)]
    PrincipalNotPositive(#[error(not(source))] Money),
}

#[cfg(test)]
pub(crate) mod spec {
    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::{
        command::{create_client, Command as _},
        domain::{client, loan},
        spec::service,
    };

    use super::{CreateLoan, ExecutionError};

    /// [`CreateLoan`] of R$ 1000 for 20 days starting on 2024-05-26, so due
    /// on 2024-06-15.
    pub(crate) fn thousand() -> CreateLoan {
        CreateLoan {
            client_id: client::Id::default(),
            principal: Money {
                amount: Decimal::from(1000),
                currency: Currency::Brl,
            },
            start_date: Date::from_calendar_date(2024, 5, 26)
                .unwrap()
                .coerce(),
            term: loan::Term::default(),
        }
    }

    #[tokio::test]
    async fn lends_loan() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();

        let loan = svc
            .execute(CreateLoan {
                client_id: client.id,
                ..thousand()
            })
            .await
            .unwrap();

        assert_eq!(loan.client_id, client.id);
        assert_eq!(loan.due_date().to_string(), "2024-06-15");
        assert!(!loan.is_paid());
    }

    #[tokio::test]
    async fn rejects_non_positive_principal() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();

        for amount in [Decimal::ZERO, Decimal::from(-10)] {
            let err = svc
                .execute(CreateLoan {
                    client_id: client.id,
                    principal: Money {
                        amount,
                        currency: Currency::Brl,
                    },
                    ..thousand()
                })
                .await
                .unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::PrincipalNotPositive(_)),
                "{err}",
            );
        }
    }

    #[tokio::test]
    async fn fails_on_unknown_client() {
        let svc = service();

        let err = svc
            .execute(CreateLoan {
                client_id: client::Id::new(),
                ..thousand()
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ClientNotExists(_)),
            "{err}",
        );
    }
}
