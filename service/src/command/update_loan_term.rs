//! [`Command`] for updating a [`loan::Term`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::loan::{DueDate, Term};
use crate::{
    domain::{loan, Loan},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`loan::Term`], thus moving its [`DueDate`].
///
/// Terms of already paid [`Loan`]s cannot be changed.
#[derive(Clone, Copy, Debug)]
pub struct UpdateLoanTerm {
    /// ID of the [`Loan`] which [`Term`] should be updated.
    pub loan_id: loan::Id,

    /// New [`Term`] of the [`Loan`].
    pub term: loan::Term,
}

impl<Db> Command<UpdateLoanTerm> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Loan>, loan::Id>>,
            Ok = Option<Loan>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Loan, loan::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Loan>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Loan;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateLoanTerm,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateLoanTerm { loan_id, term } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Loan`.
        tx.execute(Lock(By::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut loan = tx
            .execute(Select(By::<Option<Loan>, _>::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LoanNotExists(loan_id))
            .map_err(tracerr::wrap!())?;
        if loan.is_paid() {
            return Err(tracerr::new!(E::LoanAlreadyPaid(loan_id)));
        }
        if loan.term == term {
            return Ok(loan);
        }

        loan.term = term;
        tx.execute(Update(loan.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(loan)
    }
}

/// Error of [`UpdateLoanTerm`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Loan`] doesn't exist.
    #[display("`Loan(id: {_0})` does not exist")]
    #[from(ignore)]
    LoanNotExists(#[error(not(source))] loan::Id),

    /// [`Loan`] is paid already.
    #[display("`Loan(id: {_0})` is paid already")]
    #[from(ignore)]
    LoanAlreadyPaid(#[error(not(source))] loan::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{
            create_client, create_loan, Command as _, CreateLoan,
            RecordLoanPayment,
        },
        domain::loan,
        spec::service,
    };

    use super::{ExecutionError, UpdateLoanTerm};

    #[tokio::test]
    async fn moves_due_date() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        let loan = svc
            .execute(CreateLoan {
                client_id: client.id,
                ..create_loan::spec::thousand()
            })
            .await
            .unwrap();

        let updated = svc
            .execute(UpdateLoanTerm {
                loan_id: loan.id,
                term: loan::Term::new(30).unwrap(),
            })
            .await
            .unwrap();

        assert_eq!(updated.start_date, loan.start_date);
        assert_eq!(updated.due_date().to_string(), "2024-06-25");
    }

    #[tokio::test]
    async fn keeps_paid_loan_intact() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        let loan = svc
            .execute(CreateLoan {
                client_id: client.id,
                ..create_loan::spec::thousand()
            })
            .await
            .unwrap();
        _ = svc
            .execute(RecordLoanPayment {
                loan_id: loan.id,
                paid_date: Date::from_calendar_date(2024, 6, 1)
                    .unwrap()
                    .coerce(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateLoanTerm {
                loan_id: loan.id,
                term: loan::Term::new(5).unwrap(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::LoanAlreadyPaid(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_loan() {
        let svc = service();

        let err = svc
            .execute(UpdateLoanTerm {
                loan_id: loan::Id::new(),
                term: loan::Term::default(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::LoanNotExists(_)),
            "{err}",
        );
    }
}
