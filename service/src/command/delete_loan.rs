//! [`Command`] for deleting a [`Loan`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{loan, Loan},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Loan`].
#[derive(Clone, Copy, Debug)]
pub struct DeleteLoan {
    /// ID of the [`Loan`] to delete.
    pub loan_id: loan::Id,
}

impl<Db> Command<DeleteLoan> for Service<Db>
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
        > + Database<
            Delete<By<Loan, loan::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Loan;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteLoan) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteLoan { loan_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Loan`.
        tx.execute(Lock(By::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let loan = tx
            .execute(Select(By::<Option<Loan>, _>::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LoanNotExists(loan_id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<Loan, _>::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Loan(id: {loan_id})` deleted");

        Ok(loan)
    }
}

/// Error of [`DeleteLoan`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Loan`] doesn't exist.
    #[display("`Loan(id: {_0})` does not exist")]
    #[from(ignore)]
    LoanNotExists(#[error(not(source))] loan::Id),
}
