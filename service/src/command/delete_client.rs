//! [`Command`] for deleting a [`Client`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Loan;
use crate::{
    domain::{client, Client},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Client`].
///
/// A [`Client`] having any [`Loan`]s cannot be deleted.
#[derive(Clone, Copy, Debug)]
pub struct DeleteClient {
    /// ID of the [`Client`] to delete.
    pub client_id: client::Id,
}

impl<Db> Command<DeleteClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::client::HasLoans, client::Id>>,
            Ok = read::client::HasLoans,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Client, client::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Client, client::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteClient { client_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid new `Loan`s being lent to the `Client` meanwhile.
        tx.execute(Lock(By::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let client = tx
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())?;

        let has_loans = tx
            .execute(Select(By::<read::client::HasLoans, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_loans {
            return Err(tracerr::new!(E::ClientHasLoans(client_id)));
        }

        tx.execute(Delete(By::<Client, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Client(id: {client_id})` deleted");

        Ok(client)
    }
}

/// Error of [`DeleteClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] doesn't exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// [`Client`] still has [`Loan`]s.
    #[display("`Client(id: {_0})` has `Loan`s")]
    #[from(ignore)]
    ClientHasLoans(#[error(not(source))] client::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Select};

    use crate::{
        command::{
            create_client, create_loan, Command as _, CreateLoan,
            DeleteLoan,
        },
        domain::Client,
        infra::Database as _,
        spec::service,
    };

    use super::{DeleteClient, ExecutionError};

    #[tokio::test]
    async fn deletes_client() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();

        let deleted = svc
            .execute(DeleteClient {
                client_id: client.id,
            })
            .await
            .unwrap();

        assert_eq!(deleted, client);
        let stored = svc
            .database()
            .execute(Select(By::<Option<Client>, _>::new(client.id)))
            .await
            .unwrap();
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn keeps_client_with_loans() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        let loan = svc
            .execute(CreateLoan {
                client_id: client.id,
                ..create_loan::spec::thousand()
            })
            .await
            .unwrap();

        let err = svc
            .execute(DeleteClient {
                client_id: client.id,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::ClientHasLoans(_)),
            "{err}",
        );

        _ = svc.execute(DeleteLoan { loan_id: loan.id }).await.unwrap();
        _ = svc
            .execute(DeleteClient {
                client_id: client.id,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn fails_on_unknown_client() {
        let svc = service();

        let err = svc
            .execute(DeleteClient {
                client_id: crate::domain::client::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ClientNotExists(_)),
            "{err}",
        );
    }
}
