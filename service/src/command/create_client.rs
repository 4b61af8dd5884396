//! [`Command`] for creating a new [`Client`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::client::{Address, Cpf, Name, Notes, Phone};
use crate::{
    domain::{client, Client},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Client`].
#[derive(Clone, Debug)]
pub struct CreateClient {
    /// [`Name`] of a new [`Client`].
    pub name: client::Name,

    /// [`Phone`] of a new [`Client`].
    pub phone: client::Phone,

    /// [`Address`] of a new [`Client`].
    pub address: client::Address,

    /// [`Cpf`] of a new [`Client`], if known.
    pub cpf: Option<client::Cpf>,

    /// [`Notes`] about a new [`Client`].
    pub notes: Option<client::Notes>,
}

impl<Db> Command<CreateClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Client>, client::Cpf>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Client, client::Cpf>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Insert<Client>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateClient {
            name,
            phone,
            address,
            cpf,
            notes,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        if let Some(cpf) = &cpf {
            // Avoid concurrent claims upon the same `Cpf`.
            tx.execute(Lock(By::new(cpf.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let holder = tx
                .execute(Select(By::<Option<Client>, _>::new(cpf.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if holder.is_some() {
                return Err(tracerr::new!(E::CpfOccupied(cpf.clone())));
            }
        }

        let client = Client {
            id: client::Id::new(),
            name,
            phone,
            address,
            cpf,
            notes,
            created_at: DateTime::now().coerce(),
        };
        tx.execute(Insert(client.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Client(id: {})` created", client.id);

        Ok(client)
    }
}

/// Error of [`CreateClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Cpf`] is already registered for another [`Client`].
    #[display("`Cpf({_0})` is occupied by another `Client`")]
    #[from(ignore)]
    CpfOccupied(#[error(not(source))] client::Cpf),
}

#[cfg(test)]
pub(crate) mod spec {
    use crate::{command::Command as _, spec::service};

    use super::{CreateClient, ExecutionError};

    pub(crate) fn maria() -> CreateClient {
        CreateClient {
            name: "Maria Souza".parse().unwrap(),
            phone: "(11) 98765-4321".parse().unwrap(),
            address: "Rua das Flores, 12".parse().unwrap(),
            cpf: Some("529.982.247-25".parse().unwrap()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn creates_client() {
        let svc = service();

        let client = svc.execute(maria()).await.unwrap();

        assert_eq!(client.name.to_string(), "Maria Souza");
        assert_eq!(
            client.cpf.as_ref().map(ToString::to_string).as_deref(),
            Some("52998224725"),
        );
    }

    #[tokio::test]
    async fn rejects_occupied_cpf() {
        let svc = service();
        _ = svc.execute(maria()).await.unwrap();

        let err = svc.execute(maria()).await.unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::CpfOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn allows_many_clients_without_cpf() {
        let svc = service();

        for _ in 0..2 {
            _ = svc
                .execute(CreateClient { cpf: None, ..maria() })
                .await
                .unwrap();
        }
    }
}
