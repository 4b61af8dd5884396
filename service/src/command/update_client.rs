//! [`Command`] for updating a [`Client`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::client::{Address, Cpf, Name, Notes, Phone};
use crate::{
    domain::{client, Client},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Client`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateClient {
    /// ID of the [`Client`] to update.
    pub client_id: client::Id,

    /// New [`Name`] of the [`Client`].
    pub name: Option<client::Name>,

    /// New [`Phone`] of the [`Client`].
    pub phone: Option<client::Phone>,

    /// New [`Address`] of the [`Client`].
    pub address: Option<client::Address>,

    /// New [`Cpf`] of the [`Client`], or [`None`] to clear it.
    pub cpf: Option<Option<client::Cpf>>,

    /// New [`Notes`] about the [`Client`], or [`None`] to clear them.
    pub notes: Option<Option<client::Notes>>,
}

impl<Db> Command<UpdateClient> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Client>, client::Id>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Client>, client::Cpf>>,
            Ok = Option<Client>,
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Client, client::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Client, client::Cpf>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<Client>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Client;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateClient) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateClient {
            client_id,
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

        // Avoid concurrent actions upon the same `Client`.
        tx.execute(Lock(By::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut client = tx
            .execute(Select(By::<Option<Client>, _>::new(client_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ClientNotExists(client_id))
            .map_err(tracerr::wrap!())?;

        if let Some(Some(cpf)) = &cpf {
            if client.cpf.as_ref() != Some(cpf) {
                // Avoid concurrent claims upon the same `Cpf`.
                tx.execute(Lock(By::new(cpf.clone())))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;

                let holder = tx
                    .execute(Select(By::<Option<Client>, _>::new(cpf.clone())))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                if holder.is_some_and(|c| c.id != client_id) {
                    return Err(tracerr::new!(E::CpfOccupied(cpf.clone())));
                }
            }
        }

        let before = client.clone();
        if let Some(name) = name {
            client.name = name;
        }
        if let Some(phone) = phone {
            client.phone = phone;
        }
        if let Some(address) = address {
            client.address = address;
        }
        if let Some(cpf) = cpf {
            client.cpf = cpf;
        }
        if let Some(notes) = notes {
            client.notes = notes;
        }
        if client == before {
            return Ok(client);
        }

        tx.execute(Update(client.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(client)
    }
}

/// Error of [`UpdateClient`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Client`] doesn't exist.
    #[display("`Client(id: {_0})` does not exist")]
    #[from(ignore)]
    ClientNotExists(#[error(not(source))] client::Id),

    /// [`Cpf`] is already registered for another [`Client`].
    #[display("`Cpf({_0})` is occupied by another `Client`")]
    #[from(ignore)]
    CpfOccupied(#[error(not(source))] client::Cpf),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{create_client, Command as _, CreateClient},
        domain::client,
        spec::service,
    };

    use super::{ExecutionError, UpdateClient};

    #[tokio::test]
    async fn patches_only_provided_fields() {
        let svc = service();
        let created = svc.execute(create_client::spec::maria()).await.unwrap();

        let updated = svc
            .execute(UpdateClient {
                client_id: created.id,
                phone: Some("(21) 91234-5678".parse().unwrap()),
                notes: Some(Some("Prefere contato à tarde".parse().unwrap())),
                ..UpdateClient::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.name, created.name);
        assert_eq!(updated.cpf, created.cpf);
        assert_eq!(updated.phone.to_string(), "(21) 91234-5678");
        assert!(updated.notes.is_some());
    }

    #[tokio::test]
    async fn clears_cpf() {
        let svc = service();
        let created = svc.execute(create_client::spec::maria()).await.unwrap();

        let updated = svc
            .execute(UpdateClient {
                client_id: created.id,
                cpf: Some(None),
                ..UpdateClient::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.cpf, None);
    }

    #[tokio::test]
    async fn rejects_cpf_of_another_client() {
        let svc = service();
        let maria = svc.execute(create_client::spec::maria()).await.unwrap();
        let joao = svc
            .execute(CreateClient {
                name: "João Lima".parse().unwrap(),
                cpf: Some("111.444.777-35".parse().unwrap()),
                ..create_client::spec::maria()
            })
            .await
            .unwrap();

        let err = svc
            .execute(UpdateClient {
                client_id: joao.id,
                cpf: Some(maria.cpf.clone()),
                ..UpdateClient::default()
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::CpfOccupied(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn keeps_own_cpf() {
        let svc = service();
        let maria = svc.execute(create_client::spec::maria()).await.unwrap();

        let updated = svc
            .execute(UpdateClient {
                client_id: maria.id,
                cpf: Some(maria.cpf.clone()),
                ..UpdateClient::default()
            })
            .await
            .unwrap();

        assert_eq!(updated, maria);
    }

    #[tokio::test]
    async fn fails_on_unknown_client() {
        let svc = service();
        let id = client::Id::new();

        let err = svc
            .execute(UpdateClient {
                client_id: id,
                ..UpdateClient::default()
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::ClientNotExists(i) if *i == id),
            "{err}",
        );
    }
}
