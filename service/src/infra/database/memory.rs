//! In-process memory [`Database`] implementation.
//!
//! Transactions are serialized: only a single [`Tx`] exists at any moment, and
//! its changes become visible to others on [`Commit`] only. Thus, all the
//! [`Lock`] operations succeed immediately.

use std::{collections::BTreeMap, sync::Arc};

use common::{
    operations::{By, Commit, Delete, Insert, Lock, Select, Transact, Update},
    pagination::{Arguments, Direction, Page},
};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{client, loan, Client, Loan},
    infra::{database, Database},
    read,
};

/// In-process memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

/// Records stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`Client`]s.
    clients: BTreeMap<client::Id, Client>,

    /// Stored [`Loan`]s.
    loans: BTreeMap<loan::Id, Loan>,
}

/// Non-transactional [`Memory`] client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Committed [`State`].
    state: Arc<RwLock<State>>,

    /// Gate allowing a single [`Tx`] at once.
    gate: Arc<Mutex<()>>,
}

/// Transactional [`Memory`] client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Committed [`State`] to apply the changes to.
    base: Arc<RwLock<State>>,

    /// [`State`] with the changes of this [`Tx`] applied.
    staged: Arc<RwLock<State>>,

    /// Guard of the [`NonTx::gate`], released on [`Commit`] or drop.
    guard: Arc<Mutex<Option<OwnedMutexGuard<()>>>>,
}

/// Access to the [`State`] a [`Memory`] client operates on.
pub trait Storage {
    /// Returns the [`State`] visible to this client.
    fn state(&self) -> &RwLock<State>;
}

impl Storage for NonTx {
    fn state(&self) -> &RwLock<State> {
        &self.state
    }
}

impl Storage for Tx {
    fn state(&self) -> &RwLock<State> {
        &self.staged
    }
}

/// Selects a [`Page`] out of the ascending `ids` by the provided
/// [`Arguments`].
fn page<Id, I>(ids: I, args: &Arguments<Id>) -> Page<Id>
where
    Id: Ord,
    I: DoubleEndedIterator<Item = Id>,
{
    let extra = args.limit.saturating_add(1);
    let ids = match args.direction {
        Direction::Forward => {
            ids.filter(|id| args.passes(id)).take(extra).collect::<Vec<_>>()
        }
        Direction::Backward => ids
            .rev()
            .filter(|id| args.passes(id))
            .take(extra)
            .collect::<Vec<_>>(),
    };
    Page::new(args, ids)
}

/// Converts the provided number of items into a total count.
fn count<T: From<i32>>(n: usize) -> T {
    T::from(i32::try_from(n).unwrap_or(i32::MAX))
}

/// Checks whether the provided [`client::Name`] matches any of the `words`.
fn name_matches(name: &client::Name, words: &str) -> bool {
    let name = AsRef::<str>::as_ref(name).to_lowercase();
    words
        .split_whitespace()
        .any(|w| name.contains(&w.to_lowercase()))
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let guard = Arc::clone(&self.0.gate).lock_owned().await;
        let staged = self.0.state.read().await.clone();
        Ok(Memory(Tx {
            base: Arc::clone(&self.0.state),
            staged: Arc::new(RwLock::new(staged)),
            guard: Arc::new(Mutex::new(Some(guard))),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let mut guard = self.0.guard.lock().await;
        if guard.is_none() {
            // Already committed.
            return Ok(());
        }

        let staged = self.0.staged.read().await.clone();
        *self.0.base.write().await = staged;
        drop(guard.take());

        Ok(())
    }
}

impl<T: Storage> Database<Select<By<Option<Client>, client::Id>>>
    for Memory<T>
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.state().read().await.clients.get(&id).cloned())
    }
}

impl<T: Storage> Database<Select<By<Option<Client>, client::Cpf>>>
    for Memory<T>
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cpf = by.into_inner();
        Ok(self
            .0
            .state()
            .read()
            .await
            .clients
            .values()
            .find(|c| c.cpf.as_ref() == Some(&cpf))
            .cloned())
    }
}

impl<T: Storage> Database<Select<By<read::client::HasLoans, client::Id>>>
    for Memory<T>
{
    type Ok = read::client::HasLoans;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::client::HasLoans, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let client_id = by.into_inner();
        Ok(read::client::HasLoans(
            self.0
                .state()
                .read()
                .await
                .loans
                .values()
                .any(|l| l.client_id == client_id),
        ))
    }
}

impl<T: Storage>
    Database<
        Select<By<read::client::list::Page, read::client::list::Selector>>,
    > for Memory<T>
{
    type Ok = read::client::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::client::list::Page, read::client::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::client::list::Selector {
            arguments,
            filter: read::client::list::Filter { name },
        } = by.into_inner();

        let state = self.0.state().read().await;
        let ids = state
            .clients
            .values()
            .filter(|c| name.as_ref().map_or(true, |n| name_matches(&c.name, n)))
            .map(|c| c.id);
        Ok(page(ids, &arguments))
    }
}

impl<T: Storage>
    Database<
        Select<By<read::client::list::TotalCount, read::client::list::Filter>>,
    > for Memory<T>
{
    type Ok = read::client::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::client::list::TotalCount, read::client::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::client::list::Filter { name } = by.into_inner();

        let state = self.0.state().read().await;
        Ok(count(
            state
                .clients
                .values()
                .filter(|c| {
                    name.as_ref().map_or(true, |n| name_matches(&c.name, n))
                })
                .count(),
        ))
    }
}

impl<T: Storage> Database<Select<By<Option<Loan>, loan::Id>>> for Memory<T> {
    type Ok = Option<Loan>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Loan>, loan::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.0.state().read().await.loans.get(&id).cloned())
    }
}

impl<T: Storage> Database<Select<By<Vec<Loan>, read::loan::list::Filter>>>
    for Memory<T>
{
    type Ok = Vec<Loan>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Loan>, read::loan::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        Ok(self
            .0
            .state()
            .read()
            .await
            .loans
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}

impl<T: Storage>
    Database<Select<By<read::loan::list::Page, read::loan::list::Selector>>>
    for Memory<T>
{
    type Ok = read::loan::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::loan::list::Page, read::loan::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::loan::list::Selector { arguments, filter } = by.into_inner();

        let state = self.0.state().read().await;
        let ids = state
            .loans
            .values()
            .filter(|l| filter.matches(l))
            .map(|l| l.id);
        Ok(page(ids, &arguments))
    }
}

impl<T: Storage>
    Database<
        Select<By<read::loan::list::TotalCount, read::loan::list::Filter>>,
    > for Memory<T>
{
    type Ok = read::loan::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::loan::list::TotalCount, read::loan::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let state = self.0.state().read().await;
        Ok(count(
            state.loans.values().filter(|l| filter.matches(l)).count(),
        ))
    }
}

impl Database<Insert<Client>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(client): Insert<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(client)).await
    }
}

impl Database<Update<Client>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(client): Update<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.0.staged.write().await.clients.insert(client.id, client);
        Ok(())
    }
}

impl Database<Delete<By<Client, client::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Client, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        _ = self.0.staged.write().await.clients.remove(&id);
        Ok(())
    }
}

impl Database<Insert<Loan>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(loan): Insert<Loan>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(loan)).await
    }
}

impl Database<Update<Loan>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(loan): Update<Loan>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.0.staged.write().await.loans.insert(loan.id, loan);
        Ok(())
    }
}

impl Database<Delete<By<Loan, loan::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Loan, loan::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        _ = self.0.staged.write().await.loans.remove(&id);
        Ok(())
    }
}

impl<W, B> Database<Lock<By<W, B>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Lock<By<W, B>>) -> Result<Self::Ok, Self::Err> {
        // `Tx` is exclusive already.
        Ok(())
    }
}

#[cfg(test)]
mod spec {
    use common::{
        money::Currency,
        operations::{By, Commit, Insert, Select, Transact},
        pagination::Arguments,
        Date, DateTime, Handler as _, Money,
    };
    use rust_decimal::Decimal;

    use crate::{
        domain::{client, loan, Client, Loan},
        read,
    };

    use super::Memory;

    fn client(name: &str) -> Client {
        Client {
            id: client::Id::new(),
            name: name.parse().unwrap(),
            phone: "11987654321".parse().unwrap(),
            address: "Rua A, 100".parse().unwrap(),
            cpf: None,
            notes: None,
            created_at: DateTime::now().coerce(),
        }
    }

    fn loan(client_id: client::Id) -> Loan {
        Loan {
            id: loan::Id::new(),
            client_id,
            principal: Money {
                amount: Decimal::from(100),
                currency: Currency::Brl,
            },
            start_date: Date::from_calendar_date(2024, 1, 1)
                .unwrap()
                .coerce(),
            term: loan::Term::default(),
            paid_date: None,
            created_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn commits_changes() {
        let db: Memory = Memory::default();
        let c = client("Maria");

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(c.clone())).await.unwrap();

        let outside = db
            .execute(Select(By::<Option<Client>, _>::new(c.id)))
            .await
            .unwrap();
        assert_eq!(outside, None, "uncommitted changes must not leak");

        tx.execute(Commit).await.unwrap();

        let outside = db
            .execute(Select(By::<Option<Client>, _>::new(c.id)))
            .await
            .unwrap();
        assert_eq!(outside, Some(c));
    }

    #[tokio::test]
    async fn discards_dropped_transaction() {
        let db: Memory = Memory::default();
        let c = client("Maria");

        {
            let tx = db.execute(Transact).await.unwrap();
            tx.execute(Insert(c.clone())).await.unwrap();
        }

        // Would block forever, if the dropped `Tx` still held the gate.
        let tx = db.execute(Transact).await.unwrap();
        let inside = tx
            .execute(Select(By::<Option<Client>, _>::new(c.id)))
            .await
            .unwrap();
        assert_eq!(inside, None);
    }

    #[tokio::test]
    async fn paginates_in_creation_order() {
        let db: Memory = Memory::default();
        let owner = client("Maria");
        let loans = (0..5).map(|_| loan(owner.id)).collect::<Vec<_>>();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(owner.clone())).await.unwrap();
        for l in &loans {
            tx.execute(Insert(l.clone())).await.unwrap();
        }
        tx.execute(Commit).await.unwrap();

        let first = db
            .execute(Select(By::<read::loan::list::Page, _>::new(
                read::loan::list::Selector {
                    arguments: Arguments::new(Some(2), None, None, None, 10)
                        .unwrap(),
                    filter: read::loan::list::Filter::default(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(first.ids, [loans[0].id, loans[1].id]);
        assert!(first.has_next_page);

        let last = db
            .execute(Select(By::<read::loan::list::Page, _>::new(
                read::loan::list::Selector {
                    arguments: Arguments::new(
                        None,
                        None,
                        Some(2),
                        Some(loans[4].id),
                        10,
                    )
                    .unwrap(),
                    filter: read::loan::list::Filter::default(),
                },
            )))
            .await
            .unwrap();
        assert_eq!(last.ids, [loans[2].id, loans[3].id]);
        assert!(last.has_previous_page);

        let all = db
            .execute(Select(By::<Vec<Loan>, _>::new(
                read::loan::list::Filter::default(),
            )))
            .await
            .unwrap();
        let ids = all.iter().map(|l| l.id).collect::<Vec<_>>();
        assert_eq!(ids, loans.iter().map(|l| l.id).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn filters_clients_by_name() {
        let db: Memory = Memory::default();

        let tx = db.execute(Transact).await.unwrap();
        for name in ["Maria Souza", "João Lima", "Mariana Costa"] {
            tx.execute(Insert(client(name))).await.unwrap();
        }
        tx.execute(Commit).await.unwrap();

        let count = db
            .execute(Select(By::<read::client::list::TotalCount, _>::new(
                read::client::list::Filter {
                    name: Some("maria".into()),
                },
            )))
            .await
            .unwrap();
        assert_eq!(i32::from(count), 2);
    }
}
