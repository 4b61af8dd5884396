//! [`Client`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{client, Client},
    infra::{
        database::{
            self,
            postgres::Connection,
            Postgres,
        },
        Database,
    },
    read,
};

/// Columns of the `clients` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, name, phone, address, cpf, notes, created_at";

/// Builds a [`Client`] out of the provided [`Row`] selecting [`COLUMNS`].
fn from_row(row: &Row) -> Client {
    Client {
        id: row.get("id"),
        name: row.get("name"),
        phone: row.get("phone"),
        address: row.get("address"),
        cpf: row.get("cpf"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    }
}

/// Builds `ILIKE` patterns matching a [`client::Name`] containing any of the
/// provided `words`.
fn name_patterns(words: &str) -> Vec<String> {
    words
        .split_whitespace()
        .map(|word| {
            let word = word
                .replace('\\', r"\\")
                .replace('%', r"\%")
                .replace('_', r"\_");
            format!("%{word}%")
        })
        .collect()
}

/// Formats the SQL condition of the [`name_patterns()`] bound at the
/// provided parameter index.
fn name_filtering(idx: Option<usize>) -> String {
    idx.map(|idx| format!("AND name ILIKE ANY(${idx}::VARCHAR[])"))
        .unwrap_or_default()
}

impl<C> Database<Select<By<Option<Client>, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM clients \
             WHERE id = $1::UUID"
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Option<Client>, client::Cpf>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Client>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Client>, client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cpf = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM clients \
             WHERE cpf = $1::VARCHAR \
             LIMIT 1"
        );
        Ok(self
            .query_opt(&sql, &[&cpf])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<read::client::HasLoans, client::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::client::HasLoans;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::client::HasLoans, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let client_id = by.into_inner();

        const SQL: &str = "\
            SELECT EXISTS (\
                SELECT 1 \
                FROM loans \
                WHERE client_id = $1::UUID\
            )";
        self.query_one(SQL, &[&client_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| read::client::HasLoans(row.get(0)))
    }
}

impl<C> Database<Insert<Client>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Client>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(client): Insert<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(client)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Client>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(client): Update<Client>,
    ) -> Result<Self::Ok, Self::Err> {
        let Client {
            id,
            name,
            phone,
            address,
            cpf,
            notes,
            created_at,
        } = client;

        const SQL: &str = "\
            INSERT INTO clients (\
                id, name, phone, address, cpf, notes, created_at\
            ) \
            VALUES (\
                $1::UUID, \
                $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::VARCHAR, $6::TEXT, \
                $7::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                phone = EXCLUDED.phone, \
                address = EXCLUDED.address, \
                cpf = EXCLUDED.cpf, \
                notes = EXCLUDED.notes";
        self.exec(
            SQL,
            &[&id, &name, &phone, &address, &cpf, &notes, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Client, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Client, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM clients \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Client, client::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Client, client::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: client::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM clients \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Client, client::Cpf>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Client, client::Cpf>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let cpf: client::Cpf = by.into_inner();

        // No row may hold a `Cpf` yet, so lock the value itself.
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(1, hashtext($1::VARCHAR))";
        self.exec(SQL, &[&cpf]).await.map_err(tracerr::wrap!()).map(drop)
    }
}

impl<C>
    Database<
        Select<By<read::client::list::Page, read::client::list::Selector>>,
    > for Postgres<C>
where
    C: Connection,
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

        // One extra row reveals whether more items follow.
        let limit = i32::try_from(arguments.limit)
            .unwrap_or(i32::MAX - 1)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });

        let patterns = name.as_deref().map(name_patterns);
        let patterns_idx = patterns.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT id \
             FROM clients \
             WHERE TRUE \
                   {cursor} \
                   {name_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.direction.operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.direction.sql_order(),
            name_filtering = name_filtering(patterns_idx),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::client::list::Page::new(
            &arguments,
            rows.iter().map(|row| row.get("id")),
        ))
    }
}

impl<C>
    Database<
        Select<By<read::client::list::TotalCount, read::client::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
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

        let patterns = name.as_deref().map(name_patterns);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let patterns_idx = patterns.as_ref().map(|n| {
            ps.push(n);
            ps.len()
        });

        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM clients \
             WHERE TRUE \
                   {name_filtering}",
            name_filtering = name_filtering(patterns_idx),
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}

#[cfg(test)]
mod spec {
    use super::{name_filtering, name_patterns};

    #[test]
    fn matches_any_word_literally() {
        assert_eq!(
            name_patterns("  maria 100%  so_uza "),
            [r"%maria%", r"%100\%%", r"%so\_uza%"],
        );
        assert!(name_patterns("   ").is_empty());
    }

    #[test]
    fn filters_by_bound_patterns() {
        assert_eq!(
            name_filtering(Some(2)),
            "AND name ILIKE ANY($2::VARCHAR[])",
        );
        assert_eq!(name_filtering(None), "");
    }
}
