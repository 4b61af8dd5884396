//! [`Loan`]-related [`Database`] implementations.

use common::{
    money::Currency,
    operations::{By, Delete, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{loan, Loan},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `loans` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, client_id, \
    principal, principal_currency, \
    start_date, term_days, paid_date, \
    created_at";

/// Builds a [`Loan`] out of the provided [`Row`] selecting [`COLUMNS`].
fn from_row(row: &Row) -> Loan {
    Loan {
        id: row.get("id"),
        client_id: row.get("client_id"),
        principal: Money {
            amount: row.get::<_, Decimal>("principal"),
            currency: row.get::<_, Currency>("principal_currency"),
        },
        start_date: row.get("start_date"),
        term: row.get("term_days"),
        paid_date: row.get("paid_date"),
        created_at: row.get("created_at"),
    }
}

/// Filtering SQL clauses of a [`read::loan::list::Filter`], referring the
/// parameters pushed into `ps`.
fn filtering<'p>(
    filter: &'p read::loan::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let client_idx = filter.client_id.as_ref().map(|id| {
        ps.push(id);
        ps.len()
    });
    let paid_idx = filter.paid.as_ref().map(|paid| {
        ps.push(paid);
        ps.len()
    });

    format!(
        "{client} {paid}",
        client = client_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND client_id = ${idx}::UUID"))
        }),
        paid = paid_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND (paid_date IS NOT NULL) = ${idx}::BOOL"))
        }),
    )
}

impl<C> Database<Select<By<Option<Loan>, loan::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Loan>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Loan>, loan::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM loans \
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

impl<C> Database<Select<By<Vec<Loan>, read::loan::list::Filter>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Loan>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Loan>, read::loan::list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM loans \
             WHERE TRUE {filtering} \
             ORDER BY id ASC",
            filtering = filtering(&filter, &mut ps),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Loan>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Loan>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(loan): Insert<Loan>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(loan)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Loan>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(loan): Update<Loan>,
    ) -> Result<Self::Ok, Self::Err> {
        let Loan {
            id,
            client_id,
            principal,
            start_date,
            term,
            paid_date,
            created_at,
        } = loan;

        const SQL: &str = "\
            INSERT INTO loans (\
                id, client_id, \
                principal, principal_currency, \
                start_date, term_days, paid_date, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::NUMERIC, $4::INT2, \
                $5::DATE, $6::INT4, $7::DATE, \
                $8::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET principal = EXCLUDED.principal, \
                principal_currency = EXCLUDED.principal_currency, \
                start_date = EXCLUDED.start_date, \
                term_days = EXCLUDED.term_days, \
                paid_date = EXCLUDED.paid_date";
        self.exec(
            SQL,
            &[
                &id,
                &client_id,
                &principal.amount,
                &principal.currency,
                &start_date,
                &term,
                &paid_date,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Loan, loan::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Loan, loan::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM loans \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Loan, loan::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Loan, loan::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: loan::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM loans \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Select<By<read::loan::list::Page, read::loan::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
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

        // One extra row reveals whether more items follow.
        let limit = i32::try_from(arguments.limit)
            .unwrap_or(i32::MAX - 1)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT id \
             FROM loans \
             WHERE TRUE \
                   {cursor} \
                   {filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.direction.operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = arguments.direction.sql_order(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::loan::list::Page::new(
            &arguments,
            rows.iter().map(|row| row.get("id")),
        ))
    }
}

impl<C>
    Database<
        Select<By<read::loan::list::TotalCount, read::loan::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
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

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let sql = format!(
            "SELECT COUNT(*)::INT4 \
             FROM loans \
             WHERE TRUE {filtering}",
            filtering = filtering(&filter, &mut ps),
        );
        self.query_one(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.get::<_, i32>(0).into())
    }
}
