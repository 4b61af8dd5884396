//! [`Query`] collection related to a single [`Loan`].

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{loan, Loan},
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Loan`] by its [`loan::Id`].
pub type ById = DatabaseQuery<By<Option<Loan>, loan::Id>>;

/// [`Query`] of a [`read::loan::Statement`] of a single [`Loan`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Statement {
    /// ID of the [`Loan`] to state.
    pub loan_id: loan::Id,

    /// Reference [`Date`] to state the [`Loan`] as of.
    pub today: Date,
}

impl<Db> Query<Statement> for Service<Db>
where
    Db: Database<
        Select<By<Option<Loan>, loan::Id>>,
        Ok = Option<Loan>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<read::loan::Statement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Statement { loan_id, today }: Statement,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .database()
            .execute(Select(By::<Option<Loan>, _>::new(loan_id)))
            .await
            .map_err(tracerr::wrap!())?
            .map(|loan| self.statement(loan, today)))
    }
}
