//! Schema migrations of the [`Postgres`] database.

use async_trait::async_trait;
use refinery_core::{
    traits::r#async::{AsyncQuery, AsyncTransaction},
    AsyncMigrate, Migration,
};
use tracerr::Traced;

use crate::infra::database::{self, postgres};

use super::Postgres;

pub use refinery_core::Report;

mod embedded {
    //! Migrations of the `clients` and `loans` tables.

    refinery::embed_migrations!("../migrations");
}

impl Postgres {
    /// Applies the migrations this [`Postgres`] database misses, in their
    /// version order.
    ///
    /// # Errors
    ///
    /// If any of the migrations fails, or the applied ones diverge from the
    /// embedded ones.
    pub async fn migrate(
        &mut self,
    ) -> Result<Report, Traced<database::Error>> {
        embedded::migrations::runner()
            .run_async(self)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncTransaction for Postgres {
    type Error = Traced<database::Error>;

    async fn execute(
        &mut self,
        queries: &[&str],
    ) -> Result<usize, Self::Error> {
        let mut conn = self.0.connection().await?;
        AsyncTransaction::execute(&mut **conn, queries)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

#[async_trait]
impl AsyncQuery<Vec<Migration>> for Postgres {
    async fn query(
        &mut self,
        query: &str,
    ) -> Result<Vec<Migration>, <Self as AsyncTransaction>::Error> {
        let mut conn = self.0.connection().await?;
        AsyncQuery::query(&mut **conn, query)
            .await
            .map_err(tracerr::from_and_wrap!(=> postgres::Error))
            .map_err(tracerr::map_from)
    }
}

impl AsyncMigrate for Postgres {}
