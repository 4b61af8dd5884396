//! [`SimulateLoan`] definition.

use common::{Date, Money};
use derive_more::{Display, Error};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Loan;
use crate::{
    domain::loan::{self, Snapshot},
    Query, Service,
};

/// [`Query`] computing a [`Snapshot`] of a hypothetical [`Loan`], without
/// storing anything.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SimulateLoan {
    /// Amount to lend.
    pub principal: Money,

    /// [`loan::StartDate`] of the [`Loan`].
    pub start_date: loan::StartDate,

    /// [`loan::Term`] of the [`Loan`].
    pub term: loan::Term,

    /// [`loan::PaidDate`] of the [`Loan`], if it's assumed to be paid.
    pub paid_date: Option<loan::PaidDate>,

    /// Reference [`Date`] to simulate the [`Loan`] as of.
    pub today: Date,
}

impl<Db> Query<SimulateLoan> for Service<Db> {
    type Ok = Snapshot;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: SimulateLoan,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SimulateLoan {
            principal,
            start_date,
            term,
            paid_date,
            today,
        } = query;

        if !principal.is_positive() {
            return Err(tracerr::new!(E::PrincipalNotPositive(principal)));
        }
        if let Some(paid_date) = paid_date {
            if paid_date.days_until(&start_date) > 0 {
                return Err(tracerr::new!(E::PaidBeforeStart {
                    paid_date,
                    start_date,
                }));
            }
        }

        Ok(Snapshot::compute(
            &self.config().rates,
            principal,
            start_date,
            paid_date,
            term,
            today,
        ))
    }
}

/// Error of [`SimulateLoan`] [`Query`] execution.
#[derive(Debug, Display, Error)]
pub enum ExecutionError {
    /// Principal of the [`Loan`] is zero or negative.
    #[display("`Loan` principal must be positive, but is {_0}")]
    PrincipalNotPositive(#[error(not(source))] Money),

    /// [`loan::PaidDate`] precedes the [`loan::StartDate`] of the [`Loan`].
    #[display("`Loan` cannot be paid on {paid_date} before its start on \
               {start_date}")]
    PaidBeforeStart {
        /// Assumed [`loan::PaidDate`].
        paid_date: loan::PaidDate,

        /// [`loan::StartDate`] of the [`Loan`].
        start_date: loan::StartDate,
    },
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::{
        domain::loan::{Status, Term},
        query::Query as _,
        spec::service,
    };

    use super::{ExecutionError, SimulateLoan};

    fn brl(amount: i64) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Brl,
        }
    }

    #[tokio::test]
    async fn simulates_late_payment() {
        let svc = service();
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();

        let snapshot = svc
            .execute(SimulateLoan {
                principal: brl(1000),
                start_date: today.coerce(),
                term: Term::default(),
                paid_date: Some(today.plus_days(25).coerce()),
                today,
            })
            .await
            .unwrap();

        assert_eq!(snapshot.status, Status::Paid);
        assert_eq!(snapshot.days_late, 5);
        assert_eq!(snapshot.total, brl(1650));
    }

    #[tokio::test]
    async fn rejects_invalid_principal() {
        let svc = service();
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();
        let query = SimulateLoan {
            principal: brl(0),
            start_date: today.coerce(),
            term: Term::default(),
            paid_date: None,
            today,
        };

        let err = svc.execute(query).await.unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::PrincipalNotPositive(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_payment_before_start() {
        let svc = service();
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();
        let query = SimulateLoan {
            principal: brl(1000),
            start_date: today.coerce(),
            term: Term::default(),
            paid_date: Some(today.minus_days(1).coerce()),
            today,
        };

        let err = svc.execute(query).await.unwrap_err();
        assert!(
            matches!(err.as_ref(), ExecutionError::PaidBeforeStart { .. }),
            "{err}",
        );

        let snapshot = svc
            .execute(SimulateLoan {
                paid_date: Some(today.coerce()),
                ..query
            })
            .await
            .unwrap();
        assert_eq!(snapshot.status, Status::Paid);
        assert_eq!(snapshot.total, brl(1000));
    }
}
