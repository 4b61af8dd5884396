//! [`Command`] for recording a [`Loan`] payment.

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::loan::{PaidDate, StartDate};
use crate::{
    domain::{loan, Loan},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording the payment settling a [`Loan`].
///
/// A [`Loan`] is paid exactly once: recording a payment is never undone or
/// overwritten.
#[derive(Clone, Copy, Debug)]
pub struct RecordLoanPayment {
    /// ID of the paid [`Loan`].
    pub loan_id: loan::Id,

    /// [`PaidDate`] of the [`Loan`].
    pub paid_date: loan::PaidDate,
}

impl<Db> Command<RecordLoanPayment> for Service<Db>
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
        > + Database<Update<Loan>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Loan;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RecordLoanPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RecordLoanPayment { loan_id, paid_date } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize payments of the same `Loan`.
        tx.execute(Lock(By::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut loan = tx
            .execute(Select(By::<Option<Loan>, _>::new(loan_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LoanNotExists(loan_id))
            .map_err(tracerr::wrap!())?;
        if loan.is_paid() {
            return Err(tracerr::new!(E::LoanAlreadyPaid(loan_id)));
        }
        if paid_date.days_until(&loan.start_date) > 0 {
            return Err(tracerr::new!(E::PaidBeforeStart {
                paid_date,
                start_date: loan.start_date,
            }));
        }

        loan.paid_date = Some(paid_date);
        tx.execute(Update(loan.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Loan(id: {loan_id})` paid on {paid_date}");

        Ok(loan)
    }
}

/// Error of [`RecordLoanPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Loan`] doesn't exist.
    #[display("`Loan(id: {_0})` does not exist")]
    #[from(ignore)]
    LoanNotExists(#[error(not(source))] loan::Id),

    /// [`Loan`] is paid already.
    #[display("`Loan(id: {_0})` is paid already")]
    #[from(ignore)]
    LoanAlreadyPaid(#[error(not(source))] loan::Id),

    /// [`PaidDate`] precedes the [`StartDate`] of the [`Loan`].
    #[display("`Loan` cannot be paid on {paid_date} before its start on \
               {start_date}")]
    #[from(ignore)]
    PaidBeforeStart {
        /// Requested [`PaidDate`].
        paid_date: loan::PaidDate,

        /// [`StartDate`] of the [`Loan`].
        start_date: loan::StartDate,
    },
}

#[cfg(test)]
mod spec {
    use common::Date;
    use rust_decimal::Decimal;

    use crate::{
        command::{create_client, create_loan, Command as _, CreateLoan},
        domain::loan::{self, Status},
        spec::service,
    };

    use super::{ExecutionError, RecordLoanPayment};

    fn day(d: u8) -> Date {
        Date::from_calendar_date(2024, 6, d).unwrap()
    }

    async fn lent(svc: &crate::Service<crate::infra::Memory>) -> loan::Id {
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        svc.execute(CreateLoan {
            client_id: client.id,
            ..create_loan::spec::thousand()
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn settles_late_loan() {
        let svc = service();
        let loan_id = lent(&svc).await;

        let loan = svc
            .execute(RecordLoanPayment {
                loan_id,
                paid_date: day(18).coerce(),
            })
            .await
            .unwrap();

        // Paid 3 days after the due date, looked at much later.
        let statement = svc.statement(loan, day(30));
        assert_eq!(statement.snapshot.status, Status::Paid);
        assert_eq!(statement.snapshot.days_late, 3);
        assert_eq!(statement.snapshot.total.amount, Decimal::from(1550));
    }

    #[tokio::test]
    async fn rejects_second_payment() {
        let svc = service();
        let loan_id = lent(&svc).await;
        _ = svc
            .execute(RecordLoanPayment {
                loan_id,
                paid_date: day(10).coerce(),
            })
            .await
            .unwrap();

        let err = svc
            .execute(RecordLoanPayment {
                loan_id,
                paid_date: day(12).coerce(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::LoanAlreadyPaid(_)),
            "{err}",
        );
    }

    #[tokio::test]
    async fn serializes_concurrent_payments() {
        let svc = service();
        let loan_id = lent(&svc).await;

        let (first, second) = tokio::join!(
            svc.execute(RecordLoanPayment {
                loan_id,
                paid_date: day(10).coerce(),
            }),
            svc.execute(RecordLoanPayment {
                loan_id,
                paid_date: day(20).coerce(),
            }),
        );

        assert_eq!(
            [first.is_ok(), second.is_ok()]
                .into_iter()
                .filter(|ok| *ok)
                .count(),
            1,
            "exactly one payment must win",
        );
    }

    #[tokio::test]
    async fn rejects_payment_before_start() {
        let svc = service();
        let loan_id = lent(&svc).await;

        let err = svc
            .execute(RecordLoanPayment {
                loan_id,
                paid_date: Date::from_calendar_date(2024, 5, 25)
                    .unwrap()
                    .coerce(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::PaidBeforeStart { .. }),
            "{err}",
        );
    }

    #[tokio::test]
    async fn accepts_payment_on_start_date() {
        let svc = service();
        let loan_id = lent(&svc).await;

        let loan = svc
            .execute(RecordLoanPayment {
                loan_id,
                paid_date: Date::from_calendar_date(2024, 5, 26)
                    .unwrap()
                    .coerce(),
            })
            .await
            .unwrap();

        assert!(loan.is_paid());
    }

    #[tokio::test]
    async fn fails_on_unknown_loan() {
        let svc = service();

        let err = svc
            .execute(RecordLoanPayment {
                loan_id: loan::Id::new(),
                paid_date: day(1).coerce(),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::LoanNotExists(_)),
            "{err}",
        );
    }
}
