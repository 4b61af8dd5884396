//! [`Alerts`] definition.

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::loan::{DueDate, Status};
use crate::{
    domain::Loan,
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] of outstanding [`Loan`]s requiring attention: the ones
/// [`Status::NearDue`] or [`Status::Late`] as of `today`.
///
/// [`read::loan::Statement`]s are ordered by their [`DueDate`], the most
/// overdue first.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Alerts {
    /// Reference [`Date`] to compute [`Status`]es as of.
    pub today: Date,
}

impl<Db> Query<Alerts> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Loan>, read::loan::list::Filter>>,
        Ok = Vec<Loan>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<read::loan::Statement>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Alerts { today }: Alerts,
    ) -> Result<Self::Ok, Self::Err> {
        let outstanding = self
            .database()
            .execute(Select(By::<Vec<Loan>, _>::new(
                read::loan::list::Filter {
                    client_id: None,
                    paid: Some(false),
                },
            )))
            .await
            .map_err(tracerr::wrap!())?;

        let mut alerts = outstanding
            .into_iter()
            .map(|loan| self.statement(loan, today))
            .filter(|s| s.snapshot.status.is_alert())
            .collect::<Vec<_>>();
        alerts.sort_by_key(|s| (s.snapshot.due_date, s.loan.id));

        Ok(alerts)
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{
            create_client, create_loan, Command as _, CreateLoan,
            RecordLoanPayment,
        },
        domain::loan::Status,
        query::Query as _,
        spec::service,
    };

    use super::Alerts;

    #[tokio::test]
    async fn lists_near_due_and_late_loans() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        let today = Date::from_calendar_date(2024, 6, 15).unwrap();

        let mut ids = vec![];
        // Ongoing, near due, due, late, late but paid.
        for days_ago in [0, 18, 20, 25, 30] {
            let loan = svc
                .execute(CreateLoan {
                    client_id: client.id,
                    start_date: today.minus_days(days_ago).coerce(),
                    ..create_loan::spec::thousand()
                })
                .await
                .unwrap();
            ids.push(loan.id);
        }
        _ = svc
            .execute(RecordLoanPayment {
                loan_id: ids[4],
                paid_date: today.coerce(),
            })
            .await
            .unwrap();

        let alerts = svc.execute(Alerts { today }).await.unwrap();

        let got = alerts
            .iter()
            .map(|s| (s.loan.id, s.snapshot.status))
            .collect::<Vec<_>>();
        assert_eq!(got, [(ids[3], Status::Late), (ids[1], Status::NearDue)]);
    }

    #[tokio::test]
    async fn follows_reference_date() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        let loan = svc
            .execute(CreateLoan {
                client_id: client.id,
                ..create_loan::spec::thousand()
            })
            .await
            .unwrap();

        let early = Date::from_calendar_date(2024, 5, 27).unwrap();
        assert!(svc.execute(Alerts { today: early }).await.unwrap().is_empty());

        let late = Date::from_calendar_date(2024, 7, 1).unwrap();
        let alerts = svc.execute(Alerts { today: late }).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].loan.id, loan.id);
        assert_eq!(alerts[0].snapshot.days_late, 16);
    }
}
