//! [`Dashboard`] definition.

use common::{
    money::Currency,
    operations::{By, Select},
    Date, Money,
};
use tracerr::Traced;

use crate::{
    domain::{
        loan::{Snapshot, Status},
        Loan,
    },
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] summarizing the whole portfolio of [`Loan`]s as of `today`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Dashboard {
    /// Reference [`Date`] to compute [`Snapshot`]s as of.
    pub today: Date,

    /// Number of the most recent [`Loan`]s to include.
    pub recent: read::loan::Recent,
}

/// Output of the [`Dashboard`] [`Query`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Output {
    /// Portfolio [`Totals`].
    pub totals: Totals,

    /// Number of [`Loan`]s in each [`Status`], in [`Status::ALL`] order.
    pub counts: Vec<(Status, usize)>,

    /// Most recently created [`Loan`]s, newest first.
    pub recent: Vec<read::loan::Statement>,
}

/// Sums over [`Snapshot`]s of a portfolio.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Totals {
    /// Principal lent by all the [`Loan`]s.
    pub lent: Money,

    /// Total amount of [`Status::Paid`] [`Loan`]s.
    pub received: Money,

    /// Total amount of not yet paid [`Loan`]s.
    pub open: Money,

    /// Total amount of [`Status::Late`] [`Loan`]s.
    pub late: Money,

    /// Interest accrued by all the [`Loan`]s.
    pub interest: Money,

    /// Fines accrued by all the [`Loan`]s.
    pub fines: Money,
}

impl Totals {
    /// Creates new zero [`Totals`] in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            lent: Money::zero(currency),
            received: Money::zero(currency),
            open: Money::zero(currency),
            late: Money::zero(currency),
            interest: Money::zero(currency),
            fines: Money::zero(currency),
        }
    }

    /// Accounts the provided [`Snapshot`] in these [`Totals`].
    pub fn add(&mut self, snapshot: &Snapshot) {
        self.lent.amount += snapshot.principal.amount;
        self.interest.amount += snapshot.interest.amount;
        self.fines.amount += snapshot.fine.amount;
        if snapshot.status == Status::Paid {
            self.received.amount += snapshot.total.amount;
        } else {
            self.open.amount += snapshot.total.amount;
        }
        if snapshot.status == Status::Late {
            self.late.amount += snapshot.total.amount;
        }
    }

    /// Folds the provided [`Snapshot`]s into [`Totals`].
    #[must_use]
    pub fn fold<'s>(
        currency: Currency,
        snapshots: impl IntoIterator<Item = &'s Snapshot>,
    ) -> Self {
        snapshots
            .into_iter()
            .fold(Self::zero(currency), |mut totals, s| {
                totals.add(s);
                totals
            })
    }
}

impl<Db> Query<Dashboard> for Service<Db>
where
    Db: Database<
            Select<By<Vec<Loan>, read::loan::list::Filter>>,
            Ok = Vec<Loan>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Dashboard { today, recent }: Dashboard,
    ) -> Result<Self::Ok, Self::Err> {
        let rates = &self.config().rates;

        // Newest first.
        let mut loans = self
            .database()
            .execute(Select(By::<Vec<Loan>, _>::new(
                read::loan::list::Filter::default(),
            )))
            .await
            .map_err(tracerr::wrap!())?;
        loans.sort_unstable_by(|a, b| b.id.cmp(&a.id));

        let snapshots = loans
            .iter()
            .map(|loan| loan.snapshot(rates, today))
            .collect::<Vec<_>>();

        let recent = loans
            .into_iter()
            .zip(&snapshots)
            .take(recent.0)
            .map(|(loan, snapshot)| read::loan::Statement {
                loan,
                snapshot: *snapshot,
            })
            .collect();

        Ok(Output {
            totals: Totals::fold(self.config().currency, &snapshots),
            counts: Status::ALL
                .iter()
                .map(|status| {
                    let n = snapshots
                        .iter()
                        .filter(|s| s.status == *status)
                        .count();
                    (*status, n)
                })
                .collect(),
            recent,
        })
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Money};
    use rust_decimal::Decimal;

    use crate::{
        command::{
            create_client, create_loan, Command as _, CreateLoan,
            RecordLoanPayment,
        },
        domain::loan::{Rates, Snapshot, Status, Term},
        query::Query as _,
        read,
        spec::service,
    };

    use super::{Dashboard, Totals};

    fn brl(amount: i64) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Brl,
        }
    }

    fn today() -> Date {
        Date::from_calendar_date(2024, 6, 15).unwrap()
    }

    #[test]
    fn folds_nothing_into_zero() {
        let totals = Totals::fold(Currency::Brl, []);

        assert_eq!(totals, Totals::zero(Currency::Brl));
    }

    #[test]
    fn splits_received_and_open() {
        let rates = Rates::default();
        let snapshot = |days_ago, paid_days_ago: Option<u16>| {
            Snapshot::compute(
                &rates,
                brl(1000),
                today().minus_days(days_ago).coerce(),
                paid_days_ago.map(|d| today().minus_days(d).coerce()),
                Term::default(),
                today(),
            )
        };
        let snapshots = [
            // Ongoing: 1000.
            snapshot(0, None),
            // Late by 5 days: 1650.
            snapshot(25, None),
            // Paid 3 days late: 1550.
            snapshot(25, Some(2)),
        ];

        let totals = Totals::fold(Currency::Brl, &snapshots);

        assert_eq!(totals.lent, brl(3000));
        assert_eq!(totals.received, brl(1550));
        assert_eq!(totals.open, brl(2650));
        assert_eq!(totals.late, brl(1650));
        assert_eq!(totals.interest, brl(800));
        assert_eq!(totals.fines, brl(400));
    }

    #[tokio::test]
    async fn summarizes_portfolio() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();

        let mut ids = vec![];
        for days_ago in [0, 18, 20, 25, 25, 30] {
            let loan = svc
                .execute(CreateLoan {
                    client_id: client.id,
                    start_date: today().minus_days(days_ago).coerce(),
                    ..create_loan::spec::thousand()
                })
                .await
                .unwrap();
            ids.push(loan.id);
        }
        _ = svc
            .execute(RecordLoanPayment {
                loan_id: ids[4],
                paid_date: today().minus_days(2).coerce(),
            })
            .await
            .unwrap();

        let output = svc
            .execute(Dashboard {
                today: today(),
                recent: read::loan::Recent::default(),
            })
            .await
            .unwrap();

        assert_eq!(
            output.counts,
            [
                (Status::Ongoing, 1),
                (Status::NearDue, 1),
                (Status::Due, 1),
                (Status::Late, 2),
                (Status::Paid, 1),
            ],
        );
        assert_eq!(output.totals.lent, brl(6000));
        assert_eq!(output.totals.received, brl(1550));
        // 1000 + 1000 + 1000 + 1650 + 1900.
        assert_eq!(output.totals.open, brl(6550));
        assert_eq!(output.totals.late, brl(3550));

        let recent = output.recent.iter().map(|s| s.loan.id).collect::<Vec<_>>();
        assert_eq!(recent, [ids[5], ids[4], ids[3], ids[2], ids[1]]);
        assert_eq!(output.recent[1].snapshot.status, Status::Paid);
    }

    #[tokio::test]
    async fn takes_recent_from_same_read() {
        let svc = service();
        let client = svc.execute(create_client::spec::maria()).await.unwrap();
        for days_ago in [3, 40] {
            _ = svc
                .execute(CreateLoan {
                    client_id: client.id,
                    start_date: today().minus_days(days_ago).coerce(),
                    ..create_loan::spec::thousand()
                })
                .await
                .unwrap();
        }

        let output = svc
            .execute(Dashboard {
                today: today(),
                recent: read::loan::Recent(10),
            })
            .await
            .unwrap();

        assert_eq!(output.recent.len(), 2);
        let open = output
            .recent
            .iter()
            .map(|s| s.snapshot.total.amount)
            .sum::<Decimal>();
        assert_eq!(output.totals.open.amount, open);
        assert_eq!(output.recent[1].snapshot.status, Status::Late);
    }
}
