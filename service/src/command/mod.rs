//! [`Command`] definition.

pub mod create_client;
pub mod create_loan;
pub mod delete_client;
pub mod delete_loan;
pub mod record_loan_payment;
pub mod update_client;
pub mod update_loan_term;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_client::CreateClient, create_loan::CreateLoan,
    delete_client::DeleteClient, delete_loan::DeleteLoan,
    record_loan_payment::RecordLoanPayment, update_client::UpdateClient,
    update_loan_term::UpdateLoanTerm,
};
