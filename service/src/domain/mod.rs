//! Domain definitions.

pub mod client;
pub mod loan;

pub use self::{client::Client, loan::Loan};
