//! Read entities definitions.

pub mod client;
pub mod loan;
