//! Reports over the whole portfolio.

pub mod dashboard;

pub use self::dashboard::Dashboard;
