//! [`Handler`] abstractions.

use std::future::Future;

/// Executable handler of `Args`.
///
/// Commands, queries and storage operations are all [`Handler`]s of their
/// own argument types, so a single type may handle many of them.
///
/// # Example
///
/// ```rust
/// # use common::Handler;
/// struct Doubler;
///
/// impl Handler<u32> for Doubler {
///     type Ok = u32;
///     type Err = &'static str;
///
///     async fn execute(&self, n: u32) -> Result<u32, Self::Err> {
///         n.checked_mul(2).ok_or("overflow")
///     }
/// }
/// ```
pub trait Handler<Args = ()> {
    /// Type of a successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
