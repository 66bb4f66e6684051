//! Classification of [`Service`] errors.
//!
//! [`Service`]: crate::Service

use derive_more::Display;

/// Kind of a failure reported by a [`Command`], [`Query`] or [`Task`].
///
/// [`Command`]: crate::Command
/// [`Query`]: crate::Query
/// [`Task`]: crate::Task
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Kind {
    /// Provided input is malformed or incomplete.
    #[display("validation")]
    Validation,

    /// Referenced entity doesn't exist.
    #[display("not found")]
    NotFound,

    /// Requested lifecycle operation is not permitted in the current state.
    #[display("invalid transition")]
    InvalidTransition,

    /// External collaborator failed.
    #[display("external dispatch")]
    ExternalDispatch,

    /// Infrastructure failed.
    #[display("internal")]
    Internal,
}
