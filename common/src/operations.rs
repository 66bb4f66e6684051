//! Abstract operations.
//!
//! Each operation is a marker wrapping its arguments, so a single
//! [`Handler`] may implement many of them, one per argument type.

use std::marker::PhantomData;

use crate::Handler;

/// Operation to store a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation to overwrite a stored value with the wrapped one.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation to read stored values, usually [`By`] some criteria.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation to acquire an exclusive lock on a stored value [`By`] its key.
///
/// Inside a [`Transact`]ed scope the lock is held until the [`Commit`].
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Operation to start a long-living process, like a periodic task.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation to perform a single run of a process.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Operation to dispatch a value to an external recipient.
#[derive(Clone, Copy, Debug)]
pub struct Dispatch<T>(pub T);

/// Operation to open a transaction scope.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Handler`] operating within a [`Transact`]ed scope.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation to apply everything done within a [`Transact`]ed scope.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
///
/// `W` is never stored, it only distinguishes operations with the same
/// criteria, like `By<Option<Order>, Id>` and `By<Order, Id>`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value to select.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector of the provided criteria.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Consumes this [`By`] and returns its criteria.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
