//! The two-armed result of an invocation.

use serde::{Deserialize, Serialize};

/// Either a success value or an error value, never both.
///
/// Serializes as a single-key map, `{"ok": ..}` or `{"error": ..}`, which is
/// how results are carried inside receipts. Unlike [`Result`] this is plain
/// data: both arms are expected to be inspected, so there are no unwrapping
/// accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome<O, X> {
    /// The success arm
    Ok(O),
    /// The error arm
    Error(X),
}

impl<O, X> Outcome<O, X> {
    /// The success value, if this is one.
    pub fn ok(&self) -> Option<&O> {
        match self {
            Outcome::Ok(ok) => Some(ok),
            Outcome::Error(_) => None,
        }
    }

    /// The error value, if this is one.
    pub fn error(&self) -> Option<&X> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Error(error) => Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Error(_))
    }

    /// Converts into a [`Result`] so `?` can be used on it.
    pub fn into_result(self) -> Result<O, X> {
        match self {
            Outcome::Ok(ok) => Ok(ok),
            Outcome::Error(error) => Err(error),
        }
    }

    /// Borrows both arms.
    pub fn as_ref(&self) -> Outcome<&O, &X> {
        match self {
            Outcome::Ok(ok) => Outcome::Ok(ok),
            Outcome::Error(error) => Outcome::Error(error),
        }
    }

    /// Maps the success arm, leaving an error untouched.
    pub fn map<T, F>(self, f: F) -> Outcome<T, X>
    where
        F: FnOnce(O) -> T,
    {
        match self {
            Outcome::Ok(ok) => Outcome::Ok(f(ok)),
            Outcome::Error(error) => Outcome::Error(error),
        }
    }

    /// Maps the error arm, leaving a success untouched.
    pub fn map_error<T, F>(self, f: F) -> Outcome<O, T>
    where
        F: FnOnce(X) -> T,
    {
        match self {
            Outcome::Ok(ok) => Outcome::Ok(ok),
            Outcome::Error(error) => Outcome::Error(f(error)),
        }
    }
}

impl<O, X> From<Result<O, X>> for Outcome<O, X> {
    fn from(result: Result<O, X>) -> Self {
        match result {
            Ok(ok) => Outcome::Ok(ok),
            Err(error) => Outcome::Error(error),
        }
    }
}

impl<O, X> From<Outcome<O, X>> for Result<O, X> {
    fn from(outcome: Outcome<O, X>) -> Self {
        outcome.into_result()
    }
}
