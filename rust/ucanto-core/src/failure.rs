//! The conventional error arm of an [`Outcome`].

use std::{backtrace::Backtrace, error::Error, fmt};

use serde::{Deserialize, Serialize};
use ucanto_car::CarError;

use crate::Outcome;

/// A serializable description of something that went wrong.
///
/// `name` and `stack` are omitted from the encoded form when absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Failure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl Failure {
    /// A failure carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            name: None,
            message: message.into(),
            stack: None,
        }
    }

    /// Sets the failure name (usually the kind of error).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Records the stack of the caller, regardless of `RUST_BACKTRACE`.
    pub fn with_current_stack(self) -> Self {
        self.with_stack(Backtrace::force_capture().to_string())
    }

    /// A failure with the message of an arbitrary error.
    ///
    /// Use [`AsFailure::to_failure`] for errors that can also name
    /// themselves.
    pub fn from_error(error: &(dyn Error + 'static)) -> Self {
        Failure::new(error.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl Error for Failure {}

/// Errors that know how to describe themselves as a [`Failure`].
///
/// The defaults give a failure with the error's message and nothing else;
/// implementors override [`AsFailure::name`] or [`AsFailure::stack`] to
/// enrich it, or [`AsFailure::to_failure`] to take over entirely.
pub trait AsFailure: Error {
    fn name(&self) -> Option<String> {
        None
    }

    fn stack(&self) -> Option<String> {
        None
    }

    fn to_failure(&self) -> Failure {
        Failure {
            name: self.name(),
            message: self.to_string(),
            stack: self.stack(),
        }
    }
}

impl AsFailure for Failure {
    fn to_failure(&self) -> Failure {
        self.clone()
    }
}

impl AsFailure for std::io::Error {
    fn name(&self) -> Option<String> {
        Some(format!("{:?}", self.kind()))
    }
}

impl AsFailure for CarError {
    fn name(&self) -> Option<String> {
        let name = match self {
            CarError::MalformedVarint(_) => "MalformedVarint",
            CarError::MalformedLink(_) => "MalformedLink",
            CarError::TruncatedLink { .. } => "TruncatedLink",
            CarError::MalformedHeader(_) => "MalformedHeader",
            CarError::TruncatedHeader => "TruncatedHeader",
            CarError::UnsupportedVersion(_) => "UnsupportedVersion",
            CarError::MalformedBlock { .. } => "MalformedBlock",
            CarError::TruncatedBlock { .. } => "TruncatedBlock",
            CarError::SectionTooLarge { .. } => "SectionTooLarge",
            CarError::UnsupportedHashAlgorithm(_) => "UnsupportedHashAlgorithm",
            CarError::Io(_) => "Io",
        };
        Some(name.to_string())
    }
}

/// Wraps an error as the error arm of an [`Outcome`].
pub fn failure<O, E>(error: &E) -> Outcome<O, Failure>
where
    E: AsFailure + ?Sized,
{
    Outcome::Error(error.to_failure())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    #[derive(Debug, thiserror::Error)]
    #[error("quota of {limit} bytes exceeded")]
    struct QuotaExceeded {
        limit: u64,
    }

    impl AsFailure for QuotaExceeded {
        fn name(&self) -> Option<String> {
            Some("QuotaExceeded".into())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("opaque")]
    struct Opaque;

    impl AsFailure for Opaque {
        fn to_failure(&self) -> Failure {
            Failure::new("redacted").named("Opaque")
        }
    }

    #[test]
    fn it_omits_absent_fields() -> TestResult {
        assert_eq!(
            serde_json::to_value(Failure::new("boom"))?,
            json!({ "message": "boom" })
        );
        assert_eq!(
            serde_json::to_value(Failure::new("boom").named("Boom").with_stack("at main"))?,
            json!({ "name": "Boom", "message": "boom", "stack": "at main" })
        );

        let parsed: Failure = serde_json::from_value(json!({ "message": "boom" }))?;
        assert_eq!(parsed, Failure::new("boom"));
        Ok(())
    }

    #[test]
    fn it_captures_the_current_stack() {
        let failure = Failure::new("boom").with_current_stack();
        assert!(failure.stack.is_some_and(|stack| !stack.is_empty()));
    }

    #[test]
    fn it_describes_errors_through_the_trait() {
        let named = QuotaExceeded { limit: 10 }.to_failure();
        assert_eq!(named, Failure::new("quota of 10 bytes exceeded").named("QuotaExceeded"));

        assert_eq!(Opaque.to_failure(), Failure::new("redacted").named("Opaque"));

        let plain = Failure::from_error(&QuotaExceeded { limit: 10 });
        assert_eq!(plain, Failure::new("quota of 10 bytes exceeded"));
    }

    #[test]
    fn it_names_codec_errors_after_their_kind() {
        let outcome: Outcome<(), Failure> = failure(&CarError::UnsupportedVersion(2));
        let described = outcome.error().cloned();

        assert_eq!(
            described.as_ref().and_then(|f| f.name.as_deref()),
            Some("UnsupportedVersion")
        );
        assert_eq!(
            described.map(|f| f.message),
            Some(CarError::UnsupportedVersion(2).to_string())
        );
    }

    #[test]
    fn it_displays_the_name_before_the_message() {
        assert_eq!(Failure::new("boom").named("Boom").to_string(), "Boom: boom");
        assert_eq!(Failure::new("boom").to_string(), "boom");
    }
}
