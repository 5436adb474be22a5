//! Error types for mustbe operations.
//!
//! Two disjoint classes: API misuse ([`UsageError`]) is reported at the call
//! site and never passes through the notification channel; assertion
//! failures are [`Note`]s that the active notifier chose to raise.

use crate::note::Note;

/// Misuse of the assertion API: wrong argument shape, kind or count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("wrong number of arguments ({given} for {expected})")]
    WrongArgumentCount { given: usize, expected: usize },

    /// A kind was expected in a kind list.
    #[error("class or module required, got {got}")]
    KindRequired { got: String },

    /// A dynamic value cannot act as a case.
    #[error("invalid case kind: {0}")]
    InvalidCaseKind(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("{value} is not numeric")]
    NotNumeric { value: String },

    #[error("{value} is not a container")]
    NotAContainer { value: String },

    /// Member cases were given for a map-like container.
    #[error("pair specs required for container {container}")]
    PairSpecsRequired { container: String },

    /// Pair specs were given for a sequence-like container.
    #[error("member cases required for container {container}")]
    MemberCasesRequired { container: String },

    #[error("handler for {0} previously provided")]
    AlreadyRegistered(String),

    #[error("no continuous validation adapter registered for {0}")]
    Unregistered(String),

    #[error("invalid value for container kind: {0}")]
    NotAContainerKind(String),

    #[error("{kind} does not support {operation}")]
    UnsupportedMutation { kind: String, operation: String },

    #[error("no notifier called {0:?}")]
    UnknownNotifier(String),
}

impl UsageError {
    /// Whether this is a type-class error (wrong kind of value) rather than
    /// an argument-class error (wrong shape or count).
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            UsageError::KindRequired { .. }
                | UsageError::NotNumeric { .. }
                | UsageError::NotAContainer { .. }
                | UsageError::Unregistered(_)
        )
    }
}

/// Errors returned by assertions and by the notification channel.
#[derive(Debug, thiserror::Error)]
pub enum MustBeError {
    /// The active notifier decided to raise this note.
    #[error("{0}")]
    Notified(Box<Note>),

    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl MustBeError {
    /// The raised note, if this error is an assertion failure.
    pub fn note(&self) -> Option<&Note> {
        match self {
            MustBeError::Notified(note) => Some(note),
            MustBeError::Usage(_) => None,
        }
    }

    pub fn into_note(self) -> Option<Note> {
        match self {
            MustBeError::Notified(note) => Some(*note),
            MustBeError::Usage(_) => None,
        }
    }

    pub fn usage(&self) -> Option<&UsageError> {
        match self {
            MustBeError::Usage(err) => Some(err),
            MustBeError::Notified(_) => None,
        }
    }
}

impl From<Note> for MustBeError {
    fn from(note: Note) -> Self {
        MustBeError::Notified(Box::new(note))
    }
}

pub type Result<T, E = MustBeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_messages_name_the_problem() {
        let err = UsageError::WrongArgumentCount {
            given: 0,
            expected: 1,
        };
        assert_eq!(err.to_string(), "wrong number of arguments (0 for 1)");
        assert!(!err.is_type_error());

        let err = UsageError::Unregistered("Shelf".into());
        assert!(err.is_type_error());
        assert_eq!(
            err.to_string(),
            "no continuous validation adapter registered for Shelf"
        );
    }

    #[test]
    fn notified_error_displays_the_note() {
        let err = MustBeError::from(Note::message("boom"));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.note().map(Note::render).as_deref(), Some("boom"));
        assert!(err.usage().is_none());
    }
}
