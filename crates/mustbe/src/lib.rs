//! # mustbe
//!
//! Runtime assertions for dynamic values. A receiver "must be" one of a set
//! of cases (kinds, predicates, ranges, literals, literal collections,
//! patterns); a violated assertion produces a [`Note`] that is routed
//! through a pluggable notification channel instead of panicking.
//!
//! The channel can raise the note (the assertion returns
//! [`MustBeError::Notified`]), log it, hand it to a custom [`Notifier`], or
//! capture it silently inside a dry-run [`check`] scope so that
//! higher-level assertions can be composed from lower-level ones.
//!
//! ## Architecture
//!
//! ```text
//! Checkable / Proxy      ← Assertion surface (must_be, must_that, ...)
//!     │
//! Case / Cases           ← Matching: kind, predicate, literal, range, pattern
//!     │
//! Note                   ← Structured diagnostic, rendered lazily
//!     │
//! AssertionContext       ← Enabled switch, notifier, dry-run scopes
//!     │
//! Notifier               ← raise | log | debug | custom
//! ```
//!
//! Containers add a layer on top: `must_only_contain` checks contents once,
//! `must_only_ever_contain` returns a [`Watched`] container that re-checks
//! after every mutation through the adapter registered for its kind.

pub mod assert;
pub mod case;
pub mod channel;
pub mod containers;
pub mod error;
pub mod inspect;
pub mod note;
pub mod notifier;
pub mod proxy;
pub mod trace;
pub mod value;

pub use assert::{Checkable, DEFAULT_CLOSE_DELTA, Membership};
pub use case::{Case, Cases, PairSpec, matches, matches_none, pair_acceptable};
pub use channel::{
    AssertionContext, check, check_async, check_with, disable, enable, is_enabled, notify,
    on_toggle, set_notifier, with_notifier,
};
pub use containers::{
    ContainerAdapter, ContentCases, ContentCheck, Introduced, Mutation, Watched, register,
    unregister, validate_container,
};
pub use error::{MustBeError, Result, UsageError};
pub use inspect::{Inspect, short_inspect};
pub use note::{Arg, Note, NoteRecord};
pub use notifier::{
    NOTIFIER_ENV_VAR, Notifier, configure_from_env, def_notifier, last_debug_note, select_notifier,
};
pub use proxy::{Polarity, Proxy, Truthy};
pub use trace::Trace;
pub use value::{Kind, Value};

/// Build [`Cases`] from heterogeneous case expressions.
///
/// ```
/// use mustbe::{Checkable, Kind, cases};
///
/// let value = 3_i64.must_be(cases![Kind::String, 1_i64..=5]).unwrap();
/// assert_eq!(value, 3);
/// ```
#[macro_export]
macro_rules! cases {
    ($($case:expr),* $(,)?) => {
        $crate::Cases(vec![$($crate::Case::from($case)),*])
    };
}
