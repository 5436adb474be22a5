//! Notifiers decide what happens to a note that reaches the channel.
//!
//! A notifier returns `true` to have the note raised (returned as
//! [`MustBeError::Notified`](crate::error::MustBeError::Notified)) and
//! `false` to let the assertion return normally. Named notifiers live in a
//! process-wide registry so bootstrap code can pick one by key, usually from
//! the `MUST_BE__NOTIFIER` environment variable.

use crate::channel::AssertionContext;
use crate::error::UsageError;
use crate::note::Note;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use tracing::{debug, error, warn};

pub const NOTIFIER_ENV_VAR: &str = "MUST_BE__NOTIFIER";

/// Reserved key that disables assertions instead of selecting a notifier.
pub const DISABLE_KEY: &str = "disable";

pub const DEFAULT_NOTIFIER_KEY: &str = "raise";

type Callback = Arc<dyn Fn(&Note) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct Notifier {
    name: Option<String>,
    callback: Callback,
}

impl Notifier {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Note) -> bool + Send + Sync + 'static,
    {
        Self {
            name: None,
            callback: Arc::new(callback),
        }
    }

    pub fn named<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&Note) -> bool + Send + Sync + 'static,
    {
        Self {
            name: Some(name.into()),
            callback: Arc::new(callback),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether `note` should be raised.
    pub fn notify(&self, note: &Note) -> bool {
        (self.callback)(note)
    }

    /// Raise every note.
    pub fn raise() -> Self {
        Self::named("raise", |_| true)
    }

    /// Log the message and public backtrace as a warning; never raise.
    pub fn log() -> Self {
        Self::named("log", |note| {
            let mut lines = vec![note.render()];
            lines.extend(note.backtrace());
            warn!(target: "mustbe", "{}", lines.join("\n\t"));
            false
        })
    }

    /// Log the full note record as an error and keep the note for
    /// inspection through [`last_debug_note`]; never raise.
    pub fn debug() -> Self {
        Self::named("debug", |note| {
            let record = serde_json::to_string(&note.record())
                .unwrap_or_else(|err| format!("{{\"error\":{:?}}}", err.to_string()));
            error!(target: "mustbe", record = %record, "{}", note.render());
            *LAST_DEBUG_NOTE
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(note.clone());
            false
        })
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

static LAST_DEBUG_NOTE: Mutex<Option<Note>> = Mutex::new(None);

/// The note most recently handled by the `debug` notifier.
pub fn last_debug_note() -> Option<Note> {
    LAST_DEBUG_NOTE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

fn registry() -> &'static RwLock<HashMap<String, Notifier>> {
    static REGISTRY: OnceLock<RwLock<HashMap<String, Notifier>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let builtins = [Notifier::raise(), Notifier::log(), Notifier::debug()];
        RwLock::new(
            builtins
                .into_iter()
                .filter_map(|n| n.name().map(str::to_string).map(|key| (key, n)))
                .collect(),
        )
    })
}

/// Add or replace the named notifier `key`.
pub fn def_notifier(key: impl Into<String>, notifier: Notifier) {
    let key = key.into();
    debug!(target: "mustbe", key = %key, "defining notifier");
    registry()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(key, notifier);
}

pub fn lookup(key: &str) -> Option<Notifier> {
    registry()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(key)
        .cloned()
}

/// Install the named notifier `key` on the global context, or disable
/// assertions when `key` is `"disable"`.
pub fn select_notifier(key: &str) -> Result<(), UsageError> {
    select_notifier_for(AssertionContext::global(), key)
}

pub fn select_notifier_for(context: &AssertionContext, key: &str) -> Result<(), UsageError> {
    if key == DISABLE_KEY {
        context.disable();
        return Ok(());
    }
    let notifier = lookup(key).ok_or_else(|| UsageError::UnknownNotifier(key.to_string()))?;
    debug!(target: "mustbe", key, "selecting notifier");
    context.set_notifier(notifier);
    Ok(())
}

/// Select the notifier named by `MUST_BE__NOTIFIER`, defaulting to `raise`.
pub fn configure_from_env() -> Result<(), UsageError> {
    let key = notifier_key(std::env::var(NOTIFIER_ENV_VAR).ok());
    select_notifier(&key)
}

fn notifier_key(raw: Option<String>) -> String {
    raw.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_NOTIFIER_KEY.to_string())
}
