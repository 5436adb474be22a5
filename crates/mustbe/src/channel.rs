//! The notification channel.
//!
//! Every violated assertion ends up in [`AssertionContext::notify`]. The
//! context holds the enabled switch and the current [`Notifier`]; dry-run
//! scopes opened by [`check`] capture notes instead of handing them to the
//! notifier, which is how higher-level assertions are composed from lower
//! ones.
//!
//! Scopes are tracked per thread, with a tokio task-local layer for scopes
//! that span `.await` points. A synchronous scope cannot outlive a
//! suspension point, so when both are present the synchronous one is the
//! innermost and wins.
//!
//! Scopes belong to the thread or task, not to a context: a scope opened
//! through one [`AssertionContext`] also captures notes notified through
//! any other. The `Checkable` methods always notify through
//! [`AssertionContext::global`]; separate contexts serve code that calls
//! [`AssertionContext::notify`] itself.

use crate::error::{MustBeError, Result};
use crate::note::Note;
use crate::notifier::Notifier;
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};
use tracing::{debug, trace};

type ToggleHandler = Arc<dyn Fn(bool) + Send + Sync>;
type TaskSlot = Arc<Mutex<Option<Note>>>;

#[derive(Default)]
struct Scope {
    checking: bool,
    found: Option<Note>,
}

thread_local! {
    static SCOPE: RefCell<Scope> = RefCell::new(Scope::default());
}

tokio::task_local! {
    static TASK_SCOPE: TaskSlot;
}

/// Open dry-run scope on the current thread. Restores the enclosing scope
/// on drop, including when the guarded code errors or panics.
struct ScopeGuard {
    previous: Option<Scope>,
}

impl ScopeGuard {
    fn enter() -> Self {
        let opened = Scope {
            checking: true,
            found: None,
        };
        let previous = SCOPE.with(|scope| std::mem::replace(&mut *scope.borrow_mut(), opened));
        Self {
            previous: Some(previous),
        }
    }

    /// Close the scope, returning the last note captured in it.
    fn finish(self) -> Option<Note> {
        SCOPE.with(|scope| scope.borrow_mut().found.take())
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            SCOPE.with(|scope| *scope.borrow_mut() = previous);
        }
    }
}

/// Store `note` in the innermost open scope, if any.
fn capture(note: &Note) -> bool {
    let captured = SCOPE.with(|scope| {
        let mut scope = scope.borrow_mut();
        if scope.checking {
            scope.found = Some(note.clone());
        }
        scope.checking
    });
    if captured {
        return true;
    }
    TASK_SCOPE
        .try_with(|slot| {
            *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(note.clone());
        })
        .is_ok()
}

/// Whether a dry-run scope is open for the current thread or task.
pub fn is_checking() -> bool {
    SCOPE.with(|scope| scope.borrow().checking) || TASK_SCOPE.try_with(|_| ()).is_ok()
}

/// Enabled switch, current notifier and toggle handlers.
///
/// Dry-run scopes are not part of the context, see the module docs.
pub struct AssertionContext {
    enabled: AtomicBool,
    notifier: RwLock<Notifier>,
    handlers: Mutex<Vec<ToggleHandler>>,
}

impl Default for AssertionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AssertionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssertionContext")
            .field("enabled", &self.is_enabled())
            .field("notifier", &self.notifier())
            .finish_non_exhaustive()
    }
}

impl AssertionContext {
    /// An enabled context that raises every note.
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            notifier: RwLock::new(Notifier::raise()),
            handlers: Mutex::new(Vec::new()),
        }
    }

    /// The process-wide context used by the assertion methods.
    pub fn global() -> &'static AssertionContext {
        static GLOBAL: OnceLock<AssertionContext> = OnceLock::new();
        GLOBAL.get_or_init(AssertionContext::new)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            debug!(target: "mustbe", "assertions enabled");
            self.run_toggle_handlers(true);
        }
    }

    pub fn disable(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            debug!(target: "mustbe", "assertions disabled");
            self.run_toggle_handlers(false);
        }
    }

    /// Call `handler` on every enable/disable transition. A handler
    /// registered while disabled is called once right away with `false`.
    pub fn on_toggle<F>(&self, handler: F)
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let handler: ToggleHandler = Arc::new(handler);
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::clone(&handler));
        if !self.is_enabled() {
            handler(false);
        }
    }

    fn run_toggle_handlers(&self, enabled: bool) {
        let handlers = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in handlers {
            handler(enabled);
        }
    }

    pub fn notifier(&self) -> Notifier {
        self.notifier
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Install `notifier`, returning the one it replaces.
    pub fn set_notifier(&self, notifier: Notifier) -> Notifier {
        let mut current = self.notifier.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *current, notifier)
    }

    /// Run `f` with `notifier` installed, restoring the previous notifier
    /// afterwards.
    pub fn with_notifier<R>(&self, notifier: Notifier, f: impl FnOnce() -> R) -> R {
        let _guard = NotifierGuard {
            context: self,
            previous: Some(self.set_notifier(notifier)),
        };
        f()
    }

    /// Route `note` through the channel.
    ///
    /// Returns the note unless the notifier chose to raise it. Inside a
    /// dry-run scope the note is captured and the notifier is not called.
    pub fn notify(&self, note: Note) -> Result<Note> {
        if !self.is_enabled() {
            return Ok(note);
        }
        if capture(&note) {
            trace!(target: "mustbe", note = %note, "captured note in dry-run scope");
            return Ok(note);
        }
        let notifier = self.notifier();
        if notifier.notify(&note) {
            Err(MustBeError::from(note))
        } else {
            Ok(note)
        }
    }

    /// Run `thunk` in a dry-run scope and return the last note it produced.
    ///
    /// While disabled the thunk is not run and `Ok(None)` is returned.
    /// Errors from the thunk propagate after the scope is closed.
    pub fn check<T, E, F>(&self, thunk: F) -> std::result::Result<Option<Note>, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
    {
        if !self.is_enabled() {
            return Ok(None);
        }
        let guard = ScopeGuard::enter();
        thunk()?;
        Ok(guard.finish())
    }

    /// Run `probe` in a dry-run scope; if it produced a note, notify
    /// `rewrite(note)` outside the scope. Returns the probe's value.
    ///
    /// While disabled the probe still runs, unscoped.
    pub fn check_with<T, P, R>(&self, probe: P, rewrite: R) -> Result<T>
    where
        P: FnOnce() -> Result<T>,
        R: FnOnce(Note) -> Note,
    {
        if !self.is_enabled() {
            return probe();
        }
        let guard = ScopeGuard::enter();
        let value = probe()?;
        if let Some(note) = guard.finish() {
            self.notify(rewrite(note))?;
        }
        Ok(value)
    }

    /// Task-local form of [`check`](Self::check) for code that awaits
    /// inside the scope.
    pub async fn check_async<T, E, F>(&self, future: F) -> std::result::Result<Option<Note>, E>
    where
        F: Future<Output = std::result::Result<T, E>>,
    {
        if !self.is_enabled() {
            return Ok(None);
        }
        let slot: TaskSlot = Arc::new(Mutex::new(None));
        TASK_SCOPE.scope(Arc::clone(&slot), future).await?;
        let found = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(found)
    }
}

struct NotifierGuard<'a> {
    context: &'a AssertionContext,
    previous: Option<Notifier>,
}

impl Drop for NotifierGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.context.set_notifier(previous);
        }
    }
}

pub fn notify(note: Note) -> Result<Note> {
    AssertionContext::global().notify(note)
}

pub fn check<T, E, F>(thunk: F) -> std::result::Result<Option<Note>, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
{
    AssertionContext::global().check(thunk)
}

pub fn check_with<T, P, R>(probe: P, rewrite: R) -> Result<T>
where
    P: FnOnce() -> Result<T>,
    R: FnOnce(Note) -> Note,
{
    AssertionContext::global().check_with(probe, rewrite)
}

pub async fn check_async<T, E, F>(future: F) -> std::result::Result<Option<Note>, E>
where
    F: Future<Output = std::result::Result<T, E>>,
{
    AssertionContext::global().check_async(future).await
}

pub fn is_enabled() -> bool {
    AssertionContext::global().is_enabled()
}

pub fn enable() {
    AssertionContext::global().enable();
}

pub fn disable() {
    AssertionContext::global().disable();
}

pub fn on_toggle<F>(handler: F)
where
    F: Fn(bool) + Send + Sync + 'static,
{
    AssertionContext::global().on_toggle(handler);
}

pub fn notifier() -> Notifier {
    AssertionContext::global().notifier()
}

pub fn set_notifier(notifier: Notifier) -> Notifier {
    AssertionContext::global().set_notifier(notifier)
}

pub fn with_notifier<R>(notifier: Notifier, f: impl FnOnce() -> R) -> R {
    AssertionContext::global().with_notifier(notifier, f)
}
