//! Swapping the process-wide notifier. Tests here share global state, so
//! each one holds `SERIAL` for its whole body.

use mustbe::{
    Checkable, Kind, MustBeError, Note, Notifier, UsageError, def_notifier, last_debug_note,
    select_notifier, set_notifier, with_notifier,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

static SERIAL: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    SERIAL.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Restores the raise notifier when a test ends, pass or fail.
struct ResetNotifier;

impl Drop for ResetNotifier {
    fn drop(&mut self) {
        set_notifier(Notifier::raise());
    }
}

#[test]
fn raise_is_the_default() {
    let _serial = serial();
    let err = 51_i64.must_be(Kind::Float).expect_err("raised");
    let note = err.into_note().expect("assertion failure");
    assert_eq!(note.render(), "51.must_be(Float), but is Integer");
    assert_eq!(note.receiver(), Some(&mustbe::Value::Int(51)));
}

#[test]
fn custom_notifier_sees_every_note() {
    let _serial = serial();
    let _reset = ResetNotifier;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    set_notifier(Notifier::new(move |note: &Note| {
        sink.lock().unwrap().push(note.render());
        false
    }));

    assert_eq!(51_i64.must_be(Kind::Float).expect("not raised"), 51);
    assert!(Some(3_i64).must_be_nil().is_ok());
    assert_eq!(
        *seen.lock().unwrap(),
        ["51.must_be(Float), but is Integer", "3.must_be_nil"]
    );
}

#[test]
fn with_notifier_is_scoped() {
    let _serial = serial();
    let result = with_notifier(Notifier::log(), || 1_i64.must_be_nil());
    assert!(result.is_ok());
    assert!(1_i64.must_be_nil().is_err());
}

#[test]
fn log_notifier_never_raises() {
    let _serial = serial();
    let _reset = ResetNotifier;
    select_notifier("log").expect("builtin");
    assert!("text".must_be(Kind::Numeric).is_ok());
    assert!(
        vec![1_i64, 2]
            .must_only_contain(Kind::String)
            .is_ok()
    );
}

#[test]
fn debug_notifier_keeps_the_last_note() {
    let _serial = serial();
    let _reset = ResetNotifier;
    select_notifier("debug").expect("builtin");
    assert!(200.0_f64.must_be_close(2.0).is_ok());
    let note = last_debug_note().expect("debug notifier stored the note");
    assert_eq!(
        note.render(),
        "200.0.must_be_close(2.0, 0.1), difference is 198.0"
    );
    assert_eq!(note.record().args, ["2.0", "0.1"]);
}

#[test]
fn named_notifiers_can_be_defined_and_selected() {
    let _serial = serial();
    let _reset = ResetNotifier;
    def_notifier(
        "prefixing",
        Notifier::new(|note: &Note| note.render().starts_with("must_only_contain")),
    );
    select_notifier("prefixing").expect("just defined");

    assert!(5_i64.must_be(Kind::String).is_ok());
    let err = vec![Some(1_i64), None]
        .must_only_contain(())
        .expect_err("container notes are raised");
    assert!(matches!(err, MustBeError::Notified(_)));
}

#[test]
fn unknown_keys_are_rejected() {
    let _serial = serial();
    assert_eq!(
        select_notifier("nonexistent"),
        Err(UsageError::UnknownNotifier("nonexistent".into()))
    );
    assert!(1_i64.must_be_nil().is_err());
}
