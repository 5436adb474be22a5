//! Captured call stacks attached to notes.
//!
//! Capture goes through [`std::backtrace::Backtrace::capture`], so it honours
//! `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE` and is empty when those are unset.

use regex::Regex;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    frames: Vec<String>,
}

fn frame_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+:\s+(.*)$").expect("frame regex must compile"))
}

/// Frames belonging to this library or to the capture machinery.
fn internal_frame_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|<|\sas\s)mustbe::|^(?:std|core|alloc)::|/mustbe/src/")
            .expect("internal frame regex must compile")
    })
}

impl Trace {
    pub fn capture() -> Self {
        let backtrace = Backtrace::capture();
        if backtrace.status() != BacktraceStatus::Captured {
            return Self::default();
        }
        Self::parse(&backtrace.to_string())
    }

    pub fn from_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse the rendered form of a std backtrace: one `N: symbol` line per
    /// frame, optionally followed by an `at file:line:col` line.
    fn parse(rendered: &str) -> Self {
        let mut frames: Vec<String> = Vec::new();
        for line in rendered.lines() {
            if let Some(caps) = frame_start_re().captures(line) {
                frames.push(caps[1].trim().to_string());
            } else if let Some(location) = line.trim().strip_prefix("at ") {
                if let Some(last) = frames.last_mut() {
                    last.push_str(" at ");
                    last.push_str(location);
                }
            }
        }
        Self { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Every captured frame, innermost first.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Frames with the library's own leading frames removed, so the first
    /// entry is the caller that made the failing assertion.
    pub fn public_frames(&self) -> Vec<String> {
        self.frames
            .iter()
            .skip_while(|frame| internal_frame_re().is_match(frame))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbols_and_locations() {
        let rendered = "   0: mustbe::trace::Trace::capture\n             at ./src/trace.rs:31:25\n   1: app::main\n             at ./src/main.rs:4:5\n   2: core::ops::function::FnOnce::call_once\n";
        let trace = Trace::parse(rendered);
        assert_eq!(
            trace.frames(),
            [
                "mustbe::trace::Trace::capture at ./src/trace.rs:31:25",
                "app::main at ./src/main.rs:4:5",
                "core::ops::function::FnOnce::call_once",
            ]
        );
    }

    #[test]
    fn public_frames_drop_leading_library_frames() {
        let trace = Trace::from_frames([
            "std::backtrace::Backtrace::capture",
            "mustbe::note::Note::new",
            "<i64 as mustbe::assert::Checkable>::must_be",
            "app::handler at ./src/handler.rs:10:3",
            "mustbe::channel::check",
        ]);
        assert_eq!(
            trace.public_frames(),
            [
                "app::handler at ./src/handler.rs:10:3",
                "mustbe::channel::check"
            ]
        );
        assert_eq!(trace.frames().len(), 5);
    }

    #[test]
    fn empty_trace_has_no_frames() {
        assert!(Trace::default().public_frames().is_empty());
    }
}
