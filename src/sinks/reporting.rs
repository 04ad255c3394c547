//! Buffer sinks delivering to application callbacks
//!
//! A [`Reporter`] receives new output in batches and may refuse a batch; the
//! refused text is kept and offered again, together with whatever arrives
//! next. A [`Display`] always receives the whole log so far.

use crate::core::{BufferSink, FormatFlags, Result, Sink};

/// Default pause between two batched updates
pub const DEFAULT_UPDATE_CADENCE_MILLIS: i64 = 250;

pub trait Reporter: Send {
    /// Receive a batch of records. Returning `false` keeps the batch for
    /// the next attempt.
    fn report(&mut self, text: &str) -> bool;
}

impl<F> Reporter for F
where
    F: FnMut(&str) -> bool + Send,
{
    fn report(&mut self, text: &str) -> bool {
        self(text)
    }
}

pub trait Display: Send {
    /// Show the complete log so far
    fn output(&mut self, text: &str);
}

/// Incremental batches for a [`Reporter`]
pub struct ReportingSink<R: Reporter> {
    name: String,
    reporter: R,
    unsent: String,
    cadence_millis: i64,
    flags: FormatFlags,
}

impl<R: Reporter> ReportingSink<R> {
    pub fn new(name: impl Into<String>, reporter: R) -> Self {
        Self {
            name: name.into(),
            reporter,
            unsent: String::new(),
            cadence_millis: DEFAULT_UPDATE_CADENCE_MILLIS,
            flags: FormatFlags::INCLUDE_NAME,
        }
    }

    #[must_use]
    pub fn with_cadence(mut self, millis: i64) -> Self {
        self.cadence_millis = millis;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Text refused by the reporter so far
    pub fn unsent(&self) -> &str {
        &self.unsent
    }
}

impl<R: Reporter> Sink for ReportingSink<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_cadence_millis(&self) -> i64 {
        self.cadence_millis
    }

    fn format_flags(&self) -> FormatFlags {
        self.flags
    }

    fn on_detach(&mut self) -> Result<()> {
        if !self.unsent.is_empty() && self.reporter.report(&self.unsent) {
            self.unsent.clear();
        }
        Ok(())
    }
}

impl<R: Reporter> BufferSink for ReportingSink<R> {
    fn update(&mut self, text: &str) -> Result<()> {
        self.unsent.push_str(text);
        if self.reporter.report(&self.unsent) {
            self.unsent.clear();
        }
        Ok(())
    }
}

/// Full-history updates for a [`Display`]
pub struct DisplaySink<D: Display> {
    name: String,
    display: D,
    cadence_millis: i64,
    flags: FormatFlags,
}

impl<D: Display> DisplaySink<D> {
    pub fn new(name: impl Into<String>, display: D) -> Self {
        Self {
            name: name.into(),
            display,
            cadence_millis: DEFAULT_UPDATE_CADENCE_MILLIS,
            flags: FormatFlags::INCLUDE_NAME,
        }
    }

    #[must_use]
    pub fn with_cadence(mut self, millis: i64) -> Self {
        self.cadence_millis = millis;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }
}

impl<D: Display> Sink for DisplaySink<D> {
    fn name(&self) -> &str {
        &self.name
    }

    fn update_cadence_millis(&self) -> i64 {
        self.cadence_millis
    }

    fn format_flags(&self) -> FormatFlags {
        self.flags
    }
}

impl<D: Display> BufferSink for DisplaySink<D> {
    fn update(&mut self, text: &str) -> Result<()> {
        self.display.output(text);
        Ok(())
    }

    fn retain_full_history(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_refused_batch_is_retried() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink_received = Arc::clone(&received);
        let mut accept = false;

        let mut sink = ReportingSink::new("report", move |text: &str| {
            sink_received.lock().push(text.to_string());
            let accepted = accept;
            accept = true;
            accepted
        });

        sink.update("a\n").expect("update");
        assert_eq!(sink.unsent(), "a\n");
        sink.update("b\n").expect("update");
        assert_eq!(sink.unsent(), "");

        assert_eq!(*received.lock(), vec!["a\n", "a\nb\n"]);
    }

    #[test]
    fn test_display_sink_retains_history() {
        struct Screen(Arc<Mutex<String>>);

        impl Display for Screen {
            fn output(&mut self, text: &str) {
                *self.0.lock() = text.to_string();
            }
        }

        let shown = Arc::new(Mutex::new(String::new()));
        let mut sink = DisplaySink::new("screen", Screen(Arc::clone(&shown)));
        assert!(sink.retain_full_history());
        assert_eq!(sink.update_cadence_millis(), DEFAULT_UPDATE_CADENCE_MILLIS);

        sink.update("whole log\n").expect("update");
        assert_eq!(*shown.lock(), "whole log\n");
    }
}
