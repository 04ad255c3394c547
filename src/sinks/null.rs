//! Sink discarding everything

use crate::core::{FormatFlags, Result, Sink, StreamSink};

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl NullSink {
    pub fn new() -> Self {
        NullSink
    }
}

impl Sink for NullSink {
    fn name(&self) -> &str {
        "null"
    }

    fn format_flags(&self) -> FormatFlags {
        FormatFlags::NONE
    }
}

impl StreamSink for NullSink {
    fn write(&mut self, _formatted: &[u8]) -> Result<()> {
        Ok(())
    }

    fn flush_now(&mut self) -> Result<()> {
        Ok(())
    }
}
