//! Console sink implementation

#[cfg(feature = "console")]
use crate::core::LogLevel;
use crate::core::{FormatFlags, Result, Sink, StreamSink};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stdout,
    Stderr,
}

/// Writes records to standard output or standard error.
///
/// Detaching flushes the stream but never closes it.
pub struct ConsoleSink {
    target: Target,
    flags: FormatFlags,
    #[cfg_attr(not(feature = "console"), allow(dead_code))]
    use_colors: bool,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
            flags: FormatFlags::INCLUDE_NAME,
            use_colors: false,
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: Target::Stderr,
            ..Self::stdout()
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: FormatFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Color the level glyph
    ///
    /// # Example
    ///
    /// ```
    /// use rust_unit_logging::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::stdout().with_colors(true);
    /// ```
    #[cfg(feature = "console")]
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        match self.target {
            Target::Stdout => "console",
            Target::Stderr => "stderr",
        }
    }

    fn format_flags(&self) -> FormatFlags {
        self.flags
    }

    #[cfg(feature = "console")]
    fn decorate(&self, level: LogLevel, line: String) -> String {
        if !self.use_colors {
            return line;
        }
        // Indent and epoch millis never contain a glyph
        let glyph = level.glyph();
        match line.find(glyph) {
            Some(at) => {
                let rest = &line[at + glyph.len_utf8()..];
                let colored = glyph.to_string().color(level.color_code());
                format!("{}{}{}", &line[..at], colored, rest)
            }
            None => line,
        }
    }

    fn on_detach(&mut self) -> Result<()> {
        // Shared stream: flush only
        StreamSink::flush_now(self)
    }
}

impl StreamSink for ConsoleSink {
    fn write(&mut self, formatted: &[u8]) -> Result<()> {
        match self.target {
            Target::Stdout => io::stdout().lock().write_all(formatted)?,
            Target::Stderr => io::stderr().lock().write_all(formatted)?,
        }
        Ok(())
    }

    fn flush_now(&mut self) -> Result<()> {
        match self.target {
            Target::Stdout => io::stdout().flush()?,
            Target::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }
}
