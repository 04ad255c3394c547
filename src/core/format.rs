//! Message composition and the default line format
//!
//! A message template carries positional `[]` markers. Arguments replace the
//! markers in order, each wrapped in `[` and `]`; arguments left over after
//! the last marker are appended, decorated the same way. Markers left over
//! after the last argument stay in the text as written.
//!
//! The default line format is assembled from [`FormatFlags`]:
//!
//! ```text
//! [epoch-millis ]<glyph> [[ name ] ][[HH:MM:SS.mmm]]<message><\n | \u{1e}>
//! ```

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::ops::{BitOr, BitOrAssign};

/// Marker replaced by the next argument
pub const ARGUMENT_PLACEHOLDER: &str = "[]";
pub const ARGUMENT_BEGIN: &str = "[";
pub const ARGUMENT_END: &str = "]";

/// Terminates records when line breaks are replaced (ASCII record separator)
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// strftime pattern of the human-readable time
pub const DETAILED_TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// An owned, not-yet-stringified message argument.
///
/// Arguments are only turned into text once the message has passed the level
/// check, possibly on the performance-mode worker thread.
pub type Argument = Box<dyn fmt::Display + Send>;

/// Box a value as an [`Argument`]
#[inline]
pub fn arg<T: fmt::Display + Send + 'static>(value: T) -> Argument {
    Box::new(value)
}

/// Which parts the default formatter puts on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FormatFlags(u8);

impl FormatFlags {
    pub const NONE: FormatFlags = FormatFlags(0);
    /// Bracketed, padded source name
    pub const INCLUDE_NAME: FormatFlags = FormatFlags(1);
    /// Raw epoch timestamp in milliseconds
    pub const INCLUDE_TIMESTAMP: FormatFlags = FormatFlags(1 << 1);
    /// Human-readable time of day
    pub const INCLUDE_DETAILED_TIME: FormatFlags = FormatFlags(1 << 2);
    /// End records with [`RECORD_SEPARATOR`] instead of a newline
    pub const REPLACE_LINE_BREAKS: FormatFlags = FormatFlags(1 << 3);

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        FormatFlags(bits & 0b1111)
    }

    #[inline]
    pub const fn contains(self, other: FormatFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn union(self, other: FormatFlags) -> FormatFlags {
        FormatFlags(self.0 | other.0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FormatFlags {
    type Output = FormatFlags;

    fn bitor(self, rhs: FormatFlags) -> FormatFlags {
        self.union(rhs)
    }
}

impl BitOrAssign for FormatFlags {
    fn bitor_assign(&mut self, rhs: FormatFlags) {
        self.0 |= rhs.0;
    }
}

/// Substitute `args` into the `[]` markers of `template`.
///
/// # Examples
///
/// ```
/// use rust_unit_logging::core::format::compose;
///
/// assert_eq!(compose("i am [] here", &["standing"]), "i am [standing] here");
/// assert_eq!(compose("[]", &["a", "b"]), "[a][b]");
/// assert_eq!(compose("[] and []", &["one"]), "[one] and []");
/// ```
pub fn compose<A: fmt::Display>(template: &str, args: &[A]) -> String {
    if args.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut parts = template.splitn(args.len() + 1, ARGUMENT_PLACEHOLDER);
    if let Some(head) = parts.next() {
        out.push_str(head);
    }

    let mut used = 0;
    for (part, value) in parts.zip(args) {
        push_decorated(&mut out, value);
        out.push_str(part);
        used += 1;
    }

    for value in &args[used..] {
        push_decorated(&mut out, value);
    }

    out
}

fn push_decorated<A: fmt::Display>(out: &mut String, value: &A) {
    out.push_str(ARGUMENT_BEGIN);
    // Writing into a String cannot fail
    let _ = write!(out, "{}", value);
    out.push_str(ARGUMENT_END);
}

/// Everything the default formatter needs besides the flags
#[derive(Debug, Clone)]
pub struct LineContext<'a> {
    pub level: LogLevel,
    pub source: &'a str,
    /// Width the source name is padded to
    pub name_width: usize,
    /// Indentation put in front of the line, empty when none
    pub indent: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Render one record with the default line format
pub fn format_line(flags: FormatFlags, ctx: &LineContext<'_>, message: &str) -> String {
    let mut line = String::with_capacity(message.len() + ctx.name_width + 32);
    line.push_str(ctx.indent);

    if flags.contains(FormatFlags::INCLUDE_TIMESTAMP) {
        let _ = write!(line, "{} ", ctx.timestamp.timestamp_millis());
    }

    line.push(ctx.level.glyph());
    line.push(' ');

    if flags.contains(FormatFlags::INCLUDE_NAME) {
        let _ = write!(line, "[ {:<width$} ] ", ctx.source, width = ctx.name_width);
    }

    if flags.contains(FormatFlags::INCLUDE_DETAILED_TIME) {
        let _ = write!(line, "[{}]", ctx.timestamp.format(DETAILED_TIME_FORMAT));
    }

    line.push_str(message);

    if flags.contains(FormatFlags::REPLACE_LINE_BREAKS) {
        line.push(RECORD_SEPARATOR);
    } else {
        line.push('\n');
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_datetime() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123)
    }

    fn ctx<'a>(source: &'a str, width: usize, indent: &'a str) -> LineContext<'a> {
        LineContext {
            level: LogLevel::Info,
            source,
            name_width: width,
            indent,
            timestamp: fixed_datetime(),
        }
    }

    #[test]
    fn test_compose_placeholder() {
        assert_eq!(compose("i am [] here", &["standing"]), "i am [standing] here");
    }

    #[test]
    fn test_compose_extra_arguments_appended() {
        assert_eq!(compose("[]", &["a", "b"]), "[a][b]");
        assert_eq!(compose("no markers", &[1, 2]), "no markers[1][2]");
    }

    #[test]
    fn test_compose_missing_arguments_leave_markers() {
        assert_eq!(compose("[] then [] then []", &["x"]), "[x] then [] then []");
    }

    #[test]
    fn test_compose_without_arguments_is_verbatim() {
        let none: [&str; 0] = [];
        assert_eq!(compose("keep [] as is", &none), "keep [] as is");
    }

    #[test]
    fn test_compose_boxed_arguments() {
        let args: Vec<Argument> = vec![arg(42), arg("x".to_string())];
        assert_eq!(compose("n=[] s=[]", &args), "n=[42] s=[x]");
    }

    #[test]
    fn test_flags() {
        let flags = FormatFlags::INCLUDE_NAME | FormatFlags::REPLACE_LINE_BREAKS;
        assert!(flags.contains(FormatFlags::INCLUDE_NAME));
        assert!(!flags.contains(FormatFlags::INCLUDE_TIMESTAMP));
        assert_eq!(FormatFlags::from_bits(flags.bits()), flags);
        assert!(FormatFlags::NONE.is_empty());
    }

    #[test]
    fn test_format_line_message_only() {
        let line = format_line(FormatFlags::NONE, &ctx("net", 3, ""), "hello");
        assert_eq!(line, "> hello\n");
    }

    #[test]
    fn test_format_line_padded_name() {
        let line = format_line(FormatFlags::INCLUDE_NAME, &ctx("net", 6, ""), "hello");
        assert_eq!(line, "> [ net    ] hello\n");
    }

    #[test]
    fn test_format_line_all_flags() {
        let flags = FormatFlags::INCLUDE_TIMESTAMP
            | FormatFlags::INCLUDE_NAME
            | FormatFlags::INCLUDE_DETAILED_TIME
            | FormatFlags::REPLACE_LINE_BREAKS;
        let line = format_line(flags, &ctx("db", 2, ""), "up");
        let millis = fixed_datetime().timestamp_millis();
        assert_eq!(line, format!("{} > [ db ] [10:30:45.123]up\u{1e}", millis));
    }

    #[test]
    fn test_format_line_indent() {
        let line = format_line(FormatFlags::NONE, &ctx("db", 2, "    "), "x");
        assert_eq!(line, "    > x\n");
    }
}
