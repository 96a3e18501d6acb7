// loganyapp - backend/pattern.rs
//
// Message pattern rendering. A pattern is parsed once per appender into
// pieces; each record is rendered by walking them.
//
//   %m  message and structured fields     %n  newline
//   %r  milliseconds since activation     %d  local time, YYYY-MM-DD HH:MM:SS
//   %P  process id                        %p  level name
//   %c  category                          %%  literal percent
//
// Any other escape is copied through unchanged.

use crate::core::model::{normalize_category, Severity};
use crate::util::constants;
use chrono::{DateTime, Local};
use console::Style;
use std::fmt::{self, Write as _};
use std::time::Instant;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Message,
    Newline,
    Elapsed,
    Date,
    Pid,
    Level,
    Category,
}

/// A parsed message pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pieces: Vec<Piece>,
}

/// The values one record contributes to a rendered line.
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    pub message: &'a str,
    pub severity: Severity,
    pub category: &'a str,
    pub elapsed_ms: u128,
    pub time: DateTime<Local>,
    pub pid: u32,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let piece = match chars.next() {
                Some('m') => Piece::Message,
                Some('n') => Piece::Newline,
                Some('r') => Piece::Elapsed,
                Some('d') => Piece::Date,
                Some('P') => Piece::Pid,
                Some('p') => Piece::Level,
                Some('c') => Piece::Category,
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some(other) => {
                    literal.push('%');
                    literal.push(other);
                    continue;
                }
                None => {
                    literal.push('%');
                    continue;
                }
            };
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(piece);
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Self { pieces }
    }

    pub fn render(&self, record: &RecordView<'_>) -> String {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Message => out.push_str(record.message),
                Piece::Newline => out.push('\n'),
                Piece::Elapsed => {
                    let _ = write!(out, "{}", record.elapsed_ms);
                }
                Piece::Date => {
                    let _ = write!(
                        out,
                        "{}",
                        record.time.format(constants::PATTERN_TIMESTAMP_FORMAT)
                    );
                }
                Piece::Pid => {
                    let _ = write!(out, "{}", record.pid);
                }
                Piece::Level => out.push_str(record.severity.label()),
                Piece::Category => out.push_str(record.category),
            }
        }
        out
    }
}

/// Map a tracing level onto the severity scale. Tracing has no FATAL; the
/// router gates ERROR events as FATAL so `fatal` outputs still see them.
pub fn severity_of(level: &tracing::Level) -> Severity {
    match *level {
        tracing::Level::ERROR => Severity::Error,
        tracing::Level::WARN => Severity::Warn,
        tracing::Level::INFO => Severity::Info,
        tracing::Level::DEBUG => Severity::Debug,
        tracing::Level::TRACE => Severity::Trace,
    }
}

fn color_for(severity: Severity) -> Style {
    let style = Style::new().force_styling(true);
    match severity {
        Severity::Off | Severity::Fatal | Severity::Error => style.red().bold(),
        Severity::Warn => style.yellow(),
        Severity::Info => style.green(),
        Severity::Debug => style.cyan(),
        Severity::Trace => style.dim(),
    }
}

/// Event formatter rendering one appender's pattern.
#[derive(Debug, Clone)]
pub struct PatternFormatter {
    pattern: Pattern,
    started: Instant,
    color: bool,
}

impl PatternFormatter {
    pub fn new(pattern: &str, started: Instant, color: bool) -> Self {
        Self {
            pattern: Pattern::parse(pattern),
            started,
            color,
        }
    }
}

impl<S, N> FormatEvent<S, N> for PatternFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        let severity = severity_of(meta.level());
        let category = normalize_category(meta.target());

        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let line = self.pattern.render(&RecordView {
            message: &message,
            severity,
            category: &category,
            elapsed_ms: self.started.elapsed().as_millis(),
            time: Local::now(),
            pid: std::process::id(),
        });

        if !self.color {
            return writer.write_str(&line);
        }
        // Style the text only, so the newline stays outside the escape codes.
        let (body, newline) = match line.strip_suffix('\n') {
            Some(body) => (body, "\n"),
            None => (line.as_str(), ""),
        };
        write!(writer, "{}{newline}", color_for(severity).apply_to(body))
    }
}
