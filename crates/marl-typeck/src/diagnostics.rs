//! Ariadne-based diagnostic rendering.
//!
//! Renders [`TypeError`]s (and parse errors, which carry the same span
//! shape) into formatted, labeled reports against the original source.
//! Output is plain text (colors disabled) so it is stable under test.

use std::ops::Range;

use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use marl_common::span::Span;
use marl_parser::ParseError;

use crate::error::TypeError;

// ── Error codes ────────────────────────────────────────────────────────

/// Assign a stable error code to each TypeError variant.
fn error_code(err: &TypeError) -> &'static str {
    match err {
        TypeError::UndefinedVariable { .. } => "E0001",
        TypeError::Mismatch { .. } => "E0002",
        TypeError::InfiniteType { .. } => "E0003",
        TypeError::ArityMismatch { .. } => "E0004",
        TypeError::MissingFields { .. } => "E0005",
        TypeError::NoSuchField { .. } => "E0006",
        TypeError::UnknownTypeExpr { .. } => "E0007",
    }
}

// ── Span helpers ───────────────────────────────────────────────────────

/// Convert a byte span to a Range clamped to the source length, so a
/// stale or synthetic span can never push ariadne out of bounds.
fn clamped_range(span: Span, source: &str) -> Range<usize> {
    let len = source.len();
    let start = (span.start as usize).min(len);
    let end = (span.end as usize).clamp(start, len);
    start..end
}

// ── Rendering ──────────────────────────────────────────────────────────

/// Render a type error into a human-readable report string.
pub fn render(error: &TypeError, source: &str) -> String {
    let range = clamped_range(error.span(), source);
    let config = Config::default().with_color(false);

    let report = Report::build(ReportKind::Error, range.clone())
        .with_code(error_code(error))
        .with_message(error.to_string())
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(label_message(error))
                .with_color(Color::Red),
        )
        .finish();

    write_report(report, source)
}

/// Render a parse error into a human-readable report string.
pub fn render_parse_error(error: &ParseError, source: &str) -> String {
    let range = clamped_range(error.span, source);
    let config = Config::default().with_color(false);

    let mut builder = Report::build(ReportKind::Error, range.clone())
        .with_code("E0000")
        .with_message(&error.message)
        .with_config(config)
        .with_label(
            Label::new(range)
                .with_message(&error.message)
                .with_color(Color::Red),
        );
    for (note_message, note_span) in &error.notes {
        builder = builder.with_label(
            Label::new(clamped_range(*note_span, source))
                .with_message(note_message)
                .with_color(Color::Yellow),
        );
    }

    write_report(builder.finish(), source)
}

/// The secondary label text placed at the error's span.
fn label_message(error: &TypeError) -> String {
    match error {
        TypeError::UndefinedVariable { name, .. } => {
            format!("`{name}` is not defined in this scope")
        }
        TypeError::Mismatch { left, right, .. } => {
            format!("this requires `{left}` and `{right}` to be the same type")
        }
        TypeError::InfiniteType { .. } => "this would require an infinite type".to_string(),
        TypeError::ArityMismatch {
            expected, found, ..
        } => format!("expected {expected} arguments, found {found}"),
        TypeError::MissingFields { ty, .. } => format!("this value has type `{ty}`"),
        TypeError::NoSuchField { ty, field, .. } => {
            format!("`{ty}` does not carry a field `{field}`")
        }
        TypeError::UnknownTypeExpr { name, .. } => {
            format!("`{name}` needs type arguments to name a type")
        }
    }
}

fn write_report(report: Report<'_, Range<usize>>, source: &str) -> String {
    let mut buf = Vec::new();
    report
        .write(Source::from(source), &mut buf)
        .expect("diagnostic rendering to an in-memory buffer cannot fail");
    String::from_utf8(buf).expect("diagnostic output is valid UTF-8")
}
