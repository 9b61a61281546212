//! Rendering diagnostics against the program file with `ariadne`.

use std::ops::Range;

use ariadne::{Color, Config as ReportConfig, Label, Report, ReportKind, Source};

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::program::{LoadError, SourceMap};

/// Renders diagnostics for one program file.
pub struct Renderer<'a> {
    filename: String,
    source: &'a str,
    source_map: Option<&'a SourceMap>,
    color: bool,
}

impl<'a> Renderer<'a> {
    pub fn new(filename: impl Into<String>, source: &'a str) -> Self {
        Self {
            filename: filename.into(),
            source,
            source_map: None,
            color: true,
        }
    }

    /// Resolve declaration spans through `source_map`.
    pub fn with_source_map(mut self, source_map: &'a SourceMap) -> Self {
        self.source_map = Some(source_map);
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Clamp a span into the source; ariadne needs at least one character.
    fn clamp(&self, span: Range<usize>) -> Range<usize> {
        let len = self.source.len();
        let start = span.start.min(len);
        let end = span.end.min(len).max(start);
        if start == end {
            start..(end + 1).min(len)
        } else {
            start..end
        }
    }

    fn span_of(&self, def_id: Option<crate::dispatch::DefId>) -> Option<Range<usize>> {
        let map = self.source_map?;
        def_id.and_then(|id| map.span(id)).map(|span| self.clamp(span))
    }

    fn write(&self, report: Report<'_, (String, Range<usize>)>, fallback: String) -> String {
        let mut buf = Vec::new();
        let cache = (self.filename.clone(), Source::from(self.source.to_string()));
        match report.write(cache, &mut buf) {
            Ok(()) => String::from_utf8(buf).unwrap_or(fallback),
            Err(_) => fallback,
        }
    }

    /// Render a validation diagnostic.
    pub fn diagnostic(&self, diagnostic: &Diagnostic) -> String {
        let kind = match diagnostic.kind {
            DiagnosticKind::Error => ReportKind::Error,
            DiagnosticKind::Warning => ReportKind::Warning,
            DiagnosticKind::Note => ReportKind::Advice,
        };
        let primary = self.span_of(diagnostic.def_id);
        let offset = primary.as_ref().map_or(0, |span| span.start);

        let mut builder = Report::build(kind, self.filename.clone(), offset)
            .with_code(diagnostic.code.as_str())
            .with_message(&diagnostic.message)
            .with_config(ReportConfig::default().with_color(self.color));

        if let Some(span) = primary {
            let label = match diagnostic.position {
                Some(position) => format!("parameter {} declared here", position),
                None => "declared here".to_string(),
            };
            builder.add_label(
                Label::new((self.filename.clone(), span))
                    .with_message(label)
                    .with_color(Color::Red),
            );
        }
        for (related, note) in &diagnostic.related {
            if let Some(span) = self.span_of(Some(*related)) {
                builder.add_label(
                    Label::new((self.filename.clone(), span))
                        .with_message(note)
                        .with_color(Color::Blue),
                );
            }
        }

        self.write(builder.finish(), format!("{}\n", diagnostic))
    }

    /// Render an error loading the program file.
    pub fn load_error(&self, error: &LoadError) -> String {
        let span = error.span().map(|span| self.clamp(span));
        let offset = span.as_ref().map_or(0, |span| span.start);

        let mut builder = Report::build(ReportKind::Error, self.filename.clone(), offset)
            .with_message(error.to_string())
            .with_config(ReportConfig::default().with_color(self.color));
        if let Some(span) = span {
            builder.add_label(
                Label::new((self.filename.clone(), span))
                    .with_message("here")
                    .with_color(Color::Red),
            );
        }

        self.write(builder.finish(), format!("error: {}\n", error))
    }
}
