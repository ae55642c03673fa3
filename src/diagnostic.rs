use owo_colors::OwoColorize;
use std::fmt;

/// A source span representing a range of bytes in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}

/// Byte offsets of line starts, for turning spans into 1-based line numbers
/// without rescanning the source for every token.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { line_starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Computes line and column from a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax,
    Runtime,
}

/// A reported problem, formatted the way the driver prints it:
/// `[line: <n> Error <where>: <message>]` for syntax errors and
/// `<message> [line:<n>]` for runtime errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub line: usize,
    /// `at end` or `at '<lexeme>'`; absent for lexical errors.
    pub location: Option<String>,
    pub span: Span,
}

impl Diagnostic {
    pub fn syntax(message: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            message: message.into(),
            line,
            location: None,
            span: Span::dummy(),
        }
    }

    pub fn runtime(message: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DiagnosticKind::Runtime,
            message: message.into(),
            line,
            location: None,
            span: Span::dummy(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.kind, &self.location) {
            (DiagnosticKind::Syntax, Some(location)) => {
                write!(f, "[line: {} Error {}: {}]", self.line, location, self.message)
            }
            (DiagnosticKind::Syntax, None) => write!(f, "[line: {} Error: {}]", self.line, self.message),
            (DiagnosticKind::Runtime, _) => write!(f, "{} [line:{}]", self.message, self.line),
        }
    }
}

/// Renders diagnostics with an optional source pointer underneath each one.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut output = String::new();
        output.push_str(&self.style_red_bold(&diagnostic.to_string()));
        output.push('\n');

        if diagnostic.span.is_dummy() || diagnostic.span.start > self.source.len() {
            return output;
        }

        let (line, col) = line_col(self.source, diagnostic.span.start);
        let Some(content) = self.source.lines().nth(line - 1) else {
            return output;
        };

        let width = line.to_string().len();
        output.push_str(&format!(
            "{}{} {}:{}:{}\n",
            " ".repeat(width),
            self.style_blue("-->"),
            self.file_name,
            line,
            col
        ));
        output.push_str(&format!("{} {}\n", " ".repeat(width), self.style_blue("|")));
        output.push_str(&format!(
            "{} {} {}\n",
            self.style_blue(&line.to_string()),
            self.style_blue("|"),
            content
        ));

        // Clip multi-line spans to the first line.
        let line_remaining = content.chars().count().saturating_sub(col - 1).max(1);
        let span_chars = self.source[diagnostic.span.start..diagnostic.span.end.min(self.source.len())]
            .chars()
            .count()
            .max(1);
        let underline = "^".repeat(span_chars.min(line_remaining));
        output.push_str(&format!(
            "{} {} {}{}\n",
            " ".repeat(width),
            self.style_blue("|"),
            " ".repeat(col - 1),
            self.style_red(&underline)
        ));

        output
    }

    fn style_red(&self, s: &str) -> String {
        if self.use_color {
            s.red().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_red_bold(&self, s: &str) -> String {
        if self.use_color {
            s.red().bold().to_string()
        } else {
            s.to_string()
        }
    }

    fn style_blue(&self, s: &str) -> String {
        if self.use_color {
            s.blue().to_string()
        } else {
            s.to_string()
        }
    }
}

/// Render multiple diagnostics
pub fn render_diagnostics(source: &str, file_name: &str, diagnostics: &[Diagnostic], use_color: bool) -> String {
    let renderer = DiagnosticRenderer::new(source, file_name, use_color);
    diagnostics.iter().map(|d| renderer.render(d)).collect()
}
