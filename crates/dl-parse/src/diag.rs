use color_print::cformat;
use dl_ast::span::Span;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

/// Append-only error collector shared by the lexer and the parser. Owns the
/// root source buffer (for line/caret rendering) and the root file path
/// (imports resolve relative to its directory).
pub struct Supervisor {
    source: String,
    project_root: PathBuf,
    errors: Vec<Diagnostic>,
}

impl Supervisor {
    pub fn new(source: String, project_root: impl Into<PathBuf>) -> Self {
        Self {
            source,
            project_root: project_root.into(),
            errors: Vec::new(),
        }
    }

    /// Path of the root source file.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn push_error(&mut self, message: impl Into<String>, span: Span) {
        self.errors.push(Diagnostic {
            message: message.into(),
            span,
        });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// Print every collected error to stderr, in push order, then clear.
    pub fn dump_errors(&mut self) {
        let errors = std::mem::take(&mut self.errors);
        for error in &errors {
            eprint!("{}", self.render_colored(error));
        }
    }

    /// Plain-text rendering of one diagnostic:
    ///
    /// ```text
    /// error: <message>
    ///  --> <line>:<col>
    ///   |
    /// N | <source line>
    ///   |  ^^^^ <message>
    /// ```
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = format!("error: {}\n", diagnostic.message);
        let Some(excerpt) = self.locate(diagnostic.span) else {
            return out;
        };
        out.push_str(&format!(" --> {}:{}\n", excerpt.line_number, excerpt.column));
        out.push_str("  |\n");
        out.push_str(&format!("{} | {}\n", excerpt.line_number, excerpt.text));
        out.push_str(&format!(
            "  | {}{} {}\n",
            " ".repeat(excerpt.column - 1),
            "^".repeat(excerpt.caret_len),
            diagnostic.message
        ));
        out
    }

    fn render_colored(&self, diagnostic: &Diagnostic) -> String {
        let mut out = cformat!("<red,bold>error</>: {}\n", diagnostic.message);
        let Some(excerpt) = self.locate(diagnostic.span) else {
            return out;
        };
        out.push_str(&cformat!(
            " <blue>--></> {}:{}\n",
            excerpt.line_number,
            excerpt.column
        ));
        out.push_str(&cformat!("  <blue>|</>\n"));
        out.push_str(&cformat!(
            "<blue>{} |</> {}\n",
            excerpt.line_number,
            excerpt.text
        ));
        out.push_str(&cformat!(
            "  <blue>|</> <red>{}{} {}</>\n",
            " ".repeat(excerpt.column - 1),
            "^".repeat(excerpt.caret_len),
            diagnostic.message
        ));
        out
    }

    /// Line containing `span.start`, or `None` when the span does not fall
    /// inside the owned source (an empty buffer, or a span raised while
    /// parsing an imported file).
    fn locate(&self, span: Span) -> Option<Excerpt<'_>> {
        if self.source.is_empty() || span.start as usize > self.source.len() {
            return None;
        }
        let start = span.start as usize;
        let line_start = self.source[..start.min(self.source.len())]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = self.source[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(self.source.len());
        let line_number = self.source[..line_start].matches('\n').count() + 1;
        let column = start - line_start + 1;
        let caret_len = (span.end.saturating_sub(span.start) as usize).max(1);
        Some(Excerpt {
            line_number,
            column,
            caret_len,
            text: &self.source[line_start..line_end],
        })
    }
}

struct Excerpt<'a> {
    line_number: usize,
    column: usize,
    caret_len: usize,
    text: &'a str,
}
