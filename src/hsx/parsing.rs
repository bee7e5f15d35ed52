//! Source text → ordered command sequence
//!
//! Parsing never fails. Blank lines and `//` comments are skipped, unrecognized
//! lines produce a [`Diagnostic`] and are skipped, and every recognized line
//! contributes exactly one [`Command`] in source order.
//!
//! ```text
//! // layout
//! hsx define component Hello <p>Hello {{user}}</p>
//! hsx reactive variable user = "Ann"
//! hsx render component Hello to #app
//! ```

pub mod grammar;

pub use grammar::{Grammar, Line, COMMAND_PREFIX, COMMENT_MARKER};

use crate::hsx::command::Command;
use crate::hsx::diagnostics::{Diagnostic, Diagnostics};
use serde::Serialize;

/// Commands plus the diagnostics produced while parsing them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutput {
    pub commands: Vec<Command>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse a source with the given grammar.
pub fn parse(source: &str, grammar: Grammar) -> ParseOutput {
    let mut commands = Vec::new();
    let mut diagnostics = Diagnostics::new();

    for (index, line) in source.lines().enumerate() {
        match grammar.classify(line) {
            Line::Command(command) => commands.push(command),
            Line::Unrecognized => diagnostics.push(Diagnostic::at_line(
                index + 1,
                format!("unknown hsx line: {}", line.trim()),
            )),
            Line::Blank | Line::Comment | Line::Ignored => {}
        }
    }

    tracing::debug!(
        commands = commands.len(),
        diagnostics = diagnostics.len(),
        ?grammar,
        "parsed hsx source"
    );

    ParseOutput {
        commands,
        diagnostics: diagnostics.into_vec(),
    }
}

/// Classify a single line. Used by callers that execute line by line.
pub fn parse_line(line: &str, grammar: Grammar) -> Line {
    grammar.classify(line)
}

/// Parse a standalone `.hsx` build script.
pub fn parse_build(source: &str) -> ParseOutput {
    parse(source, Grammar::Build)
}

/// Parse the contents of an `<hsx>` page block.
pub fn parse_runtime(source: &str) -> ParseOutput {
    parse(source, Grammar::Runtime)
}
