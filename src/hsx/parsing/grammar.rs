//! Line grammar for hsx
//!
//! Every command kind is a single anchored regex with named captures. A line is
//! matched against the patterns of its grammar in declaration order and the
//! first match wins:
//!
//! 1. exist-import        `hsx exist import <category> file <file>`
//! 2. file-import-all     `hsx file import all to <dest>`
//! 3. file-rename         `hsx file import/make/rename/<from>-to-<to>`
//! 4. build-target        `hsx build target <target>`
//! 5. include-framework   `hsx include framework <name> version <version>`
//! 6. transform           `hsx transform <file> with <plugin>`
//! 7. copy                `hsx copy <from> to <to>`
//! 8. run-async           `hsx run async <body>`
//! 9. define-component    `hsx define component <Name> <content>`
//! 10. render-component   `hsx render component <Name> to <selector>`
//! 11. set-variable       `hsx set variable <name> = <expr>`
//! 12. reactive-variable  `hsx reactive variable <name> = <expr>`
//! 13. media-load         `hsx media load <kind> from <url> to <selector>` (runtime only)
//!
//! The grammar is data: adding a command kind means adding a row here and a
//! variant to [`Command`].

use crate::hsx::command::{Command, ImportCategory};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Literal prefix every command line starts with.
pub const COMMAND_PREFIX: &str = "hsx ";

/// Marker for comment lines.
pub const COMMENT_MARKER: &str = "//";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    ExistImport,
    FileImportAll,
    FileRename,
    BuildTarget,
    IncludeFramework,
    Transform,
    Copy,
    RunAsync,
    DefineComponent,
    RenderComponent,
    SetVariable,
    ReactiveVariable,
    MediaLoad,
}

const NAME: &str = "[A-Za-z0-9_]+";

/// Rule table, in match order
const RULES: &[(Rule, &str)] = &[
    (
        Rule::ExistImport,
        r"^hsx exist import (?P<category>correct|simple|node module|node built-in module) file (?P<file>.+)$",
    ),
    (Rule::FileImportAll, r"^hsx file import all to (?P<dest>.+)$"),
    (
        Rule::FileRename,
        r"^hsx file import/make/rename/(?P<from>.+)-to-(?P<to>.+)$",
    ),
    (Rule::BuildTarget, r"^hsx build target (?P<target>.+)$"),
    (
        Rule::IncludeFramework,
        r"^hsx include framework (?P<framework>.+) version (?P<version>.+)$",
    ),
    (Rule::Transform, r"^hsx transform (?P<file>.+) with (?P<plugin>.+)$"),
    (Rule::Copy, r"^hsx copy (?P<from>.+) to (?P<to>.+)$"),
    (Rule::RunAsync, r"^hsx run async (?P<code>.+)$"),
    (
        Rule::DefineComponent,
        r"^hsx define component (?P<name>{NAME}) (?P<content>.+)$",
    ),
    (
        Rule::RenderComponent,
        r"^hsx render component (?P<name>{NAME}) to (?P<selector>.+)$",
    ),
    (
        Rule::SetVariable,
        r"^hsx set variable (?P<name>{NAME}) = (?P<value>.+)$",
    ),
    (
        Rule::ReactiveVariable,
        r"^hsx reactive variable (?P<name>{NAME}) = (?P<value>.+)$",
    ),
    (
        Rule::MediaLoad,
        r"^hsx media load (?P<kind>{NAME}) from (?P<url>.+) to (?P<selector>.+)$",
    ),
];

/// Compiled rules, shared by both grammars
static COMPILED_RULES: Lazy<Vec<(Rule, Regex)>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|(rule, pattern)| {
            let pattern = pattern.replace("{NAME}", NAME);
            (*rule, Regex::new(&pattern).unwrap())
        })
        .collect()
});

/// Which host a source is parsed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// Standalone `.hsx` files compiled at build time.
    Build,
    /// Lines embedded in an `<hsx>` block of a page.
    Runtime,
}

impl Grammar {
    fn accepts(&self, rule: Rule) -> bool {
        match self {
            Grammar::Build => rule != Rule::MediaLoad,
            Grammar::Runtime => matches!(
                rule,
                Rule::RunAsync
                    | Rule::DefineComponent
                    | Rule::RenderComponent
                    | Rule::SetVariable
                    | Rule::ReactiveVariable
                    | Rule::MediaLoad
            ),
        }
    }

    /// Classify a single source line.
    ///
    /// The line is trimmed first. Only [`Line::Unrecognized`] warrants a
    /// diagnostic; everything else is either a command or silently skipped.
    pub fn classify(&self, raw: &str) -> Line {
        let line = raw.trim();
        if line.is_empty() {
            return Line::Blank;
        }
        if line.starts_with(COMMENT_MARKER) {
            return Line::Comment;
        }
        if *self == Grammar::Runtime && !line.starts_with(COMMAND_PREFIX) {
            return Line::Ignored;
        }

        for (rule, regex) in COMPILED_RULES.iter() {
            if !self.accepts(*rule) {
                continue;
            }
            if let Some(caps) = regex.captures(line) {
                if let Some(command) = build_command(*rule, &caps) {
                    return Line::Command(command);
                }
            }
        }
        Line::Unrecognized
    }
}

/// Result of classifying one line
#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Blank,
    Comment,
    /// Runtime grammar only: text without the `hsx ` prefix.
    Ignored,
    Command(Command),
    Unrecognized,
}

fn build_command(rule: Rule, caps: &Captures<'_>) -> Option<Command> {
    let get = |name: &str| caps.name(name).map(|m| m.as_str().trim().to_string());

    let command = match rule {
        Rule::ExistImport => Command::ExistImport {
            category: ImportCategory::from_keyword(caps.name("category")?.as_str())?,
            file: get("file")?,
        },
        Rule::FileImportAll => Command::FileImportAll { dest: get("dest")? },
        Rule::FileRename => Command::FileRename {
            from: get("from")?,
            to: get("to")?,
        },
        Rule::BuildTarget => Command::BuildTarget {
            target: get("target")?,
        },
        Rule::IncludeFramework => Command::IncludeFramework {
            framework: get("framework")?,
            version: get("version")?,
        },
        Rule::Transform => Command::Transform {
            file: get("file")?,
            plugin: get("plugin")?,
        },
        Rule::Copy => Command::Copy {
            from: get("from")?,
            to: get("to")?,
        },
        Rule::RunAsync => Command::RunAsync { code: get("code")? },
        Rule::DefineComponent => Command::DefineComponent {
            name: get("name")?,
            // Template content is kept verbatim, including inner spacing
            content: caps.name("content")?.as_str().to_string(),
        },
        Rule::RenderComponent => Command::RenderComponent {
            name: get("name")?,
            selector: get("selector")?,
        },
        Rule::SetVariable | Rule::ReactiveVariable => Command::SetVariable {
            name: get("name")?,
            value: get("value")?,
            reactive: rule == Rule::ReactiveVariable,
        },
        Rule::MediaLoad => Command::MediaLoad {
            kind: get("kind")?,
            url: get("url")?,
            selector: get("selector")?,
        },
    };
    Some(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rules_compile() {
        assert_eq!(COMPILED_RULES.len(), RULES.len());
    }

    #[test]
    fn runtime_grammar_ignores_unprefixed_text() {
        assert_eq!(Grammar::Runtime.classify("<p>hello</p>"), Line::Ignored);
        assert_eq!(Grammar::Build.classify("<p>hello</p>"), Line::Unrecognized);
    }

    #[test]
    fn media_load_is_runtime_only() {
        let line = "hsx media load video from a.mp4 to #player";
        assert_eq!(Grammar::Build.classify(line), Line::Unrecognized);
        assert_eq!(
            Grammar::Runtime.classify(line),
            Line::Command(Command::MediaLoad {
                kind: "video".into(),
                url: "a.mp4".into(),
                selector: "#player".into(),
            })
        );
    }

    #[test]
    fn build_only_kinds_are_unrecognized_at_runtime() {
        assert_eq!(
            Grammar::Runtime.classify("hsx copy a.txt to b.txt"),
            Line::Unrecognized
        );
    }

    #[test]
    fn component_names_must_be_word_characters() {
        assert_eq!(
            Grammar::Build.classify("hsx define component my-card <p>x</p>"),
            Line::Unrecognized
        );
    }
}
