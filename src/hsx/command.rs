//! Parsed hsx commands
//!
//! One variant per command kind. Commands are produced once by the parser and
//! consumed once by an executor; nothing mutates them in between.

use serde::Serialize;
use std::fmt;

/// Category declared by an `exist import` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportCategory {
    Correct,
    Simple,
    NodeModule,
    NodeBuiltinModule,
}

impl ImportCategory {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "correct" => Some(ImportCategory::Correct),
            "simple" => Some(ImportCategory::Simple),
            "node module" => Some(ImportCategory::NodeModule),
            "node built-in module" => Some(ImportCategory::NodeBuiltinModule),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ImportCategory::Correct => "correct",
            ImportCategory::Simple => "simple",
            ImportCategory::NodeModule => "node module",
            ImportCategory::NodeBuiltinModule => "node built-in module",
        }
    }
}

impl fmt::Display for ImportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A single hsx instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    ExistImport {
        category: ImportCategory,
        file: String,
    },
    FileImportAll {
        dest: String,
    },
    FileRename {
        from: String,
        to: String,
    },
    BuildTarget {
        target: String,
    },
    IncludeFramework {
        framework: String,
        version: String,
    },
    Transform {
        file: String,
        plugin: String,
    },
    Copy {
        from: String,
        to: String,
    },
    RunAsync {
        code: String,
    },
    DefineComponent {
        name: String,
        content: String,
    },
    RenderComponent {
        name: String,
        selector: String,
    },
    SetVariable {
        name: String,
        value: String,
        reactive: bool,
    },
    MediaLoad {
        kind: String,
        url: String,
        selector: String,
    },
}

impl Command {
    /// The command kind as it appears in diagnostics and serialized output.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::ExistImport { .. } => "exist-import",
            Command::FileImportAll { .. } => "file-import-all",
            Command::FileRename { .. } => "file-rename",
            Command::BuildTarget { .. } => "build-target",
            Command::IncludeFramework { .. } => "include-framework",
            Command::Transform { .. } => "transform",
            Command::Copy { .. } => "copy",
            Command::RunAsync { .. } => "run-async",
            Command::DefineComponent { .. } => "define-component",
            Command::RenderComponent { .. } => "render-component",
            Command::SetVariable { .. } => "set-variable",
            Command::MediaLoad { .. } => "media-load",
        }
    }
}
