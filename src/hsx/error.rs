//! Error types
//!
//! Only fatal conditions are errors. Recoverable problems are reported as
//! [`Diagnostic`](crate::hsx::diagnostics::Diagnostic)s instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character `{found}` at offset {offset}")]
    UnexpectedCharacter { found: String, offset: usize },
    #[error("invalid expression `{source_text}`: {message}")]
    Syntax {
        source_text: String,
        message: String,
    },
    #[error("unknown variable `{0}`")]
    UnknownVariable(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactiveError {
    #[error("subscriber failed: {0}")]
    Subscriber(String),
}

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("unknown async function `{0}`")]
    Unknown(String),
    #[error("`{function}`: {message}")]
    InvalidArguments { function: String, message: String },
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
}

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("set variable `{name}`: {source}")]
    Variable {
        name: String,
        #[source]
        source: ExpressionError,
    },
    #[error("run async `{code}`: {source}")]
    RunAsync {
        code: String,
        #[source]
        source: FunctionError,
    },
}

/// Failure reported by a build host collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HostError(pub String);

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("run async `{code}`: {source}")]
    RunAsync {
        code: String,
        #[source]
        source: FunctionError,
    },
    #[error("cannot render component `{component}`: no document at build time")]
    NoDocument { component: String },
    #[error("build backend `{backend}` failed: {source}")]
    Backend {
        backend: String,
        #[source]
        source: HostError,
    },
    #[error("framework `{framework}` failed to load: {source}")]
    Framework {
        framework: String,
        #[source]
        source: HostError,
    },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid hsx document {url}: no <{tag}> block")]
    MissingBlock { url: String, tag: String },
    #[error("unusable block tag `{tag}`: {source}")]
    BlockTag {
        tag: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry i/o on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt registry index: {0}")]
    Index(#[from] serde_json::Error),
    #[error("submission is missing its `{0}` file")]
    MissingFile(String),
}
