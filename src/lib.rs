//! # hsx
//!
//! Parser and interpreters for the hsx command language.
//!
//! An hsx source is a list of `hsx ...` lines. The same commands drive two hosts:
//!
//! - the build-time executor ([`hsx::build`]), which resolves and copies files,
//!   dispatches build backends and loads frameworks;
//! - the runtime executor ([`hsx::runtime`]), which renders components and media
//!   into a document tree and keeps reactive placeholders up to date.
//!
//! The [`hsx::loader`] module ties the runtime side together: it fetches a page,
//! extracts its `<hsx>` block and runs it against a document.

pub mod hsx;

pub use hsx::build::{BuildExecutor, BuildReport};
pub use hsx::command::Command;
pub use hsx::loader::{DocumentLoader, LoadOutcome, LoadReport};
pub use hsx::parsing::{parse_build, parse_runtime, Grammar, ParseOutput};
pub use hsx::runtime::RuntimeExecutor;
pub use hsx::state::RuntimeState;
pub use hsx::surface::{DomSurface, RenderSurface};
pub use hsx::value::Value;
