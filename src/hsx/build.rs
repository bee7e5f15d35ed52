//! Build-time execution of hsx scripts
//!
//! The build host has a filesystem and named collaborators (build backends and
//! frameworks) but no document. See [`executor`] for the per-command behavior.

pub mod executor;
pub mod frameworks;
pub mod host;

pub use executor::{build_file, BuildExecutor, BuildOptions, BuildReport};
pub use frameworks::{FrameworkCache, LoadedFramework};
pub use host::{BuildHost, BuildTarget, LogHost};
