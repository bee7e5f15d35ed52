//! Build host: the opaque collaborators of the build-time executor
//!
//! Build backends and frameworks are referenced by name only. What building
//! with a backend or loading a framework means is up to the [`BuildHost`];
//! [`LogHost`] only reports what it would do.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::hsx::error::HostError;

/// The fixed set of build backends a `build target` line can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    Vite,
    Babel,
    Esbuild,
}

impl BuildTarget {
    pub const ALL: [BuildTarget; 3] = [BuildTarget::Vite, BuildTarget::Babel, BuildTarget::Esbuild];

    pub fn identifier(&self) -> &'static str {
        match self {
            BuildTarget::Vite => "vite",
            BuildTarget::Babel => "babel",
            BuildTarget::Esbuild => "esbuild",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildTarget::Vite => "Vite",
            BuildTarget::Babel => "Babel",
            BuildTarget::Esbuild => "ESBuild",
        }
    }
}

impl FromStr for BuildTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuildTarget::ALL
            .into_iter()
            .find(|target| target.identifier() == s)
            .ok_or_else(|| s.to_string())
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Side effects the build-time executor delegates.
#[allow(async_fn_in_trait)]
pub trait BuildHost {
    async fn build(&self, target: BuildTarget) -> Result<(), HostError>;

    /// Called at most once per framework name for a given framework cache.
    async fn load_framework(&self, name: &str, version: &str) -> Result<(), HostError>;
}

/// Host that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHost;

impl BuildHost for LogHost {
    async fn build(&self, target: BuildTarget) -> Result<(), HostError> {
        tracing::info!("Building project with {}...", target.display_name());
        Ok(())
    }

    async fn load_framework(&self, name: &str, version: &str) -> Result<(), HostError> {
        tracing::info!("Lazy loading {} framework v{}...", name, version);
        Ok(())
    }
}
