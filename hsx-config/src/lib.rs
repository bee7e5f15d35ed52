//! hsx settings
//!
//! Three sections, one per consumer: `build` feeds the build-time executor,
//! `loader` the document loader and `registry` the extension commands. The
//! defaults live in `defaults/hsx.default.toml`, compiled into the crate; a
//! project `hsx.toml` and command-line flags are stacked on top with [`Loader`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use hsx::hsx::build::BuildOptions;
pub use hsx::hsx::loader::LoaderOptions;

const DEFAULT_TOML: &str = include_str!("../defaults/hsx.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct HsxConfig {
    pub build: BuildOptions,
    pub loader: LoaderOptions,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding stored extension files and `records.json`.
    pub path: PathBuf,
}

/// Stacks TOML layers over the compiled-in defaults; later layers win.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Add `path` as a layer; `build` fails if it does not exist.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Add `path` as a layer when it exists, such as a project `hsx.toml`.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    /// Force a dotted key (`build.root`, `registry.path`) to `value`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<HsxConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path).format(FileFormat::Toml).required(required));
        self
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The compiled-in defaults alone.
pub fn load_defaults() -> Result<HsxConfig, ConfigError> {
    Loader::new().build()
}
