//! Build-time executor
//!
//! Runs a command sequence strictly in order, awaiting each command before the
//! next one starts. The first fatal error aborts the run; everything else is
//! recorded as a diagnostic.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::frameworks::FrameworkCache;
use super::host::{BuildHost, BuildTarget, LogHost};
use crate::hsx::command::Command;
use crate::hsx::diagnostics::{Diagnostic, Diagnostics};
use crate::hsx::error::BuildError;
use crate::hsx::expression;
use crate::hsx::functions::{self, FunctionTable};
use crate::hsx::parsing::parse_build;
use crate::hsx::state::RuntimeState;

/// Build-time settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Directory relative file references resolve against.
    pub root: PathBuf,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

/// Summary of a completed build run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildReport {
    pub commands_executed: usize,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct BuildExecutor<H: BuildHost = LogHost> {
    host: H,
    options: BuildOptions,
    frameworks: Arc<FrameworkCache>,
    functions: FunctionTable,
    state: RuntimeState,
    diagnostics: Diagnostics,
    executed: usize,
}

impl BuildExecutor<LogHost> {
    pub fn new(options: BuildOptions) -> Self {
        Self::with_host(LogHost, options)
    }
}

impl<H: BuildHost> BuildExecutor<H> {
    /// Executor using the process-wide framework cache.
    pub fn with_host(host: H, options: BuildOptions) -> Self {
        Self {
            host,
            options,
            frameworks: FrameworkCache::global(),
            functions: FunctionTable::with_builtins(),
            state: RuntimeState::new(),
            diagnostics: Diagnostics::new(),
            executed: 0,
        }
    }

    pub fn with_frameworks(mut self, frameworks: Arc<FrameworkCache>) -> Self {
        self.frameworks = frameworks;
        self
    }

    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// Execute every command in order, aborting on the first fatal error.
    #[tracing::instrument(level = "debug", skip_all, fields(commands = commands.len()))]
    pub async fn run(&mut self, commands: &[Command]) -> Result<BuildReport, BuildError> {
        for command in commands {
            self.execute(command).await?;
        }
        Ok(BuildReport {
            commands_executed: self.executed,
            diagnostics: self.diagnostics.as_slice().to_vec(),
        })
    }

    pub async fn execute(&mut self, command: &Command) -> Result<(), BuildError> {
        tracing::debug!(kind = command.kind(), "build command");
        match command {
            Command::ExistImport { category, file } => {
                tracing::info!("Import {} file: {}", category, file);
                self.resolve(file).await?;
            }
            Command::FileImportAll { dest } => {
                tracing::info!("Import all files to {}", dest);
            }
            Command::FileRename { from, to } => {
                tracing::info!("Rename {} -> {}", from, to);
            }
            Command::BuildTarget { target } => {
                tracing::info!("Building for {}...", target);
                match target.parse::<BuildTarget>() {
                    Ok(backend) => {
                        self.host
                            .build(backend)
                            .await
                            .map_err(|source| BuildError::Backend {
                                backend: backend.to_string(),
                                source,
                            })?;
                    }
                    Err(unknown) => {
                        self.diagnostics
                            .warn(format!("unknown build target: {}", unknown));
                    }
                }
            }
            Command::IncludeFramework { framework, version } => {
                tracing::info!("Loading framework {} v{}", framework, version);
                self.include_framework(framework, version).await?;
            }
            Command::Transform { file, plugin } => {
                tracing::info!("Transforming {} with {}", file, plugin);
            }
            Command::Copy { from, to } => {
                let source = self.resolve(from).await?;
                let destination = self.options.root.join(to);
                tokio::fs::copy(&source, &destination)
                    .await
                    .map_err(|e| BuildError::Copy {
                        from: source.clone(),
                        to: destination.clone(),
                        source: e,
                    })?;
                tracing::info!("Copied {} -> {}", from, to);
            }
            Command::RunAsync { code } => {
                tracing::info!("Running async code: {}", code);
                functions::run_async(code, &self.functions, &mut self.state)
                    .await
                    .map_err(|source| BuildError::RunAsync {
                        code: code.clone(),
                        source,
                    })?;
            }
            Command::DefineComponent { name, content } => {
                tracing::info!("Defining component {}", name);
                self.state.components.define(name, content);
            }
            Command::RenderComponent { name, selector } => {
                tracing::info!("Rendering component {} to {}", name, selector);
                if !self.state.components.contains(name) {
                    self.diagnostics
                        .warn(format!("Component not found: {}", name));
                } else {
                    return Err(BuildError::NoDocument {
                        component: name.clone(),
                    });
                }
            }
            Command::SetVariable {
                name,
                value,
                reactive,
            } => {
                tracing::info!(
                    "Setting {}variable {} = {}",
                    if *reactive { "reactive " } else { "" },
                    name,
                    value
                );
                match expression::evaluate(value, &self.state) {
                    Ok(evaluated) => self.state.set_variable(name, evaluated, *reactive),
                    Err(e) => self
                        .diagnostics
                        .warn(format!("variable {} not set: {}", name, e)),
                }
            }
            Command::MediaLoad { kind, .. } => {
                self.diagnostics.warn(format!(
                    "media load ({}) is only available at runtime",
                    kind
                ));
            }
        }
        self.executed += 1;
        Ok(())
    }

    async fn include_framework(&mut self, name: &str, version: &str) -> Result<(), BuildError> {
        if let Some(loaded) = self.frameworks.claim(name, version) {
            tracing::debug!(
                framework = name,
                loaded_version = %loaded.version,
                requested_version = version,
                "framework already loaded"
            );
            return Ok(());
        }

        if let Err(source) = self.host.load_framework(name, version).await {
            self.frameworks.release(name);
            return Err(BuildError::Framework {
                framework: name.to_string(),
                source,
            });
        }
        Ok(())
    }

    /// Resolve a file reference against the build root; it must exist.
    async fn resolve(&self, file: &str) -> Result<PathBuf, BuildError> {
        let path = self.options.root.join(file);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Ok(path),
            Err(_) => Err(BuildError::MissingFile(path)),
        }
    }
}

/// Read, parse and build an `.hsx` file with the logging host.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
pub async fn build_file(
    path: impl AsRef<Path>,
    options: BuildOptions,
) -> Result<BuildReport, BuildError> {
    let path = path.as_ref();
    tracing::info!("Starting HSX compiler...");

    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| BuildError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let parsed = parse_build(&source);

    let mut executor = BuildExecutor::new(options);
    let mut report = executor.run(&parsed.commands).await?;

    let mut diagnostics = parsed.diagnostics;
    diagnostics.append(&mut report.diagnostics);
    report.diagnostics = diagnostics;

    tracing::info!("HSX compilation finished!");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hsx::command::ImportCategory;
    use crate::hsx::error::HostError;
    use crate::hsx::value::Value;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingHost {
        calls: RefCell<Vec<String>>,
        fail_builds: bool,
        fail_frameworks: bool,
    }

    impl BuildHost for RecordingHost {
        async fn build(&self, target: BuildTarget) -> Result<(), HostError> {
            self.calls.borrow_mut().push(format!("build {}", target));
            if self.fail_builds {
                return Err(HostError("backend crashed".into()));
            }
            Ok(())
        }

        async fn load_framework(&self, name: &str, version: &str) -> Result<(), HostError> {
            self.calls
                .borrow_mut()
                .push(format!("framework {} {}", name, version));
            if self.fail_frameworks {
                return Err(HostError("download failed".into()));
            }
            Ok(())
        }
    }

    fn executor(host: RecordingHost) -> BuildExecutor<RecordingHost> {
        BuildExecutor::with_host(host, BuildOptions::default())
            .with_frameworks(Arc::new(FrameworkCache::new()))
    }

    #[tokio::test]
    async fn framework_is_loaded_once_per_name() {
        let mut executor = executor(RecordingHost::default());
        let commands = parse_build(
            "hsx include framework Strike version 1.0\nhsx include framework strike version 2.0",
        )
        .commands;

        let report = executor.run(&commands).await.unwrap();

        assert_eq!(report.commands_executed, 2);
        assert_eq!(
            *executor.host().calls.borrow(),
            vec!["framework Strike 1.0".to_string()]
        );
    }

    #[tokio::test]
    async fn failed_framework_load_can_be_retried() {
        let cache = Arc::new(FrameworkCache::new());
        let command = Command::IncludeFramework {
            framework: "Strike".into(),
            version: "1.0".into(),
        };

        let mut failing = BuildExecutor::with_host(
            RecordingHost {
                fail_frameworks: true,
                ..Default::default()
            },
            BuildOptions::default(),
        )
        .with_frameworks(cache.clone());
        let err = failing.execute(&command).await.unwrap_err();
        assert!(matches!(err, BuildError::Framework { ref framework, .. } if framework == "Strike"));
        assert!(cache.is_empty());

        let mut retry = BuildExecutor::with_host(RecordingHost::default(), BuildOptions::default())
            .with_frameworks(cache.clone());
        retry.execute(&command).await.unwrap();
        assert_eq!(*retry.host().calls.borrow(), vec!["framework Strike 1.0".to_string()]);
        assert_eq!(cache.get("strike").unwrap().version, "1.0");
    }

    #[tokio::test]
    async fn unknown_build_target_is_a_diagnostic() {
        let mut executor = executor(RecordingHost::default());
        let commands = parse_build("hsx build target webpack\nhsx build target vite").commands;

        let report = executor.run(&commands).await.unwrap();

        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("webpack"));
        assert_eq!(*executor.host().calls.borrow(), vec!["build vite".to_string()]);
    }

    #[tokio::test]
    async fn backend_failure_is_fatal() {
        let mut executor = executor(RecordingHost {
            fail_builds: true,
            ..Default::default()
        });
        let err = executor
            .execute(&Command::BuildTarget {
                target: "babel".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Backend { ref backend, .. } if backend == "babel"));
    }

    #[tokio::test]
    async fn missing_import_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = BuildExecutor::with_host(
            RecordingHost::default(),
            BuildOptions {
                root: dir.path().to_path_buf(),
            },
        )
        .with_frameworks(Arc::new(FrameworkCache::new()));

        let commands = vec![
            Command::ExistImport {
                category: ImportCategory::Simple,
                file: "missing.js".into(),
            },
            Command::BuildTarget {
                target: "vite".into(),
            },
        ];
        let err = executor.run(&commands).await.unwrap_err();

        assert!(matches!(err, BuildError::MissingFile(_)));
        assert!(executor.host().calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn run_async_failure_is_fatal() {
        let mut executor = executor(RecordingHost::default());
        let commands = parse_build("hsx run async explode()\nhsx build target vite").commands;

        let err = executor.run(&commands).await.unwrap_err();

        assert!(matches!(err, BuildError::RunAsync { .. }));
        assert!(executor.host().calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn set_variable_failures_are_diagnostics() {
        let mut executor = executor(RecordingHost::default());
        let commands =
            parse_build("hsx set variable a = missing\nhsx set variable b = 'ok'").commands;

        let report = executor.run(&commands).await.unwrap();

        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(executor.state().value("b"), Some(Value::from("ok")));
        assert_eq!(executor.state().value("a"), None);
    }

    #[tokio::test]
    async fn rendering_needs_a_document() {
        let mut executor = executor(RecordingHost::default());

        executor
            .execute(&Command::RenderComponent {
                name: "Ghost".into(),
                selector: "#app".into(),
            })
            .await
            .unwrap();
        assert_eq!(executor.diagnostics().len(), 1);

        executor
            .execute(&Command::DefineComponent {
                name: "Card".into(),
                content: "<div></div>".into(),
            })
            .await
            .unwrap();
        let err = executor
            .execute(&Command::RenderComponent {
                name: "Card".into(),
                selector: "#app".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::NoDocument { .. }));
    }
}
