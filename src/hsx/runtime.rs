//! Runtime executor
//!
//! Interprets commands against a [`RenderSurface`] and a single
//! [`RuntimeState`], one command at a time.
//!
//! # Reactivity
//!
//! Rendering a component writes its raw template into the target and then runs
//! one binding pass over the written subtree: for every reactive variable the
//! pass captures each location holding the literal token `{{name}}` and
//! subscribes to the variable. On `set`, the first occurrence of the token in
//! each captured location is replaced by the new value text.
//!
//! Two consequences follow and are relied upon:
//! - content inserted after the pass is never bound (there is no re-scan);
//! - the substitution consumes the token, so only the first `set` after a
//!   render changes the text. Later sets find no token and change nothing.

use crate::hsx::command::Command;
use crate::hsx::diagnostics::{Diagnostic, Diagnostics};
use crate::hsx::error::RuntimeError;
use crate::hsx::expression;
use crate::hsx::functions::{self, FunctionTable};
use crate::hsx::state::RuntimeState;
use crate::hsx::surface::{ElementSpec, PlaceholderSlot, RenderSurface};

pub struct RuntimeExecutor<S: RenderSurface> {
    surface: S,
    state: RuntimeState,
    functions: FunctionTable,
    diagnostics: Diagnostics,
}

impl<S: RenderSurface> RuntimeExecutor<S> {
    /// Executor with a fresh state and the built-in async functions.
    pub fn new(surface: S) -> Self {
        Self::with_state(surface, RuntimeState::new())
    }

    pub fn with_state(surface: S, state: RuntimeState) -> Self {
        Self {
            surface,
            state,
            functions: FunctionTable::with_builtins(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn with_functions(mut self, functions: FunctionTable) -> Self {
        self.functions = functions;
        self
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut RuntimeState {
        &mut self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    /// End the run, handing the state back to the caller.
    pub fn into_state(self) -> RuntimeState {
        self.state
    }

    /// Execute commands in order, stopping at the first error.
    pub async fn run(&mut self, commands: &[Command]) -> Result<(), RuntimeError> {
        for command in commands {
            self.execute(command).await?;
        }
        Ok(())
    }

    /// Execute a single command.
    pub async fn execute(&mut self, command: &Command) -> Result<(), RuntimeError> {
        tracing::debug!(kind = command.kind(), "runtime command");
        match command {
            Command::SetVariable {
                name,
                value,
                reactive,
            } => {
                let evaluated = expression::evaluate(value, &self.state).map_err(|source| {
                    RuntimeError::Variable {
                        name: name.clone(),
                        source,
                    }
                })?;
                self.state.set_variable(name, evaluated, *reactive);
                tracing::info!(
                    "Set {}variable {}",
                    if *reactive { "reactive " } else { "" },
                    name
                );
            }
            Command::DefineComponent { name, content } => {
                self.state.components.define(name, content);
                tracing::info!("Defined component {}", name);
            }
            Command::RenderComponent { name, selector } => {
                if self.render_component(name, selector) {
                    tracing::info!("Rendered component {} to {}", name, selector);
                }
            }
            Command::MediaLoad {
                kind,
                url,
                selector,
            } => {
                self.load_media(kind, url, selector);
                tracing::info!("Loaded {} from {}", kind, url);
            }
            Command::RunAsync { code } => {
                tracing::info!("Running async code: {}", code);
                functions::run_async(code, &self.functions, &mut self.state)
                    .await
                    .map_err(|source| RuntimeError::RunAsync {
                        code: code.clone(),
                        source,
                    })?;
            }
            Command::ExistImport { .. }
            | Command::FileImportAll { .. }
            | Command::FileRename { .. }
            | Command::BuildTarget { .. }
            | Command::IncludeFramework { .. }
            | Command::Transform { .. }
            | Command::Copy { .. } => {
                self.diagnostics.warn(format!(
                    "unknown runtime command: {} is build-time only",
                    command.kind()
                ));
            }
        }
        Ok(())
    }

    /// Render a registered component into the first node matching `selector`.
    ///
    /// Returns false, after recording a diagnostic, when the component or the
    /// target does not exist; the document is left untouched in that case.
    pub fn render_component(&mut self, name: &str, selector: &str) -> bool {
        let Some(component) = self.state.components.get(name) else {
            self.diagnostics
                .warn(format!("Component not found: {}", name));
            return false;
        };
        let Some(target) = self.surface.resolve(selector) else {
            self.diagnostics
                .warn(format!("Render target not found: {}", selector));
            return false;
        };

        self.surface.set_content(&target, &component.content);
        bind_reactivity(&self.state, &self.surface, &target);
        true
    }

    /// Append a media element with `src = url` to the selector's node, or to the
    /// surface root when the selector does not resolve.
    pub fn load_media(&mut self, kind: &str, url: &str, selector: &str) -> S::Node {
        let target = match self.surface.resolve(selector) {
            Some(target) => target,
            None => {
                self.diagnostics.warn(format!(
                    "Media target not found: {}, appending to document body",
                    selector
                ));
                self.surface.root()
            }
        };
        let element = ElementSpec::new(kind).attr("src", url);
        self.surface.append_element(&target, &element)
    }
}

/// Placeholder token for a variable name.
pub fn placeholder(name: &str) -> String {
    format!("{{{{{}}}}}", name)
}

/// Bind every reactive variable's placeholders found under `target`.
///
/// Returns the number of variables that received a subscription.
pub fn bind_reactivity<S: RenderSurface>(
    state: &RuntimeState,
    surface: &S,
    target: &S::Node,
) -> usize {
    let mut bound = 0;
    for (name, var) in state.reactive_variables() {
        let token = placeholder(name);
        let slots = surface.placeholders(target, &token);
        if slots.is_empty() {
            continue;
        }

        tracing::debug!(variable = name, slots = slots.len(), "binding placeholders");
        var.subscribe(move |value| {
            let text = value.to_string();
            for slot in &slots {
                slot.replace_first(&token, &text);
            }
            Ok(())
        });
        bound += 1;
    }
    bound
}
