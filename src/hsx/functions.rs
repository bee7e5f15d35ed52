//! Registered async functions for `run async`
//!
//! A `run async` body names a function from a [`FunctionTable`] and passes it
//! literal or variable arguments:
//!
//! ```text
//! hsx run async sleep(250)
//! hsx run async log("ready", user)
//! hsx run async update("user", "Bob")
//! ```
//!
//! `update` is handled by the executor itself because it needs the runtime
//! state: it rebinds a variable, going through the reactive `set` when the
//! variable is reactive. Everything else is looked up in the table.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::time::Duration;

use crate::hsx::error::FunctionError;
use crate::hsx::expression::parse_call;
use crate::hsx::state::RuntimeState;
use crate::hsx::value::Value;

pub type FunctionFuture = Pin<Box<dyn Future<Output = Result<Value, FunctionError>>>>;
pub type AsyncFunction = Rc<dyn Fn(Vec<Value>) -> FunctionFuture>;

/// Name of the state-updating intrinsic.
pub const UPDATE: &str = "update";

#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, AsyncFunction>,
}

impl FunctionTable {
    /// A table with no functions at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with `sleep` and `log` registered.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        table.register("sleep", |args| async move {
            let millis = match args.as_slice() {
                [Value::Number(ms)] if *ms >= 0.0 => *ms as u64,
                _ => {
                    return Err(FunctionError::InvalidArguments {
                        function: "sleep".into(),
                        message: "expected a single non-negative number of milliseconds".into(),
                    })
                }
            };
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(Value::Null)
        });
        table.register("log", |args| async move {
            let line = args
                .iter()
                .map(Value::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            tracing::info!(target: "hsx::script", "{}", line);
            Ok(Value::Null)
        });
        table
    }

    pub fn register<F, Fut>(&mut self, name: &str, function: F)
    where
        F: Fn(Vec<Value>) -> Fut + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + 'static,
    {
        let function: AsyncFunction =
            Rc::new(move |args| -> FunctionFuture { Box::pin(function(args)) });
        self.functions.insert(name.to_string(), function);
    }

    pub fn get(&self, name: &str) -> Option<AsyncFunction> {
        self.functions.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        name == UPDATE || self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FunctionTable")
            .field("functions", &names)
            .finish()
    }
}

/// Parse a `run async` body, evaluate its arguments and await the call.
pub async fn run_async(
    code: &str,
    table: &FunctionTable,
    state: &mut RuntimeState,
) -> Result<Value, FunctionError> {
    let call = parse_call(code)?;
    let args = call.evaluate_arguments(state)?;

    if call.function == UPDATE {
        update(args, state)?;
        return Ok(Value::Null);
    }

    let function = table
        .get(&call.function)
        .ok_or_else(|| FunctionError::Unknown(call.function.clone()))?;
    tracing::debug!(function = %call.function, args = args.len(), "awaiting async function");
    function(args).await
}

fn update(args: Vec<Value>, state: &mut RuntimeState) -> Result<(), FunctionError> {
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(Value::Str(name)), Some(value), None) if !name.is_empty() => {
            state.update_variable(&name, value)?;
            Ok(())
        }
        _ => Err(FunctionError::InvalidArguments {
            function: UPDATE.into(),
            message: "expected a variable name string and a value".into(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[tokio::test]
    async fn runs_registered_function_with_evaluated_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut table = FunctionTable::new();
        table.register("record", move |args| {
            let sink = sink.clone();
            async move {
                sink.borrow_mut().extend(args);
                Ok(Value::Null)
            }
        });

        let mut state = RuntimeState::new();
        state.set_variable("n", Value::Number(2.0), false);
        run_async("record(\"a\", n)", &table, &mut state)
            .await
            .unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![Value::from("a"), Value::Number(2.0)]
        );
    }

    #[tokio::test]
    async fn unknown_function_is_an_error() {
        let mut state = RuntimeState::new();
        let err = run_async("launch()", &FunctionTable::with_builtins(), &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, FunctionError::Unknown(name) if name == "launch"));
    }

    #[tokio::test]
    async fn update_sets_reactive_variables() {
        let mut state = RuntimeState::new();
        state.set_variable("user", Value::from("Ann"), true);
        let fired = Rc::new(RefCell::new(0));
        let counter = fired.clone();
        state.reactive("user").unwrap().subscribe(move |_| {
            *counter.borrow_mut() += 1;
            Ok(())
        });

        run_async("update('user', 'Bob')", &FunctionTable::new(), &mut state)
            .await
            .unwrap();

        assert_eq!(state.value("user"), Some(Value::from("Bob")));
        assert_eq!(*fired.borrow(), 1);
    }

    #[tokio::test]
    async fn update_rejects_malformed_arguments() {
        let mut state = RuntimeState::new();
        let err = run_async("update(1, 2)", &FunctionTable::new(), &mut state)
            .await
            .unwrap_err();
        assert!(matches!(err, FunctionError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn sleep_validates_its_argument() {
        let mut state = RuntimeState::new();
        let table = FunctionTable::with_builtins();
        assert!(run_async("sleep(0)", &table, &mut state).await.is_ok());
        assert!(run_async("sleep('soon')", &table, &mut state).await.is_err());
    }
}
