//! Runtime state
//!
//! One [`RuntimeState`] exists per build run or per document load. It owns the
//! variable store and the component registry, and is threaded explicitly
//! through the executors. Dropping it (or calling [`RuntimeState::dispose`])
//! releases every reactive variable together with its subscribers.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::hsx::component::ComponentRegistry;
use crate::hsx::error::ReactiveError;
use crate::hsx::reactive::ReactiveVar;
use crate::hsx::value::Value;

/// What a variable name is bound to.
#[derive(Debug, Clone)]
pub enum Binding {
    Plain(Value),
    Reactive(Rc<ReactiveVar>),
}

impl Binding {
    pub fn value(&self) -> Value {
        match self {
            Binding::Plain(value) => value.clone(),
            Binding::Reactive(var) => var.get(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RuntimeState {
    variables: BTreeMap<String, Binding>,
    pub components: ComponentRegistry,
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a variable, replacing any earlier binding of the same name.
    ///
    /// A reactive binding always creates a fresh [`ReactiveVar`]; subscribers of
    /// a replaced variable stay attached to the old one.
    pub fn set_variable(&mut self, name: &str, value: Value, reactive: bool) {
        let binding = if reactive {
            Binding::Reactive(Rc::new(ReactiveVar::new(value)))
        } else {
            Binding::Plain(value)
        };
        self.variables.insert(name.to_string(), binding);
    }

    /// Update an existing variable in place.
    ///
    /// Reactive variables go through [`ReactiveVar::set`] so their subscribers
    /// fire; plain variables (or unknown names) are simply rebound.
    pub fn update_variable(&mut self, name: &str, value: Value) -> Result<(), ReactiveError> {
        match self.variables.get(name) {
            Some(Binding::Reactive(var)) => var.clone().set(value),
            _ => {
                self.variables
                    .insert(name.to_string(), Binding::Plain(value));
                Ok(())
            }
        }
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.variables.get(name)
    }

    /// Current value of a variable, reading through reactive bindings.
    pub fn value(&self, name: &str) -> Option<Value> {
        self.variables.get(name).map(Binding::value)
    }

    pub fn reactive(&self, name: &str) -> Option<Rc<ReactiveVar>> {
        match self.variables.get(name) {
            Some(Binding::Reactive(var)) => Some(var.clone()),
            _ => None,
        }
    }

    /// Every reactive variable, by name.
    pub fn reactive_variables(&self) -> impl Iterator<Item = (&str, &Rc<ReactiveVar>)> {
        self.variables.iter().filter_map(|(name, binding)| match binding {
            Binding::Reactive(var) => Some((name.as_str(), var)),
            Binding::Plain(_) => None,
        })
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Drop every binding and component.
    pub fn dispose(&mut self) {
        self.variables.clear();
        self.components.clear();
    }
}
