//! Main module for hsx library functionality

pub mod build;
pub mod command;
pub mod component;
pub mod diagnostics;
pub mod error;
pub mod expression;
pub mod functions;
pub mod loader;
pub mod parsing;
pub mod reactive;
pub mod registry;
pub mod runtime;
pub mod state;
pub mod surface;
pub mod value;
