//! FIRST and FOLLOW set analysis of context-free grammars.

pub mod classify;
pub mod engine;
pub mod follow;
pub mod grammar;
pub mod report;
pub mod syntax;
pub mod types;

pub use crate::engine::{analyze, Analysis, Config, Diagnostic, SetEngine};
