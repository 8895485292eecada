//! # formgate-app
//!
//! Application layer: the condition engine, the auto-trigger scheduler,
//! use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DocumentStore`: read documents and their cached front-matter
//!   - `EditorWorkspace`: open views and the active document
//!   - `FormRepository`: list, load and patch form configurations
//!   - `ScriptHost`: evaluate user expressions against an explicit scope
//!   - `ActionRunner`: perform a form's actions once its gate passes
//!   - `TemplateExpander`: expand dynamic `{{...}}` tokens
//! - Provide the **condition engine** (`ConditionEngine`) with its leaf
//!   evaluator registry and the **auto-trigger scheduler**
//! - Define **driving/inbound ports** as use-case structs (`FormService`)
//!
//! ## Dependency rule
//! Depends on `formgate-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod engine;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod templates;

#[cfg(test)]
mod testing;
