//! # formgate-domain
//!
//! Pure domain model for formgate execution gates.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **Conditions** (recursive gate trees with typed leaf configs)
//! - Define the **Operator library** and **version comparison**
//! - Define **Evaluation results** and their human-readable explanation
//! - Define **Forms** (durable unit configuration) and **field filters**
//! - Define **file events** consumed by the auto-trigger registry
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod condition;
pub mod evaluation;
pub mod event;
pub mod filter;
pub mod form;
pub mod operator;
pub mod version;
