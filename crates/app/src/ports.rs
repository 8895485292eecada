//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that the engine, the scheduler and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod actions;
pub mod documents;
pub mod forms;
pub mod script;
pub mod templates;

pub use actions::ActionRunner;
pub use documents::{DocumentStore, EditorWorkspace};
pub use forms::FormRepository;
pub use script::{ScriptError, ScriptHost};
pub use templates::TemplateExpander;
