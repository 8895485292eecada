//! Template expander port: dynamic `{{...}}` tokens.

use formgate_domain::time::Timestamp;

/// Expands host-provided dynamic tokens such as the current date.
///
/// Tokens the expander does not recognise are left intact.
pub trait TemplateExpander: Send + Sync {
    fn expand(&self, text: &str, now: &Timestamp) -> String;
}

impl<T: TemplateExpander + ?Sized> TemplateExpander for std::sync::Arc<T> {
    fn expand(&self, text: &str, now: &Timestamp) -> String {
        (**self).expand(text, now)
    }
}
